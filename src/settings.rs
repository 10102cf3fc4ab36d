use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::parser::labels::LabelSet;
use crate::parser::lots::{PlanStrategy, DEFAULT_WINDOW_LINES};
use crate::parser::owners::{OwnerStrategy, DEFAULT_STRATEGIES};
use crate::parser::{ParserOptions, DEFAULT_FALLBACK_PREFIX_CHARS};

const DEFAULT_CONFIG_NAME: &str = "releve";
const ENV_PREFIX: &str = "RELEVE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_lines: usize,
    pub fallback_prefix_chars: usize,
    pub plan_strategy: PlanStrategy,
    pub owner_strategies: Vec<OwnerStrategy>,
    pub labels: LabelSet,
    pub db_path: String,
    pub summary_endpoint: String,
    pub summary_api_key: Option<String>,
    pub summary_timeout_secs: u64,
    pub summary_max_attempts: u32,
    pub summary_backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            window_lines: DEFAULT_WINDOW_LINES,
            fallback_prefix_chars: DEFAULT_FALLBACK_PREFIX_CHARS,
            plan_strategy: PlanStrategy::default(),
            owner_strategies: DEFAULT_STRATEGIES.to_vec(),
            labels: LabelSet::default(),
            db_path: "data/releve.sqlite".to_string(),
            summary_endpoint:
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
                    .to_string(),
            summary_api_key: None,
            summary_timeout_secs: 30,
            summary_max_attempts: 3,
            summary_backoff_ms: 1000,
        }
    }
}

impl Settings {
    /// Defaults, then `releve.toml` (or `path`), then `RELEVE_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            window_lines: self.window_lines,
            fallback_prefix_chars: self.fallback_prefix_chars,
            plan_strategy: self.plan_strategy,
            owner_strategies: self.owner_strategies.clone(),
        }
    }
}

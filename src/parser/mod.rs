pub mod aggregate;
pub mod labels;
pub mod lots;
pub mod normalize;
pub mod owners;

use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

use aggregate::PropertyRecord;
use labels::{LabelSet, Labels};
use lots::{PlanStrategy, DEFAULT_WINDOW_LINES};
use owners::{OwnerStrategy, DEFAULT_STRATEGIES};

pub const DEFAULT_FALLBACK_PREFIX_CHARS: usize = 3000;

/// A relevé de propriété as handed over by the text extraction step.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Document {
            name: name.into(),
            pages,
        }
    }

    /// Pages joined on a line break so no line spans a page boundary.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub document: String,
    pub owners: usize,
    pub records: Vec<PropertyRecord>,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub window_lines: usize,
    pub fallback_prefix_chars: usize,
    pub plan_strategy: PlanStrategy,
    pub owner_strategies: Vec<OwnerStrategy>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            window_lines: DEFAULT_WINDOW_LINES,
            fallback_prefix_chars: DEFAULT_FALLBACK_PREFIX_CHARS,
            plan_strategy: PlanStrategy::default(),
            owner_strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }
}

/// Compiled labels plus options; shared read-only across documents.
#[derive(Debug, Clone)]
pub struct Parser {
    labels: Labels,
    options: ParserOptions,
}

impl Parser {
    pub fn new(labels: &LabelSet, options: ParserOptions) -> Result<Self> {
        Ok(Parser {
            labels: Labels::compile(labels)?,
            options,
        })
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Three-stage pipeline: owners → lots of `section` → joined records.
    pub fn process_document(&self, doc: &Document, section: &str) -> DocumentResult {
        let section = normalize::normalize_section(section);
        let text = doc.text();

        let owners = owners::extract(
            &text,
            &self.labels,
            &self.options.owner_strategies,
            self.options.fallback_prefix_chars,
        );
        let lots = lots::scan(
            &text,
            &section,
            self.options.window_lines,
            self.options.plan_strategy,
        );
        let records = aggregate::join(&owners, &lots);

        debug!(
            document = %doc.name,
            owners = owners.len(),
            lots = lots.len(),
            "document processed"
        );

        DocumentResult {
            document: doc.name.clone(),
            owners: owners.len(),
            records,
        }
    }

    /// Documents are independent; results come back in input order.
    pub fn process_batch(&self, docs: &[Document], section: &str) -> Vec<DocumentResult> {
        docs.par_iter()
            .map(|doc| self.process_document(doc, section))
            .collect()
    }
}

/// Concatenate per-document records, keeping document order.
pub fn flatten(results: &[DocumentResult]) -> Vec<PropertyRecord> {
    results
        .iter()
        .flat_map(|r| r.records.iter().cloned())
        .collect()
}

// ── Tests ──

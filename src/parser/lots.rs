use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::normalize;

pub const PLAN_NOT_DETECTED: &str = "Not detected";
pub const DEFAULT_WINDOW_LINES: usize = 10;

// LOT 0000237 53/10000, LOT N° 12 - 40/1000, lot: 7 QP 1/2
// A third `/nnnn` group marks a date (12/03/1961), not a quota.
static LOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLOT\s*(?::|N\s*[°o]\.?)?\s*(\d+)[^\d/]{1,16}?(\d+)\s*/\s*(\d+)(\s*/\s*\d+)?").unwrap()
});
static TRIPLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"\s*,\s*"([^"]*)"\s*,\s*"([^"]*)""#).unwrap()
});

/// One cadastral lot of the requested section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotEntry {
    pub lot_number: String,
    pub quota_share: String,
    pub section: String,
    pub plan: String,
}

/// Where the plan number of a lot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Always the sentinel.
    #[default]
    Sentinel,
    /// First value of a `"plan","section","subdivision"` row of the same section.
    QuotedTriplet,
}

/// How a line referenced the section code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionHit {
    Quoted,
    Word,
}

/// Scan the document lines for `section` and collect the lots listed in the
/// `window_lines` lines following each occurrence.
///
/// Lots are unique by number across the whole document, first one wins.
pub fn scan(
    text: &str,
    section: &str,
    window_lines: usize,
    plan_strategy: PlanStrategy,
) -> Vec<LotEntry> {
    if section.is_empty() {
        return Vec::new();
    }
    let quoted = format!("\"{}\"", section);
    let Ok(word_re) = Regex::new(&format!(r"\b{}\b", regex::escape(section))) else {
        return Vec::new();
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut lots = Vec::new();
    let mut windows = 0usize;

    for (i, line) in lines.iter().enumerate() {
        let hit = if line.contains(&quoted) {
            SectionHit::Quoted
        } else if word_re.is_match(line) {
            SectionHit::Word
        } else {
            continue;
        };
        windows += 1;

        let end = i.saturating_add(window_lines).saturating_add(1).min(lines.len());
        let window = normalize(&lines[i..end].join(" "));
        let plan = match plan_strategy {
            PlanStrategy::Sentinel => None,
            PlanStrategy::QuotedTriplet => triplet_plan(&window, section),
        };

        for caps in LOT_RE.captures_iter(&window) {
            if caps.get(4).is_some() {
                debug!(line = i + 1, text = &caps[0], "date after lot number skipped");
                continue;
            }
            let lot_number = caps[1].to_string();
            if !seen.insert(lot_number.clone()) {
                debug!(line = i + 1, lot = %lot_number, "duplicate lot skipped");
                continue;
            }
            debug!(line = i + 1, hit = ?hit, lot = %lot_number, "lot found");
            lots.push(LotEntry {
                lot_number,
                quota_share: format!("{}/{}", &caps[2], &caps[3]),
                section: section.to_string(),
                plan: plan.clone().unwrap_or_else(|| PLAN_NOT_DETECTED.to_string()),
            });
        }
    }

    debug!(section, windows, lots = lots.len(), "section scanned");
    lots
}

fn triplet_plan(window: &str, section: &str) -> Option<String> {
    TRIPLET_RE
        .captures_iter(window)
        .find(|caps| caps[2].trim() == section)
        .map(|caps| caps[1].trim().to_string())
        .filter(|plan| !plan.is_empty())
}

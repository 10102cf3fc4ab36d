use anyhow::{ensure, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field labels of a relevé de propriété. Each entry lists the accepted
/// spellings; matching is case-insensitive and tolerant to any whitespace
/// between words.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelSet {
    pub zone_start: Vec<String>,
    pub zone_end: Vec<String>,
    pub owner_delimiter: Vec<String>,
    pub surname: Vec<String>,
    pub given_name: Vec<String>,
    pub birth: Vec<String>,
    pub address: Vec<String>,
    pub right_kind: Vec<String>,
    /// Property table headings; they close any field still open.
    pub property_heading: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        LabelSet {
            zone_start: list(&["Titulaire(s) de droit(s)"]),
            zone_end: list(&["Propriété(s) bâtie(s)"]),
            owner_delimiter: list(&["Numéro propriétaire", "N° propriétaire"]),
            surname: list(&["Nom"]),
            given_name: list(&["Prénom", "Prenom"]),
            birth: list(&["Né(e)", "Née", "Né"]),
            address: list(&["Adresse"]),
            right_kind: list(&["Droit réel"]),
            property_heading: list(&["Propriété(s)", "Propriétés", "Propriété"]),
        }
    }
}

/// Compiled form of a [`LabelSet`].
///
/// Openers (`surname`, `given_name`, `address`, `owner_delimiter`) require the
/// trailing colon. Stop sets only require the label to end at a colon, a
/// whitespace or the end of text, so `Prénom MARC` still stops a surname while
/// a name such as `NÉMOZ` is not mistaken for `Né`.
#[derive(Debug, Clone)]
pub struct Labels {
    pub zone_start: Regex,
    pub zone_end: Regex,
    pub owner_delimiter: Regex,
    pub surname: Regex,
    pub given_name: Regex,
    pub address: Regex,
    pub surname_stops: Regex,
    pub given_name_stops: Regex,
    pub address_stops: Regex,
}

impl Labels {
    pub fn compile(set: &LabelSet) -> Result<Self> {
        Ok(Labels {
            zone_start: marker_regex("zone_start", &set.zone_start)?,
            zone_end: marker_regex("zone_end", &set.zone_end)?,
            owner_delimiter: opener_regex("owner_delimiter", &set.owner_delimiter)?,
            surname: opener_regex("surname", &set.surname)?,
            given_name: opener_regex("given_name", &set.given_name)?,
            address: opener_regex("address", &set.address)?,
            surname_stops: stop_regex(
                "surname stops",
                &[
                    &set.given_name,
                    &set.birth,
                    &set.address,
                    &set.right_kind,
                    &set.owner_delimiter,
                    &set.zone_end,
                    &set.property_heading,
                ],
            )?,
            given_name_stops: stop_regex(
                "given_name stops",
                &[
                    &set.birth,
                    &set.address,
                    &set.right_kind,
                    &set.owner_delimiter,
                    &set.zone_end,
                    &set.property_heading,
                ],
            )?,
            address_stops: stop_regex(
                "address stops",
                &[
                    &set.right_kind,
                    &set.owner_delimiter,
                    &set.zone_end,
                    &set.property_heading,
                ],
            )?,
        })
    }
}

/// `Numéro  propriétaire` → `Numéro\s+propriétaire`, every other character escaped.
fn spelling_pattern(spelling: &str) -> String {
    spelling
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn alternation(name: &str, spellings: &[&String]) -> Result<String> {
    let parts: Vec<String> = spellings
        .iter()
        .map(|s| spelling_pattern(s))
        .filter(|p| !p.is_empty())
        .collect();
    ensure!(!parts.is_empty(), "label list `{}` is empty", name);
    Ok(parts.join("|"))
}

fn build(name: &str, pattern: String) -> Result<Regex> {
    Regex::new(&pattern).with_context(|| format!("invalid label pattern for `{}`", name))
}

fn marker_regex(name: &str, spellings: &[String]) -> Result<Regex> {
    let alts = alternation(name, &spellings.iter().collect::<Vec<_>>())?;
    build(name, format!(r"(?i)(?:{})", alts))
}

fn opener_regex(name: &str, spellings: &[String]) -> Result<Regex> {
    let alts = alternation(name, &spellings.iter().collect::<Vec<_>>())?;
    build(name, format!(r"(?i)\b(?:{})\s*:", alts))
}

fn stop_regex(name: &str, groups: &[&Vec<String>]) -> Result<Regex> {
    let spellings: Vec<&String> = groups.iter().flat_map(|g| g.iter()).collect();
    let alts = alternation(name, &spellings)?;
    build(name, format!(r"(?i)\b(?:{})(?:\s*:|\s|$)", alts))
}

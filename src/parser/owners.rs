use serde::{Deserialize, Serialize};
use tracing::debug;

use super::labels::Labels;
use super::normalize::normalize;

pub const ADDRESS_NOT_DETECTED: &str = "Not detected";
pub const NO_HOLDER_ID: &str = "N/A";

/// One rights holder ("titulaire de droits").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub name: String,
    pub address: String,
    pub holder_id: String,
}

impl Owner {
    pub fn has_address(&self) -> bool {
        self.address != ADDRESS_NOT_DETECTED
    }
}

/// How the rights-holder zone is cut into owner blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStrategy {
    /// One block per `Numéro propriétaire:` delimiter, holder id taken from it.
    Delimited,
    /// One block per `Nom:` occurrence, no holder id.
    Positional,
}

pub const DEFAULT_STRATEGIES: &[OwnerStrategy] =
    &[OwnerStrategy::Delimited, OwnerStrategy::Positional];

/// Extract every owner of the document, in order of appearance.
///
/// Strategies are tried in order; the first one yielding at least one owner
/// wins. Never fails: an unrecognisable document gives an empty list.
pub fn extract(
    text: &str,
    labels: &Labels,
    strategies: &[OwnerStrategy],
    fallback_prefix_chars: usize,
) -> Vec<Owner> {
    let zone = normalize(rights_holder_zone(text, labels, fallback_prefix_chars));
    if zone.is_empty() {
        return Vec::new();
    }

    for strategy in strategies {
        let owners = match strategy {
            OwnerStrategy::Delimited => split_delimited(&zone, labels),
            OwnerStrategy::Positional => split_positional(&zone, labels),
        };
        if !owners.is_empty() {
            debug!(strategy = ?strategy, owners = owners.len(), "owners extracted");
            for o in &owners {
                debug!(name = %o.name, holder = %o.holder_id, "owner");
            }
            return owners;
        }
    }

    debug!("no owner found in rights-holder zone");
    Vec::new()
}

/// Text strictly between the zone markers, or a bounded prefix of the
/// document when they cannot be found in order.
fn rights_holder_zone<'a>(text: &'a str, labels: &Labels, fallback_prefix_chars: usize) -> &'a str {
    if let Some(start) = labels.zone_start.find(text) {
        let rest = &text[start.end()..];
        if let Some(end) = labels.zone_end.find(rest) {
            return &rest[..end.start()];
        }
    }
    debug!(
        chars = fallback_prefix_chars,
        "rights-holder zone not delimited, scanning document prefix"
    );
    bounded_prefix(text, fallback_prefix_chars)
}

fn bounded_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn split_delimited(zone: &str, labels: &Labels) -> Vec<Owner> {
    let marks: Vec<_> = labels.owner_delimiter.find_iter(zone).collect();
    let mut owners = Vec::new();

    for (i, mark) in marks.iter().enumerate() {
        let end = marks.get(i + 1).map_or(zone.len(), |next| next.start());
        let block = &zone[mark.end()..end];
        let holder_id = holder_id(block);
        if let Some(owner) = parse_block(block, labels, holder_id) {
            owners.push(owner);
        }
    }

    owners
}

fn split_positional(zone: &str, labels: &Labels) -> Vec<Owner> {
    let marks: Vec<_> = labels.surname.find_iter(zone).collect();
    let mut owners = Vec::new();

    for (i, mark) in marks.iter().enumerate() {
        let end = marks.get(i + 1).map_or(zone.len(), |next| next.start());
        let block = &zone[mark.start()..end];
        if let Some(owner) = parse_block(block, labels, NO_HOLDER_ID.to_string()) {
            owners.push(owner);
        }
    }

    owners
}

/// First word after the delimiter, unless that word is itself a field label
/// (`Numéro propriétaire: Nom: ...`).
fn holder_id(block: &str) -> String {
    let rest = block.trim_start();
    let id: String = rest.chars().take_while(|c| c.is_alphanumeric()).collect();
    let after = rest[id.len()..].trim_start();
    if id.is_empty() || after.starts_with(':') {
        NO_HOLDER_ID.to_string()
    } else {
        id
    }
}

fn parse_block(block: &str, labels: &Labels, holder_id: String) -> Option<Owner> {
    let surname = field_value(block, &labels.surname, &labels.surname_stops)
        .map(name_part)
        .unwrap_or_default();
    let given_name = field_value(block, &labels.given_name, &labels.given_name_stops)
        .map(name_part)
        .unwrap_or_default();

    let name = format!("{} {}", surname, given_name).trim().to_string();
    if name.is_empty() {
        return None;
    }

    let address = field_value(block, &labels.address, &labels.address_stops)
        .map(normalize)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| ADDRESS_NOT_DETECTED.to_string());

    Some(Owner {
        name,
        address,
        holder_id,
    })
}

/// Value following `label`, up to the first stop label or the end of block.
fn field_value<'a>(
    block: &'a str,
    label: &regex::Regex,
    stops: &regex::Regex,
) -> Option<&'a str> {
    let open = label.find(block)?;
    let rest = &block[open.end()..];
    let end = stops.find(rest).map_or(rest.len(), |m| m.start());
    Some(&rest[..end])
}

/// Leading run of letters, spaces, hyphens and apostrophes, upper-cased.
fn name_part(raw: &str) -> String {
    let kept: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '’'))
        .collect();
    normalize(&kept).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::labels::LabelSet;

    fn labels() -> Labels {
        Labels::compile(&LabelSet::default()).unwrap()
    }

    fn run(text: &str) -> Vec<Owner> {
        extract(text, &labels(), DEFAULT_STRATEGIES, 3000)
    }

    #[test]
    fn single_owner_without_delimiter() {
        let text = "Titulaire(s) de droit(s)\nNom: KADHIRAVAN Prénom: MARC\nAdresse: 19 RUE BURGER,\n94190 VILLENEUVE ST GEORGES\nPropriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "KADHIRAVAN MARC");
        assert_eq!(owners[0].address, "19 RUE BURGER, 94190 VILLENEUVE ST GEORGES");
        assert_eq!(owners[0].holder_id, NO_HOLDER_ID);
    }

    #[test]
    fn delimited_owners_keep_holder_ids() {
        let text = "Titulaire(s) de droit(s)
Numéro propriétaire: MBX7QK Droit réel: Propriétaire/Indivision
Nom: DUPONT Prénom: JEAN PIERRE
Né(e) le 12/03/1961 à PARIS
Adresse: 4 AVENUE DE LA REPUBLIQUE
75011 PARIS
Numéro propriétaire: MBX7QL Droit réel: Propriétaire/Indivision
Nom: DUPONT-MARTIN Prénom: Claire
Adresse: 8 RUE DES ACACIAS 75017 PARIS
Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[0].holder_id, "MBX7QK");
        assert_eq!(owners[0].name, "DUPONT JEAN PIERRE");
        assert_eq!(owners[0].address, "4 AVENUE DE LA REPUBLIQUE 75011 PARIS");
        assert_eq!(owners[1].holder_id, "MBX7QL");
        assert_eq!(owners[1].name, "DUPONT-MARTIN CLAIRE");
        assert_eq!(owners[1].address, "8 RUE DES ACACIAS 75017 PARIS");
    }

    #[test]
    fn address_stops_at_right_kind() {
        let text = "Titulaire(s) de droit(s) Numéro propriétaire: A1 Nom: MARTIN Prénom: LUC Adresse: 2 PLACE DU MARCHE 13001 MARSEILLE Droit réel: Usufruitier Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].address, "2 PLACE DU MARCHE 13001 MARSEILLE");
    }

    #[test]
    fn right_kind_line_ends_given_name() {
        let text = "Titulaire(s) de droit(s)
Numéro propriétaire: A1
Nom: MARTIN Prénom: LUC
Droit réel: Usufruitier
Adresse: 2 RUE X
Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "MARTIN LUC");
        assert_eq!(owners[0].holder_id, "A1");
        assert_eq!(owners[0].address, "2 RUE X");
    }

    #[test]
    fn address_stops_at_property_table_without_zone() {
        let text = "Nom: KADHIRAVAN Prénom: MARC
Adresse: 19 RUE BURGER
Propriété(s) non bâtie(s)
15 AS 123
LOT 0000237 53/10000";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "KADHIRAVAN MARC");
        assert_eq!(owners[0].address, "19 RUE BURGER");
    }

    #[test]
    fn given_name_stops_at_property_table_without_zone() {
        let text = "Nom: ROUX Prénom: ANNE\nPropriétés non bâties\n15 AS 123";
        let owners = run(text);
        assert_eq!(owners[0].name, "ROUX ANNE");
        assert_eq!(owners[0].address, ADDRESS_NOT_DETECTED);
    }

    #[test]
    fn missing_address_uses_sentinel() {
        let text = "Titulaire(s) de droit(s) Nom: ROUX Prénom: ANNE Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].address, ADDRESS_NOT_DETECTED);
        assert!(!owners[0].has_address());
    }

    #[test]
    fn blocks_without_name_are_dropped() {
        let text = "Titulaire(s) de droit(s)
Numéro propriétaire: X1 Droit réel: Propriétaire
Numéro propriétaire: X2 Nom: BLANC Prénom: PAUL
Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].holder_id, "X2");
        assert_eq!(owners[0].name, "BLANC PAUL");
    }

    #[test]
    fn positional_fallback_pairs_each_surname() {
        let text = "Titulaire(s) de droit(s)
Nom: NAME ONE Prénom: GIVEN ONE Adresse: 1 RUE A
Nom: NAME TWO Prénom: GIVEN TWO
Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 2);
        assert!(owners.iter().all(|o| o.holder_id == NO_HOLDER_ID));
        assert_eq!(owners[0].name, "NAME ONE GIVEN ONE");
        assert_eq!(owners[0].address, "1 RUE A");
        assert_eq!(owners[1].name, "NAME TWO GIVEN TWO");
        assert_eq!(owners[1].address, ADDRESS_NOT_DETECTED);
    }

    #[test]
    fn delimiter_followed_by_label_has_no_holder_id() {
        let text = "Titulaire(s) de droit(s) Numéro propriétaire: Nom: VIDAL Prénom: EVE Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].holder_id, NO_HOLDER_ID);
        assert_eq!(owners[0].name, "VIDAL EVE");
    }

    #[test]
    fn no_zone_scans_bounded_prefix() {
        let text = format!(
            "Nom: PETIT Prénom: LEA Adresse: 3 RUE HAUTE\n{}\nNom: LOIN Prénom: TROP",
            "x ".repeat(200)
        );
        let owners = extract(&text, &labels(), DEFAULT_STRATEGIES, 100);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "PETIT LEA");
    }

    #[test]
    fn end_marker_before_start_falls_back() {
        let text = "Propriété(s) bâtie(s)\nNom: GIRARD Prénom: ZOE\nNé(e) le 01/02/1990\nTitulaire(s) de droit(s)";
        let owners = run(text);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "GIRARD ZOE");
    }

    #[test]
    fn garbage_yields_empty_list() {
        assert!(run("").is_empty());
        assert!(run("RELEVE DE PROPRIETE\nrien d'exploitable ici").is_empty());
        assert!(run("Titulaire(s) de droit(s) Propriété(s) bâtie(s)").is_empty());
    }

    #[test]
    fn strategy_order_is_configurable() {
        let text = "Titulaire(s) de droit(s) Numéro propriétaire: ID9 Nom: FABRE Prénom: NOE Propriété(s) bâtie(s)";
        let owners = extract(text, &labels(), &[OwnerStrategy::Positional], 3000);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].holder_id, NO_HOLDER_ID);
    }

    #[test]
    fn accented_names_are_upper_cased() {
        let text = "Titulaire(s) de droit(s) Nom: Lefèvre Prénom: Hélène Propriété(s) bâtie(s)";
        let owners = run(text);
        assert_eq!(owners[0].name, "LEFÈVRE HÉLÈNE");
    }
}

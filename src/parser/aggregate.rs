use serde::{Deserialize, Serialize};

use super::lots::LotEntry;
use super::owners::Owner;

pub const UNKNOWN_OWNER: &str = "Unknown";
pub const NO_ADDRESS: &str = "Address not detected";

/// One lot joined with the consolidated owners of its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub proprietaire: String,
    pub adresse: String,
    pub lot: String,
    #[serde(rename = "quotePart")]
    pub quote_part: String,
    pub section: String,
    pub plan: String,
}

/// Owner names joined with ` / `.
pub fn combined_name(owners: &[Owner]) -> String {
    if owners.is_empty() {
        return UNKNOWN_OWNER.to_string();
    }
    owners
        .iter()
        .map(|o| o.name.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Distinct detected addresses, in order of first appearance, joined with ` | `.
pub fn combined_address(owners: &[Owner]) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for owner in owners.iter().filter(|o| o.has_address()) {
        if !distinct.contains(&owner.address.as_str()) {
            distinct.push(&owner.address);
        }
    }
    if distinct.is_empty() {
        NO_ADDRESS.to_string()
    } else {
        distinct.join(" | ")
    }
}

/// Every lot gets the same owner and address strings: co-ownership lives here,
/// lots are never duplicated per owner.
pub fn join(owners: &[Owner], lots: &[LotEntry]) -> Vec<PropertyRecord> {
    if lots.is_empty() {
        return Vec::new();
    }
    let proprietaire = combined_name(owners);
    let adresse = combined_address(owners);

    lots.iter()
        .map(|lot| PropertyRecord {
            proprietaire: proprietaire.clone(),
            adresse: adresse.clone(),
            lot: lot.lot_number.clone(),
            quote_part: lot.quota_share.clone(),
            section: lot.section.clone(),
            plan: lot.plan.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lots::PLAN_NOT_DETECTED;
    use crate::parser::owners::{ADDRESS_NOT_DETECTED, NO_HOLDER_ID};

    fn owner(name: &str, address: &str) -> Owner {
        Owner {
            name: name.to_string(),
            address: address.to_string(),
            holder_id: NO_HOLDER_ID.to_string(),
        }
    }

    fn lot(number: &str, quota: &str) -> LotEntry {
        LotEntry {
            lot_number: number.to_string(),
            quota_share: quota.to_string(),
            section: "AS".to_string(),
            plan: PLAN_NOT_DETECTED.to_string(),
        }
    }

    #[test]
    fn names_joined_in_order() {
        let owners = [owner("NAME1 GIVEN1", "A"), owner("NAME2 GIVEN2", "B")];
        assert_eq!(combined_name(&owners), "NAME1 GIVEN1 / NAME2 GIVEN2");
        assert_eq!(combined_name(&[]), UNKNOWN_OWNER);
    }

    #[test]
    fn addresses_distinct_first_seen() {
        let owners = [
            owner("A", "2 RUE X"),
            owner("B", ADDRESS_NOT_DETECTED),
            owner("C", "1 RUE Y"),
            owner("D", "2 RUE X"),
        ];
        assert_eq!(combined_address(&owners), "2 RUE X | 1 RUE Y");
    }

    #[test]
    fn address_sentinel_only_when_nothing_detected() {
        let owners = [owner("A", ADDRESS_NOT_DETECTED), owner("B", ADDRESS_NOT_DETECTED)];
        assert_eq!(combined_address(&owners), NO_ADDRESS);
        assert_eq!(combined_address(&[]), NO_ADDRESS);
        assert_ne!(combined_address(&[owner("A", "3 RUE Z")]), NO_ADDRESS);
    }

    #[test]
    fn every_lot_shares_owner_strings() {
        let owners = [owner("NAME1 GIVEN1", "1 RUE A"), owner("NAME2 GIVEN2", "1 RUE A")];
        let lots = [lot("0000001", "1/10"), lot("0000002", "9/10")];
        let records = join(&owners, &lots);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.proprietaire == "NAME1 GIVEN1 / NAME2 GIVEN2"));
        assert!(records.iter().all(|r| r.adresse == "1 RUE A"));
        assert_eq!(records[1].lot, "0000002");
        assert_eq!(records[1].quote_part, "9/10");
    }

    #[test]
    fn lots_without_owners() {
        let records = join(&[], &[lot("0000005", "5/100")]);
        assert_eq!(records[0].proprietaire, UNKNOWN_OWNER);
        assert_eq!(records[0].adresse, NO_ADDRESS);
    }

    #[test]
    fn serialized_field_names() {
        let record = &join(&[owner("A", "B")], &[lot("0000237", "53/10000")])[0];
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["proprietaire"], "A");
        assert_eq!(value["adresse"], "B");
        assert_eq!(value["lot"], "0000237");
        assert_eq!(value["quotePart"], "53/10000");
        assert_eq!(value["section"], "AS");
    }
}

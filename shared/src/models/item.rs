//! Inventory item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of an item for ledger purposes.
///
/// Durable items are reserved and returned (borrow/return cycle);
/// consumable items are depleted one-way. The classification is fixed
/// after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Durable,
    Consumable,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Durable => "durable",
            ItemKind::Consumable => "consumable",
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "durable" => Ok(ItemKind::Durable),
            "consumable" => Ok(ItemKind::Consumable),
            other => Err(format!("unknown item kind: {other}")),
        }
    }
}

/// A tracked inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: ItemKind,
    /// Serial number, durable items only
    pub serial: Option<String>,
    /// Whether a durable item is flagged for maintenance
    pub in_maintenance: bool,
    /// Display unit label, e.g. "ชิ้น" / "pcs"
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_item_kind_round_trip() {
        for kind in [ItemKind::Durable, ItemKind::Consumable] {
            assert_eq!(ItemKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_item_kind_unknown() {
        assert!(ItemKind::from_str("perishable").is_err());
    }
}

//! Stock ledger models
//!
//! The ledger is the single source of truth for quantities: every change to
//! a (warehouse, item) balance is an immutable `LedgerEntry`, and the sum of
//! all entries for a pair always equals `StockLevel::quantity`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kinds of ledger entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Inbound,
    Outbound,
    TransferIn,
    TransferOut,
    Adjustment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Inbound => "inbound",
            EntryKind::Outbound => "outbound",
            EntryKind::TransferIn => "transfer_in",
            EntryKind::TransferOut => "transfer_out",
            EntryKind::Adjustment => "adjustment",
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(EntryKind::Inbound),
            "outbound" => Ok(EntryKind::Outbound),
            "transfer_in" => Ok(EntryKind::TransferIn),
            "transfer_out" => Ok(EntryKind::TransferOut),
            "adjustment" => Ok(EntryKind::Adjustment),
            other => Err(format!("unknown entry kind: {other}")),
        }
    }
}

/// One immutable, append-only quantity change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub kind: EntryKind,
    /// Signed quantity; negative for outbound movement. Never zero.
    pub quantity: i64,
    pub actor_id: Uuid,
    /// Request or transfer this entry was committed for, if any
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Current quantity-on-hand of one item at one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    /// Whether the current quantity breaches the configured minimum
    pub fn is_low(&self) -> bool {
        matches!(self.min_stock, Some(min) if self.quantity <= min)
    }
}

/// One delta to apply against a (warehouse, item) balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaRequest {
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    /// Signed quantity; must be non-zero
    pub quantity: i64,
    pub kind: EntryKind,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
}

/// Why a batch of deltas cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("delta {line} has zero quantity")]
    ZeroQuantity { line: usize },

    #[error(
        "delta {line} would drive stock negative: available {available}, requested {requested}"
    )]
    Insufficient {
        /// Index of the first violating delta
        line: usize,
        warehouse_id: Uuid,
        item_id: Uuid,
        available: i64,
        requested: i64,
    },
}

/// Check a batch of deltas against current balances, all-or-nothing.
///
/// Returns the post-batch balance of every touched pair, or the first
/// violation. Pairs absent from `balances` start at zero. Deltas are
/// evaluated in order, so several deltas on the same pair accumulate.
///
/// This is the pure form of the rule the ledger service enforces under row
/// locks; it is also what the workflow tests exercise.
pub fn plan_batch(
    balances: &HashMap<(Uuid, Uuid), i64>,
    deltas: &[DeltaRequest],
) -> Result<HashMap<(Uuid, Uuid), i64>, BatchError> {
    let mut result: HashMap<(Uuid, Uuid), i64> = HashMap::new();

    for (line, delta) in deltas.iter().enumerate() {
        if delta.quantity == 0 {
            return Err(BatchError::ZeroQuantity { line });
        }

        let key = (delta.warehouse_id, delta.item_id);
        let current = result
            .get(&key)
            .copied()
            .or_else(|| balances.get(&key).copied())
            .unwrap_or(0);
        let next = current + delta.quantity;

        if next < 0 {
            return Err(BatchError::Insufficient {
                line,
                warehouse_id: delta.warehouse_id,
                item_id: delta.item_id,
                available: current,
                requested: -delta.quantity,
            });
        }

        result.insert(key, next);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(warehouse_id: Uuid, item_id: Uuid, quantity: i64) -> DeltaRequest {
        DeltaRequest {
            warehouse_id,
            item_id,
            quantity,
            kind: if quantity < 0 {
                EntryKind::Outbound
            } else {
                EntryKind::Inbound
            },
            reference_id: None,
            note: None,
        }
    }

    #[test]
    fn test_plan_batch_missing_pair_starts_at_zero() {
        let wh = Uuid::new_v4();
        let item = Uuid::new_v4();
        let planned = plan_batch(&HashMap::new(), &[delta(wh, item, 5)]).unwrap();
        assert_eq!(planned[&(wh, item)], 5);
    }

    #[test]
    fn test_plan_batch_rejects_zero_delta() {
        let wh = Uuid::new_v4();
        let item = Uuid::new_v4();
        let err = plan_batch(&HashMap::new(), &[delta(wh, item, 0)]).unwrap_err();
        assert_eq!(err, BatchError::ZeroQuantity { line: 0 });
    }

    #[test]
    fn test_plan_batch_names_first_violating_line() {
        let wh = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut balances = HashMap::new();
        balances.insert((wh, a), 10);
        balances.insert((wh, b), 1);

        let err = plan_batch(&balances, &[delta(wh, a, -2), delta(wh, b, -3)]).unwrap_err();
        assert_eq!(
            err,
            BatchError::Insufficient {
                line: 1,
                warehouse_id: wh,
                item_id: b,
                available: 1,
                requested: 3,
            }
        );
    }

    #[test]
    fn test_plan_batch_accumulates_same_pair() {
        let wh = Uuid::new_v4();
        let item = Uuid::new_v4();
        let mut balances = HashMap::new();
        balances.insert((wh, item), 3);

        // -2 then -2 exceeds 3 even though each alone would fit
        let err = plan_batch(&balances, &[delta(wh, item, -2), delta(wh, item, -2)]).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Insufficient {
                line: 1,
                available: 1,
                requested: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_stock_level_is_low() {
        let level = StockLevel {
            id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity: 9,
            min_stock: Some(10),
            max_stock: None,
            updated_at: Utc::now(),
        };
        assert!(level.is_low());

        let no_threshold = StockLevel {
            min_stock: None,
            ..level.clone()
        };
        assert!(!no_threshold.is_low());
    }
}

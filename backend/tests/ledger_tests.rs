//! Ledger planning tests for the HR-IMS backend
//!
//! Exercises the pure batch-planning rule the ledger service runs against
//! row-locked balances: replayed deltas reproduce balances, batches are
//! all-or-nothing, and a balance can never be planned below zero.

use std::collections::HashMap;

use proptest::prelude::*;
use uuid::Uuid;

use shared::models::{plan_batch, BatchError, DeltaRequest, EntryKind};

fn delta(warehouse_id: Uuid, item_id: Uuid, quantity: i64) -> DeltaRequest {
    let kind = if quantity >= 0 {
        EntryKind::Inbound
    } else {
        EntryKind::Outbound
    };
    DeltaRequest {
        warehouse_id,
        item_id,
        quantity,
        kind,
        reference_id: None,
        note: None,
    }
}

// ============================================================================
// Balances replay from the ledger
// ============================================================================
// Starting from any balance, applying a batch of deltas leaves each touched
// pair at its starting balance plus the sum of its deltas.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A successful plan leaves every pair at start + sum(deltas for pair)
    #[test]
    fn planned_balance_is_start_plus_delta_sum(
        start in 0i64..10_000,
        quantities in prop::collection::vec(-50i64..50, 1..20),
    ) {
        let wh = Uuid::new_v4();
        let item = Uuid::new_v4();
        let balances = HashMap::from([((wh, item), start)]);

        let deltas: Vec<DeltaRequest> = quantities
            .iter()
            .filter(|&&q| q != 0)
            .map(|&q| delta(wh, item, q))
            .collect();
        prop_assume!(!deltas.is_empty());

        let total: i64 = deltas.iter().map(|d| d.quantity).sum();

        match plan_batch(&balances, &deltas) {
            Ok(planned) => {
                prop_assert_eq!(planned[&(wh, item)], start + total);
            }
            Err(BatchError::Insufficient { .. }) => {
                // Some prefix dipped below zero; a single final balance check
                // must not have been enough to reject it.
                let mut running = start;
                let mut dipped = false;
                for d in &deltas {
                    running += d.quantity;
                    if running < 0 {
                        dipped = true;
                        break;
                    }
                }
                prop_assert!(dipped, "rejected batch never went negative");
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A successful plan never contains a negative balance
    #[test]
    fn planned_balances_are_never_negative(
        starts in prop::collection::vec(0i64..500, 1..5),
        quantities in prop::collection::vec(-100i64..100, 1..30),
    ) {
        let pairs: Vec<(Uuid, Uuid)> = starts
            .iter()
            .map(|_| (Uuid::new_v4(), Uuid::new_v4()))
            .collect();
        let balances: HashMap<(Uuid, Uuid), i64> = pairs
            .iter()
            .copied()
            .zip(starts.iter().copied())
            .collect();

        let deltas: Vec<DeltaRequest> = quantities
            .iter()
            .enumerate()
            .filter(|(_, &q)| q != 0)
            .map(|(i, &q)| {
                let (wh, item) = pairs[i % pairs.len()];
                delta(wh, item, q)
            })
            .collect();
        prop_assume!(!deltas.is_empty());

        if let Ok(planned) = plan_batch(&balances, &deltas) {
            for (&pair, &quantity) in &planned {
                prop_assert!(
                    quantity >= 0,
                    "pair {:?} planned to negative balance {}",
                    pair,
                    quantity
                );
            }
        }
    }

    /// An untouched pair starts from zero, so any leading debit fails
    #[test]
    fn debit_from_unknown_pair_fails(amount in 1i64..1_000) {
        let balances = HashMap::new();
        let deltas = [delta(Uuid::new_v4(), Uuid::new_v4(), -amount)];

        let err = plan_batch(&balances, &deltas).unwrap_err();
        match err {
            BatchError::Insufficient { line, available, requested, .. } => {
                assert_eq!(line, 0);
                assert_eq!(available, 0);
                assert_eq!(requested, amount);
            }
            other => panic!("expected Insufficient, got {other}"),
        }
    }
}

// ============================================================================
// All-or-nothing batches
// ============================================================================
// A rejected batch reports the first violating line; earlier feasible lines
// do not make a partially-applied result.

#[test]
fn test_failure_names_first_violating_line() {
    let wh = Uuid::new_v4();
    let item_a = Uuid::new_v4();
    let item_b = Uuid::new_v4();
    let balances = HashMap::from([((wh, item_a), 10), ((wh, item_b), 3)]);

    // Line 0 is fine, line 1 over-debits item_b, line 2 never evaluated
    let deltas = [
        delta(wh, item_a, -5),
        delta(wh, item_b, -4),
        delta(wh, item_a, -1),
    ];

    match plan_batch(&balances, &deltas) {
        Err(BatchError::Insufficient {
            line,
            warehouse_id,
            item_id,
            available,
            requested,
        }) => {
            assert_eq!(line, 1);
            assert_eq!(warehouse_id, wh);
            assert_eq!(item_id, item_b);
            assert_eq!(available, 3);
            assert_eq!(requested, 4);
        }
        other => panic!("expected Insufficient on line 1, got {other:?}"),
    }
}

#[test]
fn test_deltas_accumulate_within_a_batch() {
    let wh = Uuid::new_v4();
    let item = Uuid::new_v4();
    let balances = HashMap::from([((wh, item), 5)]);

    // 5 - 3 - 3 dips below zero even though each debit alone is feasible
    let deltas = [delta(wh, item, -3), delta(wh, item, -3)];

    match plan_batch(&balances, &deltas) {
        Err(BatchError::Insufficient { line, available, .. }) => {
            assert_eq!(line, 1);
            assert_eq!(available, 2);
        }
        other => panic!("expected accumulated Insufficient, got {other:?}"),
    }
}

#[test]
fn test_refill_within_batch_allows_later_debit() {
    let wh = Uuid::new_v4();
    let item = Uuid::new_v4();
    let balances = HashMap::from([((wh, item), 0)]);

    let deltas = [delta(wh, item, 10), delta(wh, item, -7)];

    let planned = plan_batch(&balances, &deltas).unwrap();
    assert_eq!(planned[&(wh, item)], 3);
}

#[test]
fn test_zero_quantity_line_is_rejected() {
    let wh = Uuid::new_v4();
    let item = Uuid::new_v4();
    let balances = HashMap::from([((wh, item), 10)]);

    let deltas = [delta(wh, item, 5), delta(wh, item, 0)];

    match plan_batch(&balances, &deltas) {
        Err(BatchError::ZeroQuantity { line }) => assert_eq!(line, 1),
        other => panic!("expected ZeroQuantity on line 1, got {other:?}"),
    }
}

//! Low-stock alerting tests for the HR-IMS backend
//!
//! The alert message doubles as the deduplication key: while an unread copy
//! exists for a manager, no new row is created. These tests pin down the
//! properties that make that scheme correct.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use shared::models::{low_stock_message, should_alert, StockLevel};

fn level(quantity: i64, min_stock: Option<i64>) -> StockLevel {
    StockLevel {
        id: Uuid::new_v4(),
        warehouse_id: Uuid::new_v4(),
        item_id: Uuid::new_v4(),
        quantity,
        min_stock,
        max_stock: None,
        updated_at: Utc::now(),
    }
}

// ============================================================================
// The message is a stable dedup key
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The same breach condition always produces the same message pair, no
    /// matter how far below the threshold the quantity has fallen. Quantities
    /// are deliberately absent from the signature, so two levels at different
    /// depths below the same threshold share one dedup key.
    #[test]
    fn message_is_independent_of_current_quantity(min_stock in 1i64..1_000) {
        let first = low_stock_message("Projector", "WH-HQ", min_stock);
        let second = low_stock_message("Projector", "WH-HQ", min_stock);
        prop_assert_eq!(first, second);
    }

    /// Both language variants carry the item, warehouse, and threshold
    #[test]
    fn message_names_the_breach(min_stock in 1i64..1_000) {
        let (en, th) = low_stock_message("HDMI Cable", "WH-ANNEX", min_stock);
        let threshold = min_stock.to_string();

        prop_assert!(en.contains("HDMI Cable"));
        prop_assert!(en.contains("WH-ANNEX"));
        prop_assert!(en.contains(&threshold));
        prop_assert!(th.contains("HDMI Cable"));
        prop_assert!(th.contains("WH-ANNEX"));
        prop_assert!(th.contains(&threshold));
    }

    /// A further drop below the same threshold, while the first alert is
    /// still unread, never creates a second notification: the quantity is
    /// not in the message, so the dedup decision sees an exact duplicate.
    #[test]
    fn repeated_breach_is_suppressed_while_unread(min_stock in 1i64..1_000) {
        let (first, _) = low_stock_message("Projector", "WH-HQ", min_stock);
        let (second, _) = low_stock_message("Projector", "WH-HQ", min_stock);

        let unread = vec![first];
        prop_assert!(!should_alert(&unread, &second));
    }

    /// Once the alert is read it leaves the unread set, and the same breach
    /// alerts again on the next mutation.
    #[test]
    fn breach_realerts_after_read(min_stock in 1i64..1_000) {
        let (message, _) = low_stock_message("Projector", "WH-HQ", min_stock);
        prop_assert!(should_alert(&[], &message));
    }

    /// An unread alert for one breach never suppresses a different breach
    #[test]
    fn unrelated_unread_alerts_do_not_suppress(
        min_a in 1i64..500,
        min_b in 501i64..1_000,
    ) {
        let (chair, _) = low_stock_message("Chair", "WH-HQ", min_a);
        let (desk, _) = low_stock_message("Desk", "WH-HQ", min_a);
        let (other_threshold, _) = low_stock_message("Chair", "WH-HQ", min_b);

        let unread = vec![chair];
        prop_assert!(should_alert(&unread, &desk));
        prop_assert!(should_alert(&unread, &other_threshold));
    }

    /// Changing any part of the breach condition changes the key
    #[test]
    fn distinct_breaches_get_distinct_keys(
        min_a in 1i64..500,
        min_b in 501i64..1_000,
    ) {
        let by_threshold_a = low_stock_message("Chair", "WH-HQ", min_a);
        let by_threshold_b = low_stock_message("Chair", "WH-HQ", min_b);
        prop_assert_ne!(by_threshold_a, by_threshold_b);

        let by_item = low_stock_message("Desk", "WH-HQ", min_a);
        prop_assert_ne!(low_stock_message("Chair", "WH-HQ", min_a), by_item);

        let by_warehouse = low_stock_message("Chair", "WH-ANNEX", min_a);
        prop_assert_ne!(low_stock_message("Chair", "WH-HQ", min_a), by_warehouse);
    }
}

// ============================================================================
// Breach detection boundary
// ============================================================================
// An alert fires at quantity <= min_stock; no threshold means no alert.

#[test]
fn test_breach_boundary_is_inclusive() {
    assert!(level(10, Some(10)).is_low());
    assert!(level(9, Some(10)).is_low());
    assert!(!level(11, Some(10)).is_low());
}

#[test]
fn test_no_threshold_never_breaches() {
    assert!(!level(0, None).is_low());
    assert!(!level(1_000, None).is_low());
}

#[test]
fn test_zero_threshold_fires_only_at_zero() {
    assert!(level(0, Some(0)).is_low());
    assert!(!level(1, Some(0)).is_low());
}

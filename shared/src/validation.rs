//! Validation utilities for the HR-IMS inventory platform

use uuid::Uuid;

use crate::models::RequestType;

/// Validate a positive unit quantity (request lines, transfers)
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate that a transfer moves between two distinct warehouses
pub fn validate_transfer_route(from: Uuid, to: Uuid) -> Result<(), &'static str> {
    if from == to {
        return Err("Source and destination warehouse must differ");
    }
    Ok(())
}

/// Validate the line items of a request
pub fn validate_request_lines(lines: &[(Uuid, i64)]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one item is required");
    }
    for (_, quantity) in lines {
        validate_quantity(*quantity)?;
    }
    Ok(())
}

/// The distinct item ids a set of request lines references.
///
/// Lines may legitimately repeat an item (the deltas accumulate); existence
/// checks must compare against the distinct set, not the line count.
pub fn distinct_item_ids(lines: &[(Uuid, i64)]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = lines.iter().map(|(item_id, _)| *item_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Validate that a due date is only supplied where it makes sense
pub fn validate_due_date(request_type: RequestType, has_due_date: bool) -> Result<(), &'static str> {
    if has_due_date && !request_type.allows_due_date() {
        return Err("Due date is only allowed for borrow requests");
    }
    Ok(())
}

/// Validate stock thresholds: non-negative and min below max when both set
pub fn validate_thresholds(min: Option<i64>, max: Option<i64>) -> Result<(), &'static str> {
    if let Some(min) = min {
        if min < 0 {
            return Err("Minimum stock cannot be negative");
        }
    }
    if let Some(max) = max {
        if max < 0 {
            return Err("Maximum stock cannot be negative");
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err("Minimum stock cannot exceed maximum stock");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_transfer_route() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_transfer_route(a, b).is_ok());
        assert!(validate_transfer_route(a, a).is_err());
    }

    #[test]
    fn test_validate_request_lines_empty() {
        assert!(validate_request_lines(&[]).is_err());
    }

    #[test]
    fn test_validate_request_lines_bad_quantity() {
        let lines = vec![(Uuid::new_v4(), 2), (Uuid::new_v4(), 0)];
        assert!(validate_request_lines(&lines).is_err());
    }

    #[test]
    fn test_distinct_item_ids_collapses_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![(a, 2), (b, 1), (a, 5)];

        let ids = distinct_item_ids(&lines);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
    }

    #[test]
    fn test_validate_due_date() {
        assert!(validate_due_date(RequestType::Borrow, true).is_ok());
        assert!(validate_due_date(RequestType::Withdraw, true).is_err());
        assert!(validate_due_date(RequestType::Withdraw, false).is_ok());
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(Some(5), Some(10)).is_ok());
        assert!(validate_thresholds(Some(10), Some(5)).is_err());
        assert!(validate_thresholds(Some(-1), None).is_err());
        assert!(validate_thresholds(None, None).is_ok());
    }
}

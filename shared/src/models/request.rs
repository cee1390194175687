//! User request models: withdraw / borrow / return workflows

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeltaRequest, EntryKind};

/// What the requester wants to do with the listed items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// One-way depletion of consumables
    Withdraw,
    /// Reserve durable units out of the available pool
    Borrow,
    /// Restore previously borrowed units to the pool
    Return,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Withdraw => "withdraw",
            RequestType::Borrow => "borrow",
            RequestType::Return => "return",
        }
    }

    /// Only borrow requests carry a due date
    pub fn allows_due_date(&self) -> bool {
        matches!(self, RequestType::Borrow)
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "withdraw" => Ok(RequestType::Withdraw),
            "borrow" => Ok(RequestType::Borrow),
            "return" => Ok(RequestType::Return),
            other => Err(format!("unknown request type: {other}")),
        }
    }
}

/// Lifecycle of a request.
///
/// A request leaves `Pending` exactly once and never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Whether a transition from `self` to `next` is allowed
    pub fn can_become(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (
                RequestStatus::Pending,
                RequestStatus::Approved | RequestStatus::Rejected
            )
        )
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// A user-submitted intent to withdraw, borrow, or return items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub requester_id: Uuid,
    /// Warehouse the request draws from (the requester's assigned warehouse)
    pub warehouse_id: Uuid,
    pub request_type: RequestType,
    pub status: RequestStatus,
    /// Due date, borrow requests only
    pub due_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub approver_id: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One line of a request: an item and how many units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLine {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
}

/// Translate request lines into the signed ledger deltas an approval commits.
///
/// Withdraw and borrow both draw units out of the pool (negative outbound);
/// return restores them (positive inbound). The due date of a borrow lives
/// on the request, not in the ledger.
pub fn line_deltas(
    request_type: RequestType,
    warehouse_id: Uuid,
    request_id: Uuid,
    lines: &[RequestLine],
) -> Vec<DeltaRequest> {
    lines
        .iter()
        .map(|line| {
            let (kind, quantity) = match request_type {
                RequestType::Withdraw | RequestType::Borrow => {
                    (EntryKind::Outbound, -line.quantity)
                }
                RequestType::Return => (EntryKind::Inbound, line.quantity),
            };
            DeltaRequest {
                warehouse_id,
                item_id: line.item_id,
                quantity,
                kind,
                reference_id: Some(request_id),
                note: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: Uuid, quantity: i64) -> RequestLine {
        RequestLine {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            item_id,
            quantity,
        }
    }

    #[test]
    fn test_transitions_only_out_of_pending() {
        assert!(RequestStatus::Pending.can_become(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_become(RequestStatus::Rejected));
        assert!(!RequestStatus::Approved.can_become(RequestStatus::Rejected));
        assert!(!RequestStatus::Rejected.can_become(RequestStatus::Approved));
        assert!(!RequestStatus::Approved.can_become(RequestStatus::Approved));
    }

    #[test]
    fn test_withdraw_lines_become_negative_outbound() {
        let wh = Uuid::new_v4();
        let request_id = Uuid::new_v4();
        let item = Uuid::new_v4();

        let deltas = line_deltas(RequestType::Withdraw, wh, request_id, &[line(item, 4)]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].quantity, -4);
        assert_eq!(deltas[0].kind, EntryKind::Outbound);
        assert_eq!(deltas[0].reference_id, Some(request_id));
    }

    #[test]
    fn test_borrow_draws_from_pool_like_withdraw() {
        let deltas = line_deltas(
            RequestType::Borrow,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[line(Uuid::new_v4(), 2)],
        );
        assert_eq!(deltas[0].quantity, -2);
        assert_eq!(deltas[0].kind, EntryKind::Outbound);
    }

    #[test]
    fn test_return_restores_to_pool() {
        let deltas = line_deltas(
            RequestType::Return,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[line(Uuid::new_v4(), 2)],
        );
        assert_eq!(deltas[0].quantity, 2);
        assert_eq!(deltas[0].kind, EntryKind::Inbound);
    }

    #[test]
    fn test_due_date_only_for_borrow() {
        assert!(RequestType::Borrow.allows_due_date());
        assert!(!RequestType::Withdraw.allows_due_date());
        assert!(!RequestType::Return.allows_due_date());
    }
}

//! Inter-warehouse transfer models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeltaRequest, EntryKind};

/// Lifecycle of a transfer.
///
/// `Approved` exists for API compatibility but approval commits straight to
/// `Completed`; the terminal states are `Rejected` and `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
        }
    }

    /// Whether a transition from `self` to `next` is allowed
    pub fn can_become(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (
                TransferStatus::Pending,
                TransferStatus::Rejected | TransferStatus::Completed
            )
        )
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "approved" => Ok(TransferStatus::Approved),
            "rejected" => Ok(TransferStatus::Rejected),
            "completed" => Ok(TransferStatus::Completed),
            other => Err(format!("unknown transfer status: {other}")),
        }
    }
}

/// An intent to move a quantity of one item between two warehouses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub status: TransferStatus,
    pub requester_id: Uuid,
    pub approver_id: Option<Uuid>,
    pub note: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// The paired debit/credit an approval commits as one batch.
    ///
    /// Debit first so the source shortfall, not the destination, is the
    /// violation a failed batch reports.
    pub fn legs(&self) -> [DeltaRequest; 2] {
        [
            DeltaRequest {
                warehouse_id: self.from_warehouse_id,
                item_id: self.item_id,
                quantity: -self.quantity,
                kind: EntryKind::TransferOut,
                reference_id: Some(self.id),
                note: self.note.clone(),
            },
            DeltaRequest {
                warehouse_id: self.to_warehouse_id,
                item_id: self.item_id,
                quantity: self.quantity,
                kind: EntryKind::TransferIn,
                reference_id: Some(self.id),
                note: self.note.clone(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(quantity: i64) -> Transfer {
        Transfer {
            id: Uuid::new_v4(),
            from_warehouse_id: Uuid::new_v4(),
            to_warehouse_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            status: TransferStatus::Pending,
            requester_id: Uuid::new_v4(),
            approver_id: None,
            note: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_legs_conserve_quantity() {
        let t = transfer(5);
        let [out, incoming] = t.legs();
        assert_eq!(out.quantity + incoming.quantity, 0);
        assert_eq!(out.kind, EntryKind::TransferOut);
        assert_eq!(incoming.kind, EntryKind::TransferIn);
        assert_eq!(out.warehouse_id, t.from_warehouse_id);
        assert_eq!(incoming.warehouse_id, t.to_warehouse_id);
    }

    #[test]
    fn test_legs_reference_the_transfer() {
        let t = transfer(3);
        for leg in t.legs() {
            assert_eq!(leg.reference_id, Some(t.id));
        }
    }

    #[test]
    fn test_transitions_only_out_of_pending() {
        assert!(TransferStatus::Pending.can_become(TransferStatus::Completed));
        assert!(TransferStatus::Pending.can_become(TransferStatus::Rejected));
        assert!(!TransferStatus::Completed.can_become(TransferStatus::Rejected));
        assert!(!TransferStatus::Rejected.can_become(TransferStatus::Completed));
    }
}

//! Stock transfer workflow service
//!
//! A transfer moves quantity between two warehouses. It is created pending
//! and approval commits both legs (debit at the source, credit at the
//! destination) in the same transaction as the status flip, so the move is
//! atomic and total quantity across warehouses is conserved.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{Transfer, TransferStatus};
use shared::validation::{validate_quantity, validate_transfer_route};

use crate::config::RetryConfig;
use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use crate::services::notification::NotificationService;
use crate::services::retry::with_conflict_retry;

/// Transfer workflow service
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    ledger: LedgerService,
    notifier: NotificationService,
    retry: RetryConfig,
}

/// Input for creating a transfer
#[derive(Debug, Deserialize)]
pub struct CreateTransferInput {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub requester_id: Uuid,
    pub note: Option<String>,
}

/// Filters for listing transfers
#[derive(Debug, Default, Deserialize)]
pub struct TransferFilter {
    pub status: Option<TransferStatus>,
    /// Matches transfers touching the warehouse on either end
    pub warehouse_id: Option<Uuid>,
}

/// Row for transfer queries; status is stored as text
#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    from_warehouse_id: Uuid,
    to_warehouse_id: Uuid,
    item_id: Uuid,
    quantity: i64,
    status: String,
    requester_id: Uuid,
    approver_id: Option<Uuid>,
    note: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TransferRow {
    fn into_transfer(self) -> AppResult<Transfer> {
        Ok(Transfer {
            id: self.id,
            from_warehouse_id: self.from_warehouse_id,
            to_warehouse_id: self.to_warehouse_id,
            item_id: self.item_id,
            quantity: self.quantity,
            status: TransferStatus::from_str(&self.status).map_err(AppError::Internal)?,
            requester_id: self.requester_id,
            approver_id: self.approver_id,
            note: self.note,
            completed_at: self.completed_at,
            created_at: self.created_at,
        })
    }
}

const TRANSFER_COLUMNS: &str = "id, from_warehouse_id, to_warehouse_id, item_id, quantity, \
                                status, requester_id, approver_id, note, completed_at, created_at";

impl TransferService {
    /// Create a new TransferService instance
    pub fn new(db: PgPool, retry: RetryConfig) -> Self {
        let ledger = LedgerService::new(db.clone());
        let notifier = NotificationService::new(db.clone());
        Self {
            db,
            ledger,
            notifier,
            retry,
        }
    }

    /// Create a pending transfer.
    ///
    /// Availability at the source is not checked here; it is checked under
    /// lock at approval time, which is the moment stock actually moves.
    pub async fn create(&self, input: CreateTransferInput) -> AppResult<Transfer> {
        validate_transfer_route(input.from_warehouse_id, input.to_warehouse_id)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
        validate_quantity(input.quantity)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        self.ledger
            .ensure_warehouse_exists(input.from_warehouse_id)
            .await?;
        self.ledger
            .ensure_warehouse_exists(input.to_warehouse_id)
            .await?;
        self.ledger.ensure_item_exists(input.item_id).await?;

        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            INSERT INTO transfers
                (from_warehouse_id, to_warehouse_id, item_id, quantity, status, requester_id, note)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(input.item_id)
        .bind(input.quantity)
        .bind(input.requester_id)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await?;

        row.into_transfer()
    }

    /// Approve a pending transfer, moving the stock immediately
    pub async fn approve(&self, transfer_id: Uuid, approver_id: Uuid) -> AppResult<Transfer> {
        with_conflict_retry(self.retry, || self.try_approve(transfer_id, approver_id)).await
    }

    async fn try_approve(&self, transfer_id: Uuid, approver_id: Uuid) -> AppResult<Transfer> {
        let mut tx = self.db.begin().await?;

        // Guarded transition shares the transaction with both ledger legs.
        // An approved transfer is completed in the same step; there is no
        // separate execution phase.
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE transfers
            SET status = 'completed', approver_id = $2, completed_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(transfer_id)
        .bind(approver_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(self.not_pending_error(transfer_id).await?);
        };

        let transfer = row.into_transfer()?;
        let legs = transfer.legs();

        let (_entries, breaches) = self
            .ledger
            .apply_batch_tx(&mut tx, &legs, approver_id)
            .await?;

        tx.commit().await?;

        self.notifier.notify_low_stock(&breaches).await;

        Ok(transfer)
    }

    /// Reject a pending transfer; no stock moves
    pub async fn reject(&self, transfer_id: Uuid, approver_id: Uuid) -> AppResult<Transfer> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE transfers
            SET status = 'rejected', approver_id = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(transfer_id)
        .bind(approver_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_transfer(),
            None => Err(self.not_pending_error(transfer_id).await?),
        }
    }

    /// Get one transfer
    pub async fn get(&self, transfer_id: Uuid) -> AppResult<Transfer> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1"
        ))
        .bind(transfer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        row.into_transfer()
    }

    /// List transfers with optional filters, newest first
    pub async fn list(&self, filter: TransferFilter) -> AppResult<Vec<Transfer>> {
        let rows = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            SELECT {TRANSFER_COLUMNS} FROM transfers
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR from_warehouse_id = $2 OR to_warehouse_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.warehouse_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TransferRow::into_transfer).collect()
    }

    async fn not_pending_error(&self, transfer_id: Uuid) -> AppResult<AppError> {
        let status =
            sqlx::query_scalar::<_, String>("SELECT status FROM transfers WHERE id = $1")
                .bind(transfer_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(match status {
            Some(current) => AppError::InvalidState {
                entity: "Transfer".to_string(),
                current,
            },
            None => AppError::NotFound("Transfer".to_string()),
        })
    }
}

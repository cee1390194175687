//! Request workflow service: withdraw / borrow / return approvals
//!
//! A request leaves `pending` exactly once. Approval flips the status and
//! commits every line's ledger delta in one transaction, so a race between
//! two approvers yields exactly one stock commit and one invalid-state
//! failure, and an insufficient batch leaves the request pending untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{line_deltas, Request, RequestLine, RequestStatus, RequestType};
use shared::validation::{distinct_item_ids, validate_due_date, validate_request_lines};

use crate::config::RetryConfig;
use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use crate::services::notification::NotificationService;
use crate::services::retry::with_conflict_retry;

/// Request workflow service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
    ledger: LedgerService,
    notifier: NotificationService,
    retry: RetryConfig,
}

/// Input for creating a request
#[derive(Debug, Deserialize)]
pub struct CreateRequestInput {
    pub requester_id: Uuid,
    /// Warehouse the request draws from (the requester's assigned warehouse)
    pub warehouse_id: Uuid,
    pub request_type: RequestType,
    pub due_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub lines: Vec<CreateRequestLine>,
}

/// One line of a new request
#[derive(Debug, Deserialize)]
pub struct CreateRequestLine {
    pub item_id: Uuid,
    pub quantity: i64,
}

/// Filters for listing requests
#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub requester_id: Option<Uuid>,
}

/// A request together with its line items
#[derive(Debug, serde::Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: Request,
    pub lines: Vec<RequestLine>,
}

/// Row for request queries; type and status are stored as text
#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    requester_id: Uuid,
    warehouse_id: Uuid,
    request_type: String,
    status: String,
    due_date: Option<NaiveDate>,
    note: Option<String>,
    approver_id: Option<Uuid>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_request(self) -> AppResult<Request> {
        Ok(Request {
            id: self.id,
            requester_id: self.requester_id,
            warehouse_id: self.warehouse_id,
            request_type: RequestType::from_str(&self.request_type).map_err(AppError::Internal)?,
            status: RequestStatus::from_str(&self.status).map_err(AppError::Internal)?,
            due_date: self.due_date,
            note: self.note,
            approver_id: self.approver_id,
            decided_at: self.decided_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RequestLineRow {
    id: Uuid,
    request_id: Uuid,
    item_id: Uuid,
    quantity: i64,
}

impl From<RequestLineRow> for RequestLine {
    fn from(row: RequestLineRow) -> Self {
        RequestLine {
            id: row.id,
            request_id: row.request_id,
            item_id: row.item_id,
            quantity: row.quantity,
        }
    }
}

const REQUEST_COLUMNS: &str = "id, requester_id, warehouse_id, request_type, status, \
                               due_date, note, approver_id, decided_at, created_at";

impl RequestService {
    /// Create a new RequestService instance
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

    /// Create a pending request with its line items
    pub async fn create(&self, input: CreateRequestInput) -> AppResult<RequestDetail> {
        let line_pairs: Vec<(Uuid, i64)> = input
            .lines
            .iter()
            .map(|line| (line.item_id, line.quantity))
            .collect();
        validate_request_lines(&line_pairs)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
        validate_due_date(input.request_type, input.due_date.is_some())
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        self.ledger.ensure_warehouse_exists(input.warehouse_id).await?;

        // Lines may repeat an item (the deltas accumulate), so the existence
        // check compares against the distinct id set.
        let item_ids = distinct_item_ids(&line_pairs);
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT id) FROM items WHERE id = ANY($1)",
        )
        .bind(&item_ids)
        .fetch_one(&self.db)
        .await?;
        if known as usize != item_ids.len() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            INSERT INTO requests (requester_id, warehouse_id, request_type, status, due_date, note)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(input.requester_id)
        .bind(input.warehouse_id)
        .bind(input.request_type.as_str())
        .bind(input.due_date)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let line_row = sqlx::query_as::<_, RequestLineRow>(
                r#"
                INSERT INTO request_lines (request_id, item_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id, request_id, item_id, quantity
                "#,
            )
            .bind(row.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(line_row.into());
        }

        tx.commit().await?;

        Ok(RequestDetail {
            request: row.into_request()?,
            lines,
        })
    }

    /// Approve a pending request, committing all its line deltas atomically
    pub async fn approve(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> AppResult<RequestDetail> {
        with_conflict_retry(self.retry, || {
            self.try_approve(request_id, approver_id, due_date)
        })
        .await
    }

    async fn try_approve(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> AppResult<RequestDetail> {
        let mut tx = self.db.begin().await?;

        // Guarded transition: only a pending request can be approved, and the
        // status flip shares the transaction with the ledger commit below.
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE requests
            SET status = 'approved', approver_id = $2, decided_at = now(),
                due_date = COALESCE($3, due_date)
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(approver_id)
        .bind(due_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(self.not_pending_error(request_id).await?);
        };

        let request = row.into_request()?;
        validate_due_date(request.request_type, due_date.is_some())
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let lines: Vec<RequestLine> = sqlx::query_as::<_, RequestLineRow>(
            "SELECT id, request_id, item_id, quantity FROM request_lines \
             WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let deltas = line_deltas(
            request.request_type,
            request.warehouse_id,
            request.id,
            &lines,
        );

        let (_entries, breaches) = self
            .ledger
            .apply_batch_tx(&mut tx, &deltas, approver_id)
            .await?;

        tx.commit().await?;

        self.notifier.notify_low_stock(&breaches).await;

        Ok(RequestDetail { request, lines })
    }

    /// Reject a pending request; no ledger interaction
    pub async fn reject(&self, request_id: Uuid, approver_id: Uuid) -> AppResult<Request> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE requests
            SET status = 'rejected', approver_id = $2, decided_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(approver_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_request(),
            None => Err(self.not_pending_error(request_id).await?),
        }
    }

    /// Get a request with its lines
    pub async fn get(&self, request_id: Uuid) -> AppResult<RequestDetail> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?;

        let lines = sqlx::query_as::<_, RequestLineRow>(
            "SELECT id, request_id, item_id, quantity FROM request_lines \
             WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(RequestDetail {
            request: row.into_request()?,
            lines,
        })
    }

    /// List requests with optional filters, newest first
    pub async fn list(&self, filter: RequestFilter) -> AppResult<Vec<Request>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR requester_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.requester_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RequestRow::into_request).collect()
    }

    /// Build the error for a transition attempt on a missing or already
    /// handled request. Returned as `Ok(error)` so callers can `?` the
    /// lookup itself.
    async fn not_pending_error(&self, request_id: Uuid) -> AppResult<AppError> {
        let status =
            sqlx::query_scalar::<_, String>("SELECT status FROM requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(match status {
            Some(current) => AppError::InvalidState {
                entity: "Request".to_string(),
                current,
            },
            None => AppError::NotFound("Request".to_string()),
        })
    }
}

//! Stock ledger service: authoritative quantity bookkeeping
//!
//! Every quantity change goes through here as an append-only `stock_entries`
//! row plus an update of the matching `stock_levels` row, inside one
//! transaction. Batches are all-or-nothing: the non-negative check runs
//! against row-locked balances immediately before the write, so two callers
//! racing on the last unit cannot both debit it.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{plan_batch, DeltaRequest, EntryKind, LedgerEntry, StockLevel};
use shared::types::{Page, PageParams};
use shared::validation::validate_thresholds;

use crate::error::{AppError, AppResult};
use crate::services::notification::NotificationService;

/// Ledger service for stock balances and the transaction history
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    notifier: NotificationService,
}

/// A (item, warehouse) pair whose post-mutation quantity breached its
/// configured minimum
#[derive(Debug, Clone)]
pub struct LowStockBreach {
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub min_stock: i64,
}

/// Filters for listing stock levels
#[derive(Debug, Default, serde::Deserialize)]
pub struct StockLevelFilter {
    pub warehouse_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    /// Only rows at or below their configured minimum
    pub low_stock: Option<bool>,
}

/// Row for stock level queries
#[derive(Debug, FromRow)]
struct StockLevelRow {
    id: Uuid,
    warehouse_id: Uuid,
    item_id: Uuid,
    quantity: i64,
    min_stock: Option<i64>,
    max_stock: Option<i64>,
    updated_at: DateTime<Utc>,
}

impl From<StockLevelRow> for StockLevel {
    fn from(row: StockLevelRow) -> Self {
        StockLevel {
            id: row.id,
            warehouse_id: row.warehouse_id,
            item_id: row.item_id,
            quantity: row.quantity,
            min_stock: row.min_stock,
            max_stock: row.max_stock,
            updated_at: row.updated_at,
        }
    }
}

/// Row for ledger entry queries; kind is stored as text
#[derive(Debug, FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    warehouse_id: Uuid,
    item_id: Uuid,
    kind: String,
    quantity: i64,
    actor_id: Uuid,
    reference_id: Option<Uuid>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl LedgerEntryRow {
    fn into_entry(self) -> AppResult<LedgerEntry> {
        let kind = EntryKind::from_str(&self.kind).map_err(AppError::Internal)?;
        Ok(LedgerEntry {
            id: self.id,
            warehouse_id: self.warehouse_id,
            item_id: self.item_id,
            kind,
            quantity: self.quantity,
            actor_id: self.actor_id,
            reference_id: self.reference_id,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "id, warehouse_id, item_id, kind, quantity, actor_id, reference_id, note, created_at";

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        let notifier = NotificationService::new(db.clone());
        Self { db, notifier }
    }

    /// Current quantity-on-hand for a pair; an untouched pair is simply zero
    pub async fn get_balance(&self, warehouse_id: Uuid, item_id: Uuid) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity FROM stock_levels WHERE warehouse_id = $1 AND item_id = $2",
        )
        .bind(warehouse_id)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Apply a single signed delta
    pub async fn apply_delta(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        quantity: i64,
        kind: EntryKind,
        actor_id: Uuid,
        reference_id: Option<Uuid>,
        note: Option<String>,
    ) -> AppResult<LedgerEntry> {
        let deltas = [DeltaRequest {
            warehouse_id,
            item_id,
            quantity,
            kind,
            reference_id,
            note,
        }];
        let mut entries = self.apply_batch(&deltas, actor_id).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Internal("ledger batch returned no entry".to_string()))
    }

    /// Apply a set of deltas as one all-or-nothing transaction
    pub async fn apply_batch(
        &self,
        deltas: &[DeltaRequest],
        actor_id: Uuid,
    ) -> AppResult<Vec<LedgerEntry>> {
        let mut tx = self.db.begin().await?;
        let (entries, breaches) = self.apply_batch_tx(&mut tx, deltas, actor_id).await?;
        tx.commit().await?;

        self.notifier.notify_low_stock(&breaches).await;

        Ok(entries)
    }

    /// Apply a batch inside an already-open transaction.
    ///
    /// Used by the request and transfer workflows so the status flip and the
    /// ledger commit share one transaction. The caller commits; the returned
    /// breaches must be handed to the notifier only after that commit.
    pub(crate) async fn apply_batch_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        deltas: &[DeltaRequest],
        actor_id: Uuid,
    ) -> AppResult<(Vec<LedgerEntry>, Vec<LowStockBreach>)> {
        if deltas.is_empty() {
            return Err(AppError::ValidationError(
                "At least one delta is required".to_string(),
            ));
        }

        // Lock every touched pair in deterministic order to avoid deadlocks
        // between concurrent batches.
        let pairs: BTreeSet<(Uuid, Uuid)> = deltas
            .iter()
            .map(|d| (d.warehouse_id, d.item_id))
            .collect();

        let mut balances: HashMap<(Uuid, Uuid), i64> = HashMap::new();
        let mut thresholds: HashMap<(Uuid, Uuid), Option<i64>> = HashMap::new();

        for (warehouse_id, item_id) in &pairs {
            // First mutation for a pair creates its row (upsert)
            sqlx::query(
                r#"
                INSERT INTO stock_levels (warehouse_id, item_id, quantity)
                VALUES ($1, $2, 0)
                ON CONFLICT (warehouse_id, item_id) DO NOTHING
                "#,
            )
            .bind(warehouse_id)
            .bind(item_id)
            .execute(&mut **tx)
            .await?;

            let (quantity, min_stock) = sqlx::query_as::<_, (i64, Option<i64>)>(
                "SELECT quantity, min_stock FROM stock_levels \
                 WHERE warehouse_id = $1 AND item_id = $2 FOR UPDATE",
            )
            .bind(warehouse_id)
            .bind(item_id)
            .fetch_one(&mut **tx)
            .await?;

            balances.insert((*warehouse_id, *item_id), quantity);
            thresholds.insert((*warehouse_id, *item_id), min_stock);
        }

        // All-or-nothing feasibility check against the locked balances. On
        // failure the transaction rolls back untouched and the error names
        // the first violating line.
        let planned = plan_batch(&balances, deltas)?;

        let mut entries = Vec::with_capacity(deltas.len());
        for delta in deltas {
            sqlx::query(
                "UPDATE stock_levels SET quantity = quantity + $3, updated_at = now() \
                 WHERE warehouse_id = $1 AND item_id = $2",
            )
            .bind(delta.warehouse_id)
            .bind(delta.item_id)
            .bind(delta.quantity)
            .execute(&mut **tx)
            .await?;

            let row = sqlx::query_as::<_, LedgerEntryRow>(&format!(
                r#"
                INSERT INTO stock_entries
                    (warehouse_id, item_id, kind, quantity, actor_id, reference_id, note)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {ENTRY_COLUMNS}
                "#
            ))
            .bind(delta.warehouse_id)
            .bind(delta.item_id)
            .bind(delta.kind.as_str())
            .bind(delta.quantity)
            .bind(actor_id)
            .bind(delta.reference_id)
            .bind(&delta.note)
            .fetch_one(&mut **tx)
            .await?;

            entries.push(row.into_entry()?);
        }

        let breaches = planned
            .iter()
            .filter_map(|(&(warehouse_id, item_id), &quantity)| {
                match thresholds.get(&(warehouse_id, item_id)).copied().flatten() {
                    Some(min_stock) if quantity <= min_stock => Some(LowStockBreach {
                        warehouse_id,
                        item_id,
                        quantity,
                        min_stock,
                    }),
                    _ => None,
                }
            })
            .collect();

        Ok((entries, breaches))
    }

    /// Manual stock adjustment (positive or negative)
    pub async fn adjust_stock(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        delta: i64,
        actor_id: Uuid,
        note: Option<String>,
    ) -> AppResult<LedgerEntry> {
        self.ensure_warehouse_exists(warehouse_id).await?;
        self.ensure_item_exists(item_id).await?;

        self.apply_delta(
            warehouse_id,
            item_id,
            delta,
            EntryKind::Adjustment,
            actor_id,
            None,
            note,
        )
        .await
    }

    /// Goods receipt: positive inbound deltas for one or more items
    pub async fn receive_goods(
        &self,
        warehouse_id: Uuid,
        items: &[(Uuid, i64)],
        actor_id: Uuid,
        reference_id: Option<Uuid>,
        note: Option<String>,
    ) -> AppResult<Vec<LedgerEntry>> {
        self.ensure_warehouse_exists(warehouse_id).await?;
        shared::validation::validate_request_lines(items).map_err(|msg| {
            AppError::ValidationError(msg.to_string())
        })?;

        let deltas: Vec<DeltaRequest> = items
            .iter()
            .map(|&(item_id, quantity)| DeltaRequest {
                warehouse_id,
                item_id,
                quantity,
                kind: EntryKind::Inbound,
                reference_id,
                note: note.clone(),
            })
            .collect();

        self.apply_batch(&deltas, actor_id).await
    }

    /// Update alert thresholds without touching quantity or the ledger
    pub async fn set_thresholds(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        min_stock: Option<i64>,
        max_stock: Option<i64>,
    ) -> AppResult<StockLevel> {
        validate_thresholds(min_stock, max_stock)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
        self.ensure_warehouse_exists(warehouse_id).await?;
        self.ensure_item_exists(item_id).await?;

        let row = sqlx::query_as::<_, StockLevelRow>(
            r#"
            INSERT INTO stock_levels (warehouse_id, item_id, quantity, min_stock, max_stock)
            VALUES ($1, $2, 0, $3, $4)
            ON CONFLICT (warehouse_id, item_id)
            DO UPDATE SET min_stock = $3, max_stock = $4, updated_at = now()
            RETURNING id, warehouse_id, item_id, quantity, min_stock, max_stock, updated_at
            "#,
        )
        .bind(warehouse_id)
        .bind(item_id)
        .bind(min_stock)
        .bind(max_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get one stock level row
    pub async fn get_stock_level(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<StockLevel> {
        let row = sqlx::query_as::<_, StockLevelRow>(
            "SELECT id, warehouse_id, item_id, quantity, min_stock, max_stock, updated_at \
             FROM stock_levels WHERE warehouse_id = $1 AND item_id = $2",
        )
        .bind(warehouse_id)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock level".to_string()))?;

        Ok(row.into())
    }

    /// List stock levels with optional filters
    pub async fn list_stock_levels(&self, filter: StockLevelFilter) -> AppResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT id, warehouse_id, item_id, quantity, min_stock, max_stock, updated_at
            FROM stock_levels
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
              AND (NOT $3 OR (min_stock IS NOT NULL AND quantity <= min_stock))
            ORDER BY updated_at DESC
            "#,
        )
        .bind(filter.warehouse_id)
        .bind(filter.item_id)
        .bind(filter.low_stock.unwrap_or(false))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Paged ledger history for one item, newest first
    pub async fn get_history(
        &self,
        item_id: Uuid,
        params: PageParams,
    ) -> AppResult<Page<LedgerEntry>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_entries WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, LedgerEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM stock_entries \
             WHERE item_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(item_id)
        .bind(i64::from(params.page_size()))
        .bind(params.offset())
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(LedgerEntryRow::into_entry)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(entries, params, total))
    }

    pub(crate) async fn ensure_warehouse_exists(&self, warehouse_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1)")
                .bind(warehouse_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }
        Ok(())
    }

    pub(crate) async fn ensure_item_exists(&self, item_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }
}

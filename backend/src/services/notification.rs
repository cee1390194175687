//! Low-stock notification service
//!
//! Reactive side of the ledger: after a mutation leaves a pair at or below
//! its minimum, every manager of the affected warehouse gets an in-app
//! notification. Alerts are deduplicated against unread notifications with
//! the same message, so repeated drops below the threshold do not spam, and
//! a fresh alert is raised once the manager has read the previous one.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{low_stock_message, should_alert, Notification};

use crate::error::{AppError, AppResult};
use crate::services::ledger::LowStockBreach;

/// Notification service for in-app alerts
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Row for notification queries
#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    message: String,
    message_th: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            message: row.message,
            message_th: row.message_th,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Raise deduplicated low-stock alerts for the given breaches.
    ///
    /// Called after the triggering ledger transaction has committed. This
    /// must never fail the mutation that caused it: any error here is
    /// logged and swallowed.
    pub async fn notify_low_stock(&self, breaches: &[LowStockBreach]) {
        for breach in breaches {
            if let Err(err) = self.alert_warehouse_managers(breach).await {
                tracing::warn!(
                    warehouse_id = %breach.warehouse_id,
                    item_id = %breach.item_id,
                    "failed to create low-stock notification: {err}"
                );
            }
        }
    }

    async fn alert_warehouse_managers(&self, breach: &LowStockBreach) -> AppResult<()> {
        let names = sqlx::query_as::<_, (String, String)>(
            "SELECT i.name, w.name FROM items i, warehouses w WHERE i.id = $1 AND w.id = $2",
        )
        .bind(breach.item_id)
        .bind(breach.warehouse_id)
        .fetch_optional(&self.db)
        .await?;

        let Some((item_name, warehouse_name)) = names else {
            return Err(AppError::NotFound("Item or warehouse".to_string()));
        };

        let (message, message_th) =
            low_stock_message(&item_name, &warehouse_name, breach.min_stock);

        let managers = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM warehouse_managers WHERE warehouse_id = $1",
        )
        .bind(breach.warehouse_id)
        .fetch_all(&self.db)
        .await?;

        for manager_id in managers {
            // One unread alert per manager per breach condition
            let unread = sqlx::query_scalar::<_, String>(
                "SELECT message FROM notifications WHERE user_id = $1 AND is_read = false",
            )
            .bind(manager_id)
            .fetch_all(&self.db)
            .await?;

            if !should_alert(&unread, &message) {
                continue;
            }

            // The SQL guard repeats the check so a concurrent breach cannot
            // slip a duplicate in between the read and the insert.
            sqlx::query(
                r#"
                INSERT INTO notifications (user_id, message, message_th)
                SELECT $1, $2, $3
                WHERE NOT EXISTS (
                    SELECT 1 FROM notifications
                    WHERE user_id = $1 AND message = $2 AND is_read = false
                )
                "#,
            )
            .bind(manager_id)
            .bind(&message)
            .bind(&message_th)
            .execute(&self.db)
            .await?;
        }

        Ok(())
    }

    /// List notifications for a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, user_id, message, message_th, is_read, created_at \
             FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count unread notifications for a user
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark one notification as read
    pub async fn mark_as_read(&self, notification_id: Uuid) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET is_read = true WHERE id = $1 \
             RETURNING id, user_id, message, message_th, is_read, created_at",
        )
        .bind(notification_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))?;

        Ok(row.into())
    }

    /// Mark all of a user's notifications as read; returns how many changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false")
                .bind(user_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected())
    }
}

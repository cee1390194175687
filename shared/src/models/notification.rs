//! In-app notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An in-app notification for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient (a warehouse manager)
    pub user_id: Uuid,
    pub message: String,
    pub message_th: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Build the low-stock alert texts for an (item, warehouse) breach.
///
/// The message is the deduplication key: while an identical unread message
/// exists for a manager, no new one is created. It therefore names the item,
/// warehouse, and threshold, but deliberately not the current quantity —
/// a further drop while still below the threshold must not re-alert.
pub fn low_stock_message(item_name: &str, warehouse_name: &str, min_stock: i64) -> (String, String) {
    let message = format!(
        "Low stock: \"{item_name}\" at \"{warehouse_name}\" is at or below the minimum of {min_stock}"
    );
    let message_th = format!(
        "⚠️ สินค้า \"{item_name}\" ในคลัง \"{warehouse_name}\" เหลือต่ำกว่าขั้นต่ำ ({min_stock} ชิ้น)"
    );
    (message, message_th)
}

/// Decide whether a breach alert should create a new notification row,
/// given the recipient's current unread messages.
///
/// This is the pure form of the unread-duplicate guard the notifier runs in
/// SQL: an identical unread message suppresses the alert, and once the
/// recipient has read it the same breach alerts again.
pub fn should_alert(unread_messages: &[String], message: &str) -> bool {
    !unread_messages.iter().any(|existing| existing == message)
}

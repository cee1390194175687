//! Warehouse models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical stock location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    /// Short unique code, e.g. "WH-CENTRAL", "WH-IT"
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Assignment of a user as manager of a warehouse.
///
/// Managers receive low-stock notifications for their warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseManager {
    pub warehouse_id: Uuid,
    pub user_id: Uuid,
}

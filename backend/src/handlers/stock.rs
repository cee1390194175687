//! Stock level and ledger handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{LedgerEntry, StockLevel};
use shared::types::{Page, PageParams};

use crate::error::AppResult;
use crate::services::ledger::StockLevelFilter;
use crate::services::LedgerService;
use crate::AppState;

/// Body for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    /// Signed quantity change; negative removes stock
    pub delta: i64,
    pub actor_id: Uuid,
    pub note: Option<String>,
}

/// Body for updating alert thresholds
#[derive(Debug, Deserialize)]
pub struct SetLimitsInput {
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

/// Body for a goods receipt
#[derive(Debug, Deserialize)]
pub struct ReceiveGoodsInput {
    pub warehouse_id: Uuid,
    pub actor_id: Uuid,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub items: Vec<ReceiveGoodsLine>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveGoodsLine {
    pub item_id: Uuid,
    pub quantity: i64,
}

/// GET /stock-levels
pub async fn list_stock_levels(
    State(state): State<AppState>,
    Query(filter): Query<StockLevelFilter>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let service = LedgerService::new(state.db.clone());
    let levels = service.list_stock_levels(filter).await?;
    Ok(Json(levels))
}

/// GET /stock-levels/:warehouse_id/:item_id
pub async fn get_stock_level(
    State(state): State<AppState>,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<StockLevel>> {
    let service = LedgerService::new(state.db.clone());
    let level = service.get_stock_level(warehouse_id, item_id).await?;
    Ok(Json(level))
}

/// PATCH /stock-levels/:warehouse_id/:item_id/adjust
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<LedgerEntry>> {
    let service = LedgerService::new(state.db.clone());
    let entry = service
        .adjust_stock(warehouse_id, item_id, input.delta, input.actor_id, input.note)
        .await?;
    Ok(Json(entry))
}

/// PATCH /stock-levels/:warehouse_id/:item_id/limits
pub async fn set_stock_limits(
    State(state): State<AppState>,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<SetLimitsInput>,
) -> AppResult<Json<StockLevel>> {
    let service = LedgerService::new(state.db.clone());
    let level = service
        .set_thresholds(warehouse_id, item_id, input.min_stock, input.max_stock)
        .await?;
    Ok(Json(level))
}

/// POST /stock-entries/receive
pub async fn receive_goods(
    State(state): State<AppState>,
    Json(input): Json<ReceiveGoodsInput>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let service = LedgerService::new(state.db.clone());
    let items: Vec<(Uuid, i64)> = input
        .items
        .iter()
        .map(|line| (line.item_id, line.quantity))
        .collect();
    let entries = service
        .receive_goods(
            input.warehouse_id,
            &items,
            input.actor_id,
            input.reference_id,
            input.note,
        )
        .await?;
    Ok(Json(entries))
}

/// GET /stock-entries/history/:item_id
pub async fn get_stock_history(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<LedgerEntry>>> {
    let service = LedgerService::new(state.db.clone());
    let page = service.get_history(item_id, params).await?;
    Ok(Json(page))
}

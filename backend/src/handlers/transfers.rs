//! Stock transfer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Transfer;

use crate::error::AppResult;
use crate::services::transfer::{CreateTransferInput, TransferFilter};
use crate::services::TransferService;
use crate::AppState;

/// Body for approving or rejecting a transfer
#[derive(Debug, Deserialize)]
pub struct DecideTransferInput {
    pub actor_id: Uuid,
}

/// GET /stock-transfers
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(filter): Query<TransferFilter>,
) -> AppResult<Json<Vec<Transfer>>> {
    let service = TransferService::new(state.db.clone(), state.config.retry);
    let transfers = service.list(filter).await?;
    Ok(Json(transfers))
}

/// GET /stock-transfers/:id
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.db.clone(), state.config.retry);
    let transfer = service.get(transfer_id).await?;
    Ok(Json(transfer))
}

/// POST /stock-transfers
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    let service = TransferService::new(state.db.clone(), state.config.retry);
    let transfer = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

/// POST /stock-transfers/:id/approve
pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<DecideTransferInput>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.db.clone(), state.config.retry);
    let transfer = service.approve(transfer_id, input.actor_id).await?;
    Ok(Json(transfer))
}

/// POST /stock-transfers/:id/reject
pub async fn reject_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<DecideTransferInput>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.db.clone(), state.config.retry);
    let transfer = service.reject(transfer_id, input.actor_id).await?;
    Ok(Json(transfer))
}

//! Request workflow handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Request;

use crate::error::AppResult;
use crate::services::request::{CreateRequestInput, RequestDetail, RequestFilter};
use crate::services::RequestService;
use crate::AppState;

/// Body for approving a request
#[derive(Debug, Deserialize)]
pub struct ApproveRequestInput {
    pub actor_id: Uuid,
    /// Optional due date set at approval time (borrow requests only)
    pub due_date: Option<NaiveDate>,
}

/// Body for rejecting a request
#[derive(Debug, Deserialize)]
pub struct RejectRequestInput {
    pub actor_id: Uuid,
}

/// GET /requests
pub async fn list_requests(
    State(state): State<AppState>,
    Query(filter): Query<RequestFilter>,
) -> AppResult<Json<Vec<Request>>> {
    let service = RequestService::new(state.db.clone(), state.config.retry);
    let requests = service.list(filter).await?;
    Ok(Json(requests))
}

/// GET /requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RequestDetail>> {
    let service = RequestService::new(state.db.clone(), state.config.retry);
    let detail = service.get(request_id).await?;
    Ok(Json(detail))
}

/// POST /requests
pub async fn create_request(
    State(state): State<AppState>,
    Json(input): Json<CreateRequestInput>,
) -> AppResult<(StatusCode, Json<RequestDetail>)> {
    let service = RequestService::new(state.db.clone(), state.config.retry);
    let detail = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// POST /requests/:id/approve
pub async fn approve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ApproveRequestInput>,
) -> AppResult<Json<RequestDetail>> {
    let service = RequestService::new(state.db.clone(), state.config.retry);
    let detail = service
        .approve(request_id, input.actor_id, input.due_date)
        .await?;
    Ok(Json(detail))
}

/// POST /requests/:id/reject
pub async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(input): Json<RejectRequestInput>,
) -> AppResult<Json<Request>> {
    let service = RequestService::new(state.db.clone(), state.config.retry);
    let request = service.reject(request_id, input.actor_id).await?;
    Ok(Json(request))
}

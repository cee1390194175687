//! Notification handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use shared::models::Notification;

use crate::error::AppResult;
use crate::services::NotificationService;
use crate::AppState;

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct ReadAllResponse {
    pub marked: u64,
}

/// GET /notifications/users/:user_id
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db.clone());
    let notifications = service.list_for_user(user_id).await?;
    Ok(Json(notifications))
}

/// GET /notifications/users/:user_id/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db.clone());
    let unread = service.unread_count(user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let service = NotificationService::new(state.db.clone());
    let notification = service.mark_as_read(notification_id).await?;
    Ok(Json(notification))
}

/// POST /notifications/users/:user_id/read-all
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ReadAllResponse>> {
    let service = NotificationService::new(state.db.clone());
    let marked = service.mark_all_read(user_id).await?;
    Ok(Json(ReadAllResponse { marked }))
}

//! API route definitions for the HR-IMS backend

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Build the /api/v1 router
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/stock-levels", stock_level_routes())
        .nest("/stock-entries", stock_entry_routes())
        .nest("/requests", request_routes())
        .nest("/stock-transfers", transfer_routes())
        .nest("/notifications", notification_routes())
}

fn stock_level_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock_levels))
        .route(
            "/:warehouse_id/:item_id",
            get(handlers::get_stock_level),
        )
        .route(
            "/:warehouse_id/:item_id/adjust",
            patch(handlers::adjust_stock),
        )
        .route(
            "/:warehouse_id/:item_id/limits",
            patch(handlers::set_stock_limits),
        )
}

fn stock_entry_routes() -> Router<AppState> {
    Router::new()
        .route("/receive", post(handlers::receive_goods))
        .route("/history/:item_id", get(handlers::get_stock_history))
}

fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_requests).post(handlers::create_request))
        .route("/:id", get(handlers::get_request))
        .route("/:id/approve", post(handlers::approve_request))
        .route("/:id/reject", post(handlers::reject_request))
}

fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/:id", get(handlers::get_transfer))
        .route("/:id/approve", post(handlers::approve_transfer))
        .route("/:id/reject", post(handlers::reject_transfer))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id", get(handlers::list_notifications))
        .route("/users/:user_id/unread-count", get(handlers::unread_count))
        .route("/:id/read", post(handlers::mark_notification_read))
        .route(
            "/users/:user_id/read-all",
            post(handlers::mark_all_notifications_read),
        )
}

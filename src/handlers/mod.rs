use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_macros::debug_handler;
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::{dto::NotificationQuery, service::NotificationService};

pub fn router(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/SendMail", get(send_mail).post(send_mail))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Answers 200 once the notification has been handed to the provider,
/// even if the provider refused it. Only an unusable recipient list is a
/// client error.
#[debug_handler]
pub async fn send_mail(
    State(service): State<Arc<NotificationService>>,
    Query(query): Query<NotificationQuery>,
) -> Response {
    tracing::info!("Notification trigger processed a request");

    match service.dispatch(query).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("Rejected notification request: {e}");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

#[debug_handler]
pub async fn health_check() -> Response {
    (StatusCode::OK, "Hello from failure notifier!").into_response()
}

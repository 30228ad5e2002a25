mod error;
mod http;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tokio_util::sync::CancellationToken;

use kafkaviz_engine::Engine;
use kafkaviz_tutor::Tutor;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub tutor: Arc<dyn Tutor>,
}

/// HTTP routes of the administrative surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/snapshot", get(http::handle_snapshot))
        .route("/api/events", get(http::handle_events))
        .route("/api/groups", get(http::handle_groups))
        .route(
            "/api/topics",
            get(http::handle_list_topics).post(http::handle_create_topic),
        )
        .route(
            "/api/producers",
            get(http::handle_list_producers).post(http::handle_create_producer),
        )
        .route(
            "/api/consumers",
            get(http::handle_list_consumers).post(http::handle_add_consumer),
        )
        .route("/api/{kind}/{id}", delete(http::handle_remove))
        .route(
            "/api/topics/{id}/partitions/{partition}/capacity",
            put(http::handle_set_capacity),
        )
        .route("/api/producers/{id}/produce", post(http::handle_produce))
        .route("/api/consumers/{id}/subscription", put(http::handle_subscribe))
        .route("/api/consumers/{id}/consume", post(http::handle_consume))
        .route(
            "/api/consumers/{id}/auto",
            post(http::handle_start_auto).delete(http::handle_stop_auto),
        )
        .route("/api/reset", post(http::handle_reset))
        .route("/api/tutor", post(http::handle_ask))
        .with_state(state)
}

/// Serve the API on `0.0.0.0:port` until `shutdown` is cancelled.
pub async fn run(port: u16, state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(port, "api server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

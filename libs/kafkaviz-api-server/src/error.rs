use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use kafkaviz_engine::EngineError;

/// Error body returned by every handler: `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Engine(EngineError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            ApiError::Engine(
                EngineError::InvalidCapacity { .. }
                | EngineError::EmptyTopic(_)
                | EngineError::InvalidArgument(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            axum::Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (EngineError::TopicNotFound("t".into()), StatusCode::NOT_FOUND),
            (EngineError::ConsumerNotFound("c".into()), StatusCode::NOT_FOUND),
            (
                EngineError::InvalidCapacity { requested: 0, max: 20 },
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::AlreadyExists {
                    kind: kafkaviz_engine::EntityKind::Topic,
                    id: "t".into(),
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}

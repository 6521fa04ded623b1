//! API route handlers.

mod fit;
mod generate;
mod health;
mod model;

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use kerasgen_ops::{OpsContext, OpsError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::types::{ApiResponse, ApiState, ErrorResponse};

/// Header carrying the user id.
pub(crate) const USER_ID_HEADER: &str = "id";

/// Create the API router with all endpoints.
pub fn create_router(ctx: OpsContext) -> Router {
    let state = Arc::new(ApiState { ctx });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/generate", post(generate::generate_handler))
        .route("/fit", post(fit::fit_handler))
        .route("/model", get(model::model_handler))
        // Request tracing (enable with RUST_LOG=tower_http=info or higher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// HTTP status for an operation failure.
pub(crate) fn status_for(err: &OpsError) -> StatusCode {
    match err {
        OpsError::Bind(_) | OpsError::InvalidUserId { .. } => StatusCode::BAD_REQUEST,
        OpsError::Generate(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OpsError::ModelDirNotFound { .. } | OpsError::ArchiveNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        OpsError::Broker { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response for an operation failure.
pub(crate) fn error_response(err: &OpsError) -> Response {
    (
        status_for(err),
        Json(ApiResponse::new(ErrorResponse::from(err))),
    )
        .into_response()
}

/// Non-empty user id from the request headers.
pub(crate) fn header_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use kerasgen_codegen::GenerateError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&OpsError::Bind("eof".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&OpsError::Generate(GenerateError::DuplicateName {
                name: "h1".into()
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&OpsError::broker("connect", "refused")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&OpsError::Config("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_header_user_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(header_user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(header_user_id(&headers).as_deref(), Some("alice"));
    }
}

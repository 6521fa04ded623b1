//! Saved model download endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use kerasgen_ops::{OpsError, MODEL_ARCHIVE_NAME};
use tracing::{debug, error};

use super::{error_response, header_user_id};
use crate::types::ApiState;

/// GET /model - Download `Model.zip` for the user in the `id` header.
pub async fn model_handler(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let Some(user_id) = header_user_id(&headers) else {
        return error_response(&OpsError::InvalidUserId { id: String::new() });
    };

    match state.ctx.saved_model(&user_id).await {
        Ok(response) => {
            debug!(user = %user_id, size = %response.human_size(), "Serving model archive");
            let disposition = format!("attachment; filename=\"{}\"", MODEL_ARCHIVE_NAME);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                response.bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(user = %user_id, code = e.code(), error = %e, "Model download failed");
            error_response(&e)
        }
    }
}

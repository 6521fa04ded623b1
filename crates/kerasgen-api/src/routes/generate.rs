//! Script generation endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use kerasgen_ops::Project;
use tracing::{error, info};

use super::{error_response, header_user_id};
use crate::types::ApiState;

/// POST /generate - Generate `model.py` as an attachment.
///
/// The body is bound from raw bytes so layer parameters keep their order.
/// A user id in the `id` header is used when the body carries none.
pub async fn generate_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut project = match Project::bind(&body) {
        Ok(project) => project,
        Err(e) => {
            error!(error = %e, "Generate request rejected");
            return error_response(&e);
        }
    };
    if project.user_id.is_empty() {
        if let Some(id) = header_user_id(&headers) {
            project.user_id = id;
        }
    }

    match state.ctx.make_model(&project).await {
        Ok(response) => {
            info!(
                user = %project.user_id,
                layers = project.content.layer_count(),
                size = %response.human_size(),
                "Model script generated"
            );
            let disposition = format!("attachment; filename=\"{}\"", response.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/x-python".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                response.content,
            )
                .into_response()
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "Generation failed");
            error_response(&e)
        }
    }
}

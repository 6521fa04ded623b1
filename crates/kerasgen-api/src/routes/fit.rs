//! Training dispatch endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use kerasgen_ops::Project;
use tracing::{error, info};

use super::{error_response, header_user_id};
use crate::types::{ApiResponse, ApiState};

/// POST /fit - Archive the saved model and publish a training job.
///
/// Answers 202 with the published job; the training itself runs elsewhere.
pub async fn fit_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut project = match Project::bind(&body) {
        Ok(project) => project,
        Err(e) => {
            error!(error = %e, "Fit request rejected");
            return error_response(&e);
        }
    };
    if project.user_id.is_empty() {
        if let Some(id) = header_user_id(&headers) {
            project.user_id = id;
        }
    }

    match state.ctx.fit(&project).await {
        Ok(response) => {
            info!(
                user = %project.user_id,
                files = response.archived_files,
                "Fit accepted"
            );
            (StatusCode::ACCEPTED, Json(ApiResponse::new(response))).into_response()
        }
        Err(e) => {
            error!(user = %project.user_id, code = e.code(), error = %e, "Fit failed");
            error_response(&e)
        }
    }
}

//! Projects: one generation request bound to a user workspace.
//!
//! Each user owns a directory under the workspace root:
//!
//! ```text
//! <root>/<user_id>/model.py     generated script
//! <root>/<user_id>/Model/       saved model written by the training side
//! <root>/<user_id>/Model.zip    archive shipped with a training job
//! ```

use std::path::{Path, PathBuf};

use kerasgen_codegen::{CodeGenerator, Script, SCRIPT_FILE_NAME};
use kerasgen_core::{CompileSpec, ModelSpec};
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

/// Name of the saved model directory inside a user workspace.
pub const MODEL_DIR_NAME: &str = "Model";

/// Name of the saved model archive inside a user workspace.
pub const MODEL_ARCHIVE_NAME: &str = "Model.zip";

/// A model description plus its training configuration, owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Owner of the workspace; may be empty for one-off generation.
    #[serde(default)]
    pub user_id: String,

    /// Architecture description.
    pub content: ModelSpec,

    /// Training configuration.
    pub config: CompileSpec,
}

impl Project {
    /// Create a project without an owner.
    pub fn new(content: ModelSpec, config: CompileSpec) -> Self {
        Self {
            user_id: String::new(),
            content,
            config,
        }
    }

    /// Bind a JSON request body.
    ///
    /// Parses straight from the bytes so layer parameters keep their
    /// document order.
    pub fn bind(body: &[u8]) -> OpsResult<Self> {
        serde_json::from_slice(body).map_err(|e| OpsError::Bind(e.to_string()))
    }

    /// Set the owner.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Generate the script for this project.
    pub fn generate_model(&self, generator: &CodeGenerator) -> OpsResult<Script> {
        Ok(generator.generate(&self.content, &self.config)?)
    }

    /// The owner id, checked to be a single plain path segment.
    pub fn checked_user_id(&self) -> OpsResult<&str> {
        validate_user_id(&self.user_id)?;
        Ok(&self.user_id)
    }

    /// Training job payload for this project.
    pub fn train_body(&self, root: &Path) -> OpsResult<TrainRequest> {
        let user_id = self.checked_user_id()?;
        let user_dir = user_dir(root, user_id);
        Ok(TrainRequest {
            user_id: user_id.to_string(),
            model_archive: user_dir.join(MODEL_ARCHIVE_NAME),
            script: user_dir.join(SCRIPT_FILE_NAME),
            optimizer: self.config.optimizer.clone(),
            learning_rate: self.config.learning_rate,
            loss: self.config.loss.clone(),
            metrics: self.config.metrics.clone(),
            batch_size: self.config.batch_size,
            epochs: self.config.epochs,
            output: self.config.output.clone(),
        })
    }
}

/// Payload published to the training queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub user_id: String,
    /// Archive of the saved model to train.
    pub model_archive: PathBuf,
    /// Generated script.
    pub script: PathBuf,
    pub optimizer: String,
    pub learning_rate: f64,
    pub loss: String,
    pub metrics: Vec<String>,
    pub batch_size: u32,
    pub epochs: u32,
    pub output: String,
}

/// Reject ids that are empty or could escape the workspace root.
pub fn validate_user_id(id: &str) -> OpsResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(OpsError::InvalidUserId { id: id.to_string() })
    }
}

/// Workspace directory of a user.
pub fn user_dir(root: &Path, user_id: &str) -> PathBuf {
    root.join(user_id)
}

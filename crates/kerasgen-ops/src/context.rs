//! OpsContext - the service behind both the CLI and the HTTP API.
//!
//! Holds the configuration, the script generator and the job publisher,
//! and runs the three workflows: make a model script, dispatch a training
//! job, and fetch a saved model archive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kerasgen_codegen::{CodeGenerator, SCRIPT_FILE_NAME};
use tracing::{debug, info};

use crate::archive::archive_model_dir;
use crate::broker::{BrokerPublisher, JobPublisher};
use crate::config::Config;
use crate::error::{OpsError, OpsResult};
use crate::project::{user_dir, validate_user_id, Project, MODEL_ARCHIVE_NAME, MODEL_DIR_NAME};
use crate::responses::{FitResponse, MakeModelResponse, SavedModelResponse};

/// The main operations context.
///
/// Cheap to clone and safe to share across request handlers.
#[derive(Debug, Clone)]
pub struct OpsContext {
    /// Configuration for operations.
    pub config: Config,

    generator: Arc<CodeGenerator>,
    publisher: Arc<dyn JobPublisher>,
}

impl OpsContext {
    /// Create a context that publishes jobs to the configured broker.
    pub fn new(config: Config) -> Self {
        let generator = CodeGenerator::tensorflow().with_policy(config.server.literal_policy);
        let publisher = BrokerPublisher::new(config.broker.clone());
        Self {
            config,
            generator: Arc::new(generator),
            publisher: Arc::new(publisher),
        }
    }

    /// Replace the job publisher.
    pub fn with_publisher(mut self, publisher: Arc<dyn JobPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    fn workspace_root(&self) -> &Path {
        &self.config.server.workspace_root
    }

    // =========================================================================
    // Model script
    // =========================================================================

    /// Generate the script for a project.
    ///
    /// When the project has an owner the script is also stored as
    /// `<root>/<user>/model.py`.
    pub async fn make_model(&self, project: &Project) -> OpsResult<MakeModelResponse> {
        let script = project.generate_model(&self.generator)?;

        let saved_path = if project.user_id.is_empty() {
            None
        } else {
            let dir = user_dir(self.workspace_root(), project.checked_user_id()?);
            Some(write_script(dir, script.render()).await?)
        };

        Ok(MakeModelResponse::from_script(SCRIPT_FILE_NAME, script, saved_path))
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Archive the user's saved model and publish a training job for it.
    pub async fn fit(&self, project: &Project) -> OpsResult<FitResponse> {
        let user_id = project.checked_user_id()?;
        let dir = user_dir(self.workspace_root(), user_id);

        let (archive_path, archived_files) = tokio::task::spawn_blocking(move || {
            archive_model_dir(&dir, MODEL_DIR_NAME, MODEL_ARCHIVE_NAME)
        })
        .await??;

        let train = project.train_body(self.workspace_root())?;
        let payload = serde_json::to_vec(&train)?;
        self.publisher.publish(&payload).await?;

        info!(
            user = %user_id,
            archive = %archive_path.display(),
            files = archived_files,
            "Training job dispatched"
        );
        Ok(FitResponse {
            train,
            archive_path,
            archived_files,
        })
    }

    // =========================================================================
    // Saved model
    // =========================================================================

    /// Read the user's saved model archive.
    pub async fn saved_model(&self, user_id: &str) -> OpsResult<SavedModelResponse> {
        validate_user_id(user_id)?;
        let path = user_dir(self.workspace_root(), user_id).join(MODEL_ARCHIVE_NAME);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OpsError::ArchiveNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), bytes = bytes.len(), "Read model archive");
        Ok(SavedModelResponse { path, bytes })
    }
}

/// Write the script through a uniquely named temporary file in the same
/// directory, then rename it into place. Concurrent writers for one user
/// never share a temp path; the last rename wins.
async fn write_script(dir: PathBuf, content: String) -> OpsResult<PathBuf> {
    tokio::task::spawn_blocking(move || persist_script(&dir, content.as_bytes())).await?
}

fn persist_script(dir: &Path, content: &[u8]) -> OpsResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(SCRIPT_FILE_NAME);

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", SCRIPT_FILE_NAME))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(content)?;
    temp.persist(&target).map_err(|e| OpsError::Io(e.error))?;

    debug!(path = %target.display(), bytes = content.len(), "Script written");
    Ok(target)
}

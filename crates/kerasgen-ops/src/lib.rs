//! Kerasgen Operations Layer
//!
//! Typed operations shared by the CLI and the HTTP API: binding requests
//! into projects, delivering generated scripts, archiving saved models and
//! dispatching training jobs.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kerasgen_ops::{Config, OpsContext, Project};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = OpsContext::new(Config::load()?);
//!
//!     let body = std::fs::read("request.json")?;
//!     let project = Project::bind(&body)?;
//!     let response = ctx.make_model(&project).await?;
//!
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

mod archive;
mod broker;
mod config;
mod context;
mod error;
mod project;
mod responses;

pub use archive::{archive_model_dir, collect_files, zip_files};
pub use broker::{BrokerConnection, BrokerPublisher, JobPublisher, MemoryPublisher};
pub use config::{BrokerConfig, Config, ServerConfig};
pub use context::OpsContext;
pub use error::{OpsError, OpsResult};
pub use project::{
    user_dir, validate_user_id, Project, TrainRequest, MODEL_ARCHIVE_NAME, MODEL_DIR_NAME,
};
pub use responses::*;

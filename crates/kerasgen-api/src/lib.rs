//! REST API service for kerasgen.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check with service version
//! - `POST /generate` - Generate `model.py` from a project body
//! - `POST /fit` - Archive the saved model and dispatch a training job
//! - `GET /model` - Download the saved model archive of the user in the `id` header
//!
//! Failures are answered with `{"data": {"code", "message"}, "timestamp"}`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kerasgen_api::create_router;
//! use kerasgen_ops::{Config, OpsContext};
//!
//! let config = Config::load().unwrap();
//! let router = create_router(OpsContext::new(config));
//! ```

mod routes;
mod types;

pub use routes::create_router;
pub use types::{ApiResponse, ApiState, ErrorResponse, HealthResponse};

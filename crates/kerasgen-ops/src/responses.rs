//! Response DTOs for operations.
//!
//! Each response carries everything an operation produced, so the CLI and
//! the HTTP layer can render it however they need.

use std::path::PathBuf;

use humansize::{format_size, DECIMAL};
use kerasgen_codegen::Script;
use serde::{Deserialize, Serialize};

use crate::project::TrainRequest;

/// Response from generating a model script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeModelResponse {
    /// Attachment file name.
    pub file_name: String,

    /// The rendered script.
    pub content: String,

    pub byte_len: usize,

    pub line_count: usize,

    /// Where the script was written, when the project had an owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,
}

impl MakeModelResponse {
    pub(crate) fn from_script(file_name: &str, script: Script, saved_path: Option<PathBuf>) -> Self {
        Self {
            file_name: file_name.to_string(),
            byte_len: script.byte_len(),
            line_count: script.line_count(),
            content: script.render(),
            saved_path,
        }
    }

    /// Script size for display, e.g. `1.2 kB`.
    pub fn human_size(&self) -> String {
        format_size(self.byte_len, DECIMAL)
    }
}

/// Response from dispatching a training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResponse {
    /// The job as published.
    pub train: TrainRequest,

    /// Archive shipped with the job.
    pub archive_path: PathBuf,

    /// Number of entries in the archive.
    pub archived_files: usize,
}

/// A saved model archive ready for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModelResponse {
    pub path: PathBuf,

    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SavedModelResponse {
    pub fn human_size(&self) -> String {
        format_size(self.bytes.len(), DECIMAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_model_response_from_script() {
        let script = Script::from_lines(vec!["x = 1".to_string()]);
        let response = MakeModelResponse::from_script("model.py", script, None);
        assert_eq!(response.file_name, "model.py");
        assert_eq!(response.line_count, 1);
        assert_eq!(response.byte_len, response.content.len());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("saved_path").is_none());
    }

    #[test]
    fn test_saved_model_bytes_not_serialized() {
        let response = SavedModelResponse {
            path: PathBuf::from("alice/Model.zip"),
            bytes: vec![0; 2048],
        };
        assert!(response.human_size().ends_with("kB"));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("bytes").is_none());
    }
}

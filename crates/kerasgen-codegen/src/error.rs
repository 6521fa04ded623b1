//! Error types for script generation.

use thiserror::Error;

/// Result type alias for generation.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Errors that abort script generation. No partial script is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The layer's category has no entry in the namespace table.
    #[error("unknown category `{category}` on layer `{layer}`")]
    UnknownCategory { layer: String, category: String },

    /// An input or output reference does not name an earlier identifier.
    #[error("unresolved reference `{reference}` used by `{referenced_by}`")]
    UnresolvedReference {
        reference: String,
        referenced_by: String,
    },

    /// Two layers bind the same identifier.
    #[error("duplicate layer name `{name}`")]
    DuplicateName { name: String },

    /// A value contains a digit but is not a number, so the digit rule
    /// would emit it unquoted.
    #[error("ambiguous literal `{value}` for `{param}` on layer `{layer}`")]
    FormattingAmbiguity {
        layer: String,
        param: String,
        value: String,
    },

    /// A field would break the one-statement-per-line layout.
    #[error("line break in `{field}` of layer `{layer}`")]
    LineBreak { layer: String, field: String },
}

impl GenerateError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            GenerateError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            GenerateError::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            GenerateError::DuplicateName { .. } => "DUPLICATE_NAME",
            GenerateError::FormattingAmbiguity { .. } => "FORMATTING_AMBIGUITY",
            GenerateError::LineBreak { .. } => "LINE_BREAK",
        }
    }
}

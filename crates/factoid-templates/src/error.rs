//! Conversion errors.

use factoid_graph::GraphError;

/// Errors raised while materializing a template document.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A descriptor `type` outside the entity vocabulary. Fatal for the
    /// template that carries it, not for the document.
    #[error("not a valid entity type: `{type_tag}`")]
    InvalidEntityType { type_tag: String },

    #[error("malformed `{template}` template: {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// Input that would corrupt node identity. Aborts the build.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unknown template type `{0}`")]
    UnknownTemplateType(String),

    #[error("unsupported participant classes for a controlled interaction: {controller} -> {target}")]
    UnsupportedParticipants { controller: String, target: String },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ConvertError {
    /// Whether the assembler may skip the offending template and go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConvertError::InvalidEntityType { .. })
    }

    pub(crate) fn malformed(template: impl Into<String>, reason: impl Into<String>) -> Self {
        ConvertError::MalformedTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

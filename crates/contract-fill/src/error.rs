use thiserror::Error;

/// Errors raised while validating the field registry or filling a contract.
///
/// Only `TemplateLoad` is worth retrying; everything else needs the caller
/// to fix the registry or the input data first.
#[derive(Error, Debug)]
pub enum FillError {
    /// Unknown variant/field combination, or a slot index beyond the fixed
    /// list length. The payload is the full field path, e.g.
    /// `guarantee/guarantor_name[2]`.
    #[error("unknown field: {0}")]
    FieldNotFound(String),

    /// The registry failed validation against the loaded template. Fatal:
    /// nothing renders through a partially valid registry.
    #[error("invalid field spec: {0}")]
    InvalidFieldSpec(String),

    /// Template bytes could not be fetched or did not parse as a PDF.
    #[error("failed to load template: {0}")]
    TemplateLoad(String),

    /// A render call arrived after `finalize`.
    #[error("document already finalized")]
    Finalized,

    /// A single field failed to render (image decode, malformed page
    /// object). Carries the field path so the caller can skip it and
    /// continue with the rest of the document.
    #[error("failed to render {field}: {reason}")]
    Render { field: String, reason: String },

    #[error("failed to serialize document: {0}")]
    Serialization(String),
}

impl FillError {
    /// Re-attribute a render error to the field being filled, so callers
    /// see `guarantee/guarantor_name[1]` instead of a bare page index.
    pub(crate) fn with_field(self, path: &str) -> Self {
        match self {
            FillError::Render { reason, .. } => FillError::Render {
                field: path.to_string(),
                reason,
            },
            other => other,
        }
    }
}

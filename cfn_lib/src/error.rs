use thiserror::Error;

/// everything that can go wrong while turning resource declarations into a template.
/// none of these are recoverable: synthesis either fully succeeds or fails.
#[derive(Debug, Error)]
pub enum CfnError {
    #[error("Invalid resource name {name:?}\n{reason}")]
    InvalidLogicalId { name: String, reason: &'static str },

    #[error("Invalid stack name {name}\n{reason}")]
    InvalidStackName { name: String, reason: &'static str },

    #[error("Duplicate logical id '{0}'. Every resource and output in a template must have a unique logical id")]
    DuplicateLogicalId(String),

    #[error("Validation failed on resource '{name}'\n{reason}")]
    Validation { name: String, reason: String },

    #[error("Resource '{0}' not found in template")]
    MissingResource(String),

    #[error("Property override path '{path}' is invalid: {reason}")]
    OverridePath { path: String, reason: String },

    #[error("Failed to serialize template\n{0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = CfnError> = std::result::Result<T, E>;

//! Error types for model loading and lookups.

use serde::{Deserialize, Serialize};

/// Errors surfaced by the model runtime.
///
/// Load failures abort the load call and leave previously loaded state untouched.
/// Lookups by unknown ids during playback return `Option`/`bool` instead, except for
/// explicit commands such as pose switching which report [`ModelError::NotFound`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ModelError {
    /// The platform could not provide the requested resource
    #[error("IO error for '{path}': {reason}")]
    Io { path: String, reason: String },

    /// Raw bytes did not decode into the expected asset structure
    #[error("Failed to decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// Decoded asset violates a structural requirement
    #[error("Invalid asset: {reason}")]
    InvalidAsset { reason: String },

    /// Asset writes a parameter the model does not declare
    #[error("{asset} references unknown parameter '{id}'")]
    UnknownParameter { asset: String, id: String },

    /// Asset references a part the model does not declare
    #[error("{asset} references unknown part '{id}'")]
    UnknownPart { asset: String, id: String },

    /// An asset was loaded before the model itself
    #[error("Model is not loaded")]
    ModelNotLoaded,

    /// Lookup by an unknown identifier
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },
}

impl ModelError {
    pub fn io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// True for the load-failure family; the caller may retry with another path.
    #[inline]
    pub fn is_load_failure(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Decode { .. } | Self::InvalidAsset { .. } => "asset",
            Self::UnknownParameter { .. } | Self::UnknownPart { .. } => "binding",
            Self::ModelNotLoaded => "state",
            Self::NotFound { .. } => "lookup",
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

//! Error taxonomy for assembly and forwarding.

use std::io;

use fsfactory_types::{ConfigError, SpecError};
use thiserror::Error;

/// Everything `build` and `invoke` can fail with.
///
/// Nothing here is retried or recovered from locally; each variant reaches
/// the caller as soon as it happens.
#[derive(Debug, Error)]
pub enum Error {
    /// A spec was malformed: wrong shape in config, blank type identifier,
    /// or nesting too deep.
    #[error("invalid object spec: {0}")]
    InvalidSpec(String),

    /// No constructor is registered for the type, or it rejected the arguments.
    #[error("cannot construct `{type_name}`: {reason}")]
    Construction { type_name: String, reason: String },

    /// The root or one of its plugins could not be assembled.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// An operation was forwarded before the root was built.
    #[error("filesystem is not initialized")]
    NotInitialized,

    /// The root has neither a built-in operation nor a plugin by this name.
    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),

    /// The host has no component by this name.
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    /// The config file could not be read or parsed.
    #[error(transparent)]
    Config(ConfigError),

    /// Failure reported by the forwarded operation itself.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<SpecError> for Error {
    fn from(err: SpecError) -> Self {
        Error::InvalidSpec(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            spec @ ConfigError::Spec { .. } => Error::InvalidSpec(spec.to_string()),
            other => Error::Config(other),
        }
    }
}

impl Error {
    pub(crate) fn construction(type_name: &str, reason: impl ToString) -> Self {
        Error::Construction {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, Error>;

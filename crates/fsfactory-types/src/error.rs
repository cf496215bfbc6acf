//! Errors raised while reading specs and configuration files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A spec value had the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("object spec is missing a `type` key")]
    MissingType,

    #[error("object spec has both `type` and `class`")]
    DuplicateType,

    #[error("`type` must be a string, got {0}")]
    TypeNotString(&'static str),

    #[error("`args` must be a list, got {0}")]
    ArgsNotList(&'static str),

    #[error("object spec has both `args` and `params`")]
    DuplicateArgs,

    #[error("unknown key `{0}` in object spec")]
    UnknownKey(String),

    #[error("expected a type identifier or a {{type, args}} mapping, got {0}")]
    NotASpec(&'static str),
}

/// Loading a configuration file failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format `{0}` (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// The file parsed, but an object spec inside it is malformed.
    #[error("{at}: {source}")]
    Spec {
        /// Where the spec sits, e.g. `components.docs.plugins[1]`.
        at: String,
        #[source]
        source: SpecError,
    },
}

//! fsfactory-types: pure data types for fsfactory.
//!
//! Everything here is plain data deserialized from configuration:
//!
//! - [`ObjectSpec`]: how to construct one object (type identifier + arguments)
//! - [`Argument`]: a primitive value or a nested [`ObjectSpec`]
//! - [`RootConfig`]: how to assemble one filesystem (adapter, options, plugins)
//! - [`AppConfig`]: a set of named filesystem components
//!
//! No behavior lives here; the kernel crate owns the registry and factory.

mod config;
mod error;
mod spec;

pub use config::{AppConfig, RootConfig};
pub use error::{ConfigError, SpecError};
pub use spec::{Argument, CLASS_KEY, ObjectSpec, PluginSpec, TYPE_KEY, value_kind};

/// Primitive configuration value.
pub use serde_json::Value;

/// Ordered mapping used for `extra_options`.
pub type Options = serde_json::Map<String, Value>;

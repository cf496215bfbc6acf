//! Root and application configuration.
//!
//! A [`RootConfig`] describes one filesystem component:
//!
//! ```toml
//! root_type = "ReadOnlyAdapter"
//! root_args = [{ type = "MemoryAdapter", args = [{ "readme.txt" = "hi" }] }]
//! plugins = ["ListFiles", "ListPaths"]
//!
//! [extra_options]
//! disable_asserts = false
//! ```
//!
//! The older key names `adapter`, `adapter_params` and `config` are accepted
//! as aliases. An [`AppConfig`] groups several of these under names:
//!
//! ```toml
//! [components.scratch]
//! root_type = "MemoryAdapter"
//! ```
//!
//! Loading happens in two steps: the file is parsed with specs kept as raw
//! values, then every spec is checked. A malformed spec is reported as
//! [`ConfigError::Spec`] with its location, not as a parse error.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, SpecError};
use crate::spec::{Argument, PluginSpec};
use crate::{Options, Value};

/// Everything needed to assemble one filesystem.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRootConfig")]
pub struct RootConfig {
    /// Registered adapter identifier.
    pub root_type: String,
    /// Adapter constructor arguments.
    pub root_args: Vec<Argument>,
    /// Opaque options handed to the filesystem alongside the adapter.
    pub extra_options: Options,
    /// Plugins attached after construction, in order.
    pub plugins: Vec<PluginSpec>,
}

/// A [`RootConfig`] as written in the file, specs not yet checked.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRootConfig {
    #[serde(alias = "adapter")]
    root_type: String,
    #[serde(default, alias = "adapter_params")]
    root_args: Vec<Value>,
    #[serde(default, alias = "config")]
    extra_options: Options,
    #[serde(default)]
    plugins: Vec<Value>,
}

impl RawRootConfig {
    /// Check every spec; `prefix` is prepended to error locations.
    fn check(self, prefix: &str) -> Result<RootConfig, ConfigError> {
        let root_args = check_all(self.root_args, prefix, "root_args", Argument::try_from)?;
        let plugins = check_all(self.plugins, prefix, "plugins", PluginSpec::try_from)?;
        Ok(RootConfig {
            root_type: self.root_type,
            root_args,
            extra_options: self.extra_options,
            plugins,
        })
    }
}

impl TryFrom<RawRootConfig> for RootConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRootConfig) -> Result<Self, Self::Error> {
        raw.check("")
    }
}

fn check_all<T>(
    values: Vec<Value>,
    prefix: &str,
    field: &str,
    parse: impl Fn(Value) -> Result<T, SpecError>,
) -> Result<Vec<T>, ConfigError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            parse(value).map_err(|source| ConfigError::Spec {
                at: format!("{prefix}{field}[{i}]"),
                source,
            })
        })
        .collect()
}

impl RootConfig {
    /// A config for `root_type` with no arguments, options, or plugins.
    pub fn new(root_type: impl Into<String>) -> Self {
        Self {
            root_type: root_type.into(),
            root_args: Vec::new(),
            extra_options: Options::new(),
            plugins: Vec::new(),
        }
    }

    /// Append a root constructor argument.
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.root_args.push(arg.into());
        self
    }

    /// Set one entry of `extra_options`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_options.insert(key.into(), value.into());
        self
    }

    /// Append a plugin.
    pub fn plugin(mut self, plugin: impl Into<PluginSpec>) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str::<RawRootConfig>(source)?.check("")
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<RawRootConfig>(source)?.check("")
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_file::<RawRootConfig>(path.as_ref())?.check("")
    }
}

/// Named filesystem components, as the hosting application sees them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawAppConfig")]
pub struct AppConfig {
    pub components: BTreeMap<String, RootConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAppConfig {
    #[serde(default)]
    components: BTreeMap<String, RawRootConfig>,
}

impl RawAppConfig {
    fn check(self) -> Result<AppConfig, ConfigError> {
        let components = self
            .components
            .into_iter()
            .map(|(name, raw)| {
                let prefix = format!("components.{name}.");
                raw.check(&prefix).map(|root| (name, root))
            })
            .collect::<Result<_, _>>()?;
        Ok(AppConfig { components })
    }
}

impl TryFrom<RawAppConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAppConfig) -> Result<Self, Self::Error> {
        raw.check()
    }
}

impl AppConfig {
    /// Add or replace a component.
    pub fn component(mut self, name: impl Into<String>, config: RootConfig) -> Self {
        self.components.insert(name.into(), config);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str::<RawAppConfig>(source)?.check()
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<RawAppConfig>(source)?.check()
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_file::<RawAppConfig>(path.as_ref())?.check()
    }
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let source = || {
        fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
    };

    match ext.as_str() {
        "toml" => Ok(toml::from_str(&source()?)?),
        "json" => Ok(serde_json::from_str(&source()?)?),
        _ => Err(ConfigError::UnsupportedFormat(ext)),
    }
}

//! ComponentFactory: turns declarative specs into live objects.
//!
//! Resolution is recursive descent over the spec tree. Arguments are
//! resolved left to right, and a nested spec is fully constructed before
//! the constructor that receives it runs:
//!
//! ```text
//! { type = "ReadOnlyAdapter", args = [{ type = "MemoryAdapter" }] }
//!
//!   1. MemoryAdapter()            (depth 1)
//!   2. ReadOnlyAdapter(<adapter>) (depth 0)
//! ```
//!
//! `build` then wraps the root adapter in a [`Filesystem`] and attaches the
//! configured plugins strictly in declared order. Any failure aborts the
//! whole build; a half-assembled filesystem is never returned.

use std::sync::Arc;

use fsfactory_types::{Argument, ObjectSpec, RootConfig};

use crate::builtins::register_builtins;
use crate::error::{Error, Result};
use crate::filesystem::Filesystem;
use crate::registry::{Component, ComponentRegistry, CtorArgs, Resolved};

/// Default limit on spec nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A fully assembled filesystem, shared by every caller.
pub type RootHandle = Arc<Filesystem>;

/// Builds objects from specs using a [`ComponentRegistry`].
#[derive(Debug, Clone)]
pub struct ComponentFactory {
    registry: Arc<ComponentRegistry>,
    max_depth: usize,
}

impl ComponentFactory {
    pub fn new(registry: impl Into<Arc<ComponentRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A factory that knows the bundled adapters and plugins.
    pub fn with_builtins() -> Self {
        let mut registry = ComponentRegistry::new();
        register_builtins(&mut registry);
        Self::new(registry)
    }

    /// Limit how deeply specs may nest. Zero allows flat specs only.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Primitives come back unchanged; specs come back constructed.
    pub fn resolve_argument(&self, arg: &Argument) -> Result<Resolved> {
        self.resolve_at(arg, 0)
    }

    /// Resolve every argument in order, then run the constructor once.
    pub fn construct(&self, spec: &ObjectSpec) -> Result<Component> {
        self.construct_at(&spec.type_name, &spec.args, 0)
    }

    /// Assemble the root filesystem described by `config`.
    pub fn build(&self, config: &RootConfig) -> Result<RootHandle> {
        let root_type = config.root_type.as_str();
        let adapter = match self.construct_at(root_type, &config.root_args, 0)? {
            Component::Adapter(adapter) => adapter,
            other => {
                return Err(Error::Initialization(format!(
                    "`{root_type}` built {} {}, not an adapter",
                    article(other.kind()),
                    other.kind()
                )));
            }
        };

        let mut fs = Filesystem::new(adapter, config.extra_options.clone());

        for (index, spec) in config.plugins.iter().enumerate() {
            let plugin = match self.construct(spec)? {
                Component::Plugin(plugin) => plugin,
                other => {
                    return Err(Error::Initialization(format!(
                        "plugin #{index} `{}` built {} {}, not a plugin",
                        spec.type_name,
                        article(other.kind()),
                        other.kind()
                    )));
                }
            };
            fs.add_plugin(plugin).map_err(|e| {
                Error::Initialization(format!("plugin #{index} `{}`: {e}", spec.type_name))
            })?;
        }

        tracing::info!(
            root_type,
            plugins = config.plugins.len(),
            "filesystem assembled"
        );
        Ok(Arc::new(fs))
    }

    fn resolve_at(&self, arg: &Argument, depth: usize) -> Result<Resolved> {
        match arg {
            Argument::Value(value) => Ok(Resolved::Value(value.clone())),
            Argument::Object(spec) => self
                .construct_at(&spec.type_name, &spec.args, depth + 1)
                .map(Resolved::Component),
        }
    }

    fn construct_at(&self, type_name: &str, args: &[Argument], depth: usize) -> Result<Component> {
        if depth > self.max_depth {
            return Err(Error::InvalidSpec(format!(
                "`{type_name}` is nested deeper than {} levels",
                self.max_depth
            )));
        }
        if type_name.trim().is_empty() {
            return Err(Error::InvalidSpec("missing type identifier".to_string()));
        }

        let ctor = self
            .registry
            .get(type_name)
            .ok_or_else(|| Error::construction(type_name, "no constructor registered"))?;

        let resolved = args
            .iter()
            .map(|arg| self.resolve_at(arg, depth))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(type_name, args = resolved.len(), depth, "constructing");
        ctor(CtorArgs::new(resolved)).map_err(|e| Error::construction(type_name, e))
    }
}

fn article(kind: &str) -> &'static str {
    if kind.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}

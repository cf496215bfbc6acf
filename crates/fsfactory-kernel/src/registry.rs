//! Component registry: type identifiers mapped to constructors.
//!
//! Every identifier that may appear in configuration (`root_type`, a plugin
//! spec, a nested argument spec) must be registered here before the factory
//! runs. There is no runtime name resolution beyond this table.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fsfactory_types::{Value, value_kind};
use thiserror::Error;

use crate::filesystem::{Adapter, Plugin};

/// A constructed object.
#[derive(Clone)]
pub enum Component {
    /// A storage backend; the only thing a `root_type` may build.
    Adapter(Arc<dyn Adapter>),
    /// An extension attached to a root after construction.
    Plugin(Arc<dyn Plugin>),
    /// Any other helper object (credentials, clients, ...), consumed by
    /// other constructors through [`CtorArgs::object`].
    Object(Arc<dyn Any + Send + Sync>),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Adapter(_) => "adapter",
            Component::Plugin(_) => "plugin",
            Component::Object(_) => "object",
        }
    }

    pub fn into_adapter(self) -> Option<Arc<dyn Adapter>> {
        match self {
            Component::Adapter(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_plugin(self) -> Option<Arc<dyn Plugin>> {
        match self {
            Component::Plugin(p) => Some(p),
            _ => None,
        }
    }

    /// Downcast an [`Component::Object`] to its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Component::Object(obj) => Arc::clone(obj).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Plugin(p) => write!(f, "Plugin({})", p.method()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// An argument after resolution.
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Value),
    Component(Component),
}

impl Resolved {
    pub fn kind(&self) -> &'static str {
        match self {
            Resolved::Value(v) => value_kind(v),
            Resolved::Component(c) => c.kind(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(v) => Some(v),
            Resolved::Component(_) => None,
        }
    }
}

/// A constructor rejected its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("expected at most {max} argument(s), got {got}")]
    TooMany { max: usize, got: usize },

    #[error("missing argument #{0}")]
    Missing(usize),

    #[error("argument #{index}: expected {expected}, got {got}")]
    WrongType {
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Resolved constructor arguments, consumed positionally.
#[derive(Debug)]
pub struct CtorArgs {
    args: Vec<Option<Resolved>>,
}

impl CtorArgs {
    pub fn new(args: Vec<Resolved>) -> Self {
        Self {
            args: args.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Fail if more than `max` arguments were given.
    pub fn at_most(&self, max: usize) -> Result<(), ArgError> {
        if self.args.len() > max {
            return Err(ArgError::TooMany {
                max,
                got: self.args.len(),
            });
        }
        Ok(())
    }

    /// Take the argument at `index`, if present and not taken yet.
    pub fn take(&mut self, index: usize) -> Option<Resolved> {
        self.args.get_mut(index).and_then(Option::take)
    }

    /// Required primitive.
    pub fn value(&mut self, index: usize) -> Result<Value, ArgError> {
        self.optional_value(index)?.ok_or(ArgError::Missing(index))
    }

    /// Optional primitive; absent and `null` both yield `None`.
    pub fn optional_value(&mut self, index: usize) -> Result<Option<Value>, ArgError> {
        match self.take(index) {
            None | Some(Resolved::Value(Value::Null)) => Ok(None),
            Some(Resolved::Value(v)) => Ok(Some(v)),
            Some(other) => Err(ArgError::WrongType {
                index,
                expected: "a value",
                got: other.kind(),
            }),
        }
    }

    /// Required string.
    pub fn string(&mut self, index: usize) -> Result<String, ArgError> {
        match self.value(index)? {
            Value::String(s) => Ok(s),
            other => Err(ArgError::WrongType {
                index,
                expected: "string",
                got: value_kind(&other),
            }),
        }
    }

    /// Required adapter, typically built from a nested spec.
    pub fn adapter(&mut self, index: usize) -> Result<Arc<dyn Adapter>, ArgError> {
        match self.take(index) {
            Some(Resolved::Component(Component::Adapter(a))) => Ok(a),
            Some(other) => Err(ArgError::WrongType {
                index,
                expected: "adapter",
                got: other.kind(),
            }),
            None => Err(ArgError::Missing(index)),
        }
    }

    /// Required helper object of concrete type `T`.
    pub fn object<T: Any + Send + Sync>(&mut self, index: usize) -> Result<Arc<T>, ArgError> {
        match self.take(index) {
            Some(Resolved::Component(c)) => c.downcast::<T>().ok_or(ArgError::WrongType {
                index,
                expected: std::any::type_name::<T>(),
                got: c.kind(),
            }),
            Some(other) => Err(ArgError::WrongType {
                index,
                expected: std::any::type_name::<T>(),
                got: other.kind(),
            }),
            None => Err(ArgError::Missing(index)),
        }
    }

    /// Everything not taken yet, in order.
    pub fn into_vec(self) -> Vec<Resolved> {
        self.args.into_iter().flatten().collect()
    }
}

/// A registered constructor.
pub type Constructor = Arc<dyn Fn(CtorArgs) -> Result<Component, ArgError> + Send + Sync>;

/// Registry of constructible types.
#[derive(Default)]
pub struct ComponentRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw constructor. Re-registering a name replaces it.
    pub fn register<F>(&mut self, type_name: impl Into<String>, ctor: F)
    where
        F: Fn(CtorArgs) -> Result<Component, ArgError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self
            .constructors
            .insert(type_name.clone(), Arc::new(ctor))
            .is_some()
        {
            tracing::debug!(type_name = %type_name, "constructor replaced");
        }
    }

    /// Register an adapter constructor.
    pub fn register_adapter<A, F>(&mut self, type_name: impl Into<String>, ctor: F)
    where
        A: Adapter + 'static,
        F: Fn(CtorArgs) -> Result<A, ArgError> + Send + Sync + 'static,
    {
        self.register(type_name, move |args| {
            ctor(args).map(|a| Component::Adapter(Arc::new(a)))
        });
    }

    /// Register a plugin constructor.
    pub fn register_plugin<P, F>(&mut self, type_name: impl Into<String>, ctor: F)
    where
        P: Plugin + 'static,
        F: Fn(CtorArgs) -> Result<P, ArgError> + Send + Sync + 'static,
    {
        self.register(type_name, move |args| {
            ctor(args).map(|p| Component::Plugin(Arc::new(p)))
        });
    }

    /// Register a constructor for a helper object.
    pub fn register_object<T, F>(&mut self, type_name: impl Into<String>, ctor: F)
    where
        T: Any + Send + Sync,
        F: Fn(CtorArgs) -> Result<T, ArgError> + Send + Sync + 'static,
    {
        self.register(type_name, move |args| {
            ctor(args).map(|o| Component::Object(Arc::new(o)))
        });
    }

    /// Look up a constructor by type identifier.
    pub fn get(&self, type_name: &str) -> Option<Constructor> {
        self.constructors.get(type_name).cloned()
    }

    /// Check if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// List all type identifiers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.constructors.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.names())
            .finish()
    }
}

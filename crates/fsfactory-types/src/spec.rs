//! Object specs: declarative descriptions of how to construct something.
//!
//! A spec is written in configuration as either a bare identifier or a
//! mapping with a `type` key:
//!
//! ```toml
//! root_args = [
//!     "plain string",
//!     { type = "Credentials", args = ["key-id", "secret"] },
//! ]
//! plugins = ["ListFiles", { type = "EmptyDir" }]
//! ```
//!
//! `class` is accepted in place of `type`. Inside an argument list, a mapping
//! is treated as a nested spec exactly when it has a `type` or `class` key.
//! Everything else is a primitive and is handed to the constructor untouched.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SpecError;

/// Key that marks a mapping as an object spec.
pub const TYPE_KEY: &str = "type";
/// Accepted alias of [`TYPE_KEY`].
pub const CLASS_KEY: &str = "class";

const ARGS_KEY: &str = "args";
const PARAMS_KEY: &str = "params";

/// How to construct one object: a type identifier plus positional arguments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ObjectSpec {
    /// Identifier the constructor is registered under.
    pub type_name: String,
    /// Positional constructor arguments, in order.
    pub args: Vec<Argument>,
}

/// Plugins are described exactly like any other object.
pub type PluginSpec = ObjectSpec;

/// One constructor argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Argument {
    /// Passed through unchanged.
    Value(Value),
    /// Constructed first, then passed as the built object.
    Object(ObjectSpec),
}

impl ObjectSpec {
    /// A spec with no arguments.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// True if any argument is itself a spec.
    pub fn has_nested(&self) -> bool {
        self.args.iter().any(Argument::is_object)
    }
}

impl TryFrom<Value> for ObjectSpec {
    type Error = SpecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(type_name) => Ok(Self::new(type_name)),
            Value::Object(mut map) => {
                let type_name = match (map.remove(TYPE_KEY), map.remove(CLASS_KEY)) {
                    (Some(_), Some(_)) => return Err(SpecError::DuplicateType),
                    (Some(Value::String(s)), None) | (None, Some(Value::String(s))) => s,
                    (Some(other), None) | (None, Some(other)) => {
                        return Err(SpecError::TypeNotString(value_kind(&other)));
                    }
                    (None, None) => return Err(SpecError::MissingType),
                };

                // A spec without args gets an empty list.
                let args = match (map.remove(ARGS_KEY), map.remove(PARAMS_KEY)) {
                    (Some(_), Some(_)) => return Err(SpecError::DuplicateArgs),
                    (Some(raw), None) | (None, Some(raw)) => parse_args(raw)?,
                    (None, None) => Vec::new(),
                };

                if let Some(key) = map.keys().next() {
                    return Err(SpecError::UnknownKey(key.clone()));
                }

                Ok(Self { type_name, args })
            }
            other => Err(SpecError::NotASpec(value_kind(&other))),
        }
    }
}

impl Argument {
    /// A primitive argument. No spec detection is applied.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// True if this argument must be constructed before use.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }
}

impl From<ObjectSpec> for Argument {
    fn from(spec: ObjectSpec) -> Self {
        Self::Object(spec)
    }
}

impl TryFrom<Value> for Argument {
    type Error = SpecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) if map.contains_key(TYPE_KEY) || map.contains_key(CLASS_KEY) => {
                ObjectSpec::try_from(Value::Object(map)).map(Self::Object)
            }
            other => Ok(Self::Value(other)),
        }
    }
}

fn parse_args(raw: Value) -> Result<Vec<Argument>, SpecError> {
    match raw {
        Value::Array(items) => items.into_iter().map(Argument::try_from).collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(SpecError::ArgsNotList(value_kind(&other))),
    }
}

/// Short name of a value's kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

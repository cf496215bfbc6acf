//! Positional argument access for forwarded operations.
//!
//! Bad arguments surface as `io::ErrorKind::InvalidInput`, the same way as
//! any other failure of the operation.

use std::io;

use fsfactory_types::{Options, Value, value_kind};

/// Arguments of one forwarded call.
#[derive(Debug, Clone, Copy)]
pub struct OpArgs<'a> {
    operation: &'a str,
    args: &'a [Value],
}

impl<'a> OpArgs<'a> {
    pub fn new(operation: &'a str, args: &'a [Value]) -> Self {
        Self { operation, args }
    }

    fn invalid(&self, msg: impl std::fmt::Display) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: {}", self.operation, msg),
        )
    }

    /// Fail if more than `max` arguments were given.
    pub fn at_most(&self, max: usize) -> io::Result<()> {
        if self.args.len() > max {
            return Err(self.invalid(format_args!(
                "expected at most {} argument(s), got {}",
                max,
                self.args.len()
            )));
        }
        Ok(())
    }

    /// Required string argument.
    pub fn str(&self, index: usize, name: &str) -> io::Result<&'a str> {
        self.opt_str(index, name)?
            .ok_or_else(|| self.invalid(format_args!("missing argument `{name}`")))
    }

    /// Optional string argument; `null` counts as absent.
    pub fn opt_str(&self, index: usize, name: &str) -> io::Result<Option<&'a str>> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(format_args!(
                "`{name}` must be a string, got {}",
                value_kind(other)
            ))),
        }
    }

    /// Optional boolean argument.
    pub fn opt_bool(&self, index: usize, name: &str) -> io::Result<Option<bool>> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(format_args!(
                "`{name}` must be a bool, got {}",
                value_kind(other)
            ))),
        }
    }

    /// Optional per-call config mapping.
    pub fn opt_config(&self, index: usize) -> io::Result<Option<&'a Options>> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(self.invalid(format_args!(
                "`config` must be a mapping, got {}",
                value_kind(other)
            ))),
        }
    }
}

use std::fmt::Debug;

use derive_more::with_trait::{Display, From};
use serde::Serialize;

/// A trait marking a type that could be used as internal representation of
/// scalar values in the execution engine.
///
/// The main objective of this abstraction is to allow hosts to replace the
/// default representation with something that better fits their needs, e.g.
/// 64-bit integers or zero-copy strings.
///
/// The `Send + Sync + 'static` bounds let completed values travel through
/// pending completion futures without per-call-site bounds.
pub trait ScalarValue:
    Debug
    + Display
    + PartialEq
    + Clone
    + Serialize
    + Send
    + Sync
    + From<String>
    + From<bool>
    + From<i32>
    + From<f64>
    + 'static
{
    /// Converts this scalar value into an integer value, if it represents
    /// one.
    fn as_int(&self) -> Option<i32>;

    /// Converts this scalar value into a float value, if it represents one.
    ///
    /// Integer values convert losslessly.
    fn as_float(&self) -> Option<f64>;

    /// Views this scalar value as a string slice, if it represents a string.
    fn as_str(&self) -> Option<&str>;

    /// Converts this scalar value into a string value, if it represents one.
    fn as_string(&self) -> Option<String> {
        self.as_str().map(Into::into)
    }

    /// Converts this scalar value into a boolean value, if it represents one.
    fn as_boolean(&self) -> Option<bool>;
}

/// The default scalar value representation.
///
/// These are the four underlying representations the GraphQL specification's
/// built-in scalars need. `Int` and `Float` are separate variants so that
/// integers round-trip without picking up a decimal point.
#[derive(Clone, Debug, Display, From, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultScalarValue {
    /// [`i32`] value.
    #[display("{_0}")]
    Int(i32),

    /// [`f64`] value.
    #[display("{_0}")]
    Float(f64),

    /// [`String`] value.
    #[display("{_0}")]
    String(String),

    /// [`bool`] value.
    #[display("{_0}")]
    Boolean(bool),
}

impl From<&str> for DefaultScalarValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl ScalarValue for DefaultScalarValue {
    fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

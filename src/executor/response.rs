//! Response shapes produced by execution.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::{DefaultScalarValue, ScalarValue, Value};

use super::{ExecutionError, PathSegment, ResponseStream};

/// The result of executing one operation, or of ending an incremental
/// response.
///
/// Serializes to the `{errors, data, hasNext}` wire shape with absent and
/// empty members omitted.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult<S = DefaultScalarValue> {
    /// The produced data, if execution produced any. `Some(Value::Null)`
    /// means execution ran and bubbled to the root; `None` means it never
    /// started.
    pub data: Option<Value<S>>,

    /// Errors collected while producing `data`.
    pub errors: Vec<ExecutionError<S>>,

    /// Whether further payloads follow. Only set on the payloads of an
    /// incremental response.
    pub has_next: Option<bool>,

    /// Free-form response extensions. The engine never fills these in; they
    /// are a slot for the embedding layer.
    pub extensions: Option<Value<S>>,
}

impl<S> ExecutionResult<S> {
    pub(crate) fn from_errors(errors: Vec<ExecutionError<S>>) -> Self {
        Self {
            data: None,
            errors,
            has_next: None,
            extensions: None,
        }
    }

    /// Indicates whether this result carries no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<S: ScalarValue> Serialize for ExecutionResult<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        if let Some(has_next) = self.has_next {
            map.serialize_entry("hasNext", &has_next)?;
        }
        if let Some(extensions) = &self.extensions {
            map.serialize_entry("extensions", extensions)?;
        }
        map.end()
    }
}

/// One out-of-band payload of an incremental response, carrying a sub-tree
/// at a given response path.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionPatchResult<S = DefaultScalarValue> {
    /// The completed sub-tree.
    pub data: Option<Value<S>>,

    /// Where in the response `data` belongs.
    pub path: Vec<PathSegment>,

    /// The label of the `@defer`/`@stream` directive that split this patch
    /// off, if one was given.
    pub label: Option<String>,

    /// Errors scoped to this patch.
    pub errors: Vec<ExecutionError<S>>,

    /// Whether further payloads follow this one.
    pub has_next: bool,

    /// Free-form response extensions. The engine never fills these in; they
    /// are a slot for the embedding layer.
    pub extensions: Option<Value<S>>,
}

impl<S: ScalarValue> Serialize for ExecutionPatchResult<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        map.serialize_entry("path", &self.path)?;
        if let Some(label) = &self.label {
            map.serialize_entry("label", label)?;
        }
        map.serialize_entry("hasNext", &self.has_next)?;
        if let Some(extensions) = &self.extensions {
            map.serialize_entry("extensions", extensions)?;
        }
        map.end()
    }
}

/// One element of an incremental response stream.
#[derive(Clone, Debug, PartialEq)]
#[expect(missing_docs, reason = "self-explanatory")]
pub enum IncrementalResult<S = DefaultScalarValue> {
    Result(ExecutionResult<S>),
    Patch(ExecutionPatchResult<S>),
}

impl<S> IncrementalResult<S> {
    /// Views this element as the patch it is, if it is one.
    pub fn as_patch(&self) -> Option<&ExecutionPatchResult<S>> {
        match self {
            Self::Patch(p) => Some(p),
            Self::Result(_) => None,
        }
    }

    /// Views this element as a plain result, if it is one.
    pub fn as_result(&self) -> Option<&ExecutionResult<S>> {
        match self {
            Self::Result(r) => Some(r),
            Self::Patch(_) => None,
        }
    }
}

impl<S: ScalarValue> Serialize for IncrementalResult<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Self::Result(r) => r.serialize(serializer),
            Self::Patch(p) => p.serialize(serializer),
        }
    }
}

/// What an operation produced: a complete response, or an initial payload
/// followed by an incremental stream when `@defer`/`@stream` left work
/// pending.
pub enum Response<'a, S: ScalarValue = DefaultScalarValue> {
    /// The whole response, no deferred work pending.
    Single(ExecutionResult<S>),

    /// The incremental payload stream; its first element is the initial
    /// result.
    Incremental(ResponseStream<'a, S>),
}

impl<'a, S: ScalarValue> Response<'a, S> {
    /// Indicates whether this response delivers incrementally.
    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Incremental(_))
    }

    /// Unwraps a [`Response::Single`] result.
    pub fn into_single(self) -> Option<ExecutionResult<S>> {
        match self {
            Self::Single(r) => Some(r),
            Self::Incremental(_) => None,
        }
    }

    /// Unwraps a [`Response::Incremental`] stream.
    pub fn into_stream(self) -> Option<ResponseStream<'a, S>> {
        match self {
            Self::Incremental(s) => Some(s),
            Self::Single(_) => None,
        }
    }
}

//! Raw values flowing out of field resolvers, before completion.

use std::{
    any::Any,
    fmt,
    sync::{Arc, Mutex},
};

use futures::stream::BoxStream;
use indexmap::IndexMap;

use crate::{
    executor::{Arguments, Eventual, FieldResult, ResolveInfo},
    schema::meta::MetaType,
    value::{DefaultScalarValue, ScalarValue},
};

/// Opaque per-request context value handed to every resolver untouched.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// A value of `T` a resolver hands back, possibly still being computed.
pub type ResolvedValue<S = DefaultScalarValue> = Eventual<'static, FieldResult<SourceValue<S>, S>>;

/// A field resolver: `(source, arguments, context value, info)`.
pub type FieldResolverFn<S = DefaultScalarValue> = Arc<
    dyn Fn(
            &SourceValue<S>,
            &Arguments<S>,
            Option<&ContextValue>,
            &ResolveInfo<'_, '_, S>,
        ) -> ResolvedValue<S>
        + Send
        + Sync,
>;

/// A resolver attached to a single source property:
/// `(arguments, context value, info)`.
///
/// Unlike [`FieldResolverFn`], the source is not passed back: the property
/// already belongs to it.
pub type PropertyResolverFn<S = DefaultScalarValue> = Arc<
    dyn Fn(&Arguments<S>, Option<&ContextValue>, &ResolveInfo<'_, '_, S>) -> ResolvedValue<S>
        + Send
        + Sync,
>;

/// A runtime-type resolver for abstract types:
/// `(value, context value, info, abstract type)`, yielding the name of the
/// concrete object type the value belongs to.
pub type TypeResolverFn<S = DefaultScalarValue> = Arc<
    dyn Fn(
            &SourceValue<S>,
            Option<&ContextValue>,
            &ResolveInfo<'_, '_, S>,
            &MetaType<S>,
        ) -> Eventual<'static, FieldResult<String, S>>
        + Send
        + Sync,
>;

/// A per-object-type membership predicate: `(value, context value, info)`.
pub type IsTypeOfFn<S = DefaultScalarValue> = Arc<
    dyn Fn(
            &SourceValue<S>,
            Option<&ContextValue>,
            &ResolveInfo<'_, '_, S>,
        ) -> Eventual<'static, FieldResult<bool, S>>
        + Send
        + Sync,
>;

/// The stream of raw values behind a [`SourceValue::Stream`].
pub type SourceValueStream<S = DefaultScalarValue> =
    BoxStream<'static, FieldResult<SourceValue<S>, S>>;

/// An untyped value produced by a field resolver (or supplied as the root
/// value), waiting to be completed against its declared output type.
///
/// This is the engine's rendering of "whatever the resolver returned": it
/// has no notion of non-`null`ness or field tables, both of which the
/// completer imposes from schema metadata.
#[derive(Clone)]
pub enum SourceValue<S = DefaultScalarValue> {
    /// Absent value, completing to `null` under a nullable type.
    Null,

    /// Scalar value, completed by the leaf type's serializer.
    Scalar(S),

    /// Finite list of values, completed element by element.
    List(Vec<SourceValue<S>>),

    /// Object-like value whose properties back field resolution.
    Object(SourceObject<S>),

    /// Asynchronous sequence of values, completed by pulling elements.
    Stream(SourceStream<S>),
}

impl<S> SourceValue<S> {
    /// Constructs a scalar value.
    pub fn scalar<T: Into<S>>(s: T) -> Self {
        Self::Scalar(s.into())
    }

    /// Constructs a list value.
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l)
    }

    /// Constructs a [`SourceValue::Stream`] out of the given stream of
    /// values.
    pub fn stream(s: impl Into<SourceStream<S>>) -> Self {
        Self::Stream(s.into())
    }

    /// Does this value represent `null`?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Views the underlying scalar value, if present.
    pub fn as_scalar(&self) -> Option<&S> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Views the underlying object value, if present.
    pub fn as_object(&self) -> Option<&SourceObject<S>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl<S: ScalarValue> fmt::Display for SourceValue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(s) => {
                if let Some(string) = s.as_str() {
                    write!(f, "\"{string}\"")
                } else {
                    write!(f, "{s}")
                }
            }
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    write!(f, "{v}")?;
                    if i < l.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{ ")?;
                for (i, (k, p)) in o.iter().enumerate() {
                    match p {
                        SourceProperty::Value(v) => write!(f, "{k}: {v}")?,
                        SourceProperty::Resolver(_) => write!(f, "{k}: <resolver>")?,
                    }
                    if i < o.property_count() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, " }}")
            }
            Self::Stream(_) => write!(f, "<async sequence>"),
        }
    }
}

impl<S: ScalarValue> fmt::Debug for SourceValue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<S: From<String>> From<&str> for SourceValue<S> {
    fn from(s: &str) -> Self {
        Self::scalar(s.to_owned())
    }
}

impl<S: From<String>> From<String> for SourceValue<S> {
    fn from(s: String) -> Self {
        Self::scalar(s)
    }
}

impl<S: From<i32>> From<i32> for SourceValue<S> {
    fn from(i: i32) -> Self {
        Self::scalar(i)
    }
}

impl<S: From<f64>> From<f64> for SourceValue<S> {
    fn from(f: f64) -> Self {
        Self::scalar(f)
    }
}

impl<S: From<bool>> From<bool> for SourceValue<S> {
    fn from(b: bool) -> Self {
        Self::scalar(b)
    }
}

impl<S> From<SourceObject<S>> for SourceValue<S> {
    fn from(o: SourceObject<S>) -> Self {
        Self::Object(o)
    }
}

impl<S, T> From<Option<T>> for SourceValue<S>
where
    Self: From<T>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A property of a [`SourceObject`].
#[derive(Clone)]
pub enum SourceProperty<S = DefaultScalarValue> {
    /// A plain value, returned as-is by the default field resolver.
    Value(SourceValue<S>),

    /// A resolver invoked with `(arguments, context value, info)` when the
    /// property is selected.
    Resolver(PropertyResolverFn<S>),
}

/// An object-like source value: ordered named properties plus an optional
/// hint naming the concrete type this value belongs to.
///
/// The type hint is what the default type resolver consults first when the
/// value sits behind an interface or union field.
#[derive(Clone)]
pub struct SourceObject<S = DefaultScalarValue> {
    type_name: Option<arcstr::ArcStr>,
    properties: IndexMap<String, SourceProperty<S>>,
}

impl<S> SourceObject<S> {
    /// Creates an empty [`SourceObject`] with no type hint.
    pub fn new() -> Self {
        Self {
            type_name: None,
            properties: IndexMap::new(),
        }
    }

    /// Creates an empty [`SourceObject`] hinting at the concrete type it
    /// belongs to.
    pub fn of_type(name: impl Into<arcstr::ArcStr>) -> Self {
        Self {
            type_name: Some(name.into()),
            properties: IndexMap::new(),
        }
    }

    /// Adds a plain property value.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<SourceValue<S>>) -> Self {
        self.properties
            .insert(name.into(), SourceProperty::Value(value.into()));
        self
    }

    /// Adds a property backed by a resolver function.
    #[must_use]
    pub fn resolver(mut self, name: impl Into<String>, f: PropertyResolverFn<S>) -> Self {
        self.properties
            .insert(name.into(), SourceProperty::Resolver(f));
        self
    }

    /// The concrete type this value claims to belong to, if hinted.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&SourceProperty<S>> {
        self.properties.get(name)
    }

    /// Returns an iterator over all properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceProperty<S>)> {
        self.properties.iter()
    }

    /// Returns the number of properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl<S> Default for SourceObject<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared handle to an asynchronous sequence of raw values.
///
/// The underlying stream can be taken exactly once: source values stay
/// [`Clone`], while the completer (or the incremental dispatcher it hands
/// the tail to) gets exclusive ownership of the elements.
#[derive(Clone)]
pub struct SourceStream<S = DefaultScalarValue>(
    Arc<Mutex<Option<SourceValueStream<S>>>>,
);

impl<S> SourceStream<S> {
    /// Wraps the given stream of values.
    pub fn new(stream: SourceValueStream<S>) -> Self {
        Self(Arc::new(Mutex::new(Some(stream))))
    }

    /// Takes the underlying stream out, leaving the handle empty.
    pub fn take(&self) -> Option<SourceValueStream<S>> {
        self.0.lock().unwrap().take()
    }
}

impl<S> From<SourceValueStream<S>> for SourceStream<S> {
    fn from(stream: SourceValueStream<S>) -> Self {
        Self::new(stream)
    }
}

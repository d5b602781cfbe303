//! Types used to describe a GraphQL schema.

use std::sync::Arc;

use arcstr::ArcStr;
use compact_str::CompactString;

use crate::{
    ast::{InputValue, Type},
    source::{FieldResolverFn, IsTypeOfFn, SourceValue, TypeResolverFn},
    value::{DefaultScalarValue, ScalarValue, Value},
};

/// Serialization function of a leaf type: turns a raw resolver value into a
/// response value, or refuses by returning [`None`].
pub type SerializeFn<S> = Arc<dyn Fn(&SourceValue<S>) -> Option<Value<S>> + Send + Sync>;

/// Scalar type metadata.
pub struct ScalarMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    pub(crate) serialize_fn: SerializeFn<S>,
}

impl<S> std::fmt::Debug for ScalarMeta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("serialize_fn", &"<fn>")
            .finish()
    }
}

impl<S: ScalarValue> ScalarMeta<S> {
    /// Builds a new [`ScalarMeta`] type with the given `name`.
    ///
    /// The default serializer passes raw scalar values through unchanged and
    /// refuses everything else.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
            serialize_fn: Arc::new(|raw| raw.as_scalar().cloned().map(Value::Scalar)),
        }
    }

    /// Sets the `description` of this [`ScalarMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the serializer of this [`ScalarMeta`] type.
    #[must_use]
    pub fn serializer(mut self, f: SerializeFn<S>) -> Self {
        self.serialize_fn = f;
        self
    }

    /// Wraps this [`ScalarMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Scalar(self)
    }
}

/// Enum type metadata.
#[derive(Debug)]
pub struct EnumMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub values: Vec<ArcStr>,
    _marker: std::marker::PhantomData<S>,
}

impl<S: ScalarValue> EnumMeta<S> {
    /// Builds a new [`EnumMeta`] type with the given `name` and possible
    /// `values`.
    pub fn new<N: Into<ArcStr>>(name: impl Into<ArcStr>, values: impl IntoIterator<Item = N>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: values.into_iter().map(Into::into).collect(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets the `description` of this [`EnumMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Serializes a raw value into one of this enum's value names.
    pub fn serialize(&self, raw: &SourceValue<S>) -> Option<Value<S>> {
        let name = raw.as_scalar().and_then(S::as_str)?;
        self.values
            .iter()
            .any(|v| v == name)
            .then(|| Value::scalar(name.to_owned()))
    }

    /// Indicates whether the given `name` is one of this enum's values.
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v == name)
    }

    /// Wraps this [`EnumMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Enum(self)
    }
}

/// Metadata of an argument accepted by a field or a directive, doubling as
/// an input-object field definition.
#[derive(Debug)]
pub struct ArgumentMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: CompactString,
    #[doc(hidden)]
    pub arg_type: Type,
    #[doc(hidden)]
    pub default_value: Option<InputValue<S>>,
}

impl<S> ArgumentMeta<S> {
    /// Builds a new [`ArgumentMeta`] with the given `name` and type.
    pub fn new(name: impl Into<CompactString>, arg_type: Type) -> Self {
        Self {
            name: name.into(),
            arg_type,
            default_value: None,
        }
    }

    /// Sets the default value of this [`ArgumentMeta`].
    #[must_use]
    pub fn default_value(mut self, value: InputValue<S>) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Metadata of a single field on an object or interface type.
pub struct FieldMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: CompactString,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arguments: Vec<ArgumentMeta<S>>,
    #[doc(hidden)]
    pub field_type: Type,
    pub(crate) resolver: Option<FieldResolverFn<S>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for FieldMeta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("field_type", &self.field_type)
            .field("resolver", &self.resolver.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<S> FieldMeta<S> {
    /// Builds a new [`FieldMeta`] with the given `name` and return type.
    pub fn new(name: impl Into<CompactString>, field_type: Type) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: vec![],
            field_type,
            resolver: None,
        }
    }

    /// Sets the `description` of this [`FieldMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an accepted argument to this [`FieldMeta`].
    #[must_use]
    pub fn argument(mut self, arg: ArgumentMeta<S>) -> Self {
        self.arguments.push(arg);
        self
    }

    /// Attaches a resolver to this [`FieldMeta`].
    ///
    /// Fields without a resolver fall back to the per-request (or the
    /// built-in property-lookup) field resolver.
    #[must_use]
    pub fn resolver(mut self, f: FieldResolverFn<S>) -> Self {
        self.resolver = Some(f);
        self
    }
}

/// Object type metadata.
pub struct ObjectMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<FieldMeta<S>>,
    #[doc(hidden)]
    pub interface_names: Vec<ArcStr>,
    pub(crate) is_type_of: Option<IsTypeOfFn<S>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for ObjectMeta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("fields", &self.fields)
            .field("interface_names", &self.interface_names)
            .field("is_type_of", &self.is_type_of.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<S> ObjectMeta<S> {
    /// Builds a new [`ObjectMeta`] type with the given `name` and `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<FieldMeta<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            interface_names: vec![],
            is_type_of: None,
        }
    }

    /// Sets the `description` of this [`ObjectMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the `interfaces` this [`ObjectMeta`] type implements.
    #[must_use]
    pub fn interfaces<N: Into<ArcStr>>(mut self, names: impl IntoIterator<Item = N>) -> Self {
        self.interface_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a membership predicate to this [`ObjectMeta`] type,
    /// consulted when an abstract type needs to find the concrete type of a
    /// raw value, and to guard completion into this type.
    #[must_use]
    pub fn is_type_of(mut self, f: IsTypeOfFn<S>) -> Self {
        self.is_type_of = Some(f);
        self
    }

    /// Wraps this [`ObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Object(self)
    }
}

/// Interface type metadata.
pub struct InterfaceMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<FieldMeta<S>>,
    pub(crate) resolve_type: Option<TypeResolverFn<S>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for InterfaceMeta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("fields", &self.fields)
            .field("resolve_type", &self.resolve_type.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<S> InterfaceMeta<S> {
    /// Builds a new [`InterfaceMeta`] type with the given `name` and
    /// `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<FieldMeta<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            resolve_type: None,
        }
    }

    /// Sets the `description` of this [`InterfaceMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a runtime-type resolver to this [`InterfaceMeta`] type.
    ///
    /// Without one, the engine falls back to the per-request (or the
    /// built-in) type resolver.
    #[must_use]
    pub fn resolve_type(mut self, f: TypeResolverFn<S>) -> Self {
        self.resolve_type = Some(f);
        self
    }

    /// Wraps this [`InterfaceMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Interface(self)
    }
}

/// Union type metadata.
pub struct UnionMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub of_type_names: Vec<ArcStr>,
    pub(crate) resolve_type: Option<TypeResolverFn<S>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for UnionMeta<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("of_type_names", &self.of_type_names)
            .field("resolve_type", &self.resolve_type.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<S> UnionMeta<S> {
    /// Builds a new [`UnionMeta`] type of the given member type names.
    pub fn new<N: Into<ArcStr>>(name: impl Into<ArcStr>, of_type_names: impl IntoIterator<Item = N>) -> Self {
        Self {
            name: name.into(),
            description: None,
            of_type_names: of_type_names.into_iter().map(Into::into).collect(),
            resolve_type: None,
        }
    }

    /// Sets the `description` of this [`UnionMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a runtime-type resolver to this [`UnionMeta`] type.
    #[must_use]
    pub fn resolve_type(mut self, f: TypeResolverFn<S>) -> Self {
        self.resolve_type = Some(f);
        self
    }

    /// Wraps this [`UnionMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Union(self)
    }
}

/// Input object type metadata.
#[derive(Debug)]
pub struct InputObjectMeta<S = DefaultScalarValue> {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub input_fields: Vec<ArgumentMeta<S>>,
}

impl<S> InputObjectMeta<S> {
    /// Builds a new [`InputObjectMeta`] type with the given `input_fields`.
    pub fn new(name: impl Into<ArcStr>, input_fields: Vec<ArgumentMeta<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields,
        }
    }

    /// Sets the `description` of this [`InputObjectMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InputObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::InputObject(self)
    }
}

/// Generic type metadata.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Debug)]
pub enum MetaType<S = DefaultScalarValue> {
    Scalar(ScalarMeta<S>),
    Object(ObjectMeta<S>),
    Interface(InterfaceMeta<S>),
    Union(UnionMeta<S>),
    Enum(EnumMeta<S>),
    InputObject(InputObjectMeta<S>),
}

impl<S> MetaType<S> {
    /// Accesses the name of this [`MetaType`].
    pub fn name(&self) -> &ArcStr {
        match self {
            Self::Scalar(ScalarMeta { name, .. })
            | Self::Object(ObjectMeta { name, .. })
            | Self::Interface(InterfaceMeta { name, .. })
            | Self::Union(UnionMeta { name, .. })
            | Self::Enum(EnumMeta { name, .. })
            | Self::InputObject(InputObjectMeta { name, .. }) => name,
        }
    }

    /// Accesses the description of this [`MetaType`], if set.
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(ScalarMeta { description, .. })
            | Self::Object(ObjectMeta { description, .. })
            | Self::Interface(InterfaceMeta { description, .. })
            | Self::Union(UnionMeta { description, .. })
            | Self::Enum(EnumMeta { description, .. })
            | Self::InputObject(InputObjectMeta { description, .. }) => description.as_ref(),
        }
    }

    /// Indicates whether this [`MetaType`] is abstract, i.e. resolves to a
    /// concrete object type at runtime.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Indicates whether this [`MetaType`] is a leaf of the response tree.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Indicates whether this [`MetaType`] is a concrete object type.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Views this [`MetaType`] as an [`ObjectMeta`], if it is one.
    pub fn as_object(&self) -> Option<&ObjectMeta<S>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The fields this [`MetaType`] exposes for selection, if any.
    pub fn fields(&self) -> Option<&[FieldMeta<S>]> {
        match self {
            Self::Object(ObjectMeta { fields, .. })
            | Self::Interface(InterfaceMeta { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a field of this [`MetaType`] by `name`.
    ///
    /// The `__typename`/`__schema`/`__type` meta-fields are not in any field
    /// table; those go through the schema's meta-field hook instead.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMeta<S>> {
        self.fields()
            .and_then(|fs| fs.iter().find(|f| f.name == name))
    }
}

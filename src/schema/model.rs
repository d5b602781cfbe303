//! Runtime model of a GraphQL schema as the execution engine consumes it.

use std::{collections::HashMap, fmt, sync::Arc};

use arcstr::ArcStr;
use derive_more::with_trait::Display;

use crate::{
    ast::{InputValue, OperationType, Type, TypeModifier},
    executor::Eventual,
    schema::meta::{ArgumentMeta, FieldMeta, MetaType, ScalarMeta},
    source::SourceValue,
    value::{DefaultScalarValue, ScalarValue, Value},
};

/// An error preventing a [`SchemaType`] from being assembled.
///
/// Full schema validation lives outside this crate; these are only the
/// checks the executor cannot run without.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum SchemaError {
    /// Two types share a name.
    #[display("duplicate type name \"{_0}\"")]
    DuplicateTypeName(String),

    /// A root operation type names a type that is not registered.
    #[display("root type \"{_0}\" is not defined in the schema")]
    UnknownRootType(String),

    /// A root operation type is not an object type.
    #[display("root type \"{_0}\" is not an object type")]
    NonObjectRootType(String),
}

impl std::error::Error for SchemaError {}

/// Metadata for a schema: the type map, the root operation types and the
/// directive definitions the executor consults.
#[derive(Debug)]
pub struct SchemaType<S = DefaultScalarValue> {
    types: HashMap<String, MetaType<S>>,
    query_type_name: String,
    mutation_type_name: Option<String>,
    subscription_type_name: Option<String>,
    directives: HashMap<String, DirectiveType<S>>,
    typename_field: FieldMeta<S>,
    schema_field: Option<FieldMeta<S>>,
    type_field: Option<FieldMeta<S>>,
}

/// A [`MetaType`] reference wrapped into the modifiers a field's declared
/// type carries.
#[expect(missing_docs, reason = "self-explanatory")]
pub enum TypeType<'a, S = DefaultScalarValue> {
    Concrete(&'a MetaType<S>),
    NonNull(Box<TypeType<'a, S>>),
    List(Box<TypeType<'a, S>>),
}

impl<'a, S> Clone for TypeType<'a, S> {
    fn clone(&self) -> Self {
        match self {
            Self::Concrete(meta) => Self::Concrete(meta),
            Self::NonNull(inner) => Self::NonNull(inner.clone()),
            Self::List(inner) => Self::List(inner.clone()),
        }
    }
}

/// Definition of a directive the executor evaluates during collection and
/// completion.
#[derive(Debug)]
pub struct DirectiveType<S = DefaultScalarValue> {
    #[expect(missing_docs, reason = "self-explanatory")]
    pub name: ArcStr,
    #[expect(missing_docs, reason = "self-explanatory")]
    pub description: Option<ArcStr>,
    #[expect(missing_docs, reason = "self-explanatory")]
    pub locations: Vec<DirectiveLocation>,
    #[expect(missing_docs, reason = "self-explanatory")]
    pub arguments: Vec<ArgumentMeta<S>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
}

impl<S: ScalarValue> SchemaType<S> {
    /// Assembles a new [`SchemaType`] out of the given `types` and root
    /// operation type names.
    ///
    /// The built-in `Int`, `Float`, `String`, `Boolean` and `ID` scalars are
    /// registered automatically unless `types` already carries a type with
    /// the same name, as are the `@skip`, `@include`, `@defer` and `@stream`
    /// directive definitions.
    pub fn new(
        types: Vec<MetaType<S>>,
        query: &str,
        mutation: Option<&str>,
        subscription: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let mut type_map = HashMap::with_capacity(types.len() + 5);
        for ty in types {
            let name = ty.name().to_string();
            if type_map.insert(name.clone(), ty).is_some() {
                return Err(SchemaError::DuplicateTypeName(name));
            }
        }
        for scalar in builtin_scalars() {
            type_map
                .entry(scalar.name().to_string())
                .or_insert(scalar);
        }

        let mut directives = HashMap::new();
        for directive in [
            DirectiveType::new_skip(),
            DirectiveType::new_include(),
            DirectiveType::new_defer(),
            DirectiveType::new_stream(),
        ] {
            directives.insert(directive.name.to_string(), directive);
        }

        let schema = Self {
            types: type_map,
            query_type_name: query.into(),
            mutation_type_name: mutation.map(Into::into),
            subscription_type_name: subscription.map(Into::into),
            directives,
            typename_field: typename_meta_field(),
            schema_field: None,
            type_field: None,
        };

        for root in [Some(&schema.query_type_name), schema.mutation_type_name.as_ref(), schema.subscription_type_name.as_ref()]
            .into_iter()
            .flatten()
        {
            match schema.types.get(root) {
                None => return Err(SchemaError::UnknownRootType(root.clone())),
                Some(ty) if !ty.is_object() => {
                    return Err(SchemaError::NonObjectRootType(root.clone()));
                }
                Some(_) => {}
            }
        }

        Ok(schema)
    }

    /// Registers the `__schema` and `__type` meta-field definitions.
    ///
    /// Introspection types are built outside this crate; the executor only
    /// routes selections of these two names on the query root through the
    /// definitions registered here.
    pub fn set_meta_fields(&mut self, schema_field: FieldMeta<S>, type_field: FieldMeta<S>) {
        self.schema_field = Some(schema_field);
        self.type_field = Some(type_field);
    }

    /// Adds a directive definition to this schema.
    pub fn add_directive(&mut self, directive: DirectiveType<S>) {
        self.directives
            .insert(directive.name.to_string(), directive);
    }

    /// Looks up a concrete type by `name`.
    pub fn concrete_type_by_name(&self, name: &str) -> Option<&MetaType<S>> {
        self.types.get(name)
    }

    /// The name of the query root type.
    pub fn query_type_name(&self) -> &str {
        &self.query_type_name
    }

    /// Indicates whether `ty` is this schema's query root type.
    pub fn is_query_root(&self, ty: &MetaType<S>) -> bool {
        *ty.name() == self.query_type_name
    }

    /// Looks up the root type configured for the given operation kind.
    pub fn concrete_root_type(&self, op: OperationType) -> Option<&MetaType<S>> {
        let name = match op {
            OperationType::Query => Some(&self.query_type_name),
            OperationType::Mutation => self.mutation_type_name.as_ref(),
            OperationType::Subscription => self.subscription_type_name.as_ref(),
        }?;
        self.types.get(name)
    }

    /// Wraps the declared `t` into a [`TypeType`], resolving its innermost
    /// name against this schema.
    ///
    /// # Panics
    ///
    /// If the name is not registered. Field types referencing unknown types
    /// are a schema-construction bug, not an execution-time condition.
    pub fn make_type<N: AsRef<str>>(&self, t: &Type<N>) -> TypeType<'_, S> {
        let mut ty = TypeType::Concrete(
            self.concrete_type_by_name(t.innermost_name())
                .expect("type not found in schema"),
        );
        for modifier in t.modifiers() {
            ty = match modifier {
                TypeModifier::NonNull => TypeType::NonNull(Box::new(ty)),
                TypeModifier::List => TypeType::List(Box::new(ty)),
            };
        }
        ty
    }

    /// Enumerates the concrete object types an abstract type can resolve
    /// to.
    ///
    /// Returns an empty list for non-abstract types.
    pub fn possible_types(&self, ty: &MetaType<S>) -> Vec<&MetaType<S>> {
        match ty {
            MetaType::Union(union) => union
                .of_type_names
                .iter()
                .filter_map(|n| self.concrete_type_by_name(n))
                .collect(),
            MetaType::Interface(iface) => {
                let mut possible: Vec<_> = self
                    .types
                    .values()
                    .filter(|t| match t {
                        MetaType::Object(o) => {
                            o.interface_names.iter().any(|n| n == &iface.name)
                        }
                        _ => false,
                    })
                    .collect();
                // `HashMap` iteration order is arbitrary; `isTypeOf` probing
                // must be deterministic.
                possible.sort_by(|a, b| a.name().cmp(b.name()));
                possible
            }
            _ => vec![],
        }
    }

    /// Indicates whether `possible` is one of the concrete types
    /// `abstract_type` can resolve to.
    pub fn is_possible_type(&self, abstract_type: &MetaType<S>, possible: &MetaType<S>) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|t| t.name() == possible.name())
    }

    /// Looks up a directive definition by `name`.
    pub fn directive_by_name(&self, name: &str) -> Option<&DirectiveType<S>> {
        self.directives.get(name)
    }

    /// Looks up the definition of the field named `name` on `parent`.
    ///
    /// `__typename` resolves on any parent to the parent's name, and
    /// `__schema`/`__type` resolve on the query root against the meta-field
    /// definitions registered via [`SchemaType::set_meta_fields`]. These
    /// three bypass the parent's field table.
    pub fn field_definition<'s>(
        &'s self,
        parent: &'s MetaType<S>,
        name: &str,
    ) -> Option<&'s FieldMeta<S>> {
        if name == "__typename" {
            return Some(&self.typename_field);
        }
        if self.is_query_root(parent) {
            if name == "__schema" {
                return self.schema_field.as_ref();
            }
            if name == "__type" {
                return self.type_field.as_ref();
            }
        }
        parent.field_by_name(name)
    }
}

impl<'a, S> TypeType<'a, S> {
    /// Unwraps all modifiers down to the concrete [`MetaType`].
    pub fn innermost_concrete(&self) -> &'a MetaType<S> {
        match self {
            Self::Concrete(t) => t,
            Self::NonNull(inner) | Self::List(inner) => inner.innermost_concrete(),
        }
    }

    /// Indicates whether this [`TypeType`] is wrapped as non-`null`.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl<'a, S> fmt::Display for TypeType<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(t) => f.write_str(t.name()),
            Self::List(i) => write!(f, "[{i}]"),
            Self::NonNull(i) => write!(f, "{i}!"),
        }
    }
}

impl<S: ScalarValue> DirectiveType<S> {
    /// Builds a new [`DirectiveType`] out of its parts.
    pub fn new(
        name: impl Into<ArcStr>,
        locations: Vec<DirectiveLocation>,
        arguments: Vec<ArgumentMeta<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations,
            arguments,
        }
    }

    fn new_skip() -> Self {
        Self::new(
            "skip",
            vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![ArgumentMeta::new("if", Type::non_null("Boolean"))],
        )
    }

    fn new_include() -> Self {
        Self::new(
            "include",
            vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![ArgumentMeta::new("if", Type::non_null("Boolean"))],
        )
    }

    fn new_defer() -> Self {
        Self::new(
            "defer",
            vec![
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![
                ArgumentMeta::new("label", Type::nullable("String")),
                ArgumentMeta::new("if", Type::nullable("Boolean"))
                    .default_value(InputValue::scalar(true)),
            ],
        )
    }

    fn new_stream() -> Self {
        Self::new(
            "stream",
            vec![DirectiveLocation::Field],
            vec![
                ArgumentMeta::new("initialCount", Type::non_null("Int")),
                ArgumentMeta::new("label", Type::nullable("String")),
                ArgumentMeta::new("if", Type::nullable("Boolean"))
                    .default_value(InputValue::scalar(true)),
            ],
        )
    }

    /// Sets the `description` of this [`DirectiveType`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::Field => "field",
            Self::FragmentDefinition => "fragment definition",
            Self::FragmentSpread => "fragment spread",
            Self::InlineFragment => "inline fragment",
        })
    }
}

fn builtin_scalars<S: ScalarValue>() -> Vec<MetaType<S>> {
    vec![
        ScalarMeta::new("Int")
            .serializer(Arc::new(|raw: &SourceValue<S>| {
                raw.as_scalar().and_then(S::as_int).map(Value::scalar)
            }))
            .into_meta(),
        ScalarMeta::new("Float")
            .serializer(Arc::new(|raw: &SourceValue<S>| {
                raw.as_scalar().and_then(S::as_float).map(Value::scalar)
            }))
            .into_meta(),
        ScalarMeta::new("String")
            .serializer(Arc::new(|raw: &SourceValue<S>| {
                raw.as_scalar()
                    .and_then(S::as_string)
                    .map(Value::scalar)
            }))
            .into_meta(),
        ScalarMeta::new("Boolean")
            .serializer(Arc::new(|raw: &SourceValue<S>| {
                raw.as_scalar().and_then(S::as_boolean).map(Value::scalar)
            }))
            .into_meta(),
        ScalarMeta::new("ID")
            .serializer(Arc::new(|raw: &SourceValue<S>| {
                let s = raw.as_scalar()?;
                s.as_string()
                    .or_else(|| s.as_int().map(|i| i.to_string()))
                    .map(Value::scalar)
            }))
            .into_meta(),
    ]
}

fn typename_meta_field<S: ScalarValue>() -> FieldMeta<S> {
    FieldMeta::new("__typename", Type::non_null("String")).resolver(Arc::new(
        |_, _, _, info| Eventual::Ready(Ok(SourceValue::scalar(info.parent_type.name().to_string()))),
    ))
}

//! Operation document AST consumed by the execution engine.
//!
//! Parsing and validation of documents happen outside this crate; these are
//! the shapes they hand over. Every node carries its location in the source
//! via [`Spanning`], which is what located execution errors point at.

use std::{fmt, slice};

use arcstr::ArcStr;

use crate::{
    executor::Variables,
    span::Spanning,
    value::{DefaultScalarValue, ScalarValue},
};

/// Possible modifiers in a [`Type`] literal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeModifier {
    /// Non-`null` type (e.g. `<type>!`).
    NonNull,

    /// List of types (e.g. `[<type>]`).
    List,
}

/// Type literal in a syntax tree.
///
/// Carries no semantic information and might refer to types that don't
/// exist.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Type<N = ArcStr> {
    /// Name of this [`Type`].
    name: N,

    /// Modifiers of this [`Type`], the first one being the innermost one.
    modifiers: Vec<TypeModifier>,
}

impl<N: AsRef<str>> Type<N> {
    /// Creates a new `null`able [`Type`] literal from the provided `name`.
    pub fn nullable(name: impl Into<N>) -> Self {
        Self {
            name: name.into(),
            modifiers: vec![],
        }
    }

    /// Creates a new [`TypeModifier::NonNull`] [`Type`] literal from the
    /// provided `name`.
    pub fn non_null(name: impl Into<N>) -> Self {
        Self::nullable(name).wrap_non_null()
    }

    /// Wraps this [`Type`] into a [`TypeModifier::List`].
    #[must_use]
    pub fn wrap_list(mut self) -> Self {
        self.modifiers.push(TypeModifier::List);
        self
    }

    /// Wraps this [`Type`] as a [`TypeModifier::NonNull`] one.
    #[must_use]
    pub fn wrap_non_null(mut self) -> Self {
        self.modifiers.push(TypeModifier::NonNull);
        self
    }

    /// Returns the innermost name of this [`Type`] by unpacking lists.
    ///
    /// All [`Type`] literals contain exactly one name.
    #[must_use]
    pub fn innermost_name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns [`TypeModifier`]s of this [`Type`], the first one being the
    /// innermost one.
    #[must_use]
    pub fn modifiers(&self) -> &[TypeModifier] {
        &self.modifiers
    }

    /// Indicates whether the topmost modifier of this [`Type`] is
    /// [`TypeModifier::NonNull`].
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self.modifiers.last(), Some(TypeModifier::NonNull))
    }
}

pub(crate) fn format_type(
    name: &str,
    modifiers: &[TypeModifier],
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match modifiers.split_last() {
        Some((TypeModifier::NonNull, inner)) => {
            format_type(name, inner, f)?;
            write!(f, "!")
        }
        Some((TypeModifier::List, inner)) => {
            write!(f, "[")?;
            format_type(name, inner, f)?;
            write!(f, "]")
        }
        None => write!(f, "{name}"),
    }
}

impl<N: AsRef<str>> fmt::Display for Type<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_type(self.name.as_ref(), &self.modifiers, f)
    }
}

/// A JSON-like value that can be passed into the query execution, either
/// out-of-band, or in-band as default variable values. These are _not_
/// constant and might contain variables.
///
/// List and object variants are _spanned_, i.e. they contain a reference to
/// their position in the source file, if available.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue<S = DefaultScalarValue> {
    Null,
    Scalar(S),
    Enum(String),
    Variable(String),
    List(Vec<Spanning<InputValue<S>>>),
    Object(Vec<(Spanning<String>, Spanning<InputValue<S>>)>),
}

impl<S> InputValue<S> {
    /// Constructs a `null` value.
    pub fn null() -> Self {
        Self::Null
    }

    /// Constructs a scalar value.
    pub fn scalar<T: Into<S>>(v: T) -> Self {
        Self::Scalar(v.into())
    }

    /// Constructs an enum value.
    pub fn enum_value<T: AsRef<str>>(s: T) -> Self {
        Self::Enum(s.as_ref().into())
    }

    /// Constructs a variable value.
    pub fn variable<T: AsRef<str>>(v: T) -> Self {
        Self::Variable(v.as_ref().into())
    }

    /// Constructs a [`Spanning::unlocated`] list.
    ///
    /// Convenience function to make each [`InputValue`] in the input vector
    /// not contain any location information.
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l.into_iter().map(Spanning::unlocated).collect())
    }

    /// Constructs a [`Spanning::unlocated`] object.
    pub fn object<K: Into<String>>(o: Vec<(K, Self)>) -> Self {
        Self::Object(
            o.into_iter()
                .map(|(k, v)| (Spanning::unlocated(k.into()), Spanning::unlocated(v)))
                .collect(),
        )
    }

    /// Does the value represent a `null`?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Does the value represent a variable?
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Views the underlying enum value, if present.
    pub fn as_enum_value(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(e.as_str()),
            _ => None,
        }
    }

    /// Views the underlying scalar value, if present.
    pub fn as_scalar(&self) -> Option<&S> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Views this [`InputValue`] as a list of its elements, if it represents
    /// one.
    pub fn to_list_value(&self) -> Option<Vec<&Self>> {
        match self {
            Self::List(l) => Some(l.iter().map(|s| &s.item).collect()),
            _ => None,
        }
    }

    /// Views this [`InputValue`] as its object fields, if it represents an
    /// object.
    pub fn to_object_value(&self) -> Option<Vec<(&str, &Self)>> {
        match self {
            Self::Object(o) => Some(
                o.iter()
                    .map(|(sk, sv)| (sk.item.as_str(), &sv.item))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Resolves all variables of this [`InputValue`] to their actual
    /// `values`.
    ///
    /// If a variable is not present in the `values`:
    /// - Returns [`None`] in case this is an [`InputValue::Variable`].
    /// - Skips the field in case of an [`InputValue::Object`] field.
    /// - Replaces with an [`InputValue::Null`] in case of an
    ///   [`InputValue::List`] element.
    ///
    /// This is done, because for an [`InputValue::Variable`] (or an
    /// [`InputValue::Object`] field) a default value can be used later, if
    /// it's provided. While on the contrary, a single [`InputValue::List`]
    /// element cannot have a default value.
    #[must_use]
    pub fn into_const(self, values: &Variables<S>) -> Option<Self>
    where
        S: Clone,
    {
        match self {
            Self::Variable(v) => values.get(&v).cloned(),
            Self::List(l) => Some(Self::List(
                l.into_iter()
                    .map(|s| s.map(|v| v.into_const(values).unwrap_or_else(Self::null)))
                    .collect(),
            )),
            Self::Object(o) => Some(Self::Object(
                o.into_iter()
                    .filter_map(|(sk, sv)| {
                        let span = sv.span;
                        sv.item
                            .into_const(values)
                            .map(|v| (sk, Spanning::new(span, v)))
                    })
                    .collect(),
            )),
            v => Some(v),
        }
    }
}

impl<S: ScalarValue> fmt::Display for InputValue<S> {
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
            Self::Enum(v) => write!(f, "{v}"),
            Self::Variable(v) => write!(f, "${v}"),
            Self::List(v) => {
                write!(f, "[")?;
                for (i, spanning) in v.iter().enumerate() {
                    spanning.item.fmt(f)?;
                    if i < v.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    write!(f, "{}: ", k.item)?;
                    v.item.fmt(f)?;
                    if i < o.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

/// AST arguments of a field or a directive, in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Arguments<'a, S> {
    #[expect(missing_docs, reason = "self-explanatory")]
    pub items: Vec<(Spanning<&'a str>, Spanning<InputValue<S>>)>,
}

impl<'a, S> Arguments<'a, S> {
    /// Returns an iterator over the argument name/value pairs.
    pub fn iter(&self) -> slice::Iter<'_, (Spanning<&'a str>, Spanning<InputValue<S>>)> {
        self.items.iter()
    }

    /// Returns the value of the argument with the given `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Spanning<InputValue<S>>> {
        self.items
            .iter()
            .find(|(k, _)| k.item == key)
            .map(|(_, v)| v)
    }
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct Directive<'a, S> {
    pub name: Spanning<&'a str>,
    pub arguments: Option<Spanning<Arguments<'a, S>>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition<'a, S> {
    pub var_type: Spanning<Type<&'a str>>,
    pub default_value: Option<Spanning<InputValue<S>>>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct VariablesDefinition<'a, S> {
    pub items: Vec<(Spanning<&'a str>, VariableDefinition<'a, S>)>,
}

impl<'a, S> VariablesDefinition<'a, S> {
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn iter(&self) -> slice::Iter<'_, (Spanning<&'a str>, VariableDefinition<'a, S>)> {
        self.items.iter()
    }
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct Field<'a, S> {
    pub alias: Option<Spanning<&'a str>>,
    pub name: Spanning<&'a str>,
    pub arguments: Option<Spanning<Arguments<'a, S>>>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
    pub selection_set: Option<Vec<Selection<'a, S>>>,
}

impl<'a, S> Field<'a, S> {
    /// The response name of this field: its alias, if any, or its name.
    pub fn response_name(&self) -> &'a str {
        self.alias.as_ref().map_or(self.name.item, |a| a.item)
    }
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread<'a, S> {
    pub name: Spanning<&'a str>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment<'a, S> {
    pub type_condition: Option<Spanning<&'a str>>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
    pub selection_set: Vec<Selection<'a, S>>,
}

/// Entry in a GraphQL selection set.
///
/// This enum represents one of the three variants of a selection that exists
/// in GraphQL: a field, a fragment spread, or an inline fragment. Each of
/// the variants references their location in the query source.
///
/// ```text
/// {
///   field(withArg: 123) { subField }
///   ...fragmentSpread
///   ...on User {
///     inlineFragmentField
///   }
/// }
/// ```
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub enum Selection<'a, S = DefaultScalarValue> {
    Field(Spanning<Field<'a, S>>),
    FragmentSpread(Spanning<FragmentSpread<'a, S>>),
    InlineFragment(Spanning<InlineFragment<'a, S>>),
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct Operation<'a, S> {
    pub operation_type: OperationType,
    pub name: Option<Spanning<&'a str>>,
    pub variables_definition: Option<Spanning<VariablesDefinition<'a, S>>>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
    pub selection_set: Vec<Selection<'a, S>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment<'a, S> {
    pub name: Spanning<&'a str>,
    pub type_condition: Spanning<&'a str>,
    pub directives: Option<Vec<Spanning<Directive<'a, S>>>>,
    pub selection_set: Vec<Selection<'a, S>>,
}

#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub enum Definition<'a, S> {
    Operation(Spanning<Operation<'a, S>>),
    Fragment(Spanning<Fragment<'a, S>>),
}

#[doc(hidden)]
pub type Document<'a, S> = [Definition<'a, S>];
#[doc(hidden)]
pub type OwnedDocument<'a, S> = Vec<Definition<'a, S>>;

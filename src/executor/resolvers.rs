//! The built-in field and type resolvers used when a request supplies none.

use std::sync::Arc;

use crate::{
    schema::meta::MetaType,
    source::{FieldResolverFn, SourceProperty, SourceValue, TypeResolverFn},
    value::ScalarValue,
};

use super::Eventual;

/// The default field resolver: looks the field's name up among the source
/// object's properties.
///
/// A plain property is returned as-is; a property carrying a resolver is
/// invoked with `(arguments, context value, info)`. Anything else (a
/// missing property, or a source that is not object-like) resolves to an
/// absent value, which completes to `null` downstream.
pub(crate) fn default_field_resolver<S: ScalarValue>() -> FieldResolverFn<S> {
    Arc::new(|source, args, context_value, info| match source {
        SourceValue::Object(o) => match o.get(info.field_name) {
            Some(SourceProperty::Value(v)) => Eventual::Ready(Ok(v.clone())),
            Some(SourceProperty::Resolver(f)) => f(args, context_value, info),
            None => Eventual::Ready(Ok(SourceValue::Null)),
        },
        _ => Eventual::Ready(Ok(SourceValue::Null)),
    })
}

/// The default type resolver for abstract types.
///
/// Consults the source object's type-name hint first, then probes each
/// possible type's `is_type_of` predicate in order and settles on the first
/// one that claims the value.
pub(crate) fn default_type_resolver<S: ScalarValue>() -> TypeResolverFn<S> {
    Arc::new(|value, context_value, info, abstract_type| {
        if let SourceValue::Object(o) = value {
            if let Some(name) = o.type_name() {
                return Eventual::Ready(Ok(name.to_owned()));
            }
        }

        let unresolved = format!(
            "Abstract type \"{}\" must resolve to an Object type at runtime for field \
             \"{}.{}\". Either the \"{}\" type should provide a \"resolveType\" function or \
             each possible type should provide an \"isTypeOf\" function.",
            abstract_type.name(),
            info.parent_type.name(),
            info.field_name,
            abstract_type.name(),
        );

        let mut pending = vec![];
        for possible in info.schema.possible_types(abstract_type) {
            let MetaType::Object(obj) = possible else {
                continue;
            };
            let Some(predicate) = &obj.is_type_of else {
                continue;
            };
            match predicate(value, context_value, info) {
                Eventual::Ready(Ok(true)) => {
                    return Eventual::Ready(Ok(obj.name.to_string()));
                }
                Eventual::Ready(Ok(false)) => {}
                Eventual::Ready(Err(e)) => return Eventual::Ready(Err(e)),
                Eventual::Pending(fut) => pending.push((obj.name.to_string(), fut)),
            }
        }

        if pending.is_empty() {
            return Eventual::Ready(Err(unresolved.into()));
        }
        Eventual::pending(async move {
            for (name, fut) in pending {
                if fut.await? {
                    return Ok(name);
                }
            }
            Err(unresolved.into())
        })
    })
}

//! Grouping of selection sets into per-response-name field groups, plus the
//! deferred patch records `@defer` splits off.

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexMap;

use crate::{
    ast::{Directive, Field, InputValue, Selection},
    schema::{meta::MetaType, model::SchemaType},
    span::Spanning,
    value::ScalarValue,
};

use super::{ExecutionContext, arguments};

/// The merged nodes selecting one response key. Shared by reference so that
/// completing a list of objects reuses one sub-field collection.
pub(crate) type FieldNodes<'a, S> = Arc<Vec<&'a Spanning<Field<'a, S>>>>;

/// Grouped field map: response name to its merged selection nodes, in order
/// of first appearance.
pub(crate) type FieldMap<'a, S> = IndexMap<&'a str, FieldNodes<'a, S>>;

/// The outcome of collecting a selection set on a concrete type.
pub(crate) struct CollectedFields<'a, S> {
    pub(crate) fields: FieldMap<'a, S>,
    pub(crate) patches: Vec<Patch<'a, S>>,
}

/// A deferred sub-selection, executed and delivered out-of-band.
pub(crate) struct Patch<'a, S> {
    pub(crate) label: Option<String>,
    pub(crate) collected: CollectedFields<'a, S>,
}

/// Collects `selection_set` against `runtime_type` into a grouped field map
/// and the deferred patches it spins off.
pub(crate) fn collect_fields<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    runtime_type: &'a MetaType<S>,
    selection_set: &'a [Selection<'a, S>],
) -> CollectedFields<'a, S> {
    let mut grouped = IndexMap::new();
    let mut patches = vec![];
    let mut visited = HashSet::new();
    collect_into(
        ctx,
        runtime_type,
        selection_set,
        &mut grouped,
        &mut patches,
        &mut visited,
    );
    CollectedFields {
        fields: freeze(grouped),
        patches,
    }
}

/// Collects the merged sub-selections of one field group against the
/// object type it completed into.
///
/// Memoized per `(object type, field-node list)` identity: list completion
/// passes the same node list for every element, so the walk happens once
/// per list, not once per element.
pub(crate) fn collect_subfields<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    object_type: &'a MetaType<S>,
    field_nodes: &FieldNodes<'a, S>,
) -> Arc<CollectedFields<'a, S>> {
    let key = (
        std::ptr::from_ref(object_type) as usize,
        Arc::as_ptr(field_nodes) as usize,
    );
    if let Some(cached) = ctx.memoized_subfields(key) {
        return cached;
    }

    let mut grouped = IndexMap::new();
    let mut patches = vec![];
    let mut visited = HashSet::new();
    for &node in field_nodes.iter() {
        if let Some(selection_set) = &node.item.selection_set {
            collect_into(
                ctx,
                object_type,
                selection_set,
                &mut grouped,
                &mut patches,
                &mut visited,
            );
        }
    }

    let collected = Arc::new(CollectedFields {
        fields: freeze(grouped),
        patches,
    });
    ctx.memoize_subfields(key, collected.clone());
    collected
}

fn freeze<'a, S>(
    grouped: IndexMap<&'a str, Vec<&'a Spanning<Field<'a, S>>>>,
) -> FieldMap<'a, S> {
    grouped.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
}

fn collect_into<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    runtime_type: &'a MetaType<S>,
    selection_set: &'a [Selection<'a, S>],
    grouped: &mut IndexMap<&'a str, Vec<&'a Spanning<Field<'a, S>>>>,
    patches: &mut Vec<Patch<'a, S>>,
    visited: &mut HashSet<&'a str>,
) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                if is_excluded(ctx, field.item.directives.as_ref()) {
                    continue;
                }
                grouped
                    .entry(field.item.response_name())
                    .or_default()
                    .push(field);
            }
            Selection::FragmentSpread(spread) => {
                if is_excluded(ctx, spread.item.directives.as_ref()) {
                    continue;
                }
                if let Some(label) = defer_label(ctx, spread.item.directives.as_ref()) {
                    let Some(&fragment) = ctx.fragments.get(spread.item.name.item) else {
                        continue;
                    };
                    patches.push(Patch {
                        label,
                        collected: collect_fields(ctx, runtime_type, &fragment.selection_set),
                    });
                    continue;
                }
                if !visited.insert(spread.item.name.item) {
                    continue;
                }
                let Some(&fragment) = ctx.fragments.get(spread.item.name.item) else {
                    continue;
                };
                if !fragment_condition_matches(
                    ctx.schema,
                    runtime_type,
                    Some(fragment.type_condition.item),
                ) {
                    continue;
                }
                collect_into(
                    ctx,
                    runtime_type,
                    &fragment.selection_set,
                    grouped,
                    patches,
                    visited,
                );
            }
            Selection::InlineFragment(inline) => {
                if is_excluded(ctx, inline.item.directives.as_ref()) {
                    continue;
                }
                if let Some(label) = defer_label(ctx, inline.item.directives.as_ref()) {
                    patches.push(Patch {
                        label,
                        collected: collect_fields(ctx, runtime_type, &inline.item.selection_set),
                    });
                    continue;
                }
                if !fragment_condition_matches(
                    ctx.schema,
                    runtime_type,
                    inline.item.type_condition.as_ref().map(|c| c.item),
                ) {
                    continue;
                }
                collect_into(
                    ctx,
                    runtime_type,
                    &inline.item.selection_set,
                    grouped,
                    patches,
                    visited,
                );
            }
        }
    }
}

/// A fragment applies when its condition names the current type, an
/// interface the current type implements, or a union containing it.
fn fragment_condition_matches<S: ScalarValue>(
    schema: &SchemaType<S>,
    runtime_type: &MetaType<S>,
    condition: Option<&str>,
) -> bool {
    let Some(name) = condition else {
        return true;
    };
    let type_name: &str = runtime_type.name();
    if type_name == name {
        return true;
    }
    match schema.concrete_type_by_name(name) {
        Some(conditional) => {
            conditional.is_abstract() && schema.is_possible_type(conditional, runtime_type)
        }
        None => false,
    }
}

/// Evaluates `@skip`/`@include` against the variable scope.
fn is_excluded<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    directives: Option<&'a Vec<Spanning<Directive<'a, S>>>>,
) -> bool {
    let skip = ctx
        .schema
        .directive_by_name("skip")
        .expect("`@skip` is registered by the schema constructor");
    if let Ok(Some(args)) = arguments::coerce_directive_values(skip, directives, &ctx.variables) {
        if args.get("if").and_then(as_boolean) == Some(true) {
            return true;
        }
    }
    let include = ctx
        .schema
        .directive_by_name("include")
        .expect("`@include` is registered by the schema constructor");
    if let Ok(Some(args)) = arguments::coerce_directive_values(include, directives, &ctx.variables)
    {
        if args.get("if").and_then(as_boolean) == Some(false) {
            return true;
        }
    }
    false
}

/// Checks `@defer` on a fragment: `Some(label)` when the fragment is
/// deferred (with its optional label), `None` when it executes inline.
fn defer_label<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    directives: Option<&'a Vec<Spanning<Directive<'a, S>>>>,
) -> Option<Option<String>> {
    let defer = ctx
        .schema
        .directive_by_name("defer")
        .expect("`@defer` is registered by the schema constructor");
    let args = arguments::coerce_directive_values(defer, directives, &ctx.variables).ok()??;
    if args.get("if").and_then(as_boolean) == Some(false) {
        return None;
    }
    Some(
        args.get("label")
            .and_then(|v| v.as_scalar().and_then(S::as_str))
            .map(Into::into),
    )
}

fn as_boolean<S: ScalarValue>(v: &InputValue<S>) -> Option<bool> {
    v.as_scalar().and_then(S::as_boolean)
}

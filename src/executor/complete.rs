//! Type-directed completion of raw resolver values into response values.

use std::sync::Arc;

use futures::StreamExt as _;

use crate::{
    schema::{meta::MetaType, model::TypeType},
    source::{SourceStream, SourceValue},
    value::{ScalarValue, Value},
};

use super::{
    CompletionResult, ErrorSink, Eventual, ExecutionContext, ExecutionError, FieldError,
    FieldInfo, FieldNodes, ResponsePath, arguments, collect, make_resolve_info,
};

/// Attaches the source locations of `nodes` and the linearized `path` to a
/// field error.
pub(crate) fn located_error<'a, S>(
    error: FieldError<S>,
    nodes: &FieldNodes<'a, S>,
    path: &ResponsePath<'a>,
) -> ExecutionError<S> {
    ExecutionError::new(
        nodes.iter().map(|n| *n.start()).collect(),
        path.linearize(),
        error,
    )
}

/// The single authority on `null` bubbling: a located error under a
/// non-`null` type re-raises towards the nearest nullable ancestor, while
/// under a nullable type it is recorded and the value becomes `null`.
pub(crate) fn handle_field_error<S>(
    error: ExecutionError<S>,
    return_type: &TypeType<'_, S>,
    errors: &ErrorSink<S>,
) -> CompletionResult<S> {
    if return_type.is_non_null() {
        Err(error)
    } else {
        errors.lock().unwrap().push(error);
        Ok(Value::Null)
    }
}

/// Completes a raw resolver value against `current_type`.
///
/// Errors come back as `Err` of an already-located [`ExecutionError`]; the
/// caller owning the field boundary decides whether they bubble.
pub(crate) fn complete_value<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    current_type: &TypeType<'a, S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    raw: SourceValue<S>,
) -> Eventual<'a, CompletionResult<S>> {
    match current_type {
        TypeType::NonNull(inner) => {
            let message = format!(
                "Cannot return null for non-nullable field {}.{}.",
                finfo.parent_type.name(),
                finfo.field_name,
            );
            let nodes = finfo.field_nodes.clone();
            let error_path = path.clone();
            complete_value(ctx, inner, finfo, path, errors, raw).map(move |result| {
                match result {
                    Ok(Value::Null) => Err(located_error(message.into(), &nodes, &error_path)),
                    other => other,
                }
            })
        }
        _ if raw.is_null() => Eventual::Ready(Ok(Value::Null)),
        TypeType::List(inner) => match raw {
            SourceValue::Stream(stream) => {
                complete_async_sequence(ctx, inner, finfo, path, errors, stream)
            }
            SourceValue::List(items) => complete_list(ctx, inner, finfo, path, errors, items),
            _ => Eventual::Ready(Err(located_error(
                format!(
                    "Expected Iterable, but did not find one for field \"{}.{}\".",
                    finfo.parent_type.name(),
                    finfo.field_name,
                )
                .into(),
                &finfo.field_nodes,
                path,
            ))),
        },
        TypeType::Concrete(meta) => {
            let meta: &'a MetaType<S> = meta;
            match meta {
                MetaType::Scalar(scalar) => Eventual::Ready(match (scalar.serialize_fn)(&raw) {
                    Some(v) => Ok(v),
                    None => Err(leaf_serialization_error(meta, &raw, finfo, path)),
                }),
                MetaType::Enum(e) => Eventual::Ready(match e.serialize(&raw) {
                    Some(v) => Ok(v),
                    None => Err(leaf_serialization_error(meta, &raw, finfo, path)),
                }),
                MetaType::Interface(_) | MetaType::Union(_) => {
                    complete_abstract(ctx, meta, finfo, path, errors, raw)
                }
                MetaType::Object(_) => complete_object_value(ctx, meta, finfo, path, errors, raw),
                MetaType::InputObject(_) => panic!(
                    "cannot complete a value of input type \"{}\" in output position",
                    meta.name(),
                ),
            }
        }
    }
}

fn leaf_serialization_error<'a, S: ScalarValue>(
    leaf_type: &MetaType<S>,
    raw: &SourceValue<S>,
    finfo: &FieldInfo<'a, S>,
    path: &ResponsePath<'a>,
) -> ExecutionError<S> {
    located_error(
        format!(
            "Expected a value of type \"{}\" but received: {raw}",
            leaf_type.name(),
        )
        .into(),
        &finfo.field_nodes,
        path,
    )
}

/// `@stream` arguments of the field being completed, when active.
pub(crate) struct StreamArguments {
    pub(crate) initial_count: usize,
    pub(crate) label: Option<String>,
}

/// Reads `@stream` off the first field node. Validation guarantees
/// equivalent stream arguments across merged aliased selections.
fn stream_arguments<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    finfo: &FieldInfo<'a, S>,
    path: &ResponsePath<'a>,
) -> Result<Option<StreamArguments>, ExecutionError<S>> {
    let def = ctx
        .schema
        .directive_by_name("stream")
        .expect("`@stream` is registered by the schema constructor");
    let first = *finfo
        .field_nodes
        .first()
        .expect("field groups hold at least one node");
    let args =
        arguments::coerce_directive_values(def, first.item.directives.as_ref(), &ctx.variables)
            .map_err(|e| located_error(e, &finfo.field_nodes, path))?;
    let Some(args) = args else {
        return Ok(None);
    };
    if args.get("if").and_then(|v| v.as_scalar().and_then(S::as_boolean)) == Some(false) {
        return Ok(None);
    }
    let initial_count = match args
        .get("initialCount")
        .and_then(|v| v.as_scalar().and_then(S::as_int))
    {
        Some(n) if n >= 0 => n as usize,
        _ => {
            return Err(located_error(
                "initialCount must be a positive integer".into(),
                &finfo.field_nodes,
                path,
            ));
        }
    };
    let label = args
        .get("label")
        .and_then(|v| v.as_scalar().and_then(S::as_str))
        .map(Into::into);
    Ok(Some(StreamArguments {
        initial_count,
        label,
    }))
}

fn complete_list<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    item_type: &TypeType<'a, S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    items: Vec<SourceValue<S>>,
) -> Eventual<'a, CompletionResult<S>> {
    let stream = match stream_arguments(ctx, finfo, path) {
        Ok(s) => s,
        Err(e) => return Eventual::Ready(Err(e)),
    };

    let mut completed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if let Some(args) = &stream {
            if index >= args.initial_count {
                ctx.dispatcher.add_value(
                    ctx.clone(),
                    item_type.clone(),
                    finfo.clone(),
                    path.append_index(index),
                    args.label.clone(),
                    item,
                );
                continue;
            }
        }
        completed.push(complete_list_item(
            ctx,
            item_type,
            finfo,
            &path.append_index(index),
            errors,
            item,
        ));
    }

    Eventual::all(completed).map(|results| {
        let mut values = Vec::with_capacity(results.len());
        for result in results {
            values.push(result?);
        }
        Ok(Value::List(values))
    })
}

/// Completes one list element, guarding its own error boundary: a failure
/// in a nullable element position yields `null` in that slot, while a
/// non-`null` element re-raises into the list itself.
fn complete_list_item<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    item_type: &TypeType<'a, S>,
    finfo: &FieldInfo<'a, S>,
    item_path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    item: SourceValue<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let guard_type = item_type.clone();
    let guard_errors = errors.clone();
    complete_value(ctx, item_type, finfo, item_path, errors, item).map(move |result| {
        match result {
            Err(e) => handle_field_error(e, &guard_type, &guard_errors),
            ok => ok,
        }
    })
}

/// Completes an async sequence: elements up to `initialCount` (or all of
/// them, without `@stream`) are pulled and completed inline; the rest of
/// the sequence is handed to the dispatcher.
///
/// A failing inline element settles the in-hand list right there; elements
/// already being completed still land in their slots.
fn complete_async_sequence<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    item_type: &TypeType<'a, S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    stream: SourceStream<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let stream_args = match stream_arguments(ctx, finfo, path) {
        Ok(s) => s,
        Err(e) => return Eventual::Ready(Err(e)),
    };
    let Some(mut sequence) = stream.take() else {
        return Eventual::Ready(Err(located_error(
            format!(
                "Async sequence for field \"{}.{}\" was already consumed.",
                finfo.parent_type.name(),
                finfo.field_name,
            )
            .into(),
            &finfo.field_nodes,
            path,
        )));
    };

    let ctx = ctx.clone();
    let item_type = item_type.clone();
    let finfo = finfo.clone();
    let path = path.clone();
    let errors = errors.clone();
    Eventual::pending(async move {
        let mut completed: Vec<Eventual<'a, CompletionResult<S>>> = vec![];
        let mut index = 0;
        loop {
            if let Some(args) = &stream_args {
                if index >= args.initial_count {
                    ctx.dispatcher.add_async_sequence_value(
                        ctx.clone(),
                        index,
                        sequence,
                        item_type.clone(),
                        finfo.clone(),
                        path.clone(),
                        args.label.clone(),
                    );
                    break;
                }
            }
            let Some(next) = sequence.next().await else {
                break;
            };
            let item_path = path.append_index(index);
            match next {
                Ok(item) => {
                    match complete_value(&ctx, &item_type, &finfo, &item_path, &errors, item) {
                        Eventual::Ready(Ok(v)) => completed.push(Eventual::Ready(Ok(v))),
                        Eventual::Ready(Err(e)) => {
                            match handle_field_error(e, &item_type, &errors) {
                                Err(e) => return Err(e),
                                Ok(v) => completed.push(Eventual::Ready(Ok(v))),
                            }
                            break;
                        }
                        Eventual::Pending(fut) => {
                            let guard_type = item_type.clone();
                            let guard_errors = errors.clone();
                            completed.push(Eventual::pending(async move {
                                match fut.await {
                                    Err(e) => handle_field_error(e, &guard_type, &guard_errors),
                                    ok => ok,
                                }
                            }));
                        }
                    }
                }
                Err(e) => {
                    let located = located_error(e, &finfo.field_nodes, &item_path);
                    match handle_field_error(located, &item_type, &errors) {
                        Err(e) => return Err(e),
                        Ok(v) => completed.push(Eventual::Ready(Ok(v))),
                    }
                    break;
                }
            }
            index += 1;
        }

        let mut values = Vec::with_capacity(completed.len());
        for result in Eventual::all(completed).resolve().await {
            values.push(result?);
        }
        Ok(Value::List(values))
    })
}

fn complete_abstract<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    abstract_type: &'a MetaType<S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    raw: SourceValue<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let resolver = match abstract_type {
        MetaType::Interface(i) => i.resolve_type.as_ref(),
        MetaType::Union(u) => u.resolve_type.as_ref(),
        _ => None,
    }
    .unwrap_or(&ctx.type_resolver);

    let resolved = {
        let info = make_resolve_info(ctx, finfo, path);
        resolver(&raw, ctx.context_value.as_ref(), &info, abstract_type)
    };
    match resolved {
        Eventual::Ready(result) => {
            validate_runtime_type(ctx, abstract_type, finfo, path, errors, raw, result)
        }
        Eventual::Pending(fut) => {
            let ctx = ctx.clone();
            let finfo = finfo.clone();
            let path = path.clone();
            let errors = errors.clone();
            Eventual::pending(async move {
                let result = fut.await;
                validate_runtime_type(&ctx, abstract_type, &finfo, &path, &errors, raw, result)
                    .resolve()
                    .await
            })
        }
    }
}

/// Validates the runtime type name an abstract-type resolution produced:
/// it must be a string naming an object type of the schema that is a
/// possible type of the abstract one.
fn validate_runtime_type<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    abstract_type: &'a MetaType<S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    raw: SourceValue<S>,
    resolved: Result<String, FieldError<S>>,
) -> Eventual<'a, CompletionResult<S>> {
    let type_name = match resolved {
        Ok(name) => name,
        Err(e) => {
            return Eventual::Ready(Err(located_error(e, &finfo.field_nodes, path)));
        }
    };

    let invalid = |message: String| {
        Eventual::Ready(Err(located_error(message.into(), &finfo.field_nodes, path)))
    };
    let Some(runtime_type) = ctx.schema.concrete_type_by_name(&type_name) else {
        return invalid(format!(
            "Abstract type \"{}\" was resolved to a type \"{type_name}\" that does not exist \
             inside the schema.",
            abstract_type.name(),
        ));
    };
    if !runtime_type.is_object() {
        return invalid(format!(
            "Abstract type \"{}\" was resolved to a non-object type \"{type_name}\".",
            abstract_type.name(),
        ));
    }
    if !ctx.schema.is_possible_type(abstract_type, runtime_type) {
        return invalid(format!(
            "Runtime Object type \"{type_name}\" is not a possible type for \"{}\".",
            abstract_type.name(),
        ));
    }
    complete_object_value(ctx, runtime_type, finfo, path, errors, raw)
}

fn complete_object_value<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    object_type: &'a MetaType<S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    raw: SourceValue<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let Some(obj) = object_type.as_object() else {
        panic!(
            "cannot complete a value into non-object type \"{}\"",
            object_type.name(),
        );
    };

    if let Some(predicate) = &obj.is_type_of {
        let checked = {
            let info = make_resolve_info(ctx, finfo, path);
            predicate(&raw, ctx.context_value.as_ref(), &info)
        };
        match checked {
            Eventual::Ready(Ok(true)) => {}
            Eventual::Ready(Ok(false)) => {
                return Eventual::Ready(Err(invalid_value_error(object_type, &raw, finfo, path)));
            }
            Eventual::Ready(Err(e)) => {
                return Eventual::Ready(Err(located_error(e, &finfo.field_nodes, path)));
            }
            Eventual::Pending(fut) => {
                let ctx = ctx.clone();
                let finfo = finfo.clone();
                let path = path.clone();
                let errors = errors.clone();
                return Eventual::pending(async move {
                    match fut.await {
                        Ok(true) => {
                            execute_subfields(&ctx, object_type, &finfo, &path, &errors, raw)
                                .resolve()
                                .await
                        }
                        Ok(false) => Err(invalid_value_error(object_type, &raw, &finfo, &path)),
                        Err(e) => Err(located_error(e, &finfo.field_nodes, &path)),
                    }
                });
            }
        }
    }
    execute_subfields(ctx, object_type, finfo, path, errors, raw)
}

fn invalid_value_error<'a, S: ScalarValue>(
    object_type: &MetaType<S>,
    raw: &SourceValue<S>,
    finfo: &FieldInfo<'a, S>,
    path: &ResponsePath<'a>,
) -> ExecutionError<S> {
    located_error(
        format!(
            "Expected value of type \"{}\" but got: {raw}.",
            object_type.name(),
        )
        .into(),
        &finfo.field_nodes,
        path,
    )
}

/// Collects (memoized) and executes the sub-selections of a completed
/// object, registering any deferred sub-patches with the dispatcher.
fn execute_subfields<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    object_type: &'a MetaType<S>,
    finfo: &FieldInfo<'a, S>,
    path: &Arc<ResponsePath<'a>>,
    errors: &ErrorSink<S>,
    raw: SourceValue<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let collected = collect::collect_subfields(ctx, object_type, &finfo.field_nodes);
    let source = Arc::new(raw);
    let result = super::execute_fields(ctx, object_type, &source, path, &collected.fields, errors);
    super::enqueue_patches(ctx, object_type, &source, path, &collected.patches);
    result
}

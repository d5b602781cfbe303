use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use pretty_assertions::assert_eq;

use crate::{
    ExecutionArgs, GraphQLError, OperationType, Type, Value, execute, execute_sync,
    executor::{Eventual, PathSegment},
    meta::{ArgumentMeta, FieldMeta, ObjectMeta},
    schema::model::SchemaType,
    source::{FieldResolverFn, SourceObject, SourceValue},
};

use super::{
    async_resolver, f, operation, query, resolved_result, resolver, sync_resolver, sync_result,
};

fn string_field(name: &str) -> FieldMeta {
    FieldMeta::new(name, Type::nullable("String"))
}

#[test]
fn synchronous_query_stays_synchronous() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("x")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("x").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("x", "a").into();
    let result = sync_result(execute(args));
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"x": "a"})));

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("x", "a").into();
    let result = execute_sync(args).unwrap();
    assert_eq!(result.data, Some(graphql_value!({"x": "a"})));
}

#[tokio::test]
async fn async_resolver_forces_a_future() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    string_field("s"),
                    string_field("a").resolver(async_resolver("A")),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("s").build(), f("a").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("s", "S").into();
    let execution = execute(args);
    assert!(execution.is_pending());

    let result = resolved_result(execution).await;
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"s": "S", "a": "A"})));

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("s", "S").into();
    let err = execute_sync(args).unwrap_err();
    assert_eq!(err, GraphQLError::NotSynchronous);
    assert_eq!(
        err.to_string(),
        "GraphQL execution failed to complete synchronously.",
    );
}

#[test]
fn null_for_non_nullable_field_bubbles_to_the_root() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    FieldMeta::new("n", Type::non_null("String"))
                        .resolver(sync_resolver(SourceValue::Null)),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("n").build()]);

    let result = sync_result(execute(ExecutionArgs::new(&schema, &doc)));
    assert_eq!(result.data, Some(Value::Null));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].error().message(),
        "Cannot return null for non-nullable field Query.n.",
    );
    assert_eq!(result.errors[0].path(), [PathSegment::Field("n".into())]);
}

#[test]
fn null_bubbles_to_the_nearest_nullable_ancestor() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new("Query", vec![FieldMeta::new("outer", Type::nullable("Outer"))])
                .into_meta(),
            ObjectMeta::new(
                "Outer",
                vec![
                    FieldMeta::new("inner", Type::non_null("String"))
                        .resolver(sync_resolver(SourceValue::Null)),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("outer").select(vec![f("inner").build()]).build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("outer", SourceObject::new())
        .into();
    let result = sync_result(execute(args));

    assert_eq!(result.data, Some(graphql_value!({"outer": null})));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].path(),
        [
            PathSegment::Field("outer".into()),
            PathSegment::Field("inner".into()),
        ],
    );
}

fn recording_resolver(
    name: &'static str,
    delay_ms: u64,
    events: Arc<Mutex<Vec<String>>>,
) -> FieldResolverFn {
    resolver(move |_, _, _, _| {
        events.lock().unwrap().push(format!("{name}:start"));
        let events = events.clone();
        Eventual::pending(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            events.lock().unwrap().push(format!("{name}:end"));
            Ok(SourceValue::scalar(name))
        })
    })
}

fn recording_schema(events: &Arc<Mutex<Vec<String>>>) -> SchemaType {
    let fields = |events: &Arc<Mutex<Vec<String>>>| {
        vec![
            string_field("a").resolver(recording_resolver("a", 30, events.clone())),
            string_field("b").resolver(recording_resolver("b", 20, events.clone())),
            string_field("c").resolver(recording_resolver("c", 10, events.clone())),
        ]
    };
    SchemaType::new(
        vec![
            ObjectMeta::new("Query", fields(events)).into_meta(),
            ObjectMeta::new("Mutation", fields(events)).into_meta(),
        ],
        "Query",
        Some("Mutation"),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn mutation_fields_run_serially_in_collection_order() {
    let events = Arc::new(Mutex::new(vec![]));
    let schema = recording_schema(&events);
    let doc = operation(
        OperationType::Mutation,
        vec![f("a").build(), f("b").build(), f("c").build()],
    );

    let result = resolved_result(execute(ExecutionArgs::new(&schema, &doc))).await;

    assert_eq!(
        *events.lock().unwrap(),
        ["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"],
    );
    assert_eq!(
        result.data,
        Some(graphql_value!({"a": "a", "b": "b", "c": "c"})),
    );
}

#[tokio::test]
async fn query_fields_start_together_but_keep_collection_order() {
    let events = Arc::new(Mutex::new(vec![]));
    let schema = recording_schema(&events);
    let doc = query(vec![f("a").build(), f("b").build(), f("c").build()]);

    let result = resolved_result(execute(ExecutionArgs::new(&schema, &doc))).await;

    // All three resolvers launched before any of them settled, and they
    // settled by delay, not by collection order.
    assert_eq!(
        *events.lock().unwrap(),
        ["a:start", "b:start", "c:start", "c:end", "b:end", "a:end"],
    );
    // The response still keys in collection order.
    assert_eq!(
        serde_json::to_string(&result.data.unwrap()).unwrap(),
        r#"{"a":"a","b":"b","c":"c"}"#,
    );
}

#[test]
fn aliases_rename_response_keys_in_selection_order() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("x")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![
        f("x").alias("second").build(),
        f("x").alias("first").build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("x", "v").into();
    let result = sync_result(execute(args));
    assert_eq!(
        serde_json::to_string(&result.data.unwrap()).unwrap(),
        r#"{"second":"v","first":"v"}"#,
    );
}

#[test]
fn argument_defaults_and_property_resolvers() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    FieldMeta::new("pic", Type::nullable("String"))
                        .argument(
                            ArgumentMeta::new("size", Type::nullable("Int"))
                                .default_value(crate::InputValue::scalar(50)),
                        )
                        .resolver(resolver(|_, args, _, _| {
                            let size = args
                                .get("size")
                                .and_then(|v| v.as_scalar())
                                .and_then(crate::ScalarValue::as_int)
                                .unwrap_or(0);
                            Eventual::Ready(Ok(SourceValue::scalar(format!("Pic of size: {size}"))))
                        })),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();

    let doc = query(vec![f("pic").build()]);
    let result = sync_result(execute(ExecutionArgs::new(&schema, &doc)));
    assert_eq!(result.data, Some(graphql_value!({"pic": "Pic of size: 50"})));

    let doc = query(vec![
        f("pic")
            .argument("size", crate::InputValue::scalar(100))
            .build(),
    ]);
    let result = sync_result(execute(ExecutionArgs::new(&schema, &doc)));
    assert_eq!(
        result.data,
        Some(graphql_value!({"pic": "Pic of size: 100"})),
    );
}

#[test]
fn source_properties_may_be_resolvers_themselves() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("greet")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("greet").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .resolver(
            "greet",
            Arc::new(|_, _, info| {
                Eventual::Ready(Ok(SourceValue::scalar(format!(
                    "hello from {}",
                    info.field_name,
                ))))
            }),
        )
        .into();
    let result = sync_result(execute(args));
    assert_eq!(
        result.data,
        Some(graphql_value!({"greet": "hello from greet"})),
    );
}

#[test]
fn typename_resolves_on_any_object() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("x")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("__typename").build(), f("x").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("x", "v").into();
    let result = sync_result(execute(args));
    assert_eq!(
        result.data,
        Some(graphql_value!({"__typename": "Query", "x": "v"})),
    );
}

#[test]
fn unknown_fields_are_omitted() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("x")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("x").build(), f("bogus").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("x", "v").into();
    let result = sync_result(execute(args));
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"x": "v"})));
}

#[test]
fn missing_root_type_is_a_located_failure() {
    let schema = SchemaType::new(
        vec![ObjectMeta::new("Query", vec![string_field("x")]).into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = operation(OperationType::Mutation, vec![f("x").build()]);

    let result = sync_result(execute(ExecutionArgs::new(&schema, &doc)));
    assert_eq!(result.data, Some(Value::Null));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].error().message(),
        "Schema is not configured to execute mutation operation.",
    );
}

#[test]
fn execution_is_idempotent_for_pure_resolvers() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    string_field("x"),
                    string_field("y").resolver(sync_resolver("Y")),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("x").build(), f("y").build()]);

    let run = || {
        let mut args = ExecutionArgs::new(&schema, &doc);
        args.root_value = SourceObject::new().property("x", "X").into();
        sync_result(execute(args))
    };
    assert_eq!(run(), run());
}

#[test]
fn subscriptions_execute_a_single_event_with_the_subscribe_resolver() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new("Query", vec![string_field("x")]).into_meta(),
            ObjectMeta::new("Subscription", vec![string_field("tick")]).into_meta(),
        ],
        "Query",
        None,
        Some("Subscription"),
    )
    .unwrap();
    let doc = operation(OperationType::Subscription, vec![f("tick").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.subscribe_field_resolver = Some(sync_resolver("tock"));
    let result = sync_result(execute(args));
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"tick": "tock"})));
}

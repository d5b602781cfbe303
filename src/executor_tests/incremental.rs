use futures::StreamExt as _;
use pretty_assertions::assert_eq;

use crate::{
    ExecutionArgs, GraphQLError, InputValue, Type, execute, execute_sync,
    executor::{IncrementalResult, Response},
    meta::{FieldMeta, ObjectMeta},
    schema::model::SchemaType,
    source::{SourceObject, SourceStream, SourceValue},
};

use super::{directive, f, inline_fragment, query, sync_resolver, sync_result};

fn int_list_schema(field: &str) -> SchemaType {
    SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![FieldMeta::new(field, Type::non_null("Int").wrap_list())],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap()
}

async fn collect_incremental(execution: crate::Execution<'_>) -> Vec<IncrementalResult> {
    match execution.resolve().await {
        Response::Incremental(stream) => stream.collect().await,
        Response::Single(_) => panic!("expected an incremental response"),
    }
}

#[tokio::test]
async fn stream_splits_a_list_after_initial_count() {
    let schema = int_list_schema("items");
    let doc = query(vec![
        f("items")
            .directive(directive(
                "stream",
                vec![("initialCount", InputValue::scalar(2))],
            ))
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property(
            "items",
            SourceValue::list(vec![1.into(), 2.into(), 3.into(), 4.into()]),
        )
        .into();

    let execution = execute(args);
    assert!(!execution.is_pending(), "all resolvers were synchronous");
    let payloads = collect_incremental(execution).await;

    assert_eq!(
        serde_json::to_value(&payloads).unwrap(),
        serde_json::json!([
            {"data": {"items": [1, 2]}, "hasNext": true},
            {"data": 3, "path": ["items", 2], "hasNext": true},
            {"data": 4, "path": ["items", 3], "hasNext": false},
        ]),
    );
}

#[tokio::test]
async fn stream_disabled_by_if_keeps_the_list_inline() {
    let schema = int_list_schema("items");
    let doc = query(vec![
        f("items")
            .directive(directive(
                "stream",
                vec![
                    ("initialCount", InputValue::scalar(1)),
                    ("if", InputValue::scalar(false)),
                ],
            ))
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("items", SourceValue::list(vec![1.into(), 2.into()]))
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"items": [1, 2]})));
}

#[tokio::test]
async fn deferred_fragment_arrives_as_a_labelled_patch() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    FieldMeta::new("a", Type::nullable("String")),
                    FieldMeta::new("b", Type::nullable("String")),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![
        f("a").build(),
        inline_fragment(
            None,
            vec![directive(
                "defer",
                vec![("label", InputValue::scalar("slow"))],
            )],
            vec![f("b").build()],
        ),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("a", "A").property("b", "B").into();
    let payloads = collect_incremental(execute(args)).await;

    assert_eq!(
        serde_json::to_value(&payloads).unwrap(),
        serde_json::json!([
            {"data": {"a": "A"}, "hasNext": true},
            {"data": {"b": "B"}, "path": [], "label": "slow", "hasNext": false},
        ]),
    );

    // Incremental delivery also defeats the synchronous entry point.
    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("a", "A").property("b", "B").into();
    assert_eq!(execute_sync(args).unwrap_err(), GraphQLError::NotSynchronous);
}

#[test]
fn defer_disabled_by_if_executes_inline() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    FieldMeta::new("a", Type::nullable("String")),
                    FieldMeta::new("b", Type::nullable("String")),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![
        f("a").build(),
        inline_fragment(
            None,
            vec![directive("defer", vec![("if", InputValue::scalar(false))])],
            vec![f("b").build()],
        ),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("a", "A").property("b", "B").into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"a": "A", "b": "B"})));
}

fn int_sequence(values: Vec<i32>) -> SourceValue {
    SourceValue::Stream(SourceStream::new(Box::pin(futures::stream::iter(
        values.into_iter().map(|v| Ok(SourceValue::scalar(v))),
    ))))
}

#[tokio::test]
async fn async_sequences_complete_inline_without_stream() {
    let schema = int_list_schema("nums");
    let doc = query(vec![f("nums").build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("nums", int_sequence(vec![1, 2]))
        .into();

    let execution = execute(args);
    assert!(execution.is_pending(), "async sequences always suspend");
    let result = super::resolved_result(execution).await;
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"nums": [1, 2]})));
}

#[tokio::test]
async fn streamed_async_sequence_pipelines_the_tail() {
    let schema = int_list_schema("nums");
    let doc = query(vec![
        f("nums")
            .directive(directive(
                "stream",
                vec![("initialCount", InputValue::scalar(1))],
            ))
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("nums", int_sequence(vec![1, 2, 3]))
        .into();
    let payloads = collect_incremental(execute(args)).await;

    assert_eq!(
        serde_json::to_value(&payloads).unwrap(),
        serde_json::json!([
            {"data": {"nums": [1]}, "hasNext": true},
            {"data": 2, "path": ["nums", 1], "hasNext": true},
            {"data": 3, "path": ["nums", 2], "hasNext": true},
            {"hasNext": false},
        ]),
    );
}

#[tokio::test]
async fn patch_failures_stay_scoped_to_their_patch() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    FieldMeta::new("a", Type::nullable("String")),
                    FieldMeta::new("boom", Type::non_null("String"))
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
    let doc = query(vec![
        f("a").build(),
        inline_fragment(
            None,
            vec![directive("defer", vec![])],
            vec![f("boom").build()],
        ),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new().property("a", "A").into();
    let payloads = collect_incremental(execute(args)).await;

    let initial = payloads[0].as_result().unwrap();
    assert_eq!(initial.errors, vec![]);
    assert_eq!(initial.data, Some(graphql_value!({"a": "A"})));

    let patch = payloads[1].as_patch().unwrap();
    assert_eq!(patch.data, Some(crate::Value::Null));
    assert_eq!(patch.errors.len(), 1);
    assert_eq!(
        patch.errors[0].error().message(),
        "Cannot return null for non-nullable field Query.boom.",
    );
    assert!(!patch.has_next);
    assert_eq!(payloads.len(), 2);
}

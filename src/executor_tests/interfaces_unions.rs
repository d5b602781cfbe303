use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::{
    ExecutionArgs, Type, execute,
    executor::Eventual,
    meta::{FieldMeta, InterfaceMeta, ObjectMeta, UnionMeta},
    schema::model::SchemaType,
    source::{IsTypeOfFn, SourceObject, TypeResolverFn},
};

use super::{f, inline_fragment, query, resolved_result, sync_result};

fn union_schema(resolve_type: Option<TypeResolverFn>) -> SchemaType {
    let mut union = UnionMeta::new("U", ["A", "B"]);
    if let Some(rt) = resolve_type {
        union = union.resolve_type(rt);
    }
    SchemaType::new(
        vec![
            ObjectMeta::new("Query", vec![FieldMeta::new("u", Type::nullable("U"))]).into_meta(),
            ObjectMeta::new("A", vec![FieldMeta::new("v", Type::nullable("Int"))]).into_meta(),
            ObjectMeta::new("B", vec![FieldMeta::new("w", Type::nullable("Int"))]).into_meta(),
            union.into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap()
}

#[test]
fn union_member_resolves_through_the_type_name_hint() {
    let schema = union_schema(None);
    let doc = query(vec![
        f("u")
            .select(vec![inline_fragment(
                Some("A"),
                vec![],
                vec![f("v").build()],
            )])
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::of_type("A").property("v", 1))
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.data, Some(graphql_value!({"u": {"v": 1}})));
}

#[test]
fn non_matching_fragments_contribute_nothing() {
    let schema = union_schema(None);
    let doc = query(vec![
        f("u")
            .select(vec![
                inline_fragment(Some("A"), vec![], vec![f("v").build()]),
                inline_fragment(Some("B"), vec![], vec![f("w").build()]),
            ])
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::of_type("B").property("w", 2))
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"u": {"w": 2}})));
}

#[test]
fn explicit_type_resolver_wins_over_the_hint() {
    let rt: TypeResolverFn =
        Arc::new(|_, _, _, _| Eventual::Ready(Ok("B".to_owned())));
    let schema = union_schema(Some(rt));
    let doc = query(vec![
        f("u")
            .select(vec![
                inline_fragment(Some("A"), vec![], vec![f("v").build()]),
                inline_fragment(Some("B"), vec![], vec![f("w").build()]),
            ])
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::of_type("A").property("w", 7))
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"u": {"w": 7}})));
}

#[tokio::test]
async fn type_resolution_may_suspend() {
    let rt: TypeResolverFn = Arc::new(|value, _, _, _| {
        let hinted = value
            .as_object()
            .and_then(SourceObject::type_name)
            .map(ToOwned::to_owned);
        Eventual::pending(async move { Ok(hinted.unwrap_or_else(|| "A".to_owned())) })
    });
    let schema = union_schema(Some(rt));
    let doc = query(vec![
        f("u")
            .select(vec![inline_fragment(
                Some("A"),
                vec![],
                vec![f("v").build()],
            )])
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::of_type("A").property("v", 3))
        .into();
    let execution = execute(args);
    assert!(execution.is_pending());
    let result = resolved_result(execution).await;
    assert_eq!(result.data, Some(graphql_value!({"u": {"v": 3}})));
}

#[test]
fn resolving_to_an_unknown_type_fails_the_field() {
    let rt: TypeResolverFn =
        Arc::new(|_, _, _, _| Eventual::Ready(Ok("Ghost".to_owned())));
    let schema = union_schema(Some(rt));
    let doc = query(vec![f("u").select(vec![f("__typename").build()]).build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::new())
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"u": null})));
    assert_eq!(
        result.errors[0].error().message(),
        "Abstract type \"U\" was resolved to a type \"Ghost\" that does not exist inside the \
         schema.",
    );
}

#[test]
fn resolving_to_an_impossible_type_fails_the_field() {
    let rt: TypeResolverFn =
        Arc::new(|_, _, _, _| Eventual::Ready(Ok("Query".to_owned())));
    let schema = union_schema(Some(rt));
    let doc = query(vec![f("u").select(vec![f("__typename").build()]).build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("u", SourceObject::new())
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"u": null})));
    assert_eq!(
        result.errors[0].error().message(),
        "Runtime Object type \"Query\" is not a possible type for \"U\".",
    );
}

fn has_property(name: &'static str) -> IsTypeOfFn {
    Arc::new(move |value, _, _| {
        Eventual::Ready(Ok(value
            .as_object()
            .map(|o| o.get(name).is_some())
            .unwrap_or(false)))
    })
}

#[test]
fn interfaces_probe_is_type_of_without_a_hint() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new("Query", vec![FieldMeta::new("node", Type::nullable("Node"))])
                .into_meta(),
            InterfaceMeta::new("Node", vec![FieldMeta::new("id", Type::nullable("ID"))])
                .into_meta(),
            ObjectMeta::new(
                "Person",
                vec![
                    FieldMeta::new("id", Type::nullable("ID")),
                    FieldMeta::new("name", Type::nullable("String")),
                ],
            )
            .interfaces(["Node"])
            .is_type_of(has_property("name"))
            .into_meta(),
            ObjectMeta::new(
                "Robot",
                vec![
                    FieldMeta::new("id", Type::nullable("ID")),
                    FieldMeta::new("serial", Type::nullable("String")),
                ],
            )
            .interfaces(["Node"])
            .is_type_of(has_property("serial"))
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![
        f("node")
            .select(vec![
                f("id").build(),
                inline_fragment(Some("Robot"), vec![], vec![f("serial").build()]),
            ])
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property(
            "node",
            SourceObject::new()
                .property("id", "r2")
                .property("serial", "X-99"),
        )
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.errors, vec![]);
    assert_eq!(
        result.data,
        Some(graphql_value!({"node": {"id": "r2", "serial": "X-99"}})),
    );
}

#[test]
fn failing_is_type_of_guard_rejects_the_value() {
    let schema = SchemaType::new(
        vec![
            ObjectMeta::new("Query", vec![FieldMeta::new("p", Type::nullable("Person"))])
                .into_meta(),
            ObjectMeta::new(
                "Person",
                vec![FieldMeta::new("name", Type::nullable("String"))],
            )
            .is_type_of(has_property("name"))
            .into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query(vec![f("p").select(vec![f("name").build()]).build()]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = SourceObject::new()
        .property("p", SourceObject::new().property("serial", "nope"))
        .into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"p": null})));
    assert_eq!(result.errors.len(), 1);
    assert!(
        result.errors[0]
            .error()
            .message()
            .starts_with("Expected value of type \"Person\" but got:"),
    );
}

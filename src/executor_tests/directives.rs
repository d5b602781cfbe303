use pretty_assertions::assert_eq;

use crate::{
    ExecutionArgs, InputValue, Type, execute,
    meta::{FieldMeta, ObjectMeta},
    schema::model::SchemaType,
    source::SourceObject,
};

use super::{directive, f, fragment_definition, fragment_spread, inline_fragment, query, sync_result};

fn schema() -> SchemaType {
    SchemaType::new(
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
    .unwrap()
}

fn root() -> SourceObject {
    SourceObject::new().property("a", "A").property("b", "B")
}

#[test]
fn skip_and_include_with_literal_arguments() {
    let schema = schema();
    let doc = query(vec![
        f("a")
            .directive(directive("skip", vec![("if", InputValue::scalar(true))]))
            .build(),
        f("b")
            .directive(directive("include", vec![("if", InputValue::scalar(true))]))
            .build(),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = root().into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"b": "B"})));
}

#[test]
fn skip_and_include_with_variable_arguments() {
    let schema = schema();
    let doc = super::query_with_variables(
        vec![("cond", Type::non_null("Boolean"))],
        vec![
            f("a")
                .directive(directive("skip", vec![("if", InputValue::variable("cond"))]))
                .build(),
            f("b")
                .directive(directive(
                    "include",
                    vec![("if", InputValue::variable("cond"))],
                ))
                .build(),
        ],
    );

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = root().into();
    args.variable_values = [("cond".to_owned(), InputValue::scalar(false))]
        .into_iter()
        .collect();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"a": "A"})));
}

#[test]
fn named_fragments_merge_in_source_order_and_apply_once() {
    let schema = schema();
    let mut doc = query(vec![
        f("a").build(),
        fragment_spread("frag", vec![]),
        fragment_spread("frag", vec![]),
    ]);
    doc.push(fragment_definition("frag", "Query", vec![f("b").build()]));

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = root().into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"a": "A", "b": "B"})));
}

#[test]
fn inline_fragments_respect_their_type_condition() {
    let schema = schema();
    let doc = query(vec![
        inline_fragment(Some("Query"), vec![], vec![f("a").build()]),
        inline_fragment(Some("SomethingElse"), vec![], vec![f("b").build()]),
    ]);

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = root().into();
    let result = sync_result(execute(args));
    assert_eq!(result.data, Some(graphql_value!({"a": "A"})));
}

#[test]
fn excluded_fragments_are_not_collected() {
    let schema = schema();
    let mut doc = query(vec![
        f("a").build(),
        fragment_spread(
            "frag",
            vec![directive("skip", vec![("if", InputValue::scalar(true))])],
        ),
        inline_fragment(None, vec![], vec![f("a").alias("again").build()]),
    ]);
    doc.push(fragment_definition("frag", "Query", vec![f("b").build()]));

    let mut args = ExecutionArgs::new(&schema, &doc);
    args.root_value = root().into();
    let result = sync_result(execute(args));
    assert_eq!(
        result.data,
        Some(graphql_value!({"a": "A", "again": "A"})),
    );
}

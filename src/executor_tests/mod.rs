mod directives;
mod executor;
mod incremental;
mod interfaces_unions;

use std::sync::Arc;

use crate::{
    ast::{
        Arguments as AstArguments, Definition, Directive, Field, Fragment, FragmentSpread,
        InlineFragment, InputValue, Operation, OperationType, OwnedDocument, Selection, Type,
        VariableDefinition, VariablesDefinition,
    },
    executor::{Arguments, Execution, ExecutionResult, Eventual, ResolveInfo, Response},
    source::{ContextValue, FieldResolverFn, ResolvedValue, SourceValue},
    span::Spanning,
};

/// Hand-built selection of a single field, with optional alias, arguments,
/// directives and sub-selections.
pub(crate) struct FieldBuilder<'a>(Field<'a, crate::DefaultScalarValue>);

pub(crate) fn f(name: &str) -> FieldBuilder<'_> {
    FieldBuilder(Field {
        alias: None,
        name: Spanning::unlocated(name),
        arguments: None,
        directives: None,
        selection_set: None,
    })
}

impl<'a> FieldBuilder<'a> {
    pub(crate) fn alias(mut self, alias: &'a str) -> Self {
        self.0.alias = Some(Spanning::unlocated(alias));
        self
    }

    pub(crate) fn argument(mut self, name: &'a str, value: InputValue) -> Self {
        let arg = (Spanning::unlocated(name), Spanning::unlocated(value));
        match &mut self.0.arguments {
            Some(args) => args.item.items.push(arg),
            None => {
                self.0.arguments = Some(Spanning::unlocated(AstArguments { items: vec![arg] }));
            }
        }
        self
    }

    pub(crate) fn directive(mut self, directive: Spanning<Directive<'a, crate::DefaultScalarValue>>) -> Self {
        self.0.directives.get_or_insert_default().push(directive);
        self
    }

    pub(crate) fn select(mut self, selections: Vec<Selection<'a>>) -> Self {
        self.0.selection_set = Some(selections);
        self
    }

    pub(crate) fn build(self) -> Selection<'a> {
        Selection::Field(Spanning::unlocated(self.0))
    }
}

pub(crate) fn directive<'a>(
    name: &'a str,
    args: Vec<(&'a str, InputValue)>,
) -> Spanning<Directive<'a, crate::DefaultScalarValue>> {
    Spanning::unlocated(Directive {
        name: Spanning::unlocated(name),
        arguments: (!args.is_empty()).then(|| {
            Spanning::unlocated(AstArguments {
                items: args
                    .into_iter()
                    .map(|(k, v)| (Spanning::unlocated(k), Spanning::unlocated(v)))
                    .collect(),
            })
        }),
    })
}

pub(crate) fn inline_fragment<'a>(
    type_condition: Option<&'a str>,
    directives: Vec<Spanning<Directive<'a, crate::DefaultScalarValue>>>,
    selection_set: Vec<Selection<'a>>,
) -> Selection<'a> {
    Selection::InlineFragment(Spanning::unlocated(InlineFragment {
        type_condition: type_condition.map(Spanning::unlocated),
        directives: (!directives.is_empty()).then_some(directives),
        selection_set,
    }))
}

pub(crate) fn fragment_spread<'a>(
    name: &'a str,
    directives: Vec<Spanning<Directive<'a, crate::DefaultScalarValue>>>,
) -> Selection<'a> {
    Selection::FragmentSpread(Spanning::unlocated(FragmentSpread {
        name: Spanning::unlocated(name),
        directives: (!directives.is_empty()).then_some(directives),
    }))
}

pub(crate) fn fragment_definition<'a>(
    name: &'a str,
    type_condition: &'a str,
    selection_set: Vec<Selection<'a>>,
) -> Definition<'a, crate::DefaultScalarValue> {
    Definition::Fragment(Spanning::unlocated(Fragment {
        name: Spanning::unlocated(name),
        type_condition: Spanning::unlocated(type_condition),
        directives: None,
        selection_set,
    }))
}

pub(crate) fn operation<'a>(
    operation_type: OperationType,
    selection_set: Vec<Selection<'a>>,
) -> OwnedDocument<'a, crate::DefaultScalarValue> {
    vec![Definition::Operation(Spanning::unlocated(Operation {
        operation_type,
        name: None,
        variables_definition: None,
        directives: None,
        selection_set,
    }))]
}

pub(crate) fn query(selection_set: Vec<Selection<'_>>) -> OwnedDocument<'_, crate::DefaultScalarValue> {
    operation(OperationType::Query, selection_set)
}

pub(crate) fn query_with_variables<'a>(
    variables: Vec<(&'a str, Type<&'a str>)>,
    selection_set: Vec<Selection<'a>>,
) -> OwnedDocument<'a, crate::DefaultScalarValue> {
    vec![Definition::Operation(Spanning::unlocated(Operation {
        operation_type: OperationType::Query,
        name: None,
        variables_definition: Some(Spanning::unlocated(VariablesDefinition {
            items: variables
                .into_iter()
                .map(|(name, var_type)| {
                    (
                        Spanning::unlocated(name),
                        VariableDefinition {
                            var_type: Spanning::unlocated(var_type),
                            default_value: None,
                            directives: None,
                        },
                    )
                })
                .collect(),
        })),
        directives: None,
        selection_set,
    }))]
}

/// Wraps a plain closure into a [`FieldResolverFn`].
pub(crate) fn resolver<F>(f: F) -> FieldResolverFn
where
    F: Fn(
            &SourceValue,
            &Arguments,
            Option<&ContextValue>,
            &ResolveInfo<'_, '_>,
        ) -> ResolvedValue
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// A resolver producing a ready value.
pub(crate) fn sync_resolver(value: impl Into<SourceValue> + Clone + Send + Sync + 'static) -> FieldResolverFn {
    resolver(move |_, _, _, _| Eventual::Ready(Ok(value.clone().into())))
}

/// A resolver producing its value through a future.
pub(crate) fn async_resolver(
    value: impl Into<SourceValue> + Clone + Send + Sync + 'static,
) -> FieldResolverFn {
    resolver(move |_, _, _, _| {
        let value = value.clone();
        Eventual::pending(async move { Ok(value.into()) })
    })
}

/// Unwraps an execution outcome that must have stayed synchronous and
/// non-incremental.
pub(crate) fn sync_result(execution: Execution<'_>) -> ExecutionResult {
    match execution {
        Eventual::Ready(Response::Single(result)) => result,
        Eventual::Ready(Response::Incremental(_)) => {
            panic!("expected a plain response, got an incremental one")
        }
        Eventual::Pending(_) => panic!("expected a ready response, got a pending one"),
    }
}

/// Resolves an execution outcome that must end up non-incremental.
pub(crate) async fn resolved_result(execution: Execution<'_>) -> ExecutionResult {
    match execution.resolve().await {
        Response::Single(result) => result,
        Response::Incremental(_) => panic!("expected a plain response, got an incremental one"),
    }
}

//! Coercion of variable values, field arguments and directive arguments
//! against the schema's declared metadata.

use crate::{
    ast::{Directive, Field, InputValue, Operation, Type, TypeModifier},
    schema::{
        meta::{FieldMeta, MetaType},
        model::{DirectiveType, SchemaType},
    },
    span::Spanning,
    value::ScalarValue,
};

use super::{
    Arguments, ExecutionError, FieldError, FieldResult, ResponsePath, Variables,
};

/// Variable coercion stops reporting after this many failures.
const MAX_VARIABLE_ERRORS: usize = 50;

/// Coerces the raw variable `inputs` against the operation's variable
/// definitions: applies defaults, rejects missing or `null` required
/// variables, and shallow-checks values against their declared types.
pub(crate) fn coerce_variable_values<'a, S: ScalarValue>(
    schema: &SchemaType<S>,
    operation: &Spanning<Operation<'a, S>>,
    inputs: &Variables<S>,
) -> Result<Variables<S>, Vec<ExecutionError<S>>> {
    let mut coerced = Variables::new();
    let mut errors = vec![];

    let Some(defs) = &operation.item.variables_definition else {
        return Ok(coerced);
    };

    for (name, def) in defs.item.iter() {
        if errors.len() >= MAX_VARIABLE_ERRORS {
            break;
        }
        let var_name = name.item;
        let var_type = &def.var_type.item;
        match inputs.get(var_name) {
            None => {
                if let Some(default) = &def.default_value {
                    coerced.insert(var_name.into(), default.item.clone());
                } else if var_type.is_non_null() {
                    errors.push(ExecutionError::new(
                        vec![*name.start()],
                        vec![],
                        format!(
                            "Variable \"${var_name}\" of required type \"{var_type}\" was not provided."
                        )
                        .into(),
                    ));
                }
            }
            Some(value) => {
                if value.is_null() && var_type.is_non_null() {
                    errors.push(ExecutionError::new(
                        vec![*name.start()],
                        vec![],
                        format!(
                            "Variable \"${var_name}\" of non-null type \"{var_type}\" must not be null."
                        )
                        .into(),
                    ));
                } else if let Err(reason) = check_input_value(
                    schema,
                    value,
                    var_type.innermost_name(),
                    var_type.modifiers(),
                ) {
                    errors.push(ExecutionError::new(
                        vec![*name.start()],
                        vec![],
                        format!("Variable \"${var_name}\" got invalid value {value}; {reason}")
                            .into(),
                    ));
                } else {
                    coerced.insert(var_name.into(), value.clone());
                }
            }
        }
    }

    if errors.is_empty() { Ok(coerced) } else { Err(errors) }
}

/// Coerces the AST arguments of `node` against `field_def`'s declared
/// arguments, resolving variable references and applying defaults.
pub(crate) fn coerce_argument_values<'a, S: ScalarValue>(
    field_def: &FieldMeta<S>,
    node: &'a Spanning<Field<'a, S>>,
    variables: &Variables<S>,
    path: &ResponsePath<'a>,
) -> Result<Arguments<S>, ExecutionError<S>> {
    let located = |message: String| {
        ExecutionError::new(vec![*node.start()], path.linearize(), message.into())
    };

    let mut coerced = Arguments::new();
    for arg_def in &field_def.arguments {
        let name = arg_def.name.as_str();
        let arg_type = &arg_def.arg_type;
        let ast_value = node
            .item
            .arguments
            .as_ref()
            .and_then(|args| args.item.get(name));

        match ast_value {
            Some(value) => match &value.item {
                InputValue::Variable(var_name) => match variables.get(var_name.as_str()) {
                    Some(v) => {
                        if v.is_null() && arg_type.is_non_null() {
                            return Err(located(format!(
                                "Argument \"{name}\" of non-null type \"{arg_type}\" must not be null."
                            )));
                        }
                        coerced.insert(name, v.clone());
                    }
                    None => {
                        if let Some(default) = &arg_def.default_value {
                            coerced.insert(name, default.clone());
                        } else if arg_type.is_non_null() {
                            return Err(located(format!(
                                "Argument \"{name}\" of required type \"{arg_type}\" was provided \
                                 the variable \"${var_name}\" which was not provided a runtime value."
                            )));
                        }
                    }
                },
                v if v.is_null() && arg_type.is_non_null() => {
                    return Err(located(format!(
                        "Argument \"{name}\" of non-null type \"{arg_type}\" must not be null."
                    )));
                }
                v => match v.clone().into_const(variables) {
                    Some(v) => coerced.insert(name, v),
                    None => {
                        if let Some(default) = &arg_def.default_value {
                            coerced.insert(name, default.clone());
                        } else if arg_type.is_non_null() {
                            return Err(located(format!(
                                "Argument \"{name}\" of required type \"{arg_type}\" was not provided."
                            )));
                        }
                    }
                },
            },
            None => {
                if let Some(default) = &arg_def.default_value {
                    coerced.insert(name, default.clone());
                } else if arg_type.is_non_null() {
                    return Err(located(format!(
                        "Argument \"{name}\" of required type \"{arg_type}\" was not provided."
                    )));
                }
            }
        }
    }
    Ok(coerced)
}

/// Coerces the arguments of the `directive_def` directive if it appears in
/// `directives`.
///
/// Returns `Ok(None)` when the directive is absent.
pub(crate) fn coerce_directive_values<'a, S: ScalarValue>(
    directive_def: &DirectiveType<S>,
    directives: Option<&'a Vec<Spanning<Directive<'a, S>>>>,
    variables: &Variables<S>,
) -> FieldResult<Option<Arguments<S>>, S> {
    let directive_name: &str = &directive_def.name;
    let Some(node) = directives.and_then(|ds| {
        ds.iter().find(|d| d.item.name.item == directive_name)
    }) else {
        return Ok(None);
    };

    let mut coerced = Arguments::new();
    for arg_def in &directive_def.arguments {
        let name = arg_def.name.as_str();
        let value = node
            .item
            .arguments
            .as_ref()
            .and_then(|args| args.item.get(name))
            .and_then(|v| v.item.clone().into_const(variables));
        match value {
            Some(v) if !(v.is_null() && arg_def.arg_type.is_non_null()) => {
                coerced.insert(name, v);
            }
            _ => {
                if let Some(default) = &arg_def.default_value {
                    coerced.insert(name, default.clone());
                } else if arg_def.arg_type.is_non_null() {
                    return Err(FieldError::from(format!(
                        "Directive \"@{directive_name}\" argument \"{name}\" of type \
                         \"{}\" is required, but it was not provided.",
                        arg_def.arg_type,
                    )));
                }
            }
        }
    }
    Ok(Some(coerced))
}

fn type_literal(name: &str, modifiers: &[TypeModifier]) -> String {
    let mut ty: Type<&str> = Type::nullable(name);
    for modifier in modifiers {
        ty = match modifier {
            TypeModifier::NonNull => ty.wrap_non_null(),
            TypeModifier::List => ty.wrap_list(),
        };
    }
    ty.to_string()
}

/// Shallow structural check of an input value against a declared type.
///
/// Deep coercion of raw host inputs happens outside this crate; this only
/// guards the shapes execution later relies on.
fn check_input_value<S: ScalarValue>(
    schema: &SchemaType<S>,
    value: &InputValue<S>,
    name: &str,
    modifiers: &[TypeModifier],
) -> Result<(), String> {
    match modifiers.split_last() {
        Some((TypeModifier::NonNull, inner)) => {
            if value.is_null() {
                Err(format!(
                    "Expected non-nullable type \"{}\" not to be null.",
                    type_literal(name, modifiers),
                ))
            } else {
                check_input_value(schema, value, name, inner)
            }
        }
        Some((TypeModifier::List, inner)) => {
            if value.is_null() {
                return Ok(());
            }
            match value.to_list_value() {
                Some(items) => {
                    for item in items {
                        check_input_value(schema, item, name, inner)?;
                    }
                    Ok(())
                }
                // Single values coerce to singleton lists.
                None => check_input_value(schema, value, name, inner),
            }
        }
        None => check_named_input(schema, value, name),
    }
}

fn check_named_input<S: ScalarValue>(
    schema: &SchemaType<S>,
    value: &InputValue<S>,
    name: &str,
) -> Result<(), String> {
    if value.is_null() || value.is_variable() {
        return Ok(());
    }
    let Some(meta) = schema.concrete_type_by_name(name) else {
        return Err(format!("Unknown type \"{name}\"."));
    };
    match meta {
        MetaType::Scalar(_) => {
            let scalar = value.as_scalar();
            let ok = match name {
                "Int" => scalar.and_then(S::as_int).is_some(),
                "Float" => scalar.and_then(S::as_float).is_some(),
                "String" => scalar.and_then(S::as_str).is_some(),
                "Boolean" => scalar.and_then(S::as_boolean).is_some(),
                "ID" => scalar
                    .map(|s| s.as_str().is_some() || s.as_int().is_some())
                    .unwrap_or(false),
                // Custom scalars take whatever their host coercion accepted.
                _ => true,
            };
            if ok {
                Ok(())
            } else {
                Err(format!("{name} cannot represent value: {value}"))
            }
        }
        MetaType::Enum(e) => {
            let variant = value
                .as_enum_value()
                .or_else(|| value.as_scalar().and_then(S::as_str));
            match variant {
                Some(v) if e.has_value(v) => Ok(()),
                _ => Err(format!("Value {value} does not exist in \"{name}\" enum.")),
            }
        }
        MetaType::InputObject(io) => {
            let Some(fields) = value.to_object_value() else {
                return Err(format!("Expected type \"{name}\" to be an object."));
            };
            for (field_name, field_value) in &fields {
                let Some(field_def) = io
                    .input_fields
                    .iter()
                    .find(|a| a.name.as_str() == *field_name)
                else {
                    return Err(format!(
                        "Field \"{field_name}\" is not defined by type \"{name}\"."
                    ));
                };
                check_input_value(
                    schema,
                    field_value,
                    field_def.arg_type.innermost_name(),
                    field_def.arg_type.modifiers(),
                )?;
            }
            for field_def in &io.input_fields {
                let provided = fields
                    .iter()
                    .any(|(k, _)| *k == field_def.name.as_str());
                if field_def.arg_type.is_non_null()
                    && field_def.default_value.is_none()
                    && !provided
                {
                    return Err(format!(
                        "Field \"{}\" of required type \"{}\" was not provided.",
                        field_def.name, field_def.arg_type,
                    ));
                }
            }
            Ok(())
        }
        _ => Err(format!("Type \"{name}\" is not an input type.")),
    }
}

use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::ast::Value;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Operation;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;

use crate::engine::field_error;
use crate::engine::ExecutionContext;
use crate::engine::PropagateNull;
use crate::path::LinkedPath;
use crate::request::RequestError;
use crate::validation::SuspectedValidationBug;

/// How many variable-coercion errors are reported before giving up on the
/// request, unless overridden. Same default as graphql-js.
pub(crate) const DEFAULT_MAX_COERCION_ERRORS: usize = 50;

pub(crate) enum InputCoercionError {
    SuspectedValidationBug(SuspectedValidationBug),
    ValueError {
        message: String,
        location: Option<SourceSpan>,
    },
}

impl InputCoercionError {
    pub(crate) fn into_field_error(
        self,
        sources: &SourceMap,
        path: LinkedPath<'_>,
    ) -> GraphQLError {
        match self {
            Self::SuspectedValidationBug(bug) => bug.into_field_error(sources, path),
            Self::ValueError { message, location } => field_error(message, path, location, sources),
        }
    }
}

fn value_error(message: impl Into<String>, location: Option<SourceSpan>) -> InputCoercionError {
    InputCoercionError::ValueError {
        message: message.into(),
        location,
    }
}

fn is_input_type(schema: &Schema, ty: &Type) -> bool {
    matches!(
        schema.types.get(ty.inner_named_type()),
        Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_) | ExtendedType::InputObject(_))
    )
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Variable-Values>
pub(crate) fn coerce_variable_values(
    schema: &Valid<Schema>,
    operation: &Operation,
    values: &JsonMap,
    max_errors: usize,
) -> Result<JsonMap, Vec<RequestError>> {
    let mut coerced_values = JsonMap::new();
    let mut errors: Vec<RequestError> = Vec::new();
    for variable_def in &operation.variables {
        if errors.len() >= max_errors {
            errors.push(RequestError {
                message: "Too many errors processing variables, error limit reached. \
                    Execution aborted."
                    .to_owned(),
                location: None,
                is_suspected_validation_bug: false,
            });
            return Err(errors);
        }
        let name = &variable_def.name;
        let ty = &variable_def.ty;
        if !is_input_type(schema, ty) {
            errors.push(RequestError {
                message: format!(
                    "Variable \"${name}\" expected value of type \"{ty}\" \
                     which cannot be used as an input type."
                ),
                location: variable_def.location(),
                is_suspected_validation_bug: true,
            });
            continue;
        }
        let Some(value) = values.get(name.as_str()) else {
            if let Some(default) = &variable_def.default_value {
                // Const defaults were checked by validation, so this is
                // expected to succeed.
                match coerce_input_literal(schema, ty, default, None) {
                    Ok(Some(default_value)) => {
                        coerced_values.insert(name.as_str(), default_value);
                    }
                    Ok(None) | Err(_) => errors.push(RequestError {
                        message: format!("Invalid default value for variable \"${name}\"."),
                        location: default.location(),
                        is_suspected_validation_bug: true,
                    }),
                }
            } else if ty.is_non_null() {
                errors.push(RequestError {
                    message: format!(
                        "Variable \"${name}\" of required type \"{ty}\" was not provided."
                    ),
                    location: variable_def.location(),
                    is_suspected_validation_bug: false,
                });
            }
            // Nullable variable without a default or a value remains unset.
            continue;
        };
        let mut reasons = Vec::new();
        let mut path = name.as_str().to_owned();
        let value = coerce_input_value(schema, ty, value, &mut path, &mut reasons);
        if reasons.is_empty() {
            if let Some(value) = value {
                coerced_values.insert(name.as_str(), value);
            }
        } else {
            for reason in reasons {
                errors.push(RequestError {
                    message: format!("Variable \"${name}\" {reason}"),
                    location: variable_def.location(),
                    is_suspected_validation_bug: false,
                });
            }
        }
    }
    if errors.is_empty() {
        Ok(coerced_values)
    } else {
        Err(errors)
    }
}

/// Runtime coercion of a JSON variable value against the expected type.
///
/// Failures do not stop at the first problem: every independent reason is
/// pushed to `reasons` together with the path where it occurred, and `None`
/// is returned.
fn coerce_input_value(
    schema: &Valid<Schema>,
    ty: &Type,
    value: &JsonValue,
    path: &mut String,
    reasons: &mut Vec<String>,
) -> Option<JsonValue> {
    if value.is_null() {
        if ty.is_non_null() {
            invalid(reasons, path, format!("expected non-nullable type \"{ty}\", found null"));
            return None;
        }
        return Some(JsonValue::Null);
    }
    match ty {
        Type::List(item_ty) | Type::NonNullList(item_ty) => match value {
            JsonValue::Array(values) => {
                let len = path.len();
                let mut coerced = Vec::with_capacity(values.len());
                for (index, item) in values.iter().enumerate() {
                    path.push_str(&format!("[{index}]"));
                    if let Some(item) = coerce_input_value(schema, item_ty, item, path, reasons) {
                        coerced.push(item);
                    }
                    path.truncate(len);
                }
                (coerced.len() == values.len()).then_some(JsonValue::Array(coerced))
            }
            // A non-list value coerces to a list of that single item.
            _ => {
                let item = coerce_input_value(schema, item_ty, value, path, reasons)?;
                Some(JsonValue::Array(vec![item]))
            }
        },
        Type::Named(name) | Type::NonNullNamed(name) => {
            coerce_named_input_value(schema, ty, name, value, path, reasons)
        }
    }
}

fn coerce_named_input_value(
    schema: &Valid<Schema>,
    ty: &Type,
    ty_name: &Name,
    value: &JsonValue,
    path: &mut String,
    reasons: &mut Vec<String>,
) -> Option<JsonValue> {
    let Some(ty_def) = schema.types.get(ty_name) else {
        invalid(reasons, path, format!("type \"{ty_name}\" is not defined"));
        return None;
    };
    match ty_def {
        ExtendedType::Scalar(_) => {
            let ok = match ty_name.as_str() {
                "Int" => matches!(
                    value,
                    JsonValue::Number(n)
                        if n.as_i64().is_some_and(|i| i32::try_from(i).is_ok())
                ),
                "Float" => matches!(value, JsonValue::Number(_)),
                "String" => matches!(value, JsonValue::String(_)),
                "Boolean" => matches!(value, JsonValue::Bool(_)),
                "ID" => {
                    if let JsonValue::Number(n) = value {
                        // Integer IDs coerce to their string form
                        let Some(id) = n.as_i64() else {
                            invalid(reasons, path, format!(
                                "expected type \"{ty}\", found {}",
                                json_display(value),
                            ));
                            return None;
                        };
                        return Some(JsonValue::from(id.to_string()));
                    }
                    matches!(value, JsonValue::String(_))
                }
                // Custom scalars take any JSON value as-is
                _ => return Some(value.clone()),
            };
            if ok {
                Some(value.clone())
            } else {
                invalid(reasons, path, format!(
                    "expected type \"{ty}\", found {}",
                    json_display(value),
                ));
                None
            }
        }
        ExtendedType::Enum(enum_def) => match value {
            JsonValue::String(value_name) if enum_def.values.contains_key(value_name.as_str()) => {
                Some(value.clone())
            }
            _ => {
                let suggestions = suggestion_list(
                    value.as_str().unwrap_or_default(),
                    enum_def.values.keys().map(|name| name.as_str()),
                );
                invalid(reasons, path, format!(
                    "value {} does not exist in \"{ty_name}\" enum.{}",
                    json_display(value),
                    did_you_mean(&suggestions),
                ));
                None
            }
        },
        ExtendedType::InputObject(input_object) => {
            let JsonValue::Object(object) = value else {
                invalid(reasons, path, format!(
                    "expected type \"{ty}\", found {}",
                    json_display(value),
                ));
                return None;
            };
            let mut ok = true;
            for key in object.keys() {
                if !input_object.fields.contains_key(key.as_str()) {
                    let suggestions = suggestion_list(
                        key.as_str(),
                        input_object.fields.keys().map(|name| name.as_str()),
                    );
                    invalid(reasons, path, format!(
                        "field \"{}\" is not defined by type \"{ty_name}\".{}",
                        key.as_str(),
                        did_you_mean(&suggestions),
                    ));
                    ok = false;
                }
            }
            let len = path.len();
            let mut coerced = JsonMap::with_capacity(object.len());
            for (field_name, field_def) in &input_object.fields {
                if let Some(field_value) = object.get(field_name.as_str()) {
                    path.push('.');
                    path.push_str(field_name.as_str());
                    match coerce_input_value(schema, &field_def.ty, field_value, path, reasons) {
                        Some(field_value) => {
                            coerced.insert(field_name.as_str(), field_value);
                        }
                        None => ok = false,
                    }
                    path.truncate(len);
                } else if let Some(default) = &field_def.default_value {
                    match coerce_input_literal(schema, &field_def.ty, default, None) {
                        Ok(Some(default_value)) => {
                            coerced.insert(field_name.as_str(), default_value);
                        }
                        Ok(None) | Err(_) => {
                            invalid(reasons, path, format!(
                                "invalid default value for field \"{field_name}\" \
                                 of type \"{ty_name}\""
                            ));
                            ok = false;
                        }
                    }
                } else if field_def.ty.is_non_null() {
                    invalid(reasons, path, format!(
                        "field \"{field_name}\" of required type \"{}\" was not provided",
                        field_def.ty,
                    ));
                    ok = false;
                }
            }
            ok.then_some(JsonValue::Object(coerced))
        }
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            // Covered by the input-type check on the variable definition,
            // except for nested occurrences which validation rejects.
            invalid(reasons, path, format!(
                "type \"{ty_name}\" cannot be used as an input type"
            ));
            None
        }
    }
}

fn invalid(reasons: &mut Vec<String>, path: &str, reason: String) {
    reasons.push(format!("got invalid value at \"{path}\": {reason}"));
}

fn json_display(value: &JsonValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<value>".to_owned())
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Argument-Values>
pub(crate) fn coerce_argument_values(
    ctx: &ExecutionContext<'_>,
    field_def: &FieldDefinition,
    field: &Field,
    path: LinkedPath<'_>,
) -> Result<JsonMap, PropagateNull> {
    let mut coerced_values = JsonMap::new();
    for arg_def in &field_def.arguments {
        let arg_name = &arg_def.name;
        if let Some(arg) = field.arguments.iter().find(|arg| arg.name == *arg_name) {
            match coerce_input_literal(ctx.schema, &arg_def.ty, &arg.value, Some(ctx.variable_values)) {
                Ok(Some(value)) => {
                    coerced_values.insert(arg_name.as_str(), value);
                    continue;
                }
                // The argument was a variable that was not provided:
                // fall through to the default value, if any.
                Ok(None) => {}
                Err(error) => {
                    ctx.add_error(error.into_field_error(&ctx.document.sources, path));
                    return Err(PropagateNull);
                }
            }
        }
        if let Some(default) = &arg_def.default_value {
            match coerce_input_literal(ctx.schema, &arg_def.ty, default, None) {
                Ok(Some(value)) => {
                    coerced_values.insert(arg_name.as_str(), value);
                    continue;
                }
                Ok(None) | Err(_) => {
                    ctx.add_error(
                        SuspectedValidationBug {
                            message: format!(
                                "Invalid default value for argument \"{arg_name}\"."
                            ),
                            location: default.location(),
                        }
                        .into_field_error(&ctx.document.sources, path),
                    );
                    return Err(PropagateNull);
                }
            }
        }
        if arg_def.ty.is_non_null() {
            ctx.add_error(field_error(
                format!(
                    "Argument \"{arg_name}\" of required type \"{}\" was not provided.",
                    arg_def.ty,
                ),
                path,
                field.name.location(),
                &ctx.document.sources,
            ));
            return Err(PropagateNull);
        }
    }
    Ok(coerced_values)
}

/// Coercion of a GraphQL literal (from a document) against the expected type,
/// substituting already-coerced variable values when `variable_values` is given.
///
/// `Ok(None)` means the literal is a variable that was not provided a value
/// and has no default: the position behaves as if no value had been written.
pub(crate) fn coerce_input_literal(
    schema: &Valid<Schema>,
    ty: &Type,
    value: &Node<Value>,
    variable_values: Option<&JsonMap>,
) -> Result<Option<JsonValue>, InputCoercionError> {
    if let Value::Variable(var_name) = value.as_ref() {
        let Some(variable_values) = variable_values else {
            return Err(InputCoercionError::SuspectedValidationBug(
                SuspectedValidationBug {
                    message: format!("Variable \"${var_name}\" used in a constant position."),
                    location: value.location(),
                },
            ));
        };
        return match variable_values.get(var_name.as_str()) {
            Some(var_value) => {
                if var_value.is_null() && ty.is_non_null() {
                    Err(value_error(
                        format!(
                            "Variable \"${var_name}\" must not be null \
                             for non-nullable type \"{ty}\"."
                        ),
                        value.location(),
                    ))
                } else {
                    // Variable usage was validated against the expected type,
                    // and its value is already coerced.
                    Ok(Some(var_value.clone()))
                }
            }
            None => Ok(None),
        };
    }
    if let Value::Null = value.as_ref() {
        return if ty.is_non_null() {
            Err(value_error(
                format!("Expected non-nullable type \"{ty}\", found null."),
                value.location(),
            ))
        } else {
            Ok(Some(JsonValue::Null))
        };
    }
    match ty {
        Type::List(item_ty) | Type::NonNullList(item_ty) => {
            let coerced = match value.as_ref() {
                Value::List(items) => {
                    let mut coerced = Vec::with_capacity(items.len());
                    for item in items {
                        match coerce_input_literal(schema, item_ty, item, variable_values)? {
                            Some(item) => coerced.push(item),
                            None if item_ty.is_non_null() => {
                                return Err(value_error(
                                    format!(
                                        "Missing value for list item \
                                         of non-nullable type \"{item_ty}\"."
                                    ),
                                    item.location(),
                                ))
                            }
                            None => coerced.push(JsonValue::Null),
                        }
                    }
                    coerced
                }
                // A non-list value coerces to a list of that single item.
                _ => match coerce_input_literal(schema, item_ty, value, variable_values)? {
                    Some(item) => vec![item],
                    None => return Ok(None),
                },
            };
            Ok(Some(JsonValue::Array(coerced)))
        }
        Type::Named(ty_name) | Type::NonNullNamed(ty_name) => {
            coerce_named_input_literal(schema, ty, ty_name, value, variable_values)
        }
    }
}

fn coerce_named_input_literal(
    schema: &Valid<Schema>,
    ty: &Type,
    ty_name: &Name,
    value: &Node<Value>,
    variable_values: Option<&JsonMap>,
) -> Result<Option<JsonValue>, InputCoercionError> {
    let expected = |value: &Node<Value>| {
        value_error(
            format!("Expected type \"{ty}\"."),
            value.location(),
        )
    };
    let Some(ty_def) = schema.types.get(ty_name) else {
        return Err(InputCoercionError::SuspectedValidationBug(
            SuspectedValidationBug {
                message: format!("Type \"{ty_name}\" is not defined."),
                location: value.location(),
            },
        ));
    };
    let coerced = match ty_def {
        ExtendedType::Scalar(_) => match ty_name.as_str() {
            "Int" => match value.as_ref() {
                Value::Int(int) => int
                    .try_to_i32()
                    .map_err(|_| {
                        value_error(
                            "Int cannot represent a non 32-bit signed integer value.",
                            value.location(),
                        )
                    })?
                    .into(),
                _ => return Err(expected(value)),
            },
            "Float" => match value.as_ref() {
                Value::Float(float) => float
                    .try_to_f64()
                    .map_err(|_| {
                        value_error("Float cannot represent this value.", value.location())
                    })?
                    .into(),
                // Int literals are valid Float inputs
                Value::Int(int) => int
                    .try_to_f64()
                    .map_err(|_| {
                        value_error("Float cannot represent this value.", value.location())
                    })?
                    .into(),
                _ => return Err(expected(value)),
            },
            "String" => match value.as_ref() {
                Value::String(string) => string.as_str().into(),
                _ => return Err(expected(value)),
            },
            "Boolean" => match value.as_ref() {
                Value::Boolean(boolean) => (*boolean).into(),
                _ => return Err(expected(value)),
            },
            "ID" => match value.as_ref() {
                Value::String(string) => string.as_str().into(),
                // Integer IDs coerce to their string form
                Value::Int(int) => int.as_str().into(),
                _ => return Err(expected(value)),
            },
            // Custom scalars take any literal as-is, converted to JSON
            _ => match graphql_literal_to_json(value, variable_values)? {
                Some(converted) => converted,
                None => return Ok(None),
            },
        },
        ExtendedType::Enum(enum_def) => match value.as_ref() {
            Value::Enum(value_name) if enum_def.values.contains_key(value_name) => {
                value_name.as_str().into()
            }
            Value::Enum(value_name) => {
                let suggestions = suggestion_list(
                    value_name.as_str(),
                    enum_def.values.keys().map(|name| name.as_str()),
                );
                return Err(value_error(
                    format!(
                        "Value \"{value_name}\" does not exist in \"{ty_name}\" enum.{}",
                        did_you_mean(&suggestions),
                    ),
                    value.location(),
                ));
            }
            _ => return Err(expected(value)),
        },
        ExtendedType::InputObject(input_object) => match value.as_ref() {
            Value::Object(object_fields) => {
                for (key, field_value) in object_fields {
                    if !input_object.fields.contains_key(key) {
                        let suggestions = suggestion_list(
                            key.as_str(),
                            input_object.fields.keys().map(|name| name.as_str()),
                        );
                        return Err(value_error(
                            format!(
                                "Field \"{key}\" is not defined by type \"{ty_name}\".{}",
                                did_you_mean(&suggestions),
                            ),
                            field_value.location(),
                        ));
                    }
                }
                let mut coerced = JsonMap::with_capacity(object_fields.len());
                for (field_name, field_def) in &input_object.fields {
                    let field_value = object_fields
                        .iter()
                        .find(|(key, _)| key == field_name)
                        .map(|(_, field_value)| field_value);
                    let provided = match field_value {
                        Some(field_value) => {
                            coerce_input_literal(schema, &field_def.ty, field_value, variable_values)?
                        }
                        None => None,
                    };
                    if let Some(provided) = provided {
                        coerced.insert(field_name.as_str(), provided);
                    } else if let Some(default) = &field_def.default_value {
                        match coerce_input_literal(schema, &field_def.ty, default, None)? {
                            Some(default_value) => {
                                coerced.insert(field_name.as_str(), default_value);
                            }
                            None => {
                                return Err(InputCoercionError::SuspectedValidationBug(
                                    SuspectedValidationBug {
                                        message: format!(
                                            "Invalid default value for input field \
                                             \"{field_name}\" of type \"{ty_name}\"."
                                        ),
                                        location: default.location(),
                                    },
                                ))
                            }
                        }
                    } else if field_def.ty.is_non_null() {
                        return Err(value_error(
                            format!(
                                "Field \"{field_name}\" of required type \"{}\" \
                                 was not provided.",
                                field_def.ty,
                            ),
                            value.location(),
                        ));
                    }
                }
                JsonValue::Object(coerced)
            }
            _ => return Err(expected(value)),
        },
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            return Err(InputCoercionError::SuspectedValidationBug(
                SuspectedValidationBug {
                    message: format!("Type \"{ty_name}\" cannot be used as an input type."),
                    location: value.location(),
                },
            ))
        }
    };
    Ok(Some(coerced))
}

/// Generic GraphQL-literal to JSON conversion, for custom scalar inputs.
fn graphql_literal_to_json(
    value: &Node<Value>,
    variable_values: Option<&JsonMap>,
) -> Result<Option<JsonValue>, InputCoercionError> {
    let converted = match value.as_ref() {
        Value::Null => JsonValue::Null,
        Value::Boolean(boolean) => (*boolean).into(),
        Value::Enum(value_name) => value_name.as_str().into(),
        Value::String(string) => string.as_str().into(),
        Value::Int(int) => match int.try_to_i32() {
            Ok(int) => int.into(),
            Err(_) => int
                .try_to_f64()
                .map_err(|_| {
                    value_error("Integer value too large.", value.location())
                })?
                .into(),
        },
        Value::Float(float) => float
            .try_to_f64()
            .map_err(|_| value_error("Float value too large.", value.location()))?
            .into(),
        Value::Variable(var_name) => {
            let Some(variable_values) = variable_values else {
                return Err(InputCoercionError::SuspectedValidationBug(
                    SuspectedValidationBug {
                        message: format!("Variable \"${var_name}\" used in a constant position."),
                        location: value.location(),
                    },
                ));
            };
            match variable_values.get(var_name.as_str()) {
                Some(var_value) => var_value.clone(),
                None => return Ok(None),
            }
        }
        Value::List(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                match graphql_literal_to_json(item, variable_values)? {
                    Some(item) => converted.push(item),
                    None => converted.push(JsonValue::Null),
                }
            }
            JsonValue::Array(converted)
        }
        Value::Object(object_fields) => {
            let mut converted = JsonMap::with_capacity(object_fields.len());
            for (key, field_value) in object_fields {
                if let Some(field_value) = graphql_literal_to_json(field_value, variable_values)? {
                    converted.insert(key.as_str(), field_value);
                }
            }
            JsonValue::Object(converted)
        }
    };
    Ok(Some(converted))
}

/// Options within an edit distance threshold of the input, closest first.
fn suggestion_list<'a>(
    input: &str,
    options: impl Iterator<Item = &'a str>,
) -> Vec<&'a str> {
    let threshold = input.len() / 2 + 1;
    let mut scored: Vec<(usize, &str)> = options
        .filter_map(|option| {
            let distance = lexical_distance(input, option);
            (distance <= threshold).then_some((distance, option))
        })
        .collect();
    scored.sort_by_key(|&(distance, option)| (distance, option));
    scored.into_iter().map(|(_, option)| option).take(5).collect()
}

fn did_you_mean(suggestions: &[&str]) -> String {
    match suggestions {
        [] => String::new(),
        [only] => format!(" Did you mean \"{only}\"?"),
        [first, second] => format!(" Did you mean \"{first}\" or \"{second}\"?"),
        [head @ .., last] => {
            let head = head
                .iter()
                .map(|option| format!("\"{option}\""))
                .collect::<Vec<_>>()
                .join(", ");
            format!(" Did you mean {head}, or \"{last}\"?")
        }
    }
}

/// Levenshtein distance, with case-only differences counting as 1.
fn lexical_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    if a.eq_ignore_ascii_case(b) {
        return 1;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let substitution_cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j] + substitution_cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

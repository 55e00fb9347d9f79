use apollo_compiler::executable::Field;
use apollo_compiler::response::JsonValue;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::Type;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::join_all;
use futures::future::BoxFuture;

use crate::engine::execute_selection_set;
use crate::engine::field_error;
use crate::engine::try_nullify;
use crate::engine::ExecutionContext;
use crate::engine::ExecutionMode;
use crate::engine::PropagateNull;
use crate::path::LinkedPath;
use crate::path::LinkedPathElement;
use crate::resolver::ObjectValue;
use crate::resolver::ResolvedValue;
use crate::validation::SuspectedValidationBug;

/// <https://spec.graphql.org/October2021/#CompleteValue()>
///
/// Returns `Err` for a field error being propagated upwards to find a nullable place.
///
/// The path lifetime `'b` is separate from `'a`: list completion allocates a
/// path node per index on its own stack frame. Boxed by hand because of the
/// recursion through `execute_selection_set`.
pub(crate) fn complete_value<'a, 'b, 'f>(
    ctx: &'a ExecutionContext<'a>,
    path: LinkedPath<'b>,
    ty: &'a Type,
    resolved: ResolvedValue<'a>,
    fields: &'a [&'a Field],
) -> BoxFuture<'f, Result<JsonValue, PropagateNull>>
where
    'a: 'f,
    'b: 'f,
{
    Box::pin(async move {
        let location = fields[0].name.location();
        macro_rules! field_error {
            ($($arg: tt)+) => {
                {
                    ctx.add_error(field_error(
                        format!($($arg)+),
                        path,
                        location,
                        &ctx.document.sources
                    ));
                    return Err(PropagateNull);
                }
            };
        }
        // Settle deferred values before looking at the type
        let mut resolved = resolved;
        let resolved = loop {
            match resolved {
                ResolvedValue::Pending(future) => {
                    // Recorded even if the future is already ready,
                    // so that execute_sync can fail loudly.
                    ctx.note_pending();
                    match future.await {
                        Ok(settled) => resolved = settled,
                        Err(error) => field_error!("resolver error: {}", error.message),
                    }
                }
                ResolvedValue::Stream(_) => {
                    field_error!("Resolver returned an event stream, expected a value")
                }
                settled => break settled,
            }
        };
        if let ResolvedValue::Leaf(JsonValue::Null) = resolved {
            if ty.is_non_null() {
                field_error!("Non-null type {ty} resolved to null")
            } else {
                return Ok(JsonValue::Null);
            }
        }
        if let ResolvedValue::List(iter) = resolved {
            match ty {
                Type::Named(_) | Type::NonNullNamed(_) => {
                    field_error!("Non-list type {ty} resolved to a list")
                }
                Type::List(inner_ty) | Type::NonNullList(inner_ty) => {
                    // Items complete concurrently, each with its own error
                    // handling, before the whole list is inspected for nulls
                    // to propagate.
                    let items: Vec<_> = iter.collect();
                    let item_results = join_all(items.into_iter().enumerate().map(
                        |(index, inner_result)| async move {
                            let inner_resolved = match inner_result {
                                Ok(inner_resolved) => inner_resolved,
                                Err(error) => {
                                    ctx.add_error(field_error(
                                        format!("resolver error: {}", error.message),
                                        path,
                                        location,
                                        &ctx.document.sources,
                                    ));
                                    return Err(PropagateNull);
                                }
                            };
                            let inner_path = LinkedPathElement {
                                element: ResponseDataPathSegment::ListIndex(index),
                                next: path,
                            };
                            let inner_result = complete_value(
                                ctx,
                                Some(&inner_path),
                                inner_ty,
                                inner_resolved,
                                fields,
                            )
                            .await;
                            // On field error, try to nullify that item
                            try_nullify(inner_ty, inner_result)
                        },
                    ))
                    .await;
                    let mut completed_list = Vec::with_capacity(item_results.len());
                    for inner_result in item_results {
                        match inner_result {
                            Ok(inner_value) => completed_list.push(inner_value),
                            // If the item is non-null, try to nullify the list
                            Err(PropagateNull) => return try_nullify(ty, Err(PropagateNull)),
                        }
                    }
                    return Ok(completed_list.into());
                }
            }
        }
        let ty_name = match ty {
            Type::List(_) | Type::NonNullList(_) => {
                field_error!("List type {ty} resolved to an object")
            }
            Type::Named(name) | Type::NonNullNamed(name) => name,
        };
        let Some(ty_def) = ctx.schema.types.get(ty_name) else {
            ctx.add_error(
                SuspectedValidationBug {
                    message: format!("Undefined type {ty_name}"),
                    location,
                }
                .into_field_error(&ctx.document.sources, path),
            );
            return Err(PropagateNull);
        };
        if let ExtendedType::InputObject(_) = ty_def {
            ctx.add_error(
                SuspectedValidationBug {
                    message: format!("Field with input object type {ty_name}"),
                    location,
                }
                .into_field_error(&ctx.document.sources, path),
            );
            return Err(PropagateNull);
        }
        let resolved_obj = match resolved {
            // Both handled by early returns above
            ResolvedValue::List(_)
            | ResolvedValue::Pending(_)
            | ResolvedValue::Stream(_) => unreachable!(),
            ResolvedValue::Leaf(json_value) => {
                match ty_def {
                    ExtendedType::InputObject(_) => unreachable!(), // early return above
                    ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
                        field_error!(
                            "Resolver returned a leaf value \
                             but expected an object for type {ty_name}"
                        )
                    }
                    ExtendedType::Enum(enum_def) => {
                        // https://spec.graphql.org/October2021/#sec-Enums.Result-Coercion
                        if !json_value
                            .as_str()
                            .is_some_and(|str| enum_def.values.contains_key(str))
                        {
                            field_error!("Resolver returned {json_value}, expected enum {ty_name}")
                        }
                    }
                    ExtendedType::Scalar(_) => match ty_name.as_str() {
                        "Int" => {
                            // https://spec.graphql.org/October2021/#sec-Int.Result-Coercion
                            // > GraphQL services may coerce non-integer internal values to integers
                            // > when reasonable without losing information
                            //
                            // We choose not to, to keep with Rust’s strong typing
                            if let Some(int) = json_value.as_i64() {
                                if i32::try_from(int).is_err() {
                                    field_error!("Resolver returned {json_value} which overflows Int")
                                }
                            } else {
                                field_error!("Resolver returned {json_value}, expected Int")
                            }
                        }
                        "Float" => {
                            // https://spec.graphql.org/October2021/#sec-Float.Result-Coercion
                            if !(json_value.is_f64() || json_value.is_i64()) {
                                field_error!("Resolver returned {json_value}, expected Float")
                            }
                        }
                        "String" => {
                            // https://spec.graphql.org/October2021/#sec-String.Result-Coercion
                            if !json_value.is_string() {
                                field_error!("Resolver returned {json_value}, expected String")
                            }
                        }
                        "Boolean" => {
                            // https://spec.graphql.org/October2021/#sec-Boolean.Result-Coercion
                            if !json_value.is_boolean() {
                                field_error!("Resolver returned {json_value}, expected Boolean")
                            }
                        }
                        "ID" => {
                            // https://spec.graphql.org/October2021/#sec-ID.Result-Coercion
                            if !(json_value.is_string() || json_value.is_i64()) {
                                field_error!("Resolver returned {json_value}, expected ID")
                            }
                        }
                        _ => {
                            // Custom scalar: accept any JSON value (including an array or object,
                            // despite this being a "leaf" as far as GraphQL resolution is concerned)
                        }
                    },
                };
                return Ok(json_value);
            }
            ResolvedValue::Object(resolved_obj) => resolved_obj,
        };
        let object_type = match ty_def {
            ExtendedType::InputObject(_) => unreachable!(), // early return above
            ExtendedType::Enum(_) | ExtendedType::Scalar(_) => {
                field_error!("Resolver returned an object, expected {ty_name}")
            }
            ExtendedType::Interface(_) | ExtendedType::Union(_) => {
                match resolve_abstract_type(ctx, ty_name, ty_def, &*resolved_obj) {
                    Ok(def) => def,
                    Err(message) => field_error!("{message}"),
                }
            }
            ExtendedType::Object(def) => {
                if resolved_obj.is_type_of(ty_name.as_str()) == Some(false) {
                    field_error!("Resolver returned an object that is not of type {ty_name}")
                }
                def
            }
        };
        execute_selection_set(
            ctx,
            path,
            ExecutionMode::Normal,
            object_type,
            &*resolved_obj,
            fields
                .iter()
                .flat_map(|field| &field.selection_set.selections)
                .collect(),
        )
        .await
        .map(JsonValue::Object)
    })
}

/// <https://spec.graphql.org/October2021/#ResolveAbstractType()>
///
/// An execution-wide [`TypeResolver`][crate::TypeResolver] hook takes
/// precedence when configured. Otherwise the value is asked for its
/// [`type_name`][crate::Resolver::type_name], and failing that, candidate
/// object types are probed with [`is_type_of`][crate::Resolver::is_type_of]
/// in the declaration order of the abstract type's possible types:
/// member order for a union, schema order of the implementers for an
/// interface.
fn resolve_abstract_type<'a>(
    ctx: &ExecutionContext<'a>,
    abstract_type_name: &Name,
    abstract_type_def: &ExtendedType,
    resolved_obj: &ObjectValue<'_>,
) -> Result<&'a Node<ObjectType>, String> {
    let object_type_name = if let Some(type_resolver) = ctx.type_resolver {
        type_resolver
            .resolve_type(resolved_obj, abstract_type_name.as_str())
            .ok_or_else(|| unresolved(abstract_type_name))?
    } else if let Some(name) = resolved_obj.type_name() {
        name.to_owned()
    } else {
        let mut candidates: Box<dyn Iterator<Item = &Node<ObjectType>> + '_> = match abstract_type_def
        {
            ExtendedType::Union(union_def) => Box::new(
                union_def
                    .members
                    .iter()
                    .filter_map(|member| ctx.schema.get_object(member.name.as_str())),
            ),
            _ => Box::new(ctx.schema.types.values().filter_map(|ty_def| match ty_def {
                ExtendedType::Object(def)
                    if is_possible_type(abstract_type_def, abstract_type_name, def) =>
                {
                    Some(def)
                }
                _ => None,
            })),
        };
        candidates
            .find(|def| resolved_obj.is_type_of(def.name.as_str()) == Some(true))
            .map(|def| def.name.as_str().to_owned())
            .ok_or_else(|| unresolved(abstract_type_name))?
    };
    let Some(object_type) = ctx.schema.get_object(&object_type_name) else {
        return Err(format!(
            "Resolver returned an object of type {object_type_name} \
             not defined in the schema"
        ));
    };
    if !is_possible_type(abstract_type_def, abstract_type_name, object_type) {
        return Err(format!(
            "Runtime object type {object_type_name} is not a possible type \
             for abstract type {abstract_type_name}"
        ));
    }
    Ok(object_type)
}

fn unresolved(abstract_type_name: &Name) -> String {
    format!(
        "Abstract type {abstract_type_name} must be resolved \
         to an object type at runtime"
    )
}

fn is_possible_type(
    abstract_type_def: &ExtendedType,
    abstract_type_name: &Name,
    object_type: &ObjectType,
) -> bool {
    match abstract_type_def {
        ExtendedType::Interface(_) => object_type
            .implements_interfaces
            .iter()
            .any(|implemented| implemented.name == *abstract_type_name),
        ExtendedType::Union(union_def) => union_def
            .members
            .iter()
            .any(|member| member.name == object_type.name),
        _ => false,
    }
}

use apollo_compiler::collections::IndexMap;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::schema::ObjectType;
use futures::stream::BoxStream;

use crate::engine::collect_fields;
use crate::engine::field_definition;
use crate::engine::field_error;
use crate::engine::ExecutionContext;
use crate::engine::PropagateNull;
use crate::input_coercion::coerce_argument_values;
use crate::path::LinkedPathElement;
use crate::resolver::FieldError;
use crate::resolver::ObjectValue;
use crate::resolver::ResolvedValue;
use crate::validation::SuspectedValidationBug;

/// The source event stream of a subscription operation.
///
/// Each event is a root object value: executing the subscription's selection
/// set against it (with [`Execution::execute`][crate::Execution::execute] on
/// a query-shaped view, or a caller-side loop) produces one response of the
/// response stream.
pub type SourceEventStream<'a> = BoxStream<'a, Result<ResolvedValue<'a>, FieldError>>;

/// Resolves the single root field of a subscription operation to its
/// event stream. Errors are pushed to the context.
pub(crate) async fn create_source_event_stream<'v>(
    ctx: &ExecutionContext<'_>,
    root_type: &ObjectType,
    initial_value: &'v ObjectValue<'v>,
) -> Result<SourceEventStream<'v>, PropagateNull> {
    let mut grouped_fields = IndexMap::default();
    let mut visited_fragments = Default::default();
    let selections: Vec<_> = ctx.operation.selection_set.selections.iter().collect();
    if let Err(bug) = collect_fields(
        ctx,
        root_type,
        &selections,
        &mut visited_fragments,
        &mut grouped_fields,
    ) {
        ctx.add_error(bug.into_field_error(&ctx.document.sources, None));
        return Err(PropagateNull);
    }
    // Validation ("Single root field") leaves exactly one group here.
    let mut groups = grouped_fields.iter();
    let (Some((&key, fields)), None) = (groups.next(), groups.next()) else {
        ctx.add_error(
            SuspectedValidationBug {
                message: "Subscription operations must have exactly one root field.".to_owned(),
                location: None,
            }
            .into_field_error(&ctx.document.sources, None),
        );
        return Err(PropagateNull);
    };
    let field = fields[0];
    let field_path = LinkedPathElement {
        element: ResponseDataPathSegment::Field(key.clone()),
        next: None,
    };
    let path = Some(&field_path);
    if field.name == "__typename" {
        ctx.add_error(field_error(
            "Cannot subscribe to the __typename meta-field.",
            path,
            field.name.location(),
            &ctx.document.sources,
        ));
        return Err(PropagateNull);
    }
    let Some(field_def) = field_definition(ctx, root_type, &field.name) else {
        ctx.add_error(
            SuspectedValidationBug {
                message: format!(
                    "No definition for field \"{}\" of type \"{}\".",
                    field.name, root_type.name,
                ),
                location: field.name.location(),
            }
            .into_field_error(&ctx.document.sources, path),
        );
        return Err(PropagateNull);
    };
    let arguments = coerce_argument_values(ctx, field_def, field, path)?;
    let mut resolved = initial_value
        .subscribe_field(field.name.as_str(), &arguments)
        .map_err(|error| {
            ctx.add_error(field_error(
                format!("resolver error: {}", error.message),
                path,
                field.name.location(),
                &ctx.document.sources,
            ));
            PropagateNull
        })?;
    loop {
        match resolved {
            ResolvedValue::Stream(stream) => return Ok(stream),
            ResolvedValue::Pending(future) => {
                resolved = future.await.map_err(|error| {
                    ctx.add_error(field_error(
                        format!("resolver error: {}", error.message),
                        path,
                        field.name.location(),
                        &ctx.document.sources,
                    ));
                    PropagateNull
                })?;
            }
            _ => {
                ctx.add_error(field_error(
                    format!(
                        "Subscription field \"{}\" did not resolve to an event stream.",
                        field.name,
                    ),
                    path,
                    field.name.location(),
                    &ctx.document.sources,
                ));
                return Err(PropagateNull);
            }
        }
    }
}

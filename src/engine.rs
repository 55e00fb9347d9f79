use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::LazyLock;

use apollo_compiler::ast;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::name;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use futures::future::join_all;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::input_coercion::coerce_argument_values;
use crate::path::path_to_vec;
use crate::path::LinkedPath;
use crate::path::LinkedPathElement;
use crate::resolver::ObjectValue;
use crate::resolver::ResolveInfo;
use crate::resolver::TypeResolver;
use crate::result_coercion::complete_value;
use crate::validation::SuspectedValidationBug;

/// State shared by the whole execution of one operation.
pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a Valid<Schema>,
    pub(crate) document: &'a Valid<ExecutableDocument>,
    pub(crate) operation: &'a Operation,
    pub(crate) variable_values: &'a JsonMap,
    pub(crate) type_resolver: Option<&'a dyn TypeResolver>,
    /// Append-only log of field errors. The lock guard is never held across
    /// an await point.
    errors: Mutex<Vec<GraphQLError>>,
    /// Whether any resolver returned a `Pending` value,
    /// even one that was already ready when polled.
    pending_seen: AtomicBool,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        schema: &'a Valid<Schema>,
        document: &'a Valid<ExecutableDocument>,
        operation: &'a Operation,
        variable_values: &'a JsonMap,
        type_resolver: Option<&'a dyn TypeResolver>,
    ) -> Self {
        Self {
            schema,
            document,
            operation,
            variable_values,
            type_resolver,
            errors: Mutex::new(Vec::new()),
            pending_seen: AtomicBool::new(false),
        }
    }

    pub(crate) fn add_error(&self, error: GraphQLError) {
        self.errors.lock().push(error);
    }

    pub(crate) fn note_pending(&self) {
        self.pending_seen.store(true, Ordering::Relaxed);
    }

    pub(crate) fn pending_seen(&self) -> bool {
        self.pending_seen.load(Ordering::Relaxed)
    }

    pub(crate) fn into_errors(self) -> Vec<GraphQLError> {
        self.errors.into_inner()
    }
}

/// <https://spec.graphql.org/October2021/#sec-Normal-and-Serial-Execution>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionMode {
    /// Fields of this selection set may be executed in parallel
    Normal,
    /// Fields of this selection set are executed one at a time,
    /// in selection order. Used for the root of a mutation.
    Sequential,
}

/// A field error has already been pushed to the context: this sentinel
/// propagates towards the response root until a nullable position is found.
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
pub(crate) struct PropagateNull;

/// Resolves a field error at `ty`: replaces the value with null if `ty`
/// is nullable, or propagates the error to the parent otherwise.
pub(crate) fn try_nullify(
    ty: &Type,
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if ty.is_non_null() {
                Err(PropagateNull)
            } else {
                Ok(JsonValue::Null)
            }
        }
    }
}

pub(crate) fn field_error(
    message: impl Into<String>,
    path: LinkedPath<'_>,
    location: Option<SourceSpan>,
    sources: &SourceMap,
) -> GraphQLError {
    let mut error = GraphQLError::new(message.into(), location, sources);
    error.path = path_to_vec(path);
    error
}

/// <https://spec.graphql.org/October2021/#ExecuteSelectionSet()>
///
/// The path lifetime `'b` is separate from `'a` because path nodes live on
/// the stack of recursive calls; the future is boxed by hand since the
/// recursion through `complete_value` makes its type infinite.
pub(crate) fn execute_selection_set<'a, 'b, 'f>(
    ctx: &'a ExecutionContext<'a>,
    path: LinkedPath<'b>,
    mode: ExecutionMode,
    object_type: &'a ObjectType,
    object_value: &'a ObjectValue<'a>,
    selections: Vec<&'a Selection>,
) -> BoxFuture<'f, Result<JsonMap, PropagateNull>>
where
    'a: 'f,
    'b: 'f,
{
    Box::pin(async move {
        let mut grouped_field_set = IndexMap::default();
        let mut visited_fragments = HashSet::new();
        if let Err(bug) = collect_fields(
            ctx,
            object_type,
            &selections,
            &mut visited_fragments,
            &mut grouped_field_set,
        ) {
            ctx.add_error(bug.into_field_error(&ctx.document.sources, path));
            return Err(PropagateNull);
        }
        let mut response_map = JsonMap::with_capacity(grouped_field_set.len());
        match mode {
            ExecutionMode::Normal => {
                let results = join_all(grouped_field_set.iter().map(|(&key, fields)| {
                    execute_grouped_field(ctx, path, object_type, object_value, key, fields)
                }))
                .await;
                for ((key, _), result) in grouped_field_set.iter().zip(results) {
                    response_map.insert(key.as_str(), result?);
                }
            }
            ExecutionMode::Sequential => {
                for (&key, fields) in &grouped_field_set {
                    let value =
                        execute_grouped_field(ctx, path, object_type, object_value, key, fields)
                            .await?;
                    response_map.insert(key.as_str(), value);
                }
            }
        }
        Ok(response_map)
    })
}

/// Executes all the selections grouped under one response key.
async fn execute_grouped_field<'a, 'b>(
    ctx: &'a ExecutionContext<'a>,
    parent_path: LinkedPath<'b>,
    object_type: &'a ObjectType,
    object_value: &'a ObjectValue<'a>,
    key: &'a Name,
    fields: &'a [&'a Field],
) -> Result<JsonValue, PropagateNull> {
    let field = fields[0];
    let field_path = LinkedPathElement {
        element: ResponseDataPathSegment::Field(key.clone()),
        next: parent_path,
    };
    let path = Some(&field_path);
    if field.name == "__typename" {
        // Answered by the engine: the concrete type is already known here.
        return Ok(JsonValue::from(object_type.name.as_str()));
    }
    let Some(field_def) = field_definition(ctx, object_type, &field.name) else {
        failfast_error!(
            "no definition for field {} of type {}",
            field.name,
            object_type.name
        );
        ctx.add_error(
            SuspectedValidationBug {
                message: format!(
                    "No definition for field \"{}\" of type \"{}\".",
                    field.name, object_type.name,
                ),
                location: field.name.location(),
            }
            .into_field_error(&ctx.document.sources, path),
        );
        return Ok(JsonValue::Null);
    };
    let result = execute_field(ctx, path, object_type, object_value, field_def, fields).await;
    try_nullify(&field_def.ty, result)
}

/// <https://spec.graphql.org/October2021/#ExecuteField()>
async fn execute_field<'a, 'b>(
    ctx: &'a ExecutionContext<'a>,
    path: LinkedPath<'b>,
    object_type: &'a ObjectType,
    object_value: &'a ObjectValue<'a>,
    field_def: &'a FieldDefinition,
    fields: &'a [&'a Field],
) -> Result<JsonValue, PropagateNull> {
    let field = fields[0];
    let arguments = coerce_argument_values(ctx, field_def, field, path)?;
    let info = ResolveInfo {
        schema: ctx.schema,
        document: ctx.document,
        operation: ctx.operation,
        parent_type_name: &object_type.name,
        field_definition: field_def,
        fields,
        path,
        arguments: &arguments,
        variable_values: ctx.variable_values,
    };
    let resolved = object_value.resolve_field(&info).map_err(|error| {
        ctx.add_error(field_error(
            format!("resolver error: {}", error.message),
            path,
            field.name.location(),
            &ctx.document.sources,
        ));
        PropagateNull
    })?;
    complete_value(ctx, path, &field_def.ty, resolved, fields).await
}

/// The definition to execute `field_name` against, including the schema
/// meta-fields available on the query root.
///
/// `__typename` never reaches this lookup.
pub(crate) fn field_definition<'a>(
    ctx: &ExecutionContext<'a>,
    object_type: &ObjectType,
    field_name: &str,
) -> Option<&'a FieldDefinition> {
    if field_name.starts_with("__") {
        let is_query_root =
            ctx.schema.root_operation(ast::OperationType::Query) == Some(&object_type.name);
        if is_query_root {
            if field_name == "__schema" {
                return Some(&SCHEMA_META_FIELD_DEF);
            }
            if field_name == "__type" {
                return Some(&TYPE_META_FIELD_DEF);
            }
        }
    }
    ctx.schema
        .type_field(&object_type.name, field_name)
        .ok()
        .map(|component| &***component)
}

/// Introspection entry points are not part of the schema's field definitions:
/// their resolution is dispatched to the query-root resolver like any other
/// field, against these synthesized definitions.
static SCHEMA_META_FIELD_DEF: LazyLock<FieldDefinition> = LazyLock::new(|| FieldDefinition {
    description: None,
    name: name!("__schema"),
    arguments: Vec::new(),
    ty: Type::NonNullNamed(name!("__Schema")),
    directives: Default::default(),
});

static TYPE_META_FIELD_DEF: LazyLock<FieldDefinition> = LazyLock::new(|| FieldDefinition {
    description: None,
    name: name!("__type"),
    arguments: vec![Node::new(ast::InputValueDefinition {
        description: None,
        name: name!("name"),
        ty: Node::new(Type::NonNullNamed(name!("String"))),
        default_value: None,
        directives: Default::default(),
    })],
    ty: Type::Named(name!("__Type")),
    directives: Default::default(),
});

/// <https://spec.graphql.org/October2021/#CollectFields()>
///
/// Fields are grouped by response key, in the order of their first
/// occurrence after fragment expansion.
pub(crate) fn collect_fields<'a>(
    ctx: &ExecutionContext<'a>,
    object_type: &ObjectType,
    selections: &[&'a Selection],
    visited_fragments: &mut HashSet<&'a Name>,
    grouped_fields: &mut IndexMap<&'a Name, Vec<&'a Field>>,
) -> Result<(), SuspectedValidationBug> {
    for &selection in selections {
        match selection {
            Selection::Field(field) => {
                if eval_skip_include(ctx, &field.directives)? {
                    grouped_fields
                        .entry(field.response_key())
                        .or_default()
                        .push(&**field);
                }
            }
            Selection::FragmentSpread(spread) => {
                if !eval_skip_include(ctx, &spread.directives)? {
                    continue;
                }
                // Also guards against fragment cycles, which validation rejects.
                if !visited_fragments.insert(&spread.fragment_name) {
                    continue;
                }
                let Some(fragment) = ctx.document.fragments.get(&spread.fragment_name) else {
                    failfast_debug!("Missing fragment named: {}", spread.fragment_name);
                    continue;
                };
                if does_fragment_type_apply(ctx.schema, object_type, fragment.type_condition()) {
                    collect_fields(
                        ctx,
                        object_type,
                        &fragment.selection_set.selections.iter().collect::<Vec<_>>(),
                        visited_fragments,
                        grouped_fields,
                    )?;
                }
            }
            Selection::InlineFragment(inline) => {
                if !eval_skip_include(ctx, &inline.directives)? {
                    continue;
                }
                if let Some(type_condition) = &inline.type_condition {
                    if !does_fragment_type_apply(ctx.schema, object_type, type_condition) {
                        continue;
                    }
                }
                collect_fields(
                    ctx,
                    object_type,
                    &inline.selection_set.selections.iter().collect::<Vec<_>>(),
                    visited_fragments,
                    grouped_fields,
                )?;
            }
        }
    }
    Ok(())
}

/// <https://spec.graphql.org/October2021/#DoesFragmentTypeApply()>
fn does_fragment_type_apply(
    schema: &Schema,
    object_type: &ObjectType,
    type_condition: &Name,
) -> bool {
    if object_type.name == *type_condition {
        return true;
    }
    match schema.types.get(type_condition) {
        Some(ExtendedType::Interface(_)) => object_type
            .implements_interfaces
            .iter()
            .any(|implemented| implemented.name == *type_condition),
        Some(ExtendedType::Union(union_def)) => union_def
            .members
            .iter()
            .any(|member| member.name == object_type.name),
        _ => false,
    }
}

/// Whether a selection is included, per its `@skip` and `@include` directives.
/// `@skip` takes precedence when both are present.
fn eval_skip_include(
    ctx: &ExecutionContext<'_>,
    directives: &ast::DirectiveList,
) -> Result<bool, SuspectedValidationBug> {
    if let Some(skip) = directives.get("skip") {
        if boolean_argument(ctx, skip, "if")? {
            return Ok(false);
        }
    }
    if let Some(include) = directives.get("include") {
        if !boolean_argument(ctx, include, "if")? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn boolean_argument(
    ctx: &ExecutionContext<'_>,
    directive: &Node<ast::Directive>,
    name: &str,
) -> Result<bool, SuspectedValidationBug> {
    match directive
        .specified_argument_by_name(name)
        .map(|value| value.as_ref())
    {
        Some(ast::Value::Boolean(value)) => Ok(*value),
        Some(ast::Value::Variable(var_name)) => match ctx.variable_values.get(var_name.as_str()) {
            Some(JsonValue::Bool(value)) => Ok(*value),
            _ => Err(SuspectedValidationBug {
                message: format!(
                    "Expected boolean variable \"${var_name}\" \
                     for argument \"{name}\" of @{}.",
                    directive.name,
                ),
                location: directive.location(),
            }),
        },
        _ => Err(SuspectedValidationBug {
            message: format!(
                "Expected boolean or variable for argument \"{name}\" of @{}.",
                directive.name,
            ),
            location: directive.location(),
        }),
    }
}

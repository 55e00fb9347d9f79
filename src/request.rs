use apollo_compiler::ast;
use apollo_compiler::executable::Operation;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use futures::FutureExt;

use crate::engine::execute_selection_set;
use crate::engine::ExecutionContext;
use crate::engine::ExecutionMode;
use crate::engine::PropagateNull;
use crate::input_coercion::coerce_variable_values;
use crate::input_coercion::DEFAULT_MAX_COERCION_ERRORS;
use crate::resolver::ObjectValue;
use crate::resolver::TypeResolver;
use crate::response::Response;
use crate::subscription::create_source_event_stream;
use crate::subscription::SourceEventStream;
use crate::validation::SUSPECTED_VALIDATION_BUG;

/// One GraphQL request, ready to be executed against resolvers.
///
/// Typical use:
///
/// ```rust
/// # use apollo_compiler::{Schema, ExecutableDocument};
/// # use graphql_execution::{Execution, JsonResolver};
/// # let sdl = "type Query { greeting: String }";
/// # let schema = Schema::parse_and_validate(sdl, "sdl.graphql").unwrap();
/// # let doc = ExecutableDocument::parse_and_validate(
/// #     &schema, "{ greeting }", "q.graphql").unwrap();
/// # let data = serde_json::from_str(r#"{"greeting": "hi"}"#).unwrap();
/// let response = Execution::new(&schema, &doc)
///     .execute_sync(&JsonResolver::new(&data))
///     .unwrap();
/// ```
#[derive(Clone, Copy)]
pub struct Execution<'a> {
    schema: &'a Valid<Schema>,
    document: &'a Valid<ExecutableDocument>,
    operation_name: Option<&'a str>,
    raw_variable_values: Option<&'a JsonMap>,
    type_resolver: Option<&'a dyn TypeResolver>,
    max_coercion_errors: usize,
}

/// execution did not complete synchronously
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub struct NotSynchronous;

impl<'a> Execution<'a> {
    pub fn new(schema: &'a Valid<Schema>, document: &'a Valid<ExecutableDocument>) -> Self {
        Self {
            schema,
            document,
            operation_name: None,
            raw_variable_values: None,
            type_resolver: None,
            max_coercion_errors: DEFAULT_MAX_COERCION_ERRORS,
        }
    }

    /// Which operation of the document to execute.
    /// Required when the document contains more than one.
    pub fn operation_name(mut self, operation_name: &'a str) -> Self {
        self.operation_name = Some(operation_name);
        self
    }

    /// Variable values for the request, before coercion.
    pub fn raw_variable_values(mut self, raw_variable_values: &'a JsonMap) -> Self {
        self.raw_variable_values = Some(raw_variable_values);
        self
    }

    /// Overrides [`Resolver`][crate::Resolver]-based resolution of abstract
    /// types for the whole execution.
    pub fn type_resolver(mut self, type_resolver: &'a dyn TypeResolver) -> Self {
        self.type_resolver = Some(type_resolver);
        self
    }

    /// How many variable-coercion errors are reported before giving up
    /// on the request. Defaults to 50.
    pub fn max_coercion_errors(mut self, max: usize) -> Self {
        self.max_coercion_errors = max;
        self
    }

    /// Executes a query or mutation operation with `initial_value` as the
    /// root object value.
    ///
    /// Subscription operations are rejected with a request error;
    /// see [`source_event_stream`][Self::source_event_stream].
    #[tracing::instrument(skip_all, level = "trace")]
    pub async fn execute(self, initial_value: &ObjectValue<'_>) -> Response {
        self.execute_inner(initial_value).await.0
    }

    /// Like [`execute`][Self::execute] for operations whose resolvers all
    /// produce values without suspending.
    ///
    /// Fails if any resolver returned a [`Pending`][crate::ResolvedValue::Pending]
    /// value, even one whose future was already ready.
    pub fn execute_sync(self, initial_value: &ObjectValue<'_>) -> Result<Response, NotSynchronous> {
        let (response, pending_seen) = self
            .execute_inner(initial_value)
            .now_or_never()
            .ok_or(NotSynchronous)?;
        if pending_seen {
            Err(NotSynchronous)
        } else {
            Ok(response)
        }
    }

    /// The boolean is whether any resolver returned a `Pending` value.
    async fn execute_inner(self, initial_value: &ObjectValue<'_>) -> (Response, bool) {
        let operation = match self.document.operations.get(self.operation_name) {
            Ok(operation) => operation,
            Err(error) => {
                return (
                    Response::from_request_errors(vec![
                        error.to_graphql_error(&self.document.sources)
                    ]),
                    false,
                )
            }
        };
        if operation.operation_type == ast::OperationType::Subscription {
            return (
                self.request_error(
                    "Subscription operations must be executed as a source event stream.",
                    operation.location(),
                ),
                false,
            );
        }
        let empty;
        let raw_variable_values = match self.raw_variable_values {
            Some(values) => values,
            None => {
                empty = JsonMap::new();
                &empty
            }
        };
        let variable_values = match coerce_variable_values(
            self.schema,
            operation,
            raw_variable_values,
            self.max_coercion_errors,
        ) {
            Ok(variable_values) => variable_values,
            Err(errors) => {
                return (
                    Response::from_request_errors(
                        errors
                            .iter()
                            .map(|error| error.to_graphql_error(&self.document.sources))
                            .collect(),
                    ),
                    false,
                )
            }
        };
        let Some(root_type) = self.root_object_type(operation) else {
            return (self.no_root_type(operation), false);
        };
        let mode = if operation.operation_type == ast::OperationType::Mutation {
            // > the top level selection set for mutations MUST be executed
            // > serially
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Normal
        };
        let ctx = ExecutionContext::new(
            self.schema,
            self.document,
            operation,
            &variable_values,
            self.type_resolver,
        );
        let result = execute_selection_set(
            &ctx,
            None,
            mode,
            root_type,
            initial_value,
            operation.selection_set.selections.iter().collect(),
        )
        .await;
        let data = match result {
            Ok(map) => JsonValue::Object(map),
            // Null propagation reached the root
            Err(PropagateNull) => JsonValue::Null,
        };
        let pending_seen = ctx.pending_seen();
        let response = Response::builder().data(data).errors(ctx.into_errors()).build();
        (response, pending_seen)
    }

    /// Builds the source event stream of a subscription operation:
    /// each event is a root object value from which one response of the
    /// response stream can be executed.
    ///
    /// <https://spec.graphql.org/October2021/#CreateSourceEventStream()>
    #[tracing::instrument(skip_all, level = "trace")]
    pub async fn source_event_stream<'v>(
        self,
        initial_value: &'v ObjectValue<'v>,
    ) -> Result<SourceEventStream<'v>, Box<Response>> {
        let operation = match self.document.operations.get(self.operation_name) {
            Ok(operation) => operation,
            Err(error) => {
                return Err(Box::new(Response::from_request_errors(vec![
                    error.to_graphql_error(&self.document.sources),
                ])))
            }
        };
        if operation.operation_type != ast::OperationType::Subscription {
            return Err(Box::new(self.request_error(
                "Source event streams are only produced by subscription operations.",
                operation.location(),
            )));
        }
        let empty;
        let raw_variable_values = match self.raw_variable_values {
            Some(values) => values,
            None => {
                empty = JsonMap::new();
                &empty
            }
        };
        let variable_values = match coerce_variable_values(
            self.schema,
            operation,
            raw_variable_values,
            self.max_coercion_errors,
        ) {
            Ok(variable_values) => variable_values,
            Err(errors) => {
                return Err(Box::new(Response::from_request_errors(
                    errors
                        .iter()
                        .map(|error| error.to_graphql_error(&self.document.sources))
                        .collect(),
                )))
            }
        };
        let Some(root_type) = self.root_object_type(operation) else {
            return Err(Box::new(self.no_root_type(operation)));
        };
        let ctx = ExecutionContext::new(
            self.schema,
            self.document,
            operation,
            &variable_values,
            self.type_resolver,
        );
        match create_source_event_stream(&ctx, root_type, initial_value).await {
            Ok(stream) => Ok(stream),
            Err(PropagateNull) => Err(Box::new(
                Response::builder().errors(ctx.into_errors()).build(),
            )),
        }
    }

    fn root_object_type(&self, operation: &Operation) -> Option<&'a Node<ObjectType>> {
        let root_type_name = self.schema.root_operation(operation.operation_type)?;
        self.schema.get_object(root_type_name)
    }

    /// With a valid document this requires a schema/document mismatch,
    /// so the error is flagged as a suspected validation bug.
    fn no_root_type(&self, operation: &Node<Operation>) -> Response {
        let kind = match operation.operation_type {
            ast::OperationType::Query => "query",
            ast::OperationType::Mutation => "mutation",
            ast::OperationType::Subscription => "subscription",
        };
        Response::from_request_errors(vec![RequestError {
            message: format!("No {kind} root operation object type is defined in the schema."),
            location: operation.location(),
            is_suspected_validation_bug: true,
        }
        .to_graphql_error(&self.document.sources)])
    }

    fn request_error(&self, message: impl Into<String>, location: Option<SourceSpan>) -> Response {
        Response::from_request_errors(vec![RequestError {
            message: message.into(),
            location,
            is_suspected_validation_bug: false,
        }
        .to_graphql_error(&self.document.sources)])
    }
}

/// An error raised before execution of the operation could begin:
/// the response carries no data at all.
#[derive(Debug, Clone)]
pub(crate) struct RequestError {
    pub(crate) message: String,
    pub(crate) location: Option<SourceSpan>,
    pub(crate) is_suspected_validation_bug: bool,
}

impl RequestError {
    pub(crate) fn to_graphql_error(&self, sources: &SourceMap) -> GraphQLError {
        let mut error = GraphQLError::new(&self.message, self.location, sources);
        if self.is_suspected_validation_bug {
            error
                .extensions
                .insert(SUSPECTED_VALIDATION_BUG, JsonValue::Bool(true));
        }
        error
    }
}

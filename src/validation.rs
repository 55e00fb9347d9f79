use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonValue;

use crate::path::path_to_vec;
use crate::path::LinkedPath;

/// Marks errors in response [`extensions`][GraphQLError::extensions] that an
/// execution engine with valid inputs should never emit.
///
/// The engine takes `Valid<Schema>` and `Valid<ExecutableDocument>`, so broken
/// invariants (unknown types, malformed const values, missing fragments) point
/// at a validation bug rather than a bad request. They are still reported as
/// errors instead of panicking, tagged so they can be told apart.
pub const SUSPECTED_VALIDATION_BUG: &str = "APOLLO_SUSPECTED_VALIDATION_BUG";

#[derive(Debug, Clone)]
pub(crate) struct SuspectedValidationBug {
    pub(crate) message: String,
    pub(crate) location: Option<SourceSpan>,
}

impl SuspectedValidationBug {
    pub(crate) fn into_field_error(
        self,
        sources: &SourceMap,
        path: LinkedPath<'_>,
    ) -> GraphQLError {
        let Self { message, location } = self;
        let mut err = GraphQLError::new(message, location, sources);
        err.path = path_to_vec(path);
        err.extensions
            .insert(SUSPECTED_VALIDATION_BUG, JsonValue::Bool(true));
        err
    }
}

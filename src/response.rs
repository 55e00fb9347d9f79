use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use serde::Serialize;
use typed_builder::TypedBuilder;

/// The response to a GraphQL operation, excluding `@defer`/`@stream` patches.
///
/// Follows the response format from the GraphQL specification:
/// field errors leave `data` present (possibly `Some(JsonValue::Null)` after
/// null propagation reaches the root), while request errors leave it `None`
/// so the serialized response has no `data` entry at all.
#[derive(Clone, Debug, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(setter(into)))]
pub struct Response {
    /// The errors encountered, in the order they were reported.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    #[builder(default)]
    pub errors: Vec<GraphQLError>,

    /// The response data. `None` for a request error, before execution began.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default)]
    pub data: Option<JsonValue>,

    /// The optional response extensions.
    #[serde(skip_serializing_if = "JsonMap::is_empty", default)]
    #[builder(default)]
    pub extensions: JsonMap,
}

impl Response {
    /// A response for an error raised before execution of the operation could
    /// begin, such as variable coercion failure: no `data` entry at all.
    pub(crate) fn from_request_errors(errors: Vec<GraphQLError>) -> Self {
        Self::builder().errors(errors).build()
    }
}

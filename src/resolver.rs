use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Operation;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Schema;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;
use futures::StreamExt;

use crate::path::path_to_vec;
use crate::path::LinkedPath;

/// A GraphQL object value whose fields are computed on demand by a [`Resolver`].
pub type ObjectValue<'a> = dyn Resolver + 'a;

/// Abstraction for implementing GraphQL object values whose fields are
/// produced by Rust code.
///
/// Use the [`impl_resolver!`][crate::impl_resolver] macro for less boilerplate
/// when fields do not need to inspect [`ResolveInfo`] beyond their arguments,
/// or [`JsonResolver`] for objects backed by plain JSON data.
pub trait Resolver: Send + Sync {
    /// The name of the concrete object type this value implements, if known.
    ///
    /// Used to resolve interface and union types to a concrete type, and to
    /// answer `__typename` on abstract positions. Values that can only appear
    /// in positions with a concrete object type may leave the default `None`.
    fn type_name(&self) -> Option<&str> {
        None
    }

    /// Whether this value is of the given object type, if that can be decided.
    ///
    /// Only consulted for abstract-typed positions when [`type_name`][Self::type_name]
    /// returns `None`: the possible object types are tried in declaration order,
    /// member order for a union and schema order of the implementers for an
    /// interface, and the first `Some(true)` wins.
    fn is_type_of(&self, type_name: &str) -> Option<bool> {
        let _ = type_name;
        None
    }

    /// Returns the value of the field named in `info`.
    ///
    /// Errors cause that field to be `null` in the response data,
    /// and a corresponding entry to be added to response errors.
    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError>;

    /// Returns the source event stream for a subscription root field.
    ///
    /// The returned value must be [`ResolvedValue::Stream`] (possibly behind
    /// [`ResolvedValue::Pending`]); anything else fails the subscription.
    /// Unlike [`resolve_field`][Self::resolve_field] the result may only
    /// borrow from `self`, so that the stream can outlive the setup work.
    fn subscribe_field<'a>(
        &'a self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        let _ = arguments;
        Err(FieldError::new(format!(
            "field '{field_name}' does not support subscription"
        )))
    }
}

/// Optional hook for resolving abstract (interface or union) types to a
/// concrete object type, overriding the default
/// [`type_name`][Resolver::type_name] / [`is_type_of`][Resolver::is_type_of]
/// protocol for every abstract-typed position of an execution.
pub trait TypeResolver: Send + Sync {
    /// Returns the name of the concrete object type for `value`,
    /// or `None` if that cannot be determined.
    fn resolve_type(&self, value: &ObjectValue<'_>, abstract_type_name: &str) -> Option<String>;
}

/// Error returned by [`Resolver`] methods: the field is reported as failed
/// in response errors, with this message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Everything a [`Resolver`] may want to know about the field being resolved.
pub struct ResolveInfo<'a> {
    pub(crate) schema: &'a Valid<Schema>,
    pub(crate) document: &'a Valid<ExecutableDocument>,
    pub(crate) operation: &'a Operation,
    pub(crate) parent_type_name: &'a Name,
    pub(crate) field_definition: &'a FieldDefinition,
    pub(crate) fields: &'a [&'a Field],
    pub(crate) path: LinkedPath<'a>,
    pub(crate) arguments: &'a JsonMap,
    pub(crate) variable_values: &'a JsonMap,
}

impl<'a> ResolveInfo<'a> {
    pub fn schema(&self) -> &'a Valid<Schema> {
        self.schema
    }

    pub fn document(&self) -> &'a Valid<ExecutableDocument> {
        self.document
    }

    /// The operation being executed.
    pub fn operation(&self) -> &'a Operation {
        self.operation
    }

    /// The name of the object type the field belongs to.
    pub fn parent_type_name(&self) -> &'a Name {
        self.parent_type_name
    }

    /// The definition of the field in the schema.
    pub fn field_definition(&self) -> &'a FieldDefinition {
        self.field_definition
    }

    /// The name of the field being resolved.
    pub fn field_name(&self) -> &'a str {
        self.field_definition.name.as_str()
    }

    /// The merged field selections for this response key, in document order.
    /// Always non-empty; they all name the same field.
    pub fn fields(&self) -> &'a [&'a Field] {
        self.fields
    }

    /// Argument values, coerced against the field definition.
    /// Does not include arguments absent from both the field and the
    /// definition's defaults.
    pub fn arguments(&self) -> &'a JsonMap {
        self.arguments
    }

    /// Coerced variable values for the whole operation.
    pub fn variable_values(&self) -> &'a JsonMap {
        self.variable_values
    }

    /// The response path of the field, root first.
    pub fn response_path(&self) -> Vec<ResponseDataPathSegment> {
        path_to_vec(self.path)
    }
}

/// The value of a resolved field, to be coerced against the field type.
pub enum ResolvedValue<'a> {
    /// * JSON null represents GraphQL null
    /// * A GraphQL enum value is represented as a JSON string
    /// * GraphQL built-in scalars are coerced according to their respective
    ///   *Result Coercion* spec
    /// * For custom scalars, any JSON value is passed through as-is
    ///   (including array or object)
    Leaf(JsonValue),

    /// Expected where the GraphQL type is an object, interface, or union type
    Object(Box<ObjectValue<'a>>),

    /// Expected for GraphQL lists; errors in items fail only that item
    List(Box<dyn Iterator<Item = Result<ResolvedValue<'a>, FieldError>> + Send + 'a>),

    /// A value that is not available yet: execution of this field suspends
    /// until the future settles, while sibling fields make progress.
    Pending(BoxFuture<'a, Result<ResolvedValue<'a>, FieldError>>),

    /// A source event stream, only valid as the result of
    /// [`Resolver::subscribe_field`] on a subscription root field.
    Stream(BoxStream<'a, Result<ResolvedValue<'a>, FieldError>>),
}

impl<'a> ResolvedValue<'a> {
    /// Construct a GraphQL null leaf value
    pub fn null() -> Self {
        Self::Leaf(JsonValue::Null)
    }

    /// Construct a leaf value from something convertible to JSON
    pub fn leaf(json: impl Into<JsonValue>) -> Self {
        Self::Leaf(json.into())
    }

    /// Construct an object value
    pub fn object(resolver: impl Resolver + 'a) -> Self {
        Self::Object(Box::new(resolver))
    }

    /// Construct an object value or null, from an optional resolver
    pub fn opt_object(opt_resolver: Option<impl Resolver + 'a>) -> Self {
        match opt_resolver {
            Some(resolver) => Self::Object(Box::new(resolver)),
            None => Self::null(),
        }
    }

    /// Construct a list value from an iterator of infallible items
    pub fn list<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        I::IntoIter: Send + 'a,
    {
        Self::List(Box::new(iter.into_iter().map(Ok)))
    }

    /// Construct a list value from an iterator of results, with errors
    /// failing only their respective item
    pub fn try_list<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Result<Self, FieldError>>,
        I::IntoIter: Send + 'a,
    {
        Self::List(Box::new(iter.into_iter()))
    }

    /// Construct a deferred value from a future
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<Self, FieldError>> + Send + 'a,
    {
        Self::Pending(future.boxed())
    }

    /// Construct a source event stream for a subscription root field
    pub fn stream<S>(stream: S) -> Self
    where
        S: futures::Stream<Item = Result<Self, FieldError>> + Send + 'a,
    {
        Self::Stream(stream.boxed())
    }
}

/// A [`Resolver`] for object values backed by plain JSON data:
/// each field resolves to the value at the corresponding key, with nested
/// objects and arrays wrapped in further `JsonResolver`s.
///
/// Fields absent from the data resolve to null. The concrete type of a nested
/// object is taken from its `"__typename"` property when present, otherwise
/// from the field definition's named type.
pub struct JsonResolver<'a> {
    type_name: Option<&'a str>,
    object: &'a JsonMap,
}

impl<'a> JsonResolver<'a> {
    pub fn new(object: &'a JsonMap) -> Self {
        Self {
            type_name: None,
            object,
        }
    }

    /// Like [`new`][Self::new], but with an explicit concrete type name
    /// taking precedence over any `"__typename"` property.
    pub fn with_type_name(type_name: &'a str, object: &'a JsonMap) -> Self {
        Self {
            type_name: Some(type_name),
            object,
        }
    }
}

impl Resolver for JsonResolver<'_> {
    fn type_name(&self) -> Option<&str> {
        self.type_name
            .or_else(|| self.object.get("__typename")?.as_str())
    }

    fn is_type_of(&self, type_name: &str) -> Option<bool> {
        Some(self.type_name()? == type_name)
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match self.object.get(info.field_name()) {
            None => Ok(ResolvedValue::null()),
            Some(value) => {
                let field_type_name = info.field_definition().ty.inner_named_type().as_str();
                Ok(resolve_json_value(value, field_type_name))
            }
        }
    }

    fn subscribe_field<'a>(
        &'a self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        // Never a stream, so subscriptions on JSON data fail downstream
        // with the designated "did not return an event stream" error.
        match self.object.get(field_name) {
            None => Ok(ResolvedValue::null()),
            // The field definition is out of reach here, so objects without
            // an explicit `__typename` key get an empty type name.
            Some(value) => Ok(resolve_json_value(value, "")),
        }
    }
}

fn resolve_json_value<'a>(value: &'a JsonValue, field_type_name: &'a str) -> ResolvedValue<'a> {
    match value {
        JsonValue::Object(object) => {
            let type_name = object
                .get("__typename")
                .and_then(|value| value.as_str())
                .unwrap_or(field_type_name);
            ResolvedValue::object(JsonResolver::with_type_name(type_name, object))
        }
        JsonValue::Array(values) => ResolvedValue::List(Box::new(
            values
                .iter()
                .map(move |value| Ok(resolve_json_value(value, field_type_name))),
        )),
        _ => ResolvedValue::Leaf(value.clone()),
    }
}

/// Implement the [`Resolver`] trait with reduced boilerplate.
///
/// Example:
///
/// ```rust
/// use graphql_execution::ResolvedValue;
///
/// struct Query;
///
/// graphql_execution::impl_resolver! {
///     for Query:
///
///     __typename = "Query";
///
///     fn favorite(&self_) {
///         Ok(ResolvedValue::leaf("green"))
///     }
///
///     fn add(&self_, arguments) {
///         let a = arguments.get("a").and_then(|v| v.as_i64()).unwrap_or_default();
///         let b = arguments.get("b").and_then(|v| v.as_i64()).unwrap_or_default();
///         Ok(ResolvedValue::leaf(a + b))
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_resolver {
    (
        for $implementor: ty:
        __typename = $type_name: expr;
        $(
            fn $field_name: ident(
                $( &$self_: ident $(, $arguments: ident)? $(,)? )?
            ) $block: block
        )*
    ) => {
        impl $crate::Resolver for $implementor {
            fn type_name(&self) -> Option<&str> {
                Some($type_name)
            }

            fn is_type_of(&self, type_name: &str) -> Option<bool> {
                Some($type_name == type_name)
            }

            fn resolve_field<'a>(
                &'a self,
                info: &'a $crate::ResolveInfo<'a>,
            ) -> Result<$crate::ResolvedValue<'a>, $crate::FieldError> {
                match info.field_name() {
                    $(
                        stringify!($field_name) => {
                            $(
                                let $self_ = self;
                                $( let $arguments = info.arguments(); )?
                            )?
                            return $block
                        }
                    )*
                    other => Err($crate::FieldError::new(format!(
                        "unexpected field name: {other} in type {}",
                        $type_name,
                    ))),
                }
            }
        }
    };
}

use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Schema;
use futures::StreamExt;
use graphql_execution::Execution;
use graphql_execution::FieldError;
use graphql_execution::JsonResolver;
use graphql_execution::NotSynchronous;
use graphql_execution::ObjectValue;
use graphql_execution::ResolveInfo;
use graphql_execution::ResolvedValue;
use graphql_execution::Resolver;
use graphql_execution::Response;
use graphql_execution::TypeResolver;
use serde_json::json;

const SDL: &str = r#"
    type Query {
        hello: String
        slow: String
        fail: String
        crash: String!
        user: User
        required: User!
        users: [User!]
        numbers: [Int]
        strict: [Int!]
        add(a: Int!, b: Int = 1): Int
        color(c: Color): Color
        echo(point: PointInput): Json
        pet: Pet
        mystery: Pet
        chameleon: Pet
        named: Named
    }

    type Mutation {
        step(n: Int!): Int
        failing: Int!
    }

    type Subscription {
        countdown(from: Int!): Int!
        stuck: Int!
    }

    type User {
        id: ID!
        name: String
        email: String
    }

    interface Named {
        name: String
    }

    type Cat implements Named {
        name: String
        meows: Boolean
    }

    type Dog implements Named {
        name: String
        barks: Boolean
    }

    union Pet = Dog | Cat

    enum Color {
        RED
        GREEN
        BLUE
    }

    input PointInput {
        x: Int!
        y: Int!
        label: String = "p"
    }

    scalar Json
"#;

fn parse(query: &str) -> (Valid<Schema>, Valid<ExecutableDocument>) {
    let schema = Schema::parse_and_validate(SDL, "schema.graphql").unwrap();
    let document =
        ExecutableDocument::parse_and_validate(&schema, query, "query.graphql").unwrap();
    (schema, document)
}

fn variables(value: serde_json_bytes::Value) -> JsonMap {
    match value {
        serde_json_bytes::Value::Object(map) => map,
        _ => panic!("variables must be a JSON object"),
    }
}

fn to_json(response: &Response) -> serde_json::Value {
    serde_json::to_value(response).unwrap()
}

fn error_path(error: &GraphQLError) -> Vec<String> {
    error
        .path
        .iter()
        .map(|segment| match segment {
            ResponseDataPathSegment::Field(name) => name.to_string(),
            ResponseDataPathSegment::ListIndex(index) => index.to_string(),
        })
        .collect()
}

struct QueryRoot;

graphql_execution::impl_resolver! {
    for QueryRoot:

    __typename = "Query";

    fn hello() {
        Ok(ResolvedValue::leaf("world"))
    }

    fn slow() {
        Ok(ResolvedValue::pending(async {
            Ok(ResolvedValue::leaf("eventually"))
        }))
    }

    fn fail() {
        Err(FieldError::new("boom"))
    }

    fn crash() {
        Err(FieldError::new("hard boom"))
    }

    fn user() {
        Ok(ResolvedValue::object(alice()))
    }

    fn required() {
        Ok(ResolvedValue::object(UserValue {
            id: None,
            name: Some("Nobody"),
            email: None,
        }))
    }

    fn users() {
        Ok(ResolvedValue::list(
            [alice(), bob()].into_iter().map(ResolvedValue::object),
        ))
    }

    fn numbers() {
        Ok(ResolvedValue::list([
            ResolvedValue::leaf(1),
            ResolvedValue::null(),
            ResolvedValue::leaf(3),
        ]))
    }

    fn strict() {
        Ok(ResolvedValue::list([
            ResolvedValue::leaf(1),
            ResolvedValue::null(),
            ResolvedValue::leaf(3),
        ]))
    }

    fn add(&self_, arguments) {
        let _ = self_;
        let a = arguments.get("a").and_then(|v| v.as_i64()).unwrap_or_default();
        let b = arguments.get("b").and_then(|v| v.as_i64()).unwrap_or_default();
        Ok(ResolvedValue::leaf(a + b))
    }

    fn color(&self_, arguments) {
        let _ = self_;
        Ok(ResolvedValue::Leaf(
            arguments.get("c").cloned().unwrap_or(JsonValue::Null),
        ))
    }

    fn echo(&self_, arguments) {
        let _ = self_;
        Ok(ResolvedValue::Leaf(
            arguments.get("point").cloned().unwrap_or(JsonValue::Null),
        ))
    }

    fn pet() {
        Ok(ResolvedValue::object(DogValue))
    }

    fn mystery() {
        Ok(ResolvedValue::object(MysteryPet))
    }

    fn chameleon() {
        Ok(ResolvedValue::object(EagerPet))
    }

    fn named() {
        Ok(ResolvedValue::object(CatValue))
    }
}

#[derive(Clone)]
struct UserValue {
    id: Option<&'static str>,
    name: Option<&'static str>,
    email: Option<&'static str>,
}

fn alice() -> UserValue {
    UserValue {
        id: Some("1"),
        name: Some("Alice"),
        email: Some("alice@example.com"),
    }
}

fn bob() -> UserValue {
    UserValue {
        id: Some("2"),
        name: Some("Bob"),
        email: None,
    }
}

fn opt_leaf<'a>(value: Option<&'static str>) -> ResolvedValue<'a> {
    match value {
        Some(value) => ResolvedValue::leaf(value),
        None => ResolvedValue::null(),
    }
}

graphql_execution::impl_resolver! {
    for UserValue:

    __typename = "User";

    fn id(&self_) {
        Ok(opt_leaf(self_.id))
    }

    fn name(&self_) {
        Ok(opt_leaf(self_.name))
    }

    fn email(&self_) {
        Ok(opt_leaf(self_.email))
    }
}

struct DogValue;

graphql_execution::impl_resolver! {
    for DogValue:

    __typename = "Dog";

    fn name() {
        Ok(ResolvedValue::leaf("Rex"))
    }

    fn barks() {
        Ok(ResolvedValue::leaf(true))
    }
}

struct CatValue;

graphql_execution::impl_resolver! {
    for CatValue:

    __typename = "Cat";

    fn name() {
        Ok(ResolvedValue::leaf("Whiskers"))
    }

    fn meows() {
        Ok(ResolvedValue::leaf(true))
    }
}

/// A value that cannot name its own type, for exercising the
/// execution-wide [`TypeResolver`] hook.
struct MysteryPet;

impl Resolver for MysteryPet {
    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match info.field_name() {
            "name" => Ok(ResolvedValue::leaf("Rex")),
            "barks" => Ok(ResolvedValue::leaf(true)),
            other => Err(FieldError::new(format!("unexpected field name {other:?}"))),
        }
    }
}

/// A value that claims to be whichever object type it is asked about.
struct EagerPet;

impl Resolver for EagerPet {
    fn is_type_of(&self, _type_name: &str) -> Option<bool> {
        Some(true)
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match info.field_name() {
            "name" => Ok(ResolvedValue::leaf("Loki")),
            "barks" => Ok(ResolvedValue::leaf(true)),
            "meows" => Ok(ResolvedValue::leaf(true)),
            other => Err(FieldError::new(format!("unexpected field name {other:?}"))),
        }
    }
}

struct PetTypeResolver;

impl TypeResolver for PetTypeResolver {
    fn resolve_type(
        &self,
        _value: &ObjectValue<'_>,
        abstract_type_name: &str,
    ) -> Option<String> {
        (abstract_type_name == "Pet").then(|| "Dog".to_owned())
    }
}

#[derive(Default)]
struct MutationRoot {
    log: std::sync::Mutex<Vec<i64>>,
}

graphql_execution::impl_resolver! {
    for MutationRoot:

    __typename = "Mutation";

    fn step(&self_, arguments) {
        let n = arguments.get("n").and_then(|v| v.as_i64()).unwrap_or_default();
        self_.log.lock().unwrap().push(n);
        Ok(ResolvedValue::leaf(n))
    }

    fn failing() {
        Err(FieldError::new("mutation failed"))
    }
}

struct SubscriptionRoot;

impl Resolver for SubscriptionRoot {
    fn type_name(&self) -> Option<&str> {
        Some("Subscription")
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        Err(FieldError::new(format!(
            "field '{}' can only be subscribed to",
            info.field_name()
        )))
    }

    fn subscribe_field<'a>(
        &'a self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match field_name {
            "countdown" => {
                let from = arguments
                    .get("from")
                    .and_then(|v| v.as_i64())
                    .unwrap_or_default();
                Ok(ResolvedValue::stream(futures::stream::iter(
                    (0..=from).rev().map(|i| Ok(ResolvedValue::leaf(i))),
                )))
            }
            "stuck" => Ok(ResolvedValue::leaf(1)),
            other => Err(FieldError::new(format!(
                "unexpected subscription field name {other:?}"
            ))),
        }
    }
}

#[tokio::test]
async fn query_fields_and_aliases() {
    let (schema, document) = parse("{ greeting: hello hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"greeting": "world", "hello": "world"}})
    );
}

#[test]
fn synchronous_execution() {
    let (schema, document) = parse("{ hello }");
    let response = Execution::new(&schema, &document)
        .execute_sync(&QueryRoot)
        .unwrap();
    assert_eq!(to_json(&response), json!({"data": {"hello": "world"}}));
}

#[test]
fn pending_resolver_is_not_synchronous() {
    // The future behind `slow` is ready on the first poll, but a resolver
    // that suspends at all disqualifies synchronous execution.
    let (schema, document) = parse("{ slow }");
    let result = Execution::new(&schema, &document).execute_sync(&QueryRoot);
    assert_eq!(result.err(), Some(NotSynchronous));
}

#[tokio::test]
async fn pending_resolver_settles() {
    let (schema, document) = parse("{ slow hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"slow": "eventually", "hello": "world"}})
    );
}

#[tokio::test]
async fn response_keys_follow_selection_order() {
    // Comparing `serde_json` values ignores key order, so compare the
    // serialized text: `slow` settles after `hello` but comes first in
    // the selection set, so it must come first in the response.
    let (schema, document) = parse("{ slow hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"slow":"eventually","hello":"world"}}"#
    );
}

#[tokio::test]
async fn merged_fields_and_named_fragments() {
    let (schema, document) = parse(
        "query { user { id } user { ...Names } }
         fragment Names on User { name }",
    );
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"user": {"id": "1", "name": "Alice"}}})
    );
}

#[tokio::test]
async fn typename_meta_field() {
    let (schema, document) = parse("{ kind: __typename user { __typename } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"kind": "Query", "user": {"__typename": "User"}}})
    );
}

#[tokio::test]
async fn skip_and_include_directives() {
    let (schema, document) = parse(
        "query($yes: Boolean!, $no: Boolean!) {
            a: hello @skip(if: $yes)
            b: hello @skip(if: $no)
            c: hello @include(if: $no)
            d: hello @skip(if: true) @include(if: true)
            e: hello @skip(if: false) @include(if: true)
        }",
    );
    let vars = variables(serde_json_bytes::json!({"yes": true, "no": false}));
    let response = Execution::new(&schema, &document)
        .raw_variable_values(&vars)
        .execute(&QueryRoot)
        .await;
    // @skip wins over @include, and excluded fields leave no response key.
    assert_eq!(
        to_json(&response),
        json!({"data": {"b": "world", "e": "world"}})
    );
}

#[tokio::test]
async fn argument_defaults() {
    let (schema, document) = parse("{ three: add(a: 2) seven: add(a: 3, b: 4) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"three": 3, "seven": 7}})
    );
}

#[tokio::test]
async fn unset_variable_falls_back_to_argument_default() {
    let (schema, document) = parse("query($b: Int) { add(a: 1, b: $b) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(to_json(&response), json!({"data": {"add": 2}}));
}

#[tokio::test]
async fn variable_default_value() {
    let (schema, document) = parse("query($x: Int = 5) { add(a: $x) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(to_json(&response), json!({"data": {"add": 6}}));
}

#[tokio::test]
async fn enum_argument_round_trips() {
    let (schema, document) = parse("{ color(c: GREEN) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(to_json(&response), json!({"data": {"color": "GREEN"}}));
}

#[tokio::test]
async fn input_object_literal_applies_field_defaults() {
    let (schema, document) = parse("{ echo(point: {x: 1, y: 2}) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"echo": {"x": 1, "y": 2, "label": "p"}}})
    );
}

#[tokio::test]
async fn input_object_variable_coercion() {
    let (schema, document) = parse("query($p: PointInput!) { echo(point: $p) }");
    let vars = variables(serde_json_bytes::json!({"p": {"x": 1, "y": 2}}));
    let response = Execution::new(&schema, &document)
        .raw_variable_values(&vars)
        .execute(&QueryRoot)
        .await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"echo": {"x": 1, "y": 2, "label": "p"}}})
    );
}

#[tokio::test]
async fn missing_required_variable_is_a_request_error() {
    let (schema, document) = parse("query($x: Int!) { add(a: $x) }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Variable \"$x\" of required type \"Int!\" was not provided."
    );
    // A request error serializes without any `data` entry at all.
    assert!(to_json(&response).get("data").is_none());
}

#[tokio::test]
async fn invalid_variable_value_is_a_request_error() {
    let (schema, document) = parse("query($x: Int!) { add(a: $x) }");
    let vars = variables(serde_json_bytes::json!({"x": "nope"}));
    let response = Execution::new(&schema, &document)
        .raw_variable_values(&vars)
        .execute(&QueryRoot)
        .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Variable \"$x\" got invalid value at \"x\": \
         expected type \"Int!\", found \"nope\""
    );
}

#[tokio::test]
async fn misspelled_enum_variable_gets_a_suggestion() {
    let (schema, document) = parse("query($c: Color) { color(c: $c) }");
    let vars = variables(serde_json_bytes::json!({"c": "GREN"}));
    let response = Execution::new(&schema, &document)
        .raw_variable_values(&vars)
        .execute(&QueryRoot)
        .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Variable \"$c\" got invalid value at \"c\": \
         value \"GREN\" does not exist in \"Color\" enum. \
         Did you mean \"GREEN\" or \"RED\"?"
    );
}

#[tokio::test]
async fn variable_error_limit_aborts_coercion() {
    let (schema, document) = parse(
        "query($a: Int!, $b: Int!) { x: add(a: $a) y: add(a: $b) }",
    );
    let vars = variables(serde_json_bytes::json!({"a": "bad", "b": "bad"}));
    let response = Execution::new(&schema, &document)
        .raw_variable_values(&vars)
        .max_coercion_errors(1)
        .execute(&QueryRoot)
        .await;
    assert_eq!(response.errors.len(), 2);
    assert_eq!(
        response.errors[1].message,
        "Too many errors processing variables, error limit reached. Execution aborted."
    );
}

#[tokio::test]
async fn resolver_errors_are_isolated() {
    let (schema, document) = parse("{ fail hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        serde_json::to_value(&response.data).unwrap(),
        json!({"fail": null, "hello": "world"})
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "resolver error: boom");
    assert_eq!(error_path(&response.errors[0]), ["fail"]);
}

#[test_log::test(tokio::test)]
async fn non_null_field_error_propagates_to_root() {
    let (schema, document) = parse("{ crash hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(to_json(&response)["data"], json!(null));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "resolver error: hard boom");
    assert_eq!(error_path(&response.errors[0]), ["crash"]);
}

#[test_log::test(tokio::test)]
async fn null_propagates_through_non_null_chain() {
    let (schema, document) = parse("{ required { id name } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(to_json(&response)["data"], json!(null));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Non-null type ID! resolved to null"
    );
    assert_eq!(error_path(&response.errors[0]), ["required", "id"]);
}

#[tokio::test]
async fn nullable_list_items_stay_null() {
    let (schema, document) = parse("{ numbers }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"numbers": [1, null, 3]}})
    );
}

#[tokio::test]
async fn null_list_item_nullifies_the_whole_list() {
    let (schema, document) = parse("{ strict hello }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        serde_json::to_value(&response.data).unwrap(),
        json!({"strict": null, "hello": "world"})
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Non-null type Int! resolved to null"
    );
    assert_eq!(error_path(&response.errors[0]), ["strict", "1"]);
}

#[tokio::test]
async fn object_list_completion() {
    let (schema, document) = parse("{ users { id name email } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"users": [
            {"id": "1", "name": "Alice", "email": "alice@example.com"},
            {"id": "2", "name": "Bob", "email": null},
        ]}})
    );
}

#[tokio::test]
async fn union_resolution_with_inline_fragments() {
    let (schema, document) = parse(
        "{ pet { __typename ... on Dog { barks } ... on Cat { meows } } }",
    );
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"pet": {"__typename": "Dog", "barks": true}}})
    );
}

#[tokio::test]
async fn interface_resolution() {
    let (schema, document) = parse("{ named { name ... on Cat { meows } } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"named": {"name": "Whiskers", "meows": true}}})
    );
}

#[tokio::test]
async fn is_type_of_probes_union_members_in_declaration_order() {
    // Cat is declared before Dog in the schema, but `union Pet = Dog | Cat`
    // lists Dog first. A value that answers yes to every candidate must
    // resolve to the first union member, not the first matching schema type.
    let (schema, document) = parse("{ chameleon { __typename } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"chameleon": {"__typename": "Dog"}}})
    );
}

#[tokio::test]
async fn type_resolver_hook_takes_precedence() {
    let (schema, document) = parse("{ mystery { ... on Dog { barks } } }");
    let response = Execution::new(&schema, &document)
        .type_resolver(&PetTypeResolver)
        .execute(&QueryRoot)
        .await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"mystery": {"barks": true}}})
    );
}

#[tokio::test]
async fn unresolvable_abstract_type_is_a_field_error() {
    let (schema, document) = parse("{ mystery { ... on Dog { barks } } }");
    let response = Execution::new(&schema, &document).execute(&QueryRoot).await;
    assert_eq!(
        serde_json::to_value(&response.data).unwrap(),
        json!({"mystery": null})
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Abstract type Pet must be resolved to an object type at runtime"
    );
}

#[tokio::test]
async fn operation_name_selects_the_operation() {
    let (schema, document) = parse("query First { hello } query Second { add(a: 1) }");
    let response = Execution::new(&schema, &document)
        .operation_name("Second")
        .execute(&QueryRoot)
        .await;
    assert_eq!(to_json(&response), json!({"data": {"add": 2}}));
}

#[tokio::test]
async fn mutation_fields_run_serially_and_abort_on_error() {
    let (schema, document) = parse("mutation { a: step(n: 1) failing c: step(n: 3) }");
    let root = MutationRoot::default();
    let response = Execution::new(&schema, &document).execute(&root).await;
    assert_eq!(to_json(&response)["data"], json!(null));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(error_path(&response.errors[0]), ["failing"]);
    // The field after the failing one never ran.
    assert_eq!(*root.log.lock().unwrap(), [1]);
}

#[tokio::test]
async fn json_backed_resolver() {
    let (schema, document) = parse("{ hello user { id name } }");
    let data = variables(serde_json_bytes::json!({
        "hello": "world",
        "user": {"id": "1", "name": "Alice"},
    }));
    let root = JsonResolver::new(&data);
    let response = Execution::new(&schema, &document).execute(&root).await;
    assert_eq!(
        to_json(&response),
        json!({"data": {"hello": "world", "user": {"id": "1", "name": "Alice"}}})
    );
}

#[tokio::test]
async fn subscription_produces_a_source_event_stream() {
    let (schema, document) = parse("subscription { countdown(from: 2) }");
    let mut stream = Execution::new(&schema, &document)
        .source_event_stream(&SubscriptionRoot)
        .await
        .unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        match event.unwrap() {
            ResolvedValue::Leaf(value) => events.push(value),
            _ => panic!("expected leaf events"),
        }
    }
    assert_eq!(
        events,
        [JsonValue::from(2), JsonValue::from(1), JsonValue::from(0)]
    );
}

#[tokio::test]
async fn subscription_field_must_return_a_stream() {
    let (schema, document) = parse("subscription { stuck }");
    let result = Execution::new(&schema, &document)
        .source_event_stream(&SubscriptionRoot)
        .await;
    let Err(response) = result else {
        panic!("expected the subscription setup to fail")
    };
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Subscription field \"stuck\" did not resolve to an event stream."
    );
}

#[tokio::test]
async fn subscriptions_cannot_be_executed_directly() {
    let (schema, document) = parse("subscription { countdown(from: 1) }");
    let response = Execution::new(&schema, &document)
        .execute(&SubscriptionRoot)
        .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Subscription operations must be executed as a source event stream."
    );
}

#[tokio::test]
async fn queries_do_not_produce_source_event_streams() {
    let (schema, document) = parse("{ hello }");
    let result = Execution::new(&schema, &document)
        .source_event_stream(&QueryRoot)
        .await;
    let Err(response) = result else {
        panic!("expected an error response for a query operation")
    };
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Source event streams are only produced by subscription operations."
    );
}

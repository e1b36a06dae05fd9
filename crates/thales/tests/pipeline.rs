//! Binding, validation, projection and error classification end to end.

mod common;

use common::client;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thales::prelude::*;

#[derive(Debug, Default, Serialize, Deserialize)]
struct GetUser {
    user_id: String,
    page: Option<u32>,
    tenant: Option<String>,
}

impl Schema for GetUser {
    fn describe(schema: &mut SchemaBuilder) {
        schema.path::<String>("user_id", "id");
        schema.query::<Option<u32>>("page", "page");
        schema.header::<Option<String>>("tenant", "X-Tenant");
    }
}

impl Validate for GetUser {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        if let Some(page) = self.page {
            v.require(page >= 1, "page", "must be at least 1");
        }
        v.into_result()
    }
}

#[derive(Debug, Serialize)]
struct User {
    id: String,
    page: u32,
    tenant: Option<String>,
    etag: String,
}

impl Schema for User {
    fn describe(schema: &mut SchemaBuilder) {
        schema.header::<String>("etag", "ETag");
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.require(!self.id.is_empty(), "id", "is required");
        v.into_result()
    }
}

async fn get_user(_ctx: RequestContext, req: GetUser) -> Result<User, HandlerError> {
    Ok(User {
        etag: format!("\"{}\"", req.user_id),
        id: req.user_id,
        page: req.page.unwrap_or(1),
        tenant: req.tenant,
    })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CreateUser {
    name: String,
}

impl Schema for CreateUser {}

impl Validate for CreateUser {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.require(!self.name.is_empty(), "name", "is required");
        v.into_result()
    }
}

#[derive(Debug, Serialize)]
struct UserCreated {
    id: String,
    name: String,
    location: String,
}

impl Schema for UserCreated {
    fn describe(schema: &mut SchemaBuilder) {
        schema.status(201);
        schema.header::<String>("location", "Location");
    }
}

impl Validate for UserCreated {}

async fn create_user(_ctx: RequestContext, req: CreateUser) -> Result<UserCreated, HandlerError> {
    Ok(UserCreated {
        id: "7".into(),
        name: req.name,
        location: "/users/7".into(),
    })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DeleteUser {
    user_id: String,
}

impl Schema for DeleteUser {
    fn describe(schema: &mut SchemaBuilder) {
        schema.path::<String>("user_id", "id");
    }
}

impl Validate for DeleteUser {}

fn users() -> Router {
    let root = Router::new();
    root.get("/users/{id}", get_user).unwrap();
    root.post("/users", create_user).unwrap();
    root.delete("/users/{id}", |_ctx: RequestContext, _req: DeleteUser| async {
        Ok::<_, HandlerError>(NoContent::default())
    })
    .unwrap();
    root.get("/broken", |_ctx: RequestContext, _req: Empty| async {
        Ok::<_, HandlerError>(User {
            id: String::new(),
            page: 1,
            tenant: None,
            etag: String::new(),
        })
    })
    .unwrap();
    root
}

#[tokio::test]
async fn test_binds_path_query_and_header() {
    let res = client(&users())
        .get("/users/123?page=2")
        .header("X-Tenant", "acme")
        .send()
        .await;

    res.assert_status_code(200)
        .assert_content_type("application/json")
        .assert_header("etag", "\"123\"")
        .assert_json_eq(&json!({"id": "123", "page": 2, "tenant": "acme"}));
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ListUsers {
    page: i64,
    filter: String,
}

impl Schema for ListUsers {
    fn describe(schema: &mut SchemaBuilder) {
        schema.query::<i64>("page", "page");
    }
}

impl Validate for ListUsers {}

#[derive(Debug, Serialize)]
struct UserPage {
    page: i64,
    filter: String,
}

impl Schema for UserPage {}
impl Validate for UserPage {}

#[tokio::test]
async fn test_absent_query_binds_zero_value() {
    let root = Router::new();
    root.get("/users", |_ctx: RequestContext, req: ListUsers| async move {
        Ok::<_, HandlerError>(UserPage {
            page: req.page,
            filter: req.filter,
        })
    })
    .unwrap();
    let client = client(&root);

    client
        .get("/users")
        .send()
        .await
        .assert_status_code(200)
        .assert_json_eq(&json!({"page": 0, "filter": ""}));
    client
        .get("/users?page=")
        .send()
        .await
        .assert_json_eq(&json!({"page": 0, "filter": ""}));
}

#[tokio::test]
async fn test_request_validation_rejects_zero_page() {
    client(&users())
        .get("/users/123?page=0")
        .send()
        .await
        .assert_status_code(400)
        .assert_content_type("text/plain")
        .assert_body_contains("validation_error: request validation failed");
}

#[tokio::test]
async fn test_unparsable_query_is_parse_error() {
    client(&users())
        .get("/users/123?page=abc")
        .send()
        .await
        .assert_status_code(400)
        .assert_body_contains("parse_error: invalid query parameter 'page'");
}

#[tokio::test]
async fn test_created_status_and_location() {
    client(&users())
        .post("/users")
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .assert_status_code(201)
        .assert_header("location", "/users/7")
        .assert_json_eq(&json!({"id": "7", "name": "Ada"}));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    client(&users())
        .post("/users")
        .content_type("application/json")
        .body("{\"name\":")
        .send()
        .await
        .assert_status_code(400)
        .assert_body_contains("parse_error: invalid JSON");
}

#[tokio::test]
async fn test_missing_required_body_field_fails_validation() {
    client(&users())
        .post("/users")
        .json(&json!({}))
        .send()
        .await
        .assert_status_code(400)
        .assert_body_contains("validation_error");
}

#[tokio::test]
async fn test_no_content_has_no_body() {
    client(&users())
        .delete("/users/1")
        .send()
        .await
        .assert_status_code(204)
        .assert_no_header("content-type")
        .assert_empty_body();
}

#[tokio::test]
async fn test_head_served_by_get_route_without_body() {
    client(&users())
        .head("/users/1")
        .send()
        .await
        .assert_status_code(200)
        .assert_header("etag", "\"1\"")
        .assert_empty_body();
}

#[tokio::test]
async fn test_invalid_response_is_server_error() {
    client(&users())
        .get("/broken")
        .send()
        .await
        .assert_status_code(500)
        .assert_body_contains("response_validation_error: response validation failed");
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ErrorBase {
    code: String,
    message: String,
}

impl Schema for ErrorBase {}

#[derive(Debug, Serialize, thiserror::Error)]
#[error("not found: {resource}")]
struct NotFound {
    #[serde(flatten)]
    base: ErrorBase,
    resource: String,
}

impl Schema for NotFound {
    fn describe(schema: &mut SchemaBuilder) {
        schema.status(404);
        schema.embed::<ErrorBase>("base");
        schema.field("resource").omit_empty();
    }
}

impl Validate for NotFound {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.require(!self.base.code.is_empty(), "code", "is required");
        v.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GetThing {
    id: String,
    limit: Option<u8>,
}

impl Schema for GetThing {
    fn describe(schema: &mut SchemaBuilder) {
        schema.path::<String>("id", "id");
        schema.query::<Option<u8>>("limit", "limit");
    }
}

impl Validate for GetThing {}

#[derive(Debug, Serialize)]
struct Thing {
    id: String,
}

impl Schema for Thing {}
impl Validate for Thing {}

async fn get_thing(_ctx: RequestContext, req: GetThing) -> Result<Thing, HandlerError> {
    let code = match req.id.as_str() {
        "missing" => "not_found",
        "bad" => "",
        "broken" => return Err(HandlerError::opaque("storage offline")),
        _ => return Ok(Thing { id: req.id }),
    };
    Err(NotFound {
        base: ErrorBase {
            code: code.into(),
            message: "no such thing".into(),
        },
        resource: String::new(),
    }
    .into())
}

fn declared() -> RouteOptions {
    RouteOptions::new().error::<NotFound>()
}

#[tokio::test]
async fn test_declared_error_is_written_flat() {
    let root = Router::new();
    root.handle(Method::GET, "/things/{id}", get_thing, declared()).unwrap();

    client(&root)
        .get("/things/missing")
        .send()
        .await
        .assert_status_code(404)
        .assert_content_type("application/json")
        .assert_json_eq(&json!({"code": "not_found", "message": "no such thing"}));
}

#[tokio::test]
async fn test_declared_but_invalid_error() {
    let root = Router::new();
    root.handle(Method::GET, "/things/{id}", get_thing, declared()).unwrap();

    client(&root)
        .get("/things/bad")
        .send()
        .await
        .assert_status_code(500)
        .assert_body_contains("error_validation_error");
}

#[tokio::test]
async fn test_strict_mode_rejects_undeclared_error() {
    let root = Router::new();
    root.get("/things/{id}", get_thing).unwrap();

    client(&root)
        .get("/things/missing")
        .send()
        .await
        .assert_status_code(500)
        .assert_body_contains("undeclared_error_type: handler returned undeclared error type");
}

#[tokio::test]
async fn test_lenient_mount_writes_undeclared_error() {
    let root = Router::new();
    let lenient = root
        .mount("/lenient", MountOptions::new().strict_error_types(false))
        .unwrap();
    lenient.get("/things/{id}", get_thing).unwrap();
    root.get("/things/{id}", get_thing).unwrap();
    let client = client(&root);

    client
        .get("/lenient/things/missing")
        .send()
        .await
        .assert_status_code(404)
        .assert_json_field("code", &json!("not_found"));
    client.get("/things/missing").send().await.assert_status_code(500);
}

#[tokio::test]
async fn test_opaque_error_is_handler_error() {
    let root = Router::new();
    root.handle(Method::GET, "/things/{id}", get_thing, declared()).unwrap();

    client(&root)
        .get("/things/broken")
        .send()
        .await
        .assert_status_code(500)
        .assert_body_eq("handler_error: handler returned an error: storage offline\n");
}

fn json_errors(ex: &mut Exchange, err: Error) {
    let code = err.downcast_source::<NotFound>().map(|nf| nf.base.code.clone());
    let body = json!({"kind": err.kind().as_str(), "code": code});
    let response = ex.response_mut();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
    if response.write_head(err.status_code()) {
        response.write(body.to_string().as_bytes());
    }
}

fn custom() -> Router {
    let root = Router::with_config(
        RouterConfig::new()
            .with_strict_error_types(false)
            .with_error_handler(json_errors),
    );
    root.get("/things/{id}", get_thing).unwrap();
    root.handle(Method::GET, "/declared/{id}", get_thing, declared())
        .unwrap();
    root
}

#[tokio::test]
async fn test_error_handler_receives_undeclared_typed_error() {
    client(&custom())
        .get("/things/missing")
        .send()
        .await
        .assert_status_code(500)
        .assert_content_type("application/problem+json")
        .assert_json_eq(&json!({"kind": "handler_error", "code": "not_found"}));
}

#[tokio::test]
async fn test_error_handler_receives_parse_errors() {
    client(&custom())
        .get("/things/1?limit=999")
        .send()
        .await
        .assert_status_code(400)
        .assert_json_eq(&json!({"kind": "parse_error", "code": null}));
}

#[tokio::test]
async fn test_declared_error_bypasses_error_handler() {
    client(&custom())
        .get("/declared/missing")
        .send()
        .await
        .assert_status_code(404)
        .assert_content_type("application/json")
        .assert_json_eq(&json!({"code": "not_found", "message": "no such thing"}));
}

#[tokio::test]
async fn test_error_handler_handles_unrouted_requests() {
    client(&custom())
        .get("/elsewhere")
        .send()
        .await
        .assert_status_code(404)
        .assert_json_eq(&json!({"kind": "not_found", "code": null}));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Shape {
    Circle { radius: f64 },
    Square { side: f64 },
}

fn shape_union() -> UnionSpec {
    UnionSpec::new("type", "properties")
        .variant("circle")
        .variant("square")
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CreateShape {
    name: String,
    shape: Option<Shape>,
}

impl Schema for CreateShape {
    fn describe(schema: &mut SchemaBuilder) {
        schema.union("shape", shape_union());
    }
}

impl Validate for CreateShape {}

#[derive(Debug, Serialize)]
struct ShapeView {
    name: String,
    shape: Option<Shape>,
}

impl Schema for ShapeView {
    fn describe(schema: &mut SchemaBuilder) {
        schema.status(201);
        schema.union("shape", shape_union());
    }
}

impl Validate for ShapeView {}

fn shapes() -> Router {
    let root = Router::new();
    root.post("/shapes", |_ctx: RequestContext, req: CreateShape| async move {
        Ok::<_, HandlerError>(ShapeView {
            name: req.name,
            shape: req.shape,
        })
    })
    .unwrap();
    root
}

#[tokio::test]
async fn test_union_round_trips_through_discriminator() {
    let body = json!({"name": "c", "type": "circle", "properties": {"radius": 2.5}});
    client(&shapes())
        .post("/shapes")
        .json(&body)
        .send()
        .await
        .assert_status_code(201)
        .assert_json_eq(&body);
}

#[tokio::test]
async fn test_union_with_unknown_tag_stays_empty() {
    client(&shapes())
        .post("/shapes")
        .json(&json!({"name": "t", "type": "triangle", "properties": {"sides": 3}}))
        .send()
        .await
        .assert_status_code(201)
        .assert_json_eq(&json!({"name": "t"}));
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tags {
    tags: Vec<String>,
}

impl Schema for Tags {
    fn describe(schema: &mut SchemaBuilder) {
        schema.unwrap("tags");
    }
}

impl Validate for Tags {}

#[derive(Debug, Serialize)]
struct TagList {
    tags: Vec<String>,
}

impl Schema for TagList {
    fn describe(schema: &mut SchemaBuilder) {
        schema.unwrap("tags");
    }
}

impl Validate for TagList {}

#[tokio::test]
async fn test_unwrapped_sequence_in_and_out() {
    let root = Router::new();
    root.post("/tags", |_ctx: RequestContext, req: Tags| async move {
        let mut tags = req.tags;
        tags.sort();
        Ok::<_, HandlerError>(TagList { tags })
    })
    .unwrap();
    let client = client(&root);

    client
        .post("/tags")
        .json(&json!(["b", "a"]))
        .send()
        .await
        .assert_json_eq(&json!(["a", "b"]));
    client
        .post("/tags")
        .json(&json!({"tags": ["z", "y"]}))
        .send()
        .await
        .assert_json_eq(&json!(["y", "z"]));
}

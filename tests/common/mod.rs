#![allow(dead_code)]

//! Demo API shared by the integration tests.
//!
//! Operations are written in YAML exactly as a project would ship them and registered into a
//! tree in code.

use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use swagrouter::endpoint::MethodHandler;
use swagrouter::runtime_config::RuntimeConfig;
use swagrouter::security::AuthRegistry;
use swagrouter::server::{RequestContext, Response};
use swagrouter::service::{ApiService, ApiTree};
use swagrouter::spec::{Catalog, Operation};
use swagrouter::value::{Map, Value};

pub const PREFIX: &str = "is-x-";
pub const API_KEY: &str = "abcd1234";

pub const VALIDATION_GET: &str = r#"
operationId: validationGet
is-x-auth: [{method: allowAll}]
produces: [application/json]
parameters:
  - {in: query, name: page, type: integer, minimum: 1, default: 1}
  - {in: query, name: tags, type: array, collectionFormat: csv, items: {type: string}}
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const VALIDATION_POST: &str = r#"
operationId: validationPost
is-x-auth: [{method: allowAll}]
consumes: [application/json]
produces: [application/json]
parameters:
  - {in: header, name: X-Client-Version, type: integer}
  - in: body
    name: payload
    schema:
      type: object
      required: [username, age]
      properties:
        username: {type: string, minLength: 3}
        password: {type: string, is-x-obscure: true}
        age: {type: integer, minimum: 0, maximum: 150}
        birthday: {type: string, format: date}
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const PATH_PARAMS_POST: &str = r#"
operationId: validationPathParams
is-x-auth: [{method: allowAll}]
consumes: [application/json]
produces: [application/json]
parameters:
  - {in: path, name: paramName, type: integer, required: true}
  - {in: path, name: otherParam, type: string, required: true}
  - in: body
    name: payload
    schema:
      type: object
      required: [note]
      properties:
        note: {type: string}
responses:
  '200':
    schema:
      type: object
      required: [success, numValidatedPathParams]
      properties:
        success: {type: boolean}
        numValidatedPathParams: {type: integer}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const FORM_POST: &str = r#"
operationId: orderForm
is-x-auth: [{method: allowAll}]
consumes: [application/x-www-form-urlencoded, multipart/form-data]
produces: [application/json]
parameters:
  - {in: formData, name: quantity, type: integer, required: true, minimum: 1}
  - {in: formData, name: gift, type: boolean}
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const AUTH_ALWAYS_FAIL: &str = r#"
operationId: authAlwaysFail
is-x-auth: [{method: allowNone}]
produces: [application/json]
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const AUTH_SIMPLE: &str = r#"
operationId: authSimple
is-x-auth:
  - {method: allowNone}
  - {method: allowWithApiKeyHeader, extraArgs: {headerName: IS-API-KEY, keyValue: abcd1234}}
produces: [application/json]
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#;

pub const BROKEN_RESPONSE: &str = r#"
operationId: brokenResponse
is-x-auth: [{method: allowAll}]
produces: [application/json]
responses:
  '200':
    schema:
      type: object
      properties:
        count: {type: integer}
"#;

pub const FAILING_LOGIC: &str = r#"
operationId: failingLogic
is-x-auth: [{method: allowAll}]
produces: [application/json]
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
"#;

pub const PLAIN_TEXT: &str = r#"
operationId: plainText
is-x-auth: [{method: allowAll}]
is-x-includeHeaders:
  Cache-Control: no-store
produces: [text/plain]
"#;

/// Service over the demo tree plus a counter of logic invocations.
pub struct DemoApi {
    pub service: ApiService,
    pub logic_calls: Arc<AtomicUsize>,
}

impl DemoApi {
    pub fn calls(&self) -> usize {
        self.logic_calls.load(Ordering::SeqCst)
    }
}

pub fn operation(yaml: &str) -> Operation {
    Operation::from_yaml_str(yaml).unwrap()
}

fn echo(ctx: &mut RequestContext) -> anyhow::Result<Response> {
    let mut data = Map::new();
    data.insert("data".to_string(), ctx.data.clone());
    Ok(Response::json("success", true, Some("Validated"), data))
}

struct Registrar<'a> {
    tree: ApiTree,
    registry: AuthRegistry,
    calls: &'a Arc<AtomicUsize>,
}

impl Registrar<'_> {
    fn add<F>(&mut self, path: &str, method: Method, yaml: &str, logic: F)
    where
        F: Fn(&mut RequestContext) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        let calls = Arc::clone(self.calls);
        let counted = move |ctx: &mut RequestContext| {
            calls.fetch_add(1, Ordering::SeqCst);
            logic(ctx)
        };
        let handler =
            MethodHandler::from_registry(operation(yaml), &self.registry, PREFIX, counted)
                .unwrap();
        self.tree.insert(path, method, handler).unwrap();
    }
}

pub fn demo_tree(calls: &Arc<AtomicUsize>) -> ApiTree {
    let mut r = Registrar {
        tree: ApiTree::new(PREFIX),
        registry: AuthRegistry::with_builtins(),
        calls,
    };

    r.add("tests/validation", Method::GET, VALIDATION_GET, echo);
    r.add("tests/validation", Method::POST, VALIDATION_POST, echo);
    r.add(
        "tests/validation/is-x-integer-paramName/is-x-string-otherParam",
        Method::POST,
        PATH_PARAMS_POST,
        |ctx| {
            let mut data = Map::new();
            data.insert(
                "numValidatedPathParams".to_string(),
                Value::Integer(ctx.path_params.len() as i64),
            );
            data.insert("pathParams".to_string(), Value::Object(ctx.path_params.clone()));
            Ok(Response::json("success", true, None, data))
        },
    );
    r.add("tests/order", Method::POST, FORM_POST, echo);
    r.add("tests/auth-alwaysfail", Method::GET, AUTH_ALWAYS_FAIL, |_| {
        Ok(Response::success("in"))
    });
    r.add("tests/auth-simple", Method::GET, AUTH_SIMPLE, |ctx| {
        let message = ctx
            .auth
            .as_ref()
            .and_then(|a| a.message.clone())
            .unwrap_or_default();
        Ok(Response::success(&message))
    });
    r.add("tests/broken-response", Method::GET, BROKEN_RESPONSE, |_| {
        let mut data = Map::new();
        data.insert("count".to_string(), Value::from("many"));
        Ok(Response::json("success", true, None, data))
    });
    r.add("tests/failing-logic", Method::GET, FAILING_LOGIC, |_| {
        Err(anyhow::anyhow!("database connection refused at 10.0.0.7"))
    });
    r.add("tests/plain", Method::GET, PLAIN_TEXT, |_| Ok(Response::text("hello")));
    r.tree
}

pub fn demo_api_with(config: RuntimeConfig) -> DemoApi {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = demo_tree(&calls);
    let service = ApiService::new(tree, Arc::new(Catalog::with_generic_responses()), config);
    DemoApi {
        service,
        logic_calls: calls,
    }
}

pub fn demo_api() -> DemoApi {
    demo_api_with(RuntimeConfig::default())
}

/// JSON body of a response as `serde_json::Value`.
pub fn json(response: &Response) -> serde_json::Value {
    response
        .json_body()
        .map(|body| Value::Object(body.clone()).to_json())
        .unwrap_or(serde_json::Value::Null)
}

/// Plain text body of a response.
pub fn text(response: &Response) -> String {
    match &response.payload {
        swagrouter::server::Payload::Text(s) | swagrouter::server::Payload::Html(s) => s.clone(),
        _ => String::new(),
    }
}

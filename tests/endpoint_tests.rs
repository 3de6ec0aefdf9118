mod common;

use common::{demo_api, demo_api_with, json, text, API_KEY};
use serde_json::json;
use swagrouter::runtime_config::RuntimeConfig;
use swagrouter::server::{RawRequest, RequestBody, FORM_URLENCODED};

#[test]
fn path_placeholders_are_validated_and_counted() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation/7/abc").with_json(&json!({"note": "hi"})),
    );
    assert_eq!(response.status.as_u16(), 200);
    let body = json(&response);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["numValidatedPathParams"], json!(2));
    assert_eq!(body["pathParams"], json!({"paramName": 7, "otherParam": "abc"}));
    assert_eq!(api.calls(), 1);
}

#[test]
fn allow_none_never_runs_the_logic() {
    let api = demo_api();
    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/auth-alwaysfail"));
    let body = json(&response);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!("FAILURE"));
    assert_eq!(body["message"], json!("I prevent ANYONE from doing anything!"));
    assert_eq!(api.calls(), 0);
}

#[test]
fn auth_chain_reports_every_distinct_failure() {
    let api = demo_api();

    let missing = api
        .service
        .process_request(RawRequest::new("GET", "/tests/auth-simple"));
    assert_eq!(
        json(&missing)["message"],
        json!(
            "I prevent ANYONE from doing anything! | Did not provide a value in the header `IS-API-KEY`"
        )
    );

    let wrong = api.service.process_request(
        RawRequest::new("GET", "/tests/auth-simple").with_header("is-api-key", "guess"),
    );
    assert_eq!(
        json(&wrong)["message"],
        json!(
            "I prevent ANYONE from doing anything! | Given authentication value did not match the expected value."
        )
    );
    assert_eq!(api.calls(), 0);

    let granted = api.service.process_request(
        RawRequest::new("GET", "/tests/auth-simple").with_header("IS-API-KEY", API_KEY),
    );
    let body = json(&granted);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("You gave the correct value!"));
    assert_eq!(api.calls(), 1);
}

#[test]
fn unknown_path_is_not_found() {
    let api = demo_api();
    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/nothing-here"));
    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(text(&response), "404 Not Found");
}

#[test]
fn unregistered_method_is_not_implemented() {
    let api = demo_api();
    let response = api
        .service
        .process_request(RawRequest::new("DELETE", "/tests/validation"));
    assert_eq!(response.status.as_u16(), 501);
    assert_eq!(text(&response), "501 Not Implemented");
}

#[test]
fn invalid_method_override_is_rejected() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation").with_header("X-HTTP-Method-Override", "BREW"),
    );
    assert_eq!(response.status.as_u16(), 405);
}

#[test]
fn method_override_selects_the_get_handler() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation?page=2")
            .with_header("X-HTTP-Method-Override", "get"),
    );
    let body = json(&response);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["page"], json!(2));
}

#[test]
fn content_negotiation_failures_are_client_errors() {
    let api = demo_api();

    let missing = api.service.process_request(RawRequest::new("POST", "/tests/validation"));
    assert_eq!(missing.status.as_u16(), 400);
    assert_eq!(
        json(&missing)["message"],
        json!("Incoming Request did not define a 'Content-Type' header")
    );

    let unsupported = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_header("Content-Type", "application/xml")
            .with_body(RequestBody::Raw("<a/>".to_string())),
    );
    assert_eq!(unsupported.status.as_u16(), 415);
    assert_eq!(
        json(&unsupported)["message"],
        json!("The Content-Type 'application/xml' is not supported.")
    );

    let not_consumed = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_header("Content-Type", "text/plain")
            .with_text("hello"),
    );
    assert_eq!(not_consumed.status.as_u16(), 415);
    assert_eq!(
        json(&not_consumed)["message"],
        json!("The Content-Type 'text/plain' is not supported by this endpoint.")
    );

    let garbage = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(RequestBody::Raw("{not json".to_string())),
    );
    assert_eq!(garbage.status.as_u16(), 400);
    assert_eq!(api.calls(), 0);
}

#[test]
fn body_validation_failure_is_reported_to_the_client() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_json(&json!({"username": "ab", "age": 200})),
    );
    assert_eq!(response.status.as_u16(), 200);
    let body = json(&response);
    assert_eq!(body["success"], json!(false));
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Error in body area of request."), "{message}");
    assert!(message.contains("username"), "{message}");
    assert!(message.contains("age"), "{message}");
    assert_eq!(api.calls(), 0);
}

#[test]
fn body_values_are_not_coerced() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_json(&json!({"username": "alice", "age": "30"})),
    );
    assert_eq!(json(&response)["success"], json!(false));
}

#[test]
fn valid_body_reaches_the_logic_with_native_dates() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation").with_json(&json!({
            "username": "alice",
            "password": "hunter2",
            "age": 30,
            "birthday": "1990-05-17"
        })),
    );
    let body = json(&response);
    assert_eq!(body["success"], json!(true), "{body}");
    assert_eq!(body["data"]["age"], json!(30));
    assert_eq!(body["data"]["birthday"], json!("1990-05-17"));
}

#[test]
fn header_validation_failure_names_the_headers() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("POST", "/tests/validation")
            .with_header("x-client-version", "latest")
            .with_json(&json!({"username": "alice", "age": 30})),
    );
    let message = json(&response)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Error in Headers."), "{message}");
}

#[test]
fn query_parameters_are_coerced_and_defaulted() {
    let api = demo_api();

    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/validation?page=3&tags=a,b"));
    let body = json(&response);
    assert_eq!(body["data"]["page"], json!(3));
    assert_eq!(body["data"]["tags"], json!(["a", "b"]));

    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/validation"));
    assert_eq!(json(&response)["data"]["page"], json!(1));

    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/validation?page=0"));
    let message = json(&response)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Error in query area of request."), "{message}");
}

#[test]
fn form_data_is_validated_with_coercion() {
    let api = demo_api();

    let parsed = api.service.process_request(
        RawRequest::new("POST", "/tests/order").with_form(json!({"quantity": "2"})),
    );
    let body = json(&parsed);
    assert_eq!(body["success"], json!(true), "{body}");
    assert_eq!(body["data"]["quantity"], json!(2));

    let raw = api.service.process_request(
        RawRequest::new("POST", "/tests/order")
            .with_header("Content-Type", FORM_URLENCODED)
            .with_body(RequestBody::Raw("quantity=3&gift=true".to_string())),
    );
    let body = json(&raw);
    assert_eq!(body["data"]["quantity"], json!(3));
    assert_eq!(body["data"]["gift"], json!(true));

    let missing = api.service.process_request(
        RawRequest::new("POST", "/tests/order").with_form(json!({"gift": "false"})),
    );
    let message = json(&missing)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Error in formData area of request."), "{message}");
}

#[test]
fn response_breaking_its_schema_is_an_internal_error() {
    let api = demo_api();
    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/broken-response"));
    assert_eq!(response.status.as_u16(), 500);
    assert_eq!(text(&response), "500 Internal Server Error");
    assert_eq!(api.calls(), 1);
}

#[test]
fn logic_errors_do_not_leak_to_the_client() {
    let api = demo_api();
    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/failing-logic"));
    assert_eq!(response.status.as_u16(), 500);
    assert!(!text(&response).contains("database"));
}

#[test]
fn plain_text_responses_carry_include_headers() {
    let api = demo_api();
    let response = api.service.process_request(
        RawRequest::new("GET", "/tests/plain").with_header("X-Request-ID", "01ARZ3NDEKTSV4RRFFQ69G5FAV"),
    );
    assert_eq!(text(&response), "hello");
    assert_eq!(response.header("cache-control"), Some("no-store"));
    assert_eq!(
        response.header("x-request-id"),
        Some("01ARZ3NDEKTSV4RRFFQ69G5FAV")
    );
}

#[test]
fn base_path_and_file_extension_are_stripped() {
    let config = RuntimeConfig {
        base_path: "/api/v1".to_string(),
        ..RuntimeConfig::default()
    };
    let api = demo_api_with(config);

    let response = api
        .service
        .process_request(RawRequest::new("GET", "/api/v1/tests/plain.txt"));
    assert_eq!(text(&response), "hello");

    let response = api
        .service
        .process_request(RawRequest::new("GET", "/tests/plain"));
    assert_eq!(text(&response), "hello");
}

#[test]
fn cached_and_uncached_services_agree() {
    let cached = demo_api();
    let uncached = demo_api_with(RuntimeConfig {
        signature_cache: false,
        ..RuntimeConfig::default()
    });

    for _ in 0..2 {
        for api in [&cached, &uncached] {
            let ok = api.service.process_request(
                RawRequest::new("POST", "/tests/validation/12/x").with_json(&json!({"note": "n"})),
            );
            assert_eq!(json(&ok)["numValidatedPathParams"], json!(2));
            let bad = api.service.process_request(
                RawRequest::new("POST", "/tests/validation/12/x").with_json(&json!({})),
            );
            assert_eq!(json(&bad)["success"], json!(false));
        }
    }
    assert!(cached.service.cache().size() > 0);
    assert_eq!(uncached.service.cache().size(), 0);
}

#[test]
fn replacing_the_tree_takes_effect_immediately() {
    let api = demo_api();
    let before = api
        .service
        .process_request(RawRequest::new("GET", "/tests/plain"));
    assert_eq!(before.status.as_u16(), 200);

    api.service
        .replace_tree(swagrouter::service::ApiTree::new(common::PREFIX));
    let after = api
        .service
        .process_request(RawRequest::new("GET", "/tests/plain"));
    assert_eq!(after.status.as_u16(), 404);
    assert_eq!(api.service.cache().size(), 0);
}

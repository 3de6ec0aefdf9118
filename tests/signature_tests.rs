use swagrouter::signature::{Bound, Direction, SignatureCompiler};
use swagrouter::spec::{load_catalog, Catalog, Location, Operation, SchemaError, SchemaType};

const CATALOG: &str = r#"
definitions:
  Pet:
    type: object
    required: [name]
    properties:
      name: {type: string, minLength: 1}
      owner: {$ref: '#/definitions/Owner'}
  Owner:
    type: object
    properties:
      email: {type: string, is-x-obscure: true}
  PetAlias: {$ref: '#/definitions/Pet'}
  Loop: {$ref: '#/definitions/Loop'}
  Category:
    type: object
    properties:
      name: {type: string}
      parent: {$ref: '#/definitions/Category'}
  Tree:
    type: object
    properties:
      children: {type: array, items: {$ref: '#/definitions/Tree'}}
  Family:
    type: object
    properties:
      mother: {$ref: '#/definitions/Owner'}
      father: {$ref: '#/definitions/Owner'}
parameters:
  Limit: {in: query, name: limit, type: integer, minimum: 1, maximum: 100}
responses:
  PetList:
    description: many pets
    schema:
      type: array
      items: {$ref: '#/definitions/Pet'}
"#;

fn catalog() -> Catalog {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    std::fs::write(&path, CATALOG).unwrap();
    load_catalog(&path).unwrap()
}

fn op(yaml: &str) -> Operation {
    Operation::from_yaml_str(yaml).unwrap()
}

#[test]
fn parameter_and_schema_refs_resolve_through_the_catalog() {
    let catalog = catalog();
    let operation = op(r#"
produces: [application/json]
parameters:
  - {$ref: '#/parameters/Limit'}
  - {in: body, name: pet, schema: {$ref: '#/definitions/PetAlias'}}
"#);
    let compiler = SignatureCompiler::new(&catalog, "is-x-");

    let query = compiler.compile_incoming(&operation, Location::Query).unwrap();
    let limit = query.get("limit").unwrap();
    assert_eq!(limit.kind, SchemaType::Integer);
    assert_eq!(limit.number_rules().unwrap().maximum, Some(Bound::Integer(100)));

    let body = compiler
        .compile(&operation, Direction::Incoming(Location::Body))
        .unwrap();
    assert!(body.get("name").unwrap().required);
    let owner = body.get("owner").unwrap();
    assert!(!owner.required);
    let email = owner.child.as_ref().unwrap().get("email").unwrap();
    assert!(email.obscure);
}

#[test]
fn generic_responses_are_always_available() {
    let catalog = catalog();
    let operation = op(r#"
produces: [application/json]
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
  default: {$ref: '#/responses/GenericFailure'}
"#);
    let compiler = SignatureCompiler::new(&catalog, "is-x-");
    let success = compiler.compile_outgoing(&operation, "200").unwrap();
    assert!(success.get("success").unwrap().required);
    assert!(success.get("status").unwrap().required);
    assert!(!success.get("message").unwrap().required);

    let failure = compiler
        .compile(&operation, Direction::Outgoing("default"))
        .unwrap();
    assert!(failure.contains("status"));
}

#[test]
fn array_response_schemas_are_unsupported() {
    let catalog = catalog();
    let operation = op(r#"
produces: [application/json]
responses:
  '200': {$ref: '#/responses/PetList'}
"#);
    let err = SignatureCompiler::new(&catalog, "is-x-")
        .compile_outgoing(&operation, "200")
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnsupportedResponseSchema {
            status: "200".to_string(),
            kind: "array".to_string(),
        }
    );
}

#[test]
fn undeclared_response_key_is_an_error() {
    let catalog = catalog();
    let operation = op(r#"
produces: [application/json]
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
"#);
    let err = SignatureCompiler::new(&catalog, "is-x-")
        .compile_outgoing(&operation, "404")
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownResponse { ref status } if status == "404"));
}

#[test]
fn outgoing_signature_needs_produces() {
    let catalog = catalog();
    let operation = op(r#"
responses:
  '200': {$ref: '#/responses/GenericSuccess'}
"#);
    let err = SignatureCompiler::new(&catalog, "is-x-")
        .compile_outgoing(&operation, "200")
        .unwrap_err();
    assert!(matches!(err, SchemaError::PropertyInvalid { .. }));
    assert!(err.to_string().contains("produces"));
}

#[test]
fn non_json_operations_have_empty_outgoing_signatures() {
    let catalog = catalog();
    let operation = op(r#"
produces: [text/html]
responses:
  '200': {$ref: '#/responses/PetList'}
"#);
    let signature = SignatureCompiler::new(&catalog, "is-x-")
        .compile_outgoing(&operation, "200")
        .unwrap();
    assert!(signature.is_empty());
}

#[test]
fn bad_references_are_reported() {
    let catalog = catalog();
    let compiler = SignatureCompiler::new(&catalog, "is-x-");

    let wrong_group = op(r#"
parameters:
  - {in: body, name: pet, schema: {$ref: '#/parameters/Pet'}}
"#);
    let err = compiler
        .compile_incoming(&wrong_group, Location::Body)
        .unwrap_err();
    assert!(matches!(err, SchemaError::BadReference { .. }), "{err}");

    let dangling = op(r#"
parameters:
  - {in: body, name: pet, schema: {$ref: '#/definitions/Unicorn'}}
"#);
    let err = compiler.compile_incoming(&dangling, Location::Body).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");

    let circular = op(r#"
parameters:
  - {in: body, name: pet, schema: {$ref: '#/definitions/Loop'}}
"#);
    let err = compiler.compile_incoming(&circular, Location::Body).unwrap_err();
    assert!(err.to_string().contains("circular"), "{err}");
}

#[test]
fn invalid_pattern_is_a_schema_error() {
    let catalog = Catalog::default();
    let operation = op(r#"
parameters:
  - {in: query, name: code, type: string, pattern: '[a-z'}
"#);
    let err = SignatureCompiler::new(&catalog, "is-x-")
        .compile_incoming(&operation, Location::Query)
        .unwrap_err();
    assert!(matches!(err, SchemaError::PropertyInvalid { .. }), "{err}");
}

#[test]
fn self_referencing_schemas_are_rejected() {
    let catalog = catalog();
    let compiler = SignatureCompiler::new(&catalog, "is-x-");

    for definition in ["Category", "Tree"] {
        let operation = op(&format!(
            "parameters:\n  - {{in: body, name: node, schema: {{$ref: '#/definitions/{definition}'}}}}\n"
        ));
        let err = compiler
            .compile_incoming(&operation, Location::Body)
            .unwrap_err();
        assert!(matches!(err, SchemaError::BadReference { .. }), "{err}");
        assert!(err.to_string().contains("circular"), "{err}");
    }

    let outgoing = op(r#"
produces: [application/json]
responses:
  '200':
    description: a category
    schema: {$ref: '#/definitions/Category'}
"#);
    let err = compiler.compile_outgoing(&outgoing, "200").unwrap_err();
    assert!(err.to_string().contains("circular"), "{err}");
}

#[test]
fn sibling_properties_may_share_a_reference() {
    let catalog = catalog();
    let operation = op(r#"
parameters:
  - {in: body, name: family, schema: {$ref: '#/definitions/Family'}}
"#);
    let body = SignatureCompiler::new(&catalog, "is-x-")
        .compile_incoming(&operation, Location::Body)
        .unwrap();
    for parent in ["mother", "father"] {
        let email = body.get(parent).unwrap().child.as_ref().unwrap().get("email");
        assert!(email.unwrap().obscure);
    }
}

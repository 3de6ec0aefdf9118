use http::Method;
use swagrouter::router::{RouteError, RouteTree};
use swagrouter::spec::SchemaType;
use swagrouter::value::Value;

fn zoo() -> RouteTree<&'static str> {
    let mut tree = RouteTree::new("is-x-");
    for (path, name) in [
        ("zoo/animals", "list_animals"),
        ("zoo/animals/42", "the_answer"),
        ("zoo/animals/is-x-integer-id", "animal_by_id"),
        ("zoo/animals/is-x-string-slug", "animal_by_slug"),
        ("zoo/animals/is-x-integer-id/toys/is-x-string-toy", "animal_toy"),
        ("zoo/health", "health"),
    ] {
        tree.insert(path, Method::GET, name).unwrap();
    }
    tree
}

fn handler_for(tree: &RouteTree<&'static str>, path: &str) -> Option<&'static str> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    tree.resolve(&segments)
        .unwrap()
        .and_then(|m| m.handler(&Method::GET).map(|h| **h))
}

#[test]
fn resolution_is_deterministic() {
    let tree = zoo();
    let segments = ["zoo", "animals", "7", "toys", "ball", "extra"];
    let first = tree.resolve(&segments).unwrap().unwrap();
    let second = tree.resolve(&segments).unwrap().unwrap();
    assert_eq!(first.node, second.node);
    assert_eq!(first.path_params, second.path_params);
    assert_eq!(first.remaining_path, second.remaining_path);
    assert_eq!(first.remaining_path, vec!["extra".to_string()]);
}

#[test]
fn literal_segment_beats_placeholders() {
    let tree = zoo();
    assert_eq!(handler_for(&tree, "/zoo/animals/42"), Some("the_answer"));
}

#[test]
fn integer_placeholder_beats_string_placeholder() {
    let tree = zoo();
    assert_eq!(handler_for(&tree, "/zoo/animals/7"), Some("animal_by_id"));
    assert_eq!(handler_for(&tree, "/zoo/animals/rex"), Some("animal_by_slug"));
}

#[test]
fn typed_path_params_are_native_values() {
    let tree = zoo();
    let matched = tree
        .resolve(&["zoo", "animals", "7", "toys", "ball"])
        .unwrap()
        .unwrap();
    assert_eq!(matched.path_params.get("id"), Some(&Value::Integer(7)));
    assert_eq!(matched.path_params.get("toy"), Some(&Value::from("ball")));
    assert!(matched.remaining_path.is_empty());
}

#[test]
fn competing_integer_placeholders_are_ambiguous() {
    let mut tree = RouteTree::new("is-x-");
    tree.insert("orders/is-x-integer-orderId", Method::GET, "by_order")
        .unwrap();
    tree.insert("orders/is-x-integer-customerId", Method::GET, "by_customer")
        .unwrap();

    let err = tree.resolve(&["orders", "1001"]).unwrap_err();
    assert!(matches!(err, RouteError::Ambiguous { .. }), "{err}");

    // a non-numeric segment matches neither
    assert!(tree.resolve(&["orders", "latest"]).unwrap().is_none());
}

#[test]
fn unmatched_paths_are_not_found() {
    let tree = zoo();
    assert!(tree.resolve(&["aquarium"]).unwrap().is_none());
    assert!(tree.resolve::<&str>(&[]).unwrap().is_none());
}

#[test]
fn placeholder_priority_is_configurable() {
    let mut tree = RouteTree::new("is-x-")
        .with_placeholder_types(vec![SchemaType::String, SchemaType::Integer]);
    tree.insert("n/is-x-integer-id", Method::GET, "int").unwrap();
    tree.insert("n/is-x-string-name", Method::GET, "text").unwrap();
    assert_eq!(handler_for(&tree, "/n/5"), Some("text"));
}

#[test]
fn http_method_names_cannot_be_segments() {
    let mut tree: RouteTree<()> = RouteTree::new("is-x-");
    for segment in ["get", "POST", "Delete"] {
        let err = tree
            .insert(&format!("api/{segment}"), Method::GET, ())
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidSegment { .. }), "{err}");
    }
}

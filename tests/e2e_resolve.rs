//! End-to-end tests for path dispatch and property unwrapping.
//!
//! Each test exercises the full engine — dispatch -> fetch -> expand ->
//! unwrap — against the in-memory reference backend.

use navresolve_rs::{
    EntityId, Error, MemoryBackend, MemoryMaterializer, PathElement, PropertyMap, Query, Resolver,
    ResourcePath, ResultValue, SkipLinkGenerator, Value,
};

type MemResolver = Resolver<MemoryBackend, MemoryMaterializer, SkipLinkGenerator>;

fn resolver(backend: MemoryBackend) -> MemResolver {
    Resolver::new(
        backend,
        MemoryMaterializer,
        SkipLinkGenerator::new("http://localhost/v1"),
    )
}

fn named_props(name: &str) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("name".into(), Value::from(name));
    props
}

/// One Thing with a custom-property tree, linked to two Datastreams.
/// Returns (backend, thing, first datastream).
fn setup_small_store() -> (MemoryBackend, EntityId, EntityId) {
    let backend = MemoryBackend::new();

    let mut props = named_props("first thing");
    props.insert(
        "properties".into(),
        Value::from(serde_json::json!({ "a": [10, 20, 30] })),
    );
    let thing = backend.insert("Things", props);

    let d1 = backend.insert("Datastreams", named_props("ds one"));
    let d2 = backend.insert("Datastreams", named_props("ds two"));
    backend.link("Things", thing, "Datastreams", d1);
    backend.link("Things", thing, "Datastreams", d2);
    backend.link("Datastreams", d1, "Things", thing);
    backend.link("Datastreams", d2, "Things", thing);

    (backend, thing, d1)
}

// ============================================================================
// 1. Single entity: hit and miss
// ============================================================================

#[tokio::test]
async fn test_entity_by_id_found() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", thing);
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    let entity = result.try_entity().unwrap();
    assert_eq!(entity.id, thing);
    assert_eq!(entity.get("name"), Some(&Value::from("first thing")));
}

#[tokio::test]
async fn test_entity_by_id_missing_is_absent() {
    let (backend, _, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", EntityId(9999));
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert!(result.is_absent(), "missing id must resolve to Absent, got {result:?}");
}

// ============================================================================
// 2. Collections
// ============================================================================

#[tokio::test]
async fn test_collection_fetch() {
    let (backend, _, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::collection("Datastreams");
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    let set = result.try_collection().unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.next_link.is_none());
}

#[tokio::test]
async fn test_navigation_collection() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    // Things(t)/Datastreams
    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Collection { entity_type: "Datastreams".into() });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    let set = result.try_collection().unwrap();
    let names: Vec<&str> = set
        .iter()
        .filter_map(|e| e.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["ds one", "ds two"]);
}

// ============================================================================
// 3. To-one navigation as the terminal element
// ============================================================================

#[tokio::test]
async fn test_to_one_navigation_entity() {
    let (backend, thing, d1) = setup_small_store();
    let resolver = resolver(backend);

    // Datastreams(d1)/Things — to-one hop, id determined by the parent
    let path = ResourcePath::entity("Datastreams", d1)
        .with_element(PathElement::Entity { entity_type: "Things".into(), id: None });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    let entity = result.try_entity().unwrap();
    assert_eq!(entity.id, thing);
}

#[tokio::test]
async fn test_to_one_navigation_with_two_rows_is_invariant_violation() {
    let (backend, thing, _) = setup_small_store();
    // A to-one navigation backed by two rows is a query-builder bug.
    let o1 = backend.insert("Owners", named_props("one"));
    let o2 = backend.insert("Owners", named_props("two"));
    backend.link("Things", thing, "Owners", o1);
    backend.link("Things", thing, "Owners", o2);
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Entity { entity_type: "Owners".into(), id: None });
    let err = resolver.resolve(&path, &mut Query::new()).await.unwrap_err();

    assert!(matches!(err, Error::InvariantViolation(_)), "got {err:?}");
}

// ============================================================================
// 4. Property unwrapping
// ============================================================================

#[tokio::test]
async fn test_property_unwrap() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Property { name: "name".into() });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert_eq!(result.named_key(), Some("name"));
    assert_eq!(
        result,
        ResultValue::Named { name: "name".into(), value: Value::from("first thing") }
    );
}

#[tokio::test]
async fn test_custom_property_chain_in_bounds() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    // Things(t)/properties/a[1]
    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Property { name: "properties".into() })
        .with_element(PathElement::CustomProperty { name: "a".into() })
        .with_element(PathElement::ArrayIndex { index: 1 });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert_eq!(result, ResultValue::Named { name: "a[1]".into(), value: Value::Int(20) });
}

#[tokio::test]
async fn test_custom_property_chain_out_of_bounds() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Property { name: "properties".into() })
        .with_element(PathElement::CustomProperty { name: "a".into() })
        .with_element(PathElement::ArrayIndex { index: 5 });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert!(result.is_absent());
}

#[tokio::test]
async fn test_custom_property_missing_key() {
    let (backend, thing, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", thing)
        .with_element(PathElement::Property { name: "properties".into() })
        .with_element(PathElement::CustomProperty { name: "missing".into() });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert!(result.is_absent());
}

#[tokio::test]
async fn test_property_of_missing_entity_is_absent() {
    let (backend, _, _) = setup_small_store();
    let resolver = resolver(backend);

    let path = ResourcePath::entity("Things", EntityId(9999))
        .with_element(PathElement::Property { name: "name".into() });
    let result = resolver.resolve(&path, &mut Query::new()).await.unwrap();

    assert!(result.is_absent(), "Absent must pass through the unwrap chain");
}

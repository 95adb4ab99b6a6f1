mod common;

use common::{Article, Comment, Person};
use jsonapi_core::{JsonApiError, Registry, ResourceType};
use std::any::TypeId;

#[test]
fn test_resolve_registered_types() {
    let registry = common::registry();

    let entry = registry.resolve("articles").unwrap();
    assert_eq!(entry.type_name(), "articles");
    assert_eq!(entry.declared(), Article::TYPE);
    assert_eq!(entry.type_id(), TypeId::of::<Article>());

    assert!(registry.resolve("people").is_some());
    assert!(registry.resolve("tags").is_none());
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_default_policies() {
    let registry = Registry::builder().build().unwrap();

    assert!(registry.is_empty());
    assert!(registry.allows_unregistered_types());
    assert!(!registry.strict_types());
}

#[test]
fn test_policies_are_configurable() {
    let registry = Registry::builder()
        .allow_unregistered_types(false)
        .strict_types(true)
        .build()
        .unwrap();

    assert!(!registry.allows_unregistered_types());
    assert!(registry.strict_types());
}

#[test]
fn test_reregistering_same_pair_is_idempotent() {
    let registry = Registry::builder()
        .register_type::<Person>()
        .register::<Person>("people")
        .build()
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.type_name_of::<Person>(), Some("people"));
}

#[test]
fn test_conflicting_registration_fails() {
    let result = Registry::builder()
        .register::<Person>("people")
        .register::<Comment>("people")
        .build();

    match result {
        Err(JsonApiError::Configuration { message }) => {
            assert!(message.contains("'people'"), "unexpected message: {message}");
        }
        other => panic!("Expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_blank_type_name_fails() {
    let result = Registry::builder().register::<Person>("  ").build();
    assert!(matches!(result, Err(JsonApiError::Configuration { .. })));
}

#[test]
fn test_reverse_lookup_keeps_first_name() {
    let registry = Registry::builder()
        .register::<Person>("people")
        .register::<Person>("authors")
        .build()
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.type_name_of::<Person>(), Some("people"));
    assert_eq!(
        registry.resolve_native(TypeId::of::<Person>()).map(|e| e.type_name()),
        Some("people")
    );
    assert_eq!(registry.resolve("authors").map(|e| e.declared()), Some("people"));
    assert_eq!(registry.type_name_of::<Comment>(), None);
}

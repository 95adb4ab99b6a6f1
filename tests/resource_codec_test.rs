mod common;

use common::{Article, Comment, Person};
use jsonapi_core::codec::resource_object;
use jsonapi_core::{
    JsonApi, JsonApiError, Linked, Links, Registry, Relationship, RelationshipField, Resource,
    ResourceGraph, ResourceIdentifier, ResourceObject, ResourceType,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn keys(value: &Value) -> Vec<&str> {
    value.as_object().unwrap().keys().map(String::as_str).collect()
}

#[test]
fn test_decode_registered_resource() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let node = api
        .read_resource(
            &mut graph,
            json!({
                "type": "articles",
                "id": "1",
                "attributes": { "title": "JSON:API paints my bikeshed!", "unknown": 1 },
                "relationships": {
                    "author": {
                        "links": { "related": "/articles/1/author" },
                        "data": { "type": "people", "id": "9" }
                    }
                },
                "links": { "self": "/articles/1" },
                "meta": { "views": 10 }
            }),
        )
        .unwrap()
        .unwrap();

    let article = graph.downcast::<Article>(node).unwrap();
    assert_eq!(article.id.as_deref(), Some("1"));
    assert_eq!(article.title, "JSON:API paints my bikeshed!");
    assert_eq!(article.links.as_ref().and_then(Links::self_link).map(|l| l.href()), Some("/articles/1"));
    assert_eq!(article.meta.as_ref().and_then(|m| m.get("views")), Some(&json!(10)));
    // Target is not part of this graph.
    assert!(article.author.is_none());
    let author = article.relationships.as_ref().and_then(|r| r.get("author")).unwrap();
    assert_eq!(author.links().and_then(Links::related).map(|l| l.href()), Some("/articles/1/author"));
}

#[test]
fn test_decode_without_attributes_uses_defaults() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let node = api
        .read_resource(&mut graph, json!({ "type": "people", "lid": "new-person" }))
        .unwrap()
        .unwrap();

    let person = graph.downcast::<Person>(node).unwrap();
    assert_eq!(person.lid.as_deref(), Some("new-person"));
    assert_eq!(person.id, None);
    assert_eq!(person.name, "");
}

#[test]
fn test_decode_null_is_absent() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    assert_eq!(api.read_resource(&mut graph, Value::Null).unwrap(), None);
    assert!(graph.is_empty());
}

#[test]
fn test_decode_rejects_non_object() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let err = api.read_resource(&mut graph, json!(["articles"])).unwrap_err();
    assert!(matches!(err, JsonApiError::Format { .. }));
}

#[test]
fn test_decode_rejects_missing_identity() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let err = api
        .read_resource(&mut graph, json!({ "type": "articles", "attributes": {} }))
        .unwrap_err();
    assert!(matches!(err, JsonApiError::Format { .. }));

    let err = api.read_resource(&mut graph, json!({ "id": "1" })).unwrap_err();
    assert!(matches!(err, JsonApiError::Format { .. }));
}

#[test]
fn test_decode_rejects_bad_attributes() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let err = api
        .read_resource(&mut graph, json!({ "type": "articles", "id": "1", "attributes": [] }))
        .unwrap_err();
    match err {
        JsonApiError::Format { path, .. } => assert_eq!(path, "$.attributes"),
        other => panic!("Expected format error, got {other:?}"),
    }

    let err = api
        .read_resource(
            &mut graph,
            json!({ "type": "articles", "id": "1", "attributes": { "title": 5 } }),
        )
        .unwrap_err();
    match err {
        JsonApiError::Attributes { type_name, .. } => assert_eq!(type_name, "articles"),
        other => panic!("Expected attributes error, got {other:?}"),
    }
}

#[test]
fn test_decode_unregistered_type_as_resource_object() {
    let api = common::api();
    let mut graph = ResourceGraph::new();

    let node = api
        .read_resource(
            &mut graph,
            json!({ "type": "tags", "id": "3", "attributes": { "label": "rust" }, "meta": { "a": 1 } }),
        )
        .unwrap()
        .unwrap();

    let tag = graph.downcast::<ResourceObject>(node).unwrap();
    assert_eq!(tag.type_name, "tags");
    assert_eq!(tag.meta.as_ref().map(|m| m.len()), Some(1));
    assert_eq!(
        api.write_resource(&graph, node).unwrap(),
        json!({ "type": "tags", "id": "3", "meta": { "a": 1 } })
    );
}

#[test]
fn test_decode_unregistered_type_disallowed() {
    let registry = Registry::builder()
        .register_type::<Article>()
        .allow_unregistered_types(false)
        .build()
        .unwrap();
    let api = JsonApi::new(registry);
    let mut graph = ResourceGraph::new();

    let err = api
        .read_resource(&mut graph, json!({ "type": "tags", "id": "3" }))
        .unwrap_err();
    match err {
        JsonApiError::UnregisteredType { type_name, .. } => assert_eq!(type_name, "tags"),
        other => panic!("Expected unregistered type error, got {other:?}"),
    }
}

#[test]
fn test_strict_types() {
    let lenient = JsonApi::new(Registry::builder().register::<Person>("users").build().unwrap());
    let mut graph = ResourceGraph::new();
    let node = lenient
        .read_resource(&mut graph, json!({ "type": "users", "id": "1", "attributes": { "name": "Ann" } }))
        .unwrap()
        .unwrap();
    assert_eq!(graph.downcast::<Person>(node).unwrap().resource_type(), "users");
    assert_eq!(lenient.write_resource(&graph, node).unwrap()["type"], json!("users"));

    let strict = JsonApi::new(
        Registry::builder()
            .register::<Person>("users")
            .strict_types(true)
            .build()
            .unwrap(),
    );
    let err = strict
        .read_resource(&mut graph, json!({ "type": "users", "id": "2" }))
        .unwrap_err();
    match err {
        JsonApiError::TypeMismatch { expected, found, .. } => {
            assert_eq!(expected, Person::TYPE);
            assert_eq!(found, "users");
        }
        other => panic!("Expected type mismatch, got {other:?}"),
    }

    let err = strict.write_resource(&graph, node).unwrap_err();
    assert!(matches!(err, JsonApiError::TypeMismatch { .. }));
}

#[test]
fn test_encode_member_order_and_unbinding() {
    let api = common::api();
    let mut graph = ResourceGraph::new();
    let author = graph.insert(Person::new("9", "Dan"));
    let first = graph.insert(Comment::new("5", "First!"));
    let second = graph.insert(Comment::new("12", "I like XML better"));
    let article = graph.insert(Article {
        links: Some(Links::from_uris([("self", "/articles/1")])),
        author: Some(author),
        comments: Some(vec![first, second]),
        ..Article::new("1", "JSON:API paints my bikeshed!")
    });

    let value = api.write_resource(&graph, article.erase()).unwrap();

    assert_eq!(keys(&value), vec!["type", "id", "attributes", "relationships", "links"]);
    assert_eq!(
        value,
        json!({
            "type": "articles",
            "id": "1",
            "attributes": { "title": "JSON:API paints my bikeshed!" },
            "relationships": {
                "author": { "data": { "type": "people", "id": "9" } },
                "comments": { "data": [
                    { "type": "comments", "id": "5" },
                    { "type": "comments", "id": "12" }
                ] }
            },
            "links": { "self": "/articles/1" }
        })
    );
}

#[test]
fn test_encode_keeps_relationship_links_and_unset_entries() {
    let api = common::api();
    let mut graph = ResourceGraph::new();
    let node = api
        .read_resource(
            &mut graph,
            json!({
                "type": "articles",
                "id": "1",
                "relationships": {
                    "author": {
                        "links": { "related": "/articles/1/author" },
                        "data": { "type": "people", "id": "9" }
                    },
                    "comments": { "links": { "related": "/articles/1/comments" } }
                }
            }),
        )
        .unwrap()
        .unwrap();
    let person = graph.insert(Person::new("42", "Eve"));
    let article = node.downcast::<Article>().unwrap();
    graph[article].author = Some(person);

    let value = api.write_resource(&graph, node).unwrap();

    assert_eq!(
        value["relationships"],
        json!({
            "author": {
                "data": { "type": "people", "id": "42" },
                "links": { "related": "/articles/1/author" }
            },
            "comments": { "links": { "related": "/articles/1/comments" } }
        })
    );
    assert!(value.get("attributes").is_some());
}

#[test]
fn test_resource_object_of_native_resource() {
    let mut graph = ResourceGraph::new();
    let friend = graph.insert(Person::new("2", "Bob"));
    let person = graph.insert(Person {
        best_friend: Some(friend),
        ..Person::new("1", "Ann")
    });

    let object = resource_object(&graph, person.erase()).unwrap();

    assert_eq!(object.identifier(), ResourceIdentifier::new("people", "1"));
    assert_eq!(
        object.relationship("bestFriend"),
        Some(&Relationship::to_one(Some(ResourceIdentifier::new("people", "2"))))
    );
}

#[test]
fn test_encode_requires_identity() {
    let api = common::api();
    let mut graph = ResourceGraph::new();
    let node = graph.insert(Person::default());

    let err = api.write_resource(&graph, node.erase()).unwrap_err();
    assert!(matches!(err, JsonApiError::Format { .. }));
}

#[test]
fn test_encode_unregistered_native_type_fails() {
    let api = JsonApi::new(Registry::builder().register_type::<Article>().build().unwrap());
    let mut graph = ResourceGraph::new();
    let comment = graph.insert(Comment::new("1", "orphan"));

    let err = api.write_resource(&graph, comment.erase()).unwrap_err();
    assert!(matches!(err, JsonApiError::Configuration { .. }));
}

#[test]
fn test_encode_empty_attributes_are_omitted() {
    let api = common::api();
    let mut graph = ResourceGraph::new();
    let object = graph.insert(ResourceObject::new("tags", "1"));
    let person = graph.insert(Person {
        lid: Some("local".to_string()),
        ..Person::default()
    });

    assert_eq!(api.write_resource(&graph, object.erase()).unwrap(), json!({ "type": "tags", "id": "1" }));
    assert_eq!(
        api.write_resource(&graph, person.erase()).unwrap(),
        json!({ "type": "people", "lid": "local" })
    );
}

/// Serializes members that collide with identity and relationship names.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Note {
    id: Option<String>,
    text: String,
    owner: Option<String>,
}

const NOTE_FIELDS: &[RelationshipField] = &[RelationshipField::to_one("owner")];

impl Resource for Note {
    fn resource_type(&self) -> &str {
        "notes"
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        NOTE_FIELDS
    }
}

impl ResourceType for Note {
    const TYPE: &'static str = "notes";
}

#[test]
fn test_encode_suppresses_identity_and_relationship_names() {
    let api = JsonApi::new(Registry::builder().register_type::<Note>().build().unwrap());
    let mut graph = ResourceGraph::new();
    let note = graph.insert(Note {
        id: Some("1".to_string()),
        text: "remember".to_string(),
        owner: Some("someone".to_string()),
    });

    let value = api.write_resource(&graph, note.erase()).unwrap();

    assert_eq!(value, json!({ "type": "notes", "id": "1", "attributes": { "text": "remember" } }));
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Twin {
    #[serde(skip)]
    id: Option<String>,
}

const TWIN_FIELDS: &[RelationshipField] = &[
    RelationshipField::to_one("sibling"),
    RelationshipField::to_many("sibling"),
];

impl Resource for Twin {
    fn resource_type(&self) -> &str {
        "twins"
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        TWIN_FIELDS
    }

    fn linked(&self, _name: &str) -> Option<Linked> {
        None
    }
}

impl ResourceType for Twin {
    const TYPE: &'static str = "twins";
}

#[test]
fn test_encode_rejects_duplicate_relationship_names() {
    let api = JsonApi::new(Registry::builder().register_type::<Twin>().build().unwrap());
    let mut graph = ResourceGraph::new();
    let twin = graph.insert(Twin {
        id: Some("1".to_string()),
    });

    let err = api.write_resource(&graph, twin.erase()).unwrap_err();
    match err {
        JsonApiError::Configuration { message } => assert!(message.contains("'sibling'")),
        other => panic!("Expected configuration error, got {other:?}"),
    }
}

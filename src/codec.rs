//! Reads and writes single resources.
//!
//! Decoding always starts with a lookahead over the resource JSON that reads the
//! resource object (identity, relationships, links, meta) without touching the
//! attributes. The `type` found there selects the native type through the
//! [`Registry`]; unknown types fall back to [`ResourceObject`].

use crate::error::JsonApiError;
use crate::graph::{dangling, identifier_of, is_blank, ResourceGraph};
use crate::model::{
    Links, Meta, Relationship, Relationships, ResourceIdentifier, ResourceObject,
};
use crate::registry::Registry;
use crate::resource::{AsAny, Linked, NodeRef, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub(crate) const NAME_TYPE: &str = "type";
pub(crate) const NAME_ID: &str = "id";
pub(crate) const NAME_LID: &str = "lid";
pub(crate) const NAME_ATTRIBUTES: &str = "attributes";
pub(crate) const NAME_RELATIONSHIPS: &str = "relationships";
pub(crate) const NAME_DATA: &str = "data";
pub(crate) const NAME_LINKS: &str = "links";
pub(crate) const NAME_META: &str = "meta";

impl Resource for ResourceObject {
    fn resource_type(&self) -> &str {
        &self.type_name
    }

    fn set_resource_type(&mut self, type_name: String) {
        self.type_name = type_name;
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn lid(&self) -> Option<&str> {
        self.lid.as_deref()
    }

    fn set_lid(&mut self, lid: Option<String>) {
        self.lid = lid;
    }

    fn links(&self) -> Option<&Links> {
        self.links.as_ref()
    }

    fn set_links(&mut self, links: Option<Links>) {
        self.links = links;
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn set_meta(&mut self, meta: Option<Meta>) {
        self.meta = meta;
    }

    fn relationships(&self) -> Option<&Relationships> {
        self.relationships.as_ref()
    }

    fn set_relationships(&mut self, relationships: Option<Relationships>) {
        self.relationships = relationships;
    }
}

// === Decoding ===

/// Decodes one resource into `graph`, dispatching on its `type` member.
///
/// Returns `None` for a JSON `null`. Otherwise returns the decoded resource object
/// (needed later for relationship binding) together with the new node.
///
/// # Errors
/// Format errors for structural violations, `UnregisteredType` when the type is
/// unknown and the registry does not allow that, `TypeMismatch` in strict mode and
/// `Attributes` when the native type rejects the attributes.
pub(crate) fn read_resource(
    registry: &Registry,
    graph: &mut ResourceGraph,
    value: Value,
    path: &str,
) -> Result<Option<(ResourceObject, NodeRef)>, JsonApiError> {
    if value.is_null() {
        return Ok(None);
    }

    let object = read_resource_object(&value, path)?;

    let Some(entry) = registry.resolve(&object.type_name) else {
        if !registry.allows_unregistered_types() {
            return Err(JsonApiError::UnregisteredType {
                type_name: object.type_name,
                path: path.to_string(),
            });
        }
        log::trace!("decoding unregistered type '{}' as a resource object", object.type_name);
        let node = graph.insert_boxed(Box::new(object.clone()));
        return Ok(Some((object, node)));
    };

    if registry.strict_types() && object.type_name != entry.declared() {
        return Err(JsonApiError::TypeMismatch {
            expected: entry.declared().to_string(),
            found: object.type_name,
            path: path.to_string(),
        });
    }

    let attributes_path = format!("{path}.{NAME_ATTRIBUTES}");
    let attributes = match value {
        Value::Object(mut members) => match members.remove(NAME_ATTRIBUTES) {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(attributes @ Value::Object(_)) => attributes,
            Some(other) => {
                return Err(JsonApiError::format(
                    format!("The value of 'attributes' MUST be an object but found {}.", kind(&other)),
                    attributes_path,
                ))
            }
        },
        _ => Value::Object(Map::new()),
    };

    let mut resource = entry
        .decode(attributes)
        .map_err(|err| JsonApiError::Attributes {
            type_name: object.type_name.clone(),
            message: err.to_string(),
            path: attributes_path,
        })?;
    apply_resource_object(&mut *resource, &object);

    let node = graph.insert_boxed(resource);
    Ok(Some((object, node)))
}

/// Assigns identity, relationships, links and meta onto a native instance.
fn apply_resource_object(resource: &mut dyn Resource, object: &ResourceObject) {
    resource.set_resource_type(object.type_name.clone());
    if let Some(id) = &object.id {
        resource.set_id(Some(id.clone()));
    }
    if let Some(lid) = &object.lid {
        resource.set_lid(Some(lid.clone()));
    }
    if let Some(relationships) = &object.relationships {
        resource.set_relationships(Some(relationships.clone()));
    }
    if let Some(links) = &object.links {
        resource.set_links(Some(links.clone()));
    }
    if let Some(meta) = &object.meta {
        resource.set_meta(Some(meta.clone()));
    }
}

/// Reads everything but the attributes of a resource.
///
/// # Errors
/// Returns a format error when `value` is not an object, `type` is missing or
/// blank, or both `id` and `lid` are missing or blank.
pub fn read_resource_object(value: &Value, path: &str) -> Result<ResourceObject, JsonApiError> {
    let members = expect_object(value, "Resource", path)?;
    let (type_name, id, lid) = read_identity(members, "A resource object", path)?;

    let relationships = match members.get(NAME_RELATIONSHIPS) {
        None | Some(Value::Null) => None,
        Some(value) => Some(read_relationships(
            value,
            &format!("{path}.{NAME_RELATIONSHIPS}"),
        )?),
    };

    Ok(ResourceObject {
        type_name,
        id,
        lid,
        relationships,
        links: read_leaf(members.get(NAME_LINKS), &format!("{path}.{NAME_LINKS}"))?,
        meta: read_leaf(members.get(NAME_META), &format!("{path}.{NAME_META}"))?,
    })
}

/// Reads a resource identifier object.
///
/// # Errors
/// Returns a format error under the same rules as [`read_resource_object`].
pub fn read_identifier(value: &Value, path: &str) -> Result<ResourceIdentifier, JsonApiError> {
    let members = expect_object(value, "Resource identifier", path)?;
    let (type_name, id, lid) = read_identity(members, "A resource identifier", path)?;
    Ok(ResourceIdentifier {
        type_name,
        id,
        lid,
        meta: read_leaf(members.get(NAME_META), &format!("{path}.{NAME_META}"))?,
    })
}

/// Reads a relationships object.
///
/// # Errors
/// Returns a format error when `value` or any member is not a valid relationship object.
pub fn read_relationships(value: &Value, path: &str) -> Result<Relationships, JsonApiError> {
    let members = expect_object(value, "The value of 'relationships'", path)?;
    members
        .iter()
        .map(|(name, value)| {
            let relationship = read_relationship(value, &format!("{path}.{name}"))?;
            Ok((name.clone(), relationship))
        })
        .collect()
}

/// Reads one relationship object. An array under `data` makes it to-many.
///
/// # Errors
/// Returns a format error when the relationship is not an object, has none of
/// `data`, `links` and `meta`, or its linkage is malformed.
pub fn read_relationship(value: &Value, path: &str) -> Result<Relationship, JsonApiError> {
    let members = expect_object(value, "Relationship", path)?;
    let links: Option<Links> = read_leaf(members.get(NAME_LINKS), &format!("{path}.{NAME_LINKS}"))?;
    let meta: Option<Meta> = read_leaf(members.get(NAME_META), &format!("{path}.{NAME_META}"))?;
    let data_path = format!("{path}.{NAME_DATA}");

    match members.get(NAME_DATA) {
        None if links.is_none() && meta.is_none() => Err(JsonApiError::format(
            "A relationship object MUST contain at least one of the following: links, data, meta.",
            path,
        )),
        None => Ok(Relationship::Unlinked { links, meta }),
        Some(Value::Null) => Ok(Relationship::ToOne {
            data: None,
            links,
            meta,
        }),
        Some(identifier @ Value::Object(_)) => Ok(Relationship::ToOne {
            data: Some(read_identifier(identifier, &data_path)?),
            links,
            meta,
        }),
        Some(Value::Array(identifiers)) => {
            let data = identifiers
                .iter()
                .enumerate()
                .map(|(index, identifier)| read_identifier(identifier, &format!("{data_path}[{index}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Relationship::ToMany { data, links, meta })
        }
        Some(other) => Err(JsonApiError::format(
            format!(
                "Resource linkage MUST be null, an object or an array but found {}.",
                kind(other)
            ),
            data_path,
        )),
    }
}

fn read_identity(
    members: &Map<String, Value>,
    subject: &str,
    path: &str,
) -> Result<(String, Option<String>, Option<String>), JsonApiError> {
    let type_path = format!("{path}.{NAME_TYPE}");
    let type_name = match members.get(NAME_TYPE) {
        None => {
            return Err(JsonApiError::format(
                format!("{subject} MUST contain top-level member 'type' but it was not found."),
                path,
            ))
        }
        Some(Value::String(type_name)) if !type_name.trim().is_empty() => type_name.clone(),
        Some(Value::String(_)) => {
            return Err(JsonApiError::format(
                format!("{subject} MUST contain a non-empty 'type'."),
                type_path,
            ))
        }
        Some(other) => {
            return Err(JsonApiError::format(
                format!("The value of 'type' MUST be a string but found {}.", kind(other)),
                type_path,
            ))
        }
    };

    let id = read_string(members, NAME_ID, path)?;
    let lid = read_string(members, NAME_LID, path)?;
    if is_blank(id.as_deref()) && is_blank(lid.as_deref()) {
        return Err(JsonApiError::format(
            format!("{subject} MUST contain an 'id' or 'lid' member but both were null or blank."),
            path,
        ));
    }

    Ok((type_name, id, lid))
}

fn read_string(
    members: &Map<String, Value>,
    name: &str,
    path: &str,
) -> Result<Option<String>, JsonApiError> {
    match members.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(JsonApiError::format(
            format!("The value of '{name}' MUST be a string but found {}.", kind(other)),
            format!("{path}.{name}"),
        )),
    }
}

/// Reads an optional leaf member (links, meta, errors, ...) through its serde codec.
pub(crate) fn read_leaf<T: DeserializeOwned>(
    value: Option<&Value>,
    path: &str,
) -> Result<Option<T>, JsonApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| JsonApiError::format(format!("Invalid member: {err}."), path)),
    }
}

fn expect_object<'v>(
    value: &'v Value,
    subject: &str,
    path: &str,
) -> Result<&'v Map<String, Value>, JsonApiError> {
    value.as_object().ok_or_else(|| {
        JsonApiError::format(
            format!("{subject} MUST be a JSON object but found {}.", kind(value)),
            path,
        )
    })
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// === Encoding ===

/// Strips a native resource back to its resource object.
///
/// Set relationship fields are turned back into linkage by reading the identity of
/// their targets. The instance's relationships object supplies the entries of
/// unset fields and the links/meta of every entry.
///
/// # Errors
/// Configuration errors for dangling handles, duplicated relationship names or a
/// field value of the wrong cardinality; format errors for resources without a
/// valid identity.
pub fn resource_object(
    graph: &ResourceGraph,
    node: NodeRef,
) -> Result<ResourceObject, JsonApiError> {
    let resource = graph.node(node).ok_or_else(|| dangling(node))?;
    let identifier = identifier_of(resource)?;
    let relationships = unbind_relationships(graph, resource)?;
    Ok(ResourceObject {
        type_name: identifier.type_name,
        id: identifier.id,
        lid: identifier.lid,
        relationships,
        links: resource.links().cloned(),
        meta: resource.meta().cloned(),
    })
}

fn unbind_relationships(
    graph: &ResourceGraph,
    resource: &dyn Resource,
) -> Result<Option<Relationships>, JsonApiError> {
    let mut merged = resource.relationships().cloned().unwrap_or_default();
    let mut names = HashSet::new();

    for field in resource.relationship_fields() {
        if !names.insert(field.name) {
            return Err(JsonApiError::configuration(format!(
                "Type '{}' has multiple relationship fields that share the relationship name '{}'.",
                resource.resource_type(),
                field.name
            )));
        }

        let Some(linked) = resource.linked(field.name) else {
            continue;
        };
        if linked.cardinality() != field.cardinality {
            return Err(JsonApiError::configuration(format!(
                "Relationship field '{}' of type '{}' is declared {} but holds a {} value.",
                field.name,
                resource.resource_type(),
                field.cardinality,
                linked.cardinality()
            )));
        }

        let (links, meta) = match merged.get(field.name) {
            Some(existing)
                if existing
                    .cardinality()
                    .is_none_or(|cardinality| cardinality == field.cardinality) =>
            {
                (existing.links().cloned(), existing.meta().cloned())
            }
            _ => (None, None),
        };
        let relationship = match linked {
            Linked::ToOne(target) => Relationship::ToOne {
                data: target.map(|target| graph.identifier(target)).transpose()?,
                links,
                meta,
            },
            Linked::ToMany(targets) => Relationship::ToMany {
                data: targets
                    .into_iter()
                    .map(|target| graph.identifier(target))
                    .collect::<Result<Vec<_>, _>>()?,
                links,
                meta,
            },
        };
        merged.insert(field.name.to_string(), relationship);
    }

    Ok((!merged.is_empty()).then_some(merged))
}

/// Encodes the resource at `node` as a resource object with attributes.
///
/// # Errors
/// Everything [`resource_object`] reports, plus a configuration error for a native
/// type that is not registered, `TypeMismatch` in strict mode and `Attributes`
/// when serde fails on the instance.
pub(crate) fn write_resource(
    registry: &Registry,
    graph: &ResourceGraph,
    node: NodeRef,
    path: &str,
) -> Result<Value, JsonApiError> {
    let resource = graph.node(node).ok_or_else(|| dangling(node))?;
    let object = resource_object(graph, node)?;
    let attributes = attributes_of(registry, resource, node, &object, path)?;
    write_resource_object(&object, attributes, path)
}

fn attributes_of(
    registry: &Registry,
    resource: &dyn Resource,
    node: NodeRef,
    object: &ResourceObject,
    path: &str,
) -> Result<Option<Map<String, Value>>, JsonApiError> {
    if AsAny::as_any(resource).is::<ResourceObject>() {
        return Ok(None);
    }

    let entry = registry.resolve_native(node.type_id).ok_or_else(|| {
        JsonApiError::configuration(format!(
            "The native type of resource '{}' is not registered. \
             Only registered types and resource objects can be serialized.",
            object.type_name
        ))
    })?;

    if registry.strict_types() && object.type_name != entry.declared() {
        return Err(JsonApiError::TypeMismatch {
            expected: entry.declared().to_string(),
            found: object.type_name.clone(),
            path: path.to_string(),
        });
    }

    let attributes_error = |message: String| JsonApiError::Attributes {
        type_name: object.type_name.clone(),
        message,
        path: format!("{path}.{NAME_ATTRIBUTES}"),
    };
    let value = entry
        .encode(resource)
        .ok_or_else(|| attributes_error("native type does not match its registry entry".to_string()))?
        .map_err(|err| attributes_error(err.to_string()))?;

    match value {
        Value::Null => Ok(None),
        Value::Object(mut attributes) => {
            let fields = resource.relationship_fields();
            attributes.retain(|name, _| {
                !matches!(name.as_str(), NAME_TYPE | NAME_ID | NAME_LID)
                    && !fields.iter().any(|field| field.name == name.as_str())
            });
            Ok((!attributes.is_empty()).then_some(attributes))
        }
        other => Err(attributes_error(format!(
            "attributes MUST serialize to an object but found {}",
            kind(&other)
        ))),
    }
}

/// Writes a resource object in canonical member order.
pub(crate) fn write_resource_object(
    object: &ResourceObject,
    attributes: Option<Map<String, Value>>,
    path: &str,
) -> Result<Value, JsonApiError> {
    let mut members = Map::new();
    members.insert(NAME_TYPE.to_string(), Value::String(object.type_name.clone()));
    if let Some(id) = &object.id {
        members.insert(NAME_ID.to_string(), Value::String(id.clone()));
    }
    if let Some(lid) = &object.lid {
        members.insert(NAME_LID.to_string(), Value::String(lid.clone()));
    }
    if let Some(attributes) = attributes {
        members.insert(NAME_ATTRIBUTES.to_string(), Value::Object(attributes));
    }
    if let Some(relationships) = object.relationships.as_ref().filter(|r| !r.is_empty()) {
        let relationships_path = format!("{path}.{NAME_RELATIONSHIPS}");
        let mut written = Map::new();
        for (name, relationship) in relationships {
            written.insert(
                name.clone(),
                write_relationship(relationship, &format!("{relationships_path}.{name}"))?,
            );
        }
        members.insert(NAME_RELATIONSHIPS.to_string(), Value::Object(written));
    }
    write_links_and_meta(&mut members, object.links.as_ref(), object.meta.as_ref(), path)?;
    Ok(Value::Object(members))
}

/// Writes a relationship object. An empty to-one relationship carries `"data": null`.
pub(crate) fn write_relationship(
    relationship: &Relationship,
    path: &str,
) -> Result<Value, JsonApiError> {
    let mut members = Map::new();
    match relationship {
        Relationship::ToOne { data, .. } => {
            let data = data.as_ref().map_or(Value::Null, write_identifier);
            members.insert(NAME_DATA.to_string(), data);
        }
        Relationship::ToMany { data, .. } => {
            let data = data.iter().map(write_identifier).collect();
            members.insert(NAME_DATA.to_string(), Value::Array(data));
        }
        Relationship::Unlinked { links: None, meta: None } => {
            return Err(JsonApiError::format(
                "A relationship object MUST contain at least one of the following: links, data, meta.",
                path,
            ))
        }
        Relationship::Unlinked { .. } => {}
    }
    write_links_and_meta(
        &mut members,
        relationship.links(),
        relationship.meta(),
        path,
    )?;
    Ok(Value::Object(members))
}

pub(crate) fn write_identifier(identifier: &ResourceIdentifier) -> Value {
    let mut members = Map::new();
    members.insert(NAME_TYPE.to_string(), Value::String(identifier.type_name.clone()));
    if let Some(id) = &identifier.id {
        members.insert(NAME_ID.to_string(), Value::String(id.clone()));
    }
    if let Some(lid) = &identifier.lid {
        members.insert(NAME_LID.to_string(), Value::String(lid.clone()));
    }
    if let Some(meta) = &identifier.meta {
        members.insert(NAME_META.to_string(), Value::Object(meta.clone()));
    }
    Value::Object(members)
}

fn write_links_and_meta(
    members: &mut Map<String, Value>,
    links: Option<&Links>,
    meta: Option<&Meta>,
    path: &str,
) -> Result<(), JsonApiError> {
    if let Some(links) = links {
        members.insert(NAME_LINKS.to_string(), write_leaf(links, path)?);
    }
    if let Some(meta) = meta {
        members.insert(NAME_META.to_string(), Value::Object(meta.clone()));
    }
    Ok(())
}

/// Writes a leaf member through its serde codec.
pub(crate) fn write_leaf<T: Serialize>(value: &T, path: &str) -> Result<Value, JsonApiError> {
    serde_json::to_value(value)
        .map_err(|err| JsonApiError::format(format!("Member could not be serialized: {err}."), path))
}

//! Wire-level shapes of a JSON:API document.
//!
//! Resource identifiers, resource objects and relationships are read and written
//! by the resource codec. Links, error objects and the `jsonapi` object are plain
//! structural values and go through their serde derives.

use crate::resource::Cardinality;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};

/// Non-standard meta-information, any JSON object.
pub type Meta = Map<String, Value>;

/// Relationship objects of a resource keyed by relationship name, in document order.
pub type Relationships = IndexMap<String, Relationship>;

/// Names a resource uniquely within a document.
///
/// Two identifiers are equal when their `type`, `id` and `lid` are equal; `meta`
/// does not take part in equality or hashing.
#[derive(Debug, Clone)]
pub struct ResourceIdentifier {
    pub type_name: String,
    pub id: Option<String>,
    pub lid: Option<String>,
    pub meta: Option<Meta>,
}

impl ResourceIdentifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceIdentifier {
            type_name: type_name.into(),
            id: Some(id.into()),
            lid: None,
            meta: None,
        }
    }

    /// Identifier of a resource created on the client, known only by its local id.
    pub fn local(type_name: impl Into<String>, lid: impl Into<String>) -> Self {
        ResourceIdentifier {
            type_name: type_name.into(),
            id: None,
            lid: Some(lid.into()),
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl PartialEq for ResourceIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.id == other.id && self.lid == other.lid
    }
}

impl Eq for ResourceIdentifier {}

impl Hash for ResourceIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        self.id.hash(state);
        self.lid.hash(state);
    }
}

impl std::fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.id, &self.lid) {
            (Some(id), _) => write!(f, "{}/{}", self.type_name, id),
            (None, Some(lid)) => write!(f, "{}/lid:{}", self.type_name, lid),
            (None, None) => write!(f, "{}/?", self.type_name),
        }
    }
}

/// A resource stripped of its attributes.
///
/// This is the generic representation of resources whose type is not registered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceObject {
    pub type_name: String,
    pub id: Option<String>,
    pub lid: Option<String>,
    pub relationships: Option<Relationships>,
    pub links: Option<Links>,
    pub meta: Option<Meta>,
}

impl ResourceObject {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceObject {
            type_name: type_name.into(),
            id: Some(id.into()),
            ..ResourceObject::default()
        }
    }

    /// The identifier of this resource. Carries the resource meta along.
    #[must_use]
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            type_name: self.type_name.clone(),
            id: self.id.clone(),
            lid: self.lid.clone(),
            meta: self.meta.clone(),
        }
    }

    /// The relationship registered under `name`, if any.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.as_ref()?.get(name)
    }
}

impl From<ResourceIdentifier> for ResourceObject {
    fn from(identifier: ResourceIdentifier) -> Self {
        ResourceObject {
            type_name: identifier.type_name,
            id: identifier.id,
            lid: identifier.lid,
            relationships: None,
            links: None,
            meta: identifier.meta,
        }
    }
}

/// A reference from one resource to others.
#[derive(Debug, Clone, PartialEq)]
pub enum Relationship {
    /// `data` is `None` for an explicit `"data": null`.
    ToOne {
        data: Option<ResourceIdentifier>,
        links: Option<Links>,
        meta: Option<Meta>,
    },
    /// Serialized as an array even when empty.
    ToMany {
        data: Vec<ResourceIdentifier>,
        links: Option<Links>,
        meta: Option<Meta>,
    },
    /// A relationship object without a `data` member.
    Unlinked {
        links: Option<Links>,
        meta: Option<Meta>,
    },
}

impl Relationship {
    pub fn to_one(data: Option<ResourceIdentifier>) -> Self {
        Relationship::ToOne {
            data,
            links: None,
            meta: None,
        }
    }

    pub fn to_many(data: Vec<ResourceIdentifier>) -> Self {
        Relationship::ToMany {
            data,
            links: None,
            meta: None,
        }
    }

    #[must_use]
    pub fn links(&self) -> Option<&Links> {
        match self {
            Relationship::ToOne { links, .. }
            | Relationship::ToMany { links, .. }
            | Relationship::Unlinked { links, .. } => links.as_ref(),
        }
    }

    #[must_use]
    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Relationship::ToOne { meta, .. }
            | Relationship::ToMany { meta, .. }
            | Relationship::Unlinked { meta, .. } => meta.as_ref(),
        }
    }

    /// The cardinality shown by the linkage; `None` without a `data` member.
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self {
            Relationship::ToOne { .. } => Some(Cardinality::ToOne),
            Relationship::ToMany { .. } => Some(Cardinality::ToMany),
            Relationship::Unlinked { .. } => None,
        }
    }

    /// True if the relationship has non-empty resource linkage.
    #[must_use]
    pub fn has_linkage(&self) -> bool {
        match self {
            Relationship::ToOne { data, .. } => data.is_some(),
            Relationship::ToMany { data, .. } => !data.is_empty(),
            Relationship::Unlinked { .. } => false,
        }
    }
}

/// A link: either a URI reference or a link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Uri(String),
    Object(LinkObject),
}

impl Link {
    /// The link target regardless of representation.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Link::Uri(uri) => uri,
            Link::Object(object) => &object.href,
        }
    }
}

impl From<&str> for Link {
    fn from(uri: &str) -> Self {
        Link::Uri(uri.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkObject {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describedby: Option<Box<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<Hreflang>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hreflang {
    Single(String),
    Multiple(Vec<String>),
}

/// Links object. A member may be present with a `null` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links {
    members: IndexMap<String, Option<Link>>,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds links from plain URI strings.
    pub fn from_uris<I, K, V>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Links {
            members: members
                .into_iter()
                .map(|(name, uri)| (name.into(), Some(Link::Uri(uri.into()))))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, link: Option<Link>) -> Option<Option<Link>> {
        self.members.insert(name.into(), link)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Link> {
        self.members.get(name)?.as_ref()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn self_link(&self) -> Option<&Link> {
        self.get("self")
    }

    pub fn related(&self) -> Option<&Link> {
        self.get("related")
    }

    pub fn first(&self) -> Option<&Link> {
        self.get("first")
    }

    pub fn prev(&self) -> Option<&Link> {
        self.get("prev")
    }

    pub fn next(&self) -> Option<&Link> {
        self.get("next")
    }

    pub fn last(&self) -> Option<&Link> {
        self.get("last")
    }

    pub fn about(&self) -> Option<&Link> {
        self.get("about")
    }

    pub fn error_type(&self) -> Option<&Link> {
        self.get("type")
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<Link>)> {
        self.members.iter()
    }
}

/// An error object of an errors document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ErrorObject {
    /// An error object must carry at least one member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.links.is_none()
            && self.status.is_none()
            && self.code.is_none()
            && self.title.is_none()
            && self.detail.is_none()
            && self.source.is_none()
            && self.meta.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// The top-level `jsonapi` member describing the server's implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

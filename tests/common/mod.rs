#![allow(dead_code)]

use jsonapi_core::{
    JsonApi, JsonApiError, Linked, Links, Meta, Registry, RelationshipField, Relationships,
    Resource, ResourceRef, ResourceType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(skip)]
    pub links: Option<Links>,
    #[serde(skip)]
    pub meta: Option<Meta>,
    #[serde(skip)]
    pub relationships: Option<Relationships>,
    pub title: String,
    #[serde(skip)]
    pub author: Option<ResourceRef<Person>>,
    #[serde(skip)]
    pub comments: Option<Vec<ResourceRef<Comment>>>,
}

const ARTICLE_FIELDS: &[RelationshipField] = &[
    RelationshipField::to_one("author"),
    RelationshipField::to_many("comments"),
];

impl Resource for Article {
    fn resource_type(&self) -> &str {
        Self::TYPE
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
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

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        ARTICLE_FIELDS
    }

    fn linked(&self, name: &str) -> Option<Linked> {
        match name {
            "author" => self.author.map(Linked::one),
            "comments" => self.comments.as_deref().map(Linked::many),
            _ => None,
        }
    }

    fn bind(&mut self, name: &str, linked: Linked) -> Result<(), JsonApiError> {
        match name {
            "author" => self.author = linked.into_one()?,
            "comments" => self.comments = Some(linked.into_many()?),
            _ => {}
        }
        Ok(())
    }
}

impl ResourceType for Article {
    const TYPE: &'static str = "articles";
}

/// Keeps its decoded type name, so it can be registered under more than one name.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(skip)]
    pub type_name: Option<String>,
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(skip)]
    pub lid: Option<String>,
    #[serde(skip)]
    pub links: Option<Links>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip)]
    pub best_friend: Option<ResourceRef<Person>>,
}

const PERSON_FIELDS: &[RelationshipField] = &[RelationshipField::to_one("bestFriend")];

impl Person {
    pub fn new(id: &str, name: &str) -> Self {
        Person {
            id: Some(id.to_string()),
            name: name.to_string(),
            ..Person::default()
        }
    }
}

impl Resource for Person {
    fn resource_type(&self) -> &str {
        self.type_name.as_deref().unwrap_or(Self::TYPE)
    }

    fn set_resource_type(&mut self, type_name: String) {
        self.type_name = Some(type_name);
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

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        PERSON_FIELDS
    }

    fn linked(&self, name: &str) -> Option<Linked> {
        match name {
            "bestFriend" => self.best_friend.map(Linked::one),
            _ => None,
        }
    }

    fn bind(&mut self, name: &str, linked: Linked) -> Result<(), JsonApiError> {
        if name == "bestFriend" {
            self.best_friend = linked.into_one()?;
        }
        Ok(())
    }
}

impl ResourceType for Person {
    const TYPE: &'static str = "people";
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(skip)]
    pub links: Option<Links>,
    #[serde(skip)]
    pub relationships: Option<Relationships>,
    pub body: String,
    #[serde(skip)]
    pub author: Option<ResourceRef<Person>>,
}

const COMMENT_FIELDS: &[RelationshipField] = &[RelationshipField::to_one("author")];

impl Comment {
    pub fn new(id: &str, body: &str) -> Self {
        Comment {
            id: Some(id.to_string()),
            body: body.to_string(),
            ..Comment::default()
        }
    }
}

impl Resource for Comment {
    fn resource_type(&self) -> &str {
        Self::TYPE
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn links(&self) -> Option<&Links> {
        self.links.as_ref()
    }

    fn set_links(&mut self, links: Option<Links>) {
        self.links = links;
    }

    fn relationships(&self) -> Option<&Relationships> {
        self.relationships.as_ref()
    }

    fn set_relationships(&mut self, relationships: Option<Relationships>) {
        self.relationships = relationships;
    }

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        COMMENT_FIELDS
    }

    fn linked(&self, name: &str) -> Option<Linked> {
        match name {
            "author" => self.author.map(Linked::one),
            _ => None,
        }
    }

    fn bind(&mut self, name: &str, linked: Linked) -> Result<(), JsonApiError> {
        if name == "author" {
            self.author = linked.into_one()?;
        }
        Ok(())
    }
}

impl ResourceType for Comment {
    const TYPE: &'static str = "comments";
}

impl Article {
    pub fn new(id: &str, title: &str) -> Self {
        Article {
            id: Some(id.to_string()),
            title: title.to_string(),
            ..Article::default()
        }
    }
}

pub fn registry() -> Registry {
    Registry::builder()
        .register_type::<Article>()
        .register_type::<Person>()
        .register_type::<Comment>()
        .build()
        .unwrap()
}

pub fn api() -> JsonApi {
    JsonApi::new(registry())
}

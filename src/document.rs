//! Top-level documents and their codec.
//!
//! A document is either a data document (primary data, included resources and the
//! graph that owns them) or an errors document. Which one is present is decided
//! from the top-level members before anything is decoded.

use crate::binder::RelationshipPool;
use crate::codec::{self, kind, read_leaf, write_leaf, NAME_DATA, NAME_LINKS, NAME_META};
use crate::error::JsonApiError;
use crate::graph::ResourceGraph;
use crate::included::collect_included;
use crate::model::{ErrorObject, JsonApiObject, Links, Meta, ResourceObject};
use crate::registry::Registry;
use crate::resource::{NodeRef, Resource};
use serde_json::{Map, Value};

const NAME_INCLUDED: &str = "included";
const NAME_ERRORS: &str = "errors";
const NAME_JSONAPI: &str = "jsonapi";

/// Expected shape of the primary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    Collection,
}

/// What to write under `included`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludedPolicy {
    /// Never write `included`.
    Omit,
    /// Write exactly the included list the document carries.
    #[default]
    Document,
    /// Write the document's included list extended by every resource reachable
    /// from the primary data.
    Compute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryData {
    Single(NodeRef),
    Collection(Vec<NodeRef>),
}

impl PrimaryData {
    pub fn nodes(&self) -> Vec<NodeRef> {
        match self {
            PrimaryData::Single(node) => vec![*node],
            PrimaryData::Collection(nodes) => nodes.clone(),
        }
    }
}

/// A document carrying resources.
#[derive(Debug, Default)]
pub struct DataDocument {
    pub graph: ResourceGraph,
    /// `None` for `"data": null` and for meta-only documents.
    pub data: Option<PrimaryData>,
    pub included: Option<Vec<NodeRef>>,
    pub links: Option<Links>,
    pub meta: Option<Meta>,
    pub jsonapi: Option<JsonApiObject>,
}

impl DataDocument {
    /// A document whose primary data is the single resource `node` of `graph`.
    pub fn single(graph: ResourceGraph, node: impl Into<NodeRef>) -> Self {
        DataDocument {
            graph,
            data: Some(PrimaryData::Single(node.into())),
            ..DataDocument::default()
        }
    }

    pub fn collection<I>(graph: ResourceGraph, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeRef>,
    {
        DataDocument {
            graph,
            data: Some(PrimaryData::Collection(nodes.into_iter().map(Into::into).collect())),
            ..DataDocument::default()
        }
    }

    /// A document without primary data.
    pub fn meta_only(meta: Meta) -> Self {
        DataDocument {
            meta: Some(meta),
            ..DataDocument::default()
        }
    }

    /// The single primary resource if it is a `T`.
    pub fn primary<T: Resource>(&self) -> Option<&T> {
        match &self.data {
            Some(PrimaryData::Single(node)) => self.graph.downcast(*node),
            _ => None,
        }
    }

    /// Every primary resource that is a `T`, in document order.
    pub fn primary_all<T: Resource>(&self) -> Vec<&T> {
        self.primary_refs()
            .into_iter()
            .filter_map(|node| self.graph.downcast(node))
            .collect()
    }

    pub fn primary_refs(&self) -> Vec<NodeRef> {
        self.data.as_ref().map(PrimaryData::nodes).unwrap_or_default()
    }

    pub fn included_refs(&self) -> &[NodeRef] {
        self.included.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn with_included(mut self, included: Vec<NodeRef>) -> Self {
        self.included = Some(included);
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn with_jsonapi(mut self, jsonapi: JsonApiObject) -> Self {
        self.jsonapi = Some(jsonapi);
        self
    }
}

/// A document carrying errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorsDocument {
    pub errors: Vec<ErrorObject>,
    pub links: Option<Links>,
    pub meta: Option<Meta>,
    pub jsonapi: Option<JsonApiObject>,
}

impl ErrorsDocument {
    pub fn new(errors: Vec<ErrorObject>) -> Self {
        ErrorsDocument {
            errors,
            ..ErrorsDocument::default()
        }
    }
}

#[derive(Debug)]
pub enum Document {
    Data(DataDocument),
    Errors(ErrorsDocument),
}

impl Document {
    pub fn is_errors(&self) -> bool {
        matches!(self, Document::Errors(_))
    }

    pub fn as_data(&self) -> Option<&DataDocument> {
        match self {
            Document::Data(document) => Some(document),
            Document::Errors(_) => None,
        }
    }

    pub fn as_errors(&self) -> Option<&ErrorsDocument> {
        match self {
            Document::Errors(document) => Some(document),
            Document::Data(_) => None,
        }
    }

    pub fn into_data(self) -> Option<DataDocument> {
        match self {
            Document::Data(document) => Some(document),
            Document::Errors(_) => None,
        }
    }

    pub fn into_errors(self) -> Option<ErrorsDocument> {
        match self {
            Document::Errors(document) => Some(document),
            Document::Data(_) => None,
        }
    }

    /// Splits the document into its data or its errors.
    pub fn into_result(self) -> Result<DataDocument, ErrorsDocument> {
        match self {
            Document::Data(document) => Ok(document),
            Document::Errors(document) => Err(document),
        }
    }

    /// The data document, or a [`JsonApiError::Errors`] carrying the error objects.
    ///
    /// # Errors
    /// Fails when this is an errors document.
    pub fn try_into_data(self) -> Result<DataDocument, JsonApiError> {
        self.into_result().map_err(JsonApiError::from)
    }

    pub fn links(&self) -> Option<&Links> {
        match self {
            Document::Data(document) => document.links.as_ref(),
            Document::Errors(document) => document.links.as_ref(),
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Document::Data(document) => document.meta.as_ref(),
            Document::Errors(document) => document.meta.as_ref(),
        }
    }
}

impl From<DataDocument> for Document {
    fn from(document: DataDocument) -> Self {
        Document::Data(document)
    }
}

impl From<ErrorsDocument> for Document {
    fn from(document: ErrorsDocument) -> Self {
        Document::Errors(document)
    }
}

impl From<ErrorsDocument> for JsonApiError {
    fn from(document: ErrorsDocument) -> Self {
        JsonApiError::Errors {
            errors: document.errors,
        }
    }
}

// === Decoding ===

pub(crate) fn read_document(
    registry: &Registry,
    value: Value,
    shape: Shape,
) -> Result<Document, JsonApiError> {
    let mut members = match value {
        Value::Object(members) => members,
        other => {
            return Err(JsonApiError::format(
                format!(
                    "A JSON object MUST be at the root of every JSON:API document but found {}.",
                    kind(&other)
                ),
                "$",
            ))
        }
    };

    let has_data = members.contains_key(NAME_DATA);
    let has_errors = members.contains_key(NAME_ERRORS);
    if !has_data && !has_errors && !members.contains_key(NAME_META) {
        return Err(JsonApiError::format(
            "A document MUST contain at least one of the following top-level members: data, errors, meta.",
            "$",
        ));
    }
    if has_data && has_errors {
        return Err(JsonApiError::format(
            "The members data and errors MUST NOT coexist in the same document.",
            "$",
        ));
    }
    if !has_data && members.contains_key(NAME_INCLUDED) {
        return Err(JsonApiError::configuration(
            "If a document does not contain a top-level data key, the included member MUST NOT be present either.",
        ));
    }

    let links = read_leaf(members.get(NAME_LINKS), "$.links")?;
    let meta = read_leaf(members.get(NAME_META), "$.meta")?;
    let jsonapi = read_leaf(members.get(NAME_JSONAPI), "$.jsonapi")?;

    if has_errors {
        let errors = read_errors(members.remove(NAME_ERRORS).unwrap_or(Value::Null))?;
        log::debug!("decoded errors document with {} error(s)", errors.len());
        return Ok(Document::Errors(ErrorsDocument {
            errors,
            links,
            meta,
            jsonapi,
        }));
    }

    let mut graph = ResourceGraph::new();
    let mut pairs: Vec<(ResourceObject, NodeRef)> = Vec::new();

    let data = match members.remove(NAME_DATA) {
        None | Some(Value::Null) => None,
        Some(value) => read_data(registry, &mut graph, &mut pairs, value, shape)?,
    };
    let included = match members.remove(NAME_INCLUDED) {
        None | Some(Value::Null) => None,
        Some(value) => Some(read_included(registry, &mut graph, &mut pairs, value)?),
    };

    RelationshipPool::index(&pairs).bind(&mut graph, &pairs)?;
    log::debug!(
        "decoded data document with {} resource(s), {} included",
        graph.len(),
        included.as_ref().map_or(0, Vec::len)
    );

    Ok(Document::Data(DataDocument {
        graph,
        data,
        included,
        links,
        meta,
        jsonapi,
    }))
}

fn read_data(
    registry: &Registry,
    graph: &mut ResourceGraph,
    pairs: &mut Vec<(ResourceObject, NodeRef)>,
    value: Value,
    shape: Shape,
) -> Result<Option<PrimaryData>, JsonApiError> {
    match (shape, value) {
        (Shape::Single, value @ Value::Object(_)) => {
            let Some((object, node)) = codec::read_resource(registry, graph, value, "$.data")? else {
                return Ok(None);
            };
            pairs.push((object, node));
            Ok(Some(PrimaryData::Single(node)))
        }
        (Shape::Collection, Value::Array(elements)) => {
            let nodes = read_resources(registry, graph, pairs, elements, "$.data")?;
            Ok(Some(PrimaryData::Collection(nodes)))
        }
        (Shape::Single, other) => Err(JsonApiError::format(
            format!(
                "Primary data of a single resource document MUST be null or an object but found {}.",
                kind(&other)
            ),
            "$.data",
        )),
        (Shape::Collection, other) => Err(JsonApiError::format(
            format!(
                "Primary data of a collection document MUST be null or an array but found {}.",
                kind(&other)
            ),
            "$.data",
        )),
    }
}

fn read_included(
    registry: &Registry,
    graph: &mut ResourceGraph,
    pairs: &mut Vec<(ResourceObject, NodeRef)>,
    value: Value,
) -> Result<Vec<NodeRef>, JsonApiError> {
    match value {
        Value::Array(elements) => read_resources(registry, graph, pairs, elements, "$.included"),
        other => Err(JsonApiError::format(
            format!("The value of 'included' MUST be an array but found {}.", kind(&other)),
            "$.included",
        )),
    }
}

fn read_resources(
    registry: &Registry,
    graph: &mut ResourceGraph,
    pairs: &mut Vec<(ResourceObject, NodeRef)>,
    elements: Vec<Value>,
    path: &str,
) -> Result<Vec<NodeRef>, JsonApiError> {
    let mut nodes = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        let element_path = format!("{path}[{index}]");
        if let Some((object, node)) = codec::read_resource(registry, graph, element, &element_path)? {
            pairs.push((object, node));
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn read_errors(value: Value) -> Result<Vec<ErrorObject>, JsonApiError> {
    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(JsonApiError::format(
                format!("The value of 'errors' MUST be an array but found {}.", kind(&other)),
                "$.errors",
            ))
        }
    };

    let mut errors = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let path = format!("$.errors[{index}]");
        if !element.is_object() {
            return Err(JsonApiError::format(
                format!("An error object MUST be an object but found {}.", kind(element)),
                path,
            ));
        }
        let Some(error) = read_leaf::<ErrorObject>(Some(element), &path)? else {
            continue;
        };
        if error.is_empty() {
            return Err(JsonApiError::format(
                "An error object MUST contain at least one member.",
                path,
            ));
        }
        errors.push(error);
    }
    Ok(errors)
}

// === Encoding ===

pub(crate) fn write_document(
    registry: &Registry,
    document: &Document,
    policy: IncludedPolicy,
) -> Result<Value, JsonApiError> {
    match document {
        Document::Data(document) => write_data_document(registry, document, policy),
        Document::Errors(document) => write_errors_document(document),
    }
}

fn write_data_document(
    registry: &Registry,
    document: &DataDocument,
    policy: IncludedPolicy,
) -> Result<Value, JsonApiError> {
    let mut members = Map::new();
    write_top_level(
        &mut members,
        document.jsonapi.as_ref(),
        document.meta.as_ref(),
        document.links.as_ref(),
    )?;

    let graph = &document.graph;
    let included = match policy {
        IncludedPolicy::Omit => None,
        IncludedPolicy::Document => document.included.clone(),
        IncludedPolicy::Compute => collect_included(
            graph,
            &document.primary_refs(),
            document.included.as_deref(),
        )?,
    };

    match &document.data {
        Some(PrimaryData::Single(node)) => {
            let resource = codec::write_resource(registry, graph, *node, "$.data")?;
            members.insert(NAME_DATA.to_string(), resource);
        }
        Some(PrimaryData::Collection(nodes)) => {
            let resources = write_resources(registry, graph, nodes, "$.data")?;
            members.insert(NAME_DATA.to_string(), Value::Array(resources));
        }
        // Meta alone is a complete document; included resources still need `data`.
        None if document.meta.is_some() && included.as_ref().is_none_or(Vec::is_empty) => {
            return Ok(Value::Object(members));
        }
        None => {
            members.insert(NAME_DATA.to_string(), Value::Null);
        }
    }

    if let Some(included) = &included {
        let resources = write_resources(registry, graph, included, "$.included")?;
        members.insert(NAME_INCLUDED.to_string(), Value::Array(resources));
    }

    log::debug!(
        "encoded data document with {} primary and {} included resource(s)",
        document.primary_refs().len(),
        included.as_ref().map_or(0, Vec::len)
    );
    Ok(Value::Object(members))
}

fn write_resources(
    registry: &Registry,
    graph: &ResourceGraph,
    nodes: &[NodeRef],
    path: &str,
) -> Result<Vec<Value>, JsonApiError> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| codec::write_resource(registry, graph, *node, &format!("{path}[{index}]")))
        .collect()
}

fn write_errors_document(document: &ErrorsDocument) -> Result<Value, JsonApiError> {
    let mut members = Map::new();
    write_top_level(
        &mut members,
        document.jsonapi.as_ref(),
        document.meta.as_ref(),
        document.links.as_ref(),
    )?;
    members.insert(NAME_ERRORS.to_string(), write_leaf(&document.errors, "$.errors")?);
    log::debug!("encoded errors document with {} error(s)", document.errors.len());
    Ok(Value::Object(members))
}

fn write_top_level(
    members: &mut Map<String, Value>,
    jsonapi: Option<&JsonApiObject>,
    meta: Option<&Meta>,
    links: Option<&Links>,
) -> Result<(), JsonApiError> {
    if let Some(jsonapi) = jsonapi {
        members.insert(NAME_JSONAPI.to_string(), write_leaf(jsonapi, "$.jsonapi")?);
    }
    if let Some(meta) = meta {
        members.insert(NAME_META.to_string(), Value::Object(meta.clone()));
    }
    if let Some(links) = links {
        members.insert(NAME_LINKS.to_string(), write_leaf(links, "$.links")?);
    }
    Ok(())
}

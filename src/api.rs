use crate::binder::bind_relationships;
use crate::codec;
use crate::document::{self, Document, IncludedPolicy, Shape};
use crate::error::JsonApiError;
use crate::graph::ResourceGraph;
use crate::registry::Registry;
use crate::resource::NodeRef;
use crate::utils::get_offset;
use miette::{NamedSource, SourceSpan};
use serde_json::Value;
use std::fs;
use std::path::Path;

const DEFAULT_SOURCE_NAME: &str = "document.json";

/// Entry point for reading and writing JSON:API documents.
///
/// Wraps an immutable [`Registry`]; one `JsonApi` can serve any number of
/// documents, each decoded into its own [`ResourceGraph`].
#[derive(Debug, Clone, Default)]
pub struct JsonApi {
    registry: Registry,
}

impl JsonApi {
    pub fn new(registry: Registry) -> Self {
        JsonApi { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses and decodes a document, binding every relationship between the
    /// resources it contains.
    ///
    /// # Errors
    /// Returns a `Syntax` diagnostic if `text` is not JSON, and any decoding error
    /// of [`JsonApi::read_value`].
    pub fn read_document(&self, text: &str, shape: Shape) -> Result<Document, JsonApiError> {
        self.read_document_named(text, DEFAULT_SOURCE_NAME, shape)
    }

    /// Like [`JsonApi::read_document`], naming the source in syntax diagnostics.
    ///
    /// # Errors
    /// See [`JsonApi::read_document`].
    pub fn read_document_named(
        &self,
        text: &str,
        name: &str,
        shape: Shape,
    ) -> Result<Document, JsonApiError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| syntax_error(text, name, &err))?;
        self.read_value(value, shape)
    }

    /// Reads and decodes the document stored at `path`.
    ///
    /// # Errors
    /// Returns an `Io` error when the file cannot be read, otherwise see
    /// [`JsonApi::read_document`].
    pub fn read_document_from_path(
        &self,
        path: impl AsRef<Path>,
        shape: Shape,
    ) -> Result<Document, JsonApiError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|err| JsonApiError::Io {
            path: name.clone(),
            message: err.to_string(),
        })?;
        self.read_document_named(&text, &name, shape)
    }

    /// Decodes a document from an already parsed JSON value.
    ///
    /// # Errors
    /// Returns format errors for documents that violate the JSON:API structure,
    /// configuration errors for mismatched relationship fields and the registry
    /// errors of the resource codec.
    pub fn read_value(&self, value: Value, shape: Shape) -> Result<Document, JsonApiError> {
        document::read_document(&self.registry, value, shape)
    }

    /// Decodes a single resource into `graph`. Its relationships are bound against
    /// itself only, so only self references resolve.
    ///
    /// # Errors
    /// See [`JsonApi::read_value`].
    pub fn read_resource(
        &self,
        graph: &mut ResourceGraph,
        value: Value,
    ) -> Result<Option<NodeRef>, JsonApiError> {
        let Some((object, node)) = codec::read_resource(&self.registry, graph, value, "$")? else {
            return Ok(None);
        };
        bind_relationships(graph, &[(object, node)])?;
        Ok(Some(node))
    }

    /// Encodes a document into a JSON value.
    ///
    /// # Errors
    /// Returns configuration errors for resources of unregistered native types and
    /// format errors for resources without a valid identity.
    pub fn write_value(
        &self,
        document: &Document,
        policy: IncludedPolicy,
    ) -> Result<Value, JsonApiError> {
        document::write_document(&self.registry, document, policy)
    }

    /// Encodes a document into compact JSON text.
    ///
    /// # Errors
    /// See [`JsonApi::write_value`].
    pub fn write_document(
        &self,
        document: &Document,
        policy: IncludedPolicy,
    ) -> Result<String, JsonApiError> {
        let value = self.write_value(document, policy)?;
        serde_json::to_string(&value).map_err(|err| JsonApiError::format(err.to_string(), "$"))
    }

    /// Encodes a document into pretty-printed JSON text.
    ///
    /// # Errors
    /// See [`JsonApi::write_value`].
    pub fn write_document_pretty(
        &self,
        document: &Document,
        policy: IncludedPolicy,
    ) -> Result<String, JsonApiError> {
        let value = self.write_value(document, policy)?;
        serde_json::to_string_pretty(&value)
            .map_err(|err| JsonApiError::format(err.to_string(), "$"))
    }

    /// Encodes the resource at `node` as a resource object.
    ///
    /// # Errors
    /// See [`JsonApi::write_value`].
    pub fn write_resource(
        &self,
        graph: &ResourceGraph,
        node: NodeRef,
    ) -> Result<Value, JsonApiError> {
        codec::write_resource(&self.registry, graph, node, "$")
    }
}

fn syntax_error(source: &str, name: &str, err: &serde_json::Error) -> JsonApiError {
    let offset = get_offset(source, err.line(), err.column());
    let length = usize::from(offset < source.len());
    JsonApiError::Syntax {
        src: NamedSource::new(name, source.to_string()),
        span: SourceSpan::new(offset.into(), length),
        message: err.to_string(),
    }
}

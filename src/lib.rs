pub mod api;
pub mod binder;
pub mod codec;
pub mod document;
pub mod error;
pub mod graph;
pub mod included;
pub mod model;
pub mod registry;
pub mod resource;
pub mod utils;

pub use api::JsonApi;
pub use document::{DataDocument, Document, ErrorsDocument, IncludedPolicy, PrimaryData, Shape};
pub use error::JsonApiError;
pub use graph::ResourceGraph;
pub use model::{
    ErrorObject, ErrorSource, JsonApiObject, Link, LinkObject, Links, Meta, Relationship,
    Relationships, ResourceIdentifier, ResourceObject,
};
pub use registry::{Registry, RegistryBuilder};
pub use resource::{
    Cardinality, Linked, NodeRef, RelationshipField, Resource, ResourceRef, ResourceType,
};

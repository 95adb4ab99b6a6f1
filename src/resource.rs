//! The metadata interface between native resource types and the codec.
//!
//! A native resource exposes its identity, links, meta and relationship fields
//! through [`Resource`]. Relationship fields hold [`ResourceRef`] handles into the
//! [`ResourceGraph`](crate::graph::ResourceGraph) that owns the document, which
//! lets cyclic graphs be represented without shared ownership.

use crate::error::JsonApiError;
use crate::model::{Links, Meta, Relationships};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Upcast helper so that `dyn Resource` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Metadata accessor for a native resource.
///
/// Only `resource_type`, `id` and `set_id` are required. Everything else has a
/// default that describes a resource without that piece of metadata.
///
/// Fields exposed here are not attributes: mark them `#[serde(skip)]` so the
/// attribute codec does not see them.
pub trait Resource: AsAny + fmt::Debug + 'static {
    /// The `type` of this resource instance.
    fn resource_type(&self) -> &str;

    /// Stores a decoded `type`. Types that do not keep a type field ignore it.
    fn set_resource_type(&mut self, _type_name: String) {}

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    fn lid(&self) -> Option<&str> {
        None
    }

    fn set_lid(&mut self, _lid: Option<String>) {}

    fn links(&self) -> Option<&Links> {
        None
    }

    fn set_links(&mut self, _links: Option<Links>) {}

    fn meta(&self) -> Option<&Meta> {
        None
    }

    fn set_meta(&mut self, _meta: Option<Meta>) {}

    /// The raw relationships object, kept alongside the bound fields.
    fn relationships(&self) -> Option<&Relationships> {
        None
    }

    fn set_relationships(&mut self, _relationships: Option<Relationships>) {}

    /// Relationship fields of this type, with their declared name and cardinality.
    fn relationship_fields(&self) -> &'static [RelationshipField] {
        &[]
    }

    /// Current value of the relationship field `name`; `None` when the field is unset.
    fn linked(&self, _name: &str) -> Option<Linked> {
        None
    }

    /// Assigns the resolved value of the relationship field `name`.
    ///
    /// # Errors
    /// Returns a configuration error when `linked` cannot be stored in the field.
    fn bind(&mut self, _name: &str, _linked: Linked) -> Result<(), JsonApiError> {
        Ok(())
    }
}

/// A native resource type that can be registered with a
/// [`Registry`](crate::registry::Registry). Attributes go through serde.
pub trait ResourceType: Resource + Serialize + DeserializeOwned {
    /// The type name this native type declares for itself.
    const TYPE: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => write!(f, "to-one"),
            Cardinality::ToMany => write!(f, "to-many"),
        }
    }
}

/// Describes one relationship field of a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipField {
    pub name: &'static str,
    pub cardinality: Cardinality,
}

impl RelationshipField {
    pub const fn to_one(name: &'static str) -> Self {
        RelationshipField {
            name,
            cardinality: Cardinality::ToOne,
        }
    }

    pub const fn to_many(name: &'static str) -> Self {
        RelationshipField {
            name,
            cardinality: Cardinality::ToMany,
        }
    }
}

/// Untyped handle to a node of a [`ResourceGraph`](crate::graph::ResourceGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) index: usize,
    pub(crate) type_id: TypeId,
}

impl NodeRef {
    pub fn index(&self) -> usize {
        self.index
    }

    /// True if the node holds a `T`.
    pub fn is<T: Resource>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Narrows this handle to a typed one if the node holds a `T`.
    pub fn downcast<T: Resource>(self) -> Option<ResourceRef<T>> {
        self.is::<T>().then(|| ResourceRef::new(self.index))
    }
}

/// Typed handle to a `T` stored in a [`ResourceGraph`](crate::graph::ResourceGraph).
pub struct ResourceRef<T> {
    index: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T> ResourceRef<T> {
    pub(crate) fn new(index: usize) -> Self {
        ResourceRef {
            index,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T: Resource> ResourceRef<T> {
    pub fn erase(self) -> NodeRef {
        NodeRef {
            index: self.index,
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T: Resource> From<ResourceRef<T>> for NodeRef {
    fn from(reference: ResourceRef<T>) -> Self {
        reference.erase()
    }
}

impl<T> Clone for ResourceRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceRef<T> {}

impl<T> PartialEq for ResourceRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for ResourceRef<T> {}

impl<T> Hash for ResourceRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for ResourceRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceRef<{}>({})", type_name::<T>(), self.index)
    }
}

/// The value of a relationship field, in graph handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linked {
    ToOne(Option<NodeRef>),
    ToMany(Vec<NodeRef>),
}

impl Linked {
    pub fn one<T: Resource>(target: ResourceRef<T>) -> Self {
        Linked::ToOne(Some(target.erase()))
    }

    pub fn many<T: Resource>(targets: &[ResourceRef<T>]) -> Self {
        Linked::ToMany(targets.iter().map(|target| target.erase()).collect())
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Linked::ToOne(_) => Cardinality::ToOne,
            Linked::ToMany(_) => Cardinality::ToMany,
        }
    }

    /// Every node this value references, in order.
    pub fn targets(&self) -> Vec<NodeRef> {
        match self {
            Linked::ToOne(target) => target.iter().copied().collect(),
            Linked::ToMany(targets) => targets.clone(),
        }
    }

    /// Reads a to-one value whose target may be of any type.
    ///
    /// # Errors
    /// Returns a configuration error for a to-many value.
    pub fn into_one_node(self) -> Result<Option<NodeRef>, JsonApiError> {
        match self {
            Linked::ToOne(target) => Ok(target),
            Linked::ToMany(_) => Err(JsonApiError::configuration(
                "Cannot bind a to-many relationship to a to-one field.",
            )),
        }
    }

    /// Reads a to-many value whose targets may be of any type.
    ///
    /// # Errors
    /// Returns a configuration error for a to-one value.
    pub fn into_many_nodes(self) -> Result<Vec<NodeRef>, JsonApiError> {
        match self {
            Linked::ToMany(targets) => Ok(targets),
            Linked::ToOne(_) => Err(JsonApiError::configuration(
                "Cannot bind a to-one relationship to a to-many field.",
            )),
        }
    }

    /// Reads a to-one value as a handle to `T`.
    ///
    /// # Errors
    /// Returns a configuration error for a to-many value or a target that is not a `T`.
    pub fn into_one<T: Resource>(self) -> Result<Option<ResourceRef<T>>, JsonApiError> {
        self.into_one_node()?.map(typed::<T>).transpose()
    }

    /// Reads a to-many value as handles to `T`.
    ///
    /// # Errors
    /// Returns a configuration error for a to-one value or a target that is not a `T`.
    pub fn into_many<T: Resource>(self) -> Result<Vec<ResourceRef<T>>, JsonApiError> {
        self.into_many_nodes()?.into_iter().map(typed::<T>).collect()
    }
}

fn typed<T: Resource>(node: NodeRef) -> Result<ResourceRef<T>, JsonApiError> {
    node.downcast::<T>().ok_or_else(|| {
        JsonApiError::configuration(format!(
            "Resource at node {} is not assignable to a field of type {}. \
             Verify that relationships are correctly defined and that the type is registered.",
            node.index,
            type_name::<T>()
        ))
    })
}

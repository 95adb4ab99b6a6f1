use crate::error::JsonApiError;
use crate::model::ResourceIdentifier;
use crate::resource::{AsAny, NodeRef, Resource, ResourceRef};
use std::any::Any;
use std::ops::{Index, IndexMut};

/// Arena owning the native resources of one document.
///
/// Relationship fields point at other nodes of the same graph through
/// [`ResourceRef`] handles, so self references and cycles need no shared ownership.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: Vec<Box<dyn Resource>>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Resource>(&mut self, resource: T) -> ResourceRef<T> {
        self.nodes.push(Box::new(resource));
        ResourceRef::new(self.nodes.len() - 1)
    }

    pub(crate) fn insert_boxed(&mut self, resource: Box<dyn Resource>) -> NodeRef {
        let node: &dyn Resource = &*resource;
        let type_id = AsAny::as_any(node).type_id();
        self.nodes.push(resource);
        NodeRef {
            index: self.nodes.len() - 1,
            type_id,
        }
    }

    pub fn get<T: Resource>(&self, reference: ResourceRef<T>) -> Option<&T> {
        let node: &dyn Resource = &**self.nodes.get(reference.index())?;
        AsAny::as_any(node).downcast_ref::<T>()
    }

    pub fn get_mut<T: Resource>(&mut self, reference: ResourceRef<T>) -> Option<&mut T> {
        let node: &mut dyn Resource = &mut **self.nodes.get_mut(reference.index())?;
        AsAny::as_any_mut(node).downcast_mut::<T>()
    }

    pub fn node(&self, reference: NodeRef) -> Option<&dyn Resource> {
        self.nodes.get(reference.index).map(|node| &**node)
    }

    pub fn node_mut(&mut self, reference: NodeRef) -> Option<&mut (dyn Resource + 'static)> {
        self.nodes.get_mut(reference.index).map(|node| &mut **node)
    }

    /// Downcasts the node behind an untyped handle.
    pub fn downcast<T: Resource>(&self, reference: NodeRef) -> Option<&T> {
        self.get(reference.downcast::<T>()?)
    }

    /// Handle to the node at `index`.
    pub fn node_ref(&self, index: usize) -> Option<NodeRef> {
        let node: &dyn Resource = &**self.nodes.get(index)?;
        let as_any: &dyn Any = AsAny::as_any(node);
        Some(NodeRef {
            index,
            type_id: as_any.type_id(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &dyn Resource)> + '_ {
        self.nodes.iter().enumerate().map(|(index, node)| {
            let node: &dyn Resource = &**node;
            let reference = NodeRef {
                index,
                type_id: AsAny::as_any(node).type_id(),
            };
            (reference, node)
        })
    }

    /// Reads the identifier of a node through its metadata.
    ///
    /// # Errors
    /// Returns a configuration error for a dangling handle, and a format error when
    /// the resource has a blank type or neither `id` nor `lid`.
    pub fn identifier(&self, reference: NodeRef) -> Result<ResourceIdentifier, JsonApiError> {
        let node = self.node(reference).ok_or_else(|| dangling(reference))?;
        identifier_of(node)
    }
}

impl<T: Resource> Index<ResourceRef<T>> for ResourceGraph {
    type Output = T;

    fn index(&self, reference: ResourceRef<T>) -> &T {
        match self.get(reference) {
            Some(resource) => resource,
            None => panic!("no {reference:?} in this graph"),
        }
    }
}

impl<T: Resource> IndexMut<ResourceRef<T>> for ResourceGraph {
    fn index_mut(&mut self, reference: ResourceRef<T>) -> &mut T {
        match self.get_mut(reference) {
            Some(resource) => resource,
            None => panic!("no {reference:?} in this graph"),
        }
    }
}

pub(crate) fn dangling(reference: NodeRef) -> JsonApiError {
    JsonApiError::configuration(format!(
        "Relationship references node {} which is not part of this graph.",
        reference.index
    ))
}

/// Identifier of a native resource, validated like a decoded one.
pub(crate) fn identifier_of(resource: &dyn Resource) -> Result<ResourceIdentifier, JsonApiError> {
    let type_name = resource.resource_type();
    if type_name.trim().is_empty() {
        return Err(JsonApiError::format(
            "A resource MUST contain a non-empty type.",
            "$.type",
        ));
    }
    let id = resource.id().map(str::to_string);
    let lid = resource.lid().map(str::to_string);
    if is_blank(id.as_deref()) && is_blank(lid.as_deref()) {
        return Err(JsonApiError::format(
            format!("A resource of type '{type_name}' MUST contain an 'id' or 'lid' but both were null or blank."),
            "$.id",
        ));
    }
    Ok(ResourceIdentifier {
        type_name: type_name.to_string(),
        id,
        lid,
        meta: None,
    })
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

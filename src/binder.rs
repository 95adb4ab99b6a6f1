//! Resolves relationship linkage into graph handles.
//!
//! Binding runs in two passes over the decoded `(ResourceObject, NodeRef)` pairs of
//! one document. The index pass maps every identifier to its node, the bind pass
//! assigns relationship fields. No field is touched before the index is complete,
//! so self references and cycles resolve like any other reference.

use crate::error::JsonApiError;
use crate::graph::{dangling, ResourceGraph};
use crate::model::{Relationship, ResourceIdentifier, ResourceObject};
use crate::resource::{Cardinality, Linked, NodeRef};
use std::collections::HashMap;

/// Identifier index over the resources of one document.
#[derive(Debug, Default)]
pub struct RelationshipPool {
    index: HashMap<ResourceIdentifier, NodeRef>,
}

impl RelationshipPool {
    /// Indexes `pairs` in order. When an identifier occurs more than once the
    /// earliest pair wins.
    pub fn index(pairs: &[(ResourceObject, NodeRef)]) -> Self {
        let mut index = HashMap::with_capacity(pairs.len());
        for (object, node) in pairs {
            index.entry(object.identifier()).or_insert(*node);
        }
        RelationshipPool { index }
    }

    pub fn resolve(&self, identifier: &ResourceIdentifier) -> Option<NodeRef> {
        self.index.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Assigns the relationship fields of every resource in `pairs`.
    ///
    /// Unresolved linkage is not an error: a to-one field becomes empty and
    /// unresolved members of a to-many field are dropped.
    ///
    /// # Errors
    /// Returns a configuration error when a decoded relationship does not match
    /// the cardinality of its field, or when a resolved target cannot be stored in
    /// the field.
    pub fn bind(
        &self,
        graph: &mut ResourceGraph,
        pairs: &[(ResourceObject, NodeRef)],
    ) -> Result<(), JsonApiError> {
        for (object, node) in pairs {
            let Some(relationships) = &object.relationships else {
                continue;
            };
            let resource = graph.node_mut(*node).ok_or_else(|| dangling(*node))?;

            for field in resource.relationship_fields() {
                let Some(relationship) = relationships.get(field.name) else {
                    continue;
                };

                let linked = match (field.cardinality, relationship) {
                    (Cardinality::ToOne, Relationship::ToOne { data, .. }) => {
                        Linked::ToOne(data.as_ref().and_then(|identifier| {
                            self.resolve_logged(identifier, object, field.name)
                        }))
                    }
                    (Cardinality::ToMany, Relationship::ToMany { data, .. }) => Linked::ToMany(
                        data.iter()
                            .filter_map(|identifier| {
                                self.resolve_logged(identifier, object, field.name)
                            })
                            .collect(),
                    ),
                    // Links or meta only: nothing to bind.
                    (_, Relationship::Unlinked { .. }) => continue,
                    (declared, Relationship::ToOne { .. } | Relationship::ToMany { .. }) => {
                        let found = match declared {
                            Cardinality::ToOne => Cardinality::ToMany,
                            Cardinality::ToMany => Cardinality::ToOne,
                        };
                        return Err(JsonApiError::configuration(format!(
                            "Relationship '{}' of '{}' is declared {} but the document holds a {} relationship.",
                            field.name,
                            object.identifier(),
                            declared,
                            found
                        )));
                    }
                };

                resource.bind(field.name, linked)?;
            }
        }
        Ok(())
    }

    fn resolve_logged(
        &self,
        identifier: &ResourceIdentifier,
        owner: &ResourceObject,
        field: &str,
    ) -> Option<NodeRef> {
        let resolved = self.resolve(identifier);
        if resolved.is_none() {
            log::trace!(
                "unresolved linkage {} in relationship '{}' of {}",
                identifier,
                field,
                owner.identifier()
            );
        }
        resolved
    }
}

/// Indexes `pairs` and binds their relationship fields in one call.
///
/// # Errors
/// See [`RelationshipPool::bind`].
pub fn bind_relationships(
    graph: &mut ResourceGraph,
    pairs: &[(ResourceObject, NodeRef)],
) -> Result<(), JsonApiError> {
    RelationshipPool::index(pairs).bind(graph, pairs)
}

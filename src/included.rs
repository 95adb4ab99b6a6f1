use crate::error::JsonApiError;
use crate::graph::{dangling, ResourceGraph};
use crate::model::ResourceIdentifier;
use crate::resource::NodeRef;
use std::collections::{HashSet, VecDeque};

/// Computes the resources reachable from `primary` that belong in `included`.
///
/// Resources are keyed by identity, never by node, so two nodes with the same
/// identifier count once. The caller's `included` list seeds the result in its own
/// order (first occurrence wins, primary resources are skipped); everything else
/// follows breadth first in discovery order. Returns `None` when nothing is left.
///
/// # Errors
/// Returns a format error for a reachable resource without a valid identity and a
/// configuration error for a dangling handle.
pub fn collect_included(
    graph: &ResourceGraph,
    primary: &[NodeRef],
    included: Option<&[NodeRef]>,
) -> Result<Option<Vec<NodeRef>>, JsonApiError> {
    let mut primary_ids = HashSet::with_capacity(primary.len());
    for node in primary {
        primary_ids.insert(graph.identifier(*node)?);
    }

    let mut known: HashSet<ResourceIdentifier> = HashSet::new();
    let mut result = Vec::new();
    let mut pending = VecDeque::new();

    for node in included.unwrap_or_default() {
        let identifier = graph.identifier(*node)?;
        if primary_ids.contains(&identifier) || !known.insert(identifier) {
            continue;
        }
        result.push(*node);
        pending.push_back(*node);
    }

    // Primary resources are expanded first, then the queue of included entries.
    let mut expand = |node: NodeRef,
                      pending: &mut VecDeque<NodeRef>,
                      result: &mut Vec<NodeRef>|
     -> Result<(), JsonApiError> {
        let resource = graph.node(node).ok_or_else(|| dangling(node))?;
        for field in resource.relationship_fields() {
            let Some(linked) = resource.linked(field.name) else {
                continue;
            };
            for target in linked.targets() {
                let identifier = graph.identifier(target)?;
                if primary_ids.contains(&identifier) || !known.insert(identifier) {
                    continue;
                }
                log::trace!("including node {} reached through '{}'", target.index(), field.name);
                result.push(target);
                pending.push_back(target);
            }
        }
        Ok(())
    };

    for node in primary {
        expand(*node, &mut pending, &mut result)?;
    }
    while let Some(node) = pending.pop_front() {
        expand(node, &mut pending, &mut result)?;
    }

    Ok((!result.is_empty()).then_some(result))
}

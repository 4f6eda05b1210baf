//! Strongly connected component decomposition
//!
//! Tarjan's algorithm over the id graph, converted to an explicit work
//! stack so the recursion depth is bounded by the vertex count rather than
//! the call stack. The result always starts with the bucket of singleton
//! components (possibly empty) so downstream stages can index it blindly;
//! non-singleton components follow in the order their roots closed.

use ahash::{AHashMap, AHashSet};
use tracing::{debug, info};

use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::IdGraph;

/// Components found in one graph. Index 0 is always the singleton bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SccForest {
    components: Vec<Vec<usize>>,
}

impl SccForest {
    /// Every vertex whose component has size one, in closure order.
    pub fn singleton_bucket(&self) -> &[usize] {
        &self.components[0]
    }

    /// Non-singleton components in closure order, root first within each.
    pub fn non_singletons(&self) -> impl Iterator<Item = &[usize]> {
        self.components[1..].iter().map(Vec::as_slice)
    }

    /// Full component list; the bucket sits at index 0 even when empty.
    pub fn components(&self) -> &[Vec<usize>] {
        &self.components
    }

    pub fn non_singleton_count(&self) -> usize {
        self.components.len() - 1
    }
}

#[derive(Debug)]
struct Frame {
    vertex: usize,
    children: Vec<usize>,
    next: usize,
}

#[derive(Debug, Clone, Copy)]
struct Discovery {
    index: usize,
    lowlink: usize,
}

/// Runs the decomposition over every vertex of `graph`, in insertion
/// order, so the output is deterministic for a given construction history.
pub fn find_sccs(graph: &IdGraph, cancel: &CancelToken) -> Result<SccForest, PipelineError> {
    let mut discovery: AHashMap<usize, Discovery> = AHashMap::new();
    let mut on_stack: AHashSet<usize> = AHashSet::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut counter = 0usize;

    let mut bucket: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();

    for &root in graph.vertices().collect::<Vec<_>>() {
        cancel.checkpoint()?;
        if discovery.contains_key(&root) {
            continue;
        }
        discovery.insert(
            root,
            Discovery {
                index: counter,
                lowlink: counter,
            },
        );
        counter += 1;
        stack.push(root);
        on_stack.insert(root);
        let mut frames = vec![Frame {
            vertex: root,
            children: graph.children(&root).copied().collect(),
            next: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next];
                frame.next += 1;
                if let Some(seen) = discovery.get(&child) {
                    if on_stack.contains(&child) {
                        let child_index = seen.index;
                        let entry = discovery
                            .get_mut(&frame.vertex)
                            .expect("frame vertex was discovered");
                        entry.lowlink = entry.lowlink.min(child_index);
                    }
                } else {
                    discovery.insert(
                        child,
                        Discovery {
                            index: counter,
                            lowlink: counter,
                        },
                    );
                    counter += 1;
                    stack.push(child);
                    on_stack.insert(child);
                    frames.push(Frame {
                        vertex: child,
                        children: graph.children(&child).copied().collect(),
                        next: 0,
                    });
                }
            } else {
                let vertex = frame.vertex;
                frames.pop();
                let closed = discovery[&vertex];
                if let Some(parent) = frames.last() {
                    let entry = discovery
                        .get_mut(&parent.vertex)
                        .expect("parent frame vertex was discovered");
                    entry.lowlink = entry.lowlink.min(closed.lowlink);
                }
                if closed.lowlink == closed.index {
                    let mut members = Vec::new();
                    loop {
                        let member = stack.pop().expect("tarjan stack holds the component");
                        on_stack.remove(&member);
                        members.push(member);
                        if member == vertex {
                            break;
                        }
                    }
                    members.reverse();
                    if members.len() == 1 {
                        bucket.push(members[0]);
                    } else {
                        debug!(size = members.len(), root = vertex, "closed component");
                        components.push(members);
                    }
                }
            }
        }
    }

    info!(
        singletons = bucket.len(),
        components = components.len(),
        "scc decomposition finished"
    );
    let mut all = Vec::with_capacity(components.len() + 1);
    all.push(bucket);
    all.extend(components);
    Ok(SccForest { components: all })
}

//! Sub-graph to DAG transformation
//!
//! Classifies every interior edge of a sub-graph with a three-colour DFS
//! and rebuilds the graph acyclically over the member vertices and their
//! duplicates: tree, forward and cross edges are mirrored into both
//! layers, while a back edge crosses from the original layer into the
//! duplicate one, which breaks the cycle.
//!
//! Construction order matters for the synthetic endpoints. Edges are
//! seeded from the sub-graph's `r` and `r'` first and the DFS runs next.
//! When `r` seeded nothing, every vertex without an in-edge is attached to
//! it. Vertices unreachable from `r` are then dropped; if that removed
//! every edge into `r'`, the remaining sinks are attached to it. A final
//! backward pass drops vertices that cannot reach `r'`, leaving a graph in
//! which every vertex lies on some `r` to `r'` path.

use std::collections::VecDeque;

use ahash::AHashSet;
use tracing::debug;

use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::MultiDigraph;
use crate::graph::dag::DagGraph;
use crate::graph::subgraph::{SubGraph, SOURCE, TERMINAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

#[derive(Debug)]
struct Frame {
    vertex: usize,
    children: Vec<usize>,
    next: usize,
}

/// Converts one sub-graph into its vertex-duplicated DAG.
pub fn dagify(
    sub: &SubGraph,
    name: impl Into<String>,
    cancel: &CancelToken,
) -> Result<DagGraph, PipelineError> {
    let n = sub.interior_count();
    let mut dag = DagGraph::new(name, sub);
    let sub_graph = sub.graph();

    // Entrance edges target originals, terminal edges leave the duplicates.
    let mut seeded_source = false;
    for &child in sub_graph.children(&SOURCE).collect::<Vec<_>>() {
        if child != TERMINAL {
            dag.graph_mut().add_edge(&SOURCE, &child)?;
            seeded_source = true;
        }
    }
    for &parent in sub_graph.parents(&TERMINAL).collect::<Vec<_>>() {
        if parent != SOURCE {
            let duplicate = dag.dup(parent).ok_or_else(|| {
                PipelineError::InternalInconsistency(format!(
                    "terminal parent {parent} has no duplicate partner"
                ))
            })?;
            dag.graph_mut().add_edge(&duplicate, &TERMINAL)?;
        }
    }

    if n > 0 {
        let root = if sub_graph.out_degree(&SOURCE)? > 0 {
            SOURCE
        } else {
            2
        };
        classify_edges(sub, &mut dag, root, cancel)?;
    }

    if !seeded_source {
        let orphans = collect_degree_zero(dag.graph(), Degree::In)?;
        for vertex in orphans {
            dag.graph_mut().add_edge(&SOURCE, &vertex)?;
        }
    }

    let forward = reachable_forward(dag.graph());
    prune(&mut dag, forward, cancel)?;

    if dag.graph().in_degree(&TERMINAL)? == 0 {
        let sinks = collect_degree_zero(dag.graph(), Degree::Out)?;
        for vertex in sinks {
            dag.graph_mut().add_edge(&vertex, &TERMINAL)?;
        }
    }

    let backward = reachable_backward(dag.graph());
    prune(&mut dag, backward, cancel)?;

    debug!(
        name = dag.name(),
        vertices = dag.vertex_count(),
        edges = dag.graph().edge_count(),
        "sub-graph transformed"
    );
    Ok(dag)
}

/// Three-colour DFS over the sub-graph with an explicit frame stack.
fn classify_edges(
    sub: &SubGraph,
    dag: &mut DagGraph,
    root: usize,
    cancel: &CancelToken,
) -> Result<(), PipelineError> {
    let sub_graph = sub.graph();
    let mut colour = vec![Colour::White; sub_graph.vertex_count()];
    colour[root] = Colour::Grey;
    let mut frames = vec![Frame {
        vertex: root,
        children: sub_graph.children(&root).copied().collect(),
        next: 0,
    }];

    while let Some(frame) = frames.last_mut() {
        cancel.checkpoint()?;
        if frame.next >= frame.children.len() {
            colour[frame.vertex] = Colour::Black;
            frames.pop();
            continue;
        }
        let child = frame.children[frame.next];
        frame.next += 1;
        let vertex = frame.vertex;
        let interior = vertex >= 2 && child >= 2;
        match colour[child] {
            Colour::White => {
                if interior {
                    mirror_edge(dag, vertex, child)?;
                }
                colour[child] = Colour::Grey;
                frames.push(Frame {
                    vertex: child,
                    children: sub_graph.children(&child).copied().collect(),
                    next: 0,
                });
            }
            Colour::Grey => {
                // Back edge: cross into the duplicate layer instead.
                if interior {
                    let duplicate = dup_of(dag, child)?;
                    dag.graph_mut().add_edge(&vertex, &duplicate)?;
                }
            }
            Colour::Black => {
                // Forward or cross edge, mirrored like a tree edge.
                if interior {
                    mirror_edge(dag, vertex, child)?;
                }
            }
        }
    }
    Ok(())
}

fn mirror_edge(dag: &mut DagGraph, from: usize, to: usize) -> Result<(), PipelineError> {
    let from_dup = dup_of(dag, from)?;
    let to_dup = dup_of(dag, to)?;
    dag.graph_mut().add_edge(&from, &to)?;
    dag.graph_mut().add_edge(&from_dup, &to_dup)?;
    Ok(())
}

fn dup_of(dag: &DagGraph, local: usize) -> Result<usize, PipelineError> {
    dag.dup(local).ok_or_else(|| {
        PipelineError::InternalInconsistency(format!(
            "interior vertex {local} has no duplicate partner"
        ))
    })
}

#[derive(Debug, Clone, Copy)]
enum Degree {
    In,
    Out,
}

fn collect_degree_zero(
    graph: &MultiDigraph<usize>,
    which: Degree,
) -> Result<Vec<usize>, PipelineError> {
    let mut found = Vec::new();
    for &vertex in graph.vertices() {
        if vertex < 2 {
            continue;
        }
        let degree = match which {
            Degree::In => graph.in_degree(&vertex)?,
            Degree::Out => graph.out_degree(&vertex)?,
        };
        if degree == 0 {
            found.push(vertex);
        }
    }
    Ok(found)
}

fn reachable_forward(graph: &MultiDigraph<usize>) -> AHashSet<usize> {
    flood(graph, SOURCE, false)
}

fn reachable_backward(graph: &MultiDigraph<usize>) -> AHashSet<usize> {
    flood(graph, TERMINAL, true)
}

fn flood(graph: &MultiDigraph<usize>, start: usize, reverse: bool) -> AHashSet<usize> {
    let mut seen = AHashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(vertex) = queue.pop_front() {
        let next: Vec<usize> = if reverse {
            graph.parents(&vertex).copied().collect()
        } else {
            graph.children(&vertex).copied().collect()
        };
        for neighbour in next {
            if seen.insert(neighbour) {
                queue.push_back(neighbour);
            }
        }
    }
    seen
}

/// Drops every interior vertex outside `keep`.
fn prune(
    dag: &mut DagGraph,
    keep: AHashSet<usize>,
    cancel: &CancelToken,
) -> Result<(), PipelineError> {
    let doomed: Vec<usize> = dag
        .graph()
        .vertices()
        .copied()
        .filter(|&v| v >= 2 && !keep.contains(&v))
        .collect();
    for vertex in doomed {
        cancel.checkpoint()?;
        dag.graph_mut().remove_vertex(&vertex)?;
        dag.forget_global(vertex);
    }
    Ok(())
}

//! Superbubble detection on one DAG
//!
//! The finder runs in five phases: a topological ordering from an
//! iterative post-order DFS, candidate generation in that order, the
//! out-child and out-parent extrema arrays, range-query structures over
//! them, and a backward validation scan over the candidates.
//!
//! Validation pairs each entrance candidate with the nearest unmatched
//! exit candidate and accepts the pair when no child in the enclosed
//! range escapes past the exit and no parent reaches in from before the
//! entrance. A reported entrance is consumed, so it can no longer serve
//! as the exit of an enclosing pair; pairs with an empty interior and
//! pairs touching the synthetic endpoints are rejected.

use tracing::debug;

use crate::algorithm::superbubble::rmq::{Extremum, RangeQuery};
use crate::algorithm::superbubble::SuperBubble;
use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::graph::dag::DagGraph;
use crate::graph::subgraph::{SOURCE, TERMINAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateKind {
    Entrance,
    Exit,
}

/// A vertex flagged during the candidate walk, in topological order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub(crate) vertex: usize,
    pub(crate) kind: CandidateKind,
}

/// Topological ordering of one DAG: `inv[i]` is the vertex at position
/// `i`, `ord[v]` the position of vertex `v` (dense over local ids).
#[derive(Debug, Clone)]
pub(crate) struct TopoOrder {
    pub(crate) inv: Vec<usize>,
    pub(crate) ord: Vec<usize>,
}

const UNPLACED: usize = usize::MAX;

impl TopoOrder {
    pub(crate) fn position(&self, vertex: usize) -> usize {
        self.ord[vertex]
    }
}

/// Phase A: iterative post-order DFS from `r`, reversed into a
/// topological order. A grey target means a directed cycle.
pub(crate) fn topological_order(
    dag: &DagGraph,
    cancel: &CancelToken,
) -> Result<TopoOrder, PipelineError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Colour {
        White,
        Grey,
        Black,
    }

    let graph = dag.graph();
    let capacity = 2 + 2 * dag.interior_count();
    let mut colour = vec![Colour::White; capacity];
    let mut postorder: Vec<usize> = Vec::with_capacity(graph.vertex_count());

    struct Frame {
        vertex: usize,
        children: Vec<usize>,
        next: usize,
    }

    colour[SOURCE] = Colour::Grey;
    let mut frames = vec![Frame {
        vertex: SOURCE,
        children: graph.children(&SOURCE).copied().collect(),
        next: 0,
    }];
    while let Some(frame) = frames.last_mut() {
        cancel.checkpoint()?;
        if frame.next >= frame.children.len() {
            colour[frame.vertex] = Colour::Black;
            postorder.push(frame.vertex);
            frames.pop();
            continue;
        }
        let child = frame.children[frame.next];
        frame.next += 1;
        match colour[child] {
            Colour::White => {
                colour[child] = Colour::Grey;
                frames.push(Frame {
                    vertex: child,
                    children: graph.children(&child).copied().collect(),
                    next: 0,
                });
            }
            Colour::Grey => {
                return Err(PipelineError::NotADag {
                    from: frame.vertex,
                    to: child,
                });
            }
            Colour::Black => {}
        }
    }

    if postorder.len() != graph.vertex_count() {
        return Err(PipelineError::InternalInconsistency(format!(
            "topological sort covered {} of {} vertices",
            postorder.len(),
            graph.vertex_count()
        )));
    }
    postorder.reverse();
    let mut ord = vec![UNPLACED; capacity];
    for (position, &vertex) in postorder.iter().enumerate() {
        ord[vertex] = position;
    }
    Ok(TopoOrder {
        inv: postorder,
        ord,
    })
}

/// Phase B: walk the ordering and flag entrances and exits. A vertex that
/// is both yields its exit candidate first.
pub(crate) fn candidate_list(
    dag: &DagGraph,
    order: &TopoOrder,
) -> Result<Vec<Candidate>, PipelineError> {
    let graph = dag.graph();
    let mut candidates = Vec::new();
    for &vertex in &order.inv {
        let mut is_exit = false;
        for parent in graph.parents(&vertex) {
            if graph.out_degree(parent)? == 1 {
                is_exit = true;
                break;
            }
        }
        if is_exit {
            candidates.push(Candidate {
                vertex,
                kind: CandidateKind::Exit,
            });
        }
        let mut is_entrance = false;
        for child in graph.children(&vertex) {
            if graph.in_degree(child)? == 1 {
                is_entrance = true;
                break;
            }
        }
        if is_entrance {
            candidates.push(Candidate {
                vertex,
                kind: CandidateKind::Entrance,
            });
        }
    }
    Ok(candidates)
}

/// Phases C: furthest-forward child and furthest-back parent per
/// topological position. Childless vertices carry the minimum sentinel,
/// parentless ones the maximum.
pub(crate) fn extrema_arrays(
    dag: &DagGraph,
    order: &TopoOrder,
) -> Result<(Vec<i64>, Vec<i64>), PipelineError> {
    let graph = dag.graph();
    let n = order.inv.len();
    let mut out_child = vec![i64::MIN; n];
    let mut out_parent = vec![i64::MAX; n];
    for (position, &vertex) in order.inv.iter().enumerate() {
        for child in graph.children(&vertex) {
            out_child[position] = out_child[position].max(order.position(*child) as i64);
        }
        for parent in graph.parents(&vertex) {
            out_parent[position] = out_parent[position].min(order.position(*parent) as i64);
        }
    }
    // Checkpoint: the arrays must agree with the adjacency they were
    // derived from before range queries are trusted.
    for (position, &vertex) in order.inv.iter().enumerate() {
        let childless = graph.out_degree(&vertex)? == 0;
        if childless != (out_child[position] == i64::MIN) {
            return Err(PipelineError::InternalInconsistency(format!(
                "out-child entry at position {position} disagrees with vertex {vertex}"
            )));
        }
        let parentless = graph.in_degree(&vertex)? == 0;
        if parentless != (out_parent[position] == i64::MAX) {
            return Err(PipelineError::InternalInconsistency(format!(
                "out-parent entry at position {position} disagrees with vertex {vertex}"
            )));
        }
    }
    Ok((out_child, out_parent))
}

/// Range extrema over the phase C arrays, however they are answered.
pub(crate) trait ExtremaQuery {
    /// Max of `OutChild` over the inclusive position range.
    fn max_child(&self, low: usize, high: usize) -> i64;
    /// Min of `OutParent` over the inclusive position range.
    fn min_parent(&self, low: usize, high: usize) -> i64;
}

struct RmqExtrema<R> {
    child: R,
    parent: R,
}

impl<R: RangeQuery> ExtremaQuery for RmqExtrema<R> {
    fn max_child(&self, low: usize, high: usize) -> i64 {
        self.child.query(low, high)
    }

    fn min_parent(&self, low: usize, high: usize) -> i64 {
        self.parent.query(low, high)
    }
}

/// Phase E: the backward validation scan over the candidate list.
///
/// Unmatched exits pile on a stack. An entrance tries the nearest exit
/// and the two range conditions decide the pair's fate:
///
/// * a child escaping past the exit also escapes for every earlier
///   entrance, so that exit is dead; it is popped and the next one tried;
/// * a parent reaching in from before the entrance would keep reaching in
///   for any exit further down, so the entrance is abandoned instead and
///   the exit stays for an earlier entrance;
/// * both conditions holding reports the pair; the entrance replaces the
///   exit on the stack but is marked, so it can close nothing later.
pub(crate) fn validate_candidates(
    dag: &DagGraph,
    order: &TopoOrder,
    candidates: &[Candidate],
    extrema: &impl ExtremaQuery,
    whole_graph: bool,
    cancel: &CancelToken,
) -> Result<Vec<SuperBubble>, PipelineError> {
    let capacity = 2 + 2 * dag.interior_count();
    let mut consumed = vec![false; capacity];
    let mut exits: Vec<usize> = Vec::new();
    let mut found = Vec::new();

    for candidate in candidates.iter().rev() {
        cancel.checkpoint()?;
        match candidate.kind {
            CandidateKind::Exit => {
                if !consumed[candidate.vertex] {
                    exits.push(candidate.vertex);
                }
            }
            CandidateKind::Entrance => {
                let entrance = candidate.vertex;
                let i = order.position(entrance);
                loop {
                    let Some(&exit) = exits.last() else {
                        break;
                    };
                    if consumed[exit] || entrance == SOURCE || exit == TERMINAL {
                        exits.pop();
                        continue;
                    }
                    let j = order.position(exit);
                    if j == i + 1 {
                        // Bare edge, no interior; the exit stays available
                        // for an earlier entrance.
                        break;
                    }
                    if extrema.max_child(i, j - 1) > j as i64 {
                        exits.pop();
                        continue;
                    }
                    if extrema.min_parent(i + 1, j) < i as i64 {
                        break;
                    }
                    found.push(SuperBubble { entrance, exit });
                    consumed[entrance] = true;
                    exits.pop();
                    exits.push(entrance);
                    break;
                }
            }
        }
    }
    // The spanning pair always holds on a pruned DAG (every vertex lies on
    // an r to r' path) and is only of interest when asked for.
    if whole_graph && dag.graph().vertex_count() > 2 {
        found.push(SuperBubble {
            entrance: SOURCE,
            exit: TERMINAL,
        });
    }
    Ok(found)
}

/// Detects superbubbles on one DAG using the range-query backend `R`.
pub fn find_superbubbles<R: RangeQuery>(
    dag: &DagGraph,
    whole_graph: bool,
    cancel: &CancelToken,
) -> Result<Vec<SuperBubble>, PipelineError> {
    let order = topological_order(dag, cancel)?;
    let candidates = candidate_list(dag, &order)?;
    let (out_child, out_parent) = extrema_arrays(dag, &order)?;
    let extrema = RmqExtrema {
        child: R::build(&out_child, Extremum::Max),
        parent: R::build(&out_parent, Extremum::Min),
    };
    let found = validate_candidates(dag, &order, &candidates, &extrema, whole_graph, cancel)?;
    debug!(
        dag = dag.name(),
        candidates = candidates.len(),
        superbubbles = found.len(),
        "validation scan finished"
    );
    Ok(found)
}

//! DOT export
//!
//! Serializes a multigraph into a `digraph` block, one line per edge and
//! one per fully isolated vertex. `WeightLabel` mode writes each bundle as
//! a single labelled edge; `MultiEdge` expands it into parallel lines.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::core::multigraph::{MultiDigraph, VertexKey};

/// How parallel-edge bundles are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    /// One line per parallel edge.
    MultiEdge,
    /// One line per bundle, annotated with `[label="w"]`.
    WeightLabel,
}

/// Writes `graph` as a `digraph NAME { ... }` block.
pub fn write_dot<V: VertexKey, W: Write>(
    out: &mut W,
    name: &str,
    graph: &MultiDigraph<V>,
    style: EdgeStyle,
) -> io::Result<()> {
    writeln!(out, "digraph {name} {{")?;
    writeln!(out, "\tnode [shape = circle]")?;
    for vertex in graph.vertices() {
        let isolated = graph.out_degree(vertex).unwrap_or(0) == 0
            && graph.in_degree(vertex).unwrap_or(0) == 0;
        if isolated {
            writeln!(out, "\t{vertex}")?;
            continue;
        }
        for (child, weight) in graph.children_weighted(vertex) {
            match style {
                EdgeStyle::WeightLabel => {
                    writeln!(out, "\t{vertex} -> {child} [label=\"{weight}\"]")?;
                }
                EdgeStyle::MultiEdge => {
                    for _ in 0..weight {
                        writeln!(out, "\t{vertex} -> {child}")?;
                    }
                }
            }
        }
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Writes the DOT block to `path`, creating or truncating the file.
pub fn export_to_file<V: VertexKey>(
    path: &Path,
    name: &str,
    graph: &MultiDigraph<V>,
    style: EdgeStyle,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_dot(&mut writer, name, graph, style)?;
    writer.flush()?;
    info!(path = %path.display(), "graph exported to DOT");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::multigraph::KmerGraph;

    fn sample() -> KmerGraph {
        let mut g = KmerGraph::new();
        g.add_edge_ensuring("ATG".into(), "TGC".into()).unwrap();
        g.add_edge_ensuring("ATG".into(), "TGC".into()).unwrap();
        g.add_vertex("CCC".to_string());
        g
    }

    #[test]
    fn weight_label_mode_writes_one_line_per_bundle() {
        let mut out = Vec::new();
        write_dot(&mut out, "genome", &sample(), EdgeStyle::WeightLabel).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("digraph genome {\n"));
        assert!(text.contains("\tnode [shape = circle]\n"));
        assert_eq!(text.matches("ATG -> TGC").count(), 1);
        assert!(text.contains("\tATG -> TGC [label=\"2\"]\n"));
        assert!(text.contains("\tCCC\n"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn multi_edge_mode_expands_bundles() {
        let mut out = Vec::new();
        write_dot(&mut out, "genome", &sample(), EdgeStyle::MultiEdge).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\tATG -> TGC\n").count(), 2);
        assert!(!text.contains("label"));
    }

    #[test]
    fn connected_vertices_get_no_bare_line() {
        let mut out = Vec::new();
        write_dot(&mut out, "g", &sample(), EdgeStyle::WeightLabel).unwrap();
        let text = String::from_utf8(out).unwrap();
        // TGC only appears as an edge target.
        assert!(!text.contains("\tTGC\n"));
    }
}

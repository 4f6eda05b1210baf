//! Graph persistence
//!
//! SQLite-backed store with a `graphs` registry table plus one label table
//! and one adjacency table per stored graph. Whole-graph writes run inside
//! a single transaction and roll back on failure, so a graph is either
//! fully stored or absent.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::core::errors::PipelineError;
use crate::core::multigraph::{IdGraph, KmerGraph};
use crate::graph::indexer::KmerIndex;

/// Handle on the graph database.
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Purely in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, PipelineError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PipelineError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS graphs (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );",
        )?;
        Ok(Self { conn })
    }

    /// Registers `name` and creates its label and adjacency tables.
    pub fn create(&mut self, name: &str) -> Result<i64, PipelineError> {
        self.conn
            .execute("INSERT INTO graphs (name) VALUES (?1)", params![name])?;
        let id = self.conn.last_insert_rowid();
        self.conn.execute_batch(&format!(
            "CREATE TABLE kmers_{id} (
                node_id INTEGER PRIMARY KEY,
                kmer    TEXT NOT NULL
            );
            CREATE TABLE edges_{id} (
                from_id INTEGER NOT NULL,
                to_id   INTEGER NOT NULL,
                weight  INTEGER NOT NULL
            );"
        ))?;
        debug!(name, id, "graph registered");
        Ok(id)
    }

    /// Drops a stored graph and its tables.
    pub fn remove(&mut self, name: &str) -> Result<(), PipelineError> {
        let id = self.id_of(name)?.ok_or_else(|| {
            PipelineError::BadInput(format!("graph `{name}` is not in the database"))
        })?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS kmers_{id};
             DROP TABLE IF EXISTS edges_{id};"
        ))?;
        tx.execute("DELETE FROM graphs WHERE id = ?1", params![id])?;
        tx.commit()?;
        info!(name, "graph removed from database");
        Ok(())
    }

    pub fn exists(&self, name: &str) -> Result<bool, PipelineError> {
        Ok(self.id_of(name)?.is_some())
    }

    /// Stored graph names in registration order.
    pub fn list(&self) -> Result<Vec<String>, PipelineError> {
        let mut stmt = self.conn.prepare("SELECT name FROM graphs ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn insert_node(
        &mut self,
        graph_id: i64,
        node_id: usize,
        kmer: &str,
    ) -> Result<(), PipelineError> {
        self.conn.execute(
            &format!("INSERT INTO kmers_{graph_id} (node_id, kmer) VALUES (?1, ?2)"),
            params![node_id as i64, kmer],
        )?;
        Ok(())
    }

    pub fn insert_edge(
        &mut self,
        graph_id: i64,
        from: usize,
        to: usize,
        weight: u64,
    ) -> Result<(), PipelineError> {
        self.conn.execute(
            &format!("INSERT INTO edges_{graph_id} (from_id, to_id, weight) VALUES (?1, ?2, ?3)"),
            params![from as i64, to as i64, weight as i64],
        )?;
        Ok(())
    }

    /// Stores the indexed graph under `name` in one transaction. A name
    /// collision is refused rather than overwritten.
    pub fn store_graph(
        &mut self,
        name: &str,
        index: &KmerIndex,
        id_graph: &IdGraph,
    ) -> Result<i64, PipelineError> {
        if self.exists(name)? {
            return Err(PipelineError::BadInput(format!(
                "graph `{name}` is already in the database"
            )));
        }
        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO graphs (name) VALUES (?1)", params![name])?;
        let id = tx.last_insert_rowid();
        tx.execute_batch(&format!(
            "CREATE TABLE kmers_{id} (
                node_id INTEGER PRIMARY KEY,
                kmer    TEXT NOT NULL
            );
            CREATE TABLE edges_{id} (
                from_id INTEGER NOT NULL,
                to_id   INTEGER NOT NULL,
                weight  INTEGER NOT NULL
            );"
        ))?;
        {
            let mut node_stmt = tx.prepare(&format!(
                "INSERT INTO kmers_{id} (node_id, kmer) VALUES (?1, ?2)"
            ))?;
            for (node_id, label) in index.labels() {
                node_stmt.execute(params![node_id as i64, label])?;
            }
            let mut edge_stmt = tx.prepare(&format!(
                "INSERT INTO edges_{id} (from_id, to_id, weight) VALUES (?1, ?2, ?3)"
            ))?;
            for &from in id_graph.vertices() {
                for (&to, weight) in id_graph.children_weighted(&from) {
                    edge_stmt.execute(params![from as i64, to as i64, weight as i64])?;
                }
            }
        }
        tx.commit()?;
        info!(
            name,
            kmers = index.len(),
            edges = id_graph.edge_count(),
            "graph stored"
        );
        Ok(id)
    }

    /// Loads the integer-id form of a stored graph.
    pub fn load_id_graph(&self, name: &str) -> Result<IdGraph, PipelineError> {
        let id = self.id_of(name)?.ok_or_else(|| {
            PipelineError::BadInput(format!("graph `{name}` is not in the database"))
        })?;
        let mut graph = IdGraph::new();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT node_id FROM kmers_{id} ORDER BY node_id"))?;
        let nodes = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        for node in nodes {
            graph.add_vertex(node? as usize);
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT from_id, to_id, weight FROM edges_{id} ORDER BY rowid"
        ))?;
        let edges = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for edge in edges {
            let (from, to, weight) = edge?;
            graph.add_edge_weighted(&(from as usize), &(to as usize), weight as u64)?;
        }
        Ok(graph)
    }

    /// Loads the k-mer labelled form of a stored graph.
    pub fn load_kmer_graph(&self, name: &str) -> Result<KmerGraph, PipelineError> {
        let id = self.id_of(name)?.ok_or_else(|| {
            PipelineError::BadInput(format!("graph `{name}` is not in the database"))
        })?;
        let mut labels: Vec<(usize, String)> = Vec::new();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT node_id, kmer FROM kmers_{id} ORDER BY node_id"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)? as usize, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            labels.push(row?);
        }
        let lookup: ahash::AHashMap<usize, String> = labels.iter().cloned().collect();
        let mut graph = KmerGraph::new();
        for (_, label) in &labels {
            graph.add_vertex(label.clone());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT from_id, to_id, weight FROM edges_{id} ORDER BY rowid"
        ))?;
        let edges = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)? as usize,
                row.get::<_, i64>(1)? as usize,
                row.get::<_, i64>(2)? as u64,
            ))
        })?;
        for edge in edges {
            let (from, to, weight) = edge?;
            let from_label = lookup.get(&from).ok_or_else(|| {
                PipelineError::InternalInconsistency(format!(
                    "edge references node {from} with no stored k-mer"
                ))
            })?;
            let to_label = lookup.get(&to).ok_or_else(|| {
                PipelineError::InternalInconsistency(format!(
                    "edge references node {to} with no stored k-mer"
                ))
            })?;
            graph.add_edge_weighted(from_label, to_label, weight)?;
        }
        Ok(graph)
    }

    fn id_of(&self, name: &str) -> Result<Option<i64>, PipelineError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM graphs WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::CancelToken;
    use crate::graph::indexer::index_graph;

    fn indexed_sample() -> (KmerIndex, IdGraph, KmerGraph) {
        let mut g = KmerGraph::new();
        g.add_edge_ensuring("ATG".into(), "TGC".into()).unwrap();
        g.add_edge_ensuring("TGC".into(), "GCA".into()).unwrap();
        g.add_edge_ensuring("TGC".into(), "GCA".into()).unwrap();
        let (index, id_graph) = index_graph(&g, &CancelToken::new()).unwrap();
        (index, id_graph, g)
    }

    #[test]
    fn round_trips_through_both_graph_forms() {
        let (index, id_graph, kmer_graph) = indexed_sample();
        let mut store = GraphStore::open_in_memory().unwrap();
        store.store_graph("sample", &index, &id_graph).unwrap();

        let loaded_ids = store.load_id_graph("sample").unwrap();
        assert_eq!(loaded_ids.vertex_count(), id_graph.vertex_count());
        assert_eq!(loaded_ids.edge_count(), id_graph.edge_count());
        assert_eq!(loaded_ids.weight_of(&1, &2).unwrap(), 2);

        let loaded_kmers = store.load_kmer_graph("sample").unwrap();
        assert_eq!(loaded_kmers.vertex_count(), kmer_graph.vertex_count());
        assert_eq!(loaded_kmers.edge_count(), kmer_graph.edge_count());
        assert_eq!(
            loaded_kmers.weight_of(&"TGC".into(), &"GCA".into()).unwrap(),
            2
        );
    }

    #[test]
    fn storing_a_duplicate_name_is_refused() {
        let (index, id_graph, _) = indexed_sample();
        let mut store = GraphStore::open_in_memory().unwrap();
        store.store_graph("sample", &index, &id_graph).unwrap();
        let err = store.store_graph("sample", &index, &id_graph).unwrap_err();
        assert!(matches!(err, PipelineError::BadInput(_)));
        assert_eq!(store.list().unwrap(), vec!["sample".to_string()]);
    }

    #[test]
    fn remove_unregisters_and_drops_tables() {
        let (index, id_graph, _) = indexed_sample();
        let mut store = GraphStore::open_in_memory().unwrap();
        store.store_graph("sample", &index, &id_graph).unwrap();
        assert!(store.exists("sample").unwrap());
        store.remove("sample").unwrap();
        assert!(!store.exists("sample").unwrap());
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.load_id_graph("sample"),
            Err(PipelineError::BadInput(_))
        ));
    }

    #[test]
    fn removing_an_unknown_graph_is_bad_input() {
        let mut store = GraphStore::open_in_memory().unwrap();
        assert!(matches!(
            store.remove("ghost"),
            Err(PipelineError::BadInput(_))
        ));
    }

    #[test]
    fn list_preserves_registration_order() {
        let (index, id_graph, _) = indexed_sample();
        let mut store = GraphStore::open_in_memory().unwrap();
        store.store_graph("bbb", &index, &id_graph).unwrap();
        store.store_graph("aaa", &index, &id_graph).unwrap();
        assert_eq!(store.list().unwrap(), vec!["bbb".to_string(), "aaa".to_string()]);
    }

    #[test]
    fn single_inserts_compose_with_create() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let id = store.create("manual").unwrap();
        store.insert_node(id, 0, "ATG").unwrap();
        store.insert_node(id, 1, "TGC").unwrap();
        store.insert_edge(id, 0, 1, 3).unwrap();
        let graph = store.load_id_graph("manual").unwrap();
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.weight_of(&0, &1).unwrap(), 3);
    }
}

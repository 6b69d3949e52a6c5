use crate::error::{GraphError, Result};
use crate::types::{AssetGraph, GraphNode, NodeKey};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    schema_version: u32,
    nodes: Vec<SnapshotNode>,
    edges: Vec<(usize, usize)>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotNode {
    key: NodeKey,
    attributes: Map<String, Value>,
}

impl GraphSnapshot {
    fn from_graph(graph: &AssetGraph) -> Self {
        let mut node_map = HashMap::new();
        let mut nodes = Vec::with_capacity(graph.node_count());

        for (pos, idx) in graph.graph.node_indices().enumerate() {
            let node = &graph.graph[idx];
            node_map.insert(idx, pos);
            nodes.push(SnapshotNode {
                key: node.key.clone(),
                attributes: node.attributes.clone(),
            });
        }

        let edges = graph
            .graph
            .edge_references()
            .filter_map(|edge| {
                match (node_map.get(&edge.source()), node_map.get(&edge.target())) {
                    (Some(&from), Some(&to)) => Some((from, to)),
                    _ => None,
                }
            })
            .collect();

        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            nodes,
            edges,
        }
    }

    fn into_graph(self) -> Result<AssetGraph> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(GraphError::Snapshot(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }

        let mut graph = AssetGraph::new();
        let mut node_indices = Vec::with_capacity(self.nodes.len());

        for node in self.nodes {
            if graph.find_node(&node.key).is_some() {
                return Err(GraphError::Snapshot(format!("duplicate node {}", node.key)));
            }
            node_indices.push(graph.upsert_node(GraphNode {
                key: node.key,
                attributes: node.attributes,
            }));
        }

        for (from, to) in self.edges {
            let (Some(&a), Some(&b)) = (node_indices.get(from), node_indices.get(to)) else {
                return Err(GraphError::Snapshot(format!(
                    "edge ({from}, {to}) references a missing node"
                )));
            };
            graph.connect(a, b);
        }

        Ok(graph)
    }
}

impl AssetGraph {
    /// Serialize the graph to `path` as JSON.
    ///
    /// The data goes to a sibling temp file first and is renamed into place,
    /// so `path` never holds a partial snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
        }

        let snapshot = GraphSnapshot::from_graph(self);
        let data = serde_json::to_vec(&snapshot)?;

        let tmp = tmp_path(path);
        fs::write(&tmp, data).map_err(|e| GraphError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            GraphError::io(path, e)
        })?;

        log::debug!(
            "Wrote snapshot {} ({} nodes, {} edges)",
            path.display(),
            self.node_count(),
            self.edge_count()
        );
        Ok(())
    }

    /// Load a graph written by [`AssetGraph::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| GraphError::io(path, e))?;
        let snapshot: GraphSnapshot =
            serde_json::from_slice(&data).map_err(|e| GraphError::parse(path, e))?;
        let graph = snapshot.into_graph()?;
        log::debug!(
            "Loaded snapshot {} ({} nodes, {} edges)",
            path.display(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, Manifest, NodeType};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> AssetGraph {
        let manifest = Manifest::from_value(json!({
            "a1": {"tags": ["City", "Street"], "subtype": "Tiles", "subsubtype": "Sidewalk",
                   "usd_path": "/a1.usd", "dimensions": [1.5, 2, 3]},
            "a2": {"tags": ["city"], "thumbnail": null},
        }))
        .unwrap();
        GraphBuilder::new().build(&manifest)
    }

    fn sorted_nodes(graph: &AssetGraph) -> Vec<(String, GraphNode)> {
        let mut nodes: Vec<_> = graph
            .nodes()
            .map(|n| (n.key.to_string(), n.clone()))
            .collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        nodes
    }

    fn sorted_edges(graph: &AssetGraph) -> Vec<(String, String)> {
        let mut edges: Vec<_> = graph
            .graph
            .edge_references()
            .map(|e| {
                let a = graph.graph[e.source()].key.to_string();
                let b = graph.graph[e.target()].key.to_string();
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn round_trip_preserves_nodes_edges_and_attributes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/graph.json");
        let graph = sample();

        graph.save(&path).unwrap();
        let loaded = AssetGraph::load(&path).unwrap();

        assert_eq!(sorted_nodes(&loaded), sorted_nodes(&graph));
        assert_eq!(sorted_edges(&loaded), sorted_edges(&graph));
        assert_eq!(loaded.assets_by_tag("CITY"), graph.assets_by_tag("city"));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn round_trip_keeps_index_ids() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.json");
        let manifest = Manifest::from_value(json!([{"tags": ["x"]}, {"tags": ["x", "y"]}])).unwrap();
        GraphBuilder::new().build(&manifest).save(&path).unwrap();

        let loaded = AssetGraph::load(&path).unwrap();
        let y: Vec<_> = loaded.assets_by_tag("y").into_iter().collect();
        assert_eq!(y, vec![crate::AssetId::Index(1)]);
        let node = loaded.node_by_key(&NodeKey::tag("x")).unwrap();
        assert_eq!(node.node_type(), NodeType::Tag);
    }

    #[test]
    fn missing_snapshot_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = AssetGraph::load(&temp.path().join("none.json")).unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.json");
        fs::write(
            &path,
            r#"{"schema_version":1,"nodes":[{"key":{"asset":"a"},"attributes":{}}],"edges":[[0,4]]}"#,
        )
        .unwrap();
        let err = AssetGraph::load(&path).unwrap_err();
        assert!(matches!(err, GraphError::Snapshot(_)));
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.json");
        fs::write(&path, r#"{"schema_version":99,"nodes":[],"edges":[]}"#).unwrap();
        let err = AssetGraph::load(&path).unwrap_err();
        assert!(matches!(err, GraphError::Snapshot(_)));
    }
}

use crate::error::Result;
use crate::manifest::Manifest;
use crate::types::*;
use petgraph::graph::NodeIndex;
use serde_json::{Map, Value};
use std::path::Path;

const SUBTYPE_FIELD: &str = "subtype";
const SUBSUBTYPE_FIELD: &str = "subsubtype";
const TAGS_FIELD: &str = "tags";

/// Build the asset graph from a manifest
#[derive(Debug, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build graph from manifest records, in manifest order
    pub fn build(&self, manifest: &Manifest) -> AssetGraph {
        let mut graph = AssetGraph::new();

        for (id, record) in manifest.entries() {
            self.add_asset(&mut graph, id, record);
        }

        log::info!(
            "Built asset graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        graph
    }

    /// Load `manifest_path`, build, and save the snapshot to `snapshot_path`.
    ///
    /// Nothing is written unless the manifest loads cleanly.
    pub fn build_from_path(&self, manifest_path: &Path, snapshot_path: &Path) -> Result<AssetGraph> {
        let manifest = Manifest::from_path(manifest_path)?;
        let graph = self.build(&manifest);
        graph.save(snapshot_path)?;
        log::info!("Graph saved to {}", snapshot_path.display());
        Ok(graph)
    }

    fn add_asset(&self, graph: &mut AssetGraph, id: &AssetId, record: &Map<String, Value>) {
        let asset_idx = graph.upsert_node(GraphNode::asset(id.clone(), record));

        // Category (subtype)
        let category_idx = label_text(id, record, SUBTYPE_FIELD).map(|subtype| {
            let idx = graph.ensure_node(NodeKey::category(subtype), |key| {
                GraphNode::label(key, subtype)
            });
            graph.connect(asset_idx, idx);
            idx
        });

        // Subcategory (subsubtype), linked to the category when both are present
        if let Some(subsubtype) = label_text(id, record, SUBSUBTYPE_FIELD) {
            let idx = graph.ensure_node(NodeKey::subcategory(subsubtype), |key| {
                GraphNode::label(key, subsubtype)
            });
            graph.connect(asset_idx, idx);
            if let Some(category_idx) = category_idx {
                graph.connect(category_idx, idx);
            }
        }

        for tag in tag_texts(id, record) {
            let idx: NodeIndex =
                graph.ensure_node(NodeKey::tag(tag), |key| GraphNode::label(key, tag));
            graph.connect(asset_idx, idx);
        }

        log::trace!("Added asset {id}");
    }
}

/// Whitespace-trimmed text of a string field, if it is non-empty.
fn label_text<'a>(id: &AssetId, record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    match record.get(field)? {
        Value::String(text) => Some(text.trim()).filter(|t| !t.is_empty()),
        Value::Null => None,
        other => {
            log::warn!("Asset {id}: ignoring non-string {field} ({other})");
            None
        }
    }
}

fn tag_texts<'a>(id: &AssetId, record: &'a Map<String, Value>) -> Vec<&'a str> {
    match record.get(TAGS_FIELD) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(tag)) => vec![tag.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(tag) => Some(tag.as_str()),
                other => {
                    log::warn!("Asset {id}: skipping non-string tag ({other})");
                    None
                }
            })
            .collect(),
        Some(other) => {
            log::warn!("Asset {id}: ignoring tags of unexpected type ({other})");
            Vec::new()
        }
    }
}

use crate::types::{AssetGraph, AssetId, GraphNode, NodeKey};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};

const DEFAULT_NAME: &str = "Unnamed";
const DEFAULT_USD_PATH: &str = "No USD path";

/// Printable view of an asset node
#[derive(Debug, Clone, Serialize)]
pub struct AssetSummary {
    pub id: AssetId,
    pub name: String,
    pub usd_path: String,
    pub attributes: Map<String, Value>,
}

impl AssetSummary {
    fn from_node(id: AssetId, node: &GraphNode) -> Self {
        Self {
            id,
            name: display_attribute(node, "name", DEFAULT_NAME),
            usd_path: display_attribute(node, "usd_path", DEFAULT_USD_PATH),
            attributes: node.attributes.clone(),
        }
    }
}

/// Summaries for the given ids; ids without an asset node are skipped.
pub fn asset_summaries<'a>(
    graph: &AssetGraph,
    ids: impl IntoIterator<Item = &'a AssetId>,
) -> Vec<AssetSummary> {
    ids.into_iter()
        .filter_map(|id| {
            graph
                .node_by_key(&NodeKey::Asset(id.clone()))
                .map(|node| AssetSummary::from_node(id.clone(), node))
        })
        .collect()
}

/// Write the id, name and USD path of each asset.
pub fn print_assets<'a, W: Write>(
    graph: &AssetGraph,
    ids: impl IntoIterator<Item = &'a AssetId>,
    out: &mut W,
) -> io::Result<()> {
    for summary in asset_summaries(graph, ids) {
        writeln!(
            out,
            "Asset ID: {}\n  Name: {}\n  USD Path: {}\n",
            summary.id, summary.name, summary.usd_path
        )?;
    }
    Ok(())
}

fn display_attribute(node: &GraphNode, field: &str, default: &str) -> String {
    match node.attribute(field) {
        None => default.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

use anyhow::Result;
use asset_graph::{print_assets, AssetGraph, AssetId, GraphStats};
use std::collections::BTreeSet;

pub fn render_assets(graph: &AssetGraph, ids: &BTreeSet<AssetId>) -> Result<String> {
    if ids.is_empty() {
        return Ok("No matching assets.".to_string());
    }

    let mut out = Vec::new();
    print_assets(graph, ids, &mut out)?;
    let text = String::from_utf8(out)?;
    Ok(text.trim_end().to_string())
}

pub fn render_stats(stats: &GraphStats) -> String {
    let mut text = String::new();
    text.push_str(&format!("Assets:         {}\n", stats.assets));
    text.push_str(&format!("Tags:           {}\n", stats.tags));
    text.push_str(&format!("Categories:     {}\n", stats.categories));
    text.push_str(&format!("Subcategories:  {}\n", stats.subcategories));
    text.push_str(&format!("Edges:          {}", stats.edges));
    text
}

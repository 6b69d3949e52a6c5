use crate::types::{AssetGraph, AssetId, NodeKey, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filters for [`AssetGraph::search_assets`]. All provided filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Every tag must be present on the asset
    #[serde(default)]
    pub tags: Vec<String>,

    /// Category (subtype)
    #[serde(default)]
    pub category: Option<String>,

    /// Subcategory (subsubtype)
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Empty strings count as "not provided".
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && provided(&self.category).is_none()
            && provided(&self.subcategory).is_none()
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Node counts per type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub assets: usize,
    pub tags: usize,
    pub categories: usize,
    pub subcategories: usize,
    pub edges: usize,
}

impl AssetGraph {
    /// Assets carrying `tag` (case-insensitive)
    pub fn assets_by_tag(&self, tag: &str) -> BTreeSet<AssetId> {
        self.adjacent_assets(&NodeKey::tag(tag))
    }

    /// Assets in `category` (case-insensitive)
    pub fn assets_by_category(&self, category: &str) -> BTreeSet<AssetId> {
        self.adjacent_assets(&NodeKey::category(category))
    }

    /// Assets in `subcategory` (case-insensitive)
    pub fn assets_by_subcategory(&self, subcategory: &str) -> BTreeSet<AssetId> {
        self.adjacent_assets(&NodeKey::subcategory(subcategory))
    }

    /// Every asset node in the graph
    pub fn all_assets(&self) -> BTreeSet<AssetId> {
        self.nodes()
            .filter_map(|node| node.key.as_asset().cloned())
            .collect()
    }

    /// Assets matching every filter; no filters yields all assets.
    pub fn search_assets(&self, filter: &SearchFilter) -> BTreeSet<AssetId> {
        let mut result = self.all_assets();

        for tag in &filter.tags {
            let by_tag = self.assets_by_tag(tag);
            result.retain(|id| by_tag.contains(id));
        }

        if let Some(category) = provided(&filter.category) {
            let by_category = self.assets_by_category(category);
            result.retain(|id| by_category.contains(id));
        }

        if let Some(subcategory) = provided(&filter.subcategory) {
            let by_subcategory = self.assets_by_subcategory(subcategory);
            result.retain(|id| by_subcategory.contains(id));
        }

        log::debug!("search {:?} -> {} assets", filter, result.len());
        result
    }

    /// Names of the subcategories linked to `category`, sorted
    pub fn subcategories_of(&self, category: &str) -> Vec<String> {
        let Some(idx) = self.find_node(&NodeKey::category(category)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .neighbors(idx)
            .filter(|node| node.node_type() == NodeType::SubCategory)
            .map(|node| node.name().map_or_else(|| node.key.to_string(), str::to_string))
            .collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edges: self.edge_count(),
            ..GraphStats::default()
        };
        for node in self.nodes() {
            match node.node_type() {
                NodeType::Asset => stats.assets += 1,
                NodeType::Tag => stats.tags += 1,
                NodeType::Category => stats.categories += 1,
                NodeType::SubCategory => stats.subcategories += 1,
            }
        }
        stats
    }

    /// Asset neighbors of the node at `key`; empty if the node does not exist.
    fn adjacent_assets(&self, key: &NodeKey) -> BTreeSet<AssetId> {
        let Some(idx) = self.find_node(key) else {
            return BTreeSet::new();
        };
        self.neighbors(idx)
            .filter_map(|node| node.key.as_asset().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, Manifest};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(items: &[&str]) -> BTreeSet<AssetId> {
        items.iter().map(|s| AssetId::from(*s)).collect()
    }

    fn sample() -> AssetGraph {
        let manifest = Manifest::from_value(json!({
            "a1": {"tags": ["City", "Street"], "subtype": "Tiles", "subsubtype": "Sidewalk"},
            "a2": {"tags": ["City"], "subtype": "Tiles", "subsubtype": "Roof"},
            "a3": {"tags": ["Street", "Wet"], "subtype": "Asphalt"},
            "a4": {},
        }))
        .unwrap();
        GraphBuilder::new().build(&manifest)
    }

    #[test]
    fn example_scenario() {
        let graph = sample();
        let filter = SearchFilter::new()
            .tag("city")
            .category("tiles")
            .subcategory("sidewalk");
        assert_eq!(graph.search_assets(&filter), ids(&["a1"]));
        assert!(graph.assets_by_tag("park").is_empty());
    }

    #[test]
    fn tag_lookup_is_case_insensitive() {
        let graph = sample();
        assert_eq!(graph.assets_by_tag("STREET"), ids(&["a1", "a3"]));
        assert_eq!(graph.assets_by_tag("street"), ids(&["a1", "a3"]));
    }

    #[test]
    fn category_lookup_excludes_subcategory_neighbors() {
        let graph = sample();
        assert_eq!(graph.assets_by_category("Tiles"), ids(&["a1", "a2"]));
        assert_eq!(graph.assets_by_subcategory("ROOF"), ids(&["a2"]));
    }

    #[test]
    fn no_filters_returns_all_assets() {
        let graph = sample();
        assert_eq!(
            graph.search_assets(&SearchFilter::new()),
            ids(&["a1", "a2", "a3", "a4"])
        );
    }

    #[test]
    fn tags_are_anded() {
        let graph = sample();
        let both = graph.search_assets(&SearchFilter::new().tags(["City", "Street"]));
        let expected: BTreeSet<_> = graph
            .assets_by_tag("City")
            .intersection(&graph.assets_by_tag("Street"))
            .cloned()
            .collect();
        assert_eq!(both, expected);
        assert_eq!(both, ids(&["a1"]));
    }

    #[test]
    fn unknown_filters_yield_empty_sets() {
        let graph = sample();
        assert!(graph.search_assets(&SearchFilter::new().category("metal")).is_empty());
        assert!(graph.search_assets(&SearchFilter::new().subcategory("none")).is_empty());
        assert!(graph.assets_by_category("metal").is_empty());
    }

    #[test]
    fn empty_strings_are_not_filters() {
        let graph = sample();
        let filter = SearchFilter::new().category("").subcategory("");
        assert!(filter.is_empty());
        assert_eq!(graph.search_assets(&filter).len(), 4);
    }

    #[test]
    fn subcategories_follow_category_edges() {
        let graph = sample();
        assert_eq!(graph.subcategories_of("tiles"), vec!["Roof", "Sidewalk"]);
        assert!(graph.subcategories_of("asphalt").is_empty());
        assert!(graph.subcategories_of("unknown").is_empty());
    }

    #[test]
    fn stats_count_each_node_type() {
        let graph = sample();
        assert_eq!(
            graph.stats(),
            GraphStats {
                assets: 4,
                tags: 3,
                categories: 2,
                subcategories: 2,
                edges: 12,
            }
        );
    }
}

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Attribute name carrying the node variant on every node.
pub const NODE_TYPE_FIELD: &str = "node_type";

/// Identifier of an asset in the manifest.
///
/// Object manifests key assets by string; array manifests use the zero-based
/// position of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Index(usize),
    Key(String),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Index(idx) => write!(f, "{idx}"),
            AssetId::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for AssetId {
    fn from(key: &str) -> Self {
        AssetId::Key(key.to_string())
    }
}

impl From<String> for AssetId {
    fn from(key: String) -> Self {
        AssetId::Key(key)
    }
}

impl From<usize> for AssetId {
    fn from(idx: usize) -> Self {
        AssetId::Index(idx)
    }
}

/// Kind of node in the asset graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Asset,
    Tag,
    Category,
    SubCategory,
}

impl NodeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Asset => "asset",
            NodeType::Tag => "tag",
            NodeType::Category => "category",
            NodeType::SubCategory => "sub_category",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identity of a node.
///
/// Tag, category and subcategory payloads are stored lowercased, so lookups
/// are case-insensitive. Variants live in separate namespaces: a tag spelled
/// `cat:x` never collides with the category `x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKey {
    Asset(AssetId),
    Tag(String),
    Category(String),
    SubCategory(String),
}

impl NodeKey {
    pub fn asset(id: impl Into<AssetId>) -> Self {
        NodeKey::Asset(id.into())
    }

    pub fn tag(text: &str) -> Self {
        NodeKey::Tag(text.to_lowercase())
    }

    pub fn category(text: &str) -> Self {
        NodeKey::Category(text.to_lowercase())
    }

    pub fn subcategory(text: &str) -> Self {
        NodeKey::SubCategory(text.to_lowercase())
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKey::Asset(_) => NodeType::Asset,
            NodeKey::Tag(_) => NodeType::Tag,
            NodeKey::Category(_) => NodeType::Category,
            NodeKey::SubCategory(_) => NodeType::SubCategory,
        }
    }

    pub fn as_asset(&self) -> Option<&AssetId> {
        match self {
            NodeKey::Asset(id) => Some(id),
            _ => None,
        }
    }
}

/// Display form: the asset id, or `tag:`/`cat:`/`subcat:` plus the lowercased text.
impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Asset(id) => write!(f, "{id}"),
            NodeKey::Tag(tag) => write!(f, "tag:{tag}"),
            NodeKey::Category(cat) => write!(f, "cat:{cat}"),
            NodeKey::SubCategory(sub) => write!(f, "subcat:{sub}"),
        }
    }
}

/// Node in the asset graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: NodeKey,

    /// Open-ended attributes, in insertion order
    pub attributes: Map<String, Value>,
}

impl GraphNode {
    /// Asset node carrying every field of the manifest record plus `node_type`.
    pub fn asset(id: AssetId, record: &Map<String, Value>) -> Self {
        let mut attributes = record.clone();
        attributes.insert(
            NODE_TYPE_FIELD.to_string(),
            Value::String(NodeType::Asset.as_str().to_string()),
        );
        Self {
            key: NodeKey::Asset(id),
            attributes,
        }
    }

    /// Tag, category or subcategory node; `name` keeps the original case.
    pub fn label(key: NodeKey, name: &str) -> Self {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), Value::String(name.to_string()));
        attributes.insert(
            NODE_TYPE_FIELD.to_string(),
            Value::String(key.node_type().as_str().to_string()),
        );
        Self { key, attributes }
    }

    pub fn node_type(&self) -> NodeType {
        self.key.node_type()
    }

    pub fn is_asset(&self) -> bool {
        self.node_type() == NodeType::Asset
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute("name").and_then(Value::as_str)
    }
}

/// Undirected membership graph over assets, tags, categories and subcategories
#[derive(Debug, Clone)]
pub struct AssetGraph {
    pub(crate) graph: UnGraph<GraphNode, ()>,

    /// NodeKey -> NodeIndex mapping for fast lookup
    pub(crate) key_index: HashMap<NodeKey, NodeIndex>,
}

impl AssetGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
            key_index: HashMap::new(),
        }
    }

    /// Insert a node, replacing the attributes of an existing node with the same key.
    pub fn upsert_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.key_index.get(&node.key) {
            self.graph[idx].attributes = node.attributes;
            return idx;
        }
        let key = node.key.clone();
        let idx = self.graph.add_node(node);
        self.key_index.insert(key, idx);
        idx
    }

    /// Insert a node only if its key is not present yet; existing nodes are left untouched.
    pub fn ensure_node(&mut self, key: NodeKey, make: impl FnOnce(NodeKey) -> GraphNode) -> NodeIndex {
        if let Some(&idx) = self.key_index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(make(key.clone()));
        self.key_index.insert(key, idx);
        idx
    }

    /// Connect two nodes. Connecting an already connected pair is a no-op.
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex) {
        self.graph.update_edge(a, b, ());
    }

    /// Find node by key
    pub fn find_node(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.key_index.get(key).copied()
    }

    /// Get node data
    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_by_key(&self, key: &NodeKey) -> Option<&GraphNode> {
        self.find_node(key).and_then(|idx| self.node(idx))
    }

    /// Nodes adjacent to `idx`
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = &GraphNode> {
        self.graph
            .neighbors(idx)
            .filter_map(move |n| self.graph.node_weight(n))
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Endpoints of every edge
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> {
        self.graph.edge_indices().filter_map(move |e| {
            let (a, b) = self.graph.edge_endpoints(e)?;
            Some((&self.graph[a], &self.graph[b]))
        })
    }

    /// Whether the nodes behind both keys exist and are adjacent
    pub fn has_edge(&self, a: &NodeKey, b: &NodeKey) -> bool {
        match (self.find_node(a), self.find_node(b)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for AssetGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_keys_display_with_namespace_prefix() {
        assert_eq!(NodeKey::asset("a1").to_string(), "a1");
        assert_eq!(NodeKey::asset(3usize).to_string(), "3");
        assert_eq!(NodeKey::tag("City").to_string(), "tag:city");
        assert_eq!(NodeKey::category("Tiles").to_string(), "cat:tiles");
        assert_eq!(NodeKey::subcategory("SideWalk").to_string(), "subcat:sidewalk");
    }

    #[test]
    fn prefixed_tag_does_not_collide_with_category() {
        let mut graph = AssetGraph::new();
        let tag = graph.ensure_node(NodeKey::tag("cat:x"), |k| GraphNode::label(k, "cat:x"));
        let cat = graph.ensure_node(NodeKey::category("x"), |k| GraphNode::label(k, "x"));
        assert_ne!(tag, cat);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn connect_twice_keeps_single_edge() {
        let mut graph = AssetGraph::new();
        let a = graph.upsert_node(GraphNode::asset("a".into(), &Map::new()));
        let t = graph.ensure_node(NodeKey::tag("x"), |k| GraphNode::label(k, "x"));
        graph.connect(a, t);
        graph.connect(t, a);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(&NodeKey::tag("X"), &NodeKey::asset("a")));
    }

    #[test]
    fn ensure_node_keeps_first_name() {
        let mut graph = AssetGraph::new();
        graph.ensure_node(NodeKey::tag("City"), |k| GraphNode::label(k, "City"));
        graph.ensure_node(NodeKey::tag("CITY"), |k| GraphNode::label(k, "CITY"));
        let node = graph.node_by_key(&NodeKey::tag("city")).unwrap();
        assert_eq!(node.name(), Some("City"));
        assert_eq!(node.node_type(), NodeType::Tag);
    }

    #[test]
    fn asset_node_overrides_node_type_field() {
        let mut record = Map::new();
        record.insert("node_type".into(), Value::String("bogus".into()));
        record.insert("usd_path".into(), Value::String("/a.usd".into()));
        let node = GraphNode::asset("a".into(), &record);
        assert_eq!(node.attribute("node_type"), Some(&Value::String("asset".into())));
        assert_eq!(node.attributes.len(), 2);
    }

    #[test]
    fn asset_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&AssetId::Index(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&AssetId::from("a1")).unwrap(), "\"a1\"");
        let parsed: AssetId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, AssetId::Index(7));
    }
}

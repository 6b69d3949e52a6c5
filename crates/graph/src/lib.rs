//! # Asset Graph
//!
//! Tag/category graph over a content-pipeline asset manifest.
//!
//! ## Features
//!
//! - **Manifest loading** - object or array manifests, records copied verbatim
//! - **Graph building** - assets linked to their tags, category and subcategory
//! - **Set queries** - case-insensitive lookups and AND-combined search
//! - **Snapshots** - JSON serialization of the built graph
//!
//! ## Architecture
//!
//! ```text
//! manifest.json
//!     │
//!     ├──> Manifest (shape check, optional field defaulting)
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Asset nodes (all record fields + node_type)
//!     │      ├─ Tag nodes        tag:<lowercase>
//!     │      ├─ Category nodes   cat:<lowercase>
//!     │      └─ Subcategory nodes subcat:<lowercase>
//!     │
//!     ├──> Asset Graph (petgraph, undirected, no parallel edges)
//!     │      └─ Snapshot save/load
//!     │
//!     └──> Queries
//!            ├─ assets_by_tag / _category / _subcategory
//!            └─ search_assets (intersection of all filters)
//! ```

mod builder;
mod error;
mod manifest;
mod query;
mod render;
mod snapshot;
mod types;

pub use builder::GraphBuilder;
pub use error::{GraphError, Result};
pub use manifest::{Manifest, ManifestShape};
pub use query::{GraphStats, SearchFilter};
pub use render::{asset_summaries, print_assets, AssetSummary};
pub use snapshot::SNAPSHOT_SCHEMA_VERSION;
pub use types::{AssetGraph, AssetId, GraphNode, NodeKey, NodeType, NODE_TYPE_FIELD};

//! Labeled property graph: an in-memory store of named nodes and named,
//! directed relationships, both carrying properties and labels.

mod graph;
mod shared;
mod snapshot;

pub use graph::PropertyGraph;
pub use lpg_types::{
    BidirectionalMode, GraphConfig, GraphError, GraphResult, Node, NodeKey, Properties,
    PropertyContainer, PropertyError, PropertyValue, Relationship,
};
pub use shared::SharedGraph;
pub use snapshot::{GraphSnapshot, GraphStats, StoredRelationship};

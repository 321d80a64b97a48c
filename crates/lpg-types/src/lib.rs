//! Core types for the labeled property graph: node keys, nodes,
//! relationships, the shared property/label contract, errors and config.

mod config;
mod element;
mod error;
mod key;

pub use config::{BidirectionalMode, GraphConfig};
pub use element::{Node, Properties, PropertyContainer, Relationship};
pub use error::{GraphError, GraphResult, PropertyError};
pub use key::NodeKey;

/// Property values are arbitrary JSON values.
pub type PropertyValue = serde_json::Value;

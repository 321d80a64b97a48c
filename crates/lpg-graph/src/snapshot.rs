//! Statistics and serializable snapshots of a property graph.

use crate::graph::PropertyGraph;
use lpg_types::{GraphConfig, GraphError, GraphResult, Node, PropertyContainer, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Counts over the whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_relationships: usize,
    /// relationship name -> number of instances.
    pub relationship_counts: HashMap<String, usize>,
    /// node label -> number of nodes carrying it.
    pub label_counts: HashMap<String, usize>,
}

/// One relationship instance with its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRelationship<N> {
    pub from: N,
    pub to: N,
    pub relationship: Relationship,
}

/// Point-in-time copy of every node and relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot<N> {
    pub nodes: Vec<Node<N>>,
    pub relationships: Vec<StoredRelationship<N>>,
    pub timestamp: String,
}

impl<N> PropertyGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    pub fn stats(&self) -> GraphStats {
        let mut relationship_counts: HashMap<String, usize> = HashMap::new();
        for (_, _, rel) in self.edges() {
            *relationship_counts.entry(rel.name().to_string()).or_insert(0) += 1;
        }
        let mut label_counts: HashMap<String, usize> = HashMap::new();
        for (_, node) in self.iter() {
            for label in node.labels() {
                *label_counts.entry(label.to_string()).or_insert(0) += 1;
            }
        }
        GraphStats {
            total_nodes: self.node_count(),
            total_relationships: self.relationship_count(),
            relationship_counts,
            label_counts,
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot<N> {
        let nodes = self.iter().map(|(_, node)| node.clone()).collect();
        let relationships = self
            .edges()
            .map(|(from, to, rel)| StoredRelationship {
                from: from.clone(),
                to: to.clone(),
                relationship: rel.clone(),
            })
            .collect();
        GraphSnapshot {
            nodes,
            relationships,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a graph from a snapshot through the validated insert paths.
    /// Any duplicate, dangling or self-referencing entry rejects the whole snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot<N>, config: GraphConfig) -> GraphResult<Self, N> {
        let mut graph = Self::with_config(config);
        for node in snapshot.nodes {
            graph.insert_node(node).map_err(Self::reject)?;
        }
        for stored in snapshot.relationships {
            graph
                .check_new_edge(&stored.from, &stored.to, stored.relationship.name())
                .map_err(Self::reject)?;
            graph.link(&stored.from, &stored.to, stored.relationship);
        }
        tracing::debug!(
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            "graph restored from snapshot"
        );
        Ok(graph)
    }

    fn reject(err: GraphError<N>) -> GraphError<N> {
        tracing::warn!("rejecting snapshot: {}", err);
        GraphError::InvalidSnapshot(err.to_string())
    }
}

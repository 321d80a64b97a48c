//! The property graph container and its three indexes.

use lpg_types::{
    BidirectionalMode, GraphConfig, GraphError, GraphResult, Node, NodeKey, PropertyContainer,
    Relationship,
};
use serde_json::Value;
use std::collections::hash_map::{self, Entry};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

type Adjacency<N> = HashMap<N, HashMap<N, HashSet<String>>>;
type Registry<N> = HashMap<String, HashMap<N, HashMap<N, Relationship>>>;
type Incoming<N> = HashMap<N, HashSet<N>>;

/// In-memory labeled property graph.
///
/// Every relationship is reachable three ways, and `link`/`unlink` are the
/// only code paths that touch the indexes, so they never disagree.
#[derive(Debug, Clone)]
pub struct PropertyGraph<N = NodeKey> {
    config: GraphConfig,
    /// name -> node.
    nodes: HashMap<N, Node<N>>,
    /// source -> target -> relationship names. Every node has an entry;
    /// a target entry exists only while at least one name remains.
    adjacency: Adjacency<N>,
    /// relationship name -> source -> target -> relationship. Empty maps are pruned.
    registry: Registry<N>,
    /// target -> sources with at least one relationship into it.
    incoming: Incoming<N>,
}

impl<N> Default for PropertyGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> PropertyGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        let capacity = config.node_capacity;
        Self {
            config,
            nodes: HashMap::with_capacity(capacity),
            adjacency: HashMap::with_capacity(capacity),
            registry: HashMap::new(),
            incoming: HashMap::with_capacity(capacity),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // =========================================================================
    // Index maintenance
    // =========================================================================

    fn ensure_node(&self, name: &N) -> GraphResult<(), N> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(name.clone()))
        }
    }

    fn has_edge(&self, from: &N, to: &N, name: &str) -> bool {
        self.adjacency
            .get(from)
            .and_then(|targets| targets.get(to))
            .is_some_and(|names| names.contains(name))
    }

    /// Checks every precondition for installing `name` on `from -> to`.
    pub(crate) fn check_new_edge(&self, from: &N, to: &N, name: &str) -> GraphResult<(), N> {
        if from == to {
            return Err(GraphError::SelfLoop(from.clone()));
        }
        self.ensure_node(from)?;
        self.ensure_node(to)?;
        if self.has_edge(from, to, name) {
            return Err(GraphError::DuplicateRelationship {
                name: name.to_string(),
                from: from.clone(),
                to: to.clone(),
            });
        }
        Ok(())
    }

    /// Installs a relationship in all three indexes. Callers must have run `check_new_edge`.
    pub(crate) fn link(&mut self, from: &N, to: &N, relationship: Relationship) {
        let name = relationship.name().to_string();
        self.adjacency
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_default()
            .insert(name.clone());
        self.incoming
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        self.registry
            .entry(name)
            .or_default()
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), relationship);
    }

    /// Removes a relationship from all three indexes, pruning empty entries.
    fn unlink(&mut self, from: &N, to: &N, name: &str) -> Option<Relationship> {
        let by_source = self.registry.get_mut(name)?;
        let targets = by_source.get_mut(from)?;
        let relationship = targets.remove(to)?;
        if targets.is_empty() {
            by_source.remove(from);
        }
        if by_source.is_empty() {
            self.registry.remove(name);
        }

        if let Some(targets) = self.adjacency.get_mut(from) {
            if let Some(names) = targets.get_mut(to) {
                names.remove(name);
                if names.is_empty() {
                    targets.remove(to);
                    if let Some(sources) = self.incoming.get_mut(to) {
                        sources.remove(from);
                        if sources.is_empty() {
                            self.incoming.remove(to);
                        }
                    }
                }
            }
        }
        Some(relationship)
    }

    // =========================================================================
    // Node operations
    // =========================================================================

    /// Register a new node and return it for further setup.
    pub fn add_node(&mut self, name: N) -> GraphResult<&mut Node<N>, N> {
        self.insert_node(Node::new(name))
    }

    /// Registers an already-built node, keeping its properties and labels.
    pub(crate) fn insert_node(&mut self, node: Node<N>) -> GraphResult<&mut Node<N>, N> {
        match self.nodes.entry(node.name().clone()) {
            Entry::Occupied(e) => Err(GraphError::DuplicateNode(e.key().clone())),
            Entry::Vacant(e) => {
                tracing::debug!(node = ?e.key(), "node added");
                self.adjacency.insert(e.key().clone(), HashMap::new());
                Ok(e.insert(node))
            }
        }
    }

    /// Register many nodes. Nothing is added if any name is taken or repeated.
    pub fn add_nodes<I>(&mut self, names: I) -> GraphResult<(), N>
    where
        I: IntoIterator<Item = N>,
    {
        let names: Vec<N> = names.into_iter().collect();
        {
            let mut seen = HashSet::with_capacity(names.len());
            for name in &names {
                if self.nodes.contains_key(name) || !seen.insert(name) {
                    return Err(GraphError::DuplicateNode(name.clone()));
                }
            }
        }
        for name in names {
            self.add_node(name)?;
        }
        Ok(())
    }

    /// Remove a node together with every relationship into or out of it.
    pub fn remove_node(&mut self, name: &N) -> GraphResult<Node<N>, N> {
        let node = self
            .nodes
            .remove(name)
            .ok_or_else(|| GraphError::UnknownNode(name.clone()))?;

        let mut doomed: Vec<(N, N, String)> = Vec::new();
        if let Some(targets) = self.adjacency.get(name) {
            for (to, names) in targets {
                doomed.extend(names.iter().map(|n| (name.clone(), to.clone(), n.clone())));
            }
        }
        if let Some(sources) = self.incoming.get(name) {
            for from in sources {
                if let Some(names) = self.adjacency.get(from).and_then(|t| t.get(name)) {
                    doomed.extend(names.iter().map(|n| (from.clone(), name.clone(), n.clone())));
                }
            }
        }
        for (from, to, rel) in &doomed {
            self.unlink(from, to, rel);
        }
        self.adjacency.remove(name);
        self.incoming.remove(name);

        tracing::debug!(node = ?name, relationships = doomed.len(), "node removed");
        Ok(node)
    }

    /// The node called `name`.
    pub fn node(&self, name: &N) -> GraphResult<&Node<N>, N> {
        self.nodes
            .get(name)
            .ok_or_else(|| GraphError::UnknownNode(name.clone()))
    }

    /// Mutable access to the node called `name`, for editing its properties and labels.
    pub fn node_mut(&mut self, name: &N) -> GraphResult<&mut Node<N>, N> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownNode(name.clone()))
    }

    pub fn contains_node(&self, name: &N) -> bool {
        self.nodes.contains_key(name)
    }

    // =========================================================================
    // Relationship operations
    // =========================================================================

    /// Add relationship `name` from `from` to `to`, and from `to` to `from`
    /// when `both_ways` is set.
    ///
    /// In [`BidirectionalMode::Atomic`] both directions are validated first,
    /// so a failure changes nothing. In [`BidirectionalMode::Sequential`] a
    /// reverse-direction failure leaves the forward relationship installed.
    pub fn add_relationship(
        &mut self,
        from: &N,
        to: &N,
        name: impl Into<String>,
        both_ways: bool,
    ) -> GraphResult<(), N> {
        let name = name.into();
        self.check_new_edge(from, to, &name)?;
        let atomic = self.config.bidirectional == BidirectionalMode::Atomic;
        if both_ways && atomic {
            self.check_new_edge(to, from, &name)?;
        }

        self.link(from, to, Relationship::new(name.clone()));
        tracing::debug!(from = ?from, to = ?to, relationship = %name, "relationship added");

        if both_ways {
            if !atomic {
                self.check_new_edge(to, from, &name)?;
            }
            self.link(to, from, Relationship::new(name.clone()));
            tracing::debug!(from = ?to, to = ?from, relationship = %name, "relationship added");
        }
        Ok(())
    }

    /// Add `(from, to, name)` triples in order, stopping at the first failure.
    /// Triples before the failing one stay installed. Returns how many were added.
    pub fn add_relationships<I, S>(&mut self, triples: I, both_ways: bool) -> GraphResult<usize, N>
    where
        I: IntoIterator<Item = (N, N, S)>,
        S: Into<String>,
    {
        let mut added = 0;
        for (from, to, name) in triples {
            self.add_relationship(&from, &to, name, both_ways)?;
            added += 1;
        }
        Ok(added)
    }

    /// Remove relationship `name` from `from` to `to` and return it.
    pub fn remove_relationship(
        &mut self,
        name: &str,
        from: &N,
        to: &N,
    ) -> GraphResult<Relationship, N> {
        let relationship = self
            .unlink(from, to, name)
            .ok_or_else(|| GraphError::UnknownRelationship {
                name: name.to_string(),
                from: from.clone(),
                to: to.clone(),
            })?;
        tracing::debug!(from = ?from, to = ?to, relationship = %name, "relationship removed");
        Ok(relationship)
    }

    /// The relationship `name` from `from` to `to`.
    pub fn relationship(&self, name: &str, from: &N, to: &N) -> GraphResult<&Relationship, N> {
        self.registry
            .get(name)
            .and_then(|by_source| by_source.get(from))
            .and_then(|targets| targets.get(to))
            .ok_or_else(|| GraphError::UnknownRelationship {
                name: name.to_string(),
                from: from.clone(),
                to: to.clone(),
            })
    }

    /// Mutable access to relationship `name` from `from` to `to`.
    pub fn relationship_mut(
        &mut self,
        name: &str,
        from: &N,
        to: &N,
    ) -> GraphResult<&mut Relationship, N> {
        self.registry
            .get_mut(name)
            .and_then(|by_source| by_source.get_mut(from))
            .and_then(|targets| targets.get_mut(to))
            .ok_or_else(|| GraphError::UnknownRelationship {
                name: name.to_string(),
                from: from.clone(),
                to: to.clone(),
            })
    }

    /// All relationship instances from `from` to `to`.
    pub fn relationships(&self, from: &N, to: &N) -> GraphResult<Vec<&Relationship>, N> {
        let names = self.relationships_between(from, to)?;
        Ok(names
            .into_iter()
            .filter_map(|name| self.relationship(name, from, to).ok())
            .collect())
    }

    /// Add properties to an existing relationship; all-or-nothing.
    pub fn add_relationship_properties<I, K>(
        &mut self,
        name: &str,
        from: &N,
        to: &N,
        properties: I,
    ) -> GraphResult<(), N>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.relationship_mut(name, from, to)?
            .add_properties(properties)?;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.nodes.keys()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, N, Node<N>> {
        self.nodes.iter()
    }

    /// Every relationship as `(from, to, relationship)`.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, &Relationship)> + '_ {
        self.registry.values().flat_map(|by_source| {
            by_source.iter().flat_map(|(from, targets)| {
                targets.iter().map(move |(to, rel)| (from, to, rel))
            })
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.registry
            .values()
            .flat_map(|by_source| by_source.values())
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct relationship names present anywhere in the graph.
    pub fn unique_relationship_names(&self) -> HashSet<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    /// Nodes reachable over at least one outgoing relationship.
    pub fn neighbors(&self, node: &N) -> GraphResult<Vec<&N>, N> {
        self.adjacency
            .get(node)
            .map(|targets| targets.keys().collect())
            .ok_or_else(|| GraphError::UnknownNode(node.clone()))
    }

    /// Nodes with at least one relationship pointing at `node`.
    pub fn incoming(&self, node: &N) -> GraphResult<Vec<&N>, N> {
        self.ensure_node(node)?;
        Ok(self
            .incoming
            .get(node)
            .map(|sources| sources.iter().collect())
            .unwrap_or_default())
    }

    /// Whether at least one relationship goes from `from` to `to`.
    pub fn adjacent(&self, from: &N, to: &N) -> GraphResult<bool, N> {
        self.ensure_node(to)?;
        self.adjacency
            .get(from)
            .map(|targets| targets.contains_key(to))
            .ok_or_else(|| GraphError::UnknownNode(from.clone()))
    }

    /// Names of the relationships from `from` to `to`; empty if there are none.
    pub fn relationships_between(&self, from: &N, to: &N) -> GraphResult<HashSet<&str>, N> {
        self.ensure_node(from)?;
        self.ensure_node(to)?;
        Ok(self
            .adjacency
            .get(from)
            .and_then(|targets| targets.get(to))
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default())
    }

    /// Source nodes with at least one outgoing relationship called `name`.
    pub fn nodes_with_relationship(&self, name: &str) -> Vec<&N> {
        self.registry
            .get(name)
            .map(|by_source| by_source.keys().collect())
            .unwrap_or_default()
    }

    pub fn has_relationship(
        &self,
        from: &N,
        to: &N,
        name: &str,
        both_ways: bool,
    ) -> GraphResult<bool, N> {
        self.ensure_node(from)?;
        self.ensure_node(to)?;
        let forward = self.has_edge(from, to, name);
        Ok(if both_ways {
            forward && self.has_edge(to, from, name)
        } else {
            forward
        })
    }
}

impl<'a, N> IntoIterator for &'a PropertyGraph<N> {
    type Item = (&'a N, &'a Node<N>);
    type IntoIter = hash_map::Iter<'a, N, Node<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
impl<N> PropertyGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    /// Panics if the three indexes disagree with each other or the node registry.
    pub(crate) fn assert_consistent(&self) {
        let adjacency_keys: HashSet<&N> = self.adjacency.keys().collect();
        let node_keys: HashSet<&N> = self.nodes.keys().collect();
        assert_eq!(adjacency_keys, node_keys, "adjacency keys != node registry");

        let mut from_adjacency = 0;
        for (from, targets) in &self.adjacency {
            for (to, names) in targets {
                assert!(!names.is_empty(), "empty name set kept for {:?} -> {:?}", from, to);
                assert!(self.nodes.contains_key(to), "dangling target {:?}", to);
                assert!(
                    self.incoming.get(to).is_some_and(|s| s.contains(from)),
                    "incoming index missing {:?} -> {:?}",
                    from,
                    to
                );
                for name in names {
                    let rel = self
                        .relationship(name, from, to)
                        .expect("adjacency name without registry entry");
                    assert_eq!(rel.name(), name);
                    from_adjacency += 1;
                }
            }
        }
        assert_eq!(from_adjacency, self.relationship_count());

        for (to, sources) in &self.incoming {
            assert!(!sources.is_empty());
            for from in sources {
                assert!(self.adjacency.get(from).is_some_and(|t| t.contains_key(to)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn name(s: &str) -> NodeKey {
        NodeKey::from(s)
    }

    fn loaded_graph() -> PropertyGraph {
        let mut g = PropertyGraph::new();
        g.add_nodes(["Charlie", "Unicorn", "Pegasus"].map(NodeKey::from))
            .unwrap();
        g.add_relationship(&name("Charlie"), &name("Unicorn"), "buddies", true)
            .unwrap();
        g.add_relationship(&name("Charlie"), &name("Unicorn"), "cousins", false)
            .unwrap();
        g
    }

    #[test]
    fn empty_graph_has_nothing() {
        let g: PropertyGraph = PropertyGraph::new();
        assert!(g.is_empty());
        assert_eq!(g.nodes().count(), 0);
        assert_eq!(g.relationship_count(), 0);
        assert!(g.unique_relationship_names().is_empty());
        g.assert_consistent();
    }

    #[test]
    fn add_node_twice_fails_and_leaves_state() {
        let mut g = PropertyGraph::new();
        g.add_node(name("Kurt")).unwrap();
        let before = g.node_count();
        assert_eq!(
            g.add_node(name("Kurt")).unwrap_err(),
            GraphError::DuplicateNode(name("Kurt"))
        );
        assert_eq!(g.node_count(), before);
        g.assert_consistent();
    }

    #[test]
    fn add_node_returns_node_for_setup() {
        let mut g = PropertyGraph::new();
        g.add_node(name("Kurt"))
            .unwrap()
            .add_property("age", json!(30))
            .unwrap();
        assert_eq!(g.node(&name("Kurt")).unwrap().property("age"), Some(&json!(30)));
    }

    #[test]
    fn add_nodes_is_all_or_nothing() {
        let mut g = PropertyGraph::new();
        g.add_node(name("b")).unwrap();
        let err = g
            .add_nodes(["a", "b", "c"].map(NodeKey::from))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode(name("b")));
        assert_eq!(g.node_count(), 1);

        let err = g.add_nodes(["x", "x"].map(NodeKey::from)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode(name("x")));
        assert!(!g.contains_node(&name("x")));
        g.assert_consistent();
    }

    #[test]
    fn scenario_buddies_and_cousins() {
        let g = loaded_graph();
        assert_eq!(
            g.relationships_between(&name("Charlie"), &name("Unicorn")).unwrap(),
            HashSet::from(["buddies", "cousins"])
        );
        assert_eq!(
            g.relationships_between(&name("Unicorn"), &name("Charlie")).unwrap(),
            HashSet::from(["buddies"])
        );
        assert_eq!(g.relationship_count(), 3);
        g.assert_consistent();
    }

    #[test]
    fn duplicate_relationship_is_rejected() {
        let mut g = loaded_graph();
        let err = g
            .add_relationship(&name("Charlie"), &name("Unicorn"), "buddies", false)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateRelationship {
                name: "buddies".to_string(),
                from: name("Charlie"),
                to: name("Unicorn"),
            }
        );
        assert_eq!(g.relationship_count(), 3);
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let mut g: PropertyGraph = PropertyGraph::new();
        assert_eq!(
            g.add_relationship(&name("Will"), &name("Bill"), "durka", false),
            Err(GraphError::UnknownNode(name("Will")))
        );
        g.add_node(name("Kurt")).unwrap();
        assert_eq!(
            g.add_relationship(&name("Kurt"), &name("Bill"), "durka", false),
            Err(GraphError::UnknownNode(name("Bill")))
        );
        assert_eq!(
            g.add_relationship(&name("Bill"), &name("Kurt"), "durka", false),
            Err(GraphError::UnknownNode(name("Bill")))
        );
        assert_eq!(g.relationship_count(), 0);
        g.assert_consistent();
    }

    #[test]
    fn self_loops_are_rejected() {
        let mut g = loaded_graph();
        for n in ["Charlie", "Unicorn", "Ghost"] {
            assert_eq!(
                g.add_relationship(&name(n), &name(n), "buddies", false),
                Err(GraphError::SelfLoop(name(n)))
            );
        }
    }

    #[test]
    fn atomic_both_ways_changes_nothing_on_reverse_conflict() {
        let mut g = PropertyGraph::new();
        g.add_nodes(["a", "b"].map(NodeKey::from)).unwrap();
        g.add_relationship(&name("b"), &name("a"), "likes", false)
            .unwrap();
        let err = g
            .add_relationship(&name("a"), &name("b"), "likes", true)
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateRelationship { .. }));
        assert!(!g.adjacent(&name("a"), &name("b")).unwrap());
        assert_eq!(g.relationship_count(), 1);
        g.assert_consistent();
    }

    #[test]
    fn sequential_both_ways_keeps_forward_edge_on_reverse_conflict() {
        let mut g = PropertyGraph::with_config(GraphConfig {
            bidirectional: BidirectionalMode::Sequential,
            ..GraphConfig::default()
        });
        g.add_nodes(["a", "b"].map(NodeKey::from)).unwrap();
        g.add_relationship(&name("b"), &name("a"), "likes", false)
            .unwrap();
        let err = g
            .add_relationship(&name("a"), &name("b"), "likes", true)
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateRelationship { .. }));
        assert!(g.has_relationship(&name("a"), &name("b"), "likes", true).unwrap());
        assert_eq!(g.relationship_count(), 2);
        g.assert_consistent();
    }

    #[test]
    fn remove_relationship_prunes_empty_pair() {
        let mut g = loaded_graph();
        let (c, u) = (name("Charlie"), name("Unicorn"));
        let removed = g.remove_relationship("cousins", &c, &u).unwrap();
        assert_eq!(removed.name(), "cousins");
        assert_eq!(
            g.relationships_between(&c, &u).unwrap(),
            HashSet::from(["buddies"])
        );
        assert!(!g.unique_relationship_names().contains("cousins"));

        g.remove_relationship("buddies", &c, &u).unwrap();
        assert!(g.relationships_between(&c, &u).unwrap().is_empty());
        assert!(!g.adjacent(&c, &u).unwrap());
        assert!(g.neighbors(&c).unwrap().is_empty());
        // reverse direction untouched
        assert!(g.adjacent(&u, &c).unwrap());
        g.assert_consistent();
    }

    #[test]
    fn remove_unknown_relationship_fails() {
        let mut g = loaded_graph();
        let err = g
            .remove_relationship("siblings", &name("Charlie"), &name("Unicorn"))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownRelationship { .. }));
        assert_eq!(g.relationship_count(), 3);
    }

    #[test]
    fn remove_node_cascades_both_directions() {
        let mut g = loaded_graph();
        g.add_nodes(["Isolated", "Wendy"].map(NodeKey::from)).unwrap();
        let wendy = name("Wendy");
        for n in ["Charlie", "Unicorn", "Pegasus"] {
            g.add_relationship(&wendy, &name(n), "friends", false).unwrap();
        }
        for (rel, n) in [("boss", "Charlie"), ("parent", "Unicorn"), ("administrator", "Pegasus")] {
            g.add_relationship(&name(n), &wendy, rel, false).unwrap();
        }
        assert_eq!(g.relationship_count(), 9);

        let removed = g.remove_node(&wendy).unwrap();
        assert_eq!(removed.name(), &wendy);
        assert!(!g.contains_node(&wendy));
        assert!(g.edges().all(|(from, to, _)| from != &wendy && to != &wendy));
        assert_eq!(g.relationship_count(), 3);
        for rel in ["friends", "boss", "parent", "administrator"] {
            assert!(!g.unique_relationship_names().contains(rel));
        }
        assert!(g.neighbors(&name("Charlie")).unwrap().iter().all(|n| **n != wendy));
        g.assert_consistent();
    }

    #[test]
    fn remove_missing_node_fails() {
        let mut g: PropertyGraph = PropertyGraph::new();
        assert_eq!(
            g.remove_node(&name("Kurt")).unwrap_err(),
            GraphError::UnknownNode(name("Kurt"))
        );
    }

    #[test]
    fn neighbors_and_incoming() {
        let mut g = loaded_graph();
        g.add_nodes(["Wendy", "Teddy"].map(NodeKey::from)).unwrap();
        let others: Vec<NodeKey> = g.nodes().filter(|n| n.as_str() != Some("Wendy")).cloned().collect();
        for n in &others {
            g.add_relationship(&name("Wendy"), n, "buddy", false).unwrap();
        }
        let neighbors: HashSet<&NodeKey> = g.neighbors(&name("Wendy")).unwrap().into_iter().collect();
        let expected: HashSet<&NodeKey> = others.iter().collect();
        assert_eq!(neighbors, expected);
        assert_eq!(g.incoming(&name("Teddy")).unwrap(), vec![&name("Wendy")]);
        assert!(g.incoming(&name("Wendy")).unwrap().is_empty());
        assert_eq!(
            g.neighbors(&name("Nobody")).unwrap_err(),
            GraphError::UnknownNode(name("Nobody"))
        );
    }

    #[test]
    fn adjacency_checks_both_nodes() {
        let g = loaded_graph();
        assert!(g.adjacent(&name("Charlie"), &name("Unicorn")).unwrap());
        assert!(!g.adjacent(&name("Charlie"), &name("Pegasus")).unwrap());
        assert!(g.adjacent(&name("Ghost"), &name("Charlie")).is_err());
        assert!(g.adjacent(&name("Charlie"), &name("Ghost")).is_err());
    }

    #[test]
    fn nodes_with_relationship_lists_sources() {
        let mut g = loaded_graph();
        let mut with_buddies = g.nodes_with_relationship("buddies");
        with_buddies.sort_by_key(|n| n.to_string());
        assert_eq!(with_buddies, vec![&name("Charlie"), &name("Unicorn")]);
        assert_eq!(g.nodes_with_relationship("cousins"), vec![&name("Charlie")]);
        assert!(g.nodes_with_relationship("siblings").is_empty());

        g.add_relationship(&name("Pegasus"), &name("Unicorn"), "cousins", false)
            .unwrap();
        assert_eq!(g.nodes_with_relationship("cousins").len(), 2);
    }

    #[test]
    fn has_relationship_respects_direction() {
        let g = loaded_graph();
        let (c, u) = (name("Charlie"), name("Unicorn"));
        assert!(g.has_relationship(&c, &u, "buddies", true).unwrap());
        assert!(g.has_relationship(&c, &u, "cousins", false).unwrap());
        assert!(!g.has_relationship(&c, &u, "cousins", true).unwrap());
        assert!(!g.has_relationship(&c, &u, "siblings", false).unwrap());
        assert!(!g.has_relationship(&c, &name("Pegasus"), "buddies", false).unwrap());
    }

    #[test]
    fn relationship_properties_mutate_in_place() {
        let mut g = loaded_graph();
        let (c, u) = (name("Charlie"), name("Unicorn"));
        g.add_relationship_properties("buddies", &c, &u, [("since", json!(1985))])
            .unwrap();
        assert_eq!(
            g.relationship("buddies", &c, &u).unwrap().property("since"),
            Some(&json!(1985))
        );
        // the reverse instance is a separate relationship
        assert!(!g.relationship("buddies", &u, &c).unwrap().has_property("since"));

        let err = g
            .add_relationship_properties("buddies", &c, &u, [("since", json!(1990))])
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::Property(lpg_types::PropertyError::DuplicateKey("since".to_string()))
        );

        g.relationship_mut("buddies", &c, &u)
            .unwrap()
            .change_property("since", json!(1990))
            .unwrap();
        assert_eq!(
            g.relationship("buddies", &c, &u).unwrap().property("since"),
            Some(&json!(1990))
        );
        assert!(g.relationship("siblings", &c, &u).is_err());

        let mut names: Vec<&str> = g.relationships(&c, &u).unwrap().into_iter().map(|r| r.name()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["buddies", "cousins"]);
    }

    #[test]
    fn add_relationships_stops_at_first_failure() {
        let mut g = PropertyGraph::new();
        g.add_nodes(["a", "b", "c"].map(NodeKey::from)).unwrap();
        let err = g
            .add_relationships(
                [
                    (name("a"), name("b"), "r"),
                    (name("b"), name("c"), "r"),
                    (name("c"), name("c"), "r"),
                    (name("c"), name("a"), "r"),
                ],
                false,
            )
            .unwrap_err();
        assert_eq!(err, GraphError::SelfLoop(name("c")));
        assert_eq!(g.relationship_count(), 2);
        assert!(!g.adjacent(&name("c"), &name("a")).unwrap());
        g.assert_consistent();
    }

    #[test]
    fn integral_float_name_collides_with_int_name() {
        let mut g = PropertyGraph::new();
        g.add_node(NodeKey::from(1)).unwrap();
        assert_eq!(
            g.add_node(NodeKey::from(1.0)).unwrap_err(),
            GraphError::DuplicateNode(NodeKey::from(1.0))
        );
        g.add_node(NodeKey::from(2.5)).unwrap();
        g.add_relationship(&NodeKey::from(1.0), &NodeKey::from(2.5), "r", false)
            .unwrap();
        assert!(g.adjacent(&NodeKey::from(1), &NodeKey::from(2.5)).unwrap());
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn mixed_key_types_are_accepted() {
        let mut g = PropertyGraph::new();
        let keys = vec![
            NodeKey::from("Kurt"),
            NodeKey::from(3451),
            NodeKey::from(3.21),
            NodeKey::Null,
        ];
        g.add_nodes(keys.clone()).unwrap();
        for k in &keys {
            assert!(g.contains_node(k));
        }
        g.add_relationship(&NodeKey::Null, &NodeKey::from(3.21), "weird", true)
            .unwrap();
        assert!(g.adjacent(&NodeKey::from(3.21), &NodeKey::Null).unwrap());
        g.assert_consistent();
    }

    #[test]
    fn string_names_work_without_node_key() {
        let mut g: PropertyGraph<String> = PropertyGraph::new();
        g.add_node("a".to_string()).unwrap();
        g.add_node("b".to_string()).unwrap();
        g.add_relationship(&"a".to_string(), &"b".to_string(), "r", false)
            .unwrap();
        assert!(g.adjacent(&"a".to_string(), &"b".to_string()).unwrap());
        let names: HashSet<&String> = (&g).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn randomised_churn_keeps_indexes_consistent() {
        let mut g: PropertyGraph<u32> = PropertyGraph::new();
        g.add_nodes(0..40).unwrap();
        let rels = ["a", "b", "c"];
        let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);
        for _ in 0..500 {
            let a = rng.gen_range(0..40u32);
            let b = rng.gen_range(0..40u32);
            let rel = rels[rng.gen_range(0..rels.len())];
            match g.add_relationship(&a, &b, rel, rng.gen_bool(0.5)) {
                Ok(()) => assert!(g.has_relationship(&a, &b, rel, false).unwrap()),
                Err(GraphError::SelfLoop(_)) | Err(GraphError::DuplicateRelationship { .. }) => {}
                Err(other) => panic!("unexpected error for {a} -> {b} ({rel}): {other}"),
            }
        }
        g.assert_consistent();
        for victim in [3u32, 17, 29] {
            g.remove_node(&victim).unwrap();
            g.assert_consistent();
            assert!(g.edges().all(|(f, t, _)| *f != victim && *t != victim));
        }
        let pairs: Vec<(u32, u32, String)> = g
            .edges()
            .map(|(f, t, r)| (*f, *t, r.name().to_string()))
            .step_by(2)
            .collect();
        for (f, t, r) in pairs {
            g.remove_relationship(&r, &f, &t).unwrap();
        }
        g.assert_consistent();
    }
}

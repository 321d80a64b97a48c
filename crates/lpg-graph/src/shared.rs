//! Thread-safe handle: one async RwLock guarding the graph and all its indexes.

use crate::graph::PropertyGraph;
use crate::snapshot::GraphSnapshot;
use lpg_types::{GraphConfig, GraphResult, Node, NodeKey, Relationship};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable handle to a [`PropertyGraph`] shared between tasks.
///
/// Writers hold the lock for the whole call, so a node removal and its
/// cascade are never observed half-done.
pub struct SharedGraph<N = NodeKey> {
    inner: Arc<RwLock<PropertyGraph<N>>>,
}

impl<N> Clone for SharedGraph<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N> Default for SharedGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> From<PropertyGraph<N>> for SharedGraph<N> {
    fn from(graph: PropertyGraph<N>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }
}

impl<N> SharedGraph<N>
where
    N: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        PropertyGraph::with_config(config).into()
    }

    /// Run `f` under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&PropertyGraph<N>) -> R) -> R {
        let guard = self.inner.read().await;
        f(&*guard)
    }

    /// Run `f` under the write lock.
    pub async fn write<R>(&self, f: impl FnOnce(&mut PropertyGraph<N>) -> R) -> R {
        let mut guard = self.inner.write().await;
        f(&mut *guard)
    }

    pub async fn add_node(&self, name: N) -> GraphResult<(), N> {
        self.inner.write().await.add_node(name).map(|_| ())
    }

    pub async fn remove_node(&self, name: &N) -> GraphResult<Node<N>, N> {
        self.inner.write().await.remove_node(name)
    }

    pub async fn add_relationship(
        &self,
        from: &N,
        to: &N,
        name: impl Into<String>,
        both_ways: bool,
    ) -> GraphResult<(), N> {
        self.inner
            .write()
            .await
            .add_relationship(from, to, name, both_ways)
    }

    pub async fn remove_relationship(
        &self,
        name: &str,
        from: &N,
        to: &N,
    ) -> GraphResult<Relationship, N> {
        self.inner.write().await.remove_relationship(name, from, to)
    }

    pub async fn contains_node(&self, name: &N) -> bool {
        self.inner.read().await.contains_node(name)
    }

    pub async fn node_count(&self) -> usize {
        self.inner.read().await.node_count()
    }

    pub async fn neighbors(&self, node: &N) -> GraphResult<Vec<N>, N> {
        let guard = self.inner.read().await;
        let neighbors = guard.neighbors(node)?;
        Ok(neighbors.into_iter().cloned().collect())
    }

    pub async fn relationships_between(&self, from: &N, to: &N) -> GraphResult<Vec<String>, N> {
        let guard = self.inner.read().await;
        let names = guard.relationships_between(from, to)?;
        let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    pub async fn snapshot(&self) -> GraphSnapshot<N> {
        self.inner.read().await.snapshot()
    }
}

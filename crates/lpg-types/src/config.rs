//! Graph configuration.

use serde::{Deserialize, Serialize};

/// How a `both_ways` relationship insert treats a conflict in the reverse direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidirectionalMode {
    /// Validate both directions before touching either; a conflict changes nothing.
    #[default]
    Atomic,
    /// Install the forward edge, then the reverse one. A reverse conflict
    /// leaves the forward edge in place.
    Sequential,
}

impl std::str::FromStr for BidirectionalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "atomic" => Ok(BidirectionalMode::Atomic),
            "sequential" => Ok(BidirectionalMode::Sequential),
            other => Err(format!("unknown bidirectional mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub bidirectional: BidirectionalMode,
    /// Initial capacity hint for the node registry and indexes.
    #[serde(default = "default_node_capacity")]
    pub node_capacity: usize,
}

fn default_node_capacity() -> usize {
    0
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bidirectional: BidirectionalMode::default(),
            node_capacity: default_node_capacity(),
        }
    }
}

impl GraphConfig {
    /// Read `LPG_BIDIRECTIONAL_MODE` and `LPG_NODE_CAPACITY`; missing or
    /// unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup("LPG_BIDIRECTIONAL_MODE") {
            match raw.parse() {
                Ok(mode) => config.bidirectional = mode,
                Err(e) => tracing::warn!("ignoring LPG_BIDIRECTIONAL_MODE: {}", e),
            }
        }
        if let Some(raw) = lookup("LPG_NODE_CAPACITY") {
            match raw.trim().parse() {
                Ok(n) => config.node_capacity = n,
                Err(e) => tracing::warn!("ignoring LPG_NODE_CAPACITY={}: {}", raw, e),
            }
        }
        config
    }
}

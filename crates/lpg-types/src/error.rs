//! Error taxonomy for element and graph operations.

/// Misuse of the property/label contract on a node or relationship.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property already exists: {0} (use change_property to alter it)")]
    DuplicateKey(String),

    #[error("property does not exist: {0}")]
    MissingKey(String),

    #[error("label already set: {0}")]
    DuplicateLabel(String),

    #[error("label not set: {0}")]
    MissingLabel(String),
}

/// Errors for graph operations, generic over the node name type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError<N> {
    #[error("node already exists: {0:?}")]
    DuplicateNode(N),

    #[error("node not found: {0:?}")]
    UnknownNode(N),

    #[error("node cannot relate to itself: {0:?}")]
    SelfLoop(N),

    #[error("relationship {name} already exists: {from:?} -> {to:?}")]
    DuplicateRelationship { name: String, from: N, to: N },

    #[error("relationship {name} not found: {from:?} -> {to:?}")]
    UnknownRelationship { name: String, from: N, to: N },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

pub type GraphResult<T, N> = Result<T, GraphError<N>>;

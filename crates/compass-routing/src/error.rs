use compass_core::Error as CoreError;
use std::result::Result as StdResult;
use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = StdResult<T, RoutingError>;

/// Errors raised while generating a routing decision.
///
/// None of these reach the external caller: the router's top-level boundary
/// converts any of them into the hard-coded fallback decision.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A lower-layer error bubbled up.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// The capability registry holds no agents.
    #[error("No agents registered in the capability registry")]
    EmptyRegistry,

    /// A strategy referenced an agent absent from the registry.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// Strategy generation failed for another reason.
    #[error("Strategy generation failed: {0}")]
    Generation(String),
}

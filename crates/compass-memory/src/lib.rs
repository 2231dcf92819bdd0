//! Persistent per-user memory for the compass routing layer.
//!
//! Three memory kinds survive across a user's sessions: semantic facts
//! (durable statements about the user), conversation episodes (summaries of
//! past conversations), and procedural patterns (condition/action pairs with
//! empirically tracked success rates). All three persist through the cache
//! service under per-user index keys and feed back into routing decisions.

/// Episodic memory: past-conversation summaries.
pub mod episodic;
/// Per-user id indexes.
mod index;
/// Procedural memory: condition/action patterns.
pub mod procedural;
/// Semantic memory: durable user facts.
pub mod semantic;

/// The coordinator aggregating all three memory kinds.
pub mod coordinator;

pub use coordinator::{InteractionOutcome, MemoryContext, MemoryCoordinator};
pub use episodic::{ConversationEpisode, EpisodicMemory};
pub use procedural::{ProceduralMemory, ProceduralPattern};
pub use semantic::{FactCategory, SemanticFact, SemanticMemory};

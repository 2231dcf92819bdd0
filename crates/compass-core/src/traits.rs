use async_trait::async_trait;

use crate::{AnalysisResponse, Result};

/// Trait for specialist agents that can produce a domain analysis.
///
/// The router never constructs model-specific prompts; it hands the raw
/// query plus an assembled contextual prompt to the provider and consumes
/// the typed response.
#[async_trait]
pub trait SpecialistProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Checks whether this provider is currently reachable and ready.
    async fn is_available(&self) -> bool;

    /// Generates an analysis for the given query.
    ///
    /// `contextual_prompt` carries the user/memory context the router
    /// assembled; its internal format is opaque to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unavailable, the request fails,
    /// or the response cannot be parsed.
    async fn generate(&self, query: &str, contextual_prompt: &str) -> Result<AnalysisResponse>;
}

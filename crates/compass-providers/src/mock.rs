//! Mock specialist provider for testing routing flows.
//!
//! Canned responses keyed by query substring, plus call history, so router
//! behavior can be exercised end-to-end without a live analysis service.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use compass_core::{AnalysisResponse, IgnorePoison as _, Result, SpecialistProvider};

/// Canned response storage.
type ResponseMap = Arc<RwLock<HashMap<String, String>>>;

/// Specialist provider returning pre-defined analyses.
#[derive(Clone)]
pub struct MockSpecialistProvider {
    /// Display name reported in responses.
    agent: String,
    /// Responses keyed by query substring.
    responses: ResponseMap,
    /// Confidence attached to every response.
    confidence: f64,
    /// Queries seen so far.
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockSpecialistProvider {
    /// Creates a mock provider reporting the given agent name.
    #[must_use]
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            responses: Arc::new(RwLock::new(HashMap::new())),
            confidence: 0.9,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Registers a canned response for queries containing `pattern`.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write_ignore_poison()
            .insert(pattern.into(), response.into());
        self
    }

    /// Sets the confidence attached to responses.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Queries this provider has served, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.read_ignore_poison().clone()
    }

    /// Number of calls served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.read_ignore_poison().len()
    }

    fn find_response(&self, query: &str) -> Option<String> {
        let responses = self.responses.read_ignore_poison();

        if let Some(response) = responses.get(query) {
            return Some(response.clone());
        }
        responses
            .iter()
            .find(|(pattern, _)| query.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl SpecialistProvider for MockSpecialistProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, query: &str, _contextual_prompt: &str) -> Result<AnalysisResponse> {
        self.calls.write_ignore_poison().push(query.to_owned());

        let text = self
            .find_response(query)
            .unwrap_or_else(|| format!("Mock analysis for: {query}"));

        Ok(AnalysisResponse {
            text,
            extracted_sql_query: None,
            confidence: self.confidence,
            agent: self.agent.clone(),
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_match_response() {
        let provider = MockSpecialistProvider::new("test").with_response("hello", "canned");

        let response = provider.generate("hello", "").await;
        assert!(matches!(response, Ok(ref resp) if resp.text == "canned"));
    }

    #[tokio::test]
    async fn test_substring_match_response() {
        let provider =
            MockSpecialistProvider::new("test").with_response("supplier", "supplier analysis");

        let response = provider.generate("rank supplier spend", "").await;
        assert!(matches!(response, Ok(ref resp) if resp.text == "supplier analysis"));
    }

    #[tokio::test]
    async fn test_default_response_and_history() {
        let provider = MockSpecialistProvider::new("test");

        let first = provider.generate("first", "").await;
        assert!(first.is_ok());
        let second = provider.generate("second", "").await;
        assert!(second.is_ok());

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls(), vec!["first".to_owned(), "second".to_owned()]);
    }

    #[tokio::test]
    async fn test_confidence_override() {
        let provider = MockSpecialistProvider::new("test").with_confidence(0.42);
        let response = provider.generate("anything", "").await;
        assert!(matches!(response, Ok(ref resp) if (resp.confidence - 0.42).abs() < f64::EPSILON));
    }
}

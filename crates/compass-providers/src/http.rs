use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use compass_core::{AnalysisResponse, Error, Result, SpecialistProvider};

/// Env var key for the analysis service API key.
const ENV_ANALYSIS_API_KEY: &str = "COMPASS_ANALYSIS_API_KEY";

/// Specialist provider backed by the analysis HTTP service.
pub struct HttpSpecialistProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Base URL of the analysis service.
    base_url: String,
    /// API key for the service.
    api_key: String,
}

impl HttpSpecialistProvider {
    /// Creates a provider from the base URL and the environment API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the `COMPASS_ANALYSIS_API_KEY` environment
    /// variable is not set.
    pub fn new(base_url: &str) -> Result<Self> {
        let api_key = std::env::var(ENV_ANALYSIS_API_KEY)
            .map_err(|_| Error::MissingApiKey(ENV_ANALYSIS_API_KEY.to_owned()))?;
        Self::with_api_key(base_url, api_key)
    }

    /// Creates a provider with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provided API key is empty.
    pub fn with_api_key(base_url: &str, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_ANALYSIS_API_KEY.to_owned()));
        }

        Ok(Self {
            client: Client::default(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }
}

/// Request payload sent to the analysis service.
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    /// The user's natural-language query.
    query: &'a str,
    /// Assembled context the agent should consider.
    context: &'a str,
}

/// Response payload returned by the analysis service.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    /// Generated analysis text.
    text: String,
    /// SQL the agent derived, when the query maps to a data source.
    sql_query: Option<String>,
    /// Self-reported confidence.
    confidence: f64,
    /// Identifier of the agent that answered.
    agent: Option<String>,
}

#[async_trait]
impl SpecialistProvider for HttpSpecialistProvider {
    fn name(&self) -> &'static str {
        "analysis-http"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, query: &str, contextual_prompt: &str) -> Result<AnalysisResponse> {
        let start = Instant::now();

        let request = AnalyzeRequest {
            query,
            context: contextual_prompt,
        };

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::Provider(format!("analysis request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Provider(format!(
                "analysis service error {status}: {error_text}"
            )));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|err| Error::InvalidResponse(format!("malformed analysis body: {err}")))?;

        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(AnalysisResponse {
            text: body.text,
            extracted_sql_query: body.sql_query,
            confidence: body.confidence.clamp(0.0, 1.0),
            agent: body.agent.unwrap_or_else(|| "analysis-http".to_owned()),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = HttpSpecialistProvider::with_api_key("http://localhost:8080", String::new());
        assert!(matches!(result, Err(Error::MissingApiKey(_))));
    }

    #[tokio::test]
    async fn test_availability_tracks_api_key() {
        let provider =
            match HttpSpecialistProvider::with_api_key("http://localhost:8080", "k".to_owned()) {
                Ok(provider) => provider,
                Err(error) => panic!("construction failed: {error}"),
            };
        assert!(provider.is_available().await);
        assert_eq!(provider.name(), "analysis-http");
    }
}

//! Scorer adapter over a specialist provider.
//!
//! The provider is asked for the six scores in a line-oriented format and
//! the reply is regex-parsed. All parsing lives here; a malformed reply is
//! an `InvalidResponse` error for the analyzer to absorb, never a panic.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use compass_core::{Error, SpecialistProvider};

use crate::error::Result;
use crate::types::ComplexityDimensions;

/// Prompt template sent to the scoring provider.
const SCORING_PROMPT: &str = "Rate the analytics request on six dimensions, each 0.0 to 1.0. \
     Reply with exactly six lines in the form 'dimension: score' for \
     semantic, technical, analytical, collaborative, temporal, comparative.";

// Static pattern, compiles or the crate is broken.
#[allow(clippy::unwrap_used)]
fn score_line_regex() -> &'static Regex {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    SCORE_RE.get_or_init(|| {
        Regex::new(
            r"(?mi)^\s*(semantic|technical|analytical|collaborative|temporal|comparative)\s*[:=]\s*([0-9]*\.?[0-9]+)",
        )
        .unwrap()
    })
}

/// Complexity scorer backed by a language-model provider.
pub struct ProviderScorer {
    provider: Arc<dyn SpecialistProvider>,
}

impl ProviderScorer {
    /// Wraps a provider as a scorer.
    #[must_use]
    pub fn new(provider: Arc<dyn SpecialistProvider>) -> Self {
        Self { provider }
    }

    fn parse(text: &str) -> Result<ComplexityDimensions> {
        let mut semantic = None;
        let mut technical = None;
        let mut analytical = None;
        let mut collaborative = None;
        let mut temporal = None;
        let mut comparative = None;

        for capture in score_line_regex().captures_iter(text) {
            let score: f64 = capture[2]
                .parse()
                .map_err(|_| Error::InvalidResponse(format!("bad score in: {}", &capture[0])))?;
            // The regex admits exactly the six dimension names.
            let slot = match capture[1].to_lowercase().as_str() {
                "semantic" => &mut semantic,
                "technical" => &mut technical,
                "analytical" => &mut analytical,
                "collaborative" => &mut collaborative,
                "temporal" => &mut temporal,
                _ => &mut comparative,
            };
            slot.get_or_insert(score);
        }

        match (
            semantic,
            technical,
            analytical,
            collaborative,
            temporal,
            comparative,
        ) {
            (Some(s), Some(t), Some(a), Some(c), Some(tm), Some(cp)) => Ok(ComplexityDimensions {
                semantic: s,
                technical: t,
                analytical: a,
                collaborative: c,
                temporal: tm,
                comparative: cp,
            }
            .clamped()),
            _ => Err(Error::InvalidResponse(
                "scoring reply missing one or more dimensions".to_owned(),
            )
            .into()),
        }
    }
}

#[async_trait]
impl super::scorer::ComplexityScorer for ProviderScorer {
    fn name(&self) -> &'static str {
        "provider"
    }

    async fn score(
        &self,
        query: &str,
        data_source_hint: Option<&str>,
    ) -> Result<ComplexityDimensions> {
        let mut prompt = SCORING_PROMPT.to_owned();
        if let Some(hint) = data_source_hint {
            prompt.push_str("\nThe request targets the data source: ");
            prompt.push_str(hint);
        }

        let response = self.provider.generate(query, &prompt).await?;
        Self::parse(&response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_reply() {
        let text = "semantic: 0.7\ntechnical: 0.4\nanalytical: 0.8\n\
                    collaborative: 0.5\ntemporal: 0.2\ncomparative: 0.3";
        let dims = match ProviderScorer::parse(text) {
            Ok(dims) => dims,
            Err(error) => panic!("parse failed: {error}"),
        };
        assert!((dims.semantic - 0.7).abs() < f64::EPSILON);
        assert!((dims.comparative - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_tolerates_prose_and_case() {
        let text = "Here are the scores:\nSemantic = 0.6\nTechnical: 0.3\n\
                    Analytical: 0.5\nCollaborative: 0.4\nTemporal: 0.1\n\
                    Comparative: 0.2\nHope that helps!";
        assert!(ProviderScorer::parse(text).is_ok());
    }

    #[test]
    fn test_parse_clamps_out_of_range_scores() {
        let text = "semantic: 1.4\ntechnical: 0.4\nanalytical: 0.8\n\
                    collaborative: 0.5\ntemporal: 0.2\ncomparative: 0.3";
        let dims = match ProviderScorer::parse(text) {
            Ok(dims) => dims,
            Err(error) => panic!("parse failed: {error}"),
        };
        assert!((dims.semantic - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_rejects_missing_dimension() {
        let text = "semantic: 0.7\ntechnical: 0.4";
        assert!(ProviderScorer::parse(text).is_err());
    }
}

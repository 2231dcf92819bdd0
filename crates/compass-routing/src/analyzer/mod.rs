//! Query complexity analysis.

/// Provider-backed scorer adapter.
pub mod provider;
/// Scorer trait and the deterministic keyword scorer.
pub mod scorer;

use std::sync::Arc;

use compass_core::Specialization;

use crate::types::ComplexityAnalysis;

pub use provider::ProviderScorer;
pub use scorer::{ComplexityScorer, KeywordScorer};

/// Confidence attached to analyses whose scorer succeeded.
const SCORED_CONFIDENCE: f64 = 0.85;

/// Scores queries and derives tiers and required specializations.
///
/// `analyze` never fails: scorer errors and out-of-range output collapse
/// into a fixed fallback analysis so routing always has something to work
/// with.
pub struct ComplexityAnalyzer {
    scorer: Arc<dyn ComplexityScorer>,
}

impl ComplexityAnalyzer {
    /// Creates an analyzer over the given scorer.
    #[must_use]
    pub fn new(scorer: Arc<dyn ComplexityScorer>) -> Self {
        Self { scorer }
    }

    /// Analyzes one query.
    pub async fn analyze(&self, query: &str, data_source_hint: Option<&str>) -> ComplexityAnalysis {
        let specializations = required_specializations(query);

        match self.scorer.score(query, data_source_hint).await {
            Ok(dimensions) if dimensions.in_unit_range() => {
                ComplexityAnalysis::from_dimensions(dimensions, specializations, SCORED_CONFIDENCE)
            }
            Ok(dimensions) => {
                tracing::warn!(
                    "scorer '{}' returned out-of-range dimensions, clamping",
                    self.scorer.name()
                );
                ComplexityAnalysis::from_dimensions(
                    dimensions.clamped(),
                    specializations,
                    SCORED_CONFIDENCE,
                )
            }
            Err(error) => {
                tracing::warn!(
                    "scorer '{}' unavailable ({error}), using fallback analysis",
                    self.scorer.name()
                );
                ComplexityAnalysis::fallback(specializations)
            }
        }
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(KeywordScorer))
    }
}

/// Specialization tags matched by keyword rules.
#[must_use]
pub fn required_specializations(query: &str) -> Vec<Specialization> {
    let lower = query.to_lowercase();
    let mut tags = Vec::new();

    let rules: [(&[&str], Specialization); 5] = [
        (
            &["supplier", "vendor", "procurement", "sourcing"],
            Specialization::Procurement,
        ),
        (
            &["risk", "compliance", "audit", "exposure"],
            Specialization::Risk,
        ),
        (
            &["executive", "board", "leadership"],
            Specialization::Executive,
        ),
        (
            &["forecast", "predict", "projection"],
            Specialization::Forecasting,
        ),
        (
            &["regression", "correlation", "model", "statistical"],
            Specialization::DataScience,
        ),
    ];

    for (keywords, tag) in rules {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            tags.push(tag);
        }
    }

    if tags.is_empty() {
        tags.push(Specialization::General);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use compass_core::{ComplexityTier, Error};

    use crate::error::Result;
    use crate::types::ComplexityDimensions;

    struct FailingScorer;

    #[async_trait]
    impl ComplexityScorer for FailingScorer {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn score(&self, _: &str, _: Option<&str>) -> Result<ComplexityDimensions> {
            Err(Error::Provider("scorer down".to_owned()).into())
        }
    }

    struct WildScorer;

    #[async_trait]
    impl ComplexityScorer for WildScorer {
        fn name(&self) -> &'static str {
            "wild"
        }

        async fn score(&self, _: &str, _: Option<&str>) -> Result<ComplexityDimensions> {
            Ok(ComplexityDimensions {
                semantic: 2.0,
                ..ComplexityDimensions::uniform(0.5)
            })
        }
    }

    #[test]
    fn test_specialization_tags() {
        assert_eq!(
            required_specializations("Show me top 5 suppliers by spend"),
            vec![Specialization::Procurement]
        );
        assert_eq!(
            required_specializations("compliance exposure for the board"),
            vec![Specialization::Risk, Specialization::Executive]
        );
        assert_eq!(
            required_specializations("hello"),
            vec![Specialization::General]
        );
    }

    #[tokio::test]
    async fn test_analyze_never_fails() {
        let analyzer = ComplexityAnalyzer::new(Arc::new(FailingScorer));
        let analysis = analyzer.analyze("anything at all", None).await;

        assert_eq!(analysis.overall, ComplexityTier::Moderate);
        assert!((analysis.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_fallback_keeps_specializations() {
        let analyzer = ComplexityAnalyzer::new(Arc::new(FailingScorer));
        let analysis = analyzer.analyze("supplier risk overview", None).await;

        assert!(analysis
            .specializations
            .contains(&Specialization::Procurement));
        assert!(analysis.specializations.contains(&Specialization::Risk));
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let analyzer = ComplexityAnalyzer::new(Arc::new(WildScorer));
        let analysis = analyzer.analyze("anything", None).await;

        assert!(analysis.dimensions.in_unit_range());
        assert!((analysis.confidence - SCORED_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_default_analyzer_on_simple_query() {
        let analyzer = ComplexityAnalyzer::default();
        let analysis = analyzer.analyze("total spend", None).await;

        assert_eq!(analysis.overall, ComplexityTier::Simple);
        assert!(analysis.dimensions.in_unit_range());
    }
}

//! The scoring seam of the complexity analyzer.
//!
//! Anything that can turn a query into six dimension scores satisfies
//! [`ComplexityScorer`]; the router never cares whether the scores come from
//! rules, a learned model, or a language-model call.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ComplexityDimensions;

/// Produces the six dimension scores for a query.
#[async_trait]
pub trait ComplexityScorer: Send + Sync {
    /// Identifier for logs and reasoning strings.
    fn name(&self) -> &'static str;

    /// Scores `query` along the six dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying scorer is unavailable or produced
    /// output that cannot be interpreted. The analyzer absorbs these.
    async fn score(
        &self,
        query: &str,
        data_source_hint: Option<&str>,
    ) -> Result<ComplexityDimensions>;
}

/// Deterministic rule-based scorer.
///
/// Scores are driven by request length and keyword families per dimension.
/// Deliberately coarse — the point is stable, explainable ordering between
/// queries, not calibrated absolutes.
#[derive(Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    fn score_semantic(query: &str) -> f64 {
        let words = query.split_whitespace().count();
        if words < 6 {
            0.2
        } else if words < 15 {
            0.45
        } else if words < 30 {
            0.65
        } else {
            0.8
        }
    }

    fn keyword_score(query: &str, keywords: &[&str], base: f64, step: f64, cap: f64) -> f64 {
        let lower = query.to_lowercase();
        let hits = keywords
            .iter()
            .filter(|keyword| lower.contains(*keyword))
            .count();
        (base + step * hits as f64).min(cap)
    }

    fn score_technical(query: &str, data_source_hint: Option<&str>) -> f64 {
        let score = Self::keyword_score(
            query,
            &[
                "sql", "join", "schema", "database", "table", "etl", "pipeline", "warehouse",
                "integration",
            ],
            0.1,
            0.25,
            0.9,
        );
        if data_source_hint.is_some() {
            (score + 0.1).min(0.9)
        } else {
            score
        }
    }

    fn score_analytical(query: &str) -> f64 {
        Self::keyword_score(
            query,
            &[
                "analyze",
                "analysis",
                "correlation",
                "regression",
                "distribution",
                "breakdown",
                "variance",
                "why",
                "top",
                "rank",
            ],
            0.2,
            0.15,
            0.9,
        )
    }

    fn score_collaborative(query: &str) -> f64 {
        Self::keyword_score(
            query,
            &[
                "comprehensive",
                "deep dive",
                "all angles",
                "cross-functional",
                "multiple perspectives",
                "end to end",
                "holistic",
            ],
            0.15,
            0.25,
            0.9,
        )
    }

    fn score_temporal(query: &str) -> f64 {
        Self::keyword_score(
            query,
            &[
                "trend",
                "over time",
                "history",
                "monthly",
                "quarterly",
                "year over year",
                "forecast",
                "seasonal",
            ],
            0.1,
            0.25,
            0.9,
        )
    }

    fn score_comparative(query: &str) -> f64 {
        Self::keyword_score(
            query,
            &[
                "compare",
                "versus",
                " vs ",
                "difference",
                "against",
                "benchmark",
                "top",
                "bottom",
            ],
            0.1,
            0.2,
            0.9,
        )
    }
}

#[async_trait]
impl ComplexityScorer for KeywordScorer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn score(
        &self,
        query: &str,
        data_source_hint: Option<&str>,
    ) -> Result<ComplexityDimensions> {
        Ok(ComplexityDimensions {
            semantic: Self::score_semantic(query),
            technical: Self::score_technical(query, data_source_hint),
            analytical: Self::score_analytical(query),
            collaborative: Self::score_collaborative(query),
            temporal: Self::score_temporal(query),
            comparative: Self::score_comparative(query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_stay_in_unit_range() {
        let scorer = KeywordScorer;
        let queries = [
            "hi",
            "Show me top 5 suppliers by spend",
            "Give me a comprehensive end to end analysis of the supplier cost \
             trend over time compared against industry benchmarks with a full \
             breakdown by region, category, and quarter including variance",
        ];

        for query in queries {
            let dims = match scorer.score(query, Some("sales_db")).await {
                Ok(dims) => dims,
                Err(error) => panic!("scoring failed: {error}"),
            };
            assert!(dims.in_unit_range(), "out of range for {query}");
        }
    }

    #[tokio::test]
    async fn test_longer_requests_score_higher_semantically() {
        let scorer = KeywordScorer;
        let short = match scorer.score("total spend", None).await {
            Ok(dims) => dims,
            Err(error) => panic!("scoring failed: {error}"),
        };
        let long = match scorer
            .score(
                "Walk me through how procurement spend has developed across all \
                 business units and what is driving the main deviations from plan",
                None,
            )
            .await
        {
            Ok(dims) => dims,
            Err(error) => panic!("scoring failed: {error}"),
        };

        assert!(long.semantic > short.semantic);
    }

    #[tokio::test]
    async fn test_hint_raises_technical() {
        let scorer = KeywordScorer;
        let bare = match scorer.score("supplier list", None).await {
            Ok(dims) => dims,
            Err(error) => panic!("scoring failed: {error}"),
        };
        let hinted = match scorer.score("supplier list", Some("erp_db")).await {
            Ok(dims) => dims,
            Err(error) => panic!("scoring failed: {error}"),
        };

        assert!(hinted.technical > bare.technical);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let scorer = KeywordScorer;
        let one = scorer.score("compare q1 vs q2 spend", None).await;
        let two = scorer.score("compare q1 vs q2 spend", None).await;
        assert!(matches!((one, two), (Ok(a), Ok(b)) if a == b));
    }
}

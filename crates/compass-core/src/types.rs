use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Ordinal complexity bucket derived from the six-dimension score.
///
/// Ordering matters: agent suitability compares a query's tier against the
/// tier an agent is rated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl ComplexityTier {
    /// Buckets a mean dimension score into a tier.
    ///
    /// Thresholds: below 0.3 is simple, below 0.6 moderate, below 0.8
    /// complex, everything else expert.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Simple
        } else if score < 0.6 {
            Self::Moderate
        } else if score < 0.8 {
            Self::Complex
        } else {
            Self::Expert
        }
    }
}

impl Display for ComplexityTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::Expert => "expert",
        };
        write!(f, "{name}")
    }
}

/// How many specialist agents jointly contribute to one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationLevel {
    /// A single agent answers alone.
    None,
    /// Supporting agents review the primary agent's output.
    Review,
    /// All involved agents contribute jointly.
    FullCollaboration,
}

impl Display for CollaborationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::None => "none",
            Self::Review => "review",
            Self::FullCollaboration => "full_collaboration",
        };
        write!(f, "{name}")
    }
}

/// Identifier for a specialist reasoning agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    /// Default general-purpose analytics agent.
    GeneralAnalyst,
    /// Supplier, vendor, and spend analysis.
    ProcurementSpecialist,
    /// Risk and compliance analysis.
    RiskAnalyst,
    /// Executive-level framing and summaries.
    ExecutiveAdvisor,
    /// Statistical modeling and forecasting.
    DataScientist,
}

impl AgentId {
    /// All known agents, in registry order.
    pub const ALL: [Self; 5] = [
        Self::GeneralAnalyst,
        Self::ProcurementSpecialist,
        Self::RiskAnalyst,
        Self::ExecutiveAdvisor,
        Self::DataScientist,
    ];

    /// Stable wire identifier used in cache keys and persisted records.
    #[must_use]
    pub const fn wire_id(self) -> &'static str {
        match self {
            Self::GeneralAnalyst => "general_analyst",
            Self::ProcurementSpecialist => "procurement_specialist",
            Self::RiskAnalyst => "risk_analyst",
            Self::ExecutiveAdvisor => "executive_advisor",
            Self::DataScientist => "data_scientist",
        }
    }

    /// Parses a wire identifier back into an agent id.
    #[must_use]
    pub fn from_wire_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|agent| agent.wire_id() == id)
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.wire_id())
    }
}

/// Specialization domain a query may require or an agent may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Procurement,
    Risk,
    Executive,
    DataScience,
    Forecasting,
    General,
}

impl Display for Specialization {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Procurement => "procurement",
            Self::Risk => "risk",
            Self::Executive => "executive",
            Self::DataScience => "data_science",
            Self::Forecasting => "forecasting",
            Self::General => "general",
        };
        write!(f, "{name}")
    }
}

/// Caller role as reported by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Executive,
    Specialist,
    Analyst,
    General,
}

impl Role {
    /// Maps the free-form role string from the identity provider onto a
    /// known role. Unknown strings fall back to [`Role::General`].
    #[must_use]
    pub fn parse(role: &str) -> Self {
        match role.trim().to_lowercase().as_str() {
            "executive" | "exec" | "board" => Self::Executive,
            "expert" | "specialist" => Self::Specialist,
            "analyst" => Self::Analyst,
            _ => Self::General,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Executive => "executive",
            Self::Specialist => "specialist",
            Self::Analyst => "analyst",
            Self::General => "general",
        };
        write!(f, "{name}")
    }
}

/// User expertise tier inferred from interaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseTier {
    Beginner,
    Intermediate,
    Expert,
}

impl Display for ExpertiseTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        };
        write!(f, "{name}")
    }
}

/// Preferred depth of generated analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    Summary,
    Detailed,
    Comprehensive,
}

/// An incoming natural-language query together with caller identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The natural-language request text.
    pub query: String,
    /// Identity of the requesting user.
    pub user_id: String,
    /// Role of the requesting user.
    pub role: Role,
    /// Optional hint naming the data source the query targets.
    pub data_source_hint: Option<String>,
    /// Optional ambient session information.
    pub session: Option<SessionContext>,
}

impl QueryRequest {
    /// Creates a request with the general role and no hints.
    pub fn new<T: Into<String>, U: Into<String>>(query: T, user_id: U) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            role: Role::General,
            data_source_hint: None,
            session: None,
        }
    }

    /// Sets the caller role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the data-source hint.
    #[must_use]
    pub fn with_data_source_hint<T: Into<String>>(mut self, hint: T) -> Self {
        self.data_source_hint = Some(hint.into());
        self
    }

    /// Attaches session context.
    #[must_use]
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }
}

/// Ambient information about the conversation session a query belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Identifier of the ongoing conversation, if any.
    pub conversation_id: Option<String>,
    /// Number of messages exchanged so far in this session.
    pub messages_in_session: u32,
    /// When the session started.
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionContext {
    /// Creates a session context for the given conversation.
    pub fn for_conversation<T: Into<String>>(conversation_id: T) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            messages_in_session: 0,
            started_at: Some(Utc::now()),
        }
    }
}

/// Result of an outbound "generate analysis" call to a specialist agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// The analysis text.
    pub text: String,
    /// SQL the agent derived from the request, when applicable.
    pub extracted_sql_query: Option<String>,
    /// The agent's self-reported confidence in [0,1].
    pub confidence: f64,
    /// Which agent produced the analysis.
    pub agent: String,
    /// Wall-clock latency of the call.
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bucketing_thresholds() {
        assert_eq!(ComplexityTier::from_score(0.0), ComplexityTier::Simple);
        assert_eq!(ComplexityTier::from_score(0.29), ComplexityTier::Simple);
        assert_eq!(ComplexityTier::from_score(0.3), ComplexityTier::Moderate);
        assert_eq!(ComplexityTier::from_score(0.59), ComplexityTier::Moderate);
        assert_eq!(ComplexityTier::from_score(0.6), ComplexityTier::Complex);
        assert_eq!(ComplexityTier::from_score(0.79), ComplexityTier::Complex);
        assert_eq!(ComplexityTier::from_score(0.8), ComplexityTier::Expert);
        assert_eq!(ComplexityTier::from_score(1.0), ComplexityTier::Expert);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ComplexityTier::Simple < ComplexityTier::Moderate);
        assert!(ComplexityTier::Moderate < ComplexityTier::Complex);
        assert!(ComplexityTier::Complex < ComplexityTier::Expert);
    }

    #[test]
    fn test_agent_wire_ids_round_trip() {
        for agent in AgentId::ALL {
            assert_eq!(AgentId::from_wire_id(agent.wire_id()), Some(agent));
        }
        assert_eq!(AgentId::from_wire_id("unknown_agent"), None);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("executive"), Role::Executive);
        assert_eq!(Role::parse("  Executive "), Role::Executive);
        assert_eq!(Role::parse("expert"), Role::Specialist);
        assert_eq!(Role::parse("analyst"), Role::Analyst);
        assert_eq!(Role::parse("intern"), Role::General);
        assert_eq!(Role::parse(""), Role::General);
    }

    #[test]
    fn test_query_request_builder() {
        let request = QueryRequest::new("Show revenue by quarter", "user-1")
            .with_role(Role::Executive)
            .with_data_source_hint("finance_db");

        assert_eq!(request.role, Role::Executive);
        assert_eq!(request.data_source_hint.as_deref(), Some("finance_db"));
        assert!(request.session.is_none());
    }

    #[test]
    fn test_collaboration_level_display() {
        assert_eq!(CollaborationLevel::None.to_string(), "none");
        assert_eq!(
            CollaborationLevel::FullCollaboration.to_string(),
            "full_collaboration"
        );
    }
}

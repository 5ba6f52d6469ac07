pub mod behavioral;
pub mod portfolio;
pub mod risk;
pub mod trend;

pub use behavioral::{BehavioralOverview, BehavioralScore, CustomerSummary, RiskTier};
pub use portfolio::{BcgClassification, BcgQuadrant, InvestmentTier, OpportunityScore};
pub use risk::{
    Alert, BehavioralIntelligence, ConcentrationRisk, Insight, LifecyclePhase, Opportunity,
    Recommendation, RiskLevel,
};
pub use trend::{TrendAnalysis, TrendLabel, TrendRecord};

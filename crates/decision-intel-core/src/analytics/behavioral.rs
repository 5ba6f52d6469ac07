use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregation::buckets::safe_div;
use crate::aggregation::CustomerProfile;
use crate::config::DecisionThresholds;
use crate::records::ProductCategory;
use crate::types::{Money, Percent, Score};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreventiveAction {
    ContatoUrgente,
    Monitorar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralScore {
    pub loyalty_score: Score,
    pub risk_tier: RiskTier,
    pub churn_risk: bool,
    pub churn_probability: Percent,
    pub preventive_action: PreventiveAction,
}

/// A scored customer as shown by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub cliente: String,
    pub produtos_utilizados: Vec<ProductCategory>,
    pub instituicoes_utilizadas: Vec<String>,
    pub valor_total_historico: Money,
    pub frequencia_operacoes: u64,
    pub meses_ativos: usize,
    pub ticket_medio_pessoal: Money,
    pub diversificacao_produtos: usize,
    pub fidelidade_score: Score,
    pub perfil_risco: RiskTier,
    pub risco_churn: bool,
    pub probabilidade_churn: Percent,
    pub acao_preventiva: PreventiveAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub quantidade: usize,
    pub valor_medio: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskTierDistribution {
    pub baixo: TierStats,
    pub medio: TierStats,
    pub premium: TierStats,
}

/// Portfolio-wide view of customer behaviour (`analise_comportamental`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralOverview {
    pub score_fidelidade: Score,
    pub total_clientes: usize,
    pub perfil_risco: RiskTierDistribution,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Loyalty: `min(100, ops*10 + diversification*15 + value/1000)`.
pub fn loyalty_score(operations: u64, diversification: usize, historical_value: Money) -> Score {
    let raw = Decimal::from(operations) * dec!(10)
        + Decimal::from(diversification as u64) * dec!(15)
        + historical_value / dec!(1000);
    raw.min(dec!(100))
}

pub fn risk_tier(
    historical_value: Money,
    diversification: usize,
    thresholds: &DecisionThresholds,
) -> RiskTier {
    if historical_value > thresholds.premium_customer_value {
        RiskTier::Premium
    } else if diversification > thresholds.medium_tier_diversification {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Score one customer. Pure; depends only on the profile and thresholds.
pub fn score(profile: &CustomerProfile, thresholds: &DecisionThresholds) -> BehavioralScore {
    let diversification = profile.diversification();
    let loyalty = loyalty_score(profile.operations, diversification, profile.historical_value);
    let tier = risk_tier(profile.historical_value, diversification, thresholds);
    let churn_risk = loyalty < thresholds.churn_loyalty_ceiling
        && profile.historical_value > thresholds.churn_min_value;

    let single_product_penalty = if diversification < 2 {
        dec!(30)
    } else {
        Decimal::ZERO
    };
    let churn_probability = (dec!(100) - loyalty + single_product_penalty)
        .max(Decimal::ZERO)
        .min(dec!(100));

    BehavioralScore {
        loyalty_score: loyalty,
        risk_tier: tier,
        churn_risk,
        churn_probability,
        preventive_action: if loyalty < dec!(50) {
            PreventiveAction::ContatoUrgente
        } else {
            PreventiveAction::Monitorar
        },
    }
}

pub fn summarize(profile: &CustomerProfile, thresholds: &DecisionThresholds) -> CustomerSummary {
    let s = score(profile, thresholds);
    CustomerSummary {
        cliente: profile.customer_id.clone(),
        produtos_utilizados: profile.categories.iter().copied().collect(),
        instituicoes_utilizadas: profile.institutions.iter().cloned().collect(),
        valor_total_historico: profile.historical_value,
        frequencia_operacoes: profile.operations,
        meses_ativos: profile.monthly_operations.len(),
        ticket_medio_pessoal: profile.average_ticket(),
        diversificacao_produtos: profile.diversification(),
        fidelidade_score: s.loyalty_score,
        perfil_risco: s.risk_tier,
        risco_churn: s.churn_risk,
        probabilidade_churn: s.churn_probability,
        acao_preventiva: s.preventive_action,
    }
}

/// Score every customer exactly once, in customer-id order.
pub fn profile_customers(
    customers: &BTreeMap<String, CustomerProfile>,
    thresholds: &DecisionThresholds,
) -> Vec<CustomerSummary> {
    customers
        .values()
        .map(|p| summarize(p, thresholds))
        .collect()
}

pub fn overview(customers: &[CustomerSummary]) -> BehavioralOverview {
    let stats = |tier: RiskTier| {
        let values: Vec<Money> = customers
            .iter()
            .filter(|c| c.perfil_risco == tier)
            .map(|c| c.valor_total_historico)
            .collect();
        TierStats {
            quantidade: values.len(),
            valor_medio: safe_div(
                values.iter().sum::<Decimal>(),
                Decimal::from(values.len() as u64),
            ),
        }
    };
    let loyalty_total: Decimal = customers.iter().map(|c| c.fidelidade_score).sum();

    BehavioralOverview {
        score_fidelidade: safe_div(loyalty_total, Decimal::from(customers.len() as u64)),
        total_clientes: customers.len(),
        perfil_risco: RiskTierDistribution {
            baixo: stats(RiskTier::Low),
            medio: stats(RiskTier::Medium),
            premium: stats(RiskTier::Premium),
        },
    }
}

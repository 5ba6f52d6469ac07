//! BCG-style portfolio classification and weighted opportunity scoring.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregation::buckets::safe_div;
use crate::aggregation::CategoryMetrics;
use crate::analytics::trend::TrendRecord;
use crate::config::{DecisionThresholds, TierBands};
use crate::records::ProductCategory;
use crate::types::{Money, Percent, Score};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BcgQuadrant {
    Estrela,
    Solido,
    Oportunidade,
    Revisar,
}

impl BcgQuadrant {
    pub fn recommended_action(&self) -> &'static str {
        match self {
            BcgQuadrant::Estrela => "EXPANDIR AGRESSIVAMENTE",
            BcgQuadrant::Solido => "MANTER ESTABILIDADE",
            BcgQuadrant::Oportunidade => "EXPLORAR POTENCIAL",
            BcgQuadrant::Revisar => "REAVALIAR ESTRATÉGIA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BcgClassification {
    pub produto: ProductCategory,
    /// Growth potential (0-100) used as the growth axis.
    pub crescimento: Score,
    pub participacao: Percent,
    pub categoria_bcg: BcgQuadrant,
    pub valor_liberado: Money,
    pub recomendacao_estrategica: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentTier {
    InvestirMassivamente,
    Expandir,
    Manter,
    Reavaliar,
    Descontinuar,
}

impl InvestmentTier {
    pub fn from_score(score: Score, bands: &TierBands) -> Self {
        if score > bands.invest_heavily {
            InvestmentTier::InvestirMassivamente
        } else if score > bands.expand {
            InvestmentTier::Expandir
        } else if score > bands.maintain {
            InvestmentTier::Manter
        } else if score > bands.reassess {
            InvestmentTier::Reavaliar
        } else {
            InvestmentTier::Descontinuar
        }
    }

    pub fn recommended_action(&self) -> &'static str {
        match self {
            InvestmentTier::InvestirMassivamente => "Alocar recursos máximos, expandir equipe",
            InvestmentTier::Expandir => "Aumentar investimento, testar novos canais",
            InvestmentTier::Manter => "Manter estratégia atual, otimizar processos",
            InvestmentTier::Reavaliar => "Analisar causas, implementar melhorias",
            InvestmentTier::Descontinuar => "Considerar descontinuação ou reformulação completa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub volume: Score,
    pub crescimento: Score,
    pub diversificacao: Score,
    pub eficiencia: Score,
    pub potencial: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub produto: ProductCategory,
    pub score_final: Score,
    pub categoria_investimento: InvestmentTier,
    pub componentes_score: ScoreComponents,
    /// Trend label, or `DADOS_INSUFICIENTES` without enough history.
    pub tendencia_mercado: String,
    pub previsao_proximo_mes: Money,
    pub confianca_previsao: Score,
    pub acao_recomendada: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clamp_score(val: Decimal) -> Score {
    val.max(Decimal::ZERO).min(dec!(100))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Growth potential (0-100): premium-customer ratio worth up to 50 points,
/// plus flat bonuses for sustained activity and for spread across months.
pub fn growth_potential(
    premium_customers: usize,
    unique_customers: usize,
    operations: u64,
    active_months: usize,
    thresholds: &DecisionThresholds,
) -> Score {
    let premium_ratio = safe_div(
        Decimal::from(premium_customers as u64),
        Decimal::from(unique_customers as u64),
    );
    let mut potential = premium_ratio * dec!(50);
    if operations > thresholds.potential_min_operations {
        potential += dec!(25);
    }
    if active_months > thresholds.potential_min_months {
        potential += dec!(25);
    }
    potential.min(dec!(100))
}

pub fn classify_quadrant(
    participation: Percent,
    potential: Score,
    thresholds: &DecisionThresholds,
) -> BcgQuadrant {
    let high_share = participation > thresholds.bcg_share_threshold;
    let high_potential = potential > thresholds.bcg_potential_threshold;
    match (high_share, high_potential) {
        (true, true) => BcgQuadrant::Estrela,
        (true, false) => BcgQuadrant::Solido,
        (false, true) => BcgQuadrant::Oportunidade,
        (false, false) => BcgQuadrant::Revisar,
    }
}

pub fn classify(metrics: &CategoryMetrics, thresholds: &DecisionThresholds) -> BcgClassification {
    let quadrant = classify_quadrant(
        metrics.participacao,
        metrics.potencial_crescimento,
        thresholds,
    );
    BcgClassification {
        produto: metrics.produto,
        crescimento: metrics.potencial_crescimento,
        participacao: metrics.participacao,
        categoria_bcg: quadrant,
        valor_liberado: metrics.valor_liberado,
        recomendacao_estrategica: quadrant.recommended_action().to_string(),
    }
}

/// Weighted investment score for one category. `trend` is `None` when the
/// category lacks the history for trend analysis; growth then scores neutral.
pub fn score_opportunity(
    metrics: &CategoryMetrics,
    trend: Option<&TrendRecord>,
    thresholds: &DecisionThresholds,
) -> OpportunityScore {
    let neutral = thresholds.neutral_sub_score;

    let volume = clamp_score(
        metrics.valor_liberado / thresholds.volume_score_unit * thresholds.volume_score_points,
    );
    let growth = trend
        .map(|t| clamp_score(t.velocidade_crescimento + dec!(50)))
        .unwrap_or(neutral);
    let diversification = clamp_score(
        Decimal::from(metrics.clientes_unicos as u64) * thresholds.diversification_points_per_customer,
    );
    let efficiency = if metrics.eficiencia.is_zero() {
        neutral
    } else {
        clamp_score(metrics.eficiencia)
    };
    let potential = if metrics.potencial_crescimento.is_zero() {
        neutral
    } else {
        clamp_score(metrics.potencial_crescimento)
    };

    let w = &thresholds.opportunity_weights;
    let weighted = volume * w.volume
        + growth * w.growth
        + diversification * w.diversification
        + efficiency * w.efficiency
        + potential * w.potential;
    let final_score = clamp_score(weighted).round_dp(2);
    let tier = InvestmentTier::from_score(final_score, &thresholds.tier_bands);

    OpportunityScore {
        produto: metrics.produto,
        score_final: final_score,
        categoria_investimento: tier,
        componentes_score: ScoreComponents {
            volume: volume.round_dp(2),
            crescimento: growth.round_dp(2),
            diversificacao: diversification.round_dp(2),
            eficiencia: efficiency.round_dp(2),
            potencial: potential.round_dp(2),
        },
        tendencia_mercado: trend
            .map(|t| t.tendencia.as_str().to_string())
            .unwrap_or_else(|| "DADOS_INSUFICIENTES".to_string()),
        previsao_proximo_mes: trend.map(|t| t.previsao_proximo_mes).unwrap_or(Decimal::ZERO),
        confianca_previsao: trend.map(|t| t.confianca_previsao).unwrap_or(Decimal::ZERO),
        acao_recomendada: tier.recommended_action().to_string(),
    }
}

/// BCG matrix sorted by released value (desc), then category.
pub fn bcg_matrix(
    metrics: &[CategoryMetrics],
    thresholds: &DecisionThresholds,
) -> Vec<BcgClassification> {
    let mut out: Vec<BcgClassification> = metrics.iter().map(|m| classify(m, thresholds)).collect();
    out.sort_by(|a, b| {
        b.valor_liberado
            .cmp(&a.valor_liberado)
            .then_with(|| a.produto.cmp(&b.produto))
    });
    out
}

/// Opportunity scores sorted by final score (desc), then category.
pub fn opportunity_ranking(
    metrics: &[CategoryMetrics],
    trends: &[TrendRecord],
    thresholds: &DecisionThresholds,
) -> Vec<OpportunityScore> {
    let mut out: Vec<OpportunityScore> = metrics
        .iter()
        .map(|m| {
            let trend = trends.iter().find(|t| t.categoria == m.produto);
            score_opportunity(m, trend, thresholds)
        })
        .collect();
    out.sort_by(|a, b| {
        b.score_final
            .cmp(&a.score_final)
            .then_with(|| a.produto.cmp(&b.produto))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::TrendLabel;

    fn metrics(
        produto: ProductCategory,
        released: Decimal,
        participation: Decimal,
        potential: Decimal,
        customers: usize,
        efficiency: Decimal,
    ) -> CategoryMetrics {
        CategoryMetrics {
            produto,
            operacoes: 10,
            valor_liberado: released,
            valor_solicitado: released,
            valor_financiado: released,
            clientes_unicos: customers,
            clientes_premium: 0,
            ticket_medio: Decimal::ZERO,
            ticket_mediano: Decimal::ZERO,
            ticket_q1: Decimal::ZERO,
            ticket_q3: Decimal::ZERO,
            eficiencia: efficiency,
            participacao: participation,
            concentracao_clientes: Decimal::ZERO,
            volatilidade: Decimal::ZERO,
            mes_pico_sazonalidade: 0,
            intensidade_sazonal: 0,
            margem_estimada: Decimal::ZERO,
            meses_ativos: 0,
            potencial_crescimento: potential,
        }
    }

    fn trend(velocity: Decimal) -> TrendRecord {
        TrendRecord {
            categoria: ProductCategory::Fgts,
            timeline_mensal: vec![],
            velocidade_crescimento: velocity,
            aceleracao: Decimal::ZERO,
            previsao_proximo_mes: dec!(1000),
            confianca_previsao: dec!(80),
            tendencia: TrendLabel::CrescimentoForte,
            volume_medio_mensal: Decimal::ZERO,
            velocidade_fixada: false,
            crescimentos: vec![],
        }
    }

    #[test]
    fn test_growth_potential_components() {
        let t = DecisionThresholds::default();
        assert_eq!(growth_potential(1, 2, 5, 3, &t), dec!(25));
        assert_eq!(growth_potential(1, 2, 11, 3, &t), dec!(50));
        assert_eq!(growth_potential(2, 2, 11, 7, &t), dec!(100));
        // boundaries are strict
        assert_eq!(growth_potential(0, 0, 10, 6, &t), Decimal::ZERO);
    }

    #[test]
    fn test_quadrants() {
        let t = DecisionThresholds::default();
        assert_eq!(classify_quadrant(dec!(10.1), dec!(70.1), &t), BcgQuadrant::Estrela);
        assert_eq!(classify_quadrant(dec!(10.1), dec!(70), &t), BcgQuadrant::Solido);
        assert_eq!(classify_quadrant(dec!(10), dec!(71), &t), BcgQuadrant::Oportunidade);
        assert_eq!(classify_quadrant(dec!(10), dec!(70), &t), BcgQuadrant::Revisar);
    }

    #[test]
    fn test_bcg_action_text() {
        let t = DecisionThresholds::default();
        let m = metrics(ProductCategory::Fgts, dec!(1000), dec!(40), dec!(75), 5, dec!(90));
        let c = classify(&m, &t);
        assert_eq!(c.categoria_bcg, BcgQuadrant::Estrela);
        assert_eq!(c.recomendacao_estrategica, "EXPANDIR AGRESSIVAMENTE");
    }

    #[test]
    fn test_opportunity_score_weights() {
        let t = DecisionThresholds::default();
        // volume 2M -> 40, growth 10+50 -> 60, 20 customers -> 40,
        // efficiency 80, potential 50
        let m = metrics(ProductCategory::Fgts, dec!(2000000), dec!(50), dec!(50), 20, dec!(80));
        let s = score_opportunity(&m, Some(&trend(dec!(10))), &t);
        // 10 + 15 + 8 + 12 + 7.5
        assert_eq!(s.score_final, dec!(52.5));
        assert_eq!(s.categoria_investimento, InvestmentTier::Manter);
        assert_eq!(s.tendencia_mercado, "CRESCIMENTO_FORTE");
        assert_eq!(s.previsao_proximo_mes, dec!(1000));
    }

    #[test]
    fn test_missing_trend_and_zero_inputs_score_neutral() {
        let t = DecisionThresholds::default();
        let m = metrics(ProductCategory::Outros, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 0, Decimal::ZERO);
        let s = score_opportunity(&m, None, &t);
        assert_eq!(s.componentes_score.crescimento, dec!(50));
        assert_eq!(s.componentes_score.eficiencia, dec!(50));
        assert_eq!(s.componentes_score.potencial, dec!(50));
        // 0 + 12.5 + 0 + 7.5 + 7.5
        assert_eq!(s.score_final, dec!(27.5));
        assert_eq!(s.categoria_investimento, InvestmentTier::Reavaliar);
        assert_eq!(s.tendencia_mercado, "DADOS_INSUFICIENTES");
    }

    #[test]
    fn test_sub_scores_clamped() {
        let t = DecisionThresholds::default();
        let m = metrics(ProductCategory::Fgts, dec!(90000000), dec!(90), dec!(100), 500, dec!(100));
        let s = score_opportunity(&m, Some(&trend(dec!(500))), &t);
        assert_eq!(s.componentes_score.volume, dec!(100));
        assert_eq!(s.componentes_score.crescimento, dec!(100));
        assert_eq!(s.componentes_score.diversificacao, dec!(100));
        assert_eq!(s.score_final, dec!(100));
        assert_eq!(s.categoria_investimento, InvestmentTier::InvestirMassivamente);

        let s = score_opportunity(&m, Some(&trend(dec!(-100))), &t);
        assert_eq!(s.componentes_score.crescimento, Decimal::ZERO);
    }

    #[test]
    fn test_tier_bands_are_strict() {
        let bands = TierBands::default();
        assert_eq!(InvestmentTier::from_score(dec!(80), &bands), InvestmentTier::Expandir);
        assert_eq!(InvestmentTier::from_score(dec!(80.01), &bands), InvestmentTier::InvestirMassivamente);
        assert_eq!(InvestmentTier::from_score(dec!(65), &bands), InvestmentTier::Manter);
        assert_eq!(InvestmentTier::from_score(dec!(45), &bands), InvestmentTier::Reavaliar);
        assert_eq!(InvestmentTier::from_score(dec!(25), &bands), InvestmentTier::Descontinuar);
    }
}

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregation::buckets::safe_div;
use crate::aggregation::{aggregate, CategoryMetrics, InstitutionMetrics, RegionMetrics};
use crate::analytics::behavioral::{self, BehavioralOverview, RiskTier};
use crate::analytics::portfolio::{self, BcgClassification, OpportunityScore};
use crate::analytics::risk::{
    self, Alert, BehavioralIntelligence, ChurnProbability, ConcentrationRisk, Insight,
    IntelligentForecast, Opportunity, OpportunityWindow, ProductAnomalies, ProductCrossSell,
    ProductLifecycle, Recommendation,
};
use crate::analytics::trend::{self, TrendAnalysis};
use crate::config::DecisionThresholds;
use crate::records::NormalizedBatch;
use crate::types::{Money, Percent, Score};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_operacoes: usize,
    pub volume_total: Money,
    pub volume_solicitado: Money,
    pub volume_financiado: Money,
    pub ticket_medio_geral: Money,
    pub produtos_ativos: usize,
    pub regioes_ativas: usize,
    pub instituicoes_ativas: usize,
    pub total_clientes: usize,
    pub clientes_premium: usize,
    pub indice_diversificacao: Percent,
    pub sazonalidade_detectada: bool,
    /// Month of year (1-12) with the highest released volume.
    pub mes_pico: Option<u32>,
    /// Records with at least one field defaulted by the normalizer.
    pub registros_com_falhas: usize,
}

/// The pipeline's single output. Field names are the JSON contract read by
/// the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub resumo_executivo: ExecutiveSummary,
    pub analise_produtos: Vec<CategoryMetrics>,
    pub analise_geografica: Vec<RegionMetrics>,
    pub analise_instituicoes: Vec<InstitutionMetrics>,
    pub analise_tendencias: TrendAnalysis,
    pub scoring_oportunidades: Vec<OpportunityScore>,
    pub matriz_bcg_produtos: Vec<BcgClassification>,
    pub inteligencia_comportamental: BehavioralIntelligence,
    pub alertas_criticos: Vec<Alert>,
    pub concentracao_risco: ConcentrationRisk,
    pub insights: Vec<Insight>,
    pub oportunidades: Vec<Opportunity>,
    pub analise_comportamental: BehavioralOverview,
    pub janelas_oportunidade: Vec<OpportunityWindow>,
    pub score_saude_portfolio: Score,
    pub anomalias_detectadas: Vec<ProductAnomalies>,
    pub ciclo_vida_produtos: Vec<ProductLifecycle>,
    pub recomendacoes_prioritarias: Vec<Recommendation>,
    pub previsoes_inteligentes: IntelligentForecast,
    /// Customers above the churn-probability alert, highest value first.
    pub probabilidade_churn: Vec<ChurnProbability>,
    pub oportunidades_crosssell: Vec<ProductCrossSell>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Run every stage over an already-normalised batch and merge the results.
pub fn build_report(batch: &NormalizedBatch, thresholds: &DecisionThresholds) -> DecisionReport {
    let agg = aggregate(&batch.records, thresholds);

    let categories = agg.category_metrics(thresholds);
    let regions = agg.region_metrics();
    let institutions = agg.institution_metrics();
    let months = agg.months_by_volume();

    let trends = trend::analyze_trends(&agg.categories, &agg.market, thresholds);
    let customers = behavioral::profile_customers(&agg.customers, thresholds);

    let bcg = portfolio::bcg_matrix(&categories, thresholds);
    let scores =
        portfolio::opportunity_ranking(&categories, &trends.tendencias_por_categoria, thresholds);

    let concentration = risk::concentration(&categories, &customers, agg.total_released, thresholds);
    let intelligence = risk::behavioral_intelligence(&customers, thresholds);
    let alerts = risk::critical_alerts(
        &concentration,
        intelligence.clientes_em_risco.len(),
        &trends.tendencias_por_categoria,
        thresholds,
    );
    let insights = risk::insights(&categories, &months, &customers, agg.total_released, thresholds);
    let opportunities = risk::opportunities(&categories, &regions, &customers, thresholds);
    let windows = risk::opportunity_windows(&months);
    let health = risk::portfolio_health(
        concentration.indice_diversificacao,
        &customers,
        &categories,
        thresholds,
    );

    let anomalies = risk::anomalies(&categories, thresholds);
    let lifecycle = risk::product_lifecycle(&categories, thresholds);
    let recommendations =
        risk::priority_recommendations(&categories, &customers, &regions, thresholds);
    let forecast = risk::intelligent_forecast(&categories, &opportunities, thresholds);
    let churn = risk::churn_probabilities(&customers, thresholds);
    let product_cross_sell = risk::product_cross_sell(&categories, thresholds);

    let failed_records: BTreeSet<usize> = batch.issues.iter().map(|i| i.record_index).collect();

    let summary = ExecutiveSummary {
        total_operacoes: agg.record_count,
        volume_total: agg.total_released,
        volume_solicitado: agg.total_requested,
        volume_financiado: agg.total_financed,
        ticket_medio_geral: safe_div(agg.total_released, Decimal::from(agg.record_count as u64)),
        produtos_ativos: agg.categories.len(),
        regioes_ativas: agg.regions.len(),
        instituicoes_ativas: agg.institutions.len(),
        total_clientes: customers.len(),
        clientes_premium: customers
            .iter()
            .filter(|c| c.perfil_risco == RiskTier::Premium)
            .count(),
        indice_diversificacao: concentration.indice_diversificacao,
        sazonalidade_detectada: !months.is_empty(),
        mes_pico: months.first().map(|(m, _)| *m),
        registros_com_falhas: failed_records.len(),
    };

    DecisionReport {
        resumo_executivo: summary,
        analise_produtos: categories,
        analise_geografica: regions,
        analise_instituicoes: institutions,
        analise_tendencias: trends,
        scoring_oportunidades: scores,
        matriz_bcg_produtos: bcg,
        inteligencia_comportamental: intelligence,
        alertas_criticos: alerts,
        concentracao_risco: concentration,
        insights,
        oportunidades: opportunities,
        analise_comportamental: behavioral::overview(&customers),
        janelas_oportunidade: windows,
        score_saude_portfolio: health,
        anomalias_detectadas: anomalies,
        ciclo_vida_produtos: lifecycle,
        recomendacoes_prioritarias: recommendations,
        previsoes_inteligentes: forecast,
        probabilidade_churn: churn,
        oportunidades_crosssell: product_cross_sell,
    }
}

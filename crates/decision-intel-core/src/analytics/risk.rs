//! Concentration risk, customer watch-lists, alerts, narrative insights and
//! the rule-based strategy layer (anomalies, lifecycle, recommendations).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregation::buckets::{pct, safe_div};
use crate::aggregation::{CategoryMetrics, RegionMetrics};
use crate::analytics::behavioral::{CustomerSummary, PreventiveAction, RiskTier};
use crate::analytics::trend::{TrendLabel, TrendRecord};
use crate::config::{ConcentrationBands, DecisionThresholds, LifecycleBands};
use crate::records::ProductCategory;
use crate::types::{month_name, Money, Percent, Score};

// ---------------------------------------------------------------------------
// Concentration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "ALTO")]
    Alto,
    #[serde(rename = "MÉDIO")]
    Medio,
    #[serde(rename = "BAIXO")]
    Baixo,
}

impl RiskLevel {
    pub fn from_share(share: Percent, bands: &ConcentrationBands) -> Self {
        if share > bands.high {
            RiskLevel::Alto
        } else if share > bands.medium {
            RiskLevel::Medio
        } else {
            RiskLevel::Baixo
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationRisk {
    pub concentracao_top3_produtos: Percent,
    pub concentracao_top10_clientes: Percent,
    /// `100 - top-3 share`, zero when there are no products.
    pub indice_diversificacao: Percent,
    pub risco_concentracao: RiskLevel,
    pub risco_concentracao_clientes: RiskLevel,
}

/// `categories` must already be sorted by released value (desc).
pub fn concentration(
    categories: &[CategoryMetrics],
    customers: &[CustomerSummary],
    total_released: Money,
    thresholds: &DecisionThresholds,
) -> ConcentrationRisk {
    let top3: Percent = categories.iter().take(3).map(|c| c.participacao).sum();

    let mut values: Vec<Money> = customers.iter().map(|c| c.valor_total_historico).collect();
    values.sort_by(|a, b| b.cmp(a));
    let top10_value: Money = values.iter().take(10).sum();
    let top10 = pct(top10_value, total_released);

    let bands = &thresholds.concentration_bands;
    ConcentrationRisk {
        concentracao_top3_produtos: top3,
        concentracao_top10_clientes: top10,
        indice_diversificacao: if categories.is_empty() {
            Decimal::ZERO
        } else {
            dec!(100) - top3
        },
        risco_concentracao: RiskLevel::from_share(top3, bands),
        risco_concentracao_clientes: RiskLevel::from_share(top10, bands),
    }
}

// ---------------------------------------------------------------------------
// Customer watch-lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralIntelligence {
    /// Churn-flagged customers, highest value first.
    pub clientes_em_risco: Vec<CustomerSummary>,
    /// Single-category customers above the cross-sell value, highest value first.
    pub candidatos_cross_sell: Vec<CustomerSummary>,
    pub oportunidades_cross_sell: usize,
    pub clientes_estrategicos: Vec<CustomerSummary>,
    pub clientes_potencial_premium: Vec<CustomerSummary>,
}

fn by_value_desc(list: &mut [CustomerSummary]) {
    list.sort_by(|a, b| {
        b.valor_total_historico
            .cmp(&a.valor_total_historico)
            .then_with(|| a.cliente.cmp(&b.cliente))
    });
}

pub fn behavioral_intelligence(
    customers: &[CustomerSummary],
    thresholds: &DecisionThresholds,
) -> BehavioralIntelligence {
    let mut churn: Vec<CustomerSummary> =
        customers.iter().filter(|c| c.risco_churn).cloned().collect();
    by_value_desc(&mut churn);

    let mut cross_sell: Vec<CustomerSummary> = customers
        .iter()
        .filter(|c| {
            c.diversificacao_produtos == 1 && c.valor_total_historico > thresholds.cross_sell_min_value
        })
        .cloned()
        .collect();
    by_value_desc(&mut cross_sell);

    let mut strategic: Vec<CustomerSummary> = customers
        .iter()
        .filter(|c| c.fidelidade_score > thresholds.strategic_loyalty)
        .cloned()
        .collect();
    strategic.sort_by(|a, b| {
        b.fidelidade_score
            .cmp(&a.fidelidade_score)
            .then_with(|| a.cliente.cmp(&b.cliente))
    });
    strategic.truncate(thresholds.top_customers_listed);

    let mut potential_premium: Vec<CustomerSummary> = customers
        .iter()
        .filter(|c| {
            c.perfil_risco == RiskTier::Medium
                && c.valor_total_historico > thresholds.potential_premium_value
        })
        .cloned()
        .collect();
    by_value_desc(&mut potential_premium);
    potential_premium.truncate(thresholds.top_customers_listed);

    BehavioralIntelligence {
        oportunidades_cross_sell: cross_sell.len(),
        clientes_em_risco: churn,
        candidatos_cross_sell: cross_sell,
        clientes_estrategicos: strategic,
        clientes_potencial_premium: potential_premium,
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ConcentracaoAlta,
    ClientesEmRisco,
    ProdutosEmDeclinio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Alta,
    MuitoAlta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub tipo: AlertKind,
    pub titulo: String,
    pub descricao: String,
    pub urgencia: Urgency,
    pub acao: String,
}

/// Fixed-template alerts, emitted in a fixed order.
pub fn critical_alerts(
    concentration: &ConcentrationRisk,
    churn_customers: usize,
    trends: &[TrendRecord],
    thresholds: &DecisionThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if concentration.concentracao_top3_produtos > thresholds.concentration_alert {
        alerts.push(Alert {
            tipo: AlertKind::ConcentracaoAlta,
            titulo: "Risco de Concentração Detectado".into(),
            descricao: format!(
                "Top 3 produtos representam {}% do volume",
                concentration.concentracao_top3_produtos.round_dp(1)
            ),
            urgencia: Urgency::Alta,
            acao: "Diversificar portfólio urgentemente".into(),
        });
    }

    if churn_customers > 0 {
        alerts.push(Alert {
            tipo: AlertKind::ClientesEmRisco,
            titulo: "Clientes de Valor em Risco".into(),
            descricao: format!(
                "{churn_customers} clientes de alto valor com baixa fidelidade detectados"
            ),
            urgencia: Urgency::MuitoAlta,
            acao: "Programa de retenção imediato".into(),
        });
    }

    let declining = trends
        .iter()
        .filter(|t| t.tendencia == TrendLabel::DeclinioForte)
        .count();
    if declining > 0 {
        alerts.push(Alert {
            tipo: AlertKind::ProdutosEmDeclinio,
            titulo: "Produtos em Declínio Crítico".into(),
            descricao: format!("{declining} produtos com queda acentuada"),
            urgencia: Urgency::Alta,
            acao: "Revisão estratégica imediata".into(),
        });
    }

    alerts
}

// ---------------------------------------------------------------------------
// Insights and opportunities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Insight {
    /// Leading product by released value.
    Destaque {
        titulo: String,
        produto: ProductCategory,
        valor_liberado: Money,
        participacao: Percent,
    },
    /// Month of year concentrating the most volume.
    SazonalidadeCritica {
        titulo: String,
        mes: u32,
        mes_critico: String,
        concentracao: Percent,
        acao_recomendada: String,
    },
    ClientesEstrategicos {
        titulo: String,
        quantidade: usize,
        percentual: Percent,
        valor_medio: Money,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Opportunity {
    /// High-volume region served with few products.
    Expansao {
        titulo: String,
        regiao: String,
        diversificacao_atual: usize,
        valor_total: Money,
    },
    /// High-potential product holding a small share of the portfolio.
    ProdutoSubexplorado {
        titulo: String,
        produto: ProductCategory,
        potencial: Score,
        acao: String,
        impacto_estimado: Money,
        prioridade: Urgency,
    },
    /// Valuable customers concentrated in a single product.
    CrossSelling {
        titulo: String,
        clientes: usize,
        potencial_receita: Money,
        acao: String,
    },
}

pub fn insights(
    categories: &[CategoryMetrics],
    months_by_volume: &[(u32, Money)],
    customers: &[CustomerSummary],
    total_released: Money,
    thresholds: &DecisionThresholds,
) -> Vec<Insight> {
    let mut out = Vec::new();

    if let Some(leader) = categories.first() {
        out.push(Insight::Destaque {
            titulo: "Produto Líder".into(),
            produto: leader.produto,
            valor_liberado: leader.valor_liberado,
            participacao: leader.participacao,
        });
    }

    if let Some((month, volume)) = months_by_volume.first() {
        out.push(Insight::SazonalidadeCritica {
            titulo: "Padrão Sazonal Identificado".into(),
            mes: *month,
            mes_critico: month_name(*month).to_string(),
            concentracao: pct(*volume, total_released),
            acao_recomendada: "Criar campanhas antecipadas para equilibrar fluxo".into(),
        });
    }

    if !customers.is_empty() {
        let strategic: Vec<&CustomerSummary> = customers
            .iter()
            .filter(|c| c.fidelidade_score > thresholds.strategic_loyalty)
            .collect();
        let value: Money = strategic.iter().map(|c| c.valor_total_historico).sum();
        out.push(Insight::ClientesEstrategicos {
            titulo: "Base de Clientes Estratégicos".into(),
            quantidade: strategic.len(),
            percentual: pct(
                Decimal::from(strategic.len() as u64),
                Decimal::from(customers.len() as u64),
            ),
            valor_medio: safe_div(value, Decimal::from(strategic.len() as u64)),
        });
    }

    out
}

/// `regions` and `categories` keep their incoming order (value desc).
pub fn opportunities(
    categories: &[CategoryMetrics],
    regions: &[RegionMetrics],
    customers: &[CustomerSummary],
    thresholds: &DecisionThresholds,
) -> Vec<Opportunity> {
    let mut out: Vec<Opportunity> = regions
        .iter()
        .filter(|r| {
            r.diversificacao < thresholds.region_max_diversification
                && r.valor_total > thresholds.region_min_value
        })
        .map(|r| Opportunity::Expansao {
            titulo: "Potencial de Diversificação".into(),
            regiao: format!("{} - {}", r.cidade, r.uf),
            diversificacao_atual: r.diversificacao,
            valor_total: r.valor_total,
        })
        .collect();

    out.extend(
        categories
            .iter()
            .filter(|c| {
                c.potencial_crescimento > thresholds.bcg_potential_threshold
                    && c.participacao < thresholds.underexplored_max_share
            })
            .map(|c| Opportunity::ProdutoSubexplorado {
                titulo: "Produto com Potencial Inexplorado".into(),
                produto: c.produto,
                potencial: c.potencial_crescimento,
                acao: "Aumentar investimento em marketing e parcerias".into(),
                impacto_estimado: c.valor_liberado * thresholds.underexplored_impact_multiplier,
                prioridade: Urgency::Alta,
            }),
    );

    let premium_single = customers
        .iter()
        .filter(|c| {
            c.valor_total_historico > thresholds.premium_cross_sell_value
                && c.diversificacao_produtos < 2
        })
        .count();
    if premium_single > 0 {
        out.push(Opportunity::CrossSelling {
            titulo: "Oportunidade de Cross-Selling Premium".into(),
            clientes: premium_single,
            potencial_receita: Decimal::from(premium_single as u64)
                * thresholds.cross_sell_revenue_per_customer,
            acao: "Campanha direcionada de produtos complementares".into(),
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Opportunity windows and portfolio health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityWindow {
    pub mes: u32,
    pub nome_mes: String,
    pub volume_historico: Money,
    pub ranking: usize,
    pub oportunidade: String,
    pub estrategia_recomendada: String,
}

/// Top three months of the year by volume.
pub fn opportunity_windows(months_by_volume: &[(u32, Money)]) -> Vec<OpportunityWindow> {
    const RANKS: [(&str, &str); 3] = [
        ("PRINCIPAL", "Maximizar recursos e campanhas"),
        ("SECUNDÁRIA", "Campanhas direcionadas"),
        ("TERCIÁRIA", "Preparação antecipada"),
    ];
    months_by_volume
        .iter()
        .zip(RANKS.iter())
        .enumerate()
        .map(|(i, ((month, volume), (rank, strategy)))| OpportunityWindow {
            mes: *month,
            nome_mes: month_name(*month).to_string(),
            volume_historico: *volume,
            ranking: i + 1,
            oportunidade: rank.to_string(),
            estrategia_recomendada: strategy.to_string(),
        })
        .collect()
}

/// `min(100, diversification*0.3 + strategic share*0.4 + high-potential share*0.3)`.
pub fn portfolio_health(
    diversification_index: Percent,
    customers: &[CustomerSummary],
    categories: &[CategoryMetrics],
    thresholds: &DecisionThresholds,
) -> Score {
    let strategic = customers
        .iter()
        .filter(|c| c.fidelidade_score > thresholds.strategic_loyalty)
        .count();
    let high_potential = categories
        .iter()
        .filter(|c| c.potencial_crescimento > thresholds.bcg_potential_threshold)
        .count();
    let strategic_share = pct(
        Decimal::from(strategic as u64),
        Decimal::from(customers.len() as u64),
    );
    let potential_share = pct(
        Decimal::from(high_potential as u64),
        Decimal::from(categories.len() as u64),
    );
    (diversification_index * dec!(0.3) + strategic_share * dec!(0.4) + potential_share * dec!(0.3))
        .min(dec!(100))
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    EficienciaBaixa,
    ConcentracaoAlta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub tipo: AnomalyKind,
    pub descricao: String,
    pub impacto: RiskLevel,
    pub acao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnomalies {
    pub produto: ProductCategory,
    pub anomalias: Vec<Anomaly>,
}

/// Products with at least one anomaly, in the incoming order.
pub fn anomalies(
    categories: &[CategoryMetrics],
    thresholds: &DecisionThresholds,
) -> Vec<ProductAnomalies> {
    categories
        .iter()
        .filter_map(|c| {
            let mut found = Vec::new();
            if c.participacao > thresholds.bcg_share_threshold
                && c.eficiencia < thresholds.low_efficiency_ceiling
            {
                found.push(Anomaly {
                    tipo: AnomalyKind::EficienciaBaixa,
                    descricao: "Alto volume com baixa eficiência operacional".into(),
                    impacto: RiskLevel::Alto,
                    acao: "Revisar processos operacionais urgentemente".into(),
                });
            }
            if c.concentracao_clientes > thresholds.premium_concentration_ceiling {
                found.push(Anomaly {
                    tipo: AnomalyKind::ConcentracaoAlta,
                    descricao: "Dependência excessiva de poucos clientes premium".into(),
                    impacto: RiskLevel::Alto,
                    acao: "Diversificar base de clientes".into(),
                });
            }
            (!found.is_empty()).then(|| ProductAnomalies {
                produto: c.produto,
                anomalias: found,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Product lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    #[serde(rename = "INTRODUÇÃO")]
    Introducao,
    #[serde(rename = "CRESCIMENTO")]
    Crescimento,
    #[serde(rename = "MATURIDADE")]
    Maturidade,
    #[serde(rename = "DECLÍNIO")]
    Declinio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttentionPriority {
    #[serde(rename = "ALTA")]
    Alta,
    #[serde(rename = "MÉDIA")]
    Media,
    #[serde(rename = "BAIXA")]
    Baixa,
}

impl LifecyclePhase {
    pub fn strategy(&self) -> &'static str {
        match self {
            LifecyclePhase::Introducao => "Investir em marketing e desenvolvimento de mercado",
            LifecyclePhase::Crescimento => "Expandir capacidade e fortalecer posição competitiva",
            LifecyclePhase::Maturidade => "Otimizar custos e buscar diferenciação",
            LifecyclePhase::Declinio => "Reavaliar estratégia ou considerar descontinuação",
        }
    }

    pub fn attention(&self) -> AttentionPriority {
        match self {
            LifecyclePhase::Declinio => AttentionPriority::Alta,
            LifecyclePhase::Introducao => AttentionPriority::Media,
            _ => AttentionPriority::Baixa,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLifecycle {
    pub produto: ProductCategory,
    pub fase_ciclo: LifecyclePhase,
    /// `match_confidence` when a rule matched, 0 for the maturity fallback.
    pub confianca: Score,
    pub estrategia_recomendada: String,
    pub prioridade_atencao: AttentionPriority,
}

/// First phase whose rule holds, tried introduction → growth → maturity → decline.
pub fn lifecycle_phase(c: &CategoryMetrics, bands: &LifecycleBands) -> Option<LifecyclePhase> {
    let potential = c.potencial_crescimento;
    if c.clientes_unicos < bands.introduction_max_customers
        && potential > bands.introduction_min_potential
    {
        Some(LifecyclePhase::Introducao)
    } else if potential > bands.growth_min_potential && c.eficiencia > bands.growth_min_efficiency {
        Some(LifecyclePhase::Crescimento)
    } else if c.participacao > bands.maturity_min_share
        && c.eficiencia > bands.maturity_min_efficiency
        && potential < bands.maturity_max_potential
    {
        Some(LifecyclePhase::Maturidade)
    } else if potential < bands.decline_max_potential && c.eficiencia < bands.decline_max_efficiency
    {
        Some(LifecyclePhase::Declinio)
    } else {
        None
    }
}

pub fn product_lifecycle(
    categories: &[CategoryMetrics],
    thresholds: &DecisionThresholds,
) -> Vec<ProductLifecycle> {
    let bands = &thresholds.lifecycle;
    categories
        .iter()
        .map(|c| {
            let matched = lifecycle_phase(c, bands);
            let phase = matched.unwrap_or(LifecyclePhase::Maturidade);
            ProductLifecycle {
                produto: c.produto,
                fase_ciclo: phase,
                confianca: if matched.is_some() {
                    bands.match_confidence
                } else {
                    Decimal::ZERO
                },
                estrategia_recomendada: phase.strategy().into(),
                prioridade_atencao: phase.attention(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Priority recommendations
// ---------------------------------------------------------------------------

const INVESTMENT_RECOMMENDATIONS: usize = 3;
const RETENTION_PRIORITY: usize = 4;
const EXPANSION_PRIORITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    InvestimentoProduto,
    RetencaoClientes,
    ExpansaoGeografica,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub prioridade: usize,
    pub tipo: RecommendationKind,
    pub titulo: String,
    pub impacto_estimado: String,
    pub cronograma: String,
    pub recursos_necessarios: String,
    pub kpi_principal: String,
}

/// Categories passing `keep`, highest potential first. Ties keep the
/// incoming (value desc) order.
fn by_potential<'a>(
    categories: &'a [CategoryMetrics],
    keep: impl Fn(&CategoryMetrics) -> bool,
) -> Vec<&'a CategoryMetrics> {
    let mut out: Vec<&CategoryMetrics> = categories.iter().filter(|c| keep(c)).collect();
    out.sort_by(|a, b| b.potencial_crescimento.cmp(&a.potencial_crescimento));
    out
}

/// Recommendations ordered by priority: up to three product investments
/// (1-3), customer retention (4), geographic expansion (5).
pub fn priority_recommendations(
    categories: &[CategoryMetrics],
    customers: &[CustomerSummary],
    regions: &[RegionMetrics],
    thresholds: &DecisionThresholds,
) -> Vec<Recommendation> {
    let candidates = by_potential(categories, |c| {
        c.potencial_crescimento > thresholds.investment_min_potential
            && c.participacao < thresholds.investment_max_share
    });
    let mut out: Vec<Recommendation> = candidates
        .iter()
        .take(INVESTMENT_RECOMMENDATIONS)
        .enumerate()
        .map(|(i, c)| Recommendation {
            prioridade: i + 1,
            tipo: RecommendationKind::InvestimentoProduto,
            titulo: format!("Acelerar {}", c.produto),
            impacto_estimado: format!("+R$ {:.2}", (c.valor_liberado * dec!(0.5)).round_dp(2)),
            cronograma: "3-6 meses".into(),
            recursos_necessarios: "Marketing + Expansão de equipe".into(),
            kpi_principal: format!(
                "Aumentar participação de {:.1}% para {:.1}%",
                c.participacao.round_dp(1),
                (c.participacao * dec!(1.5)).round_dp(1)
            ),
        })
        .collect();

    if customers.iter().any(|c| {
        c.fidelidade_score < thresholds.churn_loyalty_ceiling
            && c.valor_total_historico > thresholds.retention_min_value
    }) {
        out.push(Recommendation {
            prioridade: RETENTION_PRIORITY,
            tipo: RecommendationKind::RetencaoClientes,
            titulo: "Programa de Retenção Premium".into(),
            impacto_estimado: "Evitar perda de clientes de alto valor".into(),
            cronograma: "Imediato (30 dias)".into(),
            recursos_necessarios: "Equipe de relacionamento dedicada".into(),
            kpi_principal: "Reduzir churn de clientes premium em 50%".into(),
        });
    }

    let undiversified = regions
        .iter()
        .filter(|r| {
            r.diversificacao < thresholds.region_max_diversification
                && r.valor_total > thresholds.expansion_region_min_value
        })
        .count();
    if undiversified > thresholds.expansion_min_regions {
        out.push(Recommendation {
            prioridade: EXPANSION_PRIORITY,
            tipo: RecommendationKind::ExpansaoGeografica,
            titulo: "Diversificação Regional".into(),
            impacto_estimado: "+30% volume regional".into(),
            cronograma: "6-12 meses".into(),
            recursos_necessarios: "Parcerias locais + Marketing regional".into(),
            kpi_principal: format!(
                "Aumentar produtos por região em {undiversified} regiões concentradas"
            ),
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Predictive lists
// ---------------------------------------------------------------------------

const TOP_POTENTIAL_LISTED: usize = 3;
const CROSS_SELL_PRODUCTS_LISTED: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnProbability {
    pub cliente: String,
    pub probabilidade_churn: Percent,
    pub valor_risco: Money,
    pub acao_preventiva: PreventiveAction,
}

/// Customers above `churn_probability_alert`, highest value at risk first.
pub fn churn_probabilities(
    customers: &[CustomerSummary],
    thresholds: &DecisionThresholds,
) -> Vec<ChurnProbability> {
    let mut out: Vec<ChurnProbability> = customers
        .iter()
        .filter(|c| c.probabilidade_churn > thresholds.churn_probability_alert)
        .map(|c| ChurnProbability {
            cliente: c.cliente.clone(),
            probabilidade_churn: c.probabilidade_churn,
            valor_risco: c.valor_total_historico,
            acao_preventiva: c.acao_preventiva,
        })
        .collect();
    out.sort_by(|a, b| {
        b.valor_risco
            .cmp(&a.valor_risco)
            .then_with(|| a.cliente.cmp(&b.cliente))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCrossSell {
    pub produto: ProductCategory,
    pub clientes_potenciais: u64,
    pub receita_potencial: Money,
}

/// Up to five high-potential products to push to existing customers. The
/// customer estimate is `floor(potential / 10)` plus a rank bonus.
pub fn product_cross_sell(
    categories: &[CategoryMetrics],
    thresholds: &DecisionThresholds,
) -> Vec<ProductCrossSell> {
    by_potential(categories, |c| {
        c.potencial_crescimento > thresholds.cross_sell_product_min_potential
    })
    .into_iter()
    .take(CROSS_SELL_PRODUCTS_LISTED)
    .enumerate()
    .map(|(i, c)| {
        let base = (c.potencial_crescimento / dec!(10))
            .floor()
            .to_u64()
            .unwrap_or(0);
        let rank_bonus = ((CROSS_SELL_PRODUCTS_LISTED - i) * 2) as u64;
        ProductCrossSell {
            produto: c.produto,
            clientes_potenciais: base + rank_bonus,
            receita_potencial: c.valor_liberado * c.potencial_crescimento / dec!(100)
                * thresholds.cross_sell_revenue_share,
        }
    })
    .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelligentForecast {
    /// Sum of the revenue estimates carried by the opportunities.
    pub potencial_receita_adicional: Money,
    /// Up to three products above `top_potential_min`, highest potential first.
    pub produtos_com_maior_potencial: Vec<CategoryMetrics>,
}

pub fn intelligent_forecast(
    categories: &[CategoryMetrics],
    opportunities: &[Opportunity],
    thresholds: &DecisionThresholds,
) -> IntelligentForecast {
    let revenue: Money = opportunities
        .iter()
        .map(|o| match o {
            Opportunity::CrossSelling {
                potencial_receita, ..
            } => *potencial_receita,
            _ => Decimal::ZERO,
        })
        .sum();
    IntelligentForecast {
        potencial_receita_adicional: revenue,
        produtos_com_maior_potencial: by_potential(categories, |c| {
            c.potencial_crescimento > thresholds.top_potential_min
        })
        .into_iter()
        .take(TOP_POTENTIAL_LISTED)
        .cloned()
        .collect(),
    }
}

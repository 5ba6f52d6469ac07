//! Temporal trend analysis per product category.
//!
//! Growth is measured month over month on the category's released volume,
//! each step clamped to suppress outliers, and averaged into a velocity.
//! The forecast is a one-period projection of the last month at that
//! (capped) velocity; it is deliberately not a fitted model.
//!
//! Sparse categories (fewer than two non-zero months) do not produce growth
//! samples. For those, a dominant category (total volume above
//! `dominant_volume`) gets a fixed velocity of `dominant_fallback_velocity`.
//! This is a compatibility policy inherited from the dashboard, not a
//! statistical estimate, and is flagged in the output via `velocidade_fixada`.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregation::buckets::{safe_div, CategoryBucket, MarketMonth};
use crate::config::{DecisionThresholds, TrendBands};
use crate::records::ProductCategory;
use crate::types::{Money, Percent, Score, YearMonth};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    CrescimentoForte,
    CrescimentoModerado,
    Estavel,
    DeclinioModerado,
    DeclinioForte,
}

impl TrendLabel {
    pub fn is_growth(&self) -> bool {
        matches!(
            self,
            TrendLabel::CrescimentoForte | TrendLabel::CrescimentoModerado
        )
    }

    pub fn is_decline(&self) -> bool {
        matches!(self, TrendLabel::DeclinioModerado | TrendLabel::DeclinioForte)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::CrescimentoForte => "CRESCIMENTO_FORTE",
            TrendLabel::CrescimentoModerado => "CRESCIMENTO_MODERADO",
            TrendLabel::Estavel => "ESTAVEL",
            TrendLabel::DeclinioModerado => "DECLINIO_MODERADO",
            TrendLabel::DeclinioForte => "DECLINIO_FORTE",
        }
    }

    pub fn from_velocity(velocity: Percent, bands: &TrendBands) -> Self {
        if velocity > bands.strong_growth {
            TrendLabel::CrescimentoForte
        } else if velocity > bands.moderate_growth {
            TrendLabel::CrescimentoModerado
        } else if velocity > bands.stable {
            TrendLabel::Estavel
        } else if velocity > bands.moderate_decline {
            TrendLabel::DeclinioModerado
        } else {
            TrendLabel::DeclinioForte
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub periodo: YearMonth,
    pub valor: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub categoria: ProductCategory,
    pub timeline_mensal: Vec<MonthlyPoint>,
    /// Mean of the clamped month-over-month growths, in percent.
    pub velocidade_crescimento: Percent,
    /// Last clamped growth minus the first.
    pub aceleracao: Percent,
    pub previsao_proximo_mes: Money,
    pub confianca_previsao: Score,
    pub tendencia: TrendLabel,
    pub volume_medio_mensal: Money,
    /// True when the velocity is the sparse-data fallback, not measured.
    pub velocidade_fixada: bool,
    pub crescimentos: Vec<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPeriod {
    pub periodo: YearMonth,
    pub operacoes: u64,
    pub volume: Money,
    pub ticket_medio: Money,
    pub crescimento_mensal: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub timeline_completa: Vec<MarketPeriod>,
    pub tendencias_por_categoria: Vec<TrendRecord>,
    pub crescimento_medio_mercado: Percent,
    pub previsao_receita_total: Money,
    pub categorias_em_alta: Vec<ProductCategory>,
    pub categorias_em_queda: Vec<ProductCategory>,
    /// Categories left out of trend-dependent sections for lack of history.
    pub categorias_dados_insuficientes: Vec<ProductCategory>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clamp(val: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    if val < lo {
        lo
    } else if val > hi {
        hi
    } else {
        val
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().sum();
    sum / Decimal::from(values.len() as u64)
}

/// Population standard deviation around `centre`.
fn std_dev(values: &[Decimal], centre: Decimal) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let variance = values
        .iter()
        .map(|v| (*v - centre) * (*v - centre))
        .sum::<Decimal>()
        / Decimal::from(values.len() as u64);
    variance.sqrt().unwrap_or(Decimal::ZERO)
}

/// Clamped percentage growth between consecutive non-zero monthly values.
/// A ratio too large for `Decimal` saturates to the matching bound.
fn clamped_growths(non_zero: &[Money], thresholds: &DecisionThresholds) -> Vec<Percent> {
    non_zero
        .windows(2)
        .map(|w| {
            let saturated = if w[1] >= w[0] {
                thresholds.growth_ceiling
            } else {
                thresholds.growth_floor
            };
            let growth = (w[1] - w[0])
                .checked_div(w[0])
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .unwrap_or(saturated);
            clamp(growth, thresholds.growth_floor, thresholds.growth_ceiling)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Trend for one category, or `None` when it has fewer than
/// `min_trend_months` distinct months or an all-zero timeline.
pub fn analyze(bucket: &CategoryBucket, thresholds: &DecisionThresholds) -> Option<TrendRecord> {
    let timeline = bucket.timeline();
    if timeline.len() < thresholds.min_trend_months {
        return None;
    }
    let values: Vec<Money> = timeline.iter().map(|(_, v)| *v).collect();
    let total: Money = values.iter().sum();
    if total <= Decimal::ZERO {
        return None;
    }
    let volume_mean = total / Decimal::from(values.len() as u64);
    let non_zero: Vec<Money> = values.iter().copied().filter(|v| *v > Decimal::ZERO).collect();

    let (growths, velocity, label, fixed) = if non_zero.len() < 2 {
        if total > thresholds.dominant_volume {
            (
                Vec::new(),
                thresholds.dominant_fallback_velocity,
                TrendLabel::CrescimentoModerado,
                true,
            )
        } else {
            (Vec::new(), Decimal::ZERO, TrendLabel::Estavel, true)
        }
    } else {
        let growths = clamped_growths(&non_zero, thresholds);
        let velocity = mean(&growths);
        let bands = if volume_mean > thresholds.high_volume_monthly_mean {
            &thresholds.high_volume_bands
        } else {
            &thresholds.small_volume_bands
        };
        let label = TrendLabel::from_velocity(velocity, bands);
        (growths, velocity, label, false)
    };

    let acceleration = match (growths.first(), growths.last()) {
        (Some(first), Some(last)) if growths.len() >= 2 => *last - *first,
        _ => Decimal::ZERO,
    };

    let last_value = values.last().copied().unwrap_or(Decimal::ZERO);
    let cap = thresholds.forecast_velocity_cap;
    let forecast = last_value * (Decimal::ONE + clamp(velocity, -cap, cap) / dec!(100));

    let confidence = if growths.is_empty() {
        Decimal::ZERO
    } else {
        clamp(
            dec!(100) - dec!(2) * std_dev(&growths, velocity),
            Decimal::ZERO,
            dec!(100),
        )
    };

    Some(TrendRecord {
        categoria: bucket.category,
        timeline_mensal: timeline
            .into_iter()
            .map(|(periodo, valor)| MonthlyPoint { periodo, valor })
            .collect(),
        velocidade_crescimento: velocity,
        aceleracao: acceleration,
        previsao_proximo_mes: forecast,
        confianca_previsao: confidence,
        tendencia: label,
        volume_medio_mensal: volume_mean,
        velocidade_fixada: fixed,
        crescimentos: growths,
    })
}

/// Market-wide monthly timeline with month-over-month growth.
pub fn market_timeline(market: &BTreeMap<YearMonth, MarketMonth>) -> Vec<MarketPeriod> {
    let mut out: Vec<MarketPeriod> = Vec::with_capacity(market.len());
    let mut previous: Option<Money> = None;
    for (period, month) in market {
        let growth = match previous {
            Some(prev) if prev > Decimal::ZERO => (month.volume - prev) / prev * dec!(100),
            _ => Decimal::ZERO,
        };
        out.push(MarketPeriod {
            periodo: *period,
            operacoes: month.operations,
            volume: month.volume,
            ticket_medio: safe_div(month.volume, Decimal::from(month.operations)),
            crescimento_mensal: growth,
        });
        previous = Some(month.volume);
    }
    out
}

/// Run the analyzer over every category and summarise the market.
pub fn analyze_trends(
    categories: &BTreeMap<ProductCategory, CategoryBucket>,
    market: &BTreeMap<YearMonth, MarketMonth>,
    thresholds: &DecisionThresholds,
) -> TrendAnalysis {
    let mut trends = Vec::new();
    let mut insufficient = Vec::new();
    for (category, bucket) in categories {
        match analyze(bucket, thresholds) {
            Some(t) => trends.push(t),
            None => insufficient.push(*category),
        }
    }
    trends.sort_by(|a, b| {
        b.previsao_proximo_mes
            .cmp(&a.previsao_proximo_mes)
            .then_with(|| a.categoria.cmp(&b.categoria))
    });

    let timeline = market_timeline(market);
    // averaged over every period, the first one contributing zero growth
    let market_growth = if timeline.len() > 1 {
        let growths: Vec<Percent> = timeline.iter().map(|p| p.crescimento_mensal).collect();
        mean(&growths)
    } else {
        Decimal::ZERO
    };

    log::debug!(
        "trends: {} categories analysed, {} with insufficient history",
        trends.len(),
        insufficient.len()
    );

    TrendAnalysis {
        crescimento_medio_mercado: market_growth,
        previsao_receita_total: trends.iter().map(|t| t.previsao_proximo_mes).sum(),
        categorias_em_alta: trends
            .iter()
            .filter(|t| t.tendencia.is_growth())
            .map(|t| t.categoria)
            .collect(),
        categorias_em_queda: trends
            .iter()
            .filter(|t| t.tendencia.is_decline())
            .map(|t| t.categoria)
            .collect(),
        categorias_dados_insuficientes: insufficient,
        timeline_completa: timeline,
        tendencias_por_categoria: trends,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(category: ProductCategory, months: &[(i32, u32, Decimal)]) -> CategoryBucket {
        let mut b = CategoryBucket::new(category);
        for (y, m, v) in months {
            b.monthly.insert(YearMonth::new(*y, *m), *v);
            b.released += *v;
            b.operations += 1;
        }
        b
    }

    #[test]
    fn test_fgts_three_month_scenario() {
        let b = bucket(
            ProductCategory::Fgts,
            &[
                (2024, 1, dec!(100000)),
                (2024, 2, dec!(120000)),
                (2024, 3, dec!(150000)),
            ],
        );
        let t = analyze(&b, &DecisionThresholds::default()).unwrap();
        assert_eq!(t.velocidade_crescimento, dec!(22.5));
        assert_eq!(t.previsao_proximo_mes, dec!(183750));
        assert_eq!(t.tendencia, TrendLabel::CrescimentoForte);
        assert_eq!(t.aceleracao, dec!(5));
        // sigma of (20, 25) is 2.5
        assert!((t.confianca_previsao - dec!(95)).abs() < dec!(0.0001));
        assert!(!t.velocidade_fixada);
    }

    #[test]
    fn test_fewer_than_three_months_is_none() {
        let b = bucket(
            ProductCategory::Fgts,
            &[(2024, 1, dec!(100)), (2024, 2, dec!(200))],
        );
        assert!(analyze(&b, &DecisionThresholds::default()).is_none());
    }

    #[test]
    fn test_all_zero_timeline_is_none() {
        let b = bucket(
            ProductCategory::Outros,
            &[
                (2024, 1, Decimal::ZERO),
                (2024, 2, Decimal::ZERO),
                (2024, 3, Decimal::ZERO),
            ],
        );
        assert!(analyze(&b, &DecisionThresholds::default()).is_none());
    }

    #[test]
    fn test_sparse_dominant_category_uses_fixed_velocity() {
        let b = bucket(
            ProductCategory::CompraDeDivida,
            &[
                (2024, 1, Decimal::ZERO),
                (2024, 2, dec!(2000000)),
                (2024, 3, Decimal::ZERO),
            ],
        );
        let t = analyze(&b, &DecisionThresholds::default()).unwrap();
        assert!(t.velocidade_fixada);
        assert_eq!(t.velocidade_crescimento, dec!(5));
        assert_eq!(t.tendencia, TrendLabel::CrescimentoModerado);
        assert_eq!(t.confianca_previsao, Decimal::ZERO);
        // last month is zero, so the projection is zero
        assert_eq!(t.previsao_proximo_mes, Decimal::ZERO);
    }

    #[test]
    fn test_sparse_small_category_is_stable() {
        let b = bucket(
            ProductCategory::NovoCrediario,
            &[
                (2024, 1, dec!(5000)),
                (2024, 2, Decimal::ZERO),
                (2024, 3, Decimal::ZERO),
            ],
        );
        let t = analyze(&b, &DecisionThresholds::default()).unwrap();
        assert_eq!(t.tendencia, TrendLabel::Estavel);
        assert_eq!(t.velocidade_crescimento, Decimal::ZERO);
    }

    #[test]
    fn test_outlier_growth_is_clamped() {
        let b = bucket(
            ProductCategory::CartaoDeCredito,
            &[
                (2024, 1, dec!(100)),
                (2024, 2, dec!(100000)),
                (2024, 3, dec!(100000)),
            ],
        );
        let t = analyze(&b, &DecisionThresholds::default()).unwrap();
        assert_eq!(t.crescimentos, vec![dec!(500), Decimal::ZERO]);
        assert_eq!(t.velocidade_crescimento, dec!(250));
        // velocity is capped at +50% for the projection
        assert_eq!(t.previsao_proximo_mes, dec!(150000));
        assert!(t.confianca_previsao >= Decimal::ZERO && t.confianca_previsao <= dec!(100));
    }

    #[test]
    fn test_overflowing_growth_saturates_to_ceiling() {
        let b = bucket(
            ProductCategory::Fgts,
            &[
                (2024, 1, dec!(0.00000000000000000001)),
                (2024, 2, dec!(1000000000)),
                (2024, 3, dec!(1000000000)),
            ],
        );
        let t = analyze(&b, &DecisionThresholds::default()).unwrap();
        assert_eq!(t.crescimentos, vec![dec!(500), Decimal::ZERO]);
        assert_eq!(t.velocidade_crescimento, dec!(250));
    }

    #[test]
    fn test_high_volume_uses_wide_bands() {
        // +15% per month: strong growth for small categories, moderate for large
        let small = bucket(
            ProductCategory::Fgts,
            &[
                (2024, 1, dec!(100000)),
                (2024, 2, dec!(115000)),
                (2024, 3, dec!(132250)),
            ],
        );
        let large = bucket(
            ProductCategory::Fgts,
            &[
                (2024, 1, dec!(1000000)),
                (2024, 2, dec!(1150000)),
                (2024, 3, dec!(1322500)),
            ],
        );
        let t = DecisionThresholds::default();
        assert_eq!(analyze(&small, &t).unwrap().tendencia, TrendLabel::CrescimentoForte);
        assert_eq!(analyze(&large, &t).unwrap().tendencia, TrendLabel::CrescimentoModerado);
    }

    #[test]
    fn test_label_band_boundaries_are_strict() {
        let bands = TrendBands::small_volume();
        assert_eq!(TrendLabel::from_velocity(dec!(10), &bands), TrendLabel::CrescimentoModerado);
        assert_eq!(TrendLabel::from_velocity(dec!(10.01), &bands), TrendLabel::CrescimentoForte);
        assert_eq!(TrendLabel::from_velocity(dec!(-3), &bands), TrendLabel::DeclinioModerado);
        assert_eq!(TrendLabel::from_velocity(dec!(-10), &bands), TrendLabel::DeclinioForte);
    }

    #[test]
    fn test_market_timeline_growth() {
        let mut market = BTreeMap::new();
        market.insert(
            YearMonth::new(2024, 1),
            MarketMonth { operations: 2, volume: dec!(1000) },
        );
        market.insert(
            YearMonth::new(2024, 2),
            MarketMonth { operations: 4, volume: dec!(1500) },
        );
        let timeline = market_timeline(&market);
        assert_eq!(timeline[0].crescimento_mensal, Decimal::ZERO);
        assert_eq!(timeline[1].crescimento_mensal, dec!(50));
        assert_eq!(timeline[1].ticket_medio, dec!(375));
    }

    #[test]
    fn test_analyze_trends_partitions_categories() {
        let mut categories = BTreeMap::new();
        categories.insert(
            ProductCategory::Fgts,
            bucket(
                ProductCategory::Fgts,
                &[
                    (2024, 1, dec!(100)),
                    (2024, 2, dec!(80)),
                    (2024, 3, dec!(50)),
                ],
            ),
        );
        categories.insert(
            ProductCategory::Outros,
            bucket(ProductCategory::Outros, &[(2024, 1, dec!(10))]),
        );
        let analysis = analyze_trends(&categories, &BTreeMap::new(), &DecisionThresholds::default());
        assert_eq!(analysis.tendencias_por_categoria.len(), 1);
        assert_eq!(analysis.categorias_dados_insuficientes, vec![ProductCategory::Outros]);
        assert_eq!(analysis.categorias_em_queda, vec![ProductCategory::Fgts]);
        assert!(analysis.categorias_em_alta.is_empty());
        assert_eq!(analysis.crescimento_medio_mercado, Decimal::ZERO);
    }
}

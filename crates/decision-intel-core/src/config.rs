//! Policy thresholds for the decision intelligence pipeline.
//!
//! Every cutoff used by the scorers and classifiers lives here with its
//! documented default, so callers (and tests) can pin boundary values precisely
//! or override them from a JSON/YAML file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DecisionIntelError;
use crate::DecisionResult;

/// Upper bounds (exclusive, checked top-down with `>`) of the five trend labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBands {
    pub strong_growth: Decimal,
    pub moderate_growth: Decimal,
    pub stable: Decimal,
    pub moderate_decline: Decimal,
}

impl TrendBands {
    pub fn high_volume() -> Self {
        Self {
            strong_growth: dec!(20),
            moderate_growth: dec!(5),
            stable: dec!(-5),
            moderate_decline: dec!(-15),
        }
    }

    pub fn small_volume() -> Self {
        Self {
            strong_growth: dec!(10),
            moderate_growth: dec!(3),
            stable: dec!(-3),
            moderate_decline: dec!(-10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityWeights {
    pub volume: Decimal,
    pub growth: Decimal,
    pub diversification: Decimal,
    pub efficiency: Decimal,
    pub potential: Decimal,
}

impl OpportunityWeights {
    pub fn total(&self) -> Decimal {
        self.volume + self.growth + self.diversification + self.efficiency + self.potential
    }
}

impl Default for OpportunityWeights {
    fn default() -> Self {
        Self {
            volume: dec!(0.25),
            growth: dec!(0.25),
            diversification: dec!(0.20),
            efficiency: dec!(0.15),
            potential: dec!(0.15),
        }
    }
}

/// Score cutoffs for the investment tiers; a score must be strictly above a
/// cutoff to reach that tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBands {
    pub invest_heavily: Decimal,
    pub expand: Decimal,
    pub maintain: Decimal,
    pub reassess: Decimal,
}

impl Default for TierBands {
    fn default() -> Self {
        Self {
            invest_heavily: dec!(80),
            expand: dec!(65),
            maintain: dec!(45),
            reassess: dec!(25),
        }
    }
}

/// Share cutoffs (percent) for the ALTO / MÉDIO / BAIXO concentration labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationBands {
    pub high: Decimal,
    pub medium: Decimal,
}

impl Default for ConcentrationBands {
    fn default() -> Self {
        Self {
            high: dec!(50),
            medium: dec!(30),
        }
    }
}

/// Product lifecycle rules. Each phase is claimed when all of its
/// conditions hold; phases are tried in the order listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleBands {
    /// Introduction: fewer unique customers than this...
    pub introduction_max_customers: usize,
    /// ...and growth potential above this.
    pub introduction_min_potential: Decimal,
    pub growth_min_potential: Decimal,
    pub growth_min_efficiency: Decimal,
    pub maturity_min_share: Decimal,
    pub maturity_min_efficiency: Decimal,
    pub maturity_max_potential: Decimal,
    pub decline_max_potential: Decimal,
    pub decline_max_efficiency: Decimal,
    /// Confidence reported for a matched phase.
    pub match_confidence: Decimal,
}

impl Default for LifecycleBands {
    fn default() -> Self {
        Self {
            introduction_max_customers: 100,
            introduction_min_potential: dec!(80),
            growth_min_potential: dec!(60),
            growth_min_efficiency: dec!(80),
            maturity_min_share: dec!(15),
            maturity_min_efficiency: dec!(70),
            maturity_max_potential: dec!(50),
            decline_max_potential: dec!(30),
            decline_max_efficiency: dec!(60),
            match_confidence: dec!(80),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// A single operation above this released value marks its customer as
    /// premium within the category.
    pub premium_ticket: Decimal,
    /// Historical value above which a customer is `PREMIUM` risk tier.
    pub premium_customer_value: Decimal,
    /// Diversification count above which a customer is `MEDIUM` risk tier.
    pub medium_tier_diversification: usize,
    /// Churn flag: loyalty strictly below this...
    pub churn_loyalty_ceiling: Decimal,
    /// ...and historical value strictly above this.
    pub churn_min_value: Decimal,
    /// Single-category customers above this value are cross-sell candidates.
    pub cross_sell_min_value: Decimal,
    /// Customers with fewer than two categories above this value feed the
    /// premium cross-sell opportunity.
    pub premium_cross_sell_value: Decimal,
    /// Estimated extra revenue per premium cross-sell customer.
    pub cross_sell_revenue_per_customer: Decimal,
    /// Loyalty strictly above this makes a customer strategic.
    pub strategic_loyalty: Decimal,
    /// `MEDIUM` customers above this value are potential premium upgrades.
    pub potential_premium_value: Decimal,
    pub top_customers_listed: usize,

    /// Categories need at least this many distinct months for trend analysis.
    pub min_trend_months: usize,
    pub growth_floor: Decimal,
    pub growth_ceiling: Decimal,
    /// Velocity is clamped to ±this before projecting the forecast.
    pub forecast_velocity_cap: Decimal,
    /// Sparse categories above this total volume get the fixed fallback velocity.
    pub dominant_volume: Decimal,
    pub dominant_fallback_velocity: Decimal,
    /// Mean monthly volume above this selects the wide trend bands.
    pub high_volume_monthly_mean: Decimal,
    pub high_volume_bands: TrendBands,
    pub small_volume_bands: TrendBands,

    pub bcg_share_threshold: Decimal,
    pub bcg_potential_threshold: Decimal,
    /// Operations strictly above this add the flat activity bonus to potential.
    pub potential_min_operations: u64,
    /// Distinct months strictly above this add the spread bonus to potential.
    pub potential_min_months: usize,

    /// Released value worth 100 volume points is `volume_score_unit * 5`.
    pub volume_score_unit: Decimal,
    pub volume_score_points: Decimal,
    pub diversification_points_per_customer: Decimal,
    /// Sub-score used when efficiency or potential is zero or missing.
    pub neutral_sub_score: Decimal,
    pub opportunity_weights: OpportunityWeights,
    pub tier_bands: TierBands,

    pub concentration_bands: ConcentrationBands,
    /// Top-3 product share above this raises the concentration alert.
    pub concentration_alert: Decimal,
    pub region_max_diversification: usize,
    pub region_min_value: Decimal,

    /// High-potential products below this share are flagged as underexplored.
    pub underexplored_max_share: Decimal,
    /// Estimated impact of an underexplored product, as a multiple of its volume.
    pub underexplored_impact_multiplier: Decimal,
    /// Products above `bcg_share_threshold` with efficiency below this are anomalous.
    pub low_efficiency_ceiling: Decimal,
    /// Premium-customer concentration above this is anomalous.
    pub premium_concentration_ceiling: Decimal,
    pub lifecycle: LifecycleBands,

    /// Investment recommendations: potential above this...
    pub investment_min_potential: Decimal,
    /// ...and share below this.
    pub investment_max_share: Decimal,
    /// Retention recommendation: any customer under `churn_loyalty_ceiling`
    /// with historical value above this.
    pub retention_min_value: Decimal,
    /// Geographic recommendation: more than `expansion_min_regions` regions
    /// under `region_max_diversification` with value above this.
    pub expansion_region_min_value: Decimal,
    pub expansion_min_regions: usize,

    /// Products listed as highest potential need potential above this.
    pub top_potential_min: Decimal,
    /// Customers above this churn probability are listed.
    pub churn_probability_alert: Decimal,
    /// Products above this potential are cross-sell targets.
    pub cross_sell_product_min_potential: Decimal,
    /// Share of the potential-weighted volume counted as cross-sell revenue.
    pub cross_sell_revenue_share: Decimal,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            premium_ticket: dec!(50000),
            premium_customer_value: dec!(100000),
            medium_tier_diversification: 2,
            churn_loyalty_ceiling: dec!(40),
            churn_min_value: dec!(10000),
            cross_sell_min_value: dec!(20000),
            premium_cross_sell_value: dec!(50000),
            cross_sell_revenue_per_customer: dec!(25000),
            strategic_loyalty: dec!(80),
            potential_premium_value: dec!(30000),
            top_customers_listed: 10,

            min_trend_months: 3,
            growth_floor: dec!(-100),
            growth_ceiling: dec!(500),
            forecast_velocity_cap: dec!(50),
            dominant_volume: dec!(1000000),
            dominant_fallback_velocity: dec!(5),
            high_volume_monthly_mean: dec!(500000),
            high_volume_bands: TrendBands::high_volume(),
            small_volume_bands: TrendBands::small_volume(),

            bcg_share_threshold: dec!(10),
            bcg_potential_threshold: dec!(70),
            potential_min_operations: 10,
            potential_min_months: 6,

            volume_score_unit: dec!(1000000),
            volume_score_points: dec!(20),
            diversification_points_per_customer: dec!(2),
            neutral_sub_score: dec!(50),
            opportunity_weights: OpportunityWeights::default(),
            tier_bands: TierBands::default(),

            concentration_bands: ConcentrationBands::default(),
            concentration_alert: dec!(70),
            region_max_diversification: 3,
            region_min_value: dec!(100000),

            underexplored_max_share: dec!(5),
            underexplored_impact_multiplier: dec!(2.5),
            low_efficiency_ceiling: dec!(50),
            premium_concentration_ceiling: dec!(80),
            lifecycle: LifecycleBands::default(),

            investment_min_potential: dec!(75),
            investment_max_share: dec!(20),
            retention_min_value: dec!(30000),
            expansion_region_min_value: dec!(500000),
            expansion_min_regions: 2,

            top_potential_min: dec!(80),
            churn_probability_alert: dec!(60),
            cross_sell_product_min_potential: dec!(50),
            cross_sell_revenue_share: dec!(0.3),
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> DecisionResult<()> {
        if self.min_trend_months < 2 {
            return Err(invalid(
                "min_trend_months",
                "At least two months are needed to measure growth",
            ));
        }
        if self.growth_floor >= self.growth_ceiling {
            return Err(invalid(
                "growth_floor / growth_ceiling",
                "Growth floor must be below the growth ceiling",
            ));
        }
        if self.forecast_velocity_cap < Decimal::ZERO {
            return Err(invalid(
                "forecast_velocity_cap",
                "Forecast velocity cap cannot be negative",
            ));
        }
        if self.volume_score_unit <= Decimal::ZERO {
            return Err(invalid(
                "volume_score_unit",
                "Volume score unit must be positive",
            ));
        }
        for (field, bands) in [
            ("high_volume_bands", &self.high_volume_bands),
            ("small_volume_bands", &self.small_volume_bands),
        ] {
            if !(bands.strong_growth > bands.moderate_growth
                && bands.moderate_growth > bands.stable
                && bands.stable > bands.moderate_decline)
            {
                return Err(invalid(field, "Trend bands must be strictly descending"));
            }
        }
        let t = &self.tier_bands;
        if !(t.invest_heavily > t.expand && t.expand > t.maintain && t.maintain > t.reassess) {
            return Err(invalid("tier_bands", "Tier bands must be strictly descending"));
        }
        if self.concentration_bands.high <= self.concentration_bands.medium {
            return Err(invalid(
                "concentration_bands",
                "High concentration band must exceed the medium band",
            ));
        }
        let w = &self.opportunity_weights;
        if [w.volume, w.growth, w.diversification, w.efficiency, w.potential]
            .iter()
            .any(|x| *x < Decimal::ZERO)
        {
            return Err(invalid(
                "opportunity_weights",
                "Opportunity weights cannot be negative",
            ));
        }
        if (w.total() - Decimal::ONE).abs() > dec!(0.0001) {
            return Err(invalid(
                "opportunity_weights",
                &format!("Opportunity weights must sum to 1.0, got {}", w.total()),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> DecisionIntelError {
    DecisionIntelError::InvalidConfig {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DecisionThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert_eq!(OpportunityWeights::default().total(), Decimal::ONE);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: DecisionThresholds =
            serde_json::from_str(r#"{ "premium_ticket": 75000 }"#).unwrap();
        assert_eq!(cfg.premium_ticket, dec!(75000));
        assert_eq!(cfg.premium_customer_value, dec!(100000));
        assert_eq!(cfg.tier_bands, TierBands::default());
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let mut cfg = DecisionThresholds::default();
        cfg.opportunity_weights.volume = dec!(0.5);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, DecisionIntelError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_non_descending_tier_bands() {
        let mut cfg = DecisionThresholds::default();
        cfg.tier_bands.expand = dec!(90);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_growth_clamp() {
        let mut cfg = DecisionThresholds::default();
        cfg.growth_floor = dec!(600);
        assert!(cfg.validate().is_err());
    }
}

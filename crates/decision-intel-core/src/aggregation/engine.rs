use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::buckets::{
    CategoryBucket, CategoryMetrics, CustomerProfile, InstitutionBucket, InstitutionMetrics,
    MarketMonth, RegionBucket, RegionKey, RegionMetrics,
};
use crate::config::DecisionThresholds;
use crate::records::{DisbursementRecord, ProductCategory};
use crate::types::{Money, YearMonth};

/// Group-by accumulators built in a single pass over the batch.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub categories: BTreeMap<ProductCategory, CategoryBucket>,
    pub customers: BTreeMap<String, CustomerProfile>,
    pub regions: BTreeMap<RegionKey, RegionBucket>,
    pub institutions: BTreeMap<String, InstitutionBucket>,
    /// Market-wide monthly totals.
    pub market: BTreeMap<YearMonth, MarketMonth>,
    /// Month of year (1-12) -> released volume, across all years.
    pub month_of_year: BTreeMap<u32, Money>,
    pub record_count: usize,
    pub total_released: Money,
    pub total_requested: Money,
    pub total_financed: Money,
}

/// Stream the records once, updating every accumulator per record.
pub fn aggregate(records: &[DisbursementRecord], thresholds: &DecisionThresholds) -> Aggregation {
    let mut agg = Aggregation::default();

    for rec in records {
        agg.categories
            .entry(rec.category)
            .or_insert_with(|| CategoryBucket::new(rec.category))
            .record(rec, thresholds);

        agg.customers
            .entry(rec.customer_id.clone())
            .or_insert_with(|| CustomerProfile::new(&rec.customer_id))
            .record(rec);

        agg.regions
            .entry(RegionKey {
                city: rec.city.clone(),
                state: rec.state.clone(),
            })
            .or_default()
            .record(rec);

        agg.institutions
            .entry(rec.institution.clone())
            .or_default()
            .record(rec);

        if let Some(ym) = rec.year_month() {
            let month = agg.market.entry(ym).or_default();
            month.operations += 1;
            month.volume += rec.released_amount;
            *agg.month_of_year.entry(ym.month).or_insert(Decimal::ZERO) += rec.released_amount;
        }

        agg.record_count += 1;
        agg.total_released += rec.released_amount;
        agg.total_requested += rec.requested_amount;
        agg.total_financed += rec.financed_amount;
    }

    log::debug!(
        "aggregation: {} records -> {} categories, {} customers, {} regions, {} institutions, {} months",
        agg.record_count,
        agg.categories.len(),
        agg.customers.len(),
        agg.regions.len(),
        agg.institutions.len(),
        agg.market.len()
    );
    agg
}

impl Aggregation {
    /// Category metrics sorted by released value (desc), then category.
    pub fn category_metrics(&self, thresholds: &DecisionThresholds) -> Vec<CategoryMetrics> {
        let mut out: Vec<CategoryMetrics> = self
            .categories
            .values()
            .map(|b| b.finalize(self.total_released, thresholds))
            .collect();
        out.sort_by(|a, b| {
            b.valor_liberado
                .cmp(&a.valor_liberado)
                .then_with(|| a.produto.cmp(&b.produto))
        });
        out
    }

    /// Regions sorted by total value (desc), then city/state.
    pub fn region_metrics(&self) -> Vec<RegionMetrics> {
        let mut out: Vec<(&RegionKey, RegionMetrics)> = self
            .regions
            .iter()
            .map(|(k, b)| (k, b.finalize(k)))
            .collect();
        out.sort_by(|(ka, a), (kb, b)| b.valor_total.cmp(&a.valor_total).then_with(|| ka.cmp(kb)));
        out.into_iter().map(|(_, m)| m).collect()
    }

    /// Institutions sorted by volume (desc), then name.
    pub fn institution_metrics(&self) -> Vec<InstitutionMetrics> {
        let mut out: Vec<InstitutionMetrics> = self
            .institutions
            .iter()
            .map(|(name, b)| b.finalize(name))
            .collect();
        out.sort_by(|a, b| {
            b.volume
                .cmp(&a.volume)
                .then_with(|| a.instituicao.cmp(&b.instituicao))
        });
        out
    }

    /// Months of the year ordered by volume (desc), then month number.
    pub fn months_by_volume(&self) -> Vec<(u32, Money)> {
        let mut out: Vec<(u32, Money)> = self.month_of_year.iter().map(|(m, v)| (*m, *v)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rec(
        customer: &str,
        category: ProductCategory,
        city: &str,
        released: Decimal,
        date: Option<(i32, u32, u32)>,
    ) -> DisbursementRecord {
        DisbursementRecord {
            id: customer.into(),
            customer_id: customer.into(),
            description: category.label().into(),
            category,
            institution: format!("Inst {city}"),
            city: city.into(),
            state: "SP".into(),
            requested_amount: released,
            released_amount: released,
            financed_amount: released,
            entry_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    fn sample() -> Vec<DisbursementRecord> {
        vec![
            rec("a", ProductCategory::Fgts, "Santos", dec!(1000), Some((2024, 1, 5))),
            rec("a", ProductCategory::CartaoDeCredito, "Santos", dec!(500), Some((2024, 2, 5))),
            rec("b", ProductCategory::Fgts, "Campinas", dec!(2500), Some((2024, 2, 9))),
            rec("c", ProductCategory::Outros, "Campinas", dec!(0), None),
        ]
    }

    #[test]
    fn test_operation_and_value_invariants() {
        let records = sample();
        let agg = aggregate(&records, &DecisionThresholds::default());

        let ops: u64 = agg.categories.values().map(|c| c.operations).sum();
        assert_eq!(ops as usize, records.len());

        let released: Decimal = agg.categories.values().map(|c| c.released).sum();
        let expected: Decimal = records.iter().map(|r| r.released_amount).sum();
        assert_eq!(released, expected);
        assert_eq!(agg.total_released, expected);
    }

    #[test]
    fn test_group_by_keys() {
        let agg = aggregate(&sample(), &DecisionThresholds::default());
        assert_eq!(agg.categories.len(), 3);
        assert_eq!(agg.customers.len(), 3);
        assert_eq!(agg.regions.len(), 2);
        assert_eq!(agg.institutions.len(), 2);
        assert_eq!(agg.customers["a"].diversification(), 2);
        // undated record contributes to totals but to no month
        assert_eq!(agg.market.len(), 2);
        assert_eq!(agg.market[&YearMonth::new(2024, 2)].operations, 2);
    }

    #[test]
    fn test_metrics_sorted_by_value() {
        let t = DecisionThresholds::default();
        let agg = aggregate(&sample(), &t);
        let cats = agg.category_metrics(&t);
        assert_eq!(cats[0].produto, ProductCategory::Fgts);
        assert_eq!(cats[0].valor_liberado, dec!(3500));
        let regions = agg.region_metrics();
        assert_eq!(regions[0].cidade, "Campinas");
        let months = agg.months_by_volume();
        assert_eq!(months[0], (2, dec!(3000)));
    }

    #[test]
    fn test_empty_batch() {
        let agg = aggregate(&[], &DecisionThresholds::default());
        assert_eq!(agg.record_count, 0);
        assert!(agg.categories.is_empty());
        assert!(agg.category_metrics(&DecisionThresholds::default()).is_empty());
        assert_eq!(agg.total_released, Decimal::ZERO);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::analytics::portfolio::growth_potential;
use crate::config::DecisionThresholds;
use crate::records::{DisbursementRecord, ProductCategory};
use crate::types::{Money, Percent, Score, YearMonth};

// ---------------------------------------------------------------------------
// Ratio helpers
// ---------------------------------------------------------------------------

/// `numerator / denominator`, or zero when the denominator is zero.
pub(crate) fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

pub(crate) fn pct(part: Decimal, whole: Decimal) -> Percent {
    safe_div(part, whole) * dec!(100)
}

/// Ticket at `floor(n * percentile / 100)` of an ascending slice; zero for
/// an empty slice.
fn quantile(sorted: &[Money], percentile: usize) -> Money {
    if sorted.is_empty() {
        return Decimal::ZERO;
    }
    let idx = sorted.len() * percentile / 100;
    sorted[idx.min(sorted.len() - 1)]
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CategoryBucket {
    pub category: ProductCategory,
    pub operations: u64,
    pub released: Money,
    pub requested: Money,
    pub financed: Money,
    pub customers: BTreeSet<String>,
    pub premium_customers: BTreeSet<String>,
    pub monthly: BTreeMap<YearMonth, Money>,
    /// Month of year (1-12) -> operation count.
    pub seasonality: BTreeMap<u32, u64>,
    pub tickets: Vec<Money>,
}

impl CategoryBucket {
    pub fn new(category: ProductCategory) -> Self {
        Self {
            category,
            operations: 0,
            released: Decimal::ZERO,
            requested: Decimal::ZERO,
            financed: Decimal::ZERO,
            customers: BTreeSet::new(),
            premium_customers: BTreeSet::new(),
            monthly: BTreeMap::new(),
            seasonality: BTreeMap::new(),
            tickets: Vec::new(),
        }
    }

    pub fn record(&mut self, rec: &DisbursementRecord, thresholds: &DecisionThresholds) {
        self.operations += 1;
        self.released += rec.released_amount;
        self.requested += rec.requested_amount;
        self.financed += rec.financed_amount;
        self.customers.insert(rec.customer_id.clone());
        if rec.released_amount > thresholds.premium_ticket {
            self.premium_customers.insert(rec.customer_id.clone());
        }
        if let Some(ym) = rec.year_month() {
            *self.monthly.entry(ym).or_insert(Decimal::ZERO) += rec.released_amount;
            *self.seasonality.entry(ym.month).or_insert(0) += 1;
        }
        self.tickets.push(rec.released_amount);
    }

    /// Monthly released totals in chronological order.
    pub fn timeline(&self) -> Vec<(YearMonth, Money)> {
        self.monthly.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn active_months(&self) -> usize {
        self.monthly.len()
    }

    /// Compute every derived metric in one place. `total_released` is the
    /// batch-wide released value used for the participation share.
    pub fn finalize(&self, total_released: Money, thresholds: &DecisionThresholds) -> CategoryMetrics {
        let mut sorted = self.tickets.clone();
        sorted.sort();
        let q1 = quantile(&sorted, 25);
        let median = quantile(&sorted, 50);
        let q3 = quantile(&sorted, 75);

        let ops = Decimal::from(self.operations);
        let unique = self.customers.len();
        let premium = self.premium_customers.len();

        let efficiency = if self.operations == 0 {
            Decimal::ZERO
        } else {
            let denominator = if self.requested.is_zero() {
                self.released
            } else {
                self.requested
            };
            pct(self.released, denominator).min(dec!(100))
        };

        let volatility = if sorted.len() > 1 {
            let base = if median.is_zero() { Decimal::ONE } else { median };
            (q3 - q1) / base * dec!(100)
        } else {
            Decimal::ZERO
        };

        // ties resolve to the later month
        let (peak_month, peak_ops) = self
            .seasonality
            .iter()
            .fold((0u32, 0u64), |best, (m, n)| if best.1 > *n { best } else { (*m, *n) });

        CategoryMetrics {
            produto: self.category,
            operacoes: self.operations,
            valor_liberado: self.released,
            valor_solicitado: self.requested,
            valor_financiado: self.financed,
            clientes_unicos: unique,
            clientes_premium: premium,
            ticket_medio: safe_div(self.released, ops),
            ticket_mediano: median,
            ticket_q1: q1,
            ticket_q3: q3,
            eficiencia: efficiency,
            participacao: pct(self.released, total_released),
            concentracao_clientes: pct(Decimal::from(premium as u64), Decimal::from(unique as u64)),
            volatilidade: volatility,
            mes_pico_sazonalidade: peak_month,
            intensidade_sazonal: peak_ops,
            margem_estimada: pct(self.released - self.requested, self.released),
            meses_ativos: self.active_months(),
            potencial_crescimento: growth_potential(
                premium,
                unique,
                self.operations,
                self.active_months(),
                thresholds,
            ),
        }
    }
}

/// Finalized per-category metrics (`analise_produtos` entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub produto: ProductCategory,
    pub operacoes: u64,
    pub valor_liberado: Money,
    pub valor_solicitado: Money,
    pub valor_financiado: Money,
    pub clientes_unicos: usize,
    pub clientes_premium: usize,
    pub ticket_medio: Money,
    pub ticket_mediano: Money,
    pub ticket_q1: Money,
    pub ticket_q3: Money,
    /// Released / requested, capped at 100.
    pub eficiencia: Percent,
    pub participacao: Percent,
    /// Share of the category's customers that are premium.
    pub concentracao_clientes: Percent,
    /// Inter-quartile range relative to the median ticket.
    pub volatilidade: Percent,
    pub mes_pico_sazonalidade: u32,
    pub intensidade_sazonal: u64,
    pub margem_estimada: Percent,
    pub meses_ativos: usize,
    pub potencial_crescimento: Score,
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub categories: BTreeSet<ProductCategory>,
    pub historical_value: Money,
    pub operations: u64,
    pub monthly_operations: BTreeMap<YearMonth, u64>,
    pub institutions: BTreeSet<String>,
}

impl CustomerProfile {
    pub fn new(customer_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            categories: BTreeSet::new(),
            historical_value: Decimal::ZERO,
            operations: 0,
            monthly_operations: BTreeMap::new(),
            institutions: BTreeSet::new(),
        }
    }

    pub fn record(&mut self, rec: &DisbursementRecord) {
        self.categories.insert(rec.category);
        self.historical_value += rec.released_amount;
        self.operations += 1;
        if let Some(ym) = rec.year_month() {
            *self.monthly_operations.entry(ym).or_insert(0) += 1;
        }
        self.institutions.insert(rec.institution.clone());
    }

    pub fn diversification(&self) -> usize {
        self.categories.len()
    }

    pub fn average_ticket(&self) -> Money {
        safe_div(self.historical_value, Decimal::from(self.operations))
    }
}

// ---------------------------------------------------------------------------
// Region / institution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionKey {
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegionBucket {
    pub operations: u64,
    pub total_value: Money,
    pub categories: BTreeSet<ProductCategory>,
}

impl RegionBucket {
    pub fn record(&mut self, rec: &DisbursementRecord) {
        self.operations += 1;
        self.total_value += rec.released_amount;
        self.categories.insert(rec.category);
    }

    pub fn finalize(&self, key: &RegionKey) -> RegionMetrics {
        RegionMetrics {
            cidade: key.city.clone(),
            uf: key.state.clone(),
            operacoes: self.operations,
            valor_total: self.total_value,
            diversificacao: self.categories.len(),
            produtos: self.categories.iter().copied().collect(),
            ticket_medio: safe_div(self.total_value, Decimal::from(self.operations)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    pub cidade: String,
    pub uf: String,
    pub operacoes: u64,
    pub valor_total: Money,
    pub diversificacao: usize,
    pub produtos: Vec<ProductCategory>,
    pub ticket_medio: Money,
}

#[derive(Debug, Clone, Default)]
pub struct InstitutionBucket {
    pub operations: u64,
    pub volume: Money,
    pub customers: BTreeSet<String>,
    pub category_operations: BTreeMap<ProductCategory, u64>,
}

impl InstitutionBucket {
    pub fn record(&mut self, rec: &DisbursementRecord) {
        self.operations += 1;
        self.volume += rec.released_amount;
        self.customers.insert(rec.customer_id.clone());
        *self.category_operations.entry(rec.category).or_insert(0) += 1;
    }

    pub fn finalize(&self, name: &str) -> InstitutionMetrics {
        // first category wins a tie, map order is the category order
        let specialty = self
            .category_operations
            .iter()
            .fold(None::<(ProductCategory, u64)>, |best, (c, n)| match best {
                Some((_, top)) if top >= *n => best,
                _ => Some((*c, *n)),
            })
            .map(|(c, _)| c);
        InstitutionMetrics {
            instituicao: name.to_string(),
            operacoes: self.operations,
            volume: self.volume,
            portfolio: self.category_operations.len(),
            produtos: self.category_operations.keys().copied().collect(),
            volume_medio: safe_div(self.volume, Decimal::from(self.operations)),
            clientes_atendidos: self.customers.len(),
            especializacao: specialty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionMetrics {
    pub instituicao: String,
    pub operacoes: u64,
    pub volume: Money,
    pub portfolio: usize,
    pub produtos: Vec<ProductCategory>,
    pub volume_medio: Money,
    pub clientes_atendidos: usize,
    pub especializacao: Option<ProductCategory>,
}

// ---------------------------------------------------------------------------
// Market-wide monthly bucket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketMonth {
    pub operations: u64,
    pub volume: Money,
}

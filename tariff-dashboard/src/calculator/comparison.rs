use serde::Serialize;
use tariff_client::domain::{CompetitorOffer, Retailer};

use crate::calculator::{
    compute_revenue,
    operations::{BudgetScenario, SiteTotals},
};

/// Offers within this many percent of the village total are not highlighted.
pub const HIGHLIGHT_THRESHOLD_PCT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStanding {
    Dearer,
    Cheaper,
    Similar,
}

impl PriceStanding {
    pub fn of(delta_pct: f64) -> Self {
        if delta_pct > HIGHLIGHT_THRESHOLD_PCT {
            PriceStanding::Dearer
        } else if delta_pct < -HIGHLIGHT_THRESHOLD_PCT {
            PriceStanding::Cheaper
        } else {
            PriceStanding::Similar
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub provider: String,
    pub retailer: Option<Retailer>,
    pub usage_rate_c_per_kwh: f64,
    pub daily_supply_dollars: f64,
    pub usage_cost: f64,
    pub supply_cost: f64,
    pub total_cost: f64,
    pub delta_pct: f64,
    pub standing: PriceStanding,
}

/// What the village's usage and connections would cost under each available
/// retailer, with the village's own current billing as the last row.
pub fn compare_offers(
    site: &SiteTotals,
    village: &BudgetScenario,
    offer: &CompetitorOffer,
    days_in_year: u32,
) -> Vec<ComparisonRow> {
    let village_total = village.total_revenue;

    let mut rows: Vec<ComparisonRow> = offer
        .available()
        .map(|(retailer, rate)| {
            let daily = rate.daily_charge_dollars();
            let revenue = compute_revenue(
                site.metered_kwh(),
                site.nmi_total,
                rate.usage_rate_c_per_kwh,
                daily,
                days_in_year,
            );
            let total = revenue.total();
            let delta_pct = if village_total != 0.0 {
                (total - village_total) / village_total * 100.0
            } else {
                0.0
            };
            ComparisonRow {
                provider: retailer.label().to_string(),
                retailer: Some(retailer),
                usage_rate_c_per_kwh: rate.usage_rate_c_per_kwh,
                daily_supply_dollars: daily,
                usage_cost: revenue.usage,
                supply_cost: revenue.supply,
                total_cost: total,
                delta_pct,
                standing: PriceStanding::of(delta_pct),
            }
        })
        .collect();

    rows.push(ComparisonRow {
        provider: "Village".to_string(),
        retailer: None,
        usage_rate_c_per_kwh: village.rates.usage_rate_c_per_kwh,
        daily_supply_dollars: village.rates.daily_supply_dollars,
        usage_cost: village.usage_revenue,
        supply_cost: village.supply_revenue,
        total_cost: village_total,
        delta_pct: 0.0,
        standing: PriceStanding::Similar,
    });

    rows
}

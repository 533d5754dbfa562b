//! Billing formulas.
//!
//! Everything in this module is a pure function of its arguments. Inputs that
//! are NaN or infinite contribute nothing rather than poisoning a total; the
//! row layer has already coerced missing fields to zero by the time values
//! arrive here.

pub mod comparison;
pub mod fleet;
pub mod operations;
pub mod wholesale;

use serde::Serialize;
use tariff_client::domain::{Area, VillageInput};

use crate::tariff_source::TariffSource;

pub const GST_RATE: f64 = 0.10;
pub const DAYS_IN_YEAR: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BillingParams {
    pub days_in_year: u32,
    pub gst_rate: f64,
}

impl Default for BillingParams {
    fn default() -> Self {
        Self {
            days_in_year: DAYS_IN_YEAR,
            gst_rate: GST_RATE,
        }
    }
}

/// A usage rate (c/kWh) paired with a daily supply charge ($/day).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rates {
    pub usage_rate_c_per_kwh: f64,
    pub daily_supply_dollars: f64,
}

/// Annual revenue ex GST, split into usage and supply components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Revenue {
    pub usage: f64,
    pub supply: f64,
}

impl Revenue {
    pub fn total(&self) -> f64 {
        self.usage + self.supply
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Annual usage and supply revenue for a set of connections.
///
/// `usage = kWh × rate / 100`, `supply = daily $ × NMIs × days`.
pub fn compute_revenue(
    usage_kwh: f64,
    nmi_count: u32,
    usage_rate_c_per_kwh: f64,
    daily_supply_dollars: f64,
    days_in_year: u32,
) -> Revenue {
    let usage = finite_or_zero(usage_kwh) * (finite_or_zero(usage_rate_c_per_kwh) / 100.0);
    let supply =
        finite_or_zero(daily_supply_dollars) * f64::from(nmi_count) * f64::from(days_in_year);
    Revenue { usage, supply }
}

pub fn total_incl_gst(revenue: Revenue, gst_rate: f64) -> f64 {
    revenue.total() * (1.0 + gst_rate)
}

/// Gate-meter usage that no sub-meter billed. Never negative: an excess of
/// sub-metered usage points at a data problem, not a credit.
pub fn unmetered_usage_kwh(
    total_gate_kwh: f64,
    residential_kwh: f64,
    common_metered_kwh: f64,
) -> f64 {
    (total_gate_kwh - (residential_kwh + common_metered_kwh)).max(0.0)
}

/// Site cost not recovered through residential and common billing.
/// Negative when billing over-recovers.
pub fn unbilled_cost(total_site_cost: f64, residential_revenue: f64, common_revenue: f64) -> f64 {
    total_site_cost - (residential_revenue + common_revenue)
}

pub fn cost_per_nmi(cost: f64, nmi_count: u32) -> f64 {
    if nmi_count == 0 {
        0.0
    } else {
        cost / f64::from(nmi_count)
    }
}

pub fn per_day(annual: f64, days_in_year: u32) -> f64 {
    if days_in_year == 0 {
        0.0
    } else {
        annual / f64::from(days_in_year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaBreakdown {
    pub area: Area,
    pub usage_kwh: f64,
    pub nmi_count: u32,
    pub usage_revenue: f64,
    pub supply_revenue: f64,
    pub total_incl_gst: f64,
}

impl AreaBreakdown {
    fn new(
        area: Area,
        usage_kwh: f64,
        nmi_count: u32,
        rates: Rates,
        params: &BillingParams,
    ) -> Self {
        let revenue = compute_revenue(
            usage_kwh,
            nmi_count,
            rates.usage_rate_c_per_kwh,
            rates.daily_supply_dollars,
            params.days_in_year,
        );
        Self {
            area,
            usage_kwh,
            nmi_count,
            usage_revenue: revenue.usage,
            supply_revenue: revenue.supply,
            total_incl_gst: total_incl_gst(revenue, params.gst_rate),
        }
    }
}

/// Revenue and cost breakdown for one village under one tariff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub village_name: String,
    pub tariff: TariffSource,
    pub residential: AreaBreakdown,
    pub common: AreaBreakdown,
    pub unmetered_usage_kwh: f64,
    pub unbilled_cost: f64,
    /// Gate-meter cost not recovered via billing; same formula as `unbilled_cost`.
    pub unrecovered_cost: f64,
    pub cost_per_residential_nmi_annual: f64,
    pub cost_per_residential_nmi_daily: f64,
}

impl Assessment {
    /// `(section, metric, value)` triples in display order.
    pub fn lines(&self) -> Vec<(&'static str, &'static str, f64)> {
        vec![
            ("residential", "usage_revenue", self.residential.usage_revenue),
            ("residential", "supply_revenue", self.residential.supply_revenue),
            ("residential", "total_incl_gst", self.residential.total_incl_gst),
            ("common", "usage_revenue", self.common.usage_revenue),
            ("common", "supply_revenue", self.common.supply_revenue),
            ("common", "total_incl_gst", self.common.total_incl_gst),
            ("unmetered", "usage_kwh", self.unmetered_usage_kwh),
            ("unmetered", "unbilled_cost", self.unbilled_cost),
            ("allocation", "cost_per_residential_nmi_annual", self.cost_per_residential_nmi_annual),
            ("allocation", "cost_per_residential_nmi_daily", self.cost_per_residential_nmi_daily),
            ("gate_meter", "unrecovered_cost", self.unrecovered_cost),
        ]
    }
}

pub fn assess(village: &VillageInput, tariff: &TariffSource, params: &BillingParams) -> Assessment {
    let rates = tariff.rates();
    let residential = AreaBreakdown::new(
        Area::Residential,
        village.residential_billed_kwh,
        village.nmis_res,
        rates,
        params,
    );
    let common = AreaBreakdown::new(
        Area::Common,
        village.common_metered_kwh,
        village.nmis_common,
        rates,
        params,
    );

    let unbilled = unbilled_cost(
        village.total_cost,
        residential.total_incl_gst,
        common.total_incl_gst,
    );
    let per_nmi = cost_per_nmi(unbilled, village.nmis_res);

    Assessment {
        village_name: village.village_name.clone(),
        tariff: *tariff,
        unmetered_usage_kwh: unmetered_usage_kwh(
            village.total_usage_kwh,
            village.residential_billed_kwh,
            village.common_metered_kwh,
        ),
        unbilled_cost: unbilled,
        unrecovered_cost: unbilled,
        cost_per_residential_nmi_annual: per_nmi,
        cost_per_residential_nmi_daily: per_day(per_nmi, params.days_in_year),
        residential,
        common,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn usage_revenue_example() {
        let r = compute_revenue(1000.0, 0, 20.0, 0.0, DAYS_IN_YEAR);
        assert!(approx(r.usage, 200.0));
        assert_eq!(r.supply, 0.0);
    }

    #[test]
    fn supply_revenue_example() {
        let r = compute_revenue(0.0, 50, 0.0, 1.0, 365);
        assert!(approx(r.supply, 18_250.0));
    }

    #[test]
    fn revenue_is_linear_in_each_input() {
        let base = compute_revenue(1200.0, 40, 22.0, 1.1, 365);
        let double_kwh = compute_revenue(2400.0, 40, 22.0, 1.1, 365);
        let double_rate = compute_revenue(1200.0, 40, 44.0, 1.1, 365);
        let double_nmi = compute_revenue(1200.0, 80, 22.0, 1.1, 365);
        let double_daily = compute_revenue(1200.0, 40, 22.0, 2.2, 365);

        assert!(approx(double_kwh.usage, 2.0 * base.usage));
        assert!(approx(double_rate.usage, 2.0 * base.usage));
        assert!(approx(double_nmi.supply, 2.0 * base.supply));
        assert!(approx(double_daily.supply, 2.0 * base.supply));
        assert_eq!(double_kwh.supply, base.supply);
        assert_eq!(double_nmi.usage, base.usage);
    }

    #[test]
    fn revenue_is_non_negative_for_non_negative_inputs() {
        for kwh in [0.0, 0.5, 10.0, 1e7] {
            for nmi in [0, 1, 250] {
                for rate in [0.0, 19.99, 100.0] {
                    for daily in [0.0, 0.0001, 5.0] {
                        let r = compute_revenue(kwh, nmi, rate, daily, 365);
                        assert!(r.usage >= 0.0 && r.supply >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn revenue_is_deterministic() {
        let a = compute_revenue(1234.567, 33, 27.0, 1.1, 365);
        let b = compute_revenue(1234.567, 33, 27.0, 1.1, 365);
        assert_eq!(a.usage.to_bits(), b.usage.to_bits());
        assert_eq!(a.supply.to_bits(), b.supply.to_bits());
    }

    #[test]
    fn non_finite_inputs_contribute_nothing() {
        let r = compute_revenue(f64::NAN, 10, f64::INFINITY, f64::NAN, 365);
        assert_eq!(r, Revenue::default());
    }

    #[test]
    fn gst_is_added_on_top() {
        let r = Revenue {
            usage: 100.0,
            supply: 50.0,
        };
        assert!(approx(total_incl_gst(r, GST_RATE), 165.0));
    }

    #[test]
    fn unmetered_usage_example_and_floor() {
        assert!(approx(unmetered_usage_kwh(10_000.0, 6000.0, 3000.0), 1000.0));
        assert_eq!(unmetered_usage_kwh(5000.0, 6000.0, 3000.0), 0.0);
        assert_eq!(unmetered_usage_kwh(-100.0, -50.0, 20.0), 0.0);
        assert_eq!(unmetered_usage_kwh(f64::NAN, 1.0, 1.0), 0.0);
    }

    #[test]
    fn unbilled_cost_and_allocation_example() {
        let unbilled = unbilled_cost(50_000.0, 30_000.0, 15_000.0);
        assert!(approx(unbilled, 5000.0));

        let per_nmi = cost_per_nmi(unbilled, 100);
        assert!(approx(per_nmi, 50.0));
        assert!((per_day(per_nmi, 365) - 0.137).abs() < 1e-3);
    }

    #[test]
    fn unbilled_cost_may_be_negative() {
        assert!(approx(unbilled_cost(10_000.0, 9000.0, 4000.0), -3000.0));
    }

    #[test]
    fn zero_nmis_allocate_nothing() {
        assert_eq!(cost_per_nmi(5000.0, 0), 0.0);
        assert_eq!(per_day(0.0, 365), 0.0);
    }

    #[test]
    fn assess_combines_both_areas() {
        let village = VillageInput {
            village_name: "Classic Res".to_string(),
            total_usage_kwh: 10_000.0,
            residential_billed_kwh: 6000.0,
            common_metered_kwh: 3000.0,
            nmis_res: 100,
            nmis_common: 2,
            total_cost: 100_000.0,
            quarters: Default::default(),
            proposed_usage_c_per_kwh: None,
            proposed_daily_c: None,
        };
        let tariff = TariffSource::Manual {
            usage_rate_c_per_kwh: 20.0,
            daily_supply_dollars: 1.0,
        };

        let a = assess(&village, &tariff, &BillingParams::default());

        assert!(approx(a.residential.usage_revenue, 1200.0));
        assert!(approx(a.residential.supply_revenue, 36_500.0));
        assert!(approx(a.residential.total_incl_gst, (1200.0 + 36_500.0) * 1.1));
        assert!(approx(a.common.usage_revenue, 600.0));
        assert!(approx(a.common.supply_revenue, 730.0));
        assert!(approx(a.unmetered_usage_kwh, 1000.0));

        let expected_unbilled = 100_000.0 - (37_700.0 * 1.1 + 1330.0 * 1.1);
        assert!(approx(a.unbilled_cost, expected_unbilled));
        assert_eq!(a.unbilled_cost, a.unrecovered_cost);
        assert!(approx(a.cost_per_residential_nmi_annual, expected_unbilled / 100.0));
        assert_eq!(a.lines().len(), 11);
    }
}

use tariff_client::domain::{Tariff, VillageInput};

use crate::calculator::{operations::SiteTotals, Rates};

/// Sum every village into one site. The gate-meter total falls back to the
/// metered quarterly usage only when the whole fleet reports no gate reading.
pub fn aggregate(villages: &[VillageInput]) -> SiteTotals {
    let mut totals = SiteTotals::default();
    for v in villages {
        let q = v.quarterly_totals();
        totals.residential_kwh += q.usage_res_kwh;
        totals.common_kwh += q.usage_common_kwh;
        totals.residential_supply += q.supply_res;
        totals.common_supply += q.supply_common;
        totals.site_kwh += v.total_usage_kwh;
        totals.nmi_total = totals.nmi_total.saturating_add(v.nmi_total());
        totals.total_cost += v.total_cost;
    }
    if totals.site_kwh == 0.0 {
        totals.site_kwh = totals.metered_kwh();
    }
    totals
}

/// Mean of every complete stored tariff, `None` when there are none.
pub fn average_rates(tariffs: &[Tariff]) -> Option<Rates> {
    let complete: Vec<(f64, f64)> = tariffs.iter().filter_map(Tariff::rates).collect();
    if complete.is_empty() {
        return None;
    }
    let n = complete.len() as f64;
    let (usage, daily) = complete
        .iter()
        .fold((0.0_f64, 0.0_f64), |(u, d), &(cu, cd)| (u + cu, d + cd));
    Some(Rates {
        usage_rate_c_per_kwh: usage / n,
        daily_supply_dollars: daily / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_client::domain::Row;

    fn village(name: &str, gate: f64, res_q1: f64, nmis: i64, cost: f64) -> VillageInput {
        VillageInput::from_row(
            &Row::new()
                .with("village_name", name)
                .with("total_usage_kwh", gate)
                .with("q1_usage_res", res_q1)
                .with("q2_usage_common", 100.0)
                .with("q1_supply_res", 50.0)
                .with("nmis_res", nmis)
                .with("nmis_common", 1)
                .with("total_cost", cost),
        )
        .unwrap()
    }

    #[test]
    fn aggregates_all_villages() {
        let totals = aggregate(&[
            village("A", 5000.0, 1000.0, 10, 20_000.0),
            village("B", 0.0, 2000.0, 20, 30_000.0),
        ]);
        assert_eq!(totals.residential_kwh, 3000.0);
        assert_eq!(totals.common_kwh, 200.0);
        assert_eq!(totals.residential_supply, 100.0);
        assert_eq!(totals.site_kwh, 5000.0);
        assert_eq!(totals.nmi_total, 32);
        assert_eq!(totals.total_cost, 50_000.0);
    }

    #[test]
    fn site_usage_falls_back_when_no_gate_readings() {
        let totals = aggregate(&[village("A", 0.0, 1000.0, 1, 0.0)]);
        assert_eq!(totals.site_kwh, 1100.0);
    }

    #[test]
    fn averages_only_complete_tariffs() {
        let tariffs = [
            Tariff::from_row(&Row::new().with("_usage", 20.0).with("_supply", 100.0)),
            Tariff::from_row(&Row::new().with("_usage", 30.0).with("_supply", 120.0)),
            Tariff::from_row(&Row::new().with("_usage", 99.0)),
        ];
        let rates = average_rates(&tariffs).unwrap();
        assert!((rates.usage_rate_c_per_kwh - 25.0).abs() < 1e-12);
        assert!((rates.daily_supply_dollars - 1.1).abs() < 1e-12);
    }

    #[test]
    fn no_complete_tariffs_is_none() {
        assert!(average_rates(&[]).is_none());
    }
}

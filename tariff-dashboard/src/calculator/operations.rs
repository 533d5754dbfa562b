//! Village operation budget: what the quarterly billing recovers against the
//! site's energy bill and fixed charges, now and under simulated rates.

use serde::Serialize;
use tariff_client::domain::VillageInput;

use crate::calculator::{compute_revenue, Rates};

pub const SERVICE_FEE_ANNUAL: f64 = 56_880.0;
pub const PLATFORM_COSTS_ANNUAL: f64 = 54_360.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedCharges {
    pub service_fee_annual: f64,
    pub platform_costs_annual: f64,
    pub include_service_fee: bool,
}

impl Default for FixedCharges {
    fn default() -> Self {
        Self {
            service_fee_annual: SERVICE_FEE_ANNUAL,
            platform_costs_annual: PLATFORM_COSTS_ANNUAL,
            include_service_fee: true,
        }
    }
}

impl FixedCharges {
    pub fn applied_service_fee(&self) -> f64 {
        if self.include_service_fee {
            self.service_fee_annual
        } else {
            0.0
        }
    }
}

/// Billing quantities for one village or the fleet aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SiteTotals {
    /// Sum of quarterly residential usage.
    pub residential_kwh: f64,
    pub common_kwh: f64,
    /// Sum of quarterly residential supply dollars.
    pub residential_supply: f64,
    pub common_supply: f64,
    pub site_kwh: f64,
    pub nmi_total: u32,
    pub total_cost: f64,
}

impl SiteTotals {
    pub fn from_village(village: &VillageInput) -> Self {
        let q = village.quarterly_totals();
        Self {
            residential_kwh: q.usage_res_kwh,
            common_kwh: q.usage_common_kwh,
            residential_supply: q.supply_res,
            common_supply: q.supply_common,
            site_kwh: village.site_usage_kwh(),
            nmi_total: village.nmi_total(),
            total_cost: village.total_cost,
        }
    }

    pub fn metered_kwh(&self) -> f64 {
        self.residential_kwh + self.common_kwh
    }

    pub fn supply(&self) -> f64 {
        self.residential_supply + self.common_supply
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetScenario {
    pub total_cost: f64,
    pub platform_costs: f64,
    pub usage_revenue: f64,
    pub supply_revenue: f64,
    pub service_fee: f64,
    pub total_revenue: f64,
    /// Cost left for the village to fund once billing has been recovered.
    pub opex_budget: f64,
    pub rates: Rates,
}

impl BudgetScenario {
    fn new(
        site: &SiteTotals,
        platform_costs: f64,
        usage: f64,
        supply: f64,
        fee: f64,
        rates: Rates,
    ) -> Self {
        let total_revenue = usage + supply + fee;
        Self {
            total_cost: site.total_cost,
            platform_costs,
            usage_revenue: usage,
            supply_revenue: supply,
            service_fee: fee,
            total_revenue,
            opex_budget: site.total_cost + platform_costs - total_revenue,
            rates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Cost,
    Revenue,
    Budget,
    UsageRate,
    DailyRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub label: &'static str,
    pub current: f64,
    pub simulated: f64,
    pub note: &'static str,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallStep {
    pub label: &'static str,
    pub value: f64,
    /// Running total before this step.
    pub base: f64,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatingBudget {
    pub current: BudgetScenario,
    pub simulated: BudgetScenario,
    pub include_service_fee: bool,
}

/// Current billing uses the stored rate on quarterly usage plus the supply
/// dollars actually billed; the simulation prices every NMI at the simulated
/// daily charge. The service fee moves in proportion to the usage rate, which
/// is an approximation rather than a market price.
pub fn operating_budget(
    site: &SiteTotals,
    current_rates: Rates,
    simulated_rates: Rates,
    fixed: &FixedCharges,
    days_in_year: u32,
) -> OperatingBudget {
    let fee = fixed.applied_service_fee();

    let current_usage = compute_revenue(
        site.metered_kwh(),
        0,
        current_rates.usage_rate_c_per_kwh,
        0.0,
        days_in_year,
    )
    .usage;
    let current = BudgetScenario::new(
        site,
        fixed.platform_costs_annual,
        current_usage,
        site.supply(),
        fee,
        current_rates,
    );

    let sim = compute_revenue(
        site.metered_kwh(),
        site.nmi_total,
        simulated_rates.usage_rate_c_per_kwh,
        simulated_rates.daily_supply_dollars,
        days_in_year,
    );
    let ratio = if current_rates.usage_rate_c_per_kwh != 0.0 {
        simulated_rates.usage_rate_c_per_kwh / current_rates.usage_rate_c_per_kwh
    } else {
        1.0
    };
    let simulated = BudgetScenario::new(
        site,
        fixed.platform_costs_annual,
        sim.usage,
        sim.supply,
        fee * ratio,
        simulated_rates,
    );

    OperatingBudget {
        current,
        simulated,
        include_service_fee: fixed.include_service_fee,
    }
}

impl OperatingBudget {
    pub fn lines(&self) -> Vec<BudgetLine> {
        let (c, s) = (&self.current, &self.simulated);
        let mut lines = vec![
            BudgetLine {
                label: "Total Cost",
                current: c.total_cost,
                simulated: s.total_cost,
                note: "Input from invoices",
                kind: LineKind::Cost,
            },
            BudgetLine {
                label: "Platform Costs",
                current: c.platform_costs,
                simulated: s.platform_costs,
                note: "Fixed platform cost",
                kind: LineKind::Cost,
            },
            BudgetLine {
                label: "Usage Revenue",
                current: c.usage_revenue,
                simulated: s.usage_revenue,
                note: "Total Usage × Usage Rate",
                kind: LineKind::Revenue,
            },
            BudgetLine {
                label: "Supply Revenue",
                current: c.supply_revenue,
                simulated: s.supply_revenue,
                note: "NMI × Daily Supply × 365",
                kind: LineKind::Revenue,
            },
        ];

        if self.include_service_fee {
            lines.push(BudgetLine {
                label: "Service Fee",
                current: c.service_fee,
                simulated: s.service_fee,
                note: "Fixed annual amount, scaled with the usage rate when simulated",
                kind: LineKind::Revenue,
            });
        }

        let (revenue_note, opex_note) = if self.include_service_fee {
            (
                "Usage + Supply + Service Fee",
                "Total Cost + Platform − (Usage + Supply + Service Fee)",
            )
        } else {
            ("Usage + Supply", "Total Cost + Platform − (Usage + Supply)")
        };

        lines.extend([
            BudgetLine {
                label: "Total Revenue",
                current: c.total_revenue,
                simulated: s.total_revenue,
                note: revenue_note,
                kind: LineKind::Revenue,
            },
            BudgetLine {
                label: "OPEX Budget",
                current: c.opex_budget,
                simulated: s.opex_budget,
                note: opex_note,
                kind: LineKind::Budget,
            },
            BudgetLine {
                label: "Usage Rate (c/kWh)",
                current: c.rates.usage_rate_c_per_kwh,
                simulated: s.rates.usage_rate_c_per_kwh,
                note: "Current tariff",
                kind: LineKind::UsageRate,
            },
            BudgetLine {
                label: "Daily Supply ($/day)",
                current: c.rates.daily_supply_dollars,
                simulated: s.rates.daily_supply_dollars,
                note: "Current tariff",
                kind: LineKind::DailyRate,
            },
        ]);

        lines
    }

    /// Bars for the cost waterfall of the current scenario. Costs are
    /// negative; each bar starts where the previous one ended.
    pub fn waterfall(&self) -> Vec<WaterfallStep> {
        let c = &self.current;
        let mut raw = vec![
            ("Total Cost", -c.total_cost, LineKind::Cost),
            ("Platform Costs", -c.platform_costs, LineKind::Cost),
            ("Usage Revenue", c.usage_revenue, LineKind::Revenue),
            ("Supply Revenue", c.supply_revenue, LineKind::Revenue),
        ];
        if self.include_service_fee {
            raw.push(("Service Fee", c.service_fee, LineKind::Revenue));
        }
        raw.push(("OPEX Budget", c.opex_budget, LineKind::Budget));

        let mut base = 0.0;
        raw.into_iter()
            .map(|(label, value, kind)| {
                let step = WaterfallStep {
                    label,
                    value,
                    base,
                    kind,
                };
                base += value;
                step
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageShare {
    pub label: &'static str,
    pub kwh: f64,
    pub percent: f64,
}

/// Split of site usage into metered residential, other metered usage and the
/// kWh-equivalent of the service fee at the current usage rate.
pub fn usage_share(
    site: &SiteTotals,
    current_rates: Rates,
    fixed: &FixedCharges,
) -> Vec<UsageShare> {
    let mut slices = vec![
        ("Metered Residential", site.residential_kwh.max(0.0)),
        ("Metered Village", (site.site_kwh - site.residential_kwh).max(0.0)),
    ];
    if fixed.include_service_fee {
        let fee_kwh = if current_rates.usage_rate_c_per_kwh != 0.0 {
            fixed.service_fee_annual / (current_rates.usage_rate_c_per_kwh / 100.0)
        } else {
            0.0
        };
        slices.push(("Service Fee", fee_kwh.max(0.0)));
    }

    let total: f64 = slices.iter().map(|(_, kwh)| kwh).sum();
    slices
        .into_iter()
        .map(|(label, kwh)| UsageShare {
            label,
            kwh,
            percent: if total > 0.0 { kwh / total * 100.0 } else { 0.0 },
        })
        .collect()
}

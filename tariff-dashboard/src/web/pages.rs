//! Page models. Every value is formatted here so the templates only lay
//! strings out.

use askama::Template;

use crate::{
    calculator::{
        comparison::{ComparisonRow, PriceStanding},
        operations::{BudgetLine, LineKind, OperatingBudget, UsageShare},
        wholesale::WholesaleTrend,
        AreaBreakdown, Rates,
    },
    config::DashboardSettings,
    format,
    pipeline::{FleetReport, VillageEntry, VillageReport},
    tariff_source::{TariffMode, TariffSource},
};

pub fn village_href(name: &str) -> String {
    format!("/villages/{}", urlencoding::encode(name))
}

#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct BudgetRow {
    pub label: &'static str,
    pub current: String,
    pub simulated: String,
    pub note: &'static str,
    pub class: &'static str,
}

#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub provider: String,
    pub usage_rate: String,
    pub daily_supply: String,
    pub usage_cost: String,
    pub supply_cost: String,
    pub total_cost: String,
    pub delta: String,
    pub class: &'static str,
}

#[derive(Debug, Clone)]
pub struct ShareRow {
    pub label: &'static str,
    pub kwh: String,
    pub percent: String,
}

#[derive(Debug, Clone)]
pub struct VillageLink {
    pub display_name: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct StateLink {
    pub state: String,
    pub href: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct LatestPrice {
    pub state: String,
    pub period: String,
    pub value: String,
}

fn budget_value(kind: LineKind, value: f64) -> String {
    match kind {
        LineKind::UsageRate => format::usage_rate(value),
        LineKind::DailyRate => format::daily_rate(value),
        _ => format::money(value),
    }
}

fn budget_rows(budget: &OperatingBudget) -> Vec<BudgetRow> {
    budget
        .lines()
        .into_iter()
        .map(|BudgetLine { label, current, simulated, note, kind }| BudgetRow {
            label,
            current: budget_value(kind, current),
            simulated: budget_value(kind, simulated),
            note,
            class: match kind {
                LineKind::Cost => "cost",
                LineKind::Revenue => "revenue",
                LineKind::Budget => "budget",
                LineKind::UsageRate | LineKind::DailyRate => "rate",
            },
        })
        .collect()
}

fn share_rows(shares: &[UsageShare]) -> Vec<ShareRow> {
    shares
        .iter()
        .map(|s| ShareRow {
            label: s.label,
            kwh: format::kwh(s.kwh),
            percent: format::percent(s.percent),
        })
        .collect()
}

fn comparison_views(rows: &[ComparisonRow]) -> Vec<ComparisonView> {
    rows.iter()
        .map(|r| ComparisonView {
            provider: r.provider.clone(),
            usage_rate: format::usage_rate(r.usage_rate_c_per_kwh),
            daily_supply: format::daily_rate(r.daily_supply_dollars),
            usage_cost: format::money(r.usage_cost),
            supply_cost: format::money(r.supply_cost),
            total_cost: format::money(r.total_cost),
            delta: format::delta_pct(r.delta_pct),
            class: match (r.retailer, r.standing) {
                (None, _) => "village",
                (_, PriceStanding::Dearer) => "dearer",
                (_, PriceStanding::Cheaper) => "cheaper",
                (_, PriceStanding::Similar) => "",
            },
        })
        .collect()
}

fn area_metrics(area: &AreaBreakdown) -> Vec<Metric> {
    vec![
        Metric {
            label: "Metered usage",
            value: format::kwh(area.usage_kwh),
        },
        Metric {
            label: "NMIs",
            value: area.nmi_count.to_string(),
        },
        Metric {
            label: "Usage revenue",
            value: format::money(area.usage_revenue),
        },
        Metric {
            label: "Supply revenue",
            value: format::money(area.supply_revenue),
        },
        Metric {
            label: "Total incl. GST",
            value: format::money(area.total_incl_gst),
        },
    ]
}

fn fee_options(include: bool) -> Vec<OptionView> {
    [(true, "Include service fee"), (false, "Exclude service fee")]
        .into_iter()
        .map(|(value, label)| OptionView {
            value: value.to_string(),
            label: label.to_string(),
            selected: value == include,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub title: String,
    pub villages: Vec<VillageLink>,
}

impl IndexPage {
    pub fn new(settings: &DashboardSettings, entries: Vec<VillageEntry>) -> Self {
        Self {
            title: settings.display.title.clone(),
            villages: entries
                .into_iter()
                .map(|e| VillageLink {
                    href: village_href(&e.name),
                    display_name: e.display_name,
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "village.html")]
pub struct VillagePage {
    pub title: String,
    pub display_name: String,
    pub tariff_label: String,
    pub warnings: Vec<String>,
    pub consultant_note: Option<String>,
    pub form_action: String,
    pub mode_options: Vec<OptionView>,
    pub retailer_options: Vec<OptionView>,
    pub usage_rate: String,
    pub daily_supply: String,
    pub sim_usage_rate: String,
    pub sim_daily_supply: String,
    pub fee_options: Vec<OptionView>,
    pub residential: Vec<Metric>,
    pub common: Vec<Metric>,
    pub gate: Vec<Metric>,
    pub budget: Vec<BudgetRow>,
    pub shares: Vec<ShareRow>,
    pub comparison: Vec<ComparisonView>,
    pub comparison_href: Option<String>,
    pub waterfall_svg: String,
    pub waterfall_href: String,
    pub api_href: String,
    pub generated_at: String,
}

impl VillagePage {
    pub fn new(
        settings: &DashboardSettings,
        report: &VillageReport,
        query_string: &str,
        waterfall_svg: String,
    ) -> Self {
        let a = &report.assessment;
        let base = village_href(&report.village.village_name);
        let selected_retailer = a.tariff.retailer();

        // The manual inputs show what was used, or the village's proposal when
        // another mode is active.
        let manual_rates = match a.tariff {
            TariffSource::Manual { .. } => a.tariff.rates(),
            _ => Rates {
                usage_rate_c_per_kwh: report.village.proposed_usage_rate(),
                daily_supply_dollars: report.village.proposed_daily_dollars(),
            },
        };

        Self {
            title: format!("{} | {}", report.display_name, settings.display.title),
            display_name: report.display_name.clone(),
            tariff_label: a.tariff.to_string(),
            warnings: report.warnings.clone(),
            consultant_note: report.consultant_note.clone(),
            form_action: base.clone(),
            mode_options: TariffMode::ALL
                .into_iter()
                .map(|m| OptionView {
                    value: m.key().to_string(),
                    label: m.label().to_string(),
                    selected: m == a.tariff.mode(),
                })
                .collect(),
            retailer_options: report
                .available_retailers
                .iter()
                .map(|r| OptionView {
                    value: r.key().to_string(),
                    label: r.label().to_string(),
                    selected: Some(*r) == selected_retailer,
                })
                .collect(),
            usage_rate: format::usage_rate(manual_rates.usage_rate_c_per_kwh),
            daily_supply: format::daily_rate(manual_rates.daily_supply_dollars),
            sim_usage_rate: format::usage_rate(report.simulation_rates.usage_rate_c_per_kwh),
            sim_daily_supply: format::daily_rate(report.simulation_rates.daily_supply_dollars),
            fee_options: fee_options(report.budget.include_service_fee),
            residential: area_metrics(&a.residential),
            common: area_metrics(&a.common),
            gate: vec![
                Metric {
                    label: "Unmetered usage",
                    value: format::kwh(a.unmetered_usage_kwh),
                },
                Metric {
                    label: "Unbilled cost",
                    value: format::money(a.unbilled_cost),
                },
                Metric {
                    label: "Unrecovered gate meter cost",
                    value: format::money(a.unrecovered_cost),
                },
                Metric {
                    label: "Cost per residential NMI (annual)",
                    value: format::money_cents(a.cost_per_residential_nmi_annual),
                },
                Metric {
                    label: "Cost per residential NMI (daily)",
                    value: format::money_cents(a.cost_per_residential_nmi_daily),
                },
            ],
            budget: budget_rows(&report.budget),
            shares: share_rows(&report.usage_share),
            comparison: report
                .comparison
                .as_deref()
                .map(comparison_views)
                .unwrap_or_default(),
            comparison_href: report
                .comparison
                .as_ref()
                .map(|_| format!("{base}/comparison.csv{query_string}")),
            waterfall_svg,
            waterfall_href: format!("{base}/waterfall.svg{query_string}"),
            api_href: format!(
                "/api/villages/{}/assessment{query_string}",
                urlencoding::encode(&report.village.village_name)
            ),
            generated_at: report.generated_at.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "summary.html")]
pub struct SummaryPage {
    pub title: String,
    pub village_count: usize,
    pub warnings: Vec<String>,
    pub current_rates: String,
    pub sim_usage_rate: String,
    pub sim_daily_supply: String,
    pub fee_options: Vec<OptionView>,
    pub budget: Vec<BudgetRow>,
    pub shares: Vec<ShareRow>,
    pub waterfall_svg: String,
    pub generated_at: String,
}

impl SummaryPage {
    pub fn new(settings: &DashboardSettings, report: &FleetReport, waterfall_svg: String) -> Self {
        Self {
            title: format!("Summary | {}", settings.display.title),
            village_count: report.village_count,
            warnings: report.warnings.clone(),
            current_rates: format!(
                "{} c/kWh, ${}/day",
                format::usage_rate(report.current_rates.usage_rate_c_per_kwh),
                format::daily_rate(report.current_rates.daily_supply_dollars)
            ),
            sim_usage_rate: format::usage_rate(report.simulation_rates.usage_rate_c_per_kwh),
            sim_daily_supply: format::daily_rate(report.simulation_rates.daily_supply_dollars),
            fee_options: fee_options(report.budget.include_service_fee),
            budget: budget_rows(&report.budget),
            shares: share_rows(&report.usage_share),
            waterfall_svg,
            generated_at: report.generated_at.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "wholesale.html")]
pub struct WholesalePage {
    pub title: String,
    pub states: Vec<StateLink>,
    pub selected: String,
    pub latest: Vec<LatestPrice>,
    pub chart_svg: String,
    pub chart_href: String,
}

impl WholesalePage {
    pub fn new(
        settings: &DashboardSettings,
        trend: &WholesaleTrend,
        selected: &[String],
        chart_svg: String,
    ) -> Self {
        let joined = selected.join(",");
        let suffix = if joined.is_empty() {
            String::new()
        } else {
            format!("?states={}", urlencoding::encode(&joined))
        };
        Self {
            title: format!("Wholesale prices | {}", settings.display.title),
            states: trend
                .all_states
                .iter()
                .map(|s| StateLink {
                    href: format!("/wholesale?states={}", urlencoding::encode(s)),
                    selected: selected.iter().any(|x| x.eq_ignore_ascii_case(s)),
                    state: s.clone(),
                })
                .collect(),
            selected: joined,
            latest: trend
                .series
                .iter()
                .filter_map(|series| {
                    let last = series.points.iter().rev().find(|p| p.display_c_per_kwh.is_some())?;
                    Some(LatestPrice {
                        state: series.state.clone(),
                        period: last.period.clone(),
                        value: format::usage_rate(last.display_c_per_kwh.unwrap_or_default()),
                    })
                })
                .collect(),
            chart_svg,
            chart_href: format!("/charts/wholesale.svg{suffix}"),
        }
    }
}

//! Render passes: fetch the rows a view needs, run the calculator, and hand
//! back everything the presentation layer formats. One pass per request.

use std::time::Instant;

use serde::Serialize;
use tariff_client::{
    db::{village_queries, TableReader},
    domain::{Retailer, VillageInput},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    calculator::{
        assess,
        comparison::{compare_offers, ComparisonRow},
        fleet,
        operations::{operating_budget, usage_share, OperatingBudget, SiteTotals, UsageShare},
        wholesale::{build_trend, WholesaleTrend},
        Assessment, Rates,
    },
    config::DashboardSettings,
    error::DashboardError,
    tariff_source::{clamp_rates, current_rates, resolve, TariffSelection},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VillageRequest {
    pub village: String,
    pub selection: TariffSelection,
    /// Overrides the configured simulation rates.
    pub simulation: Option<Rates>,
    /// Overrides the configured service-fee toggle.
    pub include_service_fee: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VillageReport {
    pub village: VillageInput,
    pub display_name: String,
    pub consultant_note: Option<String>,
    pub assessment: Assessment,
    pub current_rates: Rates,
    pub simulation_rates: Rates,
    pub site: SiteTotals,
    pub budget: OperatingBudget,
    pub usage_share: Vec<UsageShare>,
    /// Present only when the village has a stored tariff and a usable offer.
    pub comparison: Option<Vec<ComparisonRow>>,
    pub available_retailers: Vec<Retailer>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetRequest {
    pub simulation: Option<Rates>,
    pub include_service_fee: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub village_count: usize,
    pub site: SiteTotals,
    pub current_rates: Rates,
    pub simulation_rates: Rates,
    pub budget: OperatingBudget,
    pub usage_share: Vec<UsageShare>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VillageEntry {
    pub name: String,
    pub display_name: String,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

fn record_pass(view: &'static str, started: Instant) {
    metrics::counter!("dashboard_render_passes_total", "view" => view).increment(1);
    metrics::histogram!("dashboard_render_pass_seconds", "view" => view)
        .record(started.elapsed().as_secs_f64());
}

pub async fn village_index<R>(
    reader: &R,
    settings: &DashboardSettings,
) -> Result<Vec<VillageEntry>, DashboardError>
where
    R: TableReader + ?Sized,
{
    let names = village_queries::village_names(reader).await?;
    Ok(names
        .into_iter()
        .map(|name| VillageEntry {
            display_name: settings.display.display_name(&name).to_string(),
            name,
        })
        .collect())
}

pub async fn village_report<R>(
    reader: &R,
    settings: &DashboardSettings,
    request: &VillageRequest,
) -> Result<VillageReport, DashboardError>
where
    R: TableReader + ?Sized,
{
    let started = Instant::now();
    let name = request.village.trim();

    let Some(village) = village_queries::village_input(reader, name).await? else {
        metrics::counter!("dashboard_village_not_found_total").increment(1);
        return Err(DashboardError::VillageNotFound(name.to_string()));
    };
    let offer = village_queries::competitor_offer(reader, name).await?;
    let tariff = village_queries::village_tariff(reader, name).await?;

    let billing = &settings.billing;
    let params = billing.params();
    let simulation = clamp_rates(request.simulation.unwrap_or_else(|| billing.simulation_rates()));

    let resolution = resolve(&request.selection, &village, offer.as_ref(), simulation);
    let mut warnings = resolution.warnings;
    let assessment = assess(&village, &resolution.source, &params);

    let (current, missing_tariff) = current_rates(name, tariff.as_ref(), simulation);
    warnings.extend(missing_tariff);

    let site = SiteTotals::from_village(&village);
    let fixed = billing.fixed_charges(request.include_service_fee);
    let budget = operating_budget(&site, current, simulation, &fixed, params.days_in_year);
    let usage_share = usage_share(&site, current, &fixed);

    let has_stored_tariff = tariff.as_ref().is_some_and(|t| t.is_complete());
    let comparison = offer
        .as_ref()
        .filter(|o| has_stored_tariff && o.has_available())
        .map(|o| compare_offers(&site, &budget.current, o, params.days_in_year));
    let available_retailers = offer
        .as_ref()
        .map(|o| o.available().map(|(r, _)| r).collect())
        .unwrap_or_default();

    record_pass("village", started);
    tracing::info!(
        village = %village.village_name,
        tariff = %resolution.source,
        warnings = warnings.len(),
        "village pass complete"
    );

    Ok(VillageReport {
        display_name: settings.display.display_name(&village.village_name).to_string(),
        consultant_note: settings
            .display
            .consultant_note(&village.village_name)
            .map(str::to_string),
        village,
        assessment,
        current_rates: current,
        simulation_rates: simulation,
        site,
        budget,
        usage_share,
        comparison,
        available_retailers,
        warnings,
        generated_at: now_rfc3339(),
    })
}

/// The operation budget of every village taken together.
pub async fn fleet_report<R>(
    reader: &R,
    settings: &DashboardSettings,
    request: &FleetRequest,
) -> Result<FleetReport, DashboardError>
where
    R: TableReader + ?Sized,
{
    let started = Instant::now();
    let villages = village_queries::all_village_inputs(reader).await?;
    let tariffs = village_queries::all_tariffs(reader).await?;

    let billing = &settings.billing;
    let simulation = clamp_rates(request.simulation.unwrap_or_else(|| billing.simulation_rates()));
    let mut warnings = Vec::new();
    let current = fleet::average_rates(&tariffs).unwrap_or_else(|| {
        warnings.push("No stored tariffs found; using simulation values.".to_string());
        simulation
    });

    let site = fleet::aggregate(&villages);
    let fixed = billing.fixed_charges(request.include_service_fee);
    let budget = operating_budget(&site, current, simulation, &fixed, billing.days_in_year);
    let usage_share = usage_share(&site, current, &fixed);

    record_pass("summary", started);
    tracing::info!(villages = villages.len(), "summary pass complete");

    Ok(FleetReport {
        village_count: villages.len(),
        site,
        current_rates: current,
        simulation_rates: simulation,
        budget,
        usage_share,
        warnings,
        generated_at: now_rfc3339(),
    })
}

pub async fn wholesale_trend<R>(
    reader: &R,
    settings: &DashboardSettings,
    states: Option<&[String]>,
) -> Result<WholesaleTrend, DashboardError>
where
    R: TableReader + ?Sized,
{
    let started = Instant::now();
    let points = village_queries::wholesale_prices(reader).await?;
    let trend = build_trend(&points, &settings.wholesale.trend_params(), states);
    record_pass("wholesale", started);
    tracing::debug!(
        points = points.len(),
        periods = trend.periods.len(),
        "wholesale pass complete"
    );
    Ok(trend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff_source::TariffMode;
    use tariff_client::{
        db::{MemoryTableReader, Table},
        domain::Row,
    };

    fn reader() -> MemoryTableReader {
        MemoryTableReader::new()
            .with_rows(
                Table::VillageInputs,
                [
                    Row::new()
                        .with("village_name", "Classic Res ")
                        .with("total_usage_kwh", 10_000.0)
                        .with("child_billed_kwh", 6000.0)
                        .with("total_usage_common", 3000.0)
                        .with("nmis_res", 100)
                        .with("nmis_common", 2)
                        .with("total_cost", 50_000.0)
                        .with("q1_usage_res", 1500.0)
                        .with("q1_usage_common", 700.0)
                        .with("q1_supply_res", 9000.0),
                    Row::new()
                        .with("village_name", "Lakeside")
                        .with("total_usage_kwh", 2000.0)
                        .with("nmis_res", 10)
                        .with("total_cost", 8000.0),
                ],
            )
            .with_rows(
                Table::Tariffs,
                [Row::new()
                    .with("village_name", "Classic Res")
                    .with("_usage", 22.0)
                    .with("_supply", 105.0)],
            )
            .with_rows(
                Table::CompetitorOffers,
                [Row::new()
                    .with("village_name", "Classic Res")
                    .with("agl_usage_rate", 30.0)
                    .with("agl_daily_charge", 110.0)],
            )
    }

    fn request(village: &str, mode: TariffMode) -> VillageRequest {
        VillageRequest {
            village: village.to_string(),
            selection: TariffSelection {
                mode,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn village_pass_with_stored_tariff_and_offer() {
        let settings = DashboardSettings::default();
        let request = request("Classic Res", TariffMode::Competitor);
        let report = village_report(&reader(), &settings, &request).await.unwrap();

        assert_eq!(report.assessment.tariff.retailer(), Some(Retailer::Agl));
        assert_eq!(report.current_rates.usage_rate_c_per_kwh, 22.0);
        assert!(report.warnings.is_empty());
        let comparison = report.comparison.unwrap();
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[1].provider, "Village");
        assert_eq!(report.available_retailers, vec![Retailer::Agl]);
    }

    #[tokio::test]
    async fn village_without_tariff_or_offer_degrades_with_warnings() {
        let settings = DashboardSettings::default();
        let request = request("Lakeside", TariffMode::Competitor);
        let report = village_report(&reader(), &settings, &request).await.unwrap();

        assert_eq!(report.assessment.tariff.mode(), TariffMode::Manual);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.comparison.is_none());
        assert_eq!(report.current_rates, settings.billing.simulation_rates());
    }

    #[tokio::test]
    async fn unknown_village_is_not_found() {
        let settings = DashboardSettings::default();
        let request = request("Nowhere", TariffMode::Manual);
        let err = village_report(&reader(), &settings, &request).await.unwrap_err();
        assert!(matches!(err, DashboardError::VillageNotFound(ref v) if v == "Nowhere"));
    }

    #[tokio::test]
    async fn fleet_pass_aggregates_every_village() {
        let settings = DashboardSettings::default();
        let report = fleet_report(&reader(), &settings, &FleetRequest::default())
            .await
            .unwrap();
        assert_eq!(report.village_count, 2);
        assert_eq!(report.site.nmi_total, 112);
        assert_eq!(report.site.total_cost, 58_000.0);
        assert_eq!(report.current_rates.usage_rate_c_per_kwh, 22.0);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn fleet_without_tariffs_uses_simulation_rates() {
        let reader = MemoryTableReader::new().with_rows(
            Table::VillageInputs,
            [Row::new().with("village_name", "Lakeside").with("nmis_res", 3)],
        );
        let settings = DashboardSettings::default();
        let report = fleet_report(&reader, &settings, &FleetRequest::default()).await.unwrap();
        assert_eq!(report.current_rates, settings.billing.simulation_rates());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn index_applies_display_aliases() {
        let mut settings = DashboardSettings::default();
        settings
            .display
            .village_aliases
            .insert("Lakeside".to_string(), "Lakeside Gardens".to_string());
        let entries = village_index(&reader(), &settings).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Classic Res");
        assert_eq!(entries[1].display_name, "Lakeside Gardens");
    }
}

pub mod pages;
pub mod query;

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tariff_client::db::TableReader;

use crate::{
    calculator::{comparison::ComparisonRow, Assessment, Rates},
    charts, export,
    config::DashboardSettings,
    error::DashboardError,
    pipeline::{self, VillageEntry},
};
use pages::{IndexPage, SummaryPage, VillagePage, WholesalePage};
use query::{AssessmentQuery, WholesaleQuery};

const WATERFALL_SIZE: (u32, u32) = (900, 420);

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn TableReader>,
    pub settings: Arc<DashboardSettings>,
}

impl AppState {
    pub fn new(reader: Arc<dyn TableReader>, settings: DashboardSettings) -> Self {
        Self {
            reader,
            settings: Arc::new(settings),
        }
    }

    fn sim_defaults(&self) -> Rates {
        self.settings.billing.simulation_rates()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/summary", get(summary))
        .route("/wholesale", get(wholesale))
        .route("/charts/wholesale.svg", get(wholesale_chart))
        .route("/villages/:name", get(village))
        .route("/villages/:name/waterfall.svg", get(village_waterfall))
        .route("/villages/:name/comparison.csv", get(village_comparison_csv))
        .route("/api/villages", get(api_villages))
        .route("/api/villages/:name/assessment", get(api_assessment))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

fn chart_error(e: Box<dyn std::error::Error>) -> DashboardError {
    DashboardError::Chart(e.to_string())
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, DashboardError> {
    let entries = pipeline::village_index(state.reader.as_ref(), &state.settings).await?;
    let page = IndexPage::new(&state.settings, entries);
    Ok(Html(page.render()?))
}

async fn village(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<AssessmentQuery>,
) -> Result<Html<String>, DashboardError> {
    let request = q.village_request(&name, state.sim_defaults());
    let report = pipeline::village_report(state.reader.as_ref(), &state.settings, &request).await?;

    let (w, h) = WATERFALL_SIZE;
    let svg = charts::waterfall_svg(&report.budget.waterfall(), w, h).map_err(chart_error)?;
    let page = VillagePage::new(&state.settings, &report, &q.to_query_string(), svg);
    Ok(Html(page.render()?))
}

async fn village_waterfall(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<AssessmentQuery>,
) -> Result<Response, DashboardError> {
    let request = q.village_request(&name, state.sim_defaults());
    let report = pipeline::village_report(state.reader.as_ref(), &state.settings, &request).await?;

    let (w, h) = WATERFALL_SIZE;
    let svg = charts::waterfall_svg(&report.budget.waterfall(), w, h).map_err(chart_error)?;
    Ok(svg_response(svg))
}

async fn village_comparison_csv(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<AssessmentQuery>,
) -> Result<Response, DashboardError> {
    let request = q.village_request(&name, state.sim_defaults());
    let report = pipeline::village_report(state.reader.as_ref(), &state.settings, &request).await?;

    let rows = report
        .comparison
        .ok_or_else(|| DashboardError::ComparisonUnavailable(report.village.village_name.clone()))?;
    let body = export::comparison_csv(&rows)?;
    let disposition = format!(
        "attachment; filename=\"{}-comparison.csv\"",
        report.village.village_name.replace(['"', '/', '\\'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn summary(
    State(state): State<AppState>,
    Query(q): Query<AssessmentQuery>,
) -> Result<Html<String>, DashboardError> {
    let request = q.fleet_request(state.sim_defaults());
    let report = pipeline::fleet_report(state.reader.as_ref(), &state.settings, &request).await?;

    let (w, h) = WATERFALL_SIZE;
    let svg = charts::waterfall_svg(&report.budget.waterfall(), w, h).map_err(chart_error)?;
    let page = SummaryPage::new(&state.settings, &report, svg);
    Ok(Html(page.render()?))
}

async fn wholesale(
    State(state): State<AppState>,
    Query(q): Query<WholesaleQuery>,
) -> Result<Html<String>, DashboardError> {
    let states = q.states();
    let trend =
        pipeline::wholesale_trend(state.reader.as_ref(), &state.settings, Some(states.as_slice()))
            .await?;

    let cfg = &state.settings.wholesale;
    let svg =
        charts::wholesale_svg(&trend, cfg.chart_width, cfg.chart_height).map_err(chart_error)?;
    let page = WholesalePage::new(&state.settings, &trend, &states, svg);
    Ok(Html(page.render()?))
}

async fn wholesale_chart(
    State(state): State<AppState>,
    Query(q): Query<WholesaleQuery>,
) -> Result<Response, DashboardError> {
    let states = q.states();
    let trend =
        pipeline::wholesale_trend(state.reader.as_ref(), &state.settings, Some(states.as_slice()))
            .await?;

    let cfg = &state.settings.wholesale;
    let svg =
        charts::wholesale_svg(&trend, cfg.chart_width, cfg.chart_height).map_err(chart_error)?;
    Ok(svg_response(svg))
}

async fn api_villages(
    State(state): State<AppState>,
) -> Result<Json<Vec<VillageEntry>>, DashboardError> {
    let entries = pipeline::village_index(state.reader.as_ref(), &state.settings).await?;
    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub struct AssessmentResponse {
    pub assessment: Assessment,
    pub current_rates: Rates,
    pub comparison: Option<Vec<ComparisonRow>>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

async fn api_assessment(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<AssessmentQuery>,
) -> Result<Json<AssessmentResponse>, DashboardError> {
    let request = q.village_request(&name, state.sim_defaults());
    let report = pipeline::village_report(state.reader.as_ref(), &state.settings, &request).await?;
    Ok(Json(AssessmentResponse {
        assessment: report.assessment,
        current_rates: report.current_rates,
        comparison: report.comparison,
        warnings: report.warnings,
        generated_at: report.generated_at,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}

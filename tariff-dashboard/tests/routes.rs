use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tariff_client::{
    db::{MemoryTableReader, Table},
    domain::Row,
};
use tariff_dashboard::{config::DashboardSettings, router, AppState};
use tower::ServiceExt;

fn fixtures() -> MemoryTableReader {
    MemoryTableReader::new()
        .with_rows(
            Table::VillageInputs,
            [
                Row::new()
                    .with("village_name", "Classic Res")
                    .with("total_usage_kwh", 10_000.0)
                    .with("child_billed_kwh", 6000.0)
                    .with("total_usage_common", 3000.0)
                    .with("nmis_res", 100)
                    .with("nmis_common", 2)
                    .with("total_cost", 50_000.0)
                    .with("q1_usage_res", 1500.0)
                    .with("Q2_USAGE_COMMON", "700")
                    .with("q1_supply_res", 9000.0)
                    .with("proposed_usage_c_per_kwh", 20.0)
                    .with("proposed_daily_c", 100.0),
                Row::new()
                    .with("village_name", "Lakeside")
                    .with("total_usage_kwh", "n/a")
                    .with("nmis_res", 0),
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
                .with("origin_usage_rate", 31.2)
                .with("origin_daily_charge", 98.0)
                .with("agl_usage_rate", 30.0)],
        )
        .with_rows(
            Table::WholesalePrices,
            [
                Row::new()
                    .with("State", "NSW")
                    .with("Year", 2022)
                    .with("Quarter", "q1")
                    .with("Average_Price", 120.0),
                Row::new()
                    .with("State", "VIC")
                    .with("Year", 2022)
                    .with("Quarter", "Q1")
                    .with("Average_Price", 90.0),
            ],
        )
}

fn app() -> Router {
    router(AppState::new(Arc::new(fixtures()), DashboardSettings::default()))
}

async fn get(uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn index_lists_villages_with_links() {
    let (status, _, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/villages/Classic%20Res\""));
    assert!(body.contains("Lakeside"));
    assert!(body.contains("/summary"));
}

#[tokio::test]
async fn village_page_renders_assessment() {
    let (status, content_type, body) = get("/villages/Classic%20Res").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("Classic Res"));
    // 6000 kWh at the proposed 20 c/kWh.
    assert!(body.contains("$1,200"));
    assert!(body.contains("Competitor comparison"));
    assert!(body.contains("<svg"));
}

#[tokio::test]
async fn unknown_village_is_404() {
    let (status, _, body) = get("/villages/Nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No data found for"));
    assert!(body.contains("Nowhere"));
}

#[tokio::test]
async fn competitor_mode_without_offer_warns_and_falls_back() {
    let (status, _, body) = get("/api/villages/Lakeside/assessment?mode=competitor").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["assessment"]["tariff"]["kind"], "manual");
    let warnings = json["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap().contains("No competitor offer")));
    assert_eq!(json["assessment"]["cost_per_residential_nmi_annual"], 0.0);
}

#[tokio::test]
async fn api_assessment_uses_requested_retailer() {
    let (status, content_type, body) =
        get("/api/villages/Classic%20Res/assessment?mode=competitor&retailer=agl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    // AGL has no daily charge, so the first complete retailer is used.
    assert_eq!(json["assessment"]["tariff"]["retailer"], "origin");
    assert_eq!(json["comparison"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn api_villages_is_sorted() {
    let (_, _, body) = get("/api/villages").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Classic Res", "Lakeside"]);
}

#[tokio::test]
async fn comparison_csv_downloads() {
    let (status, content_type, body) = get("/villages/Classic%20Res/comparison.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Origin,"));
    assert!(lines[2].starts_with("Village,"));
}

#[tokio::test]
async fn comparison_csv_without_stored_tariff_is_404() {
    let (status, _, _) = get("/villages/Lakeside/comparison.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_and_wholesale_pages_render() {
    let (status, _, body) = get("/summary?include_fee=false").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Summary of 2 villages"));
    assert!(!body.contains(">Service Fee<"));

    let (status, _, body) = get("/wholesale?states=nsw").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("NSW"));

    let (status, content_type, body) = get("/charts/wholesale.svg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
    assert!(body.starts_with("<svg"));
}

#[tokio::test]
async fn waterfall_chart_and_health() {
    let (status, content_type, _) =
        get("/villages/Classic%20Res/waterfall.svg?include_fee=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/svg+xml"));

    let (status, _, body) = get("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

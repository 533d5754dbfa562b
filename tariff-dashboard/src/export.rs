//! CSV renderings of a render pass, for download and for the CLI.

use csv::Writer;

use crate::{
    calculator::{comparison::ComparisonRow, operations::OperatingBudget, Assessment},
    error::DashboardError,
};

fn finish(writer: Writer<Vec<u8>>) -> Result<String, DashboardError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
}

fn cents(x: f64) -> String {
    format!("{x:.2}")
}

pub fn assessment_csv(assessment: &Assessment) -> Result<String, DashboardError> {
    let mut w = Writer::from_writer(Vec::new());
    w.write_record(["village", "tariff", "section", "metric", "value"])?;
    let tariff = assessment.tariff.to_string();
    for (section, metric, value) in assessment.lines() {
        w.write_record([
            assessment.village_name.as_str(),
            tariff.as_str(),
            section,
            metric,
            cents(value).as_str(),
        ])?;
    }
    finish(w)
}

pub fn comparison_csv(rows: &[ComparisonRow]) -> Result<String, DashboardError> {
    let mut w = Writer::from_writer(Vec::new());
    w.write_record([
        "provider",
        "usage_rate_c_per_kwh",
        "daily_supply_dollars",
        "usage_cost",
        "supply_cost",
        "total_cost",
        "delta_pct",
    ])?;
    for r in rows {
        w.write_record([
            r.provider.clone(),
            format!("{:.2}", r.usage_rate_c_per_kwh),
            format!("{:.4}", r.daily_supply_dollars),
            cents(r.usage_cost),
            cents(r.supply_cost),
            cents(r.total_cost),
            format!("{:.1}", r.delta_pct),
        ])?;
    }
    finish(w)
}

pub fn budget_csv(budget: &OperatingBudget) -> Result<String, DashboardError> {
    let mut w = Writer::from_writer(Vec::new());
    w.write_record(["line", "current", "simulated", "note"])?;
    for line in budget.lines() {
        w.write_record([
            line.label.to_string(),
            cents(line.current),
            cents(line.simulated),
            line.note.to_string(),
        ])?;
    }
    finish(w)
}

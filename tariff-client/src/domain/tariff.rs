use serde::Serialize;

use crate::domain::Row;

/// Rates currently billed at a village (`en_tariffs`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tariff {
    pub village_name: String,
    pub usage_rate_c_per_kwh: Option<f64>,
    /// Stored in cents per day.
    pub daily_supply_c: Option<f64>,
}

impl Tariff {
    pub fn from_row(row: &Row) -> Self {
        let field = |col: &str| row.is_present(col).then(|| row.number(col));
        Self {
            village_name: row.text("village_name").unwrap_or_default().to_string(),
            usage_rate_c_per_kwh: field("_usage"),
            daily_supply_c: field("_supply"),
        }
    }

    /// `(usage c/kWh, daily supply $/day)` when both rates are set and non-zero.
    pub fn rates(&self) -> Option<(f64, f64)> {
        match (self.usage_rate_c_per_kwh, self.daily_supply_c) {
            (Some(u), Some(d)) if u != 0.0 && d != 0.0 => Some((u, d / 100.0)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rates().is_some()
    }
}

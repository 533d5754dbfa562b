use serde::Serialize;

use crate::domain::row::{parse_number, Row};
use crate::error::DataAccessError;

pub const TABLE: &str = "village_inputs";

pub const DEFAULT_PROPOSED_USAGE_C_PER_KWH: f64 = 20.0;
pub const DEFAULT_PROPOSED_DAILY_C: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Residential,
    Common,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterMeasure {
    Usage,
    Supply,
}

/// Usage (kWh) and supply ($) billed in one quarter, per area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuarterFigures {
    pub usage_res_kwh: f64,
    pub supply_res: f64,
    pub usage_common_kwh: f64,
    pub supply_common: f64,
}

impl QuarterFigures {
    pub fn usage_kwh(&self) -> f64 {
        self.usage_res_kwh + self.usage_common_kwh
    }

    pub fn supply(&self) -> f64 {
        self.supply_res + self.supply_common
    }

    fn add(&mut self, measure: QuarterMeasure, area: Area, value: f64) {
        let slot = match (measure, area) {
            (QuarterMeasure::Usage, Area::Residential) => &mut self.usage_res_kwh,
            (QuarterMeasure::Supply, Area::Residential) => &mut self.supply_res,
            (QuarterMeasure::Usage, Area::Common) => &mut self.usage_common_kwh,
            (QuarterMeasure::Supply, Area::Common) => &mut self.supply_common,
        };
        *slot += value;
    }
}

impl std::ops::AddAssign for QuarterFigures {
    fn add_assign(&mut self, rhs: Self) {
        self.usage_res_kwh += rhs.usage_res_kwh;
        self.supply_res += rhs.supply_res;
        self.usage_common_kwh += rhs.usage_common_kwh;
        self.supply_common += rhs.supply_common;
    }
}

/// Recognise quarterly split columns such as `q3_supply_common`.
///
/// Only the leading `q<N>_<measure>_<area>` text has to match, so unit
/// suffixes like `q1_usage_res_kwh` are accepted. Returns the zero-based
/// quarter index with the measure and area.
pub fn parse_quarter_column(column: &str) -> Option<(usize, QuarterMeasure, Area)> {
    let lower = column.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix('q')?;
    let mut parts = rest.splitn(3, '_');

    let quarter = match parts.next()? {
        "1" => 0,
        "2" => 1,
        "3" => 2,
        "4" => 3,
        _ => return None,
    };
    let measure = match parts.next()? {
        "usage" => QuarterMeasure::Usage,
        "supply" => QuarterMeasure::Supply,
        _ => return None,
    };
    let area = parts.next()?;
    let area = if area.starts_with("res") {
        Area::Residential
    } else if area.starts_with("common") {
        Area::Common
    } else {
        return None;
    };

    Some((quarter, measure, area))
}

/// One `village_inputs` record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VillageInput {
    pub village_name: String,
    /// Gate meter total.
    pub total_usage_kwh: f64,
    pub residential_billed_kwh: f64,
    pub common_metered_kwh: f64,
    pub nmis_res: u32,
    pub nmis_common: u32,
    pub total_cost: f64,
    pub quarters: [QuarterFigures; 4],
    /// `None` when the column is absent, null or non-numeric; each case then
    /// takes the 20 c/kWh default. A null cell is not read as zero.
    pub proposed_usage_c_per_kwh: Option<f64>,
    /// Cents per day; `None` takes the 100 c/day default, null included.
    pub proposed_daily_c: Option<f64>,
}

impl VillageInput {
    pub fn from_row(row: &Row) -> Result<Self, DataAccessError> {
        let village_name = row
            .text("village_name")
            .ok_or(DataAccessError::MissingColumn {
                table: TABLE,
                column: "village_name",
            })?
            .to_string();

        let mut quarters = [QuarterFigures::default(); 4];
        for (column, value) in row.columns() {
            if let Some((q, measure, area)) = parse_quarter_column(column) {
                quarters[q].add(measure, area, parse_number(Some(value)));
            }
        }

        Ok(Self {
            village_name,
            total_usage_kwh: row.non_negative("total_usage_kwh"),
            residential_billed_kwh: row.non_negative("child_billed_kwh"),
            common_metered_kwh: row.non_negative("total_usage_common"),
            nmis_res: row.count("nmis_res"),
            nmis_common: row.count("nmis_common"),
            total_cost: row.number("total_cost"),
            quarters,
            proposed_usage_c_per_kwh: row.optional_number("proposed_usage_c_per_kwh"),
            proposed_daily_c: row.optional_number("proposed_daily_c"),
        })
    }

    pub fn nmi_total(&self) -> u32 {
        self.nmis_res.saturating_add(self.nmis_common)
    }

    pub fn quarterly_totals(&self) -> QuarterFigures {
        let mut total = QuarterFigures::default();
        for q in &self.quarters {
            total += *q;
        }
        total
    }

    /// Gate-meter usage, or the quarterly metered sum when the gate reading is zero.
    pub fn site_usage_kwh(&self) -> f64 {
        if self.total_usage_kwh > 0.0 {
            self.total_usage_kwh
        } else {
            self.quarterly_totals().usage_kwh()
        }
    }

    pub fn proposed_usage_rate(&self) -> f64 {
        self.proposed_usage_c_per_kwh
            .unwrap_or(DEFAULT_PROPOSED_USAGE_C_PER_KWH)
    }

    /// Proposed daily supply in dollars (stored in cents).
    pub fn proposed_daily_dollars(&self) -> f64 {
        self.proposed_daily_c.unwrap_or(DEFAULT_PROPOSED_DAILY_C) / 100.0
    }
}

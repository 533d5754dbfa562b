use serde::Serialize;

use crate::domain::Row;

/// Quarterly average wholesale price for one NEM region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WholesalePricePoint {
    pub state: Option<String>,
    pub year: i32,
    /// Normalised to upper case, e.g. `Q3`.
    pub quarter: String,
    /// $/MWh.
    pub average_price: Option<f64>,
}

impl WholesalePricePoint {
    /// Column names are matched after trimming and lowercasing.
    pub fn from_row(row: &Row) -> Self {
        let row = row.normalized();
        let year = row.number("year").trunc();
        Self {
            state: row.text("state").map(str::to_string),
            year: if year.abs() < f64::from(i32::MAX) { year as i32 } else { 0 },
            quarter: row
                .text("quarter")
                .map(|q| q.to_ascii_uppercase())
                .unwrap_or_default(),
            average_price: row.optional_number("average_price"),
        }
    }

    /// `YYYY-QN` label used as the chart's x-axis category.
    pub fn period(&self) -> String {
        format!("{}-{}", self.year, self.quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_columns_and_quarter() {
        let p = WholesalePricePoint::from_row(
            &Row::new()
                .with("State", "NSW")
                .with(" year", "2023")
                .with("QUARTER", " q2 ")
                .with("average_price", 112.4),
        );
        assert_eq!(p.state.as_deref(), Some("NSW"));
        assert_eq!(p.period(), "2023-Q2");
        assert_eq!(p.average_price, Some(112.4));
    }

    #[test]
    fn missing_year_becomes_zero() {
        let p = WholesalePricePoint::from_row(&Row::new().with("state", "VIC"));
        assert_eq!(p.year, 0);
        assert_eq!(p.average_price, None);
    }
}

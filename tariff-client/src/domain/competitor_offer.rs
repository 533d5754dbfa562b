use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::Row;

/// Retailers whose published offers are tracked in `competitor_offers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Retailer {
    #[serde(rename = "agl")]
    Agl,
    #[serde(rename = "ea")]
    EnergyAustralia,
    #[serde(rename = "origin")]
    Origin,
    #[serde(rename = "alinta")]
    Alinta,
    #[serde(rename = "momentum")]
    Momentum,
    #[serde(rename = "actewagl")]
    ActewAgl,
}

impl Retailer {
    pub const ALL: [Retailer; 6] = [
        Retailer::Agl,
        Retailer::EnergyAustralia,
        Retailer::Origin,
        Retailer::Alinta,
        Retailer::Momentum,
        Retailer::ActewAgl,
    ];

    /// Column prefix in `competitor_offers`.
    pub fn key(self) -> &'static str {
        match self {
            Retailer::Agl => "agl",
            Retailer::EnergyAustralia => "ea",
            Retailer::Origin => "origin",
            Retailer::Alinta => "alinta",
            Retailer::Momentum => "momentum",
            Retailer::ActewAgl => "actewagl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Retailer::Agl => "AGL",
            Retailer::EnergyAustralia => "Energy Australia",
            Retailer::Origin => "Origin",
            Retailer::Alinta => "Alinta",
            Retailer::Momentum => "Momentum",
            Retailer::ActewAgl => "ActewAGL",
        }
    }

    pub fn usage_column(self) -> String {
        format!("{}_usage_rate", self.key())
    }

    pub fn charge_column(self) -> String {
        format!("{}_daily_charge", self.key())
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown retailer '{0}'")]
pub struct UnknownRetailer(pub String);

impl FromStr for Retailer {
    type Err = UnknownRetailer;

    /// Accepts either the column key or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Retailer::ALL
            .into_iter()
            .find(|r| {
                r.key().eq_ignore_ascii_case(needle) || r.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownRetailer(needle.to_string()))
    }
}

/// A retailer's published rates as stored: c/kWh and c/day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetailerRate {
    pub usage_rate_c_per_kwh: f64,
    pub daily_charge_c: f64,
}

impl RetailerRate {
    pub fn daily_charge_dollars(&self) -> f64 {
        self.daily_charge_c / 100.0
    }
}

/// Competitor offers recorded for one village.
///
/// Only retailers with both a usage rate and a daily charge are kept; a
/// half-filled offer cannot be priced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompetitorOffer {
    pub village_name: String,
    rates: BTreeMap<Retailer, RetailerRate>,
}

impl CompetitorOffer {
    pub fn from_row(row: &Row) -> Self {
        let mut rates = BTreeMap::new();
        for retailer in Retailer::ALL {
            let usage_col = retailer.usage_column();
            let charge_col = retailer.charge_column();
            if row.is_present(&usage_col) && row.is_present(&charge_col) {
                rates.insert(
                    retailer,
                    RetailerRate {
                        usage_rate_c_per_kwh: row.number(&usage_col),
                        daily_charge_c: row.number(&charge_col),
                    },
                );
            }
        }

        Self {
            village_name: row.text("village_name").unwrap_or_default().to_string(),
            rates,
        }
    }

    /// Selectable retailers in enumeration order.
    pub fn available(&self) -> impl Iterator<Item = (Retailer, &RetailerRate)> {
        self.rates.iter().map(|(r, rate)| (*r, rate))
    }

    pub fn rate(&self, retailer: Retailer) -> Option<&RetailerRate> {
        self.rates.get(&retailer)
    }

    pub fn has_available(&self) -> bool {
        !self.rates.is_empty()
    }
}

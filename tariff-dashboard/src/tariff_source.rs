use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tariff_client::domain::{CompetitorOffer, Retailer, Tariff, VillageInput};

use crate::calculator::Rates;

pub const MAX_USAGE_RATE_C_PER_KWH: f64 = 100.0;
pub const MAX_DAILY_SUPPLY_DOLLARS: f64 = 5.0;

/// The tariff kind a user asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffMode {
    #[default]
    Manual,
    Competitor,
    Simulation,
}

impl TariffMode {
    pub const ALL: [TariffMode; 3] = [
        TariffMode::Manual,
        TariffMode::Competitor,
        TariffMode::Simulation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TariffMode::Manual => "manual",
            TariffMode::Competitor => "competitor",
            TariffMode::Simulation => "simulation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TariffMode::Manual => "Manual Input",
            TariffMode::Competitor => "Competitor Offer",
            TariffMode::Simulation => "Simulation",
        }
    }
}

impl FromStr for TariffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TariffMode::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tariff mode '{s}'"))
    }
}

/// The tariff a pass is computed with, carrying only what its kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TariffSource {
    Manual {
        usage_rate_c_per_kwh: f64,
        daily_supply_dollars: f64,
    },
    Competitor {
        retailer: Retailer,
        usage_rate_c_per_kwh: f64,
        daily_supply_dollars: f64,
    },
    Simulation {
        usage_rate_c_per_kwh: f64,
        daily_supply_dollars: f64,
    },
}

impl TariffSource {
    pub fn rates(&self) -> Rates {
        match *self {
            TariffSource::Manual {
                usage_rate_c_per_kwh,
                daily_supply_dollars,
            }
            | TariffSource::Competitor {
                usage_rate_c_per_kwh,
                daily_supply_dollars,
                ..
            }
            | TariffSource::Simulation {
                usage_rate_c_per_kwh,
                daily_supply_dollars,
            } => Rates {
                usage_rate_c_per_kwh,
                daily_supply_dollars,
            },
        }
    }

    pub fn mode(&self) -> TariffMode {
        match self {
            TariffSource::Manual { .. } => TariffMode::Manual,
            TariffSource::Competitor { .. } => TariffMode::Competitor,
            TariffSource::Simulation { .. } => TariffMode::Simulation,
        }
    }

    pub fn retailer(&self) -> Option<Retailer> {
        match self {
            TariffSource::Competitor { retailer, .. } => Some(*retailer),
            _ => None,
        }
    }
}

impl fmt::Display for TariffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rates = self.rates();
        match self {
            TariffSource::Competitor { retailer, .. } => {
                write!(f, "Competitor offer ({retailer})")?
            }
            other => f.write_str(other.mode().label())?,
        }
        write!(
            f,
            ": {:.2} c/kWh, ${:.4}/day",
            rates.usage_rate_c_per_kwh, rates.daily_supply_dollars
        )
    }
}

/// Inputs from the sidebar for one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TariffSelection {
    pub mode: TariffMode,
    /// Manual usage rate, c/kWh. Defaults to the village's proposed rate.
    pub usage_rate: Option<f64>,
    /// Manual daily supply, $/day. Defaults to the village's proposed charge.
    pub daily_supply: Option<f64>,
    pub retailer: Option<Retailer>,
}

/// The chosen source plus any degradations the user should be told about.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub source: TariffSource,
    pub warnings: Vec<String>,
}

pub fn clamp_usage_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, MAX_USAGE_RATE_C_PER_KWH)
    } else {
        0.0
    }
}

pub fn clamp_daily_supply(daily: f64) -> f64 {
    if daily.is_finite() {
        daily.clamp(0.0, MAX_DAILY_SUPPLY_DOLLARS)
    } else {
        0.0
    }
}

pub fn clamp_rates(rates: Rates) -> Rates {
    Rates {
        usage_rate_c_per_kwh: clamp_usage_rate(rates.usage_rate_c_per_kwh),
        daily_supply_dollars: clamp_daily_supply(rates.daily_supply_dollars),
    }
}

fn manual(selection: &TariffSelection, village: &VillageInput) -> TariffSource {
    TariffSource::Manual {
        usage_rate_c_per_kwh: clamp_usage_rate(
            selection.usage_rate.unwrap_or_else(|| village.proposed_usage_rate()),
        ),
        daily_supply_dollars: clamp_daily_supply(
            selection.daily_supply.unwrap_or_else(|| village.proposed_daily_dollars()),
        ),
    }
}

/// Select the tariff source once for the whole pass.
///
/// A competitor request without a usable offer degrades to manual input.
pub fn resolve(
    selection: &TariffSelection,
    village: &VillageInput,
    offer: Option<&CompetitorOffer>,
    simulation: Rates,
) -> Resolution {
    let mut warnings = Vec::new();

    let source = match selection.mode {
        TariffMode::Manual => manual(selection, village),
        TariffMode::Simulation => {
            let rates = clamp_rates(simulation);
            TariffSource::Simulation {
                usage_rate_c_per_kwh: rates.usage_rate_c_per_kwh,
                daily_supply_dollars: rates.daily_supply_dollars,
            }
        }
        TariffMode::Competitor => match offer {
            None => {
                warnings.push(
                    "No competitor offer found for this village. Defaulting to manual input."
                        .to_string(),
                );
                manual(selection, village)
            }
            Some(offer) => {
                let chosen = selection
                    .retailer
                    .and_then(|r| offer.rate(r).map(|rate| (r, rate)))
                    .or_else(|| offer.available().next());
                match chosen {
                    Some((retailer, rate)) => {
                        if let Some(requested) = selection.retailer.filter(|r| *r != retailer) {
                            warnings.push(format!(
                                "{requested} has no complete offer for this village; \
                                 showing {retailer}."
                            ));
                        }
                        TariffSource::Competitor {
                            retailer,
                            usage_rate_c_per_kwh: rate.usage_rate_c_per_kwh,
                            daily_supply_dollars: rate.daily_charge_dollars(),
                        }
                    }
                    None => {
                        warnings.push(
                            "No complete retailer offers available for this village.".to_string(),
                        );
                        manual(selection, village)
                    }
                }
            }
        },
    };

    if selection.mode != source.mode() {
        metrics::counter!("dashboard_competitor_fallback_total").increment(1);
        tracing::info!(
            village = %village.village_name,
            "competitor mode unavailable, using manual input"
        );
    }

    Resolution { source, warnings }
}

/// Rates currently billed, from `en_tariffs`; the simulation rates stand in
/// when the stored tariff is missing or has a zero rate.
pub fn current_rates(
    village: &str,
    tariff: Option<&Tariff>,
    simulation: Rates,
) -> (Rates, Option<String>) {
    match tariff.and_then(Tariff::rates) {
        Some((usage_rate_c_per_kwh, daily_supply_dollars)) => (
            Rates {
                usage_rate_c_per_kwh,
                daily_supply_dollars,
            },
            None,
        ),
        None => (
            simulation,
            Some(format!(
                "No stored tariff for {village}; using simulation values."
            )),
        ),
    }
}

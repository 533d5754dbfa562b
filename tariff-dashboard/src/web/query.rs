//! Query-string inputs. Every field arrives as an optional string because
//! HTML forms submit empty inputs as `field=`; values that do not parse are
//! treated as not supplied.

use serde::Deserialize;
use tariff_client::domain::Retailer;

use crate::{
    calculator::Rates,
    pipeline::{FleetRequest, VillageRequest},
    tariff_source::{TariffMode, TariffSelection},
};

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn number(value: &Option<String>) -> Option<f64> {
    non_empty(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn flag(value: &Option<String>) -> Option<bool> {
    match non_empty(value)?.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentQuery {
    pub mode: Option<String>,
    pub usage_rate: Option<String>,
    pub daily_supply: Option<String>,
    pub retailer: Option<String>,
    pub sim_usage_rate: Option<String>,
    pub sim_daily_supply: Option<String>,
    pub include_fee: Option<String>,
}

impl AssessmentQuery {
    pub fn mode(&self) -> TariffMode {
        non_empty(&self.mode)
            .and_then(|m| m.parse().ok())
            .unwrap_or_default()
    }

    pub fn retailer(&self) -> Option<Retailer> {
        non_empty(&self.retailer).and_then(|r| r.parse().ok())
    }

    pub fn include_fee(&self) -> Option<bool> {
        flag(&self.include_fee)
    }

    /// Simulation rates, when at least one was supplied; the other falls back
    /// to `defaults`.
    pub fn simulation(&self, defaults: Rates) -> Option<Rates> {
        let usage = number(&self.sim_usage_rate);
        let daily = number(&self.sim_daily_supply);
        if usage.is_none() && daily.is_none() {
            return None;
        }
        Some(Rates {
            usage_rate_c_per_kwh: usage.unwrap_or(defaults.usage_rate_c_per_kwh),
            daily_supply_dollars: daily.unwrap_or(defaults.daily_supply_dollars),
        })
    }

    pub fn selection(&self) -> TariffSelection {
        TariffSelection {
            mode: self.mode(),
            usage_rate: number(&self.usage_rate),
            daily_supply: number(&self.daily_supply),
            retailer: self.retailer(),
        }
    }

    pub fn village_request(&self, village: &str, sim_defaults: Rates) -> VillageRequest {
        VillageRequest {
            village: village.to_string(),
            selection: self.selection(),
            simulation: self.simulation(sim_defaults),
            include_service_fee: self.include_fee(),
        }
    }

    pub fn fleet_request(&self, sim_defaults: Rates) -> FleetRequest {
        FleetRequest {
            simulation: self.simulation(sim_defaults),
            include_service_fee: self.include_fee(),
        }
    }

    /// The supplied parameters, re-encoded for chart and export links.
    pub fn to_query_string(&self) -> String {
        let pairs = [
            ("mode", &self.mode),
            ("usage_rate", &self.usage_rate),
            ("daily_supply", &self.daily_supply),
            ("retailer", &self.retailer),
            ("sim_usage_rate", &self.sim_usage_rate),
            ("sim_daily_supply", &self.sim_daily_supply),
            ("include_fee", &self.include_fee),
        ];
        let encoded: Vec<String> = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                non_empty(value).map(|v| format!("{key}={}", urlencoding::encode(v)))
            })
            .collect();
        if encoded.is_empty() {
            String::new()
        } else {
            format!("?{}", encoded.join("&"))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WholesaleQuery {
    /// Comma-separated state codes, e.g. `NSW,VIC`.
    pub states: Option<String>,
}

impl WholesaleQuery {
    pub fn states(&self) -> Vec<String> {
        non_empty(&self.states)
            .map(|s| {
                s.split(',')
                    .map(|st| st.trim().to_ascii_uppercase())
                    .filter(|st| !st.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

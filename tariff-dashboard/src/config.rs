use serde::Deserialize;
use std::{collections::BTreeMap, fs};

use crate::calculator::{
    operations::{FixedCharges, PLATFORM_COSTS_ANNUAL, SERVICE_FEE_ANNUAL},
    wholesale::TrendParams,
    BillingParams, Rates, DAYS_IN_YEAR, GST_RATE,
};

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub days_in_year: u32,
    pub gst_rate: f64,
    pub service_fee_annual: f64,
    pub platform_costs_annual: f64,
    pub include_service_fee: bool,
    /// Simulation usage rate, c/kWh.
    pub sim_usage_rate: f64,
    /// Simulation daily supply, $/day.
    pub sim_daily_supply: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            days_in_year: DAYS_IN_YEAR,
            gst_rate: GST_RATE,
            service_fee_annual: SERVICE_FEE_ANNUAL,
            platform_costs_annual: PLATFORM_COSTS_ANNUAL,
            include_service_fee: true,
            sim_usage_rate: 20.0,
            sim_daily_supply: 1.0,
        }
    }
}

impl BillingConfig {
    pub fn params(&self) -> BillingParams {
        BillingParams {
            days_in_year: self.days_in_year,
            gst_rate: self.gst_rate,
        }
    }

    /// `include` overrides the configured service-fee toggle for one pass.
    pub fn fixed_charges(&self, include: Option<bool>) -> FixedCharges {
        FixedCharges {
            service_fee_annual: self.service_fee_annual,
            platform_costs_annual: self.platform_costs_annual,
            include_service_fee: include.unwrap_or(self.include_service_fee),
        }
    }

    pub fn simulation_rates(&self) -> Rates {
        Rates {
            usage_rate_c_per_kwh: self.sim_usage_rate,
            daily_supply_dollars: self.sim_daily_supply,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WholesaleConfig {
    pub min_year: i32,
    pub rolling_window: usize,
    pub retail_offset_c_per_kwh: f64,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for WholesaleConfig {
    fn default() -> Self {
        let trend = TrendParams::default();
        Self {
            min_year: trend.min_year,
            rolling_window: trend.rolling_window,
            retail_offset_c_per_kwh: trend.retail_offset_c_per_kwh,
            chart_width: 900,
            chart_height: 450,
        }
    }
}

impl WholesaleConfig {
    pub fn trend_params(&self) -> TrendParams {
        TrendParams {
            min_year: self.min_year,
            rolling_window: self.rolling_window,
            retail_offset_c_per_kwh: self.retail_offset_c_per_kwh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    /// Stored village name -> name shown on pages.
    pub village_aliases: BTreeMap<String, String>,
    /// Free-text notes shown under a village's figures, keyed by stored name.
    pub consultant_notes: BTreeMap<String, String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Village Tariff Dashboard".to_string(),
            village_aliases: BTreeMap::new(),
            consultant_notes: BTreeMap::new(),
        }
    }
}

impl DisplayConfig {
    pub fn display_name<'a>(&'a self, village: &'a str) -> &'a str {
        self.village_aliases
            .get(village)
            .map(String::as_str)
            .unwrap_or(village)
    }

    pub fn consultant_note(&self, village: &str) -> Option<&str> {
        self.consultant_notes.get(village).map(String::as_str)
    }
}

/// Everything a render pass needs from configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSettings {
    pub billing: BillingConfig,
    pub wholesale: WholesaleConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub wholesale: WholesaleConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("TARIFF_DASHBOARD_CONFIG")
            .unwrap_or_else(|_| "tariff-dashboard.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let mut cfg = Self::from_toml(&contents)?;
        if let Ok(uri) = env::var("TARIFF_DATABASE_URL") {
            cfg.database.uri = uri;
        }
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            billing: self.billing.clone(),
            wholesale: self.wholesale.clone(),
            display: self.display.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [database]
        uri = "postgres://localhost/villages"
        max_connections = 4

        [server]
        bind_addr = "127.0.0.1:8080"
    "#;

    #[test]
    fn optional_sections_take_defaults() {
        let cfg = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(cfg.database.max_connections, 4);
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.billing, BillingConfig::default());
        assert_eq!(
            cfg.billing.simulation_rates(),
            Rates {
                usage_rate_c_per_kwh: 20.0,
                daily_supply_dollars: 1.0,
            }
        );
        assert_eq!(cfg.wholesale.min_year, 2021);
        assert_eq!(cfg.display.title, "Village Tariff Dashboard");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let contents = format!(
            r#"{MINIMAL}
[billing]
gst_rate = 0.15
include_service_fee = false

[display.village_aliases]
"Classic Res" = "Classic Residences"
"#
        );
        let cfg = AppConfig::from_toml(&contents).unwrap();
        assert_eq!(cfg.billing.gst_rate, 0.15);
        assert_eq!(cfg.billing.days_in_year, 365);
        assert!(!cfg.billing.fixed_charges(None).include_service_fee);
        assert!(cfg.billing.fixed_charges(Some(true)).include_service_fee);
        assert_eq!(cfg.display.display_name("Classic Res"), "Classic Residences");
        assert_eq!(cfg.display.display_name("Other"), "Other");
    }

    #[test]
    fn example_config_parses() {
        let cfg = AppConfig::from_toml(include_str!("../tariff-dashboard.example.toml")).unwrap();
        assert_eq!(cfg.metrics.as_ref().unwrap().bind_addr, "127.0.0.1:9100");
        let settings = cfg.settings();
        assert_eq!(
            settings.billing.simulation_rates(),
            BillingConfig::default().simulation_rates()
        );
        assert!(settings.display.consultant_note("Classic Res").is_some());
    }

    #[test]
    fn missing_database_section_is_an_error() {
        assert!(AppConfig::from_toml("[server]\nbind_addr = \"0.0.0.0:80\"").is_err());
    }
}

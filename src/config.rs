use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::grid::MetricKind;

/// Industry benchmark values used for relative-performance percentages
///
/// One reference value per metric kind. These are process-wide display
/// constants, not per-user data, and are never persisted alongside records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Benchmarks {
    /// Benchmark for carbon emissions (tons CO2e)
    #[serde(rename = "carbonEmissions")]
    pub carbon_emissions: f64,

    /// Benchmark for water usage (kiloliters)
    #[serde(rename = "waterUsage")]
    pub water_usage: f64,

    /// Benchmark for waste generated (tons)
    #[serde(rename = "wasteGenerated")]
    pub waste_generated: f64,

    /// Benchmark for energy consumption (MWh)
    #[serde(rename = "energyConsumption")]
    pub energy_consumption: f64,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Benchmarks {
            carbon_emissions: 75.0,
            water_usage: 1200.0,
            waste_generated: 45.0,
            energy_consumption: 850.0,
        }
    }
}

impl Benchmarks {
    /// Look up the benchmark value for a metric kind
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::CarbonEmissions => self.carbon_emissions,
            MetricKind::WaterUsage => self.water_usage,
            MetricKind::WasteGenerated => self.waste_generated,
            MetricKind::EnergyConsumption => self.energy_consumption,
        }
    }
}

/// Reporting configuration: which years are tracked and what the benchmarks are
///
/// The year range is supplied here rather than baked into the grid logic, so a
/// deployment can track a different reporting window without a code change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingConfig {
    /// Supported reporting years, in display order
    pub years: Vec<i32>,

    /// Benchmark values per metric kind
    pub benchmarks: Benchmarks,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfig {
            years: (2019..=2023).collect(),
            benchmarks: Benchmarks::default(),
        }
    }
}

impl ReportingConfig {
    /// Load a reporting configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to a JSON file with `years` and `benchmarks` keys
    ///
    /// # Returns
    /// * `Result<ReportingConfig, String>` - The parsed configuration or an error
    ///
    /// # Errors
    /// * Returns an error if the file cannot be read or parsed, or if it
    ///   lists no years
    pub fn from_file(path: &str) -> Result<Self, String> {
        let data = fs::read_to_string(path)
            .map_err(|_| format!("Failed to read reporting config {}", path))?;
        let config: ReportingConfig = serde_json::from_str(&data)
            .map_err(|_| format!("Failed to parse reporting config {}", path))?;
        if config.years.is_empty() {
            return Err("Reporting config must list at least one year".to_string());
        }
        Ok(config)
    }
}

/// Server process configuration, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (`PORT`, default 5000)
    pub port: u16,

    /// Directory holding the JSON document files (`DATA_DIR`, default `database`)
    pub data_dir: PathBuf,

    /// Reporting years and benchmarks (`REPORTING_CONFIG` file, or defaults)
    pub reporting: ReportingConfig,
}

impl ServerConfig {
    /// Build the server configuration from environment variables
    ///
    /// # Returns
    /// * `Result<ServerConfig, String>` - The configuration or an error
    ///
    /// # Errors
    /// * Returns an error if `PORT` is set but not a valid port number, or if
    ///   `REPORTING_CONFIG` names a file that cannot be loaded
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| format!("Invalid PORT value: {}", value))?,
            Err(_) => 5000,
        };

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "database".to_string());

        let reporting = match env::var("REPORTING_CONFIG") {
            Ok(path) => ReportingConfig::from_file(&path)?,
            Err(_) => ReportingConfig::default(),
        };

        Ok(ServerConfig {
            port,
            data_dir: PathBuf::from(data_dir),
            reporting,
        })
    }
}

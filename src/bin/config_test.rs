use ecoledger::config::{Benchmarks, ReportingConfig, ServerConfig};
use ecoledger::grid::MetricKind;
use std::env;
use std::fs;
use tempfile::tempdir;

fn test_defaults() {
    println!("\n====== Testing default reporting configuration ======");
    let config = ReportingConfig::default();

    assert_eq!(config.years, vec![2019, 2020, 2021, 2022, 2023]);
    assert_eq!(config.benchmarks.get(MetricKind::CarbonEmissions), 75.0);
    assert_eq!(config.benchmarks.get(MetricKind::WaterUsage), 1200.0);
    assert_eq!(config.benchmarks.get(MetricKind::WasteGenerated), 45.0);
    assert_eq!(config.benchmarks.get(MetricKind::EnergyConsumption), 850.0);
    println!("✓ Default years and benchmark values are in place");
}

fn test_from_file() {
    println!("\n====== Testing reporting config file override ======");
    let dir = tempdir().unwrap();
    let path = dir.path().join("reporting.json");

    fs::write(
        &path,
        r#"{
            "years": [2021, 2022],
            "benchmarks": {
                "carbonEmissions": 80,
                "waterUsage": 1000,
                "wasteGenerated": 50,
                "energyConsumption": 900
            }
        }"#,
    )
    .unwrap();

    let config = ReportingConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.years, vec![2021, 2022]);
    assert_eq!(config.benchmarks.get(MetricKind::CarbonEmissions), 80.0);
    assert_eq!(config.benchmarks.get(MetricKind::EnergyConsumption), 900.0);
    println!("✓ Override file replaces years and benchmarks");
}

fn test_from_file_failures() {
    println!("\n====== Testing reporting config failure modes ======");
    let dir = tempdir().unwrap();

    let missing = dir.path().join("nope.json");
    let result = ReportingConfig::from_file(missing.to_str().unwrap());
    assert!(result.unwrap_err().starts_with("Failed to read"));
    println!("✓ A missing file is reported as unreadable");

    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, "{ not json").unwrap();
    let result = ReportingConfig::from_file(garbled.to_str().unwrap());
    assert!(result.unwrap_err().starts_with("Failed to parse"));
    println!("✓ Malformed JSON is reported as unparsable");

    let empty_years = dir.path().join("empty.json");
    let body = serde_json::json!({ "years": [], "benchmarks": Benchmarks::default() });
    fs::write(&empty_years, body.to_string()).unwrap();
    let result = ReportingConfig::from_file(empty_years.to_str().unwrap());
    assert_eq!(
        result.unwrap_err(),
        "Reporting config must list at least one year"
    );
    println!("✓ An empty year list is rejected");
}

fn test_server_config_from_env() {
    println!("\n====== Testing server configuration from the environment ======");
    env::remove_var("PORT");
    env::remove_var("DATA_DIR");
    env::remove_var("REPORTING_CONFIG");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.port, 5000);
    assert_eq!(config.data_dir, std::path::PathBuf::from("database"));
    assert_eq!(config.reporting, ReportingConfig::default());
    println!("✓ Defaults apply with no environment set");

    env::set_var("PORT", "8080");
    env::set_var("DATA_DIR", "/tmp/metrics-data");
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.data_dir, std::path::PathBuf::from("/tmp/metrics-data"));
    println!("✓ PORT and DATA_DIR overrides are honored");

    env::set_var("PORT", "not-a-port");
    let result = ServerConfig::from_env();
    assert_eq!(result.unwrap_err(), "Invalid PORT value: not-a-port");
    println!("✓ A malformed PORT is rejected");

    let dir = tempdir().unwrap();
    let path = dir.path().join("reporting.json");
    fs::write(&path, "broken").unwrap();
    env::set_var("PORT", "8080");
    env::set_var("REPORTING_CONFIG", path.to_str().unwrap());
    let result = ServerConfig::from_env();
    assert!(result.unwrap_err().starts_with("Failed to parse"));
    println!("✓ A bad REPORTING_CONFIG file fails startup");

    env::remove_var("PORT");
    env::remove_var("DATA_DIR");
    env::remove_var("REPORTING_CONFIG");
}

fn main() {
    test_defaults();
    test_from_file();
    test_from_file_failures();
    test_server_config_from_env();

    println!("\nAll config tests passed!");
}

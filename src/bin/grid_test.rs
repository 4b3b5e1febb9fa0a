use ecoledger::config::Benchmarks;
use ecoledger::grid::{CellValue, MetricGrid, MetricKind};
use ecoledger::metrics::MetricRecord;

const YEARS: [i32; 5] = [2019, 2020, 2021, 2022, 2023];

fn record(user: &str, year: i32, carbon: f64, water: f64, waste: f64, energy: f64) -> MetricRecord {
    MetricRecord {
        id: format!("{}-{}", user, year),
        user: user.to_string(),
        year,
        carbon_emissions: carbon,
        water_usage: water,
        waste_generated: waste,
        energy_consumption: energy,
    }
}

fn test_new_grid_is_empty() {
    println!("\n====== Testing empty grid ======");
    let grid = MetricGrid::new(&YEARS);

    assert_eq!(grid.years(), &YEARS);
    assert_eq!(*grid.cell(2019, MetricKind::CarbonEmissions), CellValue::Unset);
    assert!(grid.dense_series().is_empty());
    assert!(!grid.is_complete());
    println!("✓ New grid has every cell unset and an empty dense series");
}

fn test_single_cell_series() {
    println!("\n====== Testing dense series with one populated cell ======");
    let mut grid = MetricGrid::new(&YEARS);
    grid.apply_edit(2021, MetricKind::WaterUsage, "950").unwrap();

    let series = grid.dense_series();
    assert_eq!(series.len(), 1, "years with zero populated metrics are dropped");
    assert_eq!(series[0].year, 2021);
    assert_eq!(series[0].water_usage, Some(950.0));
    assert_eq!(series[0].populated_count(), 1);
    println!("✓ Only 2021 appears, carrying only waterUsage");

    // The serialized shape carries year plus exactly the populated field
    let json = serde_json::to_value(&series[0]).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("year"));
    assert!(object.contains_key("waterUsage"));
    println!("✓ Serialized entry omits the unpopulated fields");
}

fn test_unparseable_input_not_populated() {
    println!("\n====== Testing raw edits that are not numbers ======");
    let mut grid = MetricGrid::new(&YEARS);
    grid.apply_edit(2020, MetricKind::CarbonEmissions, "").unwrap();
    grid.apply_edit(2020, MetricKind::WasteGenerated, "abc").unwrap();
    grid.apply_edit(2020, MetricKind::WaterUsage, " 42 ").unwrap();

    assert_eq!(grid.value(2020, MetricKind::CarbonEmissions), None);
    assert_eq!(grid.value(2020, MetricKind::WasteGenerated), None);
    assert_eq!(grid.value(2020, MetricKind::WaterUsage), Some(42.0));
    println!("✓ Empty and non-numeric input stays unpopulated, whitespace is trimmed");

    // The raw text is preserved verbatim for the form
    assert_eq!(
        *grid.cell(2020, MetricKind::WasteGenerated),
        CellValue::Raw("abc".to_string())
    );
    println!("✓ Raw edit text kept verbatim");
}

fn test_zero_is_populated() {
    println!("\n====== Testing zero as a populated value ======");
    let mut grid = MetricGrid::new(&YEARS);
    grid.apply_edit(2022, MetricKind::WasteGenerated, "0").unwrap();

    assert_eq!(grid.value(2022, MetricKind::WasteGenerated), Some(0.0));
    let series = grid.dense_series();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].waste_generated, Some(0.0));
    println!("✓ A zero cell counts as populated and appears in the series");
}

fn test_unsupported_year_rejected() {
    println!("\n====== Testing edits outside the reporting years ======");
    let mut grid = MetricGrid::new(&YEARS);
    let result = grid.apply_edit(2010, MetricKind::CarbonEmissions, "10");
    assert!(result.is_err());
    println!("✓ Edit for 2010 rejected");
}

fn test_is_complete() {
    println!("\n====== Testing completeness gate ======");
    let mut grid = MetricGrid::new(&YEARS);

    for year in YEARS {
        for kind in MetricKind::ALL {
            grid.apply_edit(year, kind, "5").unwrap();
        }
    }
    assert!(grid.is_complete());
    println!("✓ Fully populated grid is complete");

    grid.apply_edit(2021, MetricKind::EnergyConsumption, "").unwrap();
    assert!(!grid.is_complete());
    println!("✓ Clearing one cell makes it incomplete again");
}

fn test_benchmark_performance() {
    println!("\n====== Testing benchmark performance ======");
    let benchmarks = Benchmarks::default();
    let mut grid = MetricGrid::new(&YEARS);

    grid.apply_edit(2023, MetricKind::CarbonEmissions, "70").unwrap();
    let performance = grid.benchmark_performance(2023, MetricKind::CarbonEmissions, &benchmarks);
    assert_eq!(performance, 93.3); // 70 / 75 * 100, one decimal
    assert!(!grid.exceeds_benchmark(2023, MetricKind::CarbonEmissions, &benchmarks));
    println!("✓ 70 against a benchmark of 75 reads 93.3%, under benchmark");

    grid.apply_edit(2023, MetricKind::WasteGenerated, "50").unwrap();
    let performance = grid.benchmark_performance(2023, MetricKind::WasteGenerated, &benchmarks);
    assert_eq!(performance, 111.1); // 50 / 45 * 100
    assert!(grid.exceeds_benchmark(2023, MetricKind::WasteGenerated, &benchmarks));
    println!("✓ 50 against a benchmark of 45 reads 111.1%, over benchmark");

    let performance = grid.benchmark_performance(2023, MetricKind::WaterUsage, &benchmarks);
    assert_eq!(performance, 0.0);
    println!("✓ An unset cell reads as 0%");
}

fn test_load_records() {
    println!("\n====== Testing reload from server records ======");
    let mut grid = MetricGrid::new(&YEARS);
    grid.apply_edit(2019, MetricKind::CarbonEmissions, "999").unwrap();

    let records = vec![
        record("user-1", 2023, 70.0, 1100.0, 40.0, 800.0),
        record("user-1", 1999, 1.0, 2.0, 3.0, 4.0), // outside the reporting years
    ];
    grid.load_records(&records);

    // The reload resets everything first
    assert_eq!(grid.value(2019, MetricKind::CarbonEmissions), None);
    println!("✓ Stale edits are cleared on reload");

    assert_eq!(grid.value(2023, MetricKind::CarbonEmissions), Some(70.0));
    assert_eq!(grid.value(2023, MetricKind::WaterUsage), Some(1100.0));
    assert_eq!(grid.value(2023, MetricKind::WasteGenerated), Some(40.0));
    assert_eq!(grid.value(2023, MetricKind::EnergyConsumption), Some(800.0));
    println!("✓ All four 2023 cells populated from the record");

    let series = grid.dense_series();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].year, 2023);
    println!("✓ The 1999 record was silently ignored");
}

fn test_metric_kind_metadata() {
    println!("\n====== Testing metric kind metadata ======");
    assert_eq!(MetricKind::ALL.len(), 4);
    assert_eq!(MetricKind::CarbonEmissions.key(), "carbonEmissions");
    assert_eq!(MetricKind::WasteGenerated.label(), "Waste Generated");
    assert_eq!(MetricKind::EnergyConsumption.unit(), "MWh");
    println!("✓ Keys, labels and units line up with the dashboard");
}

fn main() {
    test_new_grid_is_empty();
    test_single_cell_series();
    test_unparseable_input_not_populated();
    test_zero_is_populated();
    test_unsupported_year_rejected();
    test_is_complete();
    test_benchmark_performance();
    test_load_records();
    test_metric_kind_metadata();

    println!("\nAll grid tests passed!");
}

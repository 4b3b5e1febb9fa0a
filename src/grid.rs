use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Benchmarks;
use crate::metrics::{MetricRecord, YearlyMetricInput};

/// The four tracked environmental metric kinds
///
/// The set is closed because the persisted record schema names each kind as a
/// field; labels and units match the dashboard display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    CarbonEmissions,
    WaterUsage,
    WasteGenerated,
    EnergyConsumption,
}

impl MetricKind {
    /// All metric kinds, in display order
    pub const ALL: [MetricKind; 4] = [
        MetricKind::CarbonEmissions,
        MetricKind::WaterUsage,
        MetricKind::WasteGenerated,
        MetricKind::EnergyConsumption,
    ];

    /// Wire/JSON key for this kind
    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::CarbonEmissions => "carbonEmissions",
            MetricKind::WaterUsage => "waterUsage",
            MetricKind::WasteGenerated => "wasteGenerated",
            MetricKind::EnergyConsumption => "energyConsumption",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::CarbonEmissions => "Carbon Emissions",
            MetricKind::WaterUsage => "Water Usage",
            MetricKind::WasteGenerated => "Waste Generated",
            MetricKind::EnergyConsumption => "Energy Consumption",
        }
    }

    /// Unit of measure for display
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::CarbonEmissions => "tons CO2e",
            MetricKind::WaterUsage => "kiloliters",
            MetricKind::WasteGenerated => "tons",
            MetricKind::EnergyConsumption => "MWh",
        }
    }
}

/// A single grid cell: either untouched or holding the raw user input
///
/// The raw string is kept verbatim so partially-typed values survive editing;
/// a cell only counts as populated once its content parses to a finite number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Unset,
    Raw(String),
}

/// One dense per-year record: `year` plus only the populated metric fields
///
/// This is the shape fed to every chart, to export, and to submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeries {
    pub year: i32,

    #[serde(rename = "carbonEmissions", skip_serializing_if = "Option::is_none")]
    pub carbon_emissions: Option<f64>,

    #[serde(rename = "waterUsage", skip_serializing_if = "Option::is_none")]
    pub water_usage: Option<f64>,

    #[serde(rename = "wasteGenerated", skip_serializing_if = "Option::is_none")]
    pub waste_generated: Option<f64>,

    #[serde(rename = "energyConsumption", skip_serializing_if = "Option::is_none")]
    pub energy_consumption: Option<f64>,
}

impl YearSeries {
    /// Value for a metric kind, if populated
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::CarbonEmissions => self.carbon_emissions,
            MetricKind::WaterUsage => self.water_usage,
            MetricKind::WasteGenerated => self.waste_generated,
            MetricKind::EnergyConsumption => self.energy_consumption,
        }
    }

    /// Number of populated metric fields
    pub fn populated_count(&self) -> usize {
        MetricKind::ALL
            .iter()
            .filter(|kind| self.get(**kind).is_some())
            .count()
    }
}

impl From<YearSeries> for YearlyMetricInput {
    fn from(series: YearSeries) -> Self {
        YearlyMetricInput {
            year: Some(series.year),
            carbon_emissions: series.carbon_emissions,
            water_usage: series.water_usage,
            waste_generated: series.waste_generated,
            energy_consumption: series.energy_consumption,
        }
    }
}

/// Sparse (year x metric) value table backing the input form
///
/// Holds one `CellValue` per configured year and metric kind. The grid is
/// transient: it is rebuilt from server records on load and never persisted
/// itself.
#[derive(Debug, Clone)]
pub struct MetricGrid {
    years: Vec<i32>,
    cells: HashMap<(i32, MetricKind), CellValue>,
}

impl MetricGrid {
    /// Create a grid with every cell unset
    ///
    /// # Arguments
    /// * `years` - The supported reporting years, in display order
    pub fn new(years: &[i32]) -> Self {
        let mut cells = HashMap::new();
        for year in years {
            for kind in MetricKind::ALL {
                cells.insert((*year, kind), CellValue::Unset);
            }
        }
        MetricGrid {
            years: years.to_vec(),
            cells,
        }
    }

    /// The configured reporting years
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Record a raw edit for one cell
    ///
    /// The value is stored verbatim, without coercion, so incremental and
    /// partially-filled editing works.
    ///
    /// # Errors
    /// * Returns an error if the year is not a configured reporting year
    pub fn apply_edit(&mut self, year: i32, kind: MetricKind, raw: &str) -> Result<(), String> {
        if !self.years.contains(&year) {
            return Err(format!("{} is not a supported reporting year", year));
        }
        self.cells.insert((year, kind), CellValue::Raw(raw.to_string()));
        Ok(())
    }

    /// The current cell content
    pub fn cell(&self, year: i32, kind: MetricKind) -> &CellValue {
        self.cells.get(&(year, kind)).unwrap_or(&CellValue::Unset)
    }

    /// Numeric value of a cell, if it is populated
    ///
    /// A cell is populated when its raw content parses to a finite number.
    pub fn value(&self, year: i32, kind: MetricKind) -> Option<f64> {
        match self.cell(year, kind) {
            CellValue::Unset => None,
            CellValue::Raw(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => None,
            },
        }
    }

    /// Convert the sparse grid into the dense per-year series
    ///
    /// Each configured year contributes one `YearSeries` carrying only its
    /// populated metrics; a year with zero populated metrics is dropped
    /// entirely.
    pub fn dense_series(&self) -> Vec<YearSeries> {
        self.years
            .iter()
            .map(|year| YearSeries {
                year: *year,
                carbon_emissions: self.value(*year, MetricKind::CarbonEmissions),
                water_usage: self.value(*year, MetricKind::WaterUsage),
                waste_generated: self.value(*year, MetricKind::WasteGenerated),
                energy_consumption: self.value(*year, MetricKind::EnergyConsumption),
            })
            .filter(|series| series.populated_count() > 0)
            .collect()
    }

    /// Dense series converted to submission inputs
    pub fn submission(&self) -> Vec<YearlyMetricInput> {
        self.dense_series().into_iter().map(Into::into).collect()
    }

    /// True when every (year x metric) cell is populated
    ///
    /// Submission is only permitted when this holds.
    pub fn is_complete(&self) -> bool {
        self.years.iter().all(|year| {
            MetricKind::ALL
                .iter()
                .all(|kind| self.value(*year, *kind).is_some())
        })
    }

    /// Relative performance against the benchmark, as a percentage
    ///
    /// Computed as (value-or-zero / benchmark) * 100, rounded to one decimal.
    /// An unset cell reads as zero, matching the dashboard's summary cards.
    pub fn benchmark_performance(&self, year: i32, kind: MetricKind, benchmarks: &Benchmarks) -> f64 {
        let value = self.value(year, kind).unwrap_or(0.0);
        let percentage = (value / benchmarks.get(kind)) * 100.0;
        (percentage * 10.0).round() / 10.0
    }

    /// True when the performance percentage exceeds the benchmark
    ///
    /// For emissions/waste-type metrics lower is better, so > 100 is flagged
    /// as "worse"; the convention is applied uniformly to all kinds.
    pub fn exceeds_benchmark(&self, year: i32, kind: MetricKind, benchmarks: &Benchmarks) -> bool {
        self.benchmark_performance(year, kind, benchmarks) > 100.0
    }

    /// Rebuild the grid from the server's canonical records
    ///
    /// Every cell is reset to unset, then each record whose year is configured
    /// populates all four metric cells. Records for other years are silently
    /// ignored.
    pub fn load_records(&mut self, records: &[MetricRecord]) {
        for year in &self.years {
            for kind in MetricKind::ALL {
                self.cells.insert((*year, kind), CellValue::Unset);
            }
        }

        for record in records {
            if !self.years.contains(&record.year) {
                continue;
            }
            for kind in MetricKind::ALL {
                let value = match kind {
                    MetricKind::CarbonEmissions => record.carbon_emissions,
                    MetricKind::WaterUsage => record.water_usage,
                    MetricKind::WasteGenerated => record.waste_generated,
                    MetricKind::EnergyConsumption => record.energy_consumption,
                };
                self.cells
                    .insert((record.year, kind), CellValue::Raw(format_value(value)));
            }
        }
    }
}

/// Format a stored numeric value back into form-input text
///
/// Whole numbers render without a trailing `.0` so a reloaded grid looks the
/// way the user typed it.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

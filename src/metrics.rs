use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// One persisted metric record, owned by exactly one user
///
/// At most one record exists per (user, year) pair; the reconciler enforces
/// this with find-then-write, not with a storage-level uniqueness guarantee.
/// `wasteGenerated` is the canonical field name on the wire and on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    /// Record identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning user's id; immutable after creation
    pub user: String,

    /// Reporting year; together with `user`, the natural key
    pub year: i32,

    #[serde(rename = "carbonEmissions")]
    pub carbon_emissions: f64,

    #[serde(rename = "waterUsage")]
    pub water_usage: f64,

    #[serde(rename = "wasteGenerated", alias = "wasteDistributed")]
    pub waste_generated: f64,

    #[serde(rename = "energyConsumption")]
    pub energy_consumption: f64,
}

/// One element of a batch submission
///
/// Every field is optional at parse time so a missing field can be reported
/// per year instead of failing the whole request body in the framework layer.
/// The legacy `wasteDistributed` spelling is accepted as an input alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyMetricInput {
    pub year: Option<i32>,

    #[serde(rename = "carbonEmissions")]
    pub carbon_emissions: Option<f64>,

    #[serde(rename = "waterUsage")]
    pub water_usage: Option<f64>,

    #[serde(rename = "wasteGenerated", alias = "wasteDistributed")]
    pub waste_generated: Option<f64>,

    #[serde(rename = "energyConsumption")]
    pub energy_consumption: Option<f64>,
}

/// A submission that passed field validation
struct ValidatedInput {
    year: i32,
    carbon_emissions: f64,
    water_usage: f64,
    waste_generated: f64,
    energy_consumption: f64,
}

impl YearlyMetricInput {
    /// Check that the year and all four metric fields are present and finite
    ///
    /// Zero is a legal metric value (zero waste is a real possibility), so
    /// only absence and non-finite numbers are rejected.
    fn validate(&self) -> Result<ValidatedInput, String> {
        let year_text = match self.year {
            Some(year) => year.to_string(),
            None => "unspecified".to_string(),
        };

        let require = |value: Option<f64>| -> Result<f64, String> {
            match value {
                Some(v) if v.is_finite() => Ok(v),
                _ => Err(format!("Invalid metric data for year {}", year_text)),
            }
        };

        Ok(ValidatedInput {
            year: self
                .year
                .ok_or_else(|| format!("Invalid metric data for year {}", year_text))?,
            carbon_emissions: require(self.carbon_emissions)?,
            water_usage: require(self.water_usage)?,
            waste_generated: require(self.waste_generated)?,
            energy_consumption: require(self.energy_consumption)?,
        })
    }
}

/// JSON-file-backed store of metric records
///
/// Records for all users live in a single JSON document; the file is created
/// empty on open and rewritten as a whole on every successful reconcile.
/// Every operation holds the store lock, so concurrent requests against a
/// shared store serialize their read-modify-write cycles instead of erasing
/// each other's committed records.
pub struct MetricStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MetricStore {
    /// Open (and initialize if missing) the metric store at the given path
    ///
    /// # Errors
    /// * Returns an error if the parent directory or the file cannot be created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)
                    .map_err(|_| "Failed to create metrics directory".to_string())?;
            }
        }

        if !path.exists() {
            let mut file =
                File::create(&path).map_err(|_| "Failed to create metrics file".to_string())?;
            file.write_all(b"[]")
                .map_err(|_| "Failed to initialize metrics file".to_string())?;
        }

        Ok(MetricStore {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Read every record in the store
    fn read_all(&self) -> Result<Vec<MetricRecord>, String> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open metrics file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read metrics file".to_string());
        }

        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(_) => Err("Failed to parse metrics data".to_string()),
        }
    }

    /// Rewrite the store with the given record set
    ///
    /// The new content is written to a temporary file in the same directory
    /// and renamed over the store file, so a reader never observes a
    /// truncated document.
    fn write_all(&self, records: &[MetricRecord]) -> Result<(), String> {
        let json = match serde_json::to_string_pretty(records) {
            Ok(json) => json,
            Err(_) => return Err("Failed to serialize metrics data".to_string()),
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut file = match NamedTempFile::new_in(&dir) {
            Ok(file) => file,
            Err(_) => return Err("Failed to create metrics file".to_string()),
        };

        if file.write_all(json.as_bytes()).is_err() {
            return Err("Failed to write metrics data".to_string());
        }

        if file.persist(&self.path).is_err() {
            return Err("Failed to write metrics data".to_string());
        }

        Ok(())
    }

    /// Apply a batch of yearly submissions for one user, all-or-nothing
    ///
    /// Every submission is validated before anything is written, so a single
    /// invalid entry fails the whole batch with no partial effects. Each valid
    /// submission then finds its (user, year) record and replaces all four
    /// metric fields, or creates the record if none exists. Two submissions
    /// for the same year within one batch resolve last-write-wins onto the
    /// single record for that year.
    ///
    /// # Arguments
    /// * `user` - Owner of every record touched by the batch
    /// * `submissions` - The yearly inputs, applied in order
    ///
    /// # Returns
    /// * `Result<Vec<MetricRecord>, String>` - The resulting canonical record
    ///   per submission, in input order
    ///
    /// # Errors
    /// * A missing or non-finite field fails the batch with a message naming
    ///   the offending year; storage failures surface as generic messages
    pub fn reconcile(
        &self,
        user: &str,
        submissions: &[YearlyMetricInput],
    ) -> Result<Vec<MetricRecord>, String> {
        let mut validated = Vec::with_capacity(submissions.len());
        for submission in submissions {
            validated.push(submission.validate()?);
        }

        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_all()?;
        let mut results = Vec::with_capacity(validated.len());

        for input in validated {
            let existing = records
                .iter()
                .position(|record| record.user == user && record.year == input.year);

            let record = match existing {
                Some(index) => {
                    let record = &mut records[index];
                    record.carbon_emissions = input.carbon_emissions;
                    record.water_usage = input.water_usage;
                    record.waste_generated = input.waste_generated;
                    record.energy_consumption = input.energy_consumption;
                    record.clone()
                }
                None => {
                    let record = MetricRecord {
                        id: Uuid::new_v4().to_string(),
                        user: user.to_string(),
                        year: input.year,
                        carbon_emissions: input.carbon_emissions,
                        water_usage: input.water_usage,
                        waste_generated: input.waste_generated,
                        energy_consumption: input.energy_consumption,
                    };
                    records.push(record.clone());
                    record
                }
            };

            results.push(record);
        }

        self.write_all(&records)?;

        // A later submission for the same year may have replaced an earlier
        // result's fields; report the final state for every entry.
        for result in results.iter_mut() {
            if let Some(record) = records
                .iter()
                .find(|record| record.user == user && record.year == result.year)
            {
                *result = record.clone();
            }
        }

        Ok(results)
    }

    /// All records owned by the given user, in storage order
    pub fn list(&self, user: &str) -> Result<Vec<MetricRecord>, String> {
        let _guard = self.lock.lock().unwrap();
        let records = self.read_all()?;
        Ok(records
            .into_iter()
            .filter(|record| record.user == user)
            .collect())
    }
}

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{Result, WarningError};
use crate::models::{CaseRecord, Series, SeriesPoint};

/// Weekly case counts for every region, immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CaseRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Distinct region names, sorted. Feeds the region selector.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Process-owned holder for the dataset: filled on first access, read-only afterwards.
#[derive(Debug, Default)]
pub struct DatasetCache {
    cell: OnceLock<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cell.get() {
            debug!(path = %path.display(), "dataset served from cache");
            return Ok(Arc::clone(dataset));
        }

        let loaded = Arc::new(load_dataset(path)?);
        Ok(Arc::clone(self.cell.get_or_init(|| loaded)))
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    // Column aliases cover the MINSA export headers.
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(alias = "departamento")]
        region: String,
        #[serde(alias = "fecha")]
        date: String,
        #[serde(alias = "casos_dengue")]
        case_count: u32,
    }

    if !path.exists() {
        return Err(WarningError::data_load(path, "file not found"));
    }

    let mut reader =
        csv::Reader::from_path(path).map_err(|err| WarningError::data_load(path, err))?;
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = result.map_err(|err| WarningError::data_load(path, err))?;
        let week_start = parse_date(&row.date).ok_or_else(|| {
            WarningError::data_load(
                path,
                format!("line {line}: unparsable date '{}'", row.date),
            )
        })?;

        records.push(CaseRecord {
            region: row.region.trim().to_string(),
            week_start,
            case_count: row.case_count,
        });
    }

    info!(
        path = %path.display(),
        records = records.len(),
        "dataset loaded"
    );

    Ok(Dataset::new(records))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Rows for `region`, ascending by week. Unknown regions yield an empty vector.
pub fn filter_by_region(records: &[CaseRecord], region: &str) -> Vec<CaseRecord> {
    let mut selected: Vec<CaseRecord> = records
        .iter()
        .filter(|record| record.region == region)
        .cloned()
        .collect();
    selected.sort_by_key(|record| record.week_start);
    selected
}

pub fn to_series(records: &[CaseRecord]) -> Series {
    records
        .iter()
        .map(|record| SeriesPoint {
            timestamp: record.week_start,
            value: f64::from(record.case_count),
        })
        .collect()
}

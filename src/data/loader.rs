use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, ObsCoreRecord, SpectralWindow};
use crate::error::TableError;

const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

// ---------------------------------------------------------------------------
// ObsCoreTable – archive rows before harmonization
// ---------------------------------------------------------------------------

/// Rows of an ObsCore-like table, as delivered by TAP or read from a dump.
#[derive(Debug, Clone, Default)]
pub struct ObsCoreTable {
    /// Column names in file order.
    pub columns: Vec<String>,
    pub records: Vec<ObsCoreRecord>,
}

impl ObsCoreTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows whose `Source` (or, failing that, `target_name`) equals `target`.
    pub fn select_source(&self, target: &str) -> ObsCoreTable {
        let column = ["Source", "target_name"]
            .into_iter()
            .find(|c| self.columns.iter().any(|h| h == *c));
        let records = match column {
            Some(col) => self
                .records
                .iter()
                .filter(|r| r.get(col).and_then(MetadataValue::as_text).as_deref() == Some(target))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        ObsCoreTable {
            columns: self.columns.clone(),
            records,
        }
    }

    /// Harmonize the rows into spectral windows.
    ///
    /// `source_tag` overrides any archive-side target name. Missing required
    /// columns fail the whole table; rows with blank required cells are
    /// skipped with a warning.
    pub fn into_windows(self, source_tag: Option<&str>) -> Result<Vec<SpectralWindow>, TableError> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        let map = ColumnMap::resolve(&self.columns)?;

        let mut windows = Vec::with_capacity(self.records.len());
        for (row, record) in self.records.iter().enumerate() {
            match map.window(record, source_tag) {
                Some(w) => windows.push(w),
                None => warn!("Skipping archive row {row}: blank or non-numeric required cell"),
            }
        }
        Ok(windows)
    }
}

// ---------------------------------------------------------------------------
// Column harmonization
// ---------------------------------------------------------------------------

enum FreqColumns {
    /// `min_freq_GHz` / `max_freq_GHz`, already in GHz.
    Ghz,
    /// ObsCore `em_min` / `em_max`, wavelengths in metres.
    Wavelength,
}

struct ColumnMap {
    freq: FreqColumns,
    ang_res: Option<&'static str>,
    band: Option<&'static str>,
    project: &'static str,
    mous: &'static str,
    source: Option<&'static str>,
}

impl ColumnMap {
    fn resolve(columns: &[String]) -> Result<Self, TableError> {
        let has = |name: &str| columns.iter().any(|c| c == name);

        let freq = if has("min_freq_GHz") && has("max_freq_GHz") {
            FreqColumns::Ghz
        } else if has("em_min") && has("em_max") {
            FreqColumns::Wavelength
        } else {
            return Err(TableError::MissingColumn("min_freq_GHz/max_freq_GHz"));
        };

        Ok(ColumnMap {
            freq,
            ang_res: first_present(columns, &["ang_res_arcsec", "best_ang_res", "spatial_resolution"]),
            band: first_present(columns, &["band_list", "band"]),
            project: first_present(columns, &["project_code", "proposal_id"])
                .ok_or(TableError::MissingColumn("project_code"))?,
            mous: first_present(columns, &["member_ous_uid", "member_ous_id"])
                .ok_or(TableError::MissingColumn("member_ous_uid"))?,
            source: first_present(columns, &["Source", "target_name"]),
        })
    }

    fn window(&self, record: &ObsCoreRecord, source_tag: Option<&str>) -> Option<SpectralWindow> {
        let text = |col: &str| record.get(col).and_then(MetadataValue::as_text);
        let number = |col: &str| record.get(col).and_then(MetadataValue::as_f64);

        let (freq_min_ghz, freq_max_ghz) = match self.freq {
            FreqColumns::Ghz => (number("min_freq_GHz")?, number("max_freq_GHz")?),
            FreqColumns::Wavelength => (
                wavelength_to_ghz(number("em_max")?),
                wavelength_to_ghz(number("em_min")?),
            ),
        };

        let source_name = match source_tag {
            Some(tag) => tag.to_string(),
            None => self.source.and_then(text)?,
        };

        Some(SpectralWindow {
            source_name,
            project_code: text(self.project)?,
            band: self.band.and_then(text).unwrap_or_default(),
            freq_min_ghz,
            freq_max_ghz,
            angular_resolution_arcsec: self.ang_res.and_then(number).filter(|r| r.is_finite()),
            dataset_id: text(self.mous)?,
        })
    }
}

fn first_present(columns: &[String], candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|c| columns.iter().any(|h| h == *c))
}

fn wavelength_to_ghz(metres: f64) -> f64 {
    SPEED_OF_LIGHT_M_S / metres / 1e9
}

// ---------------------------------------------------------------------------
// Public entry-point for dumps on disk
// ---------------------------------------------------------------------------

/// Load an archive dump from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per ObsCore field
/// * `.json`    – `[{ "member_ous_uid": ..., "em_min": ..., ... }, ...]`
/// * `.csv`     – header row plus one row per ObsCore record
pub fn load_file(path: &Path) -> Result<ObsCoreTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)?
        }
        other => return Err(TableError::UnsupportedExtension(other.to_string()).into()),
    };
    debug!("Loaded {} archive rows from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV reader (shared with the TAP client)
// ---------------------------------------------------------------------------

/// Read a headed CSV table. Cell types are guessed per value.
pub fn read_csv<R: Read>(reader: R) -> Result<ObsCoreTable, TableError> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::Malformed(format!("CSV headers: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| TableError::Malformed(format!("CSV row {row_no}: {e}")))?;
        let values: ObsCoreRecord = columns
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_metadata_type(value)))
            .collect();
        records.push(values);
    }

    Ok(ObsCoreTable { columns, records })
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    let s = s.trim();
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<ObsCoreTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            record.insert(key.clone(), json_to_metadata(val));
        }
        records.push(record);
    }

    Ok(ObsCoreTable { columns, records })
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet dump with one scalar column per ObsCore field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// the bundled `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<ObsCoreTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut skipped: Vec<&str> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let arrays = columns
            .iter()
            .enumerate()
            .map(|(i, name)| normalize_column(batch.column(i), name))
            .collect::<Result<Vec<_>>>()?;

        for (name, array) in columns.iter().zip(&arrays) {
            if !is_scalar(array.data_type()) && !skipped.contains(&name.as_str()) {
                warn!("Parquet column '{name}' has unsupported type {}, reading as null", array.data_type());
                skipped.push(name);
            }
        }

        for row in 0..batch.num_rows() {
            let record: ObsCoreRecord = columns
                .iter()
                .zip(&arrays)
                .map(|(name, array)| (name.clone(), extract_metadata_value(array, row)))
                .collect();
            records.push(record);
        }
    }

    Ok(ObsCoreTable { columns, records })
}

/// Decode dictionary-encoded and view string columns to plain `Utf8`.
fn normalize_column(col: &ArrayRef, name: &str) -> Result<ArrayRef> {
    let needs_cast = match col.data_type() {
        DataType::Utf8View => true,
        DataType::Dictionary(_, value) => matches!(
            value.as_ref(),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ),
        _ => false,
    };
    if !needs_cast {
        return Ok(Arc::clone(col));
    }
    cast(col, &DataType::Utf8).with_context(|| format!("decoding string column '{name}'"))
}

fn is_scalar(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Null
    )
}

/// Extract a single value from an Arrow column at a given row.
fn extract_metadata_value(col: &ArrayRef, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| MetadataValue::String(s.value(row).to_string()))
            .unwrap_or(MetadataValue::Null),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64))
            .unwrap_or(MetadataValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| MetadataValue::Integer(a.value(row)))
            .unwrap_or(MetadataValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| MetadataValue::Float(a.value(row) as f64))
            .unwrap_or(MetadataValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| MetadataValue::Float(a.value(row)))
            .unwrap_or(MetadataValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| MetadataValue::Bool(a.value(row)))
            .unwrap_or(MetadataValue::Null),
        _ => MetadataValue::Null,
    }
}

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell of an archive table
// ---------------------------------------------------------------------------

/// A dynamically-typed archive cell. TAP CSV, JSON dumps and Parquet dumps
/// all decode into this before harmonization.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => Ok(()),
        }
    }
}

impl MetadataValue {
    /// Numeric view of the cell. Numeric strings are accepted because TAP
    /// CSV leaves some columns quoted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            MetadataValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text view of the cell; `None` for nulls and empty strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            MetadataValue::Null => None,
            MetadataValue::String(s) if s.trim().is_empty() => None,
            other => Some(other.to_string().trim().to_string()),
        }
    }
}

/// One archive row: column name → value.
pub type ObsCoreRecord = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// Transition – one rotational line of the reference table
// ---------------------------------------------------------------------------

/// A rotational transition and its laboratory rest frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Quantum-number label, e.g. `J=2-1`.
    pub label: &'static str,
    /// Rest frequency in GHz.
    pub rest_frequency_ghz: f64,
}

// ---------------------------------------------------------------------------
// SpectralWindow – one archive tuning record
// ---------------------------------------------------------------------------

/// One spectral-window record as reported by the archive.
///
/// `freq_min_ghz <= freq_max_ghz` is expected but not enforced here; the
/// coverage matcher rejects windows that violate it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralWindow {
    pub source_name: String,
    pub project_code: String,
    pub band: String,
    pub freq_min_ghz: f64,
    pub freq_max_ghz: f64,
    /// Absent when the archive reports no resolution for the row.
    pub angular_resolution_arcsec: Option<f64>,
    /// MOUS identifier.
    pub dataset_id: String,
}

// ---------------------------------------------------------------------------
// SpwMatch – a window paired with one covered transition
// ---------------------------------------------------------------------------

/// A spectral window paired with exactly one transition it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct SpwMatch {
    pub window: SpectralWindow,
    pub transition: Transition,
}

// ---------------------------------------------------------------------------
// MousSummary – per-dataset aggregate
// ---------------------------------------------------------------------------

/// All SPW matches sharing one MOUS id, merged.
#[derive(Debug, Clone, PartialEq)]
pub struct MousSummary {
    pub dataset_id: String,
    /// Taken from the first member row.
    pub source_name: String,
    pub project_code: String,
    pub band: String,
    /// Deduplicated, ascending frequency.
    pub transitions: Vec<Transition>,
    /// Minimum over member windows' own lower bounds.
    pub freq_min_ghz: f64,
    /// Maximum over member windows' own upper bounds.
    pub freq_max_ghz: f64,
    /// Best (smallest) resolution among members that report one.
    pub angular_resolution_arcsec: Option<f64>,
    /// Number of SPW match rows folded into this summary.
    pub member_count: usize,
}

//! Output tables: column contract, cell formatting and file writing.
//!
//! Both renderers consume the same [`TableRow::cells`], so the delimited and
//! typeset files always carry identical content.

pub mod csv;
pub mod latex;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::data::model::{MousSummary, SpwMatch};

pub const SPW_TABLE_STEM: &str = "sio_spw_matches";
pub const MOUS_TABLE_STEM: &str = "sio_mous_summary";

/// Decimal places used for every frequency and resolution cell.
pub const DECIMALS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub align: Align,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        align: Align::Left,
    }
}

const fn num(name: &'static str) -> Column {
    Column {
        name,
        align: Align::Right,
    }
}

/// A row type with a fixed, ordered column contract.
pub trait TableRow {
    const COLUMNS: &'static [Column];

    /// Rendered cells, one per entry of [`Self::COLUMNS`].
    fn cells(&self) -> Vec<String>;
}

pub fn format_number(v: f64) -> String {
    format!("{v:.prec$}", prec = DECIMALS)
}

fn format_optional(v: Option<f64>) -> String {
    v.map(format_number).unwrap_or_default()
}

impl TableRow for SpwMatch {
    const COLUMNS: &'static [Column] = &[
        text("Source"),
        text("Project"),
        text("ALMA_Band"),
        num("min_freq_GHz"),
        num("max_freq_GHz"),
        text("SiO_transition"),
        num("SiO_freq_GHz"),
        num("ang_res_arcsec"),
        text("MOUS_ID"),
    ];

    fn cells(&self) -> Vec<String> {
        let w = &self.window;
        vec![
            w.source_name.clone(),
            w.project_code.clone(),
            w.band.clone(),
            format_number(w.freq_min_ghz),
            format_number(w.freq_max_ghz),
            self.transition.label.to_string(),
            format_number(self.transition.rest_frequency_ghz),
            format_optional(w.angular_resolution_arcsec),
            w.dataset_id.clone(),
        ]
    }
}

impl TableRow for MousSummary {
    const COLUMNS: &'static [Column] = &[
        text("MOUS_ID"),
        text("Source"),
        text("Project"),
        text("ALMA_Band"),
        text("SiO_transitions"),
        text("SiO_freqs_GHz"),
        num("min_freq_GHz"),
        num("max_freq_GHz"),
        num("ang_res_arcsec"),
    ];

    fn cells(&self) -> Vec<String> {
        let labels: Vec<&str> = self.transitions.iter().map(|t| t.label).collect();
        let freqs: Vec<String> = self
            .transitions
            .iter()
            .map(|t| format_number(t.rest_frequency_ghz))
            .collect();
        vec![
            self.dataset_id.clone(),
            self.source_name.clone(),
            self.project_code.clone(),
            self.band.clone(),
            labels.join(", "),
            freqs.join(", "),
            format_number(self.freq_min_ghz),
            format_number(self.freq_max_ghz),
            format_optional(self.angular_resolution_arcsec),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Latex,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Latex => "tex",
        }
    }
}

pub fn render<R: TableRow>(rows: &[R], format: Format) -> Result<String> {
    match format {
        Format::Csv => csv::render(rows),
        Format::Latex => Ok(latex::render(rows)),
    }
}

/// Render both tables in both formats into `dir`. Any failure is fatal.
///
/// Everything is rendered before the first file is written.
pub fn write_tables(dir: &Path, spw: &[SpwMatch], mous: &[MousSummary]) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::new();
    for format in [Format::Csv, Format::Latex] {
        outputs.push((SPW_TABLE_STEM, format, render(spw, format)?));
        outputs.push((MOUS_TABLE_STEM, format, render(mous, format)?));
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(outputs.len());
    for (stem, format, body) in outputs {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    info!(
        "Saved: {SPW_TABLE_STEM}.* ({} rows), {MOUS_TABLE_STEM}.* ({} rows) in {}",
        spw.len(),
        mous.len(),
        dir.display()
    );
    Ok(written)
}

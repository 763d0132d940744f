use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use log::{error, info, warn};

use crate::archive::{ArchiveQuery, BulkDownload};
use crate::config::Config;
use crate::data::aggregate::{aggregate_by_mous, MetadataConflict};
use crate::data::filter::build_matches;
use crate::data::model::{MousSummary, SpectralWindow, SpwMatch};
use crate::error::WindowError;
use crate::export::write_tables;

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// What one run saw and produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub targets_queried: usize,
    pub failed_targets: Vec<String>,
    pub windows_received: usize,
    pub rejected_windows: Vec<WindowError>,
    pub spw_rows: Vec<SpwMatch>,
    pub mous_rows: Vec<MousSummary>,
    pub conflicts: Vec<MetadataConflict>,
    pub downloaded: Vec<String>,
    pub failed_downloads: Vec<String>,
    pub written: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Query every configured target, match, aggregate, write the four output
/// files and, only when `config.download` is set, retrieve each matched MOUS.
///
/// Per-target query failures and per-dataset download failures are logged
/// and skipped. Failing to write an output file aborts the run.
pub fn run(
    config: &Config,
    archive: &dyn ArchiveQuery,
    downloader: Option<&dyn BulkDownload>,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let windows = query_targets(&config.targets, archive, &mut report);
    report.windows_received = windows.len();
    if windows.is_empty() {
        warn!("No observations returned for any target");
    }
    info!("Total ObsCore rows retrieved: {}", windows.len());

    let built = build_matches(&windows);
    report.rejected_windows = built.rejected;
    if built.matches.is_empty() {
        info!("No SPWs cover any SiO(v=0) line");
    } else {
        info!("Total SiO-covering SPW rows: {}", built.matches.len());
        log_per_source("SiO-covering SPWs", built.matches.iter().map(|m| &m.window));
    }

    let aggregation = aggregate_by_mous(&built.matches);
    info!("Total unique MOUS IDs with SiO coverage: {}", aggregation.summaries.len());

    let mut spw_rows = built.matches;
    let mut mous_rows = aggregation.summaries;
    order_spw_rows(&mut spw_rows);
    order_mous_rows(&mut mous_rows);

    report.written = write_tables(&config.output_dir, &spw_rows, &mous_rows)?;
    report.spw_rows = spw_rows;
    report.mous_rows = mous_rows;
    report.conflicts = aggregation.conflicts;

    match (config.download, downloader) {
        (false, _) => info!("Download stage disabled (download = false)"),
        (true, None) => warn!("Download requested but no downloader is available"),
        (true, Some(downloader)) => download_all(downloader, &mut report),
    }

    Ok(report)
}

fn query_targets(
    targets: &[String],
    archive: &dyn ArchiveQuery,
    report: &mut RunReport,
) -> Vec<SpectralWindow> {
    let mut all = Vec::new();
    for target in targets {
        info!("=== Querying ALMA archive for: {target} ===");
        report.targets_queried += 1;
        match archive.query(target) {
            Ok(windows) if windows.is_empty() => info!("  No ObsCore rows returned for {target}"),
            Ok(windows) => all.extend(windows),
            Err(err) => {
                error!("  Query failed for {target}: {err}");
                report.failed_targets.push(target.clone());
            }
        }
    }
    if !all.is_empty() {
        log_per_source("ObsCore rows", all.iter());
    }
    all
}

fn log_per_source<'a>(what: &str, windows: impl Iterator<Item = &'a SpectralWindow>) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for w in windows {
        *counts.entry(w.source_name.as_str()).or_default() += 1;
    }
    info!("{what} per source:");
    for (source, n) in counts {
        info!("  {source:<12} {n}");
    }
}

fn download_all(downloader: &dyn BulkDownload, report: &mut RunReport) {
    info!("Downloading {} public MOUS datasets", report.mous_rows.len());
    for summary in &report.mous_rows {
        let uid = &summary.dataset_id;
        info!("Retrieving {uid} ...");
        match downloader.download(uid) {
            Ok(()) => report.downloaded.push(uid.clone()),
            Err(err) => {
                error!("  Failed to download {uid}: {err}");
                report.failed_downloads.push(uid.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report ordering
// ---------------------------------------------------------------------------

/// Stable sort by (Source, Project, ALMA_Band, SiO_freq_GHz).
pub fn order_spw_rows(rows: &mut [SpwMatch]) {
    rows.sort_by(|a, b| {
        let (wa, wb) = (&a.window, &b.window);
        wa.source_name
            .cmp(&wb.source_name)
            .then_with(|| wa.project_code.cmp(&wb.project_code))
            .then_with(|| wa.band.cmp(&wb.band))
            .then_with(|| {
                a.transition
                    .rest_frequency_ghz
                    .total_cmp(&b.transition.rest_frequency_ghz)
            })
    });
}

/// Stable sort by (Source, Project).
pub fn order_mous_rows(rows: &mut [MousSummary]) {
    rows.sort_by(|a, b| {
        a.source_name
            .cmp(&b.source_name)
            .then_with(|| a.project_code.cmp(&b.project_code))
    });
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use maps_sio::archive::{AlmaTap, ArchiveQuery, BulkDownload, DatalinkDownloader, FileArchive, Sesame};
use maps_sio::{pipeline, Config};

const USAGE: &str = "usage: maps-sio [--config FILE] [--dump FILE] [--output DIR] [--download]";

struct Args {
    config: Option<PathBuf>,
    dump: Option<PathBuf>,
    output: Option<PathBuf>,
    download: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        dump: None,
        output: None,
        download: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(it.next().context(USAGE)?.into()),
            "--dump" => args.dump = Some(it.next().context(USAGE)?.into()),
            "--output" => args.output = Some(it.next().context(USAGE)?.into()),
            "--download" => args.download = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{other}'\n{USAGE}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if args.dump.is_some() {
        config.archive_dump = args.dump;
    }
    if let Some(dir) = args.output {
        config.output_dir = dir;
    }
    config.download |= args.download;
    config.validate()?;

    info!("==== MAPS SiO Archive Search ====");

    let archive: Box<dyn ArchiveQuery> = match &config.archive_dump {
        Some(path) => Box::new(FileArchive::open(path)?),
        None => {
            let resolver = Sesame::new(config.resolver_url.clone(), config.timeout())?;
            Box::new(AlmaTap::new(
                &config.archive_url,
                resolver,
                config.search_radius_arcmin,
                config.timeout(),
            )?)
        }
    };

    let downloader: Option<Box<dyn BulkDownload>> = if config.download {
        Some(Box::new(DatalinkDownloader::new(
            &config.archive_url,
            config.download_dir.clone(),
        )?))
    } else {
        None
    };

    let report = pipeline::run(&config, archive.as_ref(), downloader.as_deref())?;

    info!(
        "Done: {} targets ({} failed), {} windows ({} rejected), {} SPW rows, {} MOUS",
        report.targets_queried,
        report.failed_targets.len(),
        report.windows_received,
        report.rejected_windows.len(),
        report.spw_rows.len(),
        report.mous_rows.len()
    );
    if config.download {
        info!(
            "Downloads: {} ok, {} failed",
            report.downloaded.len(),
            report.failed_downloads.len()
        );
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// The MAPS protoplanetary disks.
pub const MAPS_SOURCES: [&str; 5] = ["IM Lup", "AS 209", "GM Aur", "HD 163296", "MWC 480"];

/// Run configuration. Every field has a default, so a JSON file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub targets: Vec<String>,
    pub search_radius_arcmin: f64,
    /// Archive root; TAP and DataLink endpoints hang off it.
    pub archive_url: String,
    pub resolver_url: String,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    /// Retrieve every matched MOUS after the tables are written.
    pub download: bool,
    pub download_dir: PathBuf,
    /// Read archive rows from this dump instead of the network.
    pub archive_dump: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: MAPS_SOURCES.iter().map(|s| s.to_string()).collect(),
            search_radius_arcmin: 1.0,
            archive_url: "https://almascience.eso.org".to_string(),
            resolver_url: "https://cds.unistra.fr/cgi-bin/nph-sesame/-oI/A".to_string(),
            timeout_secs: 60,
            output_dir: PathBuf::from("."),
            download: false,
            download_dir: PathBuf::from("alma_data"),
            archive_dump: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.search_radius_arcmin.is_finite() && self.search_radius_arcmin > 0.0) {
            bail!("search_radius_arcmin must be positive, got {}", self.search_radius_arcmin);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            bail!("targets must not contain blank names");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_never_download() {
        let config = Config::default();
        assert!(!config.download);
        assert_eq!(config.targets.len(), 5);
        assert_eq!(config.search_radius_arcmin, 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "targets": ["IM Lup"], "output_dir": "out" }"#).unwrap();
        assert_eq!(config.targets, vec!["IM Lup"]);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.download);
        assert_eq!(config.archive_url, "https://almascience.eso.org");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "do_download": true }"#).is_err());
    }

    #[test]
    fn non_positive_radius_is_invalid() {
        let config = Config {
            search_radius_arcmin: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;

use super::sesame::NameResolver;
use super::ArchiveQuery;
use crate::data::loader::read_csv;
use crate::data::model::SpectralWindow;
use crate::error::ArchiveError;

const OBSCORE_COLUMNS: &str =
    "proposal_id, target_name, s_ra, s_dec, band_list, em_min, em_max, spatial_resolution, member_ous_uid";

/// Synchronous TAP cone search over the public ALMA ObsCore table.
pub struct AlmaTap<N: NameResolver> {
    client: Client,
    sync_url: String,
    resolver: N,
    radius_arcmin: f64,
}

impl<N: NameResolver> AlmaTap<N> {
    /// `archive_url` is the archive root, e.g. `https://almascience.eso.org`.
    pub fn new(
        archive_url: &str,
        resolver: N,
        radius_arcmin: f64,
        timeout: Duration,
    ) -> Result<Self, ArchiveError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            sync_url: format!("{}/tap/sync", archive_url.trim_end_matches('/')),
            resolver,
            radius_arcmin,
        })
    }
}

/// ADQL cone search restricted to public data.
pub fn cone_query(ra_deg: f64, dec_deg: f64, radius_arcmin: f64) -> String {
    format!(
        "SELECT {OBSCORE_COLUMNS} FROM ivoa.obscore \
         WHERE INTERSECTS(CIRCLE('ICRS', {ra_deg:.8}, {dec_deg:.8}, {:.8}), s_region) = 1 \
         AND data_rights = 'Public'",
        radius_arcmin / 60.0
    )
}

impl<N: NameResolver> ArchiveQuery for AlmaTap<N> {
    fn query(&self, target: &str) -> Result<Vec<SpectralWindow>, ArchiveError> {
        let (ra, dec) = self.resolver.resolve(target)?;
        let adql = cone_query(ra, dec, self.radius_arcmin);
        debug!("ADQL for {target}: {adql}");

        let response = self
            .client
            .get(&self.sync_url)
            .query(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("QUERY", adql.as_str()),
            ])
            .send()?
            .error_for_status()?;

        let table = read_csv(response)?;
        info!("{target}: {} ObsCore rows", table.len());
        Ok(table.into_windows(Some(target))?)
    }
}

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use tempfile::NamedTempFile;

use super::BulkDownload;
use crate::error::ArchiveError;

/// Downloads MOUS products listed by the archive's DataLink service.
pub struct DatalinkDownloader {
    client: Client,
    sync_url: String,
    dir: PathBuf,
}

impl DatalinkDownloader {
    /// No request timeout: product tarballs can take arbitrarily long.
    pub fn new(archive_url: &str, dir: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let client = Client::builder().timeout(None).build()?;
        Ok(Self {
            client,
            sync_url: format!("{}/datalink/sync", archive_url.trim_end_matches('/')),
            dir: dir.into(),
        })
    }

    fn fetch(&self, url: &str) -> Result<(), ArchiveError> {
        let name = file_name(url);
        let target = self.dir.join(name);
        if target.exists() {
            info!("  {name} already present, skipping");
            return Ok(());
        }

        let mut response = self.client.get(url).send()?.error_for_status()?;
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            let bytes = response.copy_to(&mut writer)?;
            writer.flush()?;
            debug!("  {name}: {bytes} bytes");
        }
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl DatalinkDownloader {
    fn get_text(&self, url: &str) -> Result<String, ArchiveError> {
        Ok(self.client.get(url).send()?.error_for_status()?.text()?)
    }
}

impl BulkDownload for DatalinkDownloader {
    fn download(&self, dataset_id: &str) -> Result<(), ArchiveError> {
        fs::create_dir_all(&self.dir)?;

        let listing = self
            .client
            .get(&self.sync_url)
            .query(&[("ID", dataset_id)])
            .send()?
            .error_for_status()?
            .text()?;

        let urls = collect_products(&listing, |url| self.get_text(url));
        if urls.is_empty() {
            return Err(ArchiveError::NoProducts(dataset_id.to_string()));
        }
        info!("{dataset_id}: {} product(s)", urls.len());

        for url in &urls {
            self.fetch(url)?;
        }
        Ok(())
    }
}

/// Products of `listing` followed by those of every DataLink service it
/// links to, resolved one level down. A service that cannot be fetched is
/// logged and skipped.
pub fn collect_products<F>(listing: &str, mut fetch_listing: F) -> Vec<String>
where
    F: FnMut(&str) -> Result<String, ArchiveError>,
{
    let mut urls = product_urls(listing);
    for service in service_urls(listing) {
        match fetch_listing(&service) {
            Ok(nested) => {
                for url in product_urls(&nested) {
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
            Err(e) => warn!("DataLink service {service} failed: {e}"),
        }
    }
    urls
}

/// Product URLs from a DataLink VOTable: every cell holding an http(s)
/// link to a file under the data portal.
pub fn product_urls(votable: &str) -> Vec<String> {
    links_containing(votable, "/dataPortal/")
}

/// Nested DataLink services referenced from a listing.
pub fn service_urls(votable: &str) -> Vec<String> {
    links_containing(votable, "/datalink/sync")
}

fn links_containing(votable: &str, needle: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for cell in cells(votable) {
        if cell.starts_with("http") && cell.contains(needle) && !urls.contains(&cell) {
            urls.push(cell);
        }
    }
    urls
}

/// Text of every `TD` cell in document order.
fn cells(votable: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut rest = votable;
    while let Some(start) = rest.find("<TD") {
        rest = &rest[start + 3..];
        if !(rest.starts_with(['>', '/']) || rest.starts_with(char::is_whitespace)) {
            continue;
        }
        let Some(open_end) = rest.find('>') else {
            break;
        };
        let self_closing = rest[..open_end].ends_with('/');
        rest = &rest[open_end + 1..];
        if self_closing {
            cells.push(String::new());
            continue;
        }
        let Some(end) = rest.find("</TD>") else {
            break;
        };
        cells.push(cell_text(&rest[..end]));
        rest = &rest[end + 5..];
    }
    cells
}

fn cell_text(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("<![CDATA[").and_then(|s| s.strip_suffix("]]>")) {
        Some(inner) => inner.trim().to_string(),
        None => raw.replace("&amp;", "&"),
    }
}

fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<VOTABLE><RESOURCE><TABLE><DATA><TABLEDATA>
<TR><TD>uid://A001/X1/X2</TD><TD>https://almascience.eso.org/dataPortal/2018.1.01055.L_uid___A001_X1_X2_001_of_001.tar</TD><TD>#this</TD></TR>
<TR><TD>uid://A001/X1/X2</TD><TD>https://almascience.eso.org/datalink/sync?ID=uid___A001_X1_X2&amp;x=1</TD><TD>#aux</TD></TR>
<TR><TD>uid://A001/X1/X2</TD><TD>https://almascience.eso.org/dataPortal/member.uid___A001_X1_X2.README.txt</TD><TD>#documentation</TD></TR>
</TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>"#;

    #[test]
    fn top_level_listing_yields_portal_links_and_one_service() {
        assert_eq!(
            service_urls(LISTING),
            vec!["https://almascience.eso.org/datalink/sync?ID=uid___A001_X1_X2&x=1"]
        );
        let urls = product_urls(LISTING);
        assert_eq!(
            urls,
            vec![
                "https://almascience.eso.org/dataPortal/2018.1.01055.L_uid___A001_X1_X2_001_of_001.tar",
                "https://almascience.eso.org/dataPortal/member.uid___A001_X1_X2.README.txt",
            ]
        );
    }

    const NESTED: &str = r#"<VOTABLE><RESOURCE><TABLE><DATA><TABLEDATA>
<TR><TD>uid://A001/X1/X2</TD><TD>https://almascience.eso.org/dataPortal/uid___A002_Xd1_X3.asdm.sdm.tar</TD><TD>#this</TD></TR>
<TR><TD>uid://A001/X1/X2</TD><TD>https://almascience.eso.org/dataPortal/member.uid___A001_X1_X2.README.txt</TD><TD>#documentation</TD></TR>
</TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>"#;

    #[test]
    fn nested_service_products_are_appended_once() {
        let mut asked = Vec::new();
        let urls = collect_products(LISTING, |url| {
            asked.push(url.to_string());
            Ok(NESTED.to_string())
        });

        assert_eq!(
            asked,
            vec!["https://almascience.eso.org/datalink/sync?ID=uid___A001_X1_X2&x=1"]
        );
        assert_eq!(
            urls,
            vec![
                "https://almascience.eso.org/dataPortal/2018.1.01055.L_uid___A001_X1_X2_001_of_001.tar",
                "https://almascience.eso.org/dataPortal/member.uid___A001_X1_X2.README.txt",
                "https://almascience.eso.org/dataPortal/uid___A002_Xd1_X3.asdm.sdm.tar",
            ]
        );
    }

    #[test]
    fn failing_nested_service_keeps_top_level_products() {
        let urls = collect_products(LISTING, |url| {
            Err(ArchiveError::NoProducts(url.to_string()))
        });
        assert_eq!(urls, product_urls(LISTING));
    }

    #[test]
    fn nested_listings_are_not_followed_further() {
        let urls = collect_products(LISTING, |_| Ok(LISTING.to_string()));
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn cells_with_attributes_or_cdata_are_read() {
        let listing = r#"<TABLEDATA><TR>
<TD ref="access_url">https://almascience.eso.org/dataPortal/a.tar</TD>
<TD><![CDATA[ https://almascience.eso.org/dataPortal/b.tar?x=1&y=2 ]]></TD>
<TD/>
<TDX>https://almascience.eso.org/dataPortal/not_a_cell.tar</TDX>
</TR></TABLEDATA>"#;
        assert_eq!(
            product_urls(listing),
            vec![
                "https://almascience.eso.org/dataPortal/a.tar",
                "https://almascience.eso.org/dataPortal/b.tar?x=1&y=2",
            ]
        );
        assert!(service_urls(listing).is_empty());
    }

    #[test]
    fn empty_listing_has_no_products() {
        assert!(product_urls("<VOTABLE></VOTABLE>").is_empty());
        assert!(collect_products("<VOTABLE></VOTABLE>", |_| Ok(String::new())).is_empty());
    }

    #[test]
    fn file_name_is_last_path_segment() {
        assert_eq!(file_name("https://host/dataPortal/a/b.tar?x=1"), "b.tar");
        assert_eq!(file_name("https://host/c.fits"), "c.fits");
    }
}

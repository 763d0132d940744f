use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;

use crate::error::ArchiveError;

/// Target name → ICRS (ra, dec) in degrees.
pub trait NameResolver {
    fn resolve(&self, name: &str) -> Result<(f64, f64), ArchiveError>;
}

/// CDS Sesame name resolver (plain-text `-oI` output).
pub struct Sesame {
    client: Client,
    url: String,
}

impl Sesame {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ArchiveError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl NameResolver for Sesame {
    fn resolve(&self, name: &str) -> Result<(f64, f64), ArchiveError> {
        let mut url = Url::parse(&self.url).map_err(|_| ArchiveError::Unresolved(name.to_string()))?;
        url.set_query(Some(name));

        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        let coords = parse_sesame(&body).ok_or_else(|| ArchiveError::Unresolved(name.to_string()))?;
        debug!("Resolved {name} to ra={:.6} dec={:.6}", coords.0, coords.1);
        Ok(coords)
    }
}

/// First `%J ra dec` line of a Sesame response.
pub fn parse_sesame(body: &str) -> Option<(f64, f64)> {
    body.lines().find_map(|line| {
        let rest = line.strip_prefix("%J ")?;
        let mut parts = rest.split_whitespace();
        let ra = parts.next()?.parse().ok()?;
        let dec = parts.next()?.parse().ok()?;
        Some((ra, dec))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_j_line() {
        let body = "\
# IM Lup\t#Q12345
#=S=Simbad (via url):    1
%@ 4196411
%I.0 V* IM Lup
%J 237.76765417 -37.05635500 = 15:51:04.23 -37:03:22.8
%J 1.0 2.0
";
        assert_eq!(parse_sesame(body), Some((237.76765417, -37.056355)));
    }

    #[test]
    fn unresolved_name_has_no_coordinates() {
        let body = "# Nowhere\t#Q1\n#! *** Nothing found *** \n";
        assert_eq!(parse_sesame(body), None);
    }
}

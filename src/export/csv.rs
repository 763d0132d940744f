use anyhow::{Context, Result};

use super::TableRow;

/// Comma-separated rendering with a header row.
pub fn render<R: TableRow>(rows: &[R]) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(R::COLUMNS.iter().map(|c| c.name))
        .context("writing CSV header")?;
    for (i, row) in rows.iter().enumerate() {
        writer
            .write_record(row.cells())
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV buffer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{MousSummary, SpectralWindow, SpwMatch};
    use crate::data::transitions::sio_v0;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_only_for_empty_table() {
        let out = render::<MousSummary>(&[]).unwrap();
        assert_eq!(
            out,
            "MOUS_ID,Source,Project,ALMA_Band,SiO_transitions,SiO_freqs_GHz,min_freq_GHz,max_freq_GHz,ang_res_arcsec\n"
        );
    }

    #[test]
    fn cells_with_commas_are_quoted() {
        let summary = MousSummary {
            dataset_id: "uid://A001/X1/X2".into(),
            source_name: "GM Aur".into(),
            project_code: "2019.1.00001.S".into(),
            band: "6".into(),
            transitions: vec![sio_v0()[4], sio_v0()[5]],
            freq_min_ghz: 216.0,
            freq_max_ghz: 262.0,
            angular_resolution_arcsec: Some(0.25),
            member_count: 2,
        };
        let out = render(&[summary]).unwrap();
        let line = out.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "uid://A001/X1/X2,GM Aur,2019.1.00001.S,6,\"J=5-4, J=6-5\",\"217.104980, 260.518200\",216.000000,262.000000,0.250000"
        );
    }

    #[test]
    fn spw_row_renders_fixed_precision() {
        let row = SpwMatch {
            window: SpectralWindow {
                source_name: "MWC 480".into(),
                project_code: "p".into(),
                band: "3".into(),
                freq_min_ghz: 85.5,
                freq_max_ghz: 87.25,
                angular_resolution_arcsec: Some(1.0),
                dataset_id: "uid://m".into(),
            },
            transition: sio_v0()[1],
        };
        let out = render(&[row]).unwrap();
        assert_eq!(
            out.lines().nth(1).unwrap(),
            "MWC 480,p,3,85.500000,87.250000,J=2-1,86.846960,1.000000,uid://m"
        );
    }
}

use std::collections::HashMap;

use log::warn;

use super::model::{MousSummary, SpwMatch};

// ---------------------------------------------------------------------------
// MOUS aggregation
// ---------------------------------------------------------------------------

/// Which first-member attribute another member disagreed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Source,
    Project,
    Band,
}

/// A member row whose metadata differs from the first-seen row of its MOUS.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataConflict {
    pub dataset_id: String,
    pub field: ConflictField,
    pub kept: String,
    pub ignored: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub summaries: Vec<MousSummary>,
    pub conflicts: Vec<MetadataConflict>,
}

/// Group SPW matches by MOUS id, one summary per id in order of first
/// appearance.
///
/// Source, project and band come from the first member; disagreeing members
/// are reported as [`MetadataConflict`]s and do not fail the grouping.
pub fn aggregate_by_mous(matches: &[SpwMatch]) -> Aggregation {
    let mut summaries: Vec<MousSummary> = Vec::new();
    let mut conflicts = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for m in matches {
        let w = &m.window;
        let Some(idx) = slot.get(w.dataset_id.as_str()).copied() else {
            slot.insert(w.dataset_id.as_str(), summaries.len());
            summaries.push(MousSummary {
                dataset_id: w.dataset_id.clone(),
                source_name: w.source_name.clone(),
                project_code: w.project_code.clone(),
                band: w.band.clone(),
                transitions: vec![m.transition],
                freq_min_ghz: w.freq_min_ghz,
                freq_max_ghz: w.freq_max_ghz,
                angular_resolution_arcsec: w.angular_resolution_arcsec,
                member_count: 1,
            });
            continue;
        };

        let summary = &mut summaries[idx];
        for (field, kept, seen) in [
            (ConflictField::Source, &summary.source_name, &w.source_name),
            (ConflictField::Project, &summary.project_code, &w.project_code),
            (ConflictField::Band, &summary.band, &w.band),
        ] {
            let already_seen = conflicts.iter().any(|c: &MetadataConflict| {
                c.dataset_id == w.dataset_id && c.field == field && c.ignored == *seen
            });
            if kept != seen && !already_seen {
                warn!(
                    "MOUS {}: {field:?} '{seen}' disagrees with first-seen '{kept}', keeping '{kept}'",
                    w.dataset_id
                );
                conflicts.push(MetadataConflict {
                    dataset_id: w.dataset_id.clone(),
                    field,
                    kept: kept.clone(),
                    ignored: seen.clone(),
                });
            }
        }

        if !summary
            .transitions
            .iter()
            .any(|t| t.label == m.transition.label)
        {
            summary.transitions.push(m.transition);
        }
        summary.freq_min_ghz = summary.freq_min_ghz.min(w.freq_min_ghz);
        summary.freq_max_ghz = summary.freq_max_ghz.max(w.freq_max_ghz);
        summary.angular_resolution_arcsec =
            match (summary.angular_resolution_arcsec, w.angular_resolution_arcsec) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        summary.member_count += 1;
    }

    for summary in &mut summaries {
        summary
            .transitions
            .sort_by(|a, b| a.rest_frequency_ghz.total_cmp(&b.rest_frequency_ghz));
    }

    Aggregation {
        summaries,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::build_matches;
    use crate::data::model::SpectralWindow;

    fn window(id: &str, lo: f64, hi: f64, res: Option<f64>) -> SpectralWindow {
        SpectralWindow {
            source_name: "HD 163296".into(),
            project_code: "2018.1.01055.L".into(),
            band: "6".into(),
            freq_min_ghz: lo,
            freq_max_ghz: hi,
            angular_resolution_arcsec: res,
            dataset_id: id.into(),
        }
    }

    #[test]
    fn empty_input_yields_no_summaries() {
        let agg = aggregate_by_mous(&[]);
        assert!(agg.summaries.is_empty());
        assert!(agg.conflicts.is_empty());
    }

    #[test]
    fn shared_transition_is_listed_once() {
        let windows = vec![
            window("uid://A", 216.0, 218.0, Some(0.3)),
            window("uid://A", 216.5, 261.0, Some(0.2)),
        ];
        let built = build_matches(&windows);
        assert_eq!(built.matches.len(), 3);

        let agg = aggregate_by_mous(&built.matches);
        assert_eq!(agg.summaries.len(), 1);
        let s = &agg.summaries[0];
        let labels: Vec<_> = s.transitions.iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["J=5-4", "J=6-5"]);
        assert_eq!(s.member_count, 3);
        assert_eq!(s.angular_resolution_arcsec, Some(0.2));
    }

    #[test]
    fn range_is_union_of_window_bounds() {
        // J=2-1 sits near the top of the first window, which extends far below it.
        let windows = vec![
            window("uid://B", 84.0, 86.9, None),
            window("uid://B", 86.0, 88.5, Some(1.1)),
        ];
        let agg = aggregate_by_mous(&build_matches(&windows).matches);
        let s = &agg.summaries[0];
        assert_eq!(s.freq_min_ghz, 84.0);
        assert_eq!(s.freq_max_ghz, 88.5);
        assert_eq!(s.angular_resolution_arcsec, Some(1.1));
    }

    #[test]
    fn transitions_sorted_by_frequency_not_arrival() {
        let windows = vec![
            window("uid://C", 259.0, 262.0, None),
            window("uid://C", 85.0, 87.0, None),
        ];
        let agg = aggregate_by_mous(&build_matches(&windows).matches);
        let labels: Vec<_> = agg.summaries[0].transitions.iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["J=2-1", "J=6-5"]);
    }

    #[test]
    fn groups_partition_the_input_in_first_seen_order() {
        let windows = vec![
            window("uid://Y", 85.0, 87.0, None),
            window("uid://X", 200.0, 350.0, None),
            window("uid://Y", 129.0, 131.0, None),
        ];
        let matches = build_matches(&windows).matches;
        let agg = aggregate_by_mous(&matches);
        let ids: Vec<_> = agg.summaries.iter().map(|s| s.dataset_id.as_str()).collect();
        assert_eq!(ids, vec!["uid://Y", "uid://X"]);
        let total: usize = agg.summaries.iter().map(|s| s.member_count).sum();
        assert_eq!(total, matches.len());
    }

    #[test]
    fn disagreeing_window_is_flagged_once_per_field() {
        // The second window covers J=5-4 through J=8-7 and disagrees on source and band.
        let mut other = window("uid://D", 200.0, 350.0, None);
        other.source_name = "MWC 480".into();
        other.band = "7".into();
        let windows = vec![window("uid://D", 85.0, 87.0, None), other];
        let matches = build_matches(&windows).matches;
        assert_eq!(matches.len(), 5);

        let agg = aggregate_by_mous(&matches);
        let fields: Vec<_> = agg.conflicts.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![ConflictField::Source, ConflictField::Band]);
        assert_eq!(agg.summaries[0].member_count, 5);
    }

    #[test]
    fn inconsistent_source_is_flagged_and_first_wins() {
        let mut other = window("uid://D", 85.0, 87.0, None);
        other.source_name = "MWC 480".into();
        let windows = vec![window("uid://D", 85.0, 87.0, None), other];
        let agg = aggregate_by_mous(&build_matches(&windows).matches);

        assert_eq!(agg.summaries.len(), 1);
        assert_eq!(agg.summaries[0].source_name, "HD 163296");
        assert_eq!(
            agg.conflicts,
            vec![MetadataConflict {
                dataset_id: "uid://D".into(),
                field: ConflictField::Source,
                kept: "HD 163296".into(),
                ignored: "MWC 480".into(),
            }]
        );
    }
}

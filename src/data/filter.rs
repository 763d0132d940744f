use log::warn;

use super::model::{SpectralWindow, SpwMatch, Transition};
use super::transitions::sio_v0;
use crate::error::WindowError;

// ---------------------------------------------------------------------------
// Coverage matcher: which transitions fall inside one window
// ---------------------------------------------------------------------------

/// Return the transitions of `table` whose rest frequency lies inside the
/// window, bounds inclusive, in table order.
///
/// Fails for windows with `freq_min_ghz > freq_max_ghz` or non-finite bounds
/// instead of reporting "no coverage".
pub fn covered_by(
    window: &SpectralWindow,
    table: &[Transition],
) -> Result<Vec<Transition>, WindowError> {
    let (lo, hi) = (window.freq_min_ghz, window.freq_max_ghz);
    if !lo.is_finite() || !hi.is_finite() {
        return Err(WindowError::NonFiniteBounds {
            dataset_id: window.dataset_id.clone(),
        });
    }
    if lo > hi {
        return Err(WindowError::InvalidWindow {
            dataset_id: window.dataset_id.clone(),
            freq_min_ghz: lo,
            freq_max_ghz: hi,
        });
    }

    Ok(table
        .iter()
        .filter(|t| lo <= t.rest_frequency_ghz && t.rest_frequency_ghz <= hi)
        .copied()
        .collect())
}

/// [`covered_by`] against the SiO(v=0) table.
pub fn match_window(window: &SpectralWindow) -> Result<Vec<Transition>, WindowError> {
    covered_by(window, sio_v0())
}

// ---------------------------------------------------------------------------
// SPW match builder
// ---------------------------------------------------------------------------

/// Rows produced by [`build_matches`] plus the windows it had to skip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOutput {
    pub matches: Vec<SpwMatch>,
    pub rejected: Vec<WindowError>,
}

/// Emit one [`SpwMatch`] per (window, covered transition) pair.
///
/// Input order is kept, and within a window the table order. Windows that
/// cover nothing contribute nothing. Malformed windows are skipped with a
/// warning and recorded in [`BuildOutput::rejected`]. Duplicate windows are
/// not collapsed here.
pub fn build_matches(windows: &[SpectralWindow]) -> BuildOutput {
    let mut out = BuildOutput::default();

    for window in windows {
        match match_window(window) {
            Ok(covered) => out.matches.extend(covered.into_iter().map(|transition| SpwMatch {
                window: window.clone(),
                transition,
            })),
            Err(err) => {
                warn!("Skipping window ({}): {err}", window.source_name);
                out.rejected.push(err);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(dataset_id: &str, lo: f64, hi: f64) -> SpectralWindow {
        SpectralWindow {
            source_name: "IM Lup".into(),
            project_code: "2018.1.01055.L".into(),
            band: "6".into(),
            freq_min_ghz: lo,
            freq_max_ghz: hi,
            angular_resolution_arcsec: Some(0.1),
            dataset_id: dataset_id.into(),
        }
    }

    fn labels(ts: &[Transition]) -> Vec<&'static str> {
        ts.iter().map(|t| t.label).collect()
    }

    #[test]
    fn window_around_j2_1_matches_once() {
        let covered = match_window(&window("uid://A001/X1/X1", 85.0, 87.0)).unwrap();
        assert_eq!(labels(&covered), vec!["J=2-1"]);
    }

    #[test]
    fn degenerate_window_without_line_matches_nothing() {
        let covered = match_window(&window("uid://A001/X1/X1", 100.0, 100.0)).unwrap();
        assert!(covered.is_empty());
    }

    #[test]
    fn degenerate_window_on_a_line_matches_it() {
        let covered = match_window(&window("uid://A001/X1/X1", 217.10498, 217.10498)).unwrap();
        assert_eq!(labels(&covered), vec!["J=5-4"]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let at_min = match_window(&window("a", 86.846960, 90.0)).unwrap();
        assert_eq!(labels(&at_min), vec!["J=2-1"]);
        let at_max = match_window(&window("a", 80.0, 86.846960)).unwrap();
        assert_eq!(labels(&at_max), vec!["J=2-1"]);
    }

    #[test]
    fn wide_window_returns_lines_in_frequency_order() {
        let covered = match_window(&window("a", 200.0, 350.0)).unwrap();
        assert_eq!(labels(&covered), vec!["J=5-4", "J=6-5", "J=7-6", "J=8-7"]);
    }

    #[test]
    fn matcher_equals_brute_force_selection() {
        for (lo, hi) in [(0.0, 1000.0), (43.0, 44.0), (130.0, 173.0), (500.0, 520.9), (900.0, 950.0)] {
            let expected: Vec<_> = sio_v0()
                .iter()
                .filter(|t| lo <= t.rest_frequency_ghz && t.rest_frequency_ghz <= hi)
                .map(|t| t.label)
                .collect();
            let got = match_window(&window("a", lo, hi)).unwrap();
            assert_eq!(labels(&got), expected);
        }
    }

    #[test]
    fn inverted_window_is_an_error() {
        let err = match_window(&window("uid://bad", 200.0, 100.0)).unwrap_err();
        assert!(matches!(err, WindowError::InvalidWindow { .. }));
    }

    #[test]
    fn nan_bounds_are_an_error() {
        let err = match_window(&window("uid://nan", f64::NAN, 100.0)).unwrap_err();
        assert!(matches!(err, WindowError::NonFiniteBounds { .. }));
    }

    #[test]
    fn builder_skips_malformed_and_keeps_going() {
        let windows = vec![
            window("uid://bad", 200.0, 100.0),
            window("uid://good", 85.0, 87.0),
        ];
        let out = build_matches(&windows);
        assert_eq!(out.matches.len(), 1);
        assert_eq!(out.matches[0].window.dataset_id, "uid://good");
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn builder_preserves_order_and_duplicates() {
        let windows = vec![
            window("b", 250.0, 262.0),
            window("a", 85.0, 87.0),
            window("a", 85.0, 87.0),
            window("c", 100.0, 110.0),
        ];
        let out = build_matches(&windows);
        let ids: Vec<_> = out.matches.iter().map(|m| m.window.dataset_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "a"]);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn builder_is_idempotent() {
        let windows = vec![window("a", 200.0, 350.0), window("b", 40.0, 90.0)];
        assert_eq!(build_matches(&windows), build_matches(&windows));
    }
}

use std::fmt::Write as _;

use super::report::RunReport;

const MAX_ERROR_SAMPLES: usize = 5;
const ERROR_SAMPLE_WIDTH: usize = 160;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Human-readable end-of-run summary. Only the first few errors are shown;
/// the report file keeps all of them.
pub(crate) fn render_summary(report: &RunReport) -> String {
    let s = &report.statistics;
    let mut out = String::new();
    let _ = writeln!(out, "load finished in {:.1}s", report.duration_seconds);
    let _ = writeln!(
        out,
        "  files: {} total, {} loaded, {} failed, {} skipped",
        s.total, s.success, s.failed, s.skipped
    );
    let _ = writeln!(
        out,
        "  documents: {} indexed, {} already present, {} rejected",
        s.documents_indexed, s.documents_already_present, s.records_rejected
    );

    if !report.documents_by_year.is_empty() {
        let _ = writeln!(out, "  index by year:");
        for (year, count) in &report.documents_by_year {
            let _ = writeln!(out, "    {year}: {count}");
        }
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out, "  errors ({}):", report.errors.len());
        for error in report.errors.iter().take(MAX_ERROR_SAMPLES) {
            let _ = writeln!(
                out,
                "    {}: {}",
                error.file,
                truncate(&error.error, ERROR_SAMPLE_WIDTH)
            );
        }
        if report.errors.len() > MAX_ERROR_SAMPLES {
            let _ = writeln!(
                out,
                "    ... {} more in the run report",
                report.errors.len() - MAX_ERROR_SAMPLES
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::load::runner::{FileError, RunStats};

    fn report_with_errors(count: usize) -> RunReport {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let errors = (0..count)
            .map(|i| FileError {
                file: format!("AN_2022{i:03}.taz"),
                error: "é".repeat(400),
            })
            .collect();
        RunReport::new(
            at,
            at,
            RunStats {
                errors,
                ..RunStats::default()
            },
            BTreeMap::new(),
        )
    }

    #[test]
    fn at_most_five_errors_are_listed() {
        let summary = render_summary(&report_with_errors(8));
        assert!(summary.contains("errors (8):"));
        assert!(summary.contains("AN_2022004.taz"));
        assert!(!summary.contains("AN_2022005.taz"));
        assert!(summary.contains("... 3 more in the run report"));
    }

    #[test]
    fn long_errors_are_truncated_on_char_boundaries() {
        let summary = render_summary(&report_with_errors(1));
        let line = summary.lines().find(|l| l.contains("AN_2022000")).unwrap();
        assert!(line.ends_with("..."));
        assert!(line.chars().count() < 200);
    }

    #[test]
    fn clean_run_has_no_error_section() {
        let summary = render_summary(&report_with_errors(0));
        assert!(!summary.contains("errors"));
    }
}

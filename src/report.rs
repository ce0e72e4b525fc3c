//! Report assembly: canonical ordering, scoring, and rendering.

use chrono::{DateTime, Utc};

use crate::score;
use crate::types::{DiffResult, Grade, PackageMetadata, RepoHealth, Report, ScannerResult};

/// Builds the final report. Scanner results are sorted into canonical
/// order regardless of completion order.
pub fn assemble(
    package: PackageMetadata,
    mut scanners: Vec<ScannerResult>,
    github: Option<RepoHealth>,
    diff: Option<DiffResult>,
    now: DateTime<Utc>,
    duration_ms: u64,
) -> Report {
    scanners.sort_by_key(|result| result.scanner);

    let score = score::total_score(
        &scanners,
        github.as_ref(),
        diff.as_ref(),
        package.trusted_publisher,
        now,
    );
    let grade = Grade::from_score(score);

    Report {
        package,
        scanners,
        github,
        diff,
        score,
        grade,
        verdict: grade.verdict().to_string(),
        duration: duration_ms,
    }
}

/// Plain-text rendering: one summary line per scanner, then the verdict.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} v{}\n",
        report.package.name, report.package.version
    ));
    for result in &report.scanners {
        let status = if result.passed { "pass" } else { "FAIL" };
        out.push_str(&format!(
            "  [{status}] {}: {}\n",
            result.scanner, result.summary
        ));
    }
    if let Some(github) = &report.github {
        if github.found {
            out.push_str(&format!(
                "  repo: {} ({} stars{})\n",
                github.full_name,
                github.stars,
                if github.archived { ", archived" } else { "" }
            ));
        } else {
            out.push_str("  repo: not found\n");
        }
    }
    if let Some(diff) = &report.diff {
        if diff.performed {
            out.push_str(&format!(
                "  diff: {} unexpected, {} build, {} modified\n",
                diff.unexpected_files.len(),
                diff.expected_build_files.len(),
                diff.modified_files.len()
            ));
        } else {
            out.push_str(&format!(
                "  diff: not performed ({})\n",
                diff.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    out.push_str(&format!(
        "score {} grade {} verdict {} ({} ms)\n",
        report.score, report.grade, report.verdict, report.duration
    ));
    out
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

//! Declared-dependency analysis: bloat and unpinned or git versions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::ScanContext;

const BLOAT_WARNING_THRESHOLD: usize = 20;
const BLOAT_CRITICAL_THRESHOLD: usize = 50;

static RE_GIT_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^git(\+https?|\+ssh)?:// |
        ^github: | ^gitlab: | ^bitbucket: |
        ^https?://.+\.git$ |
        ^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$
        ",
    )
    .expect("git version regex")
});

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let Some(manifest) = context.manifest.as_ref() else {
        return ScannerResult::empty(ScannerKind::Dependencies, "No dependencies declared");
    };

    let total = manifest.dependencies.len() + manifest.optional_dependencies.len();
    if total == 0 {
        return ScannerResult::empty(ScannerKind::Dependencies, "No dependencies declared");
    }

    let mut findings = Vec::new();
    if total > BLOAT_CRITICAL_THRESHOLD {
        findings.push(Finding::new(
            ScannerKind::Dependencies,
            Severity::Critical,
            format!("{total} direct dependencies (heavy supply-chain surface)"),
        ));
    } else if total > BLOAT_WARNING_THRESHOLD {
        findings.push(Finding::new(
            ScannerKind::Dependencies,
            Severity::Warning,
            format!("{total} direct dependencies (large supply-chain surface)"),
        ));
    }

    let entries = manifest
        .dependencies
        .iter()
        .chain(manifest.optional_dependencies.iter());
    for (name, version) in entries {
        if is_unpinned(version) {
            findings.push(
                Finding::new(
                    ScannerKind::Dependencies,
                    Severity::Critical,
                    format!("dependency '{name}' has an unpinned version"),
                )
                .with_evidence(format!("{name}: \"{version}\"")),
            );
        } else if RE_GIT_VERSION.is_match(version) {
            findings.push(
                Finding::new(
                    ScannerKind::Dependencies,
                    Severity::Warning,
                    format!("dependency '{name}' resolves from a git URL"),
                )
                .with_evidence(format!("{name}: \"{version}\"")),
            );
        }
    }

    let summary = if findings.is_empty() {
        format!("{total} direct dependencies look reasonable")
    } else {
        format!(
            "{total} direct dependencies, {} issue(s) found",
            findings.len()
        )
    };
    ScannerResult::from_findings(ScannerKind::Dependencies, findings, summary)
}

fn is_unpinned(version: &str) -> bool {
    matches!(version.trim(), "*" | "" | "latest")
}

#[cfg(test)]
#[path = "dependencies_tests.rs"]
mod tests;

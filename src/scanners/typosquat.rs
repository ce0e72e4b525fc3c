//! Edit-distance comparison against the bundled popular-package list.

use crate::data;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::ScanContext;

const TYPO_DISTANCE_LIMIT: usize = 2;

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    run(&context.package_name, data::popular_packages())
}

fn run(package_name: &str, popular: &[String]) -> ScannerResult {
    if popular.is_empty() {
        return ScannerResult::empty(
            ScannerKind::Typosquat,
            "Popular packages list unavailable — skipped",
        );
    }

    let needle = strip_scope(package_name).to_ascii_lowercase();
    if popular
        .iter()
        .any(|candidate| strip_scope(candidate) == needle)
    {
        return ScannerResult::empty(
            ScannerKind::Typosquat,
            format!("{package_name} is a known popular package"),
        );
    }

    let mut close: Vec<(&str, usize)> = popular
        .iter()
        .filter_map(|candidate| {
            let stripped = strip_scope(candidate);
            let distance = bounded_levenshtein(&needle, stripped, TYPO_DISTANCE_LIMIT)?;
            (distance > 0).then_some((candidate.as_str(), distance))
        })
        .collect();
    close.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let findings: Vec<Finding> = close
        .iter()
        .map(|&(candidate, distance)| {
            let severity = if distance == 1 {
                Severity::Critical
            } else {
                Severity::Warning
            };
            Finding::new(
                ScannerKind::Typosquat,
                severity,
                format!(
                    "'{package_name}' is {distance} edit(s) away from popular package '{candidate}'"
                ),
            )
        })
        .collect();

    let summary = if findings.is_empty() {
        "No typosquatting indicators".to_string()
    } else {
        format!(
            "Possible typosquatting: {} similar popular name(s)",
            findings.len()
        )
    };
    ScannerResult::from_findings(ScannerKind::Typosquat, findings, summary)
}

fn strip_scope(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('@') {
        if let Some((_, unscoped)) = rest.split_once('/') {
            return unscoped;
        }
    }
    name
}

/// Row-wise Levenshtein with an early exit once every cell in a row
/// exceeds the bound. Returns `None` when the distance exceeds it.
fn bounded_levenshtein(lhs: &str, rhs: &str, max_distance: usize) -> Option<usize> {
    let lhs_chars = lhs.chars().collect::<Vec<_>>();
    let rhs_chars = rhs.chars().collect::<Vec<_>>();
    let rhs_len = rhs_chars.len();

    if lhs_chars.len().abs_diff(rhs_len) > max_distance {
        return None;
    }

    let mut previous = (0..=rhs_len).collect::<Vec<_>>();
    let mut current = vec![0usize; rhs_len + 1];

    for (i, lhs_char) in lhs_chars.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];

        for (j, rhs_char) in rhs_chars.iter().enumerate() {
            let substitution_cost = usize::from(lhs_char != rhs_char);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            let substitution = previous[j] + substitution_cost;
            current[j + 1] = deletion.min(insertion).min(substitution);
            row_min = row_min.min(current[j + 1]);
        }

        if row_min > max_distance {
            return None;
        }

        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[rhs_len];
    (distance <= max_distance).then_some(distance)
}

#[cfg(test)]
#[path = "typosquat_tests.rs"]
mod tests;

//! Flags native addons and other non-reviewable executable files.

use std::collections::BTreeMap;

use crate::paths;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::{ScanContext, walk_artifact};

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let mut findings = Vec::new();
    let mut by_extension: BTreeMap<String, usize> = BTreeMap::new();

    for file in walk_artifact(&context.root) {
        let Some(ext) = paths::extension(&file.relative) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if !paths::NATIVE_BINARY_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        *by_extension.entry(format!(".{ext}")).or_default() += 1;
        findings.push(
            Finding::new(
                ScannerKind::Binaries,
                Severity::Warning,
                format!("binary file cannot be source-reviewed (.{ext})"),
            )
            .with_file(file.relative),
        );
    }

    let summary = if findings.is_empty() {
        "No binary files found".to_string()
    } else {
        let groups: Vec<String> = by_extension
            .iter()
            .map(|(ext, count)| format!("{count} {ext}"))
            .collect();
        format!(
            "Found {} binary file(s): {}",
            findings.len(),
            groups.join(", ")
        )
    };
    ScannerResult::from_findings(ScannerKind::Binaries, findings, summary)
}

#[cfg(test)]
#[path = "binaries_tests.rs"]
mod tests;

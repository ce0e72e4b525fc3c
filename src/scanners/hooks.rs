//! Lifecycle-hook inspection of the package manifest.

use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::ScanContext;

/// Hooks the installer runs automatically around install/uninstall.
const DANGEROUS_HOOKS: [&str; 6] = [
    "preinstall",
    "install",
    "postinstall",
    "preuninstall",
    "uninstall",
    "postuninstall",
];

/// Substrings that indicate the hook shells out or downloads code.
const SHELL_MARKERS: [&str; 7] = [
    "curl",
    "wget",
    "bash",
    "sh -c",
    "node -e",
    "powershell",
    "cmd /c",
];

/// The conventional build hook, reported for visibility only.
const BUILD_HOOK: &str = "prepare";

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let Some(manifest) = context.manifest.as_ref() else {
        return ScannerResult::empty(ScannerKind::Hooks, "No lifecycle scripts declared");
    };
    if manifest.scripts.is_empty() {
        return ScannerResult::empty(ScannerKind::Hooks, "No lifecycle scripts declared");
    }

    let mut findings = Vec::new();
    for (hook, command) in &manifest.scripts {
        if DANGEROUS_HOOKS.contains(&hook.as_str()) {
            let finding = if runs_shell_commands(command) {
                Finding::new(
                    ScannerKind::Hooks,
                    Severity::Critical,
                    format!("{hook} executes shell commands"),
                )
            } else {
                Finding::new(
                    ScannerKind::Hooks,
                    Severity::Warning,
                    format!("{hook} lifecycle script defined"),
                )
            };
            findings.push(finding.with_evidence(command.clone()));
        } else if hook == BUILD_HOOK {
            findings.push(
                Finding::new(
                    ScannerKind::Hooks,
                    Severity::Info,
                    format!("{BUILD_HOOK} build hook defined"),
                )
                .with_evidence(command.clone()),
            );
        }
    }

    let summary = if findings.is_empty() {
        "No install-time lifecycle hooks".to_string()
    } else {
        format!("{} lifecycle hook(s) inspected", findings.len())
    };
    ScannerResult::from_findings(ScannerKind::Hooks, findings, summary)
}

fn runs_shell_commands(command: &str) -> bool {
    let normalized = command.to_ascii_lowercase();
    SHELL_MARKERS
        .iter()
        .any(|marker| normalized.contains(marker))
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;

//! Scanner battery and its fan-out orchestrator.
//!
//! Every scanner reads the same read-only extracted artifact; the set runs
//! as parallel blocking tasks joined in canonical order. A scanner that
//! errors or panics is converted into an empty result with an error
//! summary so the remaining results are preserved.

mod binaries;
mod dependencies;
mod hooks;
mod ioc;
mod obfuscation;
mod secrets;
mod static_patterns;
mod typosquat;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::ArtifactManifest;
use crate::paths;
use crate::types::{ScannerKind, ScannerResult};

/// Read-only inputs shared by every scanner invocation.
pub struct ScanContext {
    /// Extracted artifact root.
    pub root: PathBuf,
    /// Package name as resolved by the provider.
    pub package_name: String,
    /// Artifact manifest, when present and parseable.
    pub manifest: Option<ArtifactManifest>,
    /// Byte budget for whole-file analyses; larger files are sampled.
    pub max_file_bytes: u64,
    /// Config-supplied additions to the bundled ignored-domain table.
    pub extra_ignored_domains: Vec<String>,
    /// Config-supplied additions to the bundled ignored-IP table.
    pub extra_ignored_ips: Vec<String>,
}

/// Runs all scanners concurrently and returns results in canonical order.
pub async fn run_all(context: Arc<ScanContext>) -> Vec<ScannerResult> {
    let mut handles = Vec::with_capacity(ScannerKind::ALL.len());
    for kind in ScannerKind::ALL {
        let context = Arc::clone(&context);
        handles.push((
            kind,
            tokio::task::spawn_blocking(move || run_one(kind, &context)),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (kind, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                debug!(scanner = %kind, error = %err, "scanner task failed");
                ScannerResult::empty(kind, format!("{kind} scanner failed: {err}"))
            }
        };
        results.push(result);
    }
    results
}

fn run_one(kind: ScannerKind, context: &ScanContext) -> ScannerResult {
    match kind {
        ScannerKind::Binaries => binaries::scan(context),
        ScannerKind::Dependencies => dependencies::scan(context),
        ScannerKind::Hooks => hooks::scan(context),
        ScannerKind::Ioc => ioc::scan(context),
        ScannerKind::Obfuscation => obfuscation::scan(context),
        ScannerKind::Secrets => secrets::scan(context),
        ScannerKind::Static => static_patterns::scan(context),
        ScannerKind::Typosquat => typosquat::scan(context),
    }
}

/// A file visited during an artifact walk: absolute path plus the
/// artifact-relative, forward-slash form the report uses.
pub(crate) struct WalkedFile {
    pub absolute: PathBuf,
    pub relative: String,
}

/// Walks the artifact in sorted order, skipping nested dependency trees.
/// Unreadable entries are skipped silently; findings stay deterministic
/// because the walk order is deterministic.
pub(crate) fn walk_artifact(root: &Path) -> Vec<WalkedFile> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != paths::NESTED_DEPENDENCY_DIR);

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(stripped) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = stripped
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(WalkedFile {
            absolute: entry.into_path(),
            relative,
        });
    }
    files
}

/// Trimmed line capped at 200 characters, used as finding evidence.
pub(crate) fn evidence_snippet(line: &str) -> String {
    const MAX_EVIDENCE_CHARS: usize = 200;
    let trimmed = line.trim();
    if trimmed.chars().count() <= MAX_EVIDENCE_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().take(MAX_EVIDENCE_CHARS).collect()
}

/// Reads a file as text, sampling the first `max_bytes` of oversized
/// files. Returns the text and whether it was truncated; `None` when the
/// file cannot be read.
pub(crate) fn read_text_sample(path: &Path, max_bytes: u64) -> Option<(String, bool)> {
    let bytes = fs::read(path).ok()?;
    let truncated = bytes.len() as u64 > max_bytes;
    let slice = if truncated {
        &bytes[..max_bytes as usize]
    } else {
        &bytes[..]
    };
    Some((String::from_utf8_lossy(slice).into_owned(), truncated))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

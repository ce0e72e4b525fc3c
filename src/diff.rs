//! Content diff of the published artifact against the public source
//! repository. Any failure degrades to `{performed: false}`; the scratch
//! directory is always released.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::paths;
use crate::providers::{RepositoryProvider, extract_tarball, locate_artifact_root};
use crate::repo_health::parse_repo_url;
use crate::types::DiffResult;

/// Files expected to differ between a repo checkout and a published
/// artifact; hashing them would only produce noise.
const ALWAYS_DIFFER: [&str; 7] = [
    "package.json",
    ".npmignore",
    ".gitignore",
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// Downloads the repository source at HEAD and compares it to the
/// artifact tree.
pub async fn run(
    provider: &dyn RepositoryProvider,
    repository_url: &str,
    artifact_root: &Path,
) -> DiffResult {
    let Some(repo_ref) = parse_repo_url(repository_url) else {
        return DiffResult::failed(format!("unrecognized repository URL '{repository_url}'"));
    };

    let tarball = match provider.download_tarball(&repo_ref).await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "source tarball download failed");
            return DiffResult::failed(format!("source download failed: {err}"));
        }
    };

    let artifact_root = artifact_root.to_path_buf();
    let compared = tokio::task::spawn_blocking(move || {
        let scratch = tempfile::tempdir()
            .map_err(|err| format!("failed to create scratch directory: {err}"))?;
        extract_tarball(&tarball, scratch.path())
            .map_err(|err| format!("source extraction failed: {err}"))?;
        let repo_root = locate_artifact_root(scratch.path());
        Ok::<DiffResult, String>(compare_trees(&artifact_root, &repo_root))
        // `scratch` drops here, removing the extracted source tree.
    })
    .await;

    match compared {
        Ok(Ok(result)) => result,
        Ok(Err(message)) => DiffResult::failed(message),
        Err(err) => DiffResult::failed(format!("diff task failed: {err}")),
    }
}

/// Pure tree comparison: partitions artifact-only files with the
/// build-artifact heuristic and hashes the intersection.
pub fn compare_trees(artifact_root: &Path, repo_root: &Path) -> DiffResult {
    let artifact_files = collect_files(artifact_root);
    let repo_files = collect_files(repo_root);

    let mut unexpected_files = Vec::new();
    let mut expected_build_files = Vec::new();
    for path in artifact_files.difference(&repo_files) {
        if paths::is_expected_build_artifact(path, &repo_files) {
            expected_build_files.push(path.clone());
        } else {
            unexpected_files.push(path.clone());
        }
    }

    let shared: Vec<&String> = artifact_files
        .intersection(&repo_files)
        .filter(|path| !ALWAYS_DIFFER.contains(&path.as_str()))
        .collect();
    let mut modified_files: Vec<String> = shared
        .par_iter()
        .filter_map(|path| {
            let artifact_hash = hash_file(&artifact_root.join(native(path)))?;
            let repo_hash = hash_file(&repo_root.join(native(path)))?;
            (artifact_hash != repo_hash).then(|| (*path).clone())
        })
        .collect();
    modified_files.sort_unstable();

    DiffResult {
        performed: true,
        unexpected_files,
        expected_build_files,
        modified_files,
        error: None,
    }
}

/// Walks a tree into relative forward-slash paths, skipping hidden
/// directories and nested dependency trees.
fn collect_files(root: &Path) -> BTreeSet<String> {
    let mut files = BTreeSet::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let is_root = entry.depth() == 0;
        is_root || (!name.starts_with('.') && name != paths::NESTED_DEPENDENCY_DIR)
    });

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
        files.insert(relative);
    }
    files
}

fn native(relative: &str) -> PathBuf {
    relative.split('/').collect()
}

fn hash_file(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;

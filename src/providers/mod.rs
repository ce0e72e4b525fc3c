//! External collaborator seams: the package registry, the repository
//! host, and artifact extraction.

mod extract;
mod github;
mod local;
mod npm;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tempfile::TempDir;
use thiserror::Error;

use crate::repo_health::RepoRef;
use crate::specifier::Specifier;
use crate::types::PackageMetadata;

pub use extract::{extract_tarball, locate_artifact_root};
pub use github::GithubProvider;
pub use local::LocalPackageProvider;
pub use npm::NpmPackageProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("package '{package}' was not found in the registry")]
    PackageNotFound { package: String },
    #[error("version '{version}' of '{package}' was not found")]
    VersionNotFound { package: String, version: String },
    #[error("provider request failed: {message}")]
    Transport { message: String },
    #[error("provider returned invalid data: {message}")]
    InvalidResponse { message: String },
    #[error("artifact handling failed: {message}")]
    Artifact { message: String },
}

impl ProviderError {
    pub(crate) fn transport(context: &str, error: reqwest::Error) -> Self {
        let mut kinds = Vec::new();
        if error.is_timeout() {
            kinds.push("timeout");
        }
        if error.is_connect() {
            kinds.push("connect");
        }
        if error.is_decode() {
            kinds.push("decode");
        }
        if let Some(status) = error.status() {
            kinds.push(if status.is_server_error() {
                "http5xx"
            } else {
                "http"
            });
        }
        if kinds.is_empty() {
            kinds.push("unknown");
        }
        ProviderError::Transport {
            message: format!("{context}: {error} (kinds={})", kinds.join(",")),
        }
    }
}

/// An extracted artifact plus the scratch directory that owns it. The
/// scratch directory is removed when the value drops, which also covers
/// cancellation.
pub struct ExtractedArtifact {
    root: PathBuf,
    _scratch: Option<TempDir>,
}

impl ExtractedArtifact {
    pub fn in_scratch(root: PathBuf, scratch: TempDir) -> Self {
        Self {
            root,
            _scratch: Some(scratch),
        }
    }

    /// An artifact scanned in place, e.g. a local directory specifier.
    pub fn borrowed(root: PathBuf) -> Self {
        Self {
            root,
            _scratch: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub struct FetchedPackage {
    pub metadata: PackageMetadata,
    pub artifact: ExtractedArtifact,
}

/// Resolves a specifier to metadata plus an extracted artifact tree.
#[async_trait]
pub trait PackageProvider: Send + Sync {
    async fn fetch(&self, specifier: &Specifier) -> Result<FetchedPackage, ProviderError>;
}

/// Repository-host JSON shape consumed by the health probe.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub license: Option<RepoLicense>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoLicense {
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Two operations against the repository host: metadata and a gzipped
/// tar stream of the HEAD source tree.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    async fn fetch_repo_info(&self, repo: &RepoRef) -> Result<RepoInfo, ProviderError>;
    async fn download_tarball(&self, repo: &RepoRef) -> Result<Vec<u8>, ProviderError>;
}

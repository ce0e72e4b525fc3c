//! Shared application service: the scan pipeline state machine.
//!
//! fetch metadata -> extract -> fan out scanners (plus optional repo
//! health and diff tasks) -> join -> score -> report -> cleanup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use reqwest::Client;
use tracing::info;

use crate::config::PretrustConfig;
use crate::manifest;
use crate::providers::{
    FetchedPackage, GithubProvider, LocalPackageProvider, NpmPackageProvider, PackageProvider,
    RepositoryProvider,
};
use crate::report;
use crate::scanners::{self, ScanContext};
use crate::specifier::Specifier;
use crate::types::Report;

/// Per-invocation overrides on top of the loaded config.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub no_github: bool,
    pub no_diff: bool,
}

pub struct ScanService {
    registry_provider: Arc<dyn PackageProvider>,
    local_provider: Arc<dyn PackageProvider>,
    repository_provider: Arc<dyn RepositoryProvider>,
    config: Arc<PretrustConfig>,
}

impl ScanService {
    /// Creates a service with the default HTTP-backed providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: PretrustConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            registry_provider: Arc::new(NpmPackageProvider::new(http.clone())),
            local_provider: Arc::new(LocalPackageProvider::new()),
            repository_provider: Arc::new(GithubProvider::new(http)),
            config: Arc::new(config),
        })
    }

    /// Creates a service with injected providers; used by tests.
    pub fn with_providers(
        config: PretrustConfig,
        registry_provider: Arc<dyn PackageProvider>,
        local_provider: Arc<dyn PackageProvider>,
        repository_provider: Arc<dyn RepositoryProvider>,
    ) -> Self {
        Self {
            registry_provider,
            local_provider,
            repository_provider,
            config: Arc::new(config),
        }
    }

    /// Runs the full pipeline for one specifier.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable specifiers and for metadata or
    /// artifact fetch failures; collaborator failures past that point
    /// degrade instead.
    pub async fn scan(&self, raw_specifier: &str, options: ScanOptions) -> anyhow::Result<Report> {
        let started = Instant::now();
        let specifier = Specifier::parse(raw_specifier)?;

        let provider = match &specifier {
            Specifier::Registry { .. } => &self.registry_provider,
            Specifier::Local(_) => &self.local_provider,
        };
        let FetchedPackage { metadata, artifact } = provider
            .fetch(&specifier)
            .await
            .with_context(|| format!("failed to fetch '{raw_specifier}'"))?;

        info!(
            package = %metadata.name,
            version = %metadata.version,
            root = %artifact.root().display(),
            "artifact extracted, starting scanners"
        );

        let context = Arc::new(ScanContext {
            root: artifact.root().to_path_buf(),
            package_name: metadata.name.clone(),
            manifest: manifest::load(artifact.root()),
            max_file_bytes: self.config.max_file_bytes,
            extra_ignored_domains: self.config.ignored_domains.clone(),
            extra_ignored_ips: self.config.ignored_ips.clone(),
        });

        let no_github = options.no_github || self.config.no_github;
        let no_diff = options.no_diff || self.config.no_diff;
        let repository_url = metadata.repository_url.clone().unwrap_or_default();

        let scanners_task = scanners::run_all(Arc::clone(&context));
        let health_task = async {
            if no_github || repository_url.is_empty() {
                None
            } else {
                Some(
                    crate::repo_health::probe(
                        self.repository_provider.as_ref(),
                        &repository_url,
                        metadata.publisher.as_deref(),
                    )
                    .await,
                )
            }
        };
        let diff_task = async {
            if no_diff || repository_url.is_empty() {
                None
            } else {
                Some(
                    crate::diff::run(
                        self.repository_provider.as_ref(),
                        &repository_url,
                        artifact.root(),
                    )
                    .await,
                )
            }
        };

        let (scanner_results, github, diff) = tokio::join!(scanners_task, health_task, diff_task);

        let report = report::assemble(
            metadata,
            scanner_results,
            github,
            diff,
            Utc::now(),
            started.elapsed().as_millis() as u64,
        );
        // `artifact` drops here, releasing any scratch directory.
        Ok(report)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

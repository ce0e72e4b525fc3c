//! npm registry package provider: packument fetch, version resolution,
//! tarball download and extraction.

use std::collections::BTreeMap;
use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::manifest;
use crate::specifier::Specifier;
use crate::types::PackageMetadata;

use super::{
    ExtractedArtifact, FetchedPackage, PackageProvider, ProviderError, extract_tarball,
    locate_artifact_root,
};

const DEFAULT_REGISTRY_BASE_URL: &str = "https://registry.npmjs.org";
pub const REGISTRY_BASE_URL_VAR: &str = "PRETRUST_NPM_REGISTRY_BASE_URL";

#[derive(Clone)]
pub struct NpmPackageProvider {
    http: Client,
    base_url: String,
}

impl NpmPackageProvider {
    pub fn new(http: Client) -> Self {
        let base_url = env::var(REGISTRY_BASE_URL_VAR)
            .unwrap_or_else(|_| DEFAULT_REGISTRY_BASE_URL.to_string());
        Self::with_base_url(http, base_url)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn encode_package_name(package: &str) -> String {
        package.replace('@', "%40").replace('/', "%2f")
    }

    async fn fetch_packument(&self, package: &str) -> Result<Packument, ProviderError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            Self::encode_package_name(package)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ProviderError::transport("unable to query npm registry", err))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::PackageNotFound {
                package: package.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Transport {
                message: format!("npm registry returned status {}", response.status()),
            });
        }

        response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse {
                message: format!("failed to parse npm packument JSON: {err}"),
            })
    }

    async fn download_artifact(&self, tarball_url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .http
            .get(tarball_url)
            .send()
            .await
            .map_err(|err| ProviderError::transport("unable to download artifact", err))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport {
                message: format!("artifact download returned status {}", response.status()),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ProviderError::transport("artifact download truncated", err))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PackageProvider for NpmPackageProvider {
    async fn fetch(&self, specifier: &Specifier) -> Result<FetchedPackage, ProviderError> {
        let Specifier::Registry { name, version } = specifier else {
            return Err(ProviderError::InvalidResponse {
                message: "local specifiers are handled by the local provider".to_string(),
            });
        };

        let packument = self.fetch_packument(name).await?;
        let resolved = packument.resolve_version(name, version.as_deref())?;
        let metadata = build_metadata(name, &packument, resolved);

        let tarball_url =
            metadata
                .tarball_url
                .clone()
                .ok_or_else(|| ProviderError::InvalidResponse {
                    message: format!("no tarball URL for {name}@{}", metadata.version),
                })?;
        info!(package = %name, version = %metadata.version, "downloading artifact");
        let bytes = self.download_artifact(&tarball_url).await?;

        let scratch = tempfile::tempdir().map_err(|err| ProviderError::Artifact {
            message: format!("failed to create scratch directory: {err}"),
        })?;
        extract_tarball(&bytes, scratch.path())?;
        let root = locate_artifact_root(scratch.path());

        Ok(FetchedPackage {
            metadata,
            artifact: ExtractedArtifact::in_scratch(root, scratch),
        })
    }
}

fn build_metadata(
    name: &str,
    packument: &Packument,
    resolved: &VersionMetadata,
) -> PackageMetadata {
    let published = packument
        .time
        .get(&resolved.version)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|value| value.with_timezone(&Utc));

    let maintainers: Vec<String> = packument
        .maintainers
        .iter()
        .map(|maintainer| maintainer.name.clone())
        .collect();
    let publisher = resolved
        .npm_user
        .as_ref()
        .map(|user| user.name.clone())
        .or_else(|| maintainers.first().cloned());

    PackageMetadata {
        name: name.to_string(),
        version: resolved.version.clone(),
        description: resolved.description.clone(),
        license: manifest::license_field(resolved.license.as_ref()),
        publisher,
        published,
        tarball_url: resolved.dist.as_ref().and_then(|dist| dist.tarball.clone()),
        repository_url: manifest::repository_field(resolved.repository.as_ref()),
        homepage: resolved.homepage.clone(),
        file_count: resolved.dist.as_ref().and_then(|dist| dist.file_count),
        unpacked_size: resolved.dist.as_ref().and_then(|dist| dist.unpacked_size),
        dependencies: resolved.dependencies.clone(),
        optional_dependencies: resolved.optional_dependencies.clone(),
        scripts: resolved.scripts.clone(),
        maintainers,
        trusted_publisher: resolved
            .dist
            .as_ref()
            .is_some_and(|dist| dist.attestations.is_some()),
    }
}

#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: DistTags,
    #[serde(default)]
    versions: BTreeMap<String, VersionMetadata>,
    #[serde(default)]
    time: BTreeMap<String, String>,
    #[serde(default)]
    maintainers: Vec<Maintainer>,
}

impl Packument {
    fn resolve_version(
        &self,
        package: &str,
        requested: Option<&str>,
    ) -> Result<&VersionMetadata, ProviderError> {
        let wanted = match requested {
            Some("latest") | None => {
                self.dist_tags
                    .latest
                    .as_deref()
                    .ok_or_else(|| ProviderError::InvalidResponse {
                        message: "packument is missing dist-tags.latest".to_string(),
                    })?
            }
            Some(version) => version,
        };
        self.versions
            .get(wanted)
            .ok_or_else(|| ProviderError::VersionNotFound {
                package: package.to_string(),
                version: wanted.to_string(),
            })
    }
}

#[derive(Debug, Default, Deserialize)]
struct DistTags {
    latest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Option<Value>,
    #[serde(default)]
    repository: Option<Value>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(rename = "optionalDependencies", default)]
    optional_dependencies: BTreeMap<String, String>,
    #[serde(rename = "_npmUser", default)]
    npm_user: Option<Maintainer>,
    #[serde(default)]
    dist: Option<Dist>,
}

#[derive(Debug, Deserialize)]
struct Maintainer {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Dist {
    #[serde(default)]
    tarball: Option<String>,
    #[serde(rename = "fileCount", default)]
    file_count: Option<u64>,
    #[serde(rename = "unpackedSize", default)]
    unpacked_size: Option<u64>,
    /// Provenance attestations; presence marks a trusted automated
    /// publisher.
    #[serde(default)]
    attestations: Option<Value>,
}

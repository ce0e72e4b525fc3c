//! Provider for local artifacts: a `.tgz` on disk or an already
//! extracted directory. Metadata is synthesized from the embedded
//! manifest; no registry is contacted.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::manifest;
use crate::specifier::Specifier;
use crate::types::PackageMetadata;

use super::{
    ExtractedArtifact, FetchedPackage, PackageProvider, ProviderError, extract_tarball,
    locate_artifact_root,
};

#[derive(Clone, Default)]
pub struct LocalPackageProvider;

impl LocalPackageProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PackageProvider for LocalPackageProvider {
    async fn fetch(&self, specifier: &Specifier) -> Result<FetchedPackage, ProviderError> {
        let Specifier::Local(path) = specifier else {
            return Err(ProviderError::InvalidResponse {
                message: "registry specifiers are handled by the registry provider".to_string(),
            });
        };

        let artifact = if path.is_dir() {
            ExtractedArtifact::borrowed(path.clone())
        } else {
            let bytes = fs::read(path).await.map_err(|err| ProviderError::Artifact {
                message: format!("cannot read local artifact {}: {err}", path.display()),
            })?;
            let scratch = tempfile::tempdir().map_err(|err| ProviderError::Artifact {
                message: format!("failed to create scratch directory: {err}"),
            })?;
            extract_tarball(&bytes, scratch.path())?;
            let root = locate_artifact_root(scratch.path());
            ExtractedArtifact::in_scratch(root, scratch)
        };

        let metadata = metadata_from_manifest(artifact.root(), path);
        Ok(FetchedPackage { metadata, artifact })
    }
}

fn metadata_from_manifest(root: &Path, source: &Path) -> PackageMetadata {
    let fallback_name = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "local-artifact".to_string());

    let Some(parsed) = manifest::load(root) else {
        return PackageMetadata::minimal(fallback_name, "0.0.0");
    };

    let mut metadata = PackageMetadata::minimal(
        parsed.name.unwrap_or(fallback_name),
        parsed.version.unwrap_or_else(|| "0.0.0".to_string()),
    );
    metadata.description = parsed.description;
    metadata.license = parsed.license;
    metadata.repository_url = parsed.repository_url;
    metadata.homepage = parsed.homepage;
    metadata.scripts = parsed.scripts;
    metadata.dependencies = parsed.dependencies;
    metadata.optional_dependencies = parsed.optional_dependencies;
    metadata
}

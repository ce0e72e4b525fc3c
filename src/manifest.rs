//! Probed parse of the artifact's `package.json`.
//!
//! Manifests arrive as arbitrary JSON; each field is coerced to the shape
//! the scanners need and defaulted when absent. Unknown fields are dropped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, Default)]
pub struct ArtifactManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub repository_url: Option<String>,
    pub homepage: Option<String>,
    pub scripts: BTreeMap<String, String>,
    pub dependencies: BTreeMap<String, String>,
    pub optional_dependencies: BTreeMap<String, String>,
    /// Whether the manifest declares a CLI entry point.
    pub has_bin: bool,
}

/// Loads the manifest at the artifact root. Missing or malformed manifests
/// yield `None`; callers degrade per scanner.
pub fn load(artifact_root: &Path) -> Option<ArtifactManifest> {
    let raw = fs::read_to_string(artifact_root.join(MANIFEST_FILE)).ok()?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Option<ArtifactManifest> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    Some(ArtifactManifest {
        name: string_field(object.get("name")),
        version: string_field(object.get("version")),
        description: string_field(object.get("description")),
        license: license_field(object.get("license")),
        repository_url: repository_field(object.get("repository")),
        homepage: string_field(object.get("homepage")),
        scripts: string_map(object.get("scripts")),
        dependencies: string_map(object.get("dependencies")),
        optional_dependencies: string_map(object.get("optionalDependencies")),
        has_bin: bin_field(object.get("bin")),
    })
}

pub(crate) fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(ToOwned::to_owned)
}

/// `license` is either an SPDX string or a legacy `{ "type": ... }` object.
pub(crate) fn license_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(spdx) => Some(spdx.clone()),
        Value::Object(object) => string_field(object.get("type")),
        _ => None,
    }
}

/// `repository` is either a URL string or a `{ "url": ... }` object.
pub(crate) fn repository_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(url) => Some(url.clone()),
        Value::Object(object) => string_field(object.get("url")),
        _ => None,
    }
}

pub(crate) fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(object)) = value else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(|version| (key.clone(), version.to_string()))
        })
        .collect()
}

/// `bin` is a string for single-command packages or a name→path map.
fn bin_field(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(path)) => !path.is_empty(),
        Some(Value::Object(object)) => !object.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;

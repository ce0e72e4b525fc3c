//! Configuration loading and merge logic.
//!
//! Global config and project-local config are merged with project values
//! taking precedence; CLI flags override both.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Default timeout for registry and repository-host requests.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default byte budget for whole-file analyses.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 8 * 1024 * 1024;

pub const CONFIG_GLOBAL_PATH_VAR: &str = "PRETRUST_CONFIG_GLOBAL_PATH";
pub const CONFIG_PROJECT_PATH_VAR: &str = "PRETRUST_CONFIG_PROJECT_PATH";

/// Runtime configuration for a scan.
#[derive(Debug, Clone)]
pub struct PretrustConfig {
    /// Soft budget for external I/O, in seconds.
    pub http_timeout_secs: u64,
    /// Whole-file analyses sample files larger than this.
    pub max_file_bytes: u64,
    /// Skip the repository health probe.
    pub no_github: bool,
    /// Skip the artifact/source diff.
    pub no_diff: bool,
    /// Additional domains the IOC extractor treats as benign.
    pub ignored_domains: Vec<String>,
    /// Additional IPv4 literals the IOC extractor treats as benign.
    pub ignored_ips: Vec<String>,
}

impl Default for PretrustConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            no_github: false,
            no_diff: false,
            ignored_domains: Vec::new(),
            ignored_ips: Vec::new(),
        }
    }
}

/// Partial config as it appears on disk; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    http_timeout_secs: Option<u64>,
    max_file_bytes: Option<u64>,
    no_github: Option<bool>,
    no_diff: Option<bool>,
    ignore: Option<IgnoreOverlay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IgnoreOverlay {
    domains: Option<Vec<String>>,
    ips: Option<Vec<String>>,
}

impl PretrustConfig {
    /// Loads and merges global + project configuration from default paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered config file cannot be read or
    /// parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with_paths(global_config_path(), project_config_path())
    }

    fn load_with_paths(global: Option<PathBuf>, project: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(path) = global {
            config.merge_from_path(&path)?;
        }
        if let Some(path) = project {
            config.merge_from_path(&path)?;
        }
        Ok(config)
    }

    fn merge_from_path(&mut self, path: &Path) -> anyhow::Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let overlay: ConfigOverlay = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;
        self.apply_overlay(overlay);
        Ok(())
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(value) = overlay.http_timeout_secs {
            self.http_timeout_secs = sanitize_positive(value, DEFAULT_HTTP_TIMEOUT_SECS);
        }
        if let Some(value) = overlay.max_file_bytes {
            self.max_file_bytes = sanitize_positive(value, DEFAULT_MAX_FILE_BYTES);
        }
        if let Some(value) = overlay.no_github {
            self.no_github = value;
        }
        if let Some(value) = overlay.no_diff {
            self.no_diff = value;
        }
        if let Some(ignore) = overlay.ignore {
            append_unique(&mut self.ignored_domains, ignore.domains.unwrap_or_default());
            append_unique(&mut self.ignored_ips, ignore.ips.unwrap_or_default());
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_GLOBAL_PATH_VAR) {
        return Some(PathBuf::from(explicit));
    }
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)?;
    Some(home.join(".config").join("pretrust").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_PROJECT_PATH_VAR) {
        return Some(PathBuf::from(explicit));
    }
    let cwd = env::current_dir().ok()?;
    Some(cwd.join(".pretrust.toml"))
}

fn append_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.iter().any(|existing| existing == &value) {
            target.push(value);
        }
    }
}

fn sanitize_positive(value: u64, fallback: u64) -> u64 {
    if value == 0 { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(body.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_when_no_files_exist() {
        let config = PretrustConfig::load_with_paths(
            Some(PathBuf::from("/nonexistent/global.toml")),
            Some(PathBuf::from("/nonexistent/project.toml")),
        )
        .expect("load");
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert!(!config.no_github);
    }

    #[test]
    fn project_overrides_global() {
        let global = write_config("http_timeout_secs = 10\nno_github = true\n");
        let project = write_config("http_timeout_secs = 5\n");
        let config = PretrustConfig::load_with_paths(
            Some(global.path().to_path_buf()),
            Some(project.path().to_path_buf()),
        )
        .expect("load");
        assert_eq!(config.http_timeout_secs, 5);
        assert!(config.no_github);
    }

    #[test]
    fn ignore_lists_merge_without_duplicates() {
        let global = write_config("[ignore]\ndomains = [\"a.example\", \"b.example\"]\n");
        let project = write_config("[ignore]\ndomains = [\"b.example\", \"c.example\"]\nips = [\"9.9.9.9\"]\n");
        let config = PretrustConfig::load_with_paths(
            Some(global.path().to_path_buf()),
            Some(project.path().to_path_buf()),
        )
        .expect("load");
        assert_eq!(config.ignored_domains, vec!["a.example", "b.example", "c.example"]);
        assert_eq!(config.ignored_ips, vec!["9.9.9.9"]);
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let global = write_config("http_timeout_secs = 0\nmax_file_bytes = 0\n");
        let config =
            PretrustConfig::load_with_paths(Some(global.path().to_path_buf()), None).expect("load");
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let global = write_config("http_timeout_secs = \"soon\"\n");
        assert!(PretrustConfig::load_with_paths(Some(global.path().to_path_buf()), None).is_err());
    }
}

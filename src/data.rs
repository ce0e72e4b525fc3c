//! Bundled data tables, loaded once and shared read-only.
//!
//! Each table can be replaced via an environment variable pointing at a
//! file on disk; otherwise the copy embedded at build time is used. An
//! unreadable override or an empty table degrades the consuming scanner,
//! never the pipeline.

use std::env;
use std::fs;
use std::sync::OnceLock;

use tracing::warn;

const EMBEDDED_POPULAR_PACKAGES: &str = include_str!("../data/popular-packages.txt");
const EMBEDDED_IGNORED_DOMAINS: &str = include_str!("../data/ignored-domains.txt");
const EMBEDDED_IGNORED_IPS: &str = include_str!("../data/ignored-ips.txt");

pub const POPULAR_PACKAGES_PATH_VAR: &str = "PRETRUST_POPULAR_PACKAGES_PATH";
pub const IGNORED_DOMAINS_PATH_VAR: &str = "PRETRUST_IGNORED_DOMAINS_PATH";
pub const IGNORED_IPS_PATH_VAR: &str = "PRETRUST_IGNORED_IPS_PATH";

/// Popular package names for the typosquatting scanner. May be empty when
/// an override file is unreadable; the scanner reports itself skipped.
pub fn popular_packages() -> &'static [String] {
    static TABLE: OnceLock<Vec<String>> = OnceLock::new();
    TABLE.get_or_init(|| load_table(POPULAR_PACKAGES_PATH_VAR, EMBEDDED_POPULAR_PACKAGES))
}

/// Benign domains the IOC extractor drops, including their sub-domains.
pub fn ignored_domains() -> &'static [String] {
    static TABLE: OnceLock<Vec<String>> = OnceLock::new();
    TABLE.get_or_init(|| load_table(IGNORED_DOMAINS_PATH_VAR, EMBEDDED_IGNORED_DOMAINS))
}

/// Benign IPv4 literals the IOC extractor drops.
pub fn ignored_ips() -> &'static [String] {
    static TABLE: OnceLock<Vec<String>> = OnceLock::new();
    TABLE.get_or_init(|| load_table(IGNORED_IPS_PATH_VAR, EMBEDDED_IGNORED_IPS))
}

fn load_table(path_var: &str, embedded: &str) -> Vec<String> {
    if let Some(path) = env::var_os(path_var) {
        return match fs::read_to_string(&path) {
            Ok(raw) => parse_list(&raw),
            Err(err) => {
                warn!(
                    path = %path.to_string_lossy(),
                    error = %err,
                    "data table override unreadable; table disabled"
                );
                Vec::new()
            }
        };
    }
    parse_list(embedded)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_comments_and_blanks() {
        let parsed = parse_list("# header\n\nreact\n  lodash  \n# tail\n");
        assert_eq!(parsed, vec!["react".to_string(), "lodash".to_string()]);
    }

    #[test]
    fn embedded_tables_are_non_empty() {
        assert!(!parse_list(EMBEDDED_POPULAR_PACKAGES).is_empty());
        assert!(!parse_list(EMBEDDED_IGNORED_DOMAINS).is_empty());
        assert!(!parse_list(EMBEDDED_IGNORED_IPS).is_empty());
    }

    #[test]
    fn tables_are_lowercased() {
        assert!(parse_list("React\nLODASH")
            .iter()
            .all(|name| name.chars().all(|c| !c.is_ascii_uppercase())));
    }
}

//! Regex-based credential detection over the artifact's text files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::paths;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::{ScanContext, read_text_sample, walk_artifact};

/// Extensions never worth reading as text.
const BINARY_EXTENSIONS: [&str; 41] = [
    "node", "so", "dll", "dylib", "exe", "bin", "wasm", "png", "jpg", "jpeg", "gif", "bmp", "ico",
    "svg", "webp", "mp3", "mp4", "wav", "ogg", "webm", "avi", "zip", "tar", "gz", "bz2", "xz",
    "7z", "rar", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "ttf", "otf", "woff",
    "woff2", "eot", "lock",
];

const BINARY_SNIFF_BYTES: usize = 512;

struct SecretPattern {
    regex: &'static Lazy<Regex>,
    severity: Severity,
    message: &'static str,
}

static RE_AWS_ACCESS_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"AKIA[A-Z0-9]{16}").expect("aws key regex"));
static RE_PEM_PRIVATE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-----BEGIN [A-Z ]*PRIVATE KEY-----").expect("pem regex"));
static RE_GITHUB_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gh[ps]_[A-Za-z0-9_-]{36,}").expect("github token regex"));
static RE_NPM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"npm_[A-Za-z0-9]{36,}").expect("npm token regex"));
static RE_URL_CREDENTIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^:/\s'"]+:[^@/\s'"]+@"#).expect("url creds regex"));
static RE_API_KEY_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)api[_-]?key['"]?\s*[:=]\s*['"][A-Za-z0-9]{20,}['"]"#)
        .expect("api key regex")
});
static RE_TOKEN_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btoken['"]?\s*[:=]\s*['"][A-Za-z0-9]{20,}['"]"#).expect("token regex")
});

static PATTERNS: Lazy<Vec<SecretPattern>> = Lazy::new(|| {
    vec![
        SecretPattern {
            regex: &RE_AWS_ACCESS_KEY,
            severity: Severity::Critical,
            message: "cloud access key ID",
        },
        SecretPattern {
            regex: &RE_PEM_PRIVATE_KEY,
            severity: Severity::Critical,
            message: "PEM private key",
        },
        SecretPattern {
            regex: &RE_GITHUB_TOKEN,
            severity: Severity::Critical,
            message: "GitHub personal access token",
        },
        SecretPattern {
            regex: &RE_NPM_TOKEN,
            severity: Severity::Critical,
            message: "npm registry token",
        },
        SecretPattern {
            regex: &RE_URL_CREDENTIALS,
            severity: Severity::Critical,
            message: "credentials embedded in URL",
        },
        SecretPattern {
            regex: &RE_API_KEY_ASSIGNMENT,
            severity: Severity::Warning,
            message: "hardcoded API key assignment",
        },
        SecretPattern {
            regex: &RE_TOKEN_ASSIGNMENT,
            severity: Severity::Warning,
            message: "hardcoded token assignment",
        },
    ]
});

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let mut findings = Vec::new();

    for file in walk_artifact(&context.root) {
        if has_binary_extension(&file.relative) || sniffs_binary(&file.absolute) {
            continue;
        }
        let Some((content, _)) = read_text_sample(&file.absolute, context.max_file_bytes) else {
            continue;
        };
        scan_content(&content, &file.relative, &mut findings);
    }

    let summary = if findings.is_empty() {
        "No secrets detected".to_string()
    } else {
        format!("Found {} potential secret(s)", findings.len())
    };
    ScannerResult::from_findings(ScannerKind::Secrets, findings, summary)
}

fn scan_content(content: &str, relative: &str, findings: &mut Vec<Finding>) {
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        for pattern in PATTERNS.iter() {
            let Some(matched) = pattern.regex.find(line) else {
                continue;
            };
            findings.push(
                Finding::new(ScannerKind::Secrets, pattern.severity, pattern.message)
                    .with_location(relative, line_number)
                    .with_evidence(mask(matched.as_str())),
            );
        }
    }
}

fn has_binary_extension(path: &str) -> bool {
    paths::extension(path).is_some_and(|ext| {
        let lower = ext.to_ascii_lowercase();
        BINARY_EXTENSIONS.contains(&lower.as_str())
    })
}

/// A NUL byte in the leading bytes marks the file binary-by-content.
fn sniffs_binary(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return true;
    };
    let mut head = [0u8; BINARY_SNIFF_BYTES];
    let Ok(read) = file.read(&mut head) else {
        return true;
    };
    head[..read].contains(&0)
}

/// Masks matched secrets: long values keep four characters on each end.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;

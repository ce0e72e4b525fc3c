//! Indicator-of-compromise extraction: URLs and IPv4 literals, in plain
//! text and hidden behind hex/unicode escapes, char-code calls, or base64.
//!
//! IOCs are informational evidence rather than automatic failures, so the
//! scanner always reports itself as passed.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::data;
use crate::paths;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::{ScanContext, read_text_sample, walk_artifact};

/// Extensions worth reading for indicators.
const TEXT_EXTENSIONS: [&str; 28] = [
    "js", "mjs", "cjs", "ts", "tsx", "jsx", "json", "yml", "yaml", "md", "txt", "sh", "bash",
    "ps1", "bat", "cmd", "html", "htm", "xml", "css", "cfg", "conf", "ini", "env", "toml",
    "properties", "csv", "map",
];

const MAX_TRACKED_LOCATIONS: usize = 5;
const MIN_BASE64_CANDIDATE_LENGTH: usize = 20;
const MIN_DECODED_LENGTH: usize = 6;
const PRINTABLE_RATIO_THRESHOLD: f64 = 0.8;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:https?|ftp)://[^\s'"<>\)\]]+"#).expect("url regex"));
static RE_IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ipv4 regex"));
static RE_HEX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\x[0-9a-fA-F]{2}){4,}").expect("hex run regex"));
static RE_UNICODE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\u[0-9a-fA-F]{4}){4,}").expect("unicode run regex"));
static RE_CHARCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"String\.fromCharCode\(\s*([0-9][0-9,\s]*)\)").expect("charcode regex")
});
static RE_BASE64_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}").expect("base64 candidate regex"));

#[derive(Clone, Copy, PartialEq, Eq)]
enum IocKind {
    Url,
    Ip,
}

struct IocRecord {
    kind: IocKind,
    /// Decoder label when the first sighting came from decoded text.
    decoded_from: Option<&'static str>,
    locations: Vec<String>,
    hits: usize,
    first_file: String,
    first_line: usize,
}

struct IocCollector {
    records: BTreeMap<String, IocRecord>,
    ignored_domains: Vec<String>,
    ignored_ips: Vec<String>,
}

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let mut ignored_domains: Vec<String> = data::ignored_domains().to_vec();
    ignored_domains.extend(
        context
            .extra_ignored_domains
            .iter()
            .map(|domain| domain.to_ascii_lowercase()),
    );
    let mut ignored_ips: Vec<String> = data::ignored_ips().to_vec();
    ignored_ips.extend(context.extra_ignored_ips.iter().cloned());

    let mut collector = IocCollector {
        records: BTreeMap::new(),
        ignored_domains,
        ignored_ips,
    };

    for file in walk_artifact(&context.root) {
        let is_text = paths::extension(&file.relative)
            .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if !is_text {
            continue;
        }
        let Some((content, _)) = read_text_sample(&file.absolute, context.max_file_bytes) else {
            continue;
        };
        for (index, line) in content.lines().enumerate() {
            collector.collect_line(line, &file.relative, index + 1);
        }
    }

    collector.into_result()
}

impl IocCollector {
    fn collect_line(&mut self, line: &str, file: &str, line_number: usize) {
        // Plaintext pass first so a same-line plaintext sighting wins the
        // severity choice over a decoded one.
        self.extract(line, file, line_number, None);

        for decoded in decode_hex_runs(line) {
            self.extract(&decoded, file, line_number, Some("hex"));
        }
        for decoded in decode_unicode_runs(line) {
            self.extract(&decoded, file, line_number, Some("unicode"));
        }
        for decoded in decode_charcodes(line) {
            self.extract(&decoded, file, line_number, Some("charcode"));
        }
        for decoded in decode_base64_candidates(line) {
            self.extract(&decoded, file, line_number, Some("base64"));
        }
    }

    fn extract(
        &mut self,
        text: &str,
        file: &str,
        line_number: usize,
        decoded_from: Option<&'static str>,
    ) {
        for matched in RE_URL.find_iter(text) {
            let raw = matched.as_str().trim_end_matches(['.', ',', ')', ';', '"', '\'']);
            if self.url_is_ignored(raw) {
                continue;
            }
            self.record(raw.to_string(), IocKind::Url, file, line_number, decoded_from);
        }
        for matched in RE_IPV4.find_iter(text) {
            let raw = matched.as_str();
            if !is_valid_ipv4(raw) || self.ignored_ips.iter().any(|ip| ip == raw) {
                continue;
            }
            self.record(raw.to_string(), IocKind::Ip, file, line_number, decoded_from);
        }
    }

    fn url_is_ignored(&self, raw: &str) -> bool {
        let Ok(parsed) = Url::parse(raw) else {
            return true;
        };
        let Some(host) = parsed.host_str() else {
            return true;
        };
        let host = host.to_ascii_lowercase();
        self.ignored_domains.iter().any(|domain| {
            host == *domain || host.ends_with(&format!(".{domain}"))
        })
    }

    fn record(
        &mut self,
        key: String,
        kind: IocKind,
        file: &str,
        line_number: usize,
        decoded_from: Option<&'static str>,
    ) {
        let location = format!("{file}:{line_number}");
        let entry = self.records.entry(key).or_insert_with(|| IocRecord {
            kind,
            decoded_from,
            locations: Vec::new(),
            hits: 0,
            first_file: file.to_string(),
            first_line: line_number,
        });
        entry.hits += 1;
        if entry.locations.len() < MAX_TRACKED_LOCATIONS && !entry.locations.contains(&location) {
            entry.locations.push(location);
        }
    }

    fn into_result(self) -> ScannerResult {
        let mut findings = Vec::new();
        let mut url_count = 0usize;
        let mut ip_count = 0usize;

        for (value, record) in &self.records {
            let defanged = match record.kind {
                IocKind::Url => {
                    url_count += 1;
                    defang_url(value)
                }
                IocKind::Ip => {
                    ip_count += 1;
                    defang_ip(value)
                }
            };
            let label = match record.kind {
                IocKind::Url => "URL",
                IocKind::Ip => "IP",
            };
            let (severity, origin) = match record.decoded_from {
                Some(decoder) => (Severity::Warning, format!(", decoded from {decoder}")),
                None => (Severity::Info, String::new()),
            };
            let message = if record.hits > 1 {
                format!("{label}: {defanged} (seen {} times{origin})", record.hits)
            } else {
                format!("{label}: {defanged}{origin}")
            };
            findings.push(
                Finding::new(ScannerKind::Ioc, severity, message)
                    .with_location(record.first_file.clone(), record.first_line)
                    .with_evidence(record.locations.join("; ")),
            );
        }

        let summary = if findings.is_empty() {
            "No IOCs found".to_string()
        } else {
            format!("Found {url_count} unique URL(s) and {ip_count} IP literal(s)")
        };

        // IOCs are evidence for the reader, not a pass/fail signal.
        ScannerResult {
            scanner: ScannerKind::Ioc,
            passed: true,
            findings,
            summary,
        }
    }
}

fn is_valid_ipv4(raw: &str) -> bool {
    raw.split('.')
        .all(|octet| octet.parse::<u16>().is_ok_and(|value| value <= 255))
}

fn decode_hex_runs(line: &str) -> Vec<String> {
    RE_HEX_RUN
        .find_iter(line)
        .map(|run| {
            run.as_str()
                .split("\\x")
                .filter(|chunk| !chunk.is_empty())
                .filter_map(|chunk| u8::from_str_radix(chunk, 16).ok())
                .map(char::from)
                .collect()
        })
        .collect()
}

fn decode_unicode_runs(line: &str) -> Vec<String> {
    RE_UNICODE_RUN
        .find_iter(line)
        .map(|run| {
            let units: Vec<u16> = run
                .as_str()
                .split("\\u")
                .filter(|chunk| !chunk.is_empty())
                .filter_map(|chunk| u16::from_str_radix(chunk, 16).ok())
                .collect();
            String::from_utf16_lossy(&units)
        })
        .collect()
}

fn decode_charcodes(line: &str) -> Vec<String> {
    RE_CHARCODE
        .captures_iter(line)
        .filter_map(|captures| {
            let mut decoded = String::new();
            for number in captures[1].split(',') {
                let value: u32 = number.trim().parse().ok()?;
                decoded.push(char::from_u32(value)?);
            }
            Some(decoded)
        })
        .collect()
}

fn decode_base64_candidates(line: &str) -> Vec<String> {
    RE_BASE64_CANDIDATE
        .find_iter(line)
        .filter(|candidate| candidate.as_str().len() >= MIN_BASE64_CANDIDATE_LENGTH)
        .filter_map(|candidate| BASE64_STANDARD.decode(candidate.as_str()).ok())
        .filter_map(|bytes| {
            if bytes.len() < MIN_DECODED_LENGTH {
                return None;
            }
            let printable = bytes
                .iter()
                .filter(|&&byte| (0x20..=0x7e).contains(&byte))
                .count();
            let ratio = printable as f64 / bytes.len() as f64;
            (ratio >= PRINTABLE_RATIO_THRESHOLD)
                .then(|| String::from_utf8_lossy(&bytes).into_owned())
        })
        .collect()
}

/// Rewrites a URL so it cannot be interpreted by browsers or shells:
/// `https://a.b/c` becomes `hxxps[://]a[.]b/c`.
fn defang_url(raw: &str) -> String {
    let Some((scheme, rest)) = raw.split_once("://") else {
        return raw.replace('.', "[.]");
    };
    let defanged_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" => "hxxp".to_string(),
        "https" => "hxxps".to_string(),
        "ftp" => "fxp".to_string(),
        other => other.to_string(),
    };
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = rest[..host_end].replace('.', "[.]");
    let path = &rest[host_end..];
    format!("{defanged_scheme}[://]{host}{path}")
}

fn defang_ip(raw: &str) -> String {
    raw.replace('.', "[.]")
}

#[cfg(test)]
#[path = "ioc_tests.rs"]
mod tests;

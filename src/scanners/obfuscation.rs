//! Obfuscation heuristics: whole-file entropy, escape-sequence density,
//! base64 blobs, minified lines, and a structural string-array classifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::paths;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::{ScanContext, evidence_snippet, read_text_sample, walk_artifact};

/// Files below this size carry too little signal for entropy analysis.
const ENTROPY_MIN_FILE_BYTES: usize = 256;
const ENTROPY_WARNING: f64 = 6.2;
const ENTROPY_CRITICAL: f64 = 6.8;

/// A line this long with recognizable keywords is treated as minified.
const MINIFIED_LINE_LENGTH: usize = 500;
const VERY_LONG_LINE_LENGTH: usize = 1000;
const BASE64_BLOB_LENGTH: usize = 500;

/// Consecutive quoted strings required before an array is classified.
const STRING_ARRAY_MIN_ELEMENTS: usize = 50;
const READABILITY_RATIO_THRESHOLD: f64 = 0.3;
const READABLE_AVG_LENGTH_THRESHOLD: f64 = 2.0;

const MINIFIED_KEYWORDS: [&str; 14] = [
    "function",
    "return",
    "var",
    "let",
    "const",
    "if",
    "else",
    "for",
    "while",
    "class",
    "export",
    "import",
    "typeof",
    "instanceof",
];

static RE_HEX_ESCAPE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\x[0-9a-fA-F]{2}){4,}").expect("hex escape regex"));
static RE_BASE64_BLOB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/=]{500,}").expect("base64 blob regex"));
static RE_ROTATION_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_0x[0-9a-fA-F]+\s*=\s*$").expect("rotation ident regex"));
static RE_HEX_PAIR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\x[0-9a-fA-F]{2}){2,}").expect("hex pair regex"));
static RE_UNICODE_PAIR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\u[0-9a-fA-F]{4}){2,}").expect("unicode pair regex"));

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let mut findings = Vec::new();

    for file in walk_artifact(&context.root) {
        if !paths::is_scannable_source(&file.relative) {
            continue;
        }
        let Some((content, truncated)) = read_text_sample(&file.absolute, context.max_file_bytes)
        else {
            continue;
        };
        if truncated {
            findings.push(Finding::new(
                ScannerKind::Obfuscation,
                Severity::Info,
                format!(
                    "file exceeds {} bytes; analyzed a leading sample only",
                    context.max_file_bytes
                ),
            )
            .with_file(file.relative.clone()));
        }
        scan_content(&content, &file.relative, &mut findings);
    }

    let summary = summarize(&findings);
    ScannerResult::from_findings(ScannerKind::Obfuscation, findings, summary)
}

fn scan_content(content: &str, relative: &str, findings: &mut Vec<Finding>) {
    check_entropy(content, relative, findings);
    check_lines(content, relative, findings);
    check_string_arrays(content, relative, findings);
}

fn check_entropy(content: &str, relative: &str, findings: &mut Vec<Finding>) {
    if content.len() < ENTROPY_MIN_FILE_BYTES {
        return;
    }
    let entropy = shannon_entropy(content.as_bytes());
    if entropy < ENTROPY_WARNING {
        return;
    }

    let (severity, label) = if looks_minified(content) {
        (Severity::Info, "high entropy in minified code")
    } else if entropy >= ENTROPY_CRITICAL {
        (Severity::Critical, "very high entropy suggests obfuscation")
    } else {
        (Severity::Warning, "elevated entropy suggests packed content")
    };
    findings.push(
        Finding::new(
            ScannerKind::Obfuscation,
            severity,
            format!("{label} (Shannon entropy {entropy:.2})"),
        )
        .with_file(relative),
    );
}

/// Minified bundles legitimately score high on entropy: long lines plus
/// ordinary keywords, without heavy hex-escape usage.
fn looks_minified(content: &str) -> bool {
    let has_long_line = content
        .lines()
        .any(|line| line.len() > MINIFIED_LINE_LENGTH);
    if !has_long_line {
        return false;
    }
    let has_keywords = MINIFIED_KEYWORDS
        .iter()
        .any(|keyword| content.contains(keyword));
    if !has_keywords {
        return false;
    }
    RE_HEX_ESCAPE_RUN.find_iter(content).count() < 6
}

fn shannon_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0usize; 256];
    for &byte in bytes {
        counts[byte as usize] += 1;
    }
    let total = bytes.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

fn check_lines(content: &str, relative: &str, findings: &mut Vec<Finding>) {
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if RE_HEX_ESCAPE_RUN.is_match(line) {
            findings.push(
                Finding::new(
                    ScannerKind::Obfuscation,
                    Severity::Warning,
                    "run of hex escape sequences",
                )
                .with_location(relative, line_number)
                .with_evidence(evidence_snippet(line)),
            );
        }
        if RE_BASE64_BLOB.is_match(line) {
            findings.push(
                Finding::new(
                    ScannerKind::Obfuscation,
                    Severity::Warning,
                    format!("base64 blob longer than {BASE64_BLOB_LENGTH} characters"),
                )
                .with_location(relative, line_number),
            );
        }
        if line.len() > VERY_LONG_LINE_LENGTH {
            findings.push(
                Finding::new(
                    ScannerKind::Obfuscation,
                    Severity::Info,
                    "possible minification without source maps",
                )
                .with_location(relative, line_number),
            );
        }
    }
}

enum ArrayClass {
    Obfuscated,
    Data,
}

struct StringArray {
    open_index: usize,
    end_index: usize,
    strings: Vec<String>,
}

fn check_string_arrays(content: &str, relative: &str, findings: &mut Vec<Finding>) {
    for array in find_string_arrays(content) {
        let line_number = content[..array.open_index]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1;
        match classify_array(content, &array) {
            ArrayClass::Obfuscated => findings.push(
                Finding::new(
                    ScannerKind::Obfuscation,
                    Severity::Critical,
                    format!(
                        "string array of {} elements with push/shift rotation (obfuscator output)",
                        array.strings.len()
                    ),
                )
                .with_location(relative, line_number),
            ),
            ArrayClass::Data => findings.push(
                Finding::new(
                    ScannerKind::Obfuscation,
                    Severity::Info,
                    format!("large string array ({} elements) looks like data", array.strings.len()),
                )
                .with_location(relative, line_number),
            ),
        }
    }
}

/// Micro-parse: from each `[`, consume whitespace/comma separated quoted
/// strings until `]` or a non-string element.
fn find_string_arrays(content: &str) -> Vec<StringArray> {
    let bytes = content.as_bytes();
    let mut arrays = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        let (strings, end_index) = collect_strings(content, i + 1);
        if strings.len() >= STRING_ARRAY_MIN_ELEMENTS {
            arrays.push(StringArray {
                open_index: i,
                end_index,
                strings,
            });
            // Resume past this array so nested opens are not re-parsed.
            i = end_index;
        }
        i += 1;
    }
    arrays
}

fn collect_strings(content: &str, start: usize) -> (Vec<String>, usize) {
    let bytes = content.as_bytes();
    let mut strings = Vec::new();
    let mut i = start;

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        if i >= bytes.len() {
            return (strings, i);
        }
        match bytes[i] {
            b']' => return (strings, i),
            quote @ (b'\'' | b'"' | b'`') => {
                let content_start = i + 1;
                let mut j = content_start;
                while j < bytes.len() {
                    if bytes[j] == b'\\' {
                        j += 2;
                        continue;
                    }
                    if bytes[j] == quote {
                        break;
                    }
                    j += 1;
                }
                if j >= bytes.len() {
                    return (strings, j.min(bytes.len()));
                }
                strings.push(content[content_start..j].to_string());
                i = j + 1;
            }
            _ => return (strings, i),
        }
    }
}

fn classify_array(content: &str, array: &StringArray) -> ArrayClass {
    // Obfuscator-style assignment immediately before the bracket. Window
    // edges are clamped to char boundaries; non-ASCII content must not
    // split a code point.
    let before_start = floor_char_boundary(content, array.open_index.saturating_sub(50));
    let before = &content[before_start..array.open_index];
    let after_start = array.end_index.min(content.len());
    let after_end = ceil_char_boundary(content, (array.end_index + 500).min(content.len()));
    let after = &content[after_start..after_end];
    let has_rotation =
        RE_ROTATION_IDENT.is_match(before) || (after.contains(".push(") && after.contains(".shift("));
    if has_rotation {
        return ArrayClass::Obfuscated;
    }

    if readability_ratio(&array.strings) >= READABILITY_RATIO_THRESHOLD
        && average_length(&array.strings) >= READABLE_AVG_LENGTH_THRESHOLD
    {
        // A bundled keyword or locale table, most likely.
        return ArrayClass::Data;
    }

    // Unreadable arrays without a rotation marker still classify as data;
    // the entropy detector is the backstop for those.
    ArrayClass::Data
}

fn floor_char_boundary(content: &str, mut index: usize) -> usize {
    while index > 0 && !content.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(content: &str, mut index: usize) -> usize {
    while index < content.len() && !content.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn readability_ratio(strings: &[String]) -> f64 {
    if strings.is_empty() {
        return 0.0;
    }
    let readable = strings
        .iter()
        .filter(|s| {
            s.chars().any(|c| c.is_ascii_alphabetic())
                && !RE_HEX_PAIR_RUN.is_match(s)
                && !RE_UNICODE_PAIR_RUN.is_match(s)
        })
        .count();
    readable as f64 / strings.len() as f64
}

fn average_length(strings: &[String]) -> f64 {
    if strings.is_empty() {
        return 0.0;
    }
    let total: usize = strings.iter().map(|s| s.chars().count()).sum();
    total as f64 / strings.len() as f64
}

fn summarize(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No obfuscation detected".to_string();
    }
    let critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let warning = findings
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .count();
    let info = findings
        .iter()
        .filter(|f| f.severity == Severity::Info)
        .count();
    format!("Obfuscation indicators: {critical} critical, {warning} warning, {info} info")
}

#[cfg(test)]
#[path = "obfuscation_tests.rs"]
mod tests;

use super::*;

use std::fs;
use std::path::Path;

use crate::scanners::ScanContext;

fn context(root: &Path) -> ScanContext {
    ScanContext {
        root: root.to_path_buf(),
        package_name: "demo".to_string(),
        manifest: None,
        max_file_bytes: 8 * 1024 * 1024,
        extra_ignored_domains: Vec::new(),
        extra_ignored_ips: Vec::new(),
    }
}

fn quoted_array(count: usize, value: &str) -> String {
    let elements: Vec<String> = (0..count).map(|i| format!("'{value}{i}'")).collect();
    format!("[{}]", elements.join(","))
}

#[test]
fn small_files_skip_entropy() {
    let mut findings = Vec::new();
    check_entropy("short", "a.js", &mut findings);
    assert!(findings.is_empty());
}

#[test]
fn shannon_entropy_bounds() {
    assert_eq!(shannon_entropy(b""), 0.0);
    assert_eq!(shannon_entropy(b"aaaa"), 0.0);
    let uniform: Vec<u8> = (0..=255).collect();
    let entropy = shannon_entropy(&uniform);
    assert!((entropy - 8.0).abs() < 1e-9);
}

#[test]
fn high_entropy_without_minification_flags() {
    // Pseudo-random bytes mapped into printable range drive entropy up
    // without tripping the minified heuristic (no long keyword lines).
    let mut state = 0x2545F491u64;
    let mut content = String::new();
    while content.len() < 4096 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let byte = ((state >> 33) % 94 + 33) as u8;
        content.push(byte as char);
        if content.len() % 80 == 0 {
            content.push('\n');
        }
    }
    let mut findings = Vec::new();
    check_entropy(&content, "blob.js", &mut findings);
    assert_eq!(findings.len(), 1);
    assert!(findings[0].severity >= Severity::Warning);
}

#[test]
fn minified_heuristic_downgrades_to_info() {
    let mut line = String::from("function a(){return b}var c=1;");
    // One very long line dominated by dense but keyword-bearing code.
    let mut state = 0x9E3779B9u64;
    while line.len() < 2000 {
        state = state.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
        line.push((((state >> 33) % 94) + 33) as u8 as char);
    }
    let mut findings = Vec::new();
    check_entropy(&line, "bundle.min.js", &mut findings);
    if let Some(finding) = findings.first() {
        assert_eq!(finding.severity, Severity::Info);
        assert!(finding.message.contains("minified"));
    }
}

#[test]
fn hex_escape_lines_warn() {
    let mut findings = Vec::new();
    check_lines(
        "var s = \"\\x68\\x74\\x74\\x70\";\nplain line\n",
        "a.js",
        &mut findings,
    );
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].line, Some(1));
}

#[test]
fn three_hex_escapes_do_not_warn() {
    let mut findings = Vec::new();
    check_lines("var s = \"\\x68\\x74\\x74\";\n", "a.js", &mut findings);
    assert!(findings.is_empty());
}

#[test]
fn base64_blob_warns() {
    let blob = "QUJD".repeat(130);
    let mut findings = Vec::new();
    check_lines(&format!("var p = \"{blob}\";\n"), "a.js", &mut findings);
    assert!(findings
        .iter()
        .any(|f| f.severity == Severity::Warning && f.message.contains("base64")));
}

#[test]
fn very_long_line_is_info() {
    let line = format!("{};\n", "x".repeat(1200));
    let mut findings = Vec::new();
    check_lines(&line, "a.js", &mut findings);
    assert!(findings
        .iter()
        .any(|f| f.severity == Severity::Info && f.message.contains("minification")));
}

#[test]
fn rotation_array_is_critical() {
    let array = quoted_array(60, "part");
    let content = format!(
        "var _0x1a2b = {array};\n(function(a,b){{a.push(a.shift())}})(_0x1a2b, 0x1f4);\n"
    );
    let mut findings = Vec::new();
    check_string_arrays(&content, "obf.js", &mut findings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Critical);
    assert!(findings[0].message.contains("60 elements"));
}

#[test]
fn keyword_table_is_data() {
    let array = quoted_array(80, "keyword");
    let content = format!("const words = {array};\n");
    let mut findings = Vec::new();
    check_string_arrays(&content, "table.js", &mut findings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Info);
    assert!(findings[0].message.contains("data"));
}

#[test]
fn short_arrays_are_ignored() {
    let array = quoted_array(20, "x");
    let mut findings = Vec::new();
    check_string_arrays(&format!("var a = {array};"), "a.js", &mut findings);
    assert!(findings.is_empty());
}

#[test]
fn non_ascii_context_near_arrays_does_not_panic() {
    // The 50-char classifier window lands inside a multi-byte character.
    let array = quoted_array(55, "wörd");
    let content = format!("{} = {array};", "🎈".repeat(20));
    let mut findings = Vec::new();
    check_string_arrays(&content, "i18n.js", &mut findings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Info);
}

#[test]
fn escaped_quotes_do_not_break_parsing() {
    let elements: Vec<String> = (0..55).map(|i| format!("'it\\'s {i}'")).collect();
    let content = format!("var a = [{}];", elements.join(", "));
    let arrays = find_string_arrays(&content);
    assert_eq!(arrays.len(), 1);
    assert_eq!(arrays[0].strings.len(), 55);
}

#[test]
fn scan_reports_summary_counts() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("payload.js"),
        "var s = \"\\x41\\x42\\x43\\x44\";\n",
    )
    .expect("write");

    let result = scan(&context(dir.path()));
    assert!(!result.passed);
    assert!(result.summary.starts_with("Obfuscation indicators:"));
}

#[test]
fn clean_tree_passes() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("index.js"), "module.exports = 42;\n").expect("write");
    let result = scan(&context(dir.path()));
    assert!(result.passed);
    assert_eq!(result.summary, "No obfuscation detected");
}

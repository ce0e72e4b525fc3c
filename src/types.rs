use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Identity of one scanner pass. Variant order is the canonical report
/// order (alphabetical), so sorting by the enum sorts the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    Binaries,
    Dependencies,
    Hooks,
    Ioc,
    Obfuscation,
    Secrets,
    Static,
    Typosquat,
}

impl ScannerKind {
    pub const ALL: [ScannerKind; 8] = [
        ScannerKind::Binaries,
        ScannerKind::Dependencies,
        ScannerKind::Hooks,
        ScannerKind::Ioc,
        ScannerKind::Obfuscation,
        ScannerKind::Secrets,
        ScannerKind::Static,
        ScannerKind::Typosquat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScannerKind::Binaries => "binaries",
            ScannerKind::Dependencies => "dependencies",
            ScannerKind::Hooks => "hooks",
            ScannerKind::Ioc => "ioc",
            ScannerKind::Obfuscation => "obfuscation",
            ScannerKind::Secrets => "secrets",
            ScannerKind::Static => "static",
            ScannerKind::Typosquat => "typosquat",
        }
    }
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation from a scanner. Value object; never mutated downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub scanner: ScannerKind,
    pub severity: Severity,
    pub message: String,
    /// Path relative to the artifact root, forward-slash separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-indexed line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Finding {
    pub fn new(scanner: ScannerKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            scanner,
            severity,
            message: message.into(),
            file: None,
            line: None,
            evidence: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Output of one scanner pass. Findings keep insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerResult {
    pub scanner: ScannerKind,
    pub passed: bool,
    pub findings: Vec<Finding>,
    pub summary: String,
}

impl ScannerResult {
    /// Builds a result whose `passed` flag is derived from the findings:
    /// true iff no finding is warning or critical.
    pub fn from_findings(
        scanner: ScannerKind,
        findings: Vec<Finding>,
        summary: impl Into<String>,
    ) -> Self {
        let passed = !findings
            .iter()
            .any(|finding| finding.severity >= Severity::Warning);
        Self {
            scanner,
            passed,
            findings,
            summary: summary.into(),
        }
    }

    pub fn empty(scanner: ScannerKind, summary: impl Into<String>) -> Self {
        Self {
            scanner,
            passed: true,
            findings: Vec::new(),
            summary: summary.into(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }
}

/// Registry metadata for the resolved package version. Created once by the
/// package provider and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarball_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpacked_size: Option<u64>,
    pub dependencies: BTreeMap<String, String>,
    pub optional_dependencies: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub maintainers: Vec<String>,
    /// True when the version carries a provenance attestation, i.e. it was
    /// published by an identity-federated automated pipeline.
    pub trusted_publisher: bool,
}

impl PackageMetadata {
    pub fn minimal(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            license: None,
            publisher: None,
            published: None,
            tarball_url: None,
            repository_url: None,
            homepage: None,
            file_count: None,
            unpacked_size: None,
            dependencies: BTreeMap::new(),
            optional_dependencies: BTreeMap::new(),
            scripts: BTreeMap::new(),
            maintainers: Vec::new(),
            trusted_publisher: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoHealth {
    pub found: bool,
    pub full_name: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub publisher_matches_owner: bool,
}

impl RepoHealth {
    pub fn not_found() -> Self {
        Self {
            found: false,
            full_name: String::new(),
            stars: 0,
            forks: 0,
            open_issues: 0,
            license: None,
            created_at: None,
            pushed_at: None,
            archived: false,
            publisher_matches_owner: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub performed: bool,
    /// In the artifact, absent from the repo, not matching the
    /// build-artifact heuristic.
    pub unexpected_files: Vec<String>,
    /// In the artifact, absent from the repo, matching the heuristic.
    pub expected_build_files: Vec<String>,
    /// Present in both trees with differing content hashes.
    pub modified_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiffResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            performed: false,
            unexpected_files: Vec::new(),
            expected_build_files: Vec::new(),
            modified_files: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            Grade::A | Grade::B => "CLEAN",
            Grade::C => "CAUTION",
            Grade::D | Grade::F => "DANGER",
        }
    }

    /// Exit-code contract: 0 for A/B, 1 for C, 2 for D/F.
    pub fn exit_code(self) -> i32 {
        match self {
            Grade::A | Grade::B => 0,
            Grade::C => 1,
            Grade::D | Grade::F => 2,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Final scan report, assembled once after all scanners complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub package: PackageMetadata,
    /// Canonical (alphabetical) scanner order.
    pub scanners: Vec<ScannerResult>,
    pub github: Option<RepoHealth>,
    pub diff: Option<DiffResult>,
    pub score: u32,
    pub grade: Grade,
    pub verdict: String,
    /// Wall-clock duration in milliseconds.
    pub duration: u64,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

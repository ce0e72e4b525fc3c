//! Weighted aggregation of scanner results into the final 0-100 score.
//!
//! Each scanner category starts at its maximum and loses points per
//! finding with diminishing returns: `n` findings of one severity deduct
//! `base * (1 + ln n)`. Categories clamp independently, the total clamps
//! to [0, 100].

use chrono::{DateTime, Duration, Utc};

use crate::types::{DiffResult, Grade, RepoHealth, ScannerKind, ScannerResult, Severity};

struct CategoryWeight {
    scanner: ScannerKind,
    max: f64,
    critical: f64,
    warning: f64,
    info: f64,
}

const WEIGHTS: [CategoryWeight; 7] = [
    CategoryWeight {
        scanner: ScannerKind::Static,
        max: 25.0,
        critical: 15.0,
        warning: 5.0,
        info: 0.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Obfuscation,
        max: 15.0,
        critical: 10.0,
        warning: 10.0,
        info: 3.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Hooks,
        max: 10.0,
        critical: 10.0,
        warning: 5.0,
        info: 0.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Secrets,
        max: 5.0,
        critical: 5.0,
        warning: 5.0,
        info: 0.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Binaries,
        max: 5.0,
        critical: 3.0,
        warning: 3.0,
        info: 1.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Dependencies,
        max: 10.0,
        critical: 10.0,
        warning: 5.0,
        info: 0.0,
    },
    CategoryWeight {
        scanner: ScannerKind::Typosquat,
        max: 5.0,
        critical: 5.0,
        warning: 5.0,
        info: 0.0,
    },
];

pub const HEALTH_MAX: f64 = 15.0;
pub const DIFF_MAX: f64 = 10.0;

const NEW_REPO_AGE_DAYS: i64 = 30;
const ESTABLISHED_STARS: u64 = 100;

/// Deduction for `n` findings at one severity with base deduction `b`:
/// zero at `n = 0`, `b * (1 + ln n)` otherwise.
fn diminishing_deduction(base: f64, count: usize) -> f64 {
    if count == 0 || base == 0.0 {
        return 0.0;
    }
    base * (1.0 + (count as f64).ln())
}

fn category_score(weight: &CategoryWeight, result: &ScannerResult) -> f64 {
    let deduction = diminishing_deduction(weight.critical, result.count(Severity::Critical))
        + diminishing_deduction(weight.warning, result.count(Severity::Warning))
        + diminishing_deduction(weight.info, result.count(Severity::Info));
    (weight.max - deduction).clamp(0.0, weight.max)
}

/// Repository-health score out of 15; zero when no repository was found.
pub fn health_score(
    health: Option<&RepoHealth>,
    trusted_publisher: bool,
    now: DateTime<Utc>,
) -> f64 {
    let Some(health) = health else {
        return 0.0;
    };
    if !health.found {
        return 0.0;
    }

    let mut score = HEALTH_MAX;
    if health.archived {
        score -= 10.0;
    }
    if health.stars == 0 {
        score -= 5.0;
    }
    if let Some(created_at) = health.created_at {
        if now.signed_duration_since(created_at) < Duration::days(NEW_REPO_AGE_DAYS) {
            score -= 5.0;
        }
    }
    if !health.publisher_matches_owner {
        // A provenance attestation explains the mismatch: the artifact
        // was published by an automated pipeline, not the repo owner.
        score -= if trusted_publisher {
            0.0
        } else if health.stars >= ESTABLISHED_STARS {
            3.0
        } else {
            10.0
        };
    }
    score.clamp(0.0, HEALTH_MAX)
}

/// Diff score out of 10; zero when the diff was not performed. The
/// unexpected-file deduction is capped at 8, a nudge rather than a cliff.
pub fn diff_score(diff: Option<&DiffResult>) -> f64 {
    let Some(diff) = diff else {
        return 0.0;
    };
    if !diff.performed {
        return 0.0;
    }
    let unexpected = diff.unexpected_files.len();
    if unexpected == 0 {
        return DIFF_MAX;
    }
    let deduction = (3.0 * (1.0 + (unexpected.max(1) as f64).ln())).min(8.0);
    (DIFF_MAX - deduction).clamp(0.0, DIFF_MAX)
}

/// Combines category, health, and diff scores into the clamped total.
pub fn total_score(
    scanners: &[ScannerResult],
    health: Option<&RepoHealth>,
    diff: Option<&DiffResult>,
    trusted_publisher: bool,
    now: DateTime<Utc>,
) -> u32 {
    let mut total = 0.0;
    for weight in &WEIGHTS {
        let Some(result) = scanners
            .iter()
            .find(|result| result.scanner == weight.scanner)
        else {
            // A missing scanner result scores as a clean category.
            total += weight.max;
            continue;
        };
        total += category_score(weight, result);
    }
    total += health_score(health, trusted_publisher, now);
    total += diff_score(diff);
    (total.round().clamp(0.0, 100.0)) as u32
}

pub fn grade(score: u32) -> Grade {
    Grade::from_score(score)
}

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;

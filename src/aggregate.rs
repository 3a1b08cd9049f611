//! Merges lens outputs for one file into a `ScanResult`: severity-sorted
//! findings, a confidence score, a content digest and per-lens counts.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::lens::{Finding, LensCounts, LensKind, Severity};

/// One scanned file's outcome, consumed by report renderers and the
/// upload path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub file: PathBuf,
    /// Findings sorted severity-descending (stable for ties).
    pub issues: Vec<Finding>,
    /// Hex SHA-256 of the file content at scan time.
    pub hash: String,
    /// Mean per-finding confidence, exactly 1.0 for a clean file.
    pub confidence: f64,
    pub lens_counts: LensCounts,
}

/// Merge the four lenses' outputs, in lens order, into a `ScanResult`.
pub fn aggregate(file: &Path, content: &str, outputs: Vec<(LensKind, Vec<Finding>)>) -> ScanResult {
    let mut lens_counts = LensCounts::default();
    let mut issues = Vec::new();
    for (kind, findings) in outputs {
        lens_counts.record(kind, findings.len());
        issues.extend(findings);
    }

    let confidence = confidence_score(&issues);
    issues.sort_by_key(|f| Reverse(f.severity));

    ScanResult {
        file: file.to_path_buf(),
        issues,
        hash: hex::encode(Sha256::digest(content.as_bytes())),
        confidence,
        lens_counts,
    }
}

/// Mean of per-finding scores; an empty set is perfectly confident.
fn confidence_score(findings: &[Finding]) -> f64 {
    if findings.is_empty() {
        return 1.0;
    }
    let sum: f64 = findings.iter().map(finding_confidence).sum();
    sum / findings.len() as f64
}

/// Base 0.5, +0.2 for a pinned line, +0.2 for a remediation, +0.1 for
/// critical severity, clamped to 1.0.
fn finding_confidence(finding: &Finding) -> f64 {
    let mut score: f64 = 0.5;
    if finding.line.is_some() {
        score += 0.2;
    }
    if finding.fix.is_some() {
        score += 0.2;
    }
    if finding.severity == Severity::Critical {
        score += 0.1;
    }
    score.min(1.0)
}

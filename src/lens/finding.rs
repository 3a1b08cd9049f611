use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single issue reported by one lens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Issue kind (closed set, e.g. secret, sql_injection, auth_bypass).
    pub kind: IssueKind,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description of the finding.
    pub message: String,
    /// 1-based line number, when the lens can pin one down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 0-based column offset within the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Suggested remediation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Trimmed source line serving as evidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Lens-specific extras (route, provider name, matched signature).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Severity ladder. `Ord` is ascending so `max()` yields the worst level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lenient parse for config/CLI input. Unknown text maps to `None`;
    /// callers that must produce a severity fall back to `Medium`.
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" | "MED" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" | "CRIT" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Canonical uppercase form used anywhere a severity is printed.
    pub fn normalize(s: &str) -> Self {
        Self::from_str_lenient(s).unwrap_or(Self::Medium)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Closed set of issue kinds a lens may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Secret,
    Xss,
    SqlInjection,
    Dangerous,
    Insecure,
    AuthBypass,
    DockerConfig,
    CorsConfig,
    RaceCondition,
    Idor,
    Debug,
    Todo,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Secret => "secret",
            Self::Xss => "xss",
            Self::SqlInjection => "sql_injection",
            Self::Dangerous => "dangerous",
            Self::Insecure => "insecure",
            Self::AuthBypass => "auth_bypass",
            Self::DockerConfig => "docker_config",
            Self::CorsConfig => "cors_config",
            Self::RaceCondition => "race_condition",
            Self::Idor => "idor",
            Self::Debug => "debug",
            Self::Todo => "todo",
        };
        write!(f, "{tag}")
    }
}

/// Which analysis strategy produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensKind {
    Syntax,
    Spec,
    Infra,
    Behavioral,
}

impl std::fmt::Display for LensKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Spec => write!(f, "spec"),
            Self::Infra => write!(f, "infra"),
            Self::Behavioral => write!(f, "behavioral"),
        }
    }
}

/// Per-lens finding counts attached to each scan result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensCounts {
    pub syntax: usize,
    pub spec: usize,
    pub infra: usize,
    pub behavioral: usize,
}

impl LensCounts {
    pub fn record(&mut self, kind: LensKind, count: usize) {
        match kind {
            LensKind::Syntax => self.syntax += count,
            LensKind::Spec => self.spec += count,
            LensKind::Infra => self.infra += count,
            LensKind::Behavioral => self.behavioral += count,
        }
    }

    pub fn total(&self) -> usize {
        self.syntax + self.spec + self.infra + self.behavioral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn lenient_parse_accepts_any_case() {
        assert_eq!(Severity::from_str_lenient("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_lenient("High"), Some(Severity::High));
        assert_eq!(Severity::from_str_lenient("bogus"), None);
    }

    #[test]
    fn normalize_defaults_to_medium() {
        assert_eq!(Severity::normalize("nonsense"), Severity::Medium);
        assert_eq!(Severity::normalize("LOW"), Severity::Low);
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
    }

    #[test]
    fn issue_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&IssueKind::SqlInjection).unwrap(), "\"sql_injection\"");
        assert_eq!(IssueKind::AuthBypass.to_string(), "auth_bypass");
    }
}

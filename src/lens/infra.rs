use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FileContext, Finding, IssueKind, Lens, LensKind, Severity};

pub struct InfraLens;

static FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*FROM\s+(?:--platform=\S+\s+)?(\S+)").unwrap());

static USER_ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*USER\s+root\b").unwrap());

static ENV_ARG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(?:ENV|ARG)\s+([A-Za-z_][A-Za-z0-9_]*)(?:=|\s+)["']?([^\s"']+)["']?\s*$"#)
        .unwrap()
});

static DOTENV_ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*["']?([^\s"'#]+)["']?"#).unwrap()
});

static CORS_WILDCARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Access-Control-Allow-Origin['"]?\s*[,:=]\s*['"]?\*|\borigin\s*:\s*['"]\*['"]"#)
        .unwrap()
});

static CORS_CREDENTIALS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Access-Control-Allow-Credentials['"]?\s*[,:=]\s*['"]?true|\bcredentials\s*:\s*true"#)
        .unwrap()
});

const PLACEHOLDER_MARKERS: &[&str] = &[
    "example", "placeholder", "changeme", "your_", "insert_", "dummy", "sample", "xxx",
];

impl Lens for InfraLens {
    fn kind(&self) -> LensKind {
        LensKind::Infra
    }

    fn inspect(&self, ctx: &FileContext<'_>) -> Vec<Finding> {
        let name = ctx
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut findings = Vec::new();
        if name.contains("dockerfile") {
            audit_dockerfile(ctx.content, &mut findings);
        }
        if name.contains(".env") {
            audit_env_file(ctx.content, &mut findings);
        }
        audit_cors(ctx.content, &mut findings);
        findings
    }
}

fn audit_dockerfile(content: &str, findings: &mut Vec<Finding>) {
    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;

        if let Some(cap) = FROM_RE.captures(raw) {
            let image = &cap[1];
            if is_floating_image(image) {
                findings.push(infra_finding(
                    IssueKind::DockerConfig,
                    Severity::Medium,
                    format!("Base image '{image}' uses a floating tag"),
                    line,
                    raw,
                    Some("Pin the base image to a specific version or digest.".into()),
                ));
            }
        }

        if USER_ROOT_RE.is_match(raw) {
            findings.push(infra_finding(
                IssueKind::DockerConfig,
                Severity::Medium,
                "Container runs as root".into(),
                line,
                raw,
                Some("Create and switch to an unprivileged user.".into()),
            ));
        }

        if let Some(cap) = ENV_ARG_RE.captures(raw) {
            let (key, value) = (&cap[1], &cap[2]);
            if looks_opaque(value) {
                findings.push(infra_finding(
                    IssueKind::Secret,
                    Severity::High,
                    format!("Build declaration '{key}' embeds a secret-like literal"),
                    line,
                    raw,
                    Some("Inject secrets at runtime instead of baking them into the image.".into()),
                ));
            }
        }
    }
}

fn audit_env_file(content: &str, findings: &mut Vec<Finding>) {
    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(cap) = DOTENV_ASSIGN_RE.captures(raw) {
            let (key, value) = (&cap[1], &cap[2]);
            if looks_opaque(value) {
                findings.push(infra_finding(
                    IssueKind::Secret,
                    Severity::High,
                    format!("Possible exposed secret in '{key}'"),
                    idx + 1,
                    raw,
                    Some("Keep real credentials out of committed env files.".into()),
                ));
            }
        }
    }
}

/// Wildcard CORS origin is high on its own; co-occurring with an
/// allow-credentials declaration anywhere in the same file it becomes
/// critical.
fn audit_cors(content: &str, findings: &mut Vec<Finding>) {
    let Some(m) = CORS_WILDCARD_RE.find(content) else {
        return;
    };
    let allows_credentials = CORS_CREDENTIALS_RE.is_match(content);
    let line = content[..m.start()].matches('\n').count() + 1;
    let raw = content.lines().nth(line - 1).unwrap_or_default();

    let (severity, message) = if allows_credentials {
        (
            Severity::Critical,
            "Wildcard CORS origin combined with credentials".to_string(),
        )
    } else {
        (Severity::High, "Wildcard CORS origin".to_string())
    };
    findings.push(infra_finding(
        IssueKind::CorsConfig,
        severity,
        message,
        line,
        raw,
        Some("Restrict allowed origins to an explicit list.".into()),
    ));
}

/// Floating means no tag at all or an explicit latest-style tag. Stage
/// aliases, scratch, and ARG-driven references are left alone.
fn is_floating_image(image: &str) -> bool {
    if image == "scratch" || image.contains('$') || image.contains('@') {
        return false;
    }
    match image.rsplit_once(':') {
        Some((_, tag)) => tag.eq_ignore_ascii_case("latest"),
        None => true,
    }
}

/// A long, url-free run of token characters with at least one digit.
fn looks_opaque(value: &str) -> bool {
    if value.len() < 20 {
        return false;
    }
    let charset_ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '_' | '-'));
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let lowered = value.to_lowercase();
    let placeholder = PLACEHOLDER_MARKERS.iter().any(|p| lowered.contains(p));
    charset_ok && has_digit && !placeholder
}

fn infra_finding(
    kind: IssueKind,
    severity: Severity,
    message: String,
    line: usize,
    raw: &str,
    fix: Option<String>,
) -> Finding {
    Finding {
        kind,
        severity,
        message,
        line: Some(line),
        column: None,
        fix,
        snippet: Some(raw.trim().to_string()),
        metadata: BTreeMap::new(),
    }
}

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FileContext, Finding, IssueKind, Lens, LensKind, Severity};

pub struct BehavioralLens;

// Token verification with expiration checks turned off, JS and Python shapes.
static NO_EXPIRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"ignoreExpiration\s*:\s*true|['"]verify_exp['"]\s*:\s*False|validate_exp\s*=\s*False"#)
        .unwrap()
});

// Async callback driving an iteration, optionally mutating a shared
// collection on the same line.
static ASYNC_FOREACH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.forEach\s*\(\s*async\b").unwrap());

static ASYNC_MAP_PUSH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.map\s*\(\s*async\b.*\.push\s*\(").unwrap());

// Object lookup whose argument comes straight from request input.
static DIRECT_LOOKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(findById|findOne|findByPk|findUnique|getById)\s*\(\s*req\.(params|query|body)")
        .unwrap()
});

/// Evidence of an authorization check near a direct object lookup.
const AUTHZ_TOKENS: &[&str] = &[
    "authorize",
    "isOwner",
    "checkOwnership",
    "checkPermission",
    "hasPermission",
    "ensureOwner",
    "req.user",
    "currentUser",
    ".can(",
];

/// How many preceding lines count as "nearby" for an authorization check.
const AUTHZ_WINDOW: usize = 5;

impl Lens for BehavioralLens {
    fn kind(&self) -> LensKind {
        LensKind::Behavioral
    }

    fn inspect(&self, ctx: &FileContext<'_>) -> Vec<Finding> {
        let lines: Vec<&str> = ctx.content.lines().collect();
        let mut findings = Vec::new();

        for (idx, raw) in lines.iter().enumerate() {
            let line = idx + 1;

            if let Some(m) = NO_EXPIRY_RE.find(raw) {
                findings.push(behavioral_finding(
                    IssueKind::AuthBypass,
                    Severity::Critical,
                    "Token verification disables expiration checking".into(),
                    line,
                    m.start(),
                    raw,
                    Some("Validate token expiry; rotate tokens instead of ignoring exp.".into()),
                ));
            }

            if let Some(m) = ASYNC_FOREACH_RE
                .find(raw)
                .or_else(|| ASYNC_MAP_PUSH_RE.find(raw))
            {
                findings.push(behavioral_finding(
                    IssueKind::RaceCondition,
                    Severity::Medium,
                    "Async callback iterates over a shared collection".into(),
                    line,
                    m.start(),
                    raw,
                    Some("Use for..of with await, or collect promises and Promise.all them.".into()),
                ));
            }

            if let Some(m) = DIRECT_LOOKUP_RE.find(raw) {
                let window_start = idx.saturating_sub(AUTHZ_WINDOW);
                let guarded = lines[window_start..=idx]
                    .iter()
                    .any(|l| AUTHZ_TOKENS.iter().any(|t| l.contains(t)));
                if !guarded {
                    findings.push(behavioral_finding(
                        IssueKind::Idor,
                        Severity::High,
                        "Object lookup keyed directly by request input without an authorization check"
                            .into(),
                        line,
                        m.start(),
                        raw,
                        Some("Verify the requester is allowed to access this object before loading it.".into()),
                    ));
                }
            }
        }

        findings
    }
}

fn behavioral_finding(
    kind: IssueKind,
    severity: Severity,
    message: String,
    line: usize,
    column: usize,
    raw: &str,
    fix: Option<String>,
) -> Finding {
    Finding {
        kind,
        severity,
        message,
        line: Some(line),
        column: Some(column),
        fix,
        snippet: Some(raw.trim().to_string()),
        metadata: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::KnowledgeBase;
    use std::path::Path;

    fn run(content: &str) -> Vec<Finding> {
        let kb = KnowledgeBase::new();
        let ctx = FileContext {
            path: Path::new("service.js"),
            content,
            root: Path::new("."),
            kb: &kb,
            api_spec: None,
        };
        BehavioralLens.inspect(&ctx)
    }

    #[test]
    fn disabled_expiry_check_is_critical_auth_bypass() {
        let findings = run("jwt.verify(token, secret, { ignoreExpiration: true });\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::AuthBypass);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].line, Some(1));
    }

    #[test]
    fn python_verify_exp_false_also_flagged() {
        let findings = run("claims = jwt.decode(tok, key, options={\"verify_exp\": False})\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::AuthBypass);
    }

    #[test]
    fn normal_verify_passes() {
        assert!(run("jwt.verify(token, secret);\n").is_empty());
    }

    #[test]
    fn async_foreach_is_medium_race() {
        let findings = run("items.forEach(async (item) => { await save(item); });\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::RaceCondition);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn async_map_with_shared_push_is_race() {
        let findings = run("ids.map(async id => { results.push(await load(id)); });\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::RaceCondition);
    }

    #[test]
    fn plain_foreach_passes() {
        assert!(run("items.forEach(item => save(item));\n").is_empty());
    }

    #[test]
    fn unguarded_lookup_from_request_input_is_idor() {
        let findings = run("const doc = await Doc.findById(req.params.id);\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::Idor);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn nearby_authorization_check_suppresses_idor() {
        let code = "if (!req.user.canAccess(id)) return res.sendStatus(403);\nconst doc = await Doc.findById(req.params.id);\n";
        assert!(run(code).is_empty());
    }

    #[test]
    fn authorization_outside_window_does_not_count() {
        let mut code = String::from("authorize(req);\n");
        for _ in 0..6 {
            code.push_str("doWork();\n");
        }
        code.push_str("const doc = await Doc.findById(req.params.id);\n");
        let findings = run(&code);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, IssueKind::Idor);
    }
}

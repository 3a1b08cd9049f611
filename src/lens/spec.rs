use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use super::{FileContext, Finding, IssueKind, Lens, LensKind, Severity};

/// Well-known specification file names probed at the project root.
const SPEC_FILE_NAMES: &[&str] = &[
    "openapi.json",
    "openapi.yaml",
    "openapi.yml",
    "swagger.json",
    "swagger.yaml",
    "swagger.yml",
];

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

/// Identifiers whose presence anywhere in a file counts as evidence of
/// authentication middleware.
const AUTH_MIDDLEWARE: &[&str] = &[
    "authenticate",
    "requireAuth",
    "requiresAuth",
    "isAuthenticated",
    "ensureLoggedIn",
    "verifyToken",
    "checkAuth",
    "authMiddleware",
    "passport",
    "jwtCheck",
];

/// A path+method the specification marks as requiring authentication,
/// with a compiled matcher for route-registration calls.
#[derive(Debug)]
pub struct SecuredRoute {
    pub method: String,
    pub path: String,
    pattern: Regex,
}

/// The parsed API specification: just the secured routes, which is all
/// this lens cross-references.
#[derive(Debug, Default)]
pub struct ApiSpec {
    pub secured: Vec<SecuredRoute>,
}

impl ApiSpec {
    /// Probe the root for a spec file. Absent file: `None`, silently.
    /// Malformed file: `None` with a warning — the lens is disabled for
    /// the run, never fatal.
    pub fn load(root: &Path) -> Option<Self> {
        for name in SPEC_FILE_NAMES {
            let path = root.join(name);
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let doc: serde_json::Value = if name.ends_with(".json") {
                match serde_json::from_str(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "malformed API spec, specification lens disabled");
                        return None;
                    }
                }
            } else {
                match serde_yaml::from_str(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "malformed API spec, specification lens disabled");
                        return None;
                    }
                }
            };
            return Some(Self::from_document(&doc));
        }
        None
    }

    /// Extract every operation that requires authentication: an explicit
    /// non-empty operation-level `security`, or any operation at all when
    /// a non-empty global `security` applies (an explicit empty array at
    /// the operation level opts out).
    fn from_document(doc: &serde_json::Value) -> Self {
        let globally_secured = doc
            .get("security")
            .and_then(|s| s.as_array())
            .is_some_and(|a| !a.is_empty());

        let mut secured = Vec::new();
        let Some(paths) = doc.get("paths").and_then(|p| p.as_object()) else {
            return Self { secured };
        };

        for (path, operations) in paths {
            let Some(operations) = operations.as_object() else {
                continue;
            };
            for method in HTTP_METHODS {
                let Some(op) = operations.get(*method) else {
                    continue;
                };
                let requires_auth = match op.get("security").and_then(|s| s.as_array()) {
                    Some(op_security) => !op_security.is_empty(),
                    None => globally_secured,
                };
                if !requires_auth {
                    continue;
                }
                match registration_pattern(method, path) {
                    Ok(pattern) => secured.push(SecuredRoute {
                        method: method.to_uppercase(),
                        path: path.clone(),
                        pattern,
                    }),
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "cannot build route matcher, skipping");
                    }
                }
            }
        }

        Self { secured }
    }
}

/// Compile a matcher for route-registration calls like
/// `router.get('/users/:id', ...)`. Spec path parameters (`{id}`) become
/// wildcard segments so both `:id` and literal ids match.
fn registration_pattern(method: &str, path: &str) -> Result<Regex, regex::Error> {
    let mut body = String::new();
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            body.push('/');
        }
        if segment.starts_with('{') && segment.ends_with('}') {
            body.push_str(r#"[^/'"`]+"#);
        } else {
            body.push_str(&regex::escape(segment));
        }
    }
    Regex::new(&format!(
        r#"(?:router|app|server|api)\s*\.\s*{method}\s*\(\s*['"`]{body}['"`]"#
    ))
}

pub struct SpecLens;

impl Lens for SpecLens {
    fn kind(&self) -> LensKind {
        LensKind::Spec
    }

    fn inspect(&self, ctx: &FileContext<'_>) -> Vec<Finding> {
        let Some(spec) = ctx.api_spec else {
            return Vec::new();
        };

        let has_auth_middleware = AUTH_MIDDLEWARE.iter().any(|id| ctx.content.contains(id));

        let mut findings = Vec::new();
        for route in &spec.secured {
            let Some(m) = route.pattern.find(ctx.content) else {
                continue;
            };
            if has_auth_middleware {
                continue;
            }
            let line = ctx.content[..m.start()].matches('\n').count() + 1;
            let mut metadata = BTreeMap::new();
            metadata.insert("method".into(), route.method.clone());
            metadata.insert("path".into(), route.path.clone());
            findings.push(Finding {
                kind: IssueKind::AuthBypass,
                severity: Severity::Critical,
                message: format!(
                    "{} {} requires authentication per the API specification but is registered without authentication middleware",
                    route.method, route.path
                ),
                line: Some(line),
                column: None,
                fix: Some("Attach the authentication middleware to this route handler.".into()),
                snippet: ctx.content.lines().nth(line - 1).map(|l| l.trim().to_string()),
                metadata,
            });
        }
        findings
    }
}

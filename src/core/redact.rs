use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/* =============================== Config ==================================== */

/// A literal string and what replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExactReplacement {
    pub find: String,
    pub replace: String,
}

/// A user-supplied pattern rule. `category` drives the placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternSpec {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RedactionConfig {
    #[serde(default)]
    pub exact: Vec<ExactReplacement>,
    #[serde(default)]
    pub custom: Vec<PatternSpec>,
    /// Names of built-in rules to skip.
    #[serde(default)]
    pub disabled: Vec<String>,
}

/* =============================== Rules ===================================== */

#[derive(Debug, Clone)]
pub struct RedactionRule {
    pub name: String,
    pub category: String,
    pub pattern: Regex,
}

/// Built-in rules as (name, category, pattern). Order matters: the more
/// specific credential shapes run before the broad ones.
const BUILTIN_RULES: &[(&str, &str, &str)] = &[
    (
        "private_key",
        "PRIVATE_KEY",
        r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]*?-----END [A-Z ]*PRIVATE KEY-----",
    ),
    (
        "database_url",
        "DATABASE_CREDENTIALS",
        r"\b[a-zA-Z][a-zA-Z0-9+.-]*://[^\s:/@]+:[^\s@/]+@[^\s/]+",
    ),
    ("jwt", "JWT_TOKEN", r"\beyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}"),
    ("aws_access_key", "AWS_ACCESS_KEY", r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b"),
    ("github_token", "GITHUB_TOKEN", r"\bgh[pousr]_[A-Za-z0-9]{36,}\b"),
    ("slack_token", "SLACK_TOKEN", r"\bxox[abprs]-[A-Za-z0-9-]{10,}"),
    ("bearer_token", "BEARER_TOKEN", r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{16,}=*"),
    (
        "password_assignment",
        "PASSWORD",
        r#"(?i)\b(?:password|passwd|pwd)\s*[:=]\s*["']?[^\s"']{4,}["']?"#,
    ),
    (
        "secret_assignment",
        "API_KEY",
        r#"(?i)\b(?:api[_-]?key|secret|access[_-]?token|auth[_-]?token|client[_-]?secret)\s*[:=]\s*["']?[A-Za-z0-9_\-./+=]{8,}["']?"#,
    ),
    (
        "uuid",
        "UUID",
        r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\b",
    ),
    ("email", "EMAIL", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
    (
        "ipv4",
        "IP_ADDRESS",
        r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
    ),
];

#[must_use]
pub fn builtin_rule_names() -> Vec<&'static str> {
    BUILTIN_RULES.iter().map(|(name, _, _)| *name).collect()
}

/// Placeholder text for a rule category.
#[must_use]
pub fn placeholder_for_category(category: &str) -> String {
    if category == "UUID" {
        return "[UUID]".to_string();
    }
    if category.contains("KEY") || category.contains("TOKEN") {
        return "[SECRET]".to_string();
    }
    if category.contains("PASSWORD") || category == "DATABASE_CREDENTIALS" {
        return "[PASSWORD]".to_string();
    }
    if category.contains("CREDENTIAL") {
        return "[CREDENTIAL]".to_string();
    }
    format!("[{category}]")
}

/* ============================== Redactor =================================== */

/// Best-effort secret/PII scrubber.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    exact: Vec<ExactReplacement>,
    rules: Vec<RedactionRule>,
}

impl Redactor {
    /// Built-in rules plus whatever `config` adds or disables. Custom
    /// patterns that fail to compile are skipped.
    #[must_use]
    pub fn from_config(config: &RedactionConfig) -> Self {
        let mut rules = Vec::new();

        for (name, category, pattern) in BUILTIN_RULES {
            if config.disabled.iter().any(|d| d == name) {
                continue;
            }
            match Regex::new(pattern) {
                Ok(re) => rules.push(RedactionRule {
                    name: (*name).to_string(),
                    category: (*category).to_string(),
                    pattern: re,
                }),
                Err(e) => warn!(rule = name, error = %e, "built-in redaction rule failed to compile"),
            }
        }

        for spec in &config.custom {
            match Regex::new(&spec.pattern) {
                Ok(re) => rules.push(RedactionRule {
                    name: spec.name.clone(),
                    category: spec
                        .category
                        .clone()
                        .unwrap_or_else(|| spec.name.to_uppercase()),
                    pattern: re,
                }),
                Err(e) => {
                    warn!(rule = %spec.name, error = %e, "skipping invalid redaction pattern");
                }
            }
        }

        Self {
            exact: config
                .exact
                .iter()
                .filter(|r| !r.find.trim().is_empty())
                .cloned()
                .collect(),
            rules,
        }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::from_config(&RedactionConfig::default())
    }

    #[must_use]
    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Exact replacements first, then every rule in order.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for r in &self.exact {
            if out.contains(&r.find) {
                out = out.replace(&r.find, &r.replace);
            }
        }
        for rule in &self.rules {
            let placeholder = placeholder_for_category(&rule.category);
            if rule.pattern.is_match(&out) {
                out = rule
                    .pattern
                    .replace_all(&out, regex::NoExpand(&placeholder))
                    .into_owned();
            }
        }
        out
    }
}

//! Declarative gate configuration.
//!
//! [`GateConfig`] is the document form of an access gate: a default action,
//! an ordered rule list and an optional population strategy name. It loads
//! from TOML or JSON and compiles into normalized [`Rule`]s.
//!
//! ```toml
//! defaultAction = "DROP"
//! populationStrategy = "proxied"
//!
//! [[rules]]
//! name = "admin-area"
//! paths = ["/admin/*", { regex = "^/internal/" }]
//! methods = ["GET", "POST"]
//! roles = ["admin"]
//! secure = true
//! action = "ACCEPT"
//! ```

use std::path::Path;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::ConfigError;
use crate::pattern::Pattern;
use crate::rule::Rule;

/// Top-level gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    /// Action applied when no rule matches
    #[serde(default)]
    pub default_action: Action,
    /// Ordered rule list; the first satisfied rule wins
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Named population strategy (`direct` or `proxied`)
    #[serde(default)]
    pub population_strategy: Option<String>,
}

/// One rule as written in a configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// Label used for logging and handler attachment
    #[serde(default)]
    pub name: Option<String>,
    /// Path patterns (required, non-empty)
    #[serde(default)]
    pub paths: Vec<PatternSpec>,
    /// Method patterns, `*` when absent, never matching when empty
    #[serde(default)]
    pub methods: Option<Vec<PatternSpec>>,
    /// `Origin` patterns, `*` when absent, never matching when empty
    #[serde(default)]
    pub origin: Option<Vec<PatternSpec>>,
    /// Source address patterns, `*` when absent, never matching when empty
    #[serde(default)]
    pub ip_addresses: Option<Vec<PatternSpec>>,
    /// Email/phone patterns, unchecked when absent
    #[serde(default)]
    pub users: Option<Vec<PatternSpec>>,
    /// Role patterns, unchecked when absent
    #[serde(default)]
    pub roles: Option<Vec<PatternSpec>>,
    /// TLS requirement; only a literal `true` demands TLS
    #[serde(default, deserialize_with = "strict_true")]
    pub secure: Option<bool>,
    /// Action taken when the rule applies
    #[serde(default)]
    pub action: Action,
}

/// A pattern as written in a configuration document.
///
/// A bare string is a wildcard; a table with a `regex` key is a regular
/// expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    /// Wildcard text
    Wildcard(String),
    /// Regular expression source
    Regex {
        /// Expression source
        regex: String,
    },
}

impl PatternSpec {
    /// Compiles the pattern.
    pub fn compile(&self) -> Result<Pattern, ConfigError> {
        match self {
            PatternSpec::Wildcard(text) => {
                Pattern::try_wildcard(text.as_str()).map_err(|e| invalid(text, e))
            }
            PatternSpec::Regex { regex } => Pattern::regex(regex).map_err(|e| invalid(regex, e)),
        }
    }
}

impl From<&str> for PatternSpec {
    fn from(text: &str) -> Self {
        PatternSpec::Wildcard(text.to_string())
    }
}

impl RuleSpec {
    /// Compiles this entry into a normalized rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPaths`] or [`ConfigError::InvalidPattern`].
    pub fn compile<R>(&self) -> Result<Rule<R>, ConfigError> {
        let mut rule = Rule::new(compile_all(&self.paths)?, self.action)?;

        if let Some(name) = &self.name {
            rule = rule.named(name.clone());
        }
        if let Some(methods) = &self.methods {
            rule = rule.with_methods(compile_all(methods)?);
        }
        if let Some(origin) = &self.origin {
            rule = rule.with_origin(compile_all(origin)?);
        }
        if let Some(ips) = &self.ip_addresses {
            rule = rule.with_ip_addresses(compile_all(ips)?);
        }
        if let Some(users) = &self.users {
            rule = rule.with_users(compile_all(users)?);
        }
        if let Some(roles) = &self.roles {
            rule = rule.with_roles(compile_all(roles)?);
        }
        if let Some(secure) = self.secure {
            rule = rule.with_secure(secure);
        }

        Ok(rule)
    }
}

impl GateConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Reads a configuration file; `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Checks every rule and reports all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile_rules::<()>().map(|_| ())
    }

    /// Compiles all rules in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every failing rule.
    pub fn compile_rules<R>(&self) -> Result<Vec<Rule<R>>, ConfigError> {
        let mut rules = Vec::with_capacity(self.rules.len());
        let mut reasons = Vec::new();

        for (index, spec) in self.rules.iter().enumerate() {
            match spec.compile() {
                Ok(rule) => rules.push(rule),
                Err(e) => reasons.push(match &spec.name {
                    Some(name) => format!("rule {index} ({name}): {e}"),
                    None => format!("rule {index}: {e}"),
                }),
            }
        }

        if reasons.is_empty() {
            Ok(rules)
        } else {
            Err(ConfigError::Invalid { reasons })
        }
    }
}

fn invalid(pattern: &str, err: regex::Error) -> ConfigError {
    ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    }
}

fn compile_all(specs: &[PatternSpec]) -> Result<Vec<Pattern>, ConfigError> {
    specs.iter().map(PatternSpec::compile).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SecureFlag {
    Bool(bool),
    Other(de::IgnoredAny),
}

/// Absent stays `None`; `true` requires TLS; any other value forbids it.
fn strict_true<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<SecureFlag>::deserialize(deserializer)?;
    Ok(flag.map(|f| matches!(f, SecureFlag::Bool(true))))
}

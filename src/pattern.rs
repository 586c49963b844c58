//! Single-value pattern matching.
//!
//! A [`Pattern`] is either a wildcard string or a compiled regular
//! expression. Wildcards support `*` only (zero or more characters) and are
//! anchored at both ends; regular expressions use search semantics.

use std::fmt;

use regex::Regex;

/// A configured pattern for one request field.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal text where `*` matches any run of characters.
    Wildcard(Wildcard),
    /// Regular expression matched anywhere in the candidate.
    Regex(Regex),
}

/// Wildcard text and its anchored translation.
///
/// Every character other than `*` is literal. The text is compiled once,
/// when the pattern is created.
#[derive(Debug, Clone)]
pub struct Wildcard {
    text: String,
    compiled: Option<Regex>,
}

impl Wildcard {
    /// Compiles wildcard text.
    ///
    /// # Errors
    ///
    /// Fails only when the translated expression exceeds the regex size limit.
    pub fn new(text: impl Into<String>) -> Result<Self, regex::Error> {
        let text = text.into();
        let compiled = Regex::new(&anchored(&text))?;
        Ok(Self {
            text,
            compiled: Some(compiled),
        })
    }

    /// The wildcard text as written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn is_match(&self, candidate: &str) -> bool {
        self.compiled
            .as_ref()
            .is_some_and(|re| re.is_match(candidate))
    }
}

/// `(?s)^a.*b$` for `a*b`, with every piece escaped.
fn anchored(text: &str) -> String {
    let body: Vec<String> = text.split('*').map(regex::escape).collect();
    format!("(?s)^{}$", body.join(".*"))
}

impl Pattern {
    /// Creates a wildcard pattern.
    ///
    /// Text too large to compile yields a pattern that never matches; use
    /// [`Pattern::try_wildcard`] to surface that as an error.
    pub fn wildcard(text: impl Into<String>) -> Self {
        let text = text.into();
        match Wildcard::new(text.as_str()) {
            Ok(wildcard) => Pattern::Wildcard(wildcard),
            Err(e) => {
                tracing::warn!(error = %e, "wildcard pattern too large, it will never match");
                Pattern::Wildcard(Wildcard {
                    text,
                    compiled: None,
                })
            }
        }
    }

    /// Creates a wildcard pattern, reporting compilation failure.
    pub fn try_wildcard(text: impl Into<String>) -> Result<Self, regex::Error> {
        Wildcard::new(text).map(Pattern::Wildcard)
    }

    /// Compiles a regular expression pattern.
    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern::Regex)
    }

    /// The catch-all pattern `*`.
    pub fn any() -> Self {
        Pattern::wildcard("*")
    }

    /// Returns true for the literal catch-all pattern `*`.
    pub fn is_any(&self) -> bool {
        matches!(self, Pattern::Wildcard(w) if w.as_str() == "*")
    }

    /// Tests a candidate value against this pattern.
    ///
    /// An absent candidate never matches, so optional identity fields
    /// fail cleanly instead of matching `*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use request_acl::Pattern;
    ///
    /// assert!(Pattern::wildcard("/api/*").matches(Some("/api/users")));
    /// assert!(!Pattern::wildcard("/api/*").matches(Some("/admin")));
    /// assert!(Pattern::regex(r"\d+").unwrap().matches(Some("/orders/42")));
    /// assert!(!Pattern::any().matches(None));
    /// ```
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };

        match self {
            Pattern::Wildcard(w) => w.is_match(candidate),
            Pattern::Regex(re) => re.is_match(candidate),
        }
    }

    /// Upper-cases wildcard text; regular expressions are returned as-is.
    pub(crate) fn to_uppercase(&self) -> Self {
        match self {
            Pattern::Wildcard(w) => Pattern::wildcard(w.as_str().to_uppercase()),
            Pattern::Regex(re) => Pattern::Regex(re.clone()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard(w) => f.write_str(w.as_str()),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::wildcard(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Pattern::wildcard(text)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

/// Returns true if any pattern in the set matches the candidate.
pub(crate) fn any_matches(patterns: &[Pattern], candidate: Option<&str>) -> bool {
    patterns.iter().any(|p| p.matches(candidate))
}

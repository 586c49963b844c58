use std::fmt;

use serde::{Deserialize, Serialize};

/// What a rule (or the default) does with a request it applies to.
///
/// Parsed case-insensitively; any text other than `ACCEPT` means `DROP`.
/// Surrounding whitespace is not stripped, so `" accept "` is `DROP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Action {
    /// Let the request through.
    Accept,
    /// Reject the request as forbidden.
    #[default]
    Drop,
}

impl Action {
    /// Parses an action name, falling back to [`Action::Drop`].
    ///
    /// # Examples
    ///
    /// ```
    /// use request_acl::Action;
    ///
    /// assert_eq!(Action::parse("accept"), Action::Accept);
    /// assert_eq!(Action::parse("DROP"), Action::Drop);
    /// assert_eq!(Action::parse("reject"), Action::Drop);
    /// assert_eq!(Action::parse(" accept "), Action::Drop);
    /// ```
    pub fn parse(text: &str) -> Self {
        if text.eq_ignore_ascii_case("ACCEPT") {
            Action::Accept
        } else {
            Action::Drop
        }
    }
}

impl From<&str> for Action {
    fn from(text: &str) -> Self {
        Action::parse(text)
    }
}

impl From<String> for Action {
    fn from(text: String) -> Self {
        Action::parse(&text)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept => write!(f, "ACCEPT"),
            Action::Drop => write!(f, "DROP"),
        }
    }
}

/// Terminal outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the request.
    Accept,
    /// Reject with a forbidden signal.
    Drop,
}

impl Decision {
    /// Returns true for [`Decision::Accept`].
    pub fn is_accept(self) -> bool {
        self == Decision::Accept
    }
}

impl From<Action> for Decision {
    fn from(action: Action) -> Self {
        match action {
            Action::Accept => Decision::Accept,
            Action::Drop => Decision::Drop,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => write!(f, "ACCEPT"),
            Decision::Drop => write!(f, "DROP"),
        }
    }
}

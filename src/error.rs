use http::StatusCode;

/// Boxed failure raised by an identity resolver or a rule handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`AccessGate::check`](crate::AccessGate::check).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The decision was DROP, either from a matched rule or the default action.
    #[error("Forbidden")]
    Forbidden,
    /// The gate could not be constructed from its configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// A resolver or handler failed; the original error is carried unchanged.
    #[error("{0}")]
    Upstream(BoxError),
}

impl Error {
    /// HTTP status conventionally associated with this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Configuration(_) | Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true when this error is the DROP outcome.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Forbidden)
    }

    /// Recovers the resolver or handler error, if this is an upstream failure.
    pub fn into_upstream(self) -> Option<BoxError> {
        match self {
            Error::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

/// Problems detected while building an [`AccessGate`](crate::AccessGate).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The named population strategy does not exist.
    #[error("population strategy `{0}` is not supported")]
    UnknownStrategy(String),

    /// A rule was declared without any path pattern.
    #[error("rule has no paths")]
    EmptyPaths,

    /// A regular expression pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Source text of the rejected pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A handler was attached to a rule name that no rule carries.
    #[error("no rule named `{0}`")]
    UnknownRule(String),

    /// The configuration document could not be read.
    #[error("failed to read config {path}: {reason}")]
    Io {
        /// Path that was requested.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse config: {reason}")]
    Parse {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// One or more rules failed validation.
    #[error("config validation failed: {reasons:?}")]
    Invalid {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::action::Action;
use crate::error::{BoxError, ConfigError};
use crate::pattern::{any_matches, Pattern};
use crate::request::EvaluationContext;

/// Asynchronous predicate consulted after every other clause of a rule holds.
///
/// `Ok(false)` makes the rule not apply; `Err` aborts the evaluation.
pub type Handler<R> =
    Arc<dyn for<'a> Fn(&'a R) -> BoxFuture<'a, Result<bool, BoxError>> + Send + Sync>;

/// Wraps a closure as a [`Handler`].
///
/// # Examples
///
/// ```
/// use futures::{future, FutureExt};
/// use request_acl::{handler, Handler};
///
/// let only_get: Handler<http::Request<()>> =
///     handler(|req: &http::Request<()>| {
///         let get = req.method() == http::Method::GET;
///         future::ready(Ok(get)).boxed()
///     });
/// ```
pub fn handler<R, F>(f: F) -> Handler<R>
where
    F: for<'a> Fn(&'a R) -> BoxFuture<'a, Result<bool, BoxError>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A clause of a rule's conjunction, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// Request method
    Method,
    /// `Origin` header
    Origin,
    /// Source address
    IpAddress,
    /// Email or phone
    Users,
    /// Role set
    Roles,
    /// TLS requirement
    Secure,
    /// Custom handler
    Handler,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Clause::Method => "method",
            Clause::Origin => "origin",
            Clause::IpAddress => "ip_address",
            Clause::Users => "users",
            Clause::Roles => "roles",
            Clause::Secure => "secure",
            Clause::Handler => "handler",
        };
        f.write_str(name)
    }
}

/// A normalized access rule.
///
/// Fields that were not configured default to `*`, except `users`, `roles`
/// and `secure`, which are only checked when set. A rule is never modified
/// once it is part of a gate.
///
/// # Examples
///
/// ```
/// use request_acl::{Action, Rule};
///
/// let rule: Rule<http::Request<()>> = Rule::new(["/admin/*"], Action::Accept)
///     .unwrap()
///     .with_methods(["get", "HEAD"])
///     .with_roles(["admin"])
///     .with_secure(true);
///
/// assert_eq!(rule.action(), Action::Accept);
/// assert_eq!(rule.secure(), Some(true));
/// ```
pub struct Rule<R> {
    name: Option<String>,
    paths: Vec<Pattern>,
    methods: Vec<Pattern>,
    origin: Vec<Pattern>,
    ip_addresses: Vec<Pattern>,
    users: Option<Vec<Pattern>>,
    roles: Option<Vec<Pattern>>,
    secure: Option<bool>,
    action: Action,
    handler: Option<Handler<R>>,
}

impl<R> Rule<R> {
    /// Creates a rule covering the given paths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPaths`] when `paths` is empty.
    pub fn new<I, P>(paths: I, action: Action) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        let paths: Vec<Pattern> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(ConfigError::EmptyPaths);
        }

        Ok(Self {
            name: None,
            paths,
            methods: vec![Pattern::any()],
            origin: vec![Pattern::any()],
            ip_addresses: vec![Pattern::any()],
            users: None,
            roles: None,
            secure: None,
            action,
            handler: None,
        })
    }

    /// Labels the rule for logging and handler attachment.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the rule to these methods. Wildcard text is upper-cased.
    ///
    /// An empty list matches no request.
    pub fn with_methods<I, P>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.methods = methods
            .into_iter()
            .map(|p| Into::<Pattern>::into(p).to_uppercase())
            .collect();
        self
    }

    /// Restricts the rule to these `Origin` values; an empty list matches
    /// no request.
    pub fn with_origin<I, P>(mut self, origin: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.origin = origin.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the rule to these source addresses; an empty list matches
    /// no request.
    pub fn with_ip_addresses<I, P>(mut self, ip_addresses: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.ip_addresses = ip_addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Requires the identity's email or phone to match one of these.
    pub fn with_users<I, P>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.users = Some(users.into_iter().map(Into::into).collect());
        self
    }

    /// Requires the identity's roles to satisfy these patterns.
    pub fn with_roles<I, P>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Requires the request's TLS status to equal `secure`.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Adds an asynchronous predicate as the final clause.
    pub fn with_handler(mut self, handler: Handler<R>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// The rule's label, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The action taken when the rule applies.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The TLS requirement, if any.
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    /// The path patterns gating this rule.
    pub fn paths(&self) -> &[Pattern] {
        &self.paths
    }

    pub(crate) fn handler(&self) -> Option<&Handler<R>> {
        self.handler.as_ref()
    }

    pub(crate) fn set_handler(&mut self, handler: Handler<R>) {
        self.handler = Some(handler);
    }

    /// Whether any path pattern matches the request path.
    pub(crate) fn covers_path(&self, path: &str) -> bool {
        any_matches(&self.paths, Some(path))
    }

    /// Checks every synchronous clause, returning the first one that fails.
    pub(crate) fn first_failed_clause(&self, ctx: &EvaluationContext) -> Option<Clause> {
        if !any_matches(&self.methods, Some(&ctx.method)) {
            return Some(Clause::Method);
        }
        if !any_matches(&self.origin, Some(&ctx.origin)) {
            return Some(Clause::Origin);
        }
        if !any_matches(&self.ip_addresses, Some(&ctx.ip_address)) {
            return Some(Clause::IpAddress);
        }
        if let Some(users) = &self.users {
            if !any_matches(users, ctx.email.as_deref())
                && !any_matches(users, ctx.phone.as_deref())
            {
                return Some(Clause::Users);
            }
        }
        if let Some(roles) = &self.roles {
            if !roles_check(&ctx.roles, roles) {
                return Some(Clause::Roles);
            }
        }
        if let Some(secure) = self.secure {
            if secure != ctx.secure {
                return Some(Clause::Secure);
            }
        }
        None
    }
}

impl<R> fmt::Debug for Rule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("origin", &self.origin)
            .field("ip_addresses", &self.ip_addresses)
            .field("users", &self.users)
            .field("roles", &self.roles)
            .field("secure", &self.secure)
            .field("action", &self.action)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Role-set check.
///
/// A roleless identity passes only a rule listing `*`. Otherwise some
/// pattern must match some role.
pub(crate) fn roles_check(user_roles: &[String], patterns: &[Pattern]) -> bool {
    if user_roles.is_empty() {
        return patterns.iter().any(Pattern::is_any);
    }

    patterns
        .iter()
        .any(|p| user_roles.iter().any(|role| p.matches(Some(role))))
}

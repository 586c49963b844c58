use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::action::{Action, Decision};
use crate::config::GateConfig;
use crate::error::{BoxError, ConfigError, Error};
use crate::evaluator::evaluate;
use crate::logging;
use crate::request::EvaluationContext;
use crate::rule::{Handler, Rule};
use crate::web::{self, HostRequest, PopulationStrategy, Proxied};

/// Asynchronous lookup of one identity field from the native request.
pub type Resolver<R, T> =
    Arc<dyn for<'a> Fn(&'a R) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync>;

/// The three identity lookups awaited once per request.
///
/// Each defaults to reading the request's [`User`](crate::User) and yields
/// `None` (or no roles) when the request is anonymous.
pub struct IdentityResolvers<R> {
    email: Resolver<R, Option<String>>,
    phone: Resolver<R, Option<String>>,
    roles: Resolver<R, Vec<String>>,
}

impl<R: HostRequest + 'static> Default for IdentityResolvers<R> {
    fn default() -> Self {
        Self {
            email: Arc::new(user_email::<R>),
            phone: Arc::new(user_phone::<R>),
            roles: Arc::new(user_roles::<R>),
        }
    }
}

impl<R> Clone for IdentityResolvers<R> {
    fn clone(&self) -> Self {
        Self {
            email: Arc::clone(&self.email),
            phone: Arc::clone(&self.phone),
            roles: Arc::clone(&self.roles),
        }
    }
}

fn user_email<R: HostRequest>(req: &R) -> BoxFuture<'_, Result<Option<String>, BoxError>> {
    let email = req.user().and_then(|u| u.email.clone());
    future::ready(Ok(email)).boxed()
}

fn user_phone<R: HostRequest>(req: &R) -> BoxFuture<'_, Result<Option<String>, BoxError>> {
    let phone = req.user().and_then(|u| u.phone.clone());
    future::ready(Ok(phone)).boxed()
}

fn user_roles<R: HostRequest>(req: &R) -> BoxFuture<'_, Result<Vec<String>, BoxError>> {
    let roles = req.user().map(|u| u.roles.clone()).unwrap_or_default();
    future::ready(Ok(roles)).boxed()
}

/// An immutable access-control gate.
///
/// Holds the ordered rule list, the default action, the population strategy
/// and the identity resolvers. Cloning is cheap and clones share the same
/// rules, so one gate can serve any number of concurrent requests.
///
/// # Examples
///
/// ```
/// use request_acl::{AccessGate, GateConfig};
///
/// let config = GateConfig::from_toml_str(r#"
///     defaultAction = "DROP"
///
///     [[rules]]
///     paths = ["/test"]
///     methods = ["GET"]
///     action = "ACCEPT"
/// "#).unwrap();
///
/// let gate = AccessGate::<http::Request<()>>::from_config(config).unwrap();
///
/// let get = http::Request::get("/test").body(()).unwrap();
/// let post = http::Request::post("/test").body(()).unwrap();
///
/// futures::executor::block_on(async {
///     assert!(gate.check(&get).await.is_ok());
///     assert!(gate.check(&post).await.unwrap_err().is_forbidden());
/// });
/// ```
pub struct AccessGate<R> {
    rules: Arc<[Rule<R>]>,
    default_action: Action,
    strategy: Arc<dyn PopulationStrategy<R>>,
    resolvers: IdentityResolvers<R>,
}

impl<R: HostRequest + 'static> AccessGate<R> {
    /// Starts building a gate with the default strategy and resolvers.
    pub fn builder() -> AccessGateBuilder<R> {
        AccessGateBuilder::new()
    }

    /// Builds a gate straight from a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown strategy name or
    /// invalid rules.
    pub fn from_config(config: GateConfig) -> Result<Self, Error> {
        Self::builder().config(config).build()
    }
}

impl<R> AccessGate<R> {
    /// Extracts the evaluation fields for one request.
    ///
    /// Resolvers are awaited in order: email, phone, roles.
    pub async fn context(&self, req: &R) -> Result<EvaluationContext, Error> {
        let strategy = &self.strategy;
        let method = strategy.method(req).to_uppercase();
        let path = strategy.path(req);
        let secure = strategy.is_secure(req);
        let origin = strategy.origin(req);
        let ip_address = strategy.ip_address(req);

        let email = (self.resolvers.email)(req)
            .await
            .map_err(|e| upstream("email", e))?;
        let phone = (self.resolvers.phone)(req)
            .await
            .map_err(|e| upstream("phone", e))?;
        let roles = (self.resolvers.roles)(req)
            .await
            .map_err(|e| upstream("roles", e))?;

        Ok(EvaluationContext {
            method,
            path,
            secure,
            origin,
            ip_address,
            email,
            phone,
            roles,
        })
    }

    /// Evaluates the request and returns the raw decision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if a resolver or handler fails.
    pub async fn decide(&self, req: &R) -> Result<Decision, Error> {
        let ctx = self.context(req).await?;
        evaluate(req, &ctx, &self.rules, self.default_action)
            .await
            .map_err(Error::Upstream)
    }

    /// Evaluates the request: `Ok(())` to proceed, [`Error::Forbidden`] to
    /// reject, [`Error::Upstream`] when a resolver or handler failed.
    pub async fn check(&self, req: &R) -> Result<(), Error> {
        match self.decide(req).await? {
            Decision::Accept => Ok(()),
            Decision::Drop => Err(Error::Forbidden),
        }
    }

    /// The configured rules, in evaluation order.
    pub fn rules(&self) -> &[Rule<R>] {
        &self.rules
    }

    /// The action applied when no rule matches.
    pub fn default_action(&self) -> Action {
        self.default_action
    }
}

impl<R> Clone for AccessGate<R> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            default_action: self.default_action,
            strategy: Arc::clone(&self.strategy),
            resolvers: self.resolvers.clone(),
        }
    }
}

impl<R> fmt::Debug for AccessGate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("rules", &self.rules)
            .field("default_action", &self.default_action)
            .finish_non_exhaustive()
    }
}

fn upstream(field: &'static str, err: BoxError) -> Error {
    logging::resolver_failed(field, &err);
    Error::Upstream(err)
}

/// Builder for [`AccessGate`].
///
/// Rules from a [`GateConfig`] come first, in document order, followed by
/// rules added with [`rule`](Self::rule) in call order. An explicitly set
/// strategy object takes precedence over a configured strategy name.
pub struct AccessGateBuilder<R> {
    config: GateConfig,
    default_action: Option<Action>,
    rules: Vec<Rule<R>>,
    strategy: Option<Arc<dyn PopulationStrategy<R>>>,
    resolvers: IdentityResolvers<R>,
    handlers: Vec<(String, Handler<R>)>,
}

impl<R: HostRequest + 'static> AccessGateBuilder<R> {
    /// Creates a builder with no rules and a DROP default.
    pub fn new() -> Self {
        Self {
            config: GateConfig::default(),
            default_action: None,
            rules: Vec::new(),
            strategy: None,
            resolvers: IdentityResolvers::default(),
            handlers: Vec::new(),
        }
    }

    /// Uses a configuration document as the base.
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the default action.
    pub fn default_action(mut self, action: Action) -> Self {
        self.default_action = Some(action);
        self
    }

    /// Appends a rule after those from the configuration.
    pub fn rule(mut self, rule: Rule<R>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Uses a custom population strategy.
    pub fn population_strategy<S>(mut self, strategy: S) -> Self
    where
        S: PopulationStrategy<R> + 'static,
    {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Replaces the email resolver.
    pub fn email_resolver<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a R) -> BoxFuture<'a, Result<Option<String>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.email = Arc::new(f);
        self
    }

    /// Replaces the phone resolver.
    pub fn phone_resolver<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a R) -> BoxFuture<'a, Result<Option<String>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.phone = Arc::new(f);
        self
    }

    /// Replaces the roles resolver.
    pub fn roles_resolver<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a R) -> BoxFuture<'a, Result<Vec<String>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.roles = Arc::new(f);
        self
    }

    /// Attaches a handler to every rule named `name`.
    pub fn handler<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a R) -> BoxFuture<'a, Result<bool, BoxError>> + Send + Sync + 'static,
    {
        self.handlers.push((name.into(), Arc::new(f)));
        self
    }

    /// Validates everything and freezes the gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown strategy name,
    /// invalid rules, or a handler naming no rule.
    pub fn build(self) -> Result<AccessGate<R>, Error> {
        let named = self
            .config
            .population_strategy
            .as_deref()
            .map(web::named::<R>)
            .transpose()?;
        let strategy: Arc<dyn PopulationStrategy<R>> = match (self.strategy, named) {
            (Some(explicit), _) => explicit,
            (None, Some(named)) => named,
            (None, None) => Arc::new(Proxied),
        };

        let mut rules = self.config.compile_rules::<R>()?;
        rules.extend(self.rules);

        for (name, handler) in self.handlers {
            let mut attached = false;
            for rule in rules.iter_mut().filter(|r| r.name() == Some(name.as_str())) {
                rule.set_handler(Arc::clone(&handler));
                attached = true;
            }
            if !attached {
                return Err(ConfigError::UnknownRule(name).into());
            }
        }

        let default_action = self.default_action.unwrap_or(self.config.default_action);
        tracing::debug!(
            rules = rules.len(),
            default_action = %default_action,
            "access gate built"
        );

        Ok(AccessGate {
            rules: rules.into(),
            default_action,
            strategy,
            resolvers: self.resolvers,
        })
    }
}

impl<R: HostRequest + 'static> Default for AccessGateBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

//! Ordered rule-list access control for inbound requests.
//!
//! This crate decides whether a request may proceed by scanning an ordered
//! list of rules:
//! - **Patterns**: wildcard strings (`*` only) or regular expressions
//! - **Rules**: a path gate plus a conjunction over method, origin, source
//!   address, identity (email/phone), roles, TLS and an optional async handler
//! - **First match wins**: the first rule whose whole conjunction holds
//!   decides; otherwise the default action applies
//!
//! # Core Types
//!
//! - [`AccessGate`]: Immutable gate holding rules, strategy and resolvers
//! - [`Rule`]: A normalized rule
//! - [`Pattern`]: Wildcard or regex matcher for one field
//! - [`GateConfig`]: Declarative TOML/JSON configuration
//! - [`evaluate`]: The rule scan itself, over pre-extracted fields
//!
//! # Examples
//!
//! ```
//! use request_acl::{AccessGate, Action, Rule, User};
//!
//! let gate = AccessGate::<http::Request<()>>::builder()
//!     .rule(Rule::new(["/*"], Action::Accept).unwrap().with_roles(["admin"]))
//!     .build()
//!     .expect("valid gate");
//!
//! let mut req = http::Request::get("/dashboard").body(()).unwrap();
//! req.extensions_mut().insert(User {
//!     email: Some("k@gmail.com".to_string()),
//!     phone: None,
//!     roles: vec!["admin".to_string(), "user".to_string()],
//! });
//!
//! futures::executor::block_on(async {
//!     assert!(gate.check(&req).await.is_ok());
//! });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod error;
mod evaluator;
mod gate;
mod logging;
mod pattern;
mod request;
mod rule;

pub mod web;

pub use action::{Action, Decision};
pub use config::{GateConfig, PatternSpec, RuleSpec};
pub use error::{BoxError, ConfigError, Error};
pub use evaluator::evaluate;
pub use gate::{AccessGate, AccessGateBuilder, IdentityResolvers, Resolver};
pub use pattern::{Pattern, Wildcard};
pub use request::{Connection, EvaluationContext, User};
pub use rule::{handler, Clause, Handler, Rule};

//! Web framework integration surface.
//!
//! This module is the boundary between host HTTP frameworks and the rule
//! evaluator. It handles:
//! - Reading a native request through [`HostRequest`]
//! - Turning it into evaluation fields with a [`PopulationStrategy`]
//! - Mapping a failed check to an HTTP response
//!
//! # Integration Model
//!
//! Framework-specific middleware should:
//! 1. Insert a [`Connection`](crate::Connection) extension with the peer
//!    address and TLS status
//! 2. Insert a [`User`](crate::User) extension once the caller is
//!    authenticated
//! 3. Call [`guard`] and return the rejection response on `Err`
//!
//! ```ignore
//! let gate = AccessGate::from_config(GateConfig::load(path)?)?;
//!
//! // per request:
//! if let Err(resp) = guard(&gate, &req).await {
//!     return resp;
//! }
//! next.run(req).await
//! ```

mod extract;
mod middleware;
mod strategy;

pub use extract::HostRequest;
pub use middleware::{guard, reject};
pub use strategy::{named, Direct, PopulationStrategy, Proxied, DEFAULT_STRATEGY};

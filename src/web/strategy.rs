//! Population strategies: turning a native request into evaluation fields.

use std::sync::Arc;

use crate::error::ConfigError;

use super::HostRequest;

/// Extracts the five request fields rules are matched against.
///
/// Implement this for request types or conventions the built-in
/// [`Direct`] and [`Proxied`] strategies do not cover.
///
/// # Examples
///
/// ```
/// use request_acl::web::PopulationStrategy;
///
/// struct Frame {
///     verb: &'static str,
///     route: &'static str,
/// }
///
/// struct FrameStrategy;
///
/// impl PopulationStrategy<Frame> for FrameStrategy {
///     fn method(&self, req: &Frame) -> String { req.verb.to_string() }
///     fn path(&self, req: &Frame) -> String { req.route.to_string() }
///     fn is_secure(&self, _req: &Frame) -> bool { true }
///     fn origin(&self, _req: &Frame) -> String { String::new() }
///     fn ip_address(&self, _req: &Frame) -> String { "127.0.0.1".to_string() }
/// }
///
/// let frame = Frame { verb: "GET", route: "/" };
/// assert_eq!(FrameStrategy.path(&frame), "/");
/// ```
pub trait PopulationStrategy<R: ?Sized>: Send + Sync {
    /// Request method.
    fn method(&self, req: &R) -> String;

    /// Request path.
    fn path(&self, req: &R) -> String;

    /// Whether the request is considered secure.
    fn is_secure(&self, req: &R) -> bool;

    /// `Origin` header value, empty if absent.
    fn origin(&self, req: &R) -> String;

    /// Source address, empty if unknown.
    fn ip_address(&self, req: &R) -> String;
}

/// Reads the connection directly: peer address and connection TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

/// Honors reverse-proxy headers: `X-Forwarded-For` and `X-Forwarded-Proto`.
///
/// The source address is the first `X-Forwarded-For` entry when the header
/// is present, the peer address otherwise. Only that client entry is
/// matched, never the raw comma-separated header value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proxied;

impl<R: HostRequest + ?Sized> PopulationStrategy<R> for Direct {
    fn method(&self, req: &R) -> String {
        req.method_name().to_string()
    }

    fn path(&self, req: &R) -> String {
        req.uri_path().to_string()
    }

    fn is_secure(&self, req: &R) -> bool {
        req.is_tls()
    }

    fn origin(&self, req: &R) -> String {
        origin_header(req)
    }

    fn ip_address(&self, req: &R) -> String {
        peer_ip(req)
    }
}

impl<R: HostRequest + ?Sized> PopulationStrategy<R> for Proxied {
    fn method(&self, req: &R) -> String {
        req.method_name().to_string()
    }

    fn path(&self, req: &R) -> String {
        req.uri_path().to_string()
    }

    fn is_secure(&self, req: &R) -> bool {
        req.is_tls()
            || req
                .header("x-forwarded-proto")
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }

    fn origin(&self, req: &R) -> String {
        origin_header(req)
    }

    fn ip_address(&self, req: &R) -> String {
        req.header("x-forwarded-for")
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| peer_ip(req))
    }
}

/// Name of the strategy used when none is configured.
pub const DEFAULT_STRATEGY: &str = "proxied";

/// Looks up a built-in strategy by name.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownStrategy`] for any name other than
/// `direct` (alias `express`) or `proxied` (alias `restify`).
pub fn named<R>(name: &str) -> Result<Arc<dyn PopulationStrategy<R>>, ConfigError>
where
    R: HostRequest + 'static,
{
    match name {
        "direct" | "express" => Ok(Arc::new(Direct)),
        "proxied" | "restify" => Ok(Arc::new(Proxied)),
        other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
}

fn origin_header<R: HostRequest + ?Sized>(req: &R) -> String {
    req.header("origin").unwrap_or_default().to_string()
}

fn peer_ip<R: HostRequest + ?Sized>(req: &R) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

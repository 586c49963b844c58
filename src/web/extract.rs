//! The native request surface read by the built-in strategies.

use std::net::SocketAddr;

use http::uri::Scheme;

use crate::request::{Connection, User};

/// Read access to a host framework's request.
///
/// The built-in population strategies and the default identity resolvers
/// are written against this trait, so any request type implementing it
/// can be evaluated. An implementation for [`http::Request`] is provided:
/// it reads the peer address and TLS flag from a [`Connection`] extension
/// and the authenticated identity from a [`User`] extension.
///
/// # Examples
///
/// ```
/// use request_acl::web::HostRequest;
/// use request_acl::User;
///
/// struct Probe {
///     path: String,
/// }
///
/// impl HostRequest for Probe {
///     fn method_name(&self) -> &str { "GET" }
///     fn uri_path(&self) -> &str { &self.path }
///     fn header(&self, _name: &str) -> Option<&str> { None }
///     fn peer_addr(&self) -> Option<std::net::SocketAddr> { None }
///     fn is_tls(&self) -> bool { false }
///     fn user(&self) -> Option<&User> { None }
/// }
///
/// let probe = Probe { path: "/healthz".to_string() };
/// assert_eq!(probe.uri_path(), "/healthz");
/// ```
pub trait HostRequest {
    /// Request method as sent by the client.
    fn method_name(&self) -> &str;

    /// Request path, without query string.
    fn uri_path(&self) -> &str;

    /// Header value, if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<&str>;

    /// Remote socket address of the connection.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Whether the connection itself is TLS-encrypted.
    fn is_tls(&self) -> bool;

    /// The authenticated identity, if any.
    fn user(&self) -> Option<&User>;
}

impl<B> HostRequest for http::Request<B> {
    fn method_name(&self) -> &str {
        self.method().as_str()
    }

    fn uri_path(&self) -> &str {
        self.uri().path()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.extensions().get::<Connection>().map(|c| c.peer_addr)
    }

    fn is_tls(&self) -> bool {
        match self.extensions().get::<Connection>() {
            Some(conn) => conn.tls,
            None => self.uri().scheme() == Some(&Scheme::HTTPS),
        }
    }

    fn user(&self) -> Option<&User> {
        self.extensions().get::<User>()
    }
}

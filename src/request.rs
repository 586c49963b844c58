use std::net::SocketAddr;

/// The authenticated identity attached to a request.
///
/// Hosts insert this into the request (for `http::Request`, as an
/// extension) after authentication. The default identity resolvers read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// Email address, if known
    pub email: Option<String>,
    /// Phone number, if known
    pub phone: Option<String>,
    /// Role names granted to the user
    pub roles: Vec<String>,
}

/// Transport facts about the connection a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Remote socket address
    pub peer_addr: SocketAddr,
    /// Whether the connection is TLS-encrypted
    pub tls: bool,
}

/// Normalized request fields for a single evaluation.
///
/// Built once per request from the population strategy and identity
/// resolvers, and dropped when the evaluation ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Request method, upper-cased
    pub method: String,
    /// Request path
    pub path: String,
    /// Whether the request arrived over TLS
    pub secure: bool,
    /// `Origin` header, empty if absent
    pub origin: String,
    /// Source address
    pub ip_address: String,
    /// Resolved email
    pub email: Option<String>,
    /// Resolved phone
    pub phone: Option<String>,
    /// Resolved roles
    pub roles: Vec<String>,
}

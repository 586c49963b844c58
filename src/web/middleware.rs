//! Translating gate outcomes into HTTP responses.
//!
//! A host framework's middleware calls [`guard`] (or [`AccessGate::check`]
//! followed by [`reject`]) and either continues to the next handler or
//! returns the rejection response as-is.

use http::{header, HeaderValue, Response};

use crate::error::Error;
use crate::gate::AccessGate;

/// Builds the response sent for a failed check.
///
/// Forbidden requests get `403` with body `Forbidden`. Configuration and
/// upstream failures get `500` without exposing the underlying message.
///
/// # Examples
///
/// ```
/// use request_acl::web::reject;
/// use request_acl::Error;
///
/// let resp = reject(&Error::Forbidden);
/// assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
/// assert_eq!(resp.body(), "Forbidden");
/// ```
pub fn reject(err: &Error) -> Response<String> {
    let status = err.status();
    let body = match err {
        Error::Forbidden => err.to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string(),
    };

    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

/// Runs the gate and maps any failure to its rejection response.
///
/// `Ok(())` means the request may proceed.
pub async fn guard<R>(gate: &AccessGate<R>, req: &R) -> Result<(), Response<String>> {
    match gate.check(req).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if !err.is_forbidden() {
                tracing::error!(error = %err, "access check failed");
            }
            Err(reject(&err))
        }
    }
}

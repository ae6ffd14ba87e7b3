//! Request ID middleware.
//!
//! Every request gets an id, taken from `x-request-id` when an upstream proxy
//! supplied a sane one, otherwise a fresh UUID v4. The id is recorded on the
//! request span, tagged on the Sentry scope and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id we accept.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Use the upstream id only if it is short and printable.
fn upstream_request_id(request: &Request) -> Option<String> {
    let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let acceptable = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    acceptable.then(|| raw.to_owned())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        upstream_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(id: &str) -> Request {
        Request::builder()
            .header(REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_accepts_sane_upstream_id() {
        assert_eq!(
            upstream_request_id(&request_with("cf-8a7b.123_x")).as_deref(),
            Some("cf-8a7b.123_x")
        );
    }

    #[test]
    fn test_rejects_odd_upstream_ids() {
        assert!(upstream_request_id(&request_with("has space")).is_none());
        assert!(upstream_request_id(&request_with(&"a".repeat(200))).is_none());
        assert!(upstream_request_id(&request_with("")).is_none());

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert!(upstream_request_id(&bare).is_none());
    }
}

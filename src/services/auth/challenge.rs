//! Fallback "401 + negotiate again" response.

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};

/// Build the generic unauthorized challenge.
///
/// - one `WWW-Authenticate` header per advertised protocol, in order
/// - `Connection: close` drops the half-negotiated connection state
pub fn unauthorized(protocols: &[String], close: bool) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;

    let headers = response.headers_mut();
    for protocol in protocols {
        match HeaderValue::from_str(protocol) {
            Ok(value) => {
                headers.append(header::WWW_AUTHENTICATE, value);
            }
            Err(err) => {
                tracing::warn!(protocol = %protocol, error = %err, "skipping invalid protocol name");
            }
        }
    }

    let connection = if close { "close" } else { "keep-alive" };
    headers.insert(header::CONNECTION, HeaderValue::from_static(connection));

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocols() -> Vec<String> {
        vec!["Negotiate".to_string(), "NTLM".to_string()]
    }

    #[test]
    fn advertises_each_protocol() {
        let response = unauthorized(&protocols(), true);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenges: Vec<_> = response
            .headers()
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(challenges, ["Negotiate", "NTLM"]);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }

    #[test]
    fn keep_alive_when_not_closing() {
        let response = unauthorized(&protocols(), false);
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");
    }

    #[test]
    fn invalid_protocol_is_skipped() {
        let response = unauthorized(&["bad\nname".to_string(), "Negotiate".to_string()], true);
        assert_eq!(
            response.headers().get_all(header::WWW_AUTHENTICATE).iter().count(),
            1
        );
    }
}

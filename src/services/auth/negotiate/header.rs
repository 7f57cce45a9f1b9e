//! `Authorization: <package> <base64 token>` parsing.

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

const NTLM_SIGNATURE: &[u8; 8] = b"NTLMSSP\0";
const NTLM_TYPE1: u32 = 1;
// ASN.1 [APPLICATION 0] wrapping the SPNEGO NegTokenInit
const SPNEGO_INIT_TAG: u8 = 0x60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("authorization header is not valid ascii")]
    NotAscii,
    #[error("invalid authorization header: {0}")]
    Malformed(String),
    #[error("invalid authorization token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    value: String,
}

impl AuthorizationHeader {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// `Ok(None)` when the request carries no `Authorization` header.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, HeaderError> {
        let Some(raw) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let value = raw.to_str().map_err(|_| HeaderError::NotAscii)?;
        if value.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(value.trim())))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn security_package(&self) -> Result<&str, HeaderError> {
        self.split().map(|(package, _)| package)
    }

    pub fn token(&self) -> Result<&str, HeaderError> {
        self.split().map(|(_, token)| token)
    }

    pub fn token_bytes(&self) -> Result<Vec<u8>, HeaderError> {
        STANDARD
            .decode(self.token()?)
            .map_err(|e| HeaderError::InvalidToken(e.to_string()))
    }

    pub fn is_negotiate(&self) -> bool {
        self.security_package()
            .is_ok_and(|p| p.eq_ignore_ascii_case("Negotiate"))
    }

    pub fn is_ntlm(&self) -> bool {
        self.security_package()
            .is_ok_and(|p| p.eq_ignore_ascii_case("NTLM"))
    }

    pub fn is_negotiate_or_ntlm(&self) -> bool {
        self.is_negotiate() || self.is_ntlm()
    }

    /// First leg of an NTLM handshake (possibly wrapped in `Negotiate`).
    pub fn is_ntlm_type1_message(&self) -> bool {
        self.token_bytes().is_ok_and(|bytes| ntlm_message_type(&bytes) == Some(NTLM_TYPE1))
    }

    /// SPNEGO `NegTokenInit` sent by a Kerberos-capable client.
    pub fn is_spnego_init_message(&self) -> bool {
        self.token_bytes()
            .is_ok_and(|bytes| bytes.first() == Some(&SPNEGO_INIT_TAG))
    }

    fn split(&self) -> Result<(&str, &str), HeaderError> {
        let (package, token) = self
            .value
            .split_once(' ')
            .ok_or_else(|| HeaderError::Malformed(self.value.clone()))?;
        let token = token.trim();
        if package.is_empty() || token.is_empty() {
            return Err(HeaderError::Malformed(self.value.clone()));
        }
        Ok((package, token))
    }
}

fn ntlm_message_type(bytes: &[u8]) -> Option<u32> {
    let rest = bytes.strip_prefix(NTLM_SIGNATURE.as_slice())?;
    let raw: [u8; 4] = rest.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ntlm_token(message_type: u32) -> String {
        let mut bytes = NTLM_SIGNATURE.to_vec();
        bytes.extend_from_slice(&message_type.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        STANDARD.encode(bytes)
    }

    #[test]
    fn missing_or_blank_header_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(AuthorizationHeader::from_headers(&headers), Ok(None));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("  "));
        assert_eq!(AuthorizationHeader::from_headers(&headers), Ok(None));
    }

    #[test]
    fn splits_package_and_token() {
        let header = AuthorizationHeader::new("Negotiate YIIB");
        assert_eq!(header.security_package(), Ok("Negotiate"));
        assert_eq!(header.token(), Ok("YIIB"));
        assert!(header.is_negotiate());
        assert!(!header.is_ntlm());
        assert!(header.is_negotiate_or_ntlm());
    }

    #[test]
    fn header_without_token_is_malformed() {
        let header = AuthorizationHeader::new("Negotiate");
        assert!(matches!(
            header.security_package(),
            Err(HeaderError::Malformed(_))
        ));
        assert!(!header.is_negotiate_or_ntlm());
    }

    #[test]
    fn basic_is_not_negotiate() {
        let header = AuthorizationHeader::new("Basic dXNlcjpwYXNz");
        assert!(!header.is_negotiate_or_ntlm());
    }

    #[test]
    fn detects_ntlm_type1() {
        assert!(AuthorizationHeader::new(format!("NTLM {}", ntlm_token(1))).is_ntlm_type1_message());
        assert!(
            AuthorizationHeader::new(format!("Negotiate {}", ntlm_token(1)))
                .is_ntlm_type1_message()
        );
        assert!(!AuthorizationHeader::new(format!("NTLM {}", ntlm_token(3))).is_ntlm_type1_message());
    }

    #[test]
    fn detects_spnego_init() {
        let token = STANDARD.encode([0x60, 0x82, 0x01, 0x00]);
        let header = AuthorizationHeader::new(format!("Negotiate {token}"));
        assert!(header.is_spnego_init_message());
        assert!(!header.is_ntlm_type1_message());
    }

    #[test]
    fn undecodable_token_is_reported() {
        let header = AuthorizationHeader::new("Negotiate !!!");
        assert!(matches!(
            header.token_bytes(),
            Err(HeaderError::InvalidToken(_))
        ));
        assert!(!header.is_spnego_init_message());
    }
}

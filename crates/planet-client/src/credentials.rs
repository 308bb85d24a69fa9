//! Per-call credentials derived from the caller's inbound request.

use crate::ClientError;
use std::fmt;

/// API key forwarded to Planet as `Authorization: api-key <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Resolve from the raw inbound `Authorization` header (`Bearer ` prefix stripped).
    ///
    /// The fallback is used only when the caller sent no header at all; a header that is
    /// present but unusable is rejected rather than replaced.
    pub fn resolve(
        authorization: Option<&[u8]>,
        fallback: Option<&str>,
    ) -> Result<Self, ClientError> {
        let Some(raw) = authorization else {
            return fallback
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(Self::new)
                .ok_or(ClientError::MissingCredentials);
        };
        let header = std::str::from_utf8(raw)
            .ok()
            .filter(|h| h.bytes().all(|b| b == b'\t' || (b' '..=b'~').contains(&b)))
            .ok_or(ClientError::InvalidCredentials(
                "authorization header is not visible ASCII",
            ))?
            .trim();
        let token = match header.strip_prefix("Bearer") {
            Some(rest) if rest.is_empty() || rest.starts_with([' ', '\t']) => rest.trim(),
            _ => header,
        };
        if token.is_empty() {
            return Err(ClientError::InvalidCredentials(
                "authorization header carries no token",
            ));
        }
        Ok(Self::new(token))
    }

    pub fn header_value(&self) -> String {
        format!("api-key {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(header: Option<&str>, fallback: Option<&str>) -> Result<Credentials, ClientError> {
        Credentials::resolve(header.map(str::as_bytes), fallback)
    }

    #[test]
    fn bearer_header_wins_over_fallback() {
        let c = resolve(Some("Bearer abc123"), Some("fallback")).unwrap();
        assert_eq!(c.header_value(), "api-key abc123");
    }

    #[test]
    fn raw_header_is_used_verbatim() {
        let c = resolve(Some("plain-key"), None).unwrap();
        assert_eq!(c.header_value(), "api-key plain-key");
        let c = resolve(Some("Bearerish-key"), None).unwrap();
        assert_eq!(c.header_value(), "api-key Bearerish-key");
    }

    #[test]
    fn fallback_only_without_header() {
        let c = resolve(None, Some("env-token")).unwrap();
        assert_eq!(c.header_value(), "api-key env-token");
        for blank in ["", "  ", "Bearer", "Bearer ", "Bearer \t "] {
            assert!(
                matches!(
                    resolve(Some(blank), Some("env-token")),
                    Err(ClientError::InvalidCredentials(_))
                ),
                "{:?}",
                blank
            );
        }
    }

    #[test]
    fn non_ascii_header_is_rejected_not_replaced() {
        let err = Credentials::resolve(Some(&b"Bearer caller-t\xc3\xb6ken"[..]), Some("env-token"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials(_)));
        let err = Credentials::resolve(Some(&b"Bearer \xff\xfe"[..]), Some("env-token")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials(_)));
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        assert!(matches!(
            resolve(None, None),
            Err(ClientError::MissingCredentials)
        ));
        assert!(matches!(
            resolve(None, Some("  ")),
            Err(ClientError::MissingCredentials)
        ));
    }

    #[test]
    fn debug_never_prints_token() {
        let c = Credentials::new("secret");
        assert!(!format!("{:?}", c).contains("secret"));
    }
}

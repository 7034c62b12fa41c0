//! Error types for the authentication gateway.
//!
//! Token-validation failures surface to clients as an [`AuthFailure`] carrying
//! one of the closed set of RFC 6750 error codes. Everything else
//! (key fetching, startup configuration) has its own error enum and is mapped
//! at the pipeline boundary.

use std::fmt;

/// RFC 6750 bearer token error codes.
///
/// This is the full set of codes the gateway ever places in a challenge's
/// `error` parameter. All signature, issuer, audience, expiry, key-resolution,
/// and token-type failures collapse into [`InvalidToken`](ErrorCode::InvalidToken);
/// richer detail goes only into the `error_description`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request is missing the `Authorization` header or uses a malformed scheme.
    InvalidRequest,
    /// The token failed verification for any reason.
    InvalidToken,
    /// The token verified but does not carry every required scope.
    InsufficientScope,
}

impl ErrorCode {
    /// The wire form used in the `WWW-Authenticate` header.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::InsufficientScope => "insufficient_scope",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal verification failure for one request.
///
/// Produced at most once per failed verification; consumed by the challenge
/// builder and the middleware's 401 response. Never carries key material or
/// internal URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// The client-visible error code.
    pub code: ErrorCode,
    /// Optional human-readable detail, echoed in `error_description`.
    pub description: Option<String>,
    /// Scopes to advertise in the challenge's `scope` parameter.
    ///
    /// Set only for [`ErrorCode::InsufficientScope`]; carries the full
    /// required list rather than the unmet subset.
    pub required_scopes: Option<Vec<String>>,
}

impl AuthFailure {
    /// Missing or malformed `Authorization` header.
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidRequest,
            description: Some(description.into()),
            required_scopes: None,
        }
    }

    /// Any token verification failure.
    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidToken,
            description: Some(description.into()),
            required_scopes: None,
        }
    }

    /// Valid token without every required scope.
    pub fn insufficient_scope(required: Vec<String>) -> Self {
        Self {
            code: ErrorCode::InsufficientScope,
            description: Some("Insufficient scopes".to_string()),
            required_scopes: Some(required),
        }
    }

    /// The HTTP status for this failure.
    ///
    /// Always 401. The gateway deliberately does not differentiate status
    /// codes by failure kind; `insufficient_scope` is 401 as well.
    pub fn status_code(&self) -> u16 {
        401
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "{}: {}", self.code, desc),
            None => f.write_str(self.code.as_str()),
        }
    }
}

impl std::error::Error for AuthFailure {}

/// Failure to obtain a signing key from the provider's JWKS endpoint.
///
/// All variants are request-scoped; the verifier maps them to
/// [`ErrorCode::InvalidToken`].
#[derive(Debug, thiserror::Error)]
pub enum KeyFetchError {
    #[error("JWKS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    #[error("unusable key material for kid {kid}: {source}")]
    BadKey {
        kid: String,
        source: jsonwebtoken::errors::Error,
    },

    #[error("no key found for kid {0}")]
    UnknownKeyId(String),
}

/// Startup-time configuration error. Fatal; never request-scoped.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment configuration - set exactly one of KEYCLOAK=true or COGNITO=true")]
    ProviderSelection,

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_form() {
        assert_eq!(ErrorCode::InvalidRequest.as_str(), "invalid_request");
        assert_eq!(ErrorCode::InvalidToken.as_str(), "invalid_token");
        assert_eq!(ErrorCode::InsufficientScope.as_str(), "insufficient_scope");
    }

    #[test]
    fn test_status_code_is_uniform() {
        assert_eq!(AuthFailure::invalid_request("x").status_code(), 401);
        assert_eq!(AuthFailure::invalid_token("x").status_code(), 401);
        assert_eq!(
            AuthFailure::insufficient_scope(vec!["openid".into()]).status_code(),
            401
        );
    }

    #[test]
    fn test_insufficient_scope_carries_required_list() {
        let failure = AuthFailure::insufficient_scope(vec!["a".into(), "b".into()]);
        assert_eq!(failure.code, ErrorCode::InsufficientScope);
        assert_eq!(
            failure.required_scopes.as_deref(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn test_display() {
        let failure = AuthFailure::invalid_token("bad signature");
        assert_eq!(failure.to_string(), "invalid_token: bad signature");
    }
}

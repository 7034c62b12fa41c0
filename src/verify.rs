//! The token-verification pipeline.
//!
//! [`TokenVerifier`] orchestrates one verification per request: parse the
//! `Authorization` header, read the `kid` from the token header, resolve the
//! signing key, hand signature and claim checks to the active
//! [`ProviderAdapter`], gate on the token type, check required scopes, and
//! produce a [`Principal`] or a terminal [`AuthFailure`]. No request reaches a
//! protected operation without passing every check, and no partial principal
//! is ever exposed.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::AuthFailure;
use crate::jwks::KeyResolver;
use crate::provider::{provider_from_config, ProviderAdapter};

/// The authenticated identity attached to a request.
///
/// Created at most once per successfully verified token; owned by the
/// request's lifetime and never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The raw bearer token as presented.
    pub token: String,
    /// The token's `client_id` claim, when present.
    pub client_id: Option<String>,
    /// Granted scopes in token order.
    pub scopes: Vec<String>,
    /// The token's `exp` claim (Unix timestamp), when present.
    pub expires_at: Option<u64>,
}

/// Orchestrates key resolution, provider verification, and scope checks.
pub struct TokenVerifier {
    provider: Arc<dyn ProviderAdapter>,
    keys: Arc<KeyResolver>,
    required_scopes: Vec<String>,
}

impl TokenVerifier {
    /// Build a verifier from explicit parts. The resolver must point at the
    /// provider's JWKS endpoint.
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        keys: Arc<KeyResolver>,
        required_scopes: Vec<String>,
    ) -> Self {
        Self {
            provider,
            keys,
            required_scopes,
        }
    }

    /// Build a verifier for the configured provider, with a key resolver
    /// pointed at that provider's JWKS endpoint and the config's required
    /// scope list.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let provider = provider_from_config(config);
        let keys = Arc::new(KeyResolver::new(provider.jwks_url()));
        Self::new(provider, keys, config.required_scopes())
    }

    /// The active provider adapter.
    pub fn provider(&self) -> &Arc<dyn ProviderAdapter> {
        &self.provider
    }

    /// The key resolver shared by all requests through this verifier.
    pub fn key_resolver(&self) -> &Arc<KeyResolver> {
        &self.keys
    }

    /// The statically configured scope list; all must be present.
    pub fn required_scopes(&self) -> &[String] {
        &self.required_scopes
    }

    /// Run the full verification pipeline on a raw `Authorization` header
    /// value.
    ///
    /// # Errors
    ///
    /// Every failure is an [`AuthFailure`] with one of the three closed error
    /// codes; nothing propagates as an uncaught fault. Underlying detail goes
    /// into the failure description and operational logs only.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthFailure> {
        let header = authorization
            .ok_or_else(|| AuthFailure::invalid_request("Missing authorization header"))?;

        let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AuthFailure::invalid_request(
                "Invalid authorization scheme or token",
            ));
        }

        // Decode the header only; no signature check yet.
        let kid = match jsonwebtoken::decode_header(token) {
            Ok(token_header) => token_header.kid,
            Err(_) => None,
        }
        .ok_or_else(|| AuthFailure::invalid_token("Invalid token format or missing key ID"))?;

        let key = self.keys.resolve(&kid).await.map_err(|error| {
            tracing::warn!(kid = %kid, error = %error, "signing key resolution failed");
            AuthFailure::invalid_token(error.to_string())
        })?;

        let token_data = self.provider.verify(token, &key).map_err(|error| {
            tracing::warn!(
                provider = self.provider.name(),
                error = %error,
                "token verification failed"
            );
            AuthFailure::invalid_token(error.to_string())
        })?;

        if !self.provider.verify_token_type(&token_data.header) {
            return Err(AuthFailure::invalid_token("Invalid token type"));
        }

        let scopes = self.provider.extract_scopes(&token_data.claims);
        let missing: Vec<&String> = self
            .required_scopes
            .iter()
            .filter(|required| !scopes.contains(required))
            .collect();
        if !missing.is_empty() {
            tracing::debug!(
                provided = ?scopes,
                required = ?self.required_scopes,
                "insufficient scopes"
            );
            // The challenge advertises the full required list, not the unmet
            // subset.
            return Err(AuthFailure::insufficient_scope(
                self.required_scopes.clone(),
            ));
        }

        Ok(Principal {
            token: token.to_string(),
            client_id: token_data.claims.client_id,
            scopes,
            expires_at: token_data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, ProviderKind};
    use crate::error::ErrorCode;

    fn verifier() -> TokenVerifier {
        // The resolver points at a closed port; tests below fail before or at
        // key resolution, never past it.
        TokenVerifier::from_config(
            &GatewayConfig::builder(ProviderKind::Cognito)
                .auth_hostname("127.0.0.1:1")
                .resource_hostname("rs.example")
                .build(),
        )
    }

    fn token_without_kid() -> String {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({"sub": "user"}),
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_is_invalid_request() {
        let failure = verifier().authenticate(None).await.unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidRequest);
        assert_eq!(
            failure.description.as_deref(),
            Some("Missing authorization header")
        );
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_invalid_request() {
        let failure = verifier()
            .authenticate(Some("Basic dXNlcjpwYXNz"))
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidRequest);
        assert_eq!(
            failure.description.as_deref(),
            Some("Invalid authorization scheme or token")
        );
    }

    #[tokio::test]
    async fn test_empty_token_is_invalid_request() {
        let failure = verifier().authenticate(Some("Bearer")).await.unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_scheme_is_case_insensitive() {
        // Still fails, but past the header-parse state: the garbage token is
        // rejected as invalid_token, not invalid_request.
        let failure = verifier()
            .authenticate(Some("bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidToken);
    }

    #[tokio::test]
    async fn test_malformed_token_is_invalid_token() {
        let failure = verifier()
            .authenticate(Some("Bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidToken);
        assert_eq!(
            failure.description.as_deref(),
            Some("Invalid token format or missing key ID")
        );
    }

    #[tokio::test]
    async fn test_token_without_kid_is_invalid_token() {
        let header = format!("Bearer {}", token_without_kid());
        let failure = verifier().authenticate(Some(&header)).await.unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidToken);
        assert_eq!(
            failure.description.as_deref(),
            Some("Invalid token format or missing key ID")
        );
    }

    #[tokio::test]
    async fn test_key_resolution_failure_is_invalid_token() {
        let mut header = jsonwebtoken::Header::default();
        header.kid = Some("some-kid".to_string());
        let token = jsonwebtoken::encode(
            &header,
            &serde_json::json!({"sub": "user"}),
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let failure = verifier()
            .authenticate(Some(&format!("Bearer {}", token)))
            .await
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::InvalidToken);
    }
}

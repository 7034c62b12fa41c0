//! Identity-provider adapters.
//!
//! All provider-specific policy (issuer format, audience requirement,
//! token-type allow-list, endpoint shapes, challenge realm) lives behind the
//! [`ProviderAdapter`] trait. The verification pipeline depends only on the
//! trait, so adding a third provider means implementing these operations and
//! nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{GatewayConfig, ProviderKind, ALLOWED_JWT_TYP_HEADERS, AUDIENCE, REALM};

/// Audience claim value, a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenAudience {
    Single(String),
    Multiple(Vec<String>),
}

impl TokenAudience {
    /// Check if the audience contains a specific value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            TokenAudience::Single(s) => s == value,
            TokenAudience::Multiple(v) => v.iter().any(|s| s == value),
        }
    }
}

/// The decoded, verified token payload. Lives for one request only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Issuer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<TokenAudience>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Not-before time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// OAuth client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Space-delimited scope string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Claims not covered by the standard fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Uniform verification contract over the provider backends.
///
/// Signature and claim verification is pure computation; only the JWKS fetch
/// (owned by [`KeyResolver`](crate::jwks::KeyResolver)) touches the network,
/// so every operation here is synchronous.
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// The exact `iss` value tokens must carry.
    fn issuer(&self) -> String;

    /// URL of the JWKS document used to verify token signatures.
    fn jwks_url(&self) -> String;

    /// Verify signature and claims against `key`.
    ///
    /// Checks RS256 signature, issuer equality, audience membership when the
    /// provider requires one, and `exp`/`nbf` with zero leeway.
    fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<TokenData<VerifiedClaims>, jsonwebtoken::errors::Error>;

    /// Gate on the token's `typ` header. Providers without a restriction
    /// accept everything.
    fn verify_token_type(&self, _header: &Header) -> bool {
        true
    }

    /// Split the scope claim on whitespace, preserving token order.
    /// An absent claim yields an empty list, not a failure.
    fn extract_scopes(&self, claims: &VerifiedClaims) -> Vec<String> {
        claims
            .scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    /// Realm for the `WWW-Authenticate` header, when the provider has one.
    fn challenge_realm(&self) -> Option<&str> {
        None
    }

    /// `authorization_endpoint` for the discovery document.
    fn authorization_endpoint(&self) -> String;

    /// `token_endpoint` for the discovery document.
    fn token_endpoint(&self) -> String;

    /// `jwks_uri` for the discovery document.
    fn discovery_jwks_uri(&self) -> String;
}

/// Select the adapter for the configured provider.
pub fn provider_from_config(config: &GatewayConfig) -> Arc<dyn ProviderAdapter> {
    match config.provider {
        ProviderKind::Cognito => Arc::new(CognitoProvider::new(config)),
        ProviderKind::Keycloak => Arc::new(KeycloakProvider::new(config)),
    }
}

fn base_validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    // exp and nbf are strict: a token expired by one second fails.
    validation.leeway = 0;
    validation.validate_nbf = true;
    // Audience is off by default; providers that require one opt back in.
    validation.validate_aud = false;
    // Only exp is optional (validated whenever present). iss stays required
    // so a token cannot dodge issuer pinning by omitting the claim.
    validation.required_spec_claims.clear();
    validation.required_spec_claims.insert("iss".to_string());
    validation.set_issuer(&[issuer]);
    validation
}

/// Provider A: Cognito-style backend.
///
/// Region-scoped issuer, no audience check, no token-type restriction, no
/// challenge realm.
#[derive(Debug, Clone)]
pub struct CognitoProvider {
    auth_protocol: String,
    auth_hostname: String,
    auth_region: String,
}

impl CognitoProvider {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            auth_protocol: config.auth_protocol.clone(),
            auth_hostname: config.auth_hostname.clone(),
            auth_region: config.auth_region.clone(),
        }
    }
}

impl ProviderAdapter for CognitoProvider {
    fn name(&self) -> &'static str {
        "cognito"
    }

    fn issuer(&self) -> String {
        format!("https://{}/{}", self.auth_hostname, self.auth_region)
    }

    fn jwks_url(&self) -> String {
        format!(
            "https://{}/{}/.well-known/jwks.json",
            self.auth_hostname, self.auth_region
        )
    }

    fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<TokenData<VerifiedClaims>, jsonwebtoken::errors::Error> {
        let validation = base_validation(&self.issuer());
        jsonwebtoken::decode::<VerifiedClaims>(token, key, &validation)
    }

    fn authorization_endpoint(&self) -> String {
        format!(
            "{}//{}/oauth2/authorize",
            self.auth_protocol, self.auth_hostname
        )
    }

    fn token_endpoint(&self) -> String {
        format!("{}//{}/oauth2/token", self.auth_protocol, self.auth_hostname)
    }

    fn discovery_jwks_uri(&self) -> String {
        format!(
            "{}//{}/.well-known/jwks.json",
            self.auth_protocol, self.auth_hostname
        )
    }
}

/// Provider B: Keycloak-style backend.
///
/// Realm-scoped issuer, audience required, `typ` header restricted to access
/// token types, realm advertised in challenges.
#[derive(Debug, Clone)]
pub struct KeycloakProvider {
    auth_protocol: String,
    auth_hostname: String,
    auth_port: u16,
    discovery_realm: String,
}

impl KeycloakProvider {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            auth_protocol: config.auth_protocol.clone(),
            auth_hostname: config.auth_hostname.clone(),
            auth_port: config.auth_port,
            discovery_realm: config.keycloak_realm.clone(),
        }
    }

    fn base_url(&self) -> String {
        format!(
            "{}//{}:{}",
            self.auth_protocol, self.auth_hostname, self.auth_port
        )
    }
}

impl ProviderAdapter for KeycloakProvider {
    fn name(&self) -> &'static str {
        "keycloak"
    }

    // The issuer carries no scheme; tokens are minted against the bare
    // host:port/realms/<realm> form.
    fn issuer(&self) -> String {
        format!("{}:{}/realms/{}", self.auth_hostname, self.auth_port, REALM)
    }

    fn jwks_url(&self) -> String {
        format!(
            "{}:{}/realms/{}/protocol/openid-connect/certs",
            self.auth_hostname, self.auth_port, REALM
        )
    }

    fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<TokenData<VerifiedClaims>, jsonwebtoken::errors::Error> {
        let mut validation = base_validation(&self.issuer());
        validation.validate_aud = true;
        validation.set_audience(&[AUDIENCE]);
        // aud must be present, not merely correct when present.
        validation.required_spec_claims.insert("aud".to_string());
        jsonwebtoken::decode::<VerifiedClaims>(token, key, &validation)
    }

    fn verify_token_type(&self, header: &Header) -> bool {
        let Some(typ) = header.typ.as_deref() else {
            return false;
        };
        ALLOWED_JWT_TYP_HEADERS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(typ))
    }

    fn challenge_realm(&self) -> Option<&str> {
        Some(REALM)
    }

    fn authorization_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/auth",
            self.base_url(),
            self.discovery_realm
        )
    }

    fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url(),
            self.discovery_realm
        )
    }

    fn discovery_jwks_uri(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/certs",
            self.base_url(),
            self.discovery_realm
        )
    }
}

//! Discovery metadata documents.
//!
//! Two static responders describing the authentication boundary: the
//! protected resource document (RFC 9728) and the authorization server
//! document (RFC 8414 shape). Both are pure functions of the active
//! configuration and provider; they reflect static state and carry no
//! verification logic.

use serde::{Deserialize, Serialize};

use crate::config::{
    GatewayConfig, AUTHORIZATION_SERVER_METADATA_PATH, PROTECTED_RESOURCE_METADATA_PATH,
};
use crate::provider::ProviderAdapter;

/// Protected Resource Metadata per RFC 9728 Section 3.
///
/// Served at `/.well-known/oauth-protected-resource`. The gateway advertises
/// its own URL as the authorization server so clients find the authorization
/// metadata at this host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// The resource server's identifier URL.
    pub resource: String,
    /// Authorization server issuer URLs for this resource.
    pub authorization_servers: Vec<String>,
    /// Scopes this resource requires.
    pub scopes_supported: Vec<String>,
    /// Methods supported for sending bearer tokens.
    pub bearer_methods_supported: Vec<String>,
}

impl ProtectedResourceMetadata {
    /// Build the document from the active configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let resource_server_url = config.resource_server_url();
        Self {
            resource: resource_server_url.clone(),
            authorization_servers: vec![resource_server_url],
            scopes_supported: config.required_scopes(),
            bearer_methods_supported: vec!["header".to_string()],
        }
    }

    /// The well-known path this document is served at.
    pub fn well_known_path() -> &'static str {
        PROTECTED_RESOURCE_METADATA_PATH
    }
}

/// Authorization Server Metadata describing the active provider's endpoints.
///
/// Served at `/.well-known/oauth-authorization-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
}

impl AuthorizationServerMetadata {
    /// Build the document from the active configuration and provider.
    pub fn new(config: &GatewayConfig, provider: &dyn ProviderAdapter) -> Self {
        Self {
            issuer: config.authorization_server_url(),
            authorization_endpoint: provider.authorization_endpoint(),
            token_endpoint: provider.token_endpoint(),
            registration_endpoint: format!("{}/register", config.resource_server_url()),
            jwks_uri: provider.discovery_jwks_uri(),
            response_types_supported: vec!["code".to_string()],
            grant_types_supported: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            code_challenge_methods_supported: vec!["S256".to_string()],
            token_endpoint_auth_methods_supported: vec!["none".to_string()],
            // This document lists openid first; the protected-resource
            // document keeps the required-scope order.
            scopes_supported: {
                let mut scopes = config.required_scopes();
                scopes.reverse();
                scopes
            },
        }
    }

    /// The well-known path this document is served at.
    pub fn well_known_path() -> &'static str {
        AUTHORIZATION_SERVER_METADATA_PATH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, ProviderKind};
    use crate::provider::provider_from_config;

    fn cognito_config() -> GatewayConfig {
        GatewayConfig::builder(ProviderKind::Cognito)
            .resource_hostname("rs.example")
            .auth_hostname("cognito-idp.example")
            .auth_region("eu-west-3_ABC123")
            .build()
    }

    #[test]
    fn test_protected_resource_advertises_itself() {
        let metadata = ProtectedResourceMetadata::from_config(&cognito_config());

        assert_eq!(metadata.resource, "https://rs.example");
        assert_eq!(metadata.authorization_servers, vec!["https://rs.example"]);
        assert_eq!(metadata.bearer_methods_supported, vec!["header"]);
        assert_eq!(
            metadata.scopes_supported,
            vec!["https://rs.example/mcp:access", "openid"]
        );
    }

    #[test]
    fn test_protected_resource_serialization() {
        let metadata = ProtectedResourceMetadata::from_config(&cognito_config());
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["resource"], "https://rs.example");
        assert_eq!(json["authorization_servers"][0], "https://rs.example");
        assert_eq!(json["bearer_methods_supported"][0], "header");
    }

    #[test]
    fn test_authorization_server_metadata_cognito() {
        let config = cognito_config();
        let provider = provider_from_config(&config);
        let metadata = AuthorizationServerMetadata::new(&config, provider.as_ref());

        assert_eq!(metadata.issuer, "https://cognito-idp.example");
        assert_eq!(
            metadata.authorization_endpoint,
            "https://cognito-idp.example/oauth2/authorize"
        );
        assert_eq!(
            metadata.token_endpoint,
            "https://cognito-idp.example/oauth2/token"
        );
        assert_eq!(
            metadata.jwks_uri,
            "https://cognito-idp.example/.well-known/jwks.json"
        );
        assert_eq!(
            metadata.registration_endpoint,
            "https://rs.example/register"
        );
    }

    #[test]
    fn test_authorization_server_metadata_keycloak() {
        let config = GatewayConfig::builder(ProviderKind::Keycloak)
            .resource_hostname("rs.example")
            .auth_hostname("kc.example")
            .auth_port(8443)
            .keycloak_realm("tenants")
            .build();
        let provider = provider_from_config(&config);
        let metadata = AuthorizationServerMetadata::new(&config, provider.as_ref());

        assert_eq!(metadata.issuer, "https://kc.example:8443");
        assert_eq!(
            metadata.authorization_endpoint,
            "https://kc.example:8443/realms/tenants/protocol/openid-connect/auth"
        );
        assert_eq!(
            metadata.token_endpoint,
            "https://kc.example:8443/realms/tenants/protocol/openid-connect/token"
        );
        assert_eq!(
            metadata.jwks_uri,
            "https://kc.example:8443/realms/tenants/protocol/openid-connect/certs"
        );
    }

    #[test]
    fn test_fixed_capability_arrays() {
        let config = cognito_config();
        let provider = provider_from_config(&config);
        let metadata = AuthorizationServerMetadata::new(&config, provider.as_ref());

        assert_eq!(metadata.response_types_supported, vec!["code"]);
        assert_eq!(
            metadata.grant_types_supported,
            vec!["authorization_code", "refresh_token"]
        );
        assert_eq!(metadata.code_challenge_methods_supported, vec!["S256"]);
        assert_eq!(metadata.token_endpoint_auth_methods_supported, vec!["none"]);
    }

    #[test]
    fn test_authorization_server_scopes_list_openid_first() {
        let config = cognito_config();
        let provider = provider_from_config(&config);
        let metadata = AuthorizationServerMetadata::new(&config, provider.as_ref());

        assert_eq!(
            metadata.scopes_supported,
            vec!["openid", "https://rs.example/mcp:access"]
        );
    }

    #[test]
    fn test_well_known_paths() {
        assert_eq!(
            ProtectedResourceMetadata::well_known_path(),
            "/.well-known/oauth-protected-resource"
        );
        assert_eq!(
            AuthorizationServerMetadata::well_known_path(),
            "/.well-known/oauth-authorization-server"
        );
    }
}

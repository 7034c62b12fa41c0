//! Environment-derived gateway configuration.
//!
//! [`GatewayConfig`] is assembled once at process start and never mutated.
//! Exactly one identity provider must be enabled; enabling zero or both is a
//! fatal startup error. Tests use the builder instead of the process
//! environment.

use std::env;

use crate::error::ConfigError;

/// Audience expected in Keycloak-issued access tokens.
pub const AUDIENCE: &str = "mcp-server";

/// Realm used for Keycloak token issuance and challenge headers.
pub const REALM: &str = "mcp-realm";

/// `typ` header values accepted for Keycloak access tokens (case-insensitive).
pub const ALLOWED_JWT_TYP_HEADERS: &[&str] = &["at+jwt", "application/at+jwt"];

/// Well-known path of the protected resource metadata document.
pub const PROTECTED_RESOURCE_METADATA_PATH: &str = "/.well-known/oauth-protected-resource";

/// Well-known path of the authorization server metadata document.
pub const AUTHORIZATION_SERVER_METADATA_PATH: &str = "/.well-known/oauth-authorization-server";

/// Which identity provider backend is active for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// AWS Cognito style: region-scoped issuer, no audience check, no realm.
    Cognito,
    /// Keycloak style: realm-scoped issuer, audience required, restricted
    /// token-type headers.
    Keycloak,
}

/// Static gateway configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The active provider backend.
    pub provider: ProviderKind,
    /// Scheme of the resource server, including the trailing colon (`https:`).
    pub resource_protocol: String,
    /// Hostname of the resource server.
    pub resource_hostname: String,
    /// Optional port of the resource server.
    pub resource_port: Option<u16>,
    /// Scheme used when assembling authorization server discovery URLs.
    pub auth_protocol: String,
    /// Hostname of the authorization server.
    pub auth_hostname: String,
    /// Cognito region segment (e.g. `eu-west-3_XXXXXXXX`).
    pub auth_region: String,
    /// Keycloak port.
    pub auth_port: u16,
    /// Keycloak realm used for discovery endpoint URLs.
    pub keycloak_realm: String,
}

impl GatewayConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProviderSelection`] unless exactly one of
    /// `KEYCLOAK` and `COGNITO` is set, and [`ConfigError::InvalidValue`] for
    /// unparseable port values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cognito = env::var("COGNITO").is_ok();
        let keycloak = env::var("KEYCLOAK").is_ok();

        let provider = match (cognito, keycloak) {
            (true, false) => ProviderKind::Cognito,
            (false, true) => ProviderKind::Keycloak,
            _ => return Err(ConfigError::ProviderSelection),
        };

        let resource_port = match env::var("RESOURCE_SERVER_PORT") {
            Ok(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "RESOURCE_SERVER_PORT",
                value: raw,
            })?),
            Err(_) => None,
        };

        let auth_port = match env::var("AUTHORIZATION_SERVER_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "AUTHORIZATION_SERVER_PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            provider,
            resource_protocol: env::var("RESOURCE_SERVER_PROTOCOL")
                .unwrap_or_else(|_| "https:".to_string()),
            resource_hostname: env::var("RESOURCE_SERVER_HOSTNAME")
                .unwrap_or_else(|_| "localhost".to_string()),
            resource_port,
            auth_protocol: env::var("AUTHORIZATION_SERVER_PROTOCOL")
                .unwrap_or_else(|_| "https:".to_string()),
            auth_hostname: env::var("AUTHORIZATION_SERVER_HOSTNAME")
                .unwrap_or_else(|_| "localhost".to_string()),
            auth_region: env::var("AUTHORIZATION_SERVER_REGION")
                .unwrap_or_else(|_| "eu-west-3_XXXXXXXX".to_string()),
            auth_port,
            keycloak_realm: env::var("KEYCLOAK_REALM").unwrap_or_else(|_| "master".to_string()),
        })
    }

    /// Start building a configuration without touching the environment.
    pub fn builder(provider: ProviderKind) -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self {
                provider,
                resource_protocol: "https:".to_string(),
                resource_hostname: "localhost".to_string(),
                resource_port: None,
                auth_protocol: "https:".to_string(),
                auth_hostname: "localhost".to_string(),
                auth_region: "eu-west-3_XXXXXXXX".to_string(),
                auth_port: 8080,
                keycloak_realm: "master".to_string(),
            },
        }
    }

    /// Base URL of the resource server (`https://host[:port]`).
    pub fn resource_server_url(&self) -> String {
        match self.resource_port {
            Some(port) => format!(
                "{}//{}:{}",
                self.resource_protocol, self.resource_hostname, port
            ),
            None => format!("{}//{}", self.resource_protocol, self.resource_hostname),
        }
    }

    /// Base URL of the authorization server, shaped per provider.
    pub fn authorization_server_url(&self) -> String {
        match self.provider {
            ProviderKind::Cognito => format!("{}//{}", self.auth_protocol, self.auth_hostname),
            ProviderKind::Keycloak => format!(
                "{}//{}:{}",
                self.auth_protocol, self.auth_hostname, self.auth_port
            ),
        }
    }

    /// Absolute URL of the protected resource metadata document, advertised
    /// in every challenge header.
    pub fn resource_metadata_url(&self) -> String {
        format!(
            "{}{}",
            self.resource_server_url(),
            PROTECTED_RESOURCE_METADATA_PATH
        )
    }

    /// The scopes every authenticated request must carry, in challenge order.
    pub fn required_scopes(&self) -> Vec<String> {
        vec![
            format!("https://{}/mcp:access", self.resource_hostname),
            "openid".to_string(),
        ]
    }
}

/// Builder for [`GatewayConfig`], used by tests and embedders.
#[derive(Debug, Clone)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn resource_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.resource_protocol = protocol.into();
        self
    }

    pub fn resource_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.resource_hostname = hostname.into();
        self
    }

    pub fn resource_port(mut self, port: u16) -> Self {
        self.config.resource_port = Some(port);
        self
    }

    pub fn auth_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.auth_protocol = protocol.into();
        self
    }

    pub fn auth_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.auth_hostname = hostname.into();
        self
    }

    pub fn auth_region(mut self, region: impl Into<String>) -> Self {
        self.config.auth_region = region.into();
        self
    }

    pub fn auth_port(mut self, port: u16) -> Self {
        self.config.auth_port = port;
        self
    }

    pub fn keycloak_realm(mut self, realm: impl Into<String>) -> Self {
        self.config.keycloak_realm = realm.into();
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_server_url_without_port() {
        let config = GatewayConfig::builder(ProviderKind::Cognito)
            .resource_hostname("rs.example")
            .build();
        assert_eq!(config.resource_server_url(), "https://rs.example");
    }

    #[test]
    fn test_resource_server_url_with_port() {
        let config = GatewayConfig::builder(ProviderKind::Cognito)
            .resource_protocol("http:")
            .resource_hostname("localhost")
            .resource_port(3000)
            .build();
        assert_eq!(config.resource_server_url(), "http://localhost:3000");
    }

    #[test]
    fn test_authorization_server_url_per_provider() {
        let cognito = GatewayConfig::builder(ProviderKind::Cognito)
            .auth_hostname("cognito-idp.example")
            .build();
        assert_eq!(
            cognito.authorization_server_url(),
            "https://cognito-idp.example"
        );

        let keycloak = GatewayConfig::builder(ProviderKind::Keycloak)
            .auth_hostname("kc.example")
            .auth_port(8443)
            .build();
        assert_eq!(keycloak.authorization_server_url(), "https://kc.example:8443");
    }

    #[test]
    fn test_resource_metadata_url() {
        let config = GatewayConfig::builder(ProviderKind::Keycloak)
            .resource_hostname("rs.example")
            .build();
        assert_eq!(
            config.resource_metadata_url(),
            "https://rs.example/.well-known/oauth-protected-resource"
        );
    }

    #[test]
    fn test_required_scopes_derive_from_resource_hostname() {
        let config = GatewayConfig::builder(ProviderKind::Cognito)
            .resource_hostname("rs.example")
            .build();
        assert_eq!(
            config.required_scopes(),
            vec!["https://rs.example/mcp:access".to_string(), "openid".to_string()]
        );
    }
}

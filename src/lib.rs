//! # mcp-auth-gateway
//!
//! OAuth 2.0 resource-server authentication gateway for MCP-style protected
//! endpoints.
//!
//! The gateway sits in front of a protected API endpoint and validates bearer
//! tokens issued by an external authorization server -- one of two
//! interchangeable identity-provider backends (Cognito-style or
//! Keycloak-style). It enforces a required-scope policy and emits
//! spec-compliant challenge responses (RFC 6750) and discovery metadata
//! (RFC 9728) so standards-conforming clients can self-configure.
//!
//! # Architecture
//!
//! - **Key Resolver** ([`KeyResolver`](jwks::KeyResolver)): fetches and caches
//!   the authorization server's public signing keys from its JWKS endpoint,
//!   keyed by `kid`, with a bounded cache and per-entry max age.
//!
//! - **Provider Adapter** ([`ProviderAdapter`](provider::ProviderAdapter)):
//!   encapsulates provider-specific issuer format, audience requirement,
//!   token-type allow-list, and endpoint shapes behind one trait. The pipeline
//!   never branches on provider identity past this boundary.
//!
//! - **Token Verifier** ([`TokenVerifier`](verify::TokenVerifier)): runs the
//!   per-request pipeline -- header parse, key resolution, signature and claim
//!   verification, token-type gate, scope check -- and returns a
//!   [`Principal`](verify::Principal) or a structured
//!   [`AuthFailure`](error::AuthFailure).
//!
//! - **Challenge Builder** ([`build_challenge`](challenge::build_challenge)):
//!   renders the `WWW-Authenticate` header value with deterministic field
//!   order.
//!
//! - **Discovery Metadata** ([`metadata`]): the protected-resource and
//!   authorization-server documents served at their well-known paths.
//!
//! - **HTTP Middleware** ([`AuthGateLayer`](middleware::AuthGateLayer)): tower
//!   middleware that runs the pipeline per request, injects the principal
//!   into request extensions, and answers every failure with `401` and a
//!   populated challenge header.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{routing::post, Json, Router};
//! use mcp_auth_gateway::config::GatewayConfig;
//! use mcp_auth_gateway::middleware::AuthGateLayer;
//! use mcp_auth_gateway::verify::{Principal, TokenVerifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::from_env()?;
//!     let verifier = Arc::new(TokenVerifier::from_config(&config));
//!     let gate = AuthGateLayer::new(verifier, config.resource_metadata_url());
//!
//!     let app = Router::new()
//!         .route(
//!             "/mcp",
//!             post(|axum::Extension(principal): axum::Extension<Principal>| async move {
//!                 Json(serde_json::json!({ "client_id": principal.client_id }))
//!             }),
//!         )
//!         .layer(gate);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Discovery Flow
//!
//! 1. Client requests the protected endpoint without a token
//! 2. Gateway returns `401` with `WWW-Authenticate: Bearer resource_metadata="..."`
//! 3. Client fetches `/.well-known/oauth-protected-resource` to discover the
//!    authorization server
//! 4. Client obtains a token and retries with `Authorization: Bearer <token>`

pub mod challenge;
pub mod config;
pub mod error;
pub mod jwks;
pub mod metadata;
pub mod middleware;
pub mod provider;
pub mod verify;

// Re-exports
pub use challenge::build_challenge;
pub use config::{GatewayConfig, GatewayConfigBuilder, ProviderKind};
pub use error::{AuthFailure, ConfigError, ErrorCode, KeyFetchError};
pub use jwks::KeyResolver;
pub use metadata::{AuthorizationServerMetadata, ProtectedResourceMetadata};
pub use middleware::{AuthGateLayer, AuthGateService};
pub use provider::{
    provider_from_config, CognitoProvider, KeycloakProvider, ProviderAdapter, TokenAudience,
    VerifiedClaims,
};
pub use verify::{Principal, TokenVerifier};

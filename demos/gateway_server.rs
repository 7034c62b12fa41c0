//! Authentication gateway in front of a protected endpoint.
//!
//! Demonstrates:
//! - Token validation via `AuthGateLayer` (JWKS-backed, provider-selected)
//! - Discovery metadata at the two well-known paths
//! - `Principal` injection into request extensions
//!
//! Run with: COGNITO=true cargo run --example gateway_server
//!      or: KEYCLOAK=true cargo run --example gateway_server
//!
//! Test with curl:
//!
//! ```bash
//! # 1. Discover the authorization server (public endpoint)
//! curl http://localhost:3000/.well-known/oauth-protected-resource
//!
//! # 2. Attempt without a token (401 with WWW-Authenticate header)
//! curl -v -X POST http://localhost:3000/mcp
//!
//! # 3. Retry with a token issued by the configured provider
//! curl -X POST http://localhost:3000/mcp \
//!   -H "Authorization: Bearer <your-access-token>"
//! ```

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use mcp_auth_gateway::config::GatewayConfig;
use mcp_auth_gateway::metadata::{AuthorizationServerMetadata, ProtectedResourceMetadata};
use mcp_auth_gateway::middleware::AuthGateLayer;
use mcp_auth_gateway::provider::provider_from_config;
use mcp_auth_gateway::verify::{Principal, TokenVerifier};

async fn protected_endpoint(Extension(principal): Extension<Principal>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "client_id": principal.client_id,
        "scopes": principal.scopes,
        "expires_at": principal.expires_at,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mcp_auth_gateway=debug".parse()?)
                .add_directive("gateway_server=debug".parse()?),
        )
        .init();

    // Zero or both providers enabled is fatal here, before any request.
    let config = GatewayConfig::from_env()?;
    let provider = provider_from_config(&config);
    let verifier = Arc::new(TokenVerifier::from_config(&config));

    tracing::info!(
        provider = provider.name(),
        issuer = %provider.issuer(),
        "starting authentication gateway"
    );

    let resource_metadata = ProtectedResourceMetadata::from_config(&config);
    let server_metadata = AuthorizationServerMetadata::new(&config, provider.as_ref());
    let gate = AuthGateLayer::new(verifier, config.resource_metadata_url());

    let app = Router::new()
        .route("/mcp", post(protected_endpoint))
        .route(
            ProtectedResourceMetadata::well_known_path(),
            get(move || {
                let metadata = resource_metadata.clone();
                async move { Json(metadata) }
            }),
        )
        .route(
            AuthorizationServerMetadata::well_known_path(),
            get(move || {
                let metadata = server_metadata.clone();
                async move { Json(metadata) }
            }),
        )
        .layer(gate);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("gateway listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await?;

    Ok(())
}

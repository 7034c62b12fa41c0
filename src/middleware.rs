//! Tower middleware running the verification pipeline per HTTP request.
//!
//! [`AuthGateLayer`] wraps a service with [`AuthGateService`]. For each
//! request the service skips configured public paths, runs
//! [`TokenVerifier::authenticate`] on the `Authorization` header, injects the
//! resulting [`Principal`] into request extensions on success, and otherwise
//! short-circuits with `401`, an empty body, and a fully populated
//! `WWW-Authenticate` header. The status is 401 for every failure kind.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use tower::Layer;

use crate::challenge::build_challenge;
use crate::error::AuthFailure;
use crate::metadata::{AuthorizationServerMetadata, ProtectedResourceMetadata};
use crate::verify::TokenVerifier;

/// Tower layer that gates services behind bearer-token authentication.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use mcp_auth_gateway::config::{GatewayConfig, ProviderKind};
/// use mcp_auth_gateway::middleware::AuthGateLayer;
/// use mcp_auth_gateway::verify::TokenVerifier;
///
/// let config = GatewayConfig::builder(ProviderKind::Cognito)
///     .resource_hostname("rs.example")
///     .build();
/// let verifier = Arc::new(TokenVerifier::from_config(&config));
/// let layer = AuthGateLayer::new(verifier, config.resource_metadata_url());
/// ```
#[derive(Clone)]
pub struct AuthGateLayer {
    verifier: Arc<TokenVerifier>,
    resource_metadata_url: String,
    public_paths: Vec<String>,
}

impl AuthGateLayer {
    /// Create a layer around a shared verifier. The metadata URL is
    /// advertised in every challenge header.
    ///
    /// The two well-known discovery paths are always public.
    pub fn new(verifier: Arc<TokenVerifier>, resource_metadata_url: impl Into<String>) -> Self {
        Self {
            verifier,
            resource_metadata_url: resource_metadata_url.into(),
            public_paths: vec![
                ProtectedResourceMetadata::well_known_path().to_string(),
                AuthorizationServerMetadata::well_known_path().to_string(),
            ],
        }
    }

    /// Add a path that does not require authentication.
    pub fn public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            verifier: self.verifier.clone(),
            resource_metadata_url: self.resource_metadata_url.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

/// Tower service created by [`AuthGateLayer`].
#[derive(Clone)]
pub struct AuthGateService<S> {
    inner: S,
    verifier: Arc<TokenVerifier>,
    resource_metadata_url: String,
    public_paths: Vec<String>,
}

impl<S> tower_service::Service<Request<Body>> for AuthGateService<S>
where
    S: tower_service::Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let public_paths = self.public_paths.clone();
        let verifier = self.verifier.clone();
        let resource_metadata_url = self.resource_metadata_url.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if public_paths.iter().any(|p| path == *p) {
                return inner.call(req).await;
            }

            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match verifier.authenticate(authorization.as_deref()).await {
                Ok(principal) => {
                    let mut req = req;
                    req.extensions_mut().insert(principal);
                    inner.call(req).await
                }
                Err(failure) => {
                    tracing::debug!(code = %failure.code, path = %path, "rejecting request");
                    Ok(unauthorized_response(
                        &failure,
                        &resource_metadata_url,
                        verifier.provider().challenge_realm(),
                    ))
                }
            }
        })
    }
}

/// Build the 401 response for a failed verification: empty body, populated
/// `WWW-Authenticate` header. No internal detail beyond the challenge leaks
/// into the response.
fn unauthorized_response(
    failure: &AuthFailure,
    resource_metadata_url: &str,
    realm: Option<&str>,
) -> Response<Body> {
    let challenge = build_challenge(resource_metadata_url, Some(failure), realm);

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        challenge
            .parse()
            .unwrap_or_else(|_| header::HeaderValue::from_static("Bearer")),
    );
    response
}

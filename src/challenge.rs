//! `WWW-Authenticate` challenge header construction.
//!
//! Builds the single header value returned with every 401 per RFC 6750
//! Section 3, including the `resource_metadata` parameter from RFC 9728 so
//! clients can discover the authorization server. Field order is fixed
//! (realm, resource_metadata, error, error_description, scope) so output is
//! deterministic and byte-for-byte testable.

use crate::error::AuthFailure;

/// Build a `WWW-Authenticate: Bearer ...` header value.
///
/// `resource_metadata` is always present; `realm` leads when the active
/// provider requires one; error fields are appended only on failure.
///
/// ```
/// use mcp_auth_gateway::challenge::build_challenge;
/// use mcp_auth_gateway::error::AuthFailure;
///
/// let header = build_challenge(
///     "https://rs.example/.well-known/oauth-protected-resource",
///     Some(&AuthFailure::invalid_token("bad signature")),
///     Some("mcp-realm"),
/// );
/// assert_eq!(
///     header,
///     "Bearer realm=\"mcp-realm\",\
///      resource_metadata=\"https://rs.example/.well-known/oauth-protected-resource\", \
///      error=\"invalid_token\", error_description=\"bad signature\"",
/// );
/// ```
pub fn build_challenge(
    metadata_url: &str,
    failure: Option<&AuthFailure>,
    realm: Option<&str>,
) -> String {
    let mut bearer = String::from("Bearer");

    // Realm is glued to resource_metadata without a space; that exact spacing
    // is part of the observed wire format.
    match realm {
        Some(realm) => {
            bearer.push_str(&format!(" realm=\"{}\",", realm));
        }
        None => bearer.push(' '),
    }

    bearer.push_str(&format!("resource_metadata=\"{}\"", metadata_url));

    if let Some(failure) = failure {
        bearer.push_str(&format!(", error=\"{}\"", failure.code.as_str()));

        if let Some(description) = &failure.description {
            bearer.push_str(&format!(", error_description=\"{}\"", description));
        }

        if let Some(scopes) = &failure.required_scopes {
            if !scopes.is_empty() {
                bearer.push_str(&format!(", scope=\"{}\"", scopes.join(" ")));
            }
        }
    }

    bearer
}

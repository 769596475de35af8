//! Caller identity extraction.
//!
//! Authentication happens upstream at the gateway, which forwards the
//! verified identity in headers. Requests without the full set of
//! headers are rejected before any handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Caller, Role, UserId};

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_EMAIL_HEADER: &str = "x-user-email";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_NAME_HEADER: &str = "x-user-name";

/// Extractor for the verified caller identity.
pub struct Identity(pub Caller);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(format!("Missing {name} header")))
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id: UserId = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| ApiError::Unauthenticated("Invalid x-user-id header".to_string()))?;
        let email = header(parts, USER_EMAIL_HEADER)?.to_string();
        let role = Role::parse(header(parts, USER_ROLE_HEADER)?)
            .ok_or_else(|| ApiError::Unauthenticated("Invalid x-user-role header".to_string()))?;

        let mut caller = Caller::new(user_id, email, role);
        // display name is optional; gateways that know it forward it
        if let Ok(name) = header(parts, USER_NAME_HEADER) {
            caller = caller.with_name(name);
        }
        Ok(Identity(caller))
    }
}

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::trace;

use crate::{AppState, auth::Authorized, errors::Error};

/// Pull the credential out of an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid ASCII, or uses another scheme. The scheme
/// name is matched case-insensitively.
pub fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

impl FromRequestParts<AppState> for Authorized {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(&parts.headers);
        trace!(present = credential.is_some(), "Checking bearer credential");
        state.ingestion.authenticate(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_credential(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_credential(&headers_with("Bearer   abc  ")), Some("abc"));
        assert_eq!(bearer_credential(&headers_with("Basic abc")), None);
        assert_eq!(bearer_credential(&headers_with("Bearer")), None);
        assert_eq!(bearer_credential(&headers_with("Bearer ")), None);
        assert_eq!(bearer_credential(&HeaderMap::new()), None);
    }
}

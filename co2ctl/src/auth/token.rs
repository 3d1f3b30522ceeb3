use std::{fmt, sync::Arc};

use crate::errors::{Error, Result};

/// Value shipped as the default `auth_token`. Only useful for local development.
pub const INSECURE_DEFAULT_TOKEN: &str = "your-secret-token";

/// The process-wide write credential. Immutable once constructed.
#[derive(Clone)]
pub struct AuthToken(Arc<str>);

/// Proof that a request presented the configured token.
///
/// Write operations take this instead of a raw credential so the check cannot be skipped.
#[derive(Debug, Clone, Copy)]
pub struct Authorized(());

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Compare the presented credential verbatim against the configured token
    pub fn verify(&self, credential: Option<&str>) -> Result<Authorized> {
        match credential {
            Some(presented) if presented == &*self.0 => Ok(Authorized(())),
            _ => Err(Error::Unauthorized),
        }
    }

    pub fn is_insecure_default(&self) -> bool {
        &*self.0 == INSECURE_DEFAULT_TOKEN
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"<redacted>").finish()
    }
}

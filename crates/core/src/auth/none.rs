use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Header carrying the acting user's id when no credentials are checked.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticator that trusts the `X-User-Id` header as-is.
/// Must be explicitly configured - the system won't default to this
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let raw = request
            .header(USER_ID_HEADER)
            .ok_or(AuthError::NotAuthenticated)?;
        let user_id = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| AuthError::InvalidCredentials(format!("Bad user id: {}", raw)))?;

        Ok(Identity {
            user_id,
            method: self.method_name(),
        })
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

//! API token authentication.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that maps API tokens to the user they belong to.
///
/// Accepts the token in either:
/// - `Authorization: Bearer <token>` header
/// - `X-API-Key: <token>` header
pub struct ApiKeyAuthenticator {
    tokens: Vec<(String, u32)>,
}

impl ApiKeyAuthenticator {
    pub fn new(tokens: HashMap<String, u32>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    fn extract_token<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(auth_header) = request.header("authorization") {
            if let Some(token) = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "))
            {
                return Some(token);
            }
        }

        request.header("x-api-key")
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = self
            .extract_token(request)
            .ok_or(AuthError::NotAuthenticated)?;

        // Every token is compared so the scan time does not depend on which one matched
        let mut matched = None;
        for (token, user_id) in &self.tokens {
            if constant_time_eq(provided.as_bytes(), token.as_bytes()) {
                matched = Some(*user_id);
            }
        }

        match matched {
            Some(user_id) => Ok(Identity {
                user_id,
                method: self.method_name(),
            }),
            None => Err(AuthError::InvalidCredentials("Invalid API key".to_string())),
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

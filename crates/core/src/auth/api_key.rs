//! Shared-secret operator authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Validates the operator key sent as `X-API-Key: <key>` or
/// `Authorization: Bearer <key>`.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn presented_key<'a>(request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(key) = request.header("x-api-key") {
            return Some(key.trim());
        }
        let value = request.header("authorization")?;
        let (scheme, key) = value.split_once(' ')?;
        scheme.eq_ignore_ascii_case("bearer").then(|| key.trim())
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let presented = Self::presented_key(request).ok_or(AuthError::NotAuthenticated)?;

        if keys_match(presented.as_bytes(), self.key.as_bytes()) {
            Ok(Identity::operator())
        } else {
            Err(AuthError::InvalidCredentials("operator key rejected".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Length check first, then a comparison that touches every byte.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

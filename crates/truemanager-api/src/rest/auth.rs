// Auth endpoints

use super::client::RestClient;
use super::types::{AuthMe, CheckPasswordRequest, GenerateTokenRequest};
use crate::error::Error;

impl RestClient {
    /// Verify a username/password pair without changing the session.
    pub async fn check_password(&self, username: &str, password: &str) -> Result<bool, Error> {
        self.post(
            "auth/check_password",
            &CheckPasswordRequest { username, password },
        )
        .await
    }

    /// Mint a short-lived token for the current credentials.
    pub async fn generate_token(&self, request: &GenerateTokenRequest) -> Result<String, Error> {
        self.post("auth/generate_token", request).await
    }

    /// The account behind the current credentials.
    pub async fn me(&self) -> Result<AuthMe, Error> {
        self.get("auth/me").await
    }

    /// Whether the server demands a second factor for password logins.
    pub async fn two_factor_required(&self) -> Result<bool, Error> {
        self.post_empty("auth/two_factor_auth").await
    }
}

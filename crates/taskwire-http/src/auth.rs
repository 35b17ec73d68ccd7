//! Login, registration and logout.

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use taskwire_core::error::Error;
use taskwire_core::{AccessToken, LoginForm, RefreshToken, Registration, Result};

use crate::api::endpoints::{REGISTER, TOKEN, TOKEN_BLACKLIST, TokenResponse};
use crate::api::{ApiClient, ApiRequest};
use crate::client::TaskClient;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub username: String,
    /// Access token lifetime in seconds, if the server reported one.
    pub access_expires_in: Option<u64>,
}

impl TaskClient {
    /// Log in and store the issued tokens.
    ///
    /// Blank fields are rejected before any request is made.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutput> {
        let form = LoginForm::new(username, password);
        form.validate()?;

        let request = ApiRequest::post(TOKEN).with_json(json!({
            "username": form.username,
            "password": form.password,
        }));
        let response = self.api().send(&request, None).await?;
        let tokens: TokenResponse = ApiClient::decode(response, "Login failed").await?;

        let refresh = tokens.refresh.ok_or_else(|| Error::Malformed {
            message: "login response has no refresh token".to_string(),
        })?;
        self.store().save(
            &AccessToken::new(tokens.access),
            &RefreshToken::new(refresh),
            tokens.access_expires_in,
        )?;

        info!("logged in");
        Ok(LoginOutput {
            username: form.username,
            access_expires_in: tokens.access_expires_in,
        })
    }

    /// Create an account. Returns the user record the server sent back.
    ///
    /// Does not log in.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<serde_json::Value> {
        registration.validate()?;

        let request = ApiRequest::post(REGISTER).with_json(json!({
            "username": registration.username,
            "email": registration.email,
            "password": registration.password,
            "confirm_password": registration.confirm_password,
        }));
        let response = self.api().send(&request, None).await?;
        let user = ApiClient::decode(response, "Registration failed").await?;

        info!("account registered");
        Ok(user)
    }

    /// End the session.
    ///
    /// Stops the push channel, asks the server to blacklist the refresh
    /// token, and clears the stored credentials. The blacklist call is
    /// best effort; only clearing the store can fail.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.channel().shutdown();

        if let Some(refresh) = self.store().refresh_token() {
            let request = ApiRequest::post(TOKEN_BLACKLIST)
                .with_json(json!({ "refresh": refresh.as_str() }));
            let token = self.store().access_token();

            match self.api().send(&request, token.as_ref()).await {
                Ok(response) if response.status().is_success() => {
                    debug!("refresh token blacklisted");
                }
                Ok(response) => {
                    warn!(status = %response.status(), "refresh token blacklist rejected");
                }
                Err(err) => warn!(error = %err, "refresh token blacklist failed"),
            }
        }

        self.store().clear()?;
        info!("logged out");
        Ok(())
    }
}

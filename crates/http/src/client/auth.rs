//! Authentication API client methods

use super::request::ApiRequest;
use super::session::{SessionError, TokenRefresher};
use super::store::SessionStore;
use super::{AdminClient, ClientError};
use crate::types::{LoginRequest, LoginResponse, RefreshResponse, RefreshTokenRequest};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const LOGIN_PATH: &str = "/auth/admin/login";
pub const REFRESH_PATH: &str = "/auth/refresh-token";
pub const LOGOUT_PATH: &str = "/auth/logout";

impl AdminClient {
    /// Log in as an administrator
    ///
    /// `identity` is an email address or phone number. A 401 here means bad
    /// credentials and is returned as is; no session recovery is attempted.
    pub async fn login(
        &self,
        identity: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<LoginResponse, ClientError> {
        self.seed_api_token()?;

        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            identity: identity.into(),
            password: password.into(),
        })?;
        let response: LoginResponse = self.execute_public(&request).await?;

        self.credentials()
            .store_login(&response.token_pair(), response.admin_token.as_deref())?;
        info!("admin logged in");
        Ok(response)
    }

    /// End the session on the server and locally
    ///
    /// Stored credentials are cleared even when the server call fails; that
    /// failure is still returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self.credentials().refresh_token() {
            Some(refresh_token) => {
                let request =
                    ApiRequest::post(LOGOUT_PATH).json(&RefreshTokenRequest { refresh_token })?;
                self.execute_public_empty(&request).await
            }
            None => {
                debug!("no stored session, skipping logout call");
                Ok(())
            }
        };

        if let Err(e) = &result {
            warn!(error = %e, "logout call failed, clearing credentials anyway");
        }
        self.credentials().clear()?;
        info!("admin logged out");
        result
    }
}

/// Refreshes tokens through `POST {base_url}/auth/refresh-token`
///
/// The request carries only the application token; the access token is the
/// one being replaced.
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
}

impl HttpTokenRefresher {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, store: SessionStore) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            store,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
        let mut builder = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshTokenRequest {
                refresh_token: refresh_token.to_string(),
            })
            .and_then(|request| request.build(&self.http, &self.base_url))
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        if let Some(api_token) = self.store.api_token() {
            builder = builder.bearer_auth(api_token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SessionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| SessionError::InvalidRefreshResponse(e.to_string()))
    }
}

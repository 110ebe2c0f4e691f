//! Storedesk admin API client
//!
//! Every call carries two credentials: the static application token as
//! `Authorization: Bearer ...` and the session access token in a separate
//! header (`x-access-token` by default). A 401 triggers one session recovery
//! through the [`SessionManager`] and one resubmission of the request.

pub mod auth;
pub mod catalog;
pub mod content;
pub mod error;
pub mod orders;
pub mod people;
pub mod request;
pub mod resource;
pub mod session;
pub mod settings;
pub mod store;

pub use content::LogoKind;
pub use error::ClientError;
pub use request::{ApiRequest, Attempt, Upload};
pub use resource::{ListQuery, Page, Resource};
pub use session::{SessionError, SessionExpiredHook, SessionManager, TokenRefresher};
pub use store::{CredentialStore, MemoryStore, SessionStore, StoreError, TokenPair};

#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;
#[cfg(target_arch = "wasm32")]
pub use store::BrowserStore;

use auth::HttpTokenRefresher;
use bytes::Bytes;
use reqwest::header::HeaderName;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use storedesk_core::{AdminConfig, StoreKind, ValidateConfig};
use tracing::{debug, instrument, warn};

const DEFAULT_ACCESS_HEADER: &str = "x-access-token";

/// Admin API client; cheap to clone, clones share one session
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    access_header: HeaderName,
    api_token: Option<String>,
    session: SessionManager,
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url)
            .field("access_header", &self.inner.access_header)
            .field("session", &self.inner.session)
            .finish()
    }
}

impl AdminClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> AdminClientBuilder {
        AdminClientBuilder::default()
    }

    /// Build a client from validated configuration
    pub fn from_config(config: &AdminConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let mut builder = Self::builder()
            .base_url(config.api.base_url.clone())
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(config.api.user_agent.clone())
            .access_header(config.api.access_header.clone())
            .store(store_from_config(config)?);

        if let Some(api_token) = &config.auth.api_token {
            builder = builder.api_token(api_token.clone());
        }

        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Stored session credentials
    pub fn credentials(&self) -> &SessionStore {
        self.inner.session.store()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().access_token().is_some()
    }

    /// Send a request, recovering once from an expired access token
    ///
    /// Statuses other than 401 are returned to the caller untouched. A 401 on
    /// the resubmitted request is final and reported as
    /// [`ClientError::AuthenticationFailed`].
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut attempt = Attempt::first();
        let mut access_token = self.credentials().access_token();

        loop {
            let response = self.dispatch(request, access_token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if !attempt.can_retry_auth() {
                warn!(retries = attempt.retries(), "request rejected after session recovery");
                return Err(ClientError::AuthenticationFailed(error_message(response).await));
            }

            debug!("access token rejected, recovering session");
            let fresh = self
                .inner
                .session
                .recover_access_token(access_token.as_deref())
                .await?;
            access_token = Some(fresh);
            attempt = attempt.next();
        }
    }

    /// Execute a request and decode a JSON response
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = check_status(self.send(request).await?).await?;
        Ok(response.json().await?)
    }

    /// Execute a request whose response body is irrelevant
    pub async fn execute_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        check_status(self.send(request).await?).await?;
        Ok(())
    }

    /// Execute a request and return the raw response body
    pub async fn execute_bytes(&self, request: &ApiRequest) -> Result<Bytes, ClientError> {
        let response = check_status(self.send(request).await?).await?;
        Ok(response.bytes().await?)
    }

    /// Execute without session credentials or recovery; used by the auth endpoints
    pub(crate) async fn execute_public<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        let response = check_status(self.dispatch(request, None).await?).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn execute_public_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        check_status(self.dispatch(request, None).await?).await?;
        Ok(())
    }

    /// Put the configured application token back after a logout cleared it
    pub(crate) fn seed_api_token(&self) -> Result<(), ClientError> {
        if let Some(api_token) = &self.inner.api_token
            && self.credentials().api_token().is_none()
        {
            self.credentials().set_api_token(api_token)?;
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = request.build(&self.inner.http, &self.inner.base_url)?;

        if let Some(api_token) = self.credentials().api_token() {
            builder = builder.bearer_auth(api_token);
        }
        if let Some(access_token) = access_token {
            builder = builder.header(
                self.inner.access_header.clone(),
                format!("Bearer {access_token}"),
            );
        }

        Ok(builder.send().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_status(status, error_message(response).await))
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    response.text().await.unwrap_or_else(|_| status.to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn store_from_config(config: &AdminConfig) -> Result<Arc<dyn CredentialStore>, ClientError> {
    match config.auth.store.kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::File => {
            let path = config.auth.store.resolved_path().ok_or_else(|| {
                ClientError::Configuration("no path available for the session file".into())
            })?;
            Ok(Arc::new(FileStore::open(path)?))
        }
        StoreKind::Browser => Err(ClientError::Configuration(
            "browser storage is only available on wasm32".into(),
        )),
    }
}

#[cfg(target_arch = "wasm32")]
fn store_from_config(config: &AdminConfig) -> Result<Arc<dyn CredentialStore>, ClientError> {
    match config.auth.store.kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Browser => Ok(Arc::new(BrowserStore)),
        StoreKind::File => Err(ClientError::Configuration(
            "file storage is not available on wasm32".into(),
        )),
    }
}

/// Builder for AdminClient
#[derive(Default)]
pub struct AdminClientBuilder {
    base_url: Option<String>,
    api_token: Option<String>,
    access_header: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl AdminClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the static application token, written to the credential store on build
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the header carrying the session access token
    #[must_use]
    pub fn access_header(mut self, name: impl Into<String>) -> Self {
        self.access_header = Some(name.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Persist credentials in the given store (in-memory by default)
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the HTTP token refresher
    #[must_use]
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Called when the session ends because it could not be refreshed
    #[must_use]
    pub fn on_session_expired(mut self, hook: impl Fn(&SessionError) + Send + Sync + 'static) -> Self {
        let hook: SessionExpiredHook = Arc::new(hook);
        self.on_session_expired = Some(hook);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AdminClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let access_header_name = self
            .access_header
            .unwrap_or_else(|| DEFAULT_ACCESS_HEADER.to_string());
        let access_header = HeaderName::from_bytes(access_header_name.as_bytes()).map_err(|_| {
            ClientError::Configuration(format!("invalid access header name: {access_header_name}"))
        })?;
        if access_header == reqwest::header::AUTHORIZATION {
            return Err(ClientError::Configuration(
                "access header must differ from the authorization header".into(),
            ));
        }

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent(concat!("storedesk/", env!("CARGO_PKG_VERSION")));
        }

        let http = client_builder.build()?;

        let store = SessionStore::new(
            self.store
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
        );
        if let Some(api_token) = &self.api_token {
            store.set_api_token(api_token)?;
        }

        let refresher = self.refresher.unwrap_or_else(|| {
            Arc::new(HttpTokenRefresher::new(
                http.clone(),
                base_url.clone(),
                store.clone(),
            ))
        });

        let mut session = SessionManager::new(store, refresher);
        if let Some(hook) = self.on_session_expired {
            session = session.with_expired_hook(hook);
        }

        Ok(AdminClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                access_header,
                api_token: self.api_token,
                session,
            }),
        })
    }
}

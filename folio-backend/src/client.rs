/// Shared backend client
///
/// `BackendClient` is the single connection point to the hosted backend. It
/// owns the HTTP client, the loaded configuration, the key mode (anonymous
/// or service-role), and the current user session. All higher layers (the
/// table query builder, the auth/storage/function APIs, and the domain
/// repositories) borrow this client rather than holding their own.
///
/// # Authorization
///
/// Every request carries the `apikey` header. The bearer token is the
/// session access token when a user is signed in, otherwise the key for the
/// client's mode. Timeouts are the HTTP client's defaults; this layer adds
/// no retry or timeout wrapper.
///
/// # Example
///
/// ```no_run
/// use folio_backend::client::BackendClient;
/// use folio_backend::config::BackendConfig;
///
/// # async fn example() -> Result<(), folio_backend::error::BackendError> {
/// let config = BackendConfig::from_env()?;
/// let client = BackendClient::new(config)?;
///
/// let rows: Vec<serde_json::Value> = client
///     .table("portfolios")
///     .select(&Default::default())
///     .await?;
/// # Ok(())
/// # }
/// ```

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::auth::{AuthApi, Session};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::functions::FunctionsApi;
use crate::query::TableQuery;
use crate::storage::StorageApi;

/// Which key the client authenticates with when no session is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Public anonymous key (user-facing clients)
    Anon,

    /// Privileged service-role key (trusted server-side use only)
    ServiceRole,
}

/// Client for the hosted backend
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
    mode: KeyMode,
    session: RwLock<Option<Session>>,
}

impl BackendClient {
    /// Creates an anonymous-key client
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        Self::with_mode(config, KeyMode::Anon)
    }

    /// Creates a service-role client
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no service-role key is configured.
    pub fn with_service_role(config: BackendConfig) -> BackendResult<Self> {
        if config.service_role_key.is_none() {
            return Err(BackendError::Config(
                "service-role client requires FOLIO_SERVICE_ROLE_KEY".to_string(),
            ));
        }
        Self::with_mode(config, KeyMode::ServiceRole)
    }

    fn with_mode(config: BackendConfig, mode: KeyMode) -> BackendResult<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(BackendClient {
            http,
            config,
            mode,
            session: RwLock::new(None),
        })
    }

    /// Returns the loaded configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Returns the client's key mode
    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Whether the serverless-function gateway is configured
    pub fn functions_configured(&self) -> bool {
        self.config.functions_url.is_some()
    }

    /// Replaces the current session
    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    /// Returns a copy of the current session, if any
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Returns the current session access token, if any
    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Key for the client's mode
    fn mode_key(&self) -> &str {
        match self.mode {
            KeyMode::Anon => &self.config.anon_key,
            // Presence enforced by the constructor.
            KeyMode::ServiceRole => self
                .config
                .service_role_key
                .as_deref()
                .unwrap_or(&self.config.anon_key),
        }
    }

    /// Builds a request with only the `apikey` header attached
    ///
    /// For callers that supply their own bearer token (session validation).
    pub(crate) fn keyed_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).header("apikey", self.mode_key())
    }

    /// Builds a request with `apikey` and bearer authorization attached
    pub(crate) async fn authed_request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = match self.access_token().await {
            Some(token) => token,
            None => self.mode_key().to_string(),
        };

        self.http
            .request(method, url)
            .header("apikey", self.mode_key())
            .bearer_auth(bearer)
    }

    /// Sends a request and maps non-2xx responses to [`BackendError::Api`]
    pub(crate) async fn send(&self, request: RequestBuilder) -> BackendResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = BackendError::api(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, "backend request rejected");
        Err(err)
    }

    /// Returns a query bound to one table
    pub fn table(&self, name: impl Into<String>) -> TableQuery<'_> {
        TableQuery::new(self, name)
    }

    /// Calls a stored procedure and decodes its result
    pub async fn rpc<P: Serialize, R: DeserializeOwned>(
        &self,
        function: &str,
        params: &P,
    ) -> BackendResult<R> {
        let url = self.config.rpc_url(function);
        let request = self.authed_request(Method::POST, &url).await.json(params);
        let response = self.send(request).await?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
    }

    /// Returns the auth API bound to this client
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Returns the storage API bound to this client
    pub fn storage(&self) -> StorageApi<'_> {
        StorageApi::new(self)
    }

    /// Returns the functions API bound to this client
    pub fn functions(&self) -> FunctionsApi<'_> {
        FunctionsApi::new(self)
    }
}

/// Serverless-function invocation
///
/// Functions run behind their own gateway and are invoked with the caller's
/// bearer token, so server-side code can act on the signed-in user.

use reqwest::Method;
use serde_json::Value;

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};

/// Functions API bound to a client
pub struct FunctionsApi<'a> {
    client: &'a BackendClient,
}

impl<'a> FunctionsApi<'a> {
    pub(crate) fn new(client: &'a BackendClient) -> Self {
        FunctionsApi { client }
    }

    /// Invokes a function with a JSON body and decodes the JSON response
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no functions gateway is
    /// configured, and an API error for any non-2xx response.
    pub async fn invoke(&self, name: &str, body: &Value) -> BackendResult<Value> {
        let base = self
            .client
            .config()
            .functions_url
            .as_deref()
            .ok_or_else(|| {
                BackendError::Config("functions gateway is not configured".to_string())
            })?;

        let url = format!("{}/{}", base, name);
        let request = self.client.authed_request(Method::POST, &url).await.json(body);
        let response = self.client.send(request).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

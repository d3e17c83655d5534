/// Object storage endpoints
///
/// Upload, removal, and signed-URL generation against the backend's object
/// store. Buckets are private; reads go through time-limited signed URLs
/// (default expiry one hour).

use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};

/// Default signed-URL expiry in seconds (1 hour)
pub const DEFAULT_SIGNED_URL_TTL: u32 = 3600;

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// Storage API bound to a client
pub struct StorageApi<'a> {
    client: &'a BackendClient,
}

impl<'a> StorageApi<'a> {
    pub(crate) fn new(client: &'a BackendClient) -> Self {
        StorageApi { client }
    }

    /// Uploads an object
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> BackendResult<()> {
        let url = self
            .client
            .config()
            .storage_url(&format!("object/{}/{}", bucket, path));
        let request = self
            .client
            .authed_request(Method::POST, &url)
            .await
            .header("Content-Type", content_type.to_string())
            .body(data);
        self.client.send(request).await.map(|_| ())
    }

    /// Removes an object
    pub async fn remove(&self, bucket: &str, path: &str) -> BackendResult<()> {
        let url = self
            .client
            .config()
            .storage_url(&format!("object/{}/{}", bucket, path));
        let request = self.client.authed_request(Method::DELETE, &url).await;
        self.client.send(request).await.map(|_| ())
    }

    /// Creates a time-limited signed URL for a private object
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u32,
    ) -> BackendResult<String> {
        let url = self
            .client
            .config()
            .storage_url(&format!("object/sign/{}/{}", bucket, path));
        let request = self
            .client
            .authed_request(Method::POST, &url)
            .await
            .json(&json!({ "expiresIn": expires_in }));
        let response = self.client.send(request).await?;

        let body = response.text().await?;
        let signed: SignedUrlResponse =
            serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))?;

        Ok(join_signed_url(
            &self.client.config().storage_url(""),
            &signed.signed_url,
        ))
    }
}

/// Joins the storage base with the relative signed path the backend returns
fn join_signed_url(storage_base: &str, signed_path: &str) -> String {
    format!(
        "{}/{}",
        storage_base.trim_end_matches('/'),
        signed_path.trim_start_matches('/')
    )
}

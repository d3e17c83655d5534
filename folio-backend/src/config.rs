/// Configuration for the hosted backend
///
/// This module loads backend connection settings from environment variables
/// and provides a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `FOLIO_BACKEND_URL`: Base URL of the hosted backend (required)
/// - `FOLIO_ANON_KEY`: Public/anonymous API key (required)
/// - `FOLIO_SERVICE_ROLE_KEY`: Privileged key for service-mode clients (optional)
/// - `FOLIO_FUNCTIONS_URL`: Base URL of the serverless-function gateway
///   (optional; remote task creation is disabled when unset)
///
/// # Example
///
/// ```no_run
/// use folio_backend::config::BackendConfig;
///
/// # fn example() -> Result<(), folio_backend::error::BackendError> {
/// let config = BackendConfig::from_env()?;
/// println!("Talking to {}", config.base_url);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::BackendError;

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend (no trailing slash)
    pub base_url: String,

    /// Public/anonymous API key
    ///
    /// Sent as the `apikey` header on every request and used as the bearer
    /// token until a user session is established.
    pub anon_key: String,

    /// Privileged service-role key
    ///
    /// Only present for service-mode clients. Never ship this key to a
    /// user-facing build.
    pub service_role_key: Option<String>,

    /// Base URL of the serverless-function gateway
    ///
    /// When unset, function-backed features (AI task creation) are disabled
    /// and their strategies report they cannot handle requests.
    pub functions_url: Option<String>,
}

impl BackendConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or empty.
    pub fn from_env() -> Result<Self, BackendError> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let base_url = env::var("FOLIO_BACKEND_URL")
            .map_err(|_| BackendError::Config("FOLIO_BACKEND_URL is required".to_string()))?;
        let anon_key = env::var("FOLIO_ANON_KEY")
            .map_err(|_| BackendError::Config("FOLIO_ANON_KEY is required".to_string()))?;
        let service_role_key = env::var("FOLIO_SERVICE_ROLE_KEY").ok().filter(|k| !k.is_empty());
        let functions_url = env::var("FOLIO_FUNCTIONS_URL").ok().filter(|u| !u.is_empty());

        Self::new(base_url, anon_key, service_role_key, functions_url)
    }

    /// Builds a configuration from explicit values
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or anon key is empty, or if the base
    /// URL is not an http(s) URL.
    pub fn new(
        base_url: String,
        anon_key: String,
        service_role_key: Option<String>,
        functions_url: Option<String>,
    ) -> Result<Self, BackendError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(BackendError::Config("backend URL must not be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(BackendError::Config(format!(
                "backend URL must be http(s), got '{}'",
                base_url
            )));
        }
        if anon_key.trim().is_empty() {
            return Err(BackendError::Config("anon key must not be empty".to_string()));
        }

        Ok(BackendConfig {
            base_url,
            anon_key,
            service_role_key,
            functions_url: functions_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    /// Returns the tabular REST endpoint for a table
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Returns the endpoint for a stored-procedure call
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    /// Returns an auth endpoint
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Returns a storage endpoint
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig::new(
            "https://backend.example.com/".to_string(),
            "anon-key".to_string(),
            None,
            Some("https://backend.example.com/functions/v1/".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let config = config();
        assert_eq!(config.base_url, "https://backend.example.com");
        assert_eq!(
            config.functions_url.as_deref(),
            Some("https://backend.example.com/functions/v1")
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let config = config();
        assert_eq!(config.rest_url("tasks"), "https://backend.example.com/rest/v1/tasks");
        assert_eq!(
            config.rpc_url("get_or_create_address"),
            "https://backend.example.com/rest/v1/rpc/get_or_create_address"
        );
        assert_eq!(config.auth_url("token"), "https://backend.example.com/auth/v1/token");
        assert_eq!(
            config.storage_url("object/task-attachments/a/b.jpg"),
            "https://backend.example.com/storage/v1/object/task-attachments/a/b.jpg"
        );
    }

    #[test]
    fn test_rejects_empty_values() {
        assert!(BackendConfig::new(String::new(), "k".into(), None, None).is_err());
        assert!(BackendConfig::new("https://x".into(), "  ".into(), None, None).is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = BackendConfig::new("ftp://x".into(), "k".into(), None, None);
        assert!(err.is_err());
    }
}

/// Auth provider endpoints
///
/// Thin wrappers over the hosted auth provider: password and OAuth sign-in,
/// sign-up, confirmation resend, sign-out, and server-side session
/// validation. Session bookkeeping (storing the session on the client,
/// forced sign-out) lives in the domain `AuthService`; this module only
/// speaks the wire protocol.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};

/// An authenticated user as reported by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned user id
    pub id: String,

    /// Email address, when known
    pub email: Option<String>,
}

/// A user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for authenticated requests
    pub access_token: String,

    /// Token used to obtain a fresh access token
    pub refresh_token: Option<String>,

    /// Access-token lifetime in seconds
    pub expires_in: Option<i64>,

    /// The authenticated user
    pub user: AuthUser,
}

/// Outcome of a sign-up call
///
/// When email confirmation is required the provider returns only the user;
/// otherwise it returns a full session.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The created user
    pub user: AuthUser,

    /// Session, when the account needs no confirmation
    pub session: Option<Session>,
}

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Azure,
    Github,
}

impl OAuthProvider {
    /// Provider name as used in the authorize URL
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Azure => "azure",
            OAuthProvider::Github => "github",
        }
    }
}

/// Auth API bound to a client
pub struct AuthApi<'a> {
    client: &'a BackendClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a BackendClient) -> Self {
        AuthApi { client }
    }

    /// Signs in with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let url = self.client.config().auth_url("token");
        let request = self
            .client
            .keyed_request(Method::POST, &url)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = self.client.send(request).await?;

        decode(response).await
    }

    /// Registers a new account
    pub async fn sign_up(&self, email: &str, password: &str) -> BackendResult<SignUpOutcome> {
        let url = self.client.config().auth_url("signup");
        let request = self
            .client
            .keyed_request(Method::POST, &url)
            .json(&json!({ "email": email, "password": password }));
        let response = self.client.send(request).await?;

        let body: serde_json::Value = decode(response).await?;

        // A session body carries the access token; a confirmation-pending
        // body is the bare user object.
        if body.get("access_token").is_some() {
            let session: Session =
                serde_json::from_value(body).map_err(|err| BackendError::Decode(err.to_string()))?;
            Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            })
        } else {
            let user: AuthUser =
                serde_json::from_value(body).map_err(|err| BackendError::Decode(err.to_string()))?;
            Ok(SignUpOutcome { user, session: None })
        }
    }

    /// Builds the browser redirect URL for an OAuth sign-in
    pub fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> BackendResult<String> {
        let base = self.client.config().auth_url("authorize");
        let mut params = vec![("provider", provider.as_str())];
        if let Some(redirect) = redirect_to {
            params.push(("redirect_to", redirect));
        }

        let url = Url::parse_with_params(&base, &params)
            .map_err(|err| BackendError::Config(err.to_string()))?;
        Ok(url.into())
    }

    /// Resends the sign-up confirmation email
    pub async fn resend_confirmation(&self, email: &str) -> BackendResult<()> {
        let url = self.client.config().auth_url("resend");
        let request = self
            .client
            .keyed_request(Method::POST, &url)
            .json(&json!({ "type": "signup", "email": email }));
        self.client.send(request).await.map(|_| ())
    }

    /// Revokes the current session on the server
    pub async fn sign_out(&self) -> BackendResult<()> {
        let url = self.client.config().auth_url("logout");
        let request = self.client.authed_request(Method::POST, &url).await;
        self.client.send(request).await.map(|_| ())
    }

    /// Fetches the user a token belongs to
    ///
    /// Used to re-validate a cached session against the server.
    pub async fn user(&self, access_token: &str) -> BackendResult<AuthUser> {
        let url = self.client.config().auth_url("user");
        let request = self
            .client
            .keyed_request(Method::GET, &url)
            .bearer_auth(access_token);
        let response = self.client.send(request).await?;

        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> BackendResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_provider_as_str() {
        assert_eq!(OAuthProvider::Google.as_str(), "google");
        assert_eq!(OAuthProvider::Azure.as_str(), "azure");
        assert_eq!(OAuthProvider::Github.as_str(), "github");
    }

    #[test]
    fn test_session_deserializes() {
        let session: Session = serde_json::from_str(
            r#"{
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 3600,
                "user": { "id": "u-1", "email": "a@b.c" }
            }"#,
        )
        .unwrap();

        assert_eq!(session.access_token, "at");
        assert_eq!(session.user.id, "u-1");
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }
}

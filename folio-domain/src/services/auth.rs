/// Auth service
///
/// Session orchestration over the backend auth provider: sign-in (password
/// and OAuth), sign-up, confirmation resend, sign-out, stale-session
/// defense, and profile self-healing.
///
/// # Stale sessions
///
/// A cached session can outlive its server-side validity or be tampered
/// with locally. `ensure_user_valid` re-validates against the server before
/// privileged operations and force-signs-out on any mismatch.

use std::sync::Arc;

use folio_backend::client::BackendClient;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::Profile;
use crate::repository::{Filter, QueryOptions};

pub use folio_backend::auth::{AuthUser, OAuthProvider, Session, SignUpOutcome};

/// Auth orchestration service
pub struct AuthService {
    client: Arc<BackendClient>,
}

impl AuthService {
    /// Creates the service over the shared client
    pub fn new(client: Arc<BackendClient>) -> Self {
        AuthService { client }
    }

    /// Returns the cached session, if any
    pub async fn current_session(&self) -> Option<Session> {
        self.client.session().await
    }

    /// Signs in with email and password and stores the session
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ServiceError> {
        let session = self.client.auth().sign_in_with_password(email, password).await?;
        self.client.set_session(Some(session.clone())).await;

        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Registers an account; stores the session when no confirmation is needed
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ServiceError> {
        let outcome = self.client.auth().sign_up(email, password).await?;
        if let Some(session) = &outcome.session {
            self.client.set_session(Some(session.clone())).await;
        }

        tracing::info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "signed up"
        );
        Ok(outcome)
    }

    /// Builds the browser redirect URL for an OAuth sign-in
    pub fn oauth_sign_in_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String, ServiceError> {
        let url = self.client.auth().oauth_authorize_url(provider, redirect_to)?;
        Ok(url)
    }

    /// Resends the sign-up confirmation email
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), ServiceError> {
        self.client.auth().resend_confirmation(email).await?;
        Ok(())
    }

    /// Signs out: revokes the server session best-effort, always clears local state
    pub async fn sign_out(&self) -> Result<(), ServiceError> {
        if self.client.session().await.is_some() {
            if let Err(err) = self.client.auth().sign_out().await {
                tracing::warn!(error = %err, "server-side sign-out failed");
            }
        }
        self.client.set_session(None).await;

        tracing::info!("signed out");
        Ok(())
    }

    /// Re-validates the cached session against the server
    ///
    /// Defends against stale or forged local tokens: the cached access
    /// token is presented to the server, and any failure or user-identity
    /// mismatch forces a sign-out.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when no session is cached or the server rejects
    /// the token; `Forbidden` when the server resolves the token to a
    /// different user.
    pub async fn ensure_user_valid(&self) -> Result<AuthUser, ServiceError> {
        let session = self
            .client
            .session()
            .await
            .ok_or(ServiceError::NotAuthenticated)?;

        match self.client.auth().user(&session.access_token).await {
            Ok(server_user) if server_user.id == session.user.id => Ok(server_user),
            Ok(server_user) => {
                tracing::warn!(
                    cached = %session.user.id,
                    server = %server_user.id,
                    "session user mismatch, forcing sign-out"
                );
                self.sign_out().await?;
                Err(ServiceError::Forbidden(
                    "session does not match server identity".to_string(),
                ))
            }
            Err(err) => {
                tracing::warn!(error = %err, "session validation failed, forcing sign-out");
                self.sign_out().await?;
                Err(ServiceError::NotAuthenticated)
            }
        }
    }

    /// Loads the signed-in user's profile, creating the row when absent
    ///
    /// The backend is supposed to create the profile row via a trigger on
    /// sign-up; when that lags, the idempotent insert here self-heals
    /// before the read.
    pub async fn load_user_profile(&self) -> Result<Profile, ServiceError> {
        let session = self
            .client
            .session()
            .await
            .ok_or(ServiceError::NotAuthenticated)?;

        let user_id = EntityId::new(session.user.id.clone())?;
        let email = session.user.email.clone().unwrap_or_default();

        let fresh = Profile::new(user_id.clone(), email);
        self.client
            .table("profiles")
            .insert_if_absent(&fresh, "user_id")
            .await?;

        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .limit(1);
        let mut rows: Vec<Profile> = self.client.table("profiles").select(&options).await?;
        rows.pop()
            .ok_or_else(|| ServiceError::NotFound("Profile".to_string()))
    }
}

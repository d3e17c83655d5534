/// Error handling for the domain layer
///
/// This module provides the unified error type returned by repositories and
/// services. Backend and transport failures pass through unchanged; the
/// other variants carry human-readable messages intended for UI display.
///
/// The not-found convention is deliberately uneven across services, per the
/// call-site contracts: `update_portfolio` on a missing id is an error,
/// `delete_portfolio` on a missing id is a silent no-op.

use folio_backend::error::BackendError;

/// Domain result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unified domain error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced entity does not exist ("Portfolio not found")
    #[error("{0} not found")]
    NotFound(String),

    /// A business rule or input validation was violated
    #[error("{0}")]
    Validation(String),

    /// The operation requires a signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The signed-in user may not perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The user's plan does not allow creating more tasks
    #[error("Task limit reached ({used}/{limit})")]
    QuotaExceeded { used: i64, limit: i64 },

    /// Every creation strategy failed
    #[error("Task creation failed: {0}")]
    CreationFailed(String),

    /// Backend or transport failure, propagated unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for '{}'", field),
                })
            })
            .collect();
        messages.sort();

        ServiceError::Validation(messages.join("; "))
    }
}

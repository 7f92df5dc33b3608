use std::collections::BTreeMap;

use crate::types::DbId;

/// Per-field validation messages, keyed by input field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Input failed validation on one or more named fields.
    #[error("Validation failed on {} field(s)", fields.len())]
    InvalidFields { fields: FieldErrors },

    /// The action is not valid from the complaint's current status. Also
    /// covers losing a race against a concurrent transition.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A uniqueness or write-once rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backing store failed mid-operation; nothing was applied.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build an [`CoreError::InvalidFields`] holding a single message.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name.to_string(), vec![message.into()]);
        CoreError::InvalidFields { fields }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(name, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{name} is invalid"))
                    })
                    .collect();
                (name.to_string(), messages)
            })
            .collect();
        CoreError::InvalidFields { fields }
    }
}

/// Domain-level error shared by every Hamro crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A client-side rule rejected user input. The message is meant for
    /// display as-is.
    #[error("{0}")]
    Validation(String),

    /// A wire payload could not be turned into a valid model.
    #[error("Invalid {entity}.{field}: {reason}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl CoreError {
    pub fn invalid(entity: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidField {
            entity,
            field,
            reason: reason.into(),
        }
    }

    pub fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::invalid(entity, field, "field is required")
    }
}

//! Error types for the report session.
//!
//! The generation lifecycle itself has no failure modes: `completed` and
//! `cancelled` are both normal outcomes. The errors here cover rejected user
//! input (unknown template, unknown filter, incomplete filter set) and
//! configuration problems.
//!
//! Errors are serializable so a presentation layer can show them without
//! knowing the Rust types.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for report session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No template with this id exists in the catalog.
    #[error("Unknown report template '{0}'")]
    UnknownTemplate(String),

    /// A filter was edited or generation requested before picking a template.
    #[error("No report template selected")]
    NoTemplateSelected,

    /// The filter id does not belong to the selected template.
    #[error("Filter '{filter}' is not defined for template '{template}'")]
    UnknownFilter { template: String, filter: String },

    /// Generation was requested while some filters are still unset.
    #[error("Missing values for filters: {}", .missing.join(", "))]
    IncompleteFilters { missing: Vec<String> },

    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    /// Internal error (e.g., no async runtime to drive the timer).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SessionError>,
    },
}

impl SessionError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SessionError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
            Self::NoTemplateSelected => "NO_TEMPLATE_SELECTED",
            Self::UnknownFilter { .. } => "UNKNOWN_FILTER",
            Self::IncompleteFilters { .. } => "INCOMPLETE_FILTERS",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the user can fix this error by editing the form.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnknownTemplate(_)
            | Self::NoTemplateSelected
            | Self::UnknownFilter { .. }
            | Self::IncompleteFilters { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as `{ code, message }`.
impl Serialize for SessionError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SessionError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, ConfigValidationError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SessionError::Config(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            SessionError::UnknownTemplate("payroll".to_string()).error_code(),
            "UNKNOWN_TEMPLATE"
        );
        assert_eq!(
            SessionError::IncompleteFilters {
                missing: vec!["region".to_string()]
            }
            .error_code(),
            "INCOMPLETE_FILTERS"
        );
        assert_eq!(
            SessionError::Config(ConfigValidationError::ZeroTickInterval).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_incomplete_filters_message_lists_missing() {
        let error = SessionError::IncompleteFilters {
            missing: vec!["region".to_string(), "productCategory".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Missing values for filters: region, productCategory"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SessionError::NoTemplateSelected.is_recoverable());
        assert!(
            SessionError::NoTemplateSelected
                .with_context("While generating")
                .is_recoverable()
        );
        assert!(!SessionError::Config(ConfigValidationError::ZeroRetention).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = SessionError::UnknownFilter {
            template: "sales".to_string(),
            filter: "warehouse".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("UNKNOWN_FILTER"));
        assert!(json.contains("warehouse"));
    }

    #[test]
    fn test_with_context() {
        let error =
            SessionError::UnknownTemplate("x".to_string()).with_context("Selecting template");
        assert!(error.to_string().contains("Selecting template"));
        assert_eq!(error.error_code(), "UNKNOWN_TEMPLATE");
    }
}

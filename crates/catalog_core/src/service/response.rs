//! Action envelope handed to presentation layers.
//!
//! The service never writes to an output stream; console or HTTP callers
//! render this envelope however they like.

use crate::service::catalog_service::{CatalogServiceError, FailureKind};

/// Outcome of one user-facing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Key of the affected record (ISBN or author id) on success.
    pub key: Option<String>,
    /// Failure class, `None` on success.
    pub failure: Option<FailureKind>,
    /// Human-readable message for display.
    pub message: String,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            ok: true,
            key: Some(key.into()),
            failure: None,
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            key: None,
            failure: Some(kind),
            message: message.into(),
        }
    }

    /// Builds an envelope from a service result.
    ///
    /// `key_of` extracts the record key reported on success.
    pub fn from_result<T>(
        result: Result<T, CatalogServiceError>,
        success_message: &str,
        key_of: impl FnOnce(&T) -> String,
    ) -> Self {
        match result {
            Ok(value) => Self::success(success_message, key_of(&value)),
            Err(err) => Self::failure(err.kind(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActionResponse;
    use crate::model::validation::ModelValidationError;
    use crate::service::catalog_service::{CatalogServiceError, FailureKind};

    #[test]
    fn from_result_reports_key_on_success() {
        let response = ActionResponse::from_result(
            Ok::<_, CatalogServiceError>(42_i64),
            "Author added.",
            |id| id.to_string(),
        );
        assert!(response.ok);
        assert_eq!(response.key.as_deref(), Some("42"));
        assert_eq!(response.failure, None);
    }

    #[test]
    fn from_result_classifies_failures() {
        let response = ActionResponse::from_result(
            Err::<i64, _>(CatalogServiceError::Validation(
                ModelValidationError::BlankField("title"),
            )),
            "unused",
            |id| id.to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.failure, Some(FailureKind::Validation));
        assert_eq!(response.message, "title must not be blank");
    }
}

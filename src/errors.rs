use reqwest::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

/// Every failure the data layer can observe, from local validation up to
/// transport problems.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Cannot edit {0} without an id")]
    MissingId(&'static str),

    #[error("Request failed with status code {}", .status.as_u16())]
    Http {
        status: StatusCode,
        detail: Option<String>,
        body: Option<serde_json::Value>,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Server-provided `detail`, else this error's own message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ClientError::Http {
            detail: Some(detail),
            ..
        } = self
        {
            if !detail.trim().is_empty() {
                return detail.clone();
            }
        }

        let own = self.to_string();
        if own.trim().is_empty() {
            fallback.to_string()
        } else {
            own
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_) | ClientError::MissingId(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Error context for structured logging of failed store operations
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    /// Log `err` at a level matching its kind and hand back the message a
    /// user should see.
    pub fn report(&self, err: &ClientError, fallback: &str) -> String {
        let message = err.user_message(fallback);
        if err.is_validation() {
            warn!(
                operation = %self.operation,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                error = %message,
                "Validation error"
            );
        } else {
            error!(
                operation = %self.operation,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                status = ?err.status(),
                error = %err,
                "Store operation failed"
            );
        }
        message
    }
}

/// Uniform outcome of a mutating store operation. Stores never return
/// `Err` across their public boundary; they resolve to this instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl ActionResult<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

impl<T> ActionResult<T> {
    pub fn ok_with(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The user said no. Not an error, so no message.
    pub fn declined() -> Self {
        Self {
            success: false,
            data: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_prefers_server_detail() {
        let err = ClientError::Http {
            status: StatusCode::BAD_REQUEST,
            detail: Some("Invalid credentials".to_string()),
            body: Some(json!({"detail": "Invalid credentials"})),
        };
        assert_eq!(err.user_message("Login failed."), "Invalid credentials");
    }

    #[test]
    fn test_user_message_falls_back_to_own_message() {
        let err = ClientError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: None,
            body: None,
        };
        assert_eq!(
            err.user_message("Error saving question."),
            "Request failed with status code 500"
        );

        let blank_detail = ClientError::Http {
            status: StatusCode::NOT_FOUND,
            detail: Some("  ".to_string()),
            body: None,
        };
        assert_eq!(
            blank_detail.user_message("x"),
            "Request failed with status code 404"
        );
    }

    #[test]
    fn test_user_message_generic_fallback() {
        let err = ClientError::Validation(String::new());
        assert_eq!(err.user_message("Error saving log."), "Error saving log.");
    }

    #[test]
    fn test_validation_classification() {
        assert!(ClientError::Validation("Title is required".into()).is_validation());
        assert!(ClientError::MissingId("question").is_validation());
        assert!(!ClientError::InvalidUrl("nope".into()).is_validation());
        assert_eq!(
            ClientError::MissingId("question").to_string(),
            "Cannot edit question without an id"
        );
    }

    #[test]
    fn test_action_result_shapes() {
        let ok = ActionResult::ok();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let declined: ActionResult = ActionResult::declined();
        assert!(!declined.success);
        assert!(declined.error.is_none());

        let failed: ActionResult<u32> = ActionResult::failed("boom");
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.data.is_none());

        assert_eq!(ActionResult::ok_with(7).data, Some(7));
    }

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("save_question", "question").with_id(12);
        assert_eq!(context.operation, "save_question");
        assert_eq!(context.resource_type, "question");
        assert_eq!(context.resource_id, Some("12".to_string()));

        let message = context.report(&ClientError::Validation("Title is required".into()), "x");
        assert_eq!(message, "Title is required");
    }
}

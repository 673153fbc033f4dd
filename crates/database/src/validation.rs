//! Input validation for transaction submissions.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::NewTransaction;

/// Receiver format: leading `+`, first digit 1-9, 4 to 15 digits in total.
static RECEIVER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{3,14}$").expect("receiver pattern is valid"));

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Receiver is not a `+`-prefixed phone number.
    InvalidReceiver(String),
}

impl ValidationError {
    /// Stable machine-readable code returned to API callers.
    pub fn code(&self) -> String {
        match self {
            ValidationError::Empty(field) => format!("required:{}", field),
            ValidationError::InvalidReceiver(_) => "regex:invalid-format".to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "`{}` is required", field),
            ValidationError::InvalidReceiver(receiver) => write!(
                f,
                "`receiver` format is invalid ({}) - format: +3069XXXXXXXX",
                receiver
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a receiver phone number.
pub fn validate_receiver(receiver: &str) -> Result<(), ValidationError> {
    if RECEIVER_PATTERN.is_match(receiver) {
        Ok(())
    } else {
        Err(ValidationError::InvalidReceiver(receiver.to_string()))
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    Ok(())
}

/// Validate a submission before it is stored.
///
/// Checks run in order: `message`, `sender`, then `receiver`, so the first
/// problem found is the one reported.
pub fn validate_submission(request: &NewTransaction) -> Result<(), ValidationError> {
    require("message", &request.message)?;
    require("sender", &request.sender)?;
    validate_receiver(&request.receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(receiver: &str, message: &str, sender: &str) -> NewTransaction {
        NewTransaction {
            receiver: receiver.to_string(),
            message: message.to_string(),
            sender: sender.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_receiver_valid() {
        assert!(validate_receiver("+306912345678").is_ok());
        assert!(validate_receiver("+1234").is_ok());
        assert!(validate_receiver("+123456789012345").is_ok());
    }

    #[test]
    fn test_validate_receiver_invalid() {
        // Missing plus sign
        assert!(matches!(
            validate_receiver("069123"),
            Err(ValidationError::InvalidReceiver(_))
        ));

        // Leading zero after the plus
        assert!(validate_receiver("+0691234567").is_err());

        // Too short and too long
        assert!(validate_receiver("+123").is_err());
        assert!(validate_receiver("+1234567890123456").is_err());

        // Non-digits
        assert!(validate_receiver("+30 691234567").is_err());
        assert!(validate_receiver("").is_err());
    }

    #[test]
    fn test_validate_submission() {
        assert!(validate_submission(&submission("+306912345678", "hi", "Test")).is_ok());

        assert_eq!(
            validate_submission(&submission("+306912345678", "", "Test")),
            Err(ValidationError::Empty("message".to_string()))
        );
        assert_eq!(
            validate_submission(&submission("+306912345678", "hi", "")),
            Err(ValidationError::Empty("sender".to_string()))
        );
        assert!(matches!(
            validate_submission(&submission("069123", "hi", "Test")),
            Err(ValidationError::InvalidReceiver(_))
        ));
    }

    #[test]
    fn test_validation_error_codes() {
        assert_eq!(
            ValidationError::Empty("message".to_string()).code(),
            "required:message"
        );
        assert_eq!(
            ValidationError::Empty("sender".to_string()).code(),
            "required:sender"
        );
        assert_eq!(
            ValidationError::InvalidReceiver("069123".to_string()).code(),
            "regex:invalid-format"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::Empty("message".to_string());
        assert_eq!(err.to_string(), "`message` is required");
    }
}

//! Input validation for display names and message text

use crate::error::{ChatError, Result};

/// Longest display name accepted at join time
pub const MAX_NAME_CHARS: usize = 32;
/// Longest message body accepted by the composer and the edit field
pub const MAX_BODY_CHARS: usize = 4000;

/// Validate a display name and return its trimmed form.
pub fn validate_display_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatError::Validation("Name cannot be empty".to_string()));
    }

    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ChatError::Validation(format!(
            "Name too long (max {} characters)",
            MAX_NAME_CHARS
        )));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ChatError::Validation(
            "Name contains invalid characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Validate a message body (new or edited) and return its trimmed form.
pub fn validate_body(body: &str) -> Result<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ChatError::Validation("Message cannot be empty".to_string()));
    }

    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ChatError::Validation(format!(
            "Message too long (max {} characters)",
            MAX_BODY_CHARS
        )));
    }

    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_trimmed() {
        assert_eq!(validate_display_name("  alice ").unwrap(), "alice");
        assert_eq!(validate_display_name("Bob Smith").unwrap(), "Bob Smith");
        assert_eq!(validate_display_name("ünïcødé").unwrap(), "ünïcødé");
    }

    #[test]
    fn test_display_name_rejected() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("bad\nname").is_err());
        assert!(validate_display_name(&"a".repeat(MAX_NAME_CHARS + 1)).is_err());
        assert!(validate_display_name(&"a".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_body() {
        assert_eq!(validate_body("  hi there \n").unwrap(), "hi there");
        assert!(validate_body(" \t ").is_err());
        assert!(validate_body(&"x".repeat(MAX_BODY_CHARS + 1)).is_err());
    }
}

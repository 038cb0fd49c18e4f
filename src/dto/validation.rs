//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest identifier accepted for quizzes and world cups.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Validates that a value contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a quiz or world cup identifier: not blank, bounded, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_identifier("bts_32_songs") // Ok
/// validate_identifier("   ")          // Err - blank
/// validate_identifier("bts\n")        // Err - control character
/// ```
pub fn validate_identifier(id: &str) -> Result<(), ValidationError> {
    validate_not_blank(id)?;

    if id.len() > MAX_IDENTIFIER_LEN {
        let mut err = ValidationError::new("identifier_length");
        err.message = Some(
            format!(
                "Identifier must be at most {MAX_IDENTIFIER_LEN} bytes (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_control) {
        let mut err = ValidationError::new("identifier_format");
        err.message = Some("Identifier must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Dynamite").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t").is_err());
    }

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("bts_32_songs").is_ok());
        assert!(validate_identifier("bts-mv-quiz").is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bts\n").is_err());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }
}

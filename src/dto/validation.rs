//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validates a platform identifier (post, community or user id) used inside store keys.
///
/// Ids are 1 to 64 ASCII alphanumerics, `_` or `-`. Key separators (`:`) are
/// refused so an id can never address another player's key.
///
/// # Examples
///
/// ```ignore
/// validate_identifier("t3_1abcd") // Ok
/// validate_identifier("t3:1abcd") // Err - separator
/// validate_identifier("")         // Err - empty
/// ```
pub fn validate_identifier(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_IDENTIFIER_LENGTH {
        let mut err = ValidationError::new("identifier_length");
        err.message = Some(
            format!(
                "Identifier must be 1 to {MAX_IDENTIFIER_LENGTH} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("identifier_format");
        err.message =
            Some("Identifier may only contain ASCII letters, digits, `_` and `-`".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a sprite selection is a frame index.
pub fn validate_frame(frame: &str) -> Result<(), ValidationError> {
    if frame.parse::<u32>().is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("frame_format");
        err.message = Some(format!("Frame must be a non-negative integer (got `{frame}`)").into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("t3_1abcd").is_ok());
        assert!(validate_identifier("t2_user-01").is_ok());
        assert!(validate_identifier(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid_length() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_identifier_invalid_format() {
        assert!(validate_identifier("t3:abc").is_err()); // key separator
        assert!(validate_identifier("t3 abc").is_err()); // space
        assert!(validate_identifier("t3_ébc").is_err()); // non-ascii
    }

    #[test]
    fn test_validate_frame() {
        assert!(validate_frame("0").is_ok());
        assert!(validate_frame("12").is_ok());
        assert!(validate_frame("-1").is_err());
        assert!(validate_frame("bird").is_err());
    }
}

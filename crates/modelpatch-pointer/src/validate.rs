//! Size limits for pointer text and token lists.

use crate::PointerError;

/// Maximum allowed pointer string length in bytes.
pub const MAX_POINTER_LENGTH: usize = 1024;

/// Maximum allowed number of tokens in a pointer.
pub const MAX_PATH_LENGTH: usize = 256;

/// Validate the outer syntax of pointer text before it is split.
///
/// # Errors
///
/// - the pointer is non-empty but doesn't start with `/`
/// - the pointer exceeds [`MAX_POINTER_LENGTH`]
///
/// # Example
///
/// ```
/// use modelpatch_pointer::validate_pointer_text;
///
/// validate_pointer_text("").unwrap();
/// validate_pointer_text("/items/0").unwrap();
/// validate_pointer_text("items/0").unwrap_err();
/// ```
pub fn validate_pointer_text(pointer: &str) -> Result<(), PointerError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(PointerError::PointerTooLong {
            max: MAX_POINTER_LENGTH,
        });
    }
    Ok(())
}

/// Validate the number of tokens in an already split pointer.
pub fn validate_tokens(tokens: &[String]) -> Result<(), PointerError> {
    if tokens.len() > MAX_PATH_LENGTH {
        return Err(PointerError::PathTooLong {
            max: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

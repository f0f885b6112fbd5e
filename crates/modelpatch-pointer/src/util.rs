//! Escaping and text-level helpers for pointer tokens.

use crate::PointerError;

/// Unescapes a single pointer token.
///
/// `~1` becomes `/` and `~0` becomes `~`. Any other character after `~`, or a
/// trailing `~`, is rejected. `offset` is the byte position of the token
/// inside `pointer` and is only used for error reporting.
pub fn unescape_component(
    component: &str,
    pointer: &str,
    offset: usize,
) -> Result<String, PointerError> {
    if !component.contains('~') {
        return Ok(component.to_string());
    }
    let mut out = String::with_capacity(component.len());
    let mut chars = component.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '0')) => out.push('~'),
            Some((_, '1')) => out.push('/'),
            Some((_, found)) => {
                return Err(PointerError::UnknownEscape {
                    pointer: pointer.to_string(),
                    found,
                    offset: offset + i,
                })
            }
            None => {
                return Err(PointerError::IncompleteEscape {
                    pointer: pointer.to_string(),
                    offset: offset + i,
                })
            }
        }
    }
    Ok(out)
}

/// Escapes a pointer token.
///
/// `~` is replaced with `~0` and `/` with `~1`.
///
/// # Example
///
/// ```
/// use modelpatch_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b/c"), "a~0b~1c");
/// assert_eq!(escape_component("plain"), "plain");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Format tokens into pointer text. The root (no tokens) formats as `""`.
pub fn format_pointer(tokens: &[String]) -> String {
    if tokens.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(tokens.iter().map(|t| t.len() + 1).sum());
    for token in tokens {
        out.push('/');
        out.push_str(&escape_component(token));
    }
    out
}

/// Check if a string represents a valid non-negative integer list index.
///
/// Leading zeros are not allowed (except for `"0"` itself).
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

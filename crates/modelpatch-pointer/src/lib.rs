//! JSON Pointer (RFC 6901) addressing for modelpatch.
//!
//! A [`Pointer`] is an ordered list of unescaped tokens. Parsing is strict:
//! an escape must be `~0` or `~1`, and non-root text must start with `/`.
//!
//! # Example
//!
//! ```
//! use modelpatch_pointer::{Pointer, Token};
//!
//! let pointer = Pointer::parse("/items/0/a~0b~1c").unwrap();
//! assert_eq!(pointer.tokens(), ["items", "0", "a~b/c"]);
//! assert_eq!(pointer.to_string(), "/items/0/a~0b~1c");
//!
//! let (_, last) = pointer.split_last().unwrap();
//! assert_eq!(Token::classify(last), Token::Name("a~b/c"));
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod token;
pub mod util;
pub mod validate;

pub use token::{Token, APPEND};
pub use util::{escape_component, format_pointer, is_valid_index, unescape_component};
pub use validate::{validate_pointer_text, validate_tokens, MAX_PATH_LENGTH, MAX_POINTER_LENGTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),
    #[error("incomplete escape sequence at byte {offset} in {pointer:?}")]
    IncompleteEscape { pointer: String, offset: usize },
    #[error("unrecognized escape '~{found}' at byte {offset} in {pointer:?}")]
    UnknownEscape {
        pointer: String,
        found: char,
        offset: usize,
    },
    #[error("pointer longer than {max} bytes")]
    PointerTooLong { max: usize },
    #[error("pointer has more than {max} tokens")]
    PathTooLong { max: usize },
}

/// An ordered sequence of unescaped tokens addressing a location in a
/// structured value. The empty pointer addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The root pointer (`""`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse pointer text.
    ///
    /// # Errors
    ///
    /// Fails on a missing leading `/`, an incomplete or unknown escape, or
    /// when the limits in [`validate`] are exceeded.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        validate_pointer_text(pointer)?;
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let mut tokens = Vec::new();
        let mut offset = 1;
        for component in pointer[1..].split('/') {
            tokens.push(unescape_component(component, pointer, offset)?);
            offset += component.len() + 1;
        }
        validate_tokens(&tokens)?;
        Ok(Self { tokens })
    }

    /// Build a pointer from already unescaped tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True for the empty pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// A new pointer with `token` appended.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend(self.tokens.iter().cloned());
        tokens.push(token.into());
        Self { tokens }
    }

    /// A new pointer addressing list position `index` under this one.
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Everything but the last token, and the last token.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.tokens
            .split_last()
            .map(|(last, init)| (init, last.as_str()))
    }

    /// The pointer to the enclosing location, `None` for the root.
    pub fn parent(&self) -> Option<Pointer> {
        self.split_last().map(|(init, _)| Pointer {
            tokens: init.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// True if `prefix` equals this pointer or is an ancestor of it.
    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.tokens.len() >= prefix.tokens.len()
            && self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
    }

    /// Check this pointer against the limits [`Pointer::parse`] enforces.
    /// Pointers grown with [`Pointer::child`] are not checked on the way.
    pub fn check_limits(&self) -> Result<(), PointerError> {
        validate_tokens(&self.tokens)?;
        let encoded: usize = self
            .tokens
            .iter()
            .map(|token| 1 + token.len() + token.bytes().filter(|b| matches!(b, b'~' | b'/')).count())
            .sum();
        if encoded > MAX_POINTER_LENGTH {
            return Err(PointerError::PointerTooLong {
                max: MAX_POINTER_LENGTH,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pointer(&self.tokens))
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_pointer_limits_match_parse() {
        let at_limit = Pointer::root().child("a".repeat(MAX_POINTER_LENGTH - 1));
        assert!(at_limit.check_limits().is_ok());
        assert!(Pointer::parse(&at_limit.to_string()).is_ok());

        // Escapes count at their encoded width.
        let escaped = Pointer::root().child("~".repeat(MAX_POINTER_LENGTH / 2));
        assert_eq!(
            escaped.check_limits(),
            Err(PointerError::PointerTooLong { max: MAX_POINTER_LENGTH })
        );
        assert!(Pointer::parse(&escaped.to_string()).is_err());

        let deep = Pointer::from_tokens((0..=MAX_PATH_LENGTH).map(|i| i.to_string()));
        assert_eq!(deep.check_limits(), Err(PointerError::PathTooLong { max: MAX_PATH_LENGTH }));
    }

    #[test]
    fn parse_root() {
        assert!(Pointer::parse("").unwrap().is_root());
    }

    #[test]
    fn parse_single_empty_token() {
        assert_eq!(Pointer::parse("/").unwrap().tokens(), [""]);
    }

    #[test]
    fn parse_nested_with_escapes() {
        let p = Pointer::parse("/a~0b/c~1d/1").unwrap();
        assert_eq!(p.tokens(), ["a~b", "c/d", "1"]);
    }

    #[test]
    fn parse_trailing_slashes() {
        assert_eq!(
            Pointer::parse("/foo///").unwrap().tokens(),
            ["foo", "", "", ""]
        );
    }

    #[test]
    fn parse_reports_offset_of_bad_escape() {
        assert_eq!(
            Pointer::parse("/ok/a~x"),
            Err(PointerError::UnknownEscape {
                pointer: "/ok/a~x".to_string(),
                found: 'x',
                offset: 5,
            })
        );
        assert_eq!(
            Pointer::parse("/ok~"),
            Err(PointerError::IncompleteEscape {
                pointer: "/ok~".to_string(),
                offset: 3,
            })
        );
    }

    #[test]
    fn parse_rejects_relative() {
        assert!(matches!(
            Pointer::parse("items/0"),
            Err(PointerError::MissingLeadingSlash(_))
        ));
    }

    #[test]
    fn parse_rejects_too_many_tokens() {
        let text = "/a".repeat(MAX_PATH_LENGTH + 1);
        assert_eq!(
            Pointer::parse(&text),
            Err(PointerError::PathTooLong {
                max: MAX_PATH_LENGTH
            })
        );
    }

    #[test]
    fn child_index_and_parent() {
        let items = Pointer::root().child("items");
        let second = items.index(1);
        assert_eq!(second.to_string(), "/items/1");
        assert_eq!(second.parent(), Some(items.clone()));
        assert_eq!(second.last(), Some("1"));
        assert!(second.starts_with(&items));
        assert!(!items.starts_with(&second));
        assert_eq!(Pointer::root().parent(), None);
    }

    #[test]
    fn display_roundtrip() {
        for text in ["", "/", "/foo", "/foo/bar", "/a~0b", "/c~1d", "/foo///"] {
            let p: Pointer = text.parse().unwrap();
            assert_eq!(p.to_string(), text, "roundtrip of {text:?}");
        }
    }
}

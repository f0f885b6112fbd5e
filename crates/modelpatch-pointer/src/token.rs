//! Classification of a single (already unescaped) pointer token.

use crate::util::is_valid_index;

/// The append sentinel: "one past the last element" of a list.
pub const APPEND: &str = "-";

/// What a raw token addresses once it meets a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A non-negative list index.
    Index(usize),
    /// The `-` sentinel.
    Append,
    /// A field name or map key.
    Name(&'a str),
}

impl<'a> Token<'a> {
    /// Classify a raw token.
    ///
    /// Index tokens follow RFC 6901 (`0` or a digit string without a leading
    /// zero). Digit strings too large for `usize` are treated as names so the
    /// caller reports them as unknown rather than silently wrapping.
    ///
    /// # Example
    ///
    /// ```
    /// use modelpatch_pointer::Token;
    ///
    /// assert_eq!(Token::classify("3"), Token::Index(3));
    /// assert_eq!(Token::classify("-"), Token::Append);
    /// assert_eq!(Token::classify("03"), Token::Name("03"));
    /// ```
    pub fn classify(raw: &'a str) -> Token<'a> {
        if raw == APPEND {
            return Token::Append;
        }
        if is_valid_index(raw) {
            if let Ok(idx) = raw.parse::<usize>() {
                return Token::Index(idx);
            }
        }
        Token::Name(raw)
    }

    /// True for [`Token::Index`] and [`Token::Append`].
    pub fn is_positional(&self) -> bool {
        matches!(self, Token::Index(_) | Token::Append)
    }
}

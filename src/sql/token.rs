//! Token model tying a `TokenKind` to its lexeme and source span.
//!
//! Tokens are immutable once the tokenizer produced them. Offsets are byte
//! offsets into the original SQL string and are what parse errors report.
use crate::sql::{keyword::Keyword, token_kind::TokenKind};

/// A lexical token.
///
/// Invariants:
/// - `end >= start`
/// - `[start, end)` is the raw source range, quotes included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier text, unescaped string value, number text or parameter name.
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Opening quote for quoted identifiers (`"`, `[` or `` ` ``).
    pub quote: Option<char>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
            quote: None,
        }
    }

    pub fn quoted(text: impl Into<String>, quote: char, start: usize, end: usize) -> Self {
        Self {
            quote: Some(quote),
            ..Self::new(TokenKind::QuotedIdent, text, start, end)
        }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenKind::Eof, "", position, position)
    }

    /// Source offset reported by errors.
    pub const fn position(&self) -> usize {
        self.start
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind.is_keyword(kw)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Returns the identifier text for plain or quoted identifiers.
    pub fn ident(&self) -> Option<&str> {
        self.kind.is_ident().then_some(self.text.as_str())
    }

    /// True if `next` starts exactly where this token ends.
    pub fn is_immediately_followed_by(&self, next: &Token) -> bool {
        self.end == next.start
    }

    /// True if `previous` ends exactly where this token starts.
    pub fn is_immediately_preceded_by(&self, previous: &Token) -> bool {
        previous.end == self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_access() {
        let t = Token::new(TokenKind::Ident, "Users", 0, 5);
        assert_eq!(t.ident(), Some("Users"));
        let q = Token::quoted("Order", '"', 6, 13);
        assert_eq!(q.ident(), Some("Order"));
        assert_eq!(q.quote, Some('"'));
        assert!(Token::new(TokenKind::String, "x", 0, 3).ident().is_none());
    }

    #[test]
    fn adjacency() {
        let a = Token::new(TokenKind::Ident, "count", 0, 5);
        let b = Token::new(TokenKind::LParen, "(", 5, 6);
        let c = Token::new(TokenKind::Ident, "x", 7, 8);
        assert!(a.is_immediately_followed_by(&b));
        assert!(b.is_immediately_preceded_by(&a));
        assert!(!b.is_immediately_followed_by(&c));
    }

    #[test]
    fn keyword_detection() {
        let t = Token::new(TokenKind::Keyword(Keyword::Select), "SELECT", 0, 6);
        assert!(t.is_keyword(Keyword::Select));
        assert!(!t.is_keyword(Keyword::From));
        assert_eq!(t.position(), 0);
    }
}

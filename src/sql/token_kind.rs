//! Token kind definitions for the SQL tokenizer.
//!
//! A `TokenKind` is a plain tag; the lexeme itself (identifier text, unescaped
//! string value, parameter name) lives on [`Token`](super::Token). Keeping the
//! kind `Copy` lets parsers pass kind sets around by value when scanning.

use crate::sql::keyword::Keyword;

/// Shape of a bind parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamStyle {
    /// `?`
    Anonymous,
    /// `$1`
    Positional,
    /// `:name`
    Colon,
    /// `@name`
    At,
}

/// Classification for a token produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unquoted identifier, case preserved.
    Ident,
    /// `"x"`, `[x]` or `` `x` `` identifier; the quote is kept on the token.
    QuotedIdent,
    /// Recognized SQL keyword.
    Keyword(Keyword),
    /// Single-quoted string; token text is the unescaped value.
    String,
    /// Integer or decimal literal, optionally with exponent.
    Number,
    /// Bind parameter.
    Param(ParamStyle),
    Comma,
    Dot,
    LParen,
    RParen,
    Semicolon,
    Star,
    Plus,
    Minus,
    Slash,
    Percent,
    /// `||`
    Concat,
    Eq,
    /// `<>` or `!=`
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `::`
    DoubleColon,
    /// A bare `:` that did not start a named parameter.
    Colon,
    /// End of input sentinel; always the last token.
    Eof,
}

impl TokenKind {
    /// True if this token is the given keyword.
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == kw)
    }

    /// True for plain and quoted identifiers.
    pub fn is_ident(&self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::QuotedIdent)
    }

    /// True for comparison operators.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Lte
                | TokenKind::Gt
                | TokenKind::Gte
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection() {
        let tk = TokenKind::Keyword(Keyword::Select);
        assert!(tk.is_keyword(Keyword::Select));
        assert!(!tk.is_keyword(Keyword::From));
        assert!(!tk.is_ident());
    }

    #[test]
    fn ident_classification() {
        assert!(TokenKind::Ident.is_ident());
        assert!(TokenKind::QuotedIdent.is_ident());
        assert!(!TokenKind::String.is_ident());
    }

    #[test]
    fn comparison_classification() {
        assert!(TokenKind::Lte.is_comparison());
        assert!(TokenKind::Ne.is_comparison());
        assert!(!TokenKind::Concat.is_comparison());
    }
}

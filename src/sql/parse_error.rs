use crate::sql::token::Token;

/// Fail-fast parse failure: a message and the byte offset it refers to.
///
/// Lexing problems (unterminated literals, malformed parameters) use the same
/// type so callers only ever handle one failure family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} @ {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Error anchored on a token; the token text is appended when present.
    pub fn at(message: impl Into<String>, token: &Token) -> Self {
        let message = message.into();
        let message = match token.text.is_empty() {
            true => format!("{message} (at end of input)"),
            false => format!("{message}: `{}`", token.text),
        };
        Self::new(message, token.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::token_kind::TokenKind;

    #[test]
    fn display_carries_position() {
        let err = ParseError::new("Unexpected token in ORDER BY item", 17);
        assert_eq!(err.to_string(), "Unexpected token in ORDER BY item @ 17");
    }

    #[test]
    fn anchored_on_token() {
        let tok = Token::new(TokenKind::Ident, "foo", 4, 7);
        let err = ParseError::at("unexpected token", &tok);
        assert_eq!(err.position, 4);
        assert!(err.message.contains("`foo`"));
        let eof = ParseError::at("expected END", &Token::eof(9));
        assert!(eof.message.contains("end of input"));
    }
}

//! Lexical layer: keywords, tokens, the tokenizer and the token [`Cursor`].
//!
//! Modules:
//! - `keyword`     : case-insensitive keyword table.
//! - `token_kind`  : `Copy` classification of lexical atoms.
//! - `token`       : token struct pairing a kind with its lexeme and span.
//! - `tokenizer`   : single pass tokenizer, fails fast on malformed literals.
//! - `cursor`      : windowed reader used by every parser.
//! - `parse_error` : the `(message, position)` failure shared by lexer and parsers.
//!
//! ```rust
//! use sqlscope::sql::prelude::*;
//!
//! let tokens = tokenize("SELECT a, b FROM my_table").unwrap();
//! assert!(tokens.iter().any(|t| t.is_keyword(Keyword::Select)));
//! assert!(tokens.iter().any(|t| t.ident() == Some("my_table")));
//! ```

pub mod cursor;
pub mod keyword;
pub mod parse_error;
pub mod token;
pub mod token_kind;
pub mod tokenizer;

pub use cursor::Cursor;
pub use keyword::Keyword;
pub use parse_error::{ParseError, ParseResult};
pub use token::Token;
pub use token_kind::{ParamStyle, TokenKind};
pub use tokenizer::tokenize;

/// Convenience prelude re-exporting the most commonly used items.
pub mod prelude {
    pub use super::{Cursor, Keyword, ParseError, Token, TokenKind, tokenize};
}

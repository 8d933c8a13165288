use crate::trace;
use crate::sql::{
    keyword::Keyword,
    parse_error::{ParseError, ParseResult},
    token::Token,
    token_kind::{ParamStyle, TokenKind},
};

/// SQL tokenizer producing a flat stream of `Token`s that always ends in
/// [`TokenKind::Eof`].
///
/// Behavior:
/// - Skips whitespace, `--` line comments and `/* */` block comments.
/// - `'...'` strings unescape doubled quotes (`'O''Reilly'` -> `O'Reilly`).
/// - `"..."`, `[...]` and `` `...` `` are quoted identifiers, each escaped by
///   doubling its own closing quote.
/// - Words are upper-cased once for keyword lookup; non-keywords keep their
///   original case as `Ident`.
/// - Parameters: `?`, `$<digits>`, `:<ident>`, `@<ident>`.
///
/// Unterminated strings, quoted identifiers and block comments fail
/// immediately with the offset of the opening character.
pub fn tokenize(sql: &str) -> ParseResult<Vec<Token>> {
    let mut lexer = Lexer { src: sql, pos: 0 };
    let mut out = Vec::new();
    loop {
        lexer.skip_trivia()?;
        let Some(c) = lexer.peek() else {
            out.push(Token::eof(sql.len()));
            break;
        };
        out.push(lexer.token(c)?);
    }
    trace!(tokens = out.len(), "tokenized");
    Ok(out)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('-'), Some('-')) => self.eat_while(|c| c != '\n'),
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    match self.src[self.pos + 2..].find("*/") {
                        Some(offset) => self.pos += 2 + offset + 2,
                        None => return Err(ParseError::new("unterminated block comment", start)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.bump();
        Token::new(kind, &self.src[start..self.pos], start, self.pos)
    }

    fn double(&mut self, kind: TokenKind, start: usize) -> Token {
        self.bump();
        self.single(kind, start)
    }

    fn token(&mut self, c: char) -> ParseResult<Token> {
        let start = self.pos;
        let next = self.peek_at(1);
        let token = match c {
            '\'' => {
                let value = self.delimited('\'', '\'', "unterminated string")?;
                Token::new(TokenKind::String, value, start, self.pos)
            }
            '"' => {
                let value = self.delimited('"', '"', "unterminated quoted identifier")?;
                Token::quoted(value, '"', start, self.pos)
            }
            '[' => {
                let value = self.delimited('[', ']', "unterminated quoted identifier")?;
                Token::quoted(value, '[', start, self.pos)
            }
            '`' => {
                let value = self.delimited('`', '`', "unterminated quoted identifier")?;
                Token::quoted(value, '`', start, self.pos)
            }
            c if c.is_ascii_digit() => self.number(start),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => self.number(start),
            c if is_ident_start(c) => {
                self.eat_while(is_ident_char);
                let text = &self.src[start..self.pos];
                let kind = Keyword::from_upper(&text.to_uppercase())
                    .map(TokenKind::Keyword)
                    .unwrap_or(TokenKind::Ident);
                Token::new(kind, text, start, self.pos)
            }
            '?' => self.single(TokenKind::Param(ParamStyle::Anonymous), start),
            '$' => {
                self.bump();
                if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(ParseError::new("invalid parameter: expected digits after `$`", start));
                }
                self.eat_while(|c| c.is_ascii_digit());
                Token::new(
                    TokenKind::Param(ParamStyle::Positional),
                    &self.src[start + 1..self.pos],
                    start,
                    self.pos,
                )
            }
            ':' if next == Some(':') => self.double(TokenKind::DoubleColon, start),
            ':' if next.is_some_and(is_ident_start) => self.named_param(ParamStyle::Colon, start),
            ':' => self.single(TokenKind::Colon, start),
            '@' if next.is_some_and(is_ident_start) => self.named_param(ParamStyle::At, start),
            '@' => {
                return Err(ParseError::new(
                    "invalid parameter: expected identifier after `@`",
                    start,
                ));
            }
            '<' if next == Some('=') => self.double(TokenKind::Lte, start),
            '<' if next == Some('>') => self.double(TokenKind::Ne, start),
            '>' if next == Some('=') => self.double(TokenKind::Gte, start),
            '!' if next == Some('=') => self.double(TokenKind::Ne, start),
            '|' if next == Some('|') => self.double(TokenKind::Concat, start),
            '<' => self.single(TokenKind::Lt, start),
            '>' => self.single(TokenKind::Gt, start),
            '=' => self.single(TokenKind::Eq, start),
            ',' => self.single(TokenKind::Comma, start),
            '.' => self.single(TokenKind::Dot, start),
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            ';' => self.single(TokenKind::Semicolon, start),
            '*' => self.single(TokenKind::Star, start),
            '+' => self.single(TokenKind::Plus, start),
            '-' => self.single(TokenKind::Minus, start),
            '/' => self.single(TokenKind::Slash, start),
            '%' => self.single(TokenKind::Percent, start),
            other => return Err(ParseError::new(format!("unexpected character `{other}`"), start)),
        };
        Ok(token)
    }

    /// Reads a quoted run starting at the opening quote. A doubled closing
    /// quote is an escaped literal quote.
    fn delimited(&mut self, open: char, close: char, unterminated: &str) -> ParseResult<String> {
        let start = self.pos;
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::new(unterminated, start)),
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        self.bump();
                        value.push(close);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// `digits [. digits] [e [+-] digits]` or `. digits [e ...]`.
    fn number(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_ascii_digit());
        let fraction = self
            .peek_at(1)
            .is_none_or(|c| c.is_ascii_digit() || !is_ident_start(c));
        if self.peek() == Some('.') && fraction {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        Token::new(TokenKind::Number, &self.src[start..self.pos], start, self.pos)
    }

    fn named_param(&mut self, style: ParamStyle, start: usize) -> Token {
        self.bump();
        self.eat_while(is_ident_char);
        Token::new(
            TokenKind::Param(style),
            &self.src[start + 1..self.pos],
            start,
            self.pos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn basic_select_sequence() {
        let toks = tokenize("SELECT a, b FROM t").unwrap();
        assert!(toks[0].is_keyword(Keyword::Select));
        assert_eq!(toks[1].ident(), Some("a"));
        assert!(toks[2].is(TokenKind::Comma));
        assert!(toks[4].is_keyword(Keyword::From));
        assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn keywords_are_case_insensitive_identifiers_keep_case() {
        let toks = tokenize("select From MyTable").unwrap();
        assert!(toks[0].is_keyword(Keyword::Select));
        assert!(toks[1].is_keyword(Keyword::From));
        assert_eq!(toks[2].ident(), Some("MyTable"));
    }

    #[test]
    fn doubled_quote_escaping_in_strings() {
        let toks = tokenize("'O''Reilly'").unwrap();
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].text, "O'Reilly");
        assert_eq!((toks[0].start, toks[0].end), (0, 11));
    }

    #[rstest]
    #[case(r#""my ""col""""#, "my \"col\"", '"')]
    #[case("[weird]]name]", "weird]name", '[')]
    #[case("`back``tick`", "back`tick", '`')]
    fn quoted_identifier_styles(#[case] sql: &str, #[case] text: &str, #[case] quote: char) {
        let toks = tokenize(sql).unwrap();
        assert_eq!(toks[0].kind, TokenKind::QuotedIdent);
        assert_eq!(toks[0].text, text);
        assert_eq!(toks[0].quote, Some(quote));
    }

    #[rstest]
    #[case("42", "42")]
    #[case("3.14", "3.14")]
    #[case(".5", ".5")]
    #[case("1e10", "1e10")]
    #[case("2.5E-3", "2.5E-3")]
    fn numeric_literals(#[case] sql: &str, #[case] text: &str) {
        let toks = tokenize(sql).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].text, text);
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn qualified_name_with_number_is_not_decimal() {
        assert_eq!(
            kinds("t.a"),
            vec![TokenKind::Ident, TokenKind::Dot, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(
            kinds("<= >= <> != || :: < > ="),
            vec![
                TokenKind::Lte,
                TokenKind::Gte,
                TokenKind::Ne,
                TokenKind::Ne,
                TokenKind::Concat,
                TokenKind::DoubleColon,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn parameter_styles() {
        let toks = tokenize("? $12 :name @user").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Param(ParamStyle::Anonymous));
        assert_eq!((toks[1].kind, toks[1].text.as_str()), (TokenKind::Param(ParamStyle::Positional), "12"));
        assert_eq!((toks[2].kind, toks[2].text.as_str()), (TokenKind::Param(ParamStyle::Colon), "name"));
        assert_eq!((toks[3].kind, toks[3].text.as_str()), (TokenKind::Param(ParamStyle::At), "user"));
    }

    #[test]
    fn bare_colon_falls_through_as_punctuation() {
        assert_eq!(kinds(": x"), vec![TokenKind::Colon, TokenKind::Ident, TokenKind::Eof]);
    }

    #[rstest]
    #[case("'abc", "unterminated string", 0)]
    #[case("SELECT \"abc", "unterminated quoted identifier", 7)]
    #[case("[abc", "unterminated quoted identifier", 0)]
    #[case("a /* never closed", "unterminated block comment", 2)]
    #[case("@1", "invalid parameter", 0)]
    #[case("x = $a", "invalid parameter", 4)]
    #[case("a # b", "unexpected character", 2)]
    fn lexing_failures(#[case] sql: &str, #[case] message: &str, #[case] position: usize) {
        let err = tokenize(sql).unwrap_err();
        assert!(err.message.contains(message), "{err}");
        assert_eq!(err.position, position);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a -- trailing\n/* block */ b"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }
}

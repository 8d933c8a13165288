//! Repositionable view over a token slice.
//!
//! Parsers never copy token vectors: a [`Cursor`] borrows a window of the
//! token stream and hands out narrower windows for sub-expressions. Every
//! window behaves as if it ended with an EOF sentinel positioned right after
//! its last token, so lookahead up to the sentinel never fails.

use crate::sql::{
    keyword::Keyword,
    parse_error::{ParseError, ParseResult},
    token::Token,
    token_kind::TokenKind,
};

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    eof: Token,
    base: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Wraps a full token stream as produced by `tokenize`.
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        let (eof, body) = match tokens.split_last() {
            Some((last, body)) if last.is(TokenKind::Eof) => (last.clone(), body),
            _ => (Token::eof(source.len()), tokens),
        };
        Self {
            source,
            tokens: body,
            eof,
            base: 0,
            pos: 0,
        }
    }

    /// Number of tokens in this window, sentinel excluded.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Offset of this window's first token within the original stream.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    /// Current token; the sentinel once the window is exhausted.
    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    /// Token `n` positions ahead. The sentinel is readable, anything past it
    /// is an "out of tokens" failure.
    pub fn peek_at(&self, n: usize) -> ParseResult<&Token> {
        let index = self.pos + n;
        match index.cmp(&self.tokens.len()) {
            std::cmp::Ordering::Less => Ok(&self.tokens[index]),
            std::cmp::Ordering::Equal => Ok(&self.eof),
            std::cmp::Ordering::Greater => Err(ParseError::new("out of tokens", self.eof.position())),
        }
    }

    /// Kind of the token `n` ahead, `Eof` past the end.
    pub fn kind_at(&self, n: usize) -> TokenKind {
        self.peek_at(n).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// Consumes the current token. Fails when only the sentinel is left.
    pub fn advance(&mut self) -> ParseResult<&'a Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token)
            }
            None => Err(ParseError::new("out of tokens", self.eof.position())),
        }
    }

    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, mark: usize) {
        self.pos = mark.min(self.tokens.len());
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    /// Consumes the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub fn eat_keyword(&mut self, kw: Keyword) -> bool {
        self.eat(TokenKind::Keyword(kw))
    }

    pub fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<&'a Token> {
        if self.is(kind) {
            return self.advance();
        }
        Err(self.error(message))
    }

    pub fn expect_keyword(&mut self, kw: Keyword, message: &str) -> ParseResult<()> {
        self.expect(TokenKind::Keyword(kw), message).map(|_| ())
    }

    /// Error anchored on the current token.
    pub fn error(&self, message: &str) -> ParseError {
        ParseError::at(message, self.peek())
    }

    /// Fails unless the window is fully consumed.
    pub fn expect_end(&self, message: &str) -> ParseResult<()> {
        match self.is_at_end() {
            true => Ok(()),
            false => Err(self.error(message)),
        }
    }

    /// Index (relative to this window) of the first token from the current
    /// position whose kind is in `targets`, skipping anything nested in
    /// parentheses or `CASE ... END`. Returns `len()` if absent.
    pub fn find(&self, targets: &[TokenKind]) -> usize {
        self.scan(|token, depth| depth == 0 && targets.contains(&token.kind))
    }

    /// Generic depth-aware scan: returns the first index where `hit` is true.
    /// `hit` sees the nesting depth *before* the token is applied.
    pub fn scan(&self, mut hit: impl FnMut(&Token, usize) -> bool) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            if hit(token, depth) {
                return i;
            }
            match token.kind {
                TokenKind::LParen | TokenKind::Keyword(Keyword::Case) => depth += 1,
                TokenKind::RParen | TokenKind::Keyword(Keyword::End) => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    /// All top-level indices matching `targets`, in order.
    pub fn find_all(&self, targets: &[TokenKind]) -> Vec<usize> {
        let mut ahead = self.clone();
        let mut out = Vec::new();
        loop {
            let at = ahead.find(targets);
            if at >= ahead.len() {
                return out;
            }
            out.push(at);
            ahead.pos = at + 1;
        }
    }

    /// Splits the remaining tokens wherever `is_separator` holds, dropping
    /// the separators. Consumes the window; empty parts are kept.
    pub fn split(&mut self, mut is_separator: impl FnMut(&Token, usize) -> bool) -> Vec<Cursor<'a>> {
        let mut parts = Vec::new();
        loop {
            let at = self.scan(&mut is_separator);
            parts.push(self.advance_to(at));
            if self.is_at_end() {
                return parts;
            }
            self.pos += 1;
        }
    }

    /// [`Cursor::split`] on a top-level token kind, e.g. commas of a list.
    pub fn split_on(&mut self, kind: TokenKind) -> Vec<Cursor<'a>> {
        self.split(|token, depth| depth == 0 && token.is(kind))
    }

    /// Tokens from the current position to the end of the window.
    pub fn remaining_tokens(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    /// Splits `[position, end)` off into its own window and moves this
    /// cursor to `end`. The child keeps the absolute base offset.
    pub fn advance_to(&mut self, end: usize) -> Cursor<'a> {
        let end = end.clamp(self.pos, self.tokens.len());
        let child = self.window(self.pos, end);
        self.pos = end;
        child
    }

    /// Remaining tokens as their own window, consuming them.
    pub fn rest(&mut self) -> Cursor<'a> {
        self.advance_to(self.tokens.len())
    }

    fn window(&self, start: usize, end: usize) -> Cursor<'a> {
        let eof_at = self
            .tokens
            .get(end)
            .map(Token::position)
            .unwrap_or(self.eof.position());
        Cursor {
            source: self.source,
            tokens: &self.tokens[start..end],
            eof: Token::eof(eof_at),
            base: self.base + start,
            pos: 0,
        }
    }

    /// Strips one pair of parentheses if it wraps the whole remaining window
    /// (the matching `)` is the last token before the sentinel). Otherwise the
    /// cursor is returned unchanged, so `(a, b) IN (...)` keeps its left list.
    pub fn remove_brackets(self) -> Cursor<'a> {
        if !self.is(TokenKind::LParen) || self.remaining() < 2 {
            return self;
        }
        let mut depth = 0usize;
        for i in self.pos..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        if i + 1 == self.tokens.len() {
                            return self.window(self.pos + 1, i);
                        }
                        return self;
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// Index of the `)` matching the `(` at the current position.
    pub fn matching_paren(&self) -> Option<usize> {
        if !self.is(TokenKind::LParen) {
            return None;
        }
        let mut depth = 0usize;
        for i in self.pos..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Source text spanned by the remaining tokens.
    pub fn remaining_text(&self) -> &'a str {
        match (self.tokens.get(self.pos), self.tokens.last()) {
            (Some(first), Some(last)) => &self.source[first.start..last.end],
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::tokenizer::tokenize;

    fn with_cursor<T>(sql: &str, f: impl FnOnce(Cursor<'_>) -> T) -> T {
        let tokens = tokenize(sql).unwrap();
        f(Cursor::new(sql, &tokens))
    }

    #[test]
    fn eof_is_readable_but_not_consumable() {
        with_cursor("a", |mut cur| {
            assert_eq!(cur.peek().ident(), Some("a"));
            assert!(cur.peek_at(1).unwrap().is(TokenKind::Eof));
            assert!(cur.peek_at(2).is_err());
            cur.advance().unwrap();
            assert!(cur.is(TokenKind::Eof));
            let err = cur.advance().unwrap_err();
            assert_eq!(err.message, "out of tokens");
        });
    }

    #[test]
    fn find_skips_nested_commas() {
        with_cursor("f(a, b), c", |cur| {
            assert_eq!(cur.find(&[TokenKind::Comma]), 6);
            assert_eq!(cur.find_all(&[TokenKind::Comma]), vec![6]);
            assert_eq!(cur.find(&[TokenKind::Semicolon]), cur.len());
        });
    }

    #[test]
    fn find_skips_case_bodies() {
        with_cursor("CASE WHEN a AND b THEN 1 END AND c", |cur| {
            let at = cur.find(&[TokenKind::Keyword(Keyword::And)]);
            assert_eq!(at, 8);
        });
    }

    #[test]
    fn advance_to_keeps_base_and_moves_parent() {
        with_cursor("a , b c", |mut cur| {
            cur.advance().unwrap();
            cur.advance().unwrap();
            let child = cur.advance_to(3);
            assert_eq!(child.len(), 1);
            assert_eq!(child.base(), 2);
            assert_eq!(child.peek().ident(), Some("b"));
            assert!(child.peek_at(1).unwrap().is(TokenKind::Eof));
            assert_eq!(child.peek_at(1).unwrap().position(), 6);
            assert_eq!(cur.position(), 3);
            assert_eq!(cur.peek().ident(), Some("c"));
        });
    }

    #[test]
    fn remove_brackets_only_strips_enclosing_pair() {
        with_cursor("(a = 1)", |cur| {
            let inner = cur.remove_brackets();
            assert_eq!(inner.len(), 3);
            assert_eq!(inner.base(), 1);
        });
        with_cursor("(a, b) IN ((1, 2))", |cur| {
            let same = cur.remove_brackets();
            assert_eq!(same.len(), 13);
            assert_eq!(same.base(), 0);
        });
    }

    #[test]
    fn split_on_top_level_commas() {
        with_cursor("a, f(b, c), (d, e),", |mut cur| {
            let parts = cur.split_on(TokenKind::Comma);
            let texts: Vec<_> = parts.iter().map(|p| p.remaining_text()).collect();
            assert_eq!(texts, ["a", "f(b, c)", "(d, e)", ""]);
            assert!(cur.is_at_end());
        });
    }

    #[test]
    fn mark_and_restore() {
        with_cursor("a b c", |mut cur| {
            let mark = cur.mark();
            cur.advance().unwrap();
            cur.advance().unwrap();
            cur.restore(mark);
            assert_eq!(cur.peek().ident(), Some("a"));
            assert_eq!(cur.remaining_text(), "a b c");
        });
    }
}

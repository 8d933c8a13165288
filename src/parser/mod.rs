//! Recursive-descent parsers from token windows to AST nodes.
//!
//! Every sub-parser takes a [`Cursor`] and either consumes its whole window
//! or moves it past what it recognised; the public entry points below
//! tokenize a string and insist the entire input is used.
//!
//! ```
//! use sqlscope::parse_query;
//!
//! let query = parse_query("select id from users where id = $1;").unwrap();
//! assert_eq!(query.to_string(), "SELECT id FROM users WHERE id = $1");
//! ```

mod column;
mod expression;
mod filter;
mod join;
mod order;
mod query;
mod roundtrip_tests;
mod table;

pub(crate) use self::{
    column::{column, select_list},
    expression::{expression, whole_expression},
    filter::filter,
    join::{from_clause, join},
    order::{group_item, order_item},
    query::query,
    table::table,
};

use crate::*;

/// Parser bound to a dialect. The dialect only restricts identifier quoting;
/// unsupported constructs are left to the validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    dialect: Dialect,
}

impl Parser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn query(&self, sql: &str) -> ParseResult<Query> {
        self.run(sql, query)
    }

    pub fn filter(&self, sql: &str) -> ParseResult<Filter> {
        self.run(sql, filter)
    }

    pub fn column(&self, sql: &str) -> ParseResult<Column> {
        self.run(sql, column)
    }

    pub fn expression(&self, sql: &str) -> ParseResult<Expression> {
        self.run(sql, |mut cur| {
            let expr = expression(&mut cur)?;
            cur.expect_end("Unexpected token after expression")?;
            Ok(expr)
        })
    }

    pub fn table(&self, sql: &str) -> ParseResult<Table> {
        self.run(sql, table)
    }

    /// Parses a single join clause such as `LEFT JOIN b ON a.id = b.id`.
    pub fn join(&self, sql: &str) -> ParseResult<Join> {
        self.run(sql, |mut cur| {
            let join = join(&mut cur)?;
            cur.expect_end("Unexpected token after join")?;
            Ok(join)
        })
    }

    pub fn group_item(&self, sql: &str) -> ParseResult<GroupItem> {
        self.run(sql, group_item)
    }

    pub fn order_item(&self, sql: &str) -> ParseResult<OrderItem> {
        self.run(sql, order_item)
    }

    fn run<T>(&self, sql: &str, parse: impl FnOnce(Cursor<'_>) -> ParseResult<T>) -> ParseResult<T> {
        let tokens = tokenize(sql)?;
        let quotes = self.dialect.capabilities().identifier_quotes;
        if let Some(token) = tokens
            .iter()
            .find(|t| t.quote.is_some_and(|q| t.is(TokenKind::QuotedIdent) && !quotes.contains(&q)))
        {
            return Err(ParseError::at(
                format!("quoted identifier style not supported by {}", self.dialect),
                token,
            ));
        }
        let mut cur = Cursor::new(sql, &tokens);
        // A single trailing `;` terminates the statement.
        let end = match cur.len().checked_sub(1) {
            Some(last) if cur.kind_at(last) == TokenKind::Semicolon => last,
            _ => cur.len(),
        };
        let body = cur.advance_to(end);
        if body.is_empty() {
            return Err(body.error("Empty input"));
        }
        parse(body)
    }
}

pub fn parse_query(sql: &str) -> ParseResult<Query> {
    Parser::new(Dialect::Ansi).query(sql)
}

pub fn parse_filter(sql: &str) -> ParseResult<Filter> {
    Parser::new(Dialect::Ansi).filter(sql)
}

pub fn parse_column(sql: &str) -> ParseResult<Column> {
    Parser::new(Dialect::Ansi).column(sql)
}

pub fn parse_expression(sql: &str) -> ParseResult<Expression> {
    Parser::new(Dialect::Ansi).expression(sql)
}

pub fn parse_table(sql: &str) -> ParseResult<Table> {
    Parser::new(Dialect::Ansi).table(sql)
}

pub fn parse_join(sql: &str) -> ParseResult<Join> {
    Parser::new(Dialect::Ansi).join(sql)
}

pub fn parse_group_item(sql: &str) -> ParseResult<GroupItem> {
    Parser::new(Dialect::Ansi).group_item(sql)
}

pub fn parse_order_item(sql: &str) -> ParseResult<OrderItem> {
    Parser::new(Dialect::Ansi).order_item(sql)
}

/// Identifier text of the current token, accepting non-reserved keywords
/// (`first`, `rows`, ...) as names.
pub(crate) fn identifier(cur: &mut Cursor<'_>, message: &str) -> ParseResult<String> {
    let token = cur.peek();
    let name = match token.kind {
        TokenKind::Ident | TokenKind::QuotedIdent => token.text.clone(),
        TokenKind::Keyword(kw) if !kw.is_reserved() => token.text.clone(),
        _ => return Err(cur.error(message)),
    };
    cur.advance()?;
    Ok(name)
}

/// True if the current token could start an alias without `AS`.
pub(crate) fn at_bare_alias(cur: &Cursor<'_>) -> bool {
    matches!(cur.peek().kind, TokenKind::Ident | TokenKind::QuotedIdent)
}

/// `[AS] alias`; `None` if no alias follows.
pub(crate) fn alias(cur: &mut Cursor<'_>) -> ParseResult<Option<String>> {
    if cur.eat_keyword(Keyword::As) {
        return identifier(cur, "Expected alias after AS").map(Some);
    }
    match at_bare_alias(cur) {
        true => identifier(cur, "Expected alias").map(Some),
        false => Ok(None),
    }
}

/// `(a, b, c)` identifier list; the cursor must sit on `(`.
pub(crate) fn identifier_list(cur: &mut Cursor<'_>, what: &str) -> ParseResult<Vec<String>> {
    let mut inner = parenthesized(cur, &format!("Expected ( before {what}"))?;
    let mut names = Vec::new();
    for mut part in inner.split_on(TokenKind::Comma) {
        names.push(identifier(&mut part, &format!("Expected name in {what}"))?);
        part.expect_end(&format!("Unexpected token in {what}"))?;
    }
    Ok(names)
}

/// Consumes `( ... )` and returns the window between the parentheses.
pub(crate) fn parenthesized<'a>(cur: &mut Cursor<'a>, message: &str) -> ParseResult<Cursor<'a>> {
    let close = cur.matching_paren().ok_or_else(|| cur.error(message))?;
    cur.advance()?;
    let inner = cur.advance_to(close);
    cur.expect(TokenKind::RParen, "Expected )")?;
    Ok(inner)
}

/// Splits a comma list, rejecting empty items.
pub(crate) fn comma_list<'a>(cur: &mut Cursor<'a>, what: &str) -> ParseResult<Vec<Cursor<'a>>> {
    let parts = cur.split_on(TokenKind::Comma);
    match parts.iter().find(|p| p.is_empty()) {
        Some(empty) => Err(empty.error(&format!("Expected {what}"))),
        None => Ok(parts),
    }
}

/// True if the window starts a query (`SELECT`, `WITH`, or a parenthesized one).
pub(crate) fn starts_query(cur: &Cursor<'_>) -> bool {
    let mut offset = 0;
    while cur.kind_at(offset) == TokenKind::LParen {
        offset += 1;
    }
    matches!(
        cur.kind_at(offset),
        TokenKind::Keyword(Keyword::Select) | TokenKind::Keyword(Keyword::With)
    )
}

use super::*;

/// One `FROM`/`JOIN` source filling the whole window.
pub(crate) fn table(mut cur: Cursor<'_>) -> ParseResult<Table> {
    if cur.is_at_end() {
        return Err(cur.error("Expected table"));
    }
    let lateral = cur.eat_keyword(Keyword::Lateral);
    let table = match cur.peek().kind {
        TokenKind::LParen => derived(&mut cur, lateral)?,
        TokenKind::Ident | TokenKind::QuotedIdent => named_or_function(&mut cur, lateral)?,
        TokenKind::Keyword(kw) if !kw.is_reserved() => named_or_function(&mut cur, lateral)?,
        _ => return Err(cur.error("Expected table")),
    };
    cur.expect_end("Unexpected token after table")?;
    Ok(table)
}

fn named_or_function(cur: &mut Cursor<'_>, lateral: bool) -> ParseResult<Table> {
    let start = cur.mark();
    let first = identifier(cur, "Expected table name")?;
    let (schema, name) = match cur.eat(TokenKind::Dot) {
        true => (Some(first), identifier(cur, "Expected table name after .")?),
        false => (None, first),
    };
    if let Some(close) = cur.matching_paren() {
        // Re-read `[schema.]name(...)` as a call expression.
        cur.restore(start);
        let mut window = cur.advance_to(close + 1);
        let Expression::Function(call) = expression(&mut window)? else {
            return Err(window.error("Expected table function"));
        };
        window.expect_end("Unexpected token after table function")?;
        return Ok(Table::Function {
            call,
            alias: alias(cur)?,
            column_aliases: column_aliases(cur)?,
            lateral,
        });
    }
    if lateral {
        return Err(cur.error("LATERAL requires a subquery or function"));
    }
    Ok(Table::Named {
        schema,
        name,
        alias: alias(cur)?,
    })
}

fn derived(cur: &mut Cursor<'_>, lateral: bool) -> ParseResult<Table> {
    let mut inner = parenthesized(cur, "Unbalanced parentheses")?;
    if inner.eat_keyword(Keyword::Values) {
        if lateral {
            return Err(inner.error("LATERAL cannot apply to VALUES"));
        }
        let rows = comma_list(&mut inner, "VALUES row")?
            .into_iter()
            .map(values_row)
            .collect::<ParseResult<Vec<_>>>()?;
        return Ok(Table::Values {
            rows,
            alias: alias(cur)?,
            column_aliases: column_aliases(cur)?,
        });
    }
    if !starts_query(&inner) {
        return Err(inner.error("Expected subquery or VALUES"));
    }
    let query = query(inner)?;
    Ok(Table::Query {
        query: Box::new(query),
        alias: alias(cur)?,
        column_aliases: column_aliases(cur)?,
        lateral,
    })
}

fn values_row(mut row: Cursor<'_>) -> ParseResult<Vec<Expression>> {
    let mut values = parenthesized(&mut row, "Expected ( for VALUES row")?;
    row.expect_end("Unexpected token after VALUES row")?;
    comma_list(&mut values, "VALUES item")?
        .into_iter()
        .map(whole_expression)
        .collect()
}

fn column_aliases(cur: &mut Cursor<'_>) -> ParseResult<Vec<String>> {
    match cur.is(TokenKind::LParen) {
        true => identifier_list(cur, "column alias list"),
        false => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users", "users")]
    #[case("public.users AS u", "public.users AS u")]
    #[case("users u", "users AS u")]
    #[case("(SELECT id FROM users) AS d", "(SELECT id FROM users) AS d")]
    #[case("LATERAL (SELECT 1) x(n)", "LATERAL (SELECT 1) AS x(n)")]
    #[case("(VALUES (1, 'a'), (2, 'b')) AS v(id, name)", "(VALUES (1, 'a'), (2, 'b')) AS v(id, name)")]
    #[case("generate_series(1, 3) AS g(n)", "generate_series(1, 3) AS g(n)")]
    #[case("pg_catalog.generate_series(1, 3) g", "pg_catalog.generate_series(1, 3) AS g")]
    fn parses_sources(#[case] sql: &str, #[case] expected: &str) {
        assert_eq!(parse_table(sql).unwrap().to_string(), expected);
    }

    #[test]
    fn derived_table_flags() {
        let table = parse_table("LATERAL (SELECT 1) AS x").unwrap();
        assert!(table.is_derived());
        assert!(table.is_lateral());
        assert_eq!(table.reference_name(), Some("x"));
    }

    #[rstest]
    #[case("users u extra", "Unexpected token after table")]
    #[case("(1, 2)", "Expected subquery or VALUES")]
    #[case("LATERAL users", "LATERAL requires")]
    #[case("(VALUES 1)", "Expected ( for VALUES row")]
    fn failures(#[case] sql: &str, #[case] message: &str) {
        let err = parse_table(sql).unwrap_err();
        assert!(err.message.contains(message), "{sql}: {err}");
    }
}

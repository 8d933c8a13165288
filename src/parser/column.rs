use super::*;

/// One select-list item: `*`, `t.*`, or an expression with an optional alias.
pub(crate) fn column(mut cur: Cursor<'_>) -> ParseResult<Column> {
    if cur.is(TokenKind::Star) {
        cur.advance()?;
        cur.expect_end("Unexpected token after *")?;
        return Ok(Column::Star { table: None });
    }
    if cur.kind_at(1) == TokenKind::Dot && cur.kind_at(2) == TokenKind::Star {
        let table = identifier(&mut cur, "Expected table name before .*")?;
        cur.advance()?;
        cur.advance()?;
        cur.expect_end("Unexpected token after .*")?;
        return Ok(Column::Star { table: Some(table) });
    }
    let expr = expression(&mut cur)?;
    let alias = alias(&mut cur)?;
    cur.expect_end("Unexpected token after column")?;
    Ok(Column::from_expression(expr, alias))
}

pub(crate) fn select_list(cur: &mut Cursor<'_>) -> ParseResult<Vec<Column>> {
    if cur.is_empty() {
        return Err(cur.error("Expected select list"));
    }
    comma_list(cur, "select item")?.into_iter().map(column).collect()
}

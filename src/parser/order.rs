use super::*;

/// A bare unsigned integer is a select-list ordinal; anything else is an
/// expression.
fn key(expr: Expression, position: usize) -> ParseResult<GroupItem> {
    match &expr {
        Expression::Literal(Literal::Number(n)) if n.bytes().all(|b| b.is_ascii_digit()) => n
            .parse()
            .map(GroupItem::Ordinal)
            .map_err(|_| ParseError::new(format!("Ordinal {n} is out of range"), position)),
        _ => Ok(GroupItem::Expression(expr)),
    }
}

pub(crate) fn group_item(cur: Cursor<'_>) -> ParseResult<GroupItem> {
    let position = cur.peek().position();
    key(whole_expression(cur)?, position)
}

pub(crate) fn order_item(mut cur: Cursor<'_>) -> ParseResult<OrderItem> {
    if cur.is_at_end() {
        return Err(cur.error("Expected ORDER BY item"));
    }
    let position = cur.peek().position();
    let mut item = OrderItem::new(key(expression(&mut cur)?, position)?);
    if cur.eat_keyword(Keyword::Asc) {
        item.direction = Some(Direction::Asc);
    } else if cur.eat_keyword(Keyword::Desc) {
        item.direction = Some(Direction::Desc);
    }
    if cur.eat_keyword(Keyword::Nulls) {
        item.nulls = match cur.peek().kind {
            TokenKind::Keyword(Keyword::First) => Some(NullsOrder::First),
            TokenKind::Keyword(Keyword::Last) => Some(NullsOrder::Last),
            _ => return Err(cur.error("Expected FIRST or LAST after NULLS")),
        };
        cur.advance()?;
    }
    cur.expect_end("Unexpected token in ORDER BY item")?;
    Ok(item)
}

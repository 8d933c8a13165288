//! Predicates. `OR` binds loosest, then `AND`, then a `NOT` prefix; the
//! `AND` of `BETWEEN x AND y` never splits a conjunction.
use super::*;

const fn kw(keyword: Keyword) -> TokenKind {
    TokenKind::Keyword(keyword)
}

/// Parses a predicate filling the whole window.
pub(crate) fn filter(mut cur: Cursor<'_>) -> ParseResult<Filter> {
    if cur.is_at_end() {
        return Err(cur.error("Expected predicate"));
    }
    let disjuncts = cur.split(|token, depth| depth == 0 && token.is_keyword(Keyword::Or));
    let filters = disjuncts
        .into_iter()
        .map(conjunction)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Filter::or(filters))
}

fn conjunction(mut cur: Cursor<'_>) -> ParseResult<Filter> {
    let mut in_between = false;
    let conjuncts = cur.split(|token, depth| {
        if depth > 0 {
            return false;
        }
        match token.kind {
            TokenKind::Keyword(Keyword::Between) => {
                in_between = true;
                false
            }
            TokenKind::Keyword(Keyword::And) if in_between => {
                in_between = false;
                false
            }
            TokenKind::Keyword(Keyword::And) => true,
            _ => false,
        }
    });
    let filters = conjuncts
        .into_iter()
        .map(negation)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Filter::and(filters))
}

fn negation(mut cur: Cursor<'_>) -> ParseResult<Filter> {
    if cur.is_at_end() {
        return Err(cur.error("Expected predicate"));
    }
    if cur.is_keyword(Keyword::Not) && cur.kind_at(1) != kw(Keyword::Exists) {
        cur.advance()?;
        return negation(cur).map(Filter::not);
    }
    atom(cur)
}

fn atom(mut cur: Cursor<'_>) -> ParseResult<Filter> {
    let stripped = cur.clone().remove_brackets();
    if stripped.len() != cur.len() && !starts_query(&stripped) {
        return filter(stripped);
    }
    if cur.eat_keyword(Keyword::Exists) {
        return exists(cur, false);
    }
    if cur.is_keyword(Keyword::Not) && cur.kind_at(1) == kw(Keyword::Exists) {
        cur.advance()?;
        cur.advance()?;
        return exists(cur, true);
    }
    if let Some(tuple) = tuple(&mut cur)? {
        return Ok(tuple);
    }
    predicate(cur)
}

fn exists(mut cur: Cursor<'_>, negated: bool) -> ParseResult<Filter> {
    let inner = parenthesized(&mut cur, "Expected ( after EXISTS")?;
    cur.expect_end("Unexpected token after EXISTS")?;
    Ok(Filter::Exists {
        query: Box::new(query(inner)?),
        negated,
    })
}

/// `(a, b) [NOT] IN (...)`; `None` if the window is some other predicate.
fn tuple(cur: &mut Cursor<'_>) -> ParseResult<Option<Filter>> {
    if !cur.is(TokenKind::LParen) {
        return Ok(None);
    }
    let position = cur.peek().position();
    let mut ahead = cur.clone();
    let mut inner = parenthesized(&mut ahead, "Unbalanced parentheses")?;
    let op = match (ahead.peek().kind, ahead.kind_at(1)) {
        (k, _) if k == kw(Keyword::In) => TupleOperator::In,
        (k, next) if k == kw(Keyword::Not) && next == kw(Keyword::In) => TupleOperator::NotIn,
        _ => return Ok(None),
    };
    if starts_query(&inner) {
        return Ok(None);
    }
    let columns = comma_list(&mut inner, "tuple column")?
        .into_iter()
        .map(whole_expression)
        .collect::<ParseResult<Vec<_>>>()?;
    if columns.len() < 2 {
        return Err(ParseError::new("Tuple filter requires at least two columns", position));
    }
    ahead.eat_keyword(Keyword::Not);
    ahead.expect_keyword(Keyword::In, "Expected IN")?;
    let values = tuple_values(&mut ahead)?;
    ahead.expect_end("Unexpected token after tuple list")?;
    *cur = ahead;
    TupleFilter::new(columns, op, values)
        .map(|t| Some(Filter::Tuple(t)))
        .map_err(|message| ParseError::new(message, position))
}

fn tuple_values(cur: &mut Cursor<'_>) -> ParseResult<Values> {
    let mut inner = parenthesized(cur, "Expected ( after IN")?;
    if starts_query(&inner) {
        return Ok(Values::Subquery(Box::new(query(inner)?)));
    }
    let rows = comma_list(&mut inner, "tuple row")?
        .into_iter()
        .map(tuple_row)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Values::Tuples(rows))
}

fn tuple_row(mut row: Cursor<'_>) -> ParseResult<Vec<Expression>> {
    if !row.is(TokenKind::LParen) {
        return Err(row.error("Expected ( for tuple row"));
    }
    let mut values = parenthesized(&mut row, "Unbalanced tuple row")?;
    row.expect_end("Unexpected token after tuple row")?;
    comma_list(&mut values, "tuple value")?
        .into_iter()
        .map(whole_expression)
        .collect()
}

fn comparison(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::Eq => Some(Operator::Eq),
        TokenKind::Ne => Some(Operator::Ne),
        TokenKind::Lt => Some(Operator::Lt),
        TokenKind::Lte => Some(Operator::Lte),
        TokenKind::Gt => Some(Operator::Gt),
        TokenKind::Gte => Some(Operator::Gte),
        _ => None,
    }
}

fn predicate(mut cur: Cursor<'_>) -> ParseResult<Filter> {
    let column = expression(&mut cur)?;
    if cur.is_at_end() {
        return Ok(Filter::Expression(column));
    }
    let filter = if let Some(op) = comparison(cur.peek().kind) {
        cur.advance()?;
        Filter::column(column, op, Some(operand(&mut cur)?))
    } else if cur.eat_keyword(Keyword::Is) {
        let op = match cur.eat_keyword(Keyword::Not) {
            true => Operator::IsNotNull,
            false => Operator::IsNull,
        };
        cur.expect_keyword(Keyword::Null, "Expected NULL after IS")?;
        Filter::column(column, op, None)
    } else {
        let negated = cur.eat_keyword(Keyword::Not);
        let pick = |plain: Operator, not: Operator| if negated { not } else { plain };
        match cur.peek().kind {
            TokenKind::Keyword(Keyword::In) => {
                cur.advance()?;
                let values = in_values(&mut cur)?;
                Filter::column(column, pick(Operator::In, Operator::NotIn), Some(values))
            }
            TokenKind::Keyword(Keyword::Like) => {
                cur.advance()?;
                let pattern = operand(&mut cur)?;
                Filter::column(column, pick(Operator::Like, Operator::NotLike), Some(pattern))
            }
            TokenKind::Keyword(Keyword::Ilike) => {
                cur.advance()?;
                let pattern = operand(&mut cur)?;
                Filter::column(column, pick(Operator::ILike, Operator::NotILike), Some(pattern))
            }
            TokenKind::Keyword(Keyword::Between) => {
                cur.advance()?;
                let low = expression(&mut cur)?;
                cur.expect_keyword(Keyword::And, "Expected AND in BETWEEN")?;
                let high = expression(&mut cur)?;
                let range = Filter::column(column, Operator::Range, Some(Values::Range(low, high)));
                match negated {
                    true => Filter::not(range),
                    false => range,
                }
            }
            _ => return Err(cur.error("Unexpected token in predicate")),
        }
    };
    cur.expect_end("Unexpected token in predicate")?;
    Ok(filter)
}

/// Right-hand side of a comparison: a column, a subquery or any other value.
fn operand(cur: &mut Cursor<'_>) -> ParseResult<Values> {
    Ok(match expression(cur)? {
        Expression::Column(column) => Values::Column(column),
        Expression::Subquery(query) => Values::Subquery(query),
        other => Values::Single(other),
    })
}

fn in_values(cur: &mut Cursor<'_>) -> ParseResult<Values> {
    let mut inner = parenthesized(cur, "Expected ( after IN")?;
    if starts_query(&inner) {
        return Ok(Values::Subquery(Box::new(query(inner)?)));
    }
    let values = comma_list(&mut inner, "IN value")?
        .into_iter()
        .map(whole_expression)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Values::List(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn and_binds_tighter_than_or() {
        let filter = parse_filter("a = 1 OR b = 2 AND c = 3").unwrap();
        let Filter::Composite(or) = &filter else {
            panic!("expected composite, got {filter:?}");
        };
        assert_eq!(or.op(), Logical::Or);
        assert_eq!(or.filters().len(), 2);
        assert!(matches!(&or.filters()[1], Filter::Composite(and) if and.op() == Logical::And));
        assert_eq!(filter.to_string(), "a = 1 OR b = 2 AND c = 3");
    }

    #[test]
    fn not_binds_tighter_than_and_tighter_than_or() {
        let filter =
            parse_filter("a IN ('A','B') AND (b BETWEEN 10 AND 20 OR NOT c LIKE '%x%')").unwrap();
        let Filter::Composite(and) = &filter else {
            panic!("expected composite, got {filter:?}");
        };
        assert_eq!(Logical::And, and.op());
        assert_eq!(2, and.filters().len());
        let Filter::Composite(or) = &and.filters()[1] else {
            panic!("expected disjunction, got {:?}", and.filters()[1]);
        };
        assert_eq!(Logical::Or, or.op());
        assert_eq!(2, or.filters().len());
        let Filter::Composite(not) = &or.filters()[1] else {
            panic!("expected negation, got {:?}", or.filters()[1]);
        };
        assert_eq!(Logical::Not, not.op());
        assert_eq!(1, not.filters().len());
        assert!(matches!(&not.filters()[0], Filter::Column { op: Operator::Like, .. }));
    }

    #[test]
    fn in_list() {
        let filter = parse_filter("category IN (1, 2, 3)").unwrap();
        let Filter::Column {
            op,
            values: Some(Values::List(list)),
            ..
        } = &filter
        else {
            panic!("expected IN list, got {filter:?}");
        };
        assert_eq!(*op, Operator::In);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn tuple_in() {
        let filter = parse_filter("(a, b) IN ((1, 2), (3, 4))").unwrap();
        let Filter::Tuple(tuple) = &filter else {
            panic!("expected tuple, got {filter:?}");
        };
        assert_eq!(tuple.columns().len(), 2);
        assert_eq!(tuple.op(), TupleOperator::In);
        assert!(matches!(tuple.values(), Values::Tuples(rows) if rows.len() == 2));
    }

    #[test]
    fn between_and_does_not_split() {
        let filter = parse_filter("a BETWEEN 1 AND 5 AND b = 2").unwrap();
        let Filter::Composite(and) = &filter else {
            panic!("expected conjunction");
        };
        assert_eq!(and.filters().len(), 2);
        assert!(matches!(&and.filters()[0], Filter::Column { op: Operator::Range, .. }));
    }

    #[rstest]
    #[case("a NOT BETWEEN 1 AND 5", "NOT a BETWEEN 1 AND 5")]
    #[case("NOT (a = 1 OR b = 2)", "NOT (a = 1 OR b = 2)")]
    #[case("(a = 1 OR b = 2) AND c = 3", "(a = 1 OR b = 2) AND c = 3")]
    #[case("((a = 1))", "a = 1")]
    #[case("name ILIKE 'j%'", "name ILIKE 'j%'")]
    #[case("name NOT LIKE '%x'", "name NOT LIKE '%x'")]
    #[case("deleted_at IS NOT NULL", "deleted_at IS NOT NULL")]
    #[case("u.id = o.user_id", "u.id = o.user_id")]
    #[case("id NOT IN (SELECT user_id FROM bans)", "id NOT IN (SELECT user_id FROM bans)")]
    #[case("NOT EXISTS (SELECT 1 FROM t WHERE t.a = b)", "NOT EXISTS (SELECT 1 FROM t WHERE t.a = b)")]
    #[case("(a, b) NOT IN (SELECT x, y FROM t)", "(a, b) NOT IN (SELECT x, y FROM t)")]
    #[case("(a + 1) * 2 > 3", "(a + 1) * 2 > 3")]
    #[case("(SELECT count(*) FROM t) > 0", "(SELECT count(*) FROM t) > 0")]
    #[case("active", "active")]
    #[case("total >= $1 AND status <> :status", "total >= $1 AND status <> :status")]
    fn renders_canonically(#[case] sql: &str, #[case] expected: &str) {
        assert_eq!(parse_filter(sql).unwrap().to_string(), expected);
    }

    #[test]
    fn right_column_is_a_column_value() {
        let filter = parse_filter("a.x = b.y").unwrap();
        assert!(matches!(filter, Filter::Column { values: Some(Values::Column(_)), .. }));
    }

    #[rstest]
    #[case("(a) IN ((1))", "at least two columns", 0)]
    #[case("(a, b) IN ((1, 2), (3))", "arity", 0)]
    #[case("a = 1 AND", "Expected predicate", 9)]
    #[case("a IS 1", "Expected NULL after IS", 5)]
    #[case("a BETWEEN 1", "Expected AND in BETWEEN", 11)]
    #[case("a = 1 b", "Unexpected token in predicate", 6)]
    #[case("a IN ()", "Expected IN value", 6)]
    fn failures(#[case] sql: &str, #[case] message: &str, #[case] position: usize) {
        let err = parse_filter(sql).unwrap_err();
        assert!(err.message.contains(message), "{sql}: {err}");
        assert_eq!(err.position, position, "{sql}: {err}");
    }
}

//! Value expressions by precedence climbing: `||` binds loosest, then
//! `+ -`, then `* / %`, then unary signs, then `::` casts.
use super::*;

const fn kw(keyword: Keyword) -> TokenKind {
    TokenKind::Keyword(keyword)
}

/// Parses the longest expression at the cursor and stops on the first token
/// that cannot continue it.
pub(crate) fn expression(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    binary(cur, 1)
}

/// Parses an expression that must fill the whole window.
pub(crate) fn whole_expression(mut cur: Cursor<'_>) -> ParseResult<Expression> {
    let expr = expression(&mut cur)?;
    cur.expect_end("Unexpected token in expression")?;
    Ok(expr)
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Concat => Some(BinaryOperator::Concat),
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Minus => Some(BinaryOperator::Subtract),
        TokenKind::Star => Some(BinaryOperator::Multiply),
        TokenKind::Slash => Some(BinaryOperator::Divide),
        TokenKind::Percent => Some(BinaryOperator::Modulo),
        _ => None,
    }
}

fn binary(cur: &mut Cursor<'_>, min_precedence: u8) -> ParseResult<Expression> {
    let mut left = unary(cur)?;
    while let Some(op) = binary_operator(cur.peek().kind).filter(|op| op.precedence() >= min_precedence) {
        cur.advance()?;
        let right = binary(cur, op.precedence() + 1)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

fn unary(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    let op = match cur.peek().kind {
        TokenKind::Minus => UnaryOperator::Minus,
        TokenKind::Plus => UnaryOperator::Plus,
        _ => return postfix(cur),
    };
    cur.advance()?;
    Ok(Expression::Unary {
        op,
        expr: Box::new(unary(cur)?),
    })
}

fn postfix(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    let mut expr = primary(cur)?;
    while cur.eat(TokenKind::DoubleColon) {
        expr = Expression::Cast {
            expr: Box::new(expr),
            data_type: type_name(cur)?,
            shorthand: true,
        };
    }
    Ok(expr)
}

/// Type after `::`. Only the two-word names that cannot be mistaken for an
/// alias are joined.
fn type_name(cur: &mut Cursor<'_>) -> ParseResult<String> {
    let mut name = identifier(cur, "Expected type name after ::")?;
    let second = match name.to_ascii_lowercase().as_str() {
        "double" => Some("precision"),
        "character" => Some("varying"),
        _ => None,
    };
    if let Some(second) = second {
        if cur.peek().ident().is_some_and(|t| t.eq_ignore_ascii_case(second)) {
            name = format!("{name} {}", cur.advance()?.text);
        }
    }
    if cur.is(TokenKind::LParen) {
        let inner = parenthesized(cur, "Unbalanced type modifier")?;
        name = format!("{name}({})", inner.remaining_text());
    }
    Ok(name)
}

fn primary(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    match cur.peek().kind {
        TokenKind::Number => Ok(Expression::number(cur.advance()?.text.clone())),
        TokenKind::String => Ok(Expression::string(cur.advance()?.text.clone())),
        TokenKind::Param(style) => param(cur, style),
        TokenKind::Keyword(Keyword::Null) => literal(cur, Literal::Null),
        TokenKind::Keyword(Keyword::True) => literal(cur, Literal::Bool(true)),
        TokenKind::Keyword(Keyword::False) => literal(cur, Literal::Bool(false)),
        TokenKind::Keyword(Keyword::Case) => case(cur).map(Expression::Case),
        TokenKind::Keyword(Keyword::Cast) => cast(cur),
        TokenKind::LParen => parenthesized_expression(cur),
        TokenKind::Keyword(Keyword::Left | Keyword::Right) if cur.kind_at(1) == TokenKind::LParen => {
            let name = cur.advance()?.text.clone();
            function_call(cur, name).map(Expression::Function)
        }
        TokenKind::Ident | TokenKind::QuotedIdent => reference(cur),
        TokenKind::Keyword(keyword) if !keyword.is_reserved() => reference(cur),
        _ => Err(cur.error("Unexpected token in expression")),
    }
}

fn literal(cur: &mut Cursor<'_>, literal: Literal) -> ParseResult<Expression> {
    cur.advance()?;
    Ok(Expression::Literal(literal))
}

fn param(cur: &mut Cursor<'_>, style: ParamStyle) -> ParseResult<Expression> {
    let token = cur.advance()?;
    let param = match style {
        ParamStyle::Anonymous => Param::Anonymous,
        ParamStyle::Positional => Param::Positional(
            token
                .text
                .parse()
                .map_err(|_| ParseError::at("Invalid positional parameter", token))?,
        ),
        ParamStyle::Colon => Param::Named {
            prefix: ':',
            name: token.text.clone(),
        },
        ParamStyle::At => Param::Named {
            prefix: '@',
            name: token.text.clone(),
        },
    };
    Ok(Expression::Param(param))
}

/// Column reference or function call: `name`, `t.name`, `f(...)`, `s.f(...)`.
fn reference(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    let start = cur.peek().position();
    let mut parts = vec![identifier(cur, "Expected identifier")?];
    while cur.is(TokenKind::Dot) && cur.kind_at(1) != TokenKind::Star {
        cur.advance()?;
        parts.push(identifier(cur, "Expected identifier after .")?);
    }
    if cur.is(TokenKind::LParen) {
        return function_call(cur, parts.join(".")).map(Expression::Function);
    }
    if cur.is(TokenKind::Dot) {
        return Err(cur.error("Qualified * is only allowed in a select list"));
    }
    match <[String; 2]>::try_from(parts) {
        Ok([table, name]) => Ok(Expression::Column(ColumnRef::qualified(table, name))),
        Err(mut parts) if parts.len() == 1 => Ok(Expression::column(parts.remove(0))),
        Err(_) => Err(ParseError::new("Too many qualifiers in column reference", start)),
    }
}

fn function_call(cur: &mut Cursor<'_>, name: String) -> ParseResult<FunctionCall> {
    let mut inner = parenthesized(cur, "Unbalanced parentheses in function call")?;
    let distinct = inner.eat_keyword(Keyword::Distinct);
    let args = match inner.is_at_end() {
        true if distinct => return Err(inner.error("Expected argument after DISTINCT")),
        true => Vec::new(),
        false => comma_list(&mut inner, "function argument")?
            .into_iter()
            .map(argument)
            .collect::<ParseResult<Vec<_>>>()?,
    };
    let call = FunctionCall::new(name, args).with_distinct(distinct);
    match cur.eat_keyword(Keyword::Over) {
        true => Ok(call.with_window(window_spec(cur)?)),
        false => Ok(call),
    }
}

fn argument(mut cur: Cursor<'_>) -> ParseResult<Expression> {
    if cur.is(TokenKind::Star) && cur.remaining() == 1 {
        cur.advance()?;
        return Ok(Expression::Star);
    }
    let expr = expression(&mut cur)?;
    cur.expect_end("Unexpected token in function argument")?;
    Ok(expr)
}

fn window_spec(cur: &mut Cursor<'_>) -> ParseResult<WindowSpec> {
    let mut inner = parenthesized(cur, "Expected ( after OVER")?;
    let mut spec = WindowSpec::default();
    if inner.eat_keyword(Keyword::Partition) {
        inner.expect_keyword(Keyword::By, "Expected BY after PARTITION")?;
        let end = inner.find(&[kw(Keyword::Order)]);
        let mut partition = inner.advance_to(end);
        spec.partition_by = comma_list(&mut partition, "PARTITION BY expression")?
            .into_iter()
            .map(whole_expression)
            .collect::<ParseResult<_>>()?;
    }
    if inner.eat_keyword(Keyword::Order) {
        inner.expect_keyword(Keyword::By, "Expected BY after ORDER")?;
        let end = inner.find(&[kw(Keyword::Rows)]);
        let mut order = inner.advance_to(end);
        spec.order_by = comma_list(&mut order, "ORDER BY item")?
            .into_iter()
            .map(order_item)
            .collect::<ParseResult<_>>()?;
    }
    inner.expect_end("Unexpected token in window specification")?;
    Ok(spec)
}

fn parenthesized_expression(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    let inner = parenthesized(cur, "Unbalanced parentheses")?;
    if starts_query(&inner) {
        return query(inner).map(|q| Expression::Subquery(Box::new(q)));
    }
    whole_expression(inner)
}

fn cast(cur: &mut Cursor<'_>) -> ParseResult<Expression> {
    cur.expect_keyword(Keyword::Cast, "Expected CAST")?;
    let mut inner = parenthesized(cur, "Expected ( after CAST")?;
    let as_at = inner.find(&[kw(Keyword::As)]);
    let expr = whole_expression(inner.advance_to(as_at))?;
    inner.expect_keyword(Keyword::As, "Expected AS in CAST")?;
    let data_type = inner.remaining_text();
    if data_type.is_empty() {
        return Err(inner.error("Expected type name in CAST"));
    }
    Ok(Expression::Cast {
        expr: Box::new(expr),
        data_type: data_type.to_string(),
        shorthand: false,
    })
}

/// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`. Searched arms hold a
/// full predicate; simple arms hold the compared value.
pub(crate) fn case(cur: &mut Cursor<'_>) -> ParseResult<CaseExpr> {
    cur.expect_keyword(Keyword::Case, "Expected CASE")?;
    let arm_start = [kw(Keyword::When), kw(Keyword::Else), kw(Keyword::End)];
    let operand = match arm_start.contains(&cur.peek().kind) {
        true => None,
        false => {
            let end = cur.find(&arm_start);
            Some(Box::new(whole_expression(cur.advance_to(end))?))
        }
    };
    let mut arms = Vec::new();
    while cur.eat_keyword(Keyword::When) {
        let end = cur.find(&[kw(Keyword::Then), kw(Keyword::When), kw(Keyword::Else), kw(Keyword::End)]);
        let condition = cur.advance_to(end);
        if condition.is_empty() {
            return Err(condition.error("Expected condition after WHEN"));
        }
        cur.expect_keyword(Keyword::Then, "CASE arm expected THEN")?;
        let when = match operand {
            Some(_) => Filter::Expression(whole_expression(condition)?),
            None => filter(condition)?,
        };
        let end = cur.find(&arm_start);
        let then = whole_expression(cur.advance_to(end))?;
        arms.push(WhenArm { when, then });
    }
    if arms.is_empty() {
        return Err(cur.error("CASE requires at least one WHEN"));
    }
    let otherwise = match cur.eat_keyword(Keyword::Else) {
        true => {
            let end = cur.find(&[kw(Keyword::End)]);
            Some(Box::new(whole_expression(cur.advance_to(end))?))
        }
        false => None,
    };
    cur.expect_keyword(Keyword::End, "CASE expected END")?;
    Ok(CaseExpr {
        operand,
        arms,
        otherwise,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a + b * c", "a + b * c")]
    #[case("(a + b) * c", "(a + b) * c")]
    #[case("a - (b - c)", "a - (b - c)")]
    #[case("a - b - c", "a - b - c")]
    #[case("fname || ' ' || lname", "fname || ' ' || lname")]
    #[case("-x * 2", "-x * 2")]
    #[case("price::numeric(10, 2)", "price::numeric(10, 2)")]
    #[case("x::double precision", "x::double precision")]
    #[case("CAST(created_at AS timestamp with time zone)", "CAST(created_at AS timestamp with time zone)")]
    #[case("count(DISTINCT u.id)", "count(DISTINCT u.id)")]
    #[case("pg_catalog.now()", "pg_catalog.now()")]
    #[case("left(name, 3)", "left(name, 3)")]
    #[case("rank() OVER (PARTITION BY dept ORDER BY salary DESC)", "rank() OVER (PARTITION BY dept ORDER BY salary DESC)")]
    #[case("(SELECT max(id) FROM t)", "(SELECT max(id) FROM t)")]
    #[case("$12 + ? + :name + @other", "$12 + ? + :name + @other")]
    #[case("'it''s'", "'it''s'")]
    fn renders_canonically(#[case] sql: &str, #[case] expected: &str) {
        assert_eq!(parse_expression(sql).unwrap().to_string(), expected);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let Expression::Binary { op, right, .. } = expr else {
            panic!("expected binary, got {expr:?}");
        };
        assert_eq!(op, BinaryOperator::Add);
        assert!(matches!(*right, Expression::Binary { op: BinaryOperator::Multiply, .. }));
    }

    #[test]
    fn star_argument() {
        let Expression::Function(call) = parse_expression("count(*)").unwrap() else {
            panic!("expected function");
        };
        assert!(call.has_star_argument());
        assert_eq!(call.args, vec![Expression::Star]);
    }

    #[test]
    fn searched_and_simple_case() {
        let searched = parse_expression("CASE WHEN a > 1 THEN 'x' WHEN a IS NULL THEN 'n' ELSE 'y' END").unwrap();
        let Expression::Case(case) = &searched else {
            panic!("expected case");
        };
        assert!(case.operand.is_none());
        assert_eq!(case.arms.len(), 2);
        assert!(matches!(case.arms[1].when, Filter::Column { op: Operator::IsNull, .. }));

        let simple = parse_expression("CASE status WHEN 1 THEN 'a' END").unwrap();
        let Expression::Case(case) = &simple else {
            panic!("expected case");
        };
        assert!(case.operand.is_some());
        assert_eq!(case.arms[0].when, Filter::Expression(Expression::number("1")));
        assert_eq!(simple.to_string(), "CASE status WHEN 1 THEN 'a' END");
    }

    #[test]
    fn nested_case_keeps_its_own_end() {
        let sql = "CASE WHEN a = 1 THEN CASE WHEN b = 2 THEN 3 END ELSE 4 END";
        assert_eq!(parse_expression(sql).unwrap().to_string(), sql);
    }

    #[rstest]
    #[case("CASE ELSE 1 END", "at least one WHEN")]
    #[case("CASE WHEN a = 1 'x' END", "expected THEN")]
    #[case("CASE WHEN a = 1 THEN 'x'", "expected END")]
    #[case("count(DISTINCT)", "Expected argument after DISTINCT")]
    #[case("a +", "Unexpected token in expression")]
    #[case("a.b.c.d", "Too many qualifiers")]
    #[case("t.*", "Qualified *")]
    #[case("f(a b)", "Unexpected token in function argument")]
    #[case("CAST(a AS)", "Expected type name in CAST")]
    fn failures(#[case] sql: &str, #[case] message: &str) {
        let err = parse_expression(sql).unwrap_err();
        assert!(err.message.contains(message), "{sql}: {err}");
    }
}

//! Whole queries: `WITH`, set operations and `SELECT` blocks.
use super::*;

pub(crate) fn query(cur: Cursor<'_>) -> ParseResult<Query> {
    let stripped = cur.clone().remove_brackets();
    if stripped.len() != cur.len() {
        return query(stripped);
    }
    if cur.is_at_end() {
        return Err(cur.error("Expected query"));
    }
    match cur.is_keyword(Keyword::With) {
        true => with_query(cur),
        false => set_operation(cur),
    }
}

fn with_query(mut cur: Cursor<'_>) -> ParseResult<Query> {
    cur.expect_keyword(Keyword::With, "Expected WITH")?;
    let recursive = cur.eat_keyword(Keyword::Recursive);
    let mut ctes = Vec::new();
    loop {
        let name = identifier(&mut cur, "Expected CTE name")?;
        let column_aliases = match cur.is(TokenKind::LParen) {
            true => identifier_list(&mut cur, "CTE column list")?,
            false => Vec::new(),
        };
        cur.expect_keyword(Keyword::As, "Expected AS in CTE")?;
        if !cur.is(TokenKind::LParen) {
            return Err(cur.error("Expected ( before CTE body"));
        }
        let body = parenthesized(&mut cur, "Unbalanced CTE body")?;
        ctes.push(Cte {
            name,
            column_aliases,
            body: query(body)?,
        });
        if !cur.eat(TokenKind::Comma) {
            break;
        }
    }
    let body = cur.rest();
    if body.is_empty() {
        return Err(body.error("Expected query after WITH"));
    }
    Ok(Query::With(WithQuery {
        ctes,
        recursive,
        body: Box::new(query(body)?),
    }))
}

/// Terms separated by top-level set operators. Trailing `ORDER BY`/`LIMIT`
/// stay with the last term.
fn set_operation(mut cur: Cursor<'_>) -> ParseResult<Query> {
    let mut terms = Vec::new();
    let mut operators = Vec::new();
    let set_operators = Keyword::SET_OPERATORS.map(TokenKind::Keyword);
    loop {
        let end = cur.find(&set_operators);
        terms.push(term(cur.advance_to(end))?);
        if cur.is_at_end() {
            trace!(terms = terms.len(), "set operation split");
            break;
        }
        let position = cur.peek().position();
        let keyword = cur.advance()?.kind;
        let all = cur.eat_keyword(Keyword::All);
        if !all {
            cur.eat_keyword(Keyword::Distinct);
        }
        operators.push(match (keyword, all) {
            (TokenKind::Keyword(Keyword::Union), false) => SetOperator::Union,
            (TokenKind::Keyword(Keyword::Union), true) => SetOperator::UnionAll,
            (TokenKind::Keyword(Keyword::Intersect), false) => SetOperator::Intersect,
            (TokenKind::Keyword(Keyword::Intersect), true) => SetOperator::IntersectAll,
            (TokenKind::Keyword(Keyword::Except), false) => SetOperator::Except,
            (TokenKind::Keyword(Keyword::Except), true) => SetOperator::ExceptAll,
            _ => return Err(ParseError::new("Expected set operator", position)),
        });
    }
    match terms.len() {
        1 => Ok(terms.remove(0)),
        _ => CompositeQuery::new(terms, operators)
            .map(Query::Composite)
            .map_err(|message| cur.error(&message)),
    }
}

fn term(cur: Cursor<'_>) -> ParseResult<Query> {
    if cur.is(TokenKind::LParen) {
        return query(cur);
    }
    select(cur).map(Query::from)
}

/// Ordering rank of a clause keyword; `LIMIT` and `OFFSET` share one.
fn clause_rank(clause: Keyword) -> usize {
    match clause {
        Keyword::From => 0,
        Keyword::Where => 1,
        Keyword::Group => 2,
        Keyword::Having => 3,
        Keyword::Order => 4,
        _ => 5,
    }
}

fn select(mut cur: Cursor<'_>) -> ParseResult<Select> {
    cur.expect_keyword(Keyword::Select, "Expected SELECT")?;
    let mut builder = Select::builder();
    if cur.eat_keyword(Keyword::Distinct) {
        let distinct = match cur.eat_keyword(Keyword::On) {
            true => {
                let mut inner = parenthesized(&mut cur, "Expected ( after DISTINCT ON")?;
                let exprs = comma_list(&mut inner, "DISTINCT ON expression")?
                    .into_iter()
                    .map(whole_expression)
                    .collect::<ParseResult<Vec<_>>>()?;
                Distinct::On(exprs)
            }
            false => Distinct::Distinct,
        };
        builder = builder.distinct(distinct);
    } else {
        cur.eat_keyword(Keyword::All);
    }

    let clauses = Keyword::CLAUSES.map(TokenKind::Keyword);
    let end = cur.find(&clauses);
    builder = builder.items(select_list(&mut cur.advance_to(end))?);

    let mut seen: Vec<Keyword> = Vec::new();
    while !cur.is_at_end() {
        let TokenKind::Keyword(clause) = cur.peek().kind else {
            return Err(cur.error("Unexpected token"));
        };
        if seen.contains(&clause) {
            return Err(cur.error(&format!("Duplicate {clause} clause")));
        }
        if seen.last().is_some_and(|last| clause_rank(*last) > clause_rank(clause)) {
            return Err(cur.error(&format!("Unexpected {clause} clause")));
        }
        seen.push(clause);
        cur.advance()?;
        if matches!(clause, Keyword::Group | Keyword::Order) {
            cur.expect_keyword(Keyword::By, &format!("Expected BY after {clause}"))?;
        }
        let end = cur.find(&clauses);
        let mut body = cur.advance_to(end);
        trace!(%clause, tokens = body.remaining(), "select clause");
        builder = match clause {
            Keyword::From => {
                let (table, joins) = from_clause(body)?;
                joins.into_iter().fold(builder.from(table), SelectBuilder::join)
            }
            Keyword::Where => builder.filter(filter(body)?),
            Keyword::Group => builder.group_by(
                comma_list(&mut body, "GROUP BY item")?
                    .into_iter()
                    .map(group_item)
                    .collect::<ParseResult<_>>()?,
            ),
            Keyword::Having => builder.having(filter(body)?),
            Keyword::Order => builder.order_by(
                comma_list(&mut body, "ORDER BY item")?
                    .into_iter()
                    .map(order_item)
                    .collect::<ParseResult<_>>()?,
            ),
            Keyword::Limit if body.is_keyword(Keyword::All) && body.remaining() == 1 => builder,
            Keyword::Limit => builder.limit(whole_expression(body)?),
            Keyword::Offset => {
                let offset = expression(&mut body)?;
                body.eat_keyword(Keyword::Rows);
                body.expect_end("Unexpected token in OFFSET")?;
                builder.offset(offset)
            }
            _ => return Err(body.error(&format!("Unexpected {clause} clause"))),
        };
    }
    Ok(builder.build())
}

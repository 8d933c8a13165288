//! `FROM` clauses: the first source followed by comma, `[kind] JOIN` and
//! `NATURAL` joins. `LEFT(`/`RIGHT(` are function calls, not joins.
use super::*;

fn starts_join(token: &Token, next: Option<&Token>) -> bool {
    match token.kind {
        TokenKind::Comma => true,
        TokenKind::Keyword(
            Keyword::Join | Keyword::Inner | Keyword::Full | Keyword::Cross | Keyword::Natural,
        ) => true,
        TokenKind::Keyword(Keyword::Left | Keyword::Right) => {
            !next.is_some_and(|t| t.is(TokenKind::LParen))
        }
        _ => false,
    }
}

/// Window index of the next top-level join start, or `len()`.
fn next_join_start(cur: &Cursor<'_>) -> usize {
    let tokens = cur.remaining_tokens();
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if depth == 0 && starts_join(token, tokens.get(i + 1)) {
            return cur.position() + i;
        }
        match token.kind {
            TokenKind::LParen | TokenKind::Keyword(Keyword::Case) => depth += 1,
            TokenKind::RParen | TokenKind::Keyword(Keyword::End) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    cur.len()
}

pub(crate) fn from_clause(mut cur: Cursor<'_>) -> ParseResult<(Table, Vec<Join>)> {
    let end = next_join_start(&cur);
    let first = table(cur.advance_to(end))?;
    let mut joins = Vec::new();
    while !cur.is_at_end() {
        joins.push(join(&mut cur)?);
    }
    Ok((first, joins))
}

/// One join starting at the cursor and running up to the next top-level join.
pub(crate) fn join(cur: &mut Cursor<'_>) -> ParseResult<Join> {
    if cur.eat(TokenKind::Comma) {
        let end = next_join_start(cur);
        return Ok(Join::table(JoinKind::Cross, table(cur.advance_to(end))?, None));
    }
    if cur.is_keyword(Keyword::Natural) {
        return natural(cur);
    }
    let kind = join_kind(cur)?;
    let end = next_join_start(cur);
    let mut segment = cur.advance_to(end);
    let constraint_at = segment.find(&[
        TokenKind::Keyword(Keyword::On),
        TokenKind::Keyword(Keyword::Using),
    ]);
    let table = table(segment.advance_to(constraint_at))?;
    let mut using = Vec::new();
    let mut on = None;
    if segment.is_keyword(Keyword::On) {
        if kind == JoinKind::Cross {
            return Err(segment.error("CROSS JOIN cannot have ON"));
        }
        segment.advance()?;
        on = Some(filter(segment.rest())?);
    } else if segment.eat_keyword(Keyword::Using) {
        using = identifier_list(&mut segment, "USING list")?;
        segment.expect_end("Unexpected token after USING")?;
    }
    Ok(Join::Table(TableJoin::new(kind, table, on).with_using(using)))
}

fn join_kind(cur: &mut Cursor<'_>) -> ParseResult<JoinKind> {
    let kind = match cur.peek().kind {
        TokenKind::Keyword(Keyword::Join) => {
            cur.advance()?;
            return Ok(JoinKind::Inner);
        }
        TokenKind::Keyword(Keyword::Inner) => JoinKind::Inner,
        TokenKind::Keyword(Keyword::Left) => JoinKind::Left,
        TokenKind::Keyword(Keyword::Right) => JoinKind::Right,
        TokenKind::Keyword(Keyword::Full) => JoinKind::Full,
        TokenKind::Keyword(Keyword::Cross) => JoinKind::Cross,
        _ => return Err(cur.error("Expected JOIN")),
    };
    cur.advance()?;
    if matches!(kind, JoinKind::Left | JoinKind::Right | JoinKind::Full) {
        cur.eat_keyword(Keyword::Outer);
    }
    cur.expect_keyword(Keyword::Join, "Expected JOIN")?;
    Ok(kind)
}

/// `NATURAL [kind] JOIN t` is kept as raw text; its implicit columns are not
/// resolved.
fn natural(cur: &mut Cursor<'_>) -> ParseResult<Join> {
    let start = cur.mark();
    cur.advance()?;
    let join_at = cur.find(&[TokenKind::Keyword(Keyword::Join)]);
    if join_at >= cur.len() {
        return Err(cur.error("Expected JOIN after NATURAL"));
    }
    cur.restore(join_at + 1);
    let end = next_join_start(cur);
    cur.restore(start);
    let text = cur.advance_to(end).remaining_text();
    Ok(Join::Expression(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn from(sql: &str) -> (Table, Vec<Join>) {
        let tokens = tokenize(sql).unwrap();
        from_clause(Cursor::new(sql, &tokens)).unwrap()
    }

    #[test]
    fn splits_join_chain() {
        let (first, joins) = from("a JOIN b ON a.id = b.a_id LEFT OUTER JOIN c USING (id), d NATURAL JOIN e");
        assert_eq!(first.to_string(), "a");
        let rendered: Vec<_> = joins.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "INNER JOIN b ON a.id = b.a_id",
                "LEFT JOIN c USING (id)",
                "CROSS JOIN d",
                "NATURAL JOIN e",
            ]
        );
    }

    #[test]
    fn left_function_in_on_is_not_a_join() {
        let (_, joins) = from("a JOIN b ON left(a.code, 2) = b.prefix");
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].to_string(), "INNER JOIN b ON left(a.code, 2) = b.prefix");
    }

    #[test]
    fn join_ids_are_distinct() {
        let (_, joins) = from("a JOIN b ON true JOIN c ON true");
        let ids: Vec<_> = joins
            .iter()
            .filter_map(|j| match j {
                Join::Table(t) => Some(t.id),
                Join::Expression(_) => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[rstest]
    #[case("RIGHT JOIN b ON x = y", JoinKind::Right)]
    #[case("FULL OUTER JOIN b ON x = y", JoinKind::Full)]
    #[case("CROSS JOIN b", JoinKind::Cross)]
    #[case("INNER JOIN b ON x = y", JoinKind::Inner)]
    fn join_kinds(#[case] sql: &str, #[case] expected: JoinKind) {
        let Join::Table(join) = parse_join(sql).unwrap() else {
            panic!("expected table join");
        };
        assert_eq!(join.kind, expected);
    }

    #[rstest]
    #[case("CROSS JOIN b ON x = y", "CROSS JOIN cannot have ON")]
    #[case("LEFT b ON x = y", "Expected JOIN")]
    #[case("JOIN ON x = y", "Expected table")]
    #[case("JOIN b USING (id", "Expected ( before USING list")]
    fn failures(#[case] sql: &str, #[case] message: &str) {
        let err = parse_join(sql).unwrap_err();
        assert!(err.message.contains(message), "{sql}: {err}");
    }
}

#![cfg(test)]
use crate::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use sqlparser::dialect::PostgreSqlDialect;

const COLUMNS: [&str; 4] = ["a", "price", "t.name", "created_at"];

fn operand(rng: &mut StdRng) -> Expression {
    let name = COLUMNS[rng.random_range(0..COLUMNS.len())];
    match name.split_once('.') {
        Some((table, name)) => Expression::Column(ColumnRef::qualified(table, name)),
        None => Expression::column(name),
    }
}

fn number(rng: &mut StdRng) -> Expression {
    Expression::number(rng.random_range(0..10_000).to_string())
}

fn text(rng: &mut StdRng) -> Expression {
    const WORDS: [&str; 4] = ["x", "it's", "%ab_", ""];
    Expression::string(WORDS[rng.random_range(0..WORDS.len())])
}

fn leaf(rng: &mut StdRng) -> Filter {
    let column = operand(rng);
    match rng.random_range(0..6) {
        0 => {
            let op = [Operator::Eq, Operator::Ne, Operator::Lt, Operator::Gte][rng.random_range(0..4)];
            Filter::column(column, op, Some(Values::Single(number(rng))))
        }
        1 => {
            let op = [Operator::In, Operator::NotIn][rng.random_range(0..2)];
            let list = (0..rng.random_range(1..4)).map(|_| number(rng)).collect();
            Filter::column(column, op, Some(Values::List(list)))
        }
        2 => {
            let op = [Operator::Like, Operator::NotLike, Operator::ILike][rng.random_range(0..3)];
            Filter::column(column, op, Some(Values::Single(text(rng))))
        }
        3 => Filter::column(
            column,
            Operator::Range,
            Some(Values::Range(number(rng), number(rng))),
        ),
        4 => {
            let op = [Operator::IsNull, Operator::IsNotNull][rng.random_range(0..2)];
            Filter::column(column, op, None)
        }
        _ => Filter::column(column, Operator::Eq, Some(Values::Single(text(rng)))),
    }
}

fn tree(rng: &mut StdRng, depth: u32) -> Filter {
    if depth == 0 || rng.random_bool(0.3) {
        return leaf(rng);
    }
    match rng.random_range(0..3) {
        0 => Filter::and((0..rng.random_range(2..4)).map(|_| tree(rng, depth - 1)).collect()),
        1 => Filter::or((0..rng.random_range(2..4)).map(|_| tree(rng, depth - 1)).collect()),
        // NOT directly over NOT renders as `NOT NOT`, which is legal but noisy.
        _ => match tree(rng, depth - 1) {
            Filter::Composite(c) if c.op() == Logical::Not => Filter::Composite(c),
            inner => Filter::not(inner),
        },
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2024)]
fn random_filters_render_stably(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..200 {
        let original = tree(&mut rng, 4);
        let rendered = original.to_string();
        let reparsed = parse_filter(&rendered).unwrap_or_else(|e| panic!("{rendered}: {e}"));
        assert_eq!(rendered, reparsed.to_string());
        assert_eq!(reparsed, parse_filter(&reparsed.to_string()).unwrap());
    }
}

fn arithmetic(rng: &mut StdRng, depth: u32) -> Expression {
    if depth == 0 || rng.random_bool(0.25) {
        return match rng.random_bool(0.5) {
            true => operand(rng),
            false => number(rng),
        };
    }
    match rng.random_range(0..4) {
        0 => Expression::Unary {
            op: UnaryOperator::Minus,
            expr: Box::new(arithmetic(rng, depth - 1)),
        },
        1 => Expression::Unary {
            op: UnaryOperator::Plus,
            expr: Box::new(arithmetic(rng, depth - 1)),
        },
        _ => {
            let ops = [BinaryOperator::Add, BinaryOperator::Subtract, BinaryOperator::Multiply];
            let op = ops[rng.random_range(0..ops.len())];
            Expression::binary(arithmetic(rng, depth - 1), op, arithmetic(rng, depth - 1))
        }
    }
}

#[rstest]
#[case(3)]
#[case(11)]
#[case(99)]
fn random_arithmetic_renders_stably(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..200 {
        let rendered = arithmetic(&mut rng, 4).to_string();
        assert!(!rendered.contains("--"), "{rendered}");
        let reparsed = parse_expression(&rendered).unwrap_or_else(|e| panic!("{rendered}: {e}"));
        assert_eq!(rendered, reparsed.to_string());
    }
}

#[rstest]
#[case("SELECT -(-price) FROM products", "SELECT -(-price) FROM products")]
#[case("SELECT - -1 AS n", "SELECT -(-1) AS n")]
#[case("SELECT -(-(-a)) FROM t", "SELECT -(-(-a)) FROM t")]
fn double_negation_survives_rendering(#[case] sql: &str, #[case] expected: &str) {
    let rendered = parse_query(sql).unwrap().to_string();
    assert_eq!(expected, rendered);
    assert_eq!(rendered, parse_query(&rendered).unwrap().to_string());
}

#[rstest]
#[case("SELECT id, name FROM users WHERE id = $1")]
#[case("SELECT DISTINCT ON (user_id) user_id, total FROM orders ORDER BY user_id, total DESC NULLS LAST")]
#[case("SELECT u.id, count(*) AS n FROM users AS u LEFT JOIN orders AS o ON o.user_id = u.id GROUP BY u.id HAVING count(*) > 2")]
#[case("SELECT * FROM users WHERE name ILIKE 'a%' AND NOT (id IN (1, 2) OR id BETWEEN 5 AND 9)")]
#[case("WITH RECURSIVE n (i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 10) SELECT i FROM n")]
#[case("SELECT id::text, CAST(total AS numeric(10, 2)) FROM orders LIMIT 10 OFFSET 5")]
#[case("SELECT rank() OVER (PARTITION BY status ORDER BY total DESC) FROM orders")]
#[case("SELECT g FROM generate_series(1, 3) AS g")]
#[case("SELECT v.a FROM (VALUES (1, 'x'), (2, 'y')) AS v (a, b)")]
#[case("SELECT u.id, l.total FROM users AS u CROSS JOIN LATERAL (SELECT total FROM orders WHERE user_id = u.id) AS l")]
#[case("SELECT CASE WHEN total > 100 THEN 'big' ELSE 'small' END AS size FROM orders")]
#[case("SELECT id FROM users WHERE EXISTS (SELECT 1 FROM orders WHERE user_id = users.id)")]
#[case("SELECT id FROM users EXCEPT SELECT user_id FROM orders")]
fn canonical_rendering_is_valid_postgres(#[case] sql: &str) {
    let rendered = parse_query(sql).unwrap().to_string();
    let parsed = sqlparser::parser::Parser::parse_sql(&PostgreSqlDialect {}, &rendered);
    assert!(parsed.is_ok(), "{rendered}: {parsed:?}");
    assert_eq!(rendered, parse_query(&rendered).unwrap().to_string());
}

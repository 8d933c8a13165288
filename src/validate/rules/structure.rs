use super::*;
use std::collections::HashSet;

/// Aggregates cannot appear in `WHERE`, `JOIN ... ON` or `GROUP BY`.
pub struct AggregatePlacement;

impl Rule for AggregatePlacement {
    fn name(&self) -> &'static str {
        "aggregate_placement"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Select
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Select(select) = node else {
            return;
        };
        let mut misplaced = Vec::new();
        if let Some(filter) = select.filter() {
            let mut calls = Vec::new();
            calls_in_filter(filter, &mut calls);
            misplaced.extend(calls.into_iter().map(|c| (c, "WHERE")));
        }
        for join in select.joins() {
            if let Join::Table(TableJoin { on: Some(on), .. }) = join {
                let mut calls = Vec::new();
                calls_in_filter(on, &mut calls);
                misplaced.extend(calls.into_iter().map(|c| (c, "JOIN ON")));
            }
        }
        for item in select.group_by() {
            if let GroupItem::Expression(expr) = item {
                let mut calls = Vec::new();
                calls_in(expr, &mut calls);
                misplaced.extend(calls.into_iter().map(|c| (c, "GROUP BY")));
            }
        }

        let functions = ctx.functions();
        for (call, clause) in misplaced {
            if call.over.is_none() && functions.is_aggregate(&call.name) {
                ctx.report(
                    ProblemCode::ClauseStructure,
                    NodeKind::Select,
                    format!("aggregate function `{}` is not allowed in {clause}", call.name),
                );
            }
        }
    }
}

/// `GROUP BY 3` / `ORDER BY 3` must point into the select list.
pub struct OrdinalRange;

impl Rule for OrdinalRange {
    fn name(&self) -> &'static str {
        "ordinal_range"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Select
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Select(select) = node else {
            return;
        };
        // A star makes the width unknown.
        if select.items().iter().any(Column::is_star) {
            return;
        }
        let width = select.items().len();
        let ordinals = select
            .group_by()
            .iter()
            .map(|g| ("GROUP BY", NodeKind::GroupItem, g))
            .chain(
                select
                    .order_by()
                    .iter()
                    .map(|o| ("ORDER BY", NodeKind::OrderItem, &o.key)),
            );
        for (clause, kind, item) in ordinals {
            if let GroupItem::Ordinal(n) = item {
                if *n == 0 || *n as usize > width {
                    ctx.report(
                        ProblemCode::ClauseStructure,
                        kind,
                        format!("{clause} position {n} is not in select list"),
                    );
                }
            }
        }
    }
}

/// The leading `ORDER BY` keys must be `DISTINCT ON` expressions.
pub struct DistinctOnOrder;

impl Rule for DistinctOnOrder {
    fn name(&self) -> &'static str {
        "distinct_on_order"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Select
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Select(select) = node else {
            return;
        };
        let Some(Distinct::On(exprs)) = select.distinct() else {
            return;
        };
        let distinct = exprs
            .iter()
            .map(|e| e.to_string().to_lowercase())
            .collect::<HashSet<_>>();
        let leading = select.order_by().iter().take(exprs.len());
        for item in leading {
            let key = match &item.key {
                GroupItem::Expression(expr) => Some(expr.to_string()),
                GroupItem::Ordinal(n) => (*n as usize)
                    .checked_sub(1)
                    .and_then(|i| select.items().get(i))
                    .and_then(Column::to_expression)
                    .map(|e| e.to_string()),
            };
            if !key.is_some_and(|k| distinct.contains(&k.to_lowercase())) {
                ctx.report(
                    ProblemCode::DistinctOnOrderBy,
                    NodeKind::Select,
                    "SELECT DISTINCT ON expressions must match initial ORDER BY expressions",
                );
                return;
            }
        }
    }
}

/// `LIMIT` and `OFFSET` take non-negative integers.
pub struct LimitOffset;

impl Rule for LimitOffset {
    fn name(&self) -> &'static str {
        "limit_offset"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Select
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Select(select) = node else {
            return;
        };
        for (clause, expr) in [("LIMIT", select.limit()), ("OFFSET", select.offset())] {
            let Some(expr) = expr else {
                continue;
            };
            let valid = match expr {
                Expression::Literal(Literal::Number(n)) => n.bytes().all(|b| b.is_ascii_digit()),
                Expression::Literal(Literal::Null) | Expression::Param(_) => true,
                Expression::Literal(_) => false,
                Expression::Unary {
                    op: UnaryOperator::Minus,
                    ..
                } => false,
                other => ctx.infer_type(other).is_none_or(|t| t.is_integer()),
            };
            if !valid {
                ctx.report(
                    ProblemCode::LimitOffsetType,
                    NodeKind::Select,
                    format!("{clause} must be a non-negative integer, got `{expr}`"),
                );
            }
        }
    }
}

/// Every term of a set operation must produce the same number of columns.
pub struct SetOperationArity;

impl Rule for SetOperationArity {
    fn name(&self) -> &'static str {
        "set_operation_arity"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::CompositeQuery
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Composite(composite) = node else {
            return;
        };
        let widths = composite
            .terms()
            .iter()
            .map(|term| {
                let output = ctx.output_columns(term);
                output.complete.then_some(output.columns.len())
            })
            .collect::<Vec<_>>();
        let Some(expected) = widths.iter().flatten().next().copied() else {
            return;
        };
        for (i, width) in widths.iter().enumerate() {
            if let Some(width) = width.filter(|w| *w != expected) {
                let op = composite.operators().get(i.saturating_sub(1)).copied();
                let op = op.map_or_else(|| "set operation".to_string(), |o| o.to_string());
                ctx.report(
                    ProblemCode::ClauseStructure,
                    NodeKind::CompositeQuery,
                    format!(
                        "each {op} query must have the same number of columns: expected {expected}, term {} has {width}",
                        i + 1
                    ),
                );
            }
        }
    }
}

/// A CTE column list must match the width of its query.
pub struct CteColumnCount;

impl Rule for CteColumnCount {
    fn name(&self) -> &'static str {
        "cte_column_count"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Cte
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Cte(cte) = node else {
            return;
        };
        if cte.column_aliases.is_empty() {
            return;
        }
        let output = ctx.output_columns(&cte.body);
        if output.complete && output.columns.len() != cte.column_aliases.len() {
            ctx.report(
                ProblemCode::ClauseStructure,
                NodeKind::Cte,
                format!(
                    "CTE `{}` names {} column(s) but its query returns {}",
                    cte.name,
                    cte.column_aliases.len(),
                    output.columns.len()
                ),
            );
        }
    }
}

/// `VALUES` rows share one width, and column aliases may not exceed it.
pub struct ValuesArity;

impl Rule for ValuesArity {
    fn name(&self) -> &'static str {
        "values_arity"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Table
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let (width, aliases) = match node {
            Node::Table(Table::Values {
                rows,
                column_aliases,
                ..
            }) => {
                let width = rows.first().map_or(0, Vec::len);
                if rows.iter().any(|row| row.len() != width) {
                    ctx.report(
                        ProblemCode::ClauseStructure,
                        NodeKind::Table,
                        "VALUES lists must all be the same length",
                    );
                }
                (width, column_aliases)
            }
            Node::Table(Table::Query {
                query,
                column_aliases,
                ..
            }) if !column_aliases.is_empty() => {
                let output = ctx.output_columns(query);
                if !output.complete {
                    return;
                }
                (output.columns.len(), column_aliases)
            }
            _ => return,
        };
        if aliases.len() > width {
            let name = match node {
                Node::Table(table) => table.reference_name().unwrap_or("derived table"),
                _ => "derived table",
            };
            ctx.report(
                ProblemCode::ClauseStructure,
                NodeKind::Table,
                format!(
                    "table `{name}` has {width} column(s) available but {} specified",
                    aliases.len()
                ),
            );
        }
    }
}

/// A subquery used as a value must return exactly one column.
pub struct ScalarSubquery;

impl Rule for ScalarSubquery {
    fn name(&self) -> &'static str {
        "scalar_subquery"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Expression
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        if let Node::Expression(Expression::Subquery(query)) = node {
            single_column(query, NodeKind::Expression, ctx);
        }
    }
}

/// Same as [`ScalarSubquery`], for subqueries in the select list.
pub struct SubqueryColumn;

impl Rule for SubqueryColumn {
    fn name(&self) -> &'static str {
        "subquery_column"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Column
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        if let Node::Column(Column::Query { query, .. }) = node {
            single_column(query, NodeKind::Column, ctx);
        }
    }
}

/// `x IN (SELECT ...)` needs one column; `(a, b) IN (SELECT ...)` needs two.
pub struct InSubqueryWidth;

impl Rule for InSubqueryWidth {
    fn name(&self) -> &'static str {
        "in_subquery_width"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let (query, expected) = match node {
            Node::Filter(Filter::Column {
                values: Some(Values::Subquery(query)),
                ..
            }) => (query, 1),
            Node::Filter(Filter::Tuple(tuple)) => match tuple.values() {
                Values::Subquery(query) => (query, tuple.columns().len()),
                _ => return,
            },
            _ => return,
        };
        let output = ctx.output_columns(query);
        if output.complete && output.columns.len() != expected {
            ctx.report(
                ProblemCode::ClauseStructure,
                NodeKind::Filter,
                format!(
                    "subquery returns {} column(s), expected {expected}",
                    output.columns.len()
                ),
            );
        }
    }
}

fn single_column(query: &Query, kind: NodeKind, ctx: &mut ValidationContext<'_>) {
    let output = ctx.output_columns(query);
    if output.complete && output.columns.len() != 1 {
        ctx.report(
            ProblemCode::ClauseStructure,
            kind,
            format!("subquery must return only one column, got {}", output.columns.len()),
        );
    }
}

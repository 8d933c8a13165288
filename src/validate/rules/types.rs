use super::*;

/// Arithmetic needs numeric operands, or date/time values with intervals.
pub struct ArithmeticTypes;

impl Rule for ArithmeticTypes {
    fn name(&self) -> &'static str {
        "arithmetic_types"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Expression
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        match node {
            Node::Expression(Expression::Binary { left, op, right }) if op.is_arithmetic() => {
                if is_coercible_literal(left) || is_coercible_literal(right) {
                    return;
                }
                let (Some(l), Some(r)) = (ctx.infer_type(left), ctx.infer_type(right)) else {
                    return;
                };
                if !arithmetic_allowed(&l, &r) {
                    ctx.report(
                        ProblemCode::TypeMismatch,
                        NodeKind::Expression,
                        format!("operator {op} cannot be applied to {l} and {r}"),
                    );
                }
            }
            Node::Expression(Expression::Unary { op, expr }) => {
                let Some(t) = ctx.infer_type(expr) else {
                    return;
                };
                if !matches!(
                    t.family(),
                    TypeFamily::Numeric | TypeFamily::Interval | TypeFamily::Other
                ) {
                    ctx.report(
                        ProblemCode::TypeMismatch,
                        NodeKind::Expression,
                        format!("unary {op} cannot be applied to {t}"),
                    );
                }
            }
            _ => {}
        }
    }
}

fn arithmetic_allowed(left: &DataType, right: &DataType) -> bool {
    use TypeFamily::*;
    matches!(
        (left.family(), right.family()),
        (Numeric, Numeric)
            | (Other, _)
            | (_, Other)
            | (Temporal | Interval, Temporal | Interval)
            | (Interval, Numeric)
            | (Numeric, Interval)
    )
}

/// Both sides of a comparison must belong to comparable type families, and
/// pattern matching needs text.
pub struct ComparisonTypes;

impl Rule for ComparisonTypes {
    fn name(&self) -> &'static str {
        "comparison_types"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Filter(Filter::Column { column, op, values }) = node else {
            return;
        };
        if is_coercible_literal(column) {
            return;
        }
        let Some(left) = ctx.infer_type(column) else {
            return;
        };

        if op.is_pattern() {
            if !matches!(left.family(), TypeFamily::Text | TypeFamily::Other) {
                ctx.report(
                    ProblemCode::TypeMismatch,
                    NodeKind::Filter,
                    format!("{op} requires text, but `{column}` is {left}"),
                );
            }
            return;
        }

        let right = match values {
            Some(Values::Column(other)) => vec![ctx.resolve_column(other, false).data_type().cloned()],
            Some(Values::Subquery(query)) => {
                let output = ctx.output_columns(query);
                match output.columns.as_slice() {
                    [only] if output.complete => vec![only.data_type.clone()],
                    _ => Vec::new(),
                }
            }
            Some(Values::Tuples(_)) | None => Vec::new(),
            Some(values) => values
                .expressions()
                .into_iter()
                .filter(|e| !is_coercible_literal(e))
                .map(|e| ctx.infer_type(e))
                .collect(),
        };
        if let Some(mismatch) = right.into_iter().flatten().find(|r| !left.is_comparable_with(r)) {
            ctx.report(
                ProblemCode::TypeMismatch,
                NodeKind::Filter,
                format!("cannot compare `{column}` ({left}) with {mismatch}"),
            );
        }
    }
}

//! Built-in rules.
//!
//! [`RuleRegistry::defaults`] wires every dialect-independent rule;
//! [`RuleRegistry::for_dialect`] adds a feature gate for each capability the
//! dialect lacks.
mod dialect;
mod functions;
mod policy;
mod resolution;
mod structure;
mod types;

pub use self::{dialect::*, functions::*, policy::*, resolution::*, structure::*, types::*};

use super::*;

impl RuleRegistry {
    pub fn defaults() -> Self {
        Self::new()
            .with(ColumnResolution)
            .with(StarQualifier)
            .with(TablePolicy)
            .with(ColumnPolicy)
            .with(StarPolicy)
            .with(FunctionPolicy)
            .with(FunctionSignatureRule)
            .with(ArithmeticTypes)
            .with(ComparisonTypes)
            .with(AggregatePlacement)
            .with(OrdinalRange)
            .with(DistinctOnOrder)
            .with(LimitOffset)
            .with(SetOperationArity)
            .with(CteColumnCount)
            .with(ValuesArity)
            .with(ScalarSubquery)
            .with(SubqueryColumn)
            .with(InSubqueryWidth)
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        let capabilities = dialect.capabilities();
        capabilities
            .missing()
            .map(|feature| FeatureRule::new(feature, dialect))
            .fold(Self::defaults(), Self::with)
    }
}

/// Function calls in `expr`, without descending into subqueries.
fn calls_in<'e>(expr: &'e Expression, out: &mut Vec<&'e FunctionCall>) {
    match expr {
        Expression::Function(call) => {
            out.push(call);
            call.args.iter().for_each(|a| calls_in(a, out));
        }
        Expression::Cast { expr, .. } | Expression::Unary { expr, .. } => calls_in(expr, out),
        Expression::Binary { left, right, .. } => {
            calls_in(left, out);
            calls_in(right, out);
        }
        Expression::Case(case) => {
            case.operand.iter().for_each(|e| calls_in(e, out));
            for arm in &case.arms {
                calls_in_filter(&arm.when, out);
                calls_in(&arm.then, out);
            }
            case.otherwise.iter().for_each(|e| calls_in(e, out));
        }
        Expression::Literal(_)
        | Expression::Param(_)
        | Expression::Column(_)
        | Expression::Star
        | Expression::Subquery(_) => {}
    }
}

fn calls_in_filter<'e>(filter: &'e Filter, out: &mut Vec<&'e FunctionCall>) {
    match filter {
        Filter::Column { column, values, .. } => {
            calls_in(column, out);
            if let Some(values) = values {
                values.expressions().into_iter().for_each(|e| calls_in(e, out));
            }
        }
        Filter::Tuple(tuple) => {
            tuple.columns().iter().for_each(|e| calls_in(e, out));
            tuple
                .values()
                .expressions()
                .into_iter()
                .for_each(|e| calls_in(e, out));
        }
        Filter::Composite(composite) => composite
            .filters()
            .iter()
            .for_each(|f| calls_in_filter(f, out)),
        Filter::Exists { .. } => {}
        Filter::Expression(expr) => calls_in(expr, out),
    }
}

/// Untyped literals that the database coerces to whatever they meet.
fn is_coercible_literal(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Literal(Literal::String(_) | Literal::Null) | Expression::Param(_)
    )
}

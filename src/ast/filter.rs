//! Predicates (`WHERE`, `HAVING`, `ON`, `CASE WHEN`) and their right-hand
//! value shapes.
use super::*;
use itertools::Itertools as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Operator {
    #[display("=")]
    Eq,
    #[display("<>")]
    Ne,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
    #[display("IN")]
    In,
    #[display("NOT IN")]
    NotIn,
    #[display("LIKE")]
    Like,
    #[display("NOT LIKE")]
    NotLike,
    #[display("ILIKE")]
    ILike,
    #[display("NOT ILIKE")]
    NotILike,
    #[display("BETWEEN")]
    Range,
    #[display("IS NULL")]
    IsNull,
    #[display("IS NOT NULL")]
    IsNotNull,
}

impl Operator {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }

    pub const fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::ILike | Operator::NotILike
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TupleOperator {
    #[display("IN")]
    In,
    #[display("NOT IN")]
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Logical {
    #[display("AND")]
    And,
    #[display("OR")]
    Or,
    #[display("NOT")]
    Not,
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Single(Expression),
    List(Vec<Expression>),
    /// Rows of equal arity, for tuple `IN`.
    Tuples(Vec<Vec<Expression>>),
    Range(Expression, Expression),
    Column(ColumnRef),
    Subquery(Box<Query>),
}

impl Values {
    /// Every value expression, in order.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Values::Single(e) => vec![e],
            Values::List(list) => list.iter().collect(),
            Values::Tuples(rows) => rows.iter().flatten().collect(),
            Values::Range(min, max) => vec![min, max],
            Values::Column(_) | Values::Subquery(_) => vec![],
        }
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Values::Single(e) => write!(f, "{e}"),
            Values::List(list) => write!(f, "({})", list.iter().join(", ")),
            Values::Tuples(rows) => write!(
                f,
                "({})",
                rows.iter()
                    .map(|row| format!("({})", row.iter().join(", ")))
                    .join(", ")
            ),
            Values::Range(min, max) => write!(f, "{min} AND {max}"),
            Values::Column(c) => write!(f, "{c}"),
            Values::Subquery(q) => write!(f, "({q})"),
        }
    }
}

/// `(a, b) IN ((1, 2), ...)`. Holds at least two columns and every
/// `Values::Tuples` row matches the column count.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleFilter {
    columns: Vec<Expression>,
    op: TupleOperator,
    values: Values,
}

impl TupleFilter {
    pub fn new(columns: Vec<Expression>, op: TupleOperator, values: Values) -> Result<Self, String> {
        if columns.len() < 2 {
            return Err("tuple filter requires at least two columns".into());
        }
        if let Values::Tuples(rows) = &values {
            if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
                return Err(format!(
                    "tuple arity mismatch: {} columns but a row has {} values",
                    columns.len(),
                    row.len()
                ));
            }
        }
        Ok(Self {
            columns,
            op,
            values,
        })
    }

    pub fn columns(&self) -> &[Expression] {
        &self.columns
    }

    pub fn op(&self) -> TupleOperator {
        self.op
    }

    pub fn values(&self) -> &Values {
        &self.values
    }
}

/// Boolean composition. `Not` always wraps exactly one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFilter {
    op: Logical,
    filters: Vec<Filter>,
}

impl CompositeFilter {
    pub fn op(&self) -> Logical {
        self.op
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column <op> values`; `values` is `None` for `IS [NOT] NULL`.
    Column {
        column: Expression,
        op: Operator,
        values: Option<Values>,
    },
    Tuple(TupleFilter),
    Composite(CompositeFilter),
    Exists {
        query: Box<Query>,
        negated: bool,
    },
    /// Bare boolean expression (`WHERE active`, `WHEN 1` in a simple CASE).
    Expression(Expression),
}

impl Filter {
    pub fn column(column: Expression, op: Operator, values: Option<Values>) -> Self {
        Filter::Column { column, op, values }
    }

    /// Conjunction; a single operand is returned as is.
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::compose(Logical::And, filters)
    }

    /// Disjunction; a single operand is returned as is.
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::compose(Logical::Or, filters)
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Composite(CompositeFilter {
            op: Logical::Not,
            filters: vec![filter],
        })
    }

    fn compose(op: Logical, mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Filter::Composite(CompositeFilter { op, filters })
    }

    fn is_composite(&self, op: Logical) -> bool {
        matches!(self, Filter::Composite(c) if c.op == op)
    }

    fn write_child(&self, f: &mut fmt::Formatter<'_>, parent: Logical) -> fmt::Result {
        let wrap = match parent {
            Logical::Or => false,
            Logical::And => self.is_composite(Logical::Or),
            Logical::Not => self.is_composite(Logical::Or) || self.is_composite(Logical::And),
        };
        match wrap {
            true => write!(f, "({self})"),
            false => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Column {
                column,
                op,
                values: None,
            } => write!(f, "{column} {op}"),
            Filter::Column {
                column,
                op,
                values: Some(values),
            } => write!(f, "{column} {op} {values}"),
            Filter::Tuple(t) => write!(
                f,
                "({}) {} {}",
                t.columns.iter().join(", "),
                t.op,
                t.values
            ),
            Filter::Composite(c) if c.op == Logical::Not => {
                f.write_str("NOT ")?;
                c.filters[0].write_child(f, Logical::Not)
            }
            Filter::Composite(c) => {
                for (i, child) in c.filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", c.op)?;
                    }
                    child.write_child(f, c.op)?;
                }
                Ok(())
            }
            Filter::Exists { query, negated } => {
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "EXISTS ({query})")
            }
            Filter::Expression(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(col: &str, n: &str) -> Filter {
        Filter::column(
            Expression::column(col),
            Operator::Eq,
            Some(Values::Single(Expression::number(n))),
        )
    }

    #[test]
    fn single_operand_composition_collapses() {
        assert_eq!(Filter::and(vec![eq("a", "1")]), eq("a", "1"));
    }

    #[test]
    fn not_holds_exactly_one_child() {
        let not = Filter::not(eq("a", "1"));
        match not {
            Filter::Composite(c) => {
                assert_eq!(c.op(), Logical::Not);
                assert_eq!(c.filters().len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rendering_parenthesizes_lower_precedence_children() {
        let or = Filter::or(vec![eq("b", "2"), Filter::not(eq("c", "3"))]);
        let and = Filter::and(vec![eq("a", "1"), or]);
        assert_eq!(and.to_string(), "a = 1 AND (b = 2 OR NOT c = 3)");
    }

    #[test]
    fn tuple_filter_requires_two_columns_and_matching_arity() {
        let rows = Values::Tuples(vec![vec![Expression::number("1")]]);
        assert!(TupleFilter::new(vec![Expression::column("a")], TupleOperator::In, rows).is_err());
        let rows = Values::Tuples(vec![vec![Expression::number("1")]]);
        let err = TupleFilter::new(
            vec![Expression::column("a"), Expression::column("b")],
            TupleOperator::In,
            rows,
        )
        .unwrap_err();
        assert!(err.contains("arity"));
    }

    #[test]
    fn values_rendering() {
        let list = Values::List(vec![Expression::number("1"), Expression::number("2")]);
        assert_eq!(list.to_string(), "(1, 2)");
        let range = Values::Range(Expression::number("10"), Expression::number("20"));
        assert_eq!(range.to_string(), "10 AND 20");
        assert_eq!(range.expressions().len(), 2);
    }
}

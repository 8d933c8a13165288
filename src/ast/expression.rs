//! Value expressions: literals, parameters, column references, calls,
//! casts, arithmetic, scalar subqueries and `CASE`.
use super::*;
use itertools::Itertools as _;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    /// Numeric literal kept as written (`42`, `3.14`, `1e10`).
    Number(String),
    /// Unescaped string value.
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
            Literal::Number(n) => f.write_str(n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Anonymous,
    Positional(u32),
    /// `:name` or `@name`; `prefix` is the sigil.
    Named { prefix: char, name: String },
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Anonymous => f.write_str("?"),
            Param::Positional(n) => write!(f, "${n}"),
            Param::Named { prefix, name } => write!(f, "{prefix}{name}"),
        }
    }
}

/// `[table.]name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_qualified(f, self.table.as_deref(), &self.name)
    }
}

/// `OVER (PARTITION BY ... ORDER BY ...)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<OrderItem>,
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            parts.push(format!("PARTITION BY {}", self.partition_by.iter().join(", ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.iter().join(", ")));
        }
        write!(f, "({})", parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub distinct: bool,
    pub over: Option<WindowSpec>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            distinct: false,
            over: None,
        }
    }

    pub fn with_distinct(self, distinct: bool) -> Self {
        Self { distinct, ..self }
    }

    pub fn with_window(self, over: WindowSpec) -> Self {
        Self {
            over: Some(over),
            ..self
        }
    }

    /// True for `f(*)`.
    pub fn has_star_argument(&self) -> bool {
        self.args.iter().any(|a| matches!(a, Expression::Star))
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keyword-named functions such as `left` stay bare; quoting would
        // change their case sensitivity.
        let name = self
            .name
            .split('.')
            .map(|part| match part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                true => part.to_string(),
                false => Ident(part).to_string(),
            })
            .join(".");
        write!(f, "{name}(")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write!(f, "{})", self.args.iter().join(", "))?;
        if let Some(over) = &self.over {
            write!(f, " OVER {over}")?;
        }
        Ok(())
    }
}

/// One `WHEN ... THEN ...` arm. For a simple `CASE x WHEN v` the condition is
/// `Filter::Expression(v)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenArm {
    pub when: Filter,
    pub then: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub operand: Option<Box<Expression>>,
    pub arms: Vec<WhenArm>,
    pub otherwise: Option<Box<Expression>>,
}

impl fmt::Display for CaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CASE")?;
        if let Some(operand) = &self.operand {
            write!(f, " {operand}")?;
        }
        for arm in &self.arms {
            write!(f, " WHEN {} THEN {}", arm.when, arm.then)?;
        }
        if let Some(otherwise) = &self.otherwise {
            write!(f, " ELSE {otherwise}")?;
        }
        f.write_str(" END")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum UnaryOperator {
    #[display("-")]
    Minus,
    #[display("+")]
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BinaryOperator {
    #[display("+")]
    Add,
    #[display("-")]
    Subtract,
    #[display("*")]
    Multiply,
    #[display("/")]
    Divide,
    #[display("%")]
    Modulo,
    #[display("||")]
    Concat,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Concat => 1,
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 3,
        }
    }

    pub const fn is_arithmetic(self) -> bool {
        !matches!(self, BinaryOperator::Concat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Param(Param),
    Column(ColumnRef),
    /// Bare `*` argument, as in `count(*)`.
    Star,
    Function(FunctionCall),
    /// `CAST(expr AS type)`, or `expr::type` when `shorthand`.
    Cast {
        expr: Box<Expression>,
        data_type: String,
        shorthand: bool,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Subquery(Box<Query>),
    Case(CaseExpr),
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(ColumnRef::new(name))
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expression::Literal(Literal::Number(text.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn is_negative_number(&self) -> bool {
        matches!(self, Expression::Literal(Literal::Number(n)) if n.starts_with('-'))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Binary { op, .. } => op.precedence(),
            Expression::Unary { .. } => 4,
            _ => 5,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(l) => write!(f, "{l}"),
            Expression::Param(p) => write!(f, "{p}"),
            Expression::Column(c) => write!(f, "{c}"),
            Expression::Star => f.write_str("*"),
            Expression::Function(call) => write!(f, "{call}"),
            Expression::Cast {
                expr,
                data_type,
                shorthand: true,
            } => match expr.precedence() < 5 {
                true => write!(f, "({expr})::{data_type}"),
                false => write!(f, "{expr}::{data_type}"),
            },
            Expression::Cast {
                expr, data_type, ..
            } => write!(f, "CAST({expr} AS {data_type})"),
            // `--` would start a line comment.
            Expression::Unary { op, expr } => match expr.precedence() <= 4 || expr.is_negative_number() {
                true => write!(f, "{op}({expr})"),
                false => write!(f, "{op}{expr}"),
            },
            Expression::Binary { left, op, right } => {
                let p = op.precedence();
                match left.precedence() < p {
                    true => write!(f, "({left})")?,
                    false => write!(f, "{left}")?,
                }
                write!(f, " {op} ")?;
                match right.precedence() <= p {
                    true => write!(f, "({right})"),
                    false => write!(f, "{right}"),
                }
            }
            Expression::Subquery(q) => write!(f, "({q})"),
            Expression::Case(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expression;
    use rstest::rstest;

    #[test]
    fn string_literals_re_escape_quotes() {
        assert_eq!(Literal::String("O'Reilly".into()).to_string(), "'O''Reilly'");
    }

    #[test]
    fn arithmetic_renders_minimal_parentheses() {
        let sum = Expression::binary(
            Expression::column("a"),
            BinaryOperator::Add,
            Expression::number("1"),
        );
        let product = Expression::binary(sum.clone(), BinaryOperator::Multiply, Expression::number("2"));
        assert_eq!(product.to_string(), "(a + 1) * 2");
        let nested_right = Expression::binary(Expression::number("10"), BinaryOperator::Subtract, sum);
        assert_eq!(nested_right.to_string(), "10 - (a + 1)");
    }

    #[rstest]
    #[case("-(-1)", "-(-1)")]
    #[case("-(-price)", "-(-price)")]
    #[case("+(-a)", "+(-a)")]
    #[case("- - a", "-(-a)")]
    #[case("-a::int", "-a::int")]
    #[case("-(a + 1)", "-(a + 1)")]
    #[case("a - -1", "a - -1")]
    fn nested_unary_keeps_operands_apart(#[case] input: &str, #[case] rendered: &str) {
        let expr = parse_expression(input).unwrap();
        assert_eq!(rendered, expr.to_string());
        assert_eq!(expr, parse_expression(&expr.to_string()).unwrap());
    }

    #[test]
    fn negative_number_literal_is_parenthesized() {
        let expr = Expression::Unary {
            op: UnaryOperator::Minus,
            expr: Box::new(Expression::number("-1")),
        };
        assert_eq!("-(-1)", expr.to_string());
    }

    #[test]
    fn function_call_rendering() {
        let call = FunctionCall::new("count", vec![Expression::column("id")])
            .with_distinct(true)
            .with_window(WindowSpec {
                partition_by: vec![Expression::column("dept")],
                order_by: vec![],
            });
        assert_eq!(call.to_string(), "count(DISTINCT id) OVER (PARTITION BY dept)");
        assert!(FunctionCall::new("count", vec![Expression::Star]).has_star_argument());
    }

    #[test]
    fn params_render_with_their_sigil() {
        assert_eq!(Param::Positional(3).to_string(), "$3");
        assert_eq!(
            Param::Named {
                prefix: ':',
                name: "id".into()
            }
            .to_string(),
            ":id"
        );
    }
}

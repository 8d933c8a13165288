//! Select-list items.
use super::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `[table.]name [AS alias]`
    Named {
        table: Option<String>,
        name: String,
        alias: Option<String>,
    },
    /// Any other value expression.
    Expression {
        expr: Expression,
        alias: Option<String>,
    },
    Function {
        call: FunctionCall,
        alias: Option<String>,
    },
    /// Scalar subquery.
    Query {
        query: Box<Query>,
        alias: Option<String>,
    },
    Case {
        case: CaseExpr,
        alias: Option<String>,
    },
    /// `*` or `table.*`
    Star { table: Option<String> },
}

impl Column {
    pub fn named(name: impl Into<String>) -> Self {
        Column::Named {
            table: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Classifies a parsed expression into the matching column variant.
    pub fn from_expression(expr: Expression, alias: Option<String>) -> Self {
        match expr {
            Expression::Column(ColumnRef { table, name }) => Column::Named { table, name, alias },
            Expression::Function(call) => Column::Function { call, alias },
            Expression::Subquery(query) => Column::Query { query, alias },
            Expression::Case(case) => Column::Case { case, alias },
            expr => Column::Expression { expr, alias },
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Column::Named { alias, .. }
            | Column::Expression { alias, .. }
            | Column::Function { alias, .. }
            | Column::Query { alias, .. }
            | Column::Case { alias, .. } => alias.as_deref(),
            Column::Star { .. } => None,
        }
    }

    /// Returns a copy carrying `alias`. Stars have no alias and are returned as is.
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        let alias = Some(alias.into());
        match self {
            Column::Named { table, name, .. } => Column::Named { table, name, alias },
            Column::Expression { expr, .. } => Column::Expression { expr, alias },
            Column::Function { call, .. } => Column::Function { call, alias },
            Column::Query { query, .. } => Column::Query { query, alias },
            Column::Case { case, .. } => Column::Case { case, alias },
            star @ Column::Star { .. } => star,
        }
    }

    /// Name under which the item is visible to an enclosing query.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Column::Named { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
            Column::Function { call, alias } => Some(alias.as_deref().unwrap_or(&call.name)),
            other => other.alias(),
        }
    }

    /// The value expression behind the item; `None` for stars.
    pub fn to_expression(&self) -> Option<Expression> {
        let expr = match self {
            Column::Named { table, name, .. } => Expression::Column(ColumnRef {
                table: table.clone(),
                name: name.clone(),
            }),
            Column::Expression { expr, .. } => expr.clone(),
            Column::Function { call, .. } => Expression::Function(call.clone()),
            Column::Query { query, .. } => Expression::Subquery(query.clone()),
            Column::Case { case, .. } => Expression::Case(case.clone()),
            Column::Star { .. } => return None,
        };
        Some(expr)
    }

    pub fn is_star(&self) -> bool {
        matches!(self, Column::Star { .. })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Named { table, name, .. } => write_qualified(f, table.as_deref(), name)?,
            Column::Expression { expr, .. } => write!(f, "{expr}")?,
            Column::Function { call, .. } => write!(f, "{call}")?,
            Column::Query { query, .. } => write!(f, "({query})")?,
            Column::Case { case, .. } => write!(f, "{case}")?,
            Column::Star { table: Some(t) } => return write!(f, "{}.*", Ident(t)),
            Column::Star { table: None } => return f.write_str("*"),
        }
        write_alias(f, self.alias())
    }
}

//! `FROM` / `JOIN` sources.
use super::*;
use itertools::Itertools as _;

#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// Catalog table or CTE reference.
    Named {
        schema: Option<String>,
        name: String,
        alias: Option<String>,
    },
    /// Derived table: `[LATERAL] (query) [AS] alias [(cols)]`.
    Query {
        query: Box<Query>,
        alias: Option<String>,
        column_aliases: Vec<String>,
        lateral: bool,
    },
    /// `(VALUES (...), ...) [AS] alias [(cols)]`
    Values {
        rows: Vec<Vec<Expression>>,
        alias: Option<String>,
        column_aliases: Vec<String>,
    },
    /// Set-returning function: `generate_series(1, 3) [AS] g [(n)]`.
    Function {
        call: FunctionCall,
        alias: Option<String>,
        column_aliases: Vec<String>,
        lateral: bool,
    },
}

impl Table {
    pub fn named(name: impl Into<String>) -> Self {
        Table::Named {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Table::Named { alias, .. }
            | Table::Query { alias, .. }
            | Table::Values { alias, .. }
            | Table::Function { alias, .. } => alias.as_deref(),
        }
    }

    /// Returns a copy carrying `alias`.
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        let alias = Some(alias.into());
        match self {
            Table::Named { schema, name, .. } => Table::Named {
                schema,
                name,
                alias,
            },
            Table::Query {
                query,
                column_aliases,
                lateral,
                ..
            } => Table::Query {
                query,
                alias,
                column_aliases,
                lateral,
            },
            Table::Values {
                rows,
                column_aliases,
                ..
            } => Table::Values {
                rows,
                alias,
                column_aliases,
            },
            Table::Function {
                call,
                column_aliases,
                lateral,
                ..
            } => Table::Function {
                call,
                alias,
                column_aliases,
                lateral,
            },
        }
    }

    /// Name the source is referenced by: its alias, else the table name.
    /// Derived sources without an alias have none.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Table::Named { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
            Table::Function { call, alias, .. } => Some(alias.as_deref().unwrap_or(&call.name)),
            other => other.alias(),
        }
    }

    pub fn is_derived(&self) -> bool {
        !matches!(self, Table::Named { .. })
    }

    pub fn is_lateral(&self) -> bool {
        matches!(
            self,
            Table::Query { lateral: true, .. } | Table::Function { lateral: true, .. }
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Named {
                schema,
                name,
                alias,
            } => {
                write_qualified(f, schema.as_deref(), name)?;
                write_alias(f, alias.as_deref())
            }
            Table::Query {
                query,
                alias,
                column_aliases,
                lateral,
            } => {
                if *lateral {
                    f.write_str("LATERAL ")?;
                }
                write!(f, "({query})")?;
                write_alias(f, alias.as_deref())?;
                write_column_aliases(f, column_aliases)
            }
            Table::Values {
                rows,
                alias,
                column_aliases,
            } => {
                let rows = rows
                    .iter()
                    .map(|row| format!("({})", row.iter().join(", ")))
                    .join(", ");
                write!(f, "(VALUES {rows})")?;
                write_alias(f, alias.as_deref())?;
                write_column_aliases(f, column_aliases)
            }
            Table::Function {
                call,
                alias,
                column_aliases,
                lateral,
            } => {
                if *lateral {
                    f.write_str("LATERAL ")?;
                }
                write!(f, "{call}")?;
                write_alias(f, alias.as_deref())?;
                write_column_aliases(f, column_aliases)
            }
        }
    }
}

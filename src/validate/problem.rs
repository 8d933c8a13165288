use super::*;
use derive_more::Display;
use std::fmt;

/// Stable machine-readable tag for each kind of problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProblemCode {
    #[display("table_not_found")]
    TableNotFound,
    #[display("ambiguous_table")]
    AmbiguousTable,
    #[display("column_not_found")]
    ColumnNotFound,
    #[display("ambiguous_column")]
    AmbiguousColumn,
    #[display("duplicate_alias")]
    DuplicateAlias,
    #[display("unknown_alias")]
    UnknownAlias,
    #[display("policy_denied")]
    PolicyDenied,
    #[display("unsupported_feature")]
    UnsupportedFeature,
    #[display("distinct_on_order_by")]
    DistinctOnOrderBy,
    #[display("clause_structure")]
    ClauseStructure,
    #[display("limit_offset_type")]
    LimitOffsetType,
    #[display("function_signature")]
    FunctionSignature,
    #[display("type_mismatch")]
    TypeMismatch,
}

/// A single finding. Validation never stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationProblem {
    pub code: ProblemCode,
    pub message: String,
    pub node_kind: Option<NodeKind>,
    /// Dotted path of the clause being walked, e.g. `cte(recent).where`.
    pub clause_path: Option<String>,
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(path) = &self.clause_path {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case(None, "[column_not_found] column `x` not found")]
    #[case(Some("where"), "[column_not_found] column `x` not found (at where)")]
    fn display(#[case] path: Option<&str>, #[case] expected: &str) {
        let problem = ValidationProblem {
            code: ProblemCode::ColumnNotFound,
            message: "column `x` not found".into(),
            node_kind: Some(NodeKind::ColumnRef),
            clause_path: path.map(str::to_string),
        };
        assert_eq!(expected, problem.to_string());
    }
}

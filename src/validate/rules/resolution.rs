use super::*;

/// Every column reference must resolve against a visible source.
pub struct ColumnResolution;

impl Rule for ColumnResolution {
    fn name(&self) -> &'static str {
        "column_resolution"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ColumnRef
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        if let Node::ColumnRef(column) = node {
            ctx.resolve_column(column, true);
        }
    }
}

/// `t.*` must name a source of the same `SELECT`.
pub struct StarQualifier;

impl Rule for StarQualifier {
    fn name(&self) -> &'static str {
        "star_qualifier"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Column
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Column(Column::Star { table: Some(table) }) = node else {
            return;
        };
        if !ctx.is_alias_visible(table) {
            ctx.report(
                ProblemCode::UnknownAlias,
                NodeKind::Column,
                format!("unknown table alias `{table}` in `{table}.*`"),
            );
        }
    }
}

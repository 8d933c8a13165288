use super::*;

/// Denied tables cannot be referenced.
pub struct TablePolicy;

impl Rule for TablePolicy {
    fn name(&self) -> &'static str {
        "table_policy"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Table
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Table(table) = node else {
            return;
        };
        let Some(catalog) = ctx.catalog_table(table) else {
            return;
        };
        if ctx.policy().is_table_denied(&catalog.schema, &catalog.name) {
            ctx.report(
                ProblemCode::PolicyDenied,
                NodeKind::Table,
                format!("access to table `{}` is denied", catalog.qualified_name()),
            );
        }
    }
}

/// Denied columns cannot be referenced. Columns of a denied table are left
/// to [`TablePolicy`].
pub struct ColumnPolicy;

impl Rule for ColumnPolicy {
    fn name(&self) -> &'static str {
        "column_policy"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ColumnRef
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::ColumnRef(column) = node else {
            return;
        };
        let policy = ctx.policy();
        if policy.is_unrestricted() {
            return;
        }
        let Resolution::Column {
            table: Some((schema, table)),
            ..
        } = ctx.resolve_column(column, false)
        else {
            return;
        };
        if !policy.is_table_denied(&schema, &table)
            && policy.is_column_denied(&schema, &table, &column.name)
        {
            ctx.report(
                ProblemCode::PolicyDenied,
                NodeKind::ColumnRef,
                format!("access to column `{table}.{}` is denied", column.name),
            );
        }
    }
}

/// `*` must not expand to a denied column.
pub struct StarPolicy;

impl Rule for StarPolicy {
    fn name(&self) -> &'static str {
        "star_policy"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Column
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Column(Column::Star { table: qualifier }) = node else {
            return;
        };
        let policy = ctx.policy();
        let Some(scope) = ctx.current_scope() else {
            return;
        };
        let denied = scope
            .visible_sources()
            .filter(|(alias, _)| qualifier.as_deref().is_none_or(|q| same_name(q, alias)))
            .filter_map(|(_, source)| Some((source.table.as_ref()?, source)))
            .filter(|((schema, table), _)| !policy.is_table_denied(schema, table))
            .flat_map(|((schema, table), source)| {
                source
                    .columns
                    .iter()
                    .filter(|c| policy.is_column_denied(schema, table, &c.name))
                    .map(move |c| format!("{table}.{}", c.name))
            })
            .collect::<Vec<_>>();
        for column in denied {
            ctx.report(
                ProblemCode::PolicyDenied,
                NodeKind::Column,
                format!("access to column `{column}` is denied (selected by *)"),
            );
        }
    }
}

/// Only allow-listed functions may be called when an allow-list is set.
pub struct FunctionPolicy;

impl Rule for FunctionPolicy {
    fn name(&self) -> &'static str {
        "function_policy"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Function
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Function(call) = node else {
            return;
        };
        if !ctx.policy().is_function_allowed(&call.name) {
            ctx.report(
                ProblemCode::PolicyDenied,
                NodeKind::Function,
                format!("function `{}` is not allowed", call.name),
            );
        }
    }
}

//! Mutable state threaded through one validation run.
//!
//! The context owns the scope stack, the CTE frames and the problem list.
//! Rules see it through `&mut` and use it both to ask questions (resolve a
//! column, infer a type) and to report findings.
use super::*;
use itertools::Itertools as _;
use std::collections::HashSet;

/// Columns a query produces, as far as they can be known statically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputColumns {
    pub columns: Vec<SourceColumn>,
    /// False when a `*` over a non-strict source hides part of the list.
    pub complete: bool,
}

pub struct ValidationContext<'a> {
    schema: &'a DbSchema,
    functions: &'a FunctionCatalog,
    policy: &'a AccessPolicy,
    dialect: Dialect,
    scopes: Vec<Scope>,
    ctes: Vec<CteFrame>,
    clauses: Vec<String>,
    problems: Vec<ValidationProblem>,
    muted: usize,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        schema: &'a DbSchema,
        functions: &'a FunctionCatalog,
        policy: &'a AccessPolicy,
        dialect: Dialect,
    ) -> Self {
        Self {
            schema,
            functions,
            policy,
            dialect,
            scopes: Vec::new(),
            ctes: vec![CteFrame::new()],
            clauses: Vec::new(),
            problems: Vec::new(),
            muted: 0,
        }
    }

    pub fn schema(&self) -> &'a DbSchema {
        self.schema
    }

    pub fn functions(&self) -> &'a FunctionCatalog {
        self.functions
    }

    pub fn policy(&self) -> &'a AccessPolicy {
        self.policy
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn problems(&self) -> &[ValidationProblem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<ValidationProblem> {
        self.problems
    }

    pub fn report(
        &mut self,
        code: ProblemCode,
        node_kind: impl Into<Option<NodeKind>>,
        message: impl Into<String>,
    ) {
        if self.muted > 0 {
            return;
        }
        let problem = ValidationProblem {
            code,
            message: message.into(),
            node_kind: node_kind.into(),
            clause_path: self.clause_path(),
        };
        trace!(code = %problem.code, "problem reported");
        self.problems.push(problem);
    }

    pub fn clause_path(&self) -> Option<String> {
        (!self.clauses.is_empty()).then(|| self.clauses.join("."))
    }

    pub fn enter_clause(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    pub fn leave_clause(&mut self) {
        self.clauses.pop();
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.hidden = hidden;
        }
    }

    pub fn set_visibility_window(&mut self, window: Option<HashSet<String>>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.set_window(window);
        }
    }

    pub fn register_on_join_visible_aliases(&mut self, join: NodeId, aliases: HashSet<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.set_on_join_visible(join, aliases);
        }
    }

    pub fn on_join_visible_aliases(&self, join: NodeId) -> Option<&HashSet<String>> {
        self.current_scope()?.on_join_visible_aliases(join)
    }

    pub fn set_output_names(&mut self, names: Vec<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.set_output_names(names);
        }
    }

    pub fn is_output_name(&self, name: &str) -> bool {
        self.current_scope().is_some_and(|s| s.is_output_name(name))
    }

    /// Whether `alias` names a source of the innermost scope.
    pub fn is_alias_visible(&self, alias: &str) -> bool {
        self.current_scope()
            .is_some_and(|s| s.contains(alias) && s.is_visible(alias))
    }

    pub fn push_cte_frame(&mut self) {
        let inherited = self.ctes.last().cloned().unwrap_or_default();
        self.ctes.push(inherited);
    }

    pub fn pop_cte_frame(&mut self) {
        if self.ctes.len() > 1 {
            self.ctes.pop();
        }
    }

    pub fn lookup_cte(&self, name: &str) -> Option<&ResolvedSource> {
        self.ctes.last()?.get(&name.to_lowercase())
    }

    pub fn define_cte(&mut self, name: &str, source: ResolvedSource) {
        if let Some(frame) = self.ctes.last_mut() {
            frame.insert(name.to_lowercase(), source);
        }
    }

    /// Makes a recursive CTE visible to its own body before its columns are known.
    pub fn declare_cte_placeholder(&mut self, cte: &Cte) {
        let columns = cte
            .column_aliases
            .iter()
            .map(|a| SourceColumn::new(a.clone(), None))
            .collect();
        self.define_cte(
            &cte.name,
            ResolvedSource::derived(format!("CTE {}", cte.name), columns, false),
        );
    }

    pub fn cte_source(&mut self, cte: &Cte) -> ResolvedSource {
        let output = self.output_columns(&cte.body);
        ResolvedSource::derived(
            format!("CTE {}", cte.name),
            rename(output.columns, &cte.column_aliases),
            output.complete,
        )
    }

    /// Resolves `table` and binds it in the innermost scope. Returns the key
    /// it was bound under; unaliased derived tables get a synthetic one.
    pub fn register_table_ref(&mut self, table: &Table) -> String {
        let source = self.resolve_source(table);
        let alias = match table.reference_name() {
            Some(name) => name.to_string(),
            None => self.synthetic_alias(),
        };
        self.bind(alias.clone(), source);
        alias
    }

    /// Binds a source whose columns cannot be inspected (`NATURAL JOIN`).
    pub fn register_opaque_source(&mut self, text: &str) -> String {
        let alias = self.synthetic_alias();
        self.bind(alias.clone(), ResolvedSource::opaque(text));
        alias
    }

    fn synthetic_alias(&self) -> String {
        let n = self.current_scope().map_or(0, |s| s.aliases().count());
        format!("<source {}>", n + 1)
    }

    fn bind(&mut self, alias: String, source: ResolvedSource) {
        if self.current_scope().is_some_and(|s| s.contains(&alias)) {
            self.report(
                ProblemCode::DuplicateAlias,
                NodeKind::Table,
                format!("table alias `{alias}` is specified more than once"),
            );
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(alias, source);
        }
    }

    fn resolve_source(&mut self, table: &Table) -> ResolvedSource {
        match table {
            Table::Named { schema, name, .. } => {
                if schema.is_none() {
                    if let Some(cte) = self.lookup_cte(name) {
                        return cte.clone();
                    }
                }
                let qualified = match schema {
                    Some(schema) => format!("{schema}.{name}"),
                    None => name.clone(),
                };
                let catalog = self.schema;
                match catalog.find_tables(schema.as_deref(), name).as_slice() {
                    [found] => ResolvedSource::catalog(found),
                    [] => {
                        self.report(
                            ProblemCode::TableNotFound,
                            NodeKind::Table,
                            format!("table `{qualified}` not found"),
                        );
                        ResolvedSource::opaque(qualified)
                    }
                    many => {
                        let schemas = many.iter().map(|t| t.schema.as_str()).join(", ");
                        self.report(
                            ProblemCode::AmbiguousTable,
                            NodeKind::Table,
                            format!("table `{name}` is ambiguous, it exists in schemas {schemas}"),
                        );
                        ResolvedSource::opaque(qualified)
                    }
                }
            }
            Table::Query {
                query,
                alias,
                column_aliases,
                ..
            } => {
                let output = self.output_columns(query);
                let description = format!("derived table {}", alias.as_deref().unwrap_or("?"));
                ResolvedSource::derived(description, rename(output.columns, column_aliases), false)
            }
            Table::Values {
                rows,
                alias,
                column_aliases,
            } => {
                let first = rows.first().map(Vec::as_slice).unwrap_or_default();
                let columns = first
                    .iter()
                    .enumerate()
                    .map(|(i, expr)| {
                        let name = column_aliases
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("column{}", i + 1));
                        SourceColumn::new(name, self.infer_type(expr))
                    })
                    .collect();
                let description = format!("VALUES {}", alias.as_deref().unwrap_or("?"));
                ResolvedSource::derived(description, columns, false)
            }
            Table::Function {
                call,
                alias,
                column_aliases,
                ..
            } => {
                let name = column_aliases
                    .first()
                    .or(alias.as_ref())
                    .unwrap_or(&call.name)
                    .clone();
                let column = SourceColumn::new(name, self.infer_function(call));
                ResolvedSource::derived(format!("function {}", call.name), vec![column], false)
            }
        }
    }

    /// Looks a column up through the scope stack, innermost first.
    ///
    /// With `report` set, failures are recorded as problems; otherwise the
    /// lookup is silent and only the outcome is returned.
    pub fn resolve_column(&mut self, column: &ColumnRef, report: bool) -> Resolution {
        let outcome = match &column.table {
            Some(qualifier) => self.resolve_qualified(qualifier, &column.name),
            None => self.resolve_unqualified(&column.name),
        };
        match outcome {
            Ok(resolution) => resolution,
            Err((code, message)) => {
                if report {
                    self.report(code, NodeKind::ColumnRef, message);
                }
                Resolution::Failed
            }
        }
    }

    fn visible_scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().rev().filter(|s| !s.hidden)
    }

    fn resolve_qualified(
        &self,
        qualifier: &str,
        name: &str,
    ) -> std::result::Result<Resolution, (ProblemCode, String)> {
        let mut outside_window = false;
        for scope in self.visible_scopes() {
            let Some(source) = scope.source(qualifier) else {
                continue;
            };
            if !scope.is_visible(qualifier) {
                outside_window = true;
                continue;
            }
            return match source.column(name) {
                Some(column) => Ok(resolved(qualifier, source, column)),
                None if source.strict => Err((
                    ProblemCode::ColumnNotFound,
                    format!("column `{name}` not found in `{qualifier}` ({})", source.description),
                )),
                None => Ok(Resolution::Unchecked),
            };
        }
        let message = match outside_window {
            true => format!("table alias `{qualifier}` is not visible in this ON clause"),
            false => format!("unknown table alias `{qualifier}`"),
        };
        Err((ProblemCode::UnknownAlias, message))
    }

    fn resolve_unqualified(&self, name: &str) -> std::result::Result<Resolution, (ProblemCode, String)> {
        for scope in self.visible_scopes() {
            let (strict, loose): (Vec<_>, Vec<_>) =
                scope.visible_sources().partition(|(_, s)| s.strict);
            let matches = strict
                .iter()
                .filter_map(|(alias, source)| Some((*alias, *source, source.column(name)?)))
                .collect::<Vec<_>>();
            match matches.as_slice() {
                [(alias, source, column)] => return Ok(resolved(alias, source, column)),
                [] => {}
                many => {
                    let aliases = many.iter().map(|(a, _, _)| format!("`{a}`")).join(", ");
                    return Err((
                        ProblemCode::AmbiguousColumn,
                        format!("column `{name}` is ambiguous between {aliases}"),
                    ));
                }
            }
            if !loose.is_empty() {
                let declared = loose
                    .iter()
                    .filter_map(|(alias, source)| Some((*alias, *source, source.column(name)?)))
                    .collect::<Vec<_>>();
                return Ok(match declared.as_slice() {
                    [(alias, source, column)] => resolved(alias, source, column),
                    _ => Resolution::Unchecked,
                });
            }
        }
        Err((ProblemCode::ColumnNotFound, format!("column `{name}` not found")))
    }

    /// Best-effort static type of `expr`; `None` when unknown.
    pub fn infer_type(&mut self, expr: &Expression) -> Option<DataType> {
        match expr {
            Expression::Literal(Literal::Null) | Expression::Param(_) | Expression::Star => None,
            Expression::Literal(Literal::Bool(_)) => Some(DataType::Boolean),
            Expression::Literal(Literal::String(_)) => Some(DataType::Text),
            Expression::Literal(Literal::Number(text)) => Some(number_type(text)),
            Expression::Column(column) => self.resolve_column(column, false).data_type().cloned(),
            Expression::Function(call) => self.infer_function(call),
            Expression::Cast { data_type, .. } => Some(DataType::from_sql_name(data_type)),
            Expression::Unary { expr, .. } => self.infer_type(expr),
            Expression::Binary {
                op: BinaryOperator::Concat,
                ..
            } => Some(DataType::Text),
            Expression::Binary { left, op, right } => {
                let left = self.infer_type(left)?;
                let right = self.infer_type(right)?;
                arithmetic_type(&left, *op, &right)
            }
            Expression::Subquery(query) => {
                let output = self.output_columns(query);
                match (output.complete, output.columns.as_slice()) {
                    (true, [only]) => only.data_type.clone(),
                    _ => None,
                }
            }
            Expression::Case(case) => case
                .arms
                .iter()
                .map(|arm| &arm.then)
                .chain(case.otherwise.as_deref())
                .find_map(|e| self.infer_type(e)),
        }
    }

    pub fn infer_function(&mut self, call: &FunctionCall) -> Option<DataType> {
        let functions = self.functions;
        match &functions.get(&call.name)?.returns {
            ReturnType::Fixed(data_type) => Some(data_type.clone()),
            ReturnType::SameAsArgument(i) => self.infer_type(call.args.get(*i)?),
        }
    }

    /// Statically derives the columns `query` produces. Never reports.
    pub fn output_columns(&mut self, query: &Query) -> OutputColumns {
        self.muted += 1;
        let output = self.query_output(query);
        self.muted -= 1;
        output
    }

    fn query_output(&mut self, query: &Query) -> OutputColumns {
        match query {
            Query::Select(select) => self.select_output(select),
            Query::Composite(composite) => composite
                .terms()
                .first()
                .map(|term| self.query_output(term))
                .unwrap_or_default(),
            Query::With(with) => {
                self.push_cte_frame();
                for cte in &with.ctes {
                    if with.recursive {
                        self.declare_cte_placeholder(cte);
                    }
                    let source = self.cte_source(cte);
                    self.define_cte(&cte.name, source);
                }
                let output = self.query_output(&with.body);
                self.pop_cte_frame();
                output
            }
        }
    }

    fn select_output(&mut self, select: &Select) -> OutputColumns {
        self.push_scope();
        if let Some(from) = select.from() {
            self.register_table_ref(from);
        }
        for join in select.joins() {
            match join {
                Join::Table(join) => {
                    self.register_table_ref(&join.table);
                }
                Join::Expression(text) => {
                    self.register_opaque_source(text);
                }
            }
        }
        let mut output = OutputColumns {
            columns: Vec::new(),
            complete: true,
        };
        for item in select.items() {
            match item {
                Column::Star { table } => {
                    let Some(scope) = self.current_scope() else {
                        continue;
                    };
                    for (alias, source) in scope.visible_sources() {
                        if table.as_deref().is_some_and(|t| !same_name(t, alias)) {
                            continue;
                        }
                        output.complete &= source.strict;
                        output.columns.extend(source.columns.iter().cloned());
                    }
                }
                other => {
                    let data_type = other.to_expression().and_then(|e| self.infer_type(&e));
                    let name = other.output_name().unwrap_or("?column?");
                    output.columns.push(SourceColumn::new(name, data_type));
                }
            }
        }
        self.pop_scope();
        output
    }

    /// The catalog table behind a named source, if it resolves to exactly one.
    pub fn catalog_table(&self, table: &Table) -> Option<&'a CatalogTable> {
        let Table::Named { schema, name, .. } = table else {
            return None;
        };
        if schema.is_none() && self.lookup_cte(name).is_some() {
            return None;
        }
        let catalog = self.schema;
        match catalog.find_tables(schema.as_deref(), name).as_slice() {
            [found] => Some(*found),
            _ => None,
        }
    }
}

fn resolved(alias: &str, source: &ResolvedSource, column: &SourceColumn) -> Resolution {
    Resolution::Column {
        source: alias.to_string(),
        data_type: column.data_type.clone(),
        table: source.table.clone(),
    }
}

/// Applies positional column aliases over derived output names.
fn rename(mut columns: Vec<SourceColumn>, aliases: &[String]) -> Vec<SourceColumn> {
    for (i, alias) in aliases.iter().enumerate() {
        match columns.get_mut(i) {
            Some(column) => column.name = alias.clone(),
            None => columns.push(SourceColumn::new(alias.clone(), None)),
        }
    }
    columns
}

fn number_type(text: &str) -> DataType {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        DataType::Decimal
    } else if text.parse::<i32>().is_ok() {
        DataType::Integer
    } else if text.parse::<i64>().is_ok() {
        DataType::BigInt
    } else {
        DataType::Decimal
    }
}

fn arithmetic_type(left: &DataType, op: BinaryOperator, right: &DataType) -> Option<DataType> {
    use TypeFamily::{Interval, Temporal};
    match (left.family(), op, right.family()) {
        (Temporal, BinaryOperator::Subtract, Temporal) => Some(DataType::Interval),
        (Temporal, _, Interval) => Some(left.clone()),
        (Interval, BinaryOperator::Add, Temporal) => Some(right.clone()),
        (Interval, _, Interval) => Some(DataType::Interval),
        _ => left.promote(right),
    }
}

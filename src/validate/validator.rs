use super::*;
use std::collections::HashSet;
use tracing::field;

/// Validates parsed queries against a catalog.
///
/// Validation walks the whole tree and collects every problem it can find;
/// it only fails outright when asked to parse the input itself.
///
/// ```rust
/// use sqlscope::*;
///
/// let schema = DbSchema::new([CatalogTable::new("public", "t", [("id", DataType::Integer)])]);
/// let validator = Validator::new(&schema, Dialect::default());
/// let problems = validator.validate_sql("SELECT nope FROM t").unwrap();
/// assert_eq!(ProblemCode::ColumnNotFound, problems[0].code);
/// ```
#[derive(Debug)]
pub struct Validator<'a> {
    schema: &'a DbSchema,
    dialect: Dialect,
    functions: FunctionCatalog,
    policy: AccessPolicy,
    rules: RuleRegistry,
}

impl<'a> Validator<'a> {
    /// Default rules plus the feature gates of `dialect`, the standard
    /// function catalog and no access restrictions.
    pub fn new(schema: &'a DbSchema, dialect: Dialect) -> Self {
        Self {
            schema,
            dialect,
            functions: FunctionCatalog::standard(),
            policy: AccessPolicy::default(),
            rules: RuleRegistry::for_dialect(dialect),
        }
    }

    pub fn with_functions(mut self, functions: FunctionCatalog) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn validate(&self, query: &Query) -> Vec<ValidationProblem> {
        let span = debug_span!("validate", dialect = %self.dialect, problems = field::Empty);
        let _guard = span.enter();

        let mut walker = Walker {
            ctx: ValidationContext::new(self.schema, &self.functions, &self.policy, self.dialect),
            rules: &self.rules,
            composite_outputs: Vec::new(),
        };
        walker.query(query);
        let problems = walker.ctx.into_problems();

        span.record("problems", problems.len());
        for problem in &problems {
            debug!(code = %problem.code, path = ?problem.clause_path, "{}", problem.message);
        }
        problems
    }

    /// Parses `sql` with this validator's dialect, then validates it.
    pub fn validate_sql(&self, sql: &str) -> Result<Vec<ValidationProblem>> {
        let query = Parser::new(self.dialect).query(sql)?;
        Ok(self.validate(&query))
    }
}

/// Depth-first walk that keeps scopes in step with the tree and runs the
/// rules of each node after its children.
struct Walker<'v, 'a> {
    ctx: ValidationContext<'a>,
    rules: &'v RuleRegistry,
    /// Output names of the enclosing set operation, handed to its last
    /// term, whose trailing `ORDER BY` sorts the combined result.
    composite_outputs: Vec<String>,
}

impl Walker<'_, '_> {
    fn check(&mut self, node: Node<'_>) {
        for rule in self.rules.rules_for(node.kind()) {
            trace!(rule = rule.name(), "check");
            rule.check(node, &mut self.ctx);
        }
    }

    fn clause(&mut self, name: impl Into<String>, walk: impl FnOnce(&mut Self)) {
        self.ctx.enter_clause(name);
        walk(self);
        self.ctx.leave_clause();
    }

    fn query(&mut self, query: &Query) {
        match query {
            Query::Select(select) => self.select(select),
            Query::Composite(composite) => {
                let outputs = self.ctx.output_columns(query).columns;
                let last = composite.terms().len().saturating_sub(1);
                for (i, term) in composite.terms().iter().enumerate() {
                    if i == last {
                        self.composite_outputs = outputs.iter().map(|c| c.name.clone()).collect();
                    }
                    self.clause(format!("term[{i}]"), |w| w.query(term));
                }
                self.check(Node::Composite(composite));
            }
            Query::With(with) => {
                self.ctx.push_cte_frame();
                for cte in &with.ctes {
                    self.clause(format!("cte({})", cte.name), |w| w.cte(cte, with.recursive));
                }
                self.query(&with.body);
                self.check(Node::With(with));
                self.ctx.pop_cte_frame();
            }
        }
    }

    fn cte(&mut self, cte: &Cte, recursive: bool) {
        if recursive {
            self.ctx.declare_cte_placeholder(cte);
        }
        self.query(&cte.body);
        let source = self.ctx.cte_source(cte);
        self.ctx.define_cte(&cte.name, source);
        self.check(Node::Cte(cte));
    }

    fn select(&mut self, select: &Select) {
        let composite_outputs = std::mem::take(&mut self.composite_outputs);
        self.ctx.push_scope();

        let mut keys = Vec::new();
        self.clause("from", |w| {
            if let Some(from) = select.from() {
                keys.push(w.source(from));
            }
            for join in select.joins() {
                let key = match join {
                    Join::Table(join) => w.source(&join.table),
                    Join::Expression(text) => w.ctx.register_opaque_source(text),
                };
                keys.push(key);
            }
        });
        for (i, join) in select.joins().iter().enumerate() {
            if let Join::Table(join) = join {
                let visible = keys
                    .iter()
                    .take(i + 2)
                    .map(|k| k.to_lowercase())
                    .collect::<HashSet<_>>();
                self.ctx.register_on_join_visible_aliases(join.id, visible);
            }
        }
        let mut outputs = select
            .items()
            .iter()
            .filter_map(Column::output_name)
            .map(str::to_string)
            .collect::<Vec<_>>();
        self.ctx.set_output_names(outputs.clone());

        self.clause("select", |w| {
            for item in select.items() {
                w.column(item);
            }
        });
        if let Some(Distinct::On(exprs)) = select.distinct() {
            self.clause("distinct_on", |w| exprs.iter().for_each(|e| w.expression(e)));
        }
        for (i, join) in select.joins().iter().enumerate() {
            if let Join::Table(join) = join {
                self.clause(format!("join[{i}]"), |w| w.join(join));
            }
        }
        if let Some(filter) = select.filter() {
            self.clause("where", |w| w.filter(filter));
        }
        if !select.group_by().is_empty() {
            self.clause("group_by", |w| {
                for item in select.group_by() {
                    w.group_item(item);
                }
            });
        }
        if let Some(having) = select.having() {
            self.clause("having", |w| w.filter(having));
        }
        if !composite_outputs.is_empty() {
            outputs.extend(composite_outputs);
            self.ctx.set_output_names(outputs);
        }
        if !select.order_by().is_empty() {
            self.clause("order_by", |w| {
                for item in select.order_by() {
                    w.order_item(item);
                }
            });
        }
        if let Some(limit) = select.limit() {
            self.clause("limit", |w| w.expression(limit));
        }
        if let Some(offset) = select.offset() {
            self.clause("offset", |w| w.expression(offset));
        }

        self.check(Node::Select(select));
        self.ctx.pop_scope();
    }

    /// Walks a `FROM` item's body, then binds it. Returns its scope key.
    fn source(&mut self, table: &Table) -> String {
        if table.is_derived() {
            // Only LATERAL bodies and function arguments see earlier siblings.
            let hide = !table.is_lateral() && !matches!(table, Table::Function { .. });
            self.ctx.set_hidden(hide);
            self.clause("derived", |w| match table {
                Table::Query { query, .. } => w.query(query),
                Table::Values { rows, .. } => rows.iter().flatten().for_each(|e| w.expression(e)),
                Table::Function { call, .. } => w.function(call),
                Table::Named { .. } => {}
            });
            self.ctx.set_hidden(false);
        }
        let key = self.ctx.register_table_ref(table);
        self.check(Node::Table(table));
        key
    }

    fn join(&mut self, join: &TableJoin) {
        if let Some(on) = &join.on {
            let window = self.ctx.on_join_visible_aliases(join.id).cloned();
            self.ctx.set_visibility_window(window);
            self.clause("on", |w| w.filter(on));
            self.ctx.set_visibility_window(None);
        }
        self.check(Node::Join(join));
    }

    fn column(&mut self, item: &Column) {
        match item {
            Column::Named { table, name, .. } => {
                let reference = ColumnRef {
                    table: table.clone(),
                    name: name.clone(),
                };
                self.check(Node::ColumnRef(&reference));
            }
            Column::Expression { expr, .. } => self.expression(expr),
            Column::Function { call, .. } => self.function(call),
            Column::Query { query, .. } => self.subquery(query),
            Column::Case { case, .. } => self.case(case),
            Column::Star { .. } => {}
        }
        self.check(Node::Column(item));
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Column(column) => self.check(Node::ColumnRef(column)),
            Expression::Function(call) => self.function(call),
            Expression::Cast { expr, .. } | Expression::Unary { expr, .. } => self.expression(expr),
            Expression::Binary { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            Expression::Subquery(query) => self.subquery(query),
            Expression::Case(case) => self.case(case),
            Expression::Literal(_) | Expression::Param(_) | Expression::Star => {}
        }
        self.check(Node::Expression(expr));
    }

    fn subquery(&mut self, query: &Query) {
        self.clause("subquery", |w| w.query(query));
    }

    fn function(&mut self, call: &FunctionCall) {
        for arg in &call.args {
            self.expression(arg);
        }
        if let Some(over) = &call.over {
            for expr in &over.partition_by {
                self.expression(expr);
            }
            for item in &over.order_by {
                self.order_item(item);
            }
        }
        self.check(Node::Function(call));
    }

    fn case(&mut self, case: &CaseExpr) {
        if let Some(operand) = &case.operand {
            self.expression(operand);
        }
        for arm in &case.arms {
            self.filter(&arm.when);
            self.expression(&arm.then);
        }
        if let Some(otherwise) = &case.otherwise {
            self.expression(otherwise);
        }
    }

    fn filter(&mut self, filter: &Filter) {
        match filter {
            Filter::Column { column, values, .. } => {
                self.expression(column);
                if let Some(values) = values {
                    self.values(values);
                }
            }
            Filter::Tuple(tuple) => {
                for column in tuple.columns() {
                    self.expression(column);
                }
                self.values(tuple.values());
            }
            Filter::Composite(composite) => {
                for inner in composite.filters() {
                    self.filter(inner);
                }
            }
            Filter::Exists { query, .. } => self.subquery(query),
            Filter::Expression(expr) => self.expression(expr),
        }
        self.check(Node::Filter(filter));
    }

    fn values(&mut self, values: &Values) {
        match values {
            Values::Column(column) => self.check(Node::ColumnRef(column)),
            Values::Subquery(query) => self.subquery(query),
            other => {
                for expr in other.expressions() {
                    self.expression(expr);
                }
            }
        }
    }

    /// A bare name matching a select-list alias refers to that output column.
    fn is_output_alias(&self, key: &GroupItem) -> bool {
        match key {
            GroupItem::Expression(Expression::Column(ColumnRef { table: None, name })) => {
                self.ctx.is_output_name(name)
            }
            _ => false,
        }
    }

    fn group_item(&mut self, item: &GroupItem) {
        if let GroupItem::Expression(expr) = item {
            if !self.is_output_alias(item) {
                self.expression(expr);
            }
        }
        self.check(Node::GroupItem(item));
    }

    fn order_item(&mut self, item: &OrderItem) {
        if let GroupItem::Expression(expr) = &item.key {
            if !self.is_output_alias(&item.key) {
                self.expression(expr);
            }
        }
        self.check(Node::OrderItem(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test_context(CatalogContext)]
    #[test]
    fn clean_queries_have_no_problems(ctx: &mut CatalogContext) {
        for sql in [
            "SELECT id, name FROM users",
            "SELECT u.name, count(o.id) AS n FROM users u \
             LEFT JOIN public.orders o ON o.user_id = u.id \
             GROUP BY u.name HAVING count(o.id) > 1 ORDER BY n DESC LIMIT 10",
            "SELECT now() - created_at FROM users WHERE created_at < now()",
            "WITH recent AS (SELECT user_id, total FROM public.orders) \
             SELECT r.total FROM recent r WHERE r.user_id = $1",
            "SELECT d.n FROM (SELECT count(*) AS n FROM users) AS d",
            "SELECT id FROM users WHERE id IN (SELECT user_id FROM public.orders)",
            "SELECT name FROM users u WHERE EXISTS \
             (SELECT 1 FROM public.orders o WHERE o.user_id = u.id)",
            "SELECT DISTINCT ON (user_id) user_id, total FROM public.orders \
             ORDER BY user_id, created_at DESC",
            "SELECT g FROM generate_series(1, 3) AS g",
            "SELECT v.a FROM (VALUES (1, 'x'), (2, 'y')) AS v (a, b)",
            "SELECT id FROM users UNION SELECT user_id FROM public.orders",
            "SELECT rank() OVER (PARTITION BY status ORDER BY total) FROM public.orders",
            "SELECT u.id, l.total FROM users u, \
             LATERAL (SELECT total FROM public.orders o WHERE o.user_id = u.id) AS l",
            "SELECT id FROM users WHERE name = '5' AND id = '5'",
        ] {
            assert_eq!(Vec::<ProblemCode>::new(), ctx.codes(sql), "{sql}");
        }
    }

    #[test_context(CatalogContext)]
    #[test]
    fn duplicate_alias_reported_once(ctx: &mut CatalogContext) {
        let problems = ctx.validate("SELECT x FROM users a JOIN products a ON a.id = a.id");
        let duplicates = problems
            .iter()
            .filter(|p| p.code == ProblemCode::DuplicateAlias)
            .count();
        assert_eq!(1, duplicates);
    }

    #[test_context(CatalogContext)]
    #[test]
    fn unknown_column_reported_once(ctx: &mut CatalogContext) {
        let problems = ctx.validate("SELECT unknown_col FROM users");
        assert_eq!(1, problems.len());
        assert_eq!(ProblemCode::ColumnNotFound, problems[0].code);
        assert_eq!(Some(NodeKind::ColumnRef), problems[0].node_kind);
        assert_eq!(Some("select"), problems[0].clause_path.as_deref());
    }

    #[rstest]
    #[case("SELECT id FROM nowhere", ProblemCode::TableNotFound)]
    #[case("SELECT id FROM orders", ProblemCode::AmbiguousTable)]
    #[case("SELECT id FROM users, public.orders", ProblemCode::AmbiguousColumn)]
    #[case("SELECT z.id FROM users u", ProblemCode::UnknownAlias)]
    #[case("SELECT z.* FROM users u", ProblemCode::UnknownAlias)]
    #[case(
        "SELECT 1 FROM users a JOIN public.orders b ON c.id = a.id JOIN products c ON c.id = b.id",
        ProblemCode::UnknownAlias
    )]
    #[case("SELECT u.nope FROM users u", ProblemCode::ColumnNotFound)]
    #[case("SELECT id FROM (SELECT name FROM users) d WHERE d.name = u.name", ProblemCode::UnknownAlias)]
    #[case("SELECT 1 FROM users u, (SELECT u.id) d", ProblemCode::UnknownAlias)]
    #[case("SELECT count(id, name) FROM users", ProblemCode::FunctionSignature)]
    #[case("SELECT lower(*) FROM users", ProblemCode::FunctionSignature)]
    #[case("SELECT lower(DISTINCT name) FROM users", ProblemCode::FunctionSignature)]
    #[case("SELECT rank() FROM users", ProblemCode::FunctionSignature)]
    #[case("SELECT id FROM users WHERE count(*) > 1", ProblemCode::ClauseStructure)]
    #[case("SELECT id FROM users GROUP BY sum(id)", ProblemCode::ClauseStructure)]
    #[case("SELECT id FROM users ORDER BY 2", ProblemCode::ClauseStructure)]
    #[case("SELECT id FROM users UNION SELECT id, name FROM users", ProblemCode::ClauseStructure)]
    #[case("WITH c (a, b) AS (SELECT id FROM users) SELECT a FROM c", ProblemCode::ClauseStructure)]
    #[case("SELECT (SELECT id, name FROM users) FROM users", ProblemCode::ClauseStructure)]
    #[case("SELECT id FROM users WHERE id IN (SELECT id, name FROM users)", ProblemCode::ClauseStructure)]
    #[case("SELECT a FROM (VALUES (1, 2), (3)) AS v (a, b)", ProblemCode::ClauseStructure)]
    #[case("SELECT id FROM users LIMIT 'ten'", ProblemCode::LimitOffsetType)]
    #[case("SELECT id FROM users OFFSET -1", ProblemCode::LimitOffsetType)]
    #[case("SELECT id FROM users LIMIT 1.5", ProblemCode::LimitOffsetType)]
    #[case("SELECT id FROM users WHERE name > created_at + 1", ProblemCode::TypeMismatch)]
    #[case("SELECT id FROM users WHERE id LIKE 'a%'", ProblemCode::TypeMismatch)]
    #[case("SELECT id FROM users WHERE created_at = 5", ProblemCode::TypeMismatch)]
    #[case("SELECT name * 2 FROM users", ProblemCode::TypeMismatch)]
    #[case(
        "SELECT DISTINCT ON (user_id) user_id FROM public.orders ORDER BY created_at",
        ProblemCode::DistinctOnOrderBy
    )]
    fn reports_problem(#[case] sql: &str, #[case] expected: ProblemCode) {
        let schema = sample_schema();
        let problems = Validator::new(&schema, Dialect::default())
            .validate_sql(sql)
            .unwrap();
        let codes = problems.iter().map(|p| p.code).collect::<Vec<_>>();
        assert!(codes.contains(&expected), "{sql}: {problems:?}");
    }

    #[rstest]
    #[case(Dialect::Postgres(Version::new(9, 2, 0)), "SELECT 1 FROM users u, LATERAL (SELECT u.id) l", 1)]
    #[case(Dialect::MySql(Version::new(8, 0, 0)), "SELECT 1 FROM users u FULL JOIN products p ON p.id = u.id", 1)]
    #[case(Dialect::MySql(Version::new(8, 0, 0)), "SELECT DISTINCT ON (id) id FROM users", 1)]
    #[case(Dialect::MySql(Version::new(5, 7, 0)), "WITH RECURSIVE c AS (SELECT 1 AS n) SELECT n FROM c", 2)]
    #[case(Dialect::MySql(Version::new(5, 7, 0)), "SELECT row_number() OVER () FROM users", 1)]
    #[case(Dialect::Sqlite(Version::new(3, 30, 0)), "SELECT 1 FROM users u RIGHT JOIN products p ON p.id = u.id", 1)]
    #[case(Dialect::default(), "SELECT 1 FROM users u, LATERAL (SELECT u.id) l", 0)]
    fn dialect_gates(#[case] dialect: Dialect, #[case] sql: &str, #[case] expected: usize) {
        let schema = sample_schema();
        let validator = Validator::new(&schema, dialect);
        let query = parse_query(sql).unwrap();
        let gated = validator
            .validate(&query)
            .into_iter()
            .filter(|p| p.code == ProblemCode::UnsupportedFeature)
            .count();
        assert_eq!(expected, gated, "{sql}");
    }

    #[test]
    fn policy_denials() {
        let schema = sample_schema();
        let policy = AccessPolicy::allow_all()
            .deny_table("products")
            .deny_column("users", "email")
            .allow_functions(["count", "lower"]);
        let validator = Validator::new(&schema, Dialect::default()).with_policy(policy);
        let messages = |sql: &str| {
            validator
                .validate_sql(sql)
                .unwrap()
                .into_iter()
                .filter(|p| p.code == ProblemCode::PolicyDenied)
                .map(|p| p.message)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            vec!["access to table `public.products` is denied"],
            messages("SELECT id FROM products")
        );
        assert_eq!(
            vec!["access to column `users.email` is denied"],
            messages("SELECT lower(u.email) FROM users u")
        );
        assert_eq!(
            vec!["access to column `users.email` is denied (selected by *)"],
            messages("SELECT * FROM users")
        );
        assert_eq!(
            vec!["function `upper` is not allowed"],
            messages("SELECT upper(name) FROM users")
        );
        assert!(messages("SELECT count(*) FROM users").is_empty());
    }

    #[test]
    fn recursive_cte_sees_itself() {
        let schema = sample_schema();
        let validator = Validator::new(&schema, Dialect::default());
        let problems = validator
            .validate_sql(
                "WITH RECURSIVE chain (id, manager_id) AS ( \
                   SELECT id, manager_id FROM users WHERE manager_id IS NULL \
                   UNION ALL \
                   SELECT u.id, u.manager_id FROM users u JOIN chain c ON u.manager_id = c.id) \
                 SELECT id FROM chain",
            )
            .unwrap();
        assert_eq!(Vec::<ValidationProblem>::new(), problems);
    }

    #[test]
    fn strict_cte_reports_missing_columns() {
        let schema = sample_schema();
        let problems = Validator::new(&schema, Dialect::default())
            .validate_sql("WITH c AS (SELECT id FROM users) SELECT c.name FROM c")
            .unwrap();
        assert_eq!(1, problems.len());
        assert_eq!(ProblemCode::ColumnNotFound, problems[0].code);
        assert_eq!(
            "column `name` not found in `c` (CTE c)",
            problems[0].message
        );
    }

    #[test]
    fn clause_paths_locate_problems() {
        let schema = sample_schema();
        let problems = Validator::new(&schema, Dialect::default())
            .validate_sql(
                "WITH c AS (SELECT id FROM users WHERE bogus = 1) \
                 SELECT 1 FROM c JOIN users u ON u.nope = c.id",
            )
            .unwrap();
        let paths = problems
            .iter()
            .map(|p| p.clause_path.as_deref().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(vec!["cte(c).where", "join[0].on"], paths);
    }

    #[test]
    fn select_aliases_usable_in_order_by() {
        let schema = sample_schema();
        let problems = Validator::new(&schema, Dialect::default())
            .validate_sql("SELECT count(*) AS total FROM users GROUP BY name ORDER BY total")
            .unwrap();
        assert!(problems.is_empty(), "{problems:?}");
    }

    #[rstest]
    #[case("SELECT name FROM users UNION SELECT title FROM products ORDER BY name", vec![])]
    #[case("SELECT name AS n FROM users EXCEPT SELECT title FROM products ORDER BY n LIMIT 5", vec![])]
    #[case(
        "SELECT id FROM users UNION ALL SELECT id FROM products INTERSECT SELECT user_id FROM public.orders ORDER BY id",
        vec![]
    )]
    #[case(
        "SELECT name FROM users UNION SELECT title FROM products ORDER BY nope",
        vec!["term[1].order_by"]
    )]
    fn set_operation_order_by_sees_combined_outputs(#[case] sql: &str, #[case] paths: Vec<&str>) {
        let schema = sample_schema();
        let problems = Validator::new(&schema, Dialect::default())
            .validate_sql(sql)
            .unwrap();
        let found = problems
            .iter()
            .map(|p| p.clause_path.as_deref().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(paths, found, "{problems:?}");
    }

    #[test]
    fn parse_errors_surface_from_validate_sql() {
        let schema = sample_schema();
        let err = Validator::new(&schema, Dialect::default())
            .validate_sql("SELECT FROM")
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn custom_registry_replaces_defaults() {
        let schema = sample_schema();
        let validator = Validator::new(&schema, Dialect::default())
            .with_rules(RuleRegistry::new().with(ColumnResolution));
        let problems = validator.validate_sql("SELECT nope FROM nowhere").unwrap();
        // The missing table is reported during registration, not by a rule.
        let codes = problems.iter().map(|p| p.code).collect::<Vec<_>>();
        assert_eq!(vec![ProblemCode::TableNotFound], codes);
    }
}

//! Query shapes: `SELECT` blocks, set operations and `WITH`.
use super::*;
use itertools::Itertools as _;

/// A `GROUP BY` item or `ORDER BY` key: an ordinal position or an expression,
/// never both.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem {
    Ordinal(u32),
    Expression(Expression),
}

impl fmt::Display for GroupItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupItem::Ordinal(n) => write!(f, "{n}"),
            GroupItem::Expression(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Direction {
    #[display("ASC")]
    Asc,
    #[display("DESC")]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NullsOrder {
    #[display("NULLS FIRST")]
    First,
    #[display("NULLS LAST")]
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub key: GroupItem,
    pub direction: Option<Direction>,
    pub nulls: Option<NullsOrder>,
}

impl OrderItem {
    pub fn new(key: GroupItem) -> Self {
        Self {
            key,
            direction: None,
            nulls: None,
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(direction) = self.direction {
            write!(f, " {direction}")?;
        }
        if let Some(nulls) = self.nulls {
            write!(f, " {nulls}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Distinct {
    Distinct,
    /// PostgreSQL `DISTINCT ON (...)`.
    On(Vec<Expression>),
}

/// One `SELECT` block. Assembled through [`SelectBuilder`]; read-only after.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    items: Vec<Column>,
    from: Option<Table>,
    joins: Vec<Join>,
    filter: Option<Filter>,
    group_by: Vec<GroupItem>,
    having: Option<Filter>,
    order_by: Vec<OrderItem>,
    distinct: Option<Distinct>,
    limit: Option<Expression>,
    offset: Option<Expression>,
}

impl Select {
    pub fn builder() -> SelectBuilder {
        SelectBuilder::default()
    }

    /// Builder pre-filled with this block, for deriving a modified copy.
    pub fn to_builder(&self) -> SelectBuilder {
        SelectBuilder {
            select: self.clone(),
        }
    }

    pub fn items(&self) -> &[Column] {
        &self.items
    }

    pub fn from(&self) -> Option<&Table> {
        self.from.as_ref()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// The `WHERE` predicate.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn group_by(&self) -> &[GroupItem] {
        &self.group_by
    }

    pub fn having(&self) -> Option<&Filter> {
        self.having.as_ref()
    }

    pub fn order_by(&self) -> &[OrderItem] {
        &self.order_by
    }

    pub fn distinct(&self) -> Option<&Distinct> {
        self.distinct.as_ref()
    }

    pub fn limit(&self) -> Option<&Expression> {
        self.limit.as_ref()
    }

    pub fn offset(&self) -> Option<&Expression> {
        self.offset.as_ref()
    }

    /// `FROM` source followed by every joined source, in order.
    pub fn sources(&self) -> impl Iterator<Item = &Table> {
        self.from.iter().chain(self.joins.iter().filter_map(|j| match j {
            Join::Table(t) => Some(&t.table),
            Join::Expression(_) => None,
        }))
    }

    fn has_tail(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        match &self.distinct {
            Some(Distinct::Distinct) => f.write_str("DISTINCT ")?,
            Some(Distinct::On(exprs)) => write!(f, "DISTINCT ON ({}) ", exprs.iter().join(", "))?,
            None => {}
        }
        write!(f, "{}", self.items.iter().join(", "))?;
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.iter().join(", "))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.order_by.iter().join(", "))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

/// Accumulates the parts of a `SELECT` block and produces the immutable node.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    select: Select,
}

impl SelectBuilder {
    pub fn item(mut self, column: Column) -> Self {
        self.select.items.push(column);
        self
    }

    pub fn items(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.select.items.extend(columns);
        self
    }

    pub fn from(mut self, table: Table) -> Self {
        self.select.from = Some(table);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.select.joins.push(join);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.select.filter = Some(filter);
        self
    }

    pub fn group_by(mut self, items: Vec<GroupItem>) -> Self {
        self.select.group_by = items;
        self
    }

    pub fn having(mut self, filter: Filter) -> Self {
        self.select.having = Some(filter);
        self
    }

    pub fn order_by(mut self, items: Vec<OrderItem>) -> Self {
        self.select.order_by = items;
        self
    }

    pub fn distinct(mut self, distinct: Distinct) -> Self {
        self.select.distinct = Some(distinct);
        self
    }

    pub fn limit(mut self, limit: Expression) -> Self {
        self.select.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: Expression) -> Self {
        self.select.offset = Some(offset);
        self
    }

    pub fn build(self) -> Select {
        self.select
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SetOperator {
    #[display("UNION")]
    Union,
    #[display("UNION ALL")]
    UnionAll,
    #[display("INTERSECT")]
    Intersect,
    #[display("INTERSECT ALL")]
    IntersectAll,
    #[display("EXCEPT")]
    Except,
    #[display("EXCEPT ALL")]
    ExceptAll,
}

/// Set operation over `terms`; `operators.len() == terms.len() - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeQuery {
    terms: Vec<Query>,
    operators: Vec<SetOperator>,
}

impl CompositeQuery {
    pub fn new(terms: Vec<Query>, operators: Vec<SetOperator>) -> Result<Self, String> {
        if terms.len() < 2 || operators.len() + 1 != terms.len() {
            return Err(format!(
                "set operation needs n terms and n-1 operators, got {} and {}",
                terms.len(),
                operators.len()
            ));
        }
        Ok(Self { terms, operators })
    }

    pub fn terms(&self) -> &[Query] {
        &self.terms
    }

    pub fn operators(&self) -> &[SetOperator] {
        &self.operators
    }
}

/// CTE definition: `name [(cols)] AS (body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub column_aliases: Vec<String>,
    pub body: Query,
}

impl fmt::Display for Cte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ident(&self.name))?;
        write_column_aliases(f, &self.column_aliases)?;
        write!(f, " AS ({})", self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithQuery {
    pub ctes: Vec<Cte>,
    pub recursive: bool,
    pub body: Box<Query>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Box<Select>),
    Composite(CompositeQuery),
    With(WithQuery),
}

impl Query {
    /// Leftmost `SELECT` block: the one that names the output columns.
    pub fn first_select(&self) -> Option<&Select> {
        match self {
            Query::Select(s) => Some(s),
            Query::Composite(c) => c.terms.first().and_then(Query::first_select),
            Query::With(w) => w.body.first_select(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Query::Select(_) => NodeKind::Select,
            Query::Composite(_) => NodeKind::CompositeQuery,
            Query::With(_) => NodeKind::With,
        }
    }
}

impl From<Select> for Query {
    fn from(select: Select) -> Self {
        Query::Select(Box::new(select))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Select(s) => write!(f, "{s}"),
            Query::Composite(c) => {
                let last = c.terms.len() - 1;
                for (i, term) in c.terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", c.operators[i - 1])?;
                    }
                    let wrap = match term {
                        Query::Select(s) => i != last && s.has_tail(),
                        Query::Composite(_) | Query::With(_) => true,
                    };
                    match wrap {
                        true => write!(f, "({term})")?,
                        false => write!(f, "{term}")?,
                    }
                }
                Ok(())
            }
            Query::With(w) => {
                f.write_str("WITH ")?;
                if w.recursive {
                    f.write_str("RECURSIVE ")?;
                }
                write!(f, "{} {}", w.ctes.iter().join(", "), w.body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(table: &str) -> Select {
        Select::builder()
            .item(Column::named("id"))
            .from(Table::named(table))
            .build()
    }

    #[test]
    fn builder_produces_immutable_select() {
        let s = Select::builder()
            .item(Column::named("a"))
            .item(Column::Star { table: None })
            .from(Table::named("t"))
            .filter(Filter::Expression(Expression::column("active")))
            .limit(Expression::number("10"))
            .build();
        assert_eq!(s.items().len(), 2);
        assert_eq!(s.to_string(), "SELECT a, * FROM t WHERE active LIMIT 10");
        let derived = s.to_builder().offset(Expression::number("5")).build();
        assert_eq!(s.offset(), None);
        assert_eq!(derived.offset(), Some(&Expression::number("5")));
    }

    #[test]
    fn composite_operator_count_is_terms_minus_one() {
        let terms = vec![Query::from(select("a")), Query::from(select("b"))];
        assert!(CompositeQuery::new(terms.clone(), vec![]).is_err());
        let composite = CompositeQuery::new(terms, vec![SetOperator::UnionAll]).unwrap();
        assert_eq!(composite.operators().len(), composite.terms().len() - 1);
        assert_eq!(
            Query::Composite(composite).to_string(),
            "SELECT id FROM a UNION ALL SELECT id FROM b"
        );
    }

    #[test]
    fn with_query_rendering_and_first_select() {
        let with = Query::With(WithQuery {
            ctes: vec![Cte {
                name: "recent".into(),
                column_aliases: vec!["id".into()],
                body: Query::from(select("orders")),
            }],
            recursive: false,
            body: Box::new(Query::from(select("recent"))),
        });
        assert_eq!(
            with.to_string(),
            "WITH recent(id) AS (SELECT id FROM orders) SELECT id FROM recent"
        );
        assert_eq!(with.kind(), NodeKind::With);
        assert!(with.first_select().is_some());
    }
}

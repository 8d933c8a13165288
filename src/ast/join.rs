//! Join clauses.
use super::*;
use itertools::Itertools as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum JoinKind {
    #[display("INNER JOIN")]
    Inner,
    #[display("LEFT JOIN")]
    Left,
    #[display("RIGHT JOIN")]
    Right,
    #[display("FULL JOIN")]
    Full,
    #[display("CROSS JOIN")]
    Cross,
}

/// A join against a source. `id` keys the ON-visibility side table and is
/// ignored by equality.
#[derive(Debug, Clone)]
pub struct TableJoin {
    pub id: NodeId,
    pub kind: JoinKind,
    pub table: Table,
    pub on: Option<Filter>,
    pub using: Vec<String>,
}

impl PartialEq for TableJoin {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.table == other.table
            && self.on == other.on
            && self.using == other.using
    }
}

impl TableJoin {
    pub fn new(kind: JoinKind, table: Table, on: Option<Filter>) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            table,
            on,
            using: Vec::new(),
        }
    }

    pub fn with_using(self, using: Vec<String>) -> Self {
        Self { using, ..self }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    Table(TableJoin),
    /// Join shape the grammar keeps as text (e.g. `NATURAL JOIN t`).
    Expression(String),
}

impl Join {
    pub fn table(kind: JoinKind, table: Table, on: Option<Filter>) -> Self {
        Join::Table(TableJoin::new(kind, table, on))
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Join::Table(join) => {
                write!(f, "{} {}", join.kind, join.table)?;
                if let Some(on) = &join.on {
                    write!(f, " ON {on}")?;
                }
                if !join.using.is_empty() {
                    write!(f, " USING ({})", join.using.iter().map(|c| Ident(c)).join(", "))?;
                }
                Ok(())
            }
            Join::Expression(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_table_join_gets_its_own_id() {
        let a = TableJoin::new(JoinKind::Inner, Table::named("a"), None);
        let b = TableJoin::new(JoinKind::Inner, Table::named("a"), None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn renders_on_and_using() {
        let on = Filter::column(
            Expression::Column(ColumnRef::qualified("a", "id")),
            Operator::Eq,
            Some(Values::Column(ColumnRef::qualified("b", "a_id"))),
        );
        let join = Join::table(JoinKind::Left, Table::named("b"), Some(on));
        assert_eq!(join.to_string(), "LEFT JOIN b ON a.id = b.a_id");
        let using = Join::Table(
            TableJoin::new(JoinKind::Inner, Table::named("c"), None).with_using(vec!["id".into()]),
        );
        assert_eq!(using.to_string(), "INNER JOIN c USING (id)");
    }
}

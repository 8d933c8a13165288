//! Immutable AST produced by the parsers and consumed by rendering and
//! validation.
//!
//! Every node family is a closed enum so consumers must handle each variant.
//! Nodes are plain data: the only "setters" are consuming `with_*` methods
//! that return a new node, and [`SelectBuilder`] for assembling a `SELECT`.
//! `Display` renders canonical SQL.

crate::reexport!(expression);
crate::reexport!(column);
crate::reexport!(filter);
crate::reexport!(join);
crate::reexport!(table);
crate::reexport!(query);

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Sequential identity assigned to nodes that carry side-table metadata
/// (currently table joins). Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("#{_0}")]
pub struct NodeId(u32);

impl NodeId {
    pub fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Node type tag, used to key validation rules and to localize problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NodeKind {
    #[display("select")]
    Select,
    #[display("composite_query")]
    CompositeQuery,
    #[display("with")]
    With,
    #[display("cte")]
    Cte,
    #[display("column")]
    Column,
    #[display("filter")]
    Filter,
    #[display("join")]
    Join,
    #[display("table")]
    Table,
    #[display("group_item")]
    GroupItem,
    #[display("order_item")]
    OrderItem,
    #[display("expression")]
    Expression,
    #[display("column_ref")]
    ColumnRef,
    #[display("function")]
    Function,
}

/// True if `name` can be rendered without quotes.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && crate::sql::Keyword::from_upper(&name.to_uppercase()).is_none()
}

/// Identifier wrapper whose `Display` adds `"` quoting only when needed.
pub struct Ident<'a>(pub &'a str);

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match is_plain_identifier(self.0) {
            true => f.write_str(self.0),
            false => write!(f, "\"{}\"", self.0.replace('"', "\"\"")),
        }
    }
}

/// Renders `[qualifier.]name`.
pub(crate) fn write_qualified(
    f: &mut fmt::Formatter<'_>,
    qualifier: Option<&str>,
    name: &str,
) -> fmt::Result {
    if let Some(q) = qualifier {
        write!(f, "{}.", Ident(q))?;
    }
    write!(f, "{}", Ident(name))
}

/// Renders ` AS alias` when present.
pub(crate) fn write_alias(f: &mut fmt::Formatter<'_>, alias: Option<&str>) -> fmt::Result {
    match alias {
        Some(a) => write!(f, " AS {}", Ident(a)),
        None => Ok(()),
    }
}

/// Renders `(a, b)` when the list is non-empty.
pub(crate) fn write_column_aliases(f: &mut fmt::Formatter<'_>, aliases: &[String]) -> fmt::Result {
    if aliases.is_empty() {
        return Ok(());
    }
    use itertools::Itertools as _;
    write!(f, "({})", aliases.iter().map(|a| Ident(a)).join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_sequential_and_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert!(b.get() > a.get());
        assert_ne!(a, b);
    }

    #[test]
    fn identifiers_are_quoted_only_when_needed() {
        assert_eq!(Ident("users").to_string(), "users");
        assert_eq!(Ident("User Name").to_string(), "\"User Name\"");
        assert_eq!(Ident("order").to_string(), "\"order\"");
        assert_eq!(Ident("a\"b").to_string(), "\"a\"\"b\"");
    }
}

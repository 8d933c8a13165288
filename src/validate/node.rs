use super::*;

/// Borrowed view of an AST node handed to rules.
#[derive(Debug, Clone, Copy)]
pub enum Node<'n> {
    Select(&'n Select),
    Composite(&'n CompositeQuery),
    With(&'n WithQuery),
    Cte(&'n Cte),
    Column(&'n Column),
    Filter(&'n Filter),
    Join(&'n TableJoin),
    Table(&'n Table),
    GroupItem(&'n GroupItem),
    OrderItem(&'n OrderItem),
    Expression(&'n Expression),
    ColumnRef(&'n ColumnRef),
    Function(&'n FunctionCall),
}

impl Node<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Select(_) => NodeKind::Select,
            Node::Composite(_) => NodeKind::CompositeQuery,
            Node::With(_) => NodeKind::With,
            Node::Cte(_) => NodeKind::Cte,
            Node::Column(_) => NodeKind::Column,
            Node::Filter(_) => NodeKind::Filter,
            Node::Join(_) => NodeKind::Join,
            Node::Table(_) => NodeKind::Table,
            Node::GroupItem(_) => NodeKind::GroupItem,
            Node::OrderItem(_) => NodeKind::OrderItem,
            Node::Expression(_) => NodeKind::Expression,
            Node::ColumnRef(_) => NodeKind::ColumnRef,
            Node::Function(_) => NodeKind::Function,
        }
    }
}

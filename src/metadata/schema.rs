use super::*;
use itertools::Itertools;

/// Every table the validator knows about, across all schemas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DbSchema {
    tables: Vec<CatalogTable>,
}

impl DbSchema {
    pub fn new(tables: impl IntoIterator<Item = CatalogTable>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn with_table(mut self, table: CatalogTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[CatalogTable] {
        &self.tables
    }

    /// Tables matching `name`, restricted to `schema` when one is given.
    /// More than one match means an unqualified name is ambiguous.
    pub fn find_tables(&self, schema: Option<&str>, name: &str) -> Vec<&CatalogTable> {
        self.tables
            .iter()
            .filter(|t| same_name(&t.name, name))
            .filter(|t| schema.is_none_or(|s| same_name(&t.schema, s)))
            .collect()
    }

    pub fn schemas(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.schema.as_str()).unique().collect()
    }
}

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogTable {
    pub schema: String,
    pub name: String,
    columns: Vec<CatalogColumn>,
}

impl CatalogTable {
    /// Construct a table from an ordered list of `(name, DataType)` pairs.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (impl Into<String>, DataType)>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|(n, dt)| CatalogColumn::new(n, dt))
                .collect(),
        }
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&CatalogColumn> {
        self.columns.iter().find(|c| same_name(&c.name, name))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

use super::*;
use std::collections::{HashMap, HashSet};

/// A column as exposed by a registered source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceColumn {
    pub name: String,
    pub data_type: Option<DataType>,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, data_type: Option<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// What a `FROM` alias points at once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    /// Human-readable origin used in messages.
    pub description: String,
    pub columns: Vec<SourceColumn>,
    /// A strict source knows its full column list, so a miss is an error.
    pub strict: bool,
    /// Backing catalog table as `(schema, name)`.
    pub table: Option<(String, String)>,
}

impl ResolvedSource {
    pub fn catalog(table: &CatalogTable) -> Self {
        Self {
            description: table.qualified_name(),
            columns: table
                .columns()
                .iter()
                .map(|c| SourceColumn::new(c.name.clone(), Some(c.data_type.clone())))
                .collect(),
            strict: true,
            table: Some((table.schema.clone(), table.name.clone())),
        }
    }

    pub fn derived(description: impl Into<String>, columns: Vec<SourceColumn>, strict: bool) -> Self {
        Self {
            description: description.into(),
            columns,
            strict,
            table: None,
        }
    }

    /// Placeholder for a source that failed to resolve or cannot be inspected.
    pub fn opaque(description: impl Into<String>) -> Self {
        Self::derived(description, Vec::new(), false)
    }

    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|c| same_name(&c.name, name))
    }
}

/// Name-resolution frame for one `SELECT`.
#[derive(Debug, Default)]
pub struct Scope {
    sources: Vec<(String, ResolvedSource)>,
    on_join_visible: HashMap<NodeId, HashSet<String>>,
    /// Lower-cased aliases visible while walking an `ON` condition.
    window: Option<HashSet<String>>,
    /// Set while the body of a non-lateral derived table is walked.
    pub(crate) hidden: bool,
    output_names: Vec<String>,
}

impl Scope {
    pub fn source(&self, alias: &str) -> Option<&ResolvedSource> {
        self.sources
            .iter()
            .find(|(a, _)| same_name(a, alias))
            .map(|(_, s)| s)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.source(alias).is_some()
    }

    pub fn is_visible(&self, alias: &str) -> bool {
        self.window
            .as_ref()
            .is_none_or(|w| w.contains(&alias.to_lowercase()))
    }

    /// Sources in registration order, restricted to the current `ON` window.
    pub fn visible_sources(&self) -> impl Iterator<Item = (&str, &ResolvedSource)> {
        self.sources
            .iter()
            .filter(|(a, _)| self.is_visible(a))
            .map(|(a, s)| (a.as_str(), s))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(a, _)| a.as_str())
    }

    pub fn is_output_name(&self, name: &str) -> bool {
        self.output_names.iter().any(|n| same_name(n, name))
    }

    pub fn on_join_visible_aliases(&self, join: NodeId) -> Option<&HashSet<String>> {
        self.on_join_visible.get(&join)
    }

    pub(crate) fn insert(&mut self, alias: String, source: ResolvedSource) {
        self.sources.push((alias, source));
    }

    pub(crate) fn set_on_join_visible(&mut self, join: NodeId, aliases: HashSet<String>) {
        self.on_join_visible.insert(join, aliases);
    }

    pub(crate) fn set_window(&mut self, window: Option<HashSet<String>>) {
        self.window = window;
    }

    pub(crate) fn set_output_names(&mut self, names: Vec<String>) {
        self.output_names = names;
    }
}

/// CTE names in effect, keyed lower-case. Inner `WITH` frames shadow outer.
pub type CteFrame = HashMap<String, ResolvedSource>;

/// Outcome of looking a column reference up.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Column {
        source: String,
        data_type: Option<DataType>,
        table: Option<(String, String)>,
    },
    /// A non-strict source may provide it, so nothing can be said.
    Unchecked,
    Failed,
}

impl Resolution {
    pub fn data_type(&self) -> Option<&DataType> {
        match self {
            Resolution::Column { data_type, .. } => data_type.as_ref(),
            _ => None,
        }
    }
}

use crate::*;
use confique::Config as _;
use std::sync::OnceLock;

/// Runtime settings, read from `SQLSCOPE_*` environment variables and an
/// optional file named by `SQLSCOPE_CONFIG`. The environment wins.
#[derive(Debug, confique::Config)]
pub struct Config {
    /// `postgres`, `mysql`, `sqlite` or `ansi`.
    #[config(env = "SQLSCOPE_DIALECT", default = "postgres")]
    pub dialect: String,
    #[config(env = "SQLSCOPE_DIALECT_VERSION")]
    pub dialect_version: Option<String>,
    /// Bare or schema-qualified table names.
    #[config(
        env = "SQLSCOPE_DENIED_TABLES",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub denied_tables: Vec<String>,
    /// `table.column` or `schema.table.column`.
    #[config(
        env = "SQLSCOPE_DENIED_COLUMNS",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub denied_columns: Vec<String>,
    /// When set, only these functions may be called.
    #[config(env = "SQLSCOPE_ALLOWED_FUNCTIONS", parse_env = confique::env::parse::list_by_comma)]
    pub allowed_functions: Option<Vec<String>>,
    /// Catalog columns as `[schema.]table.column:type`, schema defaulting to
    /// `public`. Statements are only validated when this is non-empty.
    #[config(
        env = "SQLSCOPE_CATALOG",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub catalog: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().env();
        if let Ok(path) = std::env::var("SQLSCOPE_CONFIG") {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_name(&self.dialect, self.dialect_version.as_deref()).map_err(Error::Config)
    }

    pub fn policy(&self) -> Result<AccessPolicy> {
        let mut policy = AccessPolicy::allow_all().deny_tables(&self.denied_tables);
        for entry in &self.denied_columns {
            let Some((table, column)) = entry.rsplit_once('.') else {
                return Err(Error::Config(format!(
                    "denied column `{entry}` must be written as table.column"
                )));
            };
            policy = policy.deny_column(table, column);
        }
        if let Some(allowed) = &self.allowed_functions {
            policy = policy.allow_functions(allowed);
        }
        Ok(policy)
    }

    /// Groups the `catalog` entries into tables, keeping column order.
    pub fn schema(&self) -> Result<DbSchema> {
        let mut tables: Vec<((String, String), Vec<(String, DataType)>)> = Vec::new();
        for entry in &self.catalog {
            let (schema, table, column, data_type) = catalog_entry(entry)?;
            let existing = tables.iter().position(|((s, t), _)| {
                s.eq_ignore_ascii_case(&schema) && t.eq_ignore_ascii_case(&table)
            });
            match existing {
                Some(i) => tables[i].1.push((column, data_type)),
                None => tables.push(((schema, table), vec![(column, data_type)])),
            }
        }
        Ok(DbSchema::new(tables.into_iter().map(|((schema, table), columns)| {
            CatalogTable::new(schema, table, columns)
        })))
    }
}

fn catalog_entry(entry: &str) -> Result<(String, String, String, DataType)> {
    let malformed = || {
        Error::Config(format!(
            "catalog entry `{entry}` must be written as [schema.]table.column:type"
        ))
    };
    let (path, data_type) = entry.split_once(':').ok_or_else(malformed)?;
    let parts = path.trim().split('.').collect::<Vec<_>>();
    let (schema, table, column) = match parts.as_slice() {
        [table, column] => ("public", *table, *column),
        [schema, table, column] => (*schema, *table, *column),
        _ => return Err(malformed()),
    };
    if [schema, table, column].iter().any(|p| p.is_empty()) || data_type.trim().is_empty() {
        return Err(malformed());
    }
    Ok((
        schema.to_string(),
        table.to_string(),
        column.to_string(),
        DataType::from_sql_name(data_type),
    ))
}

/// Process-wide configuration, loaded on first use.
pub fn config() -> Result<&'static Config> {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let loaded = Config::load()?;
    debug!(dialect = %loaded.dialect, "configuration loaded");
    Ok(CONFIG.get_or_init(|| loaded))
}

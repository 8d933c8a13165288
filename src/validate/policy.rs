use std::collections::HashSet;

/// Access restrictions layered over the catalog.
///
/// Tables and columns are matched case-insensitively, either bare
/// (`users`, `users.email`) or schema-qualified (`hr.users`,
/// `hr.users.email`). A `None` allow-list permits every function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessPolicy {
    denied_tables: HashSet<String>,
    denied_columns: HashSet<String>,
    allowed_functions: Option<HashSet<String>>,
}

impl AccessPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny_table(mut self, table: &str) -> Self {
        self.denied_tables.insert(table.to_lowercase());
        self
    }

    pub fn deny_tables<S: AsRef<str>>(self, tables: impl IntoIterator<Item = S>) -> Self {
        tables
            .into_iter()
            .fold(self, |policy, table| policy.deny_table(table.as_ref()))
    }

    pub fn deny_column(mut self, table: &str, column: &str) -> Self {
        self.denied_columns
            .insert(format!("{table}.{column}").to_lowercase());
        self
    }

    /// Restricts calls to the named functions.
    pub fn allow_functions<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let allowed = self.allowed_functions.get_or_insert_with(HashSet::new);
        allowed.extend(names.into_iter().map(|n| n.as_ref().to_lowercase()));
        self
    }

    pub fn is_table_denied(&self, schema: &str, table: &str) -> bool {
        let table = table.to_lowercase();
        self.denied_tables.contains(&table)
            || self
                .denied_tables
                .contains(&format!("{}.{table}", schema.to_lowercase()))
    }

    pub fn is_column_denied(&self, schema: &str, table: &str, column: &str) -> bool {
        let short = format!("{table}.{column}").to_lowercase();
        self.denied_columns.contains(&short)
            || self
                .denied_columns
                .contains(&format!("{}.{short}", schema.to_lowercase()))
    }

    pub fn is_function_allowed(&self, name: &str) -> bool {
        self.allowed_functions
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&name.to_lowercase()))
    }

    pub fn is_unrestricted(&self) -> bool {
        self.denied_tables.is_empty()
            && self.denied_columns.is_empty()
            && self.allowed_functions.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("users", "public", "users", true)]
    #[case("users", "hr", "USERS", true)]
    #[case("hr.users", "hr", "users", true)]
    #[case("hr.users", "public", "users", false)]
    #[case("orders", "public", "users", false)]
    fn table_denial(
        #[case] denied: &str,
        #[case] schema: &str,
        #[case] table: &str,
        #[case] expected: bool,
    ) {
        let policy = AccessPolicy::allow_all().deny_table(denied);
        assert_eq!(expected, policy.is_table_denied(schema, table));
    }

    #[rstest]
    #[case("users", "email", true)]
    #[case("public.users", "EMAIL", true)]
    #[case("hr.users", "email", false)]
    #[case("users", "name", false)]
    #[case("products", "email", false)]
    fn column_denial(#[case] table: &str, #[case] column: &str, #[case] expected: bool) {
        let policy = AccessPolicy::allow_all().deny_column(table, "email");
        assert_eq!(expected, policy.is_column_denied("public", "users", column));
    }

    #[test]
    fn function_allow_list() {
        let open = AccessPolicy::allow_all();
        assert!(open.is_function_allowed("pg_sleep"));
        assert!(open.is_unrestricted());

        let closed = open.allow_functions(["count", "Lower"]);
        assert!(closed.is_function_allowed("COUNT"));
        assert!(closed.is_function_allowed("lower"));
        assert!(!closed.is_function_allowed("pg_sleep"));
    }
}

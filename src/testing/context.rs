use crate::testing::*;
pub use test_context::{TestContext, test_context};

/// Validation harness over [`sample_schema`].
pub struct CatalogContext {
    pub schema: DbSchema,
    pub dialect: Dialect,
    pub policy: AccessPolicy,
}

impl CatalogContext {
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.schema, self.dialect).with_policy(self.policy.clone())
    }

    pub fn validate(&self, sql: &str) -> Vec<ValidationProblem> {
        self.validator()
            .validate_sql(sql)
            .unwrap_or_else(|e| panic!("`{sql}` should parse: {e}"))
    }

    pub fn codes(&self, sql: &str) -> Vec<ProblemCode> {
        self.validate(sql).into_iter().map(|p| p.code).collect()
    }
}

impl TestContext for CatalogContext {
    fn setup() -> Self {
        crate::testing::common_init();
        Self {
            schema: sample_schema(),
            dialect: Dialect::default(),
            policy: AccessPolicy::default(),
        }
    }
}

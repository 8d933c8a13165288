#![cfg(test)]
mod context;
#[allow(unused_imports)]
pub use self::context::*;
pub use rstest::*;

use crate::*;

pub(in crate::testing) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Catalog shared by the validation tests. `orders` exists in two schemas so
/// unqualified references to it are ambiguous.
#[fixture]
pub fn sample_schema() -> DbSchema {
    use DataType::*;
    DbSchema::new([
        CatalogTable::new(
            "public",
            "users",
            [
                ("id", Integer),
                ("name", Text),
                ("email", VarChar(Some(255))),
                ("created_at", Timestamptz),
                ("manager_id", Integer),
            ],
        ),
        CatalogTable::new(
            "public",
            "orders",
            [
                ("id", Integer),
                ("user_id", Integer),
                ("total", Decimal),
                ("status", Text),
                ("created_at", Timestamptz),
            ],
        ),
        CatalogTable::new(
            "public",
            "products",
            [("id", Integer), ("title", Text), ("price", Decimal)],
        ),
        CatalogTable::new(
            "archive",
            "orders",
            [("id", Integer), ("user_id", Integer), ("closed_at", Date)],
        ),
    ])
}

mod sample_schema_tests {
    use super::*;

    #[rstest]
    fn orders_is_ambiguous(sample_schema: DbSchema) {
        assert_eq!(2, sample_schema.find_tables(None, "orders").len());
        assert_eq!(1, sample_schema.find_tables(Some("archive"), "orders").len());
    }

    #[test_context(CatalogContext)]
    #[test]
    fn context_validates_against_fixture(ctx: &mut CatalogContext) {
        assert!(ctx.codes("SELECT name FROM users").is_empty());
        assert_eq!(
            vec![ProblemCode::TableNotFound],
            ctx.codes("SELECT 1 FROM missing")
        );
    }
}

//! Hand-rolled SQL front end: a lexer and parser producing an immutable AST,
//! and a schema-aware validator that reports unresolvable references, alias
//! clashes, type mismatches and dialect gaps.
//!
//! ```rust
//! use sqlscope::*;
//!
//! let schema = DbSchema::new(vec![CatalogTable::new(
//!     "public",
//!     "users",
//!     [("id", DataType::Integer), ("name", DataType::Text)],
//! )]);
//! let query = parse_query("SELECT name FROM users WHERE id = 1").unwrap();
//! let problems = Validator::new(&schema, Dialect::default()).validate(&query);
//! assert!(problems.is_empty());
//! ```

#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        pub mod $module;
        #[allow(unused_imports)]
        #[allow(ambiguous_glob_reexports)]
        pub use $module::*;
    };
    ($module:ident, test) => {
        #[cfg(test)]
        pub mod $module;
        #[cfg(test)]
        #[allow(unused_imports)]
        #[allow(ambiguous_glob_reexports)]
        pub use $module::*;
    };
}

reexport!(testing, test);
reexport!(config);
reexport!(error);
reexport!(sql);
reexport!(ast);
reexport!(parser);
reexport!(logic);
reexport!(metadata);
reexport!(validate);
#[allow(unused_imports)]
pub(crate) use tracing::{debug, debug_span, error, info, span, trace, warn};

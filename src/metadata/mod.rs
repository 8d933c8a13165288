//! Immutable catalog the validator resolves names against.
//!
//! A [`DbSchema`] is built once (by hand, from a fixture or from whatever
//! loader the host has) and shared read-only across validations.

crate::reexport!(column);
crate::reexport!(table);
crate::reexport!(schema);
crate::reexport!(function);

use crate::DataType;

/// Case-insensitive name comparison used for every catalog lookup.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

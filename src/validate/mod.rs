//! Schema-aware validation of parsed queries.
//!
//! A [`Validator`] walks the AST once, keeping a stack of [`Scope`]s in step
//! with the `SELECT`s it enters, and runs the [`Rule`]s registered for each
//! node kind. Problems are collected, never thrown.

crate::reexport!(problem);
crate::reexport!(policy);
crate::reexport!(scope);
crate::reexport!(context);
crate::reexport!(node);
crate::reexport!(rule);
crate::reexport!(rules);
crate::reexport!(validator);

use crate::metadata::same_name;
use crate::*;

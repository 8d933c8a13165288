use super::*;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnType {
    Fixed(DataType),
    /// The type of the argument at this position.
    SameAsArgument(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub min_args: usize,
    /// `None` for variadic functions.
    pub max_args: Option<usize>,
    pub returns: ReturnType,
    pub aggregate: bool,
    pub window_only: bool,
}

impl FunctionSignature {
    pub fn scalar(name: &str, min_args: usize, max_args: Option<usize>, returns: ReturnType) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            min_args,
            max_args,
            returns,
            aggregate: false,
            window_only: false,
        }
    }

    pub fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    pub fn window_only(mut self) -> Self {
        self.window_only = true;
        self
    }

    pub fn accepts(&self, arity: usize) -> bool {
        arity >= self.min_args && self.max_args.is_none_or(|max| arity <= max)
    }

    pub fn arity_text(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{max}", self.min_args),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// Known functions keyed by lower-cased name. Calls to unknown functions are
/// not checked.
#[derive(Clone, Debug, Default)]
pub struct FunctionCatalog {
    functions: HashMap<String, FunctionSignature>,
}

impl FunctionCatalog {
    pub fn new(functions: impl IntoIterator<Item = FunctionSignature>) -> Self {
        Self {
            functions: functions.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    pub fn with(mut self, signature: FunctionSignature) -> Self {
        self.functions.insert(signature.name.clone(), signature);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn is_aggregate(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.aggregate)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Common aggregate, window and scalar functions shared by the supported dialects.
    pub fn standard() -> Self {
        use DataType::*;
        use ReturnType::{Fixed, SameAsArgument as Same};
        let f = FunctionSignature::scalar;
        Self::new([
            f("count", 0, Some(1), Fixed(BigInt)).aggregate(),
            f("sum", 1, Some(1), Same(0)).aggregate(),
            f("avg", 1, Some(1), Fixed(Decimal)).aggregate(),
            f("min", 1, Some(1), Same(0)).aggregate(),
            f("max", 1, Some(1), Same(0)).aggregate(),
            f("string_agg", 2, Some(2), Fixed(Text)).aggregate(),
            f("bool_and", 1, Some(1), Fixed(Boolean)).aggregate(),
            f("bool_or", 1, Some(1), Fixed(Boolean)).aggregate(),
            f("row_number", 0, Some(0), Fixed(BigInt)).window_only(),
            f("rank", 0, Some(0), Fixed(BigInt)).window_only(),
            f("dense_rank", 0, Some(0), Fixed(BigInt)).window_only(),
            f("ntile", 1, Some(1), Fixed(Integer)).window_only(),
            f("lag", 1, Some(3), Same(0)).window_only(),
            f("lead", 1, Some(3), Same(0)).window_only(),
            f("first_value", 1, Some(1), Same(0)).window_only(),
            f("last_value", 1, Some(1), Same(0)).window_only(),
            f("coalesce", 1, None, Same(0)),
            f("nullif", 2, Some(2), Same(0)),
            f("greatest", 1, None, Same(0)),
            f("least", 1, None, Same(0)),
            f("abs", 1, Some(1), Same(0)),
            f("round", 1, Some(2), Fixed(Decimal)),
            f("floor", 1, Some(1), Same(0)),
            f("ceil", 1, Some(1), Same(0)),
            f("lower", 1, Some(1), Fixed(Text)),
            f("upper", 1, Some(1), Fixed(Text)),
            f("trim", 1, Some(2), Fixed(Text)),
            f("length", 1, Some(1), Fixed(Integer)),
            f("concat", 1, None, Fixed(Text)),
            f("substr", 2, Some(3), Fixed(Text)),
            f("substring", 2, Some(3), Fixed(Text)),
            f("replace", 3, Some(3), Fixed(Text)),
            f("left", 2, Some(2), Fixed(Text)),
            f("right", 2, Some(2), Fixed(Text)),
            f("now", 0, Some(0), Fixed(Timestamptz)),
            f("current_date", 0, Some(0), Fixed(Date)),
            f("date_trunc", 2, Some(2), Fixed(Timestamp)),
            f("generate_series", 2, Some(3), Same(0)),
        ])
    }
}

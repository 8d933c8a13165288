use derive_more::Display;

/// Catalog column type as the validator understands it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Real,
    Double,
    #[display("Char({_0:?})")]
    Char(Option<u32>),
    #[display("VarChar({_0:?})")]
    VarChar(Option<u32>),
    Text,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    Interval,
    Json,
    Uuid,
    Bytea,
    /// Any type name the validator has no rules for.
    #[display("Other({_0})")]
    Other(String),
}

/// Coarse grouping used for comparability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TypeFamily {
    Boolean,
    Numeric,
    Text,
    Temporal,
    Interval,
    Json,
    Uuid,
    Binary,
    Other,
}

impl DataType {
    /// Maps a SQL type name (`varchar(20)`, `int8`, `timestamp with time zone`)
    /// to a catalog type. Unknown names become [`DataType::Other`].
    pub fn from_sql_name(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        let (base, length) = match lower.split_once('(') {
            Some((base, rest)) => {
                let length = rest
                    .trim_end_matches(')')
                    .split(',')
                    .next()
                    .and_then(|n| n.trim().parse::<u32>().ok());
                (base.trim().to_string(), length)
            }
            None => (lower.clone(), None),
        };
        match base.as_str() {
            "bool" | "boolean" => DataType::Boolean,
            "smallint" | "int2" | "tinyint" => DataType::SmallInt,
            "int" | "int4" | "integer" | "mediumint" | "serial" => DataType::Integer,
            "bigint" | "int8" | "bigserial" | "long" => DataType::BigInt,
            "decimal" | "numeric" | "number" | "money" => DataType::Decimal,
            "real" | "float4" | "float" => DataType::Real,
            "double" | "double precision" | "float8" => DataType::Double,
            "char" | "character" | "bpchar" => DataType::Char(length),
            "varchar" | "character varying" | "nvarchar" => DataType::VarChar(length),
            "text" | "string" | "clob" | "tinytext" | "mediumtext" | "longtext" => DataType::Text,
            "date" => DataType::Date,
            "time" | "time without time zone" | "timetz" => DataType::Time,
            "timestamp" | "datetime" | "timestamp without time zone" => DataType::Timestamp,
            "timestamptz" | "timestamp with time zone" => DataType::Timestamptz,
            "interval" => DataType::Interval,
            "json" | "jsonb" => DataType::Json,
            "uuid" => DataType::Uuid,
            "bytea" | "blob" | "binary" | "varbinary" => DataType::Bytea,
            _ => DataType::Other(lower),
        }
    }

    pub fn family(&self) -> TypeFamily {
        match self {
            DataType::Boolean => TypeFamily::Boolean,
            DataType::SmallInt
            | DataType::Integer
            | DataType::BigInt
            | DataType::Decimal
            | DataType::Real
            | DataType::Double => TypeFamily::Numeric,
            DataType::Char(_) | DataType::VarChar(_) | DataType::Text => TypeFamily::Text,
            DataType::Date | DataType::Time | DataType::Timestamp | DataType::Timestamptz => {
                TypeFamily::Temporal
            }
            DataType::Interval => TypeFamily::Interval,
            DataType::Json => TypeFamily::Json,
            DataType::Uuid => TypeFamily::Uuid,
            DataType::Bytea => TypeFamily::Binary,
            DataType::Other(_) => TypeFamily::Other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.family() == TypeFamily::Numeric
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::SmallInt | DataType::Integer | DataType::BigInt)
    }

    /// Position in the promotion lattice `INTEGER < BIGINT < DECIMAL`.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            DataType::SmallInt | DataType::Integer => Some(1),
            DataType::BigInt => Some(2),
            DataType::Decimal | DataType::Real | DataType::Double => Some(3),
            _ => None,
        }
    }

    /// Result type of arithmetic over two operands; `None` unless both are numeric.
    pub fn promote(&self, other: &DataType) -> Option<DataType> {
        let rank = self.numeric_rank()?.max(other.numeric_rank()?);
        Some(match rank {
            1 => DataType::Integer,
            2 => DataType::BigInt,
            _ => DataType::Decimal,
        })
    }

    /// Whether values of the two types may be compared. Text is accepted
    /// against types usually written as string literals (dates, uuids, json).
    pub fn is_comparable_with(&self, other: &DataType) -> bool {
        use TypeFamily::*;
        let (a, b) = (self.family(), other.family());
        if a == b || a == Other || b == Other {
            return true;
        }
        let textual = |f: TypeFamily| matches!(f, Temporal | Interval | Json | Uuid | Boolean | Binary);
        match (a, b) {
            (Text, f) | (f, Text) => textual(f),
            _ => false,
        }
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        DataType::from_sql_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("INTEGER", DataType::Integer)]
    #[case("int8", DataType::BigInt)]
    #[case("varchar(20)", DataType::VarChar(Some(20)))]
    #[case("numeric(10, 2)", DataType::Decimal)]
    #[case("timestamp with time zone", DataType::Timestamptz)]
    #[case("geometry", DataType::Other("geometry".into()))]
    fn maps_sql_type_names(#[case] name: &str, #[case] expected: DataType) {
        assert_eq!(DataType::from_sql_name(name), expected);
    }

    #[rstest]
    #[case(DataType::Integer, DataType::Integer, Some(DataType::Integer))]
    #[case(DataType::SmallInt, DataType::BigInt, Some(DataType::BigInt))]
    #[case(DataType::BigInt, DataType::Decimal, Some(DataType::Decimal))]
    #[case(DataType::Double, DataType::Integer, Some(DataType::Decimal))]
    #[case(DataType::Text, DataType::Integer, None)]
    fn promotion_lattice(#[case] a: DataType, #[case] b: DataType, #[case] expected: Option<DataType>) {
        assert_eq!(a.promote(&b), expected);
        assert_eq!(b.promote(&a), expected);
    }

    #[test]
    fn comparability() {
        assert!(DataType::Integer.is_comparable_with(&DataType::Decimal));
        assert!(DataType::Text.is_comparable_with(&DataType::Date));
        assert!(DataType::Uuid.is_comparable_with(&DataType::VarChar(None)));
        assert!(!DataType::Text.is_comparable_with(&DataType::Integer));
        assert!(!DataType::Boolean.is_comparable_with(&DataType::BigInt));
        assert!(DataType::Other("x".into()).is_comparable_with(&DataType::Integer));
    }

    #[test]
    fn display_keeps_lengths() {
        assert_eq!(DataType::VarChar(Some(8)).to_string(), "VarChar(Some(8))");
        assert_eq!(DataType::Char(None).to_string(), "Char(None)");
    }
}

//! SQL keyword table used by the tokenizer.
//!
//! Keywords are matched case-insensitively: the tokenizer upper-cases a word
//! once and hands it to [`Keyword::from_upper`]. Words that are not in the
//! table stay plain identifiers, so the table only lists words the parsers
//! branch on.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    Distinct,
    All,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    Nulls,
    First,
    Last,
    Limit,
    Offset,
    As,
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    Like,
    Ilike,
    Between,
    Exists,
    Case,
    When,
    Then,
    Else,
    End,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    Using,
    On,
    Lateral,
    Union,
    Intersect,
    Except,
    With,
    Recursive,
    Values,
    Cast,
    Over,
    Partition,
    True,
    False,
    Rows,
}

impl Keyword {
    /// Keywords that open a clause of a `SELECT` block.
    pub const CLAUSES: [Self; 7] = [
        Keyword::From,
        Keyword::Where,
        Keyword::Group,
        Keyword::Having,
        Keyword::Order,
        Keyword::Limit,
        Keyword::Offset,
    ];

    /// Keywords that combine query terms.
    pub const SET_OPERATORS: [Self; 3] = [Keyword::Union, Keyword::Intersect, Keyword::Except];

    /// Classify an *upper-cased* word. Returns `None` for plain identifiers.
    pub fn from_upper(word: &str) -> Option<Self> {
        use Keyword::*;
        let kw = match word {
            "SELECT" => Select,
            "DISTINCT" => Distinct,
            "ALL" => All,
            "FROM" => From,
            "WHERE" => Where,
            "GROUP" => Group,
            "BY" => By,
            "HAVING" => Having,
            "ORDER" => Order,
            "ASC" => Asc,
            "DESC" => Desc,
            "NULLS" => Nulls,
            "FIRST" => First,
            "LAST" => Last,
            "LIMIT" => Limit,
            "OFFSET" => Offset,
            "AS" => As,
            "AND" => And,
            "OR" => Or,
            "NOT" => Not,
            "IN" => In,
            "IS" => Is,
            "NULL" => Null,
            "LIKE" => Like,
            "ILIKE" => Ilike,
            "BETWEEN" => Between,
            "EXISTS" => Exists,
            "CASE" => Case,
            "WHEN" => When,
            "THEN" => Then,
            "ELSE" => Else,
            "END" => End,
            "JOIN" => Join,
            "INNER" => Inner,
            "LEFT" => Left,
            "RIGHT" => Right,
            "FULL" => Full,
            "OUTER" => Outer,
            "CROSS" => Cross,
            "NATURAL" => Natural,
            "USING" => Using,
            "ON" => On,
            "LATERAL" => Lateral,
            "UNION" => Union,
            "INTERSECT" => Intersect,
            "EXCEPT" => Except,
            "WITH" => With,
            "RECURSIVE" => Recursive,
            "VALUES" => Values,
            "CAST" => Cast,
            "OVER" => Over,
            "PARTITION" => Partition,
            "TRUE" => True,
            "FALSE" => False,
            "ROWS" => Rows,
            _ => return None,
        };
        Some(kw)
    }

    /// Canonical upper-case spelling.
    pub const fn as_str(self) -> &'static str {
        use Keyword::*;
        match self {
            Select => "SELECT",
            Distinct => "DISTINCT",
            All => "ALL",
            From => "FROM",
            Where => "WHERE",
            Group => "GROUP",
            By => "BY",
            Having => "HAVING",
            Order => "ORDER",
            Asc => "ASC",
            Desc => "DESC",
            Nulls => "NULLS",
            First => "FIRST",
            Last => "LAST",
            Limit => "LIMIT",
            Offset => "OFFSET",
            As => "AS",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            In => "IN",
            Is => "IS",
            Null => "NULL",
            Like => "LIKE",
            Ilike => "ILIKE",
            Between => "BETWEEN",
            Exists => "EXISTS",
            Case => "CASE",
            When => "WHEN",
            Then => "THEN",
            Else => "ELSE",
            End => "END",
            Join => "JOIN",
            Inner => "INNER",
            Left => "LEFT",
            Right => "RIGHT",
            Full => "FULL",
            Outer => "OUTER",
            Cross => "CROSS",
            Natural => "NATURAL",
            Using => "USING",
            On => "ON",
            Lateral => "LATERAL",
            Union => "UNION",
            Intersect => "INTERSECT",
            Except => "EXCEPT",
            With => "WITH",
            Recursive => "RECURSIVE",
            Values => "VALUES",
            Cast => "CAST",
            Over => "OVER",
            Partition => "PARTITION",
            True => "TRUE",
            False => "FALSE",
            Rows => "ROWS",
        }
    }

    /// Keywords that may not be used as a bare alias.
    pub fn is_reserved(self) -> bool {
        !matches!(
            self,
            Keyword::First | Keyword::Last | Keyword::Nulls | Keyword::Rows | Keyword::Partition
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_keywords() {
        for w in ["SELECT", "FROM", "JOIN", "LATERAL", "RECURSIVE", "ILIKE", "OVER"] {
            assert!(Keyword::from_upper(w).is_some(), "{w} should be recognized");
        }
    }

    #[test]
    fn rejects_unknown_and_lower_case_words() {
        for w in ["foo", "select", "INTERVAL", "WINDOW", "random"] {
            assert!(
                Keyword::from_upper(w).is_none(),
                "{w} should NOT be recognized"
            );
        }
    }

    #[test]
    fn display_matches_as_str() {
        for kw in [Keyword::Select, Keyword::Group, Keyword::Between, Keyword::Rows] {
            assert_eq!(kw.to_string(), kw.as_str());
            assert_eq!(Keyword::from_upper(kw.as_str()), Some(kw));
        }
    }
}

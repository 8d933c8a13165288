//! SQL dialects and the feature set each one accepts.
//!
//! Parsing is dialect neutral apart from identifier quoting; everything else
//! a dialect cannot express is reported by the validator through
//! [`Capabilities`].

use derive_more::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{major}.{minor}.{patch}")]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }

    /// Parses `16`, `9.3` or `8.0.14`. Missing parts are zero.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('.').map(|p| p.parse::<u16>());
        let major = parts.next()?.ok()?;
        let minor = match parts.next() {
            Some(p) => p.ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Dialect {
    #[display("ansi")]
    Ansi,
    #[display("postgres {_0}")]
    Postgres(Version),
    #[display("mysql {_0}")]
    MySql(Version),
    #[display("sqlite {_0}")]
    Sqlite(Version),
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Postgres(Self::LATEST_POSTGRES)
    }
}

/// A capability that some dialects lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Feature {
    #[display("DISTINCT ON")]
    DistinctOn,
    #[display("LATERAL")]
    Lateral,
    #[display("FULL JOIN")]
    FullJoin,
    #[display("RIGHT JOIN")]
    RightJoin,
    #[display("window functions")]
    WindowFunctions,
    #[display("WITH")]
    Cte,
    #[display("WITH RECURSIVE")]
    RecursiveCte,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::DistinctOn,
        Feature::Lateral,
        Feature::FullJoin,
        Feature::RightJoin,
        Feature::WindowFunctions,
        Feature::Cte,
        Feature::RecursiveCte,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub distinct_on: bool,
    pub lateral: bool,
    pub full_join: bool,
    pub right_join: bool,
    pub window_functions: bool,
    pub cte: bool,
    pub recursive_cte: bool,
    /// Opening characters accepted for quoted identifiers.
    pub identifier_quotes: &'static [char],
}

impl Capabilities {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::DistinctOn => self.distinct_on,
            Feature::Lateral => self.lateral,
            Feature::FullJoin => self.full_join,
            Feature::RightJoin => self.right_join,
            Feature::WindowFunctions => self.window_functions,
            Feature::Cte => self.cte,
            Feature::RecursiveCte => self.recursive_cte,
        }
    }

    pub fn missing(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| !self.supports(*f))
    }
}

impl Dialect {
    pub const LATEST_POSTGRES: Version = Version::new(16, 0, 0);
    pub const LATEST_MYSQL: Version = Version::new(8, 4, 0);
    pub const LATEST_SQLITE: Version = Version::new(3, 45, 0);

    /// Builds a dialect from a configuration name and optional version.
    pub fn from_name(name: &str, version: Option<&str>) -> Result<Self, String> {
        let version = match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(Version::parse(v).ok_or_else(|| format!("invalid dialect version `{v}`"))?),
            None => None,
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "ansi" | "generic" => Ok(Dialect::Ansi),
            "postgres" | "postgresql" | "pg" => {
                Ok(Dialect::Postgres(version.unwrap_or(Self::LATEST_POSTGRES)))
            }
            "mysql" | "mariadb" => Ok(Dialect::MySql(version.unwrap_or(Self::LATEST_MYSQL))),
            "sqlite" => Ok(Dialect::Sqlite(version.unwrap_or(Self::LATEST_SQLITE))),
            other => Err(format!("unknown dialect `{other}`")),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match *self {
            Dialect::Ansi => Capabilities {
                distinct_on: true,
                lateral: true,
                full_join: true,
                right_join: true,
                window_functions: true,
                cte: true,
                recursive_cte: true,
                identifier_quotes: &['"', '`', '['],
            },
            Dialect::Postgres(v) => Capabilities {
                distinct_on: true,
                lateral: v >= Version::new(9, 3, 0),
                full_join: true,
                right_join: true,
                window_functions: v >= Version::new(8, 4, 0),
                cte: v >= Version::new(8, 4, 0),
                recursive_cte: v >= Version::new(8, 4, 0),
                identifier_quotes: &['"'],
            },
            Dialect::MySql(v) => Capabilities {
                distinct_on: false,
                lateral: v >= Version::new(8, 0, 14),
                full_join: false,
                right_join: true,
                window_functions: v >= Version::new(8, 0, 0),
                cte: v >= Version::new(8, 0, 0),
                recursive_cte: v >= Version::new(8, 0, 0),
                identifier_quotes: &['`', '"'],
            },
            Dialect::Sqlite(v) => Capabilities {
                distinct_on: false,
                lateral: false,
                full_join: v >= Version::new(3, 39, 0),
                right_join: v >= Version::new(3, 39, 0),
                window_functions: v >= Version::new(3, 25, 0),
                cte: v >= Version::new(3, 8, 3),
                recursive_cte: v >= Version::new(3, 8, 3),
                identifier_quotes: &['"', '`', '['],
            },
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    /// Accepts `postgres`, `postgres 9.2`, `mysql:8.0` and similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, [' ', ':', '@']);
        let name = parts.next().unwrap_or_default();
        Dialect::from_name(name, parts.next())
    }
}

// src/schema/types.rs

use bigdecimal::BigDecimal;
use std::fmt;

/// Hive's default for a bare `decimal` declaration.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 10;
pub const DEFAULT_DECIMAL_SCALE: u8 = 0;
/// Largest precision an Arrow `Decimal128` can carry.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// The closed set of scalar column types a dump line can be decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal { precision: u8, scale: u8 },
    String,
    Timestamp,
}

impl PrimitiveType {
    /// Resolve a declared type name.
    ///
    /// Accepts the Hive spellings (`tinyint`, `smallint`, `int`, `bigint`,
    /// `float`, `double`, `decimal(p,s)`, `string`, `varchar(n)`, `char(n)`)
    /// plus the obvious PostgreSQL/Arrow aliases. Returns `None` for anything
    /// else, including nested types such as `array<int>`.
    pub fn parse(decl: &str) -> Option<Self> {
        let lower = decl.trim().to_ascii_lowercase();
        let (base, args) = match lower.find('(') {
            Some(open) => {
                let inner = lower[open + 1..].strip_suffix(')')?;
                (lower[..open].trim(), Some(inner))
            }
            None => (lower.as_str(), None),
        };

        let ty = match (base, args) {
            ("boolean" | "bool", None) => Self::Boolean,
            ("tinyint" | "int8" | "byte", None) => Self::Int8,
            ("smallint" | "int16" | "short", None) => Self::Int16,
            ("int" | "integer" | "int32", None) => Self::Int32,
            ("bigint" | "int64" | "long", None) => Self::Int64,
            ("float" | "float32" | "real", None) => Self::Float32,
            ("double" | "float64" | "double precision", None) => Self::Float64,
            ("decimal" | "numeric", args) => parse_decimal_args(args)?,
            ("string" | "text", None) => Self::String,
            ("varchar" | "char" | "character varying" | "character", Some(len)) => {
                len.trim().parse::<u32>().ok()?;
                Self::String
            }
            ("varchar" | "char", None) => Self::String,
            ("timestamp" | "timestamp without time zone", None) => Self::Timestamp,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Decimal { .. } => "decimal",
            Self::String => "string",
            Self::Timestamp => "timestamp",
        }
    }
}

fn parse_decimal_args(args: Option<&str>) -> Option<PrimitiveType> {
    let (precision, scale) = match args {
        None => (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE),
        Some(inner) => {
            let mut parts = inner.split(',').map(str::trim);
            let precision: u8 = parts.next()?.parse().ok()?;
            let scale: u8 = match parts.next() {
                Some(s) => s.parse().ok()?,
                None => DEFAULT_DECIMAL_SCALE,
            };
            if parts.next().is_some() {
                return None;
            }
            (precision, scale)
        }
    };
    if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
        return None;
    }
    Some(PrimitiveType::Decimal { precision, scale })
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            other => f.write_str(other.name()),
        }
    }
}

/// A single declared column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub ty: PrimitiveType,
}

/// Ordered, immutable column declaration. Build it with
/// [`crate::schema::build`]; there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }
}

/// One decoded slot of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A decoded line: one value per schema column, in schema order.
pub type Row = Vec<Value>;

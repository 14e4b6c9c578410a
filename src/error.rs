// src/error.rs

use thiserror::Error;

use crate::schema::PrimitiveType;

/// Everything the decoder can fail with.
///
/// Schema errors (`SchemaMismatch`, `UnsupportedType`) happen once at
/// construction and leave no decoder behind. Line errors (`RowTooShort`,
/// `MalformedField`) reject the whole line; there is no partial row.
#[derive(Debug, Error)]
pub enum PgDumpError {
    #[error("column names and types mis-match: {names} names vs {types} types")]
    SchemaMismatch { names: usize, types: usize },

    #[error("unsupported type `{type_name}` for column `{column}`")]
    UnsupportedType { column: String, type_name: String },

    #[error("row too short: expected {expected} fields, found {found}")]
    RowTooShort { expected: usize, found: usize },

    #[error("malformed {ty} field {index} (`{column}`): {reason}; raw = {raw:?}")]
    MalformedField {
        index: usize,
        column: String,
        ty: PrimitiveType,
        raw: String,
        reason: String,
    },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

pub type Result<T, E = PgDumpError> = std::result::Result<T, E>;

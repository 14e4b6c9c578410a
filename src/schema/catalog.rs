// src/schema/catalog.rs

use tracing::debug;

use super::types::{Column, ColumnSchema, PrimitiveType};
use crate::error::{PgDumpError, Result};

/// Build an immutable schema from ordered column names and type names.
///
/// Fails with `SchemaMismatch` when the two lists differ in length and with
/// `UnsupportedType` on the first type that is not a primitive.
pub fn build<N, T>(names: &[N], type_names: &[T]) -> Result<ColumnSchema>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    if names.len() != type_names.len() {
        return Err(PgDumpError::SchemaMismatch {
            names: names.len(),
            types: type_names.len(),
        });
    }

    let columns = names
        .iter()
        .zip(type_names)
        .map(|(name, decl)| {
            let name = name.as_ref().trim();
            let decl = decl.as_ref().trim();
            PrimitiveType::parse(decl)
                .map(|ty| Column {
                    name: name.to_string(),
                    ty,
                })
                .ok_or_else(|| PgDumpError::UnsupportedType {
                    column: name.to_string(),
                    type_name: decl.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(columns = columns.len(), "built column schema");
    Ok(ColumnSchema::from_columns(columns))
}

/// Build a schema straight from the `columns` / `columns.types` strings.
pub fn from_declarations(columns: &str, column_types: &str) -> Result<ColumnSchema> {
    let names = split_names(columns);
    let types = split_type_list(column_types);
    build(names.as_slice(), types.as_slice())
}

/// Split the comma-separated column name list. An empty (or all-blank)
/// declaration means zero columns.
pub fn split_names(decl: &str) -> Vec<&str> {
    if decl.trim().is_empty() {
        return Vec::new();
    }
    decl.split(',').map(str::trim).collect()
}

/// Split a type list on top-level `,` or `:`.
///
/// Separators nested inside `(...)` or `<...>` belong to the type, so
/// `decimal(10,2),map<string,int>` yields two entries.
pub fn split_type_list(decl: &str) -> Vec<&str> {
    if decl.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in decl.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth = depth.saturating_sub(1),
            ',' | ':' if depth == 0 => {
                out.push(decl[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(decl[start..].trim());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_in_declared_order() {
        let schema = build(&["a", "b", "c"], &["tinyint", "string", "timestamp"]).unwrap();
        let got: Vec<_> = schema.iter().map(|c| (c.name.as_str(), c.ty)).collect();
        assert_eq!(
            got,
            vec![
                ("a", PrimitiveType::Int8),
                ("b", PrimitiveType::String),
                ("c", PrimitiveType::Timestamp),
            ]
        );
    }

    #[test]
    fn mismatched_lengths_fail() {
        let err = build(&["a", "b"], &["int"]).unwrap_err();
        assert!(matches!(
            err,
            PgDumpError::SchemaMismatch { names: 2, types: 1 }
        ));
    }

    #[test]
    fn nested_type_is_unsupported() {
        let err = from_declarations("a,b", "int,array<int>").unwrap_err();
        match err {
            PgDumpError::UnsupportedType { column, type_name } => {
                assert_eq!(column, "b");
                assert_eq!(type_name, "array<int>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_list_keeps_nested_commas() {
        assert_eq!(
            split_type_list("int,decimal(10,2),map<string,int>:string"),
            vec!["int", "decimal(10,2)", "map<string,int>", "string"]
        );
    }

    #[test]
    fn decimal_with_scale_survives_declaration_split() {
        let schema = from_declarations("price, qty", "decimal(10,2), int").unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(
            schema.column(0).map(|c| c.ty),
            Some(PrimitiveType::Decimal { precision: 10, scale: 2 })
        );
        assert_eq!(schema.column(1).map(|c| c.name.as_str()), Some("qty"));
    }

    #[test]
    fn empty_declarations_give_empty_schema() {
        let schema = from_declarations("", "  ").unwrap();
        assert!(schema.is_empty());
    }
}

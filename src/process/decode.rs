// src/process/decode.rs

use arrow::datatypes::Schema as ArrowSchema;
use std::sync::Arc;
use tracing::trace;

use crate::error::{PgDumpError, Result};
use crate::process::convert::convert_field;
use crate::schema::{build_arrow_schema, ColumnSchema, Row, Value};

/// Field delimiter of the COPY text format.
pub const FIELD_DELIMITER: char = '\t';
/// How the server writes SQL NULL.
pub const NULL_SENTINEL: &str = "\\N";

/// Decodes single COPY text lines against a fixed schema.
///
/// The decoder itself holds no mutable state, so `decode` takes `&self`.
/// Callers that want to avoid an allocation per line hand their own buffer
/// to [`RowDecoder::decode_into`]; the `&mut Row` borrow keeps that buffer
/// single-owner. One decoder per worker; the schema can be shared.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    schema: Arc<ColumnSchema>,
    arrow_schema: Arc<ArrowSchema>,
}

impl RowDecoder {
    pub fn new(schema: impl Into<Arc<ColumnSchema>>) -> Self {
        let schema = schema.into();
        let arrow_schema = build_arrow_schema(&schema);
        Self {
            schema,
            arrow_schema,
        }
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// Arrow description of the rows this decoder produces.
    pub fn arrow_schema(&self) -> Arc<ArrowSchema> {
        Arc::clone(&self.arrow_schema)
    }

    /// Decode one line into a freshly allocated row.
    pub fn decode(&self, line: &str) -> Result<Row> {
        let mut row = Vec::with_capacity(self.schema.len());
        self.decode_into(line, &mut row)?;
        Ok(row)
    }

    /// Decode one line into `row`, reusing its allocation.
    ///
    /// On success `row` holds exactly one value per column. On failure its
    /// length is still the column count but the contents are unspecified.
    pub fn decode_into(&self, line: &str, row: &mut Row) -> Result<()> {
        let line = strip_line_terminator(line);
        let expected = self.schema.len();

        row.clear();
        row.resize(expected, Value::Null);

        let mut fields = line.split(FIELD_DELIMITER);
        for (index, column) in self.schema.iter().enumerate() {
            let Some(raw) = fields.next() else {
                // count the whole line for the error, not just what we consumed
                let found = line.split(FIELD_DELIMITER).count();
                return Err(PgDumpError::RowTooShort { expected, found });
            };

            if raw == NULL_SENTINEL {
                continue;
            }

            row[index] =
                convert_field(column.ty, raw).map_err(|reason| PgDumpError::MalformedField {
                    index,
                    column: column.name.clone(),
                    ty: column.ty,
                    raw: raw.to_string(),
                    reason,
                })?;
        }

        let extra = fields.count();
        if extra > 0 {
            trace!(extra, "ignoring trailing fields");
        }
        Ok(())
    }

    /// Rows cannot be written back as dump text.
    pub fn encode(&self, _row: &[Value]) -> Result<String> {
        Err(PgDumpError::NotImplemented("encoding rows as COPY text"))
    }
}

/// Drop a single trailing `\n` or `\r\n` left by line readers.
fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

//! Decode PostgreSQL `COPY ... (FORMAT text)` dump lines into typed rows.
//!
//! ```no_run
//! use pgdump_decode::{schema, RowDecoder};
//!
//! let schema = schema::from_declarations("id,name", "bigint,string")?;
//! let decoder = RowDecoder::new(schema);
//! let row = decoder.decode("1\tHello\\tWorld")?;
//! assert_eq!(row.len(), 2);
//! # Ok::<(), pgdump_decode::PgDumpError>(())
//! ```

pub mod error;
pub mod process;
pub mod schema;

pub use error::{PgDumpError, Result};
pub use process::{DumpReader, RowBatchBuilder, RowDecoder};
pub use schema::{Column, ColumnSchema, PrimitiveType, Row, SchemaConfig, Value};

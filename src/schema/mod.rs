pub mod arrow;
pub mod catalog;
pub mod config;
pub mod types;

pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use catalog::{build, from_declarations};
pub use config::SchemaConfig;
pub use types::{Column, ColumnSchema, PrimitiveType, Row, Value};

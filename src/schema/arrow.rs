// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use std::sync::Arc;

use super::types::{ColumnSchema, PrimitiveType};

/// Timezone attached to every timestamp column. Values are absolute instants.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Map a primitive column type into an Arrow DataType.
///
/// - boolean          → Boolean
/// - int8..int64      → Int8..Int64
/// - float32, float64 → Float32, Float64
/// - decimal(p,s)     → Decimal128(p, s)
/// - string           → Utf8
/// - timestamp        → Timestamp(ms, UTC)
pub fn map_to_arrow_type(ty: PrimitiveType) -> DataType {
    match ty {
        PrimitiveType::Boolean => DataType::Boolean,
        PrimitiveType::Int8 => DataType::Int8,
        PrimitiveType::Int16 => DataType::Int16,
        PrimitiveType::Int32 => DataType::Int32,
        PrimitiveType::Int64 => DataType::Int64,
        PrimitiveType::Float32 => DataType::Float32,
        PrimitiveType::Float64 => DataType::Float64,
        PrimitiveType::Decimal { precision, scale } => DataType::Decimal128(precision, scale as i8),
        PrimitiveType::String => DataType::Utf8,
        PrimitiveType::Timestamp => {
            DataType::Timestamp(TimeUnit::Millisecond, Some(Arc::from(TIMESTAMP_TZ)))
        }
    }
}

/// Build an ArrowSchema (inside an Arc) describing the decoded row shape.
/// Every field is nullable since any slot may hold `\N`.
pub fn build_arrow_schema(schema: &ColumnSchema) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = schema
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.ty), /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog;

    #[test]
    fn one_nullable_field_per_column() {
        let schema =
            catalog::from_declarations("a,b,c,d", "tinyint,decimal(12,3),string,timestamp")
                .unwrap();
        let arrow = build_arrow_schema(&schema);

        assert_eq!(arrow.fields().len(), 4);
        assert!(arrow.fields().iter().all(|f| f.is_nullable()));
        assert_eq!(arrow.field(0).name(), "a");
        assert_eq!(arrow.field(0).data_type(), &DataType::Int8);
        assert_eq!(arrow.field(1).data_type(), &DataType::Decimal128(12, 3));
        assert_eq!(arrow.field(2).data_type(), &DataType::Utf8);
        assert_eq!(
            arrow.field(3).data_type(),
            &DataType::Timestamp(TimeUnit::Millisecond, Some(Arc::from("UTC")))
        );
    }
}

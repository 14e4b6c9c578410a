// src/process/batch.rs

use arrow::{
    array::{
        ArrayBuilder, ArrayRef, BooleanBuilder, Decimal128Builder, Float32Builder,
        Float64Builder, Int16Builder, Int32Builder, Int64Builder, Int8Builder, StringBuilder,
        TimestampMillisecondBuilder,
    },
    datatypes::Schema as ArrowSchema,
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchOptions},
};
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::{arrow::TIMESTAMP_TZ, build_arrow_schema, ColumnSchema, PrimitiveType, Value};

/// One Arrow builder per declared column.
enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Decimal {
        builder: Decimal128Builder,
        precision: u8,
        scale: u8,
    },
    String(StringBuilder),
    Timestamp(TimestampMillisecondBuilder),
}

impl ColumnBuilder {
    fn new(ty: PrimitiveType, capacity: usize) -> Result<Self> {
        Ok(match ty {
            PrimitiveType::Boolean => Self::Boolean(BooleanBuilder::with_capacity(capacity)),
            PrimitiveType::Int8 => Self::Int8(Int8Builder::with_capacity(capacity)),
            PrimitiveType::Int16 => Self::Int16(Int16Builder::with_capacity(capacity)),
            PrimitiveType::Int32 => Self::Int32(Int32Builder::with_capacity(capacity)),
            PrimitiveType::Int64 => Self::Int64(Int64Builder::with_capacity(capacity)),
            PrimitiveType::Float32 => Self::Float32(Float32Builder::with_capacity(capacity)),
            PrimitiveType::Float64 => Self::Float64(Float64Builder::with_capacity(capacity)),
            PrimitiveType::Decimal { precision, scale } => Self::Decimal {
                builder: Decimal128Builder::with_capacity(capacity)
                    .with_precision_and_scale(precision, scale as i8)?,
                precision,
                scale,
            },
            PrimitiveType::String => {
                Self::String(StringBuilder::with_capacity(capacity, capacity * 16))
            }
            PrimitiveType::Timestamp => Self::Timestamp(
                TimestampMillisecondBuilder::with_capacity(capacity).with_timezone(TIMESTAMP_TZ),
            ),
        })
    }

    fn append(&mut self, column: &str, value: &Value) -> Result<()> {
        match (self, value) {
            (Self::Boolean(b), Value::Null) => b.append_null(),
            (Self::Int8(b), Value::Null) => b.append_null(),
            (Self::Int16(b), Value::Null) => b.append_null(),
            (Self::Int32(b), Value::Null) => b.append_null(),
            (Self::Int64(b), Value::Null) => b.append_null(),
            (Self::Float32(b), Value::Null) => b.append_null(),
            (Self::Float64(b), Value::Null) => b.append_null(),
            (Self::Decimal { builder, .. }, Value::Null) => builder.append_null(),
            (Self::String(b), Value::Null) => b.append_null(),
            (Self::Timestamp(b), Value::Null) => b.append_null(),

            (Self::Boolean(b), Value::Boolean(v)) => b.append_value(*v),
            (Self::Int8(b), Value::Int8(v)) => b.append_value(*v),
            (Self::Int16(b), Value::Int16(v)) => b.append_value(*v),
            (Self::Int32(b), Value::Int32(v)) => b.append_value(*v),
            (Self::Int64(b), Value::Int64(v)) => b.append_value(*v),
            (Self::Float32(b), Value::Float32(v)) => b.append_value(*v),
            (Self::Float64(b), Value::Float64(v)) => b.append_value(*v),
            (
                Self::Decimal {
                    builder,
                    precision,
                    scale,
                },
                Value::Decimal(v),
            ) => match decimal_to_i128(v, *precision, *scale) {
                Some(raw) => builder.append_value(raw),
                None => {
                    warn!(
                        column,
                        value = %v,
                        precision = *precision,
                        scale = *scale,
                        "decimal does not fit column; storing null"
                    );
                    builder.append_null();
                }
            },
            (Self::String(b), Value::String(v)) => b.append_value(v),
            (Self::Timestamp(b), Value::Timestamp(v)) => b.append_value(*v),

            (_, other) => {
                return Err(ArrowError::InvalidArgumentError(format!(
                    "value {:?} does not match the type of column `{}`",
                    other, column
                ))
                .into())
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Boolean(b) => Arc::new(b.finish()),
            Self::Int8(b) => Arc::new(b.finish()),
            Self::Int16(b) => Arc::new(b.finish()),
            Self::Int32(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::Float32(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Decimal { builder, .. } => Arc::new(builder.finish()),
            Self::String(b) => Arc::new(b.finish()),
            Self::Timestamp(b) => Arc::new(b.finish()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Boolean(b) => b.len(),
            Self::Int8(b) => b.len(),
            Self::Int16(b) => b.len(),
            Self::Int32(b) => b.len(),
            Self::Int64(b) => b.len(),
            Self::Float32(b) => b.len(),
            Self::Float64(b) => b.len(),
            Self::Decimal { builder, .. } => builder.len(),
            Self::String(b) => b.len(),
            Self::Timestamp(b) => b.len(),
        }
    }
}

/// Rescale `v` to `scale` digits (half away from zero) and check it fits
/// `precision`.
fn decimal_to_i128(v: &BigDecimal, precision: u8, scale: u8) -> Option<i128> {
    let target = i64::from(scale);
    // value = unscaled * 10^-exponent, and unscaled has `digits` digits
    let (_, exponent) = v.as_bigint_and_exponent();
    let digits = i64::try_from(v.digits()).ok()?;

    // integer part alone needs more than precision - scale digits
    if digits.checked_sub(exponent)? > i64::from(precision) - target {
        return None;
    }
    // below half a unit in the last place once rescaled
    if exponent.checked_sub(target)? > digits {
        return Some(0);
    }

    let (unscaled, _) = v
        .with_scale_round(target, RoundingMode::HalfUp)
        .as_bigint_and_exponent();
    let raw = unscaled.to_i128()?;
    if raw.unsigned_abs() >= 10u128.pow(u32::from(precision)) {
        return None;
    }
    Some(raw)
}

/// Accumulates decoded rows column-wise and emits Arrow record batches.
pub struct RowBatchBuilder {
    schema: Arc<ArrowSchema>,
    names: Vec<String>,
    columns: Vec<ColumnBuilder>,
    rows: usize,
}

impl RowBatchBuilder {
    pub fn new(schema: &ColumnSchema, capacity: usize) -> Result<Self> {
        let columns = schema
            .iter()
            .map(|c| ColumnBuilder::new(c.ty, capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: build_arrow_schema(schema),
            names: schema.iter().map(|c| c.name.clone()).collect(),
            columns,
            rows: 0,
        })
    }

    pub fn schema(&self) -> Arc<ArrowSchema> {
        Arc::clone(&self.schema)
    }

    /// Rows appended since the last `finish`.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append one row. A row of the wrong width or with a value of the wrong
    /// type is rejected before anything is written.
    pub fn push(&mut self, row: &[Value]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ArrowError::InvalidArgumentError(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            ))
            .into());
        }
        if let Some((i, v)) = row
            .iter()
            .enumerate()
            .find(|(i, v)| !self.accepts(*i, v))
        {
            return Err(ArrowError::InvalidArgumentError(format!(
                "value {:?} does not match the type of column `{}`",
                v, self.names[i]
            ))
            .into());
        }

        for ((builder, name), value) in self.columns.iter_mut().zip(&self.names).zip(row) {
            builder.append(name, value)?;
        }
        self.rows += 1;
        Ok(())
    }

    fn accepts(&self, index: usize, value: &Value) -> bool {
        matches!(
            (&self.columns[index], value),
            (_, Value::Null)
                | (ColumnBuilder::Boolean(_), Value::Boolean(_))
                | (ColumnBuilder::Int8(_), Value::Int8(_))
                | (ColumnBuilder::Int16(_), Value::Int16(_))
                | (ColumnBuilder::Int32(_), Value::Int32(_))
                | (ColumnBuilder::Int64(_), Value::Int64(_))
                | (ColumnBuilder::Float32(_), Value::Float32(_))
                | (ColumnBuilder::Float64(_), Value::Float64(_))
                | (ColumnBuilder::Decimal { .. }, Value::Decimal(_))
                | (ColumnBuilder::String(_), Value::String(_))
                | (ColumnBuilder::Timestamp(_), Value::Timestamp(_))
        )
    }

    /// Emit everything appended so far and reset for the next batch.
    pub fn finish(&mut self) -> Result<RecordBatch> {
        debug_assert!(self.columns.iter().all(|c| c.len() == self.rows));
        let arrays: Vec<ArrayRef> = self.columns.iter_mut().map(ColumnBuilder::finish).collect();
        let rows = std::mem::take(&mut self.rows);
        debug!(rows, columns = arrays.len(), "finished record batch");
        // explicit row count so a zero-column schema still reports its rows
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch = RecordBatch::try_new_with_options(Arc::clone(&self.schema), arrays, &options)?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::decode::RowDecoder;
    use crate::schema::catalog;
    use arrow::array::{Array, Decimal128Array, Int8Array, StringArray, TimestampMillisecondArray};
    use arrow::datatypes::DataType;
    use std::str::FromStr;

    fn schema(names: &str, types: &str) -> ColumnSchema {
        catalog::from_declarations(names, types).unwrap()
    }

    #[test]
    fn builds_batch_from_decoded_rows() {
        let s = schema("a,b,c,d", "tinyint,string,decimal(8,2),timestamp");
        let dec = RowDecoder::new(s.clone());
        let mut builder = RowBatchBuilder::new(&s, 4).unwrap();

        for line in [
            "1\tone\t1.5\t2016-01-02 03:04:05+00:00",
            "\\N\ttwo\tbad\t\\N",
            "3\t\\N\t2.345\t2016-01-02 03:04:06Z",
        ] {
            builder.push(&dec.decode(line).unwrap()).unwrap();
        }
        assert_eq!(builder.len(), 3);

        let batch = builder.finish().unwrap();
        assert!(builder.is_empty());
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema(), dec.arrow_schema());

        let a = batch.column(0).as_any().downcast_ref::<Int8Array>().unwrap();
        assert_eq!(a.null_count(), 1);
        assert_eq!(a.value(2), 3);

        let b = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(b.value(0), "one");
        assert!(b.is_null(2));

        let c = batch.column(2).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert_eq!(c.data_type(), &DataType::Decimal128(8, 2));
        assert_eq!(c.value(0), 150);
        assert!(c.is_null(1));
        assert_eq!(c.value(2), 235);

        let d = batch
            .column(3)
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .unwrap();
        assert_eq!(d.value(0), 1_451_703_845_000);
        assert!(d.is_null(1));
        assert_eq!(d.value(2), 1_451_703_846_000);
    }

    #[test]
    fn oversized_decimal_becomes_null() {
        let d = BigDecimal::from_str("123456.7").unwrap();
        assert_eq!(decimal_to_i128(&d, 5, 1), None);
        assert_eq!(decimal_to_i128(&d, 7, 1), Some(1_234_567));
        assert_eq!(decimal_to_i128(&d, 9, 3), Some(123_456_700));
    }

    #[test]
    fn wide_decimals_rescale_into_i128() {
        let big = |s: &str| BigDecimal::from_str(s).unwrap();
        assert_eq!(
            decimal_to_i128(&big("123456789012345678901234567890"), 38, 0),
            Some(123_456_789_012_345_678_901_234_567_890)
        );
        assert_eq!(
            decimal_to_i128(&big("1E30"), 38, 0),
            Some(1_000_000_000_000_000_000_000_000_000_000)
        );
        assert_eq!(decimal_to_i128(&big("1E38"), 38, 0), None);
        assert_eq!(decimal_to_i128(&big("1E-100"), 10, 2), Some(0));
        assert_eq!(decimal_to_i128(&big("-0.005"), 10, 2), Some(-1));
        assert_eq!(decimal_to_i128(&big("9.995"), 3, 2), None);
        assert_eq!(decimal_to_i128(&big("2.5E400"), 38, 0), None);
    }

    #[test]
    fn wide_decimal_row_reaches_arrow() {
        let s = schema("a,b,c", "decimal(38,0),decimal(38,0),decimal(38,2)");
        let dec = RowDecoder::new(s.clone());
        let mut builder = RowBatchBuilder::new(&s, 1).unwrap();
        builder
            .push(&dec.decode("123456789012345678901234567890\t1E30\t1E-100").unwrap())
            .unwrap();
        let batch = builder.finish().unwrap();

        let col = |i: usize| {
            batch
                .column(i)
                .as_any()
                .downcast_ref::<Decimal128Array>()
                .unwrap()
                .clone()
        };
        assert_eq!(col(0).value(0), 123_456_789_012_345_678_901_234_567_890);
        assert_eq!(col(1).value(0), 1_000_000_000_000_000_000_000_000_000_000);
        assert!(col(2).is_valid(0));
        assert_eq!(col(2).value(0), 0);
    }

    #[test]
    fn wrong_width_or_type_is_rejected() {
        let s = schema("a,b", "int,string");
        let mut builder = RowBatchBuilder::new(&s, 1).unwrap();
        assert!(builder.push(&[Value::Int32(1)]).is_err());
        assert!(builder
            .push(&[Value::Int32(1), Value::Boolean(true)])
            .is_err());
        assert!(builder.is_empty());

        builder
            .push(&[Value::Int32(1), Value::String("ok".into())])
            .unwrap();
        assert_eq!(builder.finish().unwrap().num_rows(), 1);
    }

    #[test]
    fn empty_schema_still_counts_rows() {
        let s = ColumnSchema::default();
        let mut builder = RowBatchBuilder::new(&s, 1).unwrap();
        builder.push(&[]).unwrap();
        builder.push(&[]).unwrap();
        assert_eq!(builder.finish().unwrap().num_rows(), 2);
    }
}

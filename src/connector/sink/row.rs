// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Decimal128Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, LargeBinaryArray, LargeStringArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::NaiveDateTime;

use crate::common::error::{SinkError, SinkResult};
use crate::exec::chunk::Chunk;

/// Semantic action a row carries into the storage layer.
///
/// The sink core only ever emits `Insert` and `Delete`; UPDATEs are
/// represented as a `Delete` of the old row plus an `Insert` of the new
/// row. The byte codes are the storage layer's stable wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowKind {
    Insert,
    UpdateBefore,
    UpdateAfter,
    Delete,
}

impl RowKind {
    pub fn to_byte(self) -> u8 {
        match self {
            RowKind::Insert => 0,
            RowKind::UpdateBefore => 1,
            RowKind::UpdateAfter => 2,
            RowKind::Delete => 3,
        }
    }

    pub fn from_byte(value: u8) -> SinkResult<Self> {
        match value {
            0 => Ok(RowKind::Insert),
            1 => Ok(RowKind::UpdateBefore),
            2 => Ok(RowKind::UpdateAfter),
            3 => Ok(RowKind::Delete),
            other => Err(SinkError::invalid_argument(format!(
                "unknown row kind byte: {other}"
            ))),
        }
    }

    pub fn short_string(self) -> &'static str {
        match self {
            RowKind::Insert => "+I",
            RowKind::UpdateBefore => "-U",
            RowKind::UpdateAfter => "+U",
            RowKind::Delete => "-D",
        }
    }

    /// Whether the row adds data to the table.
    pub fn is_add(self) -> bool {
        matches!(self, RowKind::Insert | RowKind::UpdateAfter)
    }

    /// Whether the row retracts previously-written data.
    pub fn is_retract(self) -> bool {
        matches!(self, RowKind::Delete | RowKind::UpdateBefore)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_string())
    }
}

/// Unscaled decimal value with its precision and scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    unscaled: i128,
    precision: u8,
    scale: i8,
}

impl DecimalValue {
    pub fn from_unscaled(unscaled: i128, precision: u8, scale: i8) -> Self {
        Self {
            unscaled,
            precision,
            scale,
        }
    }

    pub fn unscaled(self) -> i128 {
        self.unscaled
    }

    pub fn precision(self) -> u8 {
        self.precision
    }

    pub fn scale(self) -> i8 {
        self.scale
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            return write!(f, "{}", self.unscaled);
        }
        let scale = self.scale as u32;
        let divisor = 10i128.pow(scale);
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let abs = self.unscaled.unsigned_abs();
        let int_part = abs / divisor.unsigned_abs();
        let frac_part = abs % divisor.unsigned_abs();
        write!(
            f,
            "{sign}{int_part}.{frac_part:0width$}",
            width = scale as usize
        )
    }
}

/// Timestamp carried as microseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    micros: i64,
}

impl Timestamp {
    pub fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub fn as_micros(self) -> i64 {
        self.micros
    }

    pub fn to_naive_datetime(self) -> Option<NaiveDateTime> {
        chrono::DateTime::from_timestamp_micros(self.micros).map(|dt| dt.naive_utc())
    }
}

/// One scalar cell, tagged by type. Borrowed variants reference the
/// buffers of the chunk the row view wraps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Datum<'a> {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(DecimalValue),
    Timestamp(Timestamp),
    String(&'a str),
    Binary(&'a [u8]),
}

impl<'a> Datum<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Nonzero byte reads as true.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Datum::Boolean(v) => Some(*v),
            Datum::Int8(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Datum::Int8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Datum::Int8(v) => Some(i16::from(*v)),
            Datum::Int16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Datum::Int8(v) => Some(i32::from(*v)),
            Datum::Int16(v) => Some(i32::from(*v)),
            Datum::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Narrower integer sources widen with sign extension; the full
    /// 64-bit payload of an INT64 column is always read.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int8(v) => Some(i64::from(*v)),
            Datum::Int16(v) => Some(i64::from(*v)),
            Datum::Int32(v) => Some(i64::from(*v)),
            Datum::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Datum::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Float32(v) => Some(f64::from(*v)),
            Datum::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<DecimalValue> {
        match self {
            Datum::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Datum::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Datum::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            Datum::String(v) => Some(v.as_bytes()),
            Datum::Binary(v) => Some(v),
            _ => None,
        }
    }
}

fn read_mismatch(expected: &str, index: usize, datum: &Datum<'_>) -> SinkError {
    SinkError::invalid_argument(format!(
        "cannot read {expected} at column index {index}: value is {datum:?}"
    ))
}

/// Row capability surface the table writer consumes: field count, row
/// kind, null checks, and typed scalar reads. Scalar reads go through
/// [`Row::datum`], the single per-column dispatch point.
pub trait Row {
    fn field_count(&self) -> usize;

    fn row_kind(&self) -> RowKind;

    fn is_null_at(&self, index: usize) -> SinkResult<bool>;

    fn datum(&self, index: usize) -> SinkResult<Datum<'_>>;

    fn get_boolean(&self, index: usize) -> SinkResult<bool> {
        let datum = self.datum(index)?;
        datum
            .as_boolean()
            .ok_or_else(|| read_mismatch("BOOLEAN", index, &datum))
    }

    fn get_byte(&self, index: usize) -> SinkResult<i8> {
        let datum = self.datum(index)?;
        datum
            .as_i8()
            .ok_or_else(|| read_mismatch("INT8", index, &datum))
    }

    fn get_short(&self, index: usize) -> SinkResult<i16> {
        let datum = self.datum(index)?;
        datum
            .as_i16()
            .ok_or_else(|| read_mismatch("INT16", index, &datum))
    }

    fn get_int(&self, index: usize) -> SinkResult<i32> {
        let datum = self.datum(index)?;
        datum
            .as_i32()
            .ok_or_else(|| read_mismatch("INT32", index, &datum))
    }

    fn get_long(&self, index: usize) -> SinkResult<i64> {
        let datum = self.datum(index)?;
        datum
            .as_i64()
            .ok_or_else(|| read_mismatch("INT64", index, &datum))
    }

    fn get_float(&self, index: usize) -> SinkResult<f32> {
        let datum = self.datum(index)?;
        datum
            .as_f32()
            .ok_or_else(|| read_mismatch("FLOAT32", index, &datum))
    }

    fn get_double(&self, index: usize) -> SinkResult<f64> {
        let datum = self.datum(index)?;
        datum
            .as_f64()
            .ok_or_else(|| read_mismatch("FLOAT64", index, &datum))
    }

    fn get_decimal(&self, index: usize) -> SinkResult<DecimalValue> {
        let datum = self.datum(index)?;
        datum
            .as_decimal()
            .ok_or_else(|| read_mismatch("DECIMAL", index, &datum))
    }

    fn get_timestamp(&self, index: usize) -> SinkResult<Timestamp> {
        let datum = self.datum(index)?;
        datum
            .as_timestamp()
            .ok_or_else(|| read_mismatch("TIMESTAMP", index, &datum))
    }

    fn get_string(&self, index: usize) -> SinkResult<&str> {
        let datum = self.datum(index)?;
        datum
            .as_str()
            .ok_or_else(|| read_mismatch("STRING", index, &datum))
    }

    fn get_binary(&self, index: usize) -> SinkResult<&[u8]> {
        let datum = self.datum(index)?;
        datum
            .as_bytes()
            .ok_or_else(|| read_mismatch("BINARY", index, &datum))
    }
}

/// View over a single-row chunk tagged with a row kind. Row kind and
/// payload are immutable after construction; the wrapped chunk shares
/// the source buffers, so scalar reads allocate nothing.
pub struct ChunkRow {
    chunk: Chunk,
    row_kind: RowKind,
}

impl ChunkRow {
    pub fn new(chunk: Chunk, row_kind: RowKind) -> SinkResult<Self> {
        if chunk.len() != 1 {
            return Err(SinkError::invalid_argument(format!(
                "row view requires a single-row chunk, got {} rows",
                chunk.len()
            )));
        }
        Ok(Self { chunk, row_kind })
    }

    pub fn set_row_kind(&mut self, _row_kind: RowKind) -> SinkResult<()> {
        Err(SinkError::unsupported(
            "row kind of a chunk row view is immutable",
        ))
    }
}

fn downcast_column<'a, T: Array + 'static>(
    array: &'a ArrayRef,
    type_name: &str,
) -> SinkResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| SinkError::invalid_argument(format!("downcast {type_name} column failed")))
}

fn micros_from(unit: &TimeUnit, value: i64) -> SinkResult<i64> {
    match unit {
        TimeUnit::Second => value.checked_mul(1_000_000),
        TimeUnit::Millisecond => value.checked_mul(1_000),
        TimeUnit::Microsecond => Some(value),
        // Sub-microsecond precision is truncated.
        TimeUnit::Nanosecond => Some(value / 1_000),
    }
    .ok_or_else(|| {
        SinkError::invalid_argument(format!(
            "timestamp value {value} overflows microsecond precision"
        ))
    })
}

impl Row for ChunkRow {
    fn field_count(&self) -> usize {
        self.chunk.channel_count()
    }

    fn row_kind(&self) -> RowKind {
        self.row_kind
    }

    fn is_null_at(&self, index: usize) -> SinkResult<bool> {
        Ok(self.chunk.column(index)?.is_null(0))
    }

    fn datum(&self, index: usize) -> SinkResult<Datum<'_>> {
        let array = self.chunk.column(index)?;
        if array.is_null(0) {
            return Ok(Datum::Null);
        }
        match array.data_type() {
            DataType::Boolean => {
                let arr = downcast_column::<BooleanArray>(array, "BOOLEAN")?;
                Ok(Datum::Boolean(arr.value(0)))
            }
            DataType::Int8 => {
                let arr = downcast_column::<Int8Array>(array, "INT8")?;
                Ok(Datum::Int8(arr.value(0)))
            }
            DataType::Int16 => {
                let arr = downcast_column::<Int16Array>(array, "INT16")?;
                Ok(Datum::Int16(arr.value(0)))
            }
            DataType::Int32 => {
                let arr = downcast_column::<Int32Array>(array, "INT32")?;
                Ok(Datum::Int32(arr.value(0)))
            }
            DataType::Int64 => {
                let arr = downcast_column::<Int64Array>(array, "INT64")?;
                Ok(Datum::Int64(arr.value(0)))
            }
            DataType::Float32 => {
                let arr = downcast_column::<Float32Array>(array, "FLOAT32")?;
                Ok(Datum::Float32(arr.value(0)))
            }
            DataType::Float64 => {
                let arr = downcast_column::<Float64Array>(array, "FLOAT64")?;
                Ok(Datum::Float64(arr.value(0)))
            }
            DataType::Decimal128(precision, scale) => {
                let arr = downcast_column::<Decimal128Array>(array, "DECIMAL128")?;
                Ok(Datum::Decimal(DecimalValue::from_unscaled(
                    arr.value(0),
                    *precision,
                    *scale,
                )))
            }
            DataType::Timestamp(unit, _) => {
                let raw = match unit {
                    TimeUnit::Second => {
                        downcast_column::<TimestampSecondArray>(array, "TIMESTAMP")?.value(0)
                    }
                    TimeUnit::Millisecond => {
                        downcast_column::<TimestampMillisecondArray>(array, "TIMESTAMP")?.value(0)
                    }
                    TimeUnit::Microsecond => {
                        downcast_column::<TimestampMicrosecondArray>(array, "TIMESTAMP")?.value(0)
                    }
                    TimeUnit::Nanosecond => {
                        downcast_column::<TimestampNanosecondArray>(array, "TIMESTAMP")?.value(0)
                    }
                };
                Ok(Datum::Timestamp(Timestamp::from_micros(micros_from(
                    unit, raw,
                )?)))
            }
            DataType::Utf8 => {
                let arr = downcast_column::<StringArray>(array, "STRING")?;
                Ok(Datum::String(arr.value(0)))
            }
            DataType::LargeUtf8 => {
                let arr = downcast_column::<LargeStringArray>(array, "STRING")?;
                Ok(Datum::String(arr.value(0)))
            }
            DataType::Binary => {
                let arr = downcast_column::<BinaryArray>(array, "BINARY")?;
                Ok(Datum::Binary(arr.value(0)))
            }
            DataType::LargeBinary => {
                let arr = downcast_column::<LargeBinaryArray>(array, "BINARY")?;
                Ok(Datum::Binary(arr.value(0)))
            }
            DataType::List(_)
            | DataType::LargeList(_)
            | DataType::FixedSizeList(_, _)
            | DataType::Map(_, _)
            | DataType::Struct(_) => Err(SinkError::unsupported(format!(
                "nested column type {:?} at index {index} is not supported yet",
                array.data_type()
            ))),
            other => Err(SinkError::invalid_argument(format!(
                "unsupported column type {other:?} at index {index}"
            ))),
        }
    }
}

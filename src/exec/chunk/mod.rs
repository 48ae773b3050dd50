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

use arrow::array::{ArrayRef, RecordBatch, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::SchemaRef;

use crate::common::error::{SinkError, SinkResult};

/// A chunk of data, consisting of multiple rows.
/// Wrapper around an Arrow RecordBatch with the two lossless derivations
/// the sink path needs: column projection and row gather. Both keep the
/// underlying buffers shared; gather materializes per column via the
/// `take` kernel.
#[derive(Debug, Clone)]
pub struct Chunk {
    batch: RecordBatch,
}

impl Chunk {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows (positions).
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Number of columns (channels).
    pub fn channel_count(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    pub fn column(&self, index: usize) -> SinkResult<&ArrayRef> {
        self.batch.columns().get(index).ok_or_else(|| {
            SinkError::invalid_argument(format!(
                "column index {} out of range, chunk has {} columns",
                index,
                self.batch.num_columns()
            ))
        })
    }

    /// Restrict the chunk to the given columns, preserving row count.
    pub fn project(&self, column_indexes: &[usize]) -> SinkResult<Chunk> {
        let projected = self.batch.project(column_indexes).map_err(|e| {
            SinkError::invalid_argument(format!(
                "project chunk columns failed: indexes={:?} num_columns={} error={}",
                column_indexes,
                self.batch.num_columns(),
                e
            ))
        })?;
        Ok(Chunk::new(projected))
    }

    /// Produce a new chunk containing exactly the rows at `positions`, in
    /// that order. Positions may repeat.
    pub fn take_rows(&self, positions: &[u32]) -> SinkResult<Chunk> {
        let index_array = UInt32Array::from(positions.to_vec());
        let mut gathered_columns = Vec::with_capacity(self.batch.num_columns());
        for (col_idx, array) in self.batch.columns().iter().enumerate() {
            let taken = take(array.as_ref(), &index_array, None).map_err(|e| {
                SinkError::invalid_argument(format!(
                    "take rows from chunk failed: column_index={} selected_rows={} error={}",
                    col_idx,
                    positions.len(),
                    e
                ))
            })?;
            gathered_columns.push(taken);
        }
        RecordBatch::try_new(self.batch.schema(), gathered_columns)
            .map(Chunk::new)
            .map_err(|e| {
                SinkError::invalid_argument(format!(
                    "build chunk after row selection failed: selected_rows={} error={}",
                    positions.len(),
                    e
                ))
            })
    }

    /// Zero-copy view of a single row.
    pub fn single_row(&self, position: usize) -> SinkResult<Chunk> {
        if position >= self.batch.num_rows() {
            return Err(SinkError::invalid_argument(format!(
                "row position {} out of range, chunk has {} rows",
                position,
                self.batch.num_rows()
            )));
        }
        Ok(Chunk::new(self.batch.slice(position, 1)))
    }
}

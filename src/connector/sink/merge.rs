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

use arrow::array::{Array, Int8Array};
use bytes::Bytes;

use crate::common::error::{SinkError, SinkResult};
use crate::connector::sink::page_sink::PageSink;
use crate::connector::sink::row::RowKind;
use crate::connector::sink::writer::BatchTableWrite;
use crate::exec::chunk::Chunk;
use crate::lakesink_logging::debug;

// Engine-emitted MERGE operation codes. Code 3 is reserved and rejected.
const MERGE_OP_INSERT: i8 = 1;
const MERGE_OP_DELETE: i8 = 2;
const MERGE_OP_UPDATE_INSERT: i8 = 4;
const MERGE_OP_UPDATE_DELETE: i8 = 5;

/// MERGE protocol adapter in front of a [`PageSink`].
///
/// Input chunks carry `D + 2` columns: the table's `D` data columns, an
/// INT8 operation-code column, and an engine row-id column that is never
/// forwarded to the writer. Rows are classified by operation code
/// (1/4 insert, 2/5 delete), the data columns are projected and gathered
/// per side, and deletes are dispatched strictly before inserts so an
/// UPDATE pair landing in the same commit keeps its new image under the
/// storage layer's upsert semantics.
pub struct MergeSink<W: BatchTableWrite> {
    page_sink: PageSink<W>,
    data_column_count: usize,
}

impl<W: BatchTableWrite> MergeSink<W> {
    pub fn new(page_sink: PageSink<W>, data_column_count: usize) -> Self {
        Self {
            page_sink,
            data_column_count,
        }
    }

    /// Classify, project and dispatch one MERGE-annotated chunk.
    ///
    /// Shape and code violations fail the whole call before any writer
    /// side effect. A page-sink failure mid-dispatch leaves the writer
    /// indeterminate; the caller must invoke [`MergeSink::abort`].
    pub fn store_merged_rows(&mut self, chunk: &Chunk) -> SinkResult<()> {
        let channel_count = chunk.channel_count();
        if channel_count != self.data_column_count + 2 {
            return Err(SinkError::invalid_argument(format!(
                "input chunk channel count ({}) must be data column count ({}) + 2",
                channel_count, self.data_column_count
            )));
        }
        let position_count = chunk.len();
        if position_count == 0 {
            return Err(SinkError::invalid_argument(
                "position count should be > 0, but is 0",
            ));
        }

        let op_column = chunk.column(channel_count - 2)?;
        let op_array = op_column
            .as_any()
            .downcast_ref::<Int8Array>()
            .ok_or_else(|| {
                SinkError::invalid_argument(format!(
                    "merge operation column must be INT8, got {:?}",
                    op_column.data_type()
                ))
            })?;

        let mut insert_positions = Vec::with_capacity(position_count);
        let mut delete_positions = Vec::with_capacity(position_count);
        for position in 0..position_count {
            if op_array.is_null(position) {
                return Err(SinkError::invalid_argument(format!(
                    "merge operation column contains NULL at position {position}"
                )));
            }
            let position_u32 = u32::try_from(position).map_err(|_| {
                SinkError::invalid_argument(format!("row position overflow: {position}"))
            })?;
            match op_array.value(position) {
                MERGE_OP_INSERT | MERGE_OP_UPDATE_INSERT => insert_positions.push(position_u32),
                MERGE_OP_DELETE | MERGE_OP_UPDATE_DELETE => delete_positions.push(position_u32),
                other => {
                    return Err(SinkError::invalid_argument(format!(
                        "Invalid merge operation: {other}"
                    )));
                }
            }
        }
        debug!(
            deletes = delete_positions.len(),
            inserts = insert_positions.len(),
            "classified merge chunk"
        );

        let data_columns = (0..self.data_column_count).collect::<Vec<_>>();
        // Deletes strictly precede inserts within one call.
        if !delete_positions.is_empty() {
            let delete_chunk = chunk.project(&data_columns)?.take_rows(&delete_positions)?;
            self.page_sink.write(&delete_chunk, RowKind::Delete)?;
        }
        if !insert_positions.is_empty() {
            let insert_chunk = chunk.project(&data_columns)?.take_rows(&insert_positions)?;
            self.page_sink.write(&insert_chunk, RowKind::Insert)?;
        }
        Ok(())
    }

    /// Insert-only bulk write, bypassing MERGE classification.
    pub fn append(&mut self, chunk: &Chunk) -> SinkResult<()> {
        self.page_sink.append(chunk)
    }

    pub fn finish(&mut self) -> SinkResult<Vec<Bytes>> {
        self.page_sink.finish()
    }

    pub fn abort(&mut self) -> SinkResult<()> {
        self.page_sink.abort()
    }
}

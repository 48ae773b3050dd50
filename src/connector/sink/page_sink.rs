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

use bytes::Bytes;

use crate::common::error::{SinkError, SinkResult};
use crate::connector::sink::row::{ChunkRow, RowKind};
use crate::connector::sink::writer::{BatchTableWrite, CommitMessageSerializer};
use crate::exec::chunk::Chunk;
use crate::lakesink_logging::{debug, info};

/// Owns the table writer for the duration of one write session and
/// adapts columnar chunks to its row interface.
///
/// Lifecycle: `open -> (any number of append/write) -> (finish | abort)
/// -> closed`. The writer is closed exactly once across finish/abort;
/// calls after a terminal transition are rejected. No method blocks at
/// the engine boundary; any real I/O happens inside the writer.
pub struct PageSink<W: BatchTableWrite> {
    writer: Option<W>,
    serializer: CommitMessageSerializer,
}

impl<W: BatchTableWrite> PageSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            serializer: CommitMessageSerializer,
        }
    }

    fn closed() -> SinkError {
        SinkError::unsupported("page sink is already closed")
    }

    /// Bulk insert: every row of the chunk is written as `Insert`.
    /// Completes synchronously.
    pub fn append(&mut self, chunk: &Chunk) -> SinkResult<()> {
        self.write(chunk, RowKind::Insert)
    }

    /// Hand each of the chunk's rows to the writer tagged with
    /// `row_kind`, preserving batch order. A writer failure is fatal for
    /// the session; the caller must then invoke [`PageSink::abort`].
    pub fn write(&mut self, chunk: &Chunk, row_kind: RowKind) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or_else(Self::closed)?;
        for position in 0..chunk.len() {
            let row = ChunkRow::new(chunk.single_row(position)?, row_kind)?;
            writer.write(&row).map_err(SinkError::Writer)?;
        }
        debug!(rows = chunk.len(), kind = %row_kind, "wrote chunk to table writer");
        Ok(())
    }

    /// Flush the writer and serialize its commit messages, in writer
    /// order. The writer is closed on every exit path; a close failure
    /// propagates and is never swallowed. Descriptor production is
    /// atomic: either every descriptor is returned or none is.
    pub fn finish(&mut self) -> SinkResult<Vec<Bytes>> {
        let mut writer = self.writer.take().ok_or_else(Self::closed)?;
        let commit_tasks = Self::drain(&mut writer, &self.serializer);
        let close_result = writer.close().map_err(SinkError::Close);
        close_result?;
        let commit_tasks = commit_tasks?;
        info!(descriptors = commit_tasks.len(), "page sink finished");
        Ok(commit_tasks)
    }

    fn drain(writer: &mut W, serializer: &CommitMessageSerializer) -> SinkResult<Vec<Bytes>> {
        let messages = writer.prepare_commit().map_err(SinkError::Writer)?;
        Ok(messages
            .iter()
            .map(|message| serializer.serialize(message))
            .collect())
    }

    /// Close the writer and discard buffered work. Idempotent once the
    /// sink reached a terminal state.
    pub fn abort(&mut self) -> SinkResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.close().map_err(SinkError::Close)?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

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

//! Recording table-write stub shared by the sink unit tests.

use std::sync::{Arc, Mutex};

use anyhow::bail;

use crate::connector::sink::row::{Datum, Row, RowKind};
use crate::connector::sink::writer::{BatchTableWrite, CommitMessage};

#[derive(Default)]
pub(crate) struct WriteLog {
    pub(crate) rows: Vec<(RowKind, Vec<String>)>,
    pub(crate) prepare_count: usize,
    pub(crate) close_count: usize,
}

/// Writer double that renders every row through the `Row` accessors and
/// keeps the log alive past the writer's own lifetime. Failure injection
/// is per call site, in the spirit of the sink operator's
/// `fail_once_at_append_call` hook.
pub(crate) struct RecordingWrite {
    log: Arc<Mutex<WriteLog>>,
    commit_messages: Vec<CommitMessage>,
    fail_at_write_call: Option<usize>,
    fail_prepare_commit: bool,
    fail_close: bool,
    write_calls: usize,
}

impl RecordingWrite {
    pub(crate) fn new(log: Arc<Mutex<WriteLog>>) -> Self {
        Self {
            log,
            commit_messages: Vec::new(),
            fail_at_write_call: None,
            fail_prepare_commit: false,
            fail_close: false,
            write_calls: 0,
        }
    }

    pub(crate) fn with_commit_messages(mut self, messages: Vec<CommitMessage>) -> Self {
        self.commit_messages = messages;
        self
    }

    pub(crate) fn fail_at_write_call(mut self, call: usize) -> Self {
        self.fail_at_write_call = Some(call);
        self
    }

    pub(crate) fn fail_prepare_commit(mut self) -> Self {
        self.fail_prepare_commit = true;
        self
    }

    pub(crate) fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

pub(crate) fn render_row(row: &dyn Row) -> anyhow::Result<Vec<String>> {
    let mut rendered = Vec::with_capacity(row.field_count());
    for index in 0..row.field_count() {
        rendered.push(match row.datum(index)? {
            Datum::Null => "NULL".to_string(),
            Datum::Boolean(v) => v.to_string(),
            Datum::Int8(v) => v.to_string(),
            Datum::Int16(v) => v.to_string(),
            Datum::Int32(v) => v.to_string(),
            Datum::Int64(v) => v.to_string(),
            Datum::Float32(v) => v.to_string(),
            Datum::Float64(v) => v.to_string(),
            Datum::Decimal(v) => v.to_string(),
            Datum::Timestamp(v) => v.as_micros().to_string(),
            Datum::String(v) => v.to_string(),
            Datum::Binary(v) => format!("{v:02x?}"),
        });
    }
    Ok(rendered)
}

impl BatchTableWrite for RecordingWrite {
    fn write(&mut self, row: &dyn Row) -> anyhow::Result<()> {
        self.write_calls += 1;
        if self.fail_at_write_call == Some(self.write_calls) {
            bail!("injected write failure at call {}", self.write_calls);
        }
        let rendered = render_row(row)?;
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.rows.push((row.row_kind(), rendered));
        Ok(())
    }

    fn prepare_commit(&mut self) -> anyhow::Result<Vec<CommitMessage>> {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.prepare_count += 1;
        drop(log);
        if self.fail_prepare_commit {
            bail!("injected prepare_commit failure");
        }
        Ok(self.commit_messages.clone())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.close_count += 1;
        drop(log);
        if self.fail_close {
            bail!("injected close failure");
        }
        Ok(())
    }
}

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
//! Integration tests for the MERGE sink dispatch core, driven through
//! the public crate surface with a recording table writer.

use std::sync::{Arc, Mutex};

use anyhow::bail;
use arrow::array::{Int8Array, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use lakesink::{
    BatchTableWrite, Chunk, CommitMessage, CommitMessageSerializer, MergeSink, PageSink, Row,
    SinkError, lakesink_logging,
};

#[derive(Default)]
struct SessionLog {
    rows: Vec<String>,
    close_count: usize,
}

/// Table writer that renders each row as `<kind>(v0,v1,...)` and emits
/// one commit message per prepared session.
struct RecordingTableWrite {
    log: Arc<Mutex<SessionLog>>,
    rows_written: i64,
    fail_at_write_call: Option<usize>,
    write_calls: usize,
}

impl RecordingTableWrite {
    fn new(log: Arc<Mutex<SessionLog>>) -> Self {
        Self {
            log,
            rows_written: 0,
            fail_at_write_call: None,
            write_calls: 0,
        }
    }

    fn fail_at_write_call(mut self, call: usize) -> Self {
        self.fail_at_write_call = Some(call);
        self
    }
}

impl BatchTableWrite for RecordingTableWrite {
    fn write(&mut self, row: &dyn Row) -> anyhow::Result<()> {
        self.write_calls += 1;
        if self.fail_at_write_call == Some(self.write_calls) {
            bail!("disk full");
        }
        let mut fields = Vec::with_capacity(row.field_count());
        for index in 0..row.field_count() {
            if row.is_null_at(index)? {
                fields.push("NULL".to_string());
                continue;
            }
            fields.push(format!("{:?}", row.datum(index)?));
        }
        self.rows_written += 1;
        let mut log = self.log.lock().expect("session log");
        log.rows
            .push(format!("{}({})", row.row_kind(), fields.join(",")));
        Ok(())
    }

    fn prepare_commit(&mut self) -> anyhow::Result<Vec<CommitMessage>> {
        Ok(vec![CommitMessage {
            partition: vec![],
            bucket: 0,
            new_files: vec!["data-0.orc".to_string()],
            row_count: self.rows_written,
        }])
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let mut log = self.log.lock().expect("session log");
        log.close_count += 1;
        Ok(())
    }
}

/// `[name: string, age: int32, op: int8, rowid: int64]`.
fn merge_chunk(rows: &[(&str, i32, i8)]) -> Chunk {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("age", DataType::Int32, false),
        Field::new("op", DataType::Int8, false),
        Field::new("rowid", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            )),
            Arc::new(Int8Array::from(
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                (0..rows.len() as i64).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("record batch");
    Chunk::new(batch)
}

#[test]
fn merge_session_dispatches_and_commits() {
    lakesink_logging::init_logging();
    let log = Arc::new(Mutex::new(SessionLog::default()));
    let writer = RecordingTableWrite::new(Arc::clone(&log));
    let mut sink = MergeSink::new(PageSink::new(writer), 2);

    let chunk = merge_chunk(&[("a", 1, 1), ("b", 2, 2), ("c", 3, 4), ("d", 4, 5)]);
    sink.store_merged_rows(&chunk).expect("merge");

    let descriptors = sink.finish().expect("finish");
    assert_eq!(descriptors.len(), 1);
    let message = CommitMessageSerializer
        .deserialize(&descriptors[0])
        .expect("decode descriptor");
    assert_eq!(message.row_count, 4);
    assert_eq!(message.new_files, vec!["data-0.orc".to_string()]);

    let log = log.lock().expect("session log");
    assert_eq!(
        log.rows,
        vec![
            "-D(String(\"b\"),Int32(2))",
            "-D(String(\"d\"),Int32(4))",
            "+I(String(\"a\"),Int32(1))",
            "+I(String(\"c\"),Int32(3))",
        ]
    );
    assert_eq!(log.close_count, 1);
}

#[test]
fn append_only_session_inserts_in_batch_order() {
    let log = Arc::new(Mutex::new(SessionLog::default()));
    let writer = RecordingTableWrite::new(Arc::clone(&log));
    let mut sink = PageSink::new(writer);

    let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(StringArray::from(vec!["a", "b", "c"]))],
    )
    .expect("record batch");
    sink.append(&Chunk::new(batch)).expect("append");

    let descriptors = sink.finish().expect("finish");
    assert_eq!(descriptors.len(), 1);

    let log = log.lock().expect("session log");
    assert_eq!(
        log.rows,
        vec![
            "+I(String(\"a\"))",
            "+I(String(\"b\"))",
            "+I(String(\"c\"))",
        ]
    );
}

#[test]
fn reserved_code_rejects_the_batch_without_writer_calls() {
    let log = Arc::new(Mutex::new(SessionLog::default()));
    let writer = RecordingTableWrite::new(Arc::clone(&log));
    let mut sink = MergeSink::new(PageSink::new(writer), 2);

    let err = sink
        .store_merged_rows(&merge_chunk(&[("x", 3, 3)]))
        .expect_err("code 3");
    assert!(
        err.to_string().contains("Invalid merge operation: 3"),
        "err={err}"
    );
    assert!(log.lock().expect("session log").rows.is_empty());
}

#[test]
fn mid_dispatch_failure_then_abort_closes_exactly_once() {
    let log = Arc::new(Mutex::new(SessionLog::default()));
    let writer = RecordingTableWrite::new(Arc::clone(&log)).fail_at_write_call(3);
    let mut sink = MergeSink::new(PageSink::new(writer), 2);

    let chunk = merge_chunk(&[("a", 1, 1), ("b", 2, 2), ("c", 3, 4), ("d", 4, 5)]);
    let err = sink.store_merged_rows(&chunk).expect_err("insert fails");
    assert!(matches!(err, SinkError::Writer(_)), "err={err}");

    sink.abort().expect("abort");
    sink.abort().expect("abort is idempotent");
    let log = log.lock().expect("session log");
    assert_eq!(log.close_count, 1);
    // Both deletes landed before the failing insert.
    assert_eq!(log.rows.len(), 2);
}

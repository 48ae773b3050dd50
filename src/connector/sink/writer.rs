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
use prost::Message;

use crate::common::error::{SinkError, SinkResult};
use crate::connector::sink::row::Row;

/// One unit of uncommitted work produced by the table writer at
/// `prepare_commit` time. The engine treats the serialized form as
/// opaque bytes and hands it to the coordinator for the final commit.
#[derive(Clone, PartialEq, Message)]
pub struct CommitMessage {
    /// Partition the written files belong to, in the storage layer's
    /// binary partition encoding.
    #[prost(bytes = "vec", tag = "1")]
    pub partition: Vec<u8>,
    #[prost(int32, tag = "2")]
    pub bucket: i32,
    /// Names of the data files added by this writer.
    #[prost(string, repeated, tag = "3")]
    pub new_files: Vec<String>,
    #[prost(int64, tag = "4")]
    pub row_count: i64,
}

const COMMIT_MESSAGE_VERSION: u8 = 1;

/// Maps commit messages to version-prefixed byte strings and back.
/// Stateless between invocations.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitMessageSerializer;

impl CommitMessageSerializer {
    pub fn serialize(&self, message: &CommitMessage) -> Bytes {
        let mut buf = Vec::with_capacity(1 + message.encoded_len());
        buf.push(COMMIT_MESSAGE_VERSION);
        buf.extend_from_slice(&message.encode_to_vec());
        Bytes::from(buf)
    }

    pub fn deserialize(&self, bytes: &[u8]) -> SinkResult<CommitMessage> {
        let (&version, payload) = bytes.split_first().ok_or_else(|| {
            SinkError::invalid_argument("commit message bytes are empty".to_string())
        })?;
        if version != COMMIT_MESSAGE_VERSION {
            return Err(SinkError::invalid_argument(format!(
                "unsupported commit message version: {version}"
            )));
        }
        CommitMessage::decode(payload).map_err(|e| {
            SinkError::invalid_argument(format!("decode commit message failed: {e}"))
        })
    }
}

/// Table-format writer collaborator. Accepts rows one at a time and
/// produces commit messages on flush. Failures are opaque to the core
/// and always fatal for the owning sink.
pub trait BatchTableWrite {
    fn write(&mut self, row: &dyn Row) -> anyhow::Result<()>;

    /// Flush accumulated data files and describe them as commit
    /// messages, in write order.
    fn prepare_commit(&mut self) -> anyhow::Result<Vec<CommitMessage>>;

    /// Release writer resources. Idempotent.
    fn close(&mut self) -> anyhow::Result<()>;
}

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

//! Columnar MERGE-sink dispatch core.
//!
//! Bridges a distributed SQL engine's columnar MERGE output to a
//! row-oriented lake table writer: the [`connector::sink::MergeSink`]
//! classifies rows by operation code and splits per-operation column
//! projections, the [`connector::sink::PageSink`] adapts single-row
//! chunk views to the writer's row interface, and commit descriptors
//! are serialized back to the engine at session end.

pub mod common;
pub mod connector;
pub mod exec;

// Embedded-library layout, with `lakesink_*` convenience aliases.
pub use common::logging as lakesink_logging;

pub use common::error::{SinkError, SinkResult};
pub use connector::partition::{BucketMode, PartitioningHandle};
pub use connector::sink::row::{ChunkRow, Datum, DecimalValue, Row, RowKind, Timestamp};
pub use connector::sink::writer::{BatchTableWrite, CommitMessage, CommitMessageSerializer};
pub use connector::sink::{MergeSink, PageSink};
pub use exec::chunk::Chunk;

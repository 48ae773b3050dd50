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

use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

/// Failure classes of the sink core. No error is recovered locally; the
/// contract is all-or-nothing per call.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Precondition violation: bad chunk shape, bad operation code, bad
    /// position count. Raised before any side effect; the sink state is
    /// unchanged. Not retryable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Propagated from the table writer collaborator during write, flush
    /// or serialize. Fatal for the sink; the caller must abort.
    #[error("table writer failed: {0}")]
    Writer(#[source] anyhow::Error),

    /// Mutating a row kind on a row view, reading a nested type, or
    /// calling a sink after it reached a terminal state.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Surfaced from writer-release paths, never swallowed.
    #[error("writer close failed: {0}")]
    Close(#[source] anyhow::Error),
}

impl SinkError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SinkError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        SinkError::Unsupported(message.into())
    }
}

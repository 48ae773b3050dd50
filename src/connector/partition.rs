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

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// How the table distributes rows across buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketMode {
    /// Hash-partitioned by key into a fixed number of buckets.
    Fixed,
    /// No bucketing.
    Unaware,
}

/// Planning-time handle the engine ships between coordinator and workers
/// to pick a bucket-shuffle strategy for the write path. Carries the
/// table schema in its storage-layer serialized form; the bytes stay
/// opaque to the engine.
///
/// Equality is defined by the serialized schema bytes alone, so two
/// handles for the same table compare equal regardless of bucket mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartitioningHandle {
    schema: Vec<u8>,
    bucket_mode: BucketMode,
}

impl PartitioningHandle {
    pub fn new(schema: Vec<u8>, bucket_mode: BucketMode) -> Self {
        Self {
            schema,
            bucket_mode,
        }
    }

    pub fn schema(&self) -> &[u8] {
        &self.schema
    }

    pub fn bucket_mode(&self) -> BucketMode {
        self.bucket_mode
    }
}

impl PartialEq for PartitioningHandle {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
    }
}

impl Eq for PartitioningHandle {}

impl Hash for PartitioningHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
    }
}

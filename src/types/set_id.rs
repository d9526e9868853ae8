// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

const TEMPORARY_PREFIX: &str = "temp-";

/// Opaque identifier of a study set.
///
/// Permanent sets are identified by their row ID in the database. Temporary
/// sets, which live in the local store, are identified by `temp-` followed
/// by their creation time in milliseconds.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetId(String);

impl SetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID of a temporary set created at the given Unix time, in
    /// milliseconds.
    pub fn temporary(millis: i64) -> Self {
        Self(format!("{TEMPORARY_PREFIX}{millis}"))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The row ID of a permanent set, if this ID is one.
    pub fn row_id(&self) -> Option<i64> {
        if self.is_temporary() {
            None
        } else {
            self.0.parse().ok()
        }
    }
}

impl From<i64> for SetId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Display for SetId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

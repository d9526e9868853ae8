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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

/// Opaque identifier of a flashcard. Permanent cards use their row ID,
/// temporary cards use `temp-card-<index>`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn temporary(index: usize) -> Self {
        Self(format!("temp-card-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The row ID of a permanent card, if this ID is one.
    pub fn row_id(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<i64> for CardId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(id) => Ok(CardId::from(id)),
            _ => {
                let string: String = FromSql::column_result(value)?;
                Ok(CardId(string))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary() {
        assert_eq!(CardId::temporary(3).as_str(), "temp-card-3");
        assert_eq!(CardId::temporary(3).row_id(), None);
    }

    #[test]
    fn test_row_id() {
        assert_eq!(CardId::from(17).row_id(), Some(17));
    }
}

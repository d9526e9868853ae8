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

pub mod db;
pub mod local;

use std::path::Path;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::StoreError;
use crate::error::StoreResult;
use crate::store::db::Database;
use crate::store::local::LocalStore;
use crate::types::card::Card;
use crate::types::set_id::SetId;
use crate::types::study_set::SetDraft;
use crate::types::study_set::StudySet;
use crate::types::study_set::StudySetSummary;
use crate::types::user_id::UserId;

pub const DATABASE_FILE: &str = "flipwise.db";
pub const TEMPORARY_SETS_FILE: &str = "temporary_sets.json";

/// Where study sets live.
pub trait CardStore: Send + Sync {
    /// List the sets belonging to `owner`, newest first. Stores without a
    /// notion of ownership list everything.
    fn list_sets(&self, owner: Option<&UserId>) -> StoreResult<Vec<StudySetSummary>>;

    fn get_set(&self, id: &SetId) -> StoreResult<StudySet>;

    /// The cards of a set, in the order they were added. A set with no
    /// cards is an error, since there is nothing to drill.
    fn list_cards(&self, id: &SetId) -> StoreResult<Vec<Card>> {
        let set = self.get_set(id)?;
        if set.cards.is_empty() {
            return Err(StoreError::Empty(id.clone()));
        }
        Ok(set.cards)
    }

    fn create_set(&self, owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<SetId>;

    /// Replace a set's title, description and cards. Cards in the draft
    /// that carry the ID of one of the set's cards update it; the others are
    /// added; cards missing from the draft are removed.
    fn update_set(&self, id: &SetId, owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<()>;

    fn delete_set(&self, id: &SetId, owner: Option<&UserId>) -> StoreResult<()>;
}

/// Both stores. Known users get permanent sets; everyone else gets
/// temporary ones.
pub struct Library {
    pub db: Database,
    pub local: LocalStore,
}

impl Library {
    /// Open the stores in the given directory, creating them if needed.
    pub fn open(directory: &Path) -> Fallible<Self> {
        let db_path = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db = Database::new(db_path)?;
        let local = LocalStore::open(directory.join(TEMPORARY_SETS_FILE))?;
        Ok(Self { db, local })
    }

    /// The store new sets go into.
    pub fn store_for_user(&self, user: Option<&UserId>) -> &dyn CardStore {
        match user {
            Some(_) => &self.db,
            None => &self.local,
        }
    }

    /// The store an existing set lives in.
    pub fn store_for_set(&self, id: &SetId) -> &dyn CardStore {
        if id.is_temporary() {
            &self.local
        } else {
            &self.db
        }
    }

    /// The sets to show to `user`: their permanent sets, if they are known,
    /// followed by the temporary sets.
    pub fn list_sets(&self, user: Option<&UserId>) -> StoreResult<Vec<StudySetSummary>> {
        let mut sets = match user {
            Some(user) => self.db.list_sets(Some(user))?,
            None => Vec::new(),
        };
        sets.extend(self.local.list_sets(None)?);
        Ok(sets)
    }
}

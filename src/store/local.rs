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

use std::collections::HashSet;
use std::fs::read_to_string;
use std::fs::rename;
use std::fs::write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::StoreError;
use crate::error::StoreResult;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::set_id::SetId;
use crate::types::study_set::CardDraft;
use crate::types::study_set::SetDraft;
use crate::types::study_set::StudySet;
use crate::types::study_set::StudySetSummary;
use crate::types::timestamp::Timestamp;
use crate::types::user_id::UserId;

/// Temporary study sets, kept in a single JSON file. The whole file is read
/// when the store is opened, and rewritten after every change.
pub struct LocalStore {
    path: PathBuf,
    sets: Mutex<Vec<StudySet>>,
}

impl LocalStore {
    pub fn open(path: PathBuf) -> Fallible<Self> {
        let sets: Vec<StudySet> = if path.exists() {
            log::debug!("Loading temporary sets from {}", path.display());
            let content = read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        log::debug!("Loaded {} temporary sets.", sets.len());
        Ok(Self {
            path,
            sets: Mutex::new(sets),
        })
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Vec<StudySet>>> {
        self.sets
            .lock()
            .map_err(|_| ErrorReport::new("local store lock poisoned"))
    }

    /// Write the sets to disk. The file is replaced atomically, so a crash
    /// mid-write leaves the previous contents in place.
    fn save(&self, sets: &[StudySet]) -> Fallible<()> {
        let json = serde_json::to_string_pretty(sets)?;
        let tmp = self.path.with_extension("json.tmp");
        write(&tmp, json)?;
        rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CardStore for LocalStore {
    fn list_sets(&self, _owner: Option<&UserId>) -> StoreResult<Vec<StudySetSummary>> {
        let sets = self.acquire()?;
        // Newest first.
        Ok(sets.iter().rev().map(StudySet::summary).collect())
    }

    fn get_set(&self, id: &SetId) -> StoreResult<StudySet> {
        let sets = self.acquire()?;
        sets.iter()
            .find(|set| &set.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn create_set(&self, _owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<SetId> {
        let (title, description) = draft.validate()?;
        let now = Timestamp::now();
        let mut sets = self.acquire()?;
        let mut millis = now.millis();
        let id = loop {
            let id = SetId::temporary(millis);
            if sets.iter().all(|set| set.id != id) {
                break id;
            }
            millis += 1;
        };
        let cards = draft
            .cards
            .iter()
            .enumerate()
            .map(|(index, card)| new_card(CardId::temporary(index), card))
            .collect();
        sets.push(StudySet {
            id: id.clone(),
            title,
            description,
            owner: None,
            created_at: now,
            updated_at: now,
            cards,
        });
        self.save(&sets)?;
        log::debug!("Created temporary study set {id}.");
        Ok(id)
    }

    fn update_set(&self, id: &SetId, _owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<()> {
        let (title, description) = draft.validate()?;
        let mut sets = self.acquire()?;
        let set = sets
            .iter_mut()
            .find(|set| &set.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let existing: HashSet<CardId> = set.cards.iter().map(|c| c.id().clone()).collect();
        let mut used: HashSet<CardId> = HashSet::new();
        let mut next_index = 0;
        let mut cards = Vec::with_capacity(draft.cards.len());
        for card in &draft.cards {
            let card_id = match &card.id {
                Some(card_id) if existing.contains(card_id) && !used.contains(card_id) => {
                    card_id.clone()
                }
                _ => loop {
                    let candidate = CardId::temporary(next_index);
                    next_index += 1;
                    let taken = existing.contains(&candidate)
                        || used.contains(&candidate)
                        || draft.cards.iter().any(|c| c.id.as_ref() == Some(&candidate));
                    if !taken {
                        break candidate;
                    }
                },
            };
            used.insert(card_id.clone());
            cards.push(new_card(card_id, card));
        }

        set.title = title;
        set.description = description;
        set.updated_at = Timestamp::now();
        set.cards = cards;
        self.save(&sets)?;
        log::debug!("Updated temporary study set {id}.");
        Ok(())
    }

    fn delete_set(&self, id: &SetId, _owner: Option<&UserId>) -> StoreResult<()> {
        let mut sets = self.acquire()?;
        let before = sets.len();
        sets.retain(|set| &set.id != id);
        if sets.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.save(&sets)?;
        log::debug!("Deleted temporary study set {id}.");
        Ok(())
    }
}

fn new_card(id: CardId, draft: &CardDraft) -> Card {
    Card::new(id, draft.front.trim(), draft.back.trim())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;

    fn open() -> Fallible<(TempDir, LocalStore)> {
        let dir = tempdir()?;
        let store = LocalStore::open(dir.path().join("temporary_sets.json"))?;
        Ok((dir, store))
    }

    fn vocabulary() -> SetDraft {
        SetDraft {
            title: "Spanish".to_string(),
            description: None,
            cards: vec![
                CardDraft::new("dog", "perro"),
                CardDraft::new("cat", "gato"),
            ],
        }
    }

    #[test]
    fn test_missing_file_is_empty() -> Fallible<()> {
        let (_dir, store) = open()?;
        assert!(store.list_sets(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_and_reopen() -> Fallible<()> {
        let (dir, store) = open()?;
        let id = store.create_set(None, &vocabulary())?;
        assert!(id.is_temporary());
        let store = LocalStore::open(dir.path().join("temporary_sets.json"))?;
        let cards = store.list_cards(&id)?;
        let ids: Vec<&str> = cards.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["temp-card-0", "temp-card-1"]);
        assert_eq!(cards[1].back(), "gato");
        Ok(())
    }

    #[test]
    fn test_ids_are_unique() -> Fallible<()> {
        let (_dir, store) = open()?;
        let a = store.create_set(None, &vocabulary())?;
        let b = store.create_set(None, &vocabulary())?;
        assert_ne!(a, b);
        let sets = store.list_sets(None)?;
        assert_eq!(sets.len(), 2);
        // Newest first.
        assert_eq!(sets[0].id, b);
        Ok(())
    }

    #[test]
    fn test_update() -> Fallible<()> {
        let (_dir, store) = open()?;
        let id = store.create_set(None, &vocabulary())?;
        let draft = SetDraft {
            title: "Spanish animals".to_string(),
            description: Some("Basics".to_string()),
            cards: vec![
                CardDraft {
                    id: Some(CardId::temporary(1)),
                    front: "cat".to_string(),
                    back: "gato".to_string(),
                },
                CardDraft::new("bird", "pájaro"),
                CardDraft::new("horse", "caballo"),
            ],
        };
        store.update_set(&id, None, &draft)?;
        let set = store.get_set(&id)?;
        assert_eq!(set.title, "Spanish animals");
        assert_eq!(set.description.as_deref(), Some("Basics"));
        let ids: Vec<&str> = set.cards.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["temp-card-1", "temp-card-2", "temp-card-3"]);
        Ok(())
    }

    #[test]
    fn test_invalid_update_changes_nothing() -> Fallible<()> {
        let (_dir, store) = open()?;
        let id = store.create_set(None, &vocabulary())?;
        let mut draft = vocabulary();
        draft.cards.pop();
        assert!(matches!(
            store.update_set(&id, None, &draft),
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(store.get_set(&id)?.cards.len(), 2);
        Ok(())
    }

    #[test]
    fn test_delete() -> Fallible<()> {
        let (_dir, store) = open()?;
        let id = store.create_set(None, &vocabulary())?;
        store.delete_set(&id, None)?;
        assert!(matches!(store.get_set(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.delete_set(&id, None),
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }
}

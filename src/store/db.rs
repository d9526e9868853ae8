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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::drill::recorder::SessionId;
use crate::drill::recorder::SessionRecorder;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::StoreError;
use crate::error::StoreResult;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;
use crate::types::study_set::SetDraft;
use crate::types::study_set::StudySet;
use crate::types::study_set::StudySetSummary;
use crate::types::timestamp::Timestamp;
use crate::types::user_id::UserId;

/// The permanent store: study sets owned by known users, and the record of
/// their study sessions.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// How many sessions a user has started and completed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SessionStats {
    pub started: usize,
    pub completed: usize,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    pub fn session_stats(&self, user: &UserId) -> Fallible<SessionStats> {
        let conn = self.acquire()?;
        let sql = "select count(*), count(completed_at) from study_sessions where user_id = ?;";
        let (started, completed): (i64, i64) =
            conn.query_row(sql, [user], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(SessionStats {
            started: started as usize,
            completed: completed as usize,
        })
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned"))
    }
}

impl CardStore for Database {
    fn list_sets(&self, owner: Option<&UserId>) -> StoreResult<Vec<StudySetSummary>> {
        let conn = self.acquire()?;
        let sql = "select s.set_id, s.title, s.description, s.updated_at, count(f.card_id) from study_sets s left outer join flashcards f on f.set_id = s.set_id where ?1 is null or s.owner = ?1 group by s.set_id order by s.set_id desc;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([owner])?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next()? {
            let set_id: i64 = row.get(0)?;
            let card_count: i64 = row.get(4)?;
            sets.push(StudySetSummary {
                id: SetId::from(set_id),
                title: row.get(1)?,
                description: row.get(2)?,
                card_count: card_count as usize,
                updated_at: row.get(3)?,
            });
        }
        Ok(sets)
    }

    fn get_set(&self, id: &SetId) -> StoreResult<StudySet> {
        let row_id = id.row_id().ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let conn = self.acquire()?;
        let set = {
            let sql = "select owner, title, description, created_at, updated_at from study_sets where set_id = ?;";
            conn.query_row(sql, [row_id], |row| {
                Ok(StudySet {
                    id: id.clone(),
                    owner: Some(row.get(0)?),
                    title: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    cards: Vec::new(),
                })
            })
            .optional()?
        };
        let mut set = set.ok_or_else(|| StoreError::NotFound(id.clone()))?;
        set.cards = select_cards(&conn, row_id)?;
        Ok(set)
    }

    fn list_cards(&self, id: &SetId) -> StoreResult<Vec<Card>> {
        let row_id = id.row_id().ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let conn = self.acquire()?;
        if !set_exists(&conn, row_id)? {
            return Err(StoreError::NotFound(id.clone()));
        }
        let cards = select_cards(&conn, row_id)?;
        if cards.is_empty() {
            return Err(StoreError::Empty(id.clone()));
        }
        Ok(cards)
    }

    fn create_set(&self, owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<SetId> {
        let owner = owner.ok_or_else(|| {
            StoreError::Invalid("Permanent study sets need an owner.".to_string())
        })?;
        let (title, description) = draft.validate()?;
        let now = Timestamp::now();
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        insert_user(&tx, owner, now)?;
        let sql = "insert into study_sets (owner, title, description, created_at, updated_at) values (?, ?, ?, ?, ?) returning set_id;";
        let set_id: i64 =
            tx.query_row(sql, (owner, &title, &description, now, now), |row| {
                row.get(0)
            })?;
        for card in &draft.cards {
            insert_card(&tx, set_id, &card.front, &card.back, now)?;
        }
        tx.commit()?;
        log::debug!("Created study set {set_id} with {} cards.", draft.cards.len());
        Ok(SetId::from(set_id))
    }

    fn update_set(&self, id: &SetId, owner: Option<&UserId>, draft: &SetDraft) -> StoreResult<()> {
        let row_id = id.row_id().ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let (title, description) = draft.validate()?;
        let now = Timestamp::now();
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        check_owner(&tx, id, row_id, owner)?;
        tx.execute(
            "update study_sets set title = ?, description = ?, updated_at = ? where set_id = ?;",
            (&title, &description, now, row_id),
        )?;

        let existing: HashSet<i64> = {
            let mut stmt = tx.prepare("select card_id from flashcards where set_id = ?;")?;
            let ids = stmt.query_map([row_id], |row| row.get(0))?;
            ids.collect::<Result<_, _>>()?
        };
        let mut keep: HashSet<i64> = HashSet::new();
        for card in &draft.cards {
            match card.id.as_ref().and_then(CardId::row_id) {
                Some(card_id) if existing.contains(&card_id) && !keep.contains(&card_id) => {
                    tx.execute(
                        "update flashcards set front_text = ?, back_text = ?, updated_at = ? where card_id = ?;",
                        (card.front.trim(), card.back.trim(), now, card_id),
                    )?;
                    keep.insert(card_id);
                }
                _ => {
                    insert_card(&tx, row_id, &card.front, &card.back, now)?;
                }
            }
        }
        for card_id in existing.difference(&keep) {
            tx.execute("delete from flashcards where card_id = ?;", [card_id])?;
        }
        tx.commit()?;
        log::debug!("Updated study set {id}.");
        Ok(())
    }

    fn delete_set(&self, id: &SetId, owner: Option<&UserId>) -> StoreResult<()> {
        let row_id = id.row_id().ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        check_owner(&tx, id, row_id, owner)?;
        // Flashcards and sessions are deleted by cascade.
        tx.execute("delete from study_sets where set_id = ?;", [row_id])?;
        tx.commit()?;
        log::debug!("Deleted study set {id}.");
        Ok(())
    }
}

impl SessionRecorder for Database {
    fn open_session(
        &self,
        user: &UserId,
        set_id: &SetId,
        mode: StudyMode,
    ) -> Fallible<SessionId> {
        let row_id = match set_id.row_id() {
            Some(row_id) => row_id,
            None => return Err(ErrorReport::new(format!("not a permanent study set: {set_id}"))),
        };
        let now = Timestamp::now();
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        insert_user(&tx, user, now)?;
        let sql = "insert into study_sessions (user_id, set_id, mode, started_at) values (?, ?, ?, ?) returning session_id;";
        let session_id: SessionId =
            tx.query_row(sql, (user, row_id, mode, now), |row| row.get(0))?;
        tx.commit()?;
        Ok(session_id)
    }

    fn complete_session(&self, session_id: SessionId) -> Fallible<()> {
        let conn = self.acquire()?;
        let updated = conn.execute(
            "update study_sessions set completed_at = ? where session_id = ?;",
            (Timestamp::now(), session_id),
        )?;
        if updated == 0 {
            return Err(ErrorReport::new(format!("no such session: {session_id}")));
        }
        Ok(())
    }
}

fn select_cards(conn: &Connection, set_id: i64) -> StoreResult<Vec<Card>> {
    let sql = "select card_id, front_text, back_text from flashcards where set_id = ? order by card_id asc;";
    let mut stmt = conn.prepare(sql)?;
    let cards = stmt.query_map([set_id], |row| {
        let card_id: CardId = row.get(0)?;
        let front: String = row.get(1)?;
        let back: String = row.get(2)?;
        Ok(Card::new(card_id, front, back))
    })?;
    Ok(cards.collect::<Result<_, _>>()?)
}

fn set_exists(conn: &Connection, set_id: i64) -> StoreResult<bool> {
    let sql = "select count(*) from study_sets where set_id = ?;";
    let count: i64 = conn.query_row(sql, [set_id], |row| row.get(0))?;
    Ok(count > 0)
}

fn check_owner(
    tx: &Transaction,
    id: &SetId,
    set_id: i64,
    owner: Option<&UserId>,
) -> StoreResult<()> {
    let sql = "select owner from study_sets where set_id = ?;";
    let actual: Option<UserId> = tx
        .query_row(sql, [set_id], |row| row.get(0))
        .optional()?;
    match actual {
        None => Err(StoreError::NotFound(id.clone())),
        Some(actual) if Some(&actual) == owner => Ok(()),
        Some(_) => Err(StoreError::Forbidden(id.clone())),
    }
}

fn insert_user(tx: &Transaction, user: &UserId, now: Timestamp) -> StoreResult<()> {
    let sql = "insert into users (user_id, created_at) values (?, ?) on conflict (user_id) do nothing;";
    tx.execute(sql, (user, now))?;
    Ok(())
}

fn insert_card(
    tx: &Transaction,
    set_id: i64,
    front: &str,
    back: &str,
    now: Timestamp,
) -> StoreResult<()> {
    let sql = "insert into flashcards (set_id, front_text, back_text, created_at, updated_at) values (?, ?, ?, ?, ?);";
    tx.execute(sql, (set_id, front.trim(), back.trim(), now, now))?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["study_sets"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::types::study_set::CardDraft;

    fn open() -> Fallible<(TempDir, Database)> {
        let dir = tempdir()?;
        let path = dir.path().join("flipwise.db");
        let db = Database::new(path.to_str().unwrap())?;
        Ok((dir, db))
    }

    fn capitals() -> SetDraft {
        SetDraft {
            title: "Capitals".to_string(),
            description: Some("European capitals".to_string()),
            cards: vec![
                CardDraft::new("France", "Paris"),
                CardDraft::new("Spain", " Madrid "),
                CardDraft::new("Italy", "Rome"),
            ],
        }
    }

    #[test]
    fn test_create_and_get() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let id = db.create_set(Some(&ada), &capitals())?;
        let set = db.get_set(&id)?;
        assert_eq!(set.title, "Capitals");
        assert_eq!(set.owner, Some(ada.clone()));
        let backs: Vec<&str> = set.cards.iter().map(|c| c.back()).collect();
        assert_eq!(backs, vec!["Paris", "Madrid", "Rome"]);
        let sets = db.list_sets(Some(&ada))?;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].card_count, 3);
        assert!(db.list_sets(Some(&UserId::new("bob")))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_data() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flipwise.db");
        let path = path.to_str().unwrap();
        let id = Database::new(path)?.create_set(Some(&UserId::new("ada")), &capitals())?;
        let db = Database::new(path)?;
        assert_eq!(db.list_cards(&id)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_create_requires_owner() -> Fallible<()> {
        let (_dir, db) = open()?;
        assert!(matches!(
            db.create_set(None, &capitals()),
            Err(StoreError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn test_list_cards_not_found() -> Fallible<()> {
        let (_dir, db) = open()?;
        assert!(matches!(
            db.list_cards(&SetId::new("99")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            db.list_cards(&SetId::new("temp-1")),
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_update_keeps_adds_and_deletes() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let id = db.create_set(Some(&ada), &capitals())?;
        let cards = db.list_cards(&id)?;
        let draft = SetDraft {
            title: "Capitals of Europe".to_string(),
            description: None,
            cards: vec![
                CardDraft {
                    id: Some(cards[0].id().clone()),
                    front: "France".to_string(),
                    back: "Paris!".to_string(),
                },
                CardDraft::new("Germany", "Berlin"),
                CardDraft {
                    id: Some(cards[2].id().clone()),
                    front: "Italy".to_string(),
                    back: "Rome".to_string(),
                },
            ],
        };
        db.update_set(&id, Some(&ada), &draft)?;
        let set = db.get_set(&id)?;
        assert_eq!(set.title, "Capitals of Europe");
        assert_eq!(set.description, None);
        let fronts: Vec<&str> = set.cards.iter().map(|c| c.front()).collect();
        assert_eq!(fronts, vec!["France", "Italy", "Germany"]);
        assert_eq!(set.cards[0].id(), cards[0].id());
        assert_eq!(set.cards[0].back(), "Paris!");
        assert!(set.cards.iter().all(|c| c.id() != cards[1].id()));
        Ok(())
    }

    #[test]
    fn test_update_with_repeated_card_id() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let id = db.create_set(Some(&ada), &capitals())?;
        let cards = db.list_cards(&id)?;
        let repeated = |front: &str, back: &str| CardDraft {
            id: Some(cards[0].id().clone()),
            front: front.to_string(),
            back: back.to_string(),
        };
        let draft = SetDraft {
            title: "Capitals".to_string(),
            description: None,
            cards: vec![repeated("France", "Paris"), repeated("Poland", "Warsaw")],
        };
        db.update_set(&id, Some(&ada), &draft)?;
        let cards_after = db.list_cards(&id)?;
        assert_eq!(cards_after.len(), 2);
        assert_eq!(cards_after[0].id(), cards[0].id());
        assert_eq!(cards_after[0].back(), "Paris");
        assert_eq!(cards_after[1].back(), "Warsaw");
        Ok(())
    }

    #[test]
    fn test_list_cards_of_empty_set() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let id = db.create_set(Some(&ada), &capitals())?;
        // Drafts are validated, so only a set emptied behind the store's
        // back has no cards.
        {
            let conn = db.acquire()?;
            conn.execute("delete from flashcards;", [])?;
        }
        assert!(matches!(db.list_cards(&id), Err(StoreError::Empty(_))));
        assert!(db.get_set(&id)?.cards.is_empty());
        Ok(())
    }

    #[test]
    fn test_update_and_delete_check_owner() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let bob = UserId::new("bob");
        let id = db.create_set(Some(&ada), &capitals())?;
        assert!(matches!(
            db.update_set(&id, Some(&bob), &capitals()),
            Err(StoreError::Forbidden(_))
        ));
        assert!(matches!(
            db.delete_set(&id, None),
            Err(StoreError::Forbidden(_))
        ));
        db.delete_set(&id, Some(&ada))?;
        assert!(matches!(db.get_set(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            db.delete_set(&id, Some(&ada)),
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_sessions() -> Fallible<()> {
        let (_dir, db) = open()?;
        let ada = UserId::new("ada");
        let id = db.create_set(Some(&ada), &capitals())?;
        let first = db.open_session(&ada, &id, StudyMode::Written)?;
        let _second = db.open_session(&ada, &id, StudyMode::Flashcard)?;
        db.complete_session(first)?;
        assert_eq!(
            db.session_stats(&ada)?,
            SessionStats {
                started: 2,
                completed: 1
            }
        );
        assert!(db.complete_session(1000).is_err());
        assert!(
            db.open_session(&ada, &SetId::new("temp-1"), StudyMode::Written)
                .is_err()
        );
        Ok(())
    }
}

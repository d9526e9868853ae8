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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

use crate::drill::engine::DrillSession;
use crate::drill::engine::Status;
use crate::drill::evaluator::MatchEvaluator;
use crate::drill::evaluator::RevealEvaluator;
use crate::drill::recorder::SessionId;
use crate::drill::recorder::SessionRecorder;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::Library;
use crate::store::db::Database;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;
use crate::types::user_id::UserId;

#[derive(Clone)]
pub struct ServerState {
    pub user: Option<UserId>,
    /// How long written-mode results stay on screen.
    pub feedback: Duration,
    pub library: Arc<Library>,
    pub mutable: Arc<Mutex<MutableState>>,
}

impl ServerState {
    pub fn acquire(&self) -> Fallible<MutexGuard<'_, MutableState>> {
        self.mutable
            .lock()
            .map_err(|_| ErrorReport::new("server state lock poisoned"))
    }
}

#[derive(Default)]
pub struct MutableState {
    /// The drill in progress, if any. Only one drill runs at a time:
    /// starting another one discards it.
    pub drill: Option<ActiveDrill>,
}

pub struct ActiveDrill {
    pub set_id: SetId,
    pub title: String,
    pub session: DrillSession,
    pub evaluator: ModeEvaluator,
    /// A one-off message shown above the card.
    pub notice: Option<String>,
}

impl ActiveDrill {
    pub fn mode(&self) -> StudyMode {
        match self.evaluator {
            ModeEvaluator::Flashcard(_) => StudyMode::Flashcard,
            ModeEvaluator::Written(_) => StudyMode::Written,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.set_id.is_temporary()
    }

    /// Move past a result whose time is up.
    pub fn poll(&mut self) {
        let round = self.session.round();
        self.session.poll(Instant::now());
        self.note_new_round(round);
    }

    /// Tell the learner how many cards are coming back, if the session
    /// started a new round since `round`.
    pub fn note_new_round(&mut self, round: usize) {
        if self.session.round() > round && self.session.status() == Status::Active {
            let count = self.session.working_set().len();
            let noun = if count == 1 { "card" } else { "cards" };
            self.notice = Some(format!("You have {count} {noun} to review again."));
        }
    }
}

pub enum ModeEvaluator {
    Flashcard(RevealEvaluator),
    Written(MatchEvaluator),
}

impl ModeEvaluator {
    pub fn new(mode: StudyMode) -> Self {
        match mode {
            StudyMode::Flashcard => ModeEvaluator::Flashcard(RevealEvaluator::new()),
            StudyMode::Written => ModeEvaluator::Written(MatchEvaluator),
        }
    }
}

/// Records sessions in the database without holding up request handlers:
/// completions are written on the blocking thread pool, and failures are
/// only logged.
pub struct BackgroundRecorder {
    db: Database,
}

impl BackgroundRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SessionRecorder for BackgroundRecorder {
    fn open_session(
        &self,
        user: &UserId,
        set_id: &SetId,
        mode: StudyMode,
    ) -> Fallible<SessionId> {
        self.db.open_session(user, set_id, mode)
    }

    fn complete_session(&self, session_id: SessionId) -> Fallible<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = db.complete_session(session_id) {
                log::warn!("Failed to complete study session {session_id}: {e}");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;
    use tokio::time::sleep;

    use super::*;
    use crate::store::CardStore;
    use crate::types::study_set::CardDraft;
    use crate::types::study_set::SetDraft;

    #[tokio::test]
    async fn test_background_recorder() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flipwise.db");
        let db = Database::new(path.to_str().unwrap())?;
        let ada = UserId::new("ada");
        let recorder = BackgroundRecorder::new(db.clone());
        let session_id = recorder.open_session(&ada, &SetId::new("1"), StudyMode::Written);
        // The set does not exist, so the foreign key rejects the record.
        assert!(session_id.is_err());

        let set_id = {
            let draft = SetDraft {
                title: "Capitals".to_string(),
                description: None,
                cards: vec![
                    CardDraft::new("France", "Paris"),
                    CardDraft::new("Spain", "Madrid"),
                ],
            };
            db.create_set(Some(&ada), &draft)?
        };
        let session_id = recorder.open_session(&ada, &set_id, StudyMode::Written)?;
        recorder.complete_session(session_id)?;
        // Unknown sessions are logged, not reported.
        recorder.complete_session(session_id + 100)?;
        for _ in 0..1000 {
            if db.session_stats(&ada)?.completed == 1 {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(db.session_stats(&ada)?.completed, 1);
        Ok(())
    }
}

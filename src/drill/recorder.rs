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

use crate::error::Fallible;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;
use crate::types::user_id::UserId;

pub type SessionId = i64;

/// Somewhere to keep a record of drill sessions run by known learners.
pub trait SessionRecorder: Send + Sync {
    /// Create a session record, returning its ID.
    fn open_session(&self, user: &UserId, set_id: &SetId, mode: StudyMode)
    -> Fallible<SessionId>;

    /// Mark a session record as completed.
    fn complete_session(&self, session_id: SessionId) -> Fallible<()>;
}

/// An open session record.
#[derive(Clone)]
pub struct SessionHandle {
    recorder: Arc<dyn SessionRecorder>,
    session_id: SessionId,
}

impl SessionHandle {
    #[cfg(test)]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

/// Open a session record. Failures are logged and yield `None`: recording is
/// never allowed to get in the way of drilling.
pub fn open(
    recorder: Arc<dyn SessionRecorder>,
    user: &UserId,
    set_id: &SetId,
    mode: StudyMode,
) -> Option<SessionHandle> {
    match recorder.open_session(user, set_id, mode) {
        Ok(session_id) => {
            log::debug!("Opened session {session_id} for {user} on set {set_id} ({mode}).");
            Some(SessionHandle {
                recorder,
                session_id,
            })
        }
        Err(e) => {
            log::warn!("Failed to open study session: {e}");
            None
        }
    }
}

/// Mark a session record as completed. Failures are logged only.
pub fn complete(handle: &SessionHandle) {
    match handle.recorder.complete_session(handle.session_id) {
        Ok(()) => {
            log::debug!("Session {} marked as completed.", handle.session_id);
        }
        Err(e) => {
            log::warn!("Failed to complete study session {}: {e}", handle.session_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::fail;

    /// Records calls in memory, and can be told to fail.
    #[derive(Default)]
    pub struct MemoryRecorder {
        pub fail_open: bool,
        pub fail_complete: bool,
        pub opened: Mutex<Vec<(UserId, SetId, StudyMode)>>,
        pub completed: Mutex<Vec<SessionId>>,
    }

    impl SessionRecorder for MemoryRecorder {
        fn open_session(
            &self,
            user: &UserId,
            set_id: &SetId,
            mode: StudyMode,
        ) -> Fallible<SessionId> {
            if self.fail_open {
                return fail("connection refused");
            }
            let mut opened = self.opened.lock().unwrap();
            opened.push((user.clone(), set_id.clone(), mode));
            Ok(opened.len() as SessionId)
        }

        fn complete_session(&self, session_id: SessionId) -> Fallible<()> {
            if self.fail_complete {
                return fail("connection refused");
            }
            self.completed.lock().unwrap().push(session_id);
            Ok(())
        }
    }

    #[test]
    fn test_open_and_complete() {
        let recorder = Arc::new(MemoryRecorder::default());
        let handle = open(
            recorder.clone(),
            &UserId::new("ada"),
            &SetId::new("1"),
            StudyMode::Written,
        )
        .unwrap();
        assert_eq!(handle.session_id(), 1);
        complete(&handle);
        assert_eq!(*recorder.completed.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_open_failure_yields_none() {
        let recorder = Arc::new(MemoryRecorder {
            fail_open: true,
            ..Default::default()
        });
        let handle = open(
            recorder,
            &UserId::new("ada"),
            &SetId::new("1"),
            StudyMode::Flashcard,
        );
        assert!(handle.is_none());
    }

    #[test]
    fn test_complete_failure_is_swallowed() {
        let recorder = Arc::new(MemoryRecorder {
            fail_complete: true,
            ..Default::default()
        });
        let handle = open(
            recorder.clone(),
            &UserId::new("ada"),
            &SetId::new("1"),
            StudyMode::Flashcard,
        )
        .unwrap();
        complete(&handle);
        assert!(recorder.completed.lock().unwrap().is_empty());
    }
}

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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use crate::drill::evaluator::Evaluator;
use crate::drill::recorder;
use crate::drill::recorder::SessionHandle;
use crate::drill::recorder::SessionRecorder;
use crate::error::DrillError;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;
use crate::types::user_id::UserId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// The result of one answer to one card, in the current round.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CardOutcome {
    pub card_id: CardId,
    pub verdict: Verdict,
    pub user_input: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Active,
    Completed,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Waiting for an answer to the current card.
    Answering,
    /// The outcome of the current card is on screen until `until`.
    ShowingResult { outcome: CardOutcome, until: Instant },
}

/// A known learner, and where to record their sessions.
pub struct Identity {
    pub user: UserId,
    pub set_id: SetId,
    pub mode: StudyMode,
    pub recorder: Arc<dyn SessionRecorder>,
}

/// One run through a study set.
///
/// The session walks the working set one card at a time. At the end of each
/// round, the cards that were answered incorrectly, in the order they were
/// seen, become the working set of the next round. The session completes
/// when a round has no incorrect answers.
pub struct DrillSession {
    working_set: Vec<Card>,
    position: usize,
    round: usize,
    /// Outcomes of the current round.
    outcomes: HashMap<CardId, CardOutcome>,
    status: Status,
    phase: Phase,
    /// How long to show the outcome of an answer before moving on.
    feedback: Duration,
    handle: Option<SessionHandle>,
}

impl DrillSession {
    pub fn start(cards: Vec<Card>, identity: Option<Identity>) -> Result<Self, DrillError> {
        if cards.is_empty() {
            return Err(DrillError::EmptySet);
        }
        let handle = identity.and_then(|identity| {
            recorder::open(
                identity.recorder,
                &identity.user,
                &identity.set_id,
                identity.mode,
            )
        });
        log::debug!("Starting drill session with {} cards.", cards.len());
        Ok(Self {
            working_set: cards,
            position: 0,
            round: 1,
            outcomes: HashMap::new(),
            status: Status::Active,
            phase: Phase::Answering,
            feedback: Duration::ZERO,
            handle,
        })
    }

    /// Show the outcome of each answer for the given duration before moving
    /// to the next card.
    pub fn with_feedback(mut self, feedback: Duration) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn current_card(&self) -> Result<&Card, DrillError> {
        match self.status {
            Status::Active => Ok(&self.working_set[self.position]),
            Status::Completed => Err(DrillError::NoActiveCard),
        }
    }

    /// Evaluate an answer to the current card and record the verdict. If
    /// the evaluator rejects the input, the session is left unchanged.
    pub fn answer<E: Evaluator>(
        &mut self,
        evaluator: &mut E,
        input: &E::Input,
    ) -> Result<Verdict, DrillError> {
        self.check_answering()?;
        let card = &self.working_set[self.position];
        let verdict = evaluator.evaluate(card, input)?;
        self.submit_answer(verdict, E::user_input(input))?;
        Ok(verdict)
    }

    /// Record the verdict for the current card.
    pub fn submit_answer(
        &mut self,
        verdict: Verdict,
        user_input: Option<String>,
    ) -> Result<(), DrillError> {
        self.check_answering()?;
        let card_id = self.working_set[self.position].id().clone();
        let outcome = CardOutcome {
            card_id: card_id.clone(),
            verdict,
            user_input,
        };
        self.outcomes.insert(card_id, outcome.clone());
        if self.feedback.is_zero() {
            self.next();
        } else {
            self.phase = Phase::ShowingResult {
                outcome,
                until: Instant::now() + self.feedback,
            };
        }
        Ok(())
    }

    /// Stop showing the current result and move on.
    pub fn advance(&mut self) -> Result<(), DrillError> {
        match self.status {
            Status::Completed => Err(DrillError::NoActiveCard),
            Status::Active => {
                if let Phase::ShowingResult { .. } = self.phase {
                    self.phase = Phase::Answering;
                    self.next();
                }
                Ok(())
            }
        }
    }

    /// Move on if the current result has been shown for long enough.
    /// Returns whether the session advanced.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.phase {
            Phase::ShowingResult { until, .. } if now >= *until => {
                self.phase = Phase::Answering;
                self.next();
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn round(&self) -> usize {
        self.round
    }

    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn working_set(&self) -> &[Card] {
        &self.working_set
    }

    #[cfg(test)]
    /// The outcome recorded for a card in the current round.
    pub fn outcome(&self, card_id: &CardId) -> Option<&CardOutcome> {
        self.outcomes.get(card_id)
    }

    /// The one-based number of the current card, and the size of the round.
    pub fn progress(&self) -> (usize, usize) {
        (self.position + 1, self.working_set.len())
    }

    #[cfg(test)]
    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    fn check_answering(&self) -> Result<(), DrillError> {
        if self.status == Status::Completed {
            return Err(DrillError::NoActiveCard);
        }
        match self.phase {
            Phase::Answering => Ok(()),
            Phase::ShowingResult { .. } => Err(DrillError::ShowingResult),
        }
    }

    fn next(&mut self) {
        if self.position + 1 < self.working_set.len() {
            self.position += 1;
            return;
        }
        let misses: Vec<Card> = self
            .working_set
            .iter()
            .filter(|card| {
                self.outcomes
                    .get(card.id())
                    .is_some_and(|outcome| outcome.verdict == Verdict::Incorrect)
            })
            .cloned()
            .collect();
        if misses.is_empty() {
            log::debug!("Drill session completed after {} rounds.", self.round);
            self.status = Status::Completed;
            if let Some(handle) = &self.handle {
                recorder::complete(handle);
            }
        } else {
            log::debug!(
                "Round {} finished with {} incorrect cards.",
                self.round,
                misses.len()
            );
            self.outcomes.clear();
            self.working_set = misses;
            self.position = 0;
            self.round += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::evaluator::MatchEvaluator;
    use crate::drill::evaluator::RevealEvaluator;
    use crate::drill::recorder::tests::MemoryRecorder;

    fn deck(pairs: &[(&str, &str)]) -> Vec<Card> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (front, back))| Card::new(CardId::temporary(i), *front, *back))
            .collect()
    }

    fn fronts(session: &DrillSession) -> Vec<&str> {
        session.working_set().iter().map(|c| c.front()).collect()
    }

    fn identity(recorder: Arc<MemoryRecorder>) -> Identity {
        Identity {
            user: UserId::new("ada"),
            set_id: SetId::new("7"),
            mode: StudyMode::Written,
            recorder,
        }
    }

    #[test]
    fn test_empty_deck() {
        let result = DrillSession::start(vec![], None);
        assert_eq!(result.err(), Some(DrillError::EmptySet));
    }

    #[test]
    fn test_written_scenario() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1"), ("B", "2"), ("C", "3")]), None)?;
        let mut evaluator = MatchEvaluator;
        assert_eq!(session.round(), 1);
        assert_eq!(session.answer(&mut evaluator, "1")?, Verdict::Correct);
        assert_eq!(session.answer(&mut evaluator, "x")?, Verdict::Incorrect);
        assert_eq!(session.answer(&mut evaluator, "3")?, Verdict::Correct);
        assert_eq!(session.round(), 2);
        assert_eq!(fronts(&session), vec!["B"]);
        assert_eq!(session.position(), 0);
        assert_eq!(session.status(), Status::Active);
        session.answer(&mut evaluator, "2")?;
        assert_eq!(session.status(), Status::Completed);
        assert_eq!(session.round(), 2);
        Ok(())
    }

    #[test]
    fn test_reveal_scenario() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1")]), None)?;
        let mut evaluator = RevealEvaluator::new();
        assert_eq!(
            session.answer(&mut evaluator, &true),
            Err(DrillError::NotRevealed)
        );
        assert_eq!(session.position(), 0);
        assert_eq!(session.status(), Status::Active);
        assert_eq!(session.outcome(&CardId::temporary(0)), None);
        evaluator.flip();
        session.answer(&mut evaluator, &true)?;
        assert_eq!(session.status(), Status::Completed);
        assert_eq!(session.round(), 1);
        Ok(())
    }

    #[test]
    fn test_rebuild_preserves_encounter_order() -> Result<(), DrillError> {
        let cards = deck(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4"), ("E", "5")]);
        let mut session = DrillSession::start(cards, None)?;
        for verdict in [
            Verdict::Incorrect,
            Verdict::Correct,
            Verdict::Incorrect,
            Verdict::Correct,
            Verdict::Incorrect,
        ] {
            session.submit_answer(verdict, None)?;
        }
        assert_eq!(session.round(), 2);
        assert_eq!(fronts(&session), vec!["A", "C", "E"]);
        // Outcomes from the previous round are cleared.
        assert_eq!(session.outcome(&CardId::temporary(0)), None);

        session.submit_answer(Verdict::Correct, None)?;
        session.submit_answer(Verdict::Incorrect, None)?;
        session.submit_answer(Verdict::Incorrect, None)?;
        assert_eq!(session.round(), 3);
        assert_eq!(fronts(&session), vec!["C", "E"]);

        session.submit_answer(Verdict::Correct, None)?;
        session.submit_answer(Verdict::Correct, None)?;
        assert!(session.is_completed());
        assert_eq!(session.round(), 3);
        Ok(())
    }

    #[test]
    fn test_rounds_never_decrease() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1"), ("B", "2")]), None)?;
        let mut last_round = session.round();
        // Miss everything a few times, then get everything right.
        for _ in 0..6 {
            session.submit_answer(Verdict::Incorrect, None)?;
            assert!(session.round() >= last_round);
            last_round = session.round();
        }
        assert_eq!(session.working_set().len(), 2);
        while !session.is_completed() {
            session.submit_answer(Verdict::Correct, None)?;
            assert!(session.round() >= last_round);
            last_round = session.round();
        }
        assert_eq!(session.round(), 4);
        Ok(())
    }

    #[test]
    fn test_current_card_after_completion() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1")]), None)?;
        assert_eq!(session.current_card()?.front(), "A");
        session.submit_answer(Verdict::Correct, None)?;
        assert_eq!(session.current_card().err(), Some(DrillError::NoActiveCard));
        assert_eq!(
            session.submit_answer(Verdict::Correct, None),
            Err(DrillError::NoActiveCard)
        );
        assert_eq!(session.advance(), Err(DrillError::NoActiveCard));
        Ok(())
    }

    #[test]
    fn test_user_input_is_recorded() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1"), ("B", "2")]), None)?;
        session.answer(&mut MatchEvaluator, " nope ")?;
        assert_eq!(
            session.outcome(&CardId::temporary(0)),
            Some(&CardOutcome {
                card_id: CardId::temporary(0),
                verdict: Verdict::Incorrect,
                user_input: Some(" nope ".to_string()),
            })
        );
        Ok(())
    }

    #[test]
    fn test_feedback_delay() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1"), ("B", "2")]), None)?
            .with_feedback(Duration::from_secs(60));
        session.submit_answer(Verdict::Correct, None)?;
        assert!(matches!(session.phase(), Phase::ShowingResult { .. }));
        assert_eq!(session.position(), 0);
        assert_eq!(
            session.submit_answer(Verdict::Correct, None),
            Err(DrillError::ShowingResult)
        );
        // Not yet due.
        assert!(!session.poll(Instant::now()));
        assert_eq!(session.position(), 0);
        // Due.
        assert!(session.poll(Instant::now() + Duration::from_secs(61)));
        assert_eq!(session.phase(), &Phase::Answering);
        assert_eq!(session.position(), 1);

        session.submit_answer(Verdict::Correct, None)?;
        // The session only completes once the result has been shown.
        assert_eq!(session.status(), Status::Active);
        session.advance()?;
        assert!(session.is_completed());
        Ok(())
    }

    #[test]
    fn test_advance_while_answering_is_noop() -> Result<(), DrillError> {
        let mut session = DrillSession::start(deck(&[("A", "1"), ("B", "2")]), None)?;
        session.advance()?;
        assert_eq!(session.position(), 0);
        assert!(!session.poll(Instant::now()));
        Ok(())
    }

    #[test]
    fn test_recorder_open_and_complete() -> Result<(), DrillError> {
        let recorder = Arc::new(MemoryRecorder::default());
        let mut session =
            DrillSession::start(deck(&[("A", "1")]), Some(identity(recorder.clone())))?;
        assert!(session.handle().is_some());
        assert_eq!(recorder.opened.lock().unwrap().len(), 1);
        assert!(recorder.completed.lock().unwrap().is_empty());
        session.submit_answer(Verdict::Correct, None)?;
        assert_eq!(*recorder.completed.lock().unwrap(), vec![1]);
        Ok(())
    }

    #[test]
    fn test_recorder_not_completed_before_last_round() -> Result<(), DrillError> {
        let recorder = Arc::new(MemoryRecorder::default());
        let mut session = DrillSession::start(
            deck(&[("A", "1"), ("B", "2")]),
            Some(identity(recorder.clone())),
        )?;
        session.submit_answer(Verdict::Correct, None)?;
        session.submit_answer(Verdict::Incorrect, None)?;
        assert!(recorder.completed.lock().unwrap().is_empty());
        session.submit_answer(Verdict::Correct, None)?;
        assert_eq!(recorder.completed.lock().unwrap().len(), 1);
        Ok(())
    }

    #[test]
    fn test_recorder_failures_are_isolated() -> Result<(), DrillError> {
        let recorder = Arc::new(MemoryRecorder {
            fail_open: true,
            ..Default::default()
        });
        let mut session =
            DrillSession::start(deck(&[("A", "1")]), Some(identity(recorder)))?;
        assert!(session.handle().is_none());
        session.submit_answer(Verdict::Correct, None)?;
        assert!(session.is_completed());

        let recorder = Arc::new(MemoryRecorder {
            fail_complete: true,
            ..Default::default()
        });
        let mut session =
            DrillSession::start(deck(&[("A", "1")]), Some(identity(recorder)))?;
        assert!(session.handle().is_some());
        session.submit_answer(Verdict::Correct, None)?;
        assert!(session.is_completed());
        Ok(())
    }
}

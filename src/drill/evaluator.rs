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

use crate::drill::engine::Verdict;
use crate::error::DrillError;
use crate::types::card::Card;

/// Decides whether an answer to a card is correct.
pub trait Evaluator {
    type Input: ?Sized;

    fn evaluate(&mut self, card: &Card, input: &Self::Input) -> Result<Verdict, DrillError>;

    /// What to record as the learner's input alongside the verdict.
    fn user_input(_input: &Self::Input) -> Option<String> {
        None
    }
}

/// Flip-card mode: the learner flips the card, then reports whether they
/// knew the answer.
#[derive(Default)]
pub struct RevealEvaluator {
    revealed: bool,
}

impl RevealEvaluator {
    pub fn new() -> Self {
        Self { revealed: false }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn reveal(&mut self) {
        self.revealed = true;
    }

    /// Turn the card over. Flipping twice shows the front again.
    pub fn flip(&mut self) {
        self.revealed = !self.revealed;
    }
}

impl Evaluator for RevealEvaluator {
    /// Whether the learner knew the answer.
    type Input = bool;

    fn evaluate(&mut self, _card: &Card, knew: &bool) -> Result<Verdict, DrillError> {
        if !self.revealed {
            return Err(DrillError::NotRevealed);
        }
        // The next card starts face down.
        self.revealed = false;
        Ok(if *knew {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        })
    }
}

/// Written mode: the learner types the answer.
#[derive(Default)]
pub struct MatchEvaluator;

impl Evaluator for MatchEvaluator {
    type Input = str;

    fn evaluate(&mut self, card: &Card, input: &str) -> Result<Verdict, DrillError> {
        Ok(if answer_matches(card.back(), input) {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        })
    }

    fn user_input(input: &str) -> Option<String> {
        Some(input.to_string())
    }
}

/// Compare a typed answer against the expected one. Only surrounding
/// whitespace and letter case are ignored.
pub fn answer_matches(expected: &str, input: &str) -> bool {
    input.trim().to_lowercase() == expected.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::card_id::CardId;

    fn paris() -> Card {
        Card::new(CardId::new("1"), "Capital of France", "Paris")
    }

    #[test]
    fn test_match_ignores_case_and_surrounding_space() {
        let card = paris();
        let mut evaluator = MatchEvaluator;
        assert_eq!(
            evaluator.evaluate(&card, "  Paris "),
            Ok(Verdict::Correct)
        );
        assert_eq!(evaluator.evaluate(&card, "paris"), Ok(Verdict::Correct));
        assert_eq!(evaluator.evaluate(&card, "PARIS\n"), Ok(Verdict::Correct));
    }

    #[test]
    fn test_match_is_otherwise_strict() {
        let card = paris();
        let mut evaluator = MatchEvaluator;
        assert_eq!(evaluator.evaluate(&card, "Pariss"), Ok(Verdict::Incorrect));
        assert_eq!(evaluator.evaluate(&card, "Pa ris"), Ok(Verdict::Incorrect));
        assert_eq!(evaluator.evaluate(&card, ""), Ok(Verdict::Incorrect));
        let card = Card::new(CardId::new("2"), "Coffee in French", "café");
        assert_eq!(evaluator.evaluate(&card, "cafe"), Ok(Verdict::Incorrect));
        assert_eq!(evaluator.evaluate(&card, "CAFÉ"), Ok(Verdict::Correct));
    }

    #[test]
    fn test_match_records_input() {
        assert_eq!(MatchEvaluator::user_input(" x "), Some(" x ".to_string()));
    }

    #[test]
    fn test_reveal_requires_flip() {
        let card = paris();
        let mut evaluator = RevealEvaluator::new();
        assert_eq!(
            evaluator.evaluate(&card, &true),
            Err(DrillError::NotRevealed)
        );
        evaluator.flip();
        assert_eq!(evaluator.evaluate(&card, &true), Ok(Verdict::Correct));
        // Accepting a verdict turns the card face down again.
        assert!(!evaluator.is_revealed());
        assert_eq!(
            evaluator.evaluate(&card, &false),
            Err(DrillError::NotRevealed)
        );
        evaluator.reveal();
        assert_eq!(evaluator.evaluate(&card, &false), Ok(Verdict::Incorrect));
    }

    #[test]
    fn test_flip_toggles() {
        let mut evaluator = RevealEvaluator::new();
        evaluator.flip();
        assert!(evaluator.is_revealed());
        evaluator.flip();
        assert!(!evaluator.is_revealed());
    }
}

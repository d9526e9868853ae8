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

use serde::Deserialize;
use serde::Serialize;

use crate::error::StoreError;
use crate::error::StoreResult;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::set_id::SetId;
use crate::types::timestamp::Timestamp;
use crate::types::user_id::UserId;

/// The smallest number of cards a study set may have.
pub const MIN_CARDS: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudySet {
    pub id: SetId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The user who owns the set. Temporary sets have no owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(rename = "flashcards")]
    pub cards: Vec<Card>,
}

impl StudySet {
    pub fn summary(&self) -> StudySetSummary {
        StudySetSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            card_count: self.cards.len(),
            updated_at: self.updated_at,
        }
    }
}

/// What the set listings show.
#[derive(Clone, Debug, Serialize)]
pub struct StudySetSummary {
    pub id: SetId,
    pub title: String,
    pub description: Option<String>,
    pub card_count: usize,
    pub updated_at: Timestamp,
}

/// A study set as submitted by the create and edit forms.
#[derive(Clone, Debug, Default)]
pub struct SetDraft {
    pub title: String,
    pub description: Option<String>,
    pub cards: Vec<CardDraft>,
}

#[derive(Clone, Debug, Default)]
pub struct CardDraft {
    /// Set when the card already exists in the set being edited.
    pub id: Option<CardId>,
    pub front: String,
    pub back: String,
}

#[cfg(test)]
impl CardDraft {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: None,
            front: front.into(),
            back: back.into(),
        }
    }
}

impl SetDraft {
    /// Check the draft, returning the trimmed title and the description
    /// with blank values dropped.
    pub fn validate(&self) -> StoreResult<(String, Option<String>)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(StoreError::Invalid(
                "Please provide a title for your study set.".to_string(),
            ));
        }
        if self.cards.len() < MIN_CARDS {
            return Err(StoreError::Invalid(format!(
                "A study set must have at least {MIN_CARDS} flashcards."
            )));
        }
        let incomplete = self
            .cards
            .iter()
            .any(|card| card.front.trim().is_empty() || card.back.trim().is_empty());
        if incomplete {
            return Err(StoreError::Invalid(
                "Please fill in both sides of all flashcards.".to_string(),
            ));
        }
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok((title.to_string(), description))
    }
}

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

use maud::Markup;
use maud::PreEscaped;
use maud::html;
use serde::Deserialize;
use serde::Serialize;

use crate::markdown::markdown_to_html;
use crate::types::card_id::CardId;

/// A flashcard: a prompt on the front, the expected answer on the back.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    #[serde(rename = "front_text")]
    front: String,
    #[serde(rename = "back_text")]
    back: String,
}

impl Card {
    pub fn new(id: CardId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id,
            front: front.into(),
            back: back.into(),
        }
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn html_front(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(&self.front)))
        }
    }

    pub fn html_back(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(&self.back)))
        }
    }
}

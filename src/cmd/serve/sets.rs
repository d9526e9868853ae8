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

use axum::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::cmd::serve::template::page_template;
use crate::cmd::serve::template::temporary_banner;
use crate::error::StoreError;
use crate::types::card_id::CardId;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;
use crate::types::study_set::CardDraft;
use crate::types::study_set::MIN_CARDS;
use crate::types::study_set::SetDraft;
use crate::types::study_set::StudySet;

/// Number of empty rows the set form offers for new cards.
const BLANK_ROWS: usize = 3;

pub async fn list_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let sets = match state.library.list_sets(state.user.as_ref()) {
        Ok(sets) => sets,
        Err(e) => return error_page(&state, &e),
    };
    let stats = match &state.user {
        Some(user) => match state.library.db.session_stats(user) {
            Ok(stats) => Some(stats),
            Err(e) => {
                log::warn!("Failed to load session stats: {e}");
                None
            }
        },
        None => None,
    };
    let body = html! {
        div.sets {
            div.header {
                h1 { "Study sets" }
                a.button href="/sets/new" { "Create a study set" }
            }
            @if let Some(stats) = stats {
                p.stats {
                    (stats.completed) " of " (stats.started) " study sessions completed."
                }
            }
            @if sets.is_empty() {
                p.empty { "You don't have any study sets yet." }
            } @else {
                ul.set-list {
                    @for set in &sets {
                        li.set-item {
                            a href=(format!("/sets/{}", set.id)) { (set.title) }
                            @if set.id.is_temporary() {
                                span.tag { "temporary" }
                            }
                            @if let Some(description) = &set.description {
                                p.description { (description) }
                            }
                            p.meta {
                                (set.card_count) " cards, updated " (set.updated_at)
                            }
                        }
                    }
                }
            }
        }
    };
    (StatusCode::OK, Html(page_template(&state, body).into_string()))
}

pub async fn detail_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    let id = SetId::new(id);
    let set = match state.library.store_for_set(&id).get_set(&id) {
        Ok(set) => set,
        Err(e) => return error_page(&state, &e),
    };
    let can_edit = set.owner.is_none() || set.owner == state.user;
    let body = html! {
        div.set {
            @if set.id.is_temporary() {
                (temporary_banner())
            }
            div.header {
                h1 { (set.title) }
                @if let Some(description) = &set.description {
                    p.description { (description) }
                }
                p.meta { (set.cards.len()) " cards" }
            }
            div.modes {
                @for mode in [StudyMode::Flashcard, StudyMode::Written] {
                    form action=(format!("/sets/{}/drill/{}", set.id, mode)) method="post" {
                        button type="submit" {
                            @match mode {
                                StudyMode::Flashcard => { "Study with flashcards" }
                                StudyMode::Written => { "Study by writing" }
                            }
                        }
                    }
                }
            }
            @if can_edit {
                div.actions {
                    a.button href=(format!("/sets/{}/edit", set.id)) { "Edit" }
                    form action=(format!("/sets/{}/delete", set.id)) method="post" {
                        button.danger type="submit" { "Delete" }
                    }
                }
            }
            table.cards {
                thead {
                    tr {
                        th { "Front" }
                        th { "Back" }
                    }
                }
                tbody {
                    @for card in &set.cards {
                        tr {
                            td.rich-text { (card.html_front()) }
                            td.rich-text { (card.html_back()) }
                        }
                    }
                }
            }
        }
    };
    (StatusCode::OK, Html(page_template(&state, body).into_string()))
}

pub async fn new_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let body = set_form("/sets/new", "Create a study set", &SetDraft::default(), None);
    (StatusCode::OK, Html(page_template(&state, body).into_string()))
}

pub async fn create_handler(
    State(state): State<ServerState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let draft = parse_draft(fields);
    let user = state.user.as_ref();
    match state.library.store_for_user(user).create_set(user, &draft) {
        Ok(id) => Redirect::to(&format!("/sets/{id}")).into_response(),
        Err(StoreError::Invalid(message)) => {
            let body = set_form("/sets/new", "Create a study set", &draft, Some(&message));
            let html = page_template(&state, body).into_string();
            (StatusCode::BAD_REQUEST, Html(html)).into_response()
        }
        Err(e) => error_page(&state, &e).into_response(),
    }
}

pub async fn edit_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    let id = SetId::new(id);
    let set = match state.library.store_for_set(&id).get_set(&id) {
        Ok(set) => set,
        Err(e) => return error_page(&state, &e),
    };
    let action = format!("/sets/{id}/edit");
    let body = set_form(&action, "Edit study set", &draft_of(&set), None);
    (StatusCode::OK, Html(page_template(&state, body).into_string()))
}

pub async fn update_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let id = SetId::new(id);
    let draft = parse_draft(fields);
    let store = state.library.store_for_set(&id);
    match store.update_set(&id, state.user.as_ref(), &draft) {
        Ok(()) => Redirect::to(&format!("/sets/{id}")).into_response(),
        Err(StoreError::Invalid(message)) => {
            let action = format!("/sets/{id}/edit");
            let body = set_form(&action, "Edit study set", &draft, Some(&message));
            let html = page_template(&state, body).into_string();
            (StatusCode::BAD_REQUEST, Html(html)).into_response()
        }
        Err(e) => error_page(&state, &e).into_response(),
    }
}

pub async fn delete_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    let id = SetId::new(id);
    let store = state.library.store_for_set(&id);
    if let Err(e) = store.delete_set(&id, state.user.as_ref()) {
        return error_page(&state, &e).into_response();
    }
    match state.acquire() {
        Ok(mut mutable) => {
            if mutable.drill.as_ref().is_some_and(|drill| drill.set_id == id) {
                mutable.drill = None;
            }
        }
        Err(e) => log::error!("{e}"),
    }
    Redirect::to("/").into_response()
}

fn draft_of(set: &StudySet) -> SetDraft {
    SetDraft {
        title: set.title.clone(),
        description: set.description.clone(),
        cards: set
            .cards
            .iter()
            .map(|card| CardDraft {
                id: Some(card.id().clone()),
                front: card.front().to_string(),
                back: card.back().to_string(),
            })
            .collect(),
    }
}

/// Turn the submitted form fields into a draft. Each card row is a
/// `card_id`, `front`, `back` triple, in that order. Rows left entirely
/// blank are dropped.
fn parse_draft(fields: Vec<(String, String)>) -> SetDraft {
    let mut draft = SetDraft::default();
    for (key, value) in fields {
        match key.as_str() {
            "title" => draft.title = value,
            "description" => draft.description = Some(value),
            "card_id" => draft.cards.push(CardDraft {
                id: (!value.is_empty()).then(|| CardId::new(value)),
                ..CardDraft::default()
            }),
            "front" => {
                if let Some(card) = draft.cards.last_mut() {
                    card.front = value;
                }
            }
            "back" => {
                if let Some(card) = draft.cards.last_mut() {
                    card.back = value;
                }
            }
            _ => {}
        }
    }
    draft
        .cards
        .retain(|card| !(card.front.trim().is_empty() && card.back.trim().is_empty()));
    draft
}

fn set_form(action: &str, heading: &str, draft: &SetDraft, error: Option<&str>) -> Markup {
    let blanks = BLANK_ROWS.max(MIN_CARDS.saturating_sub(draft.cards.len()));
    let blank = CardDraft::default();
    let rows = draft.cards.iter().chain(std::iter::repeat_n(&blank, blanks));
    html! {
        div.set-form {
            h1 { (heading) }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form action=(action) method="post" {
                label for="title" { "Title" }
                input id="title" type="text" name="title" value=(draft.title) placeholder="Enter a title for your study set";
                label for="description" { "Description" }
                textarea id="description" name="description" {
                    (draft.description.as_deref().unwrap_or(""))
                }
                p.hint {
                    "At least " (MIN_CARDS) " flashcards. Clear both sides of a card to remove it."
                }
                @for (index, card) in rows.enumerate() {
                    div.card-row {
                        span.number { (index + 1) }
                        input type="hidden" name="card_id" value=(card.id.as_ref().map(CardId::as_str).unwrap_or(""));
                        input type="text" name="front" value=(card.front) placeholder="Front";
                        input type="text" name="back" value=(card.back) placeholder="Back";
                    }
                }
                button type="submit" { "Save" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_parse_draft() {
        let fields = vec![
            field("title", "Capitals"),
            field("description", ""),
            field("card_id", "3"),
            field("front", "France"),
            field("back", "Paris"),
            field("card_id", ""),
            field("front", "Spain"),
            field("back", "Madrid"),
            field("card_id", ""),
            field("front", " "),
            field("back", ""),
        ];
        let draft = parse_draft(fields);
        assert_eq!(draft.title, "Capitals");
        assert_eq!(draft.cards.len(), 2);
        assert_eq!(draft.cards[0].id, Some(CardId::new("3")));
        assert_eq!(draft.cards[1].id, None);
        assert_eq!(draft.cards[1].back, "Madrid");
    }

    #[test]
    fn test_half_filled_rows_are_kept() {
        let fields = vec![
            field("title", "Capitals"),
            field("card_id", ""),
            field("front", "France"),
            field("back", ""),
        ];
        let draft = parse_draft(fields);
        assert_eq!(draft.cards.len(), 1);
        assert!(matches!(draft.validate(), Err(StoreError::Invalid(_))));
    }
}

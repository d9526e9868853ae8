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

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::serve::state::ActiveDrill;
use crate::cmd::serve::state::ModeEvaluator;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template_with_refresh;
use crate::cmd::serve::template::temporary_banner;
use crate::drill::engine::CardOutcome;
use crate::drill::engine::Phase;
use crate::drill::engine::Verdict;
use crate::markdown::markdown_to_html_inline;
use crate::types::card::Card;

pub async fn get_handler(State(state): State<ServerState>) -> Response {
    let mut mutable = match state.acquire() {
        Ok(mutable) => mutable,
        Err(e) => {
            log::error!("{e}");
            let html = Html("Internal Server Error".to_string());
            return (StatusCode::INTERNAL_SERVER_ERROR, html).into_response();
        }
    };
    let Some(drill) = mutable.drill.as_mut() else {
        return Redirect::to("/").into_response();
    };
    drill.poll();
    let notice = drill.notice.take();
    let (body, refresh) = render_drill(drill, notice);
    let html = page_template_with_refresh(&state, body, refresh).into_string();
    (StatusCode::OK, Html(html)).into_response()
}

/// Render the drill page, and how many seconds until it should reload.
fn render_drill(drill: &ActiveDrill, notice: Option<String>) -> (Markup, Option<u64>) {
    let card = match drill.session.current_card() {
        Ok(card) => card,
        Err(_) => return (render_completed(drill), None),
    };
    let (number, total) = drill.session.progress();
    let (content, refresh) = match (drill.session.phase(), &drill.evaluator) {
        (Phase::ShowingResult { outcome, until }, _) => {
            let left = until.saturating_duration_since(Instant::now());
            let seconds = left.as_millis().div_ceil(1000).max(1) as u64;
            (render_result(card, outcome), Some(seconds))
        }
        (Phase::Answering, ModeEvaluator::Flashcard(evaluator)) => {
            (render_flashcard(card, evaluator.is_revealed()), None)
        }
        (Phase::Answering, ModeEvaluator::Written(_)) => (render_written(card), None),
    };
    let body = html! {
        div.drill {
            @if drill.is_temporary() {
                (temporary_banner())
            }
            div.header {
                h1 { (drill.title) }
                p.progress {
                    "Card " (number) " of " (total) " (Round " (drill.session.round()) ")"
                }
            }
            @if let Some(notice) = notice {
                p.notice { (notice) }
            }
            (content)
            form.exit action="/drill" method="post" {
                button name="action" value="Exit" { "Exit" }
            }
        }
    };
    (body, refresh)
}

fn render_flashcard(card: &Card, revealed: bool) -> Markup {
    html! {
        div.card {
            @if revealed {
                div.face.back .rich-text { (card.html_back()) }
            } @else {
                div.face.front .rich-text { (card.html_front()) }
            }
        }
        form.controls action="/drill" method="post" {
            button name="action" value="Flip" { "Flip" }
            @if revealed {
                button.missed name="action" value="Missed" { "Missed it" }
                button.knew name="action" value="Knew" { "Knew it" }
            }
        }
    }
}

fn render_written(card: &Card) -> Markup {
    html! {
        div.card {
            div.face.front .rich-text { (card.html_front()) }
        }
        form.controls action="/drill" method="post" {
            input type="text" name="answer" placeholder="Type the answer" autocomplete="off" autofocus;
            button name="action" value="Submit" { "Submit" }
        }
    }
}

fn render_result(card: &Card, outcome: &CardOutcome) -> Markup {
    let expected = markdown_to_html_inline(card.back());
    html! {
        div.card {
            div.face.front .rich-text { (card.html_front()) }
        }
        div.result {
            @match outcome.verdict {
                Verdict::Correct => { p.correct { "Correct!" } }
                Verdict::Incorrect => { p.incorrect { "Incorrect." } }
            }
            @if let Some(input) = &outcome.user_input {
                p { "Your answer: " (input) }
            }
            p { "Correct answer: " (PreEscaped(expected)) }
        }
        form.controls action="/drill" method="post" {
            button name="action" value="Continue" autofocus { "Continue" }
        }
    }
}

fn render_completed(drill: &ActiveDrill) -> Markup {
    html! {
        div.finished {
            h1 { "Congratulations! You've mastered this study set!" }
            p { (drill.title) }
            @if drill.is_temporary() {
                p.note { "This was a temporary study set, so this session was not recorded." }
            }
            form action="/drill" method="post" {
                button name="action" value="Exit" { "Back to the study set" }
            }
        }
    }
}

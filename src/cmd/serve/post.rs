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

use axum::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use serde::Deserialize;

use crate::cmd::serve::state::ActiveDrill;
use crate::cmd::serve::state::BackgroundRecorder;
use crate::cmd::serve::state::ModeEvaluator;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::drill::engine::DrillSession;
use crate::drill::engine::Identity;
use crate::error::DrillError;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::StoreError;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;

#[derive(Clone, Copy, Debug, Deserialize)]
enum Action {
    Flip,
    Knew,
    Missed,
    Submit,
    Continue,
    Exit,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    answer: Option<String>,
}

/// Start drilling a set, replacing any drill in progress.
pub async fn start_handler(
    State(state): State<ServerState>,
    Path((id, mode)): Path<(String, String)>,
) -> Response {
    let id = SetId::new(id);
    let mode = match StudyMode::try_from(mode.as_str()) {
        Ok(mode) => mode,
        Err(_) => {
            let err = StoreError::Invalid(format!("unknown study mode: {mode}"));
            return error_page(&state, &err).into_response();
        }
    };
    let set = match state.library.store_for_set(&id).get_set(&id) {
        Ok(set) => set,
        Err(e) => return error_page(&state, &e).into_response(),
    };
    // Only known learners drilling permanent sets get their sessions recorded.
    let identity = match &state.user {
        Some(user) if !id.is_temporary() => Some(Identity {
            user: user.clone(),
            set_id: id.clone(),
            mode,
            recorder: Arc::new(BackgroundRecorder::new(state.library.db.clone())),
        }),
        _ => None,
    };
    // Opening the session record writes to the database.
    let started = tokio::task::spawn_blocking(move || DrillSession::start(set.cards, identity));
    let session = match started.await {
        Ok(Ok(session)) => session,
        Ok(Err(_)) => return error_page(&state, &StoreError::Empty(id)).into_response(),
        Err(e) => {
            let err = StoreError::Backend(ErrorReport::new(e.to_string()));
            return error_page(&state, &err).into_response();
        }
    };
    let session = match mode {
        StudyMode::Flashcard => session,
        StudyMode::Written => session.with_feedback(state.feedback),
    };
    let drill = ActiveDrill {
        set_id: id,
        title: set.title,
        session,
        evaluator: ModeEvaluator::new(mode),
        notice: None,
    };
    match state.acquire() {
        Ok(mut mutable) => {
            log::debug!("Drilling {} in {mode} mode.", drill.set_id);
            mutable.drill = Some(drill);
            Redirect::to("/drill").into_response()
        }
        Err(e) => error_page(&state, &StoreError::Backend(e)).into_response(),
    }
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Redirect {
    match action_handler(&state, form) {
        Ok(redirect) => redirect,
        Err(e) => {
            log::error!("{e}");
            Redirect::to("/drill")
        }
    }
}

fn action_handler(state: &ServerState, form: FormData) -> Fallible<Redirect> {
    let mut mutable = state.acquire()?;
    let Some(drill) = mutable.drill.as_mut() else {
        return Ok(Redirect::to("/"));
    };
    if let Action::Exit = form.action {
        let target = format!("/sets/{}", drill.set_id);
        mutable.drill = None;
        return Ok(Redirect::to(&target));
    }
    drill.poll();
    let round = drill.session.round();
    let mode = drill.mode();
    let session = &mut drill.session;
    let result = match (form.action, &mut drill.evaluator) {
        (Action::Flip, ModeEvaluator::Flashcard(evaluator)) => {
            evaluator.flip();
            Ok(())
        }
        (Action::Knew, ModeEvaluator::Flashcard(evaluator)) => {
            session.answer(evaluator, &true).map(|_| ())
        }
        (Action::Missed, ModeEvaluator::Flashcard(evaluator)) => {
            session.answer(evaluator, &false).map(|_| ())
        }
        (Action::Submit, ModeEvaluator::Written(evaluator)) => {
            let answer = form.answer.as_deref().unwrap_or("");
            session.answer(evaluator, answer).map(|_| ())
        }
        (Action::Continue, _) => session.advance(),
        (action, _) => {
            log::warn!("Ignoring {action:?} in {mode} mode.");
            Ok(())
        }
    };
    match result {
        Ok(()) => drill.note_new_round(round),
        Err(e) => drill.notice = Some(notice_for(&e).to_string()),
    }
    Ok(Redirect::to("/drill"))
}

fn notice_for(err: &DrillError) -> &'static str {
    match err {
        DrillError::NotRevealed => "Flip the card before marking it.",
        DrillError::ShowingResult => "Press Continue to see the next card.",
        DrillError::NoActiveCard | DrillError::EmptySet => "This study set is finished.",
    }
}

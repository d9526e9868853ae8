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

use axum::http::StatusCode;
use axum::response::Html;
use maud::DOCTYPE;
use maud::Markup;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::error::StoreError;

pub fn page_template(state: &ServerState, body: Markup) -> Markup {
    page_template_with_refresh(state, body, None)
}

/// Like `page_template`, but asks the browser to reload the page after the
/// given number of seconds.
pub fn page_template_with_refresh(
    state: &ServerState,
    body: Markup,
    refresh: Option<u64>,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                @if let Some(seconds) = refresh {
                    meta http-equiv="refresh" content=(seconds);
                }
                title { "flipwise" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                nav.navbar {
                    a.brand href="/" { "flipwise" }
                    a href="/sets/new" { "Create" }
                    div.identity {
                        @match &state.user {
                            Some(user) => { "Studying as " strong { (user) } }
                            None => { "Guest" }
                        }
                    }
                }
                main {
                    (body)
                }
            }
        }
    }
}

/// The banner shown on temporary sets.
pub fn temporary_banner() -> Markup {
    html! {
        div.banner {
            p {
                "This is a temporary study set. To keep your progress, set a user name with "
                code { "--user" }
                " or in "
                code { "flipwise.toml" }
                "."
            }
        }
    }
}

/// Render a store error as a page, with a status code to match.
pub fn error_page(state: &ServerState, err: &StoreError) -> (StatusCode, Html<String>) {
    let status = match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        StoreError::Invalid(_) | StoreError::Empty(_) => StatusCode::BAD_REQUEST,
        StoreError::Backend(_) => {
            log::error!("{err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = html! {
        div.error {
            h1 { "Something went wrong" }
            p { (err) }
            a href="/" { "Back to your study sets" }
        }
    };
    (status, Html(page_template(state, body).into_string()))
}

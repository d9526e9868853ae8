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

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::cmd::serve::get::get_handler;
use crate::cmd::serve::post::post_handler;
use crate::cmd::serve::post::start_handler;
use crate::cmd::serve::sets::create_handler;
use crate::cmd::serve::sets::delete_handler;
use crate::cmd::serve::sets::detail_handler;
use crate::cmd::serve::sets::edit_handler;
use crate::cmd::serve::sets::list_handler;
use crate::cmd::serve::sets::new_handler;
use crate::cmd::serve::sets::update_handler;
use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::ServerState;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::Library;

pub async fn start_server(directory: PathBuf, config: Config) -> Fallible<()> {
    if !directory.exists() {
        return fail("directory does not exist.");
    }

    log::debug!("Opening study sets in {}", directory.display());
    let library = Library::open(&directory)?;

    let state = ServerState {
        user: config.user(),
        feedback: config.feedback(),
        library: Arc::new(library),
        mutable: Arc::new(Mutex::new(MutableState::default())),
    };
    let app = Router::new();
    let app = app.route("/", get(list_handler));
    let app = app.route("/sets/new", get(new_handler).post(create_handler));
    let app = app.route("/sets/{id}", get(detail_handler));
    let app = app.route("/sets/{id}/edit", get(edit_handler).post(update_handler));
    let app = app.route("/sets/{id}/delete", post(delete_handler));
    let app = app.route("/sets/{id}/drill/{mode}", post(start_handler));
    let app = app.route("/drill", get(get_handler).post(post_handler));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{}", config.port);

    if config.open_browser {
        // Start a separate task to open the browser.
        let url = format!("http://{bind}/");
        let addr = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&addr).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            if let Err(e) = open::that(&url) {
                log::warn!("Failed to open the browser: {e}");
            }
        });
    }

    // Start the server.
    log::info!("Serving on http://{bind}/");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down.");
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}

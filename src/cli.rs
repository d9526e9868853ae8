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

use clap::Parser;

use crate::cmd::drill::drill_in_terminal;
use crate::cmd::export::export_sets;
use crate::cmd::list::list_sets;
use crate::cmd::serve::server::start_server;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the web interface.
    Serve {
        /// Path to the data directory. By default, the current directory.
        directory: Option<String>,
        /// The port to listen on.
        #[arg(long)]
        port: Option<u16>,
        /// Study as this user. Without a user, sets are temporary.
        #[arg(long)]
        user: Option<String>,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
    /// Drill a study set in the terminal.
    Drill {
        /// The ID of the study set.
        set_id: String,
        /// Path to the data directory. By default, the current directory.
        directory: Option<String>,
        #[arg(long, default_value_t = StudyMode::Flashcard)]
        mode: StudyMode,
        #[arg(long)]
        user: Option<String>,
    },
    /// List study sets.
    List {
        /// Path to the data directory. By default, the current directory.
        directory: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Export study sets as JSON.
    Export {
        /// Path to the data directory. By default, the current directory.
        directory: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            directory,
            port,
            user,
            no_open,
        } => {
            let directory = get_directory(directory)?;
            let config = Config::load(&directory)?.with_overrides(user, port, no_open);
            start_server(directory, config).await
        }
        Command::Drill {
            set_id,
            directory,
            mode,
            user,
        } => {
            let directory = get_directory(directory)?;
            let config = Config::load(&directory)?.with_overrides(user, None, false);
            drill_in_terminal(&directory, SetId::new(set_id), mode, &config)
        }
        Command::List { directory, user } => {
            let directory = get_directory(directory)?;
            let config = Config::load(&directory)?.with_overrides(user, None, false);
            list_sets(&directory, config.user().as_ref())
        }
        Command::Export { directory, user } => {
            let directory = get_directory(directory)?;
            let config = Config::load(&directory)?.with_overrides(user, None, false);
            export_sets(&directory, config.user().as_ref())
        }
    }
}

fn get_directory(directory: Option<String>) -> Fallible<PathBuf> {
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    if !directory.exists() {
        return fail("directory does not exist.");
    }
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_drill() {
        let cli = Command::parse_from(["flipwise", "drill", "12", "--mode", "written"]);
        match cli {
            Command::Drill {
                set_id,
                directory,
                mode,
                user,
            } => {
                assert_eq!(set_id, "12");
                assert_eq!(directory, None);
                assert_eq!(mode, StudyMode::Written);
                assert_eq!(user, None);
            }
            _ => panic!("expected the drill command"),
        }
    }

    #[test]
    fn test_missing_directory() {
        let result = get_directory(Some("./derpherp".to_string()));
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
    }
}

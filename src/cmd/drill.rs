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

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::drill::engine::DrillSession;
use crate::drill::engine::Identity;
use crate::drill::engine::Verdict;
use crate::drill::evaluator::MatchEvaluator;
use crate::drill::evaluator::RevealEvaluator;
use crate::error::Fallible;
use crate::store::Library;
use crate::types::set_id::SetId;
use crate::types::study_mode::StudyMode;

/// Drill a study set on the terminal.
pub fn drill_in_terminal(
    directory: &Path,
    set_id: SetId,
    mode: StudyMode,
    config: &Config,
) -> Fallible<()> {
    let library = Library::open(directory)?;
    let store = library.store_for_set(&set_id);
    let set = store.get_set(&set_id)?;
    let cards = store.list_cards(&set_id)?;
    let identity = match config.user() {
        Some(user) if !set_id.is_temporary() => Some(Identity {
            user,
            set_id: set_id.clone(),
            mode,
            recorder: Arc::new(library.db.clone()),
        }),
        _ => None,
    };
    println!("Drilling \"{}\" in {mode} mode.", set.title);
    let mut session = DrillSession::start(cards, identity)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run(&mut session, mode, &mut stdin.lock(), &mut stdout.lock())
}

/// Run the session until it completes or the input runs out.
fn run<R: BufRead, W: Write>(
    session: &mut DrillSession,
    mode: StudyMode,
    input: &mut R,
    output: &mut W,
) -> Fallible<()> {
    let mut reveal = RevealEvaluator::new();
    let mut matcher = MatchEvaluator;
    let mut round = session.round();
    while let Ok(card) = session.current_card() {
        let card = card.clone();
        if session.round() > round {
            round = session.round();
            let count = session.working_set().len();
            let noun = if count == 1 { "card" } else { "cards" };
            writeln!(output, "You have {count} {noun} to review again.")?;
        }
        let (number, total) = session.progress();
        writeln!(output)?;
        writeln!(output, "Card {number} of {total} (Round {round})")?;
        writeln!(output, "Q: {}", card.front())?;
        match mode {
            StudyMode::Flashcard => {
                writeln!(output, "[press enter to flip]")?;
                if read_line(input)?.is_none() {
                    return abandon(output);
                }
                reveal.reveal();
                writeln!(output, "A: {}", card.back())?;
                let Some(knew) = read_knew(input, output)? else {
                    return abandon(output);
                };
                session.answer(&mut reveal, &knew)?;
            }
            StudyMode::Written => {
                write!(output, "Answer: ")?;
                output.flush()?;
                let Some(answer) = read_line(input)? else {
                    return abandon(output);
                };
                match session.answer(&mut matcher, answer.as_str())? {
                    Verdict::Correct => writeln!(output, "Correct!")?,
                    Verdict::Incorrect => {
                        writeln!(output, "Incorrect. Correct answer: {}", card.back())?
                    }
                }
            }
        }
    }
    writeln!(output)?;
    writeln!(output, "Congratulations! You've mastered this study set!")?;
    Ok(())
}

fn abandon<W: Write>(output: &mut W) -> Fallible<()> {
    writeln!(output)?;
    writeln!(output, "Session abandoned.")?;
    Ok(())
}

/// Read a line, without the line terminator. `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn read_knew<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Fallible<Option<bool>> {
    loop {
        writeln!(output, "Did you know it? [y/n]")?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(Some(true)),
            "n" | "no" => return Ok(Some(false)),
            _ => writeln!(output, "Please answer y or n.")?,
        }
    }
}

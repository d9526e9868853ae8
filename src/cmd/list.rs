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

use std::path::Path;

use crate::error::Fallible;
use crate::store::Library;
use crate::types::study_set::StudySetSummary;
use crate::types::user_id::UserId;

pub fn list_sets(directory: &Path, user: Option<&UserId>) -> Fallible<()> {
    let library = Library::open(directory)?;
    let sets = library.list_sets(user)?;
    if sets.is_empty() {
        println!("No study sets.");
        return Ok(());
    }
    for line in format_sets(&sets) {
        println!("{line}");
    }
    Ok(())
}

/// One line per set: ID, title, card count and last update.
fn format_sets(sets: &[StudySetSummary]) -> Vec<String> {
    let width = sets.iter().map(|set| set.id.as_str().len()).max().unwrap_or(0);
    sets.iter()
        .map(|set| {
            format!(
                "{:<width$}  {} ({} cards, updated {})",
                set.id.as_str(),
                set.title,
                set.card_count,
                set.updated_at
            )
        })
        .collect()
}

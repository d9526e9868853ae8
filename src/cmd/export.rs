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

use serde::Serialize;

use crate::error::Fallible;
use crate::store::Library;
use crate::types::study_set::StudySet;
use crate::types::timestamp::Timestamp;
use crate::types::user_id::UserId;

pub fn export_sets(directory: &Path, user: Option<&UserId>) -> Fallible<()> {
    let library = Library::open(directory)?;
    let export: Export = get_export(&library, user)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    exported_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserId>,
    sets: Vec<StudySet>,
}

/// Every set `user` can see, with its cards.
fn get_export(library: &Library, user: Option<&UserId>) -> Fallible<Export> {
    let mut sets: Vec<StudySet> = Vec::new();
    for summary in library.list_sets(user)? {
        let set = library.store_for_set(&summary.id).get_set(&summary.id)?;
        sets.push(set);
    }
    Ok(Export {
        exported_at: Timestamp::now(),
        user: user.cloned(),
        sets,
    })
}

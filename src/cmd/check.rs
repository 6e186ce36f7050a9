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

use leitnerbox_core::flashcard::Orientation;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

pub fn check_collection(config: String, reverse: bool) -> Fallible<()> {
    println!("{}", check_report(&config, orientation(reverse))?);
    Ok(())
}

pub fn orientation(reverse: bool) -> Orientation {
    if reverse {
        Orientation::Reverse
    } else {
        Orientation::Forward
    }
}

fn check_report(config: &str, orientation: Orientation) -> Fallible<String> {
    let collection = Collection::new(config)?;
    let schedule = collection.schedule(orientation, Timestamp::now())?;
    Ok(format!(
        "ok: {} cards ({} due, {} new) in {} buckets.",
        schedule.card_count(),
        schedule.due_count(),
        schedule.new_count(),
        schedule.buckets().len()
    ))
}

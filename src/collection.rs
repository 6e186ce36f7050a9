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

use std::fs::OpenOptions;
use std::fs::read_to_string;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use leitnerbox_core::flashcard::Orientation;
use leitnerbox_core::flashcard::TextCardSource;
use leitnerbox_core::history::HistoryEntry;
use leitnerbox_core::history::write_history;
use leitnerbox_core::schedule::Schedule;
use leitnerbox_core::settings::Settings;
use leitnerbox_core::settings::parse_settings;
use log::debug;
use log::error;
use log::warn;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Everything a configuration file points to, read into memory.
pub struct Collection {
    pub settings: Settings,
    pub cards_path: PathBuf,
    pub cards: String,
    pub history_path: PathBuf,
    pub history: String,
}

impl Collection {
    /// Load a configuration file and the files it names. Relative paths are
    /// relative to the configuration file's directory. A history log that
    /// cannot be read counts as empty.
    pub fn new(config: impl AsRef<Path>) -> Fallible<Self> {
        let config = config.as_ref();
        let settings = in_file(config, parse_settings(&read(config)?))?;
        let base = config.parent().unwrap_or(Path::new(""));
        let cards_path = base.join(&settings.flashcards_file);
        let cards = read(&cards_path)?;
        let history_path = base.join(&settings.history_log);
        let history = match read_to_string(&history_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history log at {}.", history_path.display());
                String::new()
            }
            Err(e) => {
                warn!(
                    "Failed to read the history log {}: {e}. Starting without history.",
                    history_path.display()
                );
                String::new()
            }
        };
        Ok(Collection {
            settings,
            cards_path,
            cards,
            history_path,
            history,
        })
    }

    pub fn source(&self, orientation: Orientation) -> TextCardSource<'_> {
        TextCardSource::new(&self.cards, orientation)
    }

    /// Register every card and replay the history log.
    pub fn schedule(&self, orientation: Orientation, now: Timestamp) -> Fallible<Schedule> {
        let mut schedule = Schedule::new(&self.settings.delays, now);
        in_file(
            &self.cards_path,
            schedule.register_cards(&self.source(orientation)),
        )?;
        in_file(&self.history_path, schedule.replay_history(&self.history))?;
        Ok(schedule)
    }

    /// Append entries to the history log, creating it if needed.
    pub fn append_history(&self, entries: &[HistoryEntry]) -> Fallible<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)
            .map_err(|e| {
                ErrorReport::Io(format!(
                    "failed to open {}: {e}",
                    self.history_path.display()
                ))
            })?;
        write_history(file, entries)?;
        debug!(
            "Appended {} entries to {}.",
            entries.len(),
            self.history_path.display()
        );
        Ok(())
    }
}

fn read(path: &Path) -> Fallible<String> {
    read_to_string(path)
        .map_err(|e| ErrorReport::Io(format!("failed to read {}: {e}", path.display())))
}

/// Name the file an error came from.
fn in_file<T>(path: &Path, result: Fallible<T>) -> Fallible<T> {
    result.map_err(|e| {
        error!("Error in {}.", path.display());
        e.in_file(path.display())
    })
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use leitnerbox_core::flashcard::Card;
    use leitnerbox_core::flashcard::parse_cards;
    use tempfile::tempdir;

    use super::*;

    const CARDS: &str = r#"
"flashcards" {
  "capitals" {
    "France" { "Paris" }
    "Peru" { "Lima" }
    "Japan" { "Tokyo" }
  }
}
"#;

    fn config(delays: &str) -> String {
        format!(
            r#""leitnerbox" {{
  "flashcards-file" {{ "cards.cf" }}
  "history-log" {{ "history.log" }}
  "delays" {{ {delays} }}
}}
"#
        )
    }

    #[test]
    fn test_missing_history_is_empty() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("config.cf"), config(r#""1"; "7""#))?;
        write(dir.path().join("cards.cf"), CARDS)?;
        let collection = Collection::new(dir.path().join("config.cf"))?;
        assert_eq!(collection.settings.delays, vec![86400, 604800]);
        assert!(collection.history.is_empty());
        let schedule = collection.schedule(Orientation::Forward, Timestamp::from_secs(1e9))?;
        assert_eq!(schedule.card_count(), 3);
        assert_eq!(schedule.new_count(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_cards_file_is_an_error() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("config.cf"), config(""))?;
        let result = Collection::new(dir.path().join("config.cf"));
        assert!(matches!(result, Err(ErrorReport::Io(_))));
        Ok(())
    }

    #[test]
    fn test_errors_name_their_file() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("config.cf"), config(r#""1""#))?;
        write(dir.path().join("cards.cf"), CARDS)?;
        write(dir.path().join("history.log"), "\"1\":\"2\"\n")?;
        let collection = Collection::new(dir.path().join("config.cf"))?;
        let err = match collection.schedule(Orientation::Forward, Timestamp::from_secs(1e9)) {
            Err(e) => e,
            Ok(_) => panic!("expected a malformed history error"),
        };
        assert!(err.is_domain());
        let history = dir.path().join("history.log");
        assert!(err.to_string().ends_with(&format!("(in {})", history.display())));
        Ok(())
    }

    #[test]
    fn test_append_then_replay() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join("config.cf"), config(r#""1""#))?;
        write(dir.path().join("cards.cf"), CARDS)?;
        let collection = Collection::new(dir.path().join("config.cf"))?;
        let cards = parse_cards(CARDS, Orientation::Forward)?;
        let touched = Timestamp::from_secs(1e9);
        let entries: Vec<HistoryEntry> = cards[..2]
            .iter()
            .map(|card| HistoryEntry::new(touched, card.hash(), 0))
            .collect();
        collection.append_history(&entries[..1])?;
        collection.append_history(&entries[1..])?;

        let collection = Collection::new(dir.path().join("config.cf"))?;
        assert_eq!(collection.history.lines().count(), 2);
        let schedule = collection.schedule(Orientation::Forward, touched)?;
        assert_eq!(schedule.new_count(), 1);
        assert_eq!(schedule.due_count(), 1);
        // Reversed cards have their own history.
        let reversed = collection.schedule(Orientation::Reverse, touched)?;
        assert_eq!(reversed.new_count(), 3);
        Ok(())
    }
}

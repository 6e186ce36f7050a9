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

//! The application's configuration file, itself a configuration-grammar
//! document:
//!
//! ```text
//! "leitnerbox" {
//!   "flashcards-file" { "cards.cf" }
//!   "history-log" { "history.log" }
//!   "delays" { "1"; "3"; "7"; "30" }   # days
//! }
//! ```

use log::warn;

use crate::config::Section;
use crate::config::parse_tree;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

pub const ROOT_SECTION: &str = "leitnerbox";

const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub flashcards_file: String,
    pub history_log: String,
    /// The delay of every bucket after bucket 0, in seconds.
    pub delays: Vec<u64>,
}

impl Settings {
    pub fn from_tree(root: &Section) -> Fallible<Self> {
        if root.name() != ROOT_SECTION {
            return fail(format!(
                "top-level section must be named \"{ROOT_SECTION}\", not \"{}\"",
                root.name()
            ));
        }
        if let Some(setting) = root.settings().next() {
            return fail(format!("unexpected setting in \"{ROOT_SECTION}\": \"{setting}\""));
        }
        let mut flashcards_file = None;
        let mut history_log = None;
        let mut delays = None;
        for section in root.sections() {
            match section.name() {
                "flashcards-file" => flashcards_file = Some(attribute(section)?),
                "history-log" => history_log = Some(attribute(section)?),
                "delays" => delays = Some(parse_delays(section)?),
                other => return fail(format!("unknown section: \"{other}\"")),
            }
        }
        let Some(flashcards_file) = flashcards_file else {
            return fail("missing \"flashcards-file\" attribute");
        };
        let Some(history_log) = history_log else {
            return fail("missing \"history-log\" attribute");
        };
        Ok(Settings {
            flashcards_file,
            history_log,
            delays: delays.unwrap_or_default(),
        })
    }
}

/// Parse a configuration file.
pub fn parse_settings(text: &str) -> Fallible<Settings> {
    Settings::from_tree(&parse_tree(text)?)
}

fn attribute(section: &Section) -> Fallible<String> {
    match section.value() {
        Some(value) => Ok(value.to_string()),
        None => fail(format!(
            "\"{}\" must hold exactly one value",
            section.name()
        )),
    }
}

fn parse_delays(section: &Section) -> Fallible<Vec<u64>> {
    if section.has_sections() {
        return fail("\"delays\" cannot have subsections");
    }
    let delays = section
        .settings()
        .map(days_to_seconds)
        .collect::<Fallible<Vec<u64>>>()?;
    if delays.windows(2).any(|pair| pair[1] < pair[0]) {
        warn!("Delays are not in increasing order: {delays:?} seconds.");
    }
    Ok(delays)
}

fn days_to_seconds(days: &str) -> Fallible<u64> {
    let value: f64 = days
        .trim()
        .parse()
        .map_err(|_| ErrorReport::new(format!("non-numeric delay: \"{days}\"")))?;
    if !value.is_finite() {
        return fail(format!("non-numeric delay: \"{days}\""));
    }
    if value < 0.0 {
        return fail(format!("negative delay: \"{days}\""));
    }
    Ok((value * SECONDS_PER_DAY).trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> String {
        match parse_settings(text) {
            Err(ErrorReport::Domain(e)) => e.message,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    #[test]
    fn test_full_configuration() -> Fallible<()> {
        let settings = parse_settings(
            r#"
            "leitnerbox" {
              "flashcards-file" { "cards.cf" }
              "history-log" { "history.log" }
              "delays" { "1"; "0.5"; "7" }
            }
            "#,
        )?;
        assert_eq!(settings.flashcards_file, "cards.cf");
        assert_eq!(settings.history_log, "history.log");
        assert_eq!(settings.delays, vec![86400, 43200, 604800]);
        Ok(())
    }

    #[test]
    fn test_delays_are_optional() -> Fallible<()> {
        let settings = parse_settings(
            r#""leitnerbox" { "history-log" { "h" } "flashcards-file" { "f" } }"#,
        )?;
        assert!(settings.delays.is_empty());
        Ok(())
    }

    #[test]
    fn test_fractional_seconds_are_truncated() -> Fallible<()> {
        assert_eq!(days_to_seconds("0.00001")?, 0);
        assert_eq!(days_to_seconds(" 2 ")?, 172800);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            message(r#""other" {}"#),
            "top-level section must be named \"leitnerbox\", not \"other\""
        );
        assert_eq!(
            message(r#""leitnerbox" { "history-log" { "h" } }"#),
            "missing \"flashcards-file\" attribute"
        );
        assert_eq!(
            message(r#""leitnerbox" { "flashcards-file" { "f" } }"#),
            "missing \"history-log\" attribute"
        );
        assert_eq!(
            message(r#""leitnerbox" { "flashcards-file" { "a"; "b" } }"#),
            "\"flashcards-file\" must hold exactly one value"
        );
        assert_eq!(
            message(r#""leitnerbox" { "colour" { "red" } }"#),
            "unknown section: \"colour\""
        );
        assert_eq!(
            message(r#""leitnerbox" { "stray" }"#),
            "unexpected setting in \"leitnerbox\": \"stray\""
        );
        let base = r#""flashcards-file" { "f" } "history-log" { "h" }"#;
        assert_eq!(
            message(&format!(r#""leitnerbox" {{ {base} "delays" {{ "1"; "soon" }} }}"#)),
            "non-numeric delay: \"soon\""
        );
        assert_eq!(
            message(&format!(r#""leitnerbox" {{ {base} "delays" {{ "-1" }} }}"#)),
            "negative delay: \"-1\""
        );
        assert_eq!(
            message(&format!(r#""leitnerbox" {{ {base} "delays" {{ "x" {{}} }} }}"#)),
            "\"delays\" cannot have subsections"
        );
    }

    #[test]
    fn test_repeated_section_is_rejected() {
        let text = r#""leitnerbox" { "history-log" { "a" } "history-log" { "b" } }"#;
        assert_eq!(message(text), "duplicate section name: history-log");
    }

    #[test]
    fn test_decreasing_delays_are_accepted() -> Fallible<()> {
        let settings = parse_settings(
            r#""leitnerbox" { "flashcards-file" { "f" } "history-log" { "h" } "delays" { "7"; "1" } }"#,
        )?;
        assert_eq!(settings.delays, vec![604800, 86400]);
        Ok(())
    }
}

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

//! The history log records one line per card per drill session:
//!
//! ```text
//! "1700000000.25":"<card hash>":"0"
//! ```
//!
//! The fields are the time the session ended (seconds since the Unix epoch),
//! the card's hash, and how many times the card was failed before it was
//! passed.

use std::io::Write;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::logfmt::LogRecord;
use crate::logfmt::LogWriter;
use crate::types::card_hash::CardHash;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: Timestamp,
    pub hash: CardHash,
    /// Any non-zero count demotes the card.
    pub retries: i64,
}

impl HistoryEntry {
    pub fn new(timestamp: Timestamp, hash: CardHash, retries: i64) -> Self {
        HistoryEntry {
            timestamp,
            hash,
            retries,
        }
    }

    /// The card a log record refers to. Only the field count is checked.
    ///
    /// Returns `None` when the hash field is not a card hash at all: such an
    /// entry cannot refer to any card, so it is as stale as an entry for a
    /// deleted card.
    pub fn record_hash(record: &LogRecord) -> Fallible<Option<CardHash>> {
        let [_, hash, _] = record.fields() else {
            return fail(format!(
                "record does not have three fields (found {})",
                record.len()
            ));
        };
        Ok(hash.parse::<CardHash>().ok())
    }

    /// Read the numeric fields of a record for a card that is known.
    pub fn from_known_record(record: &LogRecord, hash: CardHash) -> Fallible<HistoryEntry> {
        let [timestamp, _, retries] = record.fields() else {
            return fail(format!(
                "record does not have three fields (found {})",
                record.len()
            ));
        };
        let timestamp = Timestamp::try_from(timestamp.as_str())
            .map_err(|_| ErrorReport::new(format!("timestamp field is not a number: '{timestamp}'")))?;
        let retries = retries.trim().parse::<i64>().map_err(|_| {
            ErrorReport::new(format!("retry count field is not an integer: '{retries}'"))
        })?;
        Ok(HistoryEntry::new(timestamp, hash, retries))
    }

    /// Read an entry from a log record, validating every field.
    pub fn from_record(record: &LogRecord) -> Fallible<Option<HistoryEntry>> {
        match HistoryEntry::record_hash(record)? {
            Some(hash) => HistoryEntry::from_known_record(record, hash).map(Some),
            None => Ok(None),
        }
    }

    pub fn to_fields(&self) -> [String; 3] {
        [
            self.timestamp.to_string(),
            self.hash.to_hex(),
            self.retries.to_string(),
        ]
    }

    pub fn write_to<W: Write>(&self, writer: &mut LogWriter<W>) -> std::io::Result<()> {
        writer.write(&self.to_fields())
    }
}

/// Append entries to a history log.
pub fn write_history<W: Write>(out: W, entries: &[HistoryEntry]) -> std::io::Result<W> {
    let mut writer = LogWriter::new(out);
    for entry in entries {
        entry.write_to(&mut writer)?;
    }
    writer.flush()?;
    Ok(writer.into_inner())
}

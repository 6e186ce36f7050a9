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

//! Leitner buckets and the per-card stubs they count.
//!
//! A [`Schedule`] is one scheduling session. It is filled in two passes:
//! first every card of the source is registered as new, then the history log
//! is replayed to move cards between buckets. Deck construction then reads
//! the result (see [`crate::deck_builder`]).

use std::collections::HashMap;

use log::debug;
use log::warn;
use serde::Serialize;

use crate::error::Fallible;
use crate::flashcard::Card;
use crate::flashcard::CardSource;
use crate::history::HistoryEntry;
use crate::logfmt::LogRecord;
use crate::logfmt::parse_log;
use crate::types::card_hash::CardHash;
use crate::types::timestamp::Timestamp;

/// When a card is due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DueDate {
    /// The card has never been drilled. It is always due.
    NeverTouched,
    At(Timestamp),
}

impl DueDate {
    pub fn is_due(self, now: Timestamp) -> bool {
        match self {
            DueDate::NeverTouched => true,
            DueDate::At(due) => due <= now,
        }
    }

    /// Seconds elapsed since the card became due; negative if it is not due
    /// yet. Cards never drilled are infinitely overdue.
    pub fn overdue_by(self, now: Timestamp) -> f64 {
        match self {
            DueDate::NeverTouched => f64::INFINITY,
            DueDate::At(due) => now.since(due),
        }
    }
}

/// Scheduling metadata for one card.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashcardStub {
    hash: CardHash,
    bucket: usize,
    due: DueDate,
}

impl FlashcardStub {
    pub fn new(hash: CardHash) -> Self {
        FlashcardStub {
            hash,
            bucket: 0,
            due: DueDate::NeverTouched,
        }
    }

    pub fn hash(&self) -> CardHash {
        self.hash
    }

    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn due_date(&self) -> DueDate {
        self.due
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due.is_due(now)
    }

    pub fn is_new(&self) -> bool {
        self.due == DueDate::NeverTouched
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeitnerBucket {
    delay: u64,
    card_count: usize,
    due_count: usize,
}

impl LeitnerBucket {
    /// An empty bucket whose cards come due `delay` seconds after they were
    /// last drilled.
    pub fn new(delay: u64) -> Self {
        LeitnerBucket {
            delay,
            card_count: 0,
            due_count: 0,
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn card_count(&self) -> usize {
        self.card_count
    }

    pub fn due_count(&self) -> usize {
        self.due_count
    }

    /// Count a stub in this bucket. Its due date becomes `touched` plus this
    /// bucket's delay, or stays never-touched if `touched` is `None`.
    pub fn add_stub(&mut self, stub: &mut FlashcardStub, touched: Option<Timestamp>, now: Timestamp) {
        stub.due = match touched {
            Some(touched) => DueDate::At(touched.plus(self.delay)),
            None => DueDate::NeverTouched,
        };
        self.card_count += 1;
        if stub.is_due(now) {
            self.due_count += 1;
        }
    }

    /// Stop counting a stub. Must be called before the stub's due date
    /// changes.
    pub fn remove_stub(&mut self, stub: &FlashcardStub, now: Timestamp) {
        debug_assert!(self.card_count > 0);
        self.card_count = self.card_count.saturating_sub(1);
        if stub.is_due(now) {
            debug_assert!(self.due_count > 0);
            self.due_count = self.due_count.saturating_sub(1);
        }
    }
}

/// What replaying a history log did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Entries that moved a card.
    pub applied: usize,
    /// Entries for cards that are no longer in the source.
    pub stale: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketSummary {
    pub delay_seconds: u64,
    pub cards: usize,
    pub due: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub now: Timestamp,
    pub cards: usize,
    pub due: usize,
    pub new: usize,
    pub buckets: Vec<BucketSummary>,
}

/// The state of one scheduling session: every known card's stub, and the
/// buckets counting them.
pub struct Schedule {
    buckets: Vec<LeitnerBucket>,
    stubs: HashMap<CardHash, FlashcardStub>,
    new_count: usize,
    now: Timestamp,
}

impl Schedule {
    /// A schedule with bucket 0 (no delay) followed by one bucket per
    /// delay, in seconds. Delays are not required to increase.
    pub fn new(delays: &[u64], now: Timestamp) -> Self {
        let buckets = std::iter::once(0)
            .chain(delays.iter().copied())
            .map(LeitnerBucket::new)
            .collect();
        Schedule {
            buckets,
            stubs: HashMap::new(),
            new_count: 0,
            now,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn buckets(&self) -> &[LeitnerBucket] {
        &self.buckets
    }

    pub fn stub(&self, hash: &CardHash) -> Option<&FlashcardStub> {
        self.stubs.get(hash)
    }

    pub fn card_count(&self) -> usize {
        self.stubs.len()
    }

    pub fn due_count(&self) -> usize {
        self.buckets.iter().map(LeitnerBucket::due_count).sum()
    }

    pub fn new_count(&self) -> usize {
        self.new_count
    }

    /// Register a card as new. Returns false if it was already known.
    pub fn register(&mut self, hash: CardHash) -> bool {
        if self.stubs.contains_key(&hash) {
            return false;
        }
        let mut stub = FlashcardStub::new(hash);
        self.buckets[0].add_stub(&mut stub, None, self.now);
        self.stubs.insert(hash, stub);
        self.new_count += 1;
        true
    }

    /// First pass: register every card of a source.
    pub fn register_cards<S>(&mut self, source: &S) -> Fallible<usize>
    where
        S: CardSource + ?Sized,
    {
        let mut duplicates = 0;
        source.for_each_card(|card| {
            if !self.register(card.hash()) {
                duplicates += 1;
            }
            Ok(())
        })?;
        if duplicates > 0 {
            debug!("Skipped {duplicates} duplicate cards.");
        }
        debug!("Registered {} cards.", self.card_count());
        Ok(self.card_count())
    }

    /// Apply one history entry. Returns false if the card is unknown.
    ///
    /// A card drilled without any retries moves up one bucket (staying in
    /// the last one). Any other retry count sends it back to bucket 0.
    pub fn replay(&mut self, entry: &HistoryEntry) -> bool {
        let Some(stub) = self.stubs.get_mut(&entry.hash) else {
            return false;
        };
        let last = self.buckets.len() - 1;
        let old = stub.bucket;
        let new = if entry.retries == 0 {
            (old + 1).min(last)
        } else {
            0
        };
        if stub.is_new() {
            self.new_count -= 1;
        }
        self.buckets[old].remove_stub(stub, self.now);
        self.buckets[new].add_stub(stub, Some(entry.timestamp), self.now);
        stub.bucket = new;
        true
    }

    /// Second pass: replay a history log.
    pub fn replay_history(&mut self, text: &str) -> Fallible<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        parse_log(text, &mut |record: LogRecord| {
            // Only records for known cards have their numbers checked.
            let applied = match HistoryEntry::record_hash(&record)? {
                Some(hash) if self.stubs.contains_key(&hash) => {
                    let entry = HistoryEntry::from_known_record(&record, hash)?;
                    self.replay(&entry)
                }
                _ => false,
            };
            if applied {
                summary.applied += 1;
            } else {
                summary.stale += 1;
            }
            Ok(())
        })?;
        if summary.stale > 0 {
            warn!("Ignored {} history entries for unknown cards.", summary.stale);
        }
        debug!(
            "Replayed {} history entries: {} due, {} new.",
            summary.applied,
            self.due_count(),
            self.new_count
        );
        Ok(summary)
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            now: self.now,
            cards: self.card_count(),
            due: self.due_count(),
            new: self.new_count,
            buckets: self
                .buckets
                .iter()
                .map(|b| BucketSummary {
                    delay_seconds: b.delay,
                    cards: b.card_count,
                    due: b.due_count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::error::ErrorReport;
    use crate::error::Location;
    use crate::flashcard::Flashcard;
    use crate::history::write_history;
    use crate::rng::seeded;

    const DAY: u64 = 86400;
    const WEEK: u64 = 604800;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000.0)
    }

    fn cards(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard::new(format!("front {i}"), format!("back {i}"), "g"))
            .collect()
    }

    fn schedule(cards: &[Flashcard]) -> Fallible<Schedule> {
        let mut schedule = Schedule::new(&[DAY, WEEK], now());
        schedule.register_cards(cards)?;
        Ok(schedule)
    }

    fn check_invariants(schedule: &Schedule) {
        assert!(schedule.new_count() <= schedule.due_count());
        let total: usize = schedule.buckets().iter().map(LeitnerBucket::card_count).sum();
        assert_eq!(total, schedule.card_count());
        for bucket in schedule.buckets() {
            assert!(bucket.due_count() <= bucket.card_count());
        }
    }

    #[test]
    fn test_registration() -> Fallible<()> {
        let mut deck = cards(3);
        deck.push(deck[0].clone());
        let schedule = schedule(&deck)?;
        assert_eq!(schedule.card_count(), 3);
        assert_eq!(schedule.new_count(), 3);
        assert_eq!(schedule.due_count(), 3);
        assert_eq!(schedule.buckets().len(), 3);
        assert_eq!(schedule.buckets()[0].card_count(), 3);
        let stub = schedule.stub(&deck[0].hash()).unwrap();
        assert!(stub.is_new());
        assert_eq!(stub.bucket(), 0);
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_success_promotes_one_bucket() -> Fallible<()> {
        let deck = cards(1);
        let mut schedule = schedule(&deck)?;
        let touched = Timestamp::from_secs(1_699_990_000.0);
        assert!(schedule.replay(&HistoryEntry::new(touched, deck[0].hash(), 0)));
        let stub = schedule.stub(&deck[0].hash()).unwrap();
        assert_eq!(stub.bucket(), 1);
        assert_eq!(stub.due_date(), DueDate::At(touched.plus(DAY)));
        assert!(!stub.is_new());
        assert_eq!(schedule.new_count(), 0);
        assert_eq!(schedule.due_count(), 0);
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_retry_demotes_to_bucket_zero() -> Fallible<()> {
        let deck = cards(1);
        let mut schedule = schedule(&deck)?;
        let hash = deck[0].hash();
        let t1 = Timestamp::from_secs(1_600_000_000.0);
        schedule.replay(&HistoryEntry::new(t1, hash, 0));
        schedule.replay(&HistoryEntry::new(t1.plus(DAY), hash, 0));
        assert_eq!(schedule.stub(&hash).unwrap().bucket(), 2);
        let t3 = t1.plus(3 * DAY);
        schedule.replay(&HistoryEntry::new(t3, hash, 1));
        let stub = schedule.stub(&hash).unwrap();
        assert_eq!(stub.bucket(), 0);
        assert_eq!(stub.due_date(), DueDate::At(t3));
        assert_eq!(schedule.due_count(), 1);
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_last_bucket_is_sticky() -> Fallible<()> {
        let deck = cards(1);
        let mut schedule = schedule(&deck)?;
        let hash = deck[0].hash();
        for i in 0..5 {
            let t = Timestamp::from_secs(1_000_000.0 + i as f64);
            schedule.replay(&HistoryEntry::new(t, hash, 0));
        }
        assert_eq!(schedule.stub(&hash).unwrap().bucket(), 2);
        assert_eq!(schedule.buckets()[2].card_count(), 1);
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_only_bucket_zero() -> Fallible<()> {
        let deck = cards(1);
        let mut schedule = Schedule::new(&[], now());
        schedule.register_cards(deck.as_slice())?;
        schedule.replay(&HistoryEntry::new(now(), deck[0].hash(), 0));
        let stub = schedule.stub(&deck[0].hash()).unwrap();
        assert_eq!(stub.bucket(), 0);
        assert_eq!(stub.due_date(), DueDate::At(now()));
        assert!(stub.is_due(now()));
        Ok(())
    }

    #[test]
    fn test_unknown_card_is_ignored() -> Fallible<()> {
        let mut schedule = schedule(&cards(2))?;
        let stranger = Flashcard::new("x", "y", "z").hash();
        assert!(!schedule.replay(&HistoryEntry::new(now(), stranger, 0)));
        assert_eq!(schedule.new_count(), 2);
        Ok(())
    }

    #[test]
    fn test_replay_history_text() -> Fallible<()> {
        let deck = cards(4);
        let mut schedule = schedule(&deck)?;
        let earlier = Timestamp::from_secs(now().as_secs() - 2.0 * DAY as f64);
        let entries = vec![
            HistoryEntry::new(earlier, deck[0].hash(), 0),
            HistoryEntry::new(now(), deck[1].hash(), 0),
            HistoryEntry::new(now(), deck[2].hash(), 2),
            HistoryEntry::new(now(), Flashcard::new("gone", "", "").hash(), 0),
        ];
        let log = String::from_utf8(write_history(Vec::new(), &entries)?).unwrap();
        let log = format!("# session log\n{log}\"1\":\"not a hash\":\"0\"\n");
        let summary = schedule.replay_history(&log)?;
        assert_eq!(summary, ReplaySummary { applied: 3, stale: 2 });
        // deck[0] came due yesterday, deck[1] is due tomorrow, deck[2] was
        // demoted and is due now, deck[3] is new.
        assert_eq!(schedule.new_count(), 1);
        assert_eq!(schedule.due_count(), 3);
        assert!(!schedule.stub(&deck[1].hash()).unwrap().is_due(now()));
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_malformed_record_reports_its_position() -> Fallible<()> {
        let mut schedule = schedule(&cards(1))?;
        let log = "\"1\":\"a\":\"0\"\n\"2\":\"b\"\n";
        match schedule.replay_history(log) {
            Err(ErrorReport::Domain(e)) => {
                assert_eq!(e.message, "record does not have three fields (found 2)");
                assert_eq!(e.location, Some(Location::new(2, 1).in_record(2)));
            }
            other => panic!("expected a domain error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_stale_records_are_not_validated() -> Fallible<()> {
        let deck = cards(2);
        let mut schedule = schedule(&deck[..1])?;
        let stranger = deck[1].hash().to_hex();
        let log = format!("\"garbage\":\"{stranger}\":\"often\"\n");
        let summary = schedule.replay_history(&log)?;
        assert_eq!(summary, ReplaySummary { applied: 0, stale: 1 });
        assert_eq!(schedule.new_count(), 1);

        let known = deck[0].hash().to_hex();
        let log = format!("\"garbage\":\"{known}\":\"0\"\n");
        match schedule.replay_history(&log) {
            Err(ErrorReport::Domain(e)) => {
                assert_eq!(e.message, "timestamp field is not a number: 'garbage'");
            }
            other => panic!("expected a domain error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_negative_retry_count_demotes() -> Fallible<()> {
        let deck = cards(1);
        let mut schedule = schedule(&deck)?;
        let hash = deck[0].hash();
        schedule.replay(&HistoryEntry::new(now(), hash, 0));
        assert_eq!(schedule.stub(&hash).unwrap().bucket(), 1);
        let log = format!("\"{}\":\"{}\":\"-1\"\n", now(), hash.to_hex());
        assert_eq!(schedule.replay_history(&log)?.applied, 1);
        assert_eq!(schedule.stub(&hash).unwrap().bucket(), 0);
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_new_cards_never_exceed_due_cards() -> Fallible<()> {
        let deck = cards(20);
        let mut schedule = schedule(&deck)?;
        let mut rng = seeded(11);
        for step in 0..500 {
            let card = &deck[rng.random_range(0..deck.len())];
            let offset = rng.random_range(-10.0..10.0) * DAY as f64;
            let t = Timestamp::from_secs(now().as_secs() + offset);
            let retries = if rng.random_bool(0.3) { 1 } else { 0 };
            schedule.replay(&HistoryEntry::new(t, card.hash(), retries));
            if step % 10 == 0 {
                check_invariants(&schedule);
            }
        }
        check_invariants(&schedule);
        Ok(())
    }

    #[test]
    fn test_summary_serializes() -> Fallible<()> {
        let schedule = schedule(&cards(2))?;
        let summary = schedule.summary();
        assert_eq!(summary.buckets.len(), 3);
        assert_eq!(summary.buckets[1].delay_seconds, DAY);
        let json = serde_json::to_value(&summary)?;
        assert_eq!(json["cards"], 2);
        assert_eq!(json["new"], 2);
        assert_eq!(json["buckets"][0]["due"], 2);
        Ok(())
    }
}

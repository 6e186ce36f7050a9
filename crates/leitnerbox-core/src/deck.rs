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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Serialize;

use crate::flashcard::Card;
use crate::history::HistoryEntry;
use crate::rng::SessionRng;
use crate::rng::shuffle;
use crate::types::card_hash::CardHash;
use crate::types::timestamp::Timestamp;

/// Misuse of a [`Deck`]. These are bugs in the caller, not user errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckError {
    /// A card was drawn before the previous one was marked.
    UnmarkedCard,
    /// A card was marked, but there is no drawn, unmarked card.
    NoCurrentCard,
    /// No cards are left.
    Empty,
}

impl Display for DeckError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            DeckError::UnmarkedCard => write!(f, "the current card has not been marked"),
            DeckError::NoCurrentCard => write!(f, "there is no card to mark"),
            DeckError::Empty => write!(f, "empty deck"),
        }
    }
}

impl Error for DeckError {}

/// How a drill session went.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeckStatistics {
    pub total_cards: usize,
    /// Cards not passed yet, failed ones included.
    pub cards_left: usize,
    /// Cards shown, retries included.
    pub attempts: usize,
    pub passed_on_first_try: usize,
    pub failed_on_first_try: usize,
    pub seen: BTreeSet<CardHash>,
    /// How many times each failed card was failed.
    pub retries: BTreeMap<CardHash, u32>,
}

impl DeckStatistics {
    pub fn new(total_cards: usize) -> Self {
        DeckStatistics {
            total_cards,
            cards_left: total_cards,
            attempts: 0,
            passed_on_first_try: 0,
            failed_on_first_try: 0,
            seen: BTreeSet::new(),
            retries: BTreeMap::new(),
        }
    }

    pub fn card_passed(&mut self, hash: CardHash) {
        self.attempts += 1;
        if !self.retries.contains_key(&hash) {
            self.passed_on_first_try += 1;
        }
        self.seen.insert(hash);
        self.cards_left = self.cards_left.saturating_sub(1);
    }

    pub fn card_failed(&mut self, hash: CardHash) {
        self.attempts += 1;
        if !self.retries.contains_key(&hash) {
            self.failed_on_first_try += 1;
        }
        self.seen.insert(hash);
        *self.retries.entry(hash).or_insert(0) += 1;
    }

    pub fn retry_count(&self, hash: &CardHash) -> u32 {
        self.retries.get(hash).copied().unwrap_or(0)
    }

    /// One history entry per card seen in the session, all stamped `now`.
    pub fn history_entries(&self, now: Timestamp) -> Vec<HistoryEntry> {
        self.seen
            .iter()
            .map(|hash| HistoryEntry::new(now, *hash, i64::from(self.retry_count(hash))))
            .collect()
    }
}

/// A deck being drilled. Failed cards go back into the deck, and come up
/// again, in a new random order, once the rest of the deck has been drawn.
pub struct Deck<C> {
    pending: Vec<C>,
    failed: Vec<C>,
    current: Option<C>,
    marked: bool,
    statistics: DeckStatistics,
    rng: SessionRng,
}

impl<C: Card + Clone> Deck<C> {
    /// Cards are drawn from the end of `cards`.
    pub fn new(cards: Vec<C>, rng: SessionRng) -> Self {
        let statistics = DeckStatistics::new(cards.len());
        Deck {
            pending: cards,
            failed: Vec::new(),
            current: None,
            marked: false,
            statistics,
            rng,
        }
    }

    pub fn draw(&mut self) -> Result<&C, DeckError> {
        if self.current.is_some() && !self.marked {
            return Err(DeckError::UnmarkedCard);
        }
        if self.pending.is_empty() {
            if self.failed.is_empty() {
                return Err(DeckError::Empty);
            }
            let failed = std::mem::take(&mut self.failed);
            self.pending = shuffle(failed, &mut self.rng);
        }
        let card = self.pending.pop().ok_or(DeckError::Empty)?;
        self.marked = false;
        Ok(self.current.insert(card))
    }

    pub fn mark_succeeded(&mut self) -> Result<(), DeckError> {
        let hash = self.unmarked()?.hash();
        self.marked = true;
        self.statistics.card_passed(hash);
        Ok(())
    }

    pub fn mark_failed(&mut self) -> Result<(), DeckError> {
        let card = self.unmarked()?.clone();
        self.marked = true;
        self.statistics.card_failed(card.hash());
        self.failed.push(card);
        Ok(())
    }

    /// The last card drawn.
    pub fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    pub fn has_cards(&self) -> bool {
        !self.pending.is_empty() || !self.failed.is_empty()
    }

    /// True when every card has been passed.
    pub fn is_exhausted(&self) -> bool {
        !self.has_cards() && (self.current.is_none() || self.marked)
    }

    pub fn statistics(&self) -> &DeckStatistics {
        &self.statistics
    }

    fn unmarked(&self) -> Result<&C, DeckError> {
        match &self.current {
            Some(card) if !self.marked => Ok(card),
            _ => Err(DeckError::NoCurrentCard),
        }
    }
}

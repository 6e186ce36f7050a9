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

//! Third pass: picking the cards of a deck.

use std::collections::HashSet;

use log::debug;
use rand::Rng;

use crate::error::Fallible;
use crate::error::fail;
use crate::flashcard::Card;
use crate::flashcard::CardSource;
use crate::sampler::ReservoirSampler;
use crate::schedule::Schedule;

/// Builds decks out of a schedule that has been filled in.
pub struct DeckBuilder<'a> {
    schedule: &'a Schedule,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(schedule: &'a Schedule) -> Self {
        DeckBuilder { schedule }
    }

    /// Pick at most `size` cards from the source, `new_quota` of them new if
    /// that many new cards exist, the rest due.
    ///
    /// When nothing is due, the deck is made of the most overdue cards
    /// instead, that is, those that will come due soonest. Cards the schedule
    /// does not know are skipped. The result is in random order.
    pub fn build<S, R>(
        &self,
        source: &S,
        size: usize,
        new_quota: usize,
        rng: &mut R,
    ) -> Fallible<Vec<S::Card>>
    where
        S: CardSource + ?Sized,
        R: Rng + ?Sized,
    {
        if size == 0 {
            return fail("deck size must be positive");
        }
        let selected = if self.schedule.due_count() == 0 {
            self.most_overdue(source, size, rng)?
        } else {
            self.due_and_new(source, size, new_quota, rng)?
        };
        let mut combined = ReservoirSampler::new(selected.len());
        combined.consume(selected, rng);
        let deck = combined.into_vec();
        debug!("Built a deck of {} cards.", deck.len());
        Ok(deck)
    }

    fn most_overdue<S, R>(&self, source: &S, size: usize, rng: &mut R) -> Fallible<Vec<S::Card>>
    where
        S: CardSource + ?Sized,
        R: Rng + ?Sized,
    {
        let schedule = self.schedule;
        let now = schedule.now();
        let mut seen = HashSet::new();
        let mut sampler = ReservoirSampler::new(size.min(schedule.card_count()));
        source.for_each_card(|card| {
            let hash = card.hash();
            if !seen.insert(hash) {
                return Ok(());
            }
            if let Some(stub) = schedule.stub(&hash) {
                sampler.offer_weighted(stub.due_date().overdue_by(now), card, rng);
            }
            Ok(())
        })?;
        debug!("No cards are due: picked the {} most overdue.", sampler.len());
        Ok(sampler.into_vec())
    }

    fn due_and_new<S, R>(
        &self,
        source: &S,
        size: usize,
        new_quota: usize,
        rng: &mut R,
    ) -> Fallible<Vec<S::Card>>
    where
        S: CardSource + ?Sized,
        R: Rng + ?Sized,
    {
        let schedule = self.schedule;
        let now = schedule.now();
        let new_quota = new_quota.min(schedule.new_count());
        let due_quota = size.min(schedule.due_count()).saturating_sub(new_quota);
        let mut seen = HashSet::new();
        let mut new_cards = ReservoirSampler::new(new_quota);
        let mut due_cards = ReservoirSampler::new(due_quota);
        source.for_each_card(|card| {
            let hash = card.hash();
            if !seen.insert(hash) {
                return Ok(());
            }
            match schedule.stub(&hash) {
                Some(stub) if stub.is_new() => {
                    new_cards.offer(card, rng);
                }
                Some(stub) if stub.is_due(now) => {
                    due_cards.offer(card, rng);
                }
                _ => {}
            }
            Ok(())
        })?;
        debug!(
            "Picked {} new cards (quota {}) and {} due cards (quota {}).",
            new_cards.len(),
            new_quota,
            due_cards.len(),
            due_quota
        );
        let mut selected = new_cards.into_vec();
        selected.extend(due_cards.into_vec());
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReport;
    use crate::flashcard::Flashcard;
    use crate::history::HistoryEntry;
    use crate::rng::seeded;
    use crate::types::card_hash::CardHash;
    use crate::types::timestamp::Timestamp;

    const DAY: u64 = 86400;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000.0)
    }

    fn cards(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard::new(format!("front {i}"), format!("back {i}"), "g"))
            .collect()
    }

    fn days_ago(days: f64) -> Timestamp {
        Timestamp::from_secs(now().as_secs() - days * DAY as f64)
    }

    /// Ten cards: 0-3 new, 4-6 due, 7-9 not due.
    fn mixed() -> Fallible<(Vec<Flashcard>, Schedule)> {
        let deck = cards(10);
        let mut schedule = Schedule::new(&[DAY, 7 * DAY], now());
        schedule.register_cards(deck.as_slice())?;
        for card in &deck[4..7] {
            schedule.replay(&HistoryEntry::new(days_ago(2.0), card.hash(), 0));
        }
        for card in &deck[7..] {
            schedule.replay(&HistoryEntry::new(now(), card.hash(), 0));
        }
        assert_eq!(schedule.new_count(), 4);
        assert_eq!(schedule.due_count(), 7);
        Ok((deck, schedule))
    }

    fn hashes(cards: &[Flashcard]) -> HashSet<CardHash> {
        cards.iter().map(|c| c.hash()).collect()
    }

    #[test]
    fn test_zero_size_is_rejected() -> Fallible<()> {
        let (deck, schedule) = mixed()?;
        let result = DeckBuilder::new(&schedule).build(deck.as_slice(), 0, 1, &mut seeded(1));
        assert!(matches!(result, Err(ErrorReport::Domain(_))));
        Ok(())
    }

    #[test]
    fn test_respects_quotas() -> Fallible<()> {
        let (deck, schedule) = mixed()?;
        let new = hashes(&deck[..4]);
        let due = hashes(&deck[4..7]);
        for seed in 0..20 {
            let built =
                DeckBuilder::new(&schedule).build(deck.as_slice(), 4, 2, &mut seeded(seed))?;
            assert_eq!(built.len(), 4);
            let built = hashes(&built);
            assert_eq!(built.len(), 4);
            assert_eq!(built.intersection(&new).count(), 2);
            assert_eq!(built.intersection(&due).count(), 2);
        }
        Ok(())
    }

    #[test]
    fn test_new_quota_is_clamped() -> Fallible<()> {
        let (deck, schedule) = mixed()?;
        let built = DeckBuilder::new(&schedule).build(deck.as_slice(), 100, 100, &mut seeded(2))?;
        // Every new and due card, nothing else.
        assert_eq!(hashes(&built), hashes(&deck[..7]));
        Ok(())
    }

    #[test]
    fn test_no_new_cards_requested() -> Fallible<()> {
        let (deck, schedule) = mixed()?;
        let built = DeckBuilder::new(&schedule).build(deck.as_slice(), 5, 0, &mut seeded(3))?;
        assert_eq!(hashes(&built), hashes(&deck[4..7]));
        Ok(())
    }

    #[test]
    fn test_most_overdue_when_nothing_is_due() -> Fallible<()> {
        let deck = cards(5);
        let mut schedule = Schedule::new(&[10 * DAY], now());
        schedule.register_cards(deck.as_slice())?;
        // Due in 9, 8, 7, 6 and 5 days.
        for (i, card) in deck.iter().enumerate() {
            schedule.replay(&HistoryEntry::new(days_ago(1.0 + i as f64), card.hash(), 0));
        }
        assert_eq!(schedule.due_count(), 0);
        let built = DeckBuilder::new(&schedule).build(deck.as_slice(), 2, 3, &mut seeded(4))?;
        assert_eq!(hashes(&built), hashes(&deck[3..]));
        let all = DeckBuilder::new(&schedule).build(deck.as_slice(), 50, 0, &mut seeded(4))?;
        assert_eq!(all.len(), 5);
        Ok(())
    }

    #[test]
    fn test_duplicates_and_strangers_are_skipped() -> Fallible<()> {
        let deck = cards(3);
        let mut schedule = Schedule::new(&[], now());
        schedule.register_cards(deck.as_slice())?;
        let mut source = deck.clone();
        source.push(deck[0].clone());
        source.push(Flashcard::new("stranger", "", ""));
        let built = DeckBuilder::new(&schedule).build(source.as_slice(), 10, 10, &mut seeded(5))?;
        assert_eq!(built.len(), 3);
        assert_eq!(hashes(&built), hashes(&deck));
        Ok(())
    }

    #[test]
    fn test_order_is_randomized() -> Fallible<()> {
        let deck = cards(8);
        let mut schedule = Schedule::new(&[], now());
        schedule.register_cards(deck.as_slice())?;
        let orders: HashSet<Vec<CardHash>> = (0..10)
            .map(|seed| {
                DeckBuilder::new(&schedule)
                    .build(deck.as_slice(), 8, 8, &mut seeded(seed))
                    .map(|built| built.iter().map(|c| c.hash()).collect())
            })
            .collect::<Fallible<_>>()?;
        assert!(orders.len() > 1);
        Ok(())
    }
}

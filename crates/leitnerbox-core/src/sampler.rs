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

//! Fixed-capacity reservoir sampling over streams of unknown length.
//!
//! Every offered item is tagged with a key. The reservoir keeps the items
//! with the largest keys in a min-heap, so an offer either fills a free slot
//! or replaces the current minimum. With uniform random keys this yields a
//! uniform sample; with caller-supplied weights it yields the top-k items by
//! weight, ties broken at random.

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;

use crate::rng::random_key;

struct Entry<T> {
    key: f64,
    tiebreak: f64,
    /// Position in the stream. Keeps the heap ordering total; never affects
    /// whether an offer is accepted.
    arrival: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then(self.tiebreak.total_cmp(&other.tiebreak))
            .then(self.arrival.cmp(&other.arrival))
    }
}

pub struct ReservoirSampler<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry<T>>>,
    arrivals: u64,
}

impl<T> ReservoirSampler<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::new(),
            arrivals: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offer an item for uniform sampling. Returns whether the item is in
    /// the sample right now; a later offer may still evict it.
    pub fn offer<R: Rng + ?Sized>(&mut self, item: T, rng: &mut R) -> bool {
        let key = random_key(rng);
        self.insert(key, 0.0, item)
    }

    /// Offer an item keyed by `weight` instead of a random key. Items with
    /// equal weights are separated by a random secondary key.
    pub fn offer_weighted<R: Rng + ?Sized>(&mut self, weight: f64, item: T, rng: &mut R) -> bool {
        let tiebreak = random_key(rng);
        self.insert(weight, tiebreak, item)
    }

    /// Offer every item of a (possibly lazy) sequence.
    pub fn consume<I, R>(&mut self, items: I, rng: &mut R)
    where
        I: IntoIterator<Item = T>,
        R: Rng + ?Sized,
    {
        for item in items {
            self.offer(item, rng);
        }
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|Reverse(entry)| &entry.item)
    }

    /// The sampled items, in heap order.
    pub fn into_vec(self) -> Vec<T> {
        self.heap
            .into_vec()
            .into_iter()
            .map(|Reverse(entry)| entry.item)
            .collect()
    }

    fn insert(&mut self, key: f64, tiebreak: f64, item: T) -> bool {
        let arrival = self.arrivals;
        self.arrivals += 1;
        let entry = Entry {
            key,
            tiebreak,
            arrival,
            item,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut min) if key.total_cmp(&min.0.key).is_ge() => {
                *min = Reverse(entry);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn test_capacity_bounds_sample() {
        let mut rng = seeded(1);
        let mut sampler = ReservoirSampler::new(5);
        sampler.consume(0..100, &mut rng);
        assert_eq!(sampler.len(), 5);
        let mut items = sampler.into_vec();
        items.sort();
        items.dedup();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| *i < 100));
    }

    #[test]
    fn test_short_stream_is_kept_whole() {
        let mut rng = seeded(2);
        let mut sampler = ReservoirSampler::new(10);
        sampler.consume(["a", "b", "c"], &mut rng);
        let mut items = sampler.into_vec();
        items.sort();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_capacity_accepts_nothing() {
        let mut rng = seeded(3);
        let mut sampler = ReservoirSampler::new(0);
        assert!(!sampler.offer(1, &mut rng));
        assert!(!sampler.offer_weighted(1e9, 2, &mut rng));
        assert!(sampler.is_empty());
    }

    #[test]
    fn test_uniform_inclusion() {
        let n = 10;
        let k = 3;
        let trials = 20_000;
        let mut rng = seeded(4);
        let mut counts = [0usize; 10];
        for _ in 0..trials {
            let mut sampler = ReservoirSampler::new(k);
            sampler.consume(0..n, &mut rng);
            assert_eq!(sampler.len(), k);
            for i in sampler.iter() {
                counts[*i] += 1;
            }
        }
        let expected = k as f64 / n as f64;
        for count in counts {
            let freq = count as f64 / trials as f64;
            assert!(
                (freq - expected).abs() < 0.03,
                "inclusion frequency {freq} too far from {expected}"
            );
        }
    }

    #[test]
    fn test_weighted_keeps_heaviest() {
        let mut rng = seeded(5);
        let mut sampler = ReservoirSampler::new(3);
        for i in [4, 9, 0, 7, 1, 8, 2, 3, 6, 5] {
            sampler.offer_weighted(i as f64, i, &mut rng);
        }
        let mut items = sampler.into_vec();
        items.sort();
        assert_eq!(items, vec![7, 8, 9]);
    }

    #[test]
    fn test_weighted_ties_are_randomized() {
        // Ten equally weighted items competing for three slots: across seeds,
        // more than one distinct sample must show up.
        let mut samples = Vec::new();
        for seed in 0..50 {
            let mut rng = seeded(seed);
            let mut sampler = ReservoirSampler::new(3);
            for i in 0..10 {
                sampler.offer_weighted(1.0, i, &mut rng);
            }
            let mut sample = sampler.into_vec();
            sample.sort();
            samples.push(sample);
        }
        samples.sort();
        samples.dedup();
        assert!(samples.len() > 1);
    }
}

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

//! leitnerbox-core: the engine behind the leitnerbox flashcard drill.
//!
//! This library provides:
//! - Incremental parsers and writers for the configuration and log formats
//! - Flashcard sources and the history log built on them
//! - Leitner bucket scheduling and reservoir sampling of decks
//! - The deck drilled by the user, with session statistics
//!
//! It does no I/O of its own: text comes in as `&str` and goes out through
//! writers supplied by the caller.

pub mod config;
pub mod deck;
pub mod deck_builder;
pub mod error;
pub mod flashcard;
pub mod history;
pub mod logfmt;
pub mod rng;
pub mod sampler;
pub mod schedule;
pub mod settings;
pub mod types;

// Re-exports for convenience
pub use deck::{Deck, DeckError, DeckStatistics};
pub use deck_builder::DeckBuilder;
pub use error::{ErrorReport, Fallible, fail};
pub use flashcard::{Card, CardSource, Flashcard, Orientation, TextCardSource};
pub use history::HistoryEntry;
pub use sampler::ReservoirSampler;
pub use schedule::{Schedule, ScheduleSummary};
pub use settings::{Settings, parse_settings};
pub use types::card_hash::CardHash;
pub use types::timestamp::Timestamp;

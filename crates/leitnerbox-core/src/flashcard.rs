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

//! Flashcards and the card-source format.
//!
//! A card source is a configuration document whose root section is named
//! `flashcards`. Each child of the root is a group, and each child of a group
//! is a card: the section name is the front, its single setting the back.
//!
//! ```text
//! "flashcards" {
//!   "capitals" {
//!     "France" { "Paris" }
//!     "Peru" { "Lima" }
//!   }
//! }
//! ```

use crate::config::ConfigHandler;
use crate::config::parse_config;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card_hash::CardHash;

pub const ROOT_SECTION: &str = "flashcards";

/// Anything the scheduler can track: it only needs a stable identity.
pub trait Card {
    fn hash(&self) -> CardHash;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Forward,
    /// Front and back are swapped.
    Reverse,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Flashcard {
    front: String,
    back: String,
    group: String,
    hash: CardHash,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>, group: impl Into<String>) -> Self {
        let front = front.into();
        let back = back.into();
        let group = group.into();
        let hash = CardHash::of_fields([front.as_str(), back.as_str(), group.as_str()]);
        Flashcard {
            front,
            back,
            group,
            hash,
        }
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// The same card with its sides swapped. It hashes differently, so it is
    /// scheduled on its own.
    pub fn reversed(&self) -> Flashcard {
        Flashcard::new(&self.back, &self.front, &self.group)
    }
}

impl Card for Flashcard {
    fn hash(&self) -> CardHash {
        self.hash
    }
}

/// Turns configuration events into flashcards.
pub struct CardParser<F> {
    orientation: Orientation,
    group: Option<String>,
    front: Option<String>,
    back: Option<String>,
    on_card: F,
}

impl<F> CardParser<F>
where
    F: FnMut(Flashcard) -> Fallible<()>,
{
    pub fn new(orientation: Orientation, on_card: F) -> Self {
        CardParser {
            orientation,
            group: None,
            front: None,
            back: None,
            on_card,
        }
    }
}

impl<F> ConfigHandler for CardParser<F>
where
    F: FnMut(Flashcard) -> Fallible<()>,
{
    fn section_begin(&mut self, name: &str, parent: Option<&str>) -> Fallible<()> {
        if parent.is_none() {
            if name != ROOT_SECTION {
                return fail(format!(
                    "top-level section must be named \"{ROOT_SECTION}\", not \"{name}\""
                ));
            }
        } else if self.group.is_none() {
            self.group = Some(name.to_string());
        } else if let Some(front) = &self.front {
            return fail(format!("card \"{front}\" cannot have subsections"));
        } else {
            self.front = Some(name.to_string());
        }
        Ok(())
    }

    fn section_end(&mut self, _name: &str) -> Fallible<()> {
        if let Some(front) = self.front.take() {
            let back = match self.back.take() {
                Some(back) => back,
                None => return fail(format!("card \"{front}\" has no back")),
            };
            let group = self.group.clone().unwrap_or_default();
            let card = match self.orientation {
                Orientation::Forward => Flashcard::new(front, back, group),
                Orientation::Reverse => Flashcard::new(back, front, group),
            };
            (self.on_card)(card)?;
        } else {
            self.group = None;
        }
        Ok(())
    }

    fn setting(&mut self, value: &str, section: &str) -> Fallible<()> {
        if self.front.is_none() {
            return fail(format!(
                "only cards may have settings, but \"{section}\" is not a card"
            ));
        }
        if self.back.is_some() {
            return fail(format!("card \"{section}\" has more than one back"));
        }
        self.back = Some(value.to_string());
        Ok(())
    }
}

/// Parse every card of a card-source document.
pub fn parse_cards(text: &str, orientation: Orientation) -> Fallible<Vec<Flashcard>> {
    let mut cards = Vec::new();
    TextCardSource::new(text, orientation).for_each_card(|card| {
        cards.push(card);
        Ok(())
    })?;
    Ok(cards)
}

/// Something that can stream its cards, as many times as asked. The
/// scheduling passes go over the source once each.
pub trait CardSource {
    type Card: Card;

    fn for_each_card<F>(&self, on_card: F) -> Fallible<()>
    where
        F: FnMut(Self::Card) -> Fallible<()>;
}

/// Cards parsed out of card-source text, once per pass.
pub struct TextCardSource<'a> {
    text: &'a str,
    orientation: Orientation,
}

impl<'a> TextCardSource<'a> {
    pub fn new(text: &'a str, orientation: Orientation) -> Self {
        TextCardSource { text, orientation }
    }
}

impl CardSource for TextCardSource<'_> {
    type Card = Flashcard;

    fn for_each_card<F>(&self, on_card: F) -> Fallible<()>
    where
        F: FnMut(Flashcard) -> Fallible<()>,
    {
        let mut parser = CardParser::new(self.orientation, on_card);
        parse_config(self.text, &mut parser)
    }
}

/// Cards already in memory.
impl<C: Card + Clone> CardSource for [C] {
    type Card = C;

    fn for_each_card<F>(&self, mut on_card: F) -> Fallible<()>
    where
        F: FnMut(C) -> Fallible<()>,
    {
        for card in self {
            on_card(card.clone())?;
        }
        Ok(())
    }
}

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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;
use std::time::Duration;
use std::time::Instant;

use leitnerbox_core::deck::Deck;
use leitnerbox_core::deck::DeckStatistics;
use leitnerbox_core::deck_builder::DeckBuilder;
use leitnerbox_core::flashcard::Flashcard;
use leitnerbox_core::rng::session_rng;
use log::debug;

use crate::cmd::check::orientation;
use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

pub struct DrillConfig {
    pub config: String,
    pub size: Option<usize>,
    pub new: usize,
    pub reverse: bool,
    /// In minutes.
    pub time_limit: Option<u64>,
}

/// How a drill session ended.
#[derive(Debug, PartialEq)]
enum Outcome {
    Finished,
    Quit,
    TimedOut,
}

enum Answer {
    Pass,
    Fail,
    Quit,
}

pub fn drill(config: DrillConfig) -> Fallible<()> {
    let collection = Collection::new(&config.config)?;
    let orientation = orientation(config.reverse);
    let schedule = collection.schedule(orientation, Timestamp::now())?;
    if schedule.card_count() == 0 {
        println!("No cards.");
        return Ok(());
    }
    let size = config.size.unwrap_or(schedule.card_count());
    let mut rng = session_rng();
    let cards = DeckBuilder::new(&schedule).build(
        &collection.source(orientation),
        size,
        config.new,
        &mut rng,
    )?;
    let mut deck = Deck::new(cards, rng);
    let deadline = config
        .time_limit
        .map(|minutes| Instant::now() + Duration::from_secs(minutes * 60));

    let outcome = run_session(&mut deck, stdin().lock(), stdout().lock(), deadline)?;
    debug!("Session ended: {outcome:?}");

    let statistics = deck.statistics();
    collection.append_history(&statistics.history_entries(Timestamp::now()))?;
    match outcome {
        Outcome::Finished => println!("Done!"),
        Outcome::Quit => println!("Stopped."),
        Outcome::TimedOut => println!("Timed out!"),
    }
    println!("{}", report(statistics));
    Ok(())
}

/// Drill the deck until it is exhausted, the user quits, input runs out, or
/// the deadline passes.
fn run_session<R, W>(
    deck: &mut Deck<Flashcard>,
    mut input: R,
    mut output: W,
    deadline: Option<Instant>,
) -> Fallible<Outcome>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    while deck.has_cards() {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(Outcome::TimedOut);
        }
        let stats = deck.statistics();
        let progress = format!("[{}/{}]", stats.total_cards - stats.cards_left, stats.total_cards);
        let card = deck.draw().map_err(deck_error)?;
        writeln!(output, "{progress} {}", card.group())?;
        writeln!(output, "  {}", card.front())?;
        write!(output, "(press enter to reveal) ")?;
        output.flush()?;
        if !read_line(&mut input, &mut line)? {
            return Ok(Outcome::Quit);
        }
        writeln!(output, "  {}", card.back())?;
        let answer = loop {
            write!(output, "Did you know it? [y/n/q] ")?;
            output.flush()?;
            if !read_line(&mut input, &mut line)? {
                break Answer::Quit;
            }
            match line.trim() {
                "y" | "Y" => break Answer::Pass,
                "n" | "N" => break Answer::Fail,
                "q" | "Q" => break Answer::Quit,
                _ => continue,
            }
        };
        match answer {
            Answer::Pass => deck.mark_succeeded().map_err(deck_error)?,
            Answer::Fail => deck.mark_failed().map_err(deck_error)?,
            // The current card stays unmarked and is not logged.
            Answer::Quit => return Ok(Outcome::Quit),
        }
        writeln!(output)?;
    }
    Ok(Outcome::Finished)
}

/// Returns false at end of input.
fn read_line<R: BufRead>(input: &mut R, line: &mut String) -> Fallible<bool> {
    line.clear();
    Ok(input.read_line(line)? > 0)
}

fn deck_error(e: leitnerbox_core::deck::DeckError) -> ErrorReport {
    ErrorReport::new(e.to_string())
}

fn report(statistics: &DeckStatistics) -> String {
    format!(
        "Cards: {}, attempts: {}, passed on first try: {}, failed on first try: {}.",
        statistics.total_cards,
        statistics.attempts,
        statistics.passed_on_first_try,
        statistics.failed_on_first_try
    )
}

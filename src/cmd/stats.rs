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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use chrono::Local;
use clap::ValueEnum;
use leitnerbox_core::schedule::ScheduleSummary;

use crate::cmd::check::orientation;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone, Copy, PartialEq)]
pub enum StatsFormat {
    /// A human-readable table.
    Text,
    /// JSON, for scripts.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(config: String, reverse: bool, format: StatsFormat) -> Fallible<()> {
    let collection = Collection::new(&config)?;
    let schedule = collection.schedule(orientation(reverse), Timestamp::now())?;
    let summary = schedule.summary();
    let output = match format {
        StatsFormat::Text => render_text(&summary)?,
        StatsFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    println!("{output}");
    Ok(())
}

fn render_text(summary: &ScheduleSummary) -> Fallible<String> {
    let mut out = String::new();
    if let Some(now) = summary.now.to_datetime() {
        let local = now.with_timezone(&Local);
        writeln!(out, "As of: {}", local.format("%Y-%m-%d %H:%M"))?;
    }
    writeln!(out, "Cards: {}", summary.cards)?;
    writeln!(out, "Due:   {}", summary.due)?;
    writeln!(out, "New:   {}", summary.new)?;
    writeln!(out)?;
    writeln!(out, "{:<8}{:>12}{:>8}{:>8}", "Bucket", "Delay", "Cards", "Due")?;
    for (index, bucket) in summary.buckets.iter().enumerate() {
        writeln!(
            out,
            "{:<8}{:>12}{:>8}{:>8}",
            index,
            format_delay(bucket.delay_seconds),
            bucket.cards,
            bucket.due
        )?;
    }
    Ok(out.trim_end().to_string())
}

fn format_delay(seconds: u64) -> String {
    const DAY: u64 = 86400;
    if seconds % DAY == 0 {
        format!("{}d", seconds / DAY)
    } else if seconds % 3600 == 0 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{seconds}s")
    }
}

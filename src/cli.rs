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

use clap::Parser;

use crate::cmd::check::check_collection;
use crate::cmd::drill::DrillConfig;
use crate::cmd::drill::drill;
use crate::cmd::fmt::format_file;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill cards on the terminal.
    Drill {
        /// Path to the configuration file.
        config: String,
        /// Maximum number of cards to drill. By default, every due card is drilled.
        #[arg(long)]
        size: Option<usize>,
        /// Number of new cards to drill, if that many are available.
        #[arg(long, default_value_t = 0)]
        new: usize,
        /// Show the back of each card first.
        #[arg(long)]
        reverse: bool,
        /// Stop the session after this many minutes.
        #[arg(long)]
        time_limit: Option<u64>,
    },
    /// Check that the configuration, the cards and the history log can be read.
    Check {
        /// Path to the configuration file.
        config: String,
        /// Check the reversed cards.
        #[arg(long)]
        reverse: bool,
    },
    /// Print scheduling statistics.
    Stats {
        /// Path to the configuration file.
        config: String,
        /// Statistics for the reversed cards.
        #[arg(long)]
        reverse: bool,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Reformat a configuration or card file and print it.
    Fmt {
        /// Path to the file.
        file: String,
        /// Print without any whitespace.
        #[arg(long)]
        compact: bool,
        /// Spaces per indentation level.
        #[arg(long, default_value_t = 2)]
        tab_width: usize,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            config,
            size,
            new,
            reverse,
            time_limit,
        } => drill(DrillConfig {
            config,
            size,
            new,
            reverse,
            time_limit,
        }),
        Command::Check { config, reverse } => check_collection(config, reverse),
        Command::Stats {
            config,
            reverse,
            format,
        } => print_stats(config, reverse, format),
        Command::Fmt {
            file,
            compact,
            tab_width,
        } => format_file(file, compact, tab_width),
    }
}

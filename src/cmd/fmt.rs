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

use std::fs::read_to_string;

use leitnerbox_core::config::Style;
use leitnerbox_core::config::config_to_string;
use leitnerbox_core::config::parse_tree;

use crate::error::ErrorReport;
use crate::error::Fallible;

pub fn format_file(file: String, compact: bool, tab_width: usize) -> Fallible<()> {
    let text = read_to_string(&file)
        .map_err(|e| ErrorReport::Io(format!("failed to read {file}: {e}")))?;
    let style = if compact {
        Style::Compact
    } else {
        Style::Pretty { tab_width }
    };
    let output = format_text(&text, style)?;
    if compact {
        println!("{output}");
    } else {
        print!("{output}");
    }
    Ok(())
}

/// Reformat a configuration document. Comments are not preserved.
fn format_text(text: &str, style: Style) -> Fallible<String> {
    let root = parse_tree(text)?;
    Ok(config_to_string(&root, style))
}

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

//! Incremental parser for the configuration grammar.
//!
//! ```text
//! "root" {
//!   "setting";
//!   "attribute" { "value" }   # a comment
//!   "section" { "a"; "b" }
//! }
//! ```
//!
//! Names and settings are double-quoted, with `""` standing for a literal
//! quote. The parser is fed one character at a time and reports structure
//! to a [`ConfigHandler`] as soon as it is recognized.

use std::mem::replace;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::FormatError;
use crate::error::Location;

/// Receives the structure of a configuration document as it is parsed.
pub trait ConfigHandler {
    fn section_begin(&mut self, name: &str, parent: Option<&str>) -> Fallible<()>;

    fn section_end(&mut self, name: &str) -> Fallible<()>;

    fn setting(&mut self, value: &str, section: &str) -> Fallible<()>;
}

/// A structural event, for callers that would rather collect than react.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigEvent {
    SectionBegin {
        name: String,
        parent: Option<String>,
    },
    SectionEnd {
        name: String,
    },
    Setting {
        value: String,
        section: String,
    },
}

impl ConfigHandler for Vec<ConfigEvent> {
    fn section_begin(&mut self, name: &str, parent: Option<&str>) -> Fallible<()> {
        self.push(ConfigEvent::SectionBegin {
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        Ok(())
    }

    fn section_end(&mut self, name: &str) -> Fallible<()> {
        self.push(ConfigEvent::SectionEnd {
            name: name.to_string(),
        });
        Ok(())
    }

    fn setting(&mut self, value: &str, section: &str) -> Fallible<()> {
        self.push(ConfigEvent::Setting {
            value: value.to_string(),
            section: section.to_string(),
        });
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    /// Nothing read yet.
    Start,
    /// Between tokens.
    PreName,
    /// Inside a quoted name or setting.
    Name(String),
    /// Just read a quote inside a name: either an escape or the end.
    NameEscape(String),
    /// After a closed name, waiting for `;`, `{` or `}`.
    PostName(String),
    /// Inside a line comment. Holds the state to restore at the newline.
    LineComment(Box<State>),
}

/// What a transition asks the parser to do with the open-section stack.
#[derive(Debug, PartialEq)]
pub enum Action {
    Open(String),
    Close,
    Setting(String),
    /// `"value" }`: a final setting without its `;`, closing the section.
    SettingThenClose(String),
}

fn is_comment(c: char) -> bool {
    c == '#' || c == '@'
}

/// The transition function of the grammar. `depth` is the number of open
/// sections.
pub fn transition(state: State, c: char, depth: usize) -> Result<(State, Option<Action>), String> {
    match state {
        State::Start => {
            if c.is_whitespace() {
                Ok((State::Start, None))
            } else if c == '"' {
                Ok((State::Name(String::new()), None))
            } else if c == '{' {
                Err("Opening the top-level section without a name".to_string())
            } else if c == '}' {
                Err("Closing the top-level section without opening it".to_string())
            } else if is_comment(c) {
                Ok((State::LineComment(Box::new(State::Start)), None))
            } else {
                Err(format!("Unexpected character at the top level: '{c}'"))
            }
        }
        State::PreName => {
            if c.is_whitespace() {
                Ok((State::PreName, None))
            } else if c == '"' {
                Ok((State::Name(String::new()), None))
            } else if c == '}' {
                if depth == 0 {
                    Err("Closing a nonexistent section at the top level".to_string())
                } else {
                    Ok((State::PreName, Some(Action::Close)))
                }
            } else if is_comment(c) {
                Ok((State::LineComment(Box::new(State::PreName)), None))
            } else {
                Err(format!("Unexpected character: '{c}'"))
            }
        }
        State::Name(mut name) => {
            if c == '"' {
                Ok((State::NameEscape(name), None))
            } else {
                name.push(c);
                Ok((State::Name(name), None))
            }
        }
        State::NameEscape(mut name) => {
            if c == '"' {
                name.push('"');
                Ok((State::Name(name), None))
            } else {
                transition(State::PostName(name), c, depth)
            }
        }
        State::PostName(name) => {
            if c.is_whitespace() {
                Ok((State::PostName(name), None))
            } else if c == ';' {
                if depth == 0 {
                    Err("Setting found in the top level".to_string())
                } else {
                    Ok((State::PreName, Some(Action::Setting(name))))
                }
            } else if c == '{' {
                Ok((State::PreName, Some(Action::Open(name))))
            } else if c == '}' {
                if depth == 0 {
                    Err("Closing a nonexistent section".to_string())
                } else {
                    Ok((State::PreName, Some(Action::SettingThenClose(name))))
                }
            } else if is_comment(c) {
                Ok((State::LineComment(Box::new(State::PostName(name))), None))
            } else {
                Err(format!("Unexpected character: '{c}'"))
            }
        }
        State::LineComment(prior) => {
            if c == '\n' {
                Ok((*prior, None))
            } else {
                Ok((State::LineComment(prior), None))
            }
        }
    }
}

pub struct ConfigParser {
    state: State,
    /// Names of the currently open sections, innermost last.
    stack: Vec<String>,
    line: usize,
    column: usize,
    position: usize,
}

impl ConfigParser {
    pub fn new() -> Self {
        ConfigParser {
            state: State::Start,
            stack: Vec::new(),
            line: 1,
            column: 1,
            position: 1,
        }
    }

    /// The location of the next character to be read.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// The 1-based absolute position of the next character to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn feed<H>(&mut self, c: char, handler: &mut H) -> Fallible<()>
    where
        H: ConfigHandler + ?Sized,
    {
        let here = self.location();
        let state = replace(&mut self.state, State::Start);
        let (next, action) =
            transition(state, c, self.stack.len()).map_err(|msg| FormatError::new(here, msg))?;
        self.state = next;
        if let Some(action) = action {
            self.apply(action, handler).map_err(|e| e.located(here))?;
        }
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Ok(())
    }

    pub fn feed_str<H>(&mut self, text: &str, handler: &mut H) -> Fallible<()>
    where
        H: ConfigHandler + ?Sized,
    {
        for c in text.chars() {
            self.feed(c, handler)?;
        }
        Ok(())
    }

    /// Declare the end of input. Fails unless every section was closed.
    pub fn finish(&self) -> Fallible<()> {
        if self.state != State::PreName || !self.stack.is_empty() {
            return Err(FormatError::new(self.location(), "Incomplete document").into());
        }
        Ok(())
    }

    fn apply<H>(&mut self, action: Action, handler: &mut H) -> Fallible<()>
    where
        H: ConfigHandler + ?Sized,
    {
        match action {
            Action::Open(name) => {
                let parent = self.stack.last().map(String::as_str);
                handler.section_begin(&name, parent)?;
                self.stack.push(name);
            }
            Action::Close => self.close(handler)?,
            Action::Setting(value) => self.setting(&value, handler)?,
            Action::SettingThenClose(value) => {
                self.setting(&value, handler)?;
                self.close(handler)?;
            }
        }
        Ok(())
    }

    fn setting<H>(&self, value: &str, handler: &mut H) -> Fallible<()>
    where
        H: ConfigHandler + ?Sized,
    {
        match self.stack.last() {
            Some(section) => handler.setting(value, section),
            None => Err(ErrorReport::new("setting outside of any section")),
        }
    }

    fn close<H>(&mut self, handler: &mut H) -> Fallible<()>
    where
        H: ConfigHandler + ?Sized,
    {
        match self.stack.pop() {
            Some(name) => handler.section_end(&name),
            None => Err(ErrorReport::new("closing a section that was never opened")),
        }
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a complete document.
pub fn parse_config<H>(text: &str, handler: &mut H) -> Fallible<()>
where
    H: ConfigHandler + ?Sized,
{
    let mut parser = ConfigParser::new();
    parser.feed_str(text, handler)?;
    parser.finish()
}

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

//! Incremental parser for the log grammar.
//!
//! One record per line, fields separated by colons:
//!
//! ```text
//! "1700000000":"3f2a...":"0"
//! "a"::"c"     # three fields, the middle one empty
//! ```

use std::mem::replace;
use std::mem::take;

use crate::error::Fallible;
use crate::error::FormatError;
use crate::error::Location;
use crate::logfmt::LogRecord;

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    /// At the start of a field.
    PreField,
    /// Inside a quoted field.
    Field(String),
    /// Just read a quote inside a field: either an escape or the end.
    FieldEscape(String),
    /// After a closed field, waiting for a colon or the end of the record.
    PostFieldPreColon,
    /// Inside a line comment.
    LineComment,
}

/// Bookkeeping a transition asks of the record being assembled.
#[derive(Debug, PartialEq)]
pub enum Marker {
    /// A quote opened a field.
    OpenQuote,
    /// A colon with no quoted text before it: an empty field.
    BareColon,
    /// A colon after a quoted field.
    Colon,
    /// A newline or comment ended the record.
    EndRecord,
}

#[derive(Debug, PartialEq)]
pub struct Step {
    pub state: State,
    /// A quoted field that was just closed.
    pub field: Option<String>,
    pub marker: Option<Marker>,
}

impl Step {
    fn to(state: State) -> Self {
        Step {
            state,
            field: None,
            marker: None,
        }
    }

    fn marked(state: State, marker: Marker) -> Self {
        Step {
            state,
            field: None,
            marker: Some(marker),
        }
    }
}

fn is_comment(c: char) -> bool {
    c == '#' || c == '@'
}

/// The transition function of the grammar.
pub fn transition(state: State, c: char) -> Result<Step, String> {
    match state {
        State::PreField => {
            if c == '\n' {
                Ok(Step::marked(State::PreField, Marker::EndRecord))
            } else if c.is_whitespace() {
                Ok(Step::to(State::PreField))
            } else if c == '"' {
                Ok(Step::marked(State::Field(String::new()), Marker::OpenQuote))
            } else if c == ':' {
                Ok(Step::marked(State::PreField, Marker::BareColon))
            } else if is_comment(c) {
                Ok(Step::marked(State::LineComment, Marker::EndRecord))
            } else {
                Err(format!("unexpected character: {c}"))
            }
        }
        State::Field(mut field) => {
            if c == '"' {
                Ok(Step::to(State::FieldEscape(field)))
            } else {
                field.push(c);
                Ok(Step::to(State::Field(field)))
            }
        }
        State::FieldEscape(mut field) => {
            if c == '"' {
                field.push('"');
                return Ok(Step::to(State::Field(field)));
            }
            let (state, marker) = if c == '\n' {
                (State::PreField, Some(Marker::EndRecord))
            } else if c.is_whitespace() {
                (State::PostFieldPreColon, None)
            } else if c == ':' {
                (State::PreField, Some(Marker::Colon))
            } else if is_comment(c) {
                (State::LineComment, Some(Marker::EndRecord))
            } else {
                return Err(format!("unexpected character: {c}"));
            };
            Ok(Step {
                state,
                field: Some(field),
                marker,
            })
        }
        State::PostFieldPreColon => {
            if c == '\n' {
                Ok(Step::marked(State::PreField, Marker::EndRecord))
            } else if c.is_whitespace() {
                Ok(Step::to(State::PostFieldPreColon))
            } else if c == ':' {
                Ok(Step::marked(State::PreField, Marker::Colon))
            } else if is_comment(c) {
                Ok(Step::marked(State::LineComment, Marker::EndRecord))
            } else {
                Err(format!("unexpected character: {c}"))
            }
        }
        State::LineComment => {
            if c == '\n' {
                Ok(Step::to(State::PreField))
            } else {
                Ok(Step::to(State::LineComment))
            }
        }
    }
}

pub struct LogParser {
    state: State,
    fields: Vec<String>,
    /// Whether the last token of the record was a colon, which implies one
    /// more (empty) field if the record ends now.
    colon_seen: bool,
    /// 1-based number of the record being parsed.
    record: usize,
    record_start: Option<Location>,
    line: usize,
    column: usize,
    position: usize,
}

impl LogParser {
    pub fn new() -> Self {
        LogParser {
            state: State::PreField,
            fields: Vec::new(),
            colon_seen: false,
            record: 1,
            record_start: None,
            line: 1,
            column: 1,
            position: 1,
        }
    }

    /// The location of the next character to be read.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column).in_record(self.record)
    }

    /// The 1-based absolute position of the next character to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The 1-based number of the record being parsed.
    pub fn record_number(&self) -> usize {
        self.record
    }

    pub fn feed<F>(&mut self, c: char, handler: &mut F) -> Fallible<()>
    where
        F: FnMut(LogRecord) -> Fallible<()>,
    {
        let here = self.location();
        if self.record_start.is_none()
            && self.state == State::PreField
            && !c.is_whitespace()
            && !is_comment(c)
        {
            self.record_start = Some(here);
        }
        let state = replace(&mut self.state, State::PreField);
        let step = transition(state, c).map_err(|msg| FormatError::new(here, msg))?;
        self.state = step.state;
        if let Some(field) = step.field {
            self.fields.push(field);
        }
        match step.marker {
            Some(Marker::OpenQuote) => self.colon_seen = false,
            Some(Marker::BareColon) => {
                self.fields.push(String::new());
                self.colon_seen = true;
            }
            Some(Marker::Colon) => self.colon_seen = true,
            Some(Marker::EndRecord) => self.end_record(handler)?,
            None => {}
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

    pub fn feed_str<F>(&mut self, text: &str, handler: &mut F) -> Fallible<()>
    where
        F: FnMut(LogRecord) -> Fallible<()>,
    {
        for c in text.chars() {
            self.feed(c, handler)?;
        }
        Ok(())
    }

    /// Declare the end of input, emitting the final record if the last line
    /// has no newline. Input may only stop between fields or inside a
    /// comment, so a last field must be followed by whitespace or a newline.
    pub fn finish<F>(&mut self, handler: &mut F) -> Fallible<()>
    where
        F: FnMut(LogRecord) -> Fallible<()>,
    {
        match replace(&mut self.state, State::PreField) {
            State::PreField | State::PostFieldPreColon | State::LineComment => {}
            State::Field(_) | State::FieldEscape(_) => {
                return Err(
                    FormatError::new(self.location(), "finished in the middle of a field").into(),
                );
            }
        }
        self.end_record(handler)
    }

    fn end_record<F>(&mut self, handler: &mut F) -> Fallible<()>
    where
        F: FnMut(LogRecord) -> Fallible<()>,
    {
        if self.colon_seen {
            self.fields.push(String::new());
            self.colon_seen = false;
        }
        let start = self.record_start.take();
        if self.fields.is_empty() {
            return Ok(());
        }
        let at = start.unwrap_or_else(|| self.location());
        let record = LogRecord::new(take(&mut self.fields));
        handler(record).map_err(|e| e.located(at))?;
        self.record += 1;
        Ok(())
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a complete log.
pub fn parse_log<F>(text: &str, handler: &mut F) -> Fallible<()>
where
    F: FnMut(LogRecord) -> Fallible<()>,
{
    let mut parser = LogParser::new();
    parser.feed_str(text, handler)?;
    parser.finish(handler)
}

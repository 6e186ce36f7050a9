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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// A position in a character stream. Lines and columns are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    /// The 1-based number of the log record being parsed, if any.
    pub record: Option<usize>,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location {
            line,
            column,
            record: None,
        }
    }

    pub fn in_record(self, record: usize) -> Self {
        Location {
            record: Some(record),
            ..self
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.record {
            Some(record) => write!(f, "{}:{} (record {})", self.line, self.column, record),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// A grammar violation found while parsing.
#[derive(Debug, PartialEq)]
pub struct FormatError {
    pub location: Location,
    pub message: String,
}

impl FormatError {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        FormatError {
            location,
            message: message.into(),
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl Error for FormatError {}

/// Well-formed input that makes no sense: duplicate section names, bad
/// history records, invalid deck parameters.
#[derive(Debug, PartialEq)]
pub struct DomainError {
    pub location: Option<Location>,
    pub message: String,
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for DomainError {}

#[derive(Debug, PartialEq)]
pub enum ErrorReport {
    Format(FormatError),
    Domain(DomainError),
    Io(String),
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport::Domain(DomainError {
            location: None,
            message: msg.into(),
        })
    }

    pub fn at(location: Location, msg: impl Into<String>) -> Self {
        ErrorReport::Domain(DomainError {
            location: Some(location),
            message: msg.into(),
        })
    }

    /// Fills in the location of a domain error that was raised without one.
    pub fn located(self, location: Location) -> Self {
        match self {
            ErrorReport::Domain(DomainError {
                location: None,
                message,
            }) => ErrorReport::at(location, message),
            other => other,
        }
    }

    /// Appends the name of the file the error was found in to its message.
    pub fn in_file(self, file: impl Display) -> Self {
        match self {
            ErrorReport::Format(e) => {
                ErrorReport::Format(FormatError::new(e.location, format!("{} (in {file})", e.message)))
            }
            ErrorReport::Domain(e) => ErrorReport::Domain(DomainError {
                location: e.location,
                message: format!("{} (in {file})", e.message),
            }),
            ErrorReport::Io(msg) => ErrorReport::Io(format!("{msg} (in {file})")),
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, ErrorReport::Format(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ErrorReport::Domain(_))
    }
}

impl From<FormatError> for ErrorReport {
    fn from(value: FormatError) -> Self {
        ErrorReport::Format(value)
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::Io(format!("I/O error: {value}"))
    }
}

impl From<std::fmt::Error> for ErrorReport {
    fn from(value: std::fmt::Error) -> Self {
        ErrorReport::Io(format!("formatting error: {value:#?}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::Io(format!("JSON error: {value:#?}"))
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ErrorReport::Format(e) => write!(f, "format error: {e}"),
            ErrorReport::Domain(e) => write!(f, "error: {e}"),
            ErrorReport::Io(msg) => write!(f, "error: {msg}"),
        }
    }
}

impl Error for ErrorReport {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ErrorReport::Format(e) => Some(e),
            ErrorReport::Domain(e) => Some(e),
            ErrorReport::Io(_) => None,
        }
    }
}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}

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

//! The flat log format: parser, record type and writer.

pub mod parser;
pub mod writer;

pub use parser::LogParser;
pub use parser::parse_log;
pub use writer::LogWriter;

/// One parsed log line: an ordered sequence of fields, any of which may be
/// empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    fields: Vec<String>,
}

impl LogRecord {
    pub fn new(fields: Vec<String>) -> Self {
        LogRecord { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

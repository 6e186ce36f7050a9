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

use std::io::Error;
use std::io::ErrorKind;
use std::io::Write;

/// Writes log records, one per line.
pub struct LogWriter<W: Write> {
    out: W,
}

impl<W: Write> LogWriter<W> {
    pub fn new(out: W) -> Self {
        LogWriter { out }
    }

    pub fn write<S: AsRef<str>>(&mut self, fields: &[S]) -> std::io::Result<()> {
        match fields {
            [] => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "a log record needs at least one field",
                ));
            }
            // A lone empty field must be quoted, or the line would read as
            // blank and vanish.
            [only] if only.as_ref().is_empty() => self.out.write_all(b"\"\"")?,
            _ => {
                let last = fields.len() - 1;
                for (index, field) in fields.iter().enumerate() {
                    self.field(field.as_ref(), index == last)?;
                }
            }
        }
        self.out.write_all(b"\n")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn field(&mut self, field: &str, is_last: bool) -> std::io::Result<()> {
        if field.is_empty() {
            // A trailing empty field is implied by the preceding colon.
            if !is_last {
                self.out.write_all(b":")?;
            }
            return Ok(());
        }
        self.out.write_all(b"\"")?;
        self.out.write_all(field.replace('"', "\"\"").as_bytes())?;
        self.out.write_all(b"\"")?;
        if !is_last {
            self.out.write_all(b":")?;
        }
        Ok(())
    }
}

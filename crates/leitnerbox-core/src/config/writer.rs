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

use std::fmt::Write;

use crate::config::tree::Child;
use crate::config::tree::Section;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Style {
    /// No whitespace at all.
    Compact,
    /// One child per line, indented by `tab_width` spaces per level.
    Pretty { tab_width: usize },
}

/// Serialize a tree so that parsing the output rebuilds the same tree.
pub fn write_config<W: Write>(out: &mut W, root: &Section, style: Style) -> std::fmt::Result {
    let mut writer = ConfigWriter { out, style };
    writer.section(root, 0)
}

pub fn config_to_string(root: &Section, style: Style) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_config(&mut out, root, style);
    out
}

struct ConfigWriter<'a, W: Write> {
    out: &'a mut W,
    style: Style,
}

impl<W: Write> ConfigWriter<'_, W> {
    fn pretty(&self) -> bool {
        matches!(self.style, Style::Pretty { .. })
    }

    fn text(&mut self, compact: &str, pretty: &str) -> std::fmt::Result {
        let text = if self.pretty() { pretty } else { compact };
        self.out.write_str(text)
    }

    fn indent(&mut self, depth: usize) -> std::fmt::Result {
        if let Style::Pretty { tab_width } = self.style {
            for _ in 0..depth * tab_width {
                self.out.write_char(' ')?;
            }
        }
        Ok(())
    }

    fn end_line(&mut self) -> std::fmt::Result {
        self.text("", "\n")
    }

    fn quoted(&mut self, text: &str) -> std::fmt::Result {
        self.out.write_char('"')?;
        for c in text.chars() {
            if c == '"' {
                self.out.write_str("\"\"")?;
            } else {
                self.out.write_char(c)?;
            }
        }
        self.out.write_char('"')
    }

    fn section(&mut self, section: &Section, depth: usize) -> std::fmt::Result {
        self.indent(depth)?;
        self.quoted(section.name())?;
        match section.children() {
            [] => {
                self.text("{}", " {}")?;
                self.end_line()
            }
            [Child::Setting(value)] => {
                self.text("{", " { ")?;
                self.quoted(value)?;
                self.text("}", " }")?;
                self.end_line()
            }
            children => {
                self.text("{", " {")?;
                self.end_line()?;
                let last = children.len() - 1;
                for (index, child) in children.iter().enumerate() {
                    match child {
                        Child::Setting(value) => {
                            self.indent(depth + 1)?;
                            self.quoted(value)?;
                            if index != last {
                                self.out.write_char(';')?;
                            }
                            self.end_line()?;
                        }
                        Child::Section(subsection) => self.section(subsection, depth + 1)?,
                    }
                }
                self.indent(depth)?;
                self.out.write_char('}')?;
                self.end_line()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tree::parse_tree;
    use crate::error::Fallible;

    const PRETTY: Style = Style::Pretty { tab_width: 2 };

    fn sample_tree() -> Fallible<Section> {
        let mut root = Section::new("root");
        root.add_setting("first");
        let mut attribute = Section::new("attr");
        attribute.add_setting("value");
        root.add_section(attribute)?;
        let mut nested = Section::new("nested");
        nested.add_section(Section::new("empty"))?;
        nested.add_setting("a");
        nested.add_setting("b");
        root.add_section(nested)?;
        root.add_setting("last");
        Ok(root)
    }

    #[test]
    fn test_compact_output() -> Fallible<()> {
        let out = config_to_string(&sample_tree()?, Style::Compact);
        assert_eq!(
            out,
            r#""root"{"first";"attr"{"value"}"nested"{"empty"{}"a";"b"}"last"}"#
        );
        Ok(())
    }

    #[test]
    fn test_pretty_output() -> Fallible<()> {
        let out = config_to_string(&sample_tree()?, PRETTY);
        let expected = concat!(
            "\"root\" {\n",
            "  \"first\";\n",
            "  \"attr\" { \"value\" }\n",
            "  \"nested\" {\n",
            "    \"empty\" {}\n",
            "    \"a\";\n",
            "    \"b\"\n",
            "  }\n",
            "  \"last\"\n",
            "}\n",
        );
        assert_eq!(out, expected);
        Ok(())
    }

    #[test]
    fn test_tab_width() -> Fallible<()> {
        let mut root = Section::new("r");
        root.add_setting("x");
        root.add_setting("y");
        let out = config_to_string(&root, Style::Pretty { tab_width: 4 });
        assert_eq!(out, "\"r\" {\n    \"x\";\n    \"y\"\n}\n");
        Ok(())
    }

    #[test]
    fn test_round_trip_both_styles() -> Fallible<()> {
        let tree = sample_tree()?;
        for style in [Style::Compact, PRETTY, Style::Pretty { tab_width: 0 }] {
            let text = config_to_string(&tree, style);
            assert_eq!(parse_tree(&text)?, tree, "style: {style:?}");
        }
        Ok(())
    }

    #[test]
    fn test_quotes_round_trip() -> Fallible<()> {
        let mut root = Section::new("say \"hello\"");
        root.add_setting("\"");
        root.add_setting("a \"\" b # not a comment");
        let mut inner = Section::new("\"\"");
        inner.add_setting("");
        root.add_section(inner)?;
        for style in [Style::Compact, PRETTY] {
            let text = config_to_string(&root, style);
            assert_eq!(parse_tree(&text)?, root);
        }
        assert!(config_to_string(&root, Style::Compact).starts_with("\"say \"\"hello\"\"\"{"));
        Ok(())
    }

    #[test]
    fn test_empty_root() -> Fallible<()> {
        let root = Section::new("r");
        assert_eq!(config_to_string(&root, Style::Compact), "\"r\"{}");
        assert_eq!(parse_tree(&config_to_string(&root, PRETTY))?, root);
        Ok(())
    }
}

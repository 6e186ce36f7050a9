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

use crate::config::parser::ConfigHandler;
use crate::config::parser::parse_config;
use crate::error::Fallible;
use crate::error::fail;

/// A named node of a configuration tree. Children keep their document
/// order; sibling sections have unique names.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    name: String,
    children: Vec<Child>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Setting(String),
    Section(Section),
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Append a subsection. Fails if a subsection with the same name exists.
    pub fn add_section(&mut self, section: Section) -> Fallible<()> {
        if self.has_section(section.name()) {
            return fail(format!("duplicate section name: {}", section.name()));
        }
        self.children.push(Child::Section(section));
        Ok(())
    }

    pub fn add_setting(&mut self, setting: impl Into<String>) {
        self.children.push(Child::Setting(setting.into()));
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections().find(|s| s.name() == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(|child| match child {
            Child::Section(section) => Some(section),
            Child::Setting(_) => None,
        })
    }

    pub fn settings(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|child| match child {
            Child::Setting(setting) => Some(setting.as_str()),
            Child::Section(_) => None,
        })
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_sections(&self) -> bool {
        self.sections().next().is_some()
    }

    pub fn has_settings(&self) -> bool {
        self.settings().next().is_some()
    }

    /// An attribute is a section holding exactly one setting and nothing else.
    pub fn is_attribute(&self) -> bool {
        matches!(self.children.as_slice(), [Child::Setting(_)])
    }

    /// The value of an attribute.
    pub fn value(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Child::Setting(value)] => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Builds a [`Section`] tree from parser events.
#[derive(Default)]
pub struct TreeBuilder {
    root: Option<Section>,
    /// Sections opened but not yet closed, innermost last.
    stack: Vec<Section>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree.
    pub fn into_root(self) -> Fallible<Section> {
        match self.root {
            Some(root) if self.stack.is_empty() => Ok(root),
            _ => fail("incomplete configuration tree"),
        }
    }
}

impl ConfigHandler for TreeBuilder {
    fn section_begin(&mut self, name: &str, parent: Option<&str>) -> Fallible<()> {
        match (parent, self.stack.last()) {
            (None, _) => {
                if self.root.is_some() {
                    return fail(format!("second top-level section: {name}"));
                }
            }
            (Some(_), Some(parent)) => {
                // Earlier siblings are already attached, so this catches
                // every duplicate.
                if parent.has_section(name) {
                    return fail(format!("duplicate section name: {name}"));
                }
            }
            (Some(parent), None) => {
                return fail(format!("section {name} opened inside unknown section {parent}"));
            }
        }
        self.stack.push(Section::new(name));
        Ok(())
    }

    fn section_end(&mut self, name: &str) -> Fallible<()> {
        let section = match self.stack.pop() {
            Some(section) => section,
            None => return fail(format!("closing unknown section: {name}")),
        };
        match self.stack.last_mut() {
            Some(parent) => parent.add_section(section),
            None => {
                self.root = Some(section);
                Ok(())
            }
        }
    }

    fn setting(&mut self, value: &str, section: &str) -> Fallible<()> {
        match self.stack.last_mut() {
            Some(current) => {
                current.add_setting(value);
                Ok(())
            }
            None => fail(format!("setting for unknown section: {section}")),
        }
    }
}

/// Parse a complete document into a tree.
pub fn parse_tree(text: &str) -> Fallible<Section> {
    let mut builder = TreeBuilder::new();
    parse_config(text, &mut builder)?;
    builder.into_root()
}

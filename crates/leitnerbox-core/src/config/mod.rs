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

//! The hierarchical configuration format: parser, tree and writer.

pub mod parser;
pub mod tree;
pub mod writer;

pub use parser::ConfigEvent;
pub use parser::ConfigHandler;
pub use parser::ConfigParser;
pub use parser::parse_config;
pub use tree::Child;
pub use tree::Section;
pub use tree::TreeBuilder;
pub use tree::parse_tree;
pub use writer::Style;
pub use writer::config_to_string;
pub use writer::write_config;

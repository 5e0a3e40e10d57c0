//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Grammar files and analyze-table reports for `llkit`.
//!
//! A `.llg` file declares terminals and lists productions, one per line:
//!
//! ```text
//! -- comments run to the end of the line
//! %term plus "+" "+"
//! %term num "number" "0-9"
//! %start E
//!
//! E -> E plus num {$.v = add($0.v, $2.text)}
//! E -> num {$.v = int($0.text)}
//! L -> %eps
//! ```
//!
//! `%term` takes the terminal's name, its display name for diagnostics and a
//! mini-pattern describing its first character. Lower-case identifiers are
//! terminals, capitalized ones nonterminals. Actions in braces follow the
//! symbol after which they run; several actions in one block are separated
//! by `;`.
//!
//! [`load`] turns the text into a [`llkit::Grammar`]; [`generate`] converts a
//! grammar file and writes its productions, FIRST/FOLLOW sets and analyze
//! table, as the `llgen` binary does.

mod generate;
mod lexer;
mod parser;

pub use generate::{generate, load, load_file, write_report};

//! semhl-syntax: the syntax-tree side of identifier coloring.
//!
//! The engine never touches tree-sitter directly; it talks to the
//! [`IdentifierSource`] and [`ParserFactory`] traits defined here. This
//! crate also provides the production implementation:
//!
//! - [`TsIdentifierSource`]: a tree-sitter parser plus the compiled
//!   identifier query for its language, with incremental reparsing.
//!
//! - [`LanguageTable`]: maps filetype names to grammars, caching the
//!   compiled query per language (including compile failures, so a
//!   broken query disables the language for the session).
//!
//! - [`ByteChange`] / [`TextEdit`]: translation from the host's
//!   delta-style byte-change callbacks to tree-sitter input edits.
//!
//! # Example
//!
//! ```
//! use semhl_syntax::{IdentifierSource, LanguageTable, ParserFactory};
//!
//! let mut table = LanguageTable::new();
//! let mut source = table.parser_for("rust").unwrap();
//! let text = "fn main() { let count = 0; }";
//! source.parse(text).unwrap();
//! let hits = source.identifiers_in(text, 0..1);
//! assert!(hits.iter().any(|h| h.text == "count"));
//! ```

mod edit;
mod error;
mod languages;
mod source;

pub use edit::{delete_change, insert_change, position_to_byte, ByteChange, TextEdit};
pub use error::{ParseError, ParserError};
pub use languages::LanguageTable;
pub use source::{IdentifierHit, IdentifierSource, NodeRange, ParserFactory, TsIdentifierSource};

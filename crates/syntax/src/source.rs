//! Identifier extraction from a syntax tree.
//!
//! The engine only needs two things from a parser: keep a tree in sync
//! with the buffer, and list the identifier nodes inside a row range.
//! [`IdentifierSource`] captures that contract; [`TsIdentifierSource`]
//! implements it over a tree-sitter parser with a per-language
//! identifier query.

use std::ops::Range;
use std::sync::Arc;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Parser, Point, Query, QueryCursor, Tree};

use crate::edit::TextEdit;
use crate::error::{ParseError, ParserError};

/// The (row, col) extent of an identifier node. Columns count bytes;
/// the end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

/// One identifier occurrence: its surface text and where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierHit {
    pub text: String,
    pub range: NodeRange,
}

/// A live syntax-tree view of one buffer.
pub trait IdentifierSource {
    /// Folds a buffer edit into the tree ahead of the next parse.
    /// Sources that re-derive everything from the text may ignore it.
    fn record_edit(&mut self, _edit: &TextEdit) {}

    /// Brings the tree up to date with `text`.
    fn parse(&mut self, text: &str) -> Result<(), ParseError>;

    /// Identifier occurrences whose nodes intersect `rows` (end
    /// exclusive). Requires a prior successful [`parse`](Self::parse).
    fn identifiers_in(&self, text: &str, rows: Range<usize>) -> Vec<IdentifierHit>;

    /// Name of the language this source parses.
    fn language(&self) -> &str;
}

/// Hands out parsers per filetype.
pub trait ParserFactory {
    type Parser: IdentifierSource;

    fn parser_for(&mut self, filetype: &str) -> Result<Self::Parser, ParserError>;
}

/// Tree-sitter implementation of [`IdentifierSource`].
///
/// Owns the parser, the current tree, and the compiled identifier query
/// for its language. Parses are incremental: each successful parse seeds
/// the next, and [`record_edit`](IdentifierSource::record_edit) keeps
/// the old tree's coordinates valid between parses.
pub struct TsIdentifierSource {
    parser: Parser,
    tree: Option<Tree>,
    query: Arc<Query>,
    language: String,
}

impl TsIdentifierSource {
    pub(crate) fn new(parser: Parser, query: Arc<Query>, language: String) -> Self {
        Self {
            parser,
            tree: None,
            query,
            language,
        }
    }

    /// Builds a source directly from a grammar and query source, outside
    /// any language table.
    pub fn from_language(
        language: &tree_sitter::Language,
        query_source: &str,
        name: &str,
    ) -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|source| ParserError::Language {
                language: name.to_owned(),
                source,
            })?;
        let query = Query::new(language, query_source).map_err(|err| ParserError::QueryCompile {
            language: name.to_owned(),
            message: err.to_string(),
        })?;
        Ok(Self::new(parser, Arc::new(query), name.to_owned()))
    }

    /// Whether a tree is available for querying.
    pub fn has_tree(&self) -> bool {
        self.tree.is_some()
    }
}

impl IdentifierSource for TsIdentifierSource {
    fn record_edit(&mut self, edit: &TextEdit) {
        if let Some(tree) = &mut self.tree {
            tree.edit(&edit.to_input_edit());
        }
    }

    fn parse(&mut self, text: &str) -> Result<(), ParseError> {
        let tree = self
            .parser
            .parse(text, self.tree.as_ref())
            .ok_or(ParseError::NoTree)?;
        self.tree = Some(tree);
        Ok(())
    }

    fn identifiers_in(&self, text: &str, rows: Range<usize>) -> Vec<IdentifierHit> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };

        let mut cursor = QueryCursor::new();
        cursor.set_point_range(
            Point {
                row: rows.start,
                column: 0,
            }..Point {
                row: rows.end,
                column: 0,
            },
        );

        let source_bytes = text.as_bytes();
        let mut hits = Vec::new();
        let mut captures = cursor.captures(&self.query, tree.root_node(), source_bytes);
        while let Some((mat, capture_idx)) = captures.next() {
            let node = mat.captures[*capture_idx].node;
            let Ok(node_text) = node.utf8_text(source_bytes) else {
                continue;
            };
            let start = node.start_position();
            let end = node.end_position();
            hits.push(IdentifierHit {
                text: node_text.to_owned(),
                range: NodeRange {
                    start_row: start.row,
                    start_col: start.column,
                    end_row: end.row,
                    end_col: end.column,
                },
            });
        }
        hits
    }

    fn language(&self) -> &str {
        &self.language
    }
}

//! Language table mapping filetypes to grammars and identifier queries.
//!
//! Each language pairs a tree-sitter grammar with the query that captures
//! its identifier-like nodes. Compiled queries are cached per language,
//! and a query that fails to compile stays failed for the session so
//! repeated attach attempts don't recompile it.

use std::collections::HashMap;
use std::sync::Arc;

use tree_sitter::{Language, Parser, Query};

use crate::error::ParserError;
use crate::source::{ParserFactory, TsIdentifierSource};

/// Identifier query for Rust: plain identifiers plus type and field
/// names, so `Widget` and `frame_count` color like `widget` does.
const RUST_IDENTIFIERS: &str = "[(identifier) (type_identifier) (field_identifier)] @id";

/// Identifier query for Python; attribute names are identifier nodes
/// already.
const PYTHON_IDENTIFIERS: &str = "(identifier) @id";

/// Identifier query for JavaScript: property names are a distinct node
/// type.
const JAVASCRIPT_IDENTIFIERS: &str = "[(identifier) (property_identifier)] @id";

struct LanguageSpec {
    language: Language,
    identifier_query: &'static str,
}

enum QuerySlot {
    Ready(Arc<Query>),
    Failed(String),
}

/// Registry of supported filetypes.
pub struct LanguageTable {
    specs: HashMap<&'static str, LanguageSpec>,
    queries: HashMap<&'static str, QuerySlot>,
}

impl LanguageTable {
    /// Creates an empty table; useful when the host registers its own
    /// grammar set.
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
            queries: HashMap::new(),
        }
    }

    /// Creates a table with the built-in languages.
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.register("rust", tree_sitter_rust::LANGUAGE.into(), RUST_IDENTIFIERS);
        table.register(
            "python",
            tree_sitter_python::LANGUAGE.into(),
            PYTHON_IDENTIFIERS,
        );
        table.register(
            "javascript",
            tree_sitter_javascript::LANGUAGE.into(),
            JAVASCRIPT_IDENTIFIERS,
        );
        table
    }

    /// Registers (or replaces) a language under a filetype name.
    pub fn register(&mut self, filetype: &'static str, language: Language, identifier_query: &'static str) {
        self.queries.remove(filetype);
        self.specs.insert(
            filetype,
            LanguageSpec {
                language,
                identifier_query,
            },
        );
    }

    /// Whether a filetype has a registered language.
    pub fn supports(&self, filetype: &str) -> bool {
        self.specs.contains_key(filetype)
    }

    fn compiled_query(&mut self, filetype: &str) -> Result<Arc<Query>, ParserError> {
        let (key, spec) = self
            .specs
            .get_key_value(filetype)
            .ok_or_else(|| ParserError::UnsupportedFiletype(filetype.to_owned()))?;

        let slot = self.queries.entry(*key).or_insert_with(|| {
            match Query::new(&spec.language, spec.identifier_query) {
                Ok(query) => QuerySlot::Ready(Arc::new(query)),
                Err(err) => QuerySlot::Failed(err.to_string()),
            }
        });

        match slot {
            QuerySlot::Ready(query) => Ok(Arc::clone(query)),
            QuerySlot::Failed(message) => Err(ParserError::QueryCompile {
                language: filetype.to_owned(),
                message: message.clone(),
            }),
        }
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory for LanguageTable {
    type Parser = TsIdentifierSource;

    fn parser_for(&mut self, filetype: &str) -> Result<TsIdentifierSource, ParserError> {
        let query = self.compiled_query(filetype)?;
        let spec = &self.specs[filetype];
        let mut parser = Parser::new();
        parser
            .set_language(&spec.language)
            .map_err(|source| ParserError::Language {
                language: filetype.to_owned(),
                source,
            })?;
        Ok(TsIdentifierSource::new(parser, query, filetype.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IdentifierSource;

    #[test]
    fn built_in_languages_are_supported() {
        let table = LanguageTable::new();
        assert!(table.supports("rust"));
        assert!(table.supports("python"));
        assert!(table.supports("javascript"));
        assert!(!table.supports("cobol"));
    }

    #[test]
    fn unknown_filetype_is_an_error() {
        let mut table = LanguageTable::new();
        assert!(matches!(
            table.parser_for("cobol"),
            Err(ParserError::UnsupportedFiletype(_))
        ));
    }

    #[test]
    fn each_language_parses_its_own_source() {
        let cases = [
            ("rust", "fn f() { let total = 0; }", "total"),
            ("python", "total = compute()", "total"),
            ("javascript", "const total = obj.field;", "field"),
        ];
        let mut table = LanguageTable::new();
        for (filetype, text, expected) in cases {
            let mut source = table.parser_for(filetype).unwrap();
            source.parse(text).unwrap();
            let hits = source.identifiers_in(text, 0..1);
            assert!(
                hits.iter().any(|h| h.text == expected),
                "{filetype}: expected '{expected}' in {hits:?}"
            );
        }
    }

    #[test]
    fn bad_query_fails_and_stays_failed() {
        let mut table = LanguageTable::empty();
        table.register(
            "broken",
            tree_sitter_rust::LANGUAGE.into(),
            "(definitely_not_a_node) @id",
        );
        for _ in 0..2 {
            assert!(matches!(
                table.parser_for("broken"),
                Err(ParserError::QueryCompile { .. })
            ));
        }
    }

    #[test]
    fn query_is_compiled_once_and_shared() {
        let mut table = LanguageTable::new();
        let a = table.parser_for("rust").unwrap();
        let b = table.parser_for("rust").unwrap();
        // Both parsers see the same language.
        assert_eq!(a.language(), b.language());
    }
}

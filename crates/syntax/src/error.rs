//! Error types at the parser boundary.

use thiserror::Error;

/// Errors acquiring a parser for a buffer.
#[derive(Debug, Error)]
pub enum ParserError {
    /// No language is registered under the requested filetype.
    #[error("no parser registered for filetype '{0}'")]
    UnsupportedFiletype(String),

    /// The grammar could not be loaded into a parser.
    #[error("language setup failed for '{language}': {source}")]
    Language {
        language: String,
        source: tree_sitter::LanguageError,
    },

    /// The identifier query did not compile for this grammar. The
    /// failure is cached, so the language stays disabled for the
    /// session.
    #[error("identifier query failed to compile for '{language}': {message}")]
    QueryCompile { language: String, message: String },
}

/// Errors produced by a parse pass.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The parser returned no tree (cancelled or misconfigured).
    #[error("parser produced no syntax tree")]
    NoTree,
}

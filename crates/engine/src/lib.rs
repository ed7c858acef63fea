//! semhl-engine: incremental identifier highlight maintenance.
//!
//! The engine watches a structured syntax-tree view of a buffer and
//! keeps a set of colored spans in step with it through debounced,
//! range-batched processing. It is polymorphic over the host
//! capabilities it needs:
//!
//! - a parser factory and identifier query ([`semhl_syntax`] traits),
//! - a span store with named styles ([`SpanStore`]),
//! - buffer text access ([`TextSource`]),
//! - color cache storage ([`semhl_cache::CacheStore`]),
//! - a random source for the color generator.
//!
//! Tests inject in-memory fakes for each; hosts wire their real
//! equivalents. All state lives in one [`Engine`] value and all calls
//! run on the caller's thread: the only asynchrony is the pair of
//! debounce windows (50 ms flush, 5 s cache save), modeled as deadline
//! maps the host pumps via [`Engine::poll`].

mod batch;
mod engine;
mod span;

pub use batch::{merge_ranges, FlushTimers, BYTE_CHANGE_DELAY};
pub use engine::{
    Engine, EngineConfig, TextSource, DEFAULT_MAX_FILE_SIZE, DisablePredicate,
};
pub use span::{
    BufferId, MemorySpanStore, Position, SpanRange, SpanStore, StoredSpan, SPAN_PRIORITY,
};

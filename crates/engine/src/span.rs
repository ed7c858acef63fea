//! Buffer positions, span ranges, and the span store.
//!
//! Spans are the colored regions the engine maintains on a buffer. The
//! store itself is a host capability: a real editor backs it with its
//! extmark equivalent, while [`MemorySpanStore`] is the in-process
//! implementation used standalone and in tests. The engine only ever
//! deletes by range and inserts; it never addresses individual spans.

use std::collections::HashMap;

use semhl_color::Rgb;
use semhl_syntax::NodeRange;

/// Identifies a buffer within the host.
pub type BufferId = u64;

/// Insert priority for identifier spans; sits above plain syntax
/// highlighting so identifier colors win.
pub const SPAN_PRIORITY: u16 = 130;

/// Position in a buffer as 0-based (row, col), columns in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.row.cmp(&other.row) {
            std::cmp::Ordering::Equal => self.col.cmp(&other.col),
            ord => ord,
        }
    }
}

/// A half-open region of a buffer: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRange {
    pub start: Position,
    pub end: Position,
}

impl SpanRange {
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start: Position::new(start_row, start_col),
            end: Position::new(end_row, end_col),
        }
    }

    /// Half-open overlap: the ranges share at least one position.
    pub fn overlaps(&self, other: &SpanRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<NodeRange> for SpanRange {
    fn from(range: NodeRange) -> Self {
        SpanRange::new(range.start_row, range.start_col, range.end_row, range.end_col)
    }
}

/// The host capability that owns colored spans and named styles.
///
/// Implementations must give inserted spans right-gravity edges,
/// invalidate them when their covered text is deleted, and stack them at
/// [`SPAN_PRIORITY`]. `register_style` is idempotent per key.
pub trait SpanStore {
    /// Ensures a foreground style named `key` with the given color
    /// exists.
    fn register_style(&mut self, key: &str, color: Rgb);

    /// Inserts a span carrying `style` over `range`.
    fn add_span(&mut self, buffer: BufferId, range: SpanRange, style: &str);

    /// Removes every span overlapping `range`.
    fn delete_spans_in(&mut self, buffer: BufferId, range: SpanRange);

    /// Removes every span in the buffer.
    fn clear_buffer(&mut self, buffer: BufferId);

    /// Number of spans currently on the buffer.
    fn span_count(&self, buffer: BufferId) -> usize;
}

/// A span as recorded by [`MemorySpanStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSpan {
    pub range: SpanRange,
    pub style: String,
    pub priority: u16,
    pub right_gravity: bool,
    pub invalidate: bool,
}

/// In-memory span store.
///
/// Does not track text motion; hosts whose marks move with edits remain
/// authoritative for live positions. Deletion-by-range and the
/// delete-then-insert flush discipline keep the recorded spans
/// non-overlapping.
#[derive(Debug, Default)]
pub struct MemorySpanStore {
    spans: HashMap<BufferId, Vec<StoredSpan>>,
    styles: HashMap<String, Rgb>,
}

impl MemorySpanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The spans currently on a buffer, in insertion order.
    pub fn spans_in(&self, buffer: BufferId) -> &[StoredSpan] {
        self.spans.get(&buffer).map_or(&[], Vec::as_slice)
    }

    /// Foreground color of a registered style.
    pub fn style_color(&self, key: &str) -> Option<Rgb> {
        self.styles.get(key).copied()
    }

    /// The span covering `position`, if any.
    pub fn span_at(&self, buffer: BufferId, position: Position) -> Option<&StoredSpan> {
        self.spans_in(buffer)
            .iter()
            .find(|span| span.range.start <= position && position < span.range.end)
    }
}

impl SpanStore for MemorySpanStore {
    fn register_style(&mut self, key: &str, color: Rgb) {
        self.styles.entry(key.to_owned()).or_insert(color);
    }

    fn add_span(&mut self, buffer: BufferId, range: SpanRange, style: &str) {
        self.spans.entry(buffer).or_default().push(StoredSpan {
            range,
            style: style.to_owned(),
            priority: SPAN_PRIORITY,
            right_gravity: true,
            invalidate: true,
        });
    }

    fn delete_spans_in(&mut self, buffer: BufferId, range: SpanRange) {
        if let Some(spans) = self.spans.get_mut(&buffer) {
            spans.retain(|span| !span.range.overlaps(&range));
        }
    }

    fn clear_buffer(&mut self, buffer: BufferId) {
        self.spans.remove(&buffer);
    }

    fn span_count(&self, buffer: BufferId) -> usize {
        self.spans.get(&buffer).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Position ordering ====================

    #[test]
    fn positions_order_by_row_then_col() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(1, 2) < Position::new(1, 3));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    // ==================== Overlap ====================

    #[test]
    fn overlapping_ranges_overlap() {
        let a = SpanRange::new(0, 0, 0, 5);
        let b = SpanRange::new(0, 4, 0, 9);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = SpanRange::new(0, 0, 0, 5);
        let b = SpanRange::new(0, 5, 0, 9);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn nested_range_overlaps() {
        let outer = SpanRange::new(0, 0, 2, 0);
        let inner = SpanRange::new(1, 3, 1, 7);
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn multi_row_ranges_compare_by_position() {
        let a = SpanRange::new(0, 8, 1, 2);
        let b = SpanRange::new(1, 0, 1, 1);
        assert!(a.overlaps(&b));
        let c = SpanRange::new(1, 2, 1, 5);
        assert!(!a.overlaps(&c));
    }

    // ==================== MemorySpanStore ====================

    #[test]
    fn add_and_count_spans() {
        let mut store = MemorySpanStore::new();
        store.add_span(1, SpanRange::new(0, 0, 0, 3), "sfg_aabbcc");
        store.add_span(1, SpanRange::new(0, 4, 0, 7), "sfg_aabbcc");
        store.add_span(2, SpanRange::new(0, 0, 0, 3), "sfg_aabbcc");
        assert_eq!(store.span_count(1), 2);
        assert_eq!(store.span_count(2), 1);
        assert_eq!(store.span_count(3), 0);
    }

    #[test]
    fn inserted_spans_carry_fixed_attributes() {
        let mut store = MemorySpanStore::new();
        store.add_span(1, SpanRange::new(0, 0, 0, 3), "sfg_aabbcc");
        let span = &store.spans_in(1)[0];
        assert_eq!(span.priority, SPAN_PRIORITY);
        assert!(span.right_gravity);
        assert!(span.invalidate);
    }

    #[test]
    fn delete_removes_only_overlapping() {
        let mut store = MemorySpanStore::new();
        store.add_span(1, SpanRange::new(0, 0, 0, 3), "a");
        store.add_span(1, SpanRange::new(0, 5, 0, 8), "b");
        store.add_span(1, SpanRange::new(1, 0, 1, 3), "c");
        store.delete_spans_in(1, SpanRange::new(0, 2, 0, 6));
        let styles: Vec<&str> = store.spans_in(1).iter().map(|s| s.style.as_str()).collect();
        assert_eq!(styles, vec!["c"]);
    }

    #[test]
    fn clear_buffer_empties_it() {
        let mut store = MemorySpanStore::new();
        store.add_span(1, SpanRange::new(0, 0, 0, 3), "a");
        store.clear_buffer(1);
        assert_eq!(store.span_count(1), 0);
    }

    #[test]
    fn style_registration_is_idempotent() {
        let mut store = MemorySpanStore::new();
        let color = Rgb::new(10, 20, 30);
        store.register_style("sfg_0a141e", color);
        store.register_style("sfg_0a141e", Rgb::new(99, 99, 99));
        assert_eq!(store.style_color("sfg_0a141e"), Some(color));
    }

    #[test]
    fn span_at_finds_covering_span() {
        let mut store = MemorySpanStore::new();
        store.add_span(1, SpanRange::new(0, 4, 0, 7), "a");
        assert!(store.span_at(1, Position::new(0, 5)).is_some());
        assert!(store.span_at(1, Position::new(0, 7)).is_none());
        assert!(store.span_at(1, Position::new(0, 3)).is_none());
    }
}

//! Pending-range batching and the flush debounce.
//!
//! Byte-change events arrive faster than re-highlighting is worth doing.
//! Each event's range is queued per buffer; a flush merges the queue
//! into a few larger sweeps and processes those. The debounce timers are
//! pure deadline maps with injected timestamps, pumped by the host event
//! loop; there is no thread or OS timer behind them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::span::{BufferId, SpanRange};

/// Quiet window after a byte change before the flush runs.
pub const BYTE_CHANGE_DELAY: Duration = Duration::from_millis(50);

/// Merges pending ranges into the flush work list.
///
/// Ranges are sorted by start position, then folded left to right:
/// a range merges into the current one when they overlap or sit within
/// one row of each other. Fewer, larger sweeps beat many small ones, and
/// the one-row tolerance keeps a line split from leaving an unprocessed
/// gap between its halves.
pub fn merge_ranges(mut ranges: Vec<SpanRange>) -> Vec<SpanRange> {
    if ranges.len() <= 1 {
        return ranges;
    }
    ranges.sort_by_key(|range| range.start);

    let mut merged = Vec::with_capacity(ranges.len());
    let mut iter = ranges.into_iter();
    let mut current = match iter.next() {
        Some(first) => first,
        None => return merged,
    };

    for next in iter {
        let row_adjacent = next.start.row <= current.end.row + 1
            && next.end.row + 1 >= current.start.row;
        if row_adjacent {
            current.end = current.end.max(next.end);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

/// One-shot flush deadlines keyed by (buffer, edit tick).
///
/// Scheduling an already-keyed tick replaces its deadline, so a burst of
/// events under one tick coalesces into a single flush. A tree-change
/// cancels every deadline for its buffer.
#[derive(Debug, Default)]
pub struct FlushTimers {
    deadlines: HashMap<(BufferId, u64), Instant>,
}

impl FlushTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules (or reschedules) the flush for `tick`.
    pub fn schedule(&mut self, buffer: BufferId, tick: u64, now: Instant) {
        self.deadlines.insert((buffer, tick), now + BYTE_CHANGE_DELAY);
    }

    /// Cancels every pending flush for the buffer.
    pub fn cancel_buffer(&mut self, buffer: BufferId) {
        self.deadlines.retain(|(b, _), _| *b != buffer);
    }

    /// Number of pending flushes for the buffer.
    pub fn pending_for(&self, buffer: BufferId) -> usize {
        self.deadlines.keys().filter(|(b, _)| *b == buffer).count()
    }

    /// Removes expired deadlines and returns their buffers, deduplicated.
    pub fn take_due(&mut self, now: Instant) -> Vec<BufferId> {
        let mut due = Vec::new();
        self.deadlines.retain(|(buffer, _), deadline| {
            if now >= *deadline {
                if !due.contains(buffer) {
                    due.push(*buffer);
                }
                false
            } else {
                true
            }
        });
        due
    }
}

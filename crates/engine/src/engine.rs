//! The incremental highlight engine.
//!
//! One [`Engine`] value owns all highlighting state: the color
//! generator and its identifier map, the persisted colors loaded from
//! the cache, the span store, and per-buffer parser + pending-range
//! state. The host drives it with plain calls (attach, byte change,
//! tree change, poll, detach); everything runs on the caller's thread
//! and no call blocks.
//!
//! ## Processing model
//!
//! Byte changes queue ranges and arm a 50 ms debounce keyed by edit
//! tick. When the host's `poll` finds a due timer, the queued ranges
//! are merged, the buffer is re-parsed, and each merged range is swept:
//! overlapping spans are deleted and the identifier query re-colors the
//! range. Tree-change notifications supersede the debounce and sweep
//! their ranges immediately.
//!
//! ## Coloring policy
//!
//! Incremental sweeps only reuse colors that already exist (in memory
//! or in the persisted cache); they never mint one. New colors are
//! minted by deliberate full passes: attach and the background-change
//! rebuild. Typing a fresh name therefore leaves it unpainted until the
//! next full pass, which keeps the display calm while editing.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use rand::Rng;

use semhl_cache::{CacheData, CacheStore, SaveDebouncer};
use semhl_color::{BackgroundKind, ColorGenerator, GeneratorConfig, Rgb};
use semhl_syntax::{ByteChange, IdentifierSource, ParserFactory};

use crate::batch::{merge_ranges, FlushTimers};
use crate::span::{BufferId, SpanRange, SpanStore};

/// Buffers whose file is larger than this are skipped by default.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 102_400;

/// Custom skip predicate; replaces the file-size check when set.
pub type DisablePredicate = Box<dyn Fn(BufferId) -> bool>;

/// The host capability that owns buffer text.
pub trait TextSource {
    /// Whether the buffer still exists and is loaded.
    fn is_loaded(&self, buffer: BufferId) -> bool;

    /// The buffer's full contents.
    fn text(&self, buffer: BufferId) -> Option<String>;

    /// Size in bytes of the buffer's backing file, if it has one.
    fn byte_size(&self, buffer: BufferId) -> Option<u64>;
}

/// Engine settings.
pub struct EngineConfig {
    pub generator: GeneratorConfig,
    pub background: BackgroundKind,
    /// The host's actual background color, when one is set.
    pub background_rgb: Option<Rgb>,
    pub max_file_size: u64,
    pub disable: Option<DisablePredicate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            background: BackgroundKind::Dark,
            background_rgb: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            disable: None,
        }
    }
}

struct BufferState<P> {
    parser: P,
    pending: Vec<SpanRange>,
}

/// The per-process highlight engine. See the module docs for the
/// processing model.
pub struct Engine<F, S, C, R>
where
    F: ParserFactory,
    S: SpanStore,
    C: CacheStore,
    R: Rng,
{
    factory: F,
    spans: S,
    cache: C,
    generator: ColorGenerator<R>,
    /// Colors loaded from disk under the current fingerprint. Consulted
    /// after the in-memory map; hits migrate into the map.
    persisted: BTreeMap<String, String>,
    save_debounce: SaveDebouncer,
    timers: FlushTimers,
    buffers: HashMap<BufferId, BufferState<F::Parser>>,
    max_file_size: u64,
    disable: Option<DisablePredicate>,
}

impl<F, S, C, R> Engine<F, S, C, R>
where
    F: ParserFactory,
    S: SpanStore,
    C: CacheStore,
    R: Rng,
{
    /// Builds an engine, loading the persisted cache. Cached colors are
    /// kept only when the file's fingerprint matches the current
    /// settings.
    pub fn new(config: EngineConfig, factory: F, spans: S, mut cache: C, rng: R) -> Self {
        let generator = ColorGenerator::new(
            config.generator,
            config.background,
            config.background_rgb,
            rng,
        );
        let data = cache.load();
        let persisted = if data.settings_hash == generator.fingerprint() {
            data.colors
        } else {
            BTreeMap::new()
        };
        Self {
            factory,
            spans,
            cache,
            generator,
            persisted,
            save_debounce: SaveDebouncer::default(),
            timers: FlushTimers::new(),
            buffers: HashMap::new(),
            max_file_size: config.max_file_size,
            disable: config.disable,
        }
    }

    /// Attaches the engine to a buffer and runs the initial full pass.
    ///
    /// Returns false without touching the buffer's spans when it is
    /// disabled (size gate or custom predicate), no parser is
    /// available, or the initial parse fails. Reattaching an
    /// already-attached buffer doubles as an explicit reload: the old
    /// parser and timers are dropped up front, but its spans are only
    /// replaced once the new pass succeeds.
    pub fn attach<T: TextSource>(
        &mut self,
        buffer: BufferId,
        filetype: &str,
        host: &T,
        now: Instant,
    ) -> bool {
        if self.buffers.contains_key(&buffer) {
            // Reload: drop the old parser and timers, but keep the
            // existing spans until the new pass has succeeded.
            self.timers.cancel_buffer(buffer);
            self.buffers.remove(&buffer);
        }
        if self.is_disabled(buffer, host) {
            return false;
        }

        let mut parser = match self.factory.parser_for(filetype) {
            Ok(parser) => parser,
            Err(err) => {
                tracing::warn!(buffer, filetype, %err, "parser unavailable, leaving buffer alone");
                return false;
            }
        };
        let Some(text) = host.text(buffer) else {
            return false;
        };
        if let Err(err) = parser.parse(&text) {
            tracing::warn!(buffer, %err, "initial parse failed");
            return false;
        }

        self.spans.clear_buffer(buffer);
        let hits = parser.identifiers_in(&text, 0..line_count(&text));
        self.buffers.insert(
            buffer,
            BufferState {
                parser,
                pending: Vec::new(),
            },
        );
        for hit in hits {
            self.apply_identifier(buffer, &hit.text, hit.range.into(), true, now);
        }
        true
    }

    /// Detaches from a buffer: pending timers and ranges are dropped,
    /// the parser is released, and all spans are removed.
    pub fn detach(&mut self, buffer: BufferId) {
        self.timers.cancel_buffer(buffer);
        self.buffers.remove(&buffer);
        self.spans.clear_buffer(buffer);
    }

    /// Handles a byte-change callback: queue the edited range and arm
    /// the flush debounce for this edit tick.
    pub fn on_bytes<T: TextSource>(
        &mut self,
        buffer: BufferId,
        change: &ByteChange,
        host: &T,
        now: Instant,
    ) {
        if !host.is_loaded(buffer) {
            return;
        }
        let Some(state) = self.buffers.get_mut(&buffer) else {
            return;
        };

        let (end_row, end_col) = change.new_end();
        state.pending.push(SpanRange::new(
            change.start_row,
            change.start_col,
            end_row,
            end_col,
        ));
        state.parser.record_edit(&change.to_text_edit());
        self.timers.schedule(buffer, change.tick, now);
    }

    /// Handles a tree-change notification. The re-parsed tree is
    /// already authoritative, so every pending flush for the buffer is
    /// cancelled and the changed ranges are swept immediately.
    pub fn on_tree_change<T: TextSource>(
        &mut self,
        buffer: BufferId,
        ranges: &[SpanRange],
        host: &T,
        now: Instant,
    ) {
        if !host.is_loaded(buffer) || !self.buffers.contains_key(&buffer) {
            return;
        }
        self.timers.cancel_buffer(buffer);
        let Some(text) = host.text(buffer) else {
            return;
        };
        for &range in ranges {
            self.sweep_range(buffer, &text, range, false, now);
        }
    }

    /// Pumps the engine's timers: runs due flushes and the debounced
    /// cache save. Hosts call this from their event loop.
    pub fn poll<T: TextSource>(&mut self, host: &T, now: Instant) {
        for buffer in self.timers.take_due(now) {
            self.flush(buffer, host, now);
        }
        if self.save_debounce.take_ready(now) {
            self.persist();
        }
    }

    /// Rebuilds everything for a new background: the generator's map
    /// and background cache are reset, the on-disk cache is deleted,
    /// and every attached buffer gets a fresh full pass with new
    /// colors.
    pub fn background_changed<T: TextSource>(
        &mut self,
        kind: BackgroundKind,
        background: Option<Rgb>,
        host: &T,
        now: Instant,
    ) {
        self.generator.set_background(kind, background);
        self.persisted.clear();
        self.cache.clear();
        self.save_debounce.reset();

        let attached: Vec<BufferId> = self.buffers.keys().copied().collect();
        for buffer in attached {
            self.timers.cancel_buffer(buffer);
            self.spans.clear_buffer(buffer);
            let Some(text) = host.text(buffer) else {
                continue;
            };
            let hits = {
                let Some(state) = self.buffers.get_mut(&buffer) else {
                    continue;
                };
                state.pending.clear();
                if let Err(err) = state.parser.parse(&text) {
                    tracing::warn!(buffer, %err, "reparse failed during background rebuild");
                    continue;
                }
                state.parser.identifiers_in(&text, 0..line_count(&text))
            };
            for hit in hits {
                self.apply_identifier(buffer, &hit.text, hit.range.into(), true, now);
            }
        }
    }

    /// The debounced flush for one buffer: merge queued ranges, re-parse,
    /// and sweep each merged range without minting new colors.
    fn flush<T: TextSource>(&mut self, buffer: BufferId, host: &T, now: Instant) {
        let ranges = {
            let Some(state) = self.buffers.get_mut(&buffer) else {
                return;
            };
            merge_ranges(std::mem::take(&mut state.pending))
        };
        if !host.is_loaded(buffer) {
            return;
        }
        let Some(text) = host.text(buffer) else {
            return;
        };
        {
            let Some(state) = self.buffers.get_mut(&buffer) else {
                return;
            };
            if let Err(err) = state.parser.parse(&text) {
                tracing::warn!(buffer, %err, "reparse failed, dropping flush");
                return;
            }
        }
        for range in ranges {
            self.sweep_range(buffer, &text, range, false, now);
        }
    }

    /// Deletes the spans overlapping `range`, then re-colors every
    /// identifier the query finds in its rows.
    fn sweep_range(
        &mut self,
        buffer: BufferId,
        text: &str,
        range: SpanRange,
        create_new: bool,
        now: Instant,
    ) {
        self.spans.delete_spans_in(buffer, range);
        let hits = {
            let Some(state) = self.buffers.get(&buffer) else {
                return;
            };
            state
                .parser
                .identifiers_in(text, range.start.row..range.end.row + 1)
        };
        for hit in hits {
            self.apply_identifier(buffer, &hit.text, hit.range.into(), create_new, now);
        }
    }

    /// Applies one identifier occurrence: resolve its color and insert
    /// a span, or leave it unpainted when the color is unknown and
    /// minting is not allowed.
    fn apply_identifier(
        &mut self,
        buffer: BufferId,
        id: &str,
        range: SpanRange,
        create_new: bool,
        now: Instant,
    ) {
        self.spans.delete_spans_in(buffer, range);

        let rgb = match self.generator.cached_color(id) {
            Some(rgb) => rgb,
            None => match self.persisted.get(id).and_then(|hex| Rgb::parse(hex)) {
                Some(rgb) => {
                    self.generator.cache_color(id, rgb);
                    rgb
                }
                None if create_new => {
                    let rgb = self.generator.generate();
                    self.generator.cache_color(id, rgb);
                    self.save_debounce.mark_dirty(now);
                    rgb
                }
                None => return,
            },
        };

        let key = style_key(rgb);
        self.spans.register_style(&key, rgb);
        self.spans.add_span(buffer, range, &key);
    }

    fn persist(&mut self) {
        let data = CacheData {
            settings_hash: self.generator.fingerprint(),
            colors: self
                .generator
                .colors()
                .iter()
                .map(|(id, rgb)| (id.clone(), rgb.hex()))
                .collect(),
        };
        self.cache.save(&data);
    }

    fn is_disabled<T: TextSource>(&self, buffer: BufferId, host: &T) -> bool {
        match &self.disable {
            Some(predicate) => predicate(buffer),
            None => host
                .byte_size(buffer)
                .is_some_and(|size| size > self.max_file_size),
        }
    }

    // ==================== Inspection ====================

    /// Whether the engine currently holds a parser for the buffer.
    pub fn is_attached(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    /// Number of armed flush timers for the buffer.
    pub fn pending_timers(&self, buffer: BufferId) -> usize {
        self.timers.pending_for(buffer)
    }

    /// The color currently assigned to an identifier, if any.
    pub fn color_of(&self, id: &str) -> Option<Rgb> {
        self.generator.cached_color(id)
    }

    /// The active settings fingerprint.
    pub fn fingerprint(&self) -> String {
        self.generator.fingerprint()
    }

    /// The span store, for hosts that render from it.
    pub fn spans(&self) -> &S {
        &self.spans
    }
}

/// Style key for a foreground color, `sfg_` plus lowercase hex.
fn style_key(rgb: Rgb) -> String {
    format!("sfg_{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

fn line_count(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count() + 1
}

//! semhl: semantic identifier coloring.
//!
//! Every distinct lexical identifier in a buffer gets a stable,
//! perceptually distinct foreground color: two occurrences of the same
//! name share a color, different names stay visually apart from each
//! other and from the background. Colors are generated in CIELAB space
//! against the editor background and persist across restarts.
//!
//! This crate is the consumer surface. It wires the member crates
//! together: tree-sitter identifier extraction (`semhl-syntax`), the
//! color generator (`semhl-color`), the persistent cache
//! (`semhl-cache`), and the incremental engine (`semhl-engine`).
//!
//! # Hosting
//!
//! The host owns buffer text (the [`TextSource`] impl), routes
//! filetypes, and forwards its editing events:
//!
//! - buffer entered: [`Semhl::load`] (the `SemhlLoad` command),
//! - buffer edited: [`Semhl::on_bytes`],
//! - tree re-parsed: [`Semhl::on_tree_change`],
//! - event-loop tick: [`Semhl::poll`] (drives the 50 ms flush debounce
//!   and the 5 s cache-save debounce),
//! - background setting changed: [`Semhl::background_changed`],
//! - buffer closed: [`Semhl::unload`] (the `SemhlUnload` command).
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use semhl::{BufferId, Config, Semhl, TextSource};
//!
//! struct OneBuffer(String);
//!
//! impl TextSource for OneBuffer {
//!     fn is_loaded(&self, _buffer: BufferId) -> bool {
//!         true
//!     }
//!     fn text(&self, _buffer: BufferId) -> Option<String> {
//!         Some(self.0.clone())
//!     }
//!     fn byte_size(&self, _buffer: BufferId) -> Option<u64> {
//!         None
//!     }
//! }
//!
//! let host = OneBuffer("fn main() { let count = 0; }".to_owned());
//! let mut semhl = Semhl::new(Config::default());
//! semhl.load(1, "rust", &host, Instant::now());
//! assert!(semhl.span_count(1) > 0);
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

pub use semhl_cache::{CacheData, CacheStore, FsCacheStore, MemCacheStore};
pub use semhl_color::{
    delta_e, is_color_collision, lab_to_rgb, rgb_to_lab, BackgroundKind, GeneratorConfig, Lab, Rgb,
};
pub use semhl_engine::{
    BufferId, DisablePredicate, Engine, EngineConfig, MemorySpanStore, Position, SpanRange,
    SpanStore, StoredSpan, TextSource, DEFAULT_MAX_FILE_SIZE,
};
pub use semhl_syntax::{
    delete_change, insert_change, ByteChange, IdentifierHit, IdentifierSource, LanguageTable,
    NodeRange, ParserFactory, TextEdit,
};

/// Consumer configuration.
///
/// Everything has a working default: no auto-attach filetypes, a 100 KiB
/// file-size gate, a minimum separation of 5 dE and a target of 15 dE
/// from a dark background, with the lightness band derived from the
/// background kind.
pub struct Config {
    /// Filetypes the host should auto-attach; consulted through
    /// [`Semhl::should_attach`]. Empty means no auto-attach.
    pub filetypes: HashSet<String>,
    /// Buffers whose backing file exceeds this many bytes are skipped.
    pub max_file_size: u64,
    /// Custom skip predicate; replaces the size check when set.
    pub disable: Option<DisablePredicate>,
    /// Minimum color distance from the background.
    pub min_delta_e: f64,
    /// Distance from the background that generation aims for.
    pub target_delta_e: f64,
    /// Absolute lightness bounds in `[0, 100]`; `None` derives them
    /// from the background kind.
    pub l_min: Option<f64>,
    pub l_max: Option<f64>,
    /// Whether the editor background is dark or light.
    pub background: BackgroundKind,
    /// The host's actual background color, when one is set.
    pub background_rgb: Option<Rgb>,
    /// Cache file location; `None` uses the user cache directory.
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filetypes: HashSet::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            disable: None,
            min_delta_e: 5.0,
            target_delta_e: 15.0,
            l_min: None,
            l_max: None,
            background: BackgroundKind::Dark,
            background_rgb: None,
            cache_path: None,
        }
    }
}

/// The assembled highlighter: tree-sitter parsing, in-memory spans, and
/// a filesystem-backed color cache.
pub struct Semhl {
    engine: Engine<LanguageTable, MemorySpanStore, FsCacheStore, rand::rngs::ThreadRng>,
    filetypes: HashSet<String>,
}

impl Semhl {
    pub fn new(config: Config) -> Self {
        let cache = match &config.cache_path {
            Some(path) => FsCacheStore::new(path.clone()),
            None => FsCacheStore::at_default_path(),
        };
        let engine_config = EngineConfig {
            generator: GeneratorConfig {
                min_delta_e: config.min_delta_e,
                target_delta_e: config.target_delta_e,
                l_min: config.l_min,
                l_max: config.l_max,
            },
            background: config.background,
            background_rgb: config.background_rgb,
            max_file_size: config.max_file_size,
            disable: config.disable,
        };
        Self {
            engine: Engine::new(
                engine_config,
                LanguageTable::new(),
                MemorySpanStore::new(),
                cache,
                rand::rng(),
            ),
            filetypes: config.filetypes,
        }
    }

    /// Whether the host should auto-attach buffers of this filetype.
    pub fn should_attach(&self, filetype: &str) -> bool {
        self.filetypes.contains(filetype)
    }

    /// Applies the engine to a buffer now (the `SemhlLoad` command).
    pub fn load<T: TextSource>(
        &mut self,
        buffer: BufferId,
        filetype: &str,
        host: &T,
        now: Instant,
    ) -> bool {
        self.engine.attach(buffer, filetype, host, now)
    }

    /// Removes all spans and per-buffer state (the `SemhlUnload`
    /// command).
    pub fn unload(&mut self, buffer: BufferId) {
        self.engine.detach(buffer);
    }

    /// Forwards a byte-change callback.
    pub fn on_bytes<T: TextSource>(
        &mut self,
        buffer: BufferId,
        change: &ByteChange,
        host: &T,
        now: Instant,
    ) {
        self.engine.on_bytes(buffer, change, host, now);
    }

    /// Forwards a tree-change notification.
    pub fn on_tree_change<T: TextSource>(
        &mut self,
        buffer: BufferId,
        ranges: &[SpanRange],
        host: &T,
        now: Instant,
    ) {
        self.engine.on_tree_change(buffer, ranges, host, now);
    }

    /// Pumps debounce timers; call from the host event loop.
    pub fn poll<T: TextSource>(&mut self, host: &T, now: Instant) {
        self.engine.poll(host, now);
    }

    /// Rebuilds all colors for a new background setting.
    pub fn background_changed<T: TextSource>(
        &mut self,
        kind: BackgroundKind,
        background: Option<Rgb>,
        host: &T,
        now: Instant,
    ) {
        self.engine.background_changed(kind, background, host, now);
    }

    /// Number of spans currently on a buffer.
    pub fn span_count(&self, buffer: BufferId) -> usize {
        self.engine.spans().span_count(buffer)
    }

    /// The span store, for hosts that render from it.
    pub fn spans(&self) -> &MemorySpanStore {
        self.engine.spans()
    }

    /// The color currently assigned to an identifier.
    pub fn color_of(&self, id: &str) -> Option<Rgb> {
        self.engine.color_of(id)
    }

    /// The active settings fingerprint.
    pub fn fingerprint(&self) -> String {
        self.engine.fingerprint()
    }
}

//! Background-aware color generation and the identifier color map.
//!
//! The generator produces colors that keep a configured perceptual
//! distance from the editor background, remembers which color each
//! identifier received, and exposes the settings fingerprint that keys
//! the persistent cache.

use std::collections::BTreeMap;

use rand::Rng;

use crate::lab::{
    clamp_lab, delta_e, fallback_color, lab_at_distance, lab_to_rgb, rgb_to_lab, Lab, Rgb,
};

/// Attempts at the target distance before falling back to the palette.
const MAX_ATTEMPTS: usize = 10;

/// Whether the editor background is dark or light.
///
/// Decides the default lightness band (bright foregrounds on dark, dark
/// foregrounds on light) and the default background color when the host
/// has none set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    Dark,
    Light,
}

impl BackgroundKind {
    fn as_str(self) -> &'static str {
        match self {
            BackgroundKind::Dark => "dark",
            BackgroundKind::Light => "light",
        }
    }

    fn default_background(self) -> Rgb {
        match self {
            BackgroundKind::Dark => Rgb::BLACK,
            BackgroundKind::Light => Rgb::WHITE,
        }
    }

    fn default_l_range(self) -> (f64, f64) {
        match self {
            BackgroundKind::Dark => (50.0, 100.0),
            BackgroundKind::Light => (0.0, 50.0),
        }
    }
}

/// Generation settings.
///
/// `l_min` / `l_max` of `None` means "derive from the background kind".
/// Out-of-range values are clamped silently; a `min_delta_e` of zero or
/// below accepts any color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    pub min_delta_e: f64,
    pub target_delta_e: f64,
    pub l_min: Option<f64>,
    pub l_max: Option<f64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_delta_e: 5.0,
            target_delta_e: 15.0,
            l_min: None,
            l_max: None,
        }
    }
}

/// Returns true when two colors are too close to tell apart.
pub fn is_color_collision(a: Rgb, b: Rgb, threshold: f64) -> bool {
    delta_e(rgb_to_lab(a), rgb_to_lab(b)) < threshold
}

/// Generates distinct foreground colors against a background and owns the
/// identifier to color map.
///
/// The random source is injected so tests can seed it; production callers
/// pass a thread RNG. Nothing here asserts specific RGB values.
pub struct ColorGenerator<R: Rng> {
    config: GeneratorConfig,
    kind: BackgroundKind,
    background: Rgb,
    background_lab: Option<Lab>,
    colors: BTreeMap<String, Rgb>,
    fallback_index: usize,
    rng: R,
}

impl<R: Rng> ColorGenerator<R> {
    /// Creates a generator for the given background.
    ///
    /// `background` is the host's actual background color when it has one
    /// set; otherwise the kind's default (pure black or pure white) is
    /// used.
    pub fn new(config: GeneratorConfig, kind: BackgroundKind, background: Option<Rgb>, rng: R) -> Self {
        Self {
            config,
            kind,
            background: background.unwrap_or_else(|| kind.default_background()),
            background_lab: None,
            colors: BTreeMap::new(),
            fallback_index: 0,
            rng,
        }
    }

    /// The effective lightness band: configured bounds clamped to
    /// `[0, 100]`, or the background kind's default band.
    pub fn effective_l_range(&self) -> (f64, f64) {
        let (dl, dh) = self.kind.default_l_range();
        let lo = self.config.l_min.map_or(dl, |v| v.clamp(0.0, 100.0));
        let hi = self.config.l_max.map_or(dh, |v| v.clamp(0.0, 100.0));
        (lo.min(hi), lo.max(hi))
    }

    fn background_lab(&mut self) -> Lab {
        match self.background_lab {
            Some(lab) => lab,
            None => {
                let lab = rgb_to_lab(self.background);
                self.background_lab = Some(lab);
                lab
            }
        }
    }

    /// Generates a color with at least `min_delta_e` distance from the
    /// background, biased toward `target_delta_e`.
    ///
    /// After `MAX_ATTEMPTS` random tries, steps through the fallback
    /// palette instead; a fallback that still sits too close to the
    /// background is pushed away best-effort.
    pub fn generate(&mut self) -> Rgb {
        let bg = self.background_lab();
        let (lo, hi) = self.effective_l_range();
        let min = self.config.min_delta_e;
        let target = self.config.target_delta_e;

        for _ in 0..MAX_ATTEMPTS {
            let lab = lab_at_distance(&mut self.rng, bg, target, lo, hi);
            if delta_e(lab, bg) >= min {
                return lab_to_rgb(lab);
            }
        }

        let index = self.fallback_index;
        self.fallback_index = self.fallback_index.wrapping_add(1);
        let mut lab = clamp_lab(fallback_color(index), lo, hi);
        let de = delta_e(lab, bg);
        if de < min {
            lab = lab_at_distance(&mut self.rng, lab, min - de + 5.0, lo, hi);
        }
        lab_to_rgb(lab)
    }

    /// Looks up the color previously assigned to `id`.
    pub fn cached_color(&self, id: &str) -> Option<Rgb> {
        self.colors.get(id).copied()
    }

    /// Records the color assigned to `id`, replacing any earlier entry.
    pub fn cache_color(&mut self, id: &str, rgb: Rgb) {
        self.colors.insert(id.to_owned(), rgb);
    }

    /// The full identifier to color map, in key order.
    pub fn colors(&self) -> &BTreeMap<String, Rgb> {
        &self.colors
    }

    /// Seeds the map from a persisted cache that matched the fingerprint.
    pub fn seed_colors<I: IntoIterator<Item = (String, Rgb)>>(&mut self, entries: I) {
        self.colors.extend(entries);
    }

    /// Returns true when two colors fall under the configured minimum
    /// distance.
    pub fn is_collision(&self, a: Rgb, b: Rgb) -> bool {
        is_color_collision(a, b, self.config.min_delta_e)
    }

    /// Switches the background and drops everything derived from the old
    /// one: the cached background LAB, the identifier map, and the
    /// fallback cursor.
    pub fn set_background(&mut self, kind: BackgroundKind, background: Option<Rgb>) {
        self.kind = kind;
        self.background = background.unwrap_or_else(|| kind.default_background());
        self.clear_background_cache();
    }

    /// Drops the cached background LAB and the identifier map.
    pub fn clear_background_cache(&mut self) {
        self.background_lab = None;
        self.colors.clear();
        self.fallback_index = 0;
    }

    /// The settings fingerprint the persistent cache is keyed by.
    ///
    /// A pure function of the background kind, the delta targets, and the
    /// effective lightness band; any change invalidates cached colors.
    pub fn fingerprint(&self) -> String {
        let (lo, hi) = self.effective_l_range();
        format!(
            "bg={},de={}/{},L={}/{}",
            self.kind.as_str(),
            self.config.min_delta_e,
            self.config.target_delta_e,
            lo,
            hi
        )
    }
}

//! semhl-color: perceptual color math and generation for semhl.
//!
//! This crate provides the two color layers of the identifier coloring
//! engine:
//!
//! - [`lab`]: sRGB to CIELAB conversion, CIE76 distance, clamping, and
//!   random LAB generation at a target distance from a base point.
//!
//! - [`ColorGenerator`]: background-aware color generation with a
//!   configurable minimum separation, the identifier to color map, and
//!   the settings fingerprint that keys the persistent cache.
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use semhl_color::{BackgroundKind, ColorGenerator, GeneratorConfig};
//!
//! let mut generator = ColorGenerator::new(
//!     GeneratorConfig::default(),
//!     BackgroundKind::Dark,
//!     None,
//!     StdRng::seed_from_u64(1),
//! );
//! let color = generator.generate();
//! generator.cache_color("my_var", color);
//! assert_eq!(generator.cached_color("my_var"), Some(color));
//! ```

mod generator;
mod lab;

pub use generator::{is_color_collision, BackgroundKind, ColorGenerator, GeneratorConfig};
pub use lab::{
    clamp_lab, delta_e, fallback_color, fallback_palette_len, lab_at_distance, lab_to_rgb,
    rgb_to_lab, Lab, Rgb,
};

//! sRGB / CIELAB conversions and perceptual distance.
//!
//! All conversions go through linear RGB and XYZ with the D65 reference
//! white, using the standard sRGB piecewise gamma. Perceptual distance is
//! CIE76 (Euclidean distance in LAB), which is cheap and sufficient for
//! the "clearly different" separation the generator needs.

use std::fmt;

use rand::Rng;

/// D65 reference white.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

/// CIE constants: epsilon = (6/29)^3, kappa = (29/3)^3.
const EPSILON: f64 = 216.0 / 24389.0;
const KAPPA: f64 = 24389.0 / 27.0;

/// A 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB`, `RRGGBB`, `R,G,B`, or `R G B`.
    ///
    /// Hex digits are case-insensitive. Returns `None` for anything that
    /// is not a valid 24-bit color.
    pub fn parse(s: &str) -> Option<Rgb> {
        let stripped = s.trim().trim_start_matches('#');

        if stripped.len() == 6 && stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            let r = u8::from_str_radix(&stripped[0..2], 16).ok()?;
            let g = u8::from_str_radix(&stripped[2..4], 16).ok()?;
            let b = u8::from_str_radix(&stripped[4..6], 16).ok()?;
            return Some(Rgb { r, g, b });
        }

        let parts: Vec<&str> = stripped
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 3 {
            return None;
        }
        let r = parts[0].parse().ok()?;
        let g = parts[1].parse().ok()?;
        let b = parts[2].parse().ok()?;
        Some(Rgb { r, g, b })
    }

    /// Formats as uppercase `#RRGGBB`, the storage encoding.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A point in CIELAB space.
///
/// `l` is lightness in `[0, 100]`; `a` (green to red) and `b` (blue to
/// yellow) are nominally in `[-128, 127]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LAB(L={:.2}, a={:.2}, b={:.2})", self.l, self.a, self.b)
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn cie_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

/// Converts an sRGB color to CIELAB.
pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    let r = srgb_to_linear(f64::from(rgb.r) / 255.0);
    let g = srgb_to_linear(f64::from(rgb.g) / 255.0);
    let b = srgb_to_linear(f64::from(rgb.b) / 255.0);

    // Linear RGB to XYZ, sRGB/D65 matrix.
    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    let fx = cie_f(x / XN);
    let fy = cie_f(y / YN);
    let fz = cie_f(z / ZN);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Converts a CIELAB point to sRGB.
///
/// Out-of-gamut results are clamped per channel to `[0, 1]` before
/// quantization, so every LAB point yields a valid color. Saturation may
/// flatten near the gamut edge; invalid bytes are impossible.
pub fn lab_to_rgb(lab: Lab) -> Rgb {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;

    let xr = if fx.powi(3) > EPSILON {
        fx.powi(3)
    } else {
        (116.0 * fx - 16.0) / KAPPA
    };
    let yr = if lab.l > KAPPA * EPSILON {
        ((lab.l + 16.0) / 116.0).powi(3)
    } else {
        lab.l / KAPPA
    };
    let zr = if fz.powi(3) > EPSILON {
        fz.powi(3)
    } else {
        (116.0 * fz - 16.0) / KAPPA
    };

    let x = xr * XN;
    let y = yr * YN;
    let z = zr * ZN;

    // XYZ to linear RGB, inverse sRGB/D65 matrix.
    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    let to_byte = |c: f64| -> u8 {
        let srgb = linear_to_srgb(c).clamp(0.0, 1.0);
        (srgb * 255.0).round() as u8
    };

    Rgb {
        r: to_byte(r),
        g: to_byte(g),
        b: to_byte(b),
    }
}

/// CIE76 color difference: Euclidean distance in LAB.
pub fn delta_e(a: Lab, b: Lab) -> f64 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// Clamps L to `[l_min, l_max]` and a/b to the nominal LAB extents.
pub fn clamp_lab(lab: Lab, l_min: f64, l_max: f64) -> Lab {
    Lab {
        l: lab.l.clamp(l_min, l_max),
        a: lab.a.clamp(-128.0, 127.0),
        b: lab.b.clamp(-128.0, 127.0),
    }
}

/// Generates a LAB point at roughly `target` distance from `base`.
///
/// Lightness is drawn uniformly from the allowed band and the (a, b)
/// offset is a random direction scaled to `0.7 * target`, so brightness
/// spread and hue spread are independent. If clamping collapsed the
/// distance below half the target, the (a, b) offset is rescaled to
/// restore it.
pub fn lab_at_distance<R: Rng + ?Sized>(
    rng: &mut R,
    base: Lab,
    target: f64,
    l_min: f64,
    l_max: f64,
) -> Lab {
    let target_l = rng.random_range(l_min..=l_max);
    let theta = rng.random_range(0.0..std::f64::consts::TAU);
    let ab_dist = 0.7 * target;

    let mut out = clamp_lab(
        Lab {
            l: target_l,
            a: base.a + ab_dist * theta.cos(),
            b: base.b + ab_dist * theta.sin(),
        },
        l_min,
        l_max,
    );

    let floor = 0.5 * target;
    let de = delta_e(out, base);
    if de > 0.0 && de < floor {
        let dl = out.l - base.l;
        let ab_sq = (out.a - base.a).powi(2) + (out.b - base.b).powi(2);
        let need_sq = floor * floor - dl * dl;
        if ab_sq > 0.0 && need_sq > 0.0 {
            let scale = (need_sq / ab_sq).sqrt();
            out.a = base.a + (out.a - base.a) * scale;
            out.b = base.b + (out.b - base.b) * scale;
            out = clamp_lab(out, l_min, l_max);
        }
    }
    out
}

/// Fixed fallback palette, ordered for wide hue coverage.
///
/// Used when random generation fails to clear the minimum distance from
/// the background. Indexing wraps around.
const FALLBACK_PALETTE: [Lab; 10] = [
    Lab::new(55.0, 60.0, 50.0),   // red-orange
    Lab::new(60.0, -55.0, 45.0),  // green
    Lab::new(45.0, 15.0, -60.0),  // blue
    Lab::new(55.0, 70.0, -35.0),  // magenta
    Lab::new(80.0, -5.0, 75.0),   // yellow
    Lab::new(75.0, -35.0, -15.0), // cyan
    Lab::new(50.0, 35.0, 55.0),   // orange-brown
    Lab::new(55.0, -40.0, -5.0),  // teal
    Lab::new(75.0, 45.0, 5.0),    // pink
    Lab::new(30.0, 20.0, -55.0),  // dark-blue
];

/// Returns the fallback palette entry for `index`, wrapping around.
pub fn fallback_color(index: usize) -> Lab {
    FALLBACK_PALETTE[index % FALLBACK_PALETTE.len()]
}

/// Number of distinct entries in the fallback palette.
pub fn fallback_palette_len() -> usize {
    FALLBACK_PALETTE.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // ==================== Rgb parsing and formatting ====================

    #[test]
    fn parse_hex_with_hash() {
        assert_eq!(Rgb::parse("#FF8000"), Some(Rgb::new(255, 128, 0)));
    }

    #[test]
    fn parse_hex_lowercase() {
        assert_eq!(Rgb::parse("a6e3a1"), Some(Rgb::new(0xa6, 0xe3, 0xa1)));
    }

    #[test]
    fn parse_component_forms() {
        assert_eq!(Rgb::parse("255,0,0"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse("12 34 56"), Some(Rgb::new(12, 34, 56)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Rgb::parse(""), None);
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("300,0,0"), None);
        assert_eq!(Rgb::parse("not a color"), None);
    }

    #[test]
    fn hex_is_uppercase() {
        assert_eq!(Rgb::new(0xab, 0xcd, 0xef).hex(), "#ABCDEF");
    }

    #[test]
    fn hex_roundtrip() {
        let rgb = Rgb::new(30, 144, 255);
        assert_eq!(Rgb::parse(&rgb.hex()), Some(rgb));
    }

    // ==================== Conversion reference values ====================

    #[test]
    fn black_is_l_zero() {
        let lab = rgb_to_lab(Rgb::BLACK);
        assert!(lab.l.abs() < 1e-6);
        assert!(lab.a.abs() < 1e-6);
        assert!(lab.b.abs() < 1e-6);
    }

    #[test]
    fn white_is_l_hundred() {
        let lab = rgb_to_lab(Rgb::WHITE);
        assert!((lab.l - 100.0).abs() < 1e-3);
        assert!(lab.a.abs() < 0.05);
        assert!(lab.b.abs() < 0.05);
    }

    #[test]
    fn pure_red_reference() {
        // Known CIELAB value for sRGB red under D65: roughly (53.2, 80.1, 67.2).
        let lab = rgb_to_lab(Rgb::new(255, 0, 0));
        assert!((lab.l - 53.2).abs() < 0.5, "L was {}", lab.l);
        assert!((lab.a - 80.1).abs() < 0.5, "a was {}", lab.a);
        assert!((lab.b - 67.2).abs() < 0.5, "b was {}", lab.b);
    }

    #[test]
    fn mid_gray_is_neutral() {
        let lab = rgb_to_lab(Rgb::new(119, 119, 119));
        assert!(lab.a.abs() < 0.05);
        assert!(lab.b.abs() < 0.05);
        assert!(lab.l > 45.0 && lab.l < 55.0);
    }

    // ==================== Round trips ====================

    #[test]
    fn rgb_lab_rgb_roundtrip_is_stable() {
        // LAB carries more precision than 8-bit sRGB, so the round trip
        // should land back on (or next to) the original bytes.
        let samples = [
            Rgb::new(0, 0, 0),
            Rgb::new(255, 255, 255),
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(30, 30, 46),
            Rgb::new(205, 214, 244),
            Rgb::new(128, 64, 200),
            Rgb::new(17, 200, 99),
        ];
        for rgb in samples {
            let lab = rgb_to_lab(rgb);
            let back = lab_to_rgb(lab);
            let lab_back = rgb_to_lab(back);
            assert!(
                delta_e(lab, lab_back) <= 1.0,
                "round trip drifted for {rgb}: {lab} vs {lab_back}"
            );
        }
    }

    #[test]
    fn in_gamut_lab_roundtrip_delta_under_one() {
        // Sample the in-gamut volume by walking the RGB cube.
        for r in (0..=255).step_by(51) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(51) {
                    let lab = rgb_to_lab(Rgb::new(r as u8, g as u8, b as u8));
                    let back = rgb_to_lab(lab_to_rgb(lab));
                    assert!(delta_e(lab, back) <= 1.0);
                }
            }
        }
    }

    // ==================== delta_e ====================

    #[test]
    fn delta_e_is_zero_for_identical() {
        let lab = rgb_to_lab(Rgb::new(100, 150, 200));
        assert_eq!(delta_e(lab, lab), 0.0);
    }

    #[test]
    fn delta_e_is_symmetric() {
        let a = rgb_to_lab(Rgb::new(255, 0, 0));
        let b = rgb_to_lab(Rgb::new(0, 0, 255));
        assert!((delta_e(a, b) - delta_e(b, a)).abs() < 1e-12);
    }

    #[test]
    fn black_white_distance_is_large() {
        let d = delta_e(rgb_to_lab(Rgb::BLACK), rgb_to_lab(Rgb::WHITE));
        assert!(d > 99.0, "black/white distance was {d}");
    }

    // ==================== clamp_lab ====================

    #[test]
    fn clamp_restricts_l_and_ab() {
        let clamped = clamp_lab(Lab::new(120.0, 300.0, -300.0), 10.0, 90.0);
        assert_eq!(clamped, Lab::new(90.0, 127.0, -128.0));
    }

    #[test]
    fn clamp_leaves_in_range_untouched() {
        let lab = Lab::new(55.0, 20.0, -30.0);
        assert_eq!(clamp_lab(lab, 0.0, 100.0), lab);
    }

    // ==================== lab_at_distance ====================

    #[test]
    fn generated_l_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = rgb_to_lab(Rgb::BLACK);
        for _ in 0..50 {
            let lab = lab_at_distance(&mut rng, base, 15.0, 60.0, 80.0);
            assert!(lab.l >= 60.0 && lab.l <= 80.0, "L out of band: {lab}");
        }
    }

    #[test]
    fn distance_holds_when_lightness_is_pinned() {
        let mut rng = StdRng::seed_from_u64(11);
        // A one-point L band removes the lightness contribution; the
        // (a, b) offset alone must keep at least half the target.
        let base = Lab::new(50.0, 0.0, 0.0);
        for _ in 0..50 {
            let lab = lab_at_distance(&mut rng, base, 20.0, 50.0, 50.0);
            let de = delta_e(lab, base);
            assert!(de >= 10.0 - 1e-9, "distance collapsed to {de}");
        }
    }

    #[test]
    fn gamut_edge_base_stays_in_valid_lab() {
        // Near the (a, b) extents the clamp and the rescue both fire;
        // whatever they settle on must still be a valid LAB point.
        let mut rng = StdRng::seed_from_u64(13);
        let base = Lab::new(60.0, 126.0, -126.0);
        for _ in 0..100 {
            let lab = lab_at_distance(&mut rng, base, 20.0, 0.0, 100.0);
            assert!((-128.0..=127.0).contains(&lab.a));
            assert!((-128.0..=127.0).contains(&lab.b));
            assert!((0.0..=100.0).contains(&lab.l));
        }
    }

    #[test]
    fn fallback_palette_wraps() {
        assert_eq!(fallback_color(0), fallback_color(fallback_palette_len()));
        assert_ne!(fallback_color(0), fallback_color(1));
    }

    #[test]
    fn fallback_palette_is_mutually_distinct() {
        for i in 0..fallback_palette_len() {
            for j in (i + 1)..fallback_palette_len() {
                let d = delta_e(fallback_color(i), fallback_color(j));
                assert!(d > 10.0, "entries {i} and {j} are only {d} apart");
            }
        }
    }
}

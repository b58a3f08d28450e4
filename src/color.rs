//! OkLCh color math
//!
//! Colors are stored as perceptual OkLCh triples. Interpolation happens in
//! that space, with the hue following the shorter arc around the circle.
//! Conversions to display spaces go through linear sRGB.

use palette::{convert::FromColorUnclamped, white_point::D65, Hsv, LinSrgb, Srgb, Xyz};
use serde_derive::{Deserialize, Serialize};

mod literal;
pub use literal::ColorParseError;

mod utils;
pub use utils::{clamp01, hue_delta, wrap_hue};

/// Linear sRGB to LMS cone response
const RGB_TO_LMS: [[f64; 3]; 3] = [
    [0.412_221_470_8, 0.536_332_536_3, 0.051_445_992_9],
    [0.211_903_498_2, 0.680_699_545_1, 0.107_396_956_6],
    [0.088_302_461_9, 0.281_718_837_6, 0.629_978_700_5],
];

/// Non-linear LMS to Oklab
const LMS_TO_LAB: [[f64; 3]; 3] = [
    [0.210_454_255_3, 0.793_617_785_0, -0.004_072_046_8],
    [1.977_998_495_1, -2.428_592_205_0, 0.450_593_709_9],
    [0.025_904_037_1, 0.782_771_766_2, -0.808_675_766_0],
];

/// Oklab to non-linear LMS
const LAB_TO_LMS: [[f64; 3]; 3] = [
    [1.0, 0.396_337_777_4, 0.215_803_757_3],
    [1.0, -0.105_561_345_8, -0.063_854_172_8],
    [1.0, -0.089_484_177_5, -1.291_485_548_0],
];

/// LMS cone response to linear sRGB
const LMS_TO_RGB: [[f64; 3]; 3] = [
    [4.076_741_662_1, -3.307_711_591_3, 0.230_969_929_2],
    [-1.268_438_004_6, 2.609_757_401_1, -0.341_319_396_5],
    [-0.004_196_086_3, -0.703_418_614_7, 1.707_614_701_0],
];

fn mul3(m: &[[f64; 3]; 3], v: (f64, f64, f64)) -> (f64, f64, f64) {
    (
        m[0][0] * v.0 + m[0][1] * v.1 + m[0][2] * v.2,
        m[1][0] * v.0 + m[1][1] * v.1 + m[1][2] * v.2,
        m[2][0] * v.0 + m[2][1] * v.1 + m[2][2] * v.2,
    )
}

/// A color in the OkLCh space
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Perceived lightness, in `[0, 1]`
    pub l: f64,
    /// Chroma, `>= 0`
    pub c: f64,
    /// Hue angle in degrees, in `[0, 360)`
    pub h: f64,
}

impl Color {
    /// Create a color, wrapping the hue into `[0, 360)`
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h: wrap_hue(h) }
    }

    /// Build a color from its rectangular Oklab coordinates
    pub fn from_oklab(l: f64, a: f64, b: f64) -> Self {
        let c = a.hypot(b);

        // Achromatic colors have no meaningful hue
        let h = if c < 1e-12 {
            0.0
        } else {
            wrap_hue(b.atan2(a).to_degrees())
        };

        Self { l, c, h }
    }

    /// Rectangular `(L, a, b)` Oklab coordinates
    pub fn to_oklab(&self) -> (f64, f64, f64) {
        let h = self.h.to_radians();
        (self.l, self.c * h.cos(), self.c * h.sin())
    }

    /// Linearly interpolate towards `to`
    ///
    /// Lightness and chroma are interpolated directly, the hue moves along the
    /// shorter arc of the hue circle. Both endpoints are reproduced exactly.
    ///
    /// # Parameters
    ///
    /// * `to`: target color, returned for `t == 1`
    /// * `t`: interpolation factor, usually in `[0, 1]`
    pub fn lerp(&self, to: &Color, t: f64) -> Color {
        let delta = hue_delta(self.h, to.h);

        // Offset from the closest endpoint
        let h = if t < 0.5 {
            self.h + delta * t
        } else {
            to.h - delta * (1.0 - t)
        };

        Self {
            l: self.l * (1.0 - t) + to.l * t,
            c: self.c * (1.0 - t) + to.c * t,
            h: wrap_hue(h),
        }
    }

    /// Convert from linear sRGB
    pub fn from_linear_srgb(color: LinSrgb<f64>) -> Self {
        let (l, m, s) = mul3(&RGB_TO_LMS, color.into_components());
        let (l, a, b) = mul3(&LMS_TO_LAB, (l.cbrt(), m.cbrt(), s.cbrt()));
        Self::from_oklab(l, a, b)
    }

    /// Convert to linear sRGB, without clamping out-of-gamut components
    pub fn to_linear_srgb(&self) -> LinSrgb<f64> {
        let (l, m, s) = mul3(&LAB_TO_LMS, self.to_oklab());
        let (r, g, b) = mul3(&LMS_TO_RGB, (l * l * l, m * m * m, s * s * s));
        LinSrgb::new(r, g, b)
    }

    /// Build a color from gamma-encoded sRGB components in `[0, 1]`
    pub fn from_srgb(red: f64, green: f64, blue: f64) -> Self {
        let linear: LinSrgb<f64> = Srgb::<f64>::new(red, green, blue).into_linear();
        Self::from_linear_srgb(linear)
    }

    /// Convert to gamma-encoded sRGB, components clamped to `[0, 1]`
    pub fn to_srgb(&self) -> Srgb<f64> {
        let (r, g, b) = Srgb::<f64>::from_linear(self.to_linear_display()).into_components();
        Srgb::new(clamp01(r), clamp01(g), clamp01(b))
    }

    /// Convert to the HSB representation of the clamped sRGB color
    pub fn to_hsb(&self) -> Hsb {
        let hsv: Hsv<palette::encoding::Srgb, f64> = Hsv::from_color_unclamped(self.to_srgb());

        Hsb {
            hue: hsv.hue.into_positive_degrees(),
            saturation: clamp01(hsv.saturation),
            brightness: clamp01(hsv.value),
        }
    }

    /// Project to CIE 1931 `(x, y)` chromaticity
    ///
    /// The linear sRGB components are clamped to the displayable range first.
    /// Black has no chromaticity and maps to `(0, 0)`.
    pub fn to_xy(&self) -> (f64, f64) {
        let xyz = Xyz::<D65, f64>::from_color_unclamped(self.to_linear_display());
        let sum = xyz.x + xyz.y + xyz.z;

        if sum <= 0.0 {
            (0.0, 0.0)
        } else {
            (xyz.x / sum, xyz.y / sum)
        }
    }

    fn to_linear_display(&self) -> LinSrgb<f64> {
        let (r, g, b) = self.to_linear_srgb().into_components();
        LinSrgb::new(clamp01(r), clamp01(g), clamp01(b))
    }
}

/// Hue/Saturation/Brightness color, as understood by legacy fixtures
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsb {
    /// Hue in degrees, `[0, 360)`
    pub hue: f64,
    /// Saturation, `[0, 1]`
    pub saturation: f64,
    /// Brightness, `[0, 1]`
    pub brightness: f64,
}

impl Hsb {
    /// Convert to OkLCh, components are clamped to their range first
    pub fn to_color(&self) -> Color {
        let hsv = Hsv::<palette::encoding::Srgb, f64>::new(
            wrap_hue(self.hue),
            clamp01(self.saturation),
            clamp01(self.brightness),
        );
        let (r, g, b) = Srgb::<f64>::from_color_unclamped(hsv).into_components();
        Color::from_srgb(r, g, b)
    }
}

/// Interpolation points between two colors, endpoints included
///
/// Requesting fewer than two points still yields both endpoints.
pub fn waypoints(from: &Color, to: &Color, steps: usize) -> Vec<Color> {
    if steps < 2 {
        return vec![*from, *to];
    }

    let last = (steps - 1) as f64;
    (0..steps).map(|i| from.lerp(to, i as f64 / last)).collect()
}

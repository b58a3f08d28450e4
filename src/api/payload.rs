use parse_display::{Display, FromStr};
use serde_derive::{Deserialize, Serialize};

use crate::color::Color;

/// Color representation used in published commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// CIE 1931 chromaticity
    #[default]
    Xy,
    /// Legacy hue/saturation/brightness
    Hsb,
}

/// Color field of a command, in one of the [`PayloadFormat`]s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadColor {
    /// CIE 1931 `(x, y)` chromaticity
    Xy {
        /// x chromaticity coordinate
        x: f64,
        /// y chromaticity coordinate
        y: f64,
    },
    /// Hue in degrees, saturation and brightness in `[0, 1]`
    Hsb {
        /// Hue in degrees
        hue: f64,
        /// Saturation
        saturation: f64,
        /// Brightness
        brightness: f64,
    },
}

fn not_positive(x: &Option<f64>) -> bool {
    x.map_or(true, |x| x <= 0.0)
}

/// Color command published to a device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorPayload {
    /// Target color
    pub color: PayloadColor,
    /// Transition time in seconds
    #[serde(default, skip_serializing_if = "not_positive")]
    pub transition: Option<f64>,
}

impl ColorPayload {
    /// Build the command for `color`
    ///
    /// # Parameters
    ///
    /// * `color`: target color
    /// * `transition`: transition time in seconds, dropped when not positive
    /// * `format`: color representation on the wire
    pub fn new(color: &Color, transition: f64, format: PayloadFormat) -> Self {
        let color = match format {
            PayloadFormat::Xy => {
                let (x, y) = color.to_xy();
                PayloadColor::Xy { x, y }
            }
            PayloadFormat::Hsb => {
                let hsb = color.to_hsb();
                PayloadColor::Hsb {
                    hue: hsb.hue,
                    saturation: hsb.saturation,
                    brightness: hsb.brightness,
                }
            }
        };

        Self {
            color,
            transition: Some(transition).filter(|t| *t > 0.0),
        }
    }

    /// JSON encoding of the command
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn assert_payload_eq(got: &ColorPayload, expected: &ColorPayload) {
        match (got.color, expected.color) {
            (PayloadColor::Xy { x, y }, PayloadColor::Xy { x: ex, y: ey }) => {
                assert_abs_diff_eq!(x, ex, epsilon = 1e-12);
                assert_abs_diff_eq!(y, ey, epsilon = 1e-12);
            }
            (
                PayloadColor::Hsb {
                    hue,
                    saturation,
                    brightness,
                },
                PayloadColor::Hsb {
                    hue: eh,
                    saturation: es,
                    brightness: eb,
                },
            ) => {
                assert_abs_diff_eq!(hue, eh, epsilon = 1e-9);
                assert_abs_diff_eq!(saturation, es, epsilon = 1e-12);
                assert_abs_diff_eq!(brightness, eb, epsilon = 1e-12);
            }
            (got, expected) => panic!("expected {:?}, got {:?}", expected, got),
        }

        assert_eq!(got.transition, expected.transition);
    }

    #[test]
    fn xy_payload_round_trips() {
        let payload = ColorPayload::new(&Color::from_srgb(1.0, 1.0, 1.0), 0.5, PayloadFormat::Xy);
        let bytes = payload.to_bytes().unwrap();

        let decoded: ColorPayload = serde_json::from_slice(&bytes).unwrap();
        assert_payload_eq(&decoded, &payload);
        assert_eq!(decoded.transition, Some(0.5));
    }

    #[test]
    fn hsb_payload_round_trips() {
        let payload = ColorPayload::new(&Color::from_srgb(0.0, 0.0, 1.0), 1.0, PayloadFormat::Hsb);
        let bytes = payload.to_bytes().unwrap();

        let decoded: ColorPayload = serde_json::from_slice(&bytes).unwrap();
        assert_payload_eq(&decoded, &payload);
    }

    #[test]
    fn transition_omitted_when_not_positive() {
        let color = Color::new(0.5, 0.1, 120.0);

        for transition in [0.0, -1.0] {
            let payload = ColorPayload::new(&color, transition, PayloadFormat::Xy);
            assert_eq!(payload.transition, None);

            let json: serde_json::Value = serde_json::from_slice(&payload.to_bytes().unwrap()).unwrap();
            assert!(json.get("transition").is_none());
            assert!(json["color"].get("x").is_some());
        }
    }

    #[test]
    fn black_is_degenerate() {
        let payload = ColorPayload::new(&Color::new(0.0, 0.0, 0.0), 0.0, PayloadFormat::Xy);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"color":{"x":0.0,"y":0.0}}"#
        );
    }

    #[test]
    fn format_names() {
        assert_eq!(PayloadFormat::Xy.to_string(), "xy");
        assert_eq!("hsb".parse::<PayloadFormat>().unwrap(), PayloadFormat::Hsb);
    }
}

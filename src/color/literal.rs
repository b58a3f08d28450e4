use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use super::Color;

/// Malformed color literal
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("invalid hex color: '{0}'")]
    InvalidHex(String),
    #[error("expected 3 components in '{0}'")]
    ComponentCount(String),
    #[error("lightness must be a percentage in '{0}'")]
    Lightness(String),
    #[error("invalid number '{value}' in '{literal}'")]
    InvalidNumber { literal: String, value: String },
    #[error("{component} out of range in '{literal}'")]
    OutOfRange {
        literal: String,
        component: &'static str,
    },
    #[error("unsupported color format: '{0}'")]
    Unsupported(String),
}

lazy_static::lazy_static! {
    static ref HEX_REGEX: Regex = Regex::new("^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    static ref FUNCTION_REGEX: Regex = Regex::new(r"^(oklab|oklch)\(([^)]*)\)$").unwrap();
    static ref SEPARATOR_REGEX: Regex = Regex::new(r"[,\s]+").unwrap();
}

fn parse_hex(literal: &str, digits: &str) -> Result<Color, ColorParseError> {
    let invalid = || ColorParseError::InvalidHex(literal.to_owned());

    let (width, max) = if digits.len() == 3 {
        (1, 15.0)
    } else {
        (2, 255.0)
    };

    let mut components = [0.0f64; 3];
    for (i, component) in components.iter_mut().enumerate() {
        let digit = digits.get(i * width..(i + 1) * width).ok_or_else(invalid)?;
        *component = u8::from_str_radix(digit, 16).map_err(|_| invalid())? as f64 / max;
    }

    let [r, g, b] = components;
    Ok(Color::from_srgb(r, g, b))
}

/// Parse a finite number, `NaN` and infinities are rejected
fn parse_number(literal: &str, value: &str) -> Result<f64, ColorParseError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ColorParseError::InvalidNumber {
            literal: literal.to_owned(),
            value: value.to_owned(),
        })
}

fn check_range(
    literal: &str,
    component: &'static str,
    valid: bool,
) -> Result<(), ColorParseError> {
    if valid {
        Ok(())
    } else {
        Err(ColorParseError::OutOfRange {
            literal: literal.to_owned(),
            component,
        })
    }
}

fn parse_function(literal: &str, name: &str, args: &str) -> Result<Color, ColorParseError> {
    let params: Vec<_> = SEPARATOR_REGEX
        .split(args.trim())
        .filter(|param| !param.is_empty())
        .collect();

    if params.len() != 3 {
        return Err(ColorParseError::ComponentCount(literal.to_owned()));
    }

    let l = params[0]
        .strip_suffix('%')
        .ok_or_else(|| ColorParseError::Lightness(literal.to_owned()))?;
    let l = parse_number(literal, l)? / 100.0;
    check_range(literal, "lightness", (0.0..=1.0).contains(&l))?;

    let x = parse_number(literal, params[1])?;
    let y = parse_number(literal, params[2])?;

    Ok(match name {
        "oklab" => Color::from_oklab(l, x, y),
        _ => {
            check_range(literal, "chroma", x >= 0.0)?;
            Color::new(l, x, y)
        }
    })
}

/// Parse a color literal
///
/// Supported forms are `#rrggbb`, `#rgb`, `oklab(L% a b)` and `oklch(L% C H)`.
/// Function arguments may be separated by commas or whitespace. Lightness
/// must lie in `[0%, 100%]`, chroma must be non-negative and every component
/// must be finite.
impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();

        if let Some(captures) = HEX_REGEX.captures(literal) {
            return parse_hex(literal, &captures[1]);
        }

        if literal.starts_with('#') {
            return Err(ColorParseError::InvalidHex(literal.to_owned()));
        }

        if let Some(captures) = FUNCTION_REGEX.captures(literal) {
            return parse_function(literal, &captures[1], &captures[2]);
        }

        Err(ColorParseError::Unsupported(literal.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn parse_hex_forms() {
        let long: Color = "#ffffff".parse().unwrap();
        let short: Color = "#FFF".parse().unwrap();

        assert_abs_diff_eq!(long.l, 1.0, epsilon = 1e-6);
        assert_eq!(long, short);

        let (r, g, b) = "#336699".parse::<Color>().unwrap().to_srgb().into_components();
        assert_abs_diff_eq!(r, 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(g, 0.4, epsilon = 1e-5);
        assert_abs_diff_eq!(b, 0.6, epsilon = 1e-5);
    }

    #[test]
    fn parse_oklch() {
        let color: Color = "oklch(70% 0.1 250)".parse().unwrap();
        assert_eq!(color, Color::new(0.7, 0.1, 250.0));

        let commas: Color = "oklch(70%, 0.1, 250)".parse().unwrap();
        assert_eq!(color, commas);

        // Bounds are inclusive, hues wrap
        let bounds: Color = "oklch(100% 0 -90)".parse().unwrap();
        assert_eq!(bounds, Color::new(1.0, 0.0, 270.0));
    }

    #[test]
    fn parse_oklab() {
        let color: Color = "oklab(50% 0 0.1)".parse().unwrap();

        assert_abs_diff_eq!(color.l, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(color.c, 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(color.h, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn reject_malformed() {
        assert_eq!(
            "#12345".parse::<Color>(),
            Err(ColorParseError::InvalidHex("#12345".to_owned()))
        );
        assert_eq!(
            "oklch(0.7 0.1 250)".parse::<Color>(),
            Err(ColorParseError::Lightness("oklch(0.7 0.1 250)".to_owned()))
        );
        assert_eq!(
            "oklch(70% 0.1)".parse::<Color>(),
            Err(ColorParseError::ComponentCount("oklch(70% 0.1)".to_owned()))
        );
        assert!(matches!(
            "oklab(50% x 0)".parse::<Color>(),
            Err(ColorParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "oklch(70% NaN 250)".parse::<Color>(),
            Err(ColorParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "oklab(50% inf 0)".parse::<Color>(),
            Err(ColorParseError::InvalidNumber { .. })
        ));
        assert_eq!(
            "oklch(70% -0.3 250)".parse::<Color>(),
            Err(ColorParseError::OutOfRange {
                literal: "oklch(70% -0.3 250)".to_owned(),
                component: "chroma",
            })
        );
        assert_eq!(
            "oklch(250% 0.1 250)".parse::<Color>(),
            Err(ColorParseError::OutOfRange {
                literal: "oklch(250% 0.1 250)".to_owned(),
                component: "lightness",
            })
        );
        assert!(matches!(
            "red".parse::<Color>(),
            Err(ColorParseError::Unsupported(_))
        ));
    }
}

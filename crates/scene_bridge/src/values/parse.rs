use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::types::{Color, EnumSpec, EnumValue, Vec2, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueParseError {
    #[error("'{raw}' is not a number")]
    NotNumeric { raw: String },
    #[error("'{raw}' is not a finite number")]
    NonFinite { raw: String },
    #[error("'{raw}' is not an integer")]
    NotInteger { raw: String },
    #[error("'{raw}' is not a boolean (expected true|false, 1|0, yes|no, on|off)")]
    NotBoolean { raw: String },
    #[error("malformed JSON object: {message}")]
    MalformedJson { message: String },
    #[error("expected {expected} components, got {actual}")]
    WrongArity { expected: usize, actual: usize },
    #[error("unrecognized color '{raw}'")]
    UnknownColor { raw: String },
    #[error("'{raw}' is not a member of {enum_name} (expected one of: {expected})")]
    UnknownEnumVariant {
        raw: String,
        enum_name: &'static str,
        expected: String,
    },
}

/// Result of a lenient parse: always carries a usable value, plus the reason
/// the documented fallback was substituted when parsing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warning: Option<ValueParseError>,
}

impl<T> Parsed<T> {
    fn lenient(
        result: Result<T, ValueParseError>,
        fallback: T,
        what: &'static str,
        raw: &str,
    ) -> Self {
        match result {
            Ok(value) => Self {
                value,
                warning: None,
            },
            Err(error) => {
                warn!(raw, target_type = what, error = %error, "value_parse_fallback");
                Self {
                    value: fallback,
                    warning: Some(error),
                }
            }
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

pub fn parse_number(raw: &str) -> Result<f64, ValueParseError> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValueParseError::NotNumeric {
            raw: raw.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ValueParseError::NonFinite {
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

pub fn parse_int(raw: &str) -> Result<i64, ValueParseError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValueParseError::NotInteger {
            raw: raw.to_string(),
        })
}

pub fn parse_bool(raw: &str) -> Result<bool, ValueParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValueParseError::NotBoolean {
            raw: raw.to_string(),
        }),
    }
}

pub fn try_parse_vector2(raw: &str) -> Result<Vec2, ValueParseError> {
    let [x, y] = parse_components(raw, ["x", "y"])?;
    Ok(Vec2 { x, y })
}

pub fn try_parse_vector3(raw: &str) -> Result<Vec3, ValueParseError> {
    let [x, y, z] = parse_components(raw, ["x", "y", "z"])?;
    Ok(Vec3 { x, y, z })
}

/// Never fails: malformed input yields the zero vector and a warning.
pub fn parse_vector2(raw: &str) -> Parsed<Vec2> {
    Parsed::lenient(try_parse_vector2(raw), Vec2::ZERO, "Vector2", raw)
}

/// Never fails: malformed input yields the zero vector and a warning.
pub fn parse_vector3(raw: &str) -> Parsed<Vec3> {
    Parsed::lenient(try_parse_vector3(raw), Vec3::ZERO, "Vector3", raw)
}

pub fn try_parse_color(raw: &str) -> Result<Color, ValueParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let [r, g, b, a] = json_components(trimmed, ["r", "g", "b", "a"], [0.0, 0.0, 0.0, 1.0])?;
        return Ok(Color { r, g, b, a });
    }
    if let Some(named) = named_color(trimmed) {
        return Ok(named);
    }
    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex_color(hex).ok_or_else(|| ValueParseError::UnknownColor {
            raw: raw.to_string(),
        });
    }
    if trimmed.contains(',') {
        let parts = trimmed.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(ValueParseError::WrongArity {
                expected: 4,
                actual: parts.len(),
            });
        }
        let mut channels = [0.0, 0.0, 0.0, 1.0];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = finite_f32(parse_number(part)?, part)?;
        }
        let [r, g, b, a] = channels;
        return Ok(Color { r, g, b, a });
    }
    Err(ValueParseError::UnknownColor {
        raw: raw.to_string(),
    })
}

/// Never fails: unrecognized input yields white and a warning.
pub fn parse_color(raw: &str) -> Parsed<Color> {
    Parsed::lenient(try_parse_color(raw), Color::WHITE, "Color", raw)
}

/// Matches variant names case-insensitively; an in-range ordinal is also
/// accepted. There is no fallback variant.
pub fn parse_enum(raw: &str, spec: &'static EnumSpec) -> Result<EnumValue, ValueParseError> {
    let trimmed = raw.trim();
    if let Some(value) = spec.find(trimmed) {
        return Ok(value);
    }
    if let Some(value) = trimmed
        .parse::<usize>()
        .ok()
        .and_then(|index| spec.value(index))
    {
        return Ok(value);
    }
    Err(ValueParseError::UnknownEnumVariant {
        raw: raw.to_string(),
        enum_name: spec.name,
        expected: spec.expected_list(),
    })
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "red" => Color::RED,
        "green" => Color::GREEN,
        "blue" => Color::BLUE,
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "yellow" => Color::YELLOW,
        "cyan" => Color::CYAN,
        "magenta" => Color::MAGENTA,
        "gray" | "grey" => Color::GRAY,
        _ => return None,
    };
    Some(color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |offset: usize, width: usize| -> Option<f32> {
        let digits = hex.get(offset..offset + width)?;
        let value = u8::from_str_radix(digits, 16).ok()?;
        // Shorthand digits expand as 0xF -> 0xFF.
        let value = if width == 1 { value * 17 } else { value };
        Some(f32::from(value) / 255.0)
    };
    match hex.len() {
        3 | 4 => Some(Color {
            r: channel(0, 1)?,
            g: channel(1, 1)?,
            b: channel(2, 1)?,
            a: if hex.len() == 4 { channel(3, 1)? } else { 1.0 },
        }),
        6 | 8 => Some(Color {
            r: channel(0, 2)?,
            g: channel(2, 2)?,
            b: channel(4, 2)?,
            a: if hex.len() == 8 { channel(6, 2)? } else { 1.0 },
        }),
        _ => None,
    }
}

fn parse_components<const N: usize>(
    raw: &str,
    keys: [&str; N],
) -> Result<[f32; N], ValueParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return json_components(trimmed, keys, [0.0; N]);
    }

    let parts = strip_brackets(trimmed)
        .split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    let mut out = [0.0; N];
    match parts.len() {
        1 => {
            let scalar = finite_f32(parse_number(parts[0])?, parts[0])?;
            out = [scalar; N];
        }
        len if len == N => {
            for (slot, part) in out.iter_mut().zip(&parts) {
                *slot = finite_f32(parse_number(part)?, part)?;
            }
        }
        actual => {
            return Err(ValueParseError::WrongArity {
                expected: N,
                actual,
            })
        }
    }
    Ok(out)
}

fn json_components<const N: usize>(
    raw: &str,
    keys: [&str; N],
    defaults: [f32; N],
) -> Result<[f32; N], ValueParseError> {
    let object = serde_json::from_str::<Map<String, Value>>(raw).map_err(|error| {
        ValueParseError::MalformedJson {
            message: error.to_string(),
        }
    })?;

    let mut out = defaults;
    for (slot, key) in out.iter_mut().zip(keys) {
        let Some(value) = object.get(key) else {
            continue;
        };
        let number = match value {
            Value::Number(number) => number.as_f64().ok_or_else(|| ValueParseError::NotNumeric {
                raw: number.to_string(),
            })?,
            Value::String(text) => parse_number(text)?,
            other => {
                return Err(ValueParseError::MalformedJson {
                    message: format!("key '{key}' is not a number: {other}"),
                })
            }
        };
        *slot = finite_f32(number, &value.to_string())?;
    }
    Ok(out)
}

fn finite_f32(value: f64, raw: &str) -> Result<f32, ValueParseError> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(ValueParseError::NonFinite {
            raw: raw.to_string(),
        })
    }
}

fn strip_brackets(raw: &str) -> &str {
    for (open, close) in [('(', ')'), ('[', ']')] {
        if let Some(inner) = raw
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    static QUALITY: EnumSpec = EnumSpec {
        name: "Quality",
        variants: &["Low", "Medium", "High"],
    };

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for raw in ["true", "TRUE", "1", "yes", " On "] {
            assert_eq!(parse_bool(raw), Ok(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(parse_bool(raw), Ok(false), "{raw}");
        }
        assert!(matches!(
            parse_bool("maybe"),
            Err(ValueParseError::NotBoolean { .. })
        ));
    }

    #[test]
    fn parse_number_rejects_non_finite_values() {
        assert_eq!(parse_number(" 2.5 "), Ok(2.5));
        assert!(matches!(
            parse_number("NaN"),
            Err(ValueParseError::NonFinite { .. })
        ));
        assert!(matches!(
            parse_number("abc"),
            Err(ValueParseError::NotNumeric { .. })
        ));
    }

    #[test]
    fn vector3_formats_round_trip_through_display() {
        for raw in ["1,2,3", "-0.5,10,7.25", "0,0,0"] {
            let parsed = parse_vector3(raw);
            assert!(!parsed.used_fallback());
            let again = parse_vector3(&parsed.value.to_string());
            assert!(approx_eq(parsed.value.x, again.value.x));
            assert!(approx_eq(parsed.value.y, again.value.y));
            assert!(approx_eq(parsed.value.z, again.value.z));
        }
    }

    #[test]
    fn vector3_accepts_brackets_and_mixed_separators() {
        let expected = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(try_parse_vector3("(1, 2, 3)"), Ok(expected));
        assert_eq!(try_parse_vector3("[1;2;3]"), Ok(expected));
        assert_eq!(try_parse_vector3("1 2 3"), Ok(expected));
    }

    #[test]
    fn single_scalar_broadcasts_to_every_axis() {
        assert_eq!(parse_vector3("2"), parse_vector3("2,2,2"));
        assert_eq!(try_parse_vector2("4"), Ok(Vec2::splat(4.0)));
    }

    #[test]
    fn vector_json_defaults_missing_keys_to_zero() {
        assert_eq!(
            try_parse_vector3(r#"{"x": 1, "z": "3"}"#),
            Ok(Vec3::new(1.0, 0.0, 3.0))
        );
        assert!(matches!(
            try_parse_vector3(r#"{"x": 1"#),
            Err(ValueParseError::MalformedJson { .. })
        ));
    }

    #[test]
    fn nan_or_infinity_invalidates_the_whole_vector() {
        let parsed = parse_vector3("NaN,0,0");
        assert_eq!(parsed.value, Vec3::ZERO);
        assert!(parsed.used_fallback());
        assert_eq!(parse_vector3("1,inf,2").value, Vec3::ZERO);
        assert_eq!(parse_vector3("1e300,0,0").value, Vec3::ZERO);
    }

    #[test]
    fn wrong_arity_falls_back_to_zero() {
        let parsed = parse_vector3("1,2");
        assert_eq!(parsed.value, Vec3::ZERO);
        assert_eq!(
            parsed.warning,
            Some(ValueParseError::WrongArity {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(parse_vector2("1,2,3").value, Vec2::ZERO);
        assert_eq!(parse_vector2("").value, Vec2::ZERO);
    }

    #[test]
    fn color_accepts_names_hex_lists_and_json() {
        assert_eq!(try_parse_color("Red"), Ok(Color::RED));
        assert_eq!(try_parse_color("grey"), Ok(Color::GRAY));
        assert_eq!(try_parse_color("#00ff00"), Ok(Color::GREEN));
        assert_eq!(try_parse_color("#f00"), Ok(Color::RED));
        assert_eq!(
            try_parse_color("#0000ff80"),
            Ok(Color::rgba(0.0, 0.0, 1.0, 128.0 / 255.0))
        );
        assert_eq!(
            try_parse_color("0.5, 0.25, 1"),
            Ok(Color::rgb(0.5, 0.25, 1.0))
        );
        assert_eq!(
            try_parse_color(r#"{"r": 1, "g": 0.5, "b": 0}"#),
            Ok(Color::rgb(1.0, 0.5, 0.0))
        );
    }

    #[test]
    fn unrecognized_color_falls_back_to_white() {
        let parsed = parse_color("chartreuse-ish");
        assert_eq!(parsed.value, Color::WHITE);
        assert!(matches!(
            parsed.warning,
            Some(ValueParseError::UnknownColor { .. })
        ));
        assert_eq!(parse_color("#12345").value, Color::WHITE);
        assert_eq!(parse_color("1,2").value, Color::WHITE);
    }

    #[test]
    fn parse_enum_matches_names_and_ordinals() {
        assert_eq!(parse_enum("high", &QUALITY).map(|v| v.name()), Ok("High"));
        assert_eq!(parse_enum("1", &QUALITY).map(|v| v.name()), Ok("Medium"));
        let error = parse_enum("Ultra", &QUALITY).expect_err("unknown variant");
        assert_eq!(
            error.to_string(),
            "'Ultra' is not a member of Quality (expected one of: Low|Medium|High)"
        );
        assert!(parse_enum("3", &QUALITY).is_err());
    }
}

use thiserror::Error;
use tracing::warn;

use super::parse::{
    parse_bool, parse_enum, parse_int, parse_number, try_parse_color, try_parse_vector2,
    try_parse_vector3, ValueParseError,
};
use super::types::{Color, TypeDescriptor, TypedValue, Vec2, Vec3};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not convert '{raw}' to {target}: {source}")]
pub struct ConversionError {
    pub raw: String,
    pub target: TypeDescriptor,
    #[source]
    pub source: ValueParseError,
}

/// Outcome of converting one raw string for one member type.
///
/// When `error` is set and the target has a documented fallback, `value`
/// holds that fallback and `used_fallback` is true. `Enum` targets have no
/// fallback, so a failed enum conversion carries no value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutcome {
    pub value: Option<TypedValue>,
    pub used_fallback: bool,
    pub error: Option<ConversionError>,
}

impl ConversionOutcome {
    fn converted(value: TypedValue) -> Self {
        Self {
            value: Some(value),
            used_fallback: false,
            error: None,
        }
    }

    pub fn is_hard_failure(&self) -> bool {
        self.value.is_none()
    }
}

/// The value substituted when parsing for `target` fails. `None` for enums,
/// which have no safe default, and for strings, which never fail to parse.
pub fn fallback_value(target: TypeDescriptor) -> Option<TypedValue> {
    match target {
        TypeDescriptor::Int => Some(TypedValue::Int(0)),
        TypeDescriptor::Float => Some(TypedValue::Float(0.0)),
        TypeDescriptor::Double => Some(TypedValue::Double(0.0)),
        TypeDescriptor::Bool => Some(TypedValue::Bool(false)),
        TypeDescriptor::String => None,
        TypeDescriptor::Vector2 => Some(TypedValue::Vector2(Vec2::ZERO)),
        TypeDescriptor::Vector3 => Some(TypedValue::Vector3(Vec3::ZERO)),
        TypeDescriptor::Color => Some(TypedValue::Color(Color::WHITE)),
        TypeDescriptor::Enum(_) => None,
    }
}

pub fn convert(raw: &str, target: TypeDescriptor) -> ConversionOutcome {
    let parsed = match target {
        TypeDescriptor::Int => parse_int(raw).map(TypedValue::Int),
        TypeDescriptor::Float => parse_number(raw).and_then(|value| narrow(value, raw)),
        TypeDescriptor::Double => parse_number(raw).map(TypedValue::Double),
        TypeDescriptor::Bool => parse_bool(raw).map(TypedValue::Bool),
        TypeDescriptor::String => {
            return ConversionOutcome::converted(TypedValue::String(raw.to_string()))
        }
        TypeDescriptor::Vector2 => try_parse_vector2(raw).map(TypedValue::Vector2),
        TypeDescriptor::Vector3 => try_parse_vector3(raw).map(TypedValue::Vector3),
        TypeDescriptor::Color => try_parse_color(raw).map(TypedValue::Color),
        TypeDescriptor::Enum(spec) => parse_enum(raw, spec).map(TypedValue::Enum),
    };

    let source = match parsed {
        Ok(value) => return ConversionOutcome::converted(value),
        Err(source) => source,
    };
    let error = ConversionError {
        raw: raw.to_string(),
        target,
        source,
    };
    match fallback_value(target) {
        Some(fallback) => {
            warn!(raw, target = %target, fallback = %fallback, "conversion_fallback_used");
            ConversionOutcome {
                value: Some(fallback),
                used_fallback: true,
                error: Some(error),
            }
        }
        None => {
            warn!(raw, target = %target, "conversion_failed_without_fallback");
            ConversionOutcome {
                value: None,
                used_fallback: false,
                error: Some(error),
            }
        }
    }
}

fn narrow(value: f64, raw: &str) -> Result<TypedValue, ValueParseError> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(TypedValue::Float(narrowed))
    } else {
        Err(ValueParseError::NonFinite {
            raw: raw.to_string(),
        })
    }
}

mod convert;
mod parse;
mod types;

pub use convert::{convert, fallback_value, ConversionError, ConversionOutcome};
pub use parse::{
    parse_bool, parse_color, parse_enum, parse_int, parse_number, parse_vector2, parse_vector3,
    try_parse_color, try_parse_vector2, try_parse_vector3, Parsed, ValueParseError,
};
pub use types::{Color, EnumSpec, EnumValue, TypeDescriptor, TypedValue, Vec2, Vec3};

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn splat(value: f32) -> Self {
        Self { x: value, y: value }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Self = Self {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(value: f32) -> Self {
        Self {
            x: value,
            y: value,
            z: value,
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Linear RGBA color with components nominally in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

/// Closed set of variant names a host enum member accepts.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumSpec {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumSpec {
    pub fn value(&'static self, index: usize) -> Option<EnumValue> {
        (index < self.variants.len()).then_some(EnumValue { spec: self, index })
    }

    pub fn find(&'static self, name: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(name))
            .map(|index| EnumValue { spec: self, index })
    }

    pub fn expected_list(&self) -> String {
        self.variants.join("|")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    spec: &'static EnumSpec,
    index: usize,
}

impl EnumValue {
    /// `index` must address one of `spec.variants`; an out-of-range index
    /// reads back as `?`.
    pub const fn of(spec: &'static EnumSpec, index: usize) -> Self {
        Self { spec, index }
    }

    pub fn spec(&self) -> &'static EnumSpec {
        self.spec
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.spec.variants.get(self.index).copied().unwrap_or("?")
    }
}

/// Static type of a host member. Resolved from the member itself, never
/// from the shape of an incoming raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescriptor {
    Int,
    Float,
    Double,
    Bool,
    String,
    Vector2,
    Vector3,
    Color,
    Enum(&'static EnumSpec),
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Int => f.write_str("Int"),
            TypeDescriptor::Float => f.write_str("Float"),
            TypeDescriptor::Double => f.write_str("Double"),
            TypeDescriptor::Bool => f.write_str("Bool"),
            TypeDescriptor::String => f.write_str("String"),
            TypeDescriptor::Vector2 => f.write_str("Vector2"),
            TypeDescriptor::Vector3 => f.write_str("Vector3"),
            TypeDescriptor::Color => f.write_str("Color"),
            TypeDescriptor::Enum(spec) => write!(f, "Enum({})", spec.name),
        }
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Vector2(Vec2),
    Vector3(Vec3),
    Color(Color),
    Enum(EnumValue),
}

impl TypedValue {
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            TypedValue::Int(_) => TypeDescriptor::Int,
            TypedValue::Float(_) => TypeDescriptor::Float,
            TypedValue::Double(_) => TypeDescriptor::Double,
            TypedValue::Bool(_) => TypeDescriptor::Bool,
            TypedValue::String(_) => TypeDescriptor::String,
            TypedValue::Vector2(_) => TypeDescriptor::Vector2,
            TypedValue::Vector3(_) => TypeDescriptor::Vector3,
            TypedValue::Color(_) => TypeDescriptor::Color,
            TypedValue::Enum(value) => TypeDescriptor::Enum(value.spec()),
        }
    }

    /// Reshapes a value for a member of type `target`. Only lossless-enough
    /// numeric widenings are accepted; everything else must already match.
    pub fn coerce_to(self, target: TypeDescriptor) -> Option<TypedValue> {
        match (self, target) {
            (value, target) if value.descriptor() == target => Some(value),
            (TypedValue::Int(v), TypeDescriptor::Float) => Some(TypedValue::Float(v as f32)),
            (TypedValue::Int(v), TypeDescriptor::Double) => Some(TypedValue::Double(v as f64)),
            (TypedValue::Float(v), TypeDescriptor::Double) => Some(TypedValue::Double(v as f64)),
            (TypedValue::Double(v), TypeDescriptor::Float) => Some(TypedValue::Float(v as f32)),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            TypedValue::Float(v) => Some(*v),
            TypedValue::Double(v) => Some(*v as f32),
            TypedValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            TypedValue::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            TypedValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            TypedValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumValue> {
        match self {
            TypedValue::Enum(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Double(v) => write!(f, "{v}"),
            TypedValue::Bool(v) => write!(f, "{v}"),
            TypedValue::String(v) => f.write_str(v),
            TypedValue::Vector2(v) => write!(f, "{v}"),
            TypedValue::Vector3(v) => write!(f, "{v}"),
            TypedValue::Color(v) => write!(f, "{v}"),
            TypedValue::Enum(v) => f.write_str(v.name()),
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Int(v) => serializer.serialize_i64(*v),
            TypedValue::Float(v) => serializer.serialize_f32(*v),
            TypedValue::Double(v) => serializer.serialize_f64(*v),
            TypedValue::Bool(v) => serializer.serialize_bool(*v),
            TypedValue::String(v) => serializer.serialize_str(v),
            TypedValue::Vector2(v) => v.serialize(serializer),
            TypedValue::Vector3(v) => v.serialize(serializer),
            TypedValue::Color(v) => v.serialize(serializer),
            TypedValue::Enum(v) => serializer.serialize_str(v.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: EnumSpec = EnumSpec {
        name: "Sample",
        variants: &["Off", "On"],
    };

    #[test]
    fn display_uses_comma_separated_components() {
        assert_eq!(TypedValue::Vector3(Vec3::new(1.0, 2.5, -3.0)).to_string(), "1,2.5,-3");
        assert_eq!(TypedValue::Color(Color::RED).to_string(), "1,0,0,1");
    }

    #[test]
    fn enum_lookup_is_case_insensitive() {
        let value = SAMPLE.find("on").expect("variant");
        assert_eq!(value.name(), "On");
        assert_eq!(value.index(), 1);
        assert!(SAMPLE.find("maybe").is_none());
        assert!(SAMPLE.value(2).is_none());
    }

    #[test]
    fn coerce_widens_numbers_but_rejects_shape_changes() {
        assert_eq!(
            TypedValue::Int(3).coerce_to(TypeDescriptor::Float),
            Some(TypedValue::Float(3.0))
        );
        assert_eq!(TypedValue::Bool(true).coerce_to(TypeDescriptor::Int), None);
        assert_eq!(
            TypedValue::Vector3(Vec3::ONE).coerce_to(TypeDescriptor::Vector2),
            None
        );
    }

    #[test]
    fn serializes_enum_as_variant_name() {
        let value = TypedValue::Enum(SAMPLE.find("off").expect("variant"));
        assert_eq!(serde_json::to_string(&value).expect("json"), "\"Off\"");
        assert_eq!(
            serde_json::to_string(&TypeDescriptor::Enum(&SAMPLE)).expect("json"),
            "\"Enum(Sample)\""
        );
    }
}

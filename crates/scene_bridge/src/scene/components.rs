use crate::reflect::{Member, MemberTable, Reflect};
use crate::values::{Color, EnumSpec, EnumValue, TypeDescriptor, TypedValue, Vec3};

pub static LIGHT_TYPE: EnumSpec = EnumSpec {
    name: "LightType",
    variants: &["Spot", "Directional", "Point", "Area"],
};

pub static RIGIDBODY_INTERPOLATION: EnumSpec = EnumSpec {
    name: "RigidbodyInterpolation",
    variants: &["None", "Interpolate", "Extrapolate"],
};

pub static SHADOW_CASTING_MODE: EnumSpec = EnumSpec {
    name: "ShadowCastingMode",
    variants: &["Off", "On", "TwoSided", "ShadowsOnly"],
};

/// Rust-side enum mirrored by an [`EnumSpec`]; `ALL` is in spec order.
trait HostEnum: Copy + PartialEq + 'static {
    const SPEC: &'static EnumSpec;
    const ALL: &'static [Self];

    fn to_typed(self) -> TypedValue {
        let index = Self::ALL
            .iter()
            .position(|variant| *variant == self)
            .unwrap_or(0);
        TypedValue::Enum(EnumValue::of(Self::SPEC, index))
    }

    fn from_typed(value: &TypedValue) -> Option<Self> {
        let value = value.as_enum()?;
        if value.spec() != Self::SPEC {
            return None;
        }
        Self::ALL.get(value.index()).copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LightType {
    Spot,
    Directional,
    #[default]
    Point,
    Area,
}

impl HostEnum for LightType {
    const SPEC: &'static EnumSpec = &LIGHT_TYPE;
    const ALL: &'static [Self] = &[Self::Spot, Self::Directional, Self::Point, Self::Area];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RigidbodyInterpolation {
    #[default]
    None,
    Interpolate,
    Extrapolate,
}

impl HostEnum for RigidbodyInterpolation {
    const SPEC: &'static EnumSpec = &RIGIDBODY_INTERPOLATION;
    const ALL: &'static [Self] = &[Self::None, Self::Interpolate, Self::Extrapolate];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShadowCastingMode {
    Off,
    #[default]
    On,
    TwoSided,
    ShadowsOnly,
}

impl HostEnum for ShadowCastingMode {
    const SPEC: &'static EnumSpec = &SHADOW_CASTING_MODE;
    const ALL: &'static [Self] = &[Self::Off, Self::On, Self::TwoSided, Self::ShadowsOnly];
}

/// Object-level state; the `GameObject` kind resolves to this.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub name: String,
    pub active: bool,
    pub tag: String,
    pub layer: i64,
    pub is_static: bool,
}

impl GameObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            tag: "Untagged".to_string(),
            layer: 0,
            is_static: false,
        }
    }
}

static GAME_OBJECT_MEMBERS: &[Member<GameObject>] = &[
    Member::property(
        "name",
        TypeDescriptor::String,
        |object: &GameObject| TypedValue::String(object.name.clone()),
        |object: &mut GameObject, value: TypedValue| {
            if let TypedValue::String(name) = value {
                object.name = name;
            }
        },
    ),
    Member::property(
        "active",
        TypeDescriptor::Bool,
        |object: &GameObject| TypedValue::Bool(object.active),
        |object: &mut GameObject, value: TypedValue| {
            if let Some(active) = value.as_bool() {
                object.active = active;
            }
        },
    ),
    Member::property(
        "tag",
        TypeDescriptor::String,
        |object: &GameObject| TypedValue::String(object.tag.clone()),
        |object: &mut GameObject, value: TypedValue| {
            if let TypedValue::String(tag) = value {
                object.tag = tag;
            }
        },
    ),
    Member::property(
        "layer",
        TypeDescriptor::Int,
        |object: &GameObject| TypedValue::Int(object.layer),
        |object: &mut GameObject, value: TypedValue| {
            if let Some(layer) = value.as_i64() {
                object.layer = layer;
            }
        },
    ),
    Member::property(
        "isStatic",
        TypeDescriptor::Bool,
        |object: &GameObject| TypedValue::Bool(object.is_static),
        |object: &mut GameObject, value: TypedValue| {
            if let Some(is_static) = value.as_bool() {
                object.is_static = is_static;
            }
        },
    ),
];

impl MemberTable for GameObject {
    const KIND: &'static str = "GameObject";

    fn table() -> &'static [Member<Self>] {
        GAME_OBJECT_MEMBERS
    }
}

/// `rotation` holds Euler angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub local_scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            local_scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        let pitch = self.rotation.x.to_radians();
        let yaw = self.rotation.y.to_radians();
        Vec3 {
            x: yaw.sin() * pitch.cos(),
            y: -pitch.sin(),
            z: yaw.cos() * pitch.cos(),
        }
    }
}

static TRANSFORM_MEMBERS: &[Member<Transform>] = &[
    Member::property(
        "position",
        TypeDescriptor::Vector3,
        |transform: &Transform| TypedValue::Vector3(transform.position),
        |transform: &mut Transform, value: TypedValue| {
            if let Some(position) = value.as_vec3() {
                transform.position = position;
            }
        },
    ),
    Member::property(
        "rotation",
        TypeDescriptor::Vector3,
        |transform: &Transform| TypedValue::Vector3(transform.rotation),
        |transform: &mut Transform, value: TypedValue| {
            if let Some(rotation) = value.as_vec3() {
                transform.rotation = rotation;
            }
        },
    ),
    Member::property(
        "localScale",
        TypeDescriptor::Vector3,
        |transform: &Transform| TypedValue::Vector3(transform.local_scale),
        |transform: &mut Transform, value: TypedValue| {
            if let Some(scale) = value.as_vec3() {
                transform.local_scale = scale;
            }
        },
    ),
    Member::read_only("forward", TypeDescriptor::Vector3, |transform: &Transform| {
        TypedValue::Vector3(transform.forward())
    }),
];

impl MemberTable for Transform {
    const KIND: &'static str = "Transform";

    fn table() -> &'static [Member<Self>] {
        TRANSFORM_MEMBERS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub render_queue: i64,
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            render_queue: 2000,
        }
    }
}

static MATERIAL_MEMBERS: &[Member<Material>] = &[
    Member::property(
        "name",
        TypeDescriptor::String,
        |material: &Material| TypedValue::String(material.name.clone()),
        |material: &mut Material, value: TypedValue| {
            if let TypedValue::String(name) = value {
                material.name = name;
            }
        },
    ),
    Member::property(
        "color",
        TypeDescriptor::Color,
        |material: &Material| TypedValue::Color(material.color),
        |material: &mut Material, value: TypedValue| {
            if let Some(color) = value.as_color() {
                material.color = color;
            }
        },
    ),
    Member::property(
        "renderQueue",
        TypeDescriptor::Int,
        |material: &Material| TypedValue::Int(material.render_queue),
        |material: &mut Material, value: TypedValue| {
            if let Some(queue) = value.as_i64() {
                material.render_queue = queue;
            }
        },
    ),
];

impl MemberTable for Material {
    const KIND: &'static str = "Material";

    fn table() -> &'static [Member<Self>] {
        MATERIAL_MEMBERS
    }
}

fn material_name(material: &Option<Material>) -> TypedValue {
    TypedValue::String(
        material
            .as_ref()
            .map(|material| material.name.clone())
            .unwrap_or_default(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    pub enabled: bool,
    pub material: Option<Material>,
    pub shadow_casting_mode: ShadowCastingMode,
    pub receive_shadows: bool,
    pub sorting_order: i64,
}

impl MeshRenderer {
    pub fn with_material(material: Material) -> Self {
        Self {
            material: Some(material),
            ..Self::default()
        }
    }
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            enabled: true,
            material: None,
            shadow_casting_mode: ShadowCastingMode::On,
            receive_shadows: true,
            sorting_order: 0,
        }
    }
}

static MESH_RENDERER_MEMBERS: &[Member<MeshRenderer>] = &[
    Member::property(
        "enabled",
        TypeDescriptor::Bool,
        |renderer: &MeshRenderer| TypedValue::Bool(renderer.enabled),
        |renderer: &mut MeshRenderer, value: TypedValue| {
            if let Some(enabled) = value.as_bool() {
                renderer.enabled = enabled;
            }
        },
    ),
    Member::read_only("material", TypeDescriptor::String, |renderer: &MeshRenderer| {
        material_name(&renderer.material)
    }),
    Member::property(
        "shadowCastingMode",
        TypeDescriptor::Enum(&SHADOW_CASTING_MODE),
        |renderer: &MeshRenderer| renderer.shadow_casting_mode.to_typed(),
        |renderer: &mut MeshRenderer, value: TypedValue| {
            if let Some(mode) = ShadowCastingMode::from_typed(&value) {
                renderer.shadow_casting_mode = mode;
            }
        },
    ),
    Member::property(
        "receiveShadows",
        TypeDescriptor::Bool,
        |renderer: &MeshRenderer| TypedValue::Bool(renderer.receive_shadows),
        |renderer: &mut MeshRenderer, value: TypedValue| {
            if let Some(receive) = value.as_bool() {
                renderer.receive_shadows = receive;
            }
        },
    ),
    Member::field(
        "sortingOrder",
        TypeDescriptor::Int,
        |renderer: &MeshRenderer| TypedValue::Int(renderer.sorting_order),
        |renderer: &mut MeshRenderer, value: TypedValue| {
            if let Some(order) = value.as_i64() {
                renderer.sorting_order = order;
            }
        },
    ),
];

impl MemberTable for MeshRenderer {
    const KIND: &'static str = "MeshRenderer";

    fn table() -> &'static [Member<Self>] {
        MESH_RENDERER_MEMBERS
    }

    fn owned_child(&self, name: &str) -> Option<&dyn Reflect> {
        match name {
            "material" => self.material.as_ref().map(|material| material as &dyn Reflect),
            _ => None,
        }
    }

    fn owned_child_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        match name {
            "material" => self
                .material
                .as_mut()
                .map(|material| material as &mut dyn Reflect),
            _ => None,
        }
    }

    fn owned_child_names(&self) -> Vec<&'static str> {
        if self.material.is_some() {
            vec!["material"]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteRenderer {
    pub enabled: bool,
    pub material: Option<Material>,
    pub sprite: String,
    pub flip_x: bool,
    pub flip_y: bool,
    pub sorting_order: i64,
}

impl SpriteRenderer {
    pub fn new(sprite: impl Into<String>, material: Option<Material>) -> Self {
        Self {
            enabled: true,
            material,
            sprite: sprite.into(),
            flip_x: false,
            flip_y: false,
            sorting_order: 0,
        }
    }
}

static SPRITE_RENDERER_MEMBERS: &[Member<SpriteRenderer>] = &[
    Member::property(
        "enabled",
        TypeDescriptor::Bool,
        |renderer: &SpriteRenderer| TypedValue::Bool(renderer.enabled),
        |renderer: &mut SpriteRenderer, value: TypedValue| {
            if let Some(enabled) = value.as_bool() {
                renderer.enabled = enabled;
            }
        },
    ),
    Member::read_only("material", TypeDescriptor::String, |renderer: &SpriteRenderer| {
        material_name(&renderer.material)
    }),
    Member::property(
        "sprite",
        TypeDescriptor::String,
        |renderer: &SpriteRenderer| TypedValue::String(renderer.sprite.clone()),
        |renderer: &mut SpriteRenderer, value: TypedValue| {
            if let TypedValue::String(sprite) = value {
                renderer.sprite = sprite;
            }
        },
    ),
    Member::property(
        "flipX",
        TypeDescriptor::Bool,
        |renderer: &SpriteRenderer| TypedValue::Bool(renderer.flip_x),
        |renderer: &mut SpriteRenderer, value: TypedValue| {
            if let Some(flip) = value.as_bool() {
                renderer.flip_x = flip;
            }
        },
    ),
    Member::property(
        "flipY",
        TypeDescriptor::Bool,
        |renderer: &SpriteRenderer| TypedValue::Bool(renderer.flip_y),
        |renderer: &mut SpriteRenderer, value: TypedValue| {
            if let Some(flip) = value.as_bool() {
                renderer.flip_y = flip;
            }
        },
    ),
    Member::field(
        "sortingOrder",
        TypeDescriptor::Int,
        |renderer: &SpriteRenderer| TypedValue::Int(renderer.sorting_order),
        |renderer: &mut SpriteRenderer, value: TypedValue| {
            if let Some(order) = value.as_i64() {
                renderer.sorting_order = order;
            }
        },
    ),
];

impl MemberTable for SpriteRenderer {
    const KIND: &'static str = "SpriteRenderer";

    fn table() -> &'static [Member<Self>] {
        SPRITE_RENDERER_MEMBERS
    }

    fn owned_child(&self, name: &str) -> Option<&dyn Reflect> {
        match name {
            "material" => self.material.as_ref().map(|material| material as &dyn Reflect),
            _ => None,
        }
    }

    fn owned_child_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        match name {
            "material" => self
                .material
                .as_mut()
                .map(|material| material as &mut dyn Reflect),
            _ => None,
        }
    }

    fn owned_child_names(&self) -> Vec<&'static str> {
        if self.material.is_some() {
            vec!["material"]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    pub spot_angle: f32,
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
            spot_angle: 30.0,
            enabled: true,
        }
    }
}

static LIGHT_MEMBERS: &[Member<Light>] = &[
    Member::property(
        "type",
        TypeDescriptor::Enum(&LIGHT_TYPE),
        |light: &Light| light.light_type.to_typed(),
        |light: &mut Light, value: TypedValue| {
            if let Some(light_type) = LightType::from_typed(&value) {
                light.light_type = light_type;
            }
        },
    ),
    Member::property(
        "color",
        TypeDescriptor::Color,
        |light: &Light| TypedValue::Color(light.color),
        |light: &mut Light, value: TypedValue| {
            if let Some(color) = value.as_color() {
                light.color = color;
            }
        },
    ),
    Member::property(
        "intensity",
        TypeDescriptor::Float,
        |light: &Light| TypedValue::Float(light.intensity),
        |light: &mut Light, value: TypedValue| {
            if let Some(intensity) = value.as_f32() {
                light.intensity = intensity;
            }
        },
    ),
    Member::property(
        "range",
        TypeDescriptor::Float,
        |light: &Light| TypedValue::Float(light.range),
        |light: &mut Light, value: TypedValue| {
            if let Some(range) = value.as_f32() {
                light.range = range;
            }
        },
    ),
    Member::property(
        "spotAngle",
        TypeDescriptor::Float,
        |light: &Light| TypedValue::Float(light.spot_angle),
        |light: &mut Light, value: TypedValue| {
            if let Some(angle) = value.as_f32() {
                light.spot_angle = angle;
            }
        },
    ),
    Member::property(
        "enabled",
        TypeDescriptor::Bool,
        |light: &Light| TypedValue::Bool(light.enabled),
        |light: &mut Light, value: TypedValue| {
            if let Some(enabled) = value.as_bool() {
                light.enabled = enabled;
            }
        },
    ),
];

impl MemberTable for Light {
    const KIND: &'static str = "Light";

    fn table() -> &'static [Member<Self>] {
        LIGHT_MEMBERS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub field_of_view: f32,
    pub near_clip_plane: f32,
    pub far_clip_plane: f32,
    pub orthographic: bool,
    pub orthographic_size: f32,
    pub depth: f32,
    pub background_color: Color,
    pub enabled: bool,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            near_clip_plane: 0.3,
            far_clip_plane: 1000.0,
            orthographic: false,
            orthographic_size: 5.0,
            depth: -1.0,
            background_color: Color::rgb(0.19, 0.3, 0.47),
            enabled: true,
            aspect: 16.0 / 9.0,
        }
    }
}

static CAMERA_MEMBERS: &[Member<Camera>] = &[
    Member::property(
        "fieldOfView",
        TypeDescriptor::Float,
        |camera: &Camera| TypedValue::Float(camera.field_of_view),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(fov) = value.as_f32() {
                camera.field_of_view = fov;
            }
        },
    ),
    Member::property(
        "nearClipPlane",
        TypeDescriptor::Float,
        |camera: &Camera| TypedValue::Float(camera.near_clip_plane),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(near) = value.as_f32() {
                camera.near_clip_plane = near;
            }
        },
    ),
    Member::property(
        "farClipPlane",
        TypeDescriptor::Float,
        |camera: &Camera| TypedValue::Float(camera.far_clip_plane),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(far) = value.as_f32() {
                camera.far_clip_plane = far;
            }
        },
    ),
    Member::property(
        "orthographic",
        TypeDescriptor::Bool,
        |camera: &Camera| TypedValue::Bool(camera.orthographic),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(orthographic) = value.as_bool() {
                camera.orthographic = orthographic;
            }
        },
    ),
    Member::property(
        "orthographicSize",
        TypeDescriptor::Float,
        |camera: &Camera| TypedValue::Float(camera.orthographic_size),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(size) = value.as_f32() {
                camera.orthographic_size = size;
            }
        },
    ),
    Member::property(
        "depth",
        TypeDescriptor::Float,
        |camera: &Camera| TypedValue::Float(camera.depth),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(depth) = value.as_f32() {
                camera.depth = depth;
            }
        },
    ),
    Member::property(
        "backgroundColor",
        TypeDescriptor::Color,
        |camera: &Camera| TypedValue::Color(camera.background_color),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(color) = value.as_color() {
                camera.background_color = color;
            }
        },
    ),
    Member::property(
        "enabled",
        TypeDescriptor::Bool,
        |camera: &Camera| TypedValue::Bool(camera.enabled),
        |camera: &mut Camera, value: TypedValue| {
            if let Some(enabled) = value.as_bool() {
                camera.enabled = enabled;
            }
        },
    ),
    Member::read_only("aspect", TypeDescriptor::Float, |camera: &Camera| {
        TypedValue::Float(camera.aspect)
    }),
];

impl MemberTable for Camera {
    const KIND: &'static str = "Camera";

    fn table() -> &'static [Member<Self>] {
        CAMERA_MEMBERS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rigidbody {
    pub mass: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub use_gravity: bool,
    pub is_kinematic: bool,
    pub interpolation: RigidbodyInterpolation,
    pub freeze_rotation: bool,
    pub velocity: Vec3,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            angular_drag: 0.05,
            use_gravity: true,
            is_kinematic: false,
            interpolation: RigidbodyInterpolation::None,
            freeze_rotation: false,
            velocity: Vec3::ZERO,
        }
    }
}

static RIGIDBODY_MEMBERS: &[Member<Rigidbody>] = &[
    Member::property(
        "mass",
        TypeDescriptor::Float,
        |body: &Rigidbody| TypedValue::Float(body.mass),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(mass) = value.as_f32() {
                body.mass = mass;
            }
        },
    ),
    Member::property(
        "drag",
        TypeDescriptor::Float,
        |body: &Rigidbody| TypedValue::Float(body.drag),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(drag) = value.as_f32() {
                body.drag = drag;
            }
        },
    ),
    Member::property(
        "angularDrag",
        TypeDescriptor::Float,
        |body: &Rigidbody| TypedValue::Float(body.angular_drag),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(drag) = value.as_f32() {
                body.angular_drag = drag;
            }
        },
    ),
    Member::property(
        "useGravity",
        TypeDescriptor::Bool,
        |body: &Rigidbody| TypedValue::Bool(body.use_gravity),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(use_gravity) = value.as_bool() {
                body.use_gravity = use_gravity;
            }
        },
    ),
    Member::property(
        "isKinematic",
        TypeDescriptor::Bool,
        |body: &Rigidbody| TypedValue::Bool(body.is_kinematic),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(kinematic) = value.as_bool() {
                body.is_kinematic = kinematic;
            }
        },
    ),
    Member::property(
        "interpolation",
        TypeDescriptor::Enum(&RIGIDBODY_INTERPOLATION),
        |body: &Rigidbody| body.interpolation.to_typed(),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(mode) = RigidbodyInterpolation::from_typed(&value) {
                body.interpolation = mode;
            }
        },
    ),
    Member::property(
        "freezeRotation",
        TypeDescriptor::Bool,
        |body: &Rigidbody| TypedValue::Bool(body.freeze_rotation),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(freeze) = value.as_bool() {
                body.freeze_rotation = freeze;
            }
        },
    ),
    Member::property(
        "velocity",
        TypeDescriptor::Vector3,
        |body: &Rigidbody| TypedValue::Vector3(body.velocity),
        |body: &mut Rigidbody, value: TypedValue| {
            if let Some(velocity) = value.as_vec3() {
                body.velocity = velocity;
            }
        },
    ),
];

impl MemberTable for Rigidbody {
    const KIND: &'static str = "Rigidbody";

    fn table() -> &'static [Member<Self>] {
        RIGIDBODY_MEMBERS
    }
}

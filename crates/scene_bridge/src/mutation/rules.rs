//! Logical properties that a plain member lookup cannot express.
//!
//! Rules are checked in table order before alias resolution. The first rule
//! whose kind and property match handles the field, and its outcome is final
//! whether or not it applied.

use crate::reflect::Reflect;
use crate::values::{convert, TypeDescriptor, TypedValue};

use super::alias::is_renderer_kind;
use super::applier::assign;
use super::context::MutationContext;
use super::types::{FieldErrorCode, FieldOutcome, FieldRequest};

type CustomRule = fn(&mut dyn Reflect, &FieldRequest, &mut MutationContext<'_>) -> FieldOutcome;

#[derive(Debug, Clone, Copy)]
enum KindMatch {
    Exact(&'static str),
    RendererLike,
}

impl KindMatch {
    fn matches(self, kind: &str) -> bool {
        match self {
            KindMatch::Exact(expected) => expected.eq_ignore_ascii_case(kind),
            KindMatch::RendererLike => is_renderer_kind(kind),
        }
    }
}

#[derive(Clone, Copy)]
enum RuleAction {
    Assign(&'static str),
    Custom(CustomRule),
}

pub(crate) struct SpecialRule {
    name: &'static str,
    kind: KindMatch,
    /// Lower-case; requests are matched case-insensitively.
    properties: &'static [&'static str],
    action: RuleAction,
}

impl SpecialRule {
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, kind: &str, property: &str) -> bool {
        self.kind.matches(kind)
            && self
                .properties
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(property))
    }

    pub(crate) fn apply(
        &self,
        target: &mut dyn Reflect,
        field: &FieldRequest,
        ctx: &mut MutationContext<'_>,
    ) -> FieldOutcome {
        match self.action {
            RuleAction::Assign(member) => assign(target, field, member, ctx),
            RuleAction::Custom(apply) => apply(target, field, ctx),
        }
    }
}

const fn rule(
    name: &'static str,
    kind: KindMatch,
    properties: &'static [&'static str],
    action: RuleAction,
) -> SpecialRule {
    SpecialRule {
        name,
        kind,
        properties,
        action,
    }
}

static RULES: &[SpecialRule] = &[
    rule(
        "transform_axis",
        KindMatch::Exact("Transform"),
        &["x", "y", "z", "posx", "posy", "posz"],
        RuleAction::Custom(set_position_axis),
    ),
    rule(
        "transform_position",
        KindMatch::Exact("Transform"),
        &["pos", "position"],
        RuleAction::Assign("position"),
    ),
    rule(
        "transform_rotation",
        KindMatch::Exact("Transform"),
        &["rot", "rotation"],
        RuleAction::Assign("rotation"),
    ),
    rule(
        "transform_scale",
        KindMatch::Exact("Transform"),
        &["scale"],
        RuleAction::Assign("localScale"),
    ),
    rule(
        "renderer_color",
        KindMatch::RendererLike,
        &["color"],
        RuleAction::Custom(set_material_color),
    ),
    rule(
        "renderer_enabled",
        KindMatch::RendererLike,
        &["enabled"],
        RuleAction::Assign("enabled"),
    ),
    rule(
        "light_color",
        KindMatch::Exact("Light"),
        &["color"],
        RuleAction::Assign("color"),
    ),
    rule(
        "light_intensity",
        KindMatch::Exact("Light"),
        &["intensity"],
        RuleAction::Assign("intensity"),
    ),
    rule(
        "light_range",
        KindMatch::Exact("Light"),
        &["range"],
        RuleAction::Assign("range"),
    ),
    rule(
        "light_enabled",
        KindMatch::Exact("Light"),
        &["enabled"],
        RuleAction::Assign("enabled"),
    ),
    rule(
        "camera_fov",
        KindMatch::Exact("Camera"),
        &["fov", "fieldofview"],
        RuleAction::Assign("fieldOfView"),
    ),
    rule(
        "camera_near",
        KindMatch::Exact("Camera"),
        &["near", "nearplane"],
        RuleAction::Assign("nearClipPlane"),
    ),
    rule(
        "camera_far",
        KindMatch::Exact("Camera"),
        &["far", "farplane"],
        RuleAction::Assign("farClipPlane"),
    ),
    rule(
        "camera_orthographic",
        KindMatch::Exact("Camera"),
        &["orthographic"],
        RuleAction::Assign("orthographic"),
    ),
    rule(
        "body_mass",
        KindMatch::Exact("Rigidbody"),
        &["mass"],
        RuleAction::Assign("mass"),
    ),
    rule(
        "body_drag",
        KindMatch::Exact("Rigidbody"),
        &["drag"],
        RuleAction::Assign("drag"),
    ),
    rule(
        "body_angular_drag",
        KindMatch::Exact("Rigidbody"),
        &["angulardrag"],
        RuleAction::Assign("angularDrag"),
    ),
    rule(
        "body_use_gravity",
        KindMatch::Exact("Rigidbody"),
        &["usegravity"],
        RuleAction::Assign("useGravity"),
    ),
    rule(
        "body_is_kinematic",
        KindMatch::Exact("Rigidbody"),
        &["iskinematic"],
        RuleAction::Assign("isKinematic"),
    ),
    rule(
        "body_interpolate",
        KindMatch::Exact("Rigidbody"),
        &["interpolate"],
        RuleAction::Assign("interpolation"),
    ),
    rule(
        "body_freeze_position",
        KindMatch::Exact("Rigidbody"),
        &[
            "freezeposition",
            "freezepositionx",
            "freezepositiony",
            "freezepositionz",
        ],
        RuleAction::Custom(freeze_position_as_rotation),
    ),
];

pub(crate) fn find_rule(kind: &str, property: &str) -> Option<&'static SpecialRule> {
    RULES.iter().find(|rule| rule.matches(kind, property))
}

fn set_position_axis(
    target: &mut dyn Reflect,
    field: &FieldRequest,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    let Some(mut position) = target.read("position").and_then(|value| value.as_vec3()) else {
        return FieldOutcome::failed(
            &field.name,
            FieldErrorCode::RuleFailed,
            "target has no Vector3 position",
        );
    };
    let outcome = convert(&field.raw_value, TypeDescriptor::Float);
    let axis_value = outcome
        .value
        .as_ref()
        .and_then(TypedValue::as_f32)
        .unwrap_or(0.0);
    // `x` and `posx` alike: the axis is the last letter.
    match field.name.to_ascii_lowercase().chars().last() {
        Some('x') => position.x = axis_value,
        Some('y') => position.y = axis_value,
        _ => position.z = axis_value,
    }
    if let Err(err) = target.write("position", TypedValue::Vector3(position)) {
        return FieldOutcome::failed(&field.name, FieldErrorCode::RuleFailed, err.to_string());
    }
    match outcome.error {
        Some(error) => {
            ctx.warn(&field.name, error.to_string());
            FieldOutcome::applied_with_fallback(&field.name, format!("{position} ({error})"))
        }
        None => FieldOutcome::applied(&field.name, position.to_string()),
    }
}

fn set_material_color(
    target: &mut dyn Reflect,
    field: &FieldRequest,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    match target.child_mut("material") {
        Some(material) => assign(material, field, "color", ctx),
        None => FieldOutcome::failed(
            &field.name,
            FieldErrorCode::RuleFailed,
            "renderer has no material to color",
        ),
    }
}

// Every freezeposition variant drives the rotation freeze flag. Each use
// leaves an Info diagnostic.
fn freeze_position_as_rotation(
    target: &mut dyn Reflect,
    field: &FieldRequest,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    ctx.info(&field.name, format!("'{}' sets freezeRotation", field.name));
    assign(target, field, "freezeRotation", ctx)
}

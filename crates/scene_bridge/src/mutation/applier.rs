use tracing::debug;

use crate::reflect::{MemberAccess, MemberWriteError, Reflect};
use crate::scene::TargetHandle;
use crate::values::convert;

use super::alias;
use super::context::MutationContext;
use super::history::apply_field_recorded;
use super::report::{summarize, BatchResult};
use super::rules::find_rule;
use super::types::{BatchError, FieldErrorCode, FieldOutcome, FieldRequest};

const LISTED_MEMBER_LIMIT: usize = 10;

/// Applies one field to one target. Never aborts: every problem comes back
/// as a failed [`FieldOutcome`].
pub fn apply_field(
    target: &mut TargetHandle<'_>,
    field: &FieldRequest,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    if let Some(rule) = find_rule(&target.kind, &field.name) {
        debug!(field = %field.name, rule = rule.name(), "special_rule_matched");
        return rule.apply(target.object, field, ctx);
    }

    let members = target.object.members();
    let canonical = alias::resolve(&target.kind, &field.name, &members);
    let writable = |access: MemberAccess| {
        members
            .iter()
            .any(|member| member.name == canonical && member.access == access && member.writable)
    };
    if writable(MemberAccess::Property) || writable(MemberAccess::Field) {
        return assign(target.object, field, &canonical, ctx);
    }
    if members.iter().any(|member| member.name == canonical) {
        return FieldOutcome::failed(
            &field.name,
            FieldErrorCode::ReadOnly,
            format!("member '{canonical}' on {} is read-only", target.kind),
        );
    }
    member_not_found(target.object, field, &canonical)
}

/// Runs every field in order against the same target; later fields see the
/// effects of earlier ones.
pub fn apply_batch(
    target: &mut TargetHandle<'_>,
    fields: &[FieldRequest],
    ctx: &mut MutationContext<'_>,
) -> Result<BatchResult, BatchError> {
    if fields.is_empty() {
        return Err(BatchError::NoFields);
    }
    let outcomes = fields
        .iter()
        .map(|field| apply_field_recorded(target, field, ctx))
        .collect::<Vec<_>>();
    let result = summarize(outcomes);
    if result.full_success {
        Ok(result)
    } else {
        Ok(result.with_available_members(target.object.writable_member_names()))
    }
}

/// Converts `field.raw_value` for `member` and writes it. A parse failure
/// with a fallback still writes the fallback and reports `MalformedValue`.
pub(crate) fn assign(
    target: &mut dyn Reflect,
    field: &FieldRequest,
    member: &str,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    let Some(info) = target.member_info(member) else {
        return member_not_found(target, field, member);
    };
    if !info.writable {
        return FieldOutcome::failed(
            &field.name,
            FieldErrorCode::ReadOnly,
            format!("member '{member}' on {} is read-only", target.kind()),
        );
    }

    let outcome = convert(&field.raw_value, info.descriptor);
    let Some(value) = outcome.value else {
        let message = outcome.error.map_or_else(
            || format!("could not convert '{}' to {}", field.raw_value, info.descriptor),
            |error| error.to_string(),
        );
        ctx.warn(&field.name, message.clone());
        return FieldOutcome::failed(&field.name, FieldErrorCode::EnumParseFailure, message);
    };

    let detail = value.to_string();
    if let Err(err) = target.write(member, value) {
        let code = match err {
            MemberWriteError::Unknown { .. } => FieldErrorCode::MemberNotFound,
            MemberWriteError::ReadOnly { .. } => FieldErrorCode::ReadOnly,
            MemberWriteError::TypeMismatch { .. } => FieldErrorCode::MalformedValue,
        };
        return FieldOutcome::failed(&field.name, code, err.to_string());
    }

    match outcome.error {
        Some(error) => {
            ctx.warn(&field.name, error.to_string());
            FieldOutcome::applied_with_fallback(&field.name, format!("{detail} ({error})"))
        }
        None => FieldOutcome::applied(&field.name, detail),
    }
}

fn member_not_found(target: &dyn Reflect, field: &FieldRequest, canonical: &str) -> FieldOutcome {
    let available = target
        .writable_member_names()
        .into_iter()
        .take(LISTED_MEMBER_LIMIT)
        .collect::<Vec<_>>();
    let resolved = if canonical == field.name {
        String::new()
    } else {
        format!(" (resolved to '{canonical}')")
    };
    FieldOutcome::failed(
        &field.name,
        FieldErrorCode::MemberNotFound,
        format!(
            "no writable member '{}'{resolved} on {}; available: {}",
            field.name,
            target.kind(),
            available.join(", ")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::context::Diagnostic;
    use crate::reflect::DynamicObject;
    use crate::scene::components::{Camera, GameObject, Light, Transform};
    use crate::scene::ObjectId;
    use crate::values::{Color, TypedValue, Vec3};

    fn apply(object: &mut dyn Reflect, name: &str, raw: &str) -> (FieldOutcome, Vec<Diagnostic>) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let kind = object.kind().to_string();
        let mut handle = TargetHandle {
            id: ObjectId(0),
            kind,
            object,
        };
        let outcome = {
            let mut ctx = MutationContext::new(&mut sink);
            apply_field(&mut handle, &FieldRequest::new(name, raw), &mut ctx)
        };
        (outcome, sink)
    }

    #[test]
    fn camera_plane_alias_reports_converted_value() {
        let mut camera = Camera::default();
        let (outcome, _) = apply(&mut camera, "FarPlane", "500");
        assert!(outcome.applied);
        assert_eq!(outcome.detail, "500");
        assert_eq!(camera.far_clip_plane, 500.0);
    }

    #[test]
    fn fallback_is_applied_and_flagged() {
        let mut transform = Transform::at(Vec3::ONE);
        let (outcome, diagnostics) = apply(&mut transform, "position", "1,2");
        assert!(outcome.applied);
        assert_eq!(outcome.code, Some(FieldErrorCode::MalformedValue));
        assert!(outcome.detail.starts_with("0,0,0"));
        assert_eq!(transform.position, Vec3::ZERO);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn read_only_members_are_refused() {
        let mut transform = Transform::default();
        let (outcome, _) = apply(&mut transform, "forward", "0,0,1");
        assert!(!outcome.applied);
        assert_eq!(outcome.code, Some(FieldErrorCode::ReadOnly));
    }

    #[test]
    fn unknown_member_lists_writable_alternatives() {
        let mut light = Light::default();
        let (outcome, _) = apply(&mut light, "bogusProp", "1");
        assert!(!outcome.applied);
        assert_eq!(outcome.code, Some(FieldErrorCode::MemberNotFound));
        assert!(outcome.detail.contains("intensity"), "{}", outcome.detail);
        assert!(outcome.detail.contains("spotAngle"), "{}", outcome.detail);
    }

    #[test]
    fn member_list_is_capped() {
        let mut object = DynamicObject::new("Wide");
        for index in 0..12 {
            object.insert(format!("m{index:02}"), TypedValue::Int(0), true);
        }
        let (outcome, _) = apply(&mut object, "missing", "1");
        assert!(outcome.detail.contains("m09"));
        assert!(!outcome.detail.contains("m10"));
    }

    #[test]
    fn enum_members_accept_names_and_fail_hard_otherwise() {
        let mut light = Light::default();
        let (outcome, _) = apply(&mut light, "type", "directional");
        assert!(outcome.applied);
        assert_eq!(outcome.detail, "Directional");

        let (outcome, diagnostics) = apply(&mut light, "type", "Laser");
        assert!(!outcome.applied);
        assert_eq!(outcome.code, Some(FieldErrorCode::EnumParseFailure));
        assert!(outcome.detail.contains("Laser"));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn game_object_aliases_reach_active() {
        let mut object = GameObject::named("Lamp");
        let (outcome, _) = apply(&mut object, "visible", "off");
        assert!(outcome.applied);
        assert!(!object.active);
    }

    #[test]
    fn light_color_goes_through_rule() {
        let mut light = Light::default();
        let (outcome, _) = apply(&mut light, "Color", "#00ff00");
        assert!(outcome.applied);
        assert_eq!(light.color, Color::GREEN);
    }
}

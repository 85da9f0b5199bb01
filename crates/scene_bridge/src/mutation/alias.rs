use crate::reflect::MemberInfo;

type AliasTable = &'static [(&'static str, &'static str)];

const TRANSFORM_ALIASES: AliasTable = &[
    ("x", "position"),
    ("posx", "position"),
    ("y", "position"),
    ("posy", "position"),
    ("z", "position"),
    ("posz", "position"),
    ("pos", "position"),
    ("rot", "rotation"),
    ("scale", "localScale"),
];

const LIGHT_ALIASES: AliasTable = &[
    ("color", "color"),
    ("intensity", "intensity"),
    ("range", "range"),
    ("type", "type"),
    ("enabled", "enabled"),
];

const CAMERA_ALIASES: AliasTable = &[
    ("fov", "fieldOfView"),
    ("fieldofview", "fieldOfView"),
    ("near", "nearClipPlane"),
    ("nearplane", "nearClipPlane"),
    ("far", "farClipPlane"),
    ("farplane", "farClipPlane"),
];

// `color` lands on `material`, which is read-only by name; the renderer
// color rule is what actually writes the material's color.
const RENDERER_ALIASES: AliasTable = &[
    ("enabled", "enabled"),
    ("material", "material"),
    ("color", "material"),
];

const GAME_OBJECT_ALIASES: AliasTable = &[("enabled", "active"), ("visible", "active")];

const GENERIC_ALIASES: AliasTable = &[
    ("enabled", "enabled"),
    ("active", "enabled"),
    ("color", "color"),
    ("position", "position"),
    ("rotation", "rotation"),
    ("scale", "localScale"),
];

pub(crate) fn is_renderer_kind(kind: &str) -> bool {
    kind.len()
        .checked_sub("renderer".len())
        .and_then(|start| kind.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case("renderer"))
}

fn kind_table(kind: &str) -> Option<AliasTable> {
    if kind.eq_ignore_ascii_case("Transform") {
        Some(TRANSFORM_ALIASES)
    } else if kind.eq_ignore_ascii_case("Light") {
        Some(LIGHT_ALIASES)
    } else if kind.eq_ignore_ascii_case("Camera") {
        Some(CAMERA_ALIASES)
    } else if kind.eq_ignore_ascii_case("GameObject") {
        Some(GAME_OBJECT_ALIASES)
    } else if is_renderer_kind(kind) {
        Some(RENDERER_ALIASES)
    } else {
        None
    }
}

fn lookup(table: AliasTable, requested: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(requested))
        .map(|(_, canonical)| *canonical)
}

/// Maps a requested member name onto the canonical name for `kind`.
///
/// A real member with exactly the requested name always wins. Otherwise the
/// kind's alias table, then the generic table, then a unique
/// case-insensitive member match are tried. With no mapping the name comes
/// back unchanged so the member lookup fails with the real member list.
pub fn resolve(kind: &str, requested: &str, members: &[MemberInfo]) -> String {
    if members.iter().any(|member| member.name == requested) {
        return requested.to_string();
    }
    if let Some(canonical) = kind_table(kind).and_then(|table| lookup(table, requested)) {
        return canonical.to_string();
    }
    if let Some(canonical) = lookup(GENERIC_ALIASES, requested) {
        return canonical.to_string();
    }
    let mut folded = members
        .iter()
        .filter(|member| member.name.eq_ignore_ascii_case(requested));
    match (folded.next(), folded.next()) {
        (Some(only), None) => only.name.clone(),
        _ => requested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{MemberAccess, Reflect};
    use crate::scene::components::{Camera, GameObject, MeshRenderer, Rigidbody, Transform};
    use crate::values::TypeDescriptor;

    fn member(name: &str) -> MemberInfo {
        MemberInfo {
            name: name.to_string(),
            access: MemberAccess::Property,
            descriptor: TypeDescriptor::Float,
            writable: true,
        }
    }

    #[test]
    fn exact_member_beats_any_alias() {
        // A Transform-like kind that really has an `x` member keeps it.
        let members = vec![member("x"), member("position")];
        assert_eq!(resolve("Transform", "x", &members), "x");
        assert_eq!(resolve("Transform", "scale", &members), "localScale");
    }

    #[test]
    fn kind_tables_are_case_insensitive_on_the_request() {
        let transform = Transform::default().members();
        assert_eq!(resolve("Transform", "POSX", &transform), "position");
        assert_eq!(resolve("Transform", "rot", &transform), "rotation");

        let camera = Camera::default().members();
        assert_eq!(resolve("Camera", "fov", &camera), "fieldOfView");
        assert_eq!(resolve("Camera", "FarPlane", &camera), "farClipPlane");
    }

    #[test]
    fn renderer_suffix_and_game_object_tables_apply() {
        let renderer = MeshRenderer::default().members();
        assert_eq!(resolve("MeshRenderer", "color", &renderer), "material");
        assert_eq!(resolve("SkinnedMeshRenderer", "Color", &[]), "material");

        let object = GameObject::named("a").members();
        assert_eq!(resolve("GameObject", "visible", &object), "active");
    }

    #[test]
    fn generic_table_then_folded_match_then_unchanged() {
        let body = Rigidbody::default().members();
        assert_eq!(resolve("Rigidbody", "scale", &body), "localScale");
        assert_eq!(resolve("Rigidbody", "usegravity", &body), "useGravity");
        assert_eq!(resolve("Rigidbody", "bogusProp", &body), "bogusProp");
    }

    #[test]
    fn ambiguous_folded_match_is_left_alone() {
        let members = vec![member("Speed"), member("speed")];
        assert_eq!(resolve("Custom", "SPEED", &members), "SPEED");
    }
}

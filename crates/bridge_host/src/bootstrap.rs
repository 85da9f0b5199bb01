use scene_bridge::scene::components::{
    Camera, Light, LightType, Material, MeshRenderer, Rigidbody, SpriteRenderer, Transform,
};
use scene_bridge::values::{Color, Vec3};
use scene_bridge::{DynamicObject, InMemoryScene, TypedValue};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .try_init();
}

/// A small scene with one object per built-in component kind plus a
/// script-style component, so every alias table has something to hit.
pub(crate) fn demo_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::default();

    let camera = scene.spawn("Main Camera");
    scene.attach(camera, Transform::at(Vec3::new(0.0, 1.0, -10.0)));
    scene.attach(camera, Camera::default());

    let sun = scene.spawn("Sun");
    scene.attach(sun, Transform::at(Vec3::new(0.0, 10.0, 0.0)));
    scene.attach(
        sun,
        Light {
            light_type: LightType::Directional,
            color: Color::rgb(1.0, 0.95, 0.85),
            ..Light::default()
        },
    );

    let crate_id = scene.spawn("Crate");
    scene.attach(crate_id, Transform::at(Vec3::new(1.0, 0.5, 2.0)));
    scene.attach(crate_id, MeshRenderer::with_material(Material::named("Wood")));
    scene.attach(crate_id, Rigidbody::default());

    let player = scene.spawn("Player");
    scene.attach(player, Transform::default());
    scene.attach(
        player,
        SpriteRenderer::new("player_idle", Some(Material::named("Sprites-Default"))),
    );
    scene.attach(
        player,
        DynamicObject::new("PlayerController")
            .with_field("speed", TypedValue::Float(4.5))
            .with_field("jumpHeight", TypedValue::Float(1.2))
            .with_field("displayName", TypedValue::String("Hero".to_string()))
            .with_read_only("health", TypedValue::Int(100)),
    );

    info!(objects = scene.object_count(), "demo_scene_built");
    scene
}

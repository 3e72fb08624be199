use image::RgbaImage;
use sv_atlas::{BodyVariant, CapeLayout, SkinLayout};

use crate::{CapeModel, HeadlessScene, LiveCounts, PX, PlayerModel, SceneBackend};

type Player = PlayerModel<HeadlessScene>;
type Cape = CapeModel<HeadlessScene>;

fn arm_mesh_width(scene: &HeadlessScene, player: &Player) -> f32 {
    let node = scene
        .find_node("PlayerMesh[right_arm]")
        .expect("right arm mesh node");
    let mesh = scene.node(node).and_then(|n| n.mesh).expect("mesh handle");
    let (min, max) = scene.mesh(mesh).and_then(|m| m.bounds()).expect("bounds");
    assert!((player.arm_width_px() * PX - (max.x - min.x)).abs() < 1e-6);
    max.x - min.x
}

#[test]
fn variant_switch_keeps_four_to_three_arms() {
    let mut scene = HeadlessScene::new();
    let mut classic = Player::build(&mut scene, BodyVariant::Classic, None);
    let classic_width = arm_mesh_width(&scene, &classic);
    classic.dispose(&mut scene);

    let mut slim = Player::build(&mut scene, BodyVariant::Slim, None);
    let slim_width = arm_mesh_width(&scene, &slim);
    slim.dispose(&mut scene);

    let mut again = Player::build(&mut scene, BodyVariant::Classic, None);
    assert_eq!(arm_mesh_width(&scene, &again), classic_width);
    again.dispose(&mut scene);

    assert!((classic_width / slim_width - 4.0 / 3.0).abs() < 1e-5);
    assert_eq!(scene.live_resources(), LiveCounts::default());
    assert_eq!(scene.invalid_releases(), 0);
}

#[test]
fn rebuild_never_reuses_buffers() {
    let mut scene = HeadlessScene::new();
    let mut first = Player::build(&mut scene, BodyVariant::Classic, None);
    let old: Vec<_> = first.meshes().copied().collect();
    first.dispose(&mut scene);

    let mut second = Player::build(&mut scene, BodyVariant::Slim, None);
    assert!(second.meshes().all(|m| !old.contains(m)));
    second.dispose(&mut scene);
}

#[test]
fn overlays_follow_the_bound_layout() {
    let mut scene = HeadlessScene::new();
    let mut player = Player::build(&mut scene, BodyVariant::Classic, None);
    let hat = scene.find_node("PlayerOverlay[head]").expect("hat node");
    assert!(!scene.is_effectively_visible(hat));

    let modern = scene.upload_texture("modern", &RgbaImage::new(64, 64));
    player.bind_skin(&mut scene, &modern, SkinLayout::Modern, [64, 64]);
    assert!(player.overlays_visible());
    assert!(scene.is_effectively_visible(hat));

    let legacy = scene.upload_texture("legacy", &RgbaImage::new(64, 32));
    player.bind_skin(&mut scene, &legacy, SkinLayout::Legacy, [64, 32]);
    assert!(!player.overlays_visible());
    assert!(!scene.is_effectively_visible(hat));
    assert_eq!(
        scene.material_of("PlayerMesh[head]").and_then(|m| m.texture),
        Some(legacy)
    );

    player.dispose(&mut scene);
    scene.release_texture(modern);
    scene.release_texture(legacy);
    assert_eq!(scene.live_resources().total(), 0);
}

#[test]
fn legacy_bind_rewrites_uvs_in_place() {
    let mut scene = HeadlessScene::new();
    let mut player = Player::build(&mut scene, BodyVariant::Classic, None);
    let node = scene.find_node("PlayerMesh[left_leg]").expect("left leg");
    let mesh = scene.node(node).and_then(|n| n.mesh).expect("mesh");
    let positions = scene.mesh(mesh).expect("data").positions.clone();
    let modern_uvs = scene.mesh(mesh).expect("data").uvs.clone();

    let legacy = scene.upload_texture("legacy", &RgbaImage::new(64, 32));
    player.bind_skin(&mut scene, &legacy, SkinLayout::Legacy, [64, 32]);

    let data = scene.mesh(mesh).expect("same buffer");
    assert_eq!(data.positions, positions);
    assert_ne!(data.uvs, modern_uvs);
    // Legacy left leg samples the right leg block, which sits in the top half.
    assert!(data.uvs.iter().all(|[_, v]| *v <= 1.0));
    assert!(data.uvs.iter().all(|[u, _]| *u <= 16.0 / 64.0 + 1e-6));

    player.dispose(&mut scene);
    scene.release_texture(legacy);
}

#[test]
fn dispose_without_texture_is_safe_and_idempotent() {
    let mut scene = HeadlessScene::new();
    let mut player = Player::build(&mut scene, BodyVariant::Slim, None);
    player.dispose(&mut scene);
    player.dispose(&mut scene);
    assert!(player.is_disposed());
    assert_eq!(scene.live_resources(), LiveCounts::default());
    assert_eq!(scene.invalid_releases(), 0);
}

#[test]
fn cape_starts_hidden_and_keeps_its_texture_owner() {
    let mut scene = HeadlessScene::new();
    let stage = scene.spawn_node("stage", None, Default::default());
    let mut cape = Cape::build(&mut scene, stage);
    assert!(!cape.is_visible());
    assert!(cape.texture().is_none());
    assert!(!scene.is_effectively_visible(cape.mesh_node()));

    let texture = scene.upload_texture("cape", &RgbaImage::new(64, 32));
    cape.set_texture(&mut scene, &texture, CapeLayout::Modern);
    assert!(!cape.is_visible());
    cape.set_visible(&mut scene, true);
    assert!(scene.is_effectively_visible(cape.mesh_node()));

    cape.dispose(&mut scene);
    cape.dispose(&mut scene);
    assert_eq!(scene.texture_size(texture), Some([64, 32]));
    scene.release_texture(texture);
    scene.despawn_node(stage);
    assert_eq!(scene.live_resources().total(), 0);
    assert_eq!(scene.invalid_releases(), 0);
}

#[test]
fn cape_survives_player_rebuild_via_reparent() {
    let mut scene = HeadlessScene::new();
    let stage = scene.spawn_node("stage", None, Default::default());
    let mut player = Player::build(&mut scene, BodyVariant::Classic, Some(stage));
    let mut cape = Cape::build(&mut scene, player.root());

    cape.reparent(&mut scene, stage);
    player.dispose(&mut scene);
    let mut player = Player::build(&mut scene, BodyVariant::Slim, Some(stage));
    cape.reparent(&mut scene, player.root());

    let hinge = scene.find_node("CapeHinge").expect("hinge survives");
    assert_eq!(scene.node(hinge).and_then(|n| n.parent), Some(player.root()));

    cape.dispose(&mut scene);
    player.dispose(&mut scene);
    scene.despawn_node(stage);
    assert_eq!(scene.live_resources().total(), 0);
    assert_eq!(scene.invalid_releases(), 0);
}

#[test]
fn legacy_cape_rewrites_uvs() {
    let mut scene = HeadlessScene::new();
    let stage = scene.spawn_node("stage", None, Default::default());
    let mut cape = Cape::build(&mut scene, stage);
    let mesh = scene
        .node(cape.mesh_node())
        .and_then(|n| n.mesh)
        .expect("cape mesh");
    let before = scene.mesh(mesh).expect("data").uvs.clone();

    let texture = scene.upload_texture("cape", &RgbaImage::new(22, 17));
    cape.set_texture(&mut scene, &texture, CapeLayout::Legacy);
    let after = &scene.mesh(mesh).expect("data").uvs;
    assert_ne!(&before, after);
    assert!(after.iter().all(|[u, v]| *u <= 1.0 && *v <= 1.0));

    cape.dispose(&mut scene);
    scene.release_texture(texture);
}

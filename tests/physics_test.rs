use glam::Vec3;
use particle_scene::config::SimulationConfig;
use particle_scene::world::{BodySpec, MaterialTag, Shape, SimulationWorld};

const DT: f32 = 1.0 / 60.0;

#[test]
fn test_sphere_settles_on_ground_plane() {
    let config = SimulationConfig::default();
    let mut world = SimulationWorld::new(&config);
    let plane = world.add_body(BodySpec::ground_plane(Vec3::ZERO, Vec3::Y, MaterialTag::Ground));
    let radius = 0.5;
    let ball = world.add_body(BodySpec::dynamic(
        Vec3::new(0.0, 10.0, 0.0),
        1.0,
        Shape::Sphere { radius },
        MaterialTag::Particle,
    ));
    assert!((config.materials.lookup(MaterialTag::Particle, MaterialTag::Ground).restitution - 0.1).abs() < 1e-6);

    for _ in 0..120 {
        world.step(DT);
    }
    let y = world.body(ball).unwrap().position().y;
    assert!(y >= 0.0, "sank through the plane: y = {}", y);
    assert!((y - radius).abs() <= radius, "not resting within one radius: y = {}", y);

    // And it stays there
    for _ in 0..120 {
        world.step(DT);
        let y = world.body(ball).unwrap().position().y;
        assert!((y - radius).abs() < 1e-3, "drifted off the plane: y = {}", y);
    }
    assert_eq!(world.body(plane).unwrap().position(), Vec3::ZERO);
}

#[test]
fn test_resting_body_falls_asleep_and_gravity_toggle_wakes_it() {
    let mut world = SimulationWorld::new(&SimulationConfig::default());
    world.add_body(BodySpec::ground_plane(Vec3::ZERO, Vec3::Y, MaterialTag::Ground));
    let ball = world.add_body(BodySpec::dynamic(
        Vec3::new(0.0, 0.25, 0.0),
        1.0,
        Shape::Sphere { radius: 0.25 },
        MaterialTag::Particle,
    ));

    for _ in 0..180 {
        world.step(DT);
    }
    assert!(world.body(ball).unwrap().is_asleep());
    assert_eq!(world.awake_count(), 0);

    world.set_gravity_enabled(false);
    assert!(!world.body(ball).unwrap().is_asleep());
}

#[test]
fn test_static_bodies_never_move() {
    let mut world = SimulationWorld::new(&SimulationConfig::default());
    let anchor_position = Vec3::new(0.0, 2.0, 0.0);
    let anchor = world.add_body(BodySpec::fixed(anchor_position, Shape::Sphere { radius: 1.0 }, MaterialTag::Stone));
    let crate_position = Vec3::new(4.0, 3.0, 0.0);
    let fixed_crate = world.add_body(BodySpec::fixed(
        crate_position,
        Shape::Box { half_extents: [0.5, 0.5, 0.5] },
        MaterialTag::Stone,
    ));
    // Dropped straight onto the anchor
    world.add_body(BodySpec::dynamic(
        Vec3::new(0.0, 6.0, 0.0),
        13.0,
        Shape::Sphere { radius: 0.5 },
        MaterialTag::Rubber,
    ));

    for _ in 0..240 {
        world.step(DT);
        assert_eq!(world.body(anchor).unwrap().position(), anchor_position);
        assert_eq!(world.body(fixed_crate).unwrap().position(), crate_position);
    }
    assert_eq!(world.body(anchor).unwrap().linear_velocity(), Vec3::ZERO);
}

#[test]
fn test_step_takes_exactly_one_increment() {
    let mut world = SimulationWorld::new(&SimulationConfig::default());
    let ball = world.add_body(BodySpec::dynamic(Vec3::ZERO, 1.0, Shape::Sphere { radius: 0.1 }, MaterialTag::Particle));
    world.step(DT);
    let after_one = world.body(ball).unwrap().position();
    world.step(DT);
    let after_two = world.body(ball).unwrap().position();
    assert_eq!(world.step_count(), 2);
    assert!(after_two.y < after_one.y && after_one.y < 0.0);
}

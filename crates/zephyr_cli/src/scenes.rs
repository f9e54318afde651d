//! Built-in scenes.

use std::sync::Arc;
use zephyr_renderer::{
    cuboid, BvhError, Camera, Color, DiffuseLight, Hittable, HittableList, Lambertian, Metal, Quad,
    RotateY, Scene, Sphere, Translate, Vec3,
};

/// The Cornell box: red and green side walls, a ceiling light, two rotated
/// white blocks and a metal sphere resting on the short block.
pub fn cornell_box() -> Result<Scene, BvhError> {
    let red = Lambertian::new(Color::new(0.65, 0.05, 0.05));
    let white = Lambertian::new(Color::splat(0.73));
    let green = Lambertian::new(Color::new(0.12, 0.45, 0.15));
    let light = DiffuseLight::new(Color::splat(15.0));

    let mut world = HittableList::new();

    // Walls
    world.push(Quad::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    ));
    world.push(Quad::new(
        Vec3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    ));
    world.push(Quad::new(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        light,
    ));
    world.push(Quad::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white.clone(),
    ));
    world.push(Quad::new(
        Vec3::splat(555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    ));
    world.push(Quad::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white.clone(),
    ));

    // Blocks
    let tall: Arc<dyn Hittable> = Arc::new(cuboid(
        Vec3::ZERO,
        Vec3::new(165.0, 330.0, 165.0),
        white.clone(),
    ));
    let tall: Arc<dyn Hittable> = Arc::new(RotateY::new(tall, 15.0));
    world.push(Translate::new(tall, Vec3::new(265.0, 0.0, 295.0)));

    let short: Arc<dyn Hittable> = Arc::new(cuboid(Vec3::ZERO, Vec3::splat(165.0), white));
    let short: Arc<dyn Hittable> = Arc::new(RotateY::new(short, -18.0));
    world.push(Translate::new(short, Vec3::new(130.0, 0.0, 65.0)));

    world.push(Sphere::new(
        Vec3::new(212.5, 225.0, 147.5),
        60.0,
        Metal::new(Color::new(0.8, 0.85, 0.88), 0.05),
    ));

    let camera = Camera::new()
        .with_position(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 10.0);

    Scene::from_objects(camera, world)
}

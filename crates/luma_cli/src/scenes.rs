//! Demo scenes for the command line renderer.

use luma_renderer::{Camera, Color, Material, Primitive, Quad, Sampler, SkyGradient, Sphere, Vec3};
use rand::Rng;

/// A scene together with the camera and environment it is meant to be seen with.
pub struct DemoScene {
    pub primitives: Vec<Primitive>,
    pub camera: Camera,
    pub sky: SkyGradient,
}

/// Cornell box: five walls, a ceiling light and three spheres.
pub fn cornell_box(width: u32, height: u32) -> DemoScene {
    let red = Material::diffuse(Color::new(0.65, 0.05, 0.05));
    let white = Material::diffuse(Color::new(0.73, 0.73, 0.73));
    let green = Material::diffuse(Color::new(0.12, 0.45, 0.15));
    let light = Material::emissive(Color::ONE, 15.0);
    let steel = Material::metallic(Color::new(0.8, 0.85, 0.88), 0.05);
    let wall_y = Vec3::new(0.0, 555.0, 0.0);
    let wall_z = Vec3::new(0.0, 0.0, 555.0);

    let primitives: Vec<Primitive> = vec![
        Quad::new(Vec3::new(555.0, 0.0, 0.0), wall_y, wall_z, green).into(),
        Quad::new(Vec3::ZERO, wall_y, wall_z, red).into(),
        Quad::new(
            Vec3::new(343.0, 554.0, 332.0),
            Vec3::new(-130.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -105.0),
            light,
        )
        .into(),
        Quad::new(Vec3::ZERO, Vec3::new(555.0, 0.0, 0.0), wall_z, white).into(),
        Quad::new(Vec3::splat(555.0), Vec3::new(-555.0, 0.0, 0.0), -wall_z, white).into(),
        Quad::new(wall_z, Vec3::new(555.0, 0.0, 0.0), wall_y, white).into(),
        Sphere::new(Vec3::new(150.0, 90.0, 190.0), 90.0, Material::dielectric(1.5)).into(),
        Sphere::new(Vec3::new(400.0, 100.0, 370.0), 100.0, steel).into(),
        Sphere::new(Vec3::new(370.0, 60.0, 130.0), 60.0, white).into(),
    ];

    let camera = Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(278.0, 278.0, -800.0), Vec3::new(278.0, 278.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 10.0);

    DemoScene {
        primitives,
        camera,
        // Only the ceiling light illuminates the box
        sky: SkyGradient {
            horizon: Color::ZERO,
            zenith: Color::ZERO,
        },
    }
}

/// Field of small random spheres around three large ones, lit by the sky.
pub fn sphere_field(width: u32, height: u32, seed: u32) -> DemoScene {
    let mut rng = Sampler::new(seed);
    let mut primitives: Vec<Primitive> = vec![Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Material::diffuse(Color::new(0.5, 0.5, 0.5)),
    )
    .into()];

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            // Don't place spheres too close to the large feature spheres
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose: f32 = rng.gen();
            let material = if choose < 0.8 {
                let albedo = rng.vec3(0.0, 1.0) * rng.vec3(0.0, 1.0);
                Material::diffuse(albedo)
            } else if choose < 0.95 {
                Material::metallic(rng.vec3(0.5, 1.0), rng.gen_range(0.0..0.5))
            } else {
                Material::dielectric(1.5)
            };
            primitives.push(Sphere::new(center, 0.2, material).into());
        }
    }

    let brown = Material::diffuse(Color::new(0.4, 0.2, 0.1));
    let bronze = Material::metallic(Color::new(0.7, 0.6, 0.5), 0.0);
    primitives.push(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, Material::dielectric(1.5)).into());
    primitives.push(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, brown).into());
    primitives.push(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, bronze).into());

    let camera = Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);

    DemoScene {
        primitives,
        camera,
        sky: SkyGradient::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cornell_box_has_one_light() {
        let scene = cornell_box(100, 100);
        assert_eq!(scene.primitives.iter().filter(|p| p.is_light()).count(), 1);
        assert_eq!(scene.camera.image_width, 100);
    }

    #[test]
    fn test_sphere_field_is_seeded() {
        let a = sphere_field(10, 10, 3);
        let b = sphere_field(10, 10, 3);
        assert_eq!(a.primitives, b.primitives);
        assert!(a.primitives.len() > 100);
    }
}

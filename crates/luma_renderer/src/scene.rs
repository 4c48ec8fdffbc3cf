//! Scene container: primitives plus an optional BVH.

use crate::{Bvh, HitRecord, Hittable, Primitive};
use luma_math::{Aabb, Ray};

/// An ordered list of primitives with an optional acceleration structure.
///
/// The BVH is derived data. Any change to the primitive list drops it, and
/// it has to be rebuilt with [`Scene::build_bvh`].
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    bvh: Option<Bvh>,
}

impl Scene {
    /// Create a scene without a BVH.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            primitives,
            bvh: None,
        }
    }

    /// Create a scene and build its BVH.
    pub fn with_bvh(primitives: Vec<Primitive>, seed: u32) -> Self {
        let mut scene = Self::new(primitives);
        scene.build_bvh(seed);
        scene
    }

    /// Add a primitive. Invalidates the BVH.
    pub fn add(&mut self, primitive: impl Into<Primitive>) {
        self.primitives.push(primitive.into());
        self.bvh = None;
    }

    /// (Re)build the BVH over the current primitives.
    pub fn build_bvh(&mut self, seed: u32) {
        self.bvh = Some(Bvh::build(&self.primitives, seed));
    }

    pub fn clear_bvh(&mut self) {
        self.bvh = None;
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Number of primitives with an emissive material.
    pub fn light_count(&self) -> usize {
        self.primitives.iter().filter(|p| p.is_light()).count()
    }

    /// Closest hit, through the BVH when one is built.
    pub fn hit(&self, ray: &Ray) -> Option<HitRecord<'_>> {
        match &self.bvh {
            Some(bvh) => bvh.hit(&self.primitives, ray),
            None => self.hit_linear(ray),
        }
    }

    /// Closest hit by testing every primitive in order.
    pub fn hit_linear(&self, ray: &Ray) -> Option<HitRecord<'_>> {
        let mut ray = *ray;
        let mut closest = None;

        for primitive in &self.primitives {
            if let Some(rec) = primitive.hit(&ray) {
                ray.shrink_to(rec.t);
                closest = Some(rec);
            }
        }

        closest
    }

    /// Union of all primitive boxes.
    pub fn bounding_box(&self) -> Aabb {
        self.primitives
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box()))
    }
}

impl From<Vec<Primitive>> for Scene {
    fn from(primitives: Vec<Primitive>) -> Self {
        Self::new(primitives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Material, Quad, Sphere};
    use luma_math::Vec3;

    fn two_spheres() -> Vec<Primitive> {
        vec![
            Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, Material::diffuse(Color::ONE)).into(),
            Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5, Material::metallic(Color::ONE, 0.0)).into(),
        ]
    }

    #[test]
    fn test_closest_hit_wins_regardless_of_order() {
        let scene = Scene::new(two_spheres());
        let rec = scene.hit(&Ray::new(Vec3::ZERO, -Vec3::Z)).unwrap();
        assert!((rec.t - 1.5).abs() < 1e-5);
        assert!(matches!(rec.material, Material::Metallic { .. }));
    }

    #[test]
    fn test_bvh_and_linear_agree() {
        let scene = Scene::with_bvh(two_spheres(), 1);
        assert!(scene.bvh().is_some());

        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let a = scene.hit(&ray).map(|r| r.t);
        let b = scene.hit_linear(&ray).map(|r| r.t);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adding_invalidates_bvh() {
        let mut scene = Scene::with_bvh(two_spheres(), 1);
        scene.add(Quad::new(
            Vec3::new(-1.0, 2.0, -3.0),
            Vec3::X * 2.0,
            Vec3::Z * 2.0,
            Material::emissive(Color::ONE, 4.0),
        ));
        assert!(scene.bvh().is_none());
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.light_count(), 1);
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::default();
        assert!(scene.is_empty());
        assert!(scene.hit(&Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
        assert!(scene.bounding_box().is_empty());
    }

    #[test]
    fn test_bounding_box() {
        let scene = Scene::new(two_spheres());
        let bbox = scene.bounding_box();
        assert_eq!(bbox.min(), Vec3::new(-1.0, -1.0, -6.0));
        assert_eq!(bbox.max(), Vec3::new(1.0, 1.0, -1.5));
    }
}

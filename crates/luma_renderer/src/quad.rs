//! Planar quadrilateral (parallelogram) primitive.

use crate::{HitRecord, Hittable, Material};
use luma_math::{Aabb, Interval, Ray, Vec3};

/// Rays closer to parallel with the plane than this are treated as misses.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A parallelogram spanned by edges `u` and `v` from corner `q`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// Unit plane normal, zero for degenerate quads
    normal: Vec3,
    /// Plane offset, `dot(normal, q)`
    d: f32,
    /// `n / dot(n, n)` with `n = cross(u, v)`, used for planar coordinates
    w: Vec3,
    material: Material,
    bbox: Aabb,
}

impl Quad {
    /// Create a quad from a corner and its two edge vectors.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Material) -> Self {
        let n = u.cross(v);
        let n_len_sq = n.length_squared();
        let (normal, w) = if n_len_sq > 1e-12 {
            (n / n_len_sq.sqrt(), n / n_len_sq)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        // Both diagonals, so the box covers all four corners
        let bbox = Aabb::surrounding(
            &Aabb::from_points(q, q + u + v),
            &Aabb::from_points(q + u, q + v),
        );

        Self {
            q,
            u,
            v,
            normal,
            d: normal.dot(q),
            w,
            material,
            bbox,
        }
    }

    pub fn corner(&self) -> Vec3 {
        self.q
    }

    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.u, self.v)
    }

    /// Unit normal of the plane (`cross(u, v)` direction).
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// True if the edges are parallel or zero-length.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }
}

impl Hittable for Quad {
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        if self.is_degenerate() {
            return None;
        }

        let denom = self.normal.dot(ray.direction);

        // No hit if the ray is parallel to the plane
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if !ray.interval.surrounds(t) {
            return None;
        }

        // Planar coordinates of the hit point: 0..1 along each edge
        let planar = ray.at(t) - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));
        if !Interval::UNIT.contains(alpha) || !Interval::UNIT.contains(beta) {
            return None;
        }

        Some(HitRecord::new(
            ray,
            t,
            self.normal,
            (alpha, beta),
            &self.material,
        ))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn unit_square() -> Quad {
        // Square in the z = -1 plane from (-0.5, -0.5) to (0.5, 0.5), facing +Z
        Quad::new(
            Vec3::new(-0.5, -0.5, -1.0),
            Vec3::X,
            Vec3::Y,
            Material::diffuse(Color::ONE),
        )
    }

    #[test]
    fn test_quad_hit_center() {
        let quad = unit_square();
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let rec = quad.hit(&ray).unwrap();
        assert!((rec.t - 1.0).abs() < 1e-6);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
        assert!((rec.u - 0.5).abs() < 1e-6);
        assert!((rec.v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_quad_back_face() {
        let quad = unit_square();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let rec = quad.hit(&ray).unwrap();
        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::Z);
    }

    #[test]
    fn test_quad_miss_outside_edges() {
        let quad = unit_square();
        let ray = Ray::new(Vec3::new(0.6, 0.0, 0.0), -Vec3::Z);
        assert!(quad.hit(&ray).is_none());

        let ray = Ray::new(Vec3::new(0.0, -0.51, 0.0), -Vec3::Z);
        assert!(quad.hit(&ray).is_none());
    }

    #[test]
    fn test_quad_parallel_ray_misses() {
        let quad = unit_square();
        let ray = Ray::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::X);
        assert!(quad.hit(&ray).is_none());
    }

    #[test]
    fn test_quad_behind_origin_misses() {
        let quad = unit_square();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(quad.hit(&ray).is_none());
    }

    #[test]
    fn test_skewed_parallelogram() {
        // Edges (2, 0, 0) and (1, 1, 0): the point (1.5, 0.5) is the center,
        // (0.2, 0.8) lies left of the slanted edge.
        let quad = Quad::new(
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Material::diffuse(Color::ONE),
        );

        let inside = Ray::new(Vec3::new(1.5, 0.5, 1.0), -Vec3::Z);
        let rec = quad.hit(&inside).unwrap();
        assert!((rec.u - 0.5).abs() < 1e-6);
        assert!((rec.v - 0.5).abs() < 1e-6);

        let outside = Ray::new(Vec3::new(0.2, 0.8, 1.0), -Vec3::Z);
        assert!(quad.hit(&outside).is_none());
    }

    #[test]
    fn test_degenerate_quad_never_hits() {
        let quad = Quad::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Material::diffuse(Color::ONE));
        assert!(quad.is_degenerate());
        assert!(quad.hit(&Ray::new(Vec3::new(0.5, 0.0, 1.0), -Vec3::Z)).is_none());
    }

    #[test]
    fn test_bounding_box_is_padded() {
        let bbox = unit_square().bounding_box();
        assert_eq!(bbox.x, Interval::new(-0.5, 0.5));
        assert!(bbox.z.size() > 0.0);
        assert!(bbox.z.contains(-1.0));
    }
}

//! Closed set of geometric primitives a scene is built from.

use crate::{HitRecord, Hittable, Material, Quad, Sphere};
use luma_math::{Aabb, Ray};

/// A scene primitive. Each one owns its material by value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
    Quad(Quad),
}

impl Primitive {
    pub fn material(&self) -> &Material {
        match self {
            Primitive::Sphere(sphere) => sphere.material(),
            Primitive::Quad(quad) => quad.material(),
        }
    }

    /// True if hitting this primitive terminates a path with emitted light.
    pub fn is_light(&self) -> bool {
        self.material().emission().is_some()
    }
}

impl Hittable for Primitive {
    #[inline]
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray),
            Primitive::Quad(quad) => quad.hit(ray),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(sphere) => sphere.bounding_box(),
            Primitive::Quad(quad) => quad.bounding_box(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Quad> for Primitive {
    fn from(quad: Quad) -> Self {
        Primitive::Quad(quad)
    }
}

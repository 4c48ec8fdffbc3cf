//! Surface materials and their scattering laws.

use crate::{HitRecord, Sampler};
use luma_math::{near_zero, reflect, refract, Ray, Vec3};

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scatter {
    /// Per-channel throughput multiplier
    pub attenuation: Color,
    /// Continuation ray, unit direction
    pub ray: Ray,
}

/// How light interacts with a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lambertian reflector.
    Diffuse { albedo: Color },
    /// Mirror with optional roughness; `fuzz` is in `[0, 1]`.
    Metallic { albedo: Color, fuzz: f32 },
    /// Clear refractive medium such as glass or water.
    Dielectric { ior: f32 },
    /// Light source; emits `color * strength` and never scatters.
    Emissive { color: Color, strength: f32 },
}

impl Material {
    /// Create a diffuse material with the given albedo color.
    pub fn diffuse(albedo: Color) -> Self {
        Self::Diffuse { albedo }
    }

    /// Create a metal.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn metallic(albedo: Color, fuzz: f32) -> Self {
        Self::Metallic {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    /// Create a dielectric.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn dielectric(ior: f32) -> Self {
        Self::Dielectric { ior }
    }

    /// Create a light with the given color and strength.
    pub fn emissive(color: Color, strength: f32) -> Self {
        Self::Emissive { color, strength }
    }

    /// Emitted radiance, or `None` for materials that are not lights.
    pub fn emission(&self) -> Option<Color> {
        match *self {
            Material::Emissive { color, strength } if strength > 0.0 => Some(color * strength),
            _ => None,
        }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed. Emissive materials always
    /// return `None`; the integrator handles them before calling this.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, sampler: &mut Sampler) -> Option<Scatter> {
        match *self {
            Material::Diffuse { albedo } => {
                let mut direction = rec.normal + sampler.unit_vector();

                // Catch degenerate scatter direction
                if near_zero(direction, 1e-8) {
                    direction = rec.normal;
                }

                Some(Scatter {
                    attenuation: albedo,
                    ray: Ray::new(rec.p, direction.normalize()),
                })
            }

            Material::Metallic { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction, rec.normal).normalize();
                let direction = reflected + fuzz * sampler.unit_vector();

                // Only scatter if the reflected ray leaves the surface
                if direction.dot(rec.normal) > 0.0 {
                    Some(Scatter {
                        attenuation: albedo,
                        ray: Ray::new(rec.p, direction.normalize()),
                    })
                } else {
                    None
                }
            }

            Material::Dielectric { ior } => {
                let refraction_ratio = if rec.front_face { 1.0 / ior } else { ior };
                let direction = dielectric_direction(
                    ray_in.direction.normalize(),
                    rec.normal,
                    refraction_ratio,
                    sampler.next_f32(),
                );

                Some(Scatter {
                    attenuation: Color::ONE,
                    ray: Ray::new(rec.p, direction),
                })
            }

            Material::Emissive { .. } => None,
        }
    }
}

/// Schlick's approximation for reflectance.
pub fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Choose between reflection and refraction at a dielectric boundary.
///
/// `xi` is the uniform sample compared against the Fresnel reflectance.
/// Total internal reflection always reflects.
fn dielectric_direction(
    unit_direction: Vec3,
    normal: Vec3,
    refraction_ratio: f32,
    xi: f32,
) -> Vec3 {
    let cos_theta = (-unit_direction).dot(normal).min(1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let cannot_refract = refraction_ratio * sin_theta > 1.0;
    if cannot_refract || reflectance(cos_theta, refraction_ratio) > xi {
        reflect(unit_direction, normal)
    } else {
        refract(unit_direction, normal, refraction_ratio)
    }
}

use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::transform::Interpolants;

/// Threshold separating lit from unlit fragments, and the floor applied to
/// the diffuse term under [`DiffuseFloor::Legacy`].
pub const DIFFUSE_FLOOR: f32 = 1e-6;

/// Per-draw uniforms consumed by the fragment stage.
///
/// `camera_position` and `view_transform` are carried but never read, and
/// `model_view_transform` is received without being used; hosts bind all
/// three today and silently dropping them would break that contract. The
/// stage assumes the camera sits at the view-space origin instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingUniforms {
    pub camera_position: Vec4,
    pub light_position: Vec4,
    pub light_color: Vec4,
    pub global_ambient: Vec4,
    pub view_transform: Mat4,
    pub model_view_transform: Mat4,
}

impl Default for LightingUniforms {
    fn default() -> Self {
        Self {
            camera_position: Vec4::W,
            light_position: Vec4::W,
            light_color: Vec4::ONE,
            global_ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            view_transform: Mat4::IDENTITY,
            model_view_transform: Mat4::IDENTITY,
        }
    }
}

/// Which floor the diffuse term uses for back-facing fragments.
///
/// The historical formula is `max(LdotN, 1e-6)`, so a surface facing away
/// from the light still picks up an epsilon-scaled residual instead of going
/// fully dark. That is arguably a bug, but hosts may have tuned ambient
/// levels around it, so the choice is explicit rather than silently fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffuseFloor {
    /// `max(LdotN, 1e-6)`: back-facing surfaces keep a residual diffuse term.
    #[default]
    Legacy,
    /// `max(LdotN, 0)`: back-facing surfaces receive no diffuse light.
    Zero,
}

impl DiffuseFloor {
    fn apply(self, l_dot_n: f32) -> f32 {
        match self {
            DiffuseFloor::Legacy => l_dot_n.max(DIFFUSE_FLOOR),
            DiffuseFloor::Zero => l_dot_n.max(0.0),
        }
    }
}

/// Surface response parameters, previously hardcoded inside the fragment
/// stage and now passed per draw. `Default` reproduces the old constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
    pub light_radius: f32,
    pub diffuse_floor: DiffuseFloor,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            shininess: 3.0,
            light_radius: 1.0,
            diffuse_floor: DiffuseFloor::default(),
        }
    }
}

/// Distance falloff: `1 / (dist/radius + 1)²`.
///
/// Chosen over a pure inverse square so the fragment on top of the light
/// (dist = 0) gets exactly 1.0 instead of a division by zero.
pub fn attenuation(dist: f32, radius: f32) -> f32 {
    let falloff = dist / radius + 1.0;
    1.0 / (falloff * falloff)
}

/// Fragment stage: single point light, Phong reflection model, view-space
/// evaluation.
///
/// The returned color is the raw ambient + diffuse + specular sum and may
/// exceed [0, 1]; clamping or tone mapping is the host's job. Note the unlit
/// specular default of `(0, 0, 0, 1)` leaks a +1 alpha term into that sum,
/// matching the historical output.
pub fn shade_fragment(
    interpolants: &Interpolants,
    uniforms: &LightingUniforms,
    material: &SurfaceMaterial,
) -> Vec4 {
    let ambient = uniforms.global_ambient * material.diffuse;

    let light_offset = (uniforms.light_position - interpolants.view_position).truncate();
    let dist = light_offset.length();

    // Interpolation across the primitive denormalizes the emitted normal.
    let normal = interpolants.view_normal.normalize();
    let light_dir = light_offset.normalize();
    let view_dir = (-interpolants.view_position.truncate()).normalize();

    let l_dot_n = light_dir.dot(normal);
    let attenuation = attenuation(dist, material.light_radius);

    let diffuse = material.diffuse
        * uniforms.light_color
        * (material.diffuse_floor.apply(l_dot_n) * attenuation);

    let mut specular = Vec4::new(0.0, 0.0, 0.0, 1.0);
    if l_dot_n > DIFFUSE_FLOOR {
        // reflect(-L, N) = 2 (L.N) N - L
        let reflect_dir = (normal * (2.0 * l_dot_n) - light_dir).normalize();
        let r_dot_v = reflect_dir.dot(view_dir).clamp(0.0, 1.0);
        specular = material.specular
            * uniforms.light_color
            * (r_dot_v.powf(material.shininess) * attenuation);
    }

    ambient + diffuse + specular
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn facing_up(view_z: f32) -> Interpolants {
        Interpolants {
            world_position: Vec4::new(0.0, 0.0, view_z, 1.0),
            view_position: Vec4::new(0.0, 0.0, view_z, 1.0),
            view_normal: Vec3::Z,
        }
    }

    #[test]
    fn attenuation_is_one_at_zero_distance() {
        assert_eq!(attenuation(0.0, 1.0), 1.0);
        assert_eq!(attenuation(0.0, 5.0), 1.0);
        assert_eq!(attenuation(0.0, 0.25), 1.0);
    }

    #[test]
    fn attenuation_is_strictly_decreasing() {
        let radius = 3.0;
        let mut previous = attenuation(0.0, radius);
        for step in 1..50 {
            let current = attenuation(step as f32 * 0.5, radius);
            assert!(current < previous, "attenuation rose at step {step}");
            previous = current;
        }
    }

    #[test]
    fn attenuation_at_radius_distance_is_a_quarter() {
        assert_eq!(attenuation(5.0, 5.0), 0.25);
    }

    #[test]
    fn ambient_is_componentwise_product_with_diffuse() {
        // Light far behind the surface so diffuse and specular vanish (up to
        // the legacy epsilon residual, which Zero suppresses entirely).
        let interpolants = facing_up(-1.0);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(0.0, 0.0, -100.0, 1.0),
            global_ambient: Vec4::new(0.5, 0.25, 0.125, 1.0),
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::new(0.5, 1.0, 1.0, 1.0),
            specular: Vec4::ZERO,
            diffuse_floor: DiffuseFloor::Zero,
            ..SurfaceMaterial::default()
        };
        let color = shade_fragment(&interpolants, &uniforms, &material);
        // Ambient plus the unlit specular default's alpha.
        assert_eq!(color, Vec4::new(0.25, 0.25, 0.125, 1.0) + Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn lit_scenario_at_radius_distance() {
        // N = L = (0,0,1), radius 5, light 5 units along the normal.
        let interpolants = facing_up(-1.0);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(0.0, 0.0, 4.0, 1.0),
            light_color: Vec4::new(1.0, 0.5, 1.0, 1.0),
            global_ambient: Vec4::ZERO,
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::ZERO,
            light_radius: 5.0,
            ..SurfaceMaterial::default()
        };
        let color = shade_fragment(&interpolants, &uniforms, &material);
        let expected = material.diffuse * uniforms.light_color * 0.25;
        assert_eq!(color.truncate(), expected.truncate());
    }

    #[test]
    fn mirror_case_specular_equals_attenuated_specular_color() {
        // Surface at view (0,0,-1) facing +Z, light straight along the
        // normal: V = N = L, so RdotV = 1 and the exponent drops out.
        let interpolants = facing_up(-1.0);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(0.0, 0.0, 4.0, 1.0),
            light_color: Vec4::new(1.0, 1.0, 0.5, 1.0),
            global_ambient: Vec4::ZERO,
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::ZERO,
            specular: Vec4::new(0.75, 0.5, 1.0, 1.0),
            light_radius: 5.0,
            ..SurfaceMaterial::default()
        };
        let color = shade_fragment(&interpolants, &uniforms, &material);
        let expected = material.specular * uniforms.light_color * 0.25;
        assert_eq!(color, expected);
    }

    #[test]
    fn back_facing_surface_keeps_epsilon_residual_under_legacy_floor() {
        // L·N = -0.5: light 120 degrees off the normal.
        let interpolants = Interpolants {
            world_position: Vec4::W,
            view_position: Vec4::W,
            view_normal: Vec3::Z,
        };
        let angle = 120.0_f32.to_radians();
        let dist = 2.0;
        let uniforms = LightingUniforms {
            light_position: Vec4::new(dist * angle.sin(), 0.0, dist * angle.cos(), 1.0),
            global_ambient: Vec4::ZERO,
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            light_radius: 2.0,
            ..SurfaceMaterial::default()
        };

        let legacy = shade_fragment(&interpolants, &uniforms, &material);
        // The documented behavior: not zero, but the epsilon residual scaled
        // by attenuation (0.25 here). Specular must stay at its default.
        let residual = DIFFUSE_FLOOR * 0.25;
        assert!((legacy.x - residual).abs() < 1e-9);
        assert!(legacy.x > 0.0);

        let zeroed = shade_fragment(
            &interpolants,
            &uniforms,
            &SurfaceMaterial {
                diffuse_floor: DiffuseFloor::Zero,
                ..material
            },
        );
        assert_eq!(zeroed.truncate(), Vec3::ZERO);
    }

    #[test]
    fn unlit_fragment_leaks_unit_alpha_from_specular_default() {
        let interpolants = facing_up(-1.0);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(0.0, 0.0, -100.0, 1.0),
            global_ambient: Vec4::new(0.1, 0.1, 0.1, 0.0),
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::new(1.0, 1.0, 1.0, 0.0),
            diffuse_floor: DiffuseFloor::Zero,
            ..SurfaceMaterial::default()
        };
        let color = shade_fragment(&interpolants, &uniforms, &material);
        // Ambient alpha 0, diffuse alpha 0, specular default alpha 1.
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn grazing_light_gets_no_specular() {
        // L exactly perpendicular to N: LdotN = 0, below the lit threshold.
        let interpolants = facing_up(-1.0);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(5.0, 0.0, -1.0, 1.0),
            global_ambient: Vec4::ZERO,
            ..LightingUniforms::default()
        };
        let material = SurfaceMaterial {
            diffuse: Vec4::ZERO,
            specular: Vec4::ONE,
            ..SurfaceMaterial::default()
        };
        let color = shade_fragment(&interpolants, &uniforms, &material);
        assert_eq!(color, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}

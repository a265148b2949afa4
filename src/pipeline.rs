use glam::Vec4;
use rayon::prelude::*;

use crate::lighting::{shade_fragment, LightingUniforms, SurfaceMaterial};
use crate::transform::{transform_vertex, Interpolants, TransformSet, VertexAttributes};

/// Single-pass evaluation of both stages for one vertex, as if it were a
/// single-sample primitive with no interpolation in between.
///
/// Bit-for-bit identical to `transform_vertex` followed by `shade_fragment`
/// on the emitted interpolants: re-normalizing an already normalized vector
/// is idempotent.
pub fn shade_vertex(
    vertex: &VertexAttributes,
    transforms: &TransformSet,
    uniforms: &LightingUniforms,
    material: &SurfaceMaterial,
) -> Vec4 {
    let output = transform_vertex(vertex, transforms);
    shade_fragment(&output.interpolants, uniforms, material)
}

/// Shades a batch of interpolated fragments in parallel.
///
/// Each invocation is a pure function of its inputs, so fragments fan out
/// across the rayon pool with no locking; output order matches input order.
pub fn shade_batch(
    fragments: &[Interpolants],
    uniforms: &LightingUniforms,
    material: &SurfaceMaterial,
) -> Vec<Vec4> {
    fragments
        .par_iter()
        .map(|interpolants| shade_fragment(interpolants, uniforms, material))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    fn test_setup() -> (TransformSet, LightingUniforms, SurfaceMaterial) {
        let model = Mat4::from_rotation_y(0.4) * Mat4::from_translation(Vec3::new(0.5, 0.0, -1.0));
        let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let transforms = TransformSet::for_object(model, view, projection);
        let uniforms = LightingUniforms {
            light_position: Vec4::new(1.0, 3.0, 2.0, 1.0),
            ..LightingUniforms::default()
        };
        (transforms, uniforms, SurfaceMaterial::default())
    }

    #[test]
    fn single_pass_matches_chained_stages_exactly() {
        let (transforms, uniforms, material) = test_setup();
        let vertex = VertexAttributes::new(Vec3::new(0.3, -0.2, 0.9), Vec3::new(0.1, 0.9, 0.2));

        let chained = {
            let output = transform_vertex(&vertex, &transforms);
            shade_fragment(&output.interpolants, &uniforms, &material)
        };
        let combined = shade_vertex(&vertex, &transforms, &uniforms, &material);
        assert_eq!(chained, combined);
    }

    #[test]
    fn batch_shading_matches_serial_shading_in_order() {
        let (transforms, uniforms, material) = test_setup();
        let fragments: Vec<Interpolants> = (0..64)
            .map(|i| {
                let t = i as f32 * 0.1;
                let vertex =
                    VertexAttributes::new(Vec3::new(t.sin(), t.cos(), t * 0.2), Vec3::new(t, 1.0, -t));
                transform_vertex(&vertex, &transforms).interpolants
            })
            .collect();

        let parallel = shade_batch(&fragments, &uniforms, &material);
        let serial: Vec<Vec4> = fragments
            .iter()
            .map(|f| shade_fragment(f, &uniforms, &material))
            .collect();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn barycentric_mix_hits_the_vertices_at_the_corners() {
        let (transforms, _, _) = test_setup();
        let a = transform_vertex(
            &VertexAttributes::new(Vec3::ZERO, Vec3::Y),
            &transforms,
        )
        .interpolants;
        let b = transform_vertex(
            &VertexAttributes::new(Vec3::X, Vec3::new(1.0, 1.0, 0.0)),
            &transforms,
        )
        .interpolants;
        let c = transform_vertex(
            &VertexAttributes::new(Vec3::Z, Vec3::new(0.0, 1.0, 1.0)),
            &transforms,
        )
        .interpolants;

        let at_a = Interpolants::barycentric(&a, &b, &c, [1.0, 0.0, 0.0]);
        assert_eq!(at_a, a);

        // Interior samples mix linearly and are in general no longer unit
        // length; receipt-side normalization is what makes them usable.
        let mid = Interpolants::barycentric(&a, &b, &c, [0.5, 0.25, 0.25]);
        let expected = a.view_normal * 0.5 + b.view_normal * 0.25 + c.view_normal * 0.25;
        assert_eq!(mid.view_normal, expected);
    }
}

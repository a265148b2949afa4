use glam::{Mat3, Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Matrices consumed by the vertex stage for a single draw.
///
/// `view` and `projection` are never read by the stage math but stay part of
/// the binding surface so hosts that supply the full set keep working.
///
/// Caller obligation: `normal` must be the inverse-transpose of `model_view`
/// (or of `model`, if the host lights in world space). Passing the plain
/// model matrix here produces incorrect shading under non-uniform scale; the
/// stage does not validate this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSet {
    pub model: Mat4,
    pub normal: Mat4,
    pub model_view: Mat4,
    pub model_view_projection: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl TransformSet {
    /// Derives the full matrix set for one object from its model matrix and
    /// the camera's view/projection, using the view-space inverse-transpose
    /// convention for the normal matrix.
    pub fn for_object(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        let model_view = view * model;
        Self {
            model,
            normal: model_view.inverse().transpose(),
            model_view,
            model_view_projection: projection * model_view,
            view,
            projection,
        }
    }
}

/// Per-vertex inputs. The normal is a direction and is not required to be
/// unit length on input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub position: Vec3,
    pub normal: Vec3,
}

impl VertexAttributes {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// Values emitted once per vertex and linearly interpolated across the
/// primitive by the (external) rasterizer before fragment shading.
///
/// `view_normal` is normalized at emission, but linear interpolation does not
/// preserve length, so the lighting stage re-normalizes it on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpolants {
    pub world_position: Vec4,
    pub view_position: Vec4,
    pub view_normal: Vec3,
}

impl Interpolants {
    /// Linear barycentric mix of three vertices' interpolants, standing in
    /// for the rasterizer's interpolation step. No re-normalization happens
    /// here; that belongs to the receiving stage.
    pub fn barycentric(a: &Self, b: &Self, c: &Self, lambda: [f32; 3]) -> Self {
        Self {
            world_position: a.world_position * lambda[0]
                + b.world_position * lambda[1]
                + c.world_position * lambda[2],
            view_position: a.view_position * lambda[0]
                + b.view_position * lambda[1]
                + c.view_position * lambda[2],
            view_normal: a.view_normal * lambda[0]
                + b.view_normal * lambda[1]
                + c.view_normal * lambda[2],
        }
    }
}

/// Full output of the vertex stage: the clip-space position handed to
/// rasterization plus the interpolants handed to the lighting stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub interpolants: Interpolants,
}

/// Vertex stage: maps one vertex into clip space and derives the view/world
/// interpolants.
///
/// Total function over finite inputs; a zero-length normal produces NaN via
/// `normalize`, which is the caller's problem per the pipeline contract.
pub fn transform_vertex(vertex: &VertexAttributes, transforms: &TransformSet) -> VertexOutput {
    let position = vertex.position.extend(1.0);
    // The 3x3 extraction drops the normal matrix's translation before it can
    // contaminate a direction vector.
    let view_normal = (Mat3::from_mat4(transforms.normal) * vertex.normal).normalize();
    VertexOutput {
        clip_position: transforms.model_view_projection * position,
        interpolants: Interpolants {
            world_position: transforms.model * position,
            view_position: transforms.model_view * position,
            view_normal,
        },
    }
}

//! CPU implementation of a two-stage forward Phong shading pipeline.
//!
//! The crate models the per-primitive contract between a vertex stage
//! ([`transform_vertex`]) and a fragment stage ([`shade_fragment`]) as pure
//! functions over value types, so the math can be exercised and tested
//! without a GPU.  Rasterization itself belongs to the host; a minimal
//! depth-tested reference host lives in [`raster`] for the CLI and tests.

pub mod lighting;
pub mod obj;
pub mod pipeline;
pub mod raster;
pub mod scene;
pub mod transform;

pub use lighting::{
    attenuation, shade_fragment, DiffuseFloor, LightingUniforms, SurfaceMaterial, DIFFUSE_FLOOR,
};
pub use obj::{load_obj_from_str, ObjMesh};
pub use pipeline::{shade_batch, shade_vertex};
pub use raster::{draw_mesh, Framebuffer};
pub use scene::{Light, Scene, SceneObject};
pub use transform::{transform_vertex, Interpolants, TransformSet, VertexAttributes, VertexOutput};

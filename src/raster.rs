use glam::{Vec2, Vec4};
use log::debug;

use crate::lighting::{shade_fragment, LightingUniforms, SurfaceMaterial};
use crate::obj::ObjMesh;
use crate::transform::{transform_vertex, Interpolants, TransformSet};

/// Color + depth target for the reference host.
///
/// Pipeline output is unclamped; clamping to [0, 1] happens here, at the
/// framebuffer write, which is the downstream boundary the stages leave it to.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![Vec4::new(0.0, 0.0, 0.0, 1.0); width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Vec4 {
        self.color[y * self.width + x]
    }

    /// Encodes the color buffer as a binary PPM (P6) image.
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.reserve(self.width * self.height * 3);
        for color in &self.color {
            for channel in [color.x, color.y, color.z] {
                out.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        out
    }
}

/// Draws an indexed mesh into the framebuffer, running the vertex stage per
/// vertex and the fragment stage per covered pixel.
///
/// This performs the steps the pipeline treats as external: perspective
/// divide, viewport mapping, coverage and barycentric interpolation of the
/// emitted interpolants. Affine (not perspective-correct) interpolation,
/// which is fine for a reference host. Triangles touching or crossing the
/// w = 0 plane are dropped rather than clipped.
pub fn draw_mesh(
    framebuffer: &mut Framebuffer,
    mesh: &ObjMesh,
    transforms: &TransformSet,
    uniforms: &LightingUniforms,
    material: &SurfaceMaterial,
) {
    let width = framebuffer.width as f32;
    let height = framebuffer.height as f32;
    let mut drawn = 0usize;

    for triangle in mesh.indices.chunks_exact(3) {
        let outputs = [
            transform_vertex(&mesh.vertices[triangle[0] as usize], transforms),
            transform_vertex(&mesh.vertices[triangle[1] as usize], transforms),
            transform_vertex(&mesh.vertices[triangle[2] as usize], transforms),
        ];
        if outputs.iter().any(|v| v.clip_position.w <= f32::EPSILON) {
            continue;
        }

        let mut screen = [Vec2::ZERO; 3];
        let mut depth = [0.0f32; 3];
        for (i, output) in outputs.iter().enumerate() {
            let ndc = output.clip_position.truncate() / output.clip_position.w;
            screen[i] = Vec2::new(
                (ndc.x + 1.0) * 0.5 * width,
                (1.0 - ndc.y) * 0.5 * height,
            );
            depth[i] = ndc.z;
        }

        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() < f32::EPSILON {
            continue;
        }

        let min_x = screen.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let min_y = screen.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_x = (screen.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() as usize)
            .min(framebuffer.width.saturating_sub(1));
        let max_y = (screen.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() as usize)
            .min(framebuffer.height.saturating_sub(1));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(screen[1], screen[2], sample);
                let w1 = edge(screen[2], screen[0], sample);
                let w2 = edge(screen[0], screen[1], sample);
                let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
                    || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if !inside {
                    continue;
                }

                let lambda = [w0 / area, w1 / area, w2 / area];
                let z = lambda[0] * depth[0] + lambda[1] * depth[1] + lambda[2] * depth[2];
                let index = y * framebuffer.width + x;
                if z >= framebuffer.depth[index] {
                    continue;
                }

                let interpolants = Interpolants::barycentric(
                    &outputs[0].interpolants,
                    &outputs[1].interpolants,
                    &outputs[2].interpolants,
                    lambda,
                );
                let color = shade_fragment(&interpolants, uniforms, material);
                framebuffer.depth[index] = z;
                framebuffer.color[index] = color.clamp(Vec4::ZERO, Vec4::ONE);
            }
        }
        drawn += 1;
    }

    debug!("rasterized {drawn}/{} triangles", mesh.indices.len() / 3);
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

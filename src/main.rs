use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use log::info;

use phong_pipeline::{
    draw_mesh, load_obj_from_str, Framebuffer, Light, LightingUniforms, ObjMesh, Scene,
    SceneObject, TransformSet,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.scene)
        .with_context(|| format!("failed to read scene {}", options.scene.display()))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );
    for object in &scene.objects {
        println!(" - {} ({})", object.name, object.object_type);
    }

    if options.summary_only {
        let light = scene.primary_light();
        println!(
            "Light at ({:.2}, {:.2}, {:.2}) radius {:.2} intensity {:.2}",
            light.position.x, light.position.y, light.position.z, light.radius, light.intensity
        );
        return Ok(());
    }

    let (width, height) = options.size;
    let aspect = width as f32 / height as f32;
    let (view, projection, camera_position) = camera_from_objects(&scene.objects, aspect);
    let light = scene.primary_light();

    let mut framebuffer = Framebuffer::new(width, height);
    let scene_dir = options.scene.parent().unwrap_or(Path::new("."));

    for object in scene.objects.iter().filter(|o| o.object_type == "mesh") {
        let mesh = load_mesh(object, scene_dir, options.mesh.as_deref())?;
        let model = model_matrix(object);
        let transforms = TransformSet::for_object(model, view, projection);
        let uniforms = lighting_uniforms(&scene, &light, &transforms, camera_position, view);
        let material = object.material(light.radius);
        info!(
            "drawing {} ({} triangles)",
            object.name,
            mesh.indices.len() / 3
        );
        draw_mesh(&mut framebuffer, &mesh, &transforms, &uniforms, &material);
    }

    fs::write(&options.output, framebuffer.to_ppm())
        .with_context(|| format!("failed to write image {}", options.output.display()))?;
    println!(
        "Wrote {}x{} render to {}",
        width,
        height,
        options.output.display()
    );
    Ok(())
}

/// Resolves the mesh for one object. A `--mesh` override beats the scene's
/// `<mesh>` tag and resolves as given; scene-declared paths resolve relative
/// to the scene file. Objects with neither fall back to the unit cube.
fn load_mesh(object: &SceneObject, scene_dir: &Path, override_path: Option<&Path>) -> Result<ObjMesh> {
    let path = match (override_path, object.mesh.as_deref()) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(mesh_path)) => scene_dir.join(mesh_path),
        (None, None) => return Ok(ObjMesh::unit_cube()),
    };
    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read mesh {}", path.display()))?;
    load_obj_from_str(&data).with_context(|| format!("failed to parse mesh {}", path.display()))
}

fn model_matrix(object: &SceneObject) -> Mat4 {
    Mat4::from_translation(object.position)
        * Mat4::from_rotation_z(object.rotation.z.to_radians())
        * Mat4::from_rotation_y(object.rotation.y.to_radians())
        * Mat4::from_rotation_x(object.rotation.x.to_radians())
        * Mat4::from_scale(object.scale)
}

/// Uniform block for one draw. The lighting stage works in view space, so the
/// light position is mapped through the view matrix here.
fn lighting_uniforms(
    scene: &Scene,
    light: &Light,
    transforms: &TransformSet,
    camera_position: Vec3,
    view: Mat4,
) -> LightingUniforms {
    LightingUniforms {
        camera_position: camera_position.extend(1.0),
        light_position: view * light.position.extend(1.0),
        light_color: light.color_vec4(),
        global_ambient: scene.global_ambient.extend(1.0),
        view_transform: view,
        model_view_transform: transforms.model_view,
    }
}

fn camera_from_objects(objects: &[SceneObject], aspect: f32) -> (Mat4, Mat4, Vec3) {
    let default_position = Vec3::new(0.0, 2.0, 6.0);
    let default_target = Vec3::ZERO;
    let (position, rotation, fov) = objects
        .iter()
        .find(|o| o.object_type == "camera")
        .map(|camera| (camera.position, camera.rotation, camera.fov))
        .unwrap_or((default_position, Vec3::ZERO, 60.0));

    let rotation_matrix = Mat4::from_rotation_z(rotation.z.to_radians())
        * Mat4::from_rotation_y(rotation.y.to_radians())
        * Mat4::from_rotation_x(rotation.x.to_radians());
    let forward = (rotation_matrix * Vec3::new(0.0, 0.0, -1.0).extend(0.0)).truncate();
    let up = (rotation_matrix * Vec3::Y.extend(0.0)).truncate();
    let target = if forward.length_squared() > f32::EPSILON {
        position + forward.normalize()
    } else {
        default_target
    };
    let view = Mat4::look_at_rh(position, target, up);
    let projection = Mat4::perspective_rh_gl(fov.to_radians(), aspect.max(0.01), 0.1, 100.0);
    (view, projection, position)
}

struct CliOptions {
    scene: PathBuf,
    mesh: Option<PathBuf>,
    size: (usize, usize),
    output: PathBuf,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(scene) = args.next() else {
            return Err(anyhow!(
                "Usage: phong-pipeline <scene.xml> [--mesh path] [--size WxH] [--output render.ppm] [--summary-only]"
            ));
        };
        let mut mesh = None;
        let mut size = (640, 480);
        let mut output = PathBuf::from("render.ppm");
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--mesh" => {
                    mesh = Some(
                        args.next()
                            .map(PathBuf::from)
                            .ok_or_else(|| anyhow!("--mesh expects a path"))?,
                    );
                }
                "--size" => {
                    let value = args.next().ok_or_else(|| anyhow!("--size expects WxH"))?;
                    size = parse_size(&value)?;
                }
                "--output" => {
                    output = args
                        .next()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow!("--output expects a path"))?;
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --mesh, --size, --output or --summary-only"
                    ));
                }
            }
        }
        Ok(Self {
            scene: PathBuf::from(scene),
            mesh,
            size,
            output,
            summary_only,
        })
    }
}

fn parse_size(value: &str) -> Result<(usize, usize)> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like 640x480"))?;
    let width = width.parse::<usize>().context("invalid width")?;
    let height = height.parse::<usize>().context("invalid height")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("size must be non-zero"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn parse_size_accepts_wxh() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn model_matrix_applies_scale_before_translation() {
        let object = SceneObject {
            position: Vec3::new(1.0, 0.0, 0.0),
            scale: Vec3::splat(2.0),
            ..SceneObject::default()
        };
        let model = model_matrix(&object);
        let p = model * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vec4::new(3.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn default_camera_is_used_when_scene_has_none() {
        let (view, _, position) = camera_from_objects(&[], 1.0);
        assert_eq!(position, Vec3::new(0.0, 2.0, 6.0));
        // The default camera faces -Z, so the world origin ends up in front
        // of it with no sideways offset.
        let origin = view * Vec4::W;
        assert!(origin.x.abs() < 1e-6);
        assert!(origin.z < 0.0);
    }
}

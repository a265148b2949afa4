use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::lighting::SurfaceMaterial;

/// Runtime representation of a scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub global_ambient: Vec3,
}

impl Scene {
    /// Parses the scene XML produced by the authoring tools.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();

        let global_ambient = document
            .descendants()
            .find(|n| n.has_tag_name("ambient"))
            .and_then(|n| n.text())
            .map(|text| parse_color(Some(text.to_string()), default_ambient()))
            .transpose()?
            .unwrap_or_else(default_ambient);

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let mut object = SceneObject::default();
            object.name = required_text(&node, "name")?;
            object.object_type = optional_text(&node, "type").unwrap_or_else(|| "mesh".to_string());
            object.mesh = optional_text(&node, "mesh");
            object.color = parse_color(optional_text(&node, "color"), object.color)?;
            object.specular = parse_color(optional_text(&node, "specular"), object.specular)?;
            object.position = parse_vec3(optional_text(&node, "position"), object.position)?;
            object.rotation = parse_vec3(optional_text(&node, "rotation"), object.rotation)?;
            object.scale = parse_vec3(optional_text(&node, "scale"), object.scale)?;
            object.fov = parse_f32(optional_text(&node, "fov"), object.fov)?;
            object.intensity = parse_f32(optional_text(&node, "intensity"), object.intensity)?;
            object.shininess = parse_f32(optional_text(&node, "shininess"), object.shininess)?;
            object.light_radius =
                parse_f32(optional_text(&node, "light-radius"), object.light_radius)?;
            objects.push(object);
        }

        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(|obj| Light {
                position: obj.position,
                color: obj.color,
                intensity: obj.intensity,
                radius: obj.light_radius,
            })
            .collect();

        Ok(Self {
            objects,
            lights,
            global_ambient,
        })
    }

    /// First light in the scene, or a neutral default when none is declared.
    pub fn primary_light(&self) -> Light {
        self.lights.first().copied().unwrap_or(Light {
            position: Vec3::new(3.0, 5.0, -3.0),
            color: Vec3::ONE,
            intensity: 1.0,
            radius: default_light_radius(),
        })
    }
}

/// Scene object as described by the authoring tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default = "default_color")]
    pub specular: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_shininess")]
    pub shininess: f32,
    #[serde(default = "default_light_radius")]
    pub light_radius: f32,
}

impl SceneObject {
    /// Surface response for this object, combined with the light's falloff
    /// radius at draw time.
    pub fn material(&self, light_radius: f32) -> SurfaceMaterial {
        SurfaceMaterial {
            diffuse: self.color.extend(1.0),
            specular: self.specular.extend(1.0),
            shininess: self.shininess,
            light_radius,
            ..SurfaceMaterial::default()
        }
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            mesh: None,
            color: default_color(),
            specular: default_color(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            fov: default_fov(),
            intensity: default_intensity(),
            shininess: default_shininess(),
            light_radius: default_light_radius(),
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    45.0
}

fn default_intensity() -> f32 {
    1.0
}

fn default_shininess() -> f32 {
    3.0
}

fn default_light_radius() -> f32 {
    5.0
}

fn default_ambient() -> Vec3 {
    Vec3::splat(0.2)
}

/// Light extracted from the scene object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

impl Light {
    /// Homogeneous light color with intensity folded into RGB.
    pub fn color_vec4(&self) -> Vec4 {
        (self.color * self.intensity).extend(1.0)
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let r = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let g = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let b = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

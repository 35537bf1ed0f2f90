//! Shorthand constructors for building trees inline.
//!
//! ```ignore
//! let tree = root(vec![shader(program, vec![
//!     translate(1.0, 0.0, 0.0, vec![draw_default_sphere()]),
//! ])]);
//! ```

use std::rc::Rc;

use cgmath::Matrix4;

use crate::{
    data_structures::{
        mesh::{MeshData, MeshNode},
        scene_graph::{GroupNode, SceneNode, ShaderNode, TransformNode},
    },
    device::ShaderProgram,
    math,
};

pub const SPHERE_RADIUS: f32 = 2.0;
pub const SPHERE_BANDS: u32 = 30;

pub fn root(children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    Box::new(GroupNode::new(children))
}

pub fn transform(matrix: Matrix4<f32>, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    Box::new(TransformNode::new(matrix, children))
}

pub fn translate(x: f32, y: f32, z: f32, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    transform(math::translate(x, y, z), children)
}

pub fn scale(x: f32, y: f32, z: f32, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    transform(math::scale(x, y, z), children)
}

pub fn rotate_x(degrees: f32, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    transform(math::rotate_x(degrees), children)
}

pub fn rotate_y(degrees: f32, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    transform(math::rotate_y(degrees), children)
}

pub fn rotate_z(degrees: f32, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    transform(math::rotate_z(degrees), children)
}

pub fn shader(program: Rc<ShaderProgram>, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    Box::new(ShaderNode::new(program, children))
}

pub fn draw(mesh: MeshData) -> Box<dyn SceneNode> {
    Box::new(MeshNode::new(mesh))
}

pub fn draw_sphere(radius: f32, latitude_bands: u32, longitude_bands: u32) -> Box<dyn SceneNode> {
    draw(MeshData::sphere(radius, latitude_bands, longitude_bands))
}

/// Sphere of radius 2 with 30 latitude and longitude bands.
pub fn draw_default_sphere() -> Box<dyn SceneNode> {
    draw_sphere(SPHERE_RADIUS, SPHERE_BANDS, SPHERE_BANDS)
}

pub fn draw_rect(width: f32, height: f32) -> Box<dyn SceneNode> {
    draw(MeshData::rect(width, height))
}

pub fn draw_default_rect() -> Box<dyn SceneNode> {
    draw_rect(1.0, 1.0)
}

pub fn draw_floor(half_extent: f32, uv_repeat: f32) -> Box<dyn SceneNode> {
    draw(MeshData::floor(half_extent, uv_repeat))
}

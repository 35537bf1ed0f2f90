//! Per-frame render state threaded through the traversal.

use std::{rc::Rc, time::Duration};

use cgmath::{Matrix4, SquareMatrix};

use crate::device::{
    AttributeLocation, GraphicsDevice, ProgramId, ShaderProgram, UniformLocation, UniformValue,
};

/// State that scene nodes read and temporarily modify while the tree is
/// rendered.
///
/// A fresh context is built by the frame driver for every frame. Nodes change
/// `scene_matrix` and `shader` on the way down and restore them on the way up,
/// so after [`crate::render::render`] returns the context is back to its initial
/// state.
pub struct RenderContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    /// Cumulative model transform; `None` until the first transform node.
    pub scene_matrix: Option<Matrix4<f32>>,
    pub shader: Option<Rc<ShaderProgram>>,
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub time: Duration,
}

/// Comparable copy of the fields nodes are allowed to touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextSnapshot {
    pub scene_matrix: Option<Matrix4<f32>>,
    pub shader: Option<ProgramId>,
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub time: Duration,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
    ) -> Self {
        Self {
            device,
            scene_matrix: None,
            shader: None,
            projection,
            view,
            time: Duration::ZERO,
        }
    }

    pub fn with_time(mut self, time: Duration) -> Self {
        self.time = time;
        self
    }

    /// The cumulative model matrix, identity outside any transform node.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.scene_matrix.unwrap_or_else(Matrix4::identity)
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.shader.as_ref()?.uniform(name)
    }

    pub fn attribute_location(&self, name: &str) -> Option<AttributeLocation> {
        self.shader.as_ref()?.attribute(name)
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform_location(name).is_some()
    }

    /// Write `value` to `name` of the active shader. Returns `false` and does
    /// nothing when no shader is active or the shader lacks the uniform.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        match self.uniform_location(name) {
            Some(location) => {
                self.device.set_uniform(location, &value.into().for_shader());
                true
            }
            None => {
                log::trace!("uniform '{name}' not exposed by the active shader, skipped");
                false
            }
        }
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            scene_matrix: self.scene_matrix,
            shader: self.shader.as_ref().map(|s| s.id()),
            projection: self.projection,
            view: self.view,
            time: self.time,
        }
    }
}

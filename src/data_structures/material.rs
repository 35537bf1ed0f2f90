//! Phong materials.

use std::any::Any;

use cgmath::Vector4;

use crate::{
    context::RenderContext,
    data_structures::{
        light::LightHandle,
        scene_graph::{NodeId, NodeKind, SceneNode},
    },
    names,
};

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialParams {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub emission: Vector4<f32>,
    pub shininess: f32,
    /// Name of the uniform struct, see [`crate::names::DEFAULT_MATERIAL`].
    pub uniform: String,
    /// Diffuse texture file named by an MTL `map_Kd`. Informational, the
    /// application decides whether to wrap the material in a texture node.
    pub texture: Option<String>,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            ambient: Vector4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vector4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vector4::new(0.0, 0.0, 0.0, 1.0),
            emission: Vector4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
            uniform: names::DEFAULT_MATERIAL.to_string(),
            texture: None,
        }
    }
}

/// Writes a material struct and re-applies the lights it references before
/// rendering its children.
pub struct MaterialNode {
    id: NodeId,
    pub params: MaterialParams,
    pub lights: Vec<LightHandle>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl MaterialNode {
    pub fn new(children: Vec<Box<dyn SceneNode>>) -> Self {
        Self::with_params(MaterialParams::default(), children)
    }

    pub fn with_params(params: MaterialParams, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            params,
            lights: Vec::new(),
            children,
        }
    }

    pub fn with_light(mut self, light: LightHandle) -> Self {
        self.lights.push(light);
        self
    }

    fn set_material_uniforms(&self, ctx: &mut RenderContext<'_>) {
        let p = &self.params;
        let ambient = names::field(&p.uniform, "ambient");
        if !ctx.has_uniform(&ambient) {
            log::trace!("no material struct '{}' in the active shader", p.uniform);
            return;
        }
        ctx.set_uniform(&ambient, p.ambient);
        ctx.set_uniform(&names::field(&p.uniform, "diffuse"), p.diffuse);
        ctx.set_uniform(&names::field(&p.uniform, "specular"), p.specular);
        ctx.set_uniform(&names::field(&p.uniform, "emission"), p.emission);
        ctx.set_uniform(&names::field(&p.uniform, "shininess"), p.shininess);
    }
}

impl SceneNode for MaterialNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Material
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        self.set_material_uniforms(ctx);
        for light in &self.lights {
            light.apply(ctx);
        }
        self.render_children(ctx);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//! Point lights.
//!
//! A [`LightNode`] sits in the tree like a transform: it positions its children
//! (for example a marker sphere) at the light's location. While rendering it
//! also computes the light's view-space position and writes the light struct
//! into the active shader.
//!
//! Materials elsewhere in the tree can re-apply the same light through a
//! [`LightHandle`] without recomputing the position, so a light rendered once
//! per frame illuminates every material that references it.

use std::{
    any::Any,
    cell::{Ref, RefCell},
    rc::Rc,
};

use cgmath::{Vector3, Vector4};

use crate::{
    context::RenderContext,
    data_structures::scene_graph::{NodeId, NodeKind, SceneNode, TransformNode},
    math, names,
};

#[derive(Clone, Debug, PartialEq)]
pub struct LightParams {
    /// Position relative to the light node's parent transform.
    pub position: Vector3<f32>,
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    /// Name of the uniform struct, see [`crate::names::DEFAULT_LIGHT`].
    pub uniform: String,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            ambient: Vector4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vector4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vector4::new(1.0, 1.0, 1.0, 1.0),
            uniform: names::DEFAULT_LIGHT.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Light {
    pub params: LightParams,
    view_position: Option<Vector3<f32>>,
}

/// Shared reference to a light. The owning [`LightNode`] and any number of
/// materials hold clones.
#[derive(Clone, Debug, Default)]
pub struct LightHandle(Rc<RefCell<Light>>);

impl LightHandle {
    pub fn new(params: LightParams) -> Self {
        Self(Rc::new(RefCell::new(Light {
            params,
            view_position: None,
        })))
    }

    pub fn params(&self) -> Ref<'_, LightParams> {
        Ref::map(self.0.borrow(), |light| &light.params)
    }

    pub fn update(&self, f: impl FnOnce(&mut LightParams)) {
        f(&mut self.0.borrow_mut().params);
    }

    pub fn set_position(&self, position: Vector3<f32>) {
        self.update(|params| params.position = position);
    }

    /// The position last computed by [`Self::compute_position`].
    pub fn view_position(&self) -> Option<Vector3<f32>> {
        self.0.borrow().view_position
    }

    /// Transform the local position by `view * model` and cache it.
    pub fn compute_position(&self, ctx: &RenderContext<'_>) {
        let model_view = ctx.view * ctx.model_matrix();
        let mut light = self.0.borrow_mut();
        light.view_position = Some(math::transform_point(&model_view, light.params.position));
    }

    /// Write the cached position (the local one if none was computed yet) and
    /// the colours into the active shader.
    ///
    /// `<uniform>Pos` and the struct fields are probed separately: a program
    /// may consume only one of them.
    pub fn apply(&self, ctx: &mut RenderContext<'_>) {
        if ctx.shader.is_none() {
            return;
        }
        let light = self.0.borrow();
        let params = &light.params;

        let position = light.view_position.unwrap_or(params.position);
        ctx.set_uniform(&names::light_position(&params.uniform), position);

        let ambient = names::field(&params.uniform, "ambient");
        if !ctx.has_uniform(&ambient) {
            log::trace!("no light struct '{}' in the active shader", params.uniform);
            return;
        }
        ctx.set_uniform(&ambient, params.ambient);
        ctx.set_uniform(&names::field(&params.uniform, "diffuse"), params.diffuse);
        ctx.set_uniform(&names::field(&params.uniform, "specular"), params.specular);
    }
}

pub struct LightNode {
    id: NodeId,
    light: LightHandle,
    transform: TransformNode,
}

impl LightNode {
    pub fn new(position: Vector3<f32>, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self::with_params(
            LightParams {
                position,
                ..Default::default()
            },
            children,
        )
    }

    /// A light with the given parameters. Copying another light is
    /// `LightNode::with_params(other.handle().params().clone(), children)`.
    pub fn with_params(params: LightParams, children: Vec<Box<dyn SceneNode>>) -> Self {
        let mut transform = TransformNode::identity();
        transform.children = children;
        Self {
            id: NodeId::next(),
            light: LightHandle::new(params),
            transform,
        }
    }

    /// A handle materials can reference.
    pub fn handle(&self) -> LightHandle {
        self.light.clone()
    }
}

impl SceneNode for LightNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Light
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        self.light.compute_position(ctx);
        self.light.apply(ctx);

        let p = self.light.params().position;
        self.transform.matrix = math::translate(p.x, p.y, p.z);
        self.transform.render(ctx);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        self.transform.get_children()
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        self.transform.get_children_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

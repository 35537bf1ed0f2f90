//! Scene graph and hierarchical render-state organization.
//!
//! A scene is a tree of boxed [`SceneNode`]s. Each node exclusively owns its
//! children, renders them in insertion order and undoes every change it made
//! to the [`RenderContext`] before returning. Which state a node touches depends
//! on its kind:
//!
//! - [`GroupNode`] only groups children
//! - [`TransformNode`] multiplies its matrix onto the cumulative transform
//! - [`ShaderNode`] activates a program for its subtree
//! - [`UniformNode`] writes a fixed set of uniforms to the active program
//!
//! Meshes, materials, lights and textures live in their own modules.

use std::{
    any::Any,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    context::RenderContext,
    device::{ShaderProgram, UniformValue},
};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a node, assigned on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Transform,
    Shader,
    Uniform,
    Texture,
    Mesh,
    Material,
    Light,
}

pub trait SceneNode: Any {
    fn id(&self) -> NodeId;

    fn kind(&self) -> NodeKind;

    /// Apply this node's state, render the children, restore the state.
    fn render(&mut self, ctx: &mut RenderContext<'_>);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn render_children(&mut self, ctx: &mut RenderContext<'_>) {
        for child in self.get_children_mut().iter_mut() {
            child.render(ctx);
        }
    }

    /// Append `child` and return it, so trees can be built by chaining.
    fn append(&mut self, child: Box<dyn SceneNode>) -> &mut dyn SceneNode {
        let children = self.get_children_mut();
        children.push(child);
        let last = children.len() - 1;
        &mut *children[last]
    }

    /// Remove the first direct child with `id`. Returns whether a child was
    /// removed.
    fn remove(&mut self, id: NodeId) -> bool {
        self.take(id).is_some()
    }

    /// Detach the first direct child with `id` and hand it back, e.g. to insert
    /// it somewhere else later.
    fn take(&mut self, id: NodeId) -> Option<Box<dyn SceneNode>> {
        let children = self.get_children_mut();
        let idx = children.iter().position(|child| child.id() == id)?;
        Some(children.remove(idx))
    }

    /// Depth-first search among the descendants.
    fn find_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode> {
        for child in self.get_children_mut().iter_mut() {
            if child.id() == id {
                let found: &mut dyn SceneNode = &mut **child;
                return Some(found);
            }
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }
}

impl<'n> dyn SceneNode + 'n {
    pub fn downcast_ref<T: SceneNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: SceneNode>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A node without state of its own. Used as the root of most trees.
pub struct GroupNode {
    id: NodeId,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl GroupNode {
    pub fn new(children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            children,
        }
    }
}

impl Default for GroupNode {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SceneNode for GroupNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Group
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
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

/// Applies a local matrix to everything below it.
///
/// The matrix is public so applications can animate it between frames.
pub struct TransformNode {
    id: NodeId,
    pub matrix: Matrix4<f32>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl TransformNode {
    pub fn new(matrix: Matrix4<f32>, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            matrix,
            children,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix4::identity(), Vec::new())
    }
}

impl SceneNode for TransformNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Transform
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let previous = ctx.scene_matrix;
        ctx.scene_matrix = Some(match previous {
            Some(parent) => parent * self.matrix,
            None => self.matrix,
        });
        self.render_children(ctx);
        ctx.scene_matrix = previous;
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

/// Activates a program for its subtree and re-activates the previous one
/// afterwards.
pub struct ShaderNode {
    id: NodeId,
    pub program: Rc<ShaderProgram>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ShaderNode {
    pub fn new(program: Rc<ShaderProgram>, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            program,
            children,
        }
    }
}

impl SceneNode for ShaderNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Shader
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let previous = ctx.shader.replace(self.program.clone());
        ctx.device.use_program(Some(self.program.id()));

        self.render_children(ctx);

        ctx.shader = previous;
        if let Some(program) = &ctx.shader {
            ctx.device.use_program(Some(program.id()));
        }
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

/// Writes a fixed set of uniforms every time it is rendered.
///
/// Entries are written in insertion order. Uniforms the active program does not
/// declare are skipped.
pub struct UniformNode {
    id: NodeId,
    uniforms: Vec<(String, UniformValue)>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl UniformNode {
    pub fn new(children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            uniforms: Vec::new(),
            children,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace the value of `name`.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some((_, current)) => *current = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }

    pub fn unset(&mut self, name: &str) -> Option<UniformValue> {
        let idx = self.uniforms.iter().position(|(n, _)| n == name)?;
        Some(self.uniforms.remove(idx).1)
    }
}

impl SceneNode for UniformNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Uniform
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if ctx.shader.is_some() {
            for (name, value) in &self.uniforms {
                ctx.set_uniform(name, *value);
            }
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

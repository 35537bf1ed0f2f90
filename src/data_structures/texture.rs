//! Texture binding node.
//!
//! A [`TextureNode`] owns decoded image data and a lazily created device
//! texture. While its subtree renders, the texture is bound to the node's unit,
//! the sampler uniform points at that unit and `<uniform>Enabled` is 1. On the
//! way out the unit is unbound and the flag is reset to 0, so siblings never
//! sample a texture they did not ask for.

use std::any::Any;

use crate::{
    context::RenderContext,
    data_structures::scene_graph::{NodeId, NodeKind, SceneNode},
    device::{ImageData, TextureId, TextureParams},
    names,
};

pub struct TextureNode {
    id: NodeId,
    image: ImageData,
    params: TextureParams,
    pub unit: u32,
    pub uniform: String,
    texture: Option<TextureId>,
    /// Handle invalidated by an image or parameter change, deleted on the next
    /// render.
    stale: Option<TextureId>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl TextureNode {
    pub fn new(image: ImageData, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            id: NodeId::next(),
            image,
            params: TextureParams::default(),
            unit: 0,
            uniform: names::DEFAULT_TEXTURE.to_string(),
            texture: None,
            stale: None,
            children,
        }
    }

    pub fn with_unit(mut self, unit: u32) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_uniform(mut self, uniform: &str) -> Self {
        self.uniform = uniform.to_string();
        self
    }

    pub fn with_params(mut self, params: TextureParams) -> Self {
        self.params = params;
        self
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }

    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    /// The device texture, `None` until the first render.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Replace the image. The texture is re-created on the next render.
    pub fn set_image(&mut self, image: ImageData) {
        self.image = image;
        self.invalidate();
    }

    /// Change sampling options, e.g. toggle mipmaps or anisotropic filtering.
    /// The texture is re-created on the next render.
    pub fn set_params(&mut self, params: TextureParams) {
        if params != self.params {
            self.params = params;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        // without a live handle there is nothing to replace
        if let Some(texture) = self.texture.take() {
            self.stale = Some(texture);
        }
    }

    fn ensure_texture(&mut self, ctx: &mut RenderContext<'_>) -> TextureId {
        if let Some(stale) = self.stale.take() {
            log::debug!("deleting {stale:?} of texture node {:?}", self.id);
            ctx.device.delete_texture(stale);
        }
        match self.texture {
            Some(texture) => texture,
            None => {
                let texture = ctx.device.create_texture(&self.image, &self.params);
                log::debug!(
                    "created {texture:?} ({}x{}) for texture node {:?}",
                    self.image.width(),
                    self.image.height(),
                    self.id
                );
                self.texture = Some(texture);
                texture
            }
        }
    }
}

impl SceneNode for TextureNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Texture
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let texture = self.ensure_texture(ctx);
        let enabled = names::texture_enabled(&self.uniform);

        if ctx.set_uniform(&self.uniform, self.unit as i32) {
            ctx.set_uniform(&enabled, true);
            ctx.device.bind_texture(self.unit, Some(texture));
        }

        self.render_children(ctx);

        ctx.device.bind_texture(self.unit, None);
        ctx.set_uniform(&enabled, false);
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

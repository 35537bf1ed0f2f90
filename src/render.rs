//! Frame entry point of the traversal.
//!
//! [`render`] walks the tree depth-first in insertion order. Every node
//! restores what it changed in the [`RenderContext`] before returning, so the
//! context a frame driver hands in is the context it gets back.

use crate::{context::RenderContext, data_structures::scene_graph::SceneNode};

/// Render `root` and all its descendants once.
pub fn render(root: &mut dyn SceneNode, ctx: &mut RenderContext<'_>) {
    #[cfg(debug_assertions)]
    let before = ctx.snapshot();

    root.render(ctx);

    #[cfg(debug_assertions)]
    {
        if ctx.snapshot() != before {
            log::warn!("render context was not restored after traversing {:?}", root.id());
        }
    }
}

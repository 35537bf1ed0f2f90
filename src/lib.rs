//! flow-scene
//!
//! A retained-mode scene graph. An application builds a tree of nodes once
//! and renders it every frame; a depth-first traversal threads a
//! [`RenderContext`](context::RenderContext) through the tree while transform,
//! shader, uniform, texture, material and light nodes push their state and
//! mesh nodes draw with whatever is active.
//!
//! High-level modules
//! - `context`: the per-frame render context nodes read and restore
//! - `data_structures`: the node tree, geometry and render-state nodes
//! - `device`: the graphics device seam, shader programs, a recording device
//!   for headless use and the wgpu backend
//! - `flow`: window, event loop and frame driver
//! - `math`: matrix helpers on top of `cgmath`
//! - `names`: attribute and uniform naming conventions shared with shaders
//! - `render`: the traversal entry point
//! - `resources`: OBJ, MTL and image loading
//!

pub mod context;
pub mod data_structures;
pub mod device;
pub mod flow;
pub mod math;
pub mod names;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::event::WindowEvent;

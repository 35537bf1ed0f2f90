//! Scene data structures: the node tree, geometry and render-state nodes.
//!
//! - `scene_graph` defines the [`SceneNode`](scene_graph::SceneNode) contract
//!   plus group, transform, shader and uniform nodes
//! - `mesh` holds geometry and lazily uploads it for drawing
//! - `geometry` builds rectangles, spheres and floors
//! - `tangents` derives per-face tangents for normal mapping
//! - `material` and `light` implement the Phong uniform structs
//! - `texture` binds an image to a texture unit for a subtree
//! - `builder` has shorthand constructors for inline tree building

pub mod builder;
pub mod geometry;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene_graph;
pub mod tangents;
pub mod texture;

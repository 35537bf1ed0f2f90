//! Attribute and uniform names shared between the scene graph and shaders.
//!
//! These names are a fixed contract: meshes bind their arrays to the
//! attributes below, mesh nodes push the transform uniforms, and material,
//! light and texture nodes derive field names from their configured uniform
//! name.

pub const A_POSITION: &str = "a_position";
pub const A_TEXCOORD: &str = "a_texCoord";
pub const A_NORMAL: &str = "a_normal";
pub const A_TANGENT: &str = "a_tangent";
pub const A_COLOR: &str = "a_color";

pub const U_MODEL: &str = "u_model";
pub const U_VIEW: &str = "u_view";
pub const U_MODEL_VIEW: &str = "u_modelView";
pub const U_PROJECTION: &str = "u_projection";
pub const U_NORMAL_MATRIX: &str = "u_normalMatrix";
pub const U_MODEL_NORMAL_MATRIX: &str = "u_modelNormalMatrix";
pub const U_MODEL_VIEW_NORMAL_MATRIX: &str = "u_modelViewNormalMatrix";
pub const U_INV_VIEW: &str = "u_invView";
pub const U_INV_VIEW_NORMAL_MATRIX: &str = "u_invViewNormalMatrix";
pub const U_INV_VIEW_PROJ_MATRIX: &str = "u_invViewProjMatrix";

pub const DEFAULT_MATERIAL: &str = "u_material";
pub const DEFAULT_LIGHT: &str = "u_light";
pub const DEFAULT_TEXTURE: &str = "u_tex";

/// `<struct>.<field>`
pub fn field(uniform: &str, field: &str) -> String {
    format!("{uniform}.{field}")
}

/// Sibling vector holding a light's position: `<name>Pos`.
pub fn light_position(uniform: &str) -> String {
    format!("{uniform}Pos")
}

/// Companion flag of a sampler: `<name>Enabled`.
pub fn texture_enabled(uniform: &str) -> String {
    format!("{uniform}Enabled")
}

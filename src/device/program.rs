//! Shader program declaration and reflection.
//!
//! A [`ProgramSource`] lists the shader code together with the vertex
//! attributes and uniforms it consumes. Linking resolves every declared name to
//! a location exactly once; nodes then ask the [`ShaderProgram`] whether a name
//! exists instead of probing the device every frame.

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    device::{AttributeLocation, GraphicsDevice, ProgramId, UniformKind, UniformLocation},
    names,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub components: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
}

/// Fixed-function state a program is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderState {
    /// Test fragments against the depth buffer and write their depth.
    pub depth_test: bool,
    /// Blend colour output over the target using source alpha.
    pub blending: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            blending: true,
        }
    }
}

/// Shader code plus the interface it exposes.
///
/// Attribute `i` is read from vertex slot / `@location(i)`, uniforms are laid
/// out in declaration order. Samplers are declared as uniforms of kind
/// [`UniformKind::Sampler`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: String,
    pub code: String,
    pub attributes: Vec<AttributeDecl>,
    pub uniforms: Vec<UniformDecl>,
    pub state: RenderState,
}

impl ProgramSource {
    pub fn new(label: &str, code: &str) -> Self {
        Self {
            label: label.to_string(),
            code: code.to_string(),
            ..Default::default()
        }
    }

    pub fn attribute(mut self, name: &str, components: u32) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.to_string(),
            components,
        });
        self
    }

    pub fn uniform(mut self, name: &str, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// Draw over everything already in the frame, leaving depth untouched.
    pub fn without_depth_test(mut self) -> Self {
        self.state.depth_test = false;
        self
    }

    /// Replace the target colour instead of alpha blending over it.
    pub fn without_blending(mut self) -> Self {
        self.state.blending = false;
        self
    }

    pub fn sampler(self, name: &str) -> Self {
        self.uniform(name, UniformKind::Sampler)
    }

    /// All transform uniforms pushed by mesh nodes. The four-by-four matrices
    /// come first, followed by the normal matrices.
    pub fn with_transforms(self) -> Self {
        self.uniform(names::U_MODEL, UniformKind::Mat4)
            .uniform(names::U_VIEW, UniformKind::Mat4)
            .uniform(names::U_MODEL_VIEW, UniformKind::Mat4)
            .uniform(names::U_PROJECTION, UniformKind::Mat4)
            .uniform(names::U_INV_VIEW, UniformKind::Mat4)
            .uniform(names::U_INV_VIEW_PROJ_MATRIX, UniformKind::Mat4)
            .uniform(names::U_NORMAL_MATRIX, UniformKind::Mat3)
            .uniform(names::U_MODEL_NORMAL_MATRIX, UniformKind::Mat3)
            .uniform(names::U_MODEL_VIEW_NORMAL_MATRIX, UniformKind::Mat3)
            .uniform(names::U_INV_VIEW_NORMAL_MATRIX, UniformKind::Mat3)
    }

    /// `<name>.ambient/.diffuse/.specular/.emission/.shininess`
    pub fn with_material(self, name: &str) -> Self {
        self.uniform(&names::field(name, "ambient"), UniformKind::Vec4)
            .uniform(&names::field(name, "diffuse"), UniformKind::Vec4)
            .uniform(&names::field(name, "specular"), UniformKind::Vec4)
            .uniform(&names::field(name, "emission"), UniformKind::Vec4)
            .uniform(&names::field(name, "shininess"), UniformKind::Float)
    }

    /// `<name>.ambient/.diffuse/.specular` and `<name>Pos`
    pub fn with_light(self, name: &str) -> Self {
        self.uniform(&names::field(name, "ambient"), UniformKind::Vec4)
            .uniform(&names::field(name, "diffuse"), UniformKind::Vec4)
            .uniform(&names::field(name, "specular"), UniformKind::Vec4)
            .uniform(&names::light_position(name), UniformKind::Vec3)
    }

    /// Sampler `<name>` and its flag `<name>Enabled`.
    pub fn with_texture(self, name: &str) -> Self {
        self.sampler(name)
            .uniform(&names::texture_enabled(name), UniformKind::Bool)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for attribute in &self.attributes {
            if !(1..=4).contains(&attribute.components) {
                anyhow::bail!(
                    "program '{}': attribute '{}' has {} components, expected 1 to 4",
                    self.label,
                    attribute.name,
                    attribute.components
                );
            }
            if !seen.insert(attribute.name.as_str()) {
                anyhow::bail!(
                    "program '{}': attribute '{}' declared twice",
                    self.label,
                    attribute.name
                );
            }
        }
        let mut seen = HashSet::new();
        for uniform in &self.uniforms {
            if !seen.insert(uniform.name.as_str()) {
                anyhow::bail!(
                    "program '{}': uniform '{}' declared twice",
                    self.label,
                    uniform.name
                );
            }
        }
        Ok(())
    }
}

/// A linked program and its reflection tables.
///
/// Shared between shader nodes through `Rc`; the [`ProgramRegistry`] or the
/// application owns the programs, the tree only references them.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    attributes: HashMap<String, (AttributeLocation, u32)>,
    uniforms: HashMap<String, (UniformLocation, UniformKind)>,
}

impl ShaderProgram {
    pub fn link(
        device: &mut dyn GraphicsDevice,
        source: &ProgramSource,
    ) -> anyhow::Result<Rc<Self>> {
        source.validate()?;
        let id = device.link_program(source)?;
        let attributes = source
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), (AttributeLocation(i as u32), a.components)))
            .collect();
        let uniforms = source
            .uniforms
            .iter()
            .enumerate()
            .map(|(i, u)| (u.name.clone(), (UniformLocation(i as u32), u.kind)))
            .collect();
        log::debug!(
            "linked program '{}' as {:?} ({} attributes, {} uniforms)",
            source.label,
            id,
            source.attributes.len(),
            source.uniforms.len()
        );
        Ok(Rc::new(Self {
            id,
            label: source.label.clone(),
            attributes,
            uniforms,
        }))
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeLocation> {
        self.attributes.get(name).map(|(location, _)| *location)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).map(|(location, _)| *location)
    }

    pub fn uniform_kind(&self, name: &str) -> Option<UniformKind> {
        self.uniforms.get(name).map(|(_, kind)| *kind)
    }
}

impl PartialEq for ShaderProgram {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Owns linked programs by label so that several shader nodes can share one.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: HashMap<String, Rc<ShaderProgram>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `source` and register it under its label, replacing any program
    /// previously registered with that label.
    pub fn link(
        &mut self,
        device: &mut dyn GraphicsDevice,
        source: &ProgramSource,
    ) -> anyhow::Result<Rc<ShaderProgram>> {
        let program = ShaderProgram::link(device, source)?;
        if self
            .programs
            .insert(source.label.clone(), program.clone())
            .is_some()
        {
            log::warn!("program '{}' was replaced in the registry", source.label);
        }
        Ok(program)
    }

    pub fn get(&self, label: &str) -> Option<Rc<ShaderProgram>> {
        self.programs.get(label).cloned()
    }

    pub fn remove(&mut self, label: &str) -> Option<Rc<ShaderProgram>> {
        self.programs.remove(label)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

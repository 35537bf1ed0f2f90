//! A headless [`GraphicsDevice`] that records every call.
//!
//! Used by the test-suite and handy for dry runs: render a tree once, then
//! inspect which programs, uniforms, buffers and draws it produced.

use std::collections::HashMap;

use crate::device::{
    AttributeLocation, BufferData, BufferId, GraphicsDevice, ImageData, ProgramId, ProgramSource,
    RenderState, TextureId, TextureParams, UniformLocation, UniformValue,
};

/// One recorded device call. Uniforms and attributes are recorded by name so
/// that assertions do not depend on location numbering.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LinkProgram {
        program: ProgramId,
        label: String,
        state: RenderState,
    },
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    CreateBuffer {
        buffer: BufferId,
        index: bool,
        len: usize,
        components: u32,
    },
    BindAttribute {
        program: Option<ProgramId>,
        name: String,
        buffer: BufferId,
        components: u32,
    },
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
        params: TextureParams,
    },
    DeleteTexture(TextureId),
    BindTexture {
        unit: u32,
        texture: Option<TextureId>,
    },
    DrawIndexed {
        program: Option<ProgramId>,
        indices: BufferId,
        count: u32,
    },
    DrawArrays {
        program: Option<ProgramId>,
        first: u32,
        count: u32,
    },
}

#[derive(Clone, Debug)]
enum StoredBuffer {
    Vertex(Vec<f32>),
    Index(Vec<u32>),
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<Command>,
    programs: HashMap<ProgramId, ProgramSource>,
    buffers: HashMap<BufferId, StoredBuffer>,
    live_textures: Vec<TextureId>,
    current: Option<ProgramId>,
    next_program: u32,
    next_buffer: u32,
    next_texture: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current
    }

    /// All values written to `name`, in order, across all programs.
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform {
                    name: written,
                    value,
                    ..
                } if written == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniform_writes(name).pop()
    }

    pub fn draws(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. } | Command::DrawArrays { .. }))
            .collect()
    }

    pub fn buffers_created(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::CreateBuffer { .. }))
            .count()
    }

    /// Contents of a vertex buffer.
    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[f32]> {
        match self.buffers.get(&buffer)? {
            StoredBuffer::Vertex(data) => Some(data),
            StoredBuffer::Index(_) => None,
        }
    }

    pub fn index_data(&self, buffer: BufferId) -> Option<&[u32]> {
        match self.buffers.get(&buffer)? {
            StoredBuffer::Index(data) => Some(data),
            StoredBuffer::Vertex(_) => None,
        }
    }

    /// Textures created and not yet deleted.
    pub fn live_textures(&self) -> &[TextureId] {
        &self.live_textures
    }

    fn declared<'a>(&'a self, program: ProgramId) -> Option<&'a ProgramSource> {
        self.programs.get(&program)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn link_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramId> {
        if source.code.trim().is_empty() {
            anyhow::bail!("program '{}' has no shader code", source.label);
        }
        self.next_program += 1;
        let program = ProgramId(self.next_program);
        self.programs.insert(program, source.clone());
        self.commands.push(Command::LinkProgram {
            program,
            label: source.label.clone(),
            state: source.state,
        });
        Ok(program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current = program;
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let Some(program) = self.current else {
            log::warn!("uniform {:?} written without a program in use", location);
            return;
        };
        let name = self
            .declared(program)
            .and_then(|source| source.uniforms.get(location.0 as usize))
            .map(|decl| decl.name.clone());
        match name {
            Some(name) => self.commands.push(Command::SetUniform {
                program,
                name,
                value: *value,
            }),
            None => log::warn!("{:?} has no uniform at {:?}", program, location),
        }
    }

    fn create_buffer(&mut self, data: BufferData<'_>) -> BufferId {
        self.next_buffer += 1;
        let buffer = BufferId(self.next_buffer);
        let (stored, index, components) = match data {
            BufferData::Vertex { data, components } => {
                (StoredBuffer::Vertex(data.to_vec()), false, components)
            }
            BufferData::Index(indices) => (StoredBuffer::Index(indices.to_vec()), true, 1),
        };
        self.buffers.insert(buffer, stored);
        self.commands.push(Command::CreateBuffer {
            buffer,
            index,
            len: data.len(),
            components,
        });
        buffer
    }

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferId, components: u32) {
        let name = self
            .current
            .and_then(|program| self.declared(program))
            .and_then(|source| source.attributes.get(location.0 as usize))
            .map(|decl| decl.name.clone())
            .unwrap_or_else(|| format!("#{}", location.0));
        self.commands.push(Command::BindAttribute {
            program: self.current,
            name,
            buffer,
            components,
        });
    }

    fn create_texture(&mut self, image: &ImageData, params: &TextureParams) -> TextureId {
        self.next_texture += 1;
        let texture = TextureId(self.next_texture);
        self.live_textures.push(texture);
        self.commands.push(Command::CreateTexture {
            texture,
            width: image.width(),
            height: image.height(),
            params: *params,
        });
        texture
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live_textures.retain(|t| *t != texture);
        self.commands.push(Command::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn draw_indexed(&mut self, indices: BufferId, count: u32) {
        self.commands.push(Command::DrawIndexed {
            program: self.current,
            indices,
            count,
        });
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        self.commands.push(Command::DrawArrays {
            program: self.current,
            first,
            count,
        });
    }
}

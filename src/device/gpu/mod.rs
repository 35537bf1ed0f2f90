//! wgpu backend of [`GraphicsDevice`].
//!
//! wgpu has no notion of "the program in use" or of uniforms written one at a
//! time, so the device emulates them:
//! - every program keeps a CPU copy of its uniform struct that
//!   [`set_uniform`](GraphicsDevice::set_uniform) patches in place
//! - every draw snapshots that copy into a per-frame uniform stream, takes the
//!   attribute bindings made since the previous draw and remembers the
//!   textures bound to the units its samplers read
//! - [`WgpuDevice::submit`] replays the recorded draws in one render pass
//!
//! Attributes a program declares but nothing bound read zeros, samplers whose
//! unit has no texture read a white 1x1 texture.

use std::collections::{HashMap, HashSet};

use wgpu::util::DeviceExt;

use crate::device::{
    AttributeLocation, BufferData, BufferId, GraphicsDevice, ImageData, ProgramId, TextureId,
    TextureParams, UniformLocation, UniformValue,
    gpu::{
        layout::Slot,
        pipeline::{ProgramPipeline, mk_program_pipeline},
        texture::GpuTexture,
    },
    program::ProgramSource,
};

pub mod layout;
pub mod pipeline;
pub mod texture;

/// Largest vertex attribute the zero buffer has to cover: a `vec4<f32>`.
const ZERO_VERTEX_STRIDE: u64 = 16;

struct ProgramState {
    pipeline: ProgramPipeline,
    block: Vec<u8>,
    /// Texture unit each declared sampler reads from.
    sampler_units: Vec<i32>,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    /// Largest index stored, for index buffers.
    max_index: Option<u32>,
}

#[derive(Clone, Copy, Debug)]
enum DrawKind {
    Indexed { indices: BufferId, count: u32 },
    Arrays { first: u32, count: u32 },
}

struct DrawCall {
    program: ProgramId,
    uniform_offset: u32,
    vertex_buffers: Vec<Option<BufferId>>,
    textures: Vec<Option<TextureId>>,
    kind: DrawKind,
    /// Vertices the draw reads, the zero buffer must be at least this long.
    vertices: u32,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    uniform_alignment: u32,
    programs: Vec<ProgramState>,
    buffers: Vec<GpuBuffer>,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u32,
    white: GpuTexture,
    current: Option<ProgramId>,
    attributes: HashMap<u32, BufferId>,
    units: HashMap<u32, TextureId>,
    draws: Vec<DrawCall>,
    uniform_stream: Vec<u8>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let white = GpuTexture::from_image(
            &device,
            &queue,
            &ImageData::solid(1, 1, [255, 255, 255, 255]),
            &TextureParams {
                mipmaps: false,
                ..Default::default()
            },
            Some("white fallback"),
        );
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment;
        Self {
            device,
            queue,
            color_format,
            uniform_alignment,
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: HashMap::new(),
            next_texture: 0,
            white,
            current: None,
            attributes: HashMap::new(),
            units: HashMap::new(),
            draws: Vec::new(),
            uniform_stream: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Draws recorded since the last [`submit`](Self::submit).
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Replay every recorded draw into `target` in a single render pass that
    /// first clears colour to `clear` and depth to 1.
    pub fn submit(&mut self, target: &wgpu::TextureView, depth: &wgpu::TextureView, clear: wgpu::Color) {
        let draws = std::mem::take(&mut self.draws);
        let stream = std::mem::take(&mut self.uniform_stream);

        let uniform_groups = if stream.is_empty() {
            HashMap::new()
        } else {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("uniform stream"),
                contents: &stream,
                usage: wgpu::BufferUsages::UNIFORM,
            });
            draws
                .iter()
                .map(|draw| draw.program)
                .collect::<HashSet<_>>()
                .into_iter()
                .filter_map(|id| Some((id, self.uniform_group(id, &buffer)?)))
                .collect::<HashMap<_, _>>()
        };
        let texture_groups: Vec<Option<wgpu::BindGroup>> =
            draws.iter().map(|draw| self.texture_group(draw)).collect();
        let zero_vertices = draws.iter().map(|draw| draw.vertices).max().unwrap_or(0).max(1);
        let zeros = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("zero attributes"),
            size: zero_vertices as u64 * ZERO_VERTEX_STRIDE,
            usage: wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (draw, textures) in draws.iter().zip(&texture_groups) {
                let Some(program) = self.programs.get(draw.program.0 as usize) else {
                    continue;
                };
                let (Some(uniforms), Some(textures)) = (uniform_groups.get(&draw.program), textures)
                else {
                    continue;
                };
                pass.set_pipeline(&program.pipeline.pipeline);
                pass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
                pass.set_bind_group(1, textures, &[]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    let slice = match buffer.and_then(|id| self.buffers.get(id.0 as usize)) {
                        Some(bound) => bound.buffer.slice(..),
                        None => zeros.slice(..),
                    };
                    pass.set_vertex_buffer(slot as u32, slice);
                }
                match draw.kind {
                    DrawKind::Indexed { indices, count } => {
                        let Some(indices) = self.buffers.get(indices.0 as usize) else {
                            continue;
                        };
                        pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..count, 0, 0..1);
                    }
                    DrawKind::Arrays { first, count } => pass.draw(first..first + count, 0..1),
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        log::trace!("submitted {} draws", draws.len());
    }

    fn uniform_group(&self, id: ProgramId, stream: &wgpu::Buffer) -> Option<wgpu::BindGroup> {
        let program = self.programs.get(id.0 as usize)?;
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform snapshot"),
            layout: &program.pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: stream,
                    offset: 0,
                    size: wgpu::BufferSize::new(program.pipeline.block.size() as u64),
                }),
            }],
        }))
    }

    fn texture_group(&self, draw: &DrawCall) -> Option<wgpu::BindGroup> {
        let program = self.programs.get(draw.program.0 as usize)?;
        let entries: Vec<_> = draw
            .textures
            .iter()
            .enumerate()
            .flat_map(|(i, texture)| {
                let texture = texture
                    .and_then(|id| self.textures.get(&id))
                    .unwrap_or(&self.white);
                [
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw textures"),
            layout: &program.pipeline.texture_layout,
            entries: &entries,
        }))
    }

    /// Snapshot the state of the program in use for a draw reading `vertices`.
    fn record(&mut self, kind: DrawKind, vertices: u32) {
        let Some(id) = self.current else {
            log::warn!("draw without a program in use ignored");
            return;
        };
        let Some(program) = self.programs.get(id.0 as usize) else {
            return;
        };

        let alignment = self.uniform_alignment.max(1) as usize;
        let uniform_offset = self.uniform_stream.len().div_ceil(alignment) * alignment;
        self.uniform_stream.resize(uniform_offset, 0);
        self.uniform_stream.extend_from_slice(&program.block);

        let vertex_buffers = (0..program.pipeline.attribute_components.len() as u32)
            .map(|location| self.attributes.remove(&location))
            .collect();
        self.attributes.clear();
        let textures = program
            .sampler_units
            .iter()
            .map(|unit| self.units.get(&(*unit as u32)).copied())
            .collect();

        self.draws.push(DrawCall {
            program: id,
            uniform_offset: uniform_offset as u32,
            vertex_buffers,
            textures,
            kind,
            vertices,
        });
    }
}

impl GraphicsDevice for WgpuDevice {
    fn link_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramId> {
        for entry_point in ["vs_main", "fs_main"] {
            if !source.code.contains(entry_point) {
                anyhow::bail!("program '{}' has no {entry_point} entry point", source.label);
            }
        }
        let pipeline = mk_program_pipeline(&self.device, source, self.color_format);
        let block = vec![0; pipeline.block.size() as usize];
        let sampler_units = (0..pipeline.block.sampler_count() as i32).collect();
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(ProgramState {
            pipeline,
            block,
            sampler_units,
        });
        Ok(id)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current = program;
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let Some(program) = self
            .current
            .and_then(|id| self.programs.get_mut(id.0 as usize))
        else {
            log::warn!("uniform write without a program in use ignored");
            return;
        };
        match program.pipeline.block.slot(location.0) {
            Some(Slot::Sampler(i)) => match value {
                UniformValue::Int(unit) => program.sampler_units[i] = *unit,
                other => log::warn!("sampler needs a texture unit, got {:?}", other.kind()),
            },
            Some(Slot::Block { .. }) => {
                program
                    .pipeline
                    .block
                    .write(&mut program.block, location.0, value);
            }
            None => log::warn!("unknown uniform location {}", location.0),
        }
    }

    fn create_buffer(&mut self, data: BufferData<'_>) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        let (contents, usage, max_index): (&[u8], _, _) = match data {
            BufferData::Vertex { data, .. } => {
                (bytemuck::cast_slice(data), wgpu::BufferUsages::VERTEX, None)
            }
            BufferData::Index(indices) => (
                bytemuck::cast_slice(indices),
                wgpu::BufferUsages::INDEX,
                indices.iter().copied().max(),
            ),
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("buffer {}", id.0)),
            contents,
            usage,
        });
        self.buffers.push(GpuBuffer { buffer, max_index });
        id
    }

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferId, components: u32) {
        let expected = self
            .current
            .and_then(|id| self.programs.get(id.0 as usize))
            .and_then(|p| p.pipeline.attribute_components.get(location.0 as usize).copied());
        if expected.is_some_and(|expected| expected != components) {
            log::warn!(
                "attribute {} expects {expected:?} components, bound buffer has {components}",
                location.0
            );
        }
        self.attributes.insert(location.0, buffer);
    }

    fn create_texture(&mut self, image: &ImageData, params: &TextureParams) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        let label = format!("texture {}", id.0);
        let texture = GpuTexture::from_image(&self.device, &self.queue, image, params, Some(&label));
        self.textures.insert(id, texture);
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("deleting unknown texture {}", texture.0);
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        match texture {
            Some(texture) => {
                self.units.insert(unit, texture);
            }
            None => {
                self.units.remove(&unit);
            }
        }
    }

    fn draw_indexed(&mut self, indices: BufferId, count: u32) {
        if count == 0 {
            return;
        }
        let Some(max_index) = self.buffers.get(indices.0 as usize).map(|b| b.max_index) else {
            log::warn!("draw with unknown index buffer {}", indices.0);
            return;
        };
        let vertices = max_index.map_or(0, |max| max + 1);
        self.record(DrawKind::Indexed { indices, count }, vertices);
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.record(DrawKind::Arrays { first, count }, first + count);
    }
}

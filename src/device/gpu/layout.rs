//! CPU-side layout of a program's uniform block.
//!
//! Uniforms are packed into one WGSL struct in declaration order, following the
//! alignment rules of the uniform address space. Samplers take no room in the
//! block; their value (a texture unit) is kept next to it.

use crate::device::{UniformKind, UniformValue, program::UniformDecl};

/// Offset of a uniform inside the block, or its index among the samplers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Block { offset: u32, kind: UniformKind },
    Sampler(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    slots: Vec<Slot>,
    size: u32,
    samplers: usize,
}

/// `(alignment, size)` of a kind in the uniform address space.
fn align_and_size(kind: UniformKind) -> Option<(u32, u32)> {
    match kind {
        UniformKind::Float | UniformKind::Int | UniformKind::Bool => Some((4, 4)),
        UniformKind::Vec2 => Some((8, 8)),
        UniformKind::Vec3 => Some((16, 12)),
        UniformKind::Vec4 => Some((16, 16)),
        UniformKind::Mat3 => Some((16, 48)),
        UniformKind::Mat4 => Some((16, 64)),
        UniformKind::Sampler => None,
    }
}

fn round_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

impl BlockLayout {
    pub fn new(uniforms: &[UniformDecl]) -> Self {
        let mut slots = Vec::with_capacity(uniforms.len());
        let mut cursor = 0;
        let mut samplers = 0;
        for uniform in uniforms {
            match align_and_size(uniform.kind) {
                Some((align, size)) => {
                    let offset = round_up(cursor, align);
                    slots.push(Slot::Block {
                        offset,
                        kind: uniform.kind,
                    });
                    cursor = offset + size;
                }
                None => {
                    slots.push(Slot::Sampler(samplers));
                    samplers += 1;
                }
            }
        }
        Self {
            slots,
            size: round_up(cursor, 16).max(16),
            samplers,
        }
    }

    /// Block size in bytes, a multiple of 16.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers
    }

    pub fn slot(&self, location: u32) -> Option<Slot> {
        self.slots.get(location as usize).copied()
    }

    /// Encode `value` into `block` at the slot of `location`. Returns `false`
    /// when the location is unknown, names a sampler, or the value does not
    /// fit the declared kind.
    pub fn write(&self, block: &mut [u8], location: u32, value: &UniformValue) -> bool {
        let Some(Slot::Block { offset, kind }) = self.slot(location) else {
            return false;
        };
        let offset = offset as usize;
        match (kind, value) {
            (UniformKind::Float, UniformValue::Float(v)) => put(block, offset, &[*v]),
            (UniformKind::Int | UniformKind::Bool, UniformValue::Int(v)) => {
                put(block, offset, &[*v])
            }
            (UniformKind::Int | UniformKind::Bool, UniformValue::Bool(v)) => {
                put(block, offset, &[*v as i32])
            }
            (UniformKind::Vec2, UniformValue::Vec2(v)) => put(block, offset, v),
            (UniformKind::Vec3, UniformValue::Vec3(v)) => put(block, offset, v),
            (UniformKind::Vec4, UniformValue::Vec4(v)) => put(block, offset, v),
            (UniformKind::Mat3, UniformValue::Mat3(m)) => {
                let cols: [[f32; 3]; 3] = (*m).into();
                for (i, col) in cols.iter().enumerate() {
                    put(block, offset + i * 16, col);
                }
            }
            (UniformKind::Mat4, UniformValue::Mat4(m)) => {
                let cols: [[f32; 4]; 4] = (*m).into();
                put(block, offset, cols.as_flattened());
            }
            (kind, value) => {
                log::warn!("cannot write {:?} to a {kind:?} uniform", value.kind());
                return false;
            }
        }
        true
    }
}

fn put<T: bytemuck::Pod>(block: &mut [u8], offset: usize, values: &[T]) {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    block[offset..offset + bytes.len()].copy_from_slice(bytes);
}

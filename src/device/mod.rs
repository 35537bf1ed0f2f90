//! Graphics device seam.
//!
//! The scene graph never talks to a concrete graphics API. Every side effect a
//! node produces (activating a program, writing a uniform, uploading a buffer,
//! binding a texture unit, issuing a draw) goes through [`GraphicsDevice`].
//!
//! - `program` declares shader programs and caches their reflection tables
//! - `recording` is a headless device that records commands (tests, dry runs)
//! - `gpu` is the wgpu backend used by the frame driver

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

pub mod gpu;
pub mod program;
pub mod recording;

pub use program::{ProgramRegistry, ProgramSource, RenderState, ShaderProgram};
pub use recording::{Command, RecordingDevice};

/// Handle of a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle of a device buffer (vertex or index data).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle of a device texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Attribute slot of a vertex input, resolved once when a program is linked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Location of a uniform inside the program it was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// The declared type of a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    /// A texture sampler. Its value is the texture unit it reads from.
    Sampler,
}

/// A value written to a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    /// Build a float uniform from a slice by arity: one component is a scalar,
    /// two to four components are the matching vector. Anything else is `None`.
    pub fn vector(values: &[f32]) -> Option<Self> {
        match *values {
            [x] => Some(Self::Float(x)),
            [x, y] => Some(Self::Vec2([x, y])),
            [x, y, z] => Some(Self::Vec3([x, y, z])),
            [x, y, z, w] => Some(Self::Vec4([x, y, z, w])),
            _ => None,
        }
    }

    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Int(_) => UniformKind::Int,
            Self::Bool(_) => UniformKind::Bool,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat3(_) => UniformKind::Mat3,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Booleans travel to shaders as integers.
    pub fn for_shader(self) -> Self {
        match self {
            Self::Bool(b) => Self::Int(b as i32),
            other => other,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(value: Vector2<f32>) -> Self {
        Self::Vec2(value.into())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        Self::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        Self::Vec4(value.into())
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(value: Matrix3<f32>) -> Self {
        Self::Mat3(value)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        Self::Mat4(value)
    }
}

/// Data handed to [`GraphicsDevice::create_buffer`].
#[derive(Clone, Copy, Debug)]
pub enum BufferData<'a> {
    /// Tightly packed float attributes with `components` floats per vertex.
    Vertex { data: &'a [f32], components: u32 },
    Index(&'a [u32]),
}

impl BufferData<'_> {
    /// Number of elements: vertices for attribute data, indices for index data.
    pub fn len(&self) -> usize {
        match self {
            BufferData::Vertex { data, components } => data.len() / (*components).max(1) as usize,
            BufferData::Index(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded RGBA8 pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 {
            anyhow::bail!("image dimensions must be non-zero, got {width}x{height}");
        }
        if pixels.len() != expected {
            anyhow::bail!(
                "image of {width}x{height} needs {expected} RGBA bytes, got {}",
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single-colour image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = rgba
            .iter()
            .cycle()
            .take(width as usize * height as usize * 4)
            .copied()
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

/// Sampling and upload options of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmaps: bool,
    /// Maximum anisotropy, 1 disables anisotropic filtering.
    pub anisotropy: u16,
    /// `false` for data textures such as normal maps.
    pub srgb: bool,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::Repeat,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmaps: true,
            anisotropy: 1,
            srgb: true,
        }
    }
}

/// The operations the scene graph needs from a graphics backend.
///
/// Semantics follow a classic immediate-mode API: one program is in use at a
/// time, uniforms are written to the program in use and keep their values
/// until overwritten, attribute bindings feed the next draw, and texture units
/// stay bound until explicitly unbound.
pub trait GraphicsDevice {
    /// Compile and link a program. Locations are assigned in declaration
    /// order, see [`ShaderProgram`].
    fn link_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramId>;

    fn use_program(&mut self, program: Option<ProgramId>);

    /// Write a uniform of the program in use.
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    fn create_buffer(&mut self, data: BufferData<'_>) -> BufferId;

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferId, components: u32);

    fn create_texture(&mut self, image: &ImageData, params: &TextureParams) -> TextureId;

    fn delete_texture(&mut self, texture: TextureId);

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);

    /// Draw `count` indices of `indices` as a triangle list.
    fn draw_indexed(&mut self, indices: BufferId, count: u32);

    /// Draw `count` vertices starting at `first` as a triangle list.
    fn draw_arrays(&mut self, first: u32, count: u32);
}

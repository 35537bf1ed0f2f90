//! GPU textures, samplers and the depth buffer.

use image::{RgbaImage, imageops::FilterType};

use crate::device::{Filter, ImageData, TextureParams, Wrap};

/// A GPU texture with its view and sampler.
#[derive(Debug)]
pub struct GpuTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// The frame's depth attachment. It is never sampled, so it carries no sampler.
#[derive(Debug)]
pub struct DepthTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    pub const FORMAT: wgpu::TextureFormat = super::pipeline::DEPTH_FORMAT;
    pub const USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT;

    /// Create a depth texture of `size` (clamped to at least 1x1).
    pub fn new(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: depth_extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: Self::USAGE,
            view_formats: &[Self::FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn depth_extent(size: [u32; 2]) -> wgpu::Extent3d {
    extent(size[0].max(1), size[1].max(1))
}

impl GpuTexture {
    /// Upload `image` with its full mip chain when `params.mipmaps` is set.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        params: &TextureParams,
        label: Option<&str>,
    ) -> Self {
        let levels = if params.mipmaps {
            mip_chain(image)
        } else {
            vec![(image.width(), image.height(), image.pixels().to_vec())]
        };
        let format = if params.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: extent(image.width(), image.height()),
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, (width, height, pixels)) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(*height),
                },
                extent(*width, *height),
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler_descriptor(params, label));
        Self {
            texture,
            view,
            sampler,
        }
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// Number of levels down to 1x1 for an image of the given size.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Level 0 followed by successively halved copies, down to 1x1.
fn mip_chain(image: &ImageData) -> Vec<(u32, u32, Vec<u8>)> {
    let (width, height) = (image.width(), image.height());
    let mut levels = vec![(width, height, image.pixels().to_vec())];
    let Some(base) = RgbaImage::from_raw(width, height, image.pixels().to_vec()) else {
        log::warn!("could not read {width}x{height} image for mipmapping");
        return levels;
    };
    for level in 1..mip_level_count(width, height) {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        let scaled = image::imageops::resize(&base, w, h, FilterType::Triangle);
        levels.push((w, h, scaled.into_raw()));
    }
    levels
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Linear => wgpu::FilterMode::Linear,
        Filter::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// Anisotropic filtering needs every filter to be linear, otherwise the clamp
/// falls back to 1.
pub fn sampler_descriptor<'a>(
    params: &TextureParams,
    label: Option<&'a str>,
) -> wgpu::SamplerDescriptor<'a> {
    let mipmap_filter = match (params.mipmaps, params.min_filter) {
        (true, Filter::Linear) => wgpu::MipmapFilterMode::Linear,
        _ => wgpu::MipmapFilterMode::Nearest,
    };
    let all_linear = params.mipmaps
        && params.min_filter == Filter::Linear
        && params.mag_filter == Filter::Linear;
    let anisotropy_clamp = if all_linear {
        params.anisotropy.clamp(1, 16)
    } else {
        1
    };
    wgpu::SamplerDescriptor {
        label,
        address_mode_u: address_mode(params.wrap_s),
        address_mode_v: address_mode(params.wrap_t),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter_mode(params.mag_filter),
        min_filter: filter_mode(params.min_filter),
        mipmap_filter,
        lod_max_clamp: if params.mipmaps { 32.0 } else { 0.0 },
        anisotropy_clamp,
        ..Default::default()
    }
}

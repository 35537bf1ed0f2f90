//! Render pipelines built from a [`ProgramSource`].
//!
//! Every program gets the same shape of pipeline:
//! - group 0, binding 0: the program's uniform struct, bound with a dynamic
//!   offset so each draw reads its own snapshot
//! - group 1: one `texture_2d<f32>` / `sampler` pair per declared sampler, at
//!   bindings `2i` and `2i + 1`
//! - vertex slot `i` feeds `@location(i)` with the `i`-th declared attribute

use crate::device::{
    gpu::layout::BlockLayout,
    program::{ProgramSource, RenderState},
};

/// Depth format of the frame's depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct ProgramPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub block: BlockLayout,
    /// Floats per vertex of each attribute slot.
    pub attribute_components: Vec<u32>,
}

pub fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

pub fn blend_state(state: &RenderState) -> Option<wgpu::BlendState> {
    state.blending.then_some(wgpu::BlendState::ALPHA_BLENDING)
}

/// With the depth test off every fragment passes and the buffer is left as is.
pub fn depth_stencil_state(state: &RenderState) -> wgpu::DepthStencilState {
    let (write, compare) = if state.depth_test {
        (true, wgpu::CompareFunction::Less)
    } else {
        (false, wgpu::CompareFunction::Always)
    };
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: Some(write),
        depth_compare: Some(compare),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn mk_program_pipeline(
    device: &wgpu::Device,
    source: &ProgramSource,
    color_format: wgpu::TextureFormat,
) -> ProgramPipeline {
    let block = BlockLayout::new(&source.uniforms);

    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} uniforms", source.label)),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(block.size() as u64),
            },
            count: None,
        }],
    });

    let texture_entries: Vec<_> = (0..block.sampler_count() as u32)
        .flat_map(|i| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();
    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} textures", source.label)),
        entries: &texture_entries,
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} pipeline layout", source.label)),
        bind_group_layouts: &[Some(&uniform_layout), Some(&texture_layout)],
        immediate_size: 0,
    });

    let attributes: Vec<[wgpu::VertexAttribute; 1]> = source
        .attributes
        .iter()
        .enumerate()
        .map(|(i, attribute)| {
            [wgpu::VertexAttribute {
                offset: 0,
                shader_location: i as u32,
                format: vertex_format(attribute.components),
            }]
        })
        .collect();
    let vertex_layouts: Vec<_> = source
        .attributes
        .iter()
        .zip(&attributes)
        .map(|(attribute, attrs)| wgpu::VertexBufferLayout {
            array_stride: (attribute.components as usize * size_of::<f32>()) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attrs,
        })
        .collect();

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some(&source.label),
        source: wgpu::ShaderSource::Wgsl(source.code.as_str().into()),
    };

    let pipeline = mk_render_pipeline(
        device,
        &layout,
        color_format,
        blend_state(&source.state),
        Some(depth_stencil_state(&source.state)),
        &vertex_layouts,
        shader,
    );

    ProgramPipeline {
        pipeline,
        uniform_layout,
        texture_layout,
        block,
        attribute_components: source.attributes.iter().map(|a| a.components).collect(),
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let label = shader.label.map(str::to_string);
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: label.as_deref(),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // scene geometry is not guaranteed to have consistent winding
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_tests_depth_and_blends() {
        let state = RenderState::default();
        let depth = depth_stencil_state(&state);
        assert_eq!(depth.depth_compare, Some(wgpu::CompareFunction::Less));
        assert_eq!(depth.depth_write_enabled, Some(true));
        assert_eq!(blend_state(&state), Some(wgpu::BlendState::ALPHA_BLENDING));
    }

    #[test]
    fn disabled_state_passes_every_fragment_unblended() {
        let source = ProgramSource::new("overlay", "")
            .without_depth_test()
            .without_blending();
        let depth = depth_stencil_state(&source.state);
        assert_eq!(depth.depth_compare, Some(wgpu::CompareFunction::Always));
        assert_eq!(depth.depth_write_enabled, Some(false));
        assert_eq!(blend_state(&source.state), None);
    }
}

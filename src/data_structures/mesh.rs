//! Mesh data and the node that draws it.
//!
//! A [`MeshNode`] owns its geometry as plain vectors. The first time it is
//! rendered with a shader active, every present attribute array is uploaded to
//! the device (plus computed tangents when both normals and texture
//! coordinates exist). Later renders only rebind the buffers and draw.

use std::any::Any;

use cgmath::SquareMatrix;

use crate::{
    context::RenderContext,
    data_structures::{
        scene_graph::{NodeId, NodeKind, SceneNode},
        tangents::calculate_tangents,
    },
    device::{BufferData, BufferId},
    math, names,
};

/// Raw geometry. All optional arrays, when present, hold one entry per
/// position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: Vec<[f32; 2]>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn with_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of elements a draw covers: indices when indexed, else vertices.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.positions.len(),
        }
    }

    /// Check that attribute arrays match the position count and that indices
    /// stay in range.
    pub fn validate(&self) -> anyhow::Result<()> {
        let n = self.positions.len();
        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("texcoords", self.texcoords.as_ref().map(Vec::len)),
            ("colors", self.colors.as_ref().map(Vec::len)),
        ];
        for (name, len) in lengths {
            if let Some(len) = len.filter(|&len| len != n) {
                anyhow::bail!("mesh has {n} positions but {len} {name}");
            }
        }
        if let Some(indices) = &self.indices {
            if indices.len() % 3 != 0 {
                anyhow::bail!("{} indices do not form whole triangles", indices.len());
            }
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= n) {
                anyhow::bail!("index {bad} out of range for {n} vertices");
            }
        } else if n % 3 != 0 {
            anyhow::bail!("{n} vertices do not form whole triangles");
        }
        Ok(())
    }
}

/// Device buffers of an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuMesh {
    pub position: BufferId,
    pub texcoord: Option<BufferId>,
    pub normal: Option<BufferId>,
    pub tangent: Option<BufferId>,
    pub color: Option<BufferId>,
    /// Index buffer and index count.
    pub index: Option<(BufferId, u32)>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshState {
    #[default]
    Uninitialized,
    Initialized(GpuMesh),
}

pub struct MeshNode {
    id: NodeId,
    data: MeshData,
    state: MeshState,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl MeshNode {
    pub fn new(data: MeshData) -> Self {
        if let Err(e) = data.validate() {
            log::warn!("inconsistent mesh data: {e}");
        }
        Self {
            id: NodeId::next(),
            data,
            state: MeshState::Uninitialized,
            children: Vec::new(),
        }
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn state(&self) -> MeshState {
        self.state
    }

    fn upload(&self, ctx: &mut RenderContext<'_>) -> GpuMesh {
        let data = &self.data;
        if data.positions.is_empty() {
            log::warn!("mesh {:?} has no vertices", self.id);
        }
        let position = vertex(ctx, data.positions.as_flattened(), 3);
        let texcoord = data
            .texcoords
            .as_ref()
            .map(|t| vertex(ctx, t.as_flattened(), 2));
        let normal = data
            .normals
            .as_ref()
            .map(|n| vertex(ctx, n.as_flattened(), 3));
        let tangent = match (&data.normals, &data.texcoords) {
            (Some(_), Some(texcoords)) => {
                let sequential: Vec<u32>;
                let indices = match &data.indices {
                    Some(indices) => indices.as_slice(),
                    None => {
                        sequential = (0..data.positions.len() as u32).collect();
                        &sequential
                    }
                };
                let mut tangents = calculate_tangents(indices, &data.positions, texcoords);
                // every bound vertex needs a tangent
                if tangents.len() < data.positions.len() {
                    tangents.resize(data.positions.len(), [0.0; 3]);
                }
                Some(vertex(ctx, tangents.as_flattened(), 3))
            }
            _ => None,
        };
        let color = data
            .colors
            .as_ref()
            .map(|c| vertex(ctx, c.as_flattened(), 3));
        let index = data.indices.as_ref().map(|indices| {
            let buffer = ctx.device.create_buffer(BufferData::Index(indices));
            (buffer, indices.len() as u32)
        });

        log::debug!(
            "uploaded mesh {:?}: {} vertices, {} elements",
            self.id,
            data.positions.len(),
            data.element_count()
        );
        GpuMesh {
            position,
            texcoord,
            normal,
            tangent,
            color,
            index,
        }
    }

    /// Model, view and projection matrices plus everything derived from them.
    fn set_transform_uniforms(&self, ctx: &mut RenderContext<'_>) {
        let model = ctx.model_matrix();
        let view = ctx.view;
        let projection = ctx.projection;
        let model_view = view * model;

        ctx.set_uniform(names::U_MODEL, model);
        ctx.set_uniform(names::U_VIEW, view);
        ctx.set_uniform(names::U_MODEL_VIEW, model_view);
        ctx.set_uniform(names::U_PROJECTION, projection);

        match view.invert() {
            Some(inv_view) => {
                ctx.set_uniform(names::U_INV_VIEW, inv_view);
            }
            None => log::warn!("view matrix is singular, {} skipped", names::U_INV_VIEW),
        }
        match (projection * view).invert() {
            Some(inv_view_proj) => {
                ctx.set_uniform(names::U_INV_VIEW_PROJ_MATRIX, inv_view_proj);
            }
            None => log::warn!(
                "projection * view is singular, {} skipped",
                names::U_INV_VIEW_PROJ_MATRIX
            ),
        }

        let normal_uniforms = [
            (names::U_NORMAL_MATRIX, math::normal_matrix(&model_view)),
            (names::U_MODEL_NORMAL_MATRIX, math::normal_matrix(&model)),
            (
                names::U_MODEL_VIEW_NORMAL_MATRIX,
                math::normal_matrix(&model_view),
            ),
            (
                names::U_INV_VIEW_NORMAL_MATRIX,
                math::normal_matrix(&view).and_then(|m| m.invert()),
            ),
        ];
        for (name, matrix) in normal_uniforms {
            match matrix {
                Some(matrix) => {
                    ctx.set_uniform(name, matrix);
                }
                None if ctx.has_uniform(name) => log::warn!("singular matrix, {name} skipped"),
                None => {}
            }
        }
    }

    fn bind_attributes(&self, ctx: &mut RenderContext<'_>, gpu: &GpuMesh) {
        let attributes = [
            (names::A_POSITION, Some(gpu.position), 3),
            (names::A_TEXCOORD, gpu.texcoord, 2),
            (names::A_NORMAL, gpu.normal, 3),
            (names::A_TANGENT, gpu.tangent, 3),
            (names::A_COLOR, gpu.color, 3),
        ];
        for (name, buffer, components) in attributes {
            let (Some(location), Some(buffer)) = (ctx.attribute_location(name), buffer) else {
                log::trace!("attribute '{name}' not bound for mesh {:?}", self.id);
                continue;
            };
            ctx.device.bind_attribute(location, buffer, components);
        }
    }

    fn draw(&self, ctx: &mut RenderContext<'_>, gpu: &GpuMesh) {
        match gpu.index {
            Some((_, 0)) => log::trace!("mesh {:?} has no indices, draw skipped", self.id),
            Some((buffer, count)) => ctx.device.draw_indexed(buffer, count),
            None if self.data.positions.is_empty() => {
                log::trace!("mesh {:?} has no vertices, draw skipped", self.id)
            }
            None => ctx
                .device
                .draw_arrays(0, self.data.positions.len() as u32),
        }
    }
}

fn vertex(ctx: &mut RenderContext<'_>, data: &[f32], components: u32) -> BufferId {
    ctx.device
        .create_buffer(BufferData::Vertex { data, components })
}

impl SceneNode for MeshNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Mesh
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if ctx.shader.is_some() {
            let gpu = match self.state {
                MeshState::Initialized(gpu) => gpu,
                MeshState::Uninitialized => {
                    let gpu = self.upload(ctx);
                    self.state = MeshState::Initialized(gpu);
                    gpu
                }
            };
            self.set_transform_uniforms(ctx);
            self.bind_attributes(ctx, &gpu);
            self.draw(ctx, &gpu);
        }
        self.render_children(ctx);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

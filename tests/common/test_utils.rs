use std::{any::Any, cell::RefCell, rc::Rc};

use cgmath::{Matrix4, SquareMatrix};
use flow_scene::{
    context::RenderContext,
    data_structures::{
        mesh::MeshData,
        scene_graph::{NodeId, NodeKind, SceneNode},
    },
    device::{Command, ProgramId, ProgramSource, RecordingDevice, ShaderProgram},
    names,
    render::render,
};

/// Entry points are all a program needs to link on the recording device.
pub const SHADER_CODE: &str = "@vertex fn vs_main() {} @fragment fn fs_main() {}";

/// A program consuming every attribute and uniform the scene graph produces.
pub fn full_source(label: &str) -> ProgramSource {
    ProgramSource::new(label, SHADER_CODE)
        .attribute(names::A_POSITION, 3)
        .attribute(names::A_TEXCOORD, 2)
        .attribute(names::A_NORMAL, 3)
        .attribute(names::A_TANGENT, 3)
        .with_transforms()
        .with_material(names::DEFAULT_MATERIAL)
        .with_light(names::DEFAULT_LIGHT)
        .with_texture(names::DEFAULT_TEXTURE)
}

pub fn link(device: &mut RecordingDevice, source: &ProgramSource) -> Rc<ShaderProgram> {
    ShaderProgram::link(device, source).unwrap()
}

pub fn render_frame(device: &mut RecordingDevice, root: &mut dyn SceneNode) {
    render_with_view(device, root, Matrix4::identity());
}

pub fn render_with_view(device: &mut RecordingDevice, root: &mut dyn SceneNode, view: Matrix4<f32>) {
    let mut ctx = RenderContext::new(device, Matrix4::identity(), view);
    render(root, &mut ctx);
}

/// A textured triangle in the z = 0 plane, facing +Z.
pub fn triangle() -> MeshData {
    MeshData::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .with_normals(vec![[0.0, 0.0, 1.0]; 3])
        .with_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
}

pub fn used_programs(device: &RecordingDevice) -> Vec<Option<ProgramId>> {
    device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::UseProgram(program) => Some(*program),
            _ => None,
        })
        .collect()
}

pub fn count(device: &RecordingDevice, pred: impl Fn(&Command) -> bool) -> usize {
    device.commands().iter().filter(|c| pred(c)).count()
}

/// What a [`Probe`] saw of the context when it was rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Visit {
    pub label: &'static str,
    pub scene_matrix: Option<Matrix4<f32>>,
    pub shader: Option<ProgramId>,
}

pub type Visits = Rc<RefCell<Vec<Visit>>>;

/// A node that logs each visit and renders its children.
pub struct Probe {
    id: NodeId,
    label: &'static str,
    visits: Visits,
    pub children: Vec<Box<dyn SceneNode>>,
}

pub fn probe(label: &'static str, visits: &Visits, children: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    Box::new(Probe {
        id: NodeId::next(),
        label,
        visits: visits.clone(),
        children,
    })
}

pub fn labels(visits: &Visits) -> Vec<&'static str> {
    visits.borrow().iter().map(|v| v.label).collect()
}

pub fn visit(visits: &Visits, label: &str) -> Visit {
    visits
        .borrow()
        .iter()
        .find(|v| v.label == label)
        .cloned()
        .unwrap_or_else(|| panic!("'{label}' was never rendered"))
}

impl SceneNode for Probe {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Group
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        self.visits.borrow_mut().push(Visit {
            label: self.label,
            scene_matrix: ctx.scene_matrix,
            shader: ctx.shader.as_ref().map(|s| s.id()),
        });
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

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};
use flow_scene::{
    data_structures::{
        builder,
        mesh::{MeshData, MeshNode, MeshState},
        scene_graph::{GroupNode, SceneNode, ShaderNode, TransformNode},
    },
    device::{Command, ProgramSource, RecordingDevice, UniformValue},
    math, names,
};

use crate::common::test_utils::{
    SHADER_CODE, count, full_source, link, render_frame, render_with_view, triangle,
};

mod common;

fn bound_attributes(device: &RecordingDevice) -> Vec<String> {
    device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::BindAttribute { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn mesh_is_uploaded_once_and_drawn_every_frame() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mesh = triangle().with_indices(vec![0, 1, 2]);
    let mut root = ShaderNode::new(program.clone(), vec![Box::new(MeshNode::new(mesh))]);

    render_frame(&mut device, &mut root);
    render_frame(&mut device, &mut root);

    // position, texcoord, normal, tangent and index buffers
    assert_eq!(device.buffers_created(), 5);
    let draws = device.draws();
    assert_eq!(draws.len(), 2);
    assert!(matches!(
        draws[0],
        Command::DrawIndexed { program: Some(p), count: 3, .. } if *p == program.id()
    ));
}

#[test]
fn non_indexed_mesh_draws_every_vertex_from_zero() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program.clone(), vec![Box::new(MeshNode::new(triangle()))]);

    render_frame(&mut device, &mut root);

    assert_eq!(
        device.draws(),
        [&Command::DrawArrays {
            program: Some(program.id()),
            first: 0,
            count: 3,
        }]
    );
}

#[test]
fn mesh_without_shader_is_neither_uploaded_nor_drawn() {
    let mut device = RecordingDevice::new();
    let mesh = MeshNode::new(triangle());
    let id = mesh.id();
    let mut root = GroupNode::new(vec![Box::new(mesh)]);

    render_frame(&mut device, &mut root);

    assert_eq!(device.buffers_created(), 0);
    assert!(device.draws().is_empty());
    let mesh = root.find_mut(id).unwrap().downcast_ref::<MeshNode>().unwrap();
    assert_eq!(mesh.state(), MeshState::Uninitialized);
}

#[test]
fn empty_mesh_issues_no_draw() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(
        program,
        vec![
            Box::new(MeshNode::new(MeshData::new(vec![]))),
            Box::new(MeshNode::new(MeshData::new(vec![]).with_indices(vec![]))),
        ],
    );

    render_frame(&mut device, &mut root);

    assert!(device.draws().is_empty());
}

#[test]
fn transform_uniforms_follow_the_scene_matrix() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let model = math::translate(1.0, 2.0, 3.0);
    let view = math::translate(0.0, 0.0, -5.0);
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(TransformNode::new(
            model,
            vec![Box::new(MeshNode::new(triangle()))],
        ))],
    );

    render_with_view(&mut device, &mut root, view);

    assert_eq!(device.last_uniform(names::U_MODEL), Some(UniformValue::Mat4(model)));
    assert_eq!(device.last_uniform(names::U_VIEW), Some(UniformValue::Mat4(view)));
    assert_eq!(
        device.last_uniform(names::U_MODEL_VIEW),
        Some(UniformValue::Mat4(view * model))
    );
    assert_eq!(
        device.last_uniform(names::U_PROJECTION),
        Some(UniformValue::Mat4(Matrix4::identity()))
    );
    assert_eq!(
        device.last_uniform(names::U_INV_VIEW),
        Some(UniformValue::Mat4(math::translate(0.0, 0.0, 5.0)))
    );
    // translations leave the normal matrix untouched
    assert_eq!(
        device.last_uniform(names::U_NORMAL_MATRIX),
        Some(UniformValue::Mat3(cgmath::Matrix3::identity()))
    );
}

#[test]
fn mesh_outside_transforms_uses_identity_model() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(triangle()))]);

    render_frame(&mut device, &mut root);

    assert_eq!(
        device.last_uniform(names::U_MODEL),
        Some(UniformValue::Mat4(Matrix4::identity()))
    );
}

#[test]
fn only_attributes_the_shader_declares_are_bound() {
    let mut device = RecordingDevice::new();
    let source = ProgramSource::new("flat", SHADER_CODE)
        .attribute(names::A_POSITION, 3)
        .with_transforms();
    let program = link(&mut device, &source);
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(triangle()))]);

    render_frame(&mut device, &mut root);

    assert_eq!(bound_attributes(&device), [names::A_POSITION]);
}

#[test]
fn tangents_are_uploaded_per_corner() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(triangle()))]);

    render_frame(&mut device, &mut root);

    let tangent_buffer = device
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::BindAttribute { name, buffer, .. } if name == names::A_TANGENT => Some(*buffer),
            _ => None,
        })
        .expect("tangents bound");
    let tangents = device.buffer_data(tangent_buffer).unwrap();
    assert_eq!(tangents.len(), 9);
    for t in tangents.chunks_exact(3) {
        let t = Vector3::new(t[0], t[1], t[2]);
        assert!((t.magnitude() - 1.0).abs() < 1e-5);
        assert!(t.dot(Vector3::unit_z()).abs() < 1e-5);
        assert!((t.x - 1.0).abs() < 1e-5);
    }
}

#[test]
fn unindexed_partial_triangle_still_gets_a_tangent_per_vertex() {
    let mut mesh = triangle();
    mesh.positions.push([1.0, 1.0, 0.0]);
    mesh.normals.as_mut().unwrap().push([0.0, 0.0, 1.0]);
    mesh.texcoords.as_mut().unwrap().push([1.0, 1.0]);
    assert!(mesh.validate().is_err());

    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(mesh))]);
    render_frame(&mut device, &mut root);

    let tangent_buffer = device
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::BindAttribute { name, buffer, .. } if name == names::A_TANGENT => Some(*buffer),
            _ => None,
        })
        .expect("tangents bound");
    let tangents = device.buffer_data(tangent_buffer).unwrap();
    assert_eq!(tangents.len(), 4 * 3);
    assert_eq!(&tangents[9..], &[0.0, 0.0, 0.0]);
}

#[test]
fn floor_uploads_repeating_texcoords() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program, vec![builder::draw_floor(1.0, 4.0)]);
    render_frame(&mut device, &mut root);

    let texcoord_buffer = device
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::BindAttribute { name, buffer, .. } if name == names::A_TEXCOORD => Some(*buffer),
            _ => None,
        })
        .expect("texcoords bound");
    let texcoords = device.buffer_data(texcoord_buffer).unwrap();
    assert_eq!(&texcoords[4..6], &[4.0, 4.0]);
    assert!(matches!(device.draws().as_slice(), [Command::DrawIndexed { count: 6, .. }]));
}

#[test]
fn mesh_without_texcoords_gets_no_tangents() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mesh = MeshData::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .with_normals(vec![[0.0, 0.0, 1.0]; 3]);
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(mesh))]);

    render_frame(&mut device, &mut root);

    assert_eq!(bound_attributes(&device), [names::A_POSITION, names::A_NORMAL]);
    assert_eq!(device.buffers_created(), 2);
}

#[test]
fn sphere_vertices_lie_on_the_radius() {
    let sphere = MeshData::sphere(2.0, 4, 6);
    assert_eq!(sphere.vertex_count(), 5 * 7);
    assert_eq!(sphere.element_count(), 6 * 4 * 6);
    assert!(sphere.validate().is_ok());
    for p in &sphere.positions {
        assert!((Vector3::from(*p).magnitude() - 2.0).abs() < 1e-5);
    }
}

#[test]
fn sphere_node_uploads_its_indices() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(program, vec![Box::new(MeshNode::new(MeshData::sphere(1.0, 3, 3)))]);

    render_frame(&mut device, &mut root);

    let index_buffers = count(&device, |c| matches!(c, Command::CreateBuffer { index: true, .. }));
    assert_eq!(index_buffers, 1);
    assert!(matches!(device.draws()[0], Command::DrawIndexed { count: 54, .. }));
}

#[test]
fn translated_quad_gets_exactly_the_translation_as_model() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = GroupNode::new(vec![Box::new(ShaderNode::new(
        program,
        vec![Box::new(TransformNode::new(
            math::translate(1.0, 0.0, 0.0),
            vec![Box::new(MeshNode::new(MeshData::rect(1.0, 1.0)))],
        ))],
    ))]);

    render_frame(&mut device, &mut root);

    assert_eq!(
        device.uniform_writes(names::U_MODEL),
        [UniformValue::Mat4(math::translate(1.0, 0.0, 0.0))]
    );
    assert!(matches!(device.draws()[0], Command::DrawIndexed { count: 6, .. }));
}

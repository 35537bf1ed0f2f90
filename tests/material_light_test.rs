use cgmath::{Vector3, Vector4};
use flow_scene::{
    data_structures::{
        light::{LightHandle, LightNode, LightParams},
        material::{MaterialNode, MaterialParams},
        mesh::MeshNode,
        scene_graph::{ShaderNode, TransformNode},
    },
    device::{Command, ProgramSource, RecordingDevice, UniformKind, UniformValue},
    math, names,
};

use crate::common::test_utils::{
    SHADER_CODE, full_source, link, render_frame, render_with_view, triangle,
};

mod common;

const LIGHT_POS: &str = "u_lightPos";

#[test]
fn light_position_is_written_in_view_space() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let light = LightNode::new(Vector3::new(1.0, 2.0, 3.0), vec![]);
    let handle = light.handle();
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(TransformNode::new(
            math::translate(1.0, 0.0, 0.0),
            vec![Box::new(light)],
        ))],
    );

    render_with_view(&mut device, &mut root, math::translate(0.0, 0.0, -5.0));

    assert_eq!(device.last_uniform(LIGHT_POS), Some(UniformValue::Vec3([2.0, 2.0, -2.0])));
    assert_eq!(handle.view_position(), Some(Vector3::new(2.0, 2.0, -2.0)));
    assert_eq!(
        device.last_uniform(&names::field(names::DEFAULT_LIGHT, "diffuse")),
        Some(UniformValue::Vec4([1.0, 1.0, 1.0, 1.0]))
    );
}

#[test]
fn light_children_are_placed_at_the_light() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let marker = MeshNode::new(triangle());
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(LightNode::new(Vector3::new(0.0, 4.0, 0.0), vec![Box::new(marker)]))],
    );

    render_frame(&mut device, &mut root);

    assert_eq!(
        device.last_uniform(names::U_MODEL),
        Some(UniformValue::Mat4(math::translate(0.0, 4.0, 0.0)))
    );
}

#[test]
fn material_reapplies_the_cached_light_position() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let light = LightNode::new(Vector3::new(1.0, 2.0, 3.0), vec![]);
    let material = MaterialNode::new(vec![Box::new(MeshNode::new(triangle()))]).with_light(light.handle());
    let mut root = ShaderNode::new(
        program,
        vec![
            Box::new(TransformNode::new(
                math::translate(1.0, 0.0, 0.0),
                vec![Box::new(light)],
            )),
            // the material sits outside the light's transform
            Box::new(material),
        ],
    );

    render_with_view(&mut device, &mut root, math::translate(0.0, 0.0, -5.0));

    assert_eq!(
        device.uniform_writes(LIGHT_POS),
        [UniformValue::Vec3([2.0, 2.0, -2.0]); 2]
    );
}

#[test]
fn light_never_rendered_uses_its_local_position() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let light = LightHandle::new(LightParams {
        position: Vector3::new(0.0, 5.0, 0.0),
        ..Default::default()
    });
    let mut root = ShaderNode::new(program, vec![Box::new(MaterialNode::new(vec![]).with_light(light))]);

    render_with_view(&mut device, &mut root, math::translate(0.0, 0.0, -5.0));

    assert_eq!(device.last_uniform(LIGHT_POS), Some(UniformValue::Vec3([0.0, 5.0, 0.0])));
}

#[test]
fn material_writes_every_struct_field() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let params = MaterialParams {
        diffuse: Vector4::new(1.0, 0.8, 0.0, 1.0),
        shininess: 32.0,
        ..Default::default()
    };
    let mut root = ShaderNode::new(program, vec![Box::new(MaterialNode::with_params(params, vec![]))]);

    render_frame(&mut device, &mut root);

    let field = |f| names::field(names::DEFAULT_MATERIAL, f);
    assert_eq!(
        device.last_uniform(&field("ambient")),
        Some(UniformValue::Vec4([0.2, 0.2, 0.2, 1.0]))
    );
    assert_eq!(
        device.last_uniform(&field("diffuse")),
        Some(UniformValue::Vec4([1.0, 0.8, 0.0, 1.0]))
    );
    assert_eq!(
        device.last_uniform(&field("emission")),
        Some(UniformValue::Vec4([0.0, 0.0, 0.0, 1.0]))
    );
    assert_eq!(device.last_uniform(&field("shininess")), Some(UniformValue::Float(32.0)));
}

#[test]
fn lights_apply_without_a_material_struct() {
    let mut device = RecordingDevice::new();
    let source = ProgramSource::new("lit", SHADER_CODE).with_light(names::DEFAULT_LIGHT);
    let program = link(&mut device, &source);
    let light = LightHandle::new(LightParams {
        ambient: Vector4::new(0.1, 0.1, 0.1, 1.0),
        ..Default::default()
    });
    let mut root = ShaderNode::new(program, vec![Box::new(MaterialNode::new(vec![]).with_light(light))]);

    render_frame(&mut device, &mut root);

    assert!(device
        .uniform_writes(&names::field(names::DEFAULT_MATERIAL, "ambient"))
        .is_empty());
    assert_eq!(
        device.last_uniform(&names::field(names::DEFAULT_LIGHT, "ambient")),
        Some(UniformValue::Vec4([0.1, 0.1, 0.1, 1.0]))
    );
}

#[test]
fn position_only_program_still_receives_the_light_position() {
    let mut device = RecordingDevice::new();
    let source = ProgramSource::new("pos", SHADER_CODE)
        .uniform(LIGHT_POS, UniformKind::Vec3);
    let program = link(&mut device, &source);
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(LightNode::new(Vector3::new(3.0, 0.0, 0.0), vec![]))],
    );

    render_frame(&mut device, &mut root);

    assert_eq!(device.last_uniform(LIGHT_POS), Some(UniformValue::Vec3([3.0, 0.0, 0.0])));
    assert!(device
        .uniform_writes(&names::field(names::DEFAULT_LIGHT, "ambient"))
        .is_empty());
}

#[test]
fn second_light_targets_its_own_struct() {
    let mut device = RecordingDevice::new();
    let source = full_source("two lights").with_light("u_light2");
    let program = link(&mut device, &source);
    let light = LightNode::with_params(
        LightParams {
            position: Vector3::new(0.0, 1.0, 0.0),
            uniform: "u_light2".to_string(),
            ..Default::default()
        },
        vec![],
    );
    let mut root = ShaderNode::new(program, vec![Box::new(light)]);

    render_frame(&mut device, &mut root);

    assert_eq!(device.last_uniform("u_light2Pos"), Some(UniformValue::Vec3([0.0, 1.0, 0.0])));
    assert!(device.uniform_writes(LIGHT_POS).is_empty());
}

#[test]
fn moving_a_light_updates_the_next_frame() {
    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let light = LightNode::new(Vector3::new(1.0, 0.0, 0.0), vec![]);
    let handle = light.handle();
    let mut root = ShaderNode::new(program, vec![Box::new(light)]);

    render_frame(&mut device, &mut root);
    handle.set_position(Vector3::new(0.0, 0.0, 2.0));
    render_frame(&mut device, &mut root);

    assert_eq!(
        device.uniform_writes(LIGHT_POS),
        [UniformValue::Vec3([1.0, 0.0, 0.0]), UniformValue::Vec3([0.0, 0.0, 2.0])]
    );
}

#[test]
fn material_on_a_shader_without_structs_writes_nothing_but_still_draws() {
    let mut device = RecordingDevice::new();
    let source = ProgramSource::new("unlit", SHADER_CODE)
        .attribute(names::A_POSITION, 3)
        .with_transforms();
    let program = link(&mut device, &source);
    let first = LightHandle::new(LightParams::default());
    let second = LightHandle::new(LightParams {
        uniform: "u_light2".to_string(),
        ..Default::default()
    });
    let material = MaterialNode::new(vec![Box::new(MeshNode::new(triangle()))])
        .with_light(first)
        .with_light(second);
    let mut root = ShaderNode::new(program, vec![Box::new(material)]);

    render_frame(&mut device, &mut root);

    let struct_writes = device
        .commands()
        .iter()
        .filter(|c| {
            matches!(c, Command::SetUniform { name, .. } if name.contains('.') || name.ends_with("Pos"))
        })
        .count();
    assert_eq!(struct_writes, 0);
    assert_eq!(device.draws().len(), 1);
}

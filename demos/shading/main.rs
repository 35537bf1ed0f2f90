//! Two coloured lights circling a gold sphere on a floor, shaded with Phong.
//!
//! Run with `cargo run --example shading`.

use std::time::Duration;

use flow_scene::{
    cgmath::{Matrix4, Point3, SquareMatrix, Vector3, Vector4},
    data_structures::{
        builder,
        light::{LightNode, LightParams},
        material::{MaterialNode, MaterialParams},
        mesh::{MeshData, MeshNode},
        scene_graph::{NodeId, SceneNode, ShaderNode, TransformNode},
    },
    device::ProgramSource,
    flow::{AppConfig, FlowContext, SceneFlow, run},
    math::{self, TransformDesc},
    names,
};

#[derive(Default)]
struct Shading {
    rotate_light: Option<NodeId>,
    rotate_light2: Option<NodeId>,
}

fn light_marker(light: &LightNode, color: Vector4<f32>) -> Box<dyn SceneNode> {
    let material = MaterialNode::with_params(
        MaterialParams {
            ambient: Vector4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vector4::new(0.0, 0.0, 0.0, 1.0),
            emission: color,
            ..Default::default()
        },
        vec![Box::new(MeshNode::new(MeshData::sphere(0.2, 10, 10)))],
    )
    .with_light(light.handle());
    Box::new(material)
}

impl SceneFlow for Shading {
    fn build(&mut self, ctx: &mut FlowContext<'_>) -> anyhow::Result<Box<dyn SceneNode>> {
        let phong = ctx.link(
            &ProgramSource::new("phong", include_str!("phong.wgsl"))
                .attribute(names::A_POSITION, 3)
                .attribute(names::A_NORMAL, 3)
                .with_transforms()
                .with_material(names::DEFAULT_MATERIAL)
                .with_light(names::DEFAULT_LIGHT)
                .with_light("u_light2"),
        )?;

        let mut light = LightNode::with_params(
            LightParams {
                position: Vector3::new(2.0, 2.0, -2.0),
                ambient: Vector4::new(1.0, 1.0, 1.0, 1.0),
                ..Default::default()
            },
            vec![],
        );
        let marker = light_marker(&light, Vector4::new(1.0, 1.0, 1.0, 1.0));
        light.append(marker);

        let mut light2 = LightNode::with_params(
            LightParams {
                position: Vector3::new(2.0, 0.2, 0.0),
                diffuse: Vector4::new(1.0, 0.0, 0.0, 1.0),
                specular: Vector4::new(1.0, 0.0, 0.0, 1.0),
                uniform: "u_light2".to_string(),
                ..Default::default()
            },
            vec![],
        );
        let marker = light_marker(&light2, Vector4::new(1.0, 0.0, 0.0, 1.0));
        light2.append(marker);

        let lights = [light.handle(), light2.handle()];

        // gold
        let mut sphere = MaterialNode::with_params(
            MaterialParams {
                ambient: Vector4::new(0.24725, 0.1995, 0.0745, 1.0),
                diffuse: Vector4::new(0.75164, 0.60648, 0.22648, 1.0),
                specular: Vector4::new(0.628281, 0.555802, 0.366065, 1.0),
                shininess: 0.4 * 128.0,
                ..Default::default()
            },
            vec![builder::translate(0.0, 1.0, 0.0, vec![builder::draw_sphere(1.0, 20, 20)])],
        );
        sphere.lights.extend(lights.iter().cloned());

        let mut floor = MaterialNode::with_params(
            MaterialParams {
                ambient: Vector4::new(0.0, 0.0, 0.0, 1.0),
                diffuse: Vector4::new(0.8, 0.8, 0.8, 1.0),
                specular: Vector4::new(0.5, 0.5, 0.5, 1.0),
                shininess: 2.0,
                ..Default::default()
            },
            vec![builder::draw_floor(1.0, 4.0)],
        );
        floor.lights.extend(lights.iter().cloned());

        let rotate_light = TransformNode::new(Matrix4::identity(), vec![Box::new(light)]);
        let rotate_light2 = TransformNode::new(Matrix4::identity(), vec![Box::new(light2)]);
        self.rotate_light = Some(rotate_light.id());
        self.rotate_light2 = Some(rotate_light2.id());

        let floor_transform = TransformDesc {
            rotate_x: Some(-90.0),
            ..Default::default()
        }
        .uniform_scale(2.0);

        Ok(Box::new(ShaderNode::new(
            phong,
            vec![
                Box::new(rotate_light),
                Box::new(rotate_light2),
                Box::new(sphere),
                Box::new(TransformNode::new(floor_transform.into(), vec![Box::new(floor)])),
            ],
        )))
    }

    fn update(&mut self, root: &mut dyn SceneNode, elapsed: Duration) {
        let millis = elapsed.as_secs_f32() * 1000.0;
        let rotations = [
            (self.rotate_light, millis * 0.05),
            (self.rotate_light2, -millis * 0.1),
        ];
        for (id, degrees) in rotations {
            let Some(node) = id.and_then(|id| root.find_mut(id)) else {
                continue;
            };
            if let Some(transform) = node.downcast_mut::<TransformNode>() {
                transform.matrix = math::rotate_y(degrees);
            }
        }
    }

    fn view(&self, _elapsed: Duration) -> Matrix4<f32> {
        math::look_at(
            Point3::new(0.0, 3.0, -8.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::unit_y(),
        )
    }
}

fn main() -> anyhow::Result<()> {
    run(
        AppConfig {
            title: "flow-scene shading".to_string(),
            fov: 45.0,
            ..Default::default()
        },
        Shading::default(),
    )
}

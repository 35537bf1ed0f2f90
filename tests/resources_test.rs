use std::io::Cursor;

use flow_scene::{
    data_structures::{material::MaterialNode, mesh::MeshNode, scene_graph::ShaderNode},
    device::{Command, RecordingDevice, UniformValue},
    names,
    resources::{self, decode_image, parse_mtl, parse_obj},
};

use crate::common::test_utils::{full_source, link, render_frame};

mod common;

const QUAD_OBJ: &str = "\
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vn 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

const QUAD_MTL: &str = "\
newmtl red
Kd 1 0 0
Ns 10
";

#[test]
fn quad_faces_are_triangulated() {
    let meshes = parse_obj(QUAD_OBJ).unwrap();
    assert_eq!(meshes.len(), 1);

    let quad = &meshes[0];
    assert_eq!(quad.vertex_count(), 4);
    assert_eq!(quad.element_count(), 6);
    assert_eq!(quad.normals.as_ref().map(Vec::len), Some(4));
    assert!(quad.validate().is_ok());
}

#[test]
fn parsed_model_renders_with_its_material() {
    let mesh = parse_obj(QUAD_OBJ).unwrap().remove(0);
    let material = parse_mtl(QUAD_MTL).unwrap().remove("red").unwrap();

    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(MaterialNode::with_params(
            material,
            vec![Box::new(MeshNode::new(mesh))],
        ))],
    );
    render_frame(&mut device, &mut root);

    assert!(matches!(
        device.draws().as_slice(),
        [Command::DrawIndexed { count: 6, .. }]
    ));
    assert_eq!(
        device.last_uniform(&names::field(names::DEFAULT_MATERIAL, "diffuse")),
        Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
    );
    assert_eq!(
        device.last_uniform(&names::field(names::DEFAULT_MATERIAL, "shininess")),
        Some(UniformValue::Float(10.0))
    );
}

#[test]
fn encoded_png_decodes_to_rgba() {
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (3, 2));
    assert_eq!(&decoded.pixels()[..4], &[10, 20, 30, 255]);
}

#[tokio::test]
async fn missing_assets_report_errors_in_order() {
    assert!(resources::load_binary("missing/nothing.bin").await.is_err());

    let results = resources::load_all(&["missing/a.png", "missing/b.png"]).await;
    assert_eq!(results.len(), 2);
    for (result, name) in results.iter().zip(["a.png", "b.png"]) {
        let message = format!("{:#}", result.as_ref().unwrap_err());
        assert!(message.contains(name), "{message}");
    }
}

#[tokio::test]
async fn loaded_model_uploads_its_mtl_colours() {
    let mesh = resources::load_obj("quad.obj").await.unwrap().remove(0);
    let material = resources::load_mtl("quad.mtl").await.unwrap().remove("glow").unwrap();

    let mut device = RecordingDevice::new();
    let program = link(&mut device, &full_source("phong"));
    let mut root = ShaderNode::new(
        program,
        vec![Box::new(MaterialNode::with_params(
            material,
            vec![Box::new(MeshNode::new(mesh))],
        ))],
    );
    render_frame(&mut device, &mut root);

    let field = |name| device.last_uniform(&names::field(names::DEFAULT_MATERIAL, name));
    assert_eq!(field("emission"), Some(UniformValue::Vec4([0.5, 0.25, 0.0, 1.0])));
    assert_eq!(field("diffuse"), Some(UniformValue::Vec4([0.2, 0.4, 0.6, 1.0])));
    assert_eq!(field("shininess"), Some(UniformValue::Float(32.0)));
}

#[tokio::test]
async fn read_errors_keep_their_cause() {
    let error = resources::load_mtl("missing/lib.mtl").await.unwrap_err();
    assert!(error.to_string().contains("lib.mtl"), "{error}");
    assert!(error.chain().any(|cause| cause.downcast_ref::<std::io::Error>().is_some()));
}

#[tokio::test]
async fn missing_obj_is_an_error() {
    assert!(resources::load_obj("missing/model.obj").await.is_err());
}

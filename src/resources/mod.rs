//! Loading of external assets.
//!
//! Files are read from `./assets/<name>`. Parsing is split from I/O so that
//! OBJ, MTL and image data can also come from memory.

use std::collections::HashMap;

use anyhow::Context as _;
use futures::future::join_all;

use crate::{
    data_structures::{material::MaterialParams, mesh::MeshData},
    device::ImageData,
};

pub mod material;
pub mod mesh;
pub mod texture;

pub use material::parse_mtl;
pub use mesh::parse_obj;
pub use texture::decode_image;

fn asset_path(file_name: &str) -> std::path::PathBuf {
    std::path::Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let path = asset_path(file_name);
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(file_name);
    tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Read several assets concurrently. Results keep the order of `file_names`.
pub async fn load_all(file_names: &[&str]) -> Vec<anyhow::Result<Vec<u8>>> {
    join_all(file_names.iter().map(|name| load_binary(name))).await
}

pub async fn load_obj(file_name: &str) -> anyhow::Result<Vec<MeshData>> {
    let text = load_string(file_name).await?;
    parse_obj(&text).with_context(|| format!("failed to parse {file_name}"))
}

pub async fn load_mtl(file_name: &str) -> anyhow::Result<HashMap<String, MaterialParams>> {
    let text = load_string(file_name).await?;
    parse_mtl(&text).with_context(|| format!("failed to parse {file_name}"))
}

pub async fn load_image(file_name: &str) -> anyhow::Result<ImageData> {
    let bytes = load_binary(file_name).await?;
    decode_image(&bytes).with_context(|| format!("failed to decode {file_name}"))
}

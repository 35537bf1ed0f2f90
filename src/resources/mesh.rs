use std::io::{BufReader, Cursor};

use crate::data_structures::mesh::MeshData;

/// Parse Wavefront OBJ text into one [`MeshData`] per object.
///
/// Faces are triangulated and every vertex gets a single index. Normals and
/// texture coordinates are `None` when the file has none. Material libraries
/// are not followed, use [`parse_mtl`](super::parse_mtl) for those.
pub fn parse_obj(text: &str) -> anyhow::Result<Vec<MeshData>> {
    let mut reader = BufReader::new(Cursor::new(text));
    let (models, _) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let meshes = models
        .into_iter()
        .map(|model| {
            let m = model.mesh;
            let positions = m
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let mut mesh = MeshData::new(positions).with_indices(m.indices);
            if !m.normals.is_empty() {
                mesh = mesh.with_normals(m.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
            }
            if !m.texcoords.is_empty() {
                mesh = mesh.with_texcoords(m.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect());
            }
            if !m.vertex_color.is_empty() {
                mesh = mesh.with_colors(m.vertex_color.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect());
            }
            if let Err(e) = mesh.validate() {
                log::warn!("object '{}' is inconsistent: {e}", model.name);
            }
            mesh
        })
        .collect();
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_without_normals() {
        let meshes = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].positions.len(), 3);
        assert!(meshes[0].normals.is_none());
        assert!(meshes[0].texcoords.is_none());
        assert_eq!(meshes[0].indices.as_deref(), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn keeps_texcoords_per_corner() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        let meshes = parse_obj(obj).unwrap();
        assert_eq!(
            meshes[0].texcoords.as_deref(),
            Some(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]][..])
        );
    }
}

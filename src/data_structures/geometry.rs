//! Procedural primitives.

use std::f32::consts::PI;

use crate::data_structures::mesh::MeshData;

impl MeshData {
    /// A quad spanning `-width..width` by `-height..height` in the z = 0 plane,
    /// facing +Z, with unit texture coordinates and alternating yellow/red
    /// vertex colours.
    pub fn rect(width: f32, height: f32) -> Self {
        MeshData::new(vec![
            [-width, -height, 0.0],
            [width, -height, 0.0],
            [width, height, 0.0],
            [-width, height, 0.0],
        ])
        .with_normals(vec![[0.0, 0.0, 1.0]; 4])
        .with_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
        .with_colors(vec![
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ])
        .with_indices(vec![0, 1, 2, 2, 3, 0])
    }

    /// A UV sphere around the origin.
    ///
    /// Has `(latitude_bands + 1) * (longitude_bands + 1)` vertices; the seam
    /// column and the pole rows are duplicated so texture coordinates can wrap.
    pub fn sphere(radius: f32, latitude_bands: u32, longitude_bands: u32) -> Self {
        let lat_bands = latitude_bands.max(1);
        let long_bands = longitude_bands.max(1);
        let vertices = ((lat_bands + 1) * (long_bands + 1)) as usize;

        let mut positions = Vec::with_capacity(vertices);
        let mut normals = Vec::with_capacity(vertices);
        let mut texcoords = Vec::with_capacity(vertices);
        for lat in 0..=lat_bands {
            let theta = lat as f32 * PI / lat_bands as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            for long in 0..=long_bands {
                let phi = long as f32 * 2.0 * PI / long_bands as f32;
                let (sin_phi, cos_phi) = phi.sin_cos();
                let normal = [cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                normals.push(normal);
                positions.push(normal.map(|c| c * radius));
                texcoords.push([
                    1.0 - long as f32 / long_bands as f32,
                    1.0 - lat as f32 / lat_bands as f32,
                ]);
            }
        }

        let mut indices = Vec::with_capacity((6 * lat_bands * long_bands) as usize);
        for lat in 0..lat_bands {
            for long in 0..long_bands {
                let first = lat * (long_bands + 1) + long;
                let second = first + long_bands + 1;
                indices.extend([first, second, first + 1, second, second + 1, first + 1]);
            }
        }

        MeshData::new(positions)
            .with_normals(normals)
            .with_texcoords(texcoords)
            .with_indices(indices)
    }

    /// A floor quad of `half_extent` in the z = 0 plane whose texture repeats
    /// `uv_repeat` times along each axis.
    pub fn floor(half_extent: f32, uv_repeat: f32) -> Self {
        let (e, r) = (half_extent, uv_repeat);
        MeshData::new(vec![[-e, -e, 0.0], [e, -e, 0.0], [e, e, 0.0], [-e, e, 0.0]])
            .with_normals(vec![[0.0, 0.0, 1.0]; 4])
            .with_texcoords(vec![[0.0, 0.0], [r, 0.0], [r, r], [0.0, r]])
            .with_indices(vec![0, 1, 2, 2, 3, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_layout() {
        let rect = MeshData::rect(2.0, 1.0);
        assert_eq!(rect.positions[2], [2.0, 1.0, 0.0]);
        assert_eq!(rect.indices.as_deref(), Some(&[0, 1, 2, 2, 3, 0][..]));
        assert!(rect.validate().is_ok());
    }

    #[test]
    fn sphere_texcoords_span_unit_square() {
        let sphere = MeshData::sphere(1.0, 4, 8);
        let texcoords = sphere.texcoords.unwrap();
        assert_eq!(texcoords[0], [1.0, 1.0]);
        assert_eq!(*texcoords.last().unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn floor_repeats_texture() {
        let floor = MeshData::floor(5.0, 5.0);
        assert_eq!(floor.texcoords.unwrap()[2], [5.0, 5.0]);
        assert_eq!(floor.positions[0], [-5.0, -5.0, 0.0]);
    }
}

//! Per-face tangents for normal mapping.

use cgmath::{InnerSpace, Vector3, Zero};

const EPSILON: f32 = 1e-6;

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let len = v.magnitude();
    if len > 0.0 { v / len } else { Vector3::zero() }
}

/// Compute one tangent per triangle corner of `indices`.
///
/// Tangents are flat: all three corners of a triangle get the same vector,
/// shared vertices are not averaged. Per coordinate axis the tangent and
/// bitangent components are solved from the position and texture-coordinate
/// deltas of the triangle edges; an axis whose system is singular contributes
/// zero. The result has `indices.len()` entries when every index is in range.
pub fn calculate_tangents(
    indices: &[u32],
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
) -> Vec<[f32; 3]> {
    if indices.len() % 3 != 0 {
        log::warn!(
            "{} indices do not form whole triangles, ignoring the trailing {}",
            indices.len(),
            indices.len() % 3
        );
    }
    let mut tangents = Vec::with_capacity(indices.len());

    for triangle in indices.chunks_exact(3) {
        let corner = |i: u32| -> Option<(Vector3<f32>, [f32; 2])> {
            let i = i as usize;
            Some((Vector3::from(*positions.get(i)?), *texcoords.get(i)?))
        };
        let (Some((v0, t0)), Some((v1, t1)), Some((v2, t2))) = (
            corner(triangle[0]),
            corner(triangle[1]),
            corner(triangle[2]),
        ) else {
            log::warn!("triangle {:?} references a missing vertex", triangle);
            tangents.extend([[0.0; 3]; 3]);
            continue;
        };

        let (du1, dv1) = (t1[0] - t0[0], t1[1] - t0[1]);
        let (du2, dv2) = (t2[0] - t0[0], t2[1] - t0[1]);

        let mut tangent = Vector3::zero();
        let mut bitangent = Vector3::zero();
        for k in 0..3 {
            let e0 = Vector3::new(v1[k] - v0[k], du1, dv1);
            let e1 = Vector3::new(v2[k] - v0[k], du2, dv2);
            let c = e0.cross(e1);
            if c.x.abs() > EPSILON {
                tangent[k] = -c.y / c.x;
                bitangent[k] = -c.z / c.x;
            }
        }

        let tangent = normalize_or_zero(tangent);
        let bitangent = normalize_or_zero(bitangent);
        let normal = normalize_or_zero(tangent.cross(bitangent));
        let corrected = bitangent.cross(normal);

        tangents.extend([Into::<[f32; 3]>::into(corrected); 3]);
    }

    tangents
}

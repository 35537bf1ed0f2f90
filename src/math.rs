//! Matrix helpers on top of `cgmath`.
//!
//! Column vectors, angles in degrees, `parent * local` composition.

use cgmath::{Deg, Matrix, Matrix3, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

/// wgpu clips depth to `0..1`, cgmath produces OpenGL's `-1..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub fn translate(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

pub fn scale(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_nonuniform_scale(x, y, z)
}

pub fn rotate_x(degrees: f32) -> Matrix4<f32> {
    Matrix4::from_angle_x(Deg(degrees))
}

pub fn rotate_y(degrees: f32) -> Matrix4<f32> {
    Matrix4::from_angle_y(Deg(degrees))
}

pub fn rotate_z(degrees: f32) -> Matrix4<f32> {
    Matrix4::from_angle_z(Deg(degrees))
}

/// A composite transform. Components are applied as
/// `translate * rotate_x * rotate_y * rotate_z * scale`; unset parts are skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformDesc {
    pub translate: Option<Vector3<f32>>,
    pub rotate_x: Option<f32>,
    pub rotate_y: Option<f32>,
    pub rotate_z: Option<f32>,
    pub scale: Option<Vector3<f32>>,
}

impl TransformDesc {
    pub fn uniform_scale(mut self, factor: f32) -> Self {
        self.scale = Some(Vector3::new(factor, factor, factor));
        self
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let mut m = Matrix4::identity();
        if let Some(t) = self.translate {
            m = m * Matrix4::from_translation(t);
        }
        if let Some(deg) = self.rotate_x {
            m = m * rotate_x(deg);
        }
        if let Some(deg) = self.rotate_y {
            m = m * rotate_y(deg);
        }
        if let Some(deg) = self.rotate_z {
            m = m * rotate_z(deg);
        }
        if let Some(s) = self.scale {
            m = m * scale(s.x, s.y, s.z);
        }
        m
    }
}

impl From<TransformDesc> for Matrix4<f32> {
    fn from(desc: TransformDesc) -> Self {
        desc.matrix()
    }
}

pub fn upper_left(m: &Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
}

/// Inverse-transpose of the upper-left 3x3, `None` if it is singular.
pub fn normal_matrix(m: &Matrix4<f32>) -> Option<Matrix3<f32>> {
    upper_left(m).invert().map(|inv| inv.transpose())
}

/// Transform a point (w = 1) and drop the homogeneous coordinate.
pub fn transform_point(m: &Matrix4<f32>, p: Vector3<f32>) -> Vector3<f32> {
    (*m * p.extend(1.0)).truncate()
}

/// Parse `#RRGGBB` into an opaque colour with components in `0..=1`.
pub fn hex_to_rgba(color: &str) -> anyhow::Result<Vector4<f32>> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("expected a colour like #FF00FF, got '{color}'");
    }
    let rgb = u32::from_str_radix(digits, 16)?;
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    Ok(Vector4::new(channel(16), channel(8), channel(0), 1.0))
}

/// Right-handed perspective projection for wgpu's depth range.
pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(fov_degrees), aspect, near, far)
}

pub fn look_at(eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::look_at_rh(eye, center, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn transform_desc_applies_translation_last() {
        let desc = TransformDesc {
            translate: Some(Vector3::new(1.0, 2.0, 3.0)),
            rotate_y: Some(90.0),
            ..Default::default()
        }
        .uniform_scale(2.0);
        let p = transform_point(&desc.matrix(), Vector3::new(1.0, 0.0, 0.0));
        assert!(close(p, Vector3::new(1.0, 2.0, 1.0)), "{p:?}");
    }

    #[test]
    fn normal_matrix_of_uniform_scale_keeps_direction() {
        let n = normal_matrix(&scale(3.0, 3.0, 3.0)).unwrap();
        let dir = (n * Vector3::new(0.0, 1.0, 0.0)).normalize();
        assert!(close(dir, Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn normal_matrix_of_singular_matrix_is_none() {
        assert!(normal_matrix(&scale(1.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn hex_colours() {
        let c = hex_to_rgba("#FF8000").unwrap();
        assert!(close(c.truncate(), Vector3::new(1.0, 128.0 / 255.0, 0.0)));
        assert_eq!(c.w, 1.0);
        assert!(hex_to_rgba("#F0F").is_err());
        assert!(hex_to_rgba("#GGGGGG").is_err());
    }

    #[test]
    fn hex_colours_reject_signs() {
        assert!(hex_to_rgba("+12345").is_err());
        assert!(hex_to_rgba("#-12345").is_err());
    }
}

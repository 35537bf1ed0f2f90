use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
};

use cgmath::Vector4;

use crate::data_structures::material::MaterialParams;

fn rgba(rgb: [f32; 3]) -> Vector4<f32> {
    Vector4::new(rgb[0], rgb[1], rgb[2], 1.0)
}

/// Parse an MTL library into material parameters keyed by material name.
///
/// `Ns`, `Ka`, `Kd`, `Ks`, `Ke` and `map_Kd` are read, everything missing
/// keeps the [`MaterialParams`] default.
pub fn parse_mtl(text: &str) -> anyhow::Result<HashMap<String, MaterialParams>> {
    let (materials, _) = tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(text)))?;

    let mut params = HashMap::with_capacity(materials.len());
    for m in materials {
        let mut p = MaterialParams::default();
        if let Some(ambient) = m.ambient {
            p.ambient = rgba(ambient);
        }
        if let Some(diffuse) = m.diffuse {
            p.diffuse = rgba(diffuse);
        }
        if let Some(specular) = m.specular {
            p.specular = rgba(specular);
        }
        if let Some(shininess) = m.shininess {
            p.shininess = shininess;
        }
        if let Some(emission) = m.emissive {
            p.emission = rgba(emission);
        }
        p.texture = m.diffuse_texture;
        params.insert(m.name, p);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_colours_and_texture() {
        let mtl = "newmtl stone\nNs 50\nKa 0.1 0.1 0.1\nKd 0.5 0.4 0.3\nKe 1 0 0\nmap_Kd stone.png\n";
        let materials = parse_mtl(mtl).unwrap();
        let stone = &materials["stone"];
        assert_eq!(stone.shininess, 50.0);
        assert_eq!(stone.diffuse, Vector4::new(0.5, 0.4, 0.3, 1.0));
        assert_eq!(stone.emission, Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stone.specular, MaterialParams::default().specular);
        assert_eq!(stone.texture.as_deref(), Some("stone.png"));
    }

    #[test]
    fn missing_emission_keeps_default() {
        let materials = parse_mtl("newmtl plain\nKd 1 1 1\n").unwrap();
        assert_eq!(materials["plain"].emission, MaterialParams::default().emission);
    }
}

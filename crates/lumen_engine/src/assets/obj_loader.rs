//! OBJ file loader for 3D models
//!
//! Reads positions, texture coordinates, normals and polygon faces. Faces
//! with more than three corners are fan-triangulated, and identical corners
//! share one vertex.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::render::{MeshData, Vertex};

/// OBJ parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// Reading the source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A number or index could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Structurally invalid content
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ reader
pub struct ObjLoader;

#[derive(Default)]
struct Attributes {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

#[derive(Default)]
struct Builder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    unique: HashMap<Vertex, u32>,
}

impl Builder {
    fn index_of(&mut self, vertex: Vertex) -> Result<u32, String> {
        if let Some(index) = self.unique.get(&vertex) {
            return Ok(*index);
        }
        let index = u32::try_from(self.vertices.len()).map_err(|_| "too many vertices".to_string())?;
        self.vertices.push(vertex);
        self.unique.insert(vertex, index);
        Ok(index)
    }
}

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let data = Self::parse(BufReader::new(file))?;
        log::debug!(
            "Loaded OBJ {}: {} vertices, {} triangles",
            path.display(),
            data.vertices.len(),
            data.triangle_count()
        );
        Ok(data)
    }

    /// Parse OBJ text
    pub fn parse<R: BufRead>(reader: R) -> Result<MeshData, ObjError> {
        let mut attributes = Attributes::default();
        let mut builder = Builder::default();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let parse_error = |message: String| ObjError::ParseError { line: line_no, message };

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            let rest: Vec<&str> = parts.collect();

            match keyword {
                "v" => attributes.positions.push(floats::<3>(&rest).map_err(parse_error)?),
                "vn" => attributes.normals.push(floats::<3>(&rest).map_err(parse_error)?),
                "vt" => attributes.tex_coords.push(floats::<2>(&rest).map_err(parse_error)?),
                "f" => {
                    if rest.len() < 3 {
                        return Err(parse_error(format!("face has {} corners, need at least 3", rest.len())));
                    }
                    let mut corners = Vec::with_capacity(rest.len());
                    for corner in &rest {
                        let vertex = resolve_corner(corner, &attributes).map_err(parse_error)?;
                        corners.push(builder.index_of(vertex).map_err(parse_error)?);
                    }
                    for i in 1..corners.len() - 1 {
                        builder.indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if builder.vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }
        Ok(MeshData::new(builder.vertices, builder.indices))
    }
}

fn floats<const N: usize>(parts: &[&str]) -> Result<[f32; N], String> {
    if parts.len() < N {
        return Err(format!("expected {} numbers, found {}", N, parts.len()));
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().map_err(|_| format!("invalid number '{part}'"))?;
    }
    Ok(values)
}

/// 1-based index, negative counting back from the end
fn resolve_index(raw: &str, len: usize) -> Result<usize, String> {
    let index: i64 = raw.parse().map_err(|_| format!("invalid index '{raw}'"))?;
    let resolved = match index {
        0 => None,
        i if i > 0 => usize::try_from(i - 1).ok(),
        i => usize::try_from(i64::try_from(len).unwrap_or(i64::MAX) + i).ok(),
    };
    resolved
        .filter(|i| *i < len)
        .ok_or_else(|| format!("index {index} out of range ({len} available)"))
}

fn resolve_corner(corner: &str, attributes: &Attributes) -> Result<Vertex, String> {
    let mut fields = corner.split('/');
    let position = fields
        .next()
        .ok_or_else(|| format!("empty face corner '{corner}'"))
        .and_then(|raw| resolve_index(raw, attributes.positions.len()))?;

    let tex_coord = match fields.next() {
        Some(raw) if !raw.is_empty() => attributes.tex_coords[resolve_index(raw, attributes.tex_coords.len())?],
        _ => [0.0, 0.0],
    };
    let normal = match fields.next() {
        Some(raw) if !raw.is_empty() => attributes.normals[resolve_index(raw, attributes.normals.len())?],
        _ => [0.0, 0.0, 1.0],
    };

    Ok(Vertex::new(attributes.positions[position], normal, tex_coord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let data = ObjLoader::parse(Cursor::new(QUAD)).unwrap();
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(data.vertices[2].tex_coord, [1.0, 1.0]);
        assert_eq!(data.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n";
        let data = ObjLoader::parse(Cursor::new(source)).unwrap();
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.triangle_count(), 2);
    }

    #[test]
    fn test_negative_indices_count_from_end() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let data = ObjLoader::parse(Cursor::new(source)).unwrap();
        assert_eq!(data.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(data.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_index_reports_line() {
        let source = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
        match ObjLoader::parse(Cursor::new(source)) {
            Err(ObjError::ParseError { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_source_is_invalid() {
        assert!(matches!(
            ObjLoader::parse(Cursor::new("# nothing\n")),
            Err(ObjError::InvalidFormat(_))
        ));
    }
}

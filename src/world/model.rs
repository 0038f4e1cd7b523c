use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use nalgebra as na;
use na::{vector, Matrix4, Vector3};
use obj::raw::material::{parse_mtl, Material, MtlColor};
use obj::raw::object::{parse_obj, Polygon, RawObj};
use thiserror::Error;

use super::vertex::Vertex;
use crate::pipeline::Buffer;

/// Color of faces, which have no material.
const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("can't read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("{} has no faces", .0.display())]
    Empty(PathBuf),
}

/// Part of a model, drawn with a single draw call.
#[derive(Debug, Clone)]
pub struct Submesh {
    pub material: Option<String>,
    pub vertex_buffer: Rc<Buffer<Vertex>>,
    pub index_buffer: Rc<Buffer<u32>>,
}

impl Submesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        return Self {
            material: None,
            vertex_buffer: Rc::new(Buffer::from_elements(vertices)),
            index_buffer: Rc::new(Buffer::from_elements(indices)),
        };
    }
}

/// Triangulated model, split into submeshes by material, sharing one world transform.
#[derive(Debug, Clone)]
pub struct Model {
    submeshes: Vec<Submesh>,
    world_matrix: Matrix4<f32>,
}

/// Colors a vertex takes from its material.
#[derive(Debug, Clone, Copy)]
struct MaterialColors {
    ambient: Vector3<f32>,
    diffuse: Vector3<f32>,
    emissive: Vector3<f32>,
}

impl Default for MaterialColors {
    fn default() -> Self {
        return Self {
            ambient: Vector3::from(DEFAULT_COLOR),
            diffuse: Vector3::from(DEFAULT_COLOR),
            emissive: Vector3::zeros(),
        };
    }
}

impl MaterialColors {
    /// Missing ambient color falls back to diffuse one, so models without Ka are still visible.
    fn from_material(material: &Material) -> Self {
        fn to_vector(color: &Option<MtlColor>) -> Option<Vector3<f32>> {
            return match color {
                Some(MtlColor::Rgb(r, g, b)) => Some(vector![*r, *g, *b]),
                Some(MtlColor::Xyz(x, y, z)) => Some(vector![*x, *y, *z]),
                _ => None,
            };
        }

        let default_color = Vector3::from(DEFAULT_COLOR);
        let diffuse = to_vector(&material.diffuse);
        return Self {
            ambient: to_vector(&material.ambient).or(diffuse).unwrap_or(default_color),
            diffuse: diffuse.unwrap_or(default_color),
            emissive: to_vector(&material.emissive).unwrap_or_else(Vector3::zeros),
        };
    }
}

/// Collects deduplicated vertices and triangle indices of one submesh.
struct SubmeshBuilder<'a> {
    raw: &'a RawObj,
    colors: MaterialColors,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: HashMap<(usize, Option<usize>), u32>,
}

impl<'a> SubmeshBuilder<'a> {
    fn new(raw: &'a RawObj, colors: MaterialColors) -> Self {
        return Self {
            raw,
            colors,
            vertices: Vec::new(),
            indices: Vec::new(),
            lookup: HashMap::new(),
        };
    }

    /// Indices are in range here, parse_obj rejects faces referencing missing positions or normals.
    fn vertex_index(&mut self, position: usize, normal: Option<usize>) -> u32 {
        if let Some(&index) = self.lookup.get(&(position, normal)) {
            return index;
        }

        let (x, y, z, _) = self.raw.positions[position];
        let normal_vector = match normal {
            Some(normal) => {
                let (nx, ny, nz) = self.raw.normals[normal];
                vector![nx, ny, nz]
            }
            None => Vector3::zeros(),
        };

        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: vector![x, y, z],
            normal: normal_vector,
            ambient: self.colors.ambient,
            diffuse: self.colors.diffuse,
            emissive: self.colors.emissive,
        });
        self.lookup.insert((position, normal), index);
        return index;
    }

    /// Adds a polygon as a triangle fan. Points and lines are skipped.
    fn add_polygon(&mut self, polygon: &Polygon) {
        let corners: Vec<(usize, Option<usize>)> = match polygon {
            Polygon::P(corners) => corners.iter().map(|&p| (p, None)).collect(),
            Polygon::PT(corners) => corners.iter().map(|&(p, _)| (p, None)).collect(),
            Polygon::PN(corners) => corners.iter().map(|&(p, n)| (p, Some(n))).collect(),
            Polygon::PTN(corners) => corners.iter().map(|&(p, _, n)| (p, Some(n))).collect(),
        };
        if corners.len() < 3 {
            return;
        }

        let mut fan = Vec::with_capacity(corners.len());
        for (position, normal) in corners {
            fan.push(self.vertex_index(position, normal));
        }
        for i in 1..fan.len() - 1 {
            self.indices.extend_from_slice(&[fan[0], fan[i], fan[i + 1]]);
        }
    }

    fn build(self, material: Option<String>) -> Option<Submesh> {
        if self.indices.is_empty() {
            return None;
        }
        let mut submesh = Submesh::new(self.vertices, self.indices);
        submesh.material = material;
        return Some(submesh);
    }
}

impl Model {
    pub fn from_submeshes(submeshes: Vec<Submesh>) -> Self {
        return Self {
            submeshes,
            world_matrix: Matrix4::identity(),
        };
    }

    /// Loads Wavefront OBJ file together with MTL libraries it references. Every material used
    /// by the faces becomes a separate submesh, faces without material go first.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw = parse_obj(BufReader::new(file)).map_err(|e| ModelError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let materials = load_materials(path, &raw.material_libraries);

        let mut submeshes = Vec::new();
        let mut assigned = vec![false; raw.polygons.len()];
        // Faces before the first usemtl may end up in a mesh with an empty name.
        let mut names: Vec<&String> = raw.meshes.keys().filter(|name| !name.is_empty()).collect();
        names.sort();
        for name in names.iter() {
            for range in raw.meshes[*name].polygons.iter() {
                for i in range.start..range.end.min(assigned.len()) {
                    assigned[i] = true;
                }
            }
        }

        let mut builder = SubmeshBuilder::new(&raw, MaterialColors::default());
        for (i, polygon) in raw.polygons.iter().enumerate() {
            if !assigned[i] {
                builder.add_polygon(polygon);
            }
        }
        submeshes.extend(builder.build(None));

        for name in names {
            let colors = match materials.get(name) {
                Some(colors) => *colors,
                None => {
                    log::warn!("Material {} is not defined, using default colors", name);
                    MaterialColors::default()
                }
            };
            let mut builder = SubmeshBuilder::new(&raw, colors);
            for range in raw.meshes[name].polygons.iter() {
                for polygon in &raw.polygons[range.start..range.end.min(raw.polygons.len())] {
                    builder.add_polygon(polygon);
                }
            }
            submeshes.extend(builder.build(Some(name.clone())));
        }

        if submeshes.is_empty() {
            return Err(ModelError::Empty(path.to_path_buf()));
        }
        let model = Self::from_submeshes(submeshes);
        log::info!(
            "Loaded {}: {} submeshes, {} vertices, {} indices",
            path.display(),
            model.submeshes.len(),
            model.vertex_count(),
            model.index_count()
        );
        return Ok(model);
    }

    pub fn submeshes(&self) -> &[Submesh] {
        return &self.submeshes[..];
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        return self.world_matrix;
    }

    pub fn set_world_matrix(&mut self, world_matrix: Matrix4<f32>) {
        self.world_matrix = world_matrix;
    }

    pub fn vertex_count(&self) -> usize {
        return self
            .submeshes
            .iter()
            .map(|s| s.vertex_buffer.get_number_of_elements())
            .sum();
    }

    pub fn index_count(&self) -> usize {
        return self
            .submeshes
            .iter()
            .map(|s| s.index_buffer.get_number_of_elements())
            .sum();
    }
}

/// Reads MTL libraries next to the OBJ file. Libraries, which can't be read, are skipped.
fn load_materials(obj_path: &Path, libraries: &[String]) -> HashMap<String, MaterialColors> {
    let directory = obj_path.parent().unwrap_or_else(|| Path::new(""));
    let mut materials = HashMap::new();
    for library in libraries {
        let library_path = directory.join(library);
        let file = match File::open(&library_path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Skipping material library {}: {}", library_path.display(), e);
                continue;
            }
        };
        match parse_mtl(BufReader::new(file)) {
            Ok(raw_mtl) => {
                for (name, material) in raw_mtl.materials.iter() {
                    materials.insert(name.clone(), MaterialColors::from_material(material));
                }
            }
            Err(e) => log::warn!("Skipping material library {}: {}", library_path.display(), e),
        }
    }
    return materials;
}

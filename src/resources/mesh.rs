use std::io::{BufReader, Cursor};

use anyhow::bail;
use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::data_structures::model::ModelVertex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshImportOptions {
    /// Uniform scale applied to every imported position.
    pub import_scale: f32,
    /// Keep the normals stored in the file. Normals are generated when this is
    /// off or when the file has none.
    pub import_normals: bool,
}

impl Default for MeshImportOptions {
    fn default() -> Self {
        Self {
            import_scale: 1.0,
            import_normals: true,
        }
    }
}

/// CPU-side triangle mesh. All parts of an imported file are merged into one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Parse Wavefront OBJ text. Material libraries are ignored; the material
    /// is configured on the renderable instead.
    pub fn from_obj(text: &str, options: &MeshImportOptions) -> anyhow::Result<Self> {
        let mut reader = BufReader::new(Cursor::new(text));
        let (models, _) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| Ok((Vec::new(), Default::default())),
        )?;

        let mut mesh = MeshData::default();
        let mut has_normals = true;
        for m in &models {
            let base = mesh.vertices.len() as u32;
            let count = m.mesh.positions.len() / 3;
            has_normals &= m.mesh.normals.len() == count * 3;
            mesh.vertices.extend((0..count).map(|i| ModelVertex {
                position: [
                    m.mesh.positions[i * 3],
                    m.mesh.positions[i * 3 + 1],
                    m.mesh.positions[i * 3 + 2],
                ],
                tex_coords: [
                    m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
                normal: [
                    m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
            }));
            mesh.indices.extend(m.mesh.indices.iter().map(|i| base + i));
        }

        mesh.finish(options, has_normals)
    }

    /// Collect every mesh primitive reachable from the document's scenes, with
    /// node transforms baked into the vertices.
    pub fn from_gltf(
        document: &gltf::Document,
        buffers: &[Vec<u8>],
        options: &MeshImportOptions,
    ) -> anyhow::Result<Self> {
        let mut mesh = MeshData::default();
        let mut has_normals = true;
        for scene in document.scenes() {
            for node in scene.nodes() {
                append_gltf_node(
                    &mut mesh,
                    &mut has_normals,
                    &node,
                    Matrix4::identity(),
                    buffers,
                );
            }
        }
        mesh.finish(options, has_normals)
    }

    /// A unit cube centred on the origin with per-face normals and UVs.
    pub fn cube() -> Self {
        // (normal, up) per face; right = up x normal
        let faces: [([f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let mut mesh = MeshData::default();
        for (normal, up) in faces {
            let n = Vector3::from(normal);
            let u = Vector3::from(up);
            let r = u.cross(n);
            let base = mesh.vertices.len() as u32;
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
            for (x, y) in corners {
                let p = (n + r * x + u * y) * 0.5;
                mesh.vertices.push(ModelVertex {
                    position: p.into(),
                    tex_coords: [(x + 1.0) * 0.5, (1.0 - y) * 0.5],
                    normal,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Check that the data describes whole triangles with in-range indices.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            bail!("mesh has no geometry");
        }
        if self.indices.len() % 3 != 0 {
            bail!(
                "index count {} is not a multiple of three",
                self.indices.len()
            );
        }
        let vertex_count = self.vertices.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            bail!("index {} out of range for {} vertices", bad, vertex_count);
        }
        Ok(())
    }

    /// Smooth vertex normals from area-weighted face normals.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vector3::zero(); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vector3::from(self.vertices[a].position);
            let p1 = Vector3::from(self.vertices[b].position);
            let p2 = Vector3::from(self.vertices[c].position);
            // The cross product length is twice the triangle area
            let face = (p1 - p0).cross(p2 - p0);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, n) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }

    fn finish(mut self, options: &MeshImportOptions, has_normals: bool) -> anyhow::Result<Self> {
        self.validate()?;
        if options.import_scale != 1.0 {
            for v in &mut self.vertices {
                v.position = (Vector3::from(v.position) * options.import_scale).into();
            }
        }
        if !options.import_normals || !has_normals {
            self.compute_normals();
        }
        Ok(self)
    }
}

fn append_gltf_node(
    mesh: &mut MeshData,
    has_normals: &mut bool,
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(gltf_mesh) = node.mesh() {
        let normal_matrix = normal_matrix(&world);
        for primitive in gltf_mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                log::warn!(
                    "Skipping primitive {} of mesh {:?}: it has no positions",
                    primitive.index(),
                    gltf_mesh.name()
                );
                continue;
            };
            let base = mesh.vertices.len() as u32;
            let start = mesh.vertices.len();
            mesh.vertices.extend(positions.map(|p| {
                let p = world * Vector4::new(p[0], p[1], p[2], 1.0);
                ModelVertex {
                    position: [p.x, p.y, p.z],
                    ..Default::default()
                }
            }));
            match reader.read_normals() {
                Some(normals) => normals
                    .zip(&mut mesh.vertices[start..])
                    .for_each(|(n, v)| v.normal = transform_normal(&normal_matrix, n)),
                None => *has_normals = false,
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
                tex_coords
                    .zip(&mut mesh.vertices[start..])
                    .for_each(|(uv, v)| v.tex_coords = uv);
            }
            match reader.read_indices() {
                Some(indices) => mesh.indices.extend(indices.into_u32().map(|i| base + i)),
                None => mesh.indices.extend(base..mesh.vertices.len() as u32),
            }
        }
    }
    for child in node.children() {
        append_gltf_node(mesh, has_normals, &child, world, buffers);
    }
}

/// Normals stay unit length under scaled node transforms.
fn transform_normal(normal_matrix: &Matrix3<f32>, normal: [f32; 3]) -> [f32; 3] {
    let n = normal_matrix * Vector3::from(normal);
    if n.magnitude2() > 0.0 { n.normalize().into() } else { n.into() }
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

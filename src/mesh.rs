//! Mesh geometry and GPU buffers.
//!
//! - [`Vertex3d`]: position and normal, the layout every scene pipeline reads
//! - [`MeshData`]: CPU-side vertices and indices, plus built-in generators
//! - [`Mesh`]: GPU-resident vertex buffers and a list of [`Submesh`]es
//! - [`MeshLibrary`]: owns meshes and hands out [`MeshId`] handles for nodes
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |

use crate::gpu::GpuContext;

/// A vertex with model-space position and normal (24 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type (buffer slot 0).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Geometry held in CPU memory, ready to upload.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    /// Triangle list indices, counter-clockwise when seen from outside.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A UV sphere centred on the origin.
    ///
    /// Produces `(segments + 1) × (rings + 1)` vertices and `segments × rings × 2`
    /// triangles. The seam column is duplicated so every ring closes.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(Vertex3d::new(
                    [x * radius, y * radius, z * radius],
                    [x, y, z],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self { vertices, indices }
    }
}

/// A vertex buffer bound at a byte offset.
#[derive(Clone, Debug)]
pub struct VertexBufferBinding {
    pub buffer: wgpu::Buffer,
    pub offset: u64,
}

/// One indexed draw within a mesh.
#[derive(Clone, Debug)]
pub struct Submesh {
    pub topology: wgpu::PrimitiveTopology,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
    pub index_buffer: wgpu::Buffer,
    /// Byte offset of the first index in `index_buffer`.
    pub index_offset: u64,
}

/// GPU-resident geometry: vertex buffers bound to consecutive slots from 0, and
/// one indexed draw per submesh.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertex_buffers: Vec<VertexBufferBinding>,
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    /// Assemble a mesh from buffers uploaded elsewhere.
    pub fn with_submeshes(vertex_buffers: Vec<VertexBufferBinding>, submeshes: Vec<Submesh>) -> Self {
        Self {
            vertex_buffers,
            submeshes,
        }
    }

    /// Upload a triangle list as a single-submesh mesh with `u32` indices.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self::with_submeshes(
            vec![VertexBufferBinding {
                buffer: vertex_buffer,
                offset: 0,
            }],
            vec![Submesh {
                topology: wgpu::PrimitiveTopology::TriangleList,
                index_count: indices.len() as u32,
                index_format: wgpu::IndexFormat::Uint32,
                index_buffer,
                index_offset: 0,
            }],
        )
    }

    pub fn from_data(gpu: &GpuContext, data: &MeshData) -> Self {
        Self::new(gpu, &data.vertices, &data.indices)
    }
}

/// Type-safe handle to a mesh stored in a [`MeshLibrary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Storage for the meshes nodes refer to.
///
/// Meshes live until the library is dropped; many nodes may share one.
#[derive(Debug)]
pub struct MeshLibrary<M = Mesh> {
    meshes: Vec<M>,
}

impl<M> Default for MeshLibrary<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> MeshLibrary<M> {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    /// Registers a mesh and returns its handle.
    pub fn add_mesh(&mut self, mesh: M) -> MeshId {
        let idx = self.meshes.len();
        self.meshes.push(mesh);
        MeshId(idx)
    }

    pub fn get(&self, id: MeshId) -> Option<&M> {
        self.meshes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 24);
        assert_eq!(Vertex3d::LAYOUT.array_stride, 24);
    }

    #[test]
    fn sphere_counts() {
        let data = MeshData::sphere(1.0, 20, 20);
        assert_eq!(data.vertices.len(), 21 * 21);
        assert_eq!(data.indices.len(), 20 * 20 * 6);
        let max = *data.indices.iter().max().unwrap() as usize;
        assert!(max < data.vertices.len());
    }

    #[test]
    fn sphere_vertices_lie_on_surface() {
        let data = MeshData::sphere(2.0, 8, 6);
        for vertex in &data.vertices {
            let position = Vec3::from_array(vertex.position);
            assert_abs_diff_eq!(position.length(), 2.0, epsilon = 1e-5);
            assert_abs_diff_eq!(Vec3::from_array(vertex.normal).length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let data = MeshData::sphere(1.0, 12, 8);
        for tri in data.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(data.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            // Pole triangles collapse to a point; skip them.
            if normal.length() < 1e-6 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn library_hands_out_distinct_ids() {
        let mut library = MeshLibrary::new();
        let a = library.add_mesh("sphere");
        let b = library.add_mesh("cube");
        assert_ne!(a, b);
        assert_eq!(library.get(b), Some(&"cube"));
        assert_eq!(library.len(), 2);
        assert!(library.get(MeshId(7)).is_none());
    }
}

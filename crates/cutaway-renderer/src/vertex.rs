//! Vertex format shared with the host's pipelines.

use bytemuck::{Pod, Zeroable};
use cutaway_core::MeshData;

/// Vertex for mesh rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in local space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// Vertex color (RGBA).
    pub color: [f32; 4],
}

impl MeshVertex {
    /// Returns the vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
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
                // color
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }

    /// Flattens mesh data into vertices with a uniform color.
    pub fn from_mesh(mesh: &MeshData, color: [f32; 4]) -> Vec<MeshVertex> {
        mesh.positions
            .iter()
            .enumerate()
            .map(|(i, position)| MeshVertex {
                position: *position,
                normal: mesh.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                color,
            })
            .collect()
    }
}

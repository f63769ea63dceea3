//! Scene node definition.

use cutaway_core::{BoundingBox, Transform};
use glam::Mat4;
use uuid::Uuid;

use crate::resources::{MaterialHandle, MeshHandle};

/// A renderable mesh leaf.
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Handle to geometry stored in the MeshManager.
    pub mesh: MeshHandle,
    /// Material slots; slot 0 is the primary material.
    pub materials: Vec<MaterialHandle>,
    /// CSG-authoring input flag. Brush meshes are never capped.
    pub brush: bool,
    /// Local-space bounds of the geometry.
    pub bounds: BoundingBox,
}

/// What a node contributes to rendering.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure grouping/transform node.
    Group,
    /// Renderable mesh leaf.
    Mesh(MeshNode),
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: Uuid,
    /// Debug name, surfaced in log output.
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Transform,
    /// World transform, valid after [`super::Scene::update_world_transforms`].
    pub world_transform: Mat4,
    /// Draw ordering key (lower = drawn first).
    pub render_order: f32,
    /// Whether this node is drawn.
    pub visible: bool,
    /// The host must clear the stencil buffer right after drawing this node.
    pub clear_stencil_after: bool,
    pub kind: NodeKind,
}

impl Node {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            transform: Transform::IDENTITY,
            world_transform: Mat4::IDENTITY,
            render_order: 0.0,
            visible: true,
            clear_stencil_after: false,
            kind,
        }
    }

    /// Creates a grouping node.
    pub fn group(name: &str) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Creates a mesh leaf.
    pub fn mesh(name: &str, mesh: MeshHandle, materials: Vec<MaterialHandle>) -> Self {
        Self::new(
            name,
            NodeKind::Mesh(MeshNode {
                mesh,
                materials,
                brush: false,
                bounds: BoundingBox::empty(),
            }),
        )
    }

    /// Sets the local transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the draw ordering key.
    pub fn with_render_order(mut self, order: f32) -> Self {
        self.render_order = order;
        self
    }

    /// Tags a mesh leaf as a CSG brush.
    pub fn as_brush(mut self) -> Self {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            mesh.brush = true;
        }
        self
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn mesh_node(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn mesh_node_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

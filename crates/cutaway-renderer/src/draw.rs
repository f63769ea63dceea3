//! Ordered draw-list emission.

use glam::Mat4;
use uuid::Uuid;

use crate::resources::{MaterialHandle, MeshHandle};
use crate::scene::{NodeKind, Scene};

/// One draw of a mesh leaf with a single material.
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand {
    pub node: Uuid,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub world: Mat4,
    /// Draw ordering key; commands are sorted ascending.
    pub order: f32,
    /// The host must clear the stencil buffer right after this draw, so
    /// one mesh's cap mask never bleeds into the next mesh's cap.
    pub clear_stencil_after: bool,
}

/// Collects visible mesh leaves under `root` into an ordered draw list.
///
/// Multi-material leaves emit one command per slot, in slot order. The
/// sort is stable, so equal-order commands keep traversal order (content
/// before stencil passes before caps within a cutter's wrapper group).
/// World transforms must be up to date.
pub fn build_draw_list(scene: &Scene, root: Uuid) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    scene.visit_subtree(root, &mut |node| {
        if !node.visible {
            return;
        }
        if let NodeKind::Mesh(mesh) = &node.kind {
            for &material in &mesh.materials {
                commands.push(DrawCommand {
                    node: node.id,
                    mesh: mesh.mesh,
                    material,
                    world: node.world_transform,
                    order: node.render_order,
                    clear_stencil_after: node.clear_stencil_after,
                });
            }
        }
    });
    commands.sort_by(|a, b| a.order.total_cmp(&b.order));
    commands
}

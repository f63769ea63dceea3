//! The mesh preparation pass.
//!
//! Scans the content subtree for qualifying mesh leaves, installs the
//! shared cutting plane into their materials, and derives one cap
//! material per mesh. The pass is not incremental: it re-runs as a whole
//! whenever content changes, and the cutter disposes the previous pass's
//! resources first.

use cutaway_core::{BoundingBox, SharedPlane, Transform};
use uuid::Uuid;

use crate::resources::{
    CompareFunction, Material, MaterialHandle, MaterialManager, MeshHandle, MeshManager, Side,
    StencilOp, StencilSettings,
};
use crate::scene::{NodeKind, Scene};

use super::stencil::StencilGroup;

/// Cap quad side length used when the content subtree is empty or absent.
pub const DEFAULT_QUAD_SIZE: f32 = 10.0;

/// Output of one preparation pass. Entries at the same index belong to
/// the same qualifying mesh.
#[derive(Debug)]
pub struct PreparedState {
    /// Qualifying mesh node ids, in traversal order.
    pub meshes: Vec<Uuid>,
    /// One derived cap material per qualifying mesh.
    pub cap_materials: Vec<MaterialHandle>,
    /// One stencil pass pair per qualifying mesh.
    pub stencil_groups: Vec<StencilGroup>,
    /// One cap quad node per qualifying mesh.
    pub cap_quads: Vec<Uuid>,
    /// Quad geometry shared by all caps of this pass.
    pub quad_mesh: Option<MeshHandle>,
    /// Side length of the cap quads.
    pub quad_size: f32,
}

impl Default for PreparedState {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            cap_materials: Vec::new(),
            stencil_groups: Vec::new(),
            cap_quads: Vec::new(),
            quad_mesh: None,
            quad_size: DEFAULT_QUAD_SIZE,
        }
    }
}

/// A qualifying mesh with everything the cap build step needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub id: Uuid,
    pub geometry: MeshHandle,
    pub cap_material: MaterialHandle,
    /// World transform captured at preparation time.
    pub transform: Transform,
}

/// Collects qualifying mesh leaves under `root`: mesh nodes with at least
/// one material slot that are not brush-tagged.
pub(crate) fn collect_qualifying(scene: &Scene, root: Uuid) -> Vec<Uuid> {
    let mut out = Vec::new();
    scene.visit_subtree(root, &mut |node| {
        if let NodeKind::Mesh(mesh) = &node.kind
            && !mesh.materials.is_empty()
            && !mesh.brush
        {
            out.push(node.id);
        }
    });
    out
}

/// Installs the shared plane as the only clipping plane of every material
/// slot and forces double-sided rendering, so both faces of the clipped
/// geometry stay visible through the cut.
pub(crate) fn decorate_materials(
    materials: &mut MaterialManager,
    slots: &[MaterialHandle],
    plane: &SharedPlane,
) {
    for &slot in slots {
        if let Some(material) = materials.get_mut(slot) {
            material.clip_planes = vec![plane.clone()];
            material.side = Side::Double;
        }
    }
}

/// Clones a content material into the material the cap quad draws with.
///
/// The cap must not be clipped away itself, and it draws only where the
/// stencil value deviates from zero, i.e. inside the cross-section
/// silhouette carved by the stencil passes. Multi-material meshes derive
/// their cap from slot 0 only; caps for the remaining slots are a known
/// gap.
pub(crate) fn derive_cap_material(source: &Material) -> Material {
    let mut cap = source.clone();
    cap.clip_planes.clear();
    cap.side = Side::Double;
    cap.stencil = StencilSettings::uniform(CompareFunction::NotEqual, StencilOp::Replace);
    cap
}

/// Recomputes and stores a mesh leaf's local bounds from its geometry.
/// Cheap and idempotent; missing geometry leaves the bounds untouched.
pub(crate) fn refresh_mesh_bounds(scene: &mut Scene, meshes: &MeshManager, mesh_id: Uuid) {
    let Some(handle) = scene
        .get_node(mesh_id)
        .and_then(|node| node.mesh_node())
        .map(|mesh| mesh.mesh)
    else {
        return;
    };
    let Some(bounds) = meshes.get(handle).map(|data| data.compute_bounds()) else {
        return;
    };
    if let Some(mesh) = scene.get_node_mut(mesh_id).and_then(|n| n.mesh_node_mut()) {
        mesh.bounds = bounds;
    }
}

/// Cap quad side length for the given content bounds: twice the bounding
/// diagonal, oversized so the quad covers the cross-section at any cut
/// angle.
pub(crate) fn quad_size_for(bounds: &BoundingBox) -> f32 {
    if bounds.is_empty() {
        DEFAULT_QUAD_SIZE
    } else {
        2.0 * bounds.diagonal()
    }
}

//! Stencil pass construction for one qualifying mesh.
//!
//! Each qualifying mesh gets two invisible passes over its own geometry,
//! clipped by the cutting plane: the front-face pass decrements the
//! stencil value per fragment, the back-face pass increments it. For a
//! closed mesh the two cancel everywhere except across the cut opening,
//! where one extra back face is visible, leaving a non-zero stencil value
//! exactly inside the cross-section silhouette. The cap material's
//! not-equal-to-zero test then paints exactly that region.

use cutaway_core::{SharedPlane, Transform};
use uuid::Uuid;

use crate::resources::{
    CompareFunction, Material, MaterialHandle, MaterialManager, Side, StencilOp, StencilSettings,
};
use crate::scene::{Node, Scene};

use super::prepare::Candidate;

/// The per-mesh stencil pass pair, as mounted in the scene.
#[derive(Debug, Clone)]
pub struct StencilGroup {
    /// Wrapping group node carrying the captured transform.
    pub group: Uuid,
    /// Front-face pass node.
    pub front: Uuid,
    /// Back-face pass node.
    pub back: Uuid,
    pub front_material: MaterialHandle,
    pub back_material: MaterialHandle,
    /// World transform of the source mesh at capture time.
    pub transform: Transform,
}

fn pass_material(plane: &SharedPlane, side: Side, op: StencilOp) -> Material {
    Material {
        color: [0.0, 0.0, 0.0, 1.0],
        side,
        depth_write: false,
        depth_test: false,
        color_write: false,
        clip_planes: vec![plane.clone()],
        stencil: StencilSettings::uniform(CompareFunction::Always, op),
    }
}

/// Material for the front-face stencil pass: decrement on every outcome,
/// no color or depth output.
pub fn front_pass_material(plane: &SharedPlane) -> Material {
    pass_material(plane, Side::Front, StencilOp::DecrementWrap)
}

/// Material for the back-face stencil pass: increment on every outcome,
/// no color or depth output.
pub fn back_pass_material(plane: &SharedPlane) -> Material {
    pass_material(plane, Side::Back, StencilOp::IncrementWrap)
}

/// Mounts the stencil group for one candidate mesh under `parent`.
///
/// The captured world transform goes on the wrapping group, not on the
/// pass meshes, so both passes (and anything added to the group later)
/// stay rigidly coupled to the mesh's placement.
pub(crate) fn build_stencil_group(
    scene: &mut Scene,
    materials: &mut MaterialManager,
    parent: Uuid,
    candidate: &Candidate,
    plane: &SharedPlane,
    order: f32,
) -> StencilGroup {
    let front_material = materials.create(front_pass_material(plane));
    let back_material = materials.create(back_pass_material(plane));

    let group = scene.add_child(
        parent,
        Node::group("stencil-group").with_transform(candidate.transform),
    );
    let front = scene.add_child(
        group,
        Node::mesh("stencil-front", candidate.geometry, vec![front_material])
            .with_render_order(order),
    );
    let back = scene.add_child(
        group,
        Node::mesh("stencil-back", candidate.geometry, vec![back_material])
            .with_render_order(order),
    );

    StencilGroup {
        group,
        front,
        back,
        front_material,
        back_material,
        transform: candidate.transform,
    }
}

//! Cutaway renderer
//!
//! Cross-section rendering of 3D meshes against a cutting plane: meshes
//! intersected by the plane are clipped, and the open cross-section is
//! visually capped through a two-pass stencil technique, so models do not
//! appear hollow.
//!
//! # Architecture
//!
//! - [`scene::Scene`] - host-owned scene graph with content versioning
//! - [`resources::MaterialManager`] / [`resources::MeshManager`] -
//!   handle-based resource storage
//! - [`cutter::PlaneCutter`] - mesh preparation, stencil groups, cap quads
//!   and per-frame plane alignment
//! - [`pipeline`] - material state to wgpu descriptor translation
//! - [`draw`] - ordered draw-list emission for the host's render pass
//!
//! # Example
//!
//! ```ignore
//! use cutaway_core::{Plane, SharedPlane};
//! use cutaway_renderer::{PlaneCutter, build_draw_list};
//!
//! let plane = SharedPlane::new(Plane::new(glam::Vec3::Y, 0.0)?);
//! let mut cutter = PlaneCutter::attach(&mut scene, Some(model_root), plane.clone());
//!
//! // Each frame, after applying host-side scene edits:
//! cutter.update(&mut scene, &mut materials, &mut meshes);
//! cutter.align_caps(&mut scene);
//! scene.update_world_transforms();
//! let draws = build_draw_list(&scene, cutter.wrapper());
//! ```

pub mod cutter;
pub mod draw;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod vertex;

// Re-exports for convenience
pub use cutter::{DEFAULT_QUAD_SIZE, PlaneCutter, PreparedState, StencilGroup};
pub use draw::{DrawCommand, build_draw_list};
pub use resources::{
    CompareFunction, Material, MaterialHandle, MaterialManager, MeshHandle, MeshManager, Side,
    StencilOp, StencilSettings,
};
pub use scene::{MeshNode, Node, NodeKind, Scene};
pub use vertex::MeshVertex;

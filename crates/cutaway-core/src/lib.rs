//! Core math and geometry types for the cutaway cross-section renderer.
//!
//! This crate holds the data-level vocabulary shared between a host
//! application and the renderer crate:
//!
//! - [`plane::Plane`] / [`plane::SharedPlane`] - the cutting plane and the
//!   shared handle the caller animates
//! - [`bounds::BoundingBox`] - axis-aligned bounds with union and transform
//! - [`transform::Transform`] - decomposed translation/rotation/scale
//! - [`mesh::MeshData`] - CPU-side triangle geometry and primitive shapes

pub mod bounds;
pub mod mesh;
pub mod plane;
pub mod transform;

pub use bounds::BoundingBox;
pub use mesh::{MeshData, MeshError};
pub use plane::{Plane, PlaneError, SharedPlane};
pub use transform::Transform;

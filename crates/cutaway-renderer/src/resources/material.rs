//! Material state and material resource management.
//!
//! Materials are declarative: they carry the clipping and stencil state the
//! host feeds into its pipelines (see [`crate::pipeline`]) rather than GPU
//! objects. The cutter derives and owns materials through the manager, so
//! removal is disposal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use cutaway_core::SharedPlane;
use serde::{Deserialize, Serialize};

/// Which triangle faces a material renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Back,
    /// Render both faces. Required for clipped geometry, where back faces
    /// become visible through the cut.
    Double,
}

/// Stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

/// Stencil buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Stencil state of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StencilSettings {
    /// Whether stencil testing and writing are enabled at all.
    pub write: bool,
    /// Reference value compared against the buffer.
    pub reference: u32,
    pub compare: CompareFunction,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl StencilSettings {
    /// Stencil state with reference 0 and the same operation on every
    /// outcome.
    pub fn uniform(compare: CompareFunction, op: StencilOp) -> Self {
        Self {
            write: true,
            reference: 0,
            compare,
            fail_op: op,
            depth_fail_op: op,
            pass_op: op,
        }
    }
}

/// Declarative material state consumed by the host renderer.
#[derive(Debug, Clone)]
pub struct Material {
    /// Base color (RGBA).
    pub color: [f32; 4],
    pub side: Side,
    pub depth_write: bool,
    pub depth_test: bool,
    pub color_write: bool,
    /// Clipping planes applied to fragments; empty means unclipped.
    pub clip_planes: Vec<SharedPlane>,
    pub stencil: StencilSettings,
}

impl Material {
    /// Creates an opaque single-sided material with the given color.
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            side: Side::Front,
            depth_write: true,
            depth_test: true,
            color_write: true,
            clip_planes: Vec::new(),
            stencil: StencilSettings::default(),
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new([0.8, 0.8, 0.8, 1.0])
    }
}

/// Handle to a material stored in the MaterialManager.
///
/// Handles are lightweight and can be copied freely.
/// The actual material data is stored in the MaterialManager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialHandle(u64);

impl MaterialHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Creates a handle from a raw value (for deserialization).
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

/// Manager for material resources.
///
/// Removal releases the material; the cutter relies on this to dispose
/// superseded cap and stencil-pass materials exactly once.
pub struct MaterialManager {
    materials: HashMap<MaterialHandle, Material>,
    next_handle: AtomicU64,
}

impl MaterialManager {
    /// Creates a new material manager.
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Stores a material and returns a handle.
    pub fn create(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.materials.insert(handle, material);
        handle
    }

    /// Gets a material by handle.
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    /// Gets a mutable reference to a material by handle.
    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(&handle)
    }

    /// Removes a material from the manager, releasing it.
    pub fn remove(&mut self, handle: MaterialHandle) -> Option<Material> {
        self.materials.remove(&handle)
    }

    /// Returns true if the manager contains a material with the given
    /// handle.
    pub fn contains(&self, handle: MaterialHandle) -> bool {
        self.materials.contains_key(&handle)
    }

    /// Returns the number of materials in the manager.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if the manager is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Clears all materials from the manager.
    pub fn clear(&mut self) {
        self.materials.clear();
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

//! Mesh resource management.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use cutaway_core::MeshData;

/// Handle to a mesh stored in the MeshManager.
///
/// Handles are lightweight and can be copied freely.
/// The actual mesh data is stored in the MeshManager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshHandle(u64);

impl MeshHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Creates a handle from a raw value (for deserialization).
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

/// Manager for mesh geometry.
///
/// Provides handle-based access to mesh data, enabling resource sharing
/// between scene nodes. The manager stores the CPU source of truth; GPU
/// upload is the host's concern, keyed by the same handles.
pub struct MeshManager {
    meshes: HashMap<MeshHandle, MeshData>,
    next_handle: AtomicU64,
}

impl MeshManager {
    /// Creates a new mesh manager.
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Stores mesh data and returns a handle.
    pub fn create(&mut self, data: MeshData) -> MeshHandle {
        let handle = MeshHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.meshes.insert(handle, data);
        handle
    }

    /// Gets a mesh by handle.
    pub fn get(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(&handle)
    }

    /// Mutable mesh access, e.g. for in-place geometry edits. The scene
    /// version cannot observe these; the cutter's refresh covers them.
    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut MeshData> {
        self.meshes.get_mut(&handle)
    }

    /// Removes a mesh from the manager, releasing its data.
    pub fn remove(&mut self, handle: MeshHandle) -> Option<MeshData> {
        self.meshes.remove(&handle)
    }

    /// Returns true if the manager contains a mesh with the given handle.
    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    /// Returns the number of meshes in the manager.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if the manager is empty.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Clears all meshes from the manager.
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

impl Default for MeshManager {
    fn default() -> Self {
        Self::new()
    }
}

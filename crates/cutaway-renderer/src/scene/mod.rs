//! Scene graph for host-owned content.
//!
//! The scene is the single source of truth for node state. Structure and
//! content changes bump a monotonic version counter, which the cutter uses
//! to decide when a preparation pass must re-run; pure spatial animation
//! goes through [`Scene::set_transform`] and deliberately does not.

mod node;

pub use node::*;

use std::collections::HashMap;

use cutaway_core::{BoundingBox, Transform};
use glam::Mat4;
use uuid::Uuid;

/// Hierarchical scene of grouping nodes and mesh leaves.
pub struct Scene {
    nodes: HashMap<Uuid, Node>,
    parent: HashMap<Uuid, Uuid>,
    children: HashMap<Uuid, Vec<Uuid>>,
    version: u64,
}

impl Scene {
    /// Creates a new empty scene.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            parent: HashMap::new(),
            children: HashMap::new(),
            version: 0,
        }
    }

    /// Content version, bumped by every structural or content mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// Adds a root-level node.
    pub fn add_node(&mut self, node: Node) -> Uuid {
        let id = node.id;
        self.nodes.insert(id, node);
        self.touch();
        id
    }

    /// Adds a node under `parent`. A missing parent degrades to a root add.
    pub fn add_child(&mut self, parent: Uuid, node: Node) -> Uuid {
        let id = self.add_node(node);
        if self.nodes.contains_key(&parent) {
            self.parent.insert(id, parent);
            self.children.entry(parent).or_default().push(id);
        }
        id
    }

    /// Re-parents a node, keeping its local transform. `None` makes it a
    /// root node.
    pub fn set_parent(&mut self, id: Uuid, new_parent: Option<Uuid>) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        if let Some(old) = self.parent.remove(&id)
            && let Some(siblings) = self.children.get_mut(&old)
        {
            siblings.retain(|c| *c != id);
        }
        if let Some(parent) = new_parent
            && self.nodes.contains_key(&parent)
        {
            self.parent.insert(id, parent);
            self.children.entry(parent).or_default().push(id);
        }
        self.touch();
    }

    /// Removes a node and all of its descendants. Returns the number of
    /// nodes removed; an unknown id removes nothing.
    pub fn remove_subtree(&mut self, root: Uuid) -> usize {
        let mut ids = Vec::new();
        self.visit_subtree(root, &mut |node| ids.push(node.id));
        for id in &ids {
            self.nodes.remove(id);
            self.children.remove(id);
            if let Some(parent) = self.parent.remove(id)
                && let Some(siblings) = self.children.get_mut(&parent)
            {
                siblings.retain(|c| c != id);
            }
        }
        if !ids.is_empty() {
            self.touch();
        }
        ids.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get_node(&self, id: Uuid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable node access; counts as a content change.
    pub fn get_node_mut(&mut self, id: Uuid) -> Option<&mut Node> {
        self.touch();
        self.nodes.get_mut(&id)
    }

    /// Updates a node's local transform without bumping the content
    /// version. Spatial animation (including per-frame cap alignment) must
    /// not re-trigger mesh preparation; stencil transform capture follows
    /// on the next content change or an explicit refresh.
    pub fn set_transform(&mut self, id: Uuid, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform = transform;
        }
    }

    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.parent.get(&id).copied()
    }

    pub fn children_of(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order traversal of the subtree rooted at `root`; an unknown
    /// root visits nothing.
    pub fn visit_subtree(&self, root: Uuid, visitor: &mut impl FnMut(&Node)) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            visitor(node);
            if let Some(children) = self.children.get(&id) {
                // Reversed so the stack pops children in insertion order.
                for &child in children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }

    /// Recomputes world transforms for every node from the hierarchy.
    pub fn update_world_transforms(&mut self) {
        let roots: Vec<Uuid> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| !self.parent.contains_key(id))
            .collect();
        for root in roots {
            self.update_transform_recursive(root, Mat4::IDENTITY);
        }
    }

    fn update_transform_recursive(&mut self, id: Uuid, parent_transform: Mat4) {
        let world = match self.nodes.get_mut(&id) {
            Some(node) => {
                node.world_transform = parent_transform * node.transform.to_mat4();
                node.world_transform
            }
            None => return,
        };
        // Clone child ids first to avoid holding a borrow across recursion.
        let children: Vec<Uuid> = self.children.get(&id).cloned().unwrap_or_default();
        for child in children {
            self.update_transform_recursive(child, world);
        }
    }

    /// Union world-space bounds of visible mesh leaves under `root`.
    ///
    /// World transforms must be up to date.
    pub fn subtree_bounds(&self, root: Uuid) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        self.visit_subtree(root, &mut |node| {
            if !node.visible {
                return;
            }
            if let NodeKind::Mesh(mesh) = &node.kind {
                bounds = bounds.union(&mesh.bounds.transform(&node.world_transform));
            }
        });
        bounds
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{MaterialHandle, MeshHandle};
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn mesh_leaf(name: &str) -> Node {
        Node::mesh(name, MeshHandle::default(), vec![MaterialHandle::default()])
    }

    #[test]
    fn test_hierarchy_world_transforms() {
        let mut scene = Scene::new();
        let root = scene.add_node(
            Node::group("root").with_transform(Transform::from_translation(Vec3::X * 2.0)),
        );
        let child = scene.add_child(
            root,
            mesh_leaf("child").with_transform(Transform::from_translation(Vec3::Y * 3.0)),
        );

        scene.update_world_transforms();

        let world = scene.get_node(child).unwrap().world_transform;
        let position = world.transform_point3(Vec3::ZERO);
        assert_relative_eq!((position - Vec3::new(2.0, 3.0, 0.0)).length(), 0.0);
    }

    #[test]
    fn test_version_bumps_on_structure() {
        let mut scene = Scene::new();
        let before = scene.version();
        let id = scene.add_node(Node::group("a"));
        assert!(scene.version() > before);

        let before = scene.version();
        scene.remove_subtree(id);
        assert!(scene.version() > before);
    }

    #[test]
    fn test_set_transform_does_not_bump_version() {
        let mut scene = Scene::new();
        let id = scene.add_node(Node::group("a"));
        let before = scene.version();
        scene.set_transform(id, Transform::from_translation(Vec3::ONE));
        assert_eq!(scene.version(), before);
        assert_relative_eq!(
            scene.get_node(id).unwrap().transform.translation.x,
            1.0
        );
    }

    #[test]
    fn test_remove_subtree_removes_descendants() {
        let mut scene = Scene::new();
        let root = scene.add_node(Node::group("root"));
        let mid = scene.add_child(root, Node::group("mid"));
        let leaf = scene.add_child(mid, mesh_leaf("leaf"));

        assert_eq!(scene.remove_subtree(mid), 2);
        assert!(scene.contains(root));
        assert!(!scene.contains(mid));
        assert!(!scene.contains(leaf));
        assert!(scene.children_of(root).is_empty());
    }

    #[test]
    fn test_reparent() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::group("a"));
        let b = scene.add_node(Node::group("b"));
        let leaf = scene.add_child(a, mesh_leaf("leaf"));

        scene.set_parent(leaf, Some(b));
        assert_eq!(scene.parent_of(leaf), Some(b));
        assert!(scene.children_of(a).is_empty());
        assert_eq!(scene.children_of(b), &[leaf]);

        scene.set_parent(leaf, None);
        assert_eq!(scene.parent_of(leaf), None);
    }

    #[test]
    fn test_subtree_bounds_unions_leaves() {
        let mut scene = Scene::new();
        let root = scene.add_node(Node::group("root"));
        let mut left = mesh_leaf("left");
        left.mesh_node_mut().unwrap().bounds =
            BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let left = left.with_transform(Transform::from_translation(Vec3::X * -2.0));
        let mut right = mesh_leaf("right");
        right.mesh_node_mut().unwrap().bounds =
            BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let right = right.with_transform(Transform::from_translation(Vec3::X * 2.0));
        scene.add_child(root, left);
        scene.add_child(root, right);

        scene.update_world_transforms();
        let bounds = scene.subtree_bounds(root);
        assert_relative_eq!(bounds.min.x, -2.5);
        assert_relative_eq!(bounds.max.x, 2.5);
    }

    #[test]
    fn test_visit_unknown_root_is_noop() {
        let scene = Scene::new();
        let mut visited = 0;
        scene.visit_subtree(Uuid::new_v4(), &mut |_| visited += 1);
        assert_eq!(visited, 0);
    }
}

//! Cross-section capping of plane-clipped meshes.
//!
//! [`PlaneCutter`] wraps an externally built content subtree and makes
//! plane-clipped meshes look solid: every qualifying mesh is clipped by a
//! shared cutting plane, and the open cross-section is covered by a flat
//! cap quad masked through the stencil buffer. No cap geometry is
//! computed from mesh topology; the cap is the stencil trick described in
//! [`stencil`].
//!
//! Lifecycle: [`PlaneCutter::attach`] mounts the output groups,
//! [`PlaneCutter::update`] re-runs mesh preparation when content changed
//! ([`PlaneCutter::refresh`] forces it), [`PlaneCutter::align_caps`] runs
//! once per frame to keep the caps glued to the possibly-moving plane,
//! and [`PlaneCutter::detach`] tears everything down.

mod prepare;
mod stencil;

pub use prepare::{DEFAULT_QUAD_SIZE, PreparedState};
pub use stencil::{StencilGroup, back_pass_material, front_pass_material};

use std::collections::HashMap;

use cutaway_core::{MeshData, SharedPlane, Transform};
use uuid::Uuid;

use crate::resources::{MaterialManager, MeshManager};
use crate::scene::{Node, Scene};

/// Cuts a content subtree against a shared plane and caps the cut.
///
/// The cutter owns every resource it derives (cap materials, stencil-pass
/// materials, the cap quad geometry) and disposes the previous set through
/// the managers on every re-preparation and on detach. The content
/// subtree itself stays caller-owned; the cutter only decorates its
/// materials.
pub struct PlaneCutter {
    plane: SharedPlane,
    content_root: Option<Uuid>,
    /// Parent the content root is restored to on detach.
    original_parent: Option<Uuid>,
    wrapper: Uuid,
    stencil_root: Uuid,
    caps_root: Uuid,
    prepared: PreparedState,
    /// Slot index -> live cap quad node, iterated every frame.
    registry: HashMap<usize, Uuid>,
    /// Scene version of the last preparation pass.
    prepared_version: Option<u64>,
}

impl PlaneCutter {
    /// Mounts a cutter around `content_root`, which is re-parented under a
    /// new wrapper group next to the stencil and cap groups.
    ///
    /// An absent or unknown content root attaches an empty cutter; the
    /// first preparation then yields empty lists and the default quad
    /// size.
    pub fn attach(scene: &mut Scene, content_root: Option<Uuid>, plane: SharedPlane) -> Self {
        let content_root = content_root.filter(|id| {
            let known = scene.contains(*id);
            if !known {
                tracing::warn!(node = %id, "content root not in scene, cutter starts empty");
            }
            known
        });
        let original_parent = content_root.and_then(|id| scene.parent_of(id));

        let wrapper = scene.add_node(Node::group("cutter"));
        if let Some(root) = content_root {
            scene.set_parent(root, Some(wrapper));
        }
        let stencil_root = scene.add_child(wrapper, Node::group("stencil-groups"));
        let caps_root = scene.add_child(wrapper, Node::group("caps"));

        Self {
            plane,
            content_root,
            original_parent,
            wrapper,
            stencil_root,
            caps_root,
            prepared: PreparedState::default(),
            registry: HashMap::new(),
            prepared_version: None,
        }
    }

    /// The shared cutting plane.
    pub fn plane(&self) -> &SharedPlane {
        &self.plane
    }

    /// Root of the cutter's output, the node to draw (see
    /// [`crate::draw::build_draw_list`]).
    pub fn wrapper(&self) -> Uuid {
        self.wrapper
    }

    /// The wrapped content root, if any.
    pub fn content_root(&self) -> Option<Uuid> {
        self.content_root
    }

    /// State of the most recent preparation pass.
    pub fn prepared(&self) -> &PreparedState {
        &self.prepared
    }

    /// Live cap quad node for a slot index, if mounted.
    pub fn cap_node(&self, slot: usize) -> Option<Uuid> {
        self.registry.get(&slot).copied()
    }

    /// Re-runs mesh preparation if scene content changed since the last
    /// pass. Returns true if a pass ran. Spatial animation through
    /// [`Scene::set_transform`] does not count as a change.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        materials: &mut MaterialManager,
        meshes: &mut MeshManager,
    ) -> bool {
        if self.prepared_version == Some(scene.version()) {
            return false;
        }
        self.refresh(scene, materials, meshes);
        true
    }

    /// Runs the preparation pass unconditionally, bypassing change
    /// detection. Use after content mutations the scene version cannot
    /// observe, e.g. in-place geometry edits through the mesh manager.
    pub fn refresh(
        &mut self,
        scene: &mut Scene,
        materials: &mut MaterialManager,
        meshes: &mut MeshManager,
    ) {
        self.dispose_prepared(scene, materials, meshes);
        scene.update_world_transforms();

        let qualifying = match self.content_root {
            Some(root) => prepare::collect_qualifying(scene, root),
            None => Vec::new(),
        };

        // Decorate content materials and derive one cap material per mesh.
        let mut candidates: Vec<prepare::Candidate> = Vec::with_capacity(qualifying.len());
        for &mesh_id in &qualifying {
            prepare::refresh_mesh_bounds(scene, meshes, mesh_id);
            let Some((geometry, slots, world)) = scene.get_node(mesh_id).and_then(|node| {
                let mesh = node.mesh_node()?;
                Some((mesh.mesh, mesh.materials.clone(), node.world_transform))
            }) else {
                continue;
            };
            prepare::decorate_materials(materials, &slots, &self.plane);
            let Some(cap) = slots
                .first()
                .and_then(|&primary| materials.get(primary))
                .map(prepare::derive_cap_material)
            else {
                tracing::warn!(node = %mesh_id, "primary material missing, mesh not capped");
                continue;
            };
            let cap_material = materials.create(cap);
            candidates.push(prepare::Candidate {
                id: mesh_id,
                geometry,
                cap_material,
                transform: Transform::from_mat4(&world),
            });
        }

        // Size the caps from the whole subtree so any cut angle is covered.
        let bounds = self
            .content_root
            .map(|root| scene.subtree_bounds(root))
            .unwrap_or_default();
        let quad_size = prepare::quad_size_for(&bounds);
        let quad_mesh = meshes.create(MeshData::quad(quad_size));

        let plane = self.plane.get();
        let mut state = PreparedState {
            quad_mesh: Some(quad_mesh),
            quad_size,
            ..Default::default()
        };
        for (index, candidate) in candidates.into_iter().enumerate() {
            let order = (index + 1) as f32;
            let group = stencil::build_stencil_group(
                scene,
                materials,
                self.stencil_root,
                &candidate,
                &self.plane,
                order,
            );

            let position = plane.coplanar_point();
            let mut cap_node = Node::mesh("cap", quad_mesh, vec![candidate.cap_material])
                .with_transform(Transform::looking_at(position, position - plane.normal()))
                .with_render_order(order + 0.1);
            cap_node.clear_stencil_after = true;
            let cap_id = scene.add_child(self.caps_root, cap_node);
            self.registry.insert(index, cap_id);

            state.meshes.push(candidate.id);
            state.cap_materials.push(candidate.cap_material);
            state.stencil_groups.push(group);
            state.cap_quads.push(cap_id);
        }

        tracing::debug!(
            meshes = state.meshes.len(),
            quad_size = state.quad_size,
            "prepared cross-section caps"
        );
        self.prepared = state;
        self.prepared_version = Some(scene.version());
    }

    /// Per-frame step: keeps every live cap quad coplanar with and facing
    /// against the cutting plane.
    ///
    /// Each quad moves to the coplanar point nearest its current position
    /// and aims its +Z axis away from the plane normal. Runs in the host's
    /// frame callback; moving the plane alone never requires a
    /// re-preparation. Registry entries without a live node are skipped.
    pub fn align_caps(&self, scene: &mut Scene) {
        let plane = self.plane.get();
        for (&slot, &node_id) in &self.registry {
            let Some(node) = scene.get_node(node_id) else {
                tracing::trace!(slot, "cap node not mounted, skipped");
                continue;
            };
            let position = plane.project_point(node.transform.translation);
            scene.set_transform(node_id, Transform::looking_at(position, position - plane.normal()));
        }
    }

    /// Disposes the previous pass's resources and unmounts its nodes.
    /// Safe to call repeatedly.
    fn dispose_prepared(
        &mut self,
        scene: &mut Scene,
        materials: &mut MaterialManager,
        meshes: &mut MeshManager,
    ) {
        let caps = self.prepared.cap_materials.len();
        for handle in self.prepared.cap_materials.drain(..) {
            materials.remove(handle);
        }
        for group in self.prepared.stencil_groups.drain(..) {
            materials.remove(group.front_material);
            materials.remove(group.back_material);
            scene.remove_subtree(group.group);
        }
        for node in self.prepared.cap_quads.drain(..) {
            scene.remove_subtree(node);
        }
        if let Some(quad) = self.prepared.quad_mesh.take() {
            meshes.remove(quad);
        }
        self.prepared.meshes.clear();
        self.registry.clear();
        if caps > 0 {
            tracing::debug!(cap_materials = caps, "disposed superseded cap resources");
        }
    }

    /// Tears the cutter down: disposes every derived resource, removes the
    /// cutter's nodes, and restores the content root to its original
    /// parent. Idempotent.
    pub fn detach(
        &mut self,
        scene: &mut Scene,
        materials: &mut MaterialManager,
        meshes: &mut MeshManager,
    ) {
        self.dispose_prepared(scene, materials, meshes);
        if let Some(root) = self.content_root.take() {
            let parent = self.original_parent.filter(|p| scene.contains(*p));
            if scene.contains(root) {
                scene.set_parent(root, parent);
            }
        }
        scene.remove_subtree(self.wrapper);
        self.prepared_version = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cutaway_core::{Plane, SharedPlane};
    use glam::Vec3;

    use crate::draw::build_draw_list;
    use crate::resources::{CompareFunction, Material, Side, StencilOp};

    struct Fixture {
        scene: Scene,
        materials: MaterialManager,
        meshes: MeshManager,
        root: Uuid,
        cube: Uuid,
        cube_material: crate::resources::MaterialHandle,
        plane: SharedPlane,
    }

    fn unit_cube_fixture() -> Fixture {
        let mut scene = Scene::new();
        let mut materials = MaterialManager::new();
        let mut meshes = MeshManager::new();

        let cube_mesh = meshes.create(MeshData::cube(1.0));
        let cube_material = materials.create(Material::new([0.2, 0.4, 0.8, 1.0]));
        let root = scene.add_node(Node::group("content"));
        let cube = scene.add_child(root, Node::mesh("cube", cube_mesh, vec![cube_material]));

        Fixture {
            scene,
            materials,
            meshes,
            root,
            cube,
            cube_material,
            plane: SharedPlane::new(Plane::new(Vec3::Y, 0.0).unwrap()),
        }
    }

    fn attach_and_prepare(f: &mut Fixture) -> PlaneCutter {
        let mut cutter = PlaneCutter::attach(&mut f.scene, Some(f.root), f.plane.clone());
        cutter.refresh(&mut f.scene, &mut f.materials, &mut f.meshes);
        cutter
    }

    #[test]
    fn test_qualification_filter() {
        let mut f = unit_cube_fixture();
        let brush_mesh = f.meshes.create(MeshData::cube(2.0));
        let brush_material = f.materials.create(Material::default());
        f.scene.add_child(
            f.root,
            Node::mesh("brush", brush_mesh, vec![brush_material]).as_brush(),
        );
        let bare_mesh = f.meshes.create(MeshData::quad(1.0));
        f.scene
            .add_child(f.root, Node::mesh("no-material", bare_mesh, vec![]));
        f.scene.add_child(f.root, Node::group("plain-group"));

        let cutter = attach_and_prepare(&mut f);
        assert_eq!(cutter.prepared().meshes, vec![f.cube]);
    }

    #[test]
    fn test_count_correlation() {
        let mut f = unit_cube_fixture();
        let second_mesh = f.meshes.create(MeshData::cube(0.5));
        let second_material = f.materials.create(Material::default());
        f.scene
            .add_child(f.root, Node::mesh("second", second_mesh, vec![second_material]));

        let cutter = attach_and_prepare(&mut f);
        let prepared = cutter.prepared();
        assert_eq!(prepared.meshes.len(), 2);
        assert_eq!(prepared.cap_materials.len(), 2);
        assert_eq!(prepared.stencil_groups.len(), 2);
        assert_eq!(prepared.cap_quads.len(), 2);
        assert!(cutter.cap_node(0).is_some());
        assert!(cutter.cap_node(1).is_some());
    }

    #[test]
    fn test_quad_size_from_unit_cube() {
        let mut f = unit_cube_fixture();
        let cutter = attach_and_prepare(&mut f);

        let expected = 2.0 * 3.0_f32.sqrt();
        assert_relative_eq!(cutter.prepared().quad_size, expected, epsilon = 1e-5);

        let quad = cutter.prepared().quad_mesh.unwrap();
        let quad_bounds = f.meshes.get(quad).unwrap().compute_bounds();
        assert_relative_eq!(quad_bounds.size().x, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_content_uses_default_size() {
        let mut scene = Scene::new();
        let mut materials = MaterialManager::new();
        let mut meshes = MeshManager::new();
        let plane = SharedPlane::new(Plane::new(Vec3::Y, 0.0).unwrap());

        let mut cutter = PlaneCutter::attach(&mut scene, None, plane);
        cutter.refresh(&mut scene, &mut materials, &mut meshes);

        assert!(cutter.prepared().meshes.is_empty());
        assert!(cutter.prepared().cap_quads.is_empty());
        assert_relative_eq!(cutter.prepared().quad_size, DEFAULT_QUAD_SIZE);
    }

    #[test]
    fn test_cap_material_derivation_and_decoration() {
        let mut f = unit_cube_fixture();
        let cutter = attach_and_prepare(&mut f);

        let cap = f
            .materials
            .get(cutter.prepared().cap_materials[0])
            .unwrap();
        assert!(cap.clip_planes.is_empty());
        assert_eq!(cap.side, Side::Double);
        assert!(cap.stencil.write);
        assert_eq!(cap.stencil.reference, 0);
        assert_eq!(cap.stencil.compare, CompareFunction::NotEqual);
        assert_eq!(cap.stencil.fail_op, StencilOp::Replace);
        assert_eq!(cap.stencil.depth_fail_op, StencilOp::Replace);
        assert_eq!(cap.stencil.pass_op, StencilOp::Replace);
        assert_eq!(cap.color, [0.2, 0.4, 0.8, 1.0]);

        let source = f.materials.get(f.cube_material).unwrap();
        assert_eq!(source.side, Side::Double);
        assert_eq!(source.clip_planes.len(), 1);
        assert!(SharedPlane::ptr_eq(&source.clip_planes[0], &f.plane));
    }

    #[test]
    fn test_resource_hygiene_across_refreshes() {
        let mut f = unit_cube_fixture();
        let mut cutter = attach_and_prepare(&mut f);

        // Content material + cap + front/back pass materials.
        assert_eq!(f.materials.len(), 4);
        assert_eq!(f.meshes.len(), 2); // cube + quad

        let old_cap = cutter.prepared().cap_materials[0];
        let old_front = cutter.prepared().stencil_groups[0].front_material;
        let old_quad = cutter.prepared().quad_mesh.unwrap();

        for _ in 0..3 {
            cutter.refresh(&mut f.scene, &mut f.materials, &mut f.meshes);
        }

        assert_eq!(f.materials.len(), 4);
        assert_eq!(f.meshes.len(), 2);
        assert!(!f.materials.contains(old_cap));
        assert!(!f.materials.contains(old_front));
        assert!(!f.meshes.contains(old_quad));
        assert!(f.materials.contains(cutter.prepared().cap_materials[0]));
    }

    #[test]
    fn test_stencil_pass_symmetry() {
        let mut f = unit_cube_fixture();
        let placed = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            ..Transform::IDENTITY
        };
        f.scene.get_node_mut(f.cube).unwrap().transform = placed;

        let cutter = attach_and_prepare(&mut f);
        let group = &cutter.prepared().stencil_groups[0];

        // Captured world transform lands on the wrapping group.
        assert_relative_eq!(
            (group.transform.translation - placed.translation).length(),
            0.0,
            epsilon = 1e-5
        );
        assert_relative_eq!((group.transform.scale - placed.scale).length(), 0.0, epsilon = 1e-5);
        let group_node = f.scene.get_node(group.group).unwrap();
        assert_eq!(group_node.transform, group.transform);
        assert_eq!(
            f.scene.get_node(group.front).unwrap().transform,
            Transform::IDENTITY
        );
        assert_eq!(
            f.scene.get_node(group.back).unwrap().transform,
            Transform::IDENTITY
        );

        let front = f.materials.get(group.front_material).unwrap();
        let back = f.materials.get(group.back_material).unwrap();
        assert_eq!(front.side, Side::Front);
        assert_eq!(front.stencil.pass_op, StencilOp::DecrementWrap);
        assert_eq!(back.side, Side::Back);
        assert_eq!(back.stencil.pass_op, StencilOp::IncrementWrap);
        for material in [front, back] {
            assert_eq!(material.stencil.compare, CompareFunction::Always);
            assert!(!material.color_write);
            assert!(!material.depth_write);
        }
    }

    #[test]
    fn test_align_caps_tracks_plane_within_one_frame() {
        let mut f = unit_cube_fixture();
        let cutter = attach_and_prepare(&mut f);
        let cap_id = cutter.cap_node(0).unwrap();

        // Plane through the origin: the cap starts at the origin.
        let prior = f.scene.get_node(cap_id).unwrap().transform.translation;
        assert_relative_eq!(prior.length(), 0.0, epsilon = 1e-6);

        f.plane
            .set(Plane::from_normal_and_point(Vec3::X, Vec3::new(2.0, 0.0, 0.0)).unwrap());
        cutter.align_caps(&mut f.scene);

        let aligned = f.scene.get_node(cap_id).unwrap().transform;
        let expected = f.plane.get().project_point(prior);
        assert_relative_eq!((aligned.translation - expected).length(), 0.0, epsilon = 1e-5);

        // The quad faces against the plane normal.
        let facing = aligned.rotation * Vec3::Z;
        assert_relative_eq!((facing + f.plane.get().normal()).length(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_align_caps_skips_missing_entries() {
        let mut f = unit_cube_fixture();
        let second_mesh = f.meshes.create(MeshData::cube(0.5));
        let second_material = f.materials.create(Material::default());
        f.scene
            .add_child(f.root, Node::mesh("second", second_mesh, vec![second_material]));
        let cutter = attach_and_prepare(&mut f);

        let gone = cutter.cap_node(0).unwrap();
        let alive = cutter.cap_node(1).unwrap();
        f.scene.remove_subtree(gone);

        f.plane.set(Plane::new(Vec3::Y, -1.0).unwrap());
        cutter.align_caps(&mut f.scene);

        let aligned = f.scene.get_node(alive).unwrap().transform.translation;
        assert_relative_eq!(aligned.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_update_runs_only_on_content_change() {
        let mut f = unit_cube_fixture();
        let mut cutter = PlaneCutter::attach(&mut f.scene, Some(f.root), f.plane.clone());

        // First update always prepares.
        assert!(cutter.update(&mut f.scene, &mut f.materials, &mut f.meshes));
        assert!(!cutter.update(&mut f.scene, &mut f.materials, &mut f.meshes));

        // Spatial animation is not a content change.
        f.scene
            .set_transform(f.cube, Transform::from_translation(Vec3::X));
        assert!(!cutter.update(&mut f.scene, &mut f.materials, &mut f.meshes));

        // Adding content is.
        let extra_mesh = f.meshes.create(MeshData::cube(0.5));
        let extra_material = f.materials.create(Material::default());
        f.scene
            .add_child(f.root, Node::mesh("extra", extra_mesh, vec![extra_material]));
        assert!(cutter.update(&mut f.scene, &mut f.materials, &mut f.meshes));
        assert_eq!(cutter.prepared().meshes.len(), 2);
    }

    #[test]
    fn test_detach_restores_and_disposes() {
        let mut f = unit_cube_fixture();
        let outer = f.scene.add_node(Node::group("outer"));
        f.scene.set_parent(f.root, Some(outer));
        let node_count = f.scene.len();

        let mut cutter = attach_and_prepare(&mut f);
        assert_eq!(f.scene.parent_of(f.root), Some(cutter.wrapper()));

        cutter.detach(&mut f.scene, &mut f.materials, &mut f.meshes);

        assert_eq!(f.scene.parent_of(f.root), Some(outer));
        assert_eq!(f.scene.len(), node_count);
        assert!(!f.scene.contains(cutter.wrapper()));
        assert_eq!(f.materials.len(), 1);
        assert_eq!(f.meshes.len(), 1);

        // Idempotent.
        cutter.detach(&mut f.scene, &mut f.materials, &mut f.meshes);
        assert_eq!(f.scene.len(), node_count);
    }

    #[test]
    fn test_draw_list_order() {
        let mut f = unit_cube_fixture();
        let cutter = attach_and_prepare(&mut f);
        f.scene.update_world_transforms();

        let list = build_draw_list(&f.scene, cutter.wrapper());
        assert_eq!(list.len(), 4);

        // Content first, then the stencil pair, then the cap.
        assert_eq!(list[0].material, f.cube_material);
        assert_relative_eq!(list[1].order, 1.0);
        assert_relative_eq!(list[2].order, 1.0);
        assert_relative_eq!(list[3].order, 1.1);
        assert!(list[3].clear_stencil_after);
        assert_eq!(list[3].material, cutter.prepared().cap_materials[0]);
        assert!(!list[0].clear_stencil_after);
    }
}

// core/scene.rs
//
// Scene graph: generational arena of transform nodes.
//
// Nodes are owned by the arena; parents hold child handles and children hold a
// parent handle. "Rendered" means reachable from the root. Detached nodes keep
// their local transform and children, so a hidden subtree can be re-attached
// with its pose intact.
//
// Usage:
//   let mut graph = SceneGraph::new();
//   let pivot = graph.spawn("pivot");
//   graph.attach(pivot, graph.root());
//   graph.set_rotation(pivot, Quat::from_rotation_y(0.5));
//   let items = graph.draw_list();

use glam::{Mat4, Quat, Vec3};
use crate::api::types::DrawableId;

/// Generational handle to a scene node. Stale handles resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Position, orientation and scale relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl LocalTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A drawable paired with its resolved world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub drawable: DrawableId,
    pub world: Mat4,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalTransform,
    drawable: Option<DrawableId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed transform hierarchy with a permanent root.
#[derive(Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            slots: Vec::with_capacity(64),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
        };
        graph.root = graph.spawn("scene");
        graph
    }

    /// The scene root. Everything reachable from here is rendered.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node with an identity transform.
    pub fn spawn(&mut self, name: impl Into<String>) -> NodeId {
        self.spawn_with(name, LocalTransform::default())
    }

    /// Create a detached node with the given local transform.
    pub fn spawn_with(&mut self, name: impl Into<String>, local: LocalTransform) -> NodeId {
        let node = Node {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local,
            drawable: None,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, node: Some(node) });
            NodeId { index, generation: 0 }
        }
    }

    /// Whether the handle still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// True if `ancestor` appears on the parent chain of `id` (or is `id`).
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Reachable from the root, i.e. part of what gets rendered.
    pub fn is_in_scene(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_descendant_of(id, self.root)
    }

    /// Make `child` a child of `parent`.
    ///
    /// Attaching to the current parent is a no-op. Attaching to a different
    /// parent moves the node. Returns false for dead handles, the root, or an
    /// attachment that would create a cycle.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> bool {
        if child == self.root || !self.contains(child) || !self.contains(parent) {
            return false;
        }
        if self.is_descendant_of(parent, child) {
            return false;
        }
        if self.parent(child) == Some(parent) {
            return true;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Remove `child` from its parent. Returns whether it had one.
    pub fn detach(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        true
    }

    /// Destroy a node and its whole subtree.
    /// Returns the drawables that were attached so the caller can release them.
    pub fn despawn(&mut self, id: NodeId) -> Vec<DrawableId> {
        let mut released = Vec::new();
        if id == self.root || !self.contains(id) {
            return released;
        }
        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                if let Some(d) = node.drawable {
                    released.push(d);
                }
                stack.extend(node.children);
            }
        }
        released
    }

    pub fn local(&self, id: NodeId) -> Option<&LocalTransform> {
        self.node(id).map(|n| &n.local)
    }

    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut LocalTransform> {
        self.node_mut(id).map(|n| &mut n.local)
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(local) = self.local_mut(id) {
            local.translation = translation;
        }
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) {
        if let Some(local) = self.local_mut(id) {
            local.rotation = rotation;
        }
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(local) = self.local_mut(id) {
            local.scale = scale;
        }
    }

    pub fn drawable(&self, id: NodeId) -> Option<DrawableId> {
        self.node(id).and_then(|n| n.drawable)
    }

    /// Bind a drawable to a node, returning the one it replaces.
    pub fn set_drawable(&mut self, id: NodeId, drawable: Option<DrawableId>) -> Option<DrawableId> {
        match self.node_mut(id) {
            Some(node) => std::mem::replace(&mut node.drawable, drawable),
            None => None,
        }
    }

    /// Local-to-world matrix, composed up the parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.node(id)?;
        let mut world = node.local.matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            world = node.local.matrix() * world;
        }
        Some(world)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    /// World orientation, composed from local rotations only.
    pub fn world_rotation(&self, id: NodeId) -> Option<Quat> {
        let mut node = self.node(id)?;
        let mut rotation = node.local.rotation;
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            rotation = node.local.rotation * rotation;
        }
        Some(rotation.normalize())
    }

    /// Move `child` under `new_parent` while keeping its world orientation.
    ///
    /// The local rotation becomes `parent_world⁻¹ · child_world`, so the
    /// reparent itself produces no visible jump.
    pub fn reparent_keep_orientation(&mut self, child: NodeId, new_parent: NodeId) -> bool {
        let (Some(child_world), Some(parent_world)) =
            (self.world_rotation(child), self.world_rotation(new_parent))
        else {
            return false;
        };
        if !self.attach(child, new_parent) {
            return false;
        }
        self.set_rotation(child, (parent_world.inverse() * child_world).normalize());
        true
    }

    /// Depth-first walk from the root collecting every bound drawable.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let Some(root) = self.node(self.root) else {
            return items;
        };
        let mut stack = vec![(self.root, root.local.matrix())];
        while let Some((id, world)) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if let Some(drawable) = node.drawable {
                items.push(DrawItem { drawable, world });
            }
            for &child in node.children.iter().rev() {
                if let Some(c) = self.node(child) {
                    stack.push((child, world * c.local.matrix()));
                }
            }
        }
        items
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn spawn_and_attach() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        assert!(!graph.is_in_scene(a));
        assert!(graph.attach(a, graph.root()));
        assert!(graph.is_in_scene(a));
        assert_eq!(graph.children(graph.root()), &[a]);
        assert_eq!(graph.name(a), Some("a"));
    }

    #[test]
    fn attach_is_idempotent() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        graph.attach(a, graph.root());
        graph.attach(a, graph.root());
        assert_eq!(graph.children(graph.root()).len(), 1);
    }

    #[test]
    fn detach_is_idempotent() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        graph.attach(a, graph.root());
        assert!(graph.detach(a));
        assert!(!graph.detach(a));
        assert!(graph.children(graph.root()).is_empty());
    }

    #[test]
    fn attach_refuses_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        let b = graph.spawn("b");
        graph.attach(b, a);
        assert!(!graph.attach(a, b));
        assert!(!graph.attach(a, a));
        assert!(!graph.attach(graph.root(), a));
    }

    #[test]
    fn moving_between_parents() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        let b = graph.spawn("b");
        let c = graph.spawn("c");
        graph.attach(c, a);
        graph.attach(c, b);
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), &[c]);
        assert_eq!(graph.parent(c), Some(b));
    }

    #[test]
    fn world_position_composes() {
        let mut graph = SceneGraph::new();
        let pivot = graph.spawn("pivot");
        let mesh = graph.spawn_with("mesh", LocalTransform::new().with_translation(Vec3::X * 8.0));
        graph.attach(pivot, graph.root());
        graph.attach(mesh, pivot);
        graph.set_rotation(pivot, Quat::from_rotation_y(FRAC_PI_2));
        let p = graph.world_position(mesh).unwrap();
        assert!(approx_vec(p, Vec3::new(0.0, 0.0, -8.0)), "{p:?}");
    }

    #[test]
    fn despawn_releases_subtree() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        let b = graph.spawn("b");
        graph.attach(a, graph.root());
        graph.attach(b, a);
        graph.set_drawable(a, Some(DrawableId(1)));
        graph.set_drawable(b, Some(DrawableId(2)));

        let mut released = graph.despawn(a);
        released.sort();
        assert_eq!(released, vec![DrawableId(1), DrawableId(2)]);
        assert!(!graph.contains(a));
        assert!(!graph.contains(b));
        assert!(graph.children(graph.root()).is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn stale_handle_after_reuse() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        graph.despawn(a);
        let b = graph.spawn("b");
        assert!(!graph.contains(a));
        assert!(graph.contains(b));
        assert_eq!(graph.name(a), None);
    }

    #[test]
    fn root_cannot_be_despawned() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        assert!(graph.despawn(root).is_empty());
        assert!(graph.contains(root));
    }

    #[test]
    fn reparent_keeps_world_orientation() {
        let mut graph = SceneGraph::new();
        let camera = graph.spawn("camera");
        let world = graph.spawn("world");
        let light = graph.spawn("light");
        graph.attach(camera, graph.root());
        graph.attach(world, graph.root());
        graph.attach(light, camera);
        graph.set_rotation(camera, Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3));
        graph.set_rotation(world, Quat::from_rotation_z(0.2));

        let before = graph.world_rotation(light).unwrap();
        assert!(graph.reparent_keep_orientation(light, world));
        let after = graph.world_rotation(light).unwrap();
        assert!(before.angle_between(after) < 2e-3);
        assert_eq!(graph.parent(light), Some(world));
    }

    #[test]
    fn draw_list_skips_detached() {
        let mut graph = SceneGraph::new();
        let shown = graph.spawn("shown");
        let hidden = graph.spawn("hidden");
        graph.set_drawable(shown, Some(DrawableId(1)));
        graph.set_drawable(hidden, Some(DrawableId(2)));
        graph.attach(shown, graph.root());

        let items = graph.draw_list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].drawable, DrawableId(1));
    }
}

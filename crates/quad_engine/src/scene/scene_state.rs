//! # Scene State
//!
//! One independently updated and rendered layer of the game (a level, a HUD,
//! a pause menu). A state owns its node hierarchy and the render system that
//! indexes the drawable nodes.
//!
//! ## Update order
//!
//! [`SceneState::update`] first runs every node's hook, then walks the
//! hierarchy from the roots recomputing global matrices. Each node whose
//! global bounds may have moved is relocated in the quadrant tree exactly
//! once, after its final matrix for the frame is known. Queued signals are
//! delivered last.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::config::{ClearConfig, StateConfig};
use crate::events::{Signal, SignalArg, SignalBus, SignalKind};
use crate::foundation::math::TransformMatrix;
use crate::render::api::RenderBackend;
use crate::render::drawable::Drawable;
use crate::render::primitives::Camera2D;
use crate::render::systems::{FrameStats, QTreeRenderSystem};
use crate::render::RenderSystemError;
use crate::scene::node::{Node2D, NodeContent, NodeId};
use crate::scene::SceneError;
use crate::spatial::QuadTree;

/// Node hierarchy plus the render system indexing it
#[derive(Debug)]
pub struct SceneState {
    order: i32,
    updating: bool,
    rendering: bool,
    render_system: QTreeRenderSystem,
    nodes: SlotMap<NodeId, Node2D>,
    roots: Vec<NodeId>,
    names: HashMap<String, NodeId>,
    signals: SignalBus,
}

impl SceneState {
    /// Create a state around an existing render system
    pub fn new(order: i32, render_system: QTreeRenderSystem) -> Self {
        Self {
            order,
            updating: true,
            rendering: true,
            render_system,
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            names: HashMap::new(),
            signals: SignalBus::new(),
        }
    }

    /// Create a state with the configured quadrant grid and camera
    pub fn from_config(config: &StateConfig) -> Self {
        let mut render_system = QTreeRenderSystem::with_root(QuadTree::build(&config.grid));
        render_system.set_camera(Camera2D::from_config(&config.camera));

        let mut state = Self::new(config.order, render_system);
        state.updating = config.updating;
        state.rendering = config.rendering;
        state
    }

    /// Position in the world's update and render order
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether [`World::update`](crate::scene::World::update) updates this state
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Pause or resume updates
    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }

    /// Whether [`World::render`](crate::scene::World::render) draws this state
    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Show or hide the whole state
    pub fn set_rendering(&mut self, rendering: bool) {
        self.rendering = rendering;
    }

    /// Render system
    pub fn render_system(&self) -> &QTreeRenderSystem {
        &self.render_system
    }

    /// Mutable render system, e.g. to move the camera
    pub fn render_system_mut(&mut self) -> &mut QTreeRenderSystem {
        &mut self.render_system
    }

    /// Shortcut for the render system's camera
    pub fn camera_mut(&mut self) -> Option<&mut Camera2D> {
        self.render_system.camera_mut()
    }

    /// Signal bus carrying this state's node signals
    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Mutable signal bus, to connect handlers
    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.signals
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the state has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node storage, usable as a [`DrawableStore`](crate::render::DrawableStore)
    pub fn nodes(&self) -> &SlotMap<NodeId, Node2D> {
        &self.nodes
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node2D> {
        self.nodes.get(id)
    }

    /// Look up a node for editing.
    ///
    /// Transform and sprite edits are picked up by the next update. Use
    /// [`SceneState::set_visible`], [`SceneState::set_name`] and
    /// [`SceneState::reparent`] for changes other parts of the scene track.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node2D> {
        self.nodes.get_mut(id)
    }

    /// Find a node by name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Insert a node under `parent`, or as a root.
    ///
    /// The node's global matrix is computed right away and drawable nodes are
    /// registered with the render system. Any failure leaves the scene as it
    /// was.
    pub fn add_node(&mut self, parent: Option<NodeId>, node: Node2D) -> Result<NodeId, SceneError> {
        let parent_global = match parent {
            Some(parent_id) => match self.nodes.get(parent_id) {
                Some(p) => p.global_matrix(),
                None => {
                    log::error!("Cannot add node: parent {:?} does not exist", parent_id);
                    return Err(SceneError::NoSuchNode(parent_id));
                }
            },
            None => TransformMatrix::identity(),
        };
        if let Some(name) = node.name() {
            if self.names.contains_key(name) {
                log::error!("Cannot add node: name '{}' already taken", name);
                return Err(SceneError::DuplicateName(name.to_string()));
            }
        }

        let id = self.nodes.insert(node);
        let node = &mut self.nodes[id];
        node.set_parent(parent);
        node.refresh_global(parent_global, true);

        if node.is_drawable() {
            if let Err(e) = self.render_system.add_draw_child(id, &*node) {
                self.nodes.remove(id);
                return Err(e.into());
            }
        }

        if let Some(name) = node.name() {
            self.names.insert(name.to_string(), id);
        }
        match parent {
            Some(parent_id) => self.nodes[parent_id].push_child(id),
            None => self.roots.push(id),
        }

        log::debug!("Added node {:?} under {:?}", id, parent);
        self.signals.post(Signal::new(SignalKind::NodeAdded).from_sender(id));
        Ok(id)
    }

    /// Remove a node and its whole subtree.
    ///
    /// Every removed drawable is deregistered from the render system before
    /// it is dropped. Returns the number of removed nodes.
    pub fn remove_node(&mut self, id: NodeId) -> Result<usize, SceneError> {
        let Some(node) = self.nodes.get(id) else {
            log::error!("Cannot remove node {:?}: no such node", id);
            return Err(SceneError::NoSuchNode(id));
        };

        match node.parent() {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.remove_child(id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }

        let subtree = self.subtree(id);
        for &removed in &subtree {
            if self.render_system.contains(removed) {
                self.render_system.delete_draw_child(removed)?;
            }
            if let Some(node) = self.nodes.remove(removed) {
                if let Some(name) = node.name() {
                    self.names.remove(name);
                }
            }
            self.signals.disconnect_sender(removed);
            self.signals
                .post(Signal::new(SignalKind::NodeRemoved).from_sender(removed));
        }

        log::debug!("Removed node {:?} with {} nodes", id, subtree.len());
        Ok(subtree.len())
    }

    /// Rename a node, `None` removes its name
    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) -> Result<(), SceneError> {
        let Some(node) = self.nodes.get(id) else {
            log::error!("Cannot rename node {:?}: no such node", id);
            return Err(SceneError::NoSuchNode(id));
        };
        if let Some(name) = name {
            if self.names.get(name).is_some_and(|&other| other != id) {
                log::error!("Cannot rename node {:?}: name '{}' already taken", id, name);
                return Err(SceneError::DuplicateName(name.to_string()));
            }
        }

        if let Some(old) = node.name() {
            self.names.remove(old);
        }
        if let Some(name) = name {
            self.names.insert(name.to_string(), id);
        }
        self.nodes[id].set_name(name.map(str::to_string));
        Ok(())
    }

    /// Move a node under another parent, or make it a root.
    ///
    /// The node keeps its local transform; its global bounds are refreshed by
    /// the next update.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        let Some(node) = self.nodes.get(id) else {
            log::error!("Cannot reparent node {:?}: no such node", id);
            return Err(SceneError::NoSuchNode(id));
        };
        let old_parent = node.parent();

        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(parent) {
                log::error!("Cannot reparent node {:?}: parent {:?} does not exist", id, parent);
                return Err(SceneError::NoSuchNode(parent));
            }
            if self.is_ancestor_or_self(id, parent) {
                log::error!("Cannot reparent node {:?} under its own subtree", id);
                return Err(SceneError::InvalidReparent(id));
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        match old_parent {
            Some(parent) => self.nodes[parent].remove_child(id),
            None => self.roots.retain(|&r| r != id),
        }
        match new_parent {
            Some(parent) => self.nodes[parent].push_child(id),
            None => self.roots.push(id),
        }
        self.nodes[id].set_parent(new_parent);
        Ok(())
    }

    /// Show or hide a node
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let Some(node) = self.nodes.get_mut(id) else {
            log::error!("Cannot change visibility of node {:?}: no such node", id);
            return Err(SceneError::NoSuchNode(id));
        };
        if node.is_visible() != visible {
            node.set_visible(visible);
            self.signals.post(
                Signal::new(SignalKind::VisibilityChanged)
                    .from_sender(id)
                    .with_payload(SignalArg::Flag(visible)),
            );
        }
        Ok(())
    }

    /// Replace a node's content, registering or deregistering it as needed
    pub fn set_content(&mut self, id: NodeId, content: NodeContent) -> Result<(), SceneError> {
        let Some(node) = self.nodes.get_mut(id) else {
            log::error!("Cannot set content of node {:?}: no such node", id);
            return Err(SceneError::NoSuchNode(id));
        };
        node.set_content(content);

        let drawable = node.is_drawable();
        let registered = self.render_system.contains(id);
        if drawable && !registered {
            self.render_system.add_draw_child(id, &*node)?;
        } else if !drawable && registered {
            self.render_system.delete_draw_child(id)?;
        }
        Ok(())
    }

    /// Advance the state by `delta` seconds.
    ///
    /// Returns the number of nodes relocated in the quadrant tree.
    pub fn update(&mut self, delta: f32) -> usize {
        let ids: Vec<NodeId> = self.nodes.keys().collect();
        for id in ids {
            let Some(mut hook) = self.nodes.get_mut(id).and_then(Node2D::take_hook) else {
                continue;
            };
            let node = &mut self.nodes[id];
            hook(node, delta);
            node.restore_hook(hook);
        }

        let relocated = self.propagate_transforms();
        self.dispatch_signals();
        relocated
    }

    /// Deliver the signals posted since the last dispatch
    ///
    /// Called by [`update`](Self::update). Paused states still need it so
    /// their queue does not grow while editing continues.
    pub fn dispatch_signals(&mut self) {
        self.signals.dispatch();
    }

    /// Select phase of the render system over this state's nodes
    pub fn select(&mut self) -> Result<usize, RenderSystemError> {
        self.render_system.select_objects(&self.nodes)
    }

    /// Draw phase of the render system over this state's nodes
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) -> FrameStats {
        self.render_system.draw_objects(&self.nodes, backend)
    }

    /// Render this state alone: clear, select, draw and end the frame
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        clear: Option<&ClearConfig>,
    ) -> FrameStats {
        self.render_system.render_frame(&self.nodes, backend, clear)
    }

    fn propagate_transforms(&mut self) -> usize {
        let mut relocated = 0;
        let mut stack: Vec<(NodeId, TransformMatrix, bool)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, TransformMatrix::identity(), false))
            .collect();

        while let Some((id, parent_global, parent_moved)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let moved = node.refresh_global(parent_global, parent_moved);

            if moved && node.is_drawable() {
                match self.render_system.handle_change(id, &*node) {
                    Ok(()) => {
                        relocated += 1;
                        self.signals
                            .post(Signal::new(SignalKind::NodeRelocated).from_sender(id));
                    }
                    Err(e) => log::error!("Failed to relocate node {:?}: {}", id, e),
                }
            }

            let global = node.global_matrix();
            stack.extend(node.children().iter().rev().map(|&child| (child, global, moved)));
        }
        relocated
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(current);
                stack.extend(node.children().iter().copied());
            }
        }
        out
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(id).and_then(Node2D::parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

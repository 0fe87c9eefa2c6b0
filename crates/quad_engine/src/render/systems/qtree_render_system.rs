//! # Quadrant Tree Render System
//!
//! Owns the quadrant tree and the reverse index from drawables to the
//! quadrant holding them, and renders a frame in two phases:
//!
//! 1. **Select**: query the tree with the camera's global bounds and collect
//!    the drawables of every intersecting quadrant, grouped by layer.
//! 2. **Draw**: walk the layers in ascending order and submit one draw call
//!    per visible drawable, rebinding the shader only when it changes.
//!
//! Drawables are not owned here. They are registered by [`DrawableId`] and
//! resolved through a [`DrawableStore`] at frame time.
//!
//! ## Error Handling
//! Missing root or camera and unknown drawables are logged and returned as
//! [`RenderSystemError`]; the operation leaves every index untouched. Backend
//! failures while drawing are logged per object and the frame goes on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ClearConfig;
use crate::render::api::{
    BackendResult, RenderBackend, ShaderHandle, ShaderSetup, ShaderUniforms, UniformValue,
};
use crate::render::drawable::{Drawable, DrawableId, DrawableStore};
use crate::render::primitives::Camera2D;
use crate::render::RenderSystemError;
use crate::spatial::{LayerMap, QuadTree, QuadrantId};

/// Uniform receiving the world to camera matrix
pub const VIEW_UNIFORM: &str = "view_matr";

/// Uniform receiving the camera to clip space matrix
pub const PROJECTION_UNIFORM: &str = "proj_matr";

/// Counters for one draw phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Drawables produced by the select phase
    pub selected: usize,
    /// Draw calls accepted by the backend
    pub drawn: usize,
    /// Shader binds issued
    pub shader_binds: usize,
    /// Drawables skipped because the backend reported an error
    pub failed: usize,
}

impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.selected += rhs.selected;
        self.drawn += rhs.drawn;
        self.shader_binds += rhs.shader_binds;
        self.failed += rhs.failed;
    }
}

/// Render system backed by a quadrant tree
#[derive(Debug, Default)]
pub struct QTreeRenderSystem {
    tree: Option<QuadTree>,
    quad_map: HashMap<DrawableId, QuadrantId>,
    camera: Option<Camera2D>,
    selected: LayerMap,
    current_shader: Option<ShaderHandle>,
}

impl QTreeRenderSystem {
    /// Create a render system without root quadrant or camera
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a render system indexing into `tree`
    pub fn with_root(tree: QuadTree) -> Self {
        Self {
            tree: Some(tree),
            ..Self::default()
        }
    }

    /// Install a new quadrant tree.
    ///
    /// Registrations refer to quadrants of the old tree, so they are all
    /// dropped; drawables have to be added again.
    pub fn set_root_quadrant(&mut self, tree: QuadTree) {
        if !self.quad_map.is_empty() {
            log::warn!(
                "Replacing root quadrant, dropping {} registered drawables",
                self.quad_map.len()
            );
        }
        self.quad_map.clear();
        self.selected.clear();
        self.tree = Some(tree);
    }

    /// Current quadrant tree
    pub fn root_quadrant(&self) -> Option<&QuadTree> {
        self.tree.as_ref()
    }

    /// Install the camera used by the select phase
    pub fn set_camera(&mut self, camera: Camera2D) {
        self.camera = Some(camera);
    }

    /// Current camera
    pub fn camera(&self) -> Option<&Camera2D> {
        self.camera.as_ref()
    }

    /// Mutable access to the current camera
    pub fn camera_mut(&mut self) -> Option<&mut Camera2D> {
        self.camera.as_mut()
    }

    /// Quadrant currently holding a drawable
    pub fn quadrant_of(&self, id: DrawableId) -> Option<QuadrantId> {
        self.quad_map.get(&id).copied()
    }

    /// Check whether a drawable is registered
    pub fn contains(&self, id: DrawableId) -> bool {
        self.quad_map.contains_key(&id)
    }

    /// Number of registered drawables
    pub fn drawable_count(&self) -> usize {
        self.quad_map.len()
    }

    /// Result of the last select phase
    pub fn selected(&self) -> &LayerMap {
        &self.selected
    }

    /// Register a drawable.
    ///
    /// The drawable is put at the root and immediately relocated to the
    /// deepest quadrant containing its global bounds. Registering an id twice
    /// only relocates it.
    pub fn add_draw_child(
        &mut self,
        id: DrawableId,
        drawable: &dyn Drawable,
    ) -> Result<(), RenderSystemError> {
        let Some(tree) = self.tree.as_mut() else {
            log::error!("Cannot add drawable {:?}: root quadrant not set", id);
            return Err(RenderSystemError::RootNotSet);
        };

        if self.quad_map.contains_key(&id) {
            log::warn!("Drawable {:?} added twice, relocating instead", id);
        } else {
            let root = tree.root();
            tree[root].add_draw_child(id);
            self.quad_map.insert(id, root);
        }
        self.handle_change(id, drawable)
    }

    /// Unregister a drawable
    pub fn delete_draw_child(&mut self, id: DrawableId) -> Result<(), RenderSystemError> {
        let Some(quadrant) = self.quad_map.remove(&id) else {
            log::error!("Cannot delete drawable {:?}: no such node", id);
            return Err(RenderSystemError::NoSuchDrawable(id));
        };

        if let Some(tree) = self.tree.as_mut() {
            tree[quadrant].delete_draw_child(id);
        }
        for ids in self.selected.values_mut() {
            ids.remove(&id);
        }
        Ok(())
    }

    /// Relocate a drawable after its global bounds changed.
    ///
    /// Must run once after every bounds change and before the next select
    /// phase; the index only ever reflects the bounds seen by the last call.
    pub fn handle_change(
        &mut self,
        id: DrawableId,
        drawable: &dyn Drawable,
    ) -> Result<(), RenderSystemError> {
        let Some(&prev) = self.quad_map.get(&id) else {
            log::error!("Cannot relocate drawable {:?}: no such node", id);
            return Err(RenderSystemError::NoSuchDrawable(id));
        };
        let Some(tree) = self.tree.as_mut() else {
            log::error!("Cannot relocate drawable {:?}: root quadrant not set", id);
            return Err(RenderSystemError::RootNotSet);
        };

        let bounds = drawable.global_bounds();
        let next = tree.best_fit(prev, &bounds);
        if next != prev {
            tree[prev].delete_draw_child(id);
            tree[next].add_draw_child(id);
            self.quad_map.insert(id, next);
            log::trace!(
                "Drawable {:?} moved from quadrant {} to {}",
                id,
                prev.index(),
                next.index()
            );
        }
        Ok(())
    }

    /// Select phase: collect the drawables under the camera.
    ///
    /// Returns the number of selected drawables. On error nothing is selected
    /// and the following draw phase draws nothing.
    pub fn select_objects<S>(&mut self, store: &S) -> Result<usize, RenderSystemError>
    where
        S: DrawableStore + ?Sized,
    {
        self.selected.clear();

        let Some(tree) = self.tree.as_ref() else {
            log::error!("Cannot select objects: root quadrant not set");
            return Err(RenderSystemError::RootNotSet);
        };
        let Some(camera) = self.camera.as_ref() else {
            log::error!("Cannot select objects: camera not set");
            return Err(RenderSystemError::CameraNotSet);
        };

        let view = camera.global_bounds();
        tree.find_objects(&view, store, &mut self.selected);

        let count = self.selected.values().map(|ids| ids.len()).sum();
        log::debug!(
            "Selected {} drawables in {} layers for view {:?}",
            count,
            self.selected.len(),
            view
        );
        Ok(count)
    }

    /// Draw phase: submit the selected drawables in ascending layer order.
    ///
    /// Hidden drawables are skipped. Whenever the shader changes it is bound
    /// and receives the camera matrices before the drawable's own setup runs.
    pub fn draw_objects<S>(&mut self, store: &S, backend: &mut dyn RenderBackend) -> FrameStats
    where
        S: DrawableStore + ?Sized,
    {
        let camera_setup = self.camera.as_ref().map(camera_uniforms);
        let mut stats = FrameStats::default();

        for (layer, ids) in &self.selected {
            for &id in ids {
                stats.selected += 1;

                let Some(drawable) = store.drawable(id) else {
                    log::warn!("Selected drawable {:?} on layer {} no longer exists", id, layer);
                    continue;
                };
                if !drawable.is_visible() {
                    continue;
                }

                let info = drawable.draw_info();

                if let Some(shader) = info.shader {
                    if self.current_shader != Some(shader) {
                        if let Err(e) = backend.bind_shader(shader) {
                            log::error!("Failed to bind shader {:?} for {:?}: {}", shader, id, e);
                            stats.failed += 1;
                            continue;
                        }
                        self.current_shader = Some(shader);
                        stats.shader_binds += 1;

                        if let Some(setup) = &camera_setup {
                            if let Err(e) = backend.set_shader_params(Arc::clone(setup)) {
                                log::error!("Failed to upload camera uniforms: {}", e);
                            }
                        }
                    }
                }

                if let Some(setup) = info.shader_setup {
                    if let Err(e) = backend.set_shader_params(setup) {
                        log::error!("Failed to set shader params for {:?}: {}", id, e);
                    }
                }

                match backend.render(&info.render_params) {
                    Ok(()) => stats.drawn += 1,
                    Err(e) => {
                        log::error!("Failed to draw {:?}: {}", id, e);
                        stats.failed += 1;
                    }
                }
            }
        }

        log::trace!("Draw phase: {:?}", stats);
        stats
    }

    /// Clear the screen as configured
    pub fn clear_screen(
        &self,
        backend: &mut dyn RenderBackend,
        clear: &ClearConfig,
    ) -> BackendResult<()> {
        backend.clear(clear.color(), clear.flags)
    }

    /// Flush and present the frame, then forget the bound shader
    pub fn end_frame(&mut self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let result = backend.process().and_then(|()| backend.end_frame());
        if let Err(e) = &result {
            log::error!("Failed to end frame: {}", e);
        }
        self.finish_frame();
        result
    }

    /// Forget the bound shader so the next frame binds it again. Used when the
    /// frame is ended by someone else sharing the backend.
    pub fn finish_frame(&mut self) {
        self.current_shader = None;
    }

    /// Clear, select, draw and end a frame
    pub fn render_frame<S>(
        &mut self,
        store: &S,
        backend: &mut dyn RenderBackend,
        clear: Option<&ClearConfig>,
    ) -> FrameStats
    where
        S: DrawableStore + ?Sized,
    {
        if let Some(clear) = clear {
            if let Err(e) = self.clear_screen(backend, clear) {
                log::error!("Failed to clear screen: {}", e);
            }
        }
        // A failed select leaves nothing selected, so drawing is a no-op
        let _ = self.select_objects(store);
        let stats = self.draw_objects(store, backend);
        let _ = self.end_frame(backend);
        stats
    }

    /// Drop every registration, keeping the tree topology and the camera
    pub fn reset(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            tree.clear_drawables();
        }
        self.quad_map.clear();
        self.selected.clear();
        self.current_shader = None;
    }
}

fn camera_uniforms(camera: &Camera2D) -> ShaderSetup {
    let view = camera.view_matrix();
    let projection = camera.projection_matrix();
    Arc::new(move |uniforms: &mut dyn ShaderUniforms| {
        uniforms.set_uniform(VIEW_UNIFORM, UniformValue::Mat4(view));
        uniforms.set_uniform(PROJECTION_UNIFORM, UniformValue::Mat4(projection));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{FloatRect, Vec2};
    use crate::render::api::{DrawInfo, RenderParams};
    use crate::render::backends::{BackendCommand, HeadlessBackend};
    use crate::render::drawable::DrawableState;
    use crate::spatial::Corner;
    use slotmap::SlotMap;

    /// Global bounds are `rect.pos * 2` with a fixed 10x10 size
    struct Marker {
        state: DrawableState,
        rect: FloatRect,
        tag: u32,
    }

    impl Marker {
        fn at(x: f32, y: f32) -> Self {
            Self {
                state: DrawableState::default(),
                rect: FloatRect::new(x, y, 10.0, 10.0),
                tag: 0,
            }
        }

        fn tagged(mut self, tag: u32, layer: i32) -> Self {
            self.tag = tag;
            self.state.layer = layer;
            self
        }

        fn with_shader(mut self, shader: u64) -> Self {
            self.state.shader = Some(ShaderHandle(shader));
            self
        }

        fn move_to(&mut self, x: f32, y: f32) {
            self.rect = FloatRect::new(x, y, 10.0, 10.0);
        }
    }

    impl Drawable for Marker {
        fn state(&self) -> &DrawableState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut DrawableState {
            &mut self.state
        }

        fn local_bounds(&self) -> FloatRect {
            FloatRect::new(0.0, 0.0, 10.0, 10.0)
        }

        fn global_bounds(&self) -> FloatRect {
            FloatRect::from_pos(self.rect.pos() * 2.0, 10.0, 10.0)
        }

        fn draw_info(&self) -> DrawInfo {
            DrawInfo {
                shader: self.state.shader,
                shader_setup: None,
                render_params: RenderParams {
                    vertex_count: self.tag,
                    blend: self.state.blend,
                    color: self.state.color,
                    ..RenderParams::default()
                },
            }
        }
    }

    fn four_way_tree() -> QuadTree {
        let mut tree = QuadTree::new(FloatRect::new(0.0, 0.0, 100.0, 100.0));
        let root = tree.root();
        for corner in Corner::ALL {
            let i = corner.index();
            let x = if i % 2 == 1 { 50.0 } else { 0.0 };
            let y = if i >= 2 { 50.0 } else { 0.0 };
            let child = tree.insert_quadrant(FloatRect::new(x, y, 50.0, 50.0));
            tree.add_child(root, child, corner);
        }
        tree
    }

    fn system() -> QTreeRenderSystem {
        let mut system = QTreeRenderSystem::with_root(four_way_tree());
        system.set_camera(Camera2D::new(Vec2::new(55.0, 55.0), Vec2::new(20.0, 20.0)));
        system
    }

    fn child(system: &QTreeRenderSystem, corner: Corner) -> QuadrantId {
        let tree = system.root_quadrant().unwrap();
        tree[tree.root()].child(corner).unwrap()
    }

    fn assert_index_consistent(system: &QTreeRenderSystem) {
        let tree = system.root_quadrant().unwrap();
        for (&id, &quadrant) in &system.quad_map {
            assert!(tree[quadrant].has_drawable(id));
        }
        for (quadrant_id, quadrant) in tree.iter() {
            for id in quadrant.drawables() {
                assert_eq!(system.quadrant_of(id), Some(quadrant_id));
            }
        }
    }

    fn drawn_tags(backend: &HeadlessBackend) -> Vec<u32> {
        backend.draw_calls().map(|p| p.vertex_count).collect()
    }

    #[test]
    fn test_relocation_fixture() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(30.0, 30.0));

        system.add_draw_child(id, &store[id]).unwrap();
        assert_eq!(system.quadrant_of(id), Some(child(&system, Corner::SouthEast)));

        store[id].move_to(5.0, 10.0);
        system.handle_change(id, &store[id]).unwrap();
        assert_eq!(system.quadrant_of(id), Some(child(&system, Corner::NorthWest)));

        store[id].move_to(22.0, 23.0);
        system.handle_change(id, &store[id]).unwrap();
        let root = system.root_quadrant().unwrap().root();
        assert_eq!(system.quadrant_of(id), Some(root));

        store[id].move_to(30.0, 10.0);
        system.handle_change(id, &store[id]).unwrap();
        assert_eq!(system.quadrant_of(id), Some(child(&system, Corner::NorthEast)));

        assert_index_consistent(&system);
    }

    #[test]
    fn test_handle_change_is_idempotent() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(30.0, 10.0));
        system.add_draw_child(id, &store[id]).unwrap();

        let first = system.quadrant_of(id);
        system.handle_change(id, &store[id]).unwrap();
        system.handle_change(id, &store[id]).unwrap();
        assert_eq!(system.quadrant_of(id), first);
        assert_index_consistent(&system);
    }

    #[test]
    fn test_add_without_root_fails() {
        let mut system = QTreeRenderSystem::new();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(0.0, 0.0));

        assert_eq!(
            system.add_draw_child(id, &store[id]),
            Err(RenderSystemError::RootNotSet)
        );
        assert!(!system.contains(id));
    }

    #[test]
    fn test_adding_twice_does_not_duplicate() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(5.0, 10.0));

        system.add_draw_child(id, &store[id]).unwrap();
        store[id].move_to(30.0, 30.0);
        system.add_draw_child(id, &store[id]).unwrap();

        assert_eq!(system.drawable_count(), 1);
        assert_eq!(system.quadrant_of(id), Some(child(&system, Corner::SouthEast)));
        assert_index_consistent(&system);
    }

    #[test]
    fn test_unknown_drawables_are_reported() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(5.0, 10.0));

        assert_eq!(
            system.handle_change(id, &store[id]),
            Err(RenderSystemError::NoSuchDrawable(id))
        );

        system.add_draw_child(id, &store[id]).unwrap();
        assert!(system.delete_draw_child(id).is_ok());
        assert_eq!(
            system.delete_draw_child(id),
            Err(RenderSystemError::NoSuchDrawable(id))
        );
        assert_index_consistent(&system);
    }

    #[test]
    fn test_select_requires_root_and_camera() {
        let store: SlotMap<DrawableId, Marker> = SlotMap::with_key();

        let mut no_root = QTreeRenderSystem::new();
        no_root.set_camera(Camera2D::default());
        assert_eq!(no_root.select_objects(&store), Err(RenderSystemError::RootNotSet));

        let mut no_camera = QTreeRenderSystem::with_root(four_way_tree());
        assert_eq!(
            no_camera.select_objects(&store),
            Err(RenderSystemError::CameraNotSet)
        );
        assert!(no_camera.selected().is_empty());

        let mut backend = HeadlessBackend::new();
        let stats = no_camera.draw_objects(&store, &mut backend);
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn test_select_culls_by_quadrant() {
        let mut system = system();
        system.set_camera(Camera2D::new(Vec2::new(80.0, 80.0), Vec2::new(10.0, 10.0)));
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let near = store.insert(Marker::at(30.0, 30.0));
        let far = store.insert(Marker::at(5.0, 10.0));
        let straddling = store.insert(Marker::at(22.0, 23.0));
        for id in [near, far, straddling] {
            system.add_draw_child(id, &store[id]).unwrap();
        }

        assert_eq!(system.select_objects(&store), Ok(2));
        let selected: Vec<_> = system.selected()[&0].iter().copied().collect();
        assert!(selected.contains(&near));
        assert!(selected.contains(&straddling));
        assert!(!selected.contains(&far));
    }

    #[test]
    fn test_layers_draw_in_ascending_order() {
        let mut system = system();
        system.set_camera(Camera2D::new(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0)));
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        for (tag, layer) in [(1, 0), (2, 5), (3, -1)] {
            let id = store.insert(Marker::at(5.0 * tag as f32, 5.0).tagged(tag, layer));
            system.add_draw_child(id, &store[id]).unwrap();
        }

        let mut backend = HeadlessBackend::new();
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);

        assert_eq!(drawn_tags(&backend), vec![3, 1, 2]);
        assert_eq!(stats.drawn, 3);
    }

    #[test]
    fn test_hidden_drawables_are_selected_but_not_drawn() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let shown = store.insert(Marker::at(30.0, 30.0).tagged(1, 0));
        let hidden = store.insert(Marker::at(26.0, 26.0).tagged(2, 0));
        store[hidden].set_visible(false);
        system.add_draw_child(shown, &store[shown]).unwrap();
        system.add_draw_child(hidden, &store[hidden]).unwrap();

        let mut backend = HeadlessBackend::new();
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);

        assert_eq!(stats.selected, 2);
        assert_eq!(stats.drawn, 1);
        assert_eq!(drawn_tags(&backend), vec![1]);
    }

    #[test]
    fn test_shader_rebinding_and_camera_uniforms() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let a = store.insert(Marker::at(26.0, 26.0).tagged(1, 0).with_shader(7));
        let b = store.insert(Marker::at(28.0, 28.0).tagged(2, 1).with_shader(7));
        let c = store.insert(Marker::at(30.0, 30.0).tagged(3, 2).with_shader(9));
        let d = store.insert(Marker::at(32.0, 32.0).tagged(4, 3));
        for id in [a, b, c, d] {
            system.add_draw_child(id, &store[id]).unwrap();
        }

        let mut backend = HeadlessBackend::new();
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);
        assert_eq!(stats.shader_binds, 2);
        assert_eq!(backend.shader_binds(), 2);
        assert_eq!(drawn_tags(&backend), vec![1, 2, 3, 4]);

        let camera = system.camera().unwrap();
        assert_eq!(
            backend.uniform(ShaderHandle(7), VIEW_UNIFORM),
            Some(&UniformValue::Mat4(camera.view_matrix()))
        );
        assert_eq!(
            backend.uniform(ShaderHandle(9), PROJECTION_UNIFORM),
            Some(&UniformValue::Mat4(camera.projection_matrix()))
        );

        // Same shader across frames is bound again after end_frame
        system.end_frame(&mut backend).unwrap();
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);
        assert_eq!(stats.shader_binds, 2);
    }

    #[test]
    fn test_drawable_without_shader_keeps_active_shader() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let a = store.insert(Marker::at(26.0, 26.0).tagged(1, 0).with_shader(7));
        let b = store.insert(Marker::at(28.0, 28.0).tagged(2, 1));
        let c = store.insert(Marker::at(30.0, 30.0).tagged(3, 2).with_shader(7));
        for id in [a, b, c] {
            system.add_draw_child(id, &store[id]).unwrap();
        }

        let mut backend = HeadlessBackend::new();
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);

        assert_eq!(stats.shader_binds, 1);
        assert_eq!(stats.drawn, 3);
        let binds: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|cmd| match cmd {
                BackendCommand::BindShader(shader) => Some(*shader),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![ShaderHandle(7)]);
        assert_eq!(drawn_tags(&backend), vec![1, 2, 3]);
        assert_eq!(backend.bound_shader(), Some(ShaderHandle(7)));
    }

    #[test]
    fn test_unknown_shader_fails_only_its_drawable() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let known = store.insert(Marker::at(26.0, 26.0).tagged(1, 0).with_shader(1));
        let unknown = store.insert(Marker::at(28.0, 28.0).tagged(2, 1).with_shader(2));
        let after = store.insert(Marker::at(30.0, 30.0).tagged(3, 2).with_shader(1));
        for id in [known, unknown, after] {
            system.add_draw_child(id, &store[id]).unwrap();
        }

        let mut backend = HeadlessBackend::new();
        backend.register_shader(ShaderHandle(1));
        system.select_objects(&store).unwrap();
        let stats = system.draw_objects(&store, &mut backend);

        assert_eq!(stats.selected, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.shader_binds, 1);
        assert_eq!(drawn_tags(&backend), vec![1, 3]);
    }

    #[test]
    fn test_object_shader_setup_runs_after_camera_uniforms() {
        struct Custom(Marker);

        impl Drawable for Custom {
            fn state(&self) -> &DrawableState {
                self.0.state()
            }

            fn state_mut(&mut self) -> &mut DrawableState {
                self.0.state_mut()
            }

            fn local_bounds(&self) -> FloatRect {
                self.0.local_bounds()
            }

            fn global_bounds(&self) -> FloatRect {
                self.0.global_bounds()
            }

            fn draw_info(&self) -> DrawInfo {
                DrawInfo {
                    shader_setup: Some(Arc::new(|u: &mut dyn ShaderUniforms| {
                        u.set_uniform("tint", UniformValue::Float(0.5));
                    })),
                    ..self.0.draw_info()
                }
            }
        }

        let mut system = system();
        let mut store: SlotMap<DrawableId, Custom> = SlotMap::with_key();
        let id = store.insert(Custom(Marker::at(30.0, 30.0).with_shader(1)));
        system.add_draw_child(id, &store[id]).unwrap();

        let mut backend = HeadlessBackend::new();
        system.select_objects(&store).unwrap();
        system.draw_objects(&store, &mut backend);

        let commands = backend.commands();
        assert!(matches!(commands[0], BackendCommand::BindShader(ShaderHandle(1))));
        assert!(matches!(&commands[1], BackendCommand::SetShaderParams(w) if w[0].0 == VIEW_UNIFORM));
        assert!(matches!(&commands[2], BackendCommand::SetShaderParams(w) if w[0].0 == "tint"));
        assert!(matches!(commands[3], BackendCommand::Render(_)));
    }

    #[test]
    fn test_backend_failures_do_not_stop_the_frame() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        for x in [26.0, 28.0, 30.0] {
            let id = store.insert(Marker::at(x, x));
            system.add_draw_child(id, &store[id]).unwrap();
        }

        let mut backend = HeadlessBackend::new();
        backend.set_fail_renders(true);
        let stats = system.render_frame(&store, &mut backend, None);

        assert_eq!(stats.selected, 3);
        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.failed, 3);
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn test_render_frame_sequence() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(30.0, 30.0).with_shader(4));
        system.add_draw_child(id, &store[id]).unwrap();

        let mut backend = HeadlessBackend::new();
        let stats = system.render_frame(&store, &mut backend, Some(&ClearConfig::default()));
        assert_eq!(stats.drawn, 1);

        let commands = backend.commands();
        assert!(matches!(commands.first(), Some(BackendCommand::Clear { .. })));
        assert_eq!(commands[commands.len() - 2], BackendCommand::Process);
        assert_eq!(commands[commands.len() - 1], BackendCommand::EndFrame);
    }

    #[test]
    fn test_deleted_drawables_are_not_drawn() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(30.0, 30.0));
        system.add_draw_child(id, &store[id]).unwrap();
        system.select_objects(&store).unwrap();
        system.delete_draw_child(id).unwrap();

        let mut backend = HeadlessBackend::new();
        let stats = system.draw_objects(&store, &mut backend);
        assert_eq!(stats.drawn, 0);
    }

    #[test]
    fn test_reset_and_new_root_drop_registrations() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(30.0, 30.0));
        system.add_draw_child(id, &store[id]).unwrap();

        system.reset();
        assert!(!system.contains(id));
        assert!(system.camera().is_some());
        assert_index_consistent(&system);

        system.add_draw_child(id, &store[id]).unwrap();
        system.set_root_quadrant(four_way_tree());
        assert!(!system.contains(id));
        assert_eq!(
            system.handle_change(id, &store[id]),
            Err(RenderSystemError::NoSuchDrawable(id))
        );
    }

    #[test]
    fn test_camera_mut_moves_the_view() {
        let mut system = system();
        let mut store: SlotMap<DrawableId, Marker> = SlotMap::with_key();
        let id = store.insert(Marker::at(5.0, 10.0));
        system.add_draw_child(id, &store[id]).unwrap();

        system.camera_mut().unwrap().set_center(Vec2::new(90.0, 90.0));
        system.camera_mut().unwrap().set_size(Vec2::new(10.0, 10.0));
        assert_eq!(system.select_objects(&store), Ok(0));

        system.camera_mut().unwrap().set_center(Vec2::new(10.0, 10.0));
        assert_eq!(system.select_objects(&store), Ok(1));
    }
}

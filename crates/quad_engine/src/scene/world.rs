//! Ordered collection of scene states

use std::collections::BTreeMap;

use crate::config::{ClearConfig, GameConfig};
use crate::render::api::RenderBackend;
use crate::render::systems::FrameStats;
use crate::scene::{SceneError, SceneState};

/// All scene states of a game, updated and rendered in ascending order
#[derive(Debug, Default)]
pub struct World {
    states: BTreeMap<i32, SceneState>,
}

impl World {
    /// Create a world without states
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one state per configured state
    pub fn from_config(config: &GameConfig) -> Result<Self, SceneError> {
        let mut world = Self::new();
        for state in &config.states {
            world.register_state(SceneState::from_config(state))?;
        }
        Ok(world)
    }

    /// Add a state under its order key
    pub fn register_state(&mut self, state: SceneState) -> Result<(), SceneError> {
        let order = state.order();
        if self.states.contains_key(&order) {
            log::error!("Cannot register state: order {} already taken", order);
            return Err(SceneError::DuplicateState(order));
        }
        log::debug!("Registered state {}", order);
        self.states.insert(order, state);
        Ok(())
    }

    /// Remove a state
    pub fn remove_state(&mut self, order: i32) -> Result<SceneState, SceneError> {
        self.states.remove(&order).ok_or_else(|| {
            log::error!("Cannot remove state {}: no such state", order);
            SceneError::NoSuchState(order)
        })
    }

    /// Look up a state
    pub fn state(&self, order: i32) -> Option<&SceneState> {
        self.states.get(&order)
    }

    /// Look up a state for editing
    pub fn state_mut(&mut self, order: i32) -> Option<&mut SceneState> {
        self.states.get_mut(&order)
    }

    /// States in ascending order
    pub fn states(&self) -> impl Iterator<Item = &SceneState> {
        self.states.values()
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the world has no states
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Update every updating state. Returns the number of relocated nodes.
    ///
    /// Paused states are not advanced but their pending signals are still
    /// delivered.
    pub fn update(&mut self, delta: f32) -> usize {
        let mut relocated = 0;
        for state in self.states.values_mut() {
            if state.is_updating() {
                relocated += state.update(delta);
            } else {
                state.dispatch_signals();
            }
        }
        relocated
    }

    /// Render one frame.
    ///
    /// The screen is cleared once, every rendering state is selected and
    /// drawn on top of the previous ones, and the frame is ended once.
    pub fn render(&mut self, backend: &mut dyn RenderBackend, clear: &ClearConfig) -> FrameStats {
        if let Err(e) = backend.clear(clear.color(), clear.flags) {
            log::error!("Failed to clear screen: {}", e);
        }

        let mut stats = FrameStats::default();
        for (order, state) in self.states.iter_mut().filter(|(_, s)| s.is_rendering()) {
            if let Err(e) = state.select() {
                log::warn!("Skipping state {}: {}", order, e);
                continue;
            }
            stats += state.draw(backend);
        }

        if let Err(e) = backend.process().and_then(|()| backend.end_frame()) {
            log::error!("Failed to end frame: {}", e);
        }
        for state in self.states.values_mut() {
            state.render_system_mut().finish_frame();
        }
        stats
    }
}

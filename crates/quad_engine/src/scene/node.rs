//! Scene graph node
//!
//! A [`Node2D`] carries a local transform, its place in the hierarchy, and
//! optional sprite content. Nodes with content are drawables: the scene
//! registers them with its render system and relocates them whenever their
//! global bounds move.

use std::fmt;

use crate::foundation::math::{FloatRect, TransformMatrix, Vec2};
use crate::render::api::{BlendMode, Color, DrawInfo, ShaderHandle};
use crate::render::drawable::{Drawable, DrawableId, DrawableState};
use crate::scene::sprite::Sprite;
use crate::scene::transformable::Transformable2D;

/// Node identifier. Nodes share the drawable id space so the scene's node
/// storage doubles as the render system's drawable store.
pub type NodeId = DrawableId;

/// Per-frame update hook, called with the node and the elapsed seconds
pub type NodeHook = Box<dyn FnMut(&mut Node2D, f32)>;

/// What a node draws
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeContent {
    /// Grouping node, never drawn nor indexed
    #[default]
    Empty,
    /// Textured quad
    Sprite(Sprite),
}

/// Node of the 2D scene graph
pub struct Node2D {
    name: Option<String>,
    transform: Transformable2D,
    global_matrix: TransformMatrix,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    content: NodeContent,
    state: DrawableState,
    needs_refresh: bool,
    hook: Option<NodeHook>,
    hook_cleared: bool,
}

impl Default for Node2D {
    fn default() -> Self {
        Self {
            name: None,
            transform: Transformable2D::new(),
            global_matrix: TransformMatrix::identity(),
            parent: None,
            children: Vec::new(),
            content: NodeContent::Empty,
            state: DrawableState::default(),
            needs_refresh: true,
            hook: None,
            hook_cleared: false,
        }
    }
}

impl fmt::Debug for Node2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node2D")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("content", &self.content)
            .field("state", &self.state)
            .field("has_hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl Node2D {
    /// Empty grouping node
    pub fn new() -> Self {
        Self::default()
    }

    /// Node drawing a sprite
    pub fn with_sprite(sprite: Sprite) -> Self {
        Self {
            content: NodeContent::Sprite(sprite),
            ..Self::default()
        }
    }

    /// Set the name (builder pattern)
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the position (builder pattern)
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.transform.set_position(position);
        self
    }

    /// Set the origin (builder pattern)
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.transform.set_origin(origin);
        self
    }

    /// Set the rotation in degrees (builder pattern)
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.transform.set_rotation(degrees);
        self
    }

    /// Set the scale (builder pattern)
    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.transform.set_scale(scale);
        self
    }

    /// Set the draw layer (builder pattern)
    #[must_use]
    pub fn on_layer(mut self, layer: i32) -> Self {
        self.state.layer = layer;
        self
    }

    /// Set the shader (builder pattern)
    #[must_use]
    pub fn with_shader(mut self, shader: ShaderHandle) -> Self {
        self.state.shader = Some(shader);
        self
    }

    /// Set the modulation color (builder pattern)
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.state.color = color;
        self
    }

    /// Set the blend mode (builder pattern)
    #[must_use]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.state.blend = blend;
        self
    }

    /// Start hidden (builder pattern)
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.state.visible = false;
        self
    }

    /// Attach an update hook (builder pattern)
    #[must_use]
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Node2D, f32) + 'static,
    {
        self.hook = Some(Box::new(hook));
        self.hook_cleared = false;
        self
    }

    /// Node name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local transform
    pub fn transform(&self) -> &Transformable2D {
        &self.transform
    }

    /// Mutable local transform. Changes are picked up by the next scene
    /// update.
    pub fn transform_mut(&mut self) -> &mut Transformable2D {
        &mut self.transform
    }

    /// Position in parent coordinates
    pub fn position(&self) -> Vec2 {
        self.transform.position()
    }

    /// Move to a position in parent coordinates
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.set_position(position);
    }

    /// Offset the position
    pub fn move_by(&mut self, offset: Vec2) {
        self.transform.move_by(offset);
    }

    /// Rotate by `degrees`
    pub fn rotate(&mut self, degrees: f32) {
        self.transform.rotate(degrees);
    }

    /// Local to world matrix as of the last scene update
    pub fn global_matrix(&self) -> TransformMatrix {
        self.global_matrix
    }

    /// Parent node, `None` for scene roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Content
    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Sprite content, if any
    pub fn sprite(&self) -> Option<&Sprite> {
        match &self.content {
            NodeContent::Sprite(sprite) => Some(sprite),
            NodeContent::Empty => None,
        }
    }

    /// Mutable sprite content. The node is relocated on the next scene
    /// update since the sprite size may change.
    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        match &mut self.content {
            NodeContent::Sprite(sprite) => {
                self.needs_refresh = true;
                Some(sprite)
            }
            NodeContent::Empty => None,
        }
    }

    /// Whether the node is indexed and drawn
    pub fn is_drawable(&self) -> bool {
        !matches!(self.content, NodeContent::Empty)
    }

    /// Whether the node has an update hook
    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Replace the update hook
    pub fn set_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Node2D, f32) + 'static,
    {
        self.hook = Some(Box::new(hook));
        self.hook_cleared = false;
    }

    /// Remove the update hook
    ///
    /// A hook may call this on its own node to remove itself.
    pub fn clear_hook(&mut self) {
        self.hook = None;
        self.hook_cleared = true;
    }

    pub(crate) fn take_hook(&mut self) -> Option<NodeHook> {
        self.hook_cleared = false;
        self.hook.take()
    }

    /// Put a hook back unless it was replaced or cleared while running
    pub(crate) fn restore_hook(&mut self, hook: NodeHook) {
        if self.hook.is_none() && !self.hook_cleared {
            self.hook = Some(hook);
        }
        self.hook_cleared = false;
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
        self.needs_refresh = true;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }

    pub(crate) fn set_content(&mut self, content: NodeContent) {
        self.content = content;
        self.needs_refresh = true;
    }

    /// Rebuild the global matrix from the parent's.
    ///
    /// Returns true when the global bounds may have moved: the local
    /// transform changed, the node was flagged for refresh, or the parent
    /// moved.
    pub(crate) fn refresh_global(
        &mut self,
        parent_global: TransformMatrix,
        parent_moved: bool,
    ) -> bool {
        let local_changed = self.transform.calculate_matrix();
        if !(local_changed || parent_moved || self.needs_refresh) {
            return false;
        }
        self.global_matrix = parent_global * self.transform.matrix();
        self.needs_refresh = false;
        true
    }
}

impl Drawable for Node2D {
    fn state(&self) -> &DrawableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DrawableState {
        &mut self.state
    }

    fn local_bounds(&self) -> FloatRect {
        self.sprite().map(Sprite::local_bounds).unwrap_or_default()
    }

    fn global_bounds(&self) -> FloatRect {
        self.global_matrix * self.local_bounds()
    }

    fn draw_info(&self) -> DrawInfo {
        let Some(sprite) = self.sprite() else {
            return DrawInfo::default();
        };

        let mut render_params = sprite.render_params();
        render_params.blend = self.state.blend;
        render_params.color = self.state.color;
        render_params.transform = self.global_matrix;

        DrawInfo {
            shader: self.state.shader,
            shader_setup: sprite.shader_setup(),
            render_params,
        }
    }
}

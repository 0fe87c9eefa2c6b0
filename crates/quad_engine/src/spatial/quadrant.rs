//! Quadrant tree spatial partitioning structure
//!
//! Divides a 2D world into a hierarchy of rectangular quadrants. Every
//! drawable is assigned to the deepest quadrant whose area fully contains its
//! global bounds; drawables straddling a child boundary stay at the parent.
//!
//! All quadrants live in one arena owned by [`QuadTree`] and refer to each
//! other by [`QuadrantId`]. Children are owned top-down, the parent link is a
//! plain index used to walk upwards during relocation.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Index, IndexMut};

use crate::foundation::math::{FloatRect, Vec2};
use crate::render::drawable::{DrawableId, DrawableStore};

/// Drawables grouped by layer, iterated in ascending layer order
pub type LayerMap = BTreeMap<i32, BTreeSet<DrawableId>>;

/// Index of a quadrant inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadrantId(usize);

impl QuadrantId {
    /// Position in the tree's arena
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Child slot of a quadrant. The y axis points down, so north is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left child
    NorthWest = 0,
    /// Top-right child
    NorthEast = 1,
    /// Bottom-left child
    SouthWest = 2,
    /// Bottom-right child
    SouthEast = 3,
}

impl Corner {
    /// All corners in slot order
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Corner for a cell offset inside a 2x2 block
    pub const fn from_offsets(south: bool, east: bool) -> Self {
        match (south, east) {
            (false, false) => Self::NorthWest,
            (false, true) => Self::NorthEast,
            (true, false) => Self::SouthWest,
            (true, true) => Self::SouthEast,
        }
    }

    /// Slot index, `0..4`
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Single node in the quadrant hierarchy
#[derive(Debug, Clone)]
pub struct Quadrant {
    area: FloatRect,
    children: [Option<QuadrantId>; 4],
    parent: Option<QuadrantId>,
    drawables: BTreeSet<DrawableId>,
}

impl Quadrant {
    fn new(area: FloatRect) -> Self {
        Self {
            area,
            children: [None; 4],
            parent: None,
            drawables: BTreeSet::new(),
        }
    }

    /// World-space area covered by this quadrant
    pub fn area(&self) -> FloatRect {
        self.area
    }

    /// Parent quadrant, `None` for the root or a detached quadrant
    pub fn parent(&self) -> Option<QuadrantId> {
        self.parent
    }

    /// Child in a given slot
    pub fn child(&self, corner: Corner) -> Option<QuadrantId> {
        self.children[corner.index()]
    }

    /// Live children in slot order
    pub fn children(&self) -> impl Iterator<Item = QuadrantId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Check whether the quadrant has no children
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Drawables assigned to exactly this quadrant
    pub fn drawables(&self) -> impl Iterator<Item = DrawableId> + '_ {
        self.drawables.iter().copied()
    }

    /// Number of drawables assigned to exactly this quadrant
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Check whether a drawable is assigned to this quadrant
    pub fn has_drawable(&self, id: DrawableId) -> bool {
        self.drawables.contains(&id)
    }

    /// Assign a drawable to this quadrant. Returns false if it already was.
    pub fn add_draw_child(&mut self, id: DrawableId) -> bool {
        self.drawables.insert(id)
    }

    /// Unassign a drawable. Returns false if it was not assigned here.
    pub fn delete_draw_child(&mut self, id: DrawableId) -> bool {
        self.drawables.remove(&id)
    }

    /// Check if a point lies inside the quadrant area
    pub fn contains(&self, point: Vec2) -> bool {
        self.area.contains(point)
    }

    /// Check if a rectangle lies entirely inside the quadrant area
    pub fn contains_rect(&self, rect: &FloatRect) -> bool {
        self.area.contains_rect(rect)
    }
}

/// Quadrant tree
///
/// The root is always the first quadrant of the arena. Topology is fixed once
/// construction is done; only drawable assignment changes afterwards.
#[derive(Debug, Clone)]
pub struct QuadTree {
    quadrants: Vec<Quadrant>,
}

impl QuadTree {
    /// Create a tree consisting of a root quadrant only
    pub fn new(area: FloatRect) -> Self {
        Self {
            quadrants: vec![Quadrant::new(area)],
        }
    }

    /// Root quadrant id
    pub const fn root(&self) -> QuadrantId {
        QuadrantId(0)
    }

    /// Root quadrant area
    pub fn area(&self) -> FloatRect {
        self.quadrants[0].area
    }

    /// Quadrant by id
    pub fn get(&self, id: QuadrantId) -> Option<&Quadrant> {
        self.quadrants.get(id.0)
    }

    /// Mutable quadrant by id
    pub fn get_mut(&mut self, id: QuadrantId) -> Option<&mut Quadrant> {
        self.quadrants.get_mut(id.0)
    }

    /// Number of quadrants, root included
    pub fn len(&self) -> usize {
        self.quadrants.len()
    }

    /// Always false: a tree owns at least its root
    pub fn is_empty(&self) -> bool {
        self.quadrants.is_empty()
    }

    /// All quadrants with their ids, in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (QuadrantId, &Quadrant)> {
        self.quadrants
            .iter()
            .enumerate()
            .map(|(i, q)| (QuadrantId(i), q))
    }

    /// Allocate a detached quadrant, to be attached with [`QuadTree::add_child`]
    pub fn insert_quadrant(&mut self, area: FloatRect) -> QuadrantId {
        self.quadrants.push(Quadrant::new(area));
        QuadrantId(self.quadrants.len() - 1)
    }

    /// Attach `child` to `parent` in the given slot.
    ///
    /// Only meant for tree construction. Re-parenting an attached quadrant or
    /// overwriting an occupied slot leaves the old links dangling.
    pub fn add_child(&mut self, parent: QuadrantId, child: QuadrantId, corner: Corner) {
        if parent.0 >= self.quadrants.len() || child.0 >= self.quadrants.len() {
            log::error!(
                "Cannot attach quadrant {:?} to {:?}: id out of range",
                child,
                parent
            );
            return;
        }
        self.quadrants[parent.0].children[corner.index()] = Some(child);
        self.quadrants[child.0].parent = Some(parent);
    }

    /// Number of levels, 1 for a root without children
    pub fn depth(&self) -> usize {
        self.depth_from(self.root())
    }

    fn depth_from(&self, id: QuadrantId) -> usize {
        1 + self[id]
            .children()
            .map(|child| self.depth_from(child))
            .max()
            .unwrap_or(0)
    }

    /// Level of a quadrant, 0 for the root
    pub fn level(&self, id: QuadrantId) -> usize {
        let mut level = 0;
        let mut current = self[id].parent;
        while let Some(parent) = current {
            level += 1;
            current = self[parent].parent;
        }
        level
    }

    /// Find the quadrant a drawable with `bounds` belongs to, starting at the
    /// quadrant it is currently assigned to.
    ///
    /// Walks up while the quadrant does not fully contain the bounds, then
    /// down through the first child (in slot order) that does. Cost is
    /// proportional to the tree depth.
    pub fn best_fit(&self, start: QuadrantId, bounds: &FloatRect) -> QuadrantId {
        let mut current = start;
        while let Some(parent) = self[current].parent {
            if self[current].contains_rect(bounds) {
                break;
            }
            current = parent;
        }

        'descend: loop {
            for child in self[current].children() {
                if self[child].contains_rect(bounds) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Collect every drawable held by a quadrant whose area intersects
    /// `query`, grouped by layer.
    ///
    /// Culling happens per quadrant: a drawable is returned when its quadrant
    /// intersects the query, whatever its own bounds are.
    pub fn find_objects<S>(&self, query: &FloatRect, store: &S, out: &mut LayerMap)
    where
        S: DrawableStore + ?Sized,
    {
        self.find_objects_from(self.root(), query, store, out);
    }

    /// [`QuadTree::find_objects`] restricted to the subtree under `start`
    pub fn find_objects_from<S>(
        &self,
        start: QuadrantId,
        query: &FloatRect,
        store: &S,
        out: &mut LayerMap,
    ) where
        S: DrawableStore + ?Sized,
    {
        let Some(quadrant) = self.get(start) else {
            return;
        };
        if !quadrant.area.intersects(query) {
            return;
        }

        for id in quadrant.drawables() {
            match store.drawable(id) {
                Some(drawable) => {
                    out.entry(drawable.layer()).or_default().insert(id);
                }
                None => log::warn!("Quadrant {:?} holds unknown drawable {:?}", start, id),
            }
        }

        for child in quadrant.children() {
            self.find_objects_from(child, query, store, out);
        }
    }

    /// Remove every drawable assignment, keeping the topology
    pub fn clear_drawables(&mut self) {
        for quadrant in &mut self.quadrants {
            quadrant.drawables.clear();
        }
    }
}

impl Index<QuadrantId> for QuadTree {
    type Output = Quadrant;

    fn index(&self, id: QuadrantId) -> &Quadrant {
        &self.quadrants[id.0]
    }
}

impl IndexMut<QuadrantId> for QuadTree {
    fn index_mut(&mut self, id: QuadrantId) -> &mut Quadrant {
        &mut self.quadrants[id.0]
    }
}

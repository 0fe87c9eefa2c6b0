//! Bottom-up quadrant tree construction
//!
//! The world is cut into a grid of equally sized leaf cells. Neighbouring
//! 2x2 blocks are then merged level by level into parent quadrants until at
//! most 2x2 quadrants remain; those become the children of the root.

use crate::config::QuadGridConfig;
use crate::foundation::math::{FloatRect, Vec2};
use crate::spatial::quadrant::{Corner, QuadTree, QuadrantId};

/// Builder for balanced quadrant trees over a cell grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTreeBuilder {
    origin: Vec2,
    cell_size: Vec2,
    columns: usize,
    rows: usize,
}

impl QuadTreeBuilder {
    /// Create a builder for a `columns` x `rows` grid of `cell_size` cells
    /// whose top-left corner is `origin`
    pub fn new(origin: Vec2, cell_size: Vec2, columns: usize, rows: usize) -> Self {
        Self {
            origin,
            cell_size,
            columns,
            rows,
        }
    }

    /// Area covered by the whole grid
    #[allow(clippy::cast_precision_loss)]
    pub fn world_area(&self) -> FloatRect {
        FloatRect::from_pos(
            self.origin,
            self.cell_size.x * self.columns as f32,
            self.cell_size.y * self.rows as f32,
        )
    }

    /// A grid with at most one cell, or with empty cells, produces no
    /// children
    pub fn is_degenerate(&self) -> bool {
        self.columns.saturating_mul(self.rows) <= 1
            || self.cell_size.x <= 0.0
            || self.cell_size.y <= 0.0
    }

    /// Build a new tree whose root covers the grid
    pub fn build(&self) -> QuadTree {
        let mut tree = QuadTree::new(self.world_area());
        let root = tree.root();
        self.attach(&mut tree, root);
        tree
    }

    /// Build the grid hierarchy under an existing quadrant
    #[allow(clippy::cast_precision_loss)]
    pub fn attach(&self, tree: &mut QuadTree, root: QuadrantId) {
        if self.is_degenerate() {
            log::debug!(
                "Degenerate quadrant grid {}x{}, root left without children",
                self.columns,
                self.rows
            );
            return;
        }

        let mut level: Vec<Vec<QuadrantId>> = (0..self.rows)
            .map(|i| {
                (0..self.columns)
                    .map(|j| {
                        tree.insert_quadrant(FloatRect::new(
                            self.origin.x + j as f32 * self.cell_size.x,
                            self.origin.y + i as f32 * self.cell_size.y,
                            self.cell_size.x,
                            self.cell_size.y,
                        ))
                    })
                    .collect()
            })
            .collect();

        while level.len() > 2 || level[0].len() > 2 {
            level = merge_level(tree, &level);
        }

        for (i, row) in level.iter().enumerate() {
            for (j, &quadrant) in row.iter().enumerate() {
                tree.add_child(root, quadrant, Corner::from_offsets(i == 1, j == 1));
            }
        }

        log::debug!(
            "Built quadrant tree: {}x{} cells, {} quadrants, depth {}",
            self.columns,
            self.rows,
            tree.len(),
            tree.depth()
        );
    }
}

/// Merge every 2x2 block of `level` into one parent quadrant. Blocks on an odd
/// edge have fewer than four children.
fn merge_level(tree: &mut QuadTree, level: &[Vec<QuadrantId>]) -> Vec<Vec<QuadrantId>> {
    let rows = level.len();
    let columns = level[0].len();

    (0..rows.div_ceil(2))
        .map(|pi| {
            (0..columns.div_ceil(2))
                .map(|pj| {
                    let block: Vec<(Corner, QuadrantId)> = [(0, 0), (0, 1), (1, 0), (1, 1)]
                        .into_iter()
                        .filter_map(|(di, dj)| {
                            let row = level.get(2 * pi + di)?;
                            let child = *row.get(2 * pj + dj)?;
                            Some((Corner::from_offsets(di == 1, dj == 1), child))
                        })
                        .collect();

                    let area = block
                        .iter()
                        .map(|&(_, child)| tree[child].area())
                        .reduce(|acc, area| acc.union(&area))
                        .unwrap_or_default();

                    let parent = tree.insert_quadrant(area);
                    for (corner, child) in block {
                        tree.add_child(parent, child, corner);
                    }
                    parent
                })
                .collect()
        })
        .collect()
}

impl From<&QuadGridConfig> for QuadTreeBuilder {
    fn from(config: &QuadGridConfig) -> Self {
        Self::new(
            Vec2::new(config.origin[0], config.origin[1]),
            Vec2::new(config.cell_size[0], config.cell_size[1]),
            config.columns as usize,
            config.rows as usize,
        )
    }
}

impl QuadTree {
    /// Build a balanced tree over the grid described by `config`
    pub fn build(config: &QuadGridConfig) -> Self {
        QuadTreeBuilder::from(config).build()
    }
}

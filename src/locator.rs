//! Bounding-volume hierarchy over the cells of a `PolyData`, used to find
//! candidate cell pairs of two surfaces without testing every combination.

use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::polydata::PolyData;
use nalgebra::Point3;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf { aabb: Aabb, cells: Vec<usize> },
    Branch { aabb: Aabb, left: usize, right: usize },
}

impl TreeNode {
    const fn aabb(&self) -> &Aabb {
        match self {
            TreeNode::Leaf { aabb, .. } | TreeNode::Branch { aabb, .. } => aabb,
        }
    }
}

/// Cell hierarchy built by median splits along the longest box axis.
#[derive(Debug, Clone)]
pub struct CellTree {
    nodes: Vec<TreeNode>,
    cell_boxes: Vec<Option<Aabb>>,
    root: Option<usize>,
}

impl CellTree {
    /// Boxes are grown by this margin so touching cells count as overlapping.
    pub const MARGIN: Real = 1e-6;

    pub fn build(pd: &PolyData, cells_per_node: usize) -> Self {
        let cells_per_node = cells_per_node.max(1);
        let cell_boxes: Vec<Option<Aabb>> = (0..pd.number_of_cells())
            .map(|i| pd.cell_bounding_box(i).map(|b| b.loosened(Self::MARGIN)))
            .collect();

        let mut tree = CellTree {
            nodes: Vec::new(),
            cell_boxes,
            root: None,
        };

        let cells: Vec<usize> = (0..pd.number_of_cells())
            .filter(|&i| tree.cell_boxes[i].is_some())
            .collect();
        if !cells.is_empty() {
            tree.root = Some(tree.build_node(cells, cells_per_node));
        }
        tree
    }

    fn bounds_of(&self, cells: &[usize]) -> Aabb {
        cells
            .iter()
            .filter_map(|&c| self.cell_boxes[c])
            .reduce(|a, b| a.merged(&b))
            .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
    }

    fn build_node(&mut self, mut cells: Vec<usize>, cells_per_node: usize) -> usize {
        let aabb = self.bounds_of(&cells);

        if cells.len() <= cells_per_node {
            self.nodes.push(TreeNode::Leaf { aabb, cells });
            return self.nodes.len() - 1;
        }

        let axis = aabb.longest_axis();
        cells.sort_by(|&a, &b| {
            let ca = self.cell_boxes[a].map_or(0.0, |bb| bb.center()[axis]);
            let cb = self.cell_boxes[b].map_or(0.0, |bb| bb.center()[axis]);
            ca.total_cmp(&cb)
        });
        let right_cells = cells.split_off(cells.len() / 2);

        let left = self.build_node(cells, cells_per_node);
        let right = self.build_node(right_cells, cells_per_node);
        self.nodes.push(TreeNode::Branch { aabb, left, right });
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Cells whose box overlaps `aabb`.
    pub fn cells_overlapping(&self, aabb: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.aabb().intersects(aabb) {
                continue;
            }
            match node {
                TreeNode::Leaf { cells, .. } => out.extend(
                    cells
                        .iter()
                        .copied()
                        .filter(|&c| self.cell_boxes[c].is_some_and(|b| b.intersects(aabb))),
                ),
                TreeNode::Branch { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                },
            }
        }
        out
    }

    /// Call `visit(cell_self, cell_other)` for every pair of cells whose boxes
    /// overlap, descending both hierarchies together.
    pub fn for_each_overlap<F>(&self, other: &CellTree, mut visit: F)
    where
        F: FnMut(usize, usize),
    {
        let (Some(ra), Some(rb)) = (self.root, other.root) else {
            return;
        };

        let mut stack = vec![(ra, rb)];
        while let Some((a, b)) = stack.pop() {
            let na = &self.nodes[a];
            let nb = &other.nodes[b];
            if !na.aabb().intersects(nb.aabb()) {
                continue;
            }

            match (na, nb) {
                (TreeNode::Leaf { cells: ca, .. }, TreeNode::Leaf { cells: cb, .. }) => {
                    for &i in ca {
                        for &j in cb {
                            if let (Some(bi), Some(bj)) = (self.cell_boxes[i], other.cell_boxes[j]) {
                                if bi.intersects(&bj) {
                                    visit(i, j);
                                }
                            }
                        }
                    }
                },
                (TreeNode::Branch { left, right, .. }, TreeNode::Leaf { .. }) => {
                    stack.push((*right, b));
                    stack.push((*left, b));
                },
                (TreeNode::Leaf { .. }, TreeNode::Branch { left, right, .. }) => {
                    stack.push((a, *right));
                    stack.push((a, *left));
                },
                (
                    TreeNode::Branch {
                        aabb: aa,
                        left: la,
                        right: ra,
                    },
                    TreeNode::Branch {
                        aabb: ab,
                        left: lb,
                        right: rb,
                    },
                ) => {
                    // Descend into the larger box first.
                    if aa.extents().norm_squared() >= ab.extents().norm_squared() {
                        stack.push((*ra, b));
                        stack.push((*la, b));
                    } else {
                        stack.push((a, *rb));
                        stack.push((a, *lb));
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::CubeSource;
    use nalgebra::Vector3;

    #[test]
    fn overlap_pairs_match_brute_force() {
        let a = CubeSource::default().polydata().unwrap();
        let b = CubeSource::default()
            .translated(Vector3::new(0.7, 0.2, 0.1))
            .polydata()
            .unwrap();

        let ta = CellTree::build(&a, 1);
        let tb = CellTree::build(&b, 1);

        let mut pairs = Vec::new();
        ta.for_each_overlap(&tb, |i, j| pairs.push((i, j)));
        pairs.sort();

        let mut expected = Vec::new();
        for i in 0..a.number_of_cells() {
            for j in 0..b.number_of_cells() {
                let bi = a.cell_bounding_box(i).unwrap().loosened(CellTree::MARGIN);
                let bj = b.cell_bounding_box(j).unwrap().loosened(CellTree::MARGIN);
                if bi.intersects(&bj) {
                    expected.push((i, j));
                }
            }
        }
        assert_eq!(pairs, expected);
        assert!(!pairs.is_empty());
    }

    #[test]
    fn query_by_box() {
        let a = CubeSource::default().polydata().unwrap();
        let tree = CellTree::build(&a, 2);
        let query = Aabb::new(Point3::new(0.4, -0.1, -0.1), Point3::new(0.6, 0.1, 0.1));
        // Only the +x face reaches x = 0.4.
        assert_eq!(tree.cells_overlapping(&query), vec![1]);
    }
}

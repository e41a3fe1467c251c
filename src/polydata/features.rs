//! Edge statistics over the polygonal cells.

use super::PolyData;
use hashbrown::{HashMap, HashSet};

impl PolyData {
    /// How many polygonal cells use each undirected edge, keyed `(min, max)`.
    fn edge_use_counts(&self) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::new();
        for cell in self.cells.iter().filter(|c| c.kind.is_polygonal()) {
            for (a, b) in cell.edges() {
                if a == b {
                    continue;
                }
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Edges used by more than two polygonal cells, stored in both directions
    /// so lookups do not depend on the winding of the querying cell.
    pub fn non_manifold_edges(&self) -> HashSet<(usize, usize)> {
        self.edge_use_counts()
            .into_iter()
            .filter(|&(_, n)| n > 2)
            .flat_map(|((a, b), _)| [(a, b), (b, a)])
            .collect()
    }

    /// Edges used by exactly one polygonal cell, as `(min, max)` pairs.
    pub fn boundary_edges(&self) -> HashSet<(usize, usize)> {
        self.edge_use_counts()
            .into_iter()
            .filter(|&(_, n)| n == 1)
            .map(|(e, _)| e)
            .collect()
    }

    /// Closed two-manifold surface: every edge shared by exactly two cells.
    pub fn is_manifold(&self) -> bool {
        let counts = self.edge_use_counts();
        !counts.is_empty() && counts.values().all(|&n| n == 2)
    }
}

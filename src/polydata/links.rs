use super::PolyData;

/// Upward links from every point to the cells using it.
#[derive(Debug, Clone, Default)]
pub struct CellLinks {
    links: Vec<Vec<usize>>,
}

impl CellLinks {
    pub fn cells_of(&self, point_id: usize) -> &[usize] {
        self.links.get(point_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl PolyData {
    pub fn build_links(&self) -> CellLinks {
        let mut links = vec![Vec::new(); self.points.len()];
        for (cell_id, cell) in self.cells.iter().enumerate() {
            for &p in &cell.ids {
                if let Some(l) = links.get_mut(p) {
                    if l.last() != Some(&cell_id) {
                        l.push(cell_id);
                    }
                }
            }
        }
        CellLinks { links }
    }

    /// Cells other than `cell_id` that use both `p` and `q`.
    pub fn edge_neighbors(&self, links: &CellLinks, cell_id: usize, p: usize, q: usize) -> Vec<usize> {
        links
            .cells_of(p)
            .iter()
            .copied()
            .filter(|&c| c != cell_id && self.cells[c].ids.contains(&q))
            .collect()
    }
}

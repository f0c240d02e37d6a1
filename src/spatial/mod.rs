use std::collections::HashMap;

use crate::types::Vec2;

/// Uniform grid bucketing point indices by cell. With `cell_size` at least the
/// query radius, every point within that radius lies in the 3x3 block of cells
/// around the query point.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.cells.clear();
        for (idx, pos) in positions.into_iter().enumerate() {
            let key = self.cell_key(pos);
            self.cells.entry(key).or_default().push(idx);
        }
    }

    /// Indices greater than `idx` stored in the cells around `pos`, ascending.
    pub fn neighbors_after(&self, idx: usize, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_key(pos);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend(indices.iter().copied().filter(|&j| j > idx));
                }
            }
        }
        out.sort_unstable();
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

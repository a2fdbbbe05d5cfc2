use std::collections::HashMap;

/// Spatial index for region bounding boxes using conservative approximation.
/// Each region's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by the point-in-polygon test in the caller).
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from region bounding boxes `(min_lon, min_lat, max_lon, max_lat)`
    pub fn build(bboxes: impl Iterator<Item = (f64, f64, f64, f64)>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, (min_lon, min_lat, max_lon, max_lat)) in bboxes.enumerate() {
            let min_cell = grid.to_cell(min_lon, min_lat);
            let max_cell = grid.to_cell(max_lon, max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate region indices whose bounding box may contain the point,
    /// in insertion order
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_point() {
        let grid = FeatureGrid::build(
            vec![(0.0, 0.0, 15.0, 5.0), (-30.0, -30.0, -25.0, -25.0)].into_iter(),
            10.0,
        );

        assert_eq!(grid.query_point(12.0, 3.0), &[0]);
        assert_eq!(grid.query_point(-27.0, -27.0), &[1]);
        assert!(grid.query_point(100.0, 50.0).is_empty());
    }

    #[test]
    fn test_overlapping_boxes_keep_order() {
        let grid = FeatureGrid::build(
            vec![(0.0, 0.0, 9.0, 9.0), (1.0, 1.0, 2.0, 2.0)].into_iter(),
            10.0,
        );
        assert_eq!(grid.query_point(1.5, 1.5), &[0, 1]);
    }
}

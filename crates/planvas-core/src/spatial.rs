//! Uniform-grid spatial index over element bounds.
//!
//! Bounds are bucketed into square cells; point and rectangle queries only
//! visit the cells they touch. Very large entries (e.g. huge frames) would
//! cover thousands of cells, so they are kept in a separate list that every
//! query scans linearly.

use crate::element::ElementId;
use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect};
use smallvec::SmallVec;

/// Entries covering more cells than this go to the oversized list.
const MAX_CELLS_PER_ENTRY: i64 = 1024;

type CellKey = (i64, i64);

/// Inclusive point-in-rect test (edges count as inside).
pub fn rect_contains_point(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Rectangles overlap unless they are disjoint on either axis.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    !(a.x1 < b.x0 || b.x1 < a.x0 || a.y1 < b.y0 || b.y1 < a.y0)
}

#[derive(Debug, Clone, Copy)]
struct CellRange {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl CellRange {
    /// Saturates at `i64::MAX` for ranges spanning most of the coordinate space.
    fn cell_count(&self) -> i64 {
        let width = self.x1.saturating_sub(self.x0).saturating_add(1);
        let height = self.y1.saturating_sub(self.y0).saturating_add(1);
        width.saturating_mul(height)
    }

    fn cells(self) -> impl Iterator<Item = CellKey> {
        (self.x0..=self.x1).flat_map(move |x| (self.y0..=self.y1).map(move |y| (x, y)))
    }
}

/// Grid index mapping cells to the elements whose bounds touch them.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, SmallVec<[ElementId; 8]>>,
    entries: HashMap<ElementId, Rect>,
    oversized: HashSet<ElementId>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(256.0)
    }
}

impl SpatialIndex {
    /// Create an empty index with the given cell side length.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 256.0 },
            cells: HashMap::new(),
            entries: HashMap::new(),
            oversized: HashSet::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Bounds the index currently holds for `id`.
    pub fn bounds_of(&self, id: ElementId) -> Option<Rect> {
        self.entries.get(&id).copied()
    }

    fn cell_coord(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    fn cell_range(&self, rect: Rect) -> CellRange {
        let rect = rect.abs();
        CellRange {
            x0: self.cell_coord(rect.x0),
            y0: self.cell_coord(rect.y0),
            x1: self.cell_coord(rect.x1),
            y1: self.cell_coord(rect.y1),
        }
    }

    /// Insert or replace the bounds for `id`.
    pub fn insert(&mut self, id: ElementId, bounds: Rect) {
        if self.entries.contains_key(&id) {
            self.remove(id);
        }
        let range = self.cell_range(bounds);
        if range.cell_count() > MAX_CELLS_PER_ENTRY {
            self.oversized.insert(id);
        } else {
            for key in range.cells() {
                self.cells.entry(key).or_default().push(id);
            }
        }
        self.entries.insert(id, bounds.abs());
    }

    /// Update bounds for `id`; skipped when unchanged.
    pub fn update(&mut self, id: ElementId, bounds: Rect) {
        if self.entries.get(&id) == Some(&bounds.abs()) {
            return;
        }
        self.insert(id, bounds);
    }

    /// Remove `id`; no-op if absent.
    pub fn remove(&mut self, id: ElementId) {
        let Some(old) = self.entries.remove(&id) else {
            return;
        };
        if self.oversized.remove(&id) {
            return;
        }
        for key in self.cell_range(old).cells() {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|member| *member != id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.oversized.clear();
    }

    /// Replace the whole index contents.
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (ElementId, Rect)>,
    {
        self.clear();
        for (id, bounds) in items {
            self.insert(id, bounds);
        }
    }

    /// Ids whose indexed bounds contain `point` (edges inclusive). Unordered.
    pub fn query_point(&self, point: Point) -> Vec<ElementId> {
        let key = (self.cell_coord(point.x), self.cell_coord(point.y));
        let mut out: Vec<ElementId> = self
            .cells
            .get(&key)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|b| rect_contains_point(*b, point))
            })
            .collect();
        out.extend(self.oversized.iter().copied().filter(|id| {
            self.entries
                .get(id)
                .is_some_and(|b| rect_contains_point(*b, point))
        }));
        out
    }

    /// Ids whose indexed bounds overlap `rect`. Unordered, no duplicates.
    pub fn query_rect(&self, rect: Rect) -> Vec<ElementId> {
        let rect = rect.abs();
        let range = self.cell_range(rect);
        let mut seen: HashSet<ElementId> = HashSet::new();
        let mut out = Vec::new();

        let mut consider = |id: ElementId| {
            if seen.insert(id) && self.entries.get(&id).is_some_and(|b| rects_overlap(*b, rect)) {
                out.push(id);
            }
        };

        if range.cell_count() > self.cells.len() as i64 {
            // Query covers more cells than are occupied: walk the occupied ones.
            for (key, bucket) in &self.cells {
                let inside_x = key.0 >= range.x0 && key.0 <= range.x1;
                if inside_x && key.1 >= range.y0 && key.1 <= range.y1 {
                    bucket.iter().copied().for_each(&mut consider);
                }
            }
        } else {
            for key in range.cells() {
                if let Some(bucket) = self.cells.get(&key) {
                    bucket.iter().copied().for_each(&mut consider);
                }
            }
        }
        self.oversized.iter().copied().for_each(&mut consider);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_point_query() {
        let mut index = SpatialIndex::new(100.0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 50.0, 50.0));
        index.insert(b, Rect::new(40.0, 40.0, 250.0, 250.0));

        let hits = index.query_point(Point::new(45.0, 45.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(index.query_point(Point::new(200.0, 200.0)), vec![b]);
        assert!(index.query_point(Point::new(-5.0, 0.0)).is_empty());
    }

    #[test]
    fn test_edges_are_inclusive() {
        let mut index = SpatialIndex::new(100.0);
        let a = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(index.query_point(Point::new(100.0, 100.0)), vec![a]);
        assert_eq!(index.query_rect(Rect::new(100.0, 0.0, 150.0, 10.0)), vec![a]);
    }

    #[test]
    fn test_update_moves_entry() {
        let mut index = SpatialIndex::new(64.0);
        let a = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.update(a, Rect::new(500.0, 500.0, 510.0, 510.0));
        assert!(index.query_point(Point::new(5.0, 5.0)).is_empty());
        assert_eq!(index.query_point(Point::new(505.0, 505.0)), vec![a]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = SpatialIndex::new(64.0);
        let a = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 200.0, 200.0));
        index.remove(a);
        index.remove(a);
        assert!(index.is_empty());
        assert!(index.query_rect(Rect::new(-1000.0, -1000.0, 1000.0, 1000.0)).is_empty());
    }

    #[test]
    fn test_rect_query_no_duplicates() {
        let mut index = SpatialIndex::new(10.0);
        let a = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 95.0, 95.0));
        let hits = index.query_rect(Rect::new(5.0, 5.0, 90.0, 90.0));
        assert_eq!(hits, vec![a]);
    }

    #[test]
    fn test_oversized_entries() {
        let mut index = SpatialIndex::new(1.0);
        let big = Uuid::new_v4();
        index.insert(big, Rect::new(-5000.0, -5000.0, 5000.0, 5000.0));
        assert_eq!(index.query_point(Point::new(1234.0, -42.0)), vec![big]);
        assert_eq!(index.query_rect(Rect::new(4999.0, 4999.0, 6000.0, 6000.0)), vec![big]);
        index.remove(big);
        assert!(index.query_point(Point::ZERO).is_empty());
    }

    #[test]
    fn test_negative_coordinates() {
        let mut index = SpatialIndex::new(100.0);
        let a = Uuid::new_v4();
        index.insert(a, Rect::new(-150.0, -150.0, -120.0, -120.0));
        assert_eq!(index.query_point(Point::new(-130.0, -130.0)), vec![a]);
        assert!(index.query_point(Point::new(-100.0, -100.0)).is_empty());
    }

    #[test]
    fn test_overlap_helper() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!rects_overlap(a, Rect::new(11.0, 0.0, 20.0, 10.0)));
        assert!(!rects_overlap(a, Rect::new(0.0, 10.5, 10.0, 20.0)));
    }

    #[test]
    fn test_far_out_entry_goes_oversized() {
        let mut index = SpatialIndex::new(256.0);
        let huge = Uuid::new_v4();
        index.insert(huge, Rect::new(-1e300, 0.0, 1e300, 10.0));
        assert!(index.oversized.contains(&huge));
        assert_eq!(index.query_point(Point::new(12345.0, 5.0)), vec![huge]);

        index.update(huge, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!index.oversized.contains(&huge));
        assert_eq!(index.query_point(Point::new(5.0, 5.0)), vec![huge]);
    }

    #[test]
    fn test_far_out_query_walks_occupied_cells() {
        let mut index = SpatialIndex::new(256.0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.insert(b, Rect::new(-5000.0, 7000.0, -4990.0, 7010.0));

        let mut hits = index.query_rect(Rect::new(-1e300, -1e300, 1e300, 1e300));
        hits.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(hits, expected);
        assert!(index.query_rect(Rect::new(1e299, 1e299, 1e300, 1e300)).is_empty());
    }
}

//! Scratch mask of cells already counted during one pose evaluation.

use super::occupancy::cell_count;
use super::OccupancyMap;
use crate::error::Result;

/// One flag per map cell.
///
/// Owned by the caller of a scoring pass and reset before each pose, so
/// the map itself stays immutable and shareable.
#[derive(Debug, Clone, Default)]
pub struct VisitedMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl VisitedMask {
    /// Create a cleared mask for a `width × height` grid.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            bits: vec![false; len],
        })
    }

    /// Create a cleared mask matching `map`.
    pub fn for_map(map: &OccupancyMap) -> Self {
        Self {
            width: map.width(),
            height: map.height(),
            bits: vec![false; map.cells().len()],
        }
    }

    /// Clear every flag, resizing if `map` has different dimensions.
    pub fn reset(&mut self, map: &OccupancyMap) {
        if (self.width, self.height) != map.dimensions() {
            *self = Self::for_map(map);
        } else {
            self.bits.fill(false);
        }
    }

    /// Mark a cell. Returns `true` if it was not marked before.
    ///
    /// Out-of-bounds cells are never recorded and always report `true`.
    #[inline]
    pub fn mark(&mut self, i: i64, j: i64) -> bool {
        if i < 0 || j < 0 || i as usize >= self.width || j as usize >= self.height {
            return true;
        }
        let idx = j as usize * self.width + i as usize;
        !std::mem::replace(&mut self.bits[idx], true)
    }

    /// Whether a cell has been marked.
    #[inline]
    pub fn is_marked(&self, i: i64, j: i64) -> bool {
        if i < 0 || j < 0 || i as usize >= self.width || j as usize >= self.height {
            return false;
        }
        self.bits[j as usize * self.width + i as usize]
    }

    /// Number of marked cells.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_once() {
        let mut mask = VisitedMask::new(3, 3).unwrap();
        assert!(mask.mark(1, 1));
        assert!(!mask.mark(1, 1));
        assert!(mask.is_marked(1, 1));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_out_of_bounds_never_recorded() {
        let mut mask = VisitedMask::new(2, 2).unwrap();
        assert!(mask.mark(-1, 0));
        assert!(mask.mark(-1, 0));
        assert!(!mask.is_marked(5, 5));
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn test_reset() {
        let mut mask = VisitedMask::for_map(&OccupancyMap::new(2, 2).unwrap());
        mask.mark(0, 0);
        mask.reset(&OccupancyMap::new(2, 2).unwrap());
        assert_eq!(mask.count(), 0);

        mask.reset(&OccupancyMap::new(4, 1).unwrap());
        assert!(mask.mark(3, 0));
        assert!(mask.is_marked(3, 0));
    }

    #[test]
    fn test_oversized_mask_rejected() {
        assert!(VisitedMask::new(usize::MAX, 2).is_err());
    }
}

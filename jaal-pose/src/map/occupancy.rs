//! Occupancy map read from a thresholded image.
//!
//! Cells hold values in [0, 1]. A cell counts as occupied only when its
//! value is exactly [`OCCUPIED`]. Storage is row-major:
//! `index = j * width + i` where `i` is the column and `j` the row.

use std::path::Path;

use crate::error::{Error, Result};

/// Cell value marking an occupied cell.
pub const OCCUPIED: f32 = 1.0;

/// Value reported for cells outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sentinel {
    /// Out-of-bounds reads as free (0.0)
    #[default]
    Low,
    /// Out-of-bounds reads as occupied (1.0)
    High,
}

impl Sentinel {
    /// Cell value this sentinel stands for.
    #[inline]
    pub fn value(self) -> f32 {
        match self {
            Sentinel::Low => 0.0,
            Sentinel::High => OCCUPIED,
        }
    }
}

/// Number of cells in a `width × height` grid, rejecting sizes that overflow.
pub(crate) fn cell_count(width: usize, height: usize) -> Result<usize> {
    width.checked_mul(height).ok_or_else(|| {
        Error::InvalidParameter(format!("grid {}x{} is too large", width, height))
    })
}

/// Immutable 2D occupancy map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyMap {
    /// Grid width in cells (columns).
    width: usize,

    /// Grid height in cells (rows).
    height: usize,

    /// Row-major cell values.
    cells: Vec<f32>,

    /// Cached count of cells equal to [`OCCUPIED`].
    num_occupied: usize,
}

impl OccupancyMap {
    /// Create a map with every cell free.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![0.0; len],
            num_occupied: 0,
        })
    }

    /// Empty (0 × 0) map. Every query returns the sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a map from row-major cell values.
    pub fn from_cells(width: usize, height: usize, cells: Vec<f32>) -> Result<Self> {
        Error::check_dim(cell_count(width, height)?, cells.len(), "OccupancyMap::from_cells")?;
        if let Some(bad) = cells.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(Error::InvalidParameter(format!(
                "cell value {} outside [0, 1]",
                bad
            )));
        }
        let num_occupied = cells.iter().filter(|&&v| v == OCCUPIED).count();
        Ok(Self {
            width,
            height,
            cells,
            num_occupied,
        })
    }

    /// Create a map whose cells are occupied wherever `occupied(i, j)` holds.
    pub fn from_fn<F>(width: usize, height: usize, mut occupied: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut map = Self::new(width, height)?;
        for j in 0..height {
            for i in 0..width {
                if occupied(i, j) {
                    map.cells[j * width + i] = OCCUPIED;
                    map.num_occupied += 1;
                }
            }
        }
        Ok(map)
    }

    /// Load from the text format, failing on malformed input.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::io::load_occupancy(path)
    }

    /// Load from the text format, degrading to an empty map on failure.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(map) => map,
            Err(e) => {
                log::warn!(
                    "Failed to load occupancy map {}: {}. Using empty map",
                    path.display(),
                    e
                );
                Self::empty()
            }
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid dimensions (width, height).
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// True when the map has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of occupied cells.
    #[inline]
    pub fn num_occupied(&self) -> usize {
        self.num_occupied
    }

    /// Check whether column `i`, row `j` lies inside the grid.
    #[inline]
    pub fn in_bounds(&self, i: i64, j: i64) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.width && (j as usize) < self.height
    }

    /// Cell value, with [`Sentinel::Low`] outside the grid.
    #[inline]
    pub fn cell(&self, i: i64, j: i64) -> f32 {
        self.cell_or(i, j, Sentinel::Low)
    }

    /// Cell value, with the given sentinel outside the grid.
    #[inline]
    pub fn cell_or(&self, i: i64, j: i64, sentinel: Sentinel) -> f32 {
        if self.in_bounds(i, j) {
            self.cells[j as usize * self.width + i as usize]
        } else {
            sentinel.value()
        }
    }

    /// True iff the cell is inside the grid and exactly occupied.
    #[inline]
    pub fn occupied(&self, i: i64, j: i64) -> bool {
        self.in_bounds(i, j) && self.cells[j as usize * self.width + i as usize] == OCCUPIED
    }

    /// Raw row-major cells.
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Centroid (x, y) of the occupied cells, if any.
    pub fn occupied_centroid(&self) -> Option<(f64, f64)> {
        if self.num_occupied == 0 {
            return None;
        }
        let (mut sx, mut sy) = (0.0, 0.0);
        for (idx, _) in self.cells.iter().enumerate().filter(|(_, v)| **v == OCCUPIED) {
            sx += (idx % self.width) as f64;
            sy += (idx / self.width) as f64;
        }
        let n = self.num_occupied as f64;
        Some((sx / n, sy / n))
    }
}

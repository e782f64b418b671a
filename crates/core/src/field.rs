//! Two-dimensional vector field on a regular grid with nearest-cell sampling.
//!
//! A `VectorField` stores `nx * ny` wind vectors in row-major order plus the
//! magnitude used to normalize them into per-tick displacements. Once built
//! it is read-only.

use crate::error::WindError;
use crate::viewport::Viewport;
use glam::DVec2;

/// A dense grid of `(u, v)` vectors with a normalization magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    nx: usize,
    ny: usize,
    data: Vec<DVec2>,
    max_magnitude: f64,
}

impl VectorField {
    /// Builds a field from row-major `data`, validating every invariant.
    ///
    /// Returns `DimensionMismatch` if `data.len() != nx * ny`,
    /// `NonFiniteVector` for the first NaN/infinite vector, and
    /// `InvalidMagnitude` unless `max_magnitude` is finite, positive and has a
    /// finite reciprocal (subnormals are rejected).
    /// Zero-sized grids are allowed; they sample as "no data" everywhere.
    pub fn from_data(
        nx: usize,
        ny: usize,
        data: Vec<DVec2>,
        max_magnitude: f64,
    ) -> Result<Self, WindError> {
        let expected = nx.checked_mul(ny).ok_or(WindError::InvalidDimensions)?;
        if data.len() != expected {
            return Err(WindError::DimensionMismatch {
                nx,
                ny,
                expected,
                got: data.len(),
            });
        }
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(WindError::NonFiniteVector {
                x: i % nx,
                y: i / nx,
            });
        }
        let usable = max_magnitude > 0.0 && max_magnitude.recip().is_finite();
        if !(max_magnitude.is_finite() && usable) {
            return Err(WindError::InvalidMagnitude(max_magnitude));
        }
        Ok(Self {
            nx,
            ny,
            data,
            max_magnitude,
        })
    }

    /// Builds a field from data the caller has already sanitized.
    ///
    /// Used by the generator, whose output is finite with a positive
    /// magnitude by construction.
    pub(crate) fn from_generated(nx: usize, ny: usize, data: Vec<DVec2>, max_magnitude: f64) -> Self {
        debug_assert_eq!(data.len(), nx * ny);
        debug_assert!(data.iter().all(|v| v.is_finite()));
        debug_assert!(max_magnitude.is_finite() && max_magnitude > 0.0);
        Self {
            nx,
            ny,
            data,
            max_magnitude,
        }
    }

    /// Grid width in cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Grid height in cells.
    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn data(&self) -> &[DVec2] {
        &self.data
    }

    /// Magnitude that maps a stored vector onto a unit-scale displacement.
    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    /// Largest vector length actually present in the grid (0 for empty grids).
    pub fn measured_max_magnitude(&self) -> f64 {
        self.data.iter().map(|v| v.length()).fold(0.0, f64::max)
    }

    /// Vector at cell `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<DVec2> {
        (x < self.nx && y < self.ny).then(|| self.data[y * self.nx + x])
    }

    /// Grid cell under a screen-space point.
    ///
    /// `cell = floor((p + extent/2) * n / extent)` per axis. Points at or
    /// beyond the positive edge map to `n` and therefore return `None`.
    pub fn cell_at(&self, screen: DVec2, viewport: &Viewport) -> Option<(usize, usize)> {
        let half = viewport.half_extent();
        let cx = ((screen.x + half.x) * self.nx as f64 / viewport.width()).floor();
        let cy = ((screen.y + half.y) * self.ny as f64 / viewport.height()).floor();
        let in_range = |c: f64, n: usize| c >= 0.0 && c < n as f64;
        if in_range(cx, self.nx) && in_range(cy, self.ny) {
            Some((cx as usize, cy as usize))
        } else {
            None
        }
    }

    /// Nearest-cell sample at a screen-space point; `None` means "no data".
    pub fn sample(&self, screen: DVec2, viewport: &Viewport) -> Option<DVec2> {
        self.cell_at(screen, viewport)
            .and_then(|(x, y)| self.get(x, y))
    }

}

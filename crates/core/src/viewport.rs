//! Screen-space viewport with a centred orthographic coordinate system.
//!
//! World coordinates span `[-width/2, width/2] x [-height/2, height/2]`
//! with +y pointing up, matching the orthographic camera the particles
//! are drawn with.

use crate::error::WindError;
use crate::prng::Xorshift64;
use glam::DVec2;

/// Pixel dimensions of the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
}

impl Viewport {
    /// Creates a viewport. Both dimensions must be finite and positive.
    pub fn new(width: f64, height: f64) -> Result<Self, WindError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(WindError::InvalidDimensions);
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Half extents `(width/2, height/2)`.
    pub fn half_extent(&self) -> DVec2 {
        DVec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// True when `p` lies inside the closed viewport rectangle.
    pub fn contains(&self, p: DVec2) -> bool {
        let half = self.half_extent();
        p.x.abs() <= half.x && p.y.abs() <= half.y
    }

    /// Toroidal wrap: a coordinate past one edge jumps to the opposite edge.
    ///
    /// The jump lands exactly on the opposite edge rather than carrying the
    /// overshoot, so a particle that leaves on the right reappears at `-w/2`.
    pub fn wrap(&self, p: DVec2) -> DVec2 {
        let half = self.half_extent();
        let wrap_axis = |v: f64, h: f64| {
            if v > h {
                -h
            } else if v < -h {
                h
            } else {
                v
            }
        };
        DVec2::new(wrap_axis(p.x, half.x), wrap_axis(p.y, half.y))
    }

    /// Independent uniform position inside the viewport.
    pub fn random_point(&self, rng: &mut Xorshift64) -> DVec2 {
        let x = rng.next_spread(self.width);
        let y = rng.next_spread(self.height);
        DVec2::new(x, y)
    }
}

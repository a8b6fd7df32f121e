//! Uniform sampling grid over a planar monitor cross-section.

use serde::{Deserialize, Serialize};

use crate::error::ModeError;

const GRID_MATCH_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Cyclic transverse pair, so that `t1 × t2 = normal`.
    pub fn transverse(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }
}

/// Sample layout of a monitor plane.
///
/// Samples are indexed row-major over the two transverse axes
/// (`idx = i2 * n1 + i1`). A line monitor (2D simulation) has a single sample
/// along the invariant axis; its spacing stays at one length unit so that
/// integrals come out per unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorGrid {
    pub normal: Axis,
    pub n1: usize,
    #[serde(default = "default_count")]
    pub n2: usize,
    #[serde(default = "default_spacing")]
    pub d1: f64,
    #[serde(default = "default_spacing")]
    pub d2: f64,
    /// Transverse coordinates of sample (0, 0).
    #[serde(default)]
    pub origin: [f64; 2],
}

impl MonitorGrid {
    pub fn new(normal: Axis, n1: usize, n2: usize, d1: f64, d2: f64) -> Self {
        Self {
            normal,
            n1,
            n2,
            d1,
            d2,
            origin: [0.0, 0.0],
        }
    }

    /// Line monitor for a simulation in the xy plane.
    ///
    /// Samples run along whichever transverse axis is not `Z`.
    pub fn line(normal: Axis, n: usize, spacing: f64) -> Self {
        let (t1, _) = normal.transverse();
        if t1 == Axis::Z {
            Self::new(normal, 1, n, 1.0, spacing)
        } else {
            Self::new(normal, n, 1, spacing, 1.0)
        }
    }

    /// Line monitor of total `length` with cell-centred samples about zero.
    pub fn centered_line(normal: Axis, n: usize, length: f64) -> Self {
        let spacing = length / n.max(1) as f64;
        let start = -0.5 * length + 0.5 * spacing;
        let mut grid = Self::line(normal, n, spacing);
        grid.origin[grid.sampled_slot()] = start;
        grid
    }

    #[inline]
    pub fn idx(&self, i1: usize, i2: usize) -> usize {
        i2 * self.n1 + i1
    }

    pub fn len(&self) -> usize {
        self.n1 * self.n2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> [usize; 2] {
        [self.n1, self.n2]
    }

    pub fn spacings(&self) -> [f64; 2] {
        [self.d1, self.d2]
    }

    pub fn cell_area(&self) -> f64 {
        self.d1 * self.d2
    }

    pub fn extent(&self) -> [f64; 2] {
        [self.n1 as f64 * self.d1, self.n2 as f64 * self.d2]
    }

    pub fn transverse_axes(&self) -> (Axis, Axis) {
        self.normal.transverse()
    }

    /// True for a line monitor (2D simulation).
    pub fn is_line(&self) -> bool {
        self.n1 == 1 || self.n2 == 1
    }

    /// Transverse slot carrying the samples of a line monitor.
    pub fn sampled_slot(&self) -> usize {
        if self.n1 == 1 && self.n2 > 1 { 1 } else { 0 }
    }

    /// Transverse coordinates of a flat sample index.
    pub fn coords(&self, idx: usize) -> [f64; 2] {
        let n1 = self.n1.max(1);
        let i1 = idx % n1;
        let i2 = idx / n1;
        [
            self.origin[0] + i1 as f64 * self.d1,
            self.origin[1] + i2 as f64 * self.d2,
        ]
    }

    pub fn matches(&self, other: &MonitorGrid) -> bool {
        self.mismatch(other).is_none()
    }

    pub fn check_matches(&self, other: &MonitorGrid) -> Result<(), ModeError> {
        match self.mismatch(other) {
            Some(reason) => Err(ModeError::GeometryMismatch(reason)),
            None => Ok(()),
        }
    }

    fn mismatch(&self, other: &MonitorGrid) -> Option<String> {
        if self.normal != other.normal {
            return Some(format!(
                "normal {:?} vs {:?}",
                self.normal, other.normal
            ));
        }
        if self.counts() != other.counts() {
            return Some(format!(
                "samples {}x{} vs {}x{}",
                self.n1, self.n2, other.n1, other.n2
            ));
        }
        let spacing_ok = close(self.d1, other.d1) && close(self.d2, other.d2);
        if !spacing_ok {
            return Some(format!(
                "spacing ({}, {}) vs ({}, {})",
                self.d1, self.d2, other.d1, other.d2
            ));
        }
        let scale = self.extent()[0].abs().max(self.extent()[1].abs()).max(1.0);
        let origin_ok = (0..2).all(|i| {
            (self.origin[i] - other.origin[i]).abs() <= GRID_MATCH_TOL * scale
        });
        if !origin_ok {
            return Some(format!(
                "origin {:?} vs {:?}",
                self.origin, other.origin
            ));
        }
        None
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= GRID_MATCH_TOL * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}

fn default_count() -> usize {
    1
}

fn default_spacing() -> f64 {
    1.0
}

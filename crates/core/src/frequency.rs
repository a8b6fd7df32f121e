//! Frequency points in normalized units (c = 1).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ModeError;

const FREQ_MATCH_TOL: f64 = 1e-9;

/// Angular frequency ω. The free-space wavenumber equals ω.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrequencyPoint {
    omega: f64,
}

impl FrequencyPoint {
    pub fn new(omega: f64) -> Result<Self, ModeError> {
        if !omega.is_finite() || omega < 0.0 {
            return Err(ModeError::InvalidFrequency(omega));
        }
        Ok(Self { omega })
    }

    /// From a free-space wavelength: ω = 2π/λ.
    pub fn from_wavelength(wavelength: f64) -> Result<Self, ModeError> {
        Self::new(2.0 * PI / wavelength)
    }

    #[inline]
    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn cycles(&self) -> f64 {
        self.omega / (2.0 * PI)
    }

    pub fn wavelength(&self) -> f64 {
        2.0 * PI / self.omega
    }

    pub fn approx_eq(&self, other: &FrequencyPoint) -> bool {
        let scale = self.omega.abs().max(other.omega.abs()).max(f64::MIN_POSITIVE);
        (self.omega - other.omega).abs() <= FREQ_MATCH_TOL * scale
    }
}

impl TryFrom<f64> for FrequencyPoint {
    type Error = ModeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FrequencyPoint> for f64 {
    fn from(value: FrequencyPoint) -> Self {
        value.omega
    }
}

/// Ordered set of frequencies with tolerant lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencySet {
    points: Vec<FrequencyPoint>,
}

impl FrequencySet {
    pub fn new(points: Vec<FrequencyPoint>) -> Self {
        Self { points }
    }

    /// `count` points spanning `center ± width/2` (a single point sits at `center`).
    pub fn linspace(center: f64, width: f64, count: usize) -> Result<Self, ModeError> {
        let mut points = Vec::with_capacity(count);
        if count == 1 {
            points.push(FrequencyPoint::new(center)?);
        } else {
            let start = center - 0.5 * width;
            let step = width / (count.saturating_sub(1)).max(1) as f64;
            for idx in 0..count {
                points.push(FrequencyPoint::new(start + idx as f64 * step)?);
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[FrequencyPoint] {
        &self.points
    }

    pub fn position(&self, frequency: &FrequencyPoint) -> Option<usize> {
        self.points.iter().position(|p| p.approx_eq(frequency))
    }

    pub fn contains(&self, frequency: &FrequencyPoint) -> bool {
        self.position(frequency).is_some()
    }
}

impl FromIterator<FrequencyPoint> for FrequencySet {
    fn from_iter<I: IntoIterator<Item = FrequencyPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

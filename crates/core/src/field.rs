//! Contiguous complex-valued tangential field storage on a monitor grid.
//!
//! A monitor only needs the four field components tangential to its plane:
//! `E1, E2, H1, H2`, taken along the grid's transverse axes `(t1, t2)`.
//! The normal component of the Poynting vector is then
//! `n̂ · (E* × H) = E1* H2 − E2* H1`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::grid::MonitorGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldComponent {
    E1,
    E2,
    H1,
    H2,
}

impl FieldComponent {
    pub const ALL: [FieldComponent; 4] = [
        FieldComponent::E1,
        FieldComponent::E2,
        FieldComponent::H1,
        FieldComponent::H2,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct TangentialField {
    grid: MonitorGrid,
    e1: Vec<Complex64>,
    e2: Vec<Complex64>,
    h1: Vec<Complex64>,
    h2: Vec<Complex64>,
}

impl TangentialField {
    pub fn zeros(grid: MonitorGrid) -> Self {
        let n = grid.len();
        Self {
            grid,
            e1: vec![Complex64::ZERO; n],
            e2: vec![Complex64::ZERO; n],
            h1: vec![Complex64::ZERO; n],
            h2: vec![Complex64::ZERO; n],
        }
    }

    pub fn from_components(
        grid: MonitorGrid,
        e1: Vec<Complex64>,
        e2: Vec<Complex64>,
        h1: Vec<Complex64>,
        h2: Vec<Complex64>,
    ) -> Result<Self, ModeError> {
        let n = grid.len();
        for (name, len) in [
            ("E1", e1.len()),
            ("E2", e2.len()),
            ("H1", h1.len()),
            ("H2", h2.len()),
        ] {
            if len != n {
                return Err(ModeError::GeometryMismatch(format!(
                    "component {name} has {len} samples, grid has {n}"
                )));
            }
        }
        Ok(Self {
            grid,
            e1,
            e2,
            h1,
            h2,
        })
    }

    /// Build a field by evaluating `f(idx, coords) -> [E1, E2, H1, H2]` at every sample.
    pub fn from_fn<F>(grid: MonitorGrid, mut f: F) -> Self
    where
        F: FnMut(usize, [f64; 2]) -> [Complex64; 4],
    {
        let mut field = Self::zeros(grid);
        for idx in 0..grid.len() {
            let [e1, e2, h1, h2] = f(idx, grid.coords(idx));
            field.e1[idx] = e1;
            field.e2[idx] = e2;
            field.h1[idx] = h1;
            field.h2[idx] = h2;
        }
        field
    }

    pub fn grid(&self) -> MonitorGrid {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.e1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.e1.is_empty()
    }

    pub fn component(&self, component: FieldComponent) -> &[Complex64] {
        match component {
            FieldComponent::E1 => &self.e1,
            FieldComponent::E2 => &self.e2,
            FieldComponent::H1 => &self.h1,
            FieldComponent::H2 => &self.h2,
        }
    }

    pub fn component_mut(&mut self, component: FieldComponent) -> &mut [Complex64] {
        match component {
            FieldComponent::E1 => &mut self.e1,
            FieldComponent::E2 => &mut self.e2,
            FieldComponent::H1 => &mut self.h1,
            FieldComponent::H2 => &mut self.h2,
        }
    }

    /// Discrete cross overlap `Σ n̂·(E_self* × H_other) dA`.
    pub fn cross_overlap(&self, other: &TangentialField) -> Complex64 {
        let sum: Complex64 = self
            .e1
            .iter()
            .zip(&self.e2)
            .zip(other.h1.iter().zip(&other.h2))
            .map(|((e1, e2), (h1, h2))| e1.conj() * h2 - e2.conj() * h1)
            .sum();
        sum * self.grid.cell_area()
    }

    /// Net Poynting flux through the monitor along its normal, `Re Σ n̂·(E* × H) dA`.
    pub fn flux(&self) -> f64 {
        self.cross_overlap(self).re
    }

    pub fn scale(&mut self, alpha: Complex64) {
        for component in FieldComponent::ALL {
            for value in self.component_mut(component) {
                *value *= alpha;
            }
        }
    }

    /// `self += alpha * other`, component-wise.
    pub fn axpy(&mut self, alpha: Complex64, other: &TangentialField) -> Result<(), ModeError> {
        self.grid.check_matches(&other.grid)?;
        for component in FieldComponent::ALL {
            let src = other.component(component);
            for (dst, s) in self.component_mut(component).iter_mut().zip(src) {
                *dst += alpha * s;
            }
        }
        Ok(())
    }

    /// Component-wise difference `self − other` on matching grids.
    pub fn checked_sub(&self, other: &TangentialField) -> Result<TangentialField, ModeError> {
        let mut out = self.clone();
        out.axpy(Complex64::new(-1.0, 0.0), other)?;
        Ok(out)
    }

    /// Same transverse shape travelling the other way: E unchanged, H negated.
    pub fn reversed(&self) -> TangentialField {
        let mut out = self.clone();
        for component in [FieldComponent::H1, FieldComponent::H2] {
            for value in out.component_mut(component) {
                *value = -*value;
            }
        }
        out
    }
}

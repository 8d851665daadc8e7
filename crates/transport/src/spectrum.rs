//! Emergent spectrum histogram
//!
//! Virtual-packet energies are binned onto a uniform frequency grid during
//! the reduction phase. Contributions outside the grid are discarded
//! entirely and add exactly zero to every bin and to the total virtual
//! luminosity.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Uniform frequency grid for the emergent spectrum
///
/// Bins are half-open: frequency `nu` lands in bin
/// `floor((nu - nu_min) / delta_nu)` for `nu_min <= nu < nu_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumGrid {
    nu_min: f64,
    nu_max: f64,
    n_bins: usize,
    delta_nu: f64,
}

impl SpectrumGrid {
    /// Builds a validated grid
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the bounds are non-physical or
    /// `n_bins` is zero.
    pub fn new(nu_min: f64, nu_max: f64, n_bins: usize) -> Result<Self, TransportError> {
        let valid = nu_min.is_finite() && nu_max.is_finite() && nu_min > 0.0 && nu_max > nu_min;
        if !valid || n_bins == 0 {
            return Err(TransportError::InvalidSpectrumGrid {
                nu_min,
                nu_max,
                n_bins,
            });
        }
        Ok(Self {
            nu_min,
            nu_max,
            n_bins,
            delta_nu: (nu_max - nu_min) / n_bins as f64,
        })
    }

    /// Lower edge of the grid in Hz
    pub fn nu_min(&self) -> f64 {
        self.nu_min
    }

    /// Upper edge of the grid in Hz
    pub fn nu_max(&self) -> f64 {
        self.nu_max
    }

    /// Number of frequency bins
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Width of one bin in Hz
    pub fn delta_nu(&self) -> f64 {
        self.delta_nu
    }

    /// True when `nu` falls inside the grid
    pub fn contains(&self, nu: f64) -> bool {
        nu >= self.nu_min && nu < self.nu_max
    }

    /// Bin index for `nu`, or `None` outside the grid
    ///
    /// # Examples
    ///
    /// ```
    /// use transport::SpectrumGrid;
    ///
    /// let grid = SpectrumGrid::new(1.0e15, 2.0e15, 10).unwrap();
    ///
    /// assert_eq!(grid.bin_index(1.0e15), Some(0));
    /// assert_eq!(grid.bin_index(1.95e15), Some(9));
    /// assert_eq!(grid.bin_index(2.0e15), None);
    /// assert_eq!(grid.bin_index(0.5e15), None);
    /// ```
    pub fn bin_index(&self, nu: f64) -> Option<usize> {
        if !self.contains(nu) {
            return None;
        }
        let bin = ((nu - self.nu_min) / self.delta_nu) as usize;
        // rounding at the upper edge of the last bin
        Some(bin.min(self.n_bins - 1))
    }

    /// Lower edge frequency of bin `bin` in Hz
    pub fn frequency(&self, bin: usize) -> f64 {
        self.nu_min + bin as f64 * self.delta_nu
    }
}

/// Virtual-packet luminosity accumulated per frequency bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    grid: SpectrumGrid,
    luminosity: Vec<f64>,
}

impl Spectrum {
    /// Creates an empty spectrum on `grid`
    pub fn new(grid: SpectrumGrid) -> Self {
        let luminosity = vec![0.0; grid.n_bins()];
        Self { grid, luminosity }
    }

    /// The frequency grid
    pub fn grid(&self) -> &SpectrumGrid {
        &self.grid
    }

    /// Adds one virtual-packet contribution
    ///
    /// Out-of-range frequencies contribute exactly zero and are not stored.
    pub fn accumulate(&mut self, nu: f64, energy: f64) {
        if let Some(bin) = self.grid.bin_index(nu) {
            self.luminosity[bin] += energy;
        }
    }

    /// Energy accumulated per bin, in erg
    pub fn luminosity(&self) -> &[f64] {
        &self.luminosity
    }

    /// Sum over all bins, in erg
    pub fn total_luminosity(&self) -> f64 {
        self.luminosity.iter().sum()
    }

    /// Element-wise adds another spectrum on the same grid
    pub fn merge(&mut self, other: &Spectrum) {
        debug_assert_eq!(self.grid, other.grid);
        for (a, b) in self.luminosity.iter_mut().zip(&other.luminosity) {
            *a += b;
        }
    }
}

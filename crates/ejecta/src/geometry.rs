//! Shell geometry of the homologously expanding ejecta
//!
//! The ejecta is modeled as a set of contiguous, spherically symmetric
//! radial shells frozen at one instant `time_explosion` after the explosion.
//! Under homologous expansion every fluid element moves with velocity
//! `v = r / time_explosion`, which is what makes the Sobolev treatment of
//! line resonances in the transport crate possible.

use serde::{Deserialize, Serialize};

use crate::constants::C_LIGHT;
use crate::error::ModelError;

/// Relative tolerance for the shell contiguity check
const CONTIGUITY_TOLERANCE: f64 = 1e-12;

/// Radial shell grid plus elapsed time since explosion
///
/// Immutable for the duration of one transport run. Radii are in cm, time
/// in seconds.
///
/// # Examples
///
/// ```
/// use ejecta::Geometry;
///
/// let geometry = Geometry::new(
///     vec![1.0e14, 2.0e14],
///     vec![2.0e14, 3.0e14],
///     10.0 * 86_400.0,
/// )
/// .unwrap();
///
/// assert_eq!(geometry.n_shells(), 2);
/// assert_eq!(geometry.r_inner(0), 1.0e14);
/// assert_eq!(geometry.r_outer(1), 3.0e14);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    r_inner: Vec<f64>,
    r_outer: Vec<f64>,
    time_explosion: f64,
}

impl Geometry {
    /// Builds a validated shell grid
    ///
    /// # Arguments
    ///
    /// * `r_inner` - Inner shell radii in cm, strictly increasing
    /// * `r_outer` - Outer shell radii in cm; `r_outer[i]` must equal
    ///   `r_inner[i + 1]` (contiguous shells)
    /// * `time_explosion` - Time since explosion in seconds
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the arrays are empty or mismatched, any
    /// radius is non-finite or non-positive, shells are not strictly
    /// increasing, shells overlap or leave gaps, or the time is non-physical.
    pub fn new(
        r_inner: Vec<f64>,
        r_outer: Vec<f64>,
        time_explosion: f64,
    ) -> Result<Self, ModelError> {
        if r_inner.is_empty() {
            return Err(ModelError::EmptyGeometry);
        }
        if r_inner.len() != r_outer.len() {
            return Err(ModelError::MismatchedShellArrays {
                inner: r_inner.len(),
                outer: r_outer.len(),
            });
        }
        if !(time_explosion.is_finite() && time_explosion > 0.0) {
            return Err(ModelError::InvalidTimeExplosion(time_explosion));
        }

        for (shell, (&inner, &outer)) in r_inner.iter().zip(&r_outer).enumerate() {
            let valid = inner.is_finite() && outer.is_finite() && inner > 0.0 && outer > inner;
            if !valid {
                return Err(ModelError::InvalidShellRadii {
                    shell,
                    r_inner: inner,
                    r_outer: outer,
                });
            }
        }
        for shell in 0..r_inner.len() - 1 {
            let outer = r_outer[shell];
            let next_inner = r_inner[shell + 1];
            if (next_inner - outer).abs() > CONTIGUITY_TOLERANCE * outer {
                return Err(ModelError::NonContiguousShells {
                    shell,
                    next: shell + 1,
                    r_outer: outer,
                    r_inner: next_inner,
                });
            }
        }

        Ok(Self {
            r_inner,
            r_outer,
            time_explosion,
        })
    }

    /// Number of radial shells
    pub fn n_shells(&self) -> usize {
        self.r_inner.len()
    }

    /// Inner radius of shell `shell` in cm
    pub fn r_inner(&self, shell: usize) -> f64 {
        self.r_inner[shell]
    }

    /// Outer radius of shell `shell` in cm
    pub fn r_outer(&self, shell: usize) -> f64 {
        self.r_outer[shell]
    }

    /// Time since explosion in seconds
    pub fn time_explosion(&self) -> f64 {
        self.time_explosion
    }

    /// Light-travel scale `c * time_explosion` in cm
    ///
    /// Under homologous expansion this converts a comoving frequency offset
    /// into the physical distance to the matching line resonance.
    pub fn ct(&self) -> f64 {
        C_LIGHT * self.time_explosion
    }

    /// Reciprocal of [`Geometry::ct`] in cm⁻¹
    pub fn inverse_ct(&self) -> f64 {
        1.0 / self.ct()
    }

    /// Expansion velocity at radius `r` in cm/s
    pub fn velocity(&self, r: f64) -> f64 {
        r / self.time_explosion
    }
}

//! Per-shell opacity and line-interaction state
//!
//! [`OpacityState`] bundles everything the transport loop needs to know
//! about how packets interact with the medium: electron densities for
//! Thomson scattering, the Sobolev optical depth of every line in every
//! shell, and how a line absorption is resolved into a re-emission.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::lines::LineList;
use crate::macro_atom::MacroAtomData;

/// How a line absorption is resolved into a re-emission
///
/// The variant is fixed once per run from the model input and resolved with
/// a single `match` inside the transport hot loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineInteraction {
    /// Pure resonance scatter: re-emit in the absorbing line
    Scatter,
    /// Downbranching: a macro-atom table containing only emission
    /// transitions out of each activated level
    Downbranch(MacroAtomData),
    /// Full macro-atom chain with internal transitions
    MacroAtom(MacroAtomData),
}

/// Read-only interaction model for one transport run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacityState {
    electron_density: Vec<f64>,
    tau_sobolev: Vec<f64>,
    line_list: LineList,
    line_interaction: LineInteraction,
}

impl OpacityState {
    /// Builds a validated opacity state
    ///
    /// # Arguments
    ///
    /// * `electron_density` - Electron number density per shell in cm⁻³
    /// * `tau_sobolev` - Sobolev optical depths, `[line][shell]` row-major,
    ///   `n_lines * n_shells` entries
    /// * `line_list` - Transition frequencies, descending
    /// * `line_interaction` - Line resolution mode; macro-atom modes must
    ///   carry an activation map covering the whole line list
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] on negative or non-finite densities or
    /// optical depths, table shape mismatches, or a macro-atom activation
    /// map that does not cover the line list. Negative inputs are never
    /// clamped: they signal a broken upstream plasma state.
    pub fn new(
        electron_density: Vec<f64>,
        tau_sobolev: Vec<f64>,
        line_list: LineList,
        line_interaction: LineInteraction,
    ) -> Result<Self, ModelError> {
        let n_shells = electron_density.len();
        let n_lines = line_list.len();

        if n_shells == 0 {
            return Err(ModelError::EmptyGeometry);
        }
        for (shell, &density) in electron_density.iter().enumerate() {
            if !(density.is_finite() && density >= 0.0) {
                return Err(ModelError::InvalidElectronDensity { shell, density });
            }
        }
        if tau_sobolev.len() != n_lines * n_shells {
            return Err(ModelError::OpticalDepthShape {
                got: tau_sobolev.len(),
                expected: n_lines * n_shells,
                n_lines,
                n_shells,
            });
        }
        for (index, &tau) in tau_sobolev.iter().enumerate() {
            if !(tau.is_finite() && tau >= 0.0) {
                return Err(ModelError::InvalidOpticalDepth {
                    line: index / n_shells,
                    shell: index % n_shells,
                    tau,
                });
            }
        }
        match &line_interaction {
            LineInteraction::Scatter => {}
            LineInteraction::Downbranch(data) | LineInteraction::MacroAtom(data) => {
                if data.n_lines() < n_lines {
                    return Err(ModelError::MalformedMacroAtom(format!(
                        "activation map covers {} lines, line list has {}",
                        data.n_lines(),
                        n_lines
                    )));
                }
            }
        }

        Ok(Self {
            electron_density,
            tau_sobolev,
            line_list,
            line_interaction,
        })
    }

    /// Number of radial shells
    pub fn n_shells(&self) -> usize {
        self.electron_density.len()
    }

    /// Electron number density in `shell`, cm⁻³
    pub fn electron_density(&self, shell: usize) -> f64 {
        self.electron_density[shell]
    }

    /// Sobolev optical depth of `line` in `shell`
    pub fn tau_sobolev(&self, line: usize, shell: usize) -> f64 {
        self.tau_sobolev[line * self.n_shells() + shell]
    }

    /// The frequency-ordered line list
    pub fn line_list(&self) -> &LineList {
        &self.line_list
    }

    /// The configured line resolution mode
    pub fn line_interaction(&self) -> &LineInteraction {
        &self.line_interaction
    }
}

//! Radiation-field estimator accumulators
//!
//! Every packet history deposits path-length weighted statistics of the
//! radiation field into these arrays, and the outer simulation loop uses
//! them to update the plasma state between iterations. The per-shell
//! estimators `j` and `nu_bar` accumulate on every move; the per-line
//! estimators `j_blue` and `e_dot_lu` accumulate each time a packet reaches
//! a line's resonance point.
//!
//! Accumulation is strictly additive within a run. Workers accumulate into
//! private copies which the orchestrator merges by summation after all
//! histories complete, so no synchronization is needed in the hot loop.

use serde::{Deserialize, Serialize};

use crate::packet::Packet;

/// Per-shell and per-line radiation-field accumulators for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimators {
    j: Vec<f64>,
    nu_bar: Vec<f64>,
    j_blue: Vec<f64>,
    e_dot_lu: Vec<f64>,
    n_shells: usize,
}

impl Estimators {
    /// Creates zeroed accumulators for `n_shells` shells and `n_lines` lines
    pub fn new(n_shells: usize, n_lines: usize) -> Self {
        Self {
            j: vec![0.0; n_shells],
            nu_bar: vec![0.0; n_shells],
            j_blue: vec![0.0; n_lines * n_shells],
            e_dot_lu: vec![0.0; n_lines * n_shells],
            n_shells,
        }
    }

    /// Adds the path-length contribution of a move through one shell
    ///
    /// Both contributions use the comoving energy and frequency at the
    /// start of the move: `j += E_cmf * d`, `nu_bar += E_cmf * d * nu_cmf`.
    pub fn accumulate_radiation_field(
        &mut self,
        shell: usize,
        comov_energy: f64,
        comov_nu: f64,
        distance: f64,
    ) {
        self.j[shell] += comov_energy * distance;
        self.nu_bar[shell] += comov_energy * distance * comov_nu;
    }

    /// Adds the contribution of a packet reaching a line resonance
    ///
    /// Called for every resonance the packet arrives at, whether it
    /// interacts there or passes through. `distance` is measured from the
    /// packet's current position to the resonance point; the deposited
    /// energy is Doppler-corrected to that point.
    pub fn accumulate_line(
        &mut self,
        packet: &Packet,
        line: usize,
        distance: f64,
        inverse_ct: f64,
    ) {
        let doppler = 1.0 - (packet.mu * packet.r + distance) * inverse_ct;
        let energy = packet.energy * doppler;
        let index = line * self.n_shells + packet.shell_id;
        self.j_blue[index] += energy / packet.nu;
        self.e_dot_lu[index] += energy;
    }

    /// Element-wise adds another set of accumulators into this one
    pub fn merge(&mut self, other: &Estimators) {
        debug_assert_eq!(self.n_shells, other.n_shells);
        for (a, b) in self.j.iter_mut().zip(&other.j) {
            *a += b;
        }
        for (a, b) in self.nu_bar.iter_mut().zip(&other.nu_bar) {
            *a += b;
        }
        for (a, b) in self.j_blue.iter_mut().zip(&other.j_blue) {
            *a += b;
        }
        for (a, b) in self.e_dot_lu.iter_mut().zip(&other.e_dot_lu) {
            *a += b;
        }
    }

    /// Integrated mean-intensity estimator per shell
    pub fn j(&self) -> &[f64] {
        &self.j
    }

    /// Frequency-weighted intensity estimator per shell
    pub fn nu_bar(&self) -> &[f64] {
        &self.nu_bar
    }

    /// Blue-wing mean-intensity estimator for `(line, shell)`
    pub fn j_blue(&self, line: usize, shell: usize) -> f64 {
        self.j_blue[line * self.n_shells + shell]
    }

    /// Energy-flow estimator for `(line, shell)`
    pub fn e_dot_lu(&self, line: usize, shell: usize) -> f64 {
        self.e_dot_lu[line * self.n_shells + shell]
    }
}

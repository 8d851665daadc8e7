//! Real packet state
//!
//! A [`Packet`] is one Monte Carlo history: a parcel of radiative energy
//! with a lab-frame frequency, a radial position, a direction cosine and a
//! private random number stream. The propagation loop in
//! [`crate::propagation`] is the only code that mutates a packet; once the
//! status turns terminal the packet is frozen and only read during
//! reduction.

use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketStatus {
    /// Still being propagated
    InProcess,
    /// Escaped through the outermost shell boundary
    Emitted,
    /// Fell back through the innermost shell boundary
    Reabsorbed,
}

/// Physical interaction class, recorded for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Thomson scattering off free electrons
    ElectronScattering,
    /// Sobolev line interaction
    Line,
}

/// Last-interaction diagnostics carried by every packet
///
/// `in_nu` is the lab-frame frequency the packet had going into the
/// interaction; the line ids are indices into the model's line list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LastInteraction {
    pub kind: Option<InteractionKind>,
    pub in_nu: f64,
    pub in_line: Option<usize>,
    pub out_line: Option<usize>,
}

/// One Monte Carlo packet history
#[derive(Debug, Clone)]
pub struct Packet {
    /// Radial position in cm
    pub r: f64,
    /// Direction cosine relative to the radial direction, in [-1, 1]
    pub mu: f64,
    /// Lab-frame frequency in Hz
    pub nu: f64,
    /// Lab-frame energy in erg
    pub energy: f64,
    /// Index of the shell currently containing the packet
    pub shell_id: usize,
    /// Pointer into the frequency-ordered line list: the next line this
    /// packet can redshift into
    pub next_line_id: usize,
    /// Lifecycle state
    pub status: PacketStatus,
    /// Position of this packet in the population, used in diagnostics
    pub index: usize,
    /// Seed of the private RNG stream
    pub seed: u64,
    /// Last-interaction diagnostics
    pub last_interaction: LastInteraction,
    /// Private random number stream, seeded once at creation
    pub rng: ChaChaRng,
}

impl Packet {
    /// Creates a packet at its injection state
    ///
    /// # Arguments
    ///
    /// * `r` - Initial radius in cm (the inner boundary for photospheric
    ///   injection)
    /// * `mu` - Initial direction cosine
    /// * `nu` - Initial lab-frame frequency in Hz
    /// * `energy` - Initial lab-frame energy in erg
    /// * `seed` - Seed for the packet's private RNG stream
    /// * `index` - Position in the packet population
    pub fn new(r: f64, mu: f64, nu: f64, energy: f64, seed: u64, index: usize) -> Self {
        Self {
            r,
            mu,
            nu,
            energy,
            shell_id: 0,
            next_line_id: 0,
            status: PacketStatus::InProcess,
            index,
            seed,
            last_interaction: LastInteraction::default(),
            rng: ChaChaRng::seed_from_u64(seed),
        }
    }

    /// Moves the packet a straight-line distance along its current direction
    ///
    /// Updates `r` and `mu` from the chord geometry: the new radius is
    /// `sqrt(r² + d² + 2 r d mu)` and the direction cosine follows as
    /// `(mu r + d) / r_new`.
    pub fn advance(&mut self, distance: f64) {
        let r = self.r;
        let new_r = (r * r + distance * distance + 2.0 * r * distance * self.mu).sqrt();
        self.mu = (self.mu * r + distance) / new_r;
        self.r = new_r;
    }
}

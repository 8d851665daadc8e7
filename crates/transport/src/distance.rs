//! Candidate event distances
//!
//! Each step of the propagation loop compares three distances computed from
//! the packet's current state: the geometric distance to the nearest shell
//! boundary, the distance to the next Sobolev line resonance, and the
//! distance to an exponentially sampled Thomson scattering event. The
//! numerically delicate parts live here so they can be tested in isolation.

use ejecta::{MISS_DISTANCE, SIGMA_THOMSON};

/// Relative frequency difference below which a packet is considered to sit
/// exactly on a line resonance
const CLOSE_LINE_THRESHOLD: f64 = 1e-14;

/// Which shell boundary a packet reaches next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCrossing {
    /// Crosses into the next shell outward (or escapes from the last)
    Outward,
    /// Crosses into the next shell inward (or is reabsorbed from the first)
    Inward,
}

/// Distance to the nearest shell boundary along the packet's direction
///
/// For `mu > 0` the packet can only reach the outer boundary. For
/// `mu <= 0` it reaches the inner boundary when its trajectory's impact
/// parameter is small enough to intersect it, otherwise it swings past and
/// exits through the outer boundary.
///
/// # Returns
///
/// The distance in cm and which boundary is hit.
pub fn boundary_distance(r: f64, mu: f64, r_inner: f64, r_outer: f64) -> (f64, BoundaryCrossing) {
    if mu > 0.0 {
        let distance = (r_outer * r_outer + (mu * mu - 1.0) * r * r).sqrt() - r * mu;
        return (distance, BoundaryCrossing::Outward);
    }
    let discriminant = r_inner * r_inner + (mu * mu - 1.0) * r * r;
    if discriminant >= 0.0 {
        let distance = -r * mu - discriminant.sqrt();
        (distance, BoundaryCrossing::Inward)
    } else {
        let distance = (r_outer * r_outer + (mu * mu - 1.0) * r * r).sqrt() - r * mu;
        (distance, BoundaryCrossing::Outward)
    }
}

/// Distance to the resonance point of a line, in cm
///
/// Under homologous expansion the comoving frequency redshifts linearly
/// with path length: `nu_cmf(d) = nu_cmf(0) - nu * d / (c t_exp)`, so the
/// resonance with `nu_line` sits at `d = (nu_cmf - nu_line) / nu * c t_exp`.
/// Comoving frequencies within [`CLOSE_LINE_THRESHOLD`] of the line are
/// snapped onto the resonance (distance zero).
///
/// # Returns
///
/// `None` when the comoving frequency already lies below the line beyond
/// the snap tolerance, a degenerate state the caller must surface as a
/// fatal transport error.
pub fn line_distance(comov_nu: f64, nu_line: f64, nu_lab: f64, ct: f64) -> Option<f64> {
    let nu_diff = comov_nu - nu_line;
    if nu_diff >= 0.0 {
        Some(nu_diff / nu_lab * ct)
    } else if (nu_diff / comov_nu).abs() < CLOSE_LINE_THRESHOLD {
        Some(0.0)
    } else {
        None
    }
}

/// Distance at which an optical depth budget `tau` is used up by Thomson
/// scattering alone, in cm
///
/// Returns infinity in an electron-free shell, which simply removes the
/// scattering candidate from the distance comparison.
pub fn electron_distance(tau: f64, electron_density: f64) -> f64 {
    if electron_density <= 0.0 {
        return f64::INFINITY;
    }
    tau / (electron_density * SIGMA_THOMSON)
}

/// Whether a candidate distance can participate in the comparison
pub fn is_valid_distance(distance: f64) -> bool {
    distance.is_finite() && distance >= 0.0 && distance < MISS_DISTANCE
}

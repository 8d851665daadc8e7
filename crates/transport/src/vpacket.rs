//! Virtual packets (peel-off spectrum sampling)
//!
//! At injection and at every physical interaction, a volley of virtual
//! packets is peeled off the real packet. Each one inherits the interaction
//! position but receives a freshly sampled, escape-biased direction and a weight
//! that cancels the sampling bias, so the expectation over the volley
//! reproduces the unbiased emergent flux. Virtual packets never interact
//! again: they are traced straight out of the ejecta, attenuated by the
//! total optical depth along the way, and their surviving energy is what
//! builds the low-noise spectrum.

use ejecta::{Geometry, OpacityState, SIGMA_THOMSON};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distance::{boundary_distance, is_valid_distance, line_distance, BoundaryCrossing};
use crate::error::TransportError;
use crate::frame::{doppler_factor, inverse_doppler_factor};
use crate::packet::{LastInteraction, Packet};
use crate::spectrum::SpectrumGrid;

/// Initial sample capacity of a fresh buffer; the backing storage doubles
/// whenever it overflows
const INITIAL_BUFFER_CAPACITY: usize = 128;

/// Optical depth beyond which `exp(-tau)` underflows and the sample is
/// dropped instead of traced further
const TAU_CUTOFF: f64 = 700.0;

/// One spectrum-contributing virtual sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VirtualSample {
    /// Index of the owning real packet
    pub packet_index: usize,
    /// Lab-frame escape frequency in Hz
    pub nu: f64,
    /// Attenuated escape energy in erg
    pub energy: f64,
    /// Direction cosine the sample was launched with
    pub initial_mu: f64,
    /// Radius the sample was launched from, in cm
    pub initial_r: f64,
    /// Diagnostics of the real interaction that spawned the sample
    pub last_interaction: LastInteraction,
}

/// Per-real-packet growable record of virtual samples
///
/// Owned exclusively by one packet history, drained once during reduction.
#[derive(Debug, Clone)]
pub struct VirtualPacketBuffer {
    samples: Vec<VirtualSample>,
    nu_min: f64,
    nu_max: f64,
}

impl VirtualPacketBuffer {
    /// Creates an empty buffer accepting the spectral range of `grid`
    pub fn new(grid: &SpectrumGrid) -> Self {
        Self {
            samples: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            nu_min: grid.nu_min(),
            nu_max: grid.nu_max(),
        }
    }

    /// True when `nu` falls inside the accepted spectral range
    pub fn in_range(&self, nu: f64) -> bool {
        nu >= self.nu_min && nu < self.nu_max
    }

    /// Appends a sample, growing the backing storage as needed
    pub fn push(&mut self, sample: VirtualSample) {
        self.samples.push(sample);
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are stored
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stored samples in insertion order
    pub fn samples(&self) -> &[VirtualSample] {
        &self.samples
    }

    /// Consumes the buffer, yielding its samples
    pub fn into_samples(self) -> Vec<VirtualSample> {
        self.samples
    }
}

/// Spawns one volley of virtual packets off the real packet
///
/// Directions are stratified over `[mu_min, 1]` where `mu_min` is the
/// tangent to the innermost boundary as seen from the packet's radius, so
/// no virtual packet is launched into the occulted cone. The weight per
/// sample is `(1 - mu_min) / 2N` in the volume, or `2 mu / N` for a packet
/// sitting exactly on the inner boundary (injection volley), which makes
/// the volley an unbiased estimate of the emergent flux.
///
/// Samples whose lab frequency misses the spectral range are dropped before
/// tracing; the rest are traced to escape and appended attenuated.
pub fn trace_vpacket_volley(
    packet: &mut Packet,
    buffer: &mut VirtualPacketBuffer,
    geometry: &Geometry,
    opacity: &OpacityState,
    n_vpackets: usize,
) -> Result<(), TransportError> {
    if n_vpackets == 0 {
        return Ok(());
    }

    let r_inner_boundary = geometry.r_inner(0);
    let inverse_ct = geometry.inverse_ct();
    let (mu_min, on_inner_boundary) = if packet.r > r_inner_boundary {
        let tangent = -(1.0 - (r_inner_boundary / packet.r).powi(2)).sqrt();
        (tangent, false)
    } else {
        (0.0, true)
    };
    let mu_bin = (1.0 - mu_min) / n_vpackets as f64;
    let packet_doppler = doppler_factor(packet.r, packet.mu, inverse_ct);

    for bin in 0..n_vpackets {
        let v_mu = mu_min + (bin as f64 + packet.rng.random::<f64>()) * mu_bin;
        let weight = if on_inner_boundary {
            2.0 * v_mu / n_vpackets as f64
        } else {
            (1.0 - mu_min) / (2.0 * n_vpackets as f64)
        };

        let doppler_ratio = packet_doppler * inverse_doppler_factor(packet.r, v_mu, inverse_ct);
        let v_nu = packet.nu * doppler_ratio;
        let v_energy = packet.energy * weight * doppler_ratio;

        // out-of-range samples contribute nothing: skip before tracing
        if !buffer.in_range(v_nu) {
            continue;
        }

        match trace_vpacket(v_nu, packet.r, v_mu, packet.shell_id, geometry, opacity, packet.index)?
        {
            Some(tau) => buffer.push(VirtualSample {
                packet_index: packet.index,
                nu: v_nu,
                energy: v_energy * (-tau).exp(),
                initial_mu: v_mu,
                initial_r: packet.r,
                last_interaction: packet.last_interaction,
            }),
            None => continue,
        }
    }
    Ok(())
}

/// Traces one virtual packet to the outer boundary without interaction
///
/// Accumulates the Sobolev depth of every resonance the sample sweeps past
/// inside each traversed shell plus the Thomson depth of each chord, hopping
/// shells until it leaves the outermost boundary.
///
/// # Returns
///
/// `Ok(Some(tau))` with the total optical depth on escape, or `Ok(None)`
/// when the sample is dropped (depth beyond [`TAU_CUTOFF`], or a geometry
/// edge case drives it back into the inner boundary).
fn trace_vpacket(
    nu: f64,
    mut r: f64,
    mut mu: f64,
    mut shell: usize,
    geometry: &Geometry,
    opacity: &OpacityState,
    packet_index: usize,
) -> Result<Option<f64>, TransportError> {
    let inverse_ct = geometry.inverse_ct();
    let ct = geometry.ct();
    let lines = opacity.line_list();
    let mut tau = 0.0;

    loop {
        let (distance, crossing) =
            boundary_distance(r, mu, geometry.r_inner(shell), geometry.r_outer(shell));
        if !is_valid_distance(distance) {
            return Err(TransportError::NoValidDistance {
                index: packet_index,
                r,
                mu,
                nu,
                shell,
            });
        }

        // line depths swept within this shell
        let comov_nu = nu * doppler_factor(r, mu, inverse_ct);
        let mut line_id = lines.search(comov_nu);
        while line_id < lines.len() {
            let resonance = line_distance(comov_nu, lines.nu(line_id), nu, ct).ok_or(
                TransportError::FrequencyBelowLine {
                    index: packet_index,
                    comov_nu,
                    nu_line: lines.nu(line_id),
                    r,
                    mu,
                    shell,
                },
            )?;
            if resonance > distance {
                break;
            }
            tau += opacity.tau_sobolev(line_id, shell);
            line_id += 1;
        }
        tau += opacity.electron_density(shell) * SIGMA_THOMSON * distance;

        if tau > TAU_CUTOFF {
            return Ok(None);
        }

        let new_r = (r * r + distance * distance + 2.0 * r * distance * mu).sqrt();
        mu = (mu * r + distance) / new_r;
        r = new_r;

        match crossing {
            BoundaryCrossing::Outward => {
                if shell + 1 == geometry.n_shells() {
                    return Ok(Some(tau));
                }
                shell += 1;
            }
            BoundaryCrossing::Inward => {
                // escape-biased directions graze the core at most; a sample
                // driven inward by rounding is absorbed there
                if shell == 0 {
                    return Ok(None);
                }
                shell -= 1;
            }
        }
    }
}

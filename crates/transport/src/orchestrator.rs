//! Parallel transport orchestration and reduction
//!
//! [`run_transport`] runs the whole packet population through the state
//! machine. Histories are independent, so the population is cut into
//! fixed-size chunks processed in parallel: every worker owns zeroed
//! estimator and spectrum accumulators, writes each packet's terminal state
//! into its disjoint slice of the output array, and bins the packet's
//! virtual samples locally. Worker partials are then combined by summation.
//!
//! Per-packet terminal results are bit-identical for any worker count,
//! because each history consumes only its own seeded RNG stream and writes
//! only its own output slot. The reduced estimators and spectrum are
//! order-independent sums and agree across worker counts up to
//! floating-point summation order.

use ejecta::{Geometry, OpacityState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::estimators::Estimators;
use crate::packet::{LastInteraction, Packet, PacketStatus};
use crate::progress::ProgressListener;
use crate::propagation::single_packet_loop;
use crate::spectrum::Spectrum;
use crate::vpacket::{VirtualPacketBuffer, VirtualSample};

/// Fixed parallel chunk size, so the partition of the population does not
/// depend on the worker count
const PACKET_CHUNK_SIZE: usize = 256;

/// Initial conditions of one packet, supplied by the packet source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacketInput {
    /// Injection radius in cm
    pub r: f64,
    /// Injection direction cosine
    pub mu: f64,
    /// Injection lab-frame frequency in Hz
    pub nu: f64,
    /// Injection energy in erg
    pub energy: f64,
    /// Seed of the packet's private RNG stream
    pub seed: u64,
}

/// Terminal state of one packet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacketOutput {
    /// Terminal lab-frame frequency in Hz
    pub nu: f64,
    /// Signed terminal energy in erg: positive for emitted packets,
    /// negative for reabsorbed ones
    pub energy: f64,
    /// Terminal status
    pub status: PacketStatus,
    /// Diagnostics of the last physical interaction
    pub last_interaction: LastInteraction,
}

impl PacketOutput {
    fn placeholder() -> Self {
        Self {
            nu: 0.0,
            energy: 0.0,
            status: PacketStatus::InProcess,
            last_interaction: LastInteraction::default(),
        }
    }

    fn from_packet(packet: &Packet) -> Self {
        let energy = match packet.status {
            PacketStatus::Reabsorbed => -packet.energy,
            _ => packet.energy,
        };
        Self {
            nu: packet.nu,
            energy,
            status: packet.status,
            last_interaction: packet.last_interaction,
        }
    }
}

/// Everything one transport run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResult {
    /// Terminal state per packet, in population order
    pub packets: Vec<PacketOutput>,
    /// Virtual-packet luminosity histogram
    pub spectrum: Spectrum,
    /// Reduced radiation-field estimators
    pub estimators: Estimators,
    /// Every virtual sample, sorted by owning packet index; empty unless
    /// `vpacket_logging` was set
    pub virtual_samples: Vec<VirtualSample>,
    /// Number of packets that escaped
    pub n_emitted: usize,
    /// Number of packets that fell back through the inner boundary
    pub n_reabsorbed: usize,
}

/// Worker-local partial accumulators
struct Partial {
    estimators: Estimators,
    spectrum: Spectrum,
    virtual_samples: Vec<VirtualSample>,
}

impl Partial {
    fn zeroed(n_shells: usize, n_lines: usize, config: &TransportConfig) -> Self {
        Self {
            estimators: Estimators::new(n_shells, n_lines),
            spectrum: Spectrum::new(config.spectrum_grid.clone()),
            virtual_samples: Vec::new(),
        }
    }

    fn merge(mut self, other: Partial) -> Self {
        self.estimators.merge(&other.estimators);
        self.spectrum.merge(&other.spectrum);
        self.virtual_samples.extend(other.virtual_samples);
        self
    }
}

/// Runs the Monte Carlo state machine over the whole packet population
///
/// # Arguments
///
/// * `inputs` - Initial conditions and seed per packet
/// * `geometry` - Shell grid for this iteration
/// * `opacity` - Interaction model for this iteration
/// * `config` - Run configuration
/// * `progress` - Coarse progress listener, advanced once per completed
///   history; use [`crate::NoProgress`] when unwanted
///
/// # Errors
///
/// The first fatal [`TransportError`] from any history aborts the whole
/// run; partial results are discarded. Mismatched model inputs are
/// rejected before any packet is propagated.
pub fn run_transport(
    inputs: &[PacketInput],
    geometry: &Geometry,
    opacity: &OpacityState,
    config: &TransportConfig,
    progress: &dyn ProgressListener,
) -> Result<TransportResult, TransportError> {
    let n_shells = geometry.n_shells();
    let n_lines = opacity.line_list().len();
    if opacity.n_shells() != n_shells {
        return Err(TransportError::ShellCountMismatch {
            got: opacity.n_shells(),
            expected: n_shells,
        });
    }
    let seed_override = match config.single_packet_seed {
        Some(index) => Some(
            inputs
                .get(index)
                .map(|input| input.seed)
                .ok_or(TransportError::DebugSeedOutOfRange(index))?,
        ),
        None => None,
    };

    debug!(
        n_packets = inputs.len(),
        n_shells,
        n_lines,
        n_vpackets = config.n_vpackets,
        iteration = config.iteration,
        total_iterations = config.total_iterations,
        "starting transport run"
    );

    let mut outputs = vec![PacketOutput::placeholder(); inputs.len()];

    let reduced = inputs
        .par_chunks(PACKET_CHUNK_SIZE)
        .zip(outputs.par_chunks_mut(PACKET_CHUNK_SIZE))
        .enumerate()
        .map(|(chunk_index, (input_chunk, output_chunk))| {
            let mut partial = Partial::zeroed(n_shells, n_lines, config);
            let base_index = chunk_index * PACKET_CHUNK_SIZE;

            for (offset, (input, output)) in
                input_chunk.iter().zip(output_chunk.iter_mut()).enumerate()
            {
                let index = base_index + offset;
                let seed = seed_override.unwrap_or(input.seed);
                let mut packet =
                    Packet::new(input.r, input.mu, input.nu, input.energy, seed, index);
                let mut buffer = VirtualPacketBuffer::new(&config.spectrum_grid);

                single_packet_loop(
                    &mut packet,
                    geometry,
                    opacity,
                    config,
                    &mut partial.estimators,
                    &mut buffer,
                )?;

                *output = PacketOutput::from_packet(&packet);
                for sample in buffer.into_samples() {
                    partial.spectrum.accumulate(sample.nu, sample.energy);
                    if config.vpacket_logging {
                        partial.virtual_samples.push(sample);
                    }
                }
                progress.advance(1);
            }
            Ok::<_, TransportError>(partial)
        })
        .try_reduce(
            || Partial::zeroed(n_shells, n_lines, config),
            |a, b| Ok(a.merge(b)),
        )?;

    let n_emitted = outputs
        .iter()
        .filter(|output| output.status == PacketStatus::Emitted)
        .count();
    let n_reabsorbed = outputs.len() - n_emitted;
    if n_emitted == 0 && !outputs.is_empty() {
        warn!(
            n_packets = outputs.len(),
            "no packets escaped the ejecta; the emergent spectrum is empty"
        );
    }

    // chunks cover disjoint index ranges, so a stable sort restores full
    // per-sample determinism regardless of reduction order
    let mut virtual_samples = reduced.virtual_samples;
    virtual_samples.sort_by_key(|sample| sample.packet_index);

    debug!(
        n_emitted,
        n_reabsorbed,
        total_virtual_luminosity = reduced.spectrum.total_luminosity(),
        "transport run finished"
    );

    Ok(TransportResult {
        packets: outputs,
        spectrum: reduced.spectrum,
        estimators: reduced.estimators,
        virtual_samples,
        n_emitted,
        n_reabsorbed,
    })
}

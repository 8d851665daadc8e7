//! Run configuration for one transport iteration

use serde::{Deserialize, Serialize};

use crate::spectrum::SpectrumGrid;

/// Configuration of one Monte Carlo transport run
///
/// This is plain input data: parsing a configuration file into these values
/// is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Number of virtual packets peeled off per physical interaction;
    /// zero disables the virtual spectrum entirely
    pub n_vpackets: usize,
    /// Frequency grid of the emergent spectrum; virtual packets outside
    /// this range are dropped at spawn
    pub spectrum_grid: SpectrumGrid,
    /// Keep every virtual sample on the result for diagnostics, not just
    /// the binned histogram
    pub vpacket_logging: bool,
    /// Debug override: run every history with the seed of the packet at
    /// this index, so one history can be replayed in isolation
    pub single_packet_seed: Option<usize>,
    /// Current iteration of the outer simulation loop, for progress
    /// reporting only
    pub iteration: usize,
    /// Total iterations of the outer simulation loop, for progress
    /// reporting only
    pub total_iterations: usize,
}

impl TransportConfig {
    /// A configuration with sensible defaults for `spectrum_grid`
    pub fn new(spectrum_grid: SpectrumGrid, n_vpackets: usize) -> Self {
        Self {
            n_vpackets,
            spectrum_grid,
            vpacket_logging: false,
            single_packet_seed: None,
            iteration: 0,
            total_iterations: 1,
        }
    }
}

//! Monte Carlo packet transport through supernova ejecta
//!
//! This crate propagates discrete energy packets through the spherically
//! symmetric, homologously expanding shell model described by the [`ejecta`]
//! crate. Each packet runs an independent state machine of boundary crossings
//! and scattering events until it either escapes the outermost shell or is
//! reabsorbed through the innermost one. Along the way packets deposit
//! path-length weighted radiation-field estimators, and every physical
//! interaction peels off a volley of virtual packets that build a low-noise
//! emergent spectrum.
//!
//! The entry point is [`orchestrator::run_transport`], which runs the whole
//! packet population in parallel with worker-local accumulators and an
//! explicit summation reduction, so results are reproducible for a fixed
//! seed assignment regardless of thread count.

pub mod config;
pub mod distance;
pub mod error;
pub mod estimators;
pub mod frame;
pub mod interaction;
pub mod orchestrator;
pub mod packet;
pub mod progress;
pub mod propagation;
pub mod spectrum;
pub mod vpacket;

#[cfg(test)]
mod orchestrator_test;
#[cfg(test)]
mod propagation_test;

pub use config::TransportConfig;
pub use error::TransportError;
pub use estimators::Estimators;
pub use orchestrator::{run_transport, PacketInput, PacketOutput, TransportResult};
pub use packet::{InteractionKind, LastInteraction, Packet, PacketStatus};
pub use progress::{NoProgress, ProgressListener};
pub use spectrum::{Spectrum, SpectrumGrid};
pub use vpacket::{VirtualPacketBuffer, VirtualSample};

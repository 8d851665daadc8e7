//! The per-packet state machine
//!
//! [`single_packet_loop`] advances one packet from injection to a terminal
//! state. Each pass finds the next event by comparing the shell boundary,
//! line resonance, and electron scattering candidate distances, moves the
//! packet there while depositing estimator contributions, and applies the
//! event. Ties are broken in the fixed order
//! boundary > line > electron, so geometric exit always resolves
//! unambiguously.

use ejecta::{Geometry, OpacityState, SIGMA_THOMSON};
use rand::Rng;

use crate::config::TransportConfig;
use crate::distance::{
    boundary_distance, electron_distance, is_valid_distance, line_distance, BoundaryCrossing,
};
use crate::error::TransportError;
use crate::estimators::Estimators;
use crate::frame::doppler_factor;
use crate::interaction::{line_scatter, thomson_scatter};
use crate::packet::{Packet, PacketStatus};
use crate::vpacket::{trace_vpacket_volley, VirtualPacketBuffer};

/// The next event along a packet's current direction
#[derive(Debug, Clone, Copy, PartialEq)]
enum TraceEvent {
    Boundary(BoundaryCrossing),
    Line(usize),
    ElectronScattering,
}

/// Finds the next event from the packet's current state
///
/// The boundary distance is fixed by geometry. Line resonances are walked
/// from `next_line_id` in frequency order; the comoving frequency at the
/// start of the trace maps each one to a resonance distance. One optical
/// depth budget `tau = -ln(1 - z)` is sampled for the whole trace: electron
/// opacity spends it continuously along the path, and each resonance passed
/// without interaction debits its Sobolev depth. The event is whichever
/// comes first: the boundary, the resonance whose depth exhausts the
/// budget, or the point where electron opacity alone exhausts it.
///
/// Every resonance the packet reaches updates the line estimators, whether
/// or not it interacts there.
fn trace_packet(
    packet: &mut Packet,
    geometry: &Geometry,
    opacity: &OpacityState,
    estimators: &mut Estimators,
) -> Result<(f64, TraceEvent), TransportError> {
    let shell = packet.shell_id;
    let (distance_boundary, crossing) = boundary_distance(
        packet.r,
        packet.mu,
        geometry.r_inner(shell),
        geometry.r_outer(shell),
    );
    if !is_valid_distance(distance_boundary) {
        return Err(no_valid_distance(packet));
    }

    let inverse_ct = geometry.inverse_ct();
    let ct = geometry.ct();
    let comov_nu = packet.nu * doppler_factor(packet.r, packet.mu, inverse_ct);
    let chi_electron = opacity.electron_density(shell) * SIGMA_THOMSON;
    let lines = opacity.line_list();

    // remaining optical depth budget for this trace
    let mut tau_event = -(1.0 - packet.rng.random::<f64>()).ln();
    let mut cur_line = packet.next_line_id;
    // path length already traced (electron opacity spent up to here)
    let mut traced = 0.0;

    loop {
        let distance_electron =
            traced + electron_distance(tau_event, opacity.electron_density(shell));
        let distance_line = if cur_line < lines.len() {
            line_distance(comov_nu, lines.nu(cur_line), packet.nu, ct).ok_or_else(|| {
                TransportError::FrequencyBelowLine {
                    index: packet.index,
                    comov_nu,
                    nu_line: lines.nu(cur_line),
                    r: packet.r,
                    mu: packet.mu,
                    shell,
                }
            })?
        } else {
            f64::INFINITY
        };

        // boundary wins ties: geometric exit resolves unambiguously
        if distance_boundary <= distance_line && distance_boundary <= distance_electron {
            packet.next_line_id = cur_line;
            return Ok((distance_boundary, TraceEvent::Boundary(crossing)));
        }
        if distance_electron < distance_line {
            packet.next_line_id = cur_line;
            return Ok((distance_electron, TraceEvent::ElectronScattering));
        }
        if !distance_line.is_finite() {
            return Err(no_valid_distance(packet));
        }

        // reached the resonance point of cur_line
        tau_event -= chi_electron * (distance_line - traced);
        estimators.accumulate_line(packet, cur_line, distance_line, inverse_ct);

        let tau_line = opacity.tau_sobolev(cur_line, shell);
        if tau_line >= tau_event {
            packet.next_line_id = cur_line;
            return Ok((distance_line, TraceEvent::Line(cur_line)));
        }
        tau_event -= tau_line;
        traced = distance_line;
        cur_line += 1;
    }
}

/// Moves the packet `distance` along its direction, depositing the
/// path-length estimator contributions of the traversed shell
///
/// The comoving transform uses the Doppler factor at the start of the move.
/// Event distances never exceed the boundary distance, so a single move
/// stays within one shell.
fn move_packet(packet: &mut Packet, distance: f64, inverse_ct: f64, estimators: &mut Estimators) {
    if distance > 0.0 {
        let doppler = doppler_factor(packet.r, packet.mu, inverse_ct);
        estimators.accumulate_radiation_field(
            packet.shell_id,
            packet.energy * doppler,
            packet.nu * doppler,
            distance,
        );
    }
    packet.advance(distance);
}

/// Crosses the packet over a shell boundary, terminating at the domain edges
fn cross_shell_boundary(packet: &mut Packet, crossing: BoundaryCrossing, n_shells: usize) {
    match crossing {
        BoundaryCrossing::Outward => {
            if packet.shell_id + 1 == n_shells {
                packet.status = PacketStatus::Emitted;
            } else {
                packet.shell_id += 1;
            }
        }
        BoundaryCrossing::Inward => {
            if packet.shell_id == 0 {
                packet.status = PacketStatus::Reabsorbed;
            } else {
                packet.shell_id -= 1;
            }
        }
    }
}

/// Runs one packet to completion
///
/// Leaves the packet in a terminal status ([`PacketStatus::Emitted`] or
/// [`PacketStatus::Reabsorbed`]), its estimator contributions deposited in
/// `estimators` and its virtual samples in `buffer`.
///
/// # Errors
///
/// A degenerate numerical state (no finite candidate distance, or a
/// comoving frequency below the next line) is fatal and carries the packet
/// index and last known state.
pub fn single_packet_loop(
    packet: &mut Packet,
    geometry: &Geometry,
    opacity: &OpacityState,
    config: &TransportConfig,
    estimators: &mut Estimators,
    buffer: &mut VirtualPacketBuffer,
) -> Result<(), TransportError> {
    let inverse_ct = geometry.inverse_ct();
    let n_shells = geometry.n_shells();

    // initialize the line pointer from the comoving injection frequency
    let comov_nu = packet.nu * doppler_factor(packet.r, packet.mu, inverse_ct);
    packet.next_line_id = opacity.line_list().search(comov_nu);

    // injection volley
    trace_vpacket_volley(packet, buffer, geometry, opacity, config.n_vpackets)?;

    while packet.status == PacketStatus::InProcess {
        let (distance, event) = trace_packet(packet, geometry, opacity, estimators)?;
        match event {
            TraceEvent::Boundary(crossing) => {
                move_packet(packet, distance, inverse_ct, estimators);
                cross_shell_boundary(packet, crossing, n_shells);
            }
            TraceEvent::Line(_) => {
                move_packet(packet, distance, inverse_ct, estimators);
                line_scatter(packet, opacity, inverse_ct);
                trace_vpacket_volley(packet, buffer, geometry, opacity, config.n_vpackets)?;
            }
            TraceEvent::ElectronScattering => {
                move_packet(packet, distance, inverse_ct, estimators);
                thomson_scatter(packet, inverse_ct);
                trace_vpacket_volley(packet, buffer, geometry, opacity, config.n_vpackets)?;
            }
        }
    }
    Ok(())
}

fn no_valid_distance(packet: &Packet) -> TransportError {
    TransportError::NoValidDistance {
        index: packet.index,
        r: packet.r,
        mu: packet.mu,
        nu: packet.nu,
        shell: packet.shell_id,
    }
}

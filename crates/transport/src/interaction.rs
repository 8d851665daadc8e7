//! Physical interactions of real packets
//!
//! All interactions conserve energy in the local comoving frame: the packet
//! is transformed in, re-emitted isotropically, and transformed back out
//! with the Doppler factor of its new direction. Lab-frame energy therefore
//! changes slightly at every event, which is the first-order imprint of the
//! expansion work on the radiation field.

use ejecta::{LineInteraction, MacroAtomData, OpacityState, TransitionType};
use rand::Rng;

use crate::frame::{doppler_factor, inverse_doppler_factor};
use crate::packet::{InteractionKind, Packet};

/// Thomson scattering off free electrons
///
/// Elastic in the comoving frame: the comoving frequency is preserved and
/// only the direction is re-sampled isotropically.
pub fn thomson_scatter(packet: &mut Packet, inverse_ct: f64) {
    let doppler = doppler_factor(packet.r, packet.mu, inverse_ct);
    let comov_nu = packet.nu * doppler;
    let comov_energy = packet.energy * doppler;

    packet.last_interaction.kind = Some(InteractionKind::ElectronScattering);
    packet.last_interaction.in_nu = packet.nu;

    packet.mu = 2.0 * packet.rng.random::<f64>() - 1.0;
    let inverse_doppler = inverse_doppler_factor(packet.r, packet.mu, inverse_ct);
    packet.nu = comov_nu * inverse_doppler;
    packet.energy = comov_energy * inverse_doppler;
}

/// Line interaction at the resonance of `packet.next_line_id`
///
/// Resolves the absorbing line into an emission line according to the
/// configured mode, then re-emits the packet isotropically at the emission
/// line's frequency. Records the in/out line ids in the packet diagnostics.
pub fn line_scatter(packet: &mut Packet, opacity: &OpacityState, inverse_ct: f64) {
    let line_id = packet.next_line_id;
    packet.last_interaction.kind = Some(InteractionKind::Line);
    packet.last_interaction.in_nu = packet.nu;
    packet.last_interaction.in_line = Some(line_id);

    let emission_line = match opacity.line_interaction() {
        LineInteraction::Scatter => line_id,
        LineInteraction::Downbranch(data) | LineInteraction::MacroAtom(data) => {
            resolve_macro_atom(packet, data, line_id)
        }
    };
    line_emission(packet, opacity, emission_line, inverse_ct);
}

/// Re-emission in `emission_line` with an isotropically sampled direction
///
/// The comoving energy is conserved; the lab-frame frequency is the line
/// frequency blue-shifted back out of the comoving frame. The line pointer
/// moves past the emission line: the re-emitted packet is redward of it by
/// construction.
fn line_emission(
    packet: &mut Packet,
    opacity: &OpacityState,
    emission_line: usize,
    inverse_ct: f64,
) {
    let doppler = doppler_factor(packet.r, packet.mu, inverse_ct);
    let comov_energy = packet.energy * doppler;

    packet.mu = 2.0 * packet.rng.random::<f64>() - 1.0;
    let inverse_doppler = inverse_doppler_factor(packet.r, packet.mu, inverse_ct);
    packet.nu = opacity.line_list().nu(emission_line) * inverse_doppler;
    packet.energy = comov_energy * inverse_doppler;
    packet.next_line_id = emission_line + 1;
    packet.last_interaction.out_line = Some(emission_line);
}

/// Walks the macro-atom transition table until radiative de-excitation
///
/// Activates the level mapped from the absorbing line, then repeatedly
/// samples one transition out of the current level by scanning its
/// probability block. Internal transitions move the activation level;
/// an emission transition terminates the walk and names the emission line.
/// The scan index is clamped to the block end so a row that underflows its
/// normalization by rounding still selects its last transition.
fn resolve_macro_atom(packet: &mut Packet, data: &MacroAtomData, absorbing_line: usize) -> usize {
    let shell = packet.shell_id;
    let mut level = data.activation_level(absorbing_line);
    loop {
        let event_random = packet.rng.random::<f64>();
        let (start, end) = data.block(level);
        let mut transition = start;
        let mut cumulative = 0.0;
        while transition + 1 < end {
            cumulative += data.probability(transition, shell);
            if cumulative > event_random {
                break;
            }
            transition += 1;
        }
        match data.transition_type(transition) {
            TransitionType::Emission => return data.transition_line(transition),
            TransitionType::InternalDown | TransitionType::InternalUp => {
                level = data.destination_level(transition);
            }
        }
    }
}

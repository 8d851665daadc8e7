use approx::assert_relative_eq;
use ejecta::{Geometry, LineInteraction, LineList, OpacityState};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::estimators::Estimators;
use crate::packet::{InteractionKind, Packet, PacketStatus};
use crate::propagation::single_packet_loop;
use crate::spectrum::SpectrumGrid;
use crate::vpacket::VirtualPacketBuffer;

const DAY: f64 = 86_400.0;

fn wide_grid() -> SpectrumGrid {
    SpectrumGrid::new(1.0e13, 1.0e17, 100).unwrap()
}

fn no_vpacket_config() -> TransportConfig {
    TransportConfig::new(wide_grid(), 0)
}

fn vacuum_opacity(n_shells: usize) -> OpacityState {
    OpacityState::new(
        vec![0.0; n_shells],
        vec![],
        LineList::new(vec![]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap()
}

fn run(
    packet: &mut Packet,
    geometry: &Geometry,
    opacity: &OpacityState,
) -> Result<(), TransportError> {
    let config = no_vpacket_config();
    let mut estimators = Estimators::new(geometry.n_shells(), opacity.line_list().len());
    let mut buffer = VirtualPacketBuffer::new(&config.spectrum_grid);
    single_packet_loop(packet, geometry, opacity, &config, &mut estimators, &mut buffer)
}

#[test]
fn test_radial_packet_escapes_vacuum_unchanged() {
    let geometry = Geometry::new(
        vec![1.0e14, 2.0e14, 3.0e14],
        vec![2.0e14, 3.0e14, 4.0e14],
        10.0 * DAY,
    )
    .unwrap();
    let opacity = vacuum_opacity(3);
    let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, 3, 0);

    run(&mut packet, &geometry, &opacity).unwrap();

    assert_eq!(packet.status, PacketStatus::Emitted);
    assert_relative_eq!(packet.r, 4.0e14);
    assert_relative_eq!(packet.nu, 1.0e15);
    assert_relative_eq!(packet.energy, 1.0);
    assert_eq!(packet.last_interaction.kind, None);
}

#[test]
fn test_inward_packet_at_inner_boundary_is_reabsorbed() {
    let geometry =
        Geometry::new(vec![1.0e14, 2.0e14], vec![2.0e14, 3.0e14], 10.0 * DAY).unwrap();
    let opacity = vacuum_opacity(2);
    let mut packet = Packet::new(1.0e14, -1.0, 1.0e15, 1.0, 3, 0);

    run(&mut packet, &geometry, &opacity).unwrap();

    assert_eq!(packet.status, PacketStatus::Reabsorbed);
    assert_relative_eq!(packet.r, 1.0e14);
    assert_relative_eq!(packet.energy, 1.0);
}

#[test]
fn test_packet_on_outer_boundary_exits_without_looping() {
    let geometry = Geometry::new(vec![1.0e14], vec![2.0e14], 10.0 * DAY).unwrap();
    let opacity = vacuum_opacity(1);
    let mut packet = Packet::new(2.0e14, 1.0, 1.0e15, 1.0, 3, 0);

    run(&mut packet, &geometry, &opacity).unwrap();

    assert_eq!(packet.status, PacketStatus::Emitted);
    assert_relative_eq!(packet.r, 2.0e14);
    assert_relative_eq!(packet.nu, 1.0e15);
}

#[test]
fn test_certain_line_interaction_scatters_in_same_line() {
    // Optical depth so high the first resonance always interacts
    let geometry = Geometry::new(vec![1.0e14], vec![1.0e15], 10.0 * DAY).unwrap();
    let opacity = OpacityState::new(
        vec![0.0],
        vec![1.0e10],
        LineList::new(vec![9.9e14]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap();
    let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, 11, 0);

    run(&mut packet, &geometry, &opacity).unwrap();

    assert_ne!(packet.status, PacketStatus::InProcess);
    assert_eq!(packet.last_interaction.kind, Some(InteractionKind::Line));
    assert_eq!(packet.last_interaction.in_line, Some(0));
    assert_eq!(packet.last_interaction.out_line, Some(0));
    assert_relative_eq!(packet.last_interaction.in_nu, 1.0e15);
}

#[test]
fn test_line_estimators_updated_at_passed_resonance() {
    // Zero optical depth: the packet passes the resonance but still
    // deposits into the line estimators
    let geometry = Geometry::new(vec![1.0e14], vec![1.0e15], 10.0 * DAY).unwrap();
    let opacity = OpacityState::new(
        vec![0.0],
        vec![0.0],
        LineList::new(vec![9.9e14]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap();
    let config = no_vpacket_config();
    let mut estimators = Estimators::new(1, 1);
    let mut buffer = VirtualPacketBuffer::new(&config.spectrum_grid);
    let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, 11, 0);

    single_packet_loop(
        &mut packet,
        &geometry,
        &opacity,
        &config,
        &mut estimators,
        &mut buffer,
    )
    .unwrap();

    assert_eq!(packet.status, PacketStatus::Emitted);
    assert_eq!(packet.last_interaction.kind, None);
    assert!(estimators.j_blue(0, 0) > 0.0);
    assert!(estimators.e_dot_lu(0, 0) > 0.0);
}

#[test]
fn test_path_length_estimators_accumulate() {
    let geometry = Geometry::new(vec![1.0e14], vec![2.0e14], 10.0 * DAY).unwrap();
    let opacity = vacuum_opacity(1);
    let config = no_vpacket_config();
    let mut estimators = Estimators::new(1, 0);
    let mut buffer = VirtualPacketBuffer::new(&config.spectrum_grid);
    let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, 11, 0);

    single_packet_loop(
        &mut packet,
        &geometry,
        &opacity,
        &config,
        &mut estimators,
        &mut buffer,
    )
    .unwrap();

    // one radial chord of 1e14 cm with E_cmf = E * doppler at the start
    let doppler = 1.0 - 1.0e14 * geometry.inverse_ct();
    assert_relative_eq!(estimators.j()[0], doppler * 1.0e14, max_relative = 1e-12);
    assert_relative_eq!(
        estimators.nu_bar()[0],
        doppler * 1.0e14 * doppler * 1.0e15,
        max_relative = 1e-12
    );
}

#[test]
fn test_degenerate_state_fails_fast() {
    let geometry = Geometry::new(vec![1.0e14], vec![2.0e14], 10.0 * DAY).unwrap();
    let opacity = vacuum_opacity(1);
    let mut packet = Packet::new(f64::NAN, 0.5, 1.0e15, 1.0, 3, 7);

    let result = run(&mut packet, &geometry, &opacity);

    assert!(matches!(
        result,
        Err(TransportError::NoValidDistance { index: 7, .. })
    ));
}

#[test]
fn test_thomson_dominated_shell_scatters() {
    // Electron optical depth ~66 across the shell: interactions certain
    let geometry = Geometry::new(vec![1.0e14], vec![2.0e14], 100.0 * DAY).unwrap();
    let opacity = OpacityState::new(
        vec![1.0e12],
        vec![],
        LineList::new(vec![]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap();
    let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, 99, 0);

    run(&mut packet, &geometry, &opacity).unwrap();

    assert_ne!(packet.status, PacketStatus::InProcess);
    assert_eq!(
        packet.last_interaction.kind,
        Some(InteractionKind::ElectronScattering)
    );
    assert!(packet.nu > 0.0);
}

#[test]
fn test_electron_scatter_after_passed_resonance_terminates() {
    // A nearly transparent line is passed, then Thomson scattering turns
    // the packet around. The next trace must resume from the line pointer
    // committed at the scatter, not from the already-passed resonance.
    let geometry = Geometry::new(vec![1.0e14], vec![1.0e15], 10.0 * DAY).unwrap();
    let opacity = OpacityState::new(
        vec![1.0e10],
        vec![1.0e-9],
        LineList::new(vec![9.95e14]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap();

    for seed in 0..50 {
        let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, seed, seed as usize);
        run(&mut packet, &geometry, &opacity).unwrap();
        assert_ne!(packet.status, PacketStatus::InProcess);
        assert!(packet.nu > 0.0);
        assert!(packet.energy.is_finite() && packet.energy > 0.0);
        assert!((packet.energy - 1.0).abs() < 0.5, "energy drifted: {}", packet.energy);
    }
}

#[test]
fn test_energy_magnitude_nearly_conserved_with_scattering() {
    // v/c <= 8e-4 here, so per-event Doppler shifts stay tiny
    let geometry = Geometry::new(vec![1.0e14], vec![2.0e14], 100.0 * DAY).unwrap();
    let opacity = OpacityState::new(
        vec![3.0e10],
        vec![],
        LineList::new(vec![]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap();

    for seed in 0..20 {
        let mut packet = Packet::new(1.0e14, 1.0, 1.0e15, 1.0, seed, seed as usize);
        run(&mut packet, &geometry, &opacity).unwrap();
        assert_ne!(packet.status, PacketStatus::InProcess);
        assert!((packet.energy - 1.0).abs() < 0.05, "energy drifted: {}", packet.energy);
        assert!(packet.nu > 0.0);
    }
}

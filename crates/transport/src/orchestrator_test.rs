use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use ejecta::{Geometry, LineInteraction, LineList, OpacityState};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::orchestrator::{run_transport, PacketInput};
use crate::packet::PacketStatus;
use crate::progress::NoProgress;
use crate::spectrum::SpectrumGrid;

const DAY: f64 = 86_400.0;

fn five_shell_geometry() -> Geometry {
    let r_inner = vec![1.0e14, 2.8e14, 4.6e14, 6.4e14, 8.2e14];
    let r_outer = vec![2.8e14, 4.6e14, 6.4e14, 8.2e14, 1.0e15];
    Geometry::new(r_inner, r_outer, 10.0 * DAY).unwrap()
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

fn scattering_opacity(n_shells: usize, electron_density: f64) -> OpacityState {
    OpacityState::new(
        vec![electron_density; n_shells],
        vec![],
        LineList::new(vec![]).unwrap(),
        LineInteraction::Scatter,
    )
    .unwrap()
}

fn mixed_opacity(n_shells: usize) -> OpacityState {
    let lines = LineList::new(vec![1.15e15, 9.95e14, 8.5e14]).unwrap();
    let mut tau_sobolev = Vec::with_capacity(3 * n_shells);
    for tau in [0.5, 1.0e-9, 2.0] {
        tau_sobolev.extend(std::iter::repeat(tau).take(n_shells));
    }
    OpacityState::new(
        vec![1.0e10; n_shells],
        tau_sobolev,
        lines,
        LineInteraction::Scatter,
    )
    .unwrap()
}

fn population(n: usize) -> Vec<PacketInput> {
    (0..n)
        .map(|index| PacketInput {
            r: 1.1e14,
            mu: 0.05 + 0.9 * (index as f64) / (n as f64),
            nu: 8.0e14 + 4.0e14 * (index as f64) / (n as f64),
            energy: 1.0 / n as f64,
            seed: 1_000 + index as u64,
        })
        .collect()
}

fn default_config() -> TransportConfig {
    TransportConfig::new(SpectrumGrid::new(1.0e13, 1.0e17, 200).unwrap(), 3)
}

#[test]
fn test_run_is_reproducible_on_one_worker() {
    let geometry = five_shell_geometry();
    let opacity = scattering_opacity(5, 1.0e9);
    let inputs = population(300);
    let config = default_config();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let first = pool
        .install(|| run_transport(&inputs, &geometry, &opacity, &config, &NoProgress))
        .unwrap();
    let second = pool
        .install(|| run_transport(&inputs, &geometry, &opacity, &config, &NoProgress))
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_worker_count_does_not_change_packet_outcomes() {
    let geometry = five_shell_geometry();
    let opacity = scattering_opacity(5, 1.0e9);
    let inputs = population(600);
    let config = default_config();

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap();
    let serial = single
        .install(|| run_transport(&inputs, &geometry, &opacity, &config, &NoProgress))
        .unwrap();
    let parallel = many
        .install(|| run_transport(&inputs, &geometry, &opacity, &config, &NoProgress))
        .unwrap();

    // terminal packet states are bit-identical for any worker count
    assert_eq!(serial.packets, parallel.packets);
    assert_eq!(serial.n_emitted, parallel.n_emitted);
    assert_eq!(serial.n_reabsorbed, parallel.n_reabsorbed);

    // reductions agree up to floating-point summation order
    for (a, b) in serial.estimators.j().iter().zip(parallel.estimators.j()) {
        assert_relative_eq!(a, b, max_relative = 1.0e-12);
    }
    for (a, b) in serial
        .estimators
        .nu_bar()
        .iter()
        .zip(parallel.estimators.nu_bar())
    {
        assert_relative_eq!(a, b, max_relative = 1.0e-12);
    }
    assert_relative_eq!(
        serial.spectrum.total_luminosity(),
        parallel.spectrum.total_luminosity(),
        max_relative = 1.0e-12
    );
}

#[test]
fn test_mixed_line_and_electron_opacity_population_terminates() {
    // Lines and free electrons together: packets pass some resonances,
    // Thomson scatter between them, and every history must still reach a
    // terminal state with its energy intact
    let geometry = five_shell_geometry();
    let opacity = mixed_opacity(5);
    let inputs = population(300);
    let config = default_config();

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    assert_eq!(result.n_emitted + result.n_reabsorbed, 300);
    let mut total_energy = 0.0;
    for output in &result.packets {
        assert_ne!(output.status, PacketStatus::InProcess);
        assert!(output.nu > 0.0);
        assert!(output.energy.is_finite() && output.energy != 0.0);
        total_energy += output.energy.abs();
    }
    // weak Doppler shifts only: the population energy stays accounted
    assert_relative_eq!(total_energy, 1.0, max_relative = 0.05);
}

#[test]
fn test_inward_packets_are_all_reabsorbed() {
    let geometry = five_shell_geometry();
    let opacity = vacuum_opacity(5);
    let inputs: Vec<PacketInput> = (0..40)
        .map(|index| PacketInput {
            r: 2.0e14,
            mu: -1.0,
            nu: 1.0e15,
            energy: 0.025,
            seed: index as u64,
        })
        .collect();
    let mut config = default_config();
    config.n_vpackets = 0;

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    assert_eq!(result.n_emitted, 0);
    assert_eq!(result.n_reabsorbed, 40);
    for output in &result.packets {
        assert_eq!(output.status, PacketStatus::Reabsorbed);
        assert!(output.energy < 0.0);
    }
    assert_relative_eq!(result.spectrum.total_luminosity(), 0.0);
}

#[test]
fn test_vacuum_escape_conserves_lab_frame_energy() {
    let geometry = five_shell_geometry();
    let opacity = vacuum_opacity(5);
    let inputs: Vec<PacketInput> = (0..50)
        .map(|index| PacketInput {
            r: 1.1e14,
            mu: 1.0,
            nu: 1.0e15,
            energy: 0.02,
            seed: index as u64,
        })
        .collect();
    let mut config = default_config();
    config.n_vpackets = 0;

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    assert_eq!(result.n_emitted, 50);
    for (input, output) in inputs.iter().zip(&result.packets) {
        // no interaction touches the lab-frame energy or frequency
        assert_eq!(output.energy, input.energy);
        assert_eq!(output.nu, input.nu);
    }
}

#[test]
fn test_progress_listener_counts_every_packet() {
    let geometry = five_shell_geometry();
    let opacity = vacuum_opacity(5);
    let inputs = population(77);
    let config = default_config();

    let counter = AtomicUsize::new(0);
    let listener = |n: usize| {
        counter.fetch_add(n, Ordering::Relaxed);
    };
    run_transport(&inputs, &geometry, &opacity, &config, &listener).unwrap();

    assert_eq!(counter.load(Ordering::Relaxed), 77);
}

#[test]
fn test_single_packet_seed_replays_one_history_everywhere() {
    let geometry = five_shell_geometry();
    let opacity = scattering_opacity(5, 1.0e9);
    // identical initial conditions, distinct seeds
    let inputs: Vec<PacketInput> = (0..30)
        .map(|index| PacketInput {
            r: 1.1e14,
            mu: 0.4,
            nu: 1.0e15,
            energy: 1.0,
            seed: 42 + index as u64,
        })
        .collect();
    let mut config = default_config();
    config.single_packet_seed = Some(7);

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    let reference = result.packets[0];
    for output in &result.packets {
        assert_eq!(output.nu, reference.nu);
        assert_eq!(output.energy, reference.energy);
        assert_eq!(output.status, reference.status);
    }
}

#[test]
fn test_debug_seed_out_of_range_is_rejected() {
    let geometry = five_shell_geometry();
    let opacity = vacuum_opacity(5);
    let inputs = population(10);
    let mut config = default_config();
    config.single_packet_seed = Some(10);

    let err = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap_err();
    assert!(matches!(err, TransportError::DebugSeedOutOfRange(10)));
}

#[test]
fn test_shell_count_mismatch_is_rejected() {
    let geometry = five_shell_geometry();
    let opacity = vacuum_opacity(3);
    let inputs = population(10);
    let config = default_config();

    let err = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap_err();
    assert!(matches!(
        err,
        TransportError::ShellCountMismatch { got: 3, expected: 5 }
    ));
}

#[test]
fn test_out_of_band_virtual_samples_never_reach_the_histogram() {
    let geometry = five_shell_geometry();
    let opacity = scattering_opacity(5, 1.0e9);
    let inputs = population(100);
    // grid far below every packet frequency
    let mut config =
        TransportConfig::new(SpectrumGrid::new(1.0e10, 1.0e11, 50).unwrap(), 5);
    config.vpacket_logging = true;

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    assert_relative_eq!(result.spectrum.total_luminosity(), 0.0);
    assert!(result.virtual_samples.is_empty());
}

#[test]
fn test_vpacket_logging_returns_samples_in_packet_order() {
    let geometry = five_shell_geometry();
    let opacity = scattering_opacity(5, 1.0e9);
    let inputs = population(400);

    let mut config = default_config();
    let silent = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();
    assert!(silent.virtual_samples.is_empty());
    assert!(silent.spectrum.total_luminosity() > 0.0);

    config.vpacket_logging = true;
    let logged = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();
    assert!(!logged.virtual_samples.is_empty());
    assert!(logged
        .virtual_samples
        .windows(2)
        .all(|pair| pair[0].packet_index <= pair[1].packet_index));
    assert_relative_eq!(
        logged.spectrum.total_luminosity(),
        silent.spectrum.total_luminosity(),
        max_relative = 1.0e-12
    );
}

//! Propagate a seeded packet population through a scattering ejecta model
//!
//! Usage: cargo run -p transport --release --example escape_spectrum
//!
//! Output: spectrum.csv rows on stdout, one per frequency bin

use ejecta::{Geometry, LineInteraction, LineList, OpacityState};
use transport::{run_transport, NoProgress, PacketInput, SpectrumGrid, TransportConfig};

const DAY: f64 = 86_400.0;

fn main() {
    let n_shells = 20;
    let n_packets = 20_000;

    // homologous shell grid, 10 days after explosion
    let r_min = 1.0e14;
    let r_max = 2.0e15;
    let edges: Vec<f64> = (0..=n_shells)
        .map(|i| r_min + (r_max - r_min) * i as f64 / n_shells as f64)
        .collect();
    let r_inner = edges[..n_shells].to_vec();
    let r_outer = edges[1..].to_vec();
    let geometry = Geometry::new(r_inner.clone(), r_outer, 10.0 * DAY).unwrap();

    // electron density falling as r^-2, moderate total depth
    let electron_density: Vec<f64> = r_inner
        .iter()
        .map(|&r| 2.0e9 * (r_min / r).powi(2))
        .collect();

    // three resonance lines around the injection band
    let line_list = LineList::new(vec![1.10e15, 9.5e14, 8.2e14]).unwrap();
    let mut tau_sobolev = Vec::with_capacity(3 * n_shells);
    for tau in [1.5, 0.4, 3.0] {
        for shell in 0..n_shells {
            tau_sobolev.push(tau * (r_min / r_inner[shell]).powi(2));
        }
    }
    let opacity = OpacityState::new(
        electron_density,
        tau_sobolev,
        line_list,
        LineInteraction::Scatter,
    )
    .unwrap();

    // stratified injection at the inner boundary
    let inputs: Vec<PacketInput> = (0..n_packets)
        .map(|index| {
            let u = (index as f64 + 0.5) / n_packets as f64;
            PacketInput {
                r: r_min,
                mu: u.sqrt(),
                nu: 7.0e14 + 6.0e14 * u,
                energy: 1.0 / n_packets as f64,
                seed: 23 + index as u64,
            }
        })
        .collect();

    let grid = SpectrumGrid::new(5.0e14, 1.5e15, 100).unwrap();
    let config = TransportConfig::new(grid, 5);

    let result = run_transport(&inputs, &geometry, &opacity, &config, &NoProgress).unwrap();

    // CSV header
    println!("nu_hz,luminosity_per_hz");
    for (bin, luminosity) in result.spectrum.luminosity().iter().enumerate() {
        println!("{:.6e},{:.6e}", result.spectrum.grid().frequency(bin), luminosity);
    }

    eprintln!(
        "{} emitted, {} reabsorbed, virtual luminosity {:.4e}",
        result.n_emitted,
        result.n_reabsorbed,
        result.spectrum.total_luminosity(),
    );
}

use ejecta::ModelError;
use thiserror::Error;

/// Fatal transport failures
///
/// Any of these aborts the entire run. A packet that reaches a degenerate
/// numerical state indicates an inconsistency in the supplied opacity model
/// or geometry, so the error carries the packet index and its last known
/// state for the upstream diagnosis; individual packets are never skipped or
/// retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error(
        "packet {index}: comoving frequency {comov_nu:e} Hz fell below the next line \
         frequency {nu_line:e} Hz (r = {r:e} cm, mu = {mu}, shell {shell})"
    )]
    FrequencyBelowLine {
        index: usize,
        comov_nu: f64,
        nu_line: f64,
        r: f64,
        mu: f64,
        shell: usize,
    },

    #[error(
        "packet {index}: no finite propagation distance from r = {r:e} cm, mu = {mu}, \
         nu = {nu:e} Hz, shell {shell}"
    )]
    NoValidDistance {
        index: usize,
        r: f64,
        mu: f64,
        nu: f64,
        shell: usize,
    },

    #[error("opacity model and geometry disagree: {got} shells vs {expected}")]
    ShellCountMismatch { got: usize, expected: usize },

    #[error("single-packet debug seed index {0} is out of range for the packet population")]
    DebugSeedOutOfRange(usize),

    #[error("invalid spectrum grid: [{nu_min:e}, {nu_max:e}] Hz, {n_bins} bins")]
    InvalidSpectrumGrid {
        nu_min: f64,
        nu_max: f64,
        n_bins: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

use thiserror::Error;

/// Validation failures for model inputs
///
/// These are always fatal: a negative density or a malformed shell grid
/// means the upstream plasma/model calculation produced garbage, and the
/// transport core must refuse to run rather than silently clamp.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("geometry needs at least one shell")]
    EmptyGeometry,

    #[error("r_inner and r_outer have mismatched lengths ({inner} vs {outer})")]
    MismatchedShellArrays { inner: usize, outer: usize },

    #[error("shell {shell}: radii must be finite, positive and increasing (r_inner = {r_inner:e}, r_outer = {r_outer:e})")]
    InvalidShellRadii {
        shell: usize,
        r_inner: f64,
        r_outer: f64,
    },

    #[error("shells {shell} and {next} are not contiguous (r_outer = {r_outer:e}, next r_inner = {r_inner:e})")]
    NonContiguousShells {
        shell: usize,
        next: usize,
        r_outer: f64,
        r_inner: f64,
    },

    #[error("time since explosion must be positive and finite, got {0:e} s")]
    InvalidTimeExplosion(f64),

    #[error("line list must be sorted strictly descending in frequency (violated at index {index}: {nu:e} Hz)")]
    UnsortedLineList { index: usize, nu: f64 },

    #[error("line {index} has non-physical frequency {nu:e} Hz")]
    InvalidLineFrequency { index: usize, nu: f64 },

    #[error("shell {shell} has non-physical electron density {density:e} cm^-3")]
    InvalidElectronDensity { shell: usize, density: f64 },

    #[error("line {line}, shell {shell}: non-physical Sobolev optical depth {tau:e}")]
    InvalidOpticalDepth { line: usize, shell: usize, tau: f64 },

    #[error("tau_sobolev table has {got} entries, expected {expected} ({n_lines} lines x {n_shells} shells)")]
    OpticalDepthShape {
        got: usize,
        expected: usize,
        n_lines: usize,
        n_shells: usize,
    },

    #[error("macro-atom table is malformed: {0}")]
    MalformedMacroAtom(String),
}

//! Physical constants in cgs units

/// Speed of light in cm/s
pub const C_LIGHT: f64 = 2.99792458e10;

/// Inverse speed of light in s/cm
pub const INVERSE_C: f64 = 1.0 / C_LIGHT;

/// Thomson scattering cross section in cm²
pub const SIGMA_THOMSON: f64 = 6.652486e-25;

/// Sentinel distance for geometric misses, larger than any physical path
/// length through the ejecta (cm)
pub const MISS_DISTANCE: f64 = 1e99;

//! Lab/comoving frame transforms
//!
//! Homologous expansion gives every radius a radial velocity `v = r / t_exp`.
//! To first order in `v/c`, a packet moving with direction cosine `mu` at
//! radius `r` sees its frequency and energy scaled by the Doppler factor
//! `1 - mu * r / (c * t_exp)` when transformed into the local comoving frame.

/// Lab-to-comoving Doppler factor at `(r, mu)`
///
/// `inverse_ct` is `1 / (c * time_explosion)`, precomputed by
/// [`ejecta::Geometry::inverse_ct`].
///
/// # Examples
///
/// ```
/// use transport::frame::doppler_factor;
///
/// // A packet moving perpendicular to the flow sees no shift
/// assert_eq!(doppler_factor(1.0e14, 0.0, 1.0e-16), 1.0);
/// // An outward-moving packet is redshifted into the comoving frame
/// assert!(doppler_factor(1.0e14, 1.0, 1.0e-16) < 1.0);
/// ```
#[inline]
pub fn doppler_factor(r: f64, mu: f64, inverse_ct: f64) -> f64 {
    1.0 - mu * r * inverse_ct
}

/// Comoving-to-lab Doppler factor at `(r, mu)`
#[inline]
pub fn inverse_doppler_factor(r: f64, mu: f64, inverse_ct: f64) -> f64 {
    1.0 / (1.0 - mu * r * inverse_ct)
}

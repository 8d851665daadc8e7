//! Immutable model inputs for supernova ejecta radiative transfer
//!
//! This crate holds the per-iteration snapshot of the expanding medium that
//! the Monte Carlo transport loop reads but never mutates: the shell geometry
//! of the homologously expanding ejecta, the frequency-ordered line list with
//! Sobolev optical depths, per-shell electron densities, and the macro-atom
//! transition tables used to resolve line interactions.
//!
//! All inputs are validated at construction. Non-physical values (negative
//! densities, negative optical depths, overlapping shells) are rejected with
//! a [`ModelError`] rather than clamped, since they indicate an inconsistency in
//! the upstream plasma calculation, not a recoverable condition.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod lines;
pub mod macro_atom;
pub mod opacity;


pub use constants::{C_LIGHT, INVERSE_C, MISS_DISTANCE, SIGMA_THOMSON};
pub use error::ModelError;
pub use geometry::Geometry;
pub use lines::LineList;
pub use macro_atom::{MacroAtomData, TransitionType};
pub use opacity::{LineInteraction, OpacityState};

//! Macro-atom transition tables
//!
//! The macro-atom formalism tracks the internal excitation state of an
//! absorbing atom through a chain of probabilistic transitions until it
//! de-excites radiatively. The transport crate walks these tables at every
//! line interaction that is not a pure resonance scatter; the probabilities
//! themselves are computed upstream from the plasma state and are read-only
//! here.
//!
//! Transitions are stored in per-level blocks: `block_references[level]` is
//! the index of the first transition out of `level`, and the probabilities
//! of one block sum to one within each shell.
//!
//! # References
//!
//! - Lucy (2002) - "Monte Carlo transition probabilities"
//! - Lucy (2003) - "Monte Carlo transition probabilities II"

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Tolerance on per-level probability normalization
const NORMALIZATION_TOLERANCE: f64 = 1e-10;

/// Outcome class of a single macro-atom transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionType {
    /// Radiative de-excitation: the chain terminates and the packet is
    /// re-emitted in the associated line
    Emission,
    /// Internal transition to a lower level
    InternalDown,
    /// Internal transition to a higher level
    InternalUp,
}

/// Flattened macro-atom transition table
///
/// `probabilities` is laid out row-major as `[transition][shell]`, matching
/// the Sobolev optical depth table in [`crate::OpacityState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAtomData {
    probabilities: Vec<f64>,
    transition_type: Vec<TransitionType>,
    destination_level: Vec<usize>,
    transition_line: Vec<usize>,
    block_references: Vec<usize>,
    line_to_level: Vec<usize>,
    n_shells: usize,
}

impl MacroAtomData {
    /// Builds a validated transition table
    ///
    /// # Arguments
    ///
    /// * `probabilities` - `n_transitions * n_shells` transition
    ///   probabilities, `[transition][shell]` row-major
    /// * `transition_type` - Outcome class per transition
    /// * `destination_level` - Target level per transition (ignored for
    ///   emissions)
    /// * `transition_line` - Line list index per transition (the emission
    ///   line for `Emission` transitions)
    /// * `block_references` - `n_levels + 1` offsets delimiting each level's
    ///   transition block
    /// * `line_to_level` - Activation level per line (index into blocks),
    ///   one entry per line in the line list
    /// * `n_shells` - Number of radial shells
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedMacroAtom`] on shape mismatches,
    /// negative probabilities, rows that do not normalize to one, or
    /// out-of-range level references.
    pub fn new(
        probabilities: Vec<f64>,
        transition_type: Vec<TransitionType>,
        destination_level: Vec<usize>,
        transition_line: Vec<usize>,
        block_references: Vec<usize>,
        line_to_level: Vec<usize>,
        n_shells: usize,
    ) -> Result<Self, ModelError> {
        let n_transitions = transition_type.len();
        let malformed = |message: String| Err(ModelError::MalformedMacroAtom(message));

        if n_shells == 0 {
            return malformed("n_shells must be positive".into());
        }
        if destination_level.len() != n_transitions || transition_line.len() != n_transitions {
            return malformed(format!(
                "transition arrays have inconsistent lengths ({}, {}, {})",
                n_transitions,
                destination_level.len(),
                transition_line.len()
            ));
        }
        if probabilities.len() != n_transitions * n_shells {
            return malformed(format!(
                "probability table has {} entries, expected {}",
                probabilities.len(),
                n_transitions * n_shells
            ));
        }
        if block_references.is_empty()
            || block_references[0] != 0
            || *block_references.last().unwrap() != n_transitions
        {
            return malformed("block references must span [0, n_transitions]".into());
        }
        if block_references.windows(2).any(|pair| pair[0] > pair[1]) {
            return malformed("block references must be monotone".into());
        }
        if let Some(&p) = probabilities
            .iter()
            .find(|p| !(p.is_finite() && **p >= 0.0))
        {
            return malformed(format!("negative or non-finite probability {p:e}"));
        }

        let n_levels = block_references.len() - 1;
        if let Some(&level) = line_to_level.iter().find(|&&level| level >= n_levels) {
            return malformed(format!(
                "activation level {level} out of range ({n_levels} levels)"
            ));
        }
        if let Some(&level) = destination_level.iter().find(|&&level| level >= n_levels) {
            return malformed(format!(
                "destination level {level} out of range ({n_levels} levels)"
            ));
        }

        // Every non-empty block must normalize to one in every shell.
        for level in 0..n_levels {
            let block = block_references[level]..block_references[level + 1];
            if block.is_empty() {
                continue;
            }
            for shell in 0..n_shells {
                let total: f64 = block
                    .clone()
                    .map(|transition| probabilities[transition * n_shells + shell])
                    .sum();
                if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
                    return malformed(format!(
                        "level {level}, shell {shell}: probabilities sum to {total}, expected 1"
                    ));
                }
            }
        }

        Ok(Self {
            probabilities,
            transition_type,
            destination_level,
            transition_line,
            block_references,
            line_to_level,
            n_shells,
        })
    }

    /// Probability of `transition` in `shell`
    pub fn probability(&self, transition: usize, shell: usize) -> f64 {
        self.probabilities[transition * self.n_shells + shell]
    }

    /// Outcome class of `transition`
    pub fn transition_type(&self, transition: usize) -> TransitionType {
        self.transition_type[transition]
    }

    /// Target level of `transition`
    pub fn destination_level(&self, transition: usize) -> usize {
        self.destination_level[transition]
    }

    /// Line list index associated with `transition`
    pub fn transition_line(&self, transition: usize) -> usize {
        self.transition_line[transition]
    }

    /// Transition block `[start, end)` out of `level`
    pub fn block(&self, level: usize) -> (usize, usize) {
        (self.block_references[level], self.block_references[level + 1])
    }

    /// Activation level reached by absorbing in `line`
    pub fn activation_level(&self, line: usize) -> usize {
        self.line_to_level[line]
    }

    /// Number of lines the activation map covers
    pub fn n_lines(&self) -> usize {
        self.line_to_level.len()
    }
}

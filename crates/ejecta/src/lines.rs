//! Frequency-ordered atomic line list
//!
//! Line transition frequencies are stored sorted strictly descending
//! (blue to red). A packet propagating through the homologously expanding
//! ejecta redshifts monotonically in the comoving frame, so the next line it
//! can come into resonance with is always the next entry at or after its
//! current pointer into this list.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Atomic transition frequencies in Hz, sorted strictly descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineList {
    nu: Vec<f64>,
}

impl LineList {
    /// Builds a validated line list
    ///
    /// An empty list is valid and describes a continuum-only medium.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if any frequency is non-finite or
    /// non-positive, or the ordering is not strictly descending.
    pub fn new(nu: Vec<f64>) -> Result<Self, ModelError> {
        for (index, &value) in nu.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ModelError::InvalidLineFrequency { index, nu: value });
            }
            if index > 0 && value >= nu[index - 1] {
                return Err(ModelError::UnsortedLineList { index, nu: value });
            }
        }
        Ok(Self { nu })
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.nu.len()
    }

    /// True when the list holds no lines
    pub fn is_empty(&self) -> bool {
        self.nu.is_empty()
    }

    /// Frequency of line `line` in Hz
    pub fn nu(&self, line: usize) -> f64 {
        self.nu[line]
    }

    /// Index of the next resonance a redshifting packet will reach
    ///
    /// Returns the index of the first (bluest) line with
    /// `nu_line <= nu_insert`, or `len()` when `nu_insert` lies redward of
    /// the whole list.
    ///
    /// # Examples
    ///
    /// ```
    /// use ejecta::LineList;
    ///
    /// let lines = LineList::new(vec![4.0e15, 2.0e15, 1.0e15]).unwrap();
    ///
    /// assert_eq!(lines.search(5.0e15), 0);
    /// assert_eq!(lines.search(3.0e15), 1);
    /// assert_eq!(lines.search(0.5e15), 3);
    /// ```
    pub fn search(&self, nu_insert: f64) -> usize {
        self.nu.partition_point(|&nu_line| nu_line > nu_insert)
    }
}

//! Error types of the crate.
//!
//! Configuration problems are reported once, when a component is built.
//! Precondition failures of [`Archive::update`] are reported per call and
//! leave the archive untouched.
//!
//! [`Archive::update`]: crate::archive::Archive::update

use thiserror::Error;

use crate::individual::IndividualId;

/// An invalid configuration value. Nothing is clamped silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
  /// A bounded archive must be able to hold at least one individual.
  #[error("invalid capacity: {0}")]
  InvalidCapacity(usize),

  /// The adaptive grid needs at least one division per objective.
  #[error("invalid number of grid divisions: {0}")]
  InvalidDivisions(usize),

  /// The lower bound of the epsilon step exceeds its upper bound.
  #[error("invalid epsilon step bounds: min {min} > max {max}")]
  InvalidEpsilonBounds {
    /// Lower step bound.
    min: f64,
    /// Upper step bound.
    max: f64,
  },

  /// The start step does not lie within its bounds.
  #[error("epsilon step {step} lies outside of [{min}, {max}]")]
  EpsilonStepOutOfBounds {
    /// Start step.
    step: f64,
    /// Lower step bound.
    min: f64,
    /// Upper step bound.
    max: f64,
  },

  /// The planned number of neighborhoods must be positive.
  #[error("invalid planned neighborhood number: {0}")]
  InvalidNeighborhoodNumber(usize),
}

/// A failed archive update.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArchiveError {
  /// A candidate was passed to the archive before it was evaluated.
  #[error("individual {0} has not been evaluated")]
  Unevaluated(IndividualId),

  /// A candidate's objectives do not match the objectives already archived.
  #[error("individual {id} has objectives [{found}], expected [{expected}]")]
  IncompatibleObjectives {
    /// The offending candidate.
    id: IndividualId,
    /// Objectives of the archive.
    expected: String,
    /// Objectives of the candidate.
    found: String,
  },

  /// Grid cell identifiers of `divisions^dimensions` cells overflow `u128`.
  #[error(
    "adaptive grid with {divisions} divisions in {dimensions} dimensions \
     overflows the cell identifier"
  )]
  GridOverflow {
    /// Number of objectives.
    dimensions: usize,
    /// Divisions per objective.
    divisions: usize,
  },
}

/// A misuse of an [`Individual`](crate::individual::Individual).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndividualError {
  /// Objectives may be attached to an individual exactly once.
  #[error("individual {0} has already been evaluated")]
  AlreadyEvaluated(IndividualId),
}

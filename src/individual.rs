//! Candidate solutions and their identity.

pub mod set;

use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
    OnceLock,
  },
};

use crate::{error::IndividualError, objective::Objectives};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`Individual`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct IndividualId(u64);

impl IndividualId {
  fn next() -> Self {
    Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for IndividualId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A shared reference to an individual. Archives, populations and couples
/// all hold handles to the same individual.
pub type Handle<S> = Arc<Individual<S>>;

/// A candidate solution `S` and, once evaluated, its [`Objectives`].
///
/// Individuals are compared by identity: two individuals with the same
/// solution and the same objectives are still different individuals.
#[derive(Debug)]
pub struct Individual<S = ()> {
  id: IndividualId,
  solution: S,
  objectives: OnceLock<Objectives>,
}

impl<S> Individual<S> {
  /// Creates an unevaluated individual.
  pub fn new(solution: S) -> Self {
    Self {
      id: IndividualId::next(),
      solution,
      objectives: OnceLock::new(),
    }
  }

  /// Creates an individual that is already evaluated.
  pub fn evaluated(solution: S, objectives: Objectives) -> Self {
    Self {
      id: IndividualId::next(),
      solution,
      objectives: OnceLock::from(objectives),
    }
  }

  /// Wraps the individual into a shareable [`Handle`].
  pub fn into_handle(self) -> Handle<S> {
    Arc::new(self)
  }

  /// Returns the identity.
  pub fn id(&self) -> IndividualId {
    self.id
  }

  /// Returns the solution.
  pub fn solution(&self) -> &S {
    &self.solution
  }

  /// Returns the objectives, or `None` if not evaluated yet.
  pub fn objectives(&self) -> Option<&Objectives> {
    self.objectives.get()
  }

  /// Returns the minimization-normalized objective values, empty if not
  /// evaluated yet.
  pub fn values(&self) -> &[f64] {
    match self.objectives.get() {
      Some(objectives) => objectives.array(),
      None => &[],
    }
  }

  /// Returns `true` once objectives are attached.
  pub fn is_evaluated(&self) -> bool {
    self.objectives.get().is_some()
  }

  /// Attaches the evaluation result. Objectives never change afterwards.
  pub fn set_objectives(
    &self,
    objectives: Objectives,
  ) -> Result<(), IndividualError> {
    self
      .objectives
      .set(objectives)
      .map_err(|_| IndividualError::AlreadyEvaluated(self.id))
  }
}

impl<S> PartialEq for Individual<S> {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl<S> Eq for Individual<S> {}

impl<S> Hash for Individual<S> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::objective::Objective;

  #[test]
  fn test_identity() {
    let a = Individual::new(1.0);
    let b = Individual::new(1.0);
    assert_ne!(a, b);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.solution(), b.solution());
  }

  #[test]
  fn test_objectives_are_set_once() {
    let individual = Individual::new("x").into_handle();
    assert!(!individual.is_evaluated());
    let objectives = Objectives::new().with(Objective::min("f"), 1.0);
    individual.set_objectives(objectives.clone()).unwrap();
    assert_eq!(individual.objectives(), Some(&objectives));
    assert_eq!(
      individual.set_objectives(objectives),
      Err(IndividualError::AlreadyEvaluated(individual.id()))
    );
  }
}

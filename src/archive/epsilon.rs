//! A bounded archive thinned out by epsilon sampling.

use tracing::{trace, warn};

use crate::{
  archive::maintenance::ArchiveMaintenance,
  error::ConfigError,
  individual::{set::IndividualSet, Handle},
  survivor::SurvivorSelector,
};

/// A bounded archive that, when over capacity, lets a [`SurvivorSelector`]
/// choose `capacity` individuals out of the members and the candidates.
///
/// With an [`ESamplingSurvivorSelector`] the best individual of every
/// objective is kept. Should the selector return more than `capacity`
/// individuals, only the first `capacity` of them are kept.
///
/// [`ESamplingSurvivorSelector`]: crate::survivor::ESamplingSurvivorSelector
#[derive(Debug)]
pub struct EpsilonSamplingArchive<S, Sel> {
  members: IndividualSet<S>,
  capacity: usize,
  selector: Sel,
}

impl<S, Sel: SurvivorSelector<S>> EpsilonSamplingArchive<S, Sel> {
  /// Creates an archive bounded by `capacity`.
  pub fn new(capacity: usize, selector: Sel) -> Result<Self, ConfigError> {
    if capacity == 0 {
      return Err(ConfigError::InvalidCapacity(capacity));
    }
    Ok(Self {
      members: IndividualSet::new(),
      capacity,
      selector,
    })
  }

  /// Returns the maximum number of members.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the survivor selector.
  pub fn selector(&self) -> &Sel {
    &self.selector
  }
}

impl<S, Sel: SurvivorSelector<S>> ArchiveMaintenance<S>
  for EpsilonSamplingArchive<S, Sel>
{
  fn kind(&self) -> &'static str {
    "epsilon sampling"
  }

  fn members(&self) -> &IndividualSet<S> {
    &self.members
  }

  fn members_mut(&mut self) -> &mut IndividualSet<S> {
    &mut self.members
  }

  fn update_with_nondominated(&mut self, candidates: Vec<Handle<S>>) -> bool {
    if self.members.len() + candidates.len() <= self.capacity {
      return candidates
        .into_iter()
        .fold(false, |changed, c| self.members.insert(c) | changed);
    }

    let front: Vec<_> =
      self.members.iter().cloned().chain(candidates).collect();
    let mut survivors = self.selector.survivors(&front, self.capacity);
    trace!(
      front = front.len(),
      survivors = survivors.len(),
      "epsilon sampling selection"
    );
    if survivors.len() > self.capacity {
      warn!(
        survivors = survivors.len(),
        capacity = self.capacity,
        "more extreme individuals than capacity, truncating"
      );
      survivors.truncate(self.capacity);
    }
    self.reconcile(survivors)
  }
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::{
    archive::{
      tests::{contents, is_mutually_nondominated, point},
      Archive,
    },
    epsilon::{AdaptiveEpsilon, BoxTiePolicy},
    survivor::ESamplingSurvivorSelector,
  };

  fn archive(
    capacity: usize,
  ) -> EpsilonSamplingArchive<Vec<f64>, ESamplingSurvivorSelector<StdRng>> {
    let selector = ESamplingSurvivorSelector::new(
      AdaptiveEpsilon::new(0.0, 0.005, 0.0001, 0.005).unwrap(),
      BoxTiePolicy::Random,
      StdRng::seed_from_u64(5),
    );
    EpsilonSamplingArchive::new(capacity, selector).unwrap()
  }

  #[test]
  fn test_zero_capacity_is_rejected() {
    let selector =
      |p: &[Handle<()>], _: usize| -> Vec<Handle<()>> { p.to_vec() };
    assert_eq!(
      EpsilonSamplingArchive::<(), _>::new(0, selector).err(),
      Some(ConfigError::InvalidCapacity(0))
    );
  }

  #[test]
  fn test_fits_without_sampling() {
    let mut archive = archive(3);
    assert!(archive
      .update(&[point(&[1.0, 3.0]), point(&[3.0, 1.0])])
      .unwrap());
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.selector().epsilon().epsilon(), 0.0);
  }

  #[test]
  fn test_keeps_extremes_within_capacity() {
    let mut archive = archive(5);
    for i in 0..=20 {
      let i = i as f64;
      archive.update_one(&point(&[i, 20.0 - i])).unwrap();
      assert!(archive.len() <= 5);
      assert!(is_mutually_nondominated(&archive));
    }
    let contents = contents(&archive);
    assert_eq!(contents.len(), 5);
    assert_eq!(contents[0], [0.0, 20.0]);
    assert_eq!(contents[4], [20.0, 0.0]);
  }

  #[test]
  fn test_dominating_candidate_replaces_members() {
    let mut archive = archive(2);
    archive
      .update(&[point(&[1.0, 3.0]), point(&[2.0, 2.0]), point(&[3.0, 1.0])])
      .unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.update_one(&point(&[0.0, 0.0])).unwrap());
    assert_eq!(contents(&archive), [vec![0.0, 0.0]]);
  }

  #[test]
  fn test_truncates_oversized_selection() {
    let everyone = |p: &[Handle<Vec<f64>>], _: usize| p.to_vec();
    let mut archive =
      EpsilonSamplingArchive::<Vec<f64>, _>::new(2, everyone).unwrap();
    archive
      .update(&[point(&[1.0, 3.0]), point(&[2.0, 2.0]), point(&[3.0, 1.0])])
      .unwrap();
    assert_eq!(contents(&archive), [vec![1.0, 3.0], vec![2.0, 2.0]]);
  }
}

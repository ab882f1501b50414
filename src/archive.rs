//! Pareto archives and their shared update protocol.
//!
//! Every archive keeps a set of mutually non-dominated individuals. The only
//! way to change the membership is [`Archive::update`], which
//! 1. drops candidates that are already members (and duplicate candidates),
//! 2. reduces the candidates to their own non-dominated subset,
//! 3. drops candidates weakly dominated by a member and removes members
//!    dominated by a candidate,
//! 4. hands the remaining candidates to the archive-specific merge step.

pub mod crowding;
pub mod epsilon;
pub mod grid;
pub mod population;
pub mod unbounded;

use std::collections::HashSet;

pub use crowding::CrowdingArchive;
pub use epsilon::EpsilonSamplingArchive;
pub use grid::AdaptiveGridArchive;
use maintenance::ArchiveMaintenance;
pub use population::PopulationArchive;
use tracing::debug;
pub use unbounded::UnboundedArchive;

use crate::{
  error::ArchiveError,
  individual::{
    set::{ArchiveListener, Iter, ListenerId},
    Handle,
    Individual,
  },
  objective::Objectives,
};

/// A container of non-dominated individuals.
///
/// No two distinct members weakly dominate each other after any call to
/// [`Archive::update`]. Bounded archives additionally never hold more members
/// than their capacity.
///
/// There is no way to insert individuals directly; this trait is implemented
/// by the archives of this crate only.
pub trait Archive<S> {
  /// Offers `candidates` to the archive. Returns `true` if the membership
  /// changed.
  ///
  /// A candidate with the same objective values as a member is dropped and
  /// the member is kept, so offering such a twin returns `false`.
  ///
  /// Fails if a candidate is not evaluated or its objectives differ from the
  /// objectives of the other individuals. An error leaves the archive
  /// untouched.
  fn update(&mut self, candidates: &[Handle<S>]) -> Result<bool, ArchiveError>;

  /// Offers a single candidate to the archive.
  fn update_one(
    &mut self,
    candidate: &Handle<S>,
  ) -> Result<bool, ArchiveError> {
    self.update(std::slice::from_ref(candidate))
  }

  /// Returns `true` if `individual` is a member.
  fn contains(&self, individual: &Individual<S>) -> bool;

  /// Iterates over the members.
  fn iter(&self) -> Iter<'_, S>;

  /// Returns the number of members.
  fn len(&self) -> usize;

  /// Returns `true` if there are no members.
  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Registers a listener that is notified about every added and removed
  /// member.
  fn add_listener(
    &mut self,
    listener: Box<dyn ArchiveListener<S>>,
  ) -> ListenerId;

  /// Deregisters a listener. Returns `false` if it was not registered.
  fn remove_listener(&mut self, id: ListenerId) -> bool;
}

/// This private module prevents exposing the maintenance protocol to a user.
pub(crate) mod maintenance {
  use std::collections::HashSet;

  use crate::{
    error::ArchiveError,
    individual::{set::IndividualSet, Handle, IndividualId},
    objective::ParetoDominance,
  };

  /// Internal operations every archive provides to the update protocol.
  pub trait ArchiveMaintenance<S> {
    /// Short name used in log records.
    fn kind(&self) -> &'static str;

    /// The members.
    fn members(&self) -> &IndividualSet<S>;

    /// The members, mutably.
    fn members_mut(&mut self) -> &mut IndividualSet<S>;

    /// Validates archive-specific preconditions for candidates with
    /// `dimensions` objectives. Runs before anything is mutated.
    fn check(&mut self, _dimensions: usize) -> Result<(), ArchiveError> {
      Ok(())
    }

    /// Adds a member.
    fn insert_member(&mut self, individual: Handle<S>) -> bool {
      self.members_mut().insert(individual)
    }

    /// Removes a member.
    fn remove_member(&mut self, id: IndividualId) -> Option<Handle<S>> {
      self.members_mut().remove(id)
    }

    /// Reduces the candidates to those worth merging and removes members
    /// dominated by them. Returns the candidates and whether a member was
    /// removed.
    fn sanitize(
      &mut self,
      candidates: Vec<Handle<S>>,
    ) -> (Vec<Handle<S>>, bool) {
      let mut candidates: Vec<_> = candidates
        .into_iter()
        .filter(|c| !self.members().contains_id(c.id()))
        .collect();
      retain_nondominated(&mut candidates);

      let mut changed = false;
      let mut survivors = Vec::with_capacity(candidates.len());
      for candidate in candidates {
        let mut dominated = false;
        let mut doomed = Vec::new();
        for member in self.members().iter() {
          if member.values().weakly_dominates(candidate.values()) {
            dominated = true;
            break;
          } else if candidate.values().dominates(member.values()) {
            doomed.push(member.id());
          }
        }
        for id in doomed {
          changed |= self.remove_member(id).is_some();
        }
        if !dominated {
          survivors.push(candidate);
        }
      }
      (survivors, changed)
    }

    /// Merges candidates that are neither dominated by each other nor by a
    /// member. Returns `true` if the membership changed.
    fn update_with_nondominated(
      &mut self,
      candidates: Vec<Handle<S>>,
    ) -> bool;

    /// Makes `survivors` the exact membership. Members that are not
    /// survivors are removed first.
    fn reconcile(&mut self, survivors: Vec<Handle<S>>) -> bool {
      let keep: HashSet<IndividualId> =
        survivors.iter().map(|s| s.id()).collect();
      let doomed: Vec<_> = self
        .members()
        .iter()
        .map(|m| m.id())
        .filter(|id| !keep.contains(id))
        .collect();

      let mut changed = false;
      for id in doomed {
        changed |= self.remove_member(id).is_some();
      }
      for survivor in survivors {
        if !self.members().contains_id(survivor.id()) {
          changed |= self.insert_member(survivor);
        }
      }
      changed
    }
  }

  /// Removes every candidate weakly dominated by another candidate. Of two
  /// candidates with equal objectives the later one survives.
  pub fn retain_nondominated<S>(candidates: &mut Vec<Handle<S>>) {
    let mut i = 0;
    while i + 1 < candidates.len() {
      let mut j = i + 1;
      let mut removed = false;
      while j < candidates.len() {
        if candidates[j].values().weakly_dominates(candidates[i].values()) {
          candidates.remove(i);
          removed = true;
          break;
        } else if candidates[i]
          .values()
          .weakly_dominates(candidates[j].values())
        {
          // `j` now points at the next candidate
          candidates.remove(j);
        } else {
          j += 1;
        }
      }
      // revisit the same index after `i` was removed
      if !removed {
        i += 1;
      }
    }
  }
}

impl<S, A> Archive<S> for A
where
  A: ArchiveMaintenance<S>,
{
  fn update(&mut self, candidates: &[Handle<S>]) -> Result<bool, ArchiveError> {
    let reference = self.members().iter().next().and_then(|m| m.objectives());
    if let Some(dimensions) = validate(reference, candidates)? {
      self.check(dimensions)?;
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    let unique: Vec<_> = candidates
      .iter()
      .filter(|c| seen.insert(c.id()))
      .cloned()
      .collect();
    let offered = unique.len();

    let (survivors, mut changed) = self.sanitize(unique);
    let surviving = survivors.len();
    changed |= self.update_with_nondominated(survivors);

    debug!(
      archive = self.kind(),
      offered,
      surviving,
      size = self.members().len(),
      changed,
      "archive updated"
    );
    Ok(changed)
  }

  fn contains(&self, individual: &Individual<S>) -> bool {
    self.members().contains(individual)
  }

  fn iter(&self) -> Iter<'_, S> {
    self.members().iter()
  }

  fn len(&self) -> usize {
    self.members().len()
  }

  fn add_listener(
    &mut self,
    listener: Box<dyn ArchiveListener<S>>,
  ) -> ListenerId {
    self.members_mut().add_listener(listener)
  }

  fn remove_listener(&mut self, id: ListenerId) -> bool {
    self.members_mut().remove_listener(id)
  }
}

/// Checks that all candidates are evaluated and share the objectives of
/// `reference`, or of the first candidate if there is no reference. Returns
/// the number of objectives, if known.
fn validate<S>(
  reference: Option<&Objectives>,
  candidates: &[Handle<S>],
) -> Result<Option<usize>, ArchiveError> {
  let mut reference = reference;
  for candidate in candidates {
    let objectives = candidate
      .objectives()
      .ok_or(ArchiveError::Unevaluated(candidate.id()))?;
    match reference {
      None => reference = Some(objectives),
      Some(expected) if !expected.is_compatible(objectives) => {
        return Err(ArchiveError::IncompatibleObjectives {
          id: candidate.id(),
          expected: expected.describe_keys(),
          found: objectives.describe_keys(),
        })
      }
      Some(_) => {}
    }
  }
  Ok(reference.map(Objectives::len))
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::{
    individual::set::ArchiveEvent,
    objective::{Objective, ParetoDominance},
  };

  /// Creates an evaluated individual with minimized objectives `f0`, `f1`...
  pub(crate) fn point(values: &[f64]) -> Handle<Vec<f64>> {
    let objectives =
      values
        .iter()
        .enumerate()
        .fold(Objectives::new(), |o, (i, v)| {
          o.with(Objective::min(format!("f{i}")), *v)
        });
    Individual::evaluated(values.to_vec(), objectives).into_handle()
  }

  /// Returns `true` if no member weakly dominates another one.
  pub(crate) fn is_mutually_nondominated<A: Archive<Vec<f64>>>(
    archive: &A,
  ) -> bool {
    let members: Vec<_> = archive.iter().collect();
    members.iter().enumerate().all(|(i, a)| {
      members[i + 1..].iter().all(|b| {
        !a.values().weakly_dominates(b.values())
          && !b.values().weakly_dominates(a.values())
      })
    })
  }

  /// Returns the solutions of all members, sorted.
  pub(crate) fn contents<A: Archive<Vec<f64>>>(archive: &A) -> Vec<Vec<f64>> {
    let mut contents: Vec<_> =
      archive.iter().map(|i| i.solution().clone()).collect();
    contents.sort_by(|a, b| a.partial_cmp(b).unwrap());
    contents
  }

  #[test]
  fn test_retain_nondominated() {
    let mut candidates = vec![
      point(&[2.0, 2.0]),
      point(&[1.0, 3.0]),
      point(&[3.0, 3.0]),
      point(&[1.0, 1.0]),
      point(&[0.0, 5.0]),
    ];
    let best = candidates[3].id();
    let extreme = candidates[4].id();
    maintenance::retain_nondominated(&mut candidates);
    let ids: Vec<_> = candidates.iter().map(|c| c.id()).collect();
    assert_eq!(ids, [best, extreme]);
  }

  #[test]
  fn test_retain_nondominated_keeps_last_of_equals() {
    let mut candidates =
      vec![point(&[1.0, 1.0]), point(&[1.0, 1.0]), point(&[1.0, 1.0])];
    let last = candidates[2].id();
    maintenance::retain_nondominated(&mut candidates);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id(), last);
  }

  #[test]
  fn test_update_protocol() {
    let mut archive = UnboundedArchive::new();
    assert!(!archive.update(&[]).unwrap());
    assert!(archive.update(&[point(&[1.0, 2.0])]).unwrap());
    assert!(archive.update(&[point(&[2.0, 1.0])]).unwrap());
    // dominated by (1, 2)
    assert!(!archive.update(&[point(&[1.0, 3.0])]).unwrap());
    // equal to a member
    assert!(!archive.update(&[point(&[2.0, 1.0])]).unwrap());
    assert_eq!(contents(&archive), [vec![1.0, 2.0], vec![2.0, 1.0]]);

    assert!(archive.update(&[point(&[0.5, 1.5])]).unwrap());
    assert_eq!(contents(&archive), [vec![0.5, 1.5], vec![2.0, 1.0]]);
    assert!(is_mutually_nondominated(&archive));
  }

  #[test]
  fn test_member_wins_over_equal_candidate() {
    let mut archive = UnboundedArchive::new();
    let member = point(&[1.0, 1.0]);
    let twin = point(&[1.0, 1.0]);
    assert!(archive.update_one(&member).unwrap());
    assert!(!archive.update_one(&twin).unwrap());
    assert!(archive.contains(&member));
    assert!(!archive.contains(&twin));
  }

  #[test]
  fn test_reinsertion_is_noop() {
    let mut archive = UnboundedArchive::new();
    let a = point(&[1.0, 2.0]);
    assert!(archive.update_one(&a).unwrap());
    assert!(!archive.update_one(&a).unwrap());
    assert!(!archive.update(&[a.clone(), a.clone()]).unwrap());
    assert_eq!(archive.len(), 1);
    assert!(archive.contains(&a));
  }

  #[test]
  fn test_unevaluated_candidate_is_rejected() {
    let mut archive = UnboundedArchive::new();
    let good = point(&[1.0, 1.0]);
    let bad = Individual::new(vec![]).into_handle();
    assert_eq!(
      archive.update(&[good.clone(), bad.clone()]),
      Err(ArchiveError::Unevaluated(bad.id()))
    );
    assert!(archive.is_empty());
  }

  #[test]
  fn test_incompatible_candidate_is_rejected() {
    let mut archive = UnboundedArchive::new();
    archive.update(&[point(&[1.0, 1.0])]).unwrap();
    let other = point(&[0.0, 0.0, 0.0]);
    let err = archive.update(&[point(&[0.0, 0.0]), other.clone()]);
    assert_eq!(
      err,
      Err(ArchiveError::IncompatibleObjectives {
        id: other.id(),
        expected: "f0(MIN), f1(MIN)".into(),
        found: "f0(MIN), f1(MIN), f2(MIN)".into(),
      })
    );
    assert_eq!(contents(&archive), [vec![1.0, 1.0]]);
  }

  #[test]
  fn test_listeners_see_net_changes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let mut archive = UnboundedArchive::new();
    let id = archive.add_listener(Box::new(
      move |event: ArchiveEvent<'_, Vec<f64>>| {
        let entry = match event {
          ArchiveEvent::Added(i) => ("added", i.solution().clone()),
          ArchiveEvent::Removed(i) => ("removed", i.solution().clone()),
        };
        sink.lock().unwrap().push(entry);
      },
    ));
    archive.update(&[point(&[1.0, 2.0]), point(&[3.0, 3.0])]).unwrap();
    archive.update(&[point(&[0.0, 0.0])]).unwrap();
    assert!(archive.remove_listener(id));
    archive.update(&[point(&[-1.0, -1.0])]).unwrap();

    assert_eq!(
      *log.lock().unwrap(),
      [
        ("added", vec![1.0, 2.0]),
        ("removed", vec![1.0, 2.0]),
        ("added", vec![0.0, 0.0]),
      ]
    );
  }
}

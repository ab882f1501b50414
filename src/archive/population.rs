//! An archive mirroring the non-dominated part of the latest population.

use crate::{
  archive::maintenance::{retain_nondominated, ArchiveMaintenance},
  individual::{set::IndividualSet, Handle},
};

/// Holds exactly the non-dominated individuals of the last population it was
/// updated with. Members missing from that population are dropped even if
/// nothing dominates them, so the archive does not accumulate history.
#[derive(Debug)]
pub struct PopulationArchive<S> {
  members: IndividualSet<S>,
}

impl<S> Default for PopulationArchive<S> {
  fn default() -> Self {
    Self {
      members: IndividualSet::new(),
    }
  }
}

impl<S> PopulationArchive<S> {
  /// Creates an empty archive.
  pub fn new() -> Self {
    Self::default()
  }
}

impl<S> ArchiveMaintenance<S> for PopulationArchive<S> {
  fn kind(&self) -> &'static str {
    "population"
  }

  fn members(&self) -> &IndividualSet<S> {
    &self.members
  }

  fn members_mut(&mut self) -> &mut IndividualSet<S> {
    &mut self.members
  }

  // members are compared against nothing but the population itself
  fn sanitize(
    &mut self,
    mut candidates: Vec<Handle<S>>,
  ) -> (Vec<Handle<S>>, bool) {
    retain_nondominated(&mut candidates);
    (candidates, false)
  }

  fn update_with_nondominated(&mut self, candidates: Vec<Handle<S>>) -> bool {
    self.reconcile(candidates)
  }
}

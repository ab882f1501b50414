//! An archive without a capacity bound.

use crate::{
  archive::maintenance::ArchiveMaintenance,
  individual::{set::IndividualSet, Handle},
};

/// Keeps every non-dominated individual it has ever been offered, as long as
/// it stays non-dominated.
///
/// The archive grows without bound, so it suits analysis and debugging
/// rather than long optimization runs.
#[derive(Debug)]
pub struct UnboundedArchive<S> {
  members: IndividualSet<S>,
}

impl<S> Default for UnboundedArchive<S> {
  fn default() -> Self {
    Self {
      members: IndividualSet::new(),
    }
  }
}

impl<S> UnboundedArchive<S> {
  /// Creates an empty archive.
  pub fn new() -> Self {
    Self::default()
  }
}

impl<S> ArchiveMaintenance<S> for UnboundedArchive<S> {
  fn kind(&self) -> &'static str {
    "unbounded"
  }

  fn members(&self) -> &IndividualSet<S> {
    &self.members
  }

  fn members_mut(&mut self) -> &mut IndividualSet<S> {
    &mut self.members
  }

  fn update_with_nondominated(&mut self, candidates: Vec<Handle<S>>) -> bool {
    candidates
      .into_iter()
      .fold(false, |changed, c| self.members.insert(c) | changed)
  }
}

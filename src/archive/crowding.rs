//! A bounded archive that evicts the most crowded individuals.

use itertools::Itertools;
use tracing::trace;

use crate::{
  archive::maintenance::ArchiveMaintenance,
  density::{Crowding, FrontDensityIndicator},
  error::ConfigError,
  individual::{set::IndividualSet, Handle},
};

/// A bounded archive that, when over capacity, repeatedly drops the
/// individual with the lowest density value of the whole merged front.
///
/// Density values are recomputed after every single eviction. Of several
/// individuals with the same lowest value, the one that joined the front first
/// is dropped: members in insertion order precede the candidates in the order
/// they were offered.
#[derive(Debug)]
pub struct CrowdingArchive<S, D = Crowding> {
  members: IndividualSet<S>,
  capacity: usize,
  indicator: D,
}

impl<S> CrowdingArchive<S> {
  /// Creates an archive bounded by `capacity` that uses the crowding
  /// distance.
  pub fn new(capacity: usize) -> Result<Self, ConfigError> {
    Self::with_indicator(capacity, Crowding)
  }
}

impl<S, D: FrontDensityIndicator<S>> CrowdingArchive<S, D> {
  /// Creates an archive bounded by `capacity` that uses a custom density
  /// indicator.
  pub fn with_indicator(
    capacity: usize,
    indicator: D,
  ) -> Result<Self, ConfigError> {
    if capacity == 0 {
      return Err(ConfigError::InvalidCapacity(capacity));
    }
    Ok(Self {
      members: IndividualSet::new(),
      capacity,
      indicator,
    })
  }

  /// Returns the maximum number of members.
  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl<S, D: FrontDensityIndicator<S>> ArchiveMaintenance<S>
  for CrowdingArchive<S, D>
{
  fn kind(&self) -> &'static str {
    "crowding"
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

    let mut front: Vec<_> =
      self.members.iter().cloned().chain(candidates).collect();
    while front.len() > self.capacity {
      let values = self.indicator.density_values(&front);
      let Some(idx) = values.iter().position_min_by(|a, b| a.total_cmp(b))
      else {
        break;
      };
      let evicted = front.remove(idx);
      trace!(id = %evicted.id(), density = values[idx], "crowding eviction");
    }
    self.reconcile(front)
  }
}

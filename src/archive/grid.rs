//! A bounded archive that evicts from the most crowded cell of an adaptive
//! hypercube grid.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::{
  archive::maintenance::ArchiveMaintenance,
  error::{ArchiveError, ConfigError},
  individual::{set::IndividualSet, Handle, IndividualId},
};

/// Identifier of a grid cell.
pub type CellId = u128;

/// Tracked bounds of the objective space and the individuals holding them.
#[derive(Clone, Debug)]
struct Bounds {
  lower: Vec<f64>,
  upper: Vec<f64>,
  // `2 * i` holds the minimum of objective `i`, `2 * i + 1` its maximum
  extrema: Vec<Option<IndividualId>>,
}

impl Bounds {
  fn unknown(dimensions: usize) -> Self {
    Self {
      lower: vec![f64::INFINITY; dimensions],
      upper: vec![f64::NEG_INFINITY; dimensions],
      extrema: vec![None; 2 * dimensions],
    }
  }

  fn dimensions(&self) -> usize {
    self.lower.len()
  }

  fn is_complete(&self) -> bool {
    self.extrema.iter().all(Option::is_some)
  }

  fn is_extremum(&self, id: IndividualId) -> bool {
    self.extrema.contains(&Some(id))
  }

  /// Widens the bounds to cover `individuals`. Returns `true` if a bound
  /// moved.
  fn widen<'a, S: 'a>(
    &mut self,
    individuals: impl IntoIterator<Item = &'a Handle<S>>,
  ) -> bool {
    let mut changed = false;
    for individual in individuals {
      for (i, &value) in individual.values().iter().enumerate() {
        if value < self.lower[i] {
          self.lower[i] = value;
          self.extrema[2 * i] = Some(individual.id());
          changed = true;
        }
        if value > self.upper[i] {
          self.upper[i] = value;
          self.extrema[2 * i + 1] = Some(individual.id());
          changed = true;
        }
      }
    }
    changed
  }

  /// Forgets every bound held by `id`.
  fn forget(&mut self, id: IndividualId) {
    for (slot, holder) in self.extrema.iter_mut().enumerate() {
      if *holder == Some(id) {
        *holder = None;
        if slot % 2 == 0 {
          self.lower[slot / 2] = f64::INFINITY;
        } else {
          self.upper[slot / 2] = f64::NEG_INFINITY;
        }
      }
    }
  }
}

/// A bounded archive that partitions the objective space into a grid of
/// `divisions` bins per objective between adaptively tracked bounds.
///
/// While over capacity, a random non-extreme individual of the cell with the
/// most non-extreme occupants is evicted. The individuals holding the lower
/// and upper bound of each objective are never evicted unless nothing else
/// is left. Ties between equally crowded cells go to the cell created first.
#[derive(Debug)]
pub struct AdaptiveGridArchive<S, R> {
  members: IndividualSet<S>,
  capacity: usize,
  divisions: usize,
  rng: R,
  bounds: Option<Bounds>,
  // `divisions^i` for objective `i`
  strides: Vec<CellId>,
  cells: IndexMap<CellId, IndexSet<IndividualId>>,
  cell_of: HashMap<IndividualId, CellId>,
}

impl<S, R: Rng> AdaptiveGridArchive<S, R> {
  /// Creates an archive bounded by `capacity` with `divisions` bins per
  /// objective. `rng` decides between equally eligible individuals.
  pub fn new(
    capacity: usize,
    divisions: usize,
    rng: R,
  ) -> Result<Self, ConfigError> {
    if capacity == 0 {
      return Err(ConfigError::InvalidCapacity(capacity));
    }
    if divisions == 0 {
      return Err(ConfigError::InvalidDivisions(divisions));
    }
    Ok(Self {
      members: IndividualSet::new(),
      capacity,
      divisions,
      rng,
      bounds: None,
      strides: Vec::new(),
      cells: IndexMap::new(),
      cell_of: HashMap::new(),
    })
  }

  /// Returns the maximum number of members.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the number of bins per objective.
  pub fn divisions(&self) -> usize {
    self.divisions
  }

  /// Returns the cell `individual` falls into under the current bounds, or
  /// `None` before the first update.
  pub fn cell_id(&self, individual: &Handle<S>) -> Option<CellId> {
    let bounds = self.bounds.as_ref()?;
    (bounds.dimensions() == individual.values().len())
      .then(|| self.locate(bounds, individual.values()))
  }

  fn locate(&self, bounds: &Bounds, values: &[f64]) -> CellId {
    let div = self.divisions as f64;
    values
      .iter()
      .enumerate()
      .map(|(i, &value)| {
        let range = bounds.upper[i] - bounds.lower[i];
        let position = if range > 0.0 && range.is_finite() {
          // bins extend half a bin beyond both bounds
          let half = range / (2.0 * div);
          let step = (range + 2.0 * half) / div;
          ((value - (bounds.lower[i] - half)) / step)
            .floor()
            .clamp(0.0, div - 1.0) as CellId
        } else {
          0
        };
        position * self.strides[i]
      })
      .sum()
  }

  fn add_to_cell(&mut self, individual: &Handle<S>) {
    let Some(bounds) = self.bounds.as_ref() else {
      return;
    };
    let cell = self.locate(bounds, individual.values());
    self.cells.entry(cell).or_default().insert(individual.id());
    self.cell_of.insert(individual.id(), cell);
  }

  fn remove_from_cell(&mut self, id: IndividualId) {
    let Some(cell) = self.cell_of.remove(&id) else {
      return;
    };
    if let Some(occupants) = self.cells.get_mut(&cell) {
      occupants.shift_remove(&id);
      if occupants.is_empty() {
        self.cells.shift_remove(&cell);
      }
    }
  }

  fn rebuild_cells(&mut self, working: &[Handle<S>]) {
    self.cells.clear();
    self.cell_of.clear();
    for individual in working {
      self.add_to_cell(individual);
    }
  }

  /// Picks the individual to evict: a random non-extreme occupant of the
  /// most crowded cell.
  fn victim(&mut self) -> Option<IndividualId> {
    let bounds = self.bounds.as_ref()?;
    let mut crowded: Option<(&IndexSet<IndividualId>, usize)> = None;
    for occupants in self.cells.values() {
      let count =
        occupants.iter().filter(|id| !bounds.is_extremum(**id)).count();
      if count > crowded.map_or(0, |(_, c)| c) {
        crowded = Some((occupants, count));
      }
    }

    let eligible: Vec<IndividualId> = match crowded {
      Some((occupants, _)) => occupants
        .iter()
        .copied()
        .filter(|id| !bounds.is_extremum(*id))
        .collect(),
      None => {
        // only extrema left, so one of them has to go
        let occupants =
          self.cells.values().max_by_key(|occupants| occupants.len())?;
        warn!(
          capacity = self.capacity,
          extrema = occupants.len(),
          "adaptive grid capacity too small for its extrema"
        );
        occupants.iter().copied().collect()
      }
    };
    if eligible.is_empty() {
      return None;
    }
    let idx = self.rng.gen_range(0..eligible.len());
    Some(eligible[idx])
  }
}

impl<S, R: Rng> ArchiveMaintenance<S> for AdaptiveGridArchive<S, R> {
  fn kind(&self) -> &'static str {
    "adaptive grid"
  }

  fn members(&self) -> &IndividualSet<S> {
    &self.members
  }

  fn members_mut(&mut self) -> &mut IndividualSet<S> {
    &mut self.members
  }

  fn check(&mut self, dimensions: usize) -> Result<(), ArchiveError> {
    let overflow = ArchiveError::GridOverflow {
      dimensions,
      divisions: self.divisions,
    };
    let divisions = CellId::try_from(self.divisions)
      .map_err(|_| overflow.clone())?;
    let mut strides = Vec::with_capacity(dimensions);
    let mut stride: CellId = 1;
    for _ in 0..dimensions {
      strides.push(stride);
      stride = stride.checked_mul(divisions).ok_or(overflow.clone())?;
    }
    self.strides = strides;

    if self.bounds.as_ref().map(Bounds::dimensions) != Some(dimensions) {
      self.bounds = Some(Bounds::unknown(dimensions));
      self.cells.clear();
      self.cell_of.clear();
    }
    Ok(())
  }

  fn insert_member(&mut self, individual: Handle<S>) -> bool {
    if !self.cell_of.contains_key(&individual.id()) {
      self.add_to_cell(&individual);
    }
    self.members.insert(individual)
  }

  fn remove_member(&mut self, id: IndividualId) -> Option<Handle<S>> {
    self.remove_from_cell(id);
    if let Some(bounds) = self.bounds.as_mut() {
      bounds.forget(id);
    }
    self.members.remove(id)
  }

  fn update_with_nondominated(&mut self, candidates: Vec<Handle<S>>) -> bool {
    if candidates.is_empty() {
      return false;
    }
    let Some(mut bounds) = self.bounds.take() else {
      return false;
    };

    let moved = if bounds.is_complete() {
      bounds.widen(&candidates)
    } else {
      // a removed member held a bound, look for the new holder
      let members: Vec<_> = self.members.iter().cloned().collect();
      bounds.widen(members.iter().chain(&candidates))
    };
    self.bounds = Some(bounds);

    if moved {
      let members: Vec<_> = self.members.iter().cloned().collect();
      debug!(
        members = members.len(),
        cells = self.cells.len(),
        "adaptive grid bounds moved, rebuilding cells"
      );
      self.rebuild_cells(&members);
    }
    for candidate in &candidates {
      self.add_to_cell(candidate);
    }

    if self.members.len() + candidates.len() <= self.capacity {
      return candidates
        .into_iter()
        .fold(false, |changed, c| self.insert_member(c) | changed);
    }

    let mut working: IndexMap<IndividualId, Handle<S>> = self
      .members
      .iter()
      .chain(&candidates)
      .map(|i| (i.id(), i.clone()))
      .collect();
    while working.len() > self.capacity {
      let Some(victim) = self.victim() else {
        break;
      };
      trace!(
        id = %victim,
        cell = ?self.cell_of.get(&victim),
        "adaptive grid eviction"
      );
      self.remove_from_cell(victim);
      if let Some(bounds) = self.bounds.as_mut() {
        bounds.forget(victim);
      }
      working.shift_remove(&victim);
    }
    self.reconcile(working.into_values().collect())
  }
}

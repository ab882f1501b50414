//! Non-dominated sorting.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::{individual::Handle, objective::ParetoDominance};

// index of an individual in the sorted population
type PopulationIndex = usize;
// number of individuals dominating an individual
type DominanceCounter = u32;
// indices of individuals dominated by an individual
type DominanceList = Vec<PopulationIndex>;

/// A population partitioned into Pareto fronts.
///
/// The first front holds the individuals no other individual dominates, every
/// following front the individuals dominated only by members of previous
/// fronts. The first front keeps the order of the population.
#[derive(Debug)]
pub struct NonDominatedFronts<S> {
  fronts: Vec<Vec<Handle<S>>>,
}

impl<S> NonDominatedFronts<S> {
  /// Sorts `population` into fronts.
  ///
  /// The dominance relation of all pairs is computed in parallel.
  pub fn new(population: &[Handle<S>]) -> Self {
    let values: Vec<&[f64]> = population.iter().map(|i| i.values()).collect();

    // for each individual `p`, the individuals it dominates and the number
    // of individuals dominating it
    let (mut dominance_lists, mut dominance_counters): (
      Vec<DominanceList>,
      Vec<DominanceCounter>,
    ) = (0..values.len())
      .into_par_iter()
      .map(|p_idx| {
        let mut dominated = DominanceList::new();
        let mut counter: DominanceCounter = 0;
        for (q_idx, q) in values.iter().enumerate() {
          match values[p_idx].dominance(q) {
            Ordering::Less => dominated.push(q_idx),
            Ordering::Greater => counter += 1,
            Ordering::Equal => {}
          }
        }
        (dominated, counter)
      })
      .unzip();

    let mut current: Vec<PopulationIndex> = (0..values.len())
      .filter(|&idx| dominance_counters[idx] == 0)
      .collect();
    let mut fronts = Vec::new();
    while !current.is_empty() {
      let mut next = Vec::new();
      // for each individual `p` in the current front...
      for &p_idx in &current {
        // release the individuals dominated by `p`
        for q_idx in std::mem::take(&mut dominance_lists[p_idx]) {
          dominance_counters[q_idx] -= 1;
          if dominance_counters[q_idx] == 0 {
            next.push(q_idx);
          }
        }
      }
      fronts.push(current.iter().map(|&idx| population[idx].clone()).collect());
      current = next;
    }

    debug_assert_eq!(
      fronts.iter().map(Vec::len).sum::<usize>(),
      population.len(),
      "every individual must belong to exactly one front"
    );

    Self { fronts }
  }

  /// Returns the front at `index`, the first front being the best.
  pub fn front(&self, index: usize) -> Option<&[Handle<S>]> {
    self.fronts.get(index).map(Vec::as_slice)
  }

  /// Returns the number of fronts.
  pub fn len(&self) -> usize {
    self.fronts.len()
  }

  /// Returns `true` if the sorted population was empty.
  pub fn is_empty(&self) -> bool {
    self.fronts.is_empty()
  }

  /// Iterates over the fronts, best first.
  pub fn iter(&self) -> impl Iterator<Item = &[Handle<S>]> {
    self.fronts.iter().map(Vec::as_slice)
  }

  /// Returns the fronts, best first.
  pub fn into_fronts(self) -> Vec<Vec<Handle<S>>> {
    self.fronts
  }
}

/// Returns the best individual of each objective among `front`, without
/// duplicates and in objective order. Ties go to the individual listed first.
/// Individuals that are infeasible in an objective are never its best.
pub fn extreme_individuals<S>(front: &[Handle<S>]) -> Vec<Handle<S>> {
  let dimensions = front.first().map_or(0, |i| i.values().len());
  let mut extremes: Vec<Handle<S>> = Vec::with_capacity(dimensions);
  for dim in 0..dimensions {
    let best = front
      .iter()
      .filter(|i| {
        i.objectives()
          .and_then(|o| o.iter().nth(dim))
          .is_some_and(|(_, value)| value.is_some())
      })
      .fold(None::<&Handle<S>>, |best, i| match best {
        Some(b) if b.values()[dim] <= i.values()[dim] => Some(b),
        _ => Some(i),
      });
    if let Some(best) = best {
      if !extremes.iter().any(|e| e.id() == best.id()) {
        extremes.push(best.clone());
      }
    }
  }
  extremes
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    archive::tests::point,
    individual::Individual,
    objective::{Objective, Objectives, INFEASIBLE},
  };

  fn solutions(front: &[Handle<Vec<f64>>]) -> Vec<Vec<f64>> {
    front.iter().map(|i| i.solution().clone()).collect()
  }

  #[test]
  fn test_fronts() {
    let population = [
      point(&[3.0, 3.0]),
      point(&[1.0, 4.0]),
      point(&[2.0, 2.0]),
      point(&[4.0, 4.0]),
      point(&[4.0, 1.0]),
      point(&[3.0, 3.0]),
    ];
    let fronts = NonDominatedFronts::new(&population);
    assert_eq!(fronts.len(), 3);
    assert_eq!(
      solutions(fronts.front(0).unwrap()),
      [vec![1.0, 4.0], vec![2.0, 2.0], vec![4.0, 1.0]]
    );
    assert_eq!(
      solutions(fronts.front(1).unwrap()),
      [vec![3.0, 3.0], vec![3.0, 3.0]]
    );
    assert_eq!(solutions(fronts.front(2).unwrap()), [vec![4.0, 4.0]]);
    assert!(fronts.front(3).is_none());
    assert_eq!(fronts.iter().map(<[_]>::len).sum::<usize>(), 6);
  }

  #[test]
  fn test_empty_population() {
    let fronts = NonDominatedFronts::<()>::new(&[]);
    assert!(fronts.is_empty());
    assert!(fronts.into_fronts().is_empty());
  }

  #[test]
  fn test_chain() {
    let population: Vec<_> =
      (0..20).rev().map(|i| point(&[i as f64, i as f64])).collect();
    let fronts = NonDominatedFronts::new(&population).into_fronts();
    assert_eq!(fronts.len(), 20);
    assert_eq!(fronts[0][0].solution(), &vec![0.0, 0.0]);
    assert_eq!(fronts[19][0].solution(), &vec![19.0, 19.0]);
  }

  #[test]
  fn test_extreme_individuals() {
    let front = [
      point(&[2.0, 2.0]),
      point(&[1.0, 3.0]),
      point(&[3.0, 1.0]),
      point(&[1.0, 3.0]),
    ];
    let extremes = extreme_individuals(&front);
    assert_eq!(extremes.len(), 2);
    assert_eq!(extremes[0].id(), front[1].id());
    assert_eq!(extremes[1].id(), front[2].id());
  }

  #[test]
  fn test_single_extreme() {
    let front = [point(&[1.0, 1.0])];
    assert_eq!(extreme_individuals(&front).len(), 1);
    assert!(extreme_individuals::<()>(&[]).is_empty());
  }

  #[test]
  fn test_infeasible_is_never_extreme() {
    let individual = |a: Option<f64>, b: Option<f64>| {
      let objectives = Objectives::new()
        .with(Objective::max("a"), a)
        .with(Objective::min("b"), b);
      Individual::evaluated((), objectives).into_handle()
    };
    let front = [
      individual(INFEASIBLE, Some(0.0)),
      individual(Some(1.0), Some(5.0)),
      individual(Some(2.0), INFEASIBLE),
    ];
    let extremes = extreme_individuals(&front);
    // best `a` is 2, best `b` is 0
    assert_eq!(extremes.len(), 2);
    assert_eq!(extremes[0].id(), front[2].id());
    assert_eq!(extremes[1].id(), front[0].id());
  }
}

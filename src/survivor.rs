//! Survivor selection.

use rand::{seq::SliceRandom, Rng};
use tracing::{debug, trace};

use crate::{
  epsilon::{
    box_widths, partition_boxes, AdaptiveEpsilon, AdditiveEpsilonMapping,
    BoxTiePolicy, DefaultEpsilonAdaptation, EpsilonAdaptation, EpsilonMapping,
  },
  individual::Handle,
  sorting::{extreme_individuals, NonDominatedFronts},
};

/// Chooses the individuals of a population that survive into the next
/// generation.
///
/// # Examples
/// ```
/// # use pareto_archive::{individual::Handle, survivor::SurvivorSelector};
/// // the first `target` individuals survive
/// let mut s = |population: &[Handle<()>], target: usize| {
///   population.iter().take(target).cloned().collect::<Vec<_>>()
/// };
/// assert!(s.survivors(&[], 3).is_empty());
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait SurvivorSelector<S> {
  /// Returns about `target` survivors of `population`.
  fn survivors(
    &mut self,
    population: &[Handle<S>],
    target: usize,
  ) -> Vec<Handle<S>>;
}

impl<S, F> SurvivorSelector<S> for F
where
  F: FnMut(&[Handle<S>], usize) -> Vec<Handle<S>>,
{
  fn survivors(
    &mut self,
    population: &[Handle<S>],
    target: usize,
  ) -> Vec<Handle<S>> {
    self(population, target)
  }
}

/// Survivor selection by epsilon sampling.
///
/// Whole fronts survive as long as they fit. The first front that does not
/// fit is sampled: its individuals are grouped into epsilon boxes, and box
/// representatives are preferred over the other box occupants. The sampling
/// epsilon grows when there are more representatives than free places and
/// shrinks otherwise.
///
/// The best individual of each objective of the first front always survives,
/// even if that exceeds `target`. Extremes come first in the result, in
/// objective order.
#[derive(Debug)]
pub struct ESamplingSurvivorSelector<
  R,
  M = AdditiveEpsilonMapping,
  A = DefaultEpsilonAdaptation,
> {
  epsilon: AdaptiveEpsilon,
  tie_policy: BoxTiePolicy,
  mapping: M,
  adaptation: A,
  rng: R,
}

impl<R: Rng> ESamplingSurvivorSelector<R> {
  /// Creates a selector with the additive epsilon mapping and the default
  /// epsilon adaptation.
  pub fn new(
    epsilon: AdaptiveEpsilon,
    tie_policy: BoxTiePolicy,
    rng: R,
  ) -> Self {
    Self::with_parts(
      epsilon,
      tie_policy,
      AdditiveEpsilonMapping,
      DefaultEpsilonAdaptation,
      rng,
    )
  }
}

impl<R, M, A> ESamplingSurvivorSelector<R, M, A>
where
  R: Rng,
  M: EpsilonMapping,
  A: EpsilonAdaptation,
{
  /// Creates a selector with a custom epsilon mapping and adaptation.
  pub fn with_parts(
    epsilon: AdaptiveEpsilon,
    tie_policy: BoxTiePolicy,
    mapping: M,
    adaptation: A,
    rng: R,
  ) -> Self {
    Self {
      epsilon,
      tie_policy,
      mapping,
      adaptation,
      rng,
    }
  }

  /// Returns the current sampling epsilon.
  pub fn epsilon(&self) -> &AdaptiveEpsilon {
    &self.epsilon
  }

  /// Fills `survivors` up to `target` from `front`, never dropping `fixed`.
  fn sample<S>(
    &mut self,
    front: &[Handle<S>],
    fixed: &[Handle<S>],
    target: usize,
    survivors: &mut Vec<Handle<S>>,
  ) {
    let others: Vec<_> = front
      .iter()
      .filter(|i| !fixed.iter().any(|f| f.id() == i.id()))
      .cloned()
      .collect();
    survivors.extend_from_slice(fixed);

    let amplitudes = self.mapping.amplitudes(&others);
    let widths = box_widths(self.epsilon.epsilon(), &amplitudes);
    let (dominant, mut dominated) =
      partition_boxes(&others, &widths, self.tie_policy, &mut self.rng);

    let too_many = survivors.len() + dominant.len() > target;
    debug!(
      front = front.len(),
      dominant = dominant.len(),
      dominated = dominated.len(),
      free = target.saturating_sub(survivors.len()),
      epsilon = self.epsilon.epsilon(),
      "epsilon sampling"
    );
    self.adaptation.adapt(&mut self.epsilon, !too_many);

    let mut pool = if too_many {
      dominant
    } else {
      survivors.extend(dominant);
      std::mem::take(&mut dominated)
    };
    let free = target.saturating_sub(survivors.len()).min(pool.len());
    let (chosen, _) = pool.partial_shuffle(&mut self.rng, free);
    trace!(chosen = chosen.len(), "epsilon sampling draw");
    survivors.extend_from_slice(chosen);
  }
}

impl<S, R, M, A> SurvivorSelector<S> for ESamplingSurvivorSelector<R, M, A>
where
  R: Rng,
  M: EpsilonMapping,
  A: EpsilonAdaptation,
{
  fn survivors(
    &mut self,
    population: &[Handle<S>],
    target: usize,
  ) -> Vec<Handle<S>> {
    let fronts = NonDominatedFronts::new(population);
    let extremes =
      fronts.front(0).map(extreme_individuals).unwrap_or_default();
    // extremes survive even when nothing else is wanted
    if target == 0 {
      return extremes;
    }

    let mut survivors = Vec::with_capacity(target.max(extremes.len()));
    for (idx, front) in fronts.iter().enumerate() {
      if survivors.len() >= target {
        break;
      }
      if survivors.len() + front.len() <= target {
        survivors.extend_from_slice(front);
        continue;
      }
      let fixed: &[Handle<S>] = if idx == 0 { &extremes } else { &[] };
      self.sample(front, fixed, target, &mut survivors);
      break;
    }
    survivors
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::{archive::tests::point, individual::IndividualId};

  fn selector(epsilon: f64) -> ESamplingSurvivorSelector<StdRng> {
    ESamplingSurvivorSelector::new(
      AdaptiveEpsilon::new(epsilon, 0.01, 0.001, 0.1).unwrap(),
      BoxTiePolicy::First,
      StdRng::seed_from_u64(11),
    )
  }

  fn ids(individuals: &[Handle<Vec<f64>>]) -> HashSet<IndividualId> {
    individuals.iter().map(|i| i.id()).collect()
  }

  #[test]
  fn test_whole_fronts_survive() {
    let population = [
      point(&[1.0, 3.0]),
      point(&[3.0, 1.0]),
      point(&[2.0, 4.0]),
      point(&[4.0, 2.0]),
      point(&[5.0, 5.0]),
    ];
    let mut s = selector(0.0);
    let survivors = s.survivors(&population, 4);
    assert_eq!(survivors.len(), 4);
    assert_eq!(ids(&survivors), ids(&population[..4]));
    // nothing was sampled
    assert_eq!(s.epsilon().epsilon(), 0.0);
  }

  #[test]
  fn test_small_population_survives() {
    let population = [point(&[1.0, 3.0]), point(&[3.0, 3.0])];
    let survivors = selector(0.0).survivors(&population, 10);
    assert_eq!(survivors.len(), 2);
  }

  #[test]
  fn test_overflowing_first_front_is_sampled() {
    let front: Vec<_> = (0..=10)
      .map(|i| point(&[i as f64, 10.0 - i as f64]))
      .collect();
    let mut s = selector(0.0);
    let survivors = s.survivors(&front, 4);
    assert_eq!(survivors.len(), 4);
    // extremes first
    assert_eq!(survivors[0].id(), front[0].id());
    assert_eq!(survivors[1].id(), front[10].id());
    assert_eq!(ids(&survivors).len(), 4);
    // every point had its own box, so epsilon grows
    assert_eq!(s.epsilon().epsilon(), 0.01);
  }

  #[test]
  fn test_coarse_boxes_fill_from_dominated() {
    let front: Vec<_> = (0..=10)
      .map(|i| point(&[i as f64, 10.0 - i as f64]))
      .collect();
    // a single box for the nine inner points
    let mut s = selector(2.0);
    let survivors = s.survivors(&front, 5);
    assert_eq!(survivors.len(), 5);
    assert_eq!(ids(&survivors).len(), 5);
    assert!(survivors.iter().any(|i| i.id() == front[0].id()));
    assert!(survivors.iter().any(|i| i.id() == front[10].id()));
    // extremes and the representative leave free places, epsilon shrinks
    assert!((s.epsilon().epsilon() - 1.99).abs() < 1e-12);
  }

  #[test]
  fn test_overflowing_later_front_is_sampled() {
    let mut population = vec![point(&[0.0, 0.0])];
    population
      .extend((0..6).map(|i| point(&[1.0 + i as f64, 7.0 - i as f64])));
    let survivors = selector(0.0).survivors(&population, 3);
    assert_eq!(survivors.len(), 3);
    assert_eq!(survivors[0].id(), population[0].id());
  }

  #[test]
  fn test_extremes_exceed_target() {
    let front = [
      point(&[0.0, 9.0, 9.0]),
      point(&[9.0, 0.0, 9.0]),
      point(&[9.0, 9.0, 0.0]),
      point(&[5.0, 5.0, 5.0]),
    ];
    let survivors = selector(0.0).survivors(&front, 2);
    assert_eq!(ids(&survivors), ids(&front[..3]));
  }

  #[test]
  fn test_extremes_survive_zero_target() {
    let front = [
      point(&[0.0, 2.0]),
      point(&[1.0, 1.0]),
      point(&[2.0, 0.0]),
      point(&[3.0, 3.0]),
    ];
    let survivors = selector(0.0).survivors(&front, 0);
    assert_eq!(survivors.len(), 2);
    assert_eq!(ids(&survivors), ids(&[front[0].clone(), front[2].clone()]));
    let empty: &[Handle<Vec<f64>>] = &[];
    assert!(selector(0.0).survivors(empty, 0).is_empty());
  }

  #[test]
  fn test_same_seed_same_survivors() {
    let front: Vec<_> = (0..40)
      .map(|i| point(&[i as f64, 40.0 - i as f64]))
      .collect();
    let run = || {
      let mut s = selector(0.0);
      (0..5)
        .map(|_| {
          let mut v: Vec<_> =
            ids(&s.survivors(&front, 10)).into_iter().collect();
          v.sort_unstable();
          v
        })
        .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
  }
}

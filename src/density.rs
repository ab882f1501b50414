//! Density estimation for individuals of a single front.

use itertools::Itertools;

use crate::individual::Handle;

/// Estimates how crowded the neighbourhood of each individual of a front is.
///
/// # Examples
/// ```
/// # use pareto_archive::{density::FrontDensityIndicator, individual::Handle};
/// // every individual is equally valuable
/// let d = |front: &[Handle<()>]| vec![1.0; front.len()];
/// assert!(d.density_values(&[]).is_empty());
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait FrontDensityIndicator<S> {
  /// Returns one value per individual, in the order of `front`. Higher values
  /// mark more isolated individuals, i.e. individuals more worth keeping.
  fn density_values(&self, front: &[Handle<S>]) -> Vec<f64>;
}

impl<S, F> FrontDensityIndicator<S> for F
where
  F: Fn(&[Handle<S>]) -> Vec<f64>,
{
  fn density_values(&self, front: &[Handle<S>]) -> Vec<f64> {
    self(front)
  }
}

/// The crowding distance of NSGA-II.
///
/// For every objective the front is sorted by that objective. Both boundary
/// individuals get an infinite distance, every other individual accumulates
/// the normalized gap between its two neighbours. Objectives whose values are
/// all equal are skipped.
#[derive(Clone, Copy, Default, Debug)]
pub struct Crowding;

// index of an individual in the front
type FrontIndex = usize;

impl Crowding {
  /// Returns the crowding distance of each individual of `front`.
  pub fn distances<S>(&self, front: &[Handle<S>]) -> Vec<f64> {
    let mut distances = vec![0.0; front.len()];
    let Some(dimensions) = front.first().map(|i| i.values().len()) else {
      return distances;
    };

    for dim in 0..dimensions {
      let value = |idx: FrontIndex| front[idx].values()[dim];
      // stable, so equal values keep the order of `front`
      let order: Vec<FrontIndex> = (0..front.len())
        .sorted_by(|&a, &b| value(a).total_cmp(&value(b)))
        .collect();

      let (first, last) = (order[0], order[order.len() - 1]);
      let range = value(last) - value(first);
      if range <= 0.0 {
        continue;
      }
      distances[first] = f64::INFINITY;
      distances[last] = f64::INFINITY;
      // infeasible values make the range infinite, gaps are meaningless then
      if range.is_finite() {
        for (prev, idx, next) in order.iter().copied().tuple_windows() {
          distances[idx] += (value(next) - value(prev)) / range;
        }
      }
    }

    distances
  }

  /// Returns the individuals of `front` ordered by descending crowding
  /// distance. Individuals with equal distances keep their relative order.
  pub fn order<S>(&self, front: &[Handle<S>]) -> Vec<Handle<S>> {
    let distances = self.distances(front);
    (0..front.len())
      .sorted_by(|&a, &b| distances[b].total_cmp(&distances[a]))
      .map(|idx| front[idx].clone())
      .collect()
  }
}

impl<S> FrontDensityIndicator<S> for Crowding {
  fn density_values(&self, front: &[Handle<S>]) -> Vec<f64> {
    self.distances(front)
  }
}

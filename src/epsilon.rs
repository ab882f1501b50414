//! Adaptive epsilon values, epsilon-enhanced objectives and epsilon boxes.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ConfigError, individual::Handle};

/// An epsilon value that adapts itself in steps of adaptive size.
///
/// Growing adds the current step to the value and doubles the step, shrinking
/// subtracts it (never going below zero) and halves the step. The step always
/// stays within `[step_min, step_max]`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AdaptiveEpsilon {
  epsilon: f64,
  step: f64,
  step_min: f64,
  step_max: f64,
}

impl AdaptiveEpsilon {
  /// Creates an adaptive epsilon starting at `epsilon` with a start `step`
  /// within `[step_min, step_max]`.
  pub fn new(
    epsilon: f64,
    step: f64,
    step_min: f64,
    step_max: f64,
  ) -> Result<Self, ConfigError> {
    if step_min > step_max {
      return Err(ConfigError::InvalidEpsilonBounds {
        min: step_min,
        max: step_max,
      });
    }
    if !(step_min..=step_max).contains(&step) {
      return Err(ConfigError::EpsilonStepOutOfBounds {
        step,
        min: step_min,
        max: step_max,
      });
    }
    Ok(Self {
      epsilon,
      step,
      step_min,
      step_max,
    })
  }

  /// Returns the current value.
  pub fn epsilon(&self) -> f64 {
    self.epsilon
  }

  /// Returns the current step.
  pub fn step(&self) -> f64 {
    self.step
  }

  /// Returns the lower bound of the step.
  pub fn step_min(&self) -> f64 {
    self.step_min
  }

  /// Returns the upper bound of the step.
  pub fn step_max(&self) -> f64 {
    self.step_max
  }

  /// Increases the value and accelerates.
  pub fn grow(&mut self) {
    self.epsilon += self.step;
    self.step = self.step_max.min(2.0 * self.step);
  }

  /// Decreases the value and slows down.
  pub fn shrink(&mut self) {
    self.epsilon = (self.epsilon - self.step).max(0.0);
    self.step = self.step_min.max(self.step / 2.0);
  }
}

/// Decides how an [`AdaptiveEpsilon`] reacts to feedback.
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait EpsilonAdaptation {
  /// Adapts `epsilon`. `too_big` tells whether it produced too few epsilon
  /// classes (boxes, neighbourhoods) last time.
  fn adapt(&mut self, epsilon: &mut AdaptiveEpsilon, too_big: bool);
}

impl<F> EpsilonAdaptation for F
where
  F: FnMut(&mut AdaptiveEpsilon, bool),
{
  fn adapt(&mut self, epsilon: &mut AdaptiveEpsilon, too_big: bool) {
    self(epsilon, too_big)
  }
}

/// Shrinks an epsilon that is too big and grows it otherwise.
#[derive(Clone, Copy, Default, Debug)]
pub struct DefaultEpsilonAdaptation;

impl EpsilonAdaptation for DefaultEpsilonAdaptation {
  fn adapt(&mut self, epsilon: &mut AdaptiveEpsilon, too_big: bool) {
    let old = epsilon.epsilon();
    if too_big {
      epsilon.shrink();
    } else {
      epsilon.grow();
    }
    debug!(
      old,
      new = epsilon.epsilon(),
      step = epsilon.step(),
      too_big,
      "epsilon adapted"
    );
  }
}

/// Computes epsilon-enhanced objective values.
///
/// All values are minimization-normalized, as returned by
/// [`Objectives::array`](crate::objective::Objectives::array).
pub trait EpsilonMapping {
  /// Returns the spread of the feasible values of each objective over
  /// `individuals`, zero for objectives without any feasible value.
  fn amplitudes<S>(&self, individuals: &[Handle<S>]) -> Vec<f64>;

  /// Returns `values` improved by an amount proportional to `epsilon` and the
  /// objective amplitudes.
  fn map(&self, values: &[f64], epsilon: f64, amplitudes: &[f64]) -> Vec<f64>;
}

/// Improves every objective by `epsilon` times its amplitude.
#[derive(Clone, Copy, Default, Debug)]
pub struct AdditiveEpsilonMapping;

impl EpsilonMapping for AdditiveEpsilonMapping {
  fn amplitudes<S>(&self, individuals: &[Handle<S>]) -> Vec<f64> {
    let mut extrema: Vec<Option<(f64, f64)>> = Vec::new();
    for objectives in individuals.iter().filter_map(|i| i.objectives()) {
      extrema.resize(objectives.len(), None);
      let feasibility = objectives.iter().map(|(_, value)| value.is_some());
      for ((bounds, &value), feasible) in
        extrema.iter_mut().zip(objectives.array()).zip(feasibility)
      {
        if !feasible {
          continue;
        }
        *bounds = Some(match *bounds {
          Some((min, max)) => (min.min(value), max.max(value)),
          None => (value, value),
        });
      }
    }
    extrema
      .into_iter()
      .map(|bounds| bounds.map_or(0.0, |(min, max)| max - min))
      .collect()
  }

  fn map(&self, values: &[f64], epsilon: f64, amplitudes: &[f64]) -> Vec<f64> {
    values
      .iter()
      .zip(amplitudes)
      .map(|(value, amplitude)| value - epsilon * amplitude)
      .collect()
  }
}

/// Which member of an epsilon box represents it.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
pub enum BoxTiePolicy {
  /// A uniformly random member.
  #[default]
  Random,
  /// The member that was listed first.
  First,
  /// The member closest to the box corner with the best values.
  ClosestToCorner,
}

/// The coordinates of an epsilon box.
///
/// Along objective `i` the box index is `floor(value / width_i)` with
/// `width_i = epsilon * amplitude_i`. Note that `epsilon` is relative to the
/// amplitude of each objective, not an absolute box width; a box is as wide as
/// [`AdditiveEpsilonMapping`] improves the values by. An objective with a zero
/// width is not discretized, the value itself is the coordinate.
#[derive(Clone, PartialEq, Debug)]
pub struct EpsilonBox(Vec<f64>);

impl EpsilonBox {
  /// Returns the box containing `values`.
  pub fn of(values: &[f64], widths: &[f64]) -> Self {
    Self(
      values
        .iter()
        .zip(widths)
        .map(|(&value, &width)| {
          if width > 0.0 {
            (value / width).floor()
          } else {
            value
          }
        })
        .collect(),
    )
  }

  /// Returns the coordinates.
  pub fn coordinates(&self) -> &[f64] {
    &self.0
  }

  /// Returns the corner of the box with the best values.
  fn corner(&self, widths: &[f64]) -> Vec<f64> {
    self
      .0
      .iter()
      .zip(widths)
      .map(|(&c, &width)| if width > 0.0 { c * width } else { c })
      .collect()
  }
}

// coordinates are never NaN, and -0.0 and 0.0 are the same box
impl Eq for EpsilonBox {}

impl Hash for EpsilonBox {
  fn hash<H: Hasher>(&self, state: &mut H) {
    for c in &self.0 {
      let c = if *c == 0.0 { 0.0 } else { *c };
      c.to_bits().hash(state);
    }
  }
}

/// Returns the box widths `epsilon * amplitude` of each objective.
pub fn box_widths(epsilon: f64, amplitudes: &[f64]) -> Vec<f64> {
  amplitudes.iter().map(|a| epsilon * a).collect()
}

/// Splits `individuals` into one representative per epsilon box and the
/// remaining, epsilon-dominated individuals. Boxes are visited in the order
/// of their first occupant.
pub fn partition_boxes<S, R: Rng + ?Sized>(
  individuals: &[Handle<S>],
  widths: &[f64],
  policy: BoxTiePolicy,
  rng: &mut R,
) -> (Vec<Handle<S>>, Vec<Handle<S>>) {
  let mut boxes: IndexMap<EpsilonBox, Vec<&Handle<S>>> = IndexMap::new();
  for individual in individuals {
    boxes
      .entry(EpsilonBox::of(individual.values(), widths))
      .or_default()
      .push(individual);
  }

  let mut dominant = Vec::with_capacity(boxes.len());
  let mut dominated = Vec::new();
  for (key, occupants) in boxes {
    let chosen = match policy {
      BoxTiePolicy::Random => rng.gen_range(0..occupants.len()),
      BoxTiePolicy::First => 0,
      BoxTiePolicy::ClosestToCorner => {
        let corner = key.corner(widths);
        let distance = |i: &Handle<S>| -> f64 {
          i.values()
            .iter()
            .zip(&corner)
            .map(|(v, c)| (v - c) * (v - c))
            .sum()
        };
        (0..occupants.len())
          .min_by(|&a, &b| {
            distance(occupants[a]).total_cmp(&distance(occupants[b]))
          })
          .unwrap_or(0)
      }
    };
    for (idx, occupant) in occupants.into_iter().enumerate() {
      if idx == chosen {
        dominant.push(occupant.clone());
      } else {
        dominated.push(occupant.clone());
      }
    }
  }
  (dominant, dominated)
}

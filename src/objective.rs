//! Objective vectors and the Pareto dominance relation between them.
//!
//! An [`Objectives`] value is an ordered collection of named objectives, each
//! with an optimization direction ([`Sign`]) and a value. All comparisons are
//! made on a normalized view where every objective is minimized: values of
//! [`Sign::Max`] objectives are negated and [`INFEASIBLE`] values become
//! [`f64::MAX`], so they are worse than any feasible value.

use std::{cmp::Ordering, fmt, sync::Arc};

/// Optimization direction of an [`Objective`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sign {
  /// Lower values are better.
  Min,
  /// Higher values are better.
  Max,
}

impl fmt::Display for Sign {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Sign::Min => f.write_str("MIN"),
      Sign::Max => f.write_str("MAX"),
    }
  }
}

/// The identifier of a single objective: a name and a direction.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Objective {
  name: Arc<str>,
  sign: Sign,
}

impl Objective {
  /// Creates an objective with given name and direction.
  pub fn new(name: impl Into<Arc<str>>, sign: Sign) -> Self {
    Self {
      name: name.into(),
      sign,
    }
  }

  /// Creates a minimized objective.
  pub fn min(name: impl Into<Arc<str>>) -> Self {
    Self::new(name, Sign::Min)
  }

  /// Creates a maximized objective.
  pub fn max(name: impl Into<Arc<str>>) -> Self {
    Self::new(name, Sign::Max)
  }

  /// Returns the name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the direction.
  pub fn sign(&self) -> Sign {
    self.sign
  }
}

impl fmt::Display for Objective {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", self.name, self.sign)
  }
}

/// A value of an objective. `None` marks an infeasible result.
pub type Value = Option<f64>;

/// The value of an objective that could not be evaluated.
pub const INFEASIBLE: Value = None;

/// The objective vector of an evaluated individual.
///
/// Entries are kept sorted by objective name, so vectors built in a different
/// order compare equal.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Objectives {
  entries: Vec<(Objective, Value)>,
  array: Vec<f64>,
}

impl Objectives {
  /// Creates an empty objective vector.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the value of `objective`, replacing a previous value of an
  /// objective with the same name. `NaN` is stored as [`INFEASIBLE`].
  pub fn add(&mut self, objective: Objective, value: impl Into<Value>) {
    let value = value.into().filter(|v| !v.is_nan());
    match self
      .entries
      .binary_search_by(|(o, _)| o.name().cmp(objective.name()))
    {
      Ok(idx) => self.entries[idx] = (objective, value),
      Err(idx) => self.entries.insert(idx, (objective, value)),
    }
    self.array = self
      .entries
      .iter()
      .map(|(o, v)| normalize(o.sign(), *v))
      .collect();
  }

  /// Builder flavour of [`Objectives::add`].
  pub fn with(mut self, objective: Objective, value: impl Into<Value>) -> Self {
    self.add(objective, value);
    self
  }

  /// Returns the number of objectives.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` if no objective has been set.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Returns the raw value of the objective called `name`, or `None` if there
  /// is no such objective.
  pub fn get(&self, name: &str) -> Option<Value> {
    self
      .entries
      .iter()
      .find(|(o, _)| o.name() == name)
      .map(|(_, v)| *v)
  }

  /// Iterates over objectives and their raw values in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&Objective, Value)> {
    self.entries.iter().map(|(o, v)| (o, *v))
  }

  /// Iterates over the objectives in name order.
  pub fn keys(&self) -> impl Iterator<Item = &Objective> {
    self.entries.iter().map(|(o, _)| o)
  }

  /// Returns the normalized values: lower is better for each of them.
  pub fn array(&self) -> &[f64] {
    &self.array
  }

  /// Returns `true` if both vectors consist of the same objectives.
  pub fn is_compatible(&self, other: &Self) -> bool {
    self.entries.len() == other.entries.len()
      && self
        .keys()
        .zip(other.keys())
        .all(|(a, b)| a == b)
  }

  /// Returns `true` if `self` is no worse than `other` in every objective and
  /// strictly better in at least one.
  ///
  /// # Panics
  ///
  /// Panics if the vectors consist of different objectives.
  pub fn dominates(&self, other: &Self) -> bool {
    self.assert_compatible(other);
    self.array.dominance(&other.array) == Ordering::Less
  }

  /// Returns `true` if `self` is no worse than `other` in every objective.
  ///
  /// # Panics
  ///
  /// Panics if the vectors consist of different objectives.
  pub fn weakly_dominates(&self, other: &Self) -> bool {
    self.assert_compatible(other);
    self.array.weakly_dominates(&other.array)
  }

  /// Returns `true` if all values are equal.
  ///
  /// # Panics
  ///
  /// Panics if the vectors consist of different objectives.
  pub fn is_equal(&self, other: &Self) -> bool {
    self.assert_compatible(other);
    self.array == other.array
  }

  /// Returns the euclidean distance between both vectors.
  ///
  /// # Panics
  ///
  /// Panics if the vectors consist of different objectives.
  pub fn distance(&self, other: &Self) -> f64 {
    self.assert_compatible(other);
    self
      .array
      .iter()
      .zip(&other.array)
      .map(|(a, b)| (a - b) * (a - b))
      .sum::<f64>()
      .sqrt()
  }

  /// Returns a printable list of the objectives, e.g. `f1(MIN), f2(MAX)`.
  pub fn describe_keys(&self) -> String {
    self
      .keys()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ")
  }

  fn assert_compatible(&self, other: &Self) {
    assert!(
      self.is_compatible(other),
      "cannot compare objectives [{}] with [{}]",
      self.describe_keys(),
      other.describe_keys(),
    );
  }
}

impl fmt::Display for Objectives {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (o, v)) in self.entries.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      match v {
        Some(v) => write!(f, "{o}={v}")?,
        None => write!(f, "{o}=INFEASIBLE")?,
      }
    }
    Ok(())
  }
}

fn normalize(sign: Sign, value: Value) -> f64 {
  match (sign, value) {
    (_, None) => f64::MAX,
    (Sign::Min, Some(v)) => v,
    (Sign::Max, Some(v)) => -v,
  }
}

/// Describes pareto dominance for normalized objective values.
pub(crate) trait ParetoDominance {
  /// Returns `Less` if `self` dominates `other`, `Greater` if `other`
  /// dominates `self`, otherwise `Equal`. Lower values are better.
  fn dominance(&self, other: &Self) -> Ordering;

  /// Returns `true` if no value of `self` is greater than the respective
  /// value of `other`.
  fn weakly_dominates(&self, other: &Self) -> bool;

  /// Returns `true` if `self` dominates `other`.
  fn dominates(&self, other: &Self) -> bool {
    self.dominance(other) == Ordering::Less
  }
}

impl ParetoDominance for [f64] {
  fn dominance(&self, other: &Self) -> Ordering {
    let mut ord = Ordering::Equal;
    for (a, b) in self.iter().zip(other) {
      match (ord, a.partial_cmp(b).unwrap_or(Ordering::Equal)) {
        (Ordering::Equal, next_ord) => ord = next_ord,
        (Ordering::Greater, Ordering::Less)
        | (Ordering::Less, Ordering::Greater) => return Ordering::Equal,
        _ => {}
      }
    }
    ord
  }

  fn weakly_dominates(&self, other: &Self) -> bool {
    self.iter().zip(other).all(|(a, b)| a <= b)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn min2(a: f64, b: f64) -> Objectives {
    Objectives::new()
      .with(Objective::min("o0"), a)
      .with(Objective::min("o1"), b)
  }

  #[test]
  fn test_pareto_dominance() {
    assert_eq!([1.0, 2.0, 3.0].dominance(&[1.0, 2.0, 3.0]), Ordering::Equal);
    assert_eq!([1.0, 2.0, 3.0].dominance(&[3.0, 2.0, 1.0]), Ordering::Equal);
    assert_eq!(
      [10.0, 2.0, 3.0].dominance(&[1.0, 2.0, 3.0]),
      Ordering::Greater
    );
    assert_eq!(
      [-2.0, 2.0, -3.0].dominance(&[-1.0, 2.0, -3.0]),
      Ordering::Less
    );
    assert_eq!([1.0, 2.0, 3.0].dominance(&[1.0, 2.0, 30.0]), Ordering::Less);
    assert_eq!([1.0; 0].dominance(&[0.0; 0]), Ordering::Equal);
  }

  #[test]
  fn test_dominates() {
    assert!(min2(1.0, 1.0).dominates(&min2(1.0, 2.0)));
    assert!(!min2(1.0, 2.0).dominates(&min2(1.0, 1.0)));
    assert!(!min2(1.0, 1.0).dominates(&min2(1.0, 1.0)));
    assert!(!min2(1.0, 2.0).dominates(&min2(2.0, 1.0)));
  }

  #[test]
  fn test_weakly_dominates() {
    assert!(min2(1.0, 1.0).weakly_dominates(&min2(1.0, 1.0)));
    assert!(min2(1.0, 1.0).weakly_dominates(&min2(1.0, 2.0)));
    assert!(!min2(1.0, 2.0).weakly_dominates(&min2(2.0, 1.0)));
  }

  #[test]
  fn test_max_objectives_are_negated() {
    let a = Objectives::new()
      .with(Objective::max("gain"), 5.0)
      .with(Objective::min("cost"), 1.0);
    let b = Objectives::new()
      .with(Objective::max("gain"), 3.0)
      .with(Objective::min("cost"), 1.0);
    assert_eq!(a.array(), &[1.0, -5.0]);
    assert!(a.dominates(&b));
    assert!(!b.dominates(&a));
  }

  #[test]
  fn test_infeasible_is_worst() {
    let feasible = Objectives::new().with(Objective::max("f"), -1e300);
    let infeasible = Objectives::new().with(Objective::max("f"), INFEASIBLE);
    assert!(feasible.dominates(&infeasible));
    assert!(!infeasible.weakly_dominates(&feasible));

    let nan = Objectives::new().with(Objective::min("f"), f64::NAN);
    assert_eq!(nan.get("f"), Some(INFEASIBLE));
  }

  #[test]
  fn test_entries_are_sorted_by_name() {
    let a = Objectives::new()
      .with(Objective::min("b"), 2.0)
      .with(Objective::min("a"), 1.0);
    let b = Objectives::new()
      .with(Objective::min("a"), 1.0)
      .with(Objective::min("b"), 2.0);
    assert_eq!(a, b);
    assert!(a.is_equal(&b));
    assert_eq!(a.describe_keys(), "a(MIN), b(MIN)");
    assert_eq!(a.to_string(), "a(MIN)=1 b(MIN)=2");
  }

  #[test]
  fn test_add_replaces_value() {
    let mut o = min2(1.0, 2.0);
    o.add(Objective::min("o0"), 4.0);
    assert_eq!(o.len(), 2);
    assert_eq!(o.get("o0"), Some(Some(4.0)));
    assert_eq!(o.get("missing"), None);
  }

  #[test]
  fn test_distance() {
    assert_eq!(min2(0.0, 0.0).distance(&min2(3.0, 4.0)), 5.0);
    let a = Objectives::new().with(Objective::max("f"), 2.0);
    let b = Objectives::new().with(Objective::max("f"), 5.0);
    assert_eq!(a.distance(&b), 3.0);
  }

  #[test]
  #[should_panic(expected = "cannot compare objectives")]
  fn test_incompatible_dimensions_panic() {
    let a = min2(1.0, 1.0);
    let b = Objectives::new().with(Objective::min("o0"), 1.0);
    a.dominates(&b);
  }

  #[test]
  #[should_panic(expected = "cannot compare objectives")]
  fn test_incompatible_signs_panic() {
    let a = Objectives::new().with(Objective::min("f"), 1.0);
    let b = Objectives::new().with(Objective::max("f"), 1.0);
    a.weakly_dominates(&b);
  }
}

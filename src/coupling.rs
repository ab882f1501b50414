//! Mating: pairing survivors up as parents.

use rand::{seq::SliceRandom, Rng};
use tracing::trace;

use crate::{
  epsilon::{
    AdaptiveEpsilon, AdditiveEpsilonMapping, DefaultEpsilonAdaptation,
    EpsilonAdaptation, EpsilonMapping,
  },
  error::ConfigError,
  individual::Handle,
  objective::ParetoDominance,
};

/// Two parents. Both may be the same individual.
#[derive(Debug)]
pub struct Couple<S> {
  /// The first parent.
  pub first: Handle<S>,
  /// The second parent.
  pub second: Handle<S>,
}

impl<S> Clone for Couple<S> {
  fn clone(&self) -> Self {
    Self {
      first: self.first.clone(),
      second: self.second.clone(),
    }
  }
}

/// Forms parent couples out of survivors.
///
/// # Examples
/// ```
/// # use pareto_archive::{coupling::{Couple, Coupler}, individual::Handle};
/// // couples every survivor with itself
/// let mut selfish = |size: usize, survivors: &[Handle<()>]| {
///   survivors
///     .iter()
///     .cycle()
///     .take(size)
///     .map(|s| Couple { first: s.clone(), second: s.clone() })
///     .collect::<Vec<_>>()
/// };
/// assert!(selfish.couples(4, &[]).is_empty());
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Coupler<S> {
  /// Returns `size` couples of `survivors`.
  fn couples(
    &mut self,
    size: usize,
    survivors: &[Handle<S>],
  ) -> Vec<Couple<S>>;
}

impl<S, F> Coupler<S> for F
where
  F: FnMut(usize, &[Handle<S>]) -> Vec<Couple<S>>,
{
  fn couples(
    &mut self,
    size: usize,
    survivors: &[Handle<S>],
  ) -> Vec<Couple<S>> {
    self(size, survivors)
  }
}

/// Pairs up individuals that are close to each other in objective space.
///
/// Survivors are split into neighborhoods: a random reference individual
/// collects every remaining survivor dominated by its epsilon-enhanced
/// objectives, then the next reference is drawn from what is left. Couples are
/// drawn from the neighborhoods in turn. Within a neighborhood no member is
/// drawn twice before all of its members were drawn once.
///
/// The neighborhood epsilon shrinks when fewer neighborhoods than planned
/// were formed and grows otherwise.
#[derive(Debug)]
pub struct EpsilonNeighborhoodCoupler<
  R,
  M = AdditiveEpsilonMapping,
  A = DefaultEpsilonAdaptation,
> {
  epsilon: AdaptiveEpsilon,
  planned_neighborhoods: usize,
  mapping: M,
  adaptation: A,
  rng: R,
}

impl<R: Rng> EpsilonNeighborhoodCoupler<R> {
  /// Creates a coupler with the additive epsilon mapping and the default
  /// epsilon adaptation.
  pub fn new(
    epsilon: AdaptiveEpsilon,
    planned_neighborhoods: usize,
    rng: R,
  ) -> Result<Self, ConfigError> {
    Self::with_parts(
      epsilon,
      planned_neighborhoods,
      AdditiveEpsilonMapping,
      DefaultEpsilonAdaptation,
      rng,
    )
  }
}

impl<R, M, A> EpsilonNeighborhoodCoupler<R, M, A>
where
  R: Rng,
  M: EpsilonMapping,
  A: EpsilonAdaptation,
{
  /// Creates a coupler with a custom epsilon mapping and adaptation.
  pub fn with_parts(
    epsilon: AdaptiveEpsilon,
    planned_neighborhoods: usize,
    mapping: M,
    adaptation: A,
    rng: R,
  ) -> Result<Self, ConfigError> {
    if planned_neighborhoods == 0 {
      return Err(ConfigError::InvalidNeighborhoodNumber(0));
    }
    Ok(Self {
      epsilon,
      planned_neighborhoods,
      mapping,
      adaptation,
      rng,
    })
  }

  /// Returns the current neighborhood epsilon.
  pub fn epsilon(&self) -> &AdaptiveEpsilon {
    &self.epsilon
  }

  /// Returns the number of neighborhoods the epsilon is adapted towards.
  pub fn planned_neighborhoods(&self) -> usize {
    self.planned_neighborhoods
  }

  /// Splits `survivors` into neighborhoods and adapts the epsilon to their
  /// number. Every survivor ends up in exactly one neighborhood; the
  /// reference of a neighborhood comes first.
  pub fn neighborhoods<S>(
    &mut self,
    survivors: &[Handle<S>],
  ) -> Vec<Vec<Handle<S>>> {
    let amplitudes = self.mapping.amplitudes(survivors);
    let epsilon = self.epsilon.epsilon();

    let mut remaining = survivors.to_vec();
    let mut neighborhoods = Vec::new();
    while !remaining.is_empty() {
      let idx = self.rng.gen_range(0..remaining.len());
      let reference = remaining.remove(idx);
      let enhanced =
        self.mapping.map(reference.values(), epsilon, &amplitudes);
      let (mut neighborhood, rest): (Vec<_>, Vec<_>) = remaining
        .into_iter()
        .partition(|c| enhanced.dominates(c.values()));
      remaining = rest;
      neighborhood.insert(0, reference);
      neighborhoods.push(neighborhood);
    }

    trace!(
      neighborhoods = neighborhoods.len(),
      planned = self.planned_neighborhoods,
      epsilon,
      "neighborhoods formed"
    );
    let too_big = neighborhoods.len() < self.planned_neighborhoods;
    self.adaptation.adapt(&mut self.epsilon, too_big);
    neighborhoods
  }
}

impl<S, R, M, A> Coupler<S> for EpsilonNeighborhoodCoupler<R, M, A>
where
  R: Rng,
  M: EpsilonMapping,
  A: EpsilonAdaptation,
{
  fn couples(
    &mut self,
    size: usize,
    survivors: &[Handle<S>],
  ) -> Vec<Couple<S>> {
    if survivors.is_empty() {
      return Vec::new();
    }
    let mut pools: Vec<_> = self
      .neighborhoods(survivors)
      .into_iter()
      .map(Pool::new)
      .collect();
    let mut scheduler = RoundRobin::new(pools.len());
    (0..size)
      .map(|_| pools[scheduler.next_index()].couple(&mut self.rng))
      .collect()
  }
}

/// Cycles over neighborhood indices.
#[derive(Debug)]
struct RoundRobin {
  len: usize,
  next: usize,
}

impl RoundRobin {
  fn new(len: usize) -> Self {
    debug_assert!(len > 0);
    Self { len, next: 0 }
  }

  fn next_index(&mut self) -> usize {
    let current = self.next;
    self.next = (self.next + 1) % self.len;
    current
  }
}

/// A neighborhood and the members not drawn in the current round.
#[derive(Debug)]
struct Pool<S> {
  members: Vec<Handle<S>>,
  undrawn: Vec<Handle<S>>,
}

impl<S> Pool<S> {
  fn new(members: Vec<Handle<S>>) -> Self {
    debug_assert!(!members.is_empty());
    Self {
      members,
      undrawn: Vec::new(),
    }
  }

  fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Handle<S> {
    if self.undrawn.is_empty() {
      self.undrawn = self.members.clone();
      self.undrawn.shuffle(rng);
    }
    match self.undrawn.pop() {
      Some(drawn) => drawn,
      // never reached, pools are not empty
      None => self.members[0].clone(),
    }
  }

  /// Draws two distinct members, or the only member twice.
  fn couple<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Couple<S> {
    let first = self.draw(rng);
    if self.members.len() == 1 {
      return Couple {
        second: first.clone(),
        first,
      };
    }
    let mut second = self.draw(rng);
    if second.id() == first.id() {
      // a new round started with the member drawn last
      let next = self.draw(rng);
      self.undrawn.insert(0, second);
      second = next;
    }
    Couple { first, second }
  }
}

//! Configuration of archives and of the epsilon-based operators.
//!
//! Configurations are plain values: build them with their builders or
//! deserialize them, then turn them into components with `build`.
//!
//! ```
//! # use pareto_archive::{
//! #   archive::Archive,
//! #   config::{ArchiveConfig, ArchiveKind},
//! # };
//! # use rand::{rngs::StdRng, SeedableRng};
//! // a convenient builder with compile time verification from `typed-builder`
//! let config = ArchiveConfig::builder()
//!   .kind(ArchiveKind::AdaptiveGrid)
//!   .capacity(50)
//!   .build();
//! let archive = config.build::<(), _>(StdRng::seed_from_u64(0)).unwrap();
//! assert!(archive.is_empty());
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
  archive::{
    AdaptiveGridArchive, Archive, CrowdingArchive, EpsilonSamplingArchive,
    PopulationArchive, UnboundedArchive,
  },
  coupling::EpsilonNeighborhoodCoupler,
  epsilon::{AdaptiveEpsilon, BoxTiePolicy},
  error::ConfigError,
  survivor::ESamplingSurvivorSelector,
};

/// The available archives.
#[derive(
  Clone, Copy, PartialEq, Eq, Default, Debug, Serialize, Deserialize,
)]
pub enum ArchiveKind {
  /// [`UnboundedArchive`].
  Unbounded,
  /// [`PopulationArchive`].
  Population,
  /// [`CrowdingArchive`].
  #[default]
  Crowding,
  /// [`AdaptiveGridArchive`].
  AdaptiveGrid,
  /// [`EpsilonSamplingArchive`] with an [`ESamplingSurvivorSelector`].
  EpsilonSampling,
}

/// Start value and step bounds of an [`AdaptiveEpsilon`], and the box tie
/// policy of the components that sample epsilon boxes.
#[derive(TypedBuilder, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsilonConfig {
  /// Start value.
  #[builder(default = 0.0)]
  pub epsilon: f64,
  /// Start step.
  #[builder(default = 0.005)]
  pub step: f64,
  /// Upper bound of the step.
  #[builder(default = 0.005)]
  pub step_max: f64,
  /// Lower bound of the step.
  #[builder(default = 0.0001)]
  pub step_min: f64,
  /// Representative of an epsilon box.
  #[builder(default)]
  pub tie_policy: BoxTiePolicy,
}

impl Default for EpsilonConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl EpsilonConfig {
  /// Returns the configured adaptive epsilon.
  pub fn adaptive(&self) -> Result<AdaptiveEpsilon, ConfigError> {
    AdaptiveEpsilon::new(self.epsilon, self.step, self.step_min, self.step_max)
  }

  /// Builds an epsilon sampling survivor selector.
  pub fn survivor_selector<R: Rng>(
    &self,
    rng: R,
  ) -> Result<ESamplingSurvivorSelector<R>, ConfigError> {
    Ok(ESamplingSurvivorSelector::new(
      self.adaptive()?,
      self.tie_policy,
      rng,
    ))
  }
}

/// Configuration of an [`EpsilonNeighborhoodCoupler`].
#[derive(TypedBuilder, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
  /// The number of neighborhoods the epsilon is adapted towards.
  #[builder(default = 5)]
  pub planned_neighborhoods: usize,
  /// The neighborhood epsilon.
  #[builder(default)]
  pub epsilon: EpsilonConfig,
}

impl Default for NeighborhoodConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl NeighborhoodConfig {
  /// Builds the coupler.
  pub fn build<R: Rng>(
    &self,
    rng: R,
  ) -> Result<EpsilonNeighborhoodCoupler<R>, ConfigError> {
    EpsilonNeighborhoodCoupler::new(
      self.epsilon.adaptive()?,
      self.planned_neighborhoods,
      rng,
    )
  }
}

/// Configuration of an archive.
#[derive(TypedBuilder, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
  /// Which archive to build.
  #[builder(default)]
  pub kind: ArchiveKind,
  /// Maximum number of members of bounded archives.
  #[builder(default = 100)]
  pub capacity: usize,
  /// Divisions per objective of the adaptive grid.
  #[builder(default = 7)]
  pub divisions: usize,
  /// Sampling epsilon of the epsilon sampling archive.
  #[builder(default)]
  pub epsilon: EpsilonConfig,
}

impl Default for ArchiveConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl ArchiveConfig {
  /// Builds the configured archive. Randomized archives take ownership of
  /// `rng`, the others drop it.
  ///
  /// Settings the selected archive does not use are not validated.
  pub fn build<S, R>(self, rng: R) -> Result<Box<dyn Archive<S>>, ConfigError>
  where
    S: 'static,
    R: Rng + 'static,
  {
    let archive: Box<dyn Archive<S>> = match self.kind {
      ArchiveKind::Unbounded => Box::new(UnboundedArchive::<S>::new()),
      ArchiveKind::Population => Box::new(PopulationArchive::<S>::new()),
      ArchiveKind::Crowding => {
        Box::new(CrowdingArchive::<S>::new(self.capacity)?)
      }
      ArchiveKind::AdaptiveGrid => Box::new(AdaptiveGridArchive::<S, R>::new(
        self.capacity,
        self.divisions,
        rng,
      )?),
      ArchiveKind::EpsilonSampling => {
        Box::new(EpsilonSamplingArchive::<S, _>::new(
          self.capacity,
          self.epsilon.survivor_selector(rng)?,
        )?)
      }
    };
    Ok(archive)
  }
}

//! **pareto-archive** keeps track of the best trade-offs an optimizer has found
//! so far. Hand every newly evaluated individual to an [`Archive`] and it will
//! hold a set of mutually non-dominated individuals, optionally bounded in
//! size, ready to be picked as parents or reported as the result.
//!
//! Here's a [quick start example](#example) for the impatient.
//!
//! # Individuals and objectives
//!
//! An [`Individual`] carries a solution of any type `S` and, once evaluated,
//! its [`Objectives`]: named values, each to be minimized or maximized, or
//! [`INFEASIBLE`]. Individuals are shared as [`Handle`]s and compared by their
//! identity, never by their solution. Two individuals with equal objective
//! values are still two individuals.
//!
//! Objectives are compared by Pareto dominance. `a` **weakly dominates** `b` if
//! it is nowhere worse than `b`; `a` **dominates** `b` if it is also strictly
//! better somewhere. An infeasible value is worse than every feasible one.
//!
//! # Archives
//!
//! Every archive implements the [`Archive`] trait. Its only mutating operation
//! is [`Archive::update`], which always runs the same protocol:
//! 1. drop candidates that are members already
//! 2. reduce the candidates to their own non-dominated subset
//! 3. drop candidates weakly dominated by a member, remove members dominated by
//!    a candidate
//! 4. merge the rest in the archive's own way
//!
//! The archives differ in the last step only.
//!
//! | Archive                     | Bounded | When over capacity, drops            |
//! |:----------------------------|:-------:|:-------------------------------------|
//! | [`UnboundedArchive`]        | no      | nothing                              |
//! | [`PopulationArchive`]       | no      | every member not offered again       |
//! | [`CrowdingArchive`]         | yes     | the most crowded individual          |
//! | [`AdaptiveGridArchive`]     | yes     | a member of the most crowded cell    |
//! | [`EpsilonSamplingArchive`]  | yes     | what epsilon sampling does not keep  |
//!
//! Archives can be built directly or from an [`ArchiveConfig`], which can be
//! deserialized with `serde`.
//!
//! # Epsilon-based operators
//!
//! Besides the archives, this crate provides two operators an evolutionary
//! optimizer can plug in around them. Both adapt an [`AdaptiveEpsilon`] to
//! what they observe.
//! - [`ESamplingSurvivorSelector`] implements [`SurvivorSelector`]: it keeps
//!   whole non-dominated fronts and samples the first one that does not fit,
//!   preferring one individual per epsilon box.
//! - [`EpsilonNeighborhoodCoupler`] implements [`Coupler`]: it splits
//!   survivors into neighborhoods of similar individuals and pairs parents up
//!   within a neighborhood.
//!
//! # Closures
//!
//! The traits that make up the extension points ([`SurvivorSelector`],
//! [`Coupler`], [`FrontDensityIndicator`], [`EpsilonAdaptation`] and
//! [`ArchiveListener`]) are implemented for closures with the matching
//! signature. Consult the *Implementors* section of their documentation.
//!
//! # Randomness and logging
//!
//! Every randomized component owns the random number generator it is given.
//! Seed it, and the component will make the same decisions on every run. The
//! crate logs through [`tracing`]; it never installs a subscriber.
//!
//! # Example
//!
//! ```
//! # fn main() {
//! use pareto_archive::{
//!   archive::{Archive, CrowdingArchive},
//!   individual::Individual,
//!   objective::{Objective, Objectives},
//! };
//! // the archive holds at most 3 individuals
//! let mut archive = CrowdingArchive::new(3).unwrap();
//! // solutions `x` evaluated on `f1(x) = x^2` and `f2(x) = (x - 2)^2`
//! let evaluated = (0..=8)
//!   .map(|i| i as f64 / 4.0)
//!   .map(|x| {
//!     let objectives = Objectives::new()
//!       .with(Objective::min("f1"), x * x)
//!       .with(Objective::min("f2"), (x - 2.0) * (x - 2.0));
//!     Individual::evaluated(x, objectives).into_handle()
//!   })
//!   .collect::<Vec<_>>();
//! // every solution lies on the Pareto front, so only the capacity limits it
//! assert!(archive.update(&evaluated).unwrap());
//! assert_eq!(archive.len(), 3);
//! // the extremes of the front are kept
//! assert!(archive.contains(&evaluated[0]));
//! assert!(archive.contains(&evaluated[8]));
//! # }
//! ```
//!
//! [`Archive`]: crate::archive::Archive
//! [`Archive::update`]: crate::archive::Archive::update
//! [`UnboundedArchive`]: crate::archive::UnboundedArchive
//! [`PopulationArchive`]: crate::archive::PopulationArchive
//! [`CrowdingArchive`]: crate::archive::CrowdingArchive
//! [`AdaptiveGridArchive`]: crate::archive::AdaptiveGridArchive
//! [`EpsilonSamplingArchive`]: crate::archive::EpsilonSamplingArchive
//! [`ArchiveConfig`]: crate::config::ArchiveConfig
//! [`Individual`]: crate::individual::Individual
//! [`Handle`]: crate::individual::Handle
//! [`Objectives`]: crate::objective::Objectives
//! [`INFEASIBLE`]: crate::objective::INFEASIBLE
//! [`AdaptiveEpsilon`]: crate::epsilon::AdaptiveEpsilon
//! [`EpsilonAdaptation`]: crate::epsilon::EpsilonAdaptation
//! [`ESamplingSurvivorSelector`]: crate::survivor::ESamplingSurvivorSelector
//! [`SurvivorSelector`]: crate::survivor::SurvivorSelector
//! [`EpsilonNeighborhoodCoupler`]: crate::coupling::EpsilonNeighborhoodCoupler
//! [`Coupler`]: crate::coupling::Coupler
//! [`FrontDensityIndicator`]: crate::density::FrontDensityIndicator
//! [`ArchiveListener`]: crate::individual::set::ArchiveListener

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod coupling;
pub mod density;
pub mod epsilon;
pub mod error;
pub mod individual;
pub mod objective;
pub mod sorting;
pub mod survivor;

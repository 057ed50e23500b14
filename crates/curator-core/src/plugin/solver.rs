//! Solvers turn scored candidates into a single classification.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{build, PluginArgs, PluginRegistry};
use crate::catalog::Layer2Object;
use crate::crossmatch::CIResult;
use crate::error::ConfigurationError;

/// Classifies a record from its `(candidate, score)` pairs.
pub trait Solver: fmt::Debug + Send + Sync {
    fn solve(&self, scored: &[(Layer2Object, f64)]) -> CIResult;
}

/// Typed solver tree.
#[derive(Debug, Clone)]
pub enum SolverSpec {
    /// `Existing` when exactly one score reaches the threshold, else a collision.
    ExistingOnlyOneAboveThreshold { threshold: f64 },
    /// `New` when every score is below the threshold, else a collision.
    NewAllBelowThreshold { threshold: f64 },
    /// First solver's result unless it is a collision.
    Or(Box<SolverSpec>, Box<SolverSpec>),
    /// A user-registered solver.
    Custom(Arc<dyn Solver>),
}

impl SolverSpec {
    /// Build from a configuration tree with the built-in registry.
    pub fn from_config(config: &Value) -> Result<Self, ConfigurationError> {
        build(config, &default_solver_registry())
    }

    pub fn or(first: SolverSpec, second: SolverSpec) -> Self {
        SolverSpec::Or(Box::new(first), Box::new(second))
    }
}

impl Solver for SolverSpec {
    fn solve(&self, scored: &[(Layer2Object, f64)]) -> CIResult {
        match self {
            SolverSpec::ExistingOnlyOneAboveThreshold { threshold } => {
                let mut above = scored.iter().filter(|(_, score)| score >= threshold);
                match (above.next(), above.next()) {
                    (Some((candidate, _)), None) => CIResult::Existing { pgc: candidate.pgc },
                    _ => all_candidates(scored),
                }
            }
            SolverSpec::NewAllBelowThreshold { threshold } => {
                if scored.iter().all(|(_, score)| score < threshold) {
                    CIResult::New
                } else {
                    all_candidates(scored)
                }
            }
            SolverSpec::Or(first, second) => match first.solve(scored) {
                CIResult::Collision { .. } => second.solve(scored),
                result => result,
            },
            SolverSpec::Custom(solver) => solver.solve(scored),
        }
    }
}

fn all_candidates(scored: &[(Layer2Object, f64)]) -> CIResult {
    CIResult::collision(scored.iter().map(|(candidate, _)| candidate.pgc))
}

/// Registry of the built-in solvers.
///
/// `existing_only_one_above_threshold(threshold)`,
/// `new_all_below_threshold(threshold)` and `or(solver1, solver2)`.
pub fn default_solver_registry() -> PluginRegistry<SolverSpec> {
    PluginRegistry::new("solver")
        .with("existing_only_one_above_threshold", |args| {
            Ok(SolverSpec::ExistingOnlyOneAboveThreshold {
                threshold: threshold(args)?,
            })
        })
        .with("new_all_below_threshold", |args| {
            Ok(SolverSpec::NewAllBelowThreshold {
                threshold: threshold(args)?,
            })
        })
        .with("or", |args| {
            let first = args.plugin("solver1")?;
            let second = args.plugin("solver2")?;
            Ok(SolverSpec::or(first, second))
        })
}

fn threshold(args: &mut PluginArgs<SolverSpec>) -> Result<f64, ConfigurationError> {
    let value = args.f64("threshold")?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(args.invalid("threshold", "must lie in [0, 1]"))
    }
}

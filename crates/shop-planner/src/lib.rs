#![deny(warnings)]

//! Recipe matching and constrained procurement/production planning.
//!
//! One planning call is a pure function of a strategy, a catalog, and an
//! inventory snapshot: match strategy targets to catalog recipes, derive
//! per-target demand against the remaining capacity pool, then solve a
//! bounded integer program picking barrel purchases (or potion production
//! quantities) under gold, capacity, and per-channel tolerance constraints.
//! The planner holds no state across calls and never mutates its inputs, so
//! concurrent invocations on separate snapshots are safe by construction.

mod demand;
mod matcher;
mod procurement;
mod production;

pub use demand::{compute_demand, purchase_volumes, PurchaseDemand, TargetDemand};
pub use matcher::{match_targets, Match};
pub use procurement::plan_purchases;
pub use production::plan_production;

use shop_core::{AllocationDecision, CatalogEntry, ValidationError};
use shop_solver::{SolveError, SolveLimits};
use thiserror::Error;

/// Tuning knobs for one planning call.
///
/// The defaults reproduce the shop's long-standing behavior: at most six
/// matches across all targets and a match radius of 15 in ratio space.
#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig {
    /// Total match-result cap across all strategy targets.
    pub match_cap: usize,
    /// Maximum ratio-space distance for a catalog entry to count as a match.
    pub match_radius: f64,
    /// Search budget handed to the integer solver.
    pub solver: SolveLimits,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            match_cap: 6,
            match_radius: 15.0,
            solver: SolveLimits::default(),
        }
    }
}

/// Failures a planning call reports to its caller.
///
/// A target with no catalog match is not a failure: demand for it is simply
/// computed against zero existing stock. Failures are always explicit result
/// values; the planner never substitutes a partial plan.
#[derive(Debug, Error, PartialEq)]
pub enum PlanningError {
    /// Input rejected before any model was assembled.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The assembled program has no feasible point, e.g. gold or capacity
    /// cannot satisfy every tolerance band simultaneously.
    #[error("no feasible allocation satisfies every constraint")]
    Infeasible,
    /// The solver ran out of its search budget; equivalent to
    /// [`PlanningError::Infeasible`] for callers, distinguishable for
    /// diagnostics.
    #[error("solver exhausted its search budget")]
    Timeout,
}

pub(crate) fn map_solver_error(e: SolveError) -> PlanningError {
    match e {
        SolveError::Infeasible | SolveError::Unbounded => PlanningError::Infeasible,
        SolveError::LimitReached => PlanningError::Timeout,
    }
}

/// Decisions for every strictly positive solved quantity, in catalog order.
pub(crate) fn emit_decisions(catalog: &[CatalogEntry], values: &[u64]) -> Vec<AllocationDecision> {
    catalog
        .iter()
        .zip(values)
        .filter(|(_, &quantity)| quantity > 0)
        .map(|(entry, &quantity)| AllocationDecision {
            sku: entry.sku.clone(),
            quantity,
        })
        .collect()
}

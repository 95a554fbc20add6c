//! Potion production: assemble and solve the bottling program.

use shop_core::{
    validate_catalog_entry, AllocationDecision, CatalogEntry, Channel, InventorySnapshot,
    ValidationError,
};
use shop_solver::{solve, Model, Rel};
use tracing::{debug, info};

use crate::{emit_decisions, map_solver_error, PlannerConfig, PlanningError};

/// Select potion production quantities from on-hand raw material.
///
/// Production optimizes for revenue potential rather than volume: the raw
/// material cost is already sunk at purchase time, so the objective is total
/// sale value. Each recipe's draw on a color channel is bounded by the
/// on-hand volume of that channel, and total units by the remaining
/// potion-count capacity.
pub fn plan_production(
    catalog: &[CatalogEntry],
    snapshot: &InventorySnapshot,
    config: &PlannerConfig,
) -> Result<Vec<AllocationDecision>, PlanningError> {
    for entry in catalog {
        validate_catalog_entry(entry)?;
    }
    if snapshot.potion_capacity == 0 {
        return Err(ValidationError::ZeroCapacity("potion").into());
    }

    let remaining = snapshot.remaining_potion_capacity();
    if remaining == 0 {
        info!("no potion-count capacity remaining, returning empty plan");
        return Ok(Vec::new());
    }
    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let mut model = Model::new();
    for entry in catalog {
        model.add_var(entry.unit_price as f64, remaining as f64);
    }

    for channel in Channel::ALL {
        let terms: Vec<(usize, f64)> = catalog
            .iter()
            .enumerate()
            .filter(|(_, e)| e.color_ratio.channel(channel) > 0)
            .map(|(i, e)| (i, e.channel_volume(channel)))
            .collect();
        if terms.is_empty() {
            continue;
        }
        model.add_constraint(
            terms,
            Rel::Le,
            snapshot.volume_on_hand.channel(channel) as f64,
        );
    }

    let count_terms: Vec<(usize, f64)> = (0..catalog.len()).map(|i| (i, 1.0)).collect();
    model.add_constraint(count_terms, Rel::Le, remaining as f64);

    debug!(
        recipes = model.vars.len(),
        rows = model.constraints.len(),
        remaining,
        "production model assembled"
    );

    let solution = solve(&model, &config.solver).map_err(map_solver_error)?;
    let as_f: Vec<f64> = solution.values.iter().map(|&q| q as f64).collect();
    debug_assert!(
        model.is_satisfied(&as_f, 1e-6),
        "solved production plan violates its own constraints"
    );

    info!(sale_value = solution.objective, "production plan solved");
    Ok(emit_decisions(catalog, &solution.values))
}

//! Barrel procurement: assemble and solve the purchase program.

use shop_core::{
    validate_catalog_entry, validate_strategy, AllocationDecision, CatalogEntry, Channel,
    DailyStrategy, InventorySnapshot, ValidationError,
};
use shop_solver::{solve, Model, Rel};
use tracing::{debug, info};

use crate::demand::{compute_demand, purchase_volumes};
use crate::matcher::match_targets;
use crate::{emit_decisions, map_solver_error, PlannerConfig, PlanningError};

/// Select barrel purchase quantities for today's strategy.
///
/// Maximizes acquired volume subject to the gold budget, the purchasable
/// volume capacity, per-SKU wholesale stock, and a symmetric tolerance band
/// around the demanded volume of every color channel. Returns the error
/// variant, never a partial plan, when the program is infeasible or the
/// solver budget runs out.
pub fn plan_purchases(
    catalog: &[CatalogEntry],
    strategy: &DailyStrategy,
    snapshot: &InventorySnapshot,
    config: &PlannerConfig,
) -> Result<Vec<AllocationDecision>, PlanningError> {
    validate_strategy(strategy)?;
    for entry in catalog {
        validate_catalog_entry(entry)?;
    }
    if snapshot.volume_capacity == 0 {
        return Err(ValidationError::ZeroCapacity("volume").into());
    }

    let matches = match_targets(&strategy.targets, catalog, config.match_cap, config.match_radius);
    let demands = compute_demand(strategy, &matches, catalog, snapshot);
    let demand = purchase_volumes(strategy, &demands, snapshot);

    if demand.capacity == 0 {
        info!(date = %strategy.date, "no purchasable volume capacity, returning empty plan");
        return Ok(Vec::new());
    }

    let mut model = Model::new();
    for entry in catalog {
        model.add_var(entry.unit_volume as f64, entry.available_quantity as f64);
    }

    let volume_terms: Vec<(usize, f64)> = catalog
        .iter()
        .enumerate()
        .map(|(i, e)| (i, e.unit_volume as f64))
        .collect();
    model.add_constraint(volume_terms, Rel::Le, demand.capacity as f64);

    let cost_terms: Vec<(usize, f64)> = catalog
        .iter()
        .enumerate()
        .map(|(i, e)| (i, e.unit_price as f64))
        .collect();
    model.add_constraint(cost_terms, Rel::Le, snapshot.gold as f64);

    for channel in Channel::ALL {
        let terms: Vec<(usize, f64)> = catalog
            .iter()
            .enumerate()
            .filter(|(_, e)| e.color_ratio.channel(channel) > 0)
            .map(|(i, e)| (i, e.channel_volume(channel)))
            .collect();
        let needed = demand.volumes.channel(channel) as f64;
        if needed > 0.0 {
            model.add_constraint(terms.clone(), Rel::Ge, (1.0 - demand.tolerance) * needed);
        } else if terms.is_empty() {
            continue;
        }
        // With zero demand this pins the channel: nothing of it may be bought.
        model.add_constraint(terms, Rel::Le, (1.0 + demand.tolerance) * needed);
    }

    debug!(
        skus = model.vars.len(),
        rows = model.constraints.len(),
        capacity = demand.capacity,
        gold = snapshot.gold,
        "purchase model assembled"
    );

    let solution = solve(&model, &config.solver).map_err(map_solver_error)?;
    let as_f: Vec<f64> = solution.values.iter().map(|&q| q as f64).collect();
    debug_assert!(
        model.is_satisfied(&as_f, 1e-6),
        "solved purchase plan violates its own constraints"
    );

    info!(
        date = %strategy.date,
        volume_acquired = solution.objective,
        "purchase plan solved"
    );
    Ok(emit_decisions(catalog, &solution.values))
}

//! Demand derivation: sequential capacity-pool allocation per strategy
//! target, then conversion into the per-channel volumes procurement must
//! cover.

use shop_core::{
    CatalogEntry, Channel, ColorVector, DailyStrategy, InventorySnapshot, RATIO_TOTAL,
};

use crate::matcher::Match;

/// Unit demand derived for one strategy target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDemand {
    /// Units still wanted after subtracting matched stock from the target's
    /// baseline share of the capacity pool. Zero means "skip this target
    /// today".
    pub required_units: u64,
    /// `required_units` further capped by the limiting color: the channel
    /// whose on-hand allotment supports the fewest units.
    pub producible_units: u64,
}

/// Per-target demand in strategy order.
///
/// The capacity pool starts at the remaining potion capacity and shrinks by
/// each target's baseline as targets are processed, so earlier targets claim
/// their share first. The order dependence is deliberate and must not be
/// parallelized.
pub fn compute_demand(
    strategy: &DailyStrategy,
    matches: &[Vec<Match>],
    catalog: &[CatalogEntry],
    snapshot: &InventorySnapshot,
) -> Vec<TargetDemand> {
    let mut pool = snapshot.remaining_potion_capacity();
    let mut out = Vec::with_capacity(strategy.targets.len());

    for (target, matched) in strategy.targets.iter().zip(matches) {
        let baseline = (target.capacity_share * pool as f64).floor() as u64;
        pool = pool.saturating_sub(baseline);

        let matched_stock = matched.iter().fold(0u64, |acc, m| {
            acc.saturating_add(catalog[m.index].available_quantity)
        });
        let required_units = baseline.saturating_sub(matched_stock);

        let mut producible_units = required_units;
        for channel in Channel::ALL {
            let component = target.color_ratio.channel(channel);
            if component == 0 {
                // this channel imposes no constraint
                continue;
            }
            let allotment = snapshot.volume_on_hand.channel(channel) as f64 * target.capacity_share;
            let supported = (allotment / component as f64).floor() as u64;
            producible_units = producible_units.min(supported);
        }

        out.push(TargetDemand {
            required_units,
            producible_units,
        });
    }
    out
}

/// Inputs the procurement optimizer derives from unit demand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PurchaseDemand {
    /// Volume still needed per channel in ml, net of on-hand raw material.
    pub volumes: ColorVector,
    /// Volume capacity left for new purchases, after on-hand stock and the
    /// reservation for channels already over their target share.
    pub capacity: u64,
    /// Tolerance fraction bounding the per-channel bands.
    pub tolerance: f64,
}

/// Convert unit demand into per-channel purchase volumes.
///
/// One unit spans [`RATIO_TOTAL`] ml distributed by the target's ratio, so
/// the raw requirement per channel is `units * component`. Channels whose
/// on-hand share already exceeds the blended target share reserve their
/// excess out of the purchasable capacity: buying into other colors cannot
/// displace material that is already over target.
pub fn purchase_volumes(
    strategy: &DailyStrategy,
    demands: &[TargetDemand],
    snapshot: &InventorySnapshot,
) -> PurchaseDemand {
    let mut required = ColorVector::ZERO;
    for (target, demand) in strategy.targets.iter().zip(demands) {
        required = required.saturating_add(&target.color_ratio.scaled(demand.required_units));
    }
    let volumes = required.saturating_sub(&snapshot.volume_on_hand);

    let total_share: f64 = strategy.targets.iter().map(|t| t.capacity_share).sum();
    let mut reserved = 0.0;
    if snapshot.volume_capacity > 0 && total_share > 0.0 {
        let cap = snapshot.volume_capacity as f64;
        for channel in Channel::ALL {
            let blended = strategy
                .targets
                .iter()
                .map(|t| {
                    t.capacity_share * t.color_ratio.channel(channel) as f64 / RATIO_TOTAL as f64
                })
                .sum::<f64>()
                / total_share;
            let current = snapshot.volume_on_hand.channel(channel) as f64 / cap;
            if current > blended {
                reserved += (current - blended) * cap;
            }
        }
    }

    let remaining = snapshot.remaining_volume_capacity() as f64;
    // The reservation is a product of ratios; absorb float noise before the
    // floor so an exact reservation does not lose a whole unit.
    let capacity = ((remaining - reserved).max(0.0) + 1e-6).floor() as u64;
    let tolerance = strategy.targets.first().map_or(0.0, |t| t.tolerance);

    PurchaseDemand {
        volumes,
        capacity,
        tolerance,
    }
}

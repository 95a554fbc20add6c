//! Nearest-neighbor matching of strategy targets against the catalog.

use shop_core::{CatalogEntry, StrategyTarget};
use tracing::debug;

/// One catalog entry within matching distance of a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Index into the catalog the match was computed from.
    pub index: usize,
    /// Euclidean distance between target and entry ratios.
    pub distance: f64,
}

/// For each target, the in-stock catalog entries within `radius` of its
/// ratio, closest first, truncated to an equal share of `cap`.
///
/// The per-target limit is `cap / targets.len()` (integer floor), so total
/// results never exceed `cap`. Distance ties keep catalog insertion order
/// (stable sort). A target with nothing in radius yields an empty list.
pub fn match_targets(
    targets: &[StrategyTarget],
    catalog: &[CatalogEntry],
    cap: usize,
    radius: f64,
) -> Vec<Vec<Match>> {
    if targets.is_empty() {
        return Vec::new();
    }
    let limit = cap / targets.len();

    targets
        .iter()
        .enumerate()
        .map(|(t, target)| {
            let mut found: Vec<Match> = catalog
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.available_quantity > 0)
                .map(|(index, entry)| Match {
                    index,
                    distance: target.color_ratio.distance(&entry.color_ratio),
                })
                .filter(|m| m.distance <= radius)
                .collect();
            found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            found.truncate(limit);
            if found.is_empty() {
                debug!(target = t, "no catalog entries within match radius");
            }
            found
        })
        .collect()
}

#![deny(warnings)]

//! Core domain models and invariants for the shop planner.
//!
//! This crate defines the serializable types exchanged with the external
//! inventory/catalog/strategy providers, with validation helpers that reject
//! malformed input before any plan is assembled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed component total for every recipe ratio vector (one unit is 100 ml
/// spread across channels in these proportions).
pub const RATIO_TOTAL: u64 = 100;

/// One of the four color dimensions of raw material and recipe composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
    /// Dark
    Dark,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Dark];
}

/// Four-channel non-negative integer vector.
///
/// Used for on-hand volumes (ml), barrel yields, and recipe ratios. Ratio
/// vectors must sum to [`RATIO_TOTAL`]; volume vectors are unconstrained.
/// Structural equality and hashing are derived so vectors can key maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorVector {
    /// Red component.
    pub red: u64,
    /// Green component.
    pub green: u64,
    /// Blue component.
    pub blue: u64,
    /// Dark component.
    pub dark: u64,
}

impl ColorVector {
    /// The zero vector.
    pub const ZERO: ColorVector = ColorVector {
        red: 0,
        green: 0,
        blue: 0,
        dark: 0,
    };

    /// Construct from the four components in canonical order.
    pub fn new(red: u64, green: u64, blue: u64, dark: u64) -> Self {
        Self {
            red,
            green,
            blue,
            dark,
        }
    }

    /// Component for a given channel.
    pub fn channel(&self, channel: Channel) -> u64 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Dark => self.dark,
        }
    }

    /// Components in canonical order.
    pub fn components(&self) -> [u64; 4] {
        [self.red, self.green, self.blue, self.dark]
    }

    /// Sum of all components.
    pub fn sum(&self) -> u64 {
        self.red + self.green + self.blue + self.dark
    }

    /// Euclidean distance to another vector, in ratio space.
    ///
    /// Example:
    /// let a = ColorVector::new(100, 0, 0, 0);
    /// let b = ColorVector::new(0, 100, 0, 0);
    /// assert!((a.distance(&b) - 141.42).abs() < 0.01);
    pub fn distance(&self, other: &ColorVector) -> f64 {
        self.components()
            .iter()
            .zip(other.components())
            .map(|(&a, b)| {
                let d = a as f64 - b as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Every component multiplied by `units`, saturating on overflow.
    pub fn scaled(&self, units: u64) -> ColorVector {
        ColorVector {
            red: self.red.saturating_mul(units),
            green: self.green.saturating_mul(units),
            blue: self.blue.saturating_mul(units),
            dark: self.dark.saturating_mul(units),
        }
    }

    /// Component-wise saturating addition.
    pub fn saturating_add(&self, other: &ColorVector) -> ColorVector {
        ColorVector {
            red: self.red.saturating_add(other.red),
            green: self.green.saturating_add(other.green),
            blue: self.blue.saturating_add(other.blue),
            dark: self.dark.saturating_add(other.dark),
        }
    }

    /// Component-wise saturating subtraction (clamped at zero).
    pub fn saturating_sub(&self, other: &ColorVector) -> ColorVector {
        ColorVector {
            red: self.red.saturating_sub(other.red),
            green: self.green.saturating_sub(other.green),
            blue: self.blue.saturating_sub(other.blue),
            dark: self.dark.saturating_sub(other.dark),
        }
    }
}

/// A purchasable barrel SKU or a producible potion recipe, depending on which
/// optimizer consumes it. Immutable for the duration of one planning call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stock-keeping identifier.
    pub sku: String,
    /// Recipe proportions; components sum to [`RATIO_TOTAL`].
    pub color_ratio: ColorVector,
    /// Volume of one unit in ml.
    pub unit_volume: u64,
    /// Price of one unit in gold.
    pub unit_price: u64,
    /// Units in stock (wholesale stock for barrels, shelf stock for potions).
    pub available_quantity: u64,
}

impl CatalogEntry {
    /// Volume one unit contributes to a channel, in ml.
    pub fn channel_volume(&self, channel: Channel) -> f64 {
        self.unit_volume as f64 * self.color_ratio.channel(channel) as f64 / RATIO_TOTAL as f64
    }
}

/// Desired recipe mix for one strategic target of the current planning day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyTarget {
    /// Target recipe proportions; components sum to [`RATIO_TOTAL`].
    pub color_ratio: ColorVector,
    /// Symmetric tolerance fraction around computed demand, in [0, 1).
    pub tolerance: f64,
    /// Share of remaining capacity this target may claim, in [0, 1].
    pub capacity_share: f64,
}

/// The active strategy for "today", as supplied by the strategy provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyStrategy {
    /// Planning day the targets apply to.
    pub date: NaiveDate,
    /// Targets in priority order; order is significant for demand allocation.
    pub targets: Vec<StrategyTarget>,
}

/// Read-only snapshot of shop inventory at planning time. Never mutated by
/// the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Gold available for purchases.
    pub gold: u64,
    /// Total raw-material volume capacity in ml.
    pub volume_capacity: u64,
    /// Raw-material volume on hand per channel, in ml.
    pub volume_on_hand: ColorVector,
    /// Total potion-count capacity.
    pub potion_capacity: u64,
    /// Potions currently on the shelf.
    pub potions_on_hand: u64,
}

impl InventorySnapshot {
    /// Volume capacity not yet consumed by on-hand raw material.
    pub fn remaining_volume_capacity(&self) -> u64 {
        self.volume_capacity.saturating_sub(self.volume_on_hand.sum())
    }

    /// Potion-count capacity not yet consumed by shelf stock.
    pub fn remaining_potion_capacity(&self) -> u64 {
        self.potion_capacity.saturating_sub(self.potions_on_hand)
    }
}

/// One (item, quantity) pair emitted by an optimizer. Quantity is strictly
/// positive in emitted plans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDecision {
    /// SKU or recipe reference into the catalog the plan was built from.
    pub sku: String,
    /// Units to buy or produce.
    pub quantity: u64,
}

/// Validation errors for planner inputs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Ratio vectors must sum to [`RATIO_TOTAL`].
    #[error("color ratio must sum to {RATIO_TOTAL}, got {0}")]
    BadRatioSum(u64),
    /// Tolerance must be a finite fraction in [0, 1).
    #[error("tolerance must be within [0, 1)")]
    InvalidTolerance,
    /// Capacity share must be a finite fraction in [0, 1].
    #[error("capacity share must be within [0, 1]")]
    InvalidShare,
    /// Catalog entries must occupy volume.
    #[error("catalog entry {0:?} has zero unit volume")]
    ZeroUnitVolume(String),
    /// The relevant capacity total must be positive.
    #[error("{0} capacity must be > 0")]
    ZeroCapacity(&'static str),
    /// A strategy must name at least one target.
    #[error("strategy has no targets")]
    EmptyStrategy,
}

/// Validate a recipe ratio vector.
pub fn validate_ratio(ratio: &ColorVector) -> Result<(), ValidationError> {
    let total = ratio.sum();
    if total != RATIO_TOTAL {
        return Err(ValidationError::BadRatioSum(total));
    }
    Ok(())
}

/// Validate a catalog entry.
pub fn validate_catalog_entry(entry: &CatalogEntry) -> Result<(), ValidationError> {
    validate_ratio(&entry.color_ratio)?;
    if entry.unit_volume == 0 {
        return Err(ValidationError::ZeroUnitVolume(entry.sku.clone()));
    }
    Ok(())
}

/// Validate a strategy target.
pub fn validate_target(target: &StrategyTarget) -> Result<(), ValidationError> {
    validate_ratio(&target.color_ratio)?;
    if !target.tolerance.is_finite() || !(0.0..1.0).contains(&target.tolerance) {
        return Err(ValidationError::InvalidTolerance);
    }
    if !target.capacity_share.is_finite() || !(0.0..=1.0).contains(&target.capacity_share) {
        return Err(ValidationError::InvalidShare);
    }
    Ok(())
}

/// Validate a daily strategy, including every target.
pub fn validate_strategy(strategy: &DailyStrategy) -> Result<(), ValidationError> {
    if strategy.targets.is_empty() {
        return Err(ValidationError::EmptyStrategy);
    }
    for target in &strategy.targets {
        validate_target(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(sku: &str, ratio: ColorVector) -> CatalogEntry {
        CatalogEntry {
            sku: sku.to_string(),
            color_ratio: ratio,
            unit_volume: 100,
            unit_price: 50,
            available_quantity: 10,
        }
    }

    #[test]
    fn distance_of_pure_colors() {
        let red = ColorVector::new(100, 0, 0, 0);
        let green = ColorVector::new(0, 100, 0, 0);
        assert_eq!(red.distance(&red), 0.0);
        let d = red.distance(&green);
        assert!((d - (20_000f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn channel_volume_splits_unit_volume() {
        let e = entry("HALF_RED_HALF_BLUE", ColorVector::new(50, 0, 50, 0));
        assert_eq!(e.channel_volume(Channel::Red), 50.0);
        assert_eq!(e.channel_volume(Channel::Blue), 50.0);
        assert_eq!(e.channel_volume(Channel::Green), 0.0);
    }

    #[test]
    fn ratio_must_sum_to_total() {
        assert_eq!(validate_ratio(&ColorVector::new(60, 40, 0, 0)), Ok(()));
        assert_eq!(
            validate_ratio(&ColorVector::new(60, 60, 0, 0)),
            Err(ValidationError::BadRatioSum(120))
        );
    }

    #[test]
    fn target_bounds_are_enforced() {
        let mut t = StrategyTarget {
            color_ratio: ColorVector::new(100, 0, 0, 0),
            tolerance: 0.1,
            capacity_share: 0.5,
        };
        assert_eq!(validate_target(&t), Ok(()));
        t.tolerance = 1.0;
        assert_eq!(validate_target(&t), Err(ValidationError::InvalidTolerance));
        t.tolerance = 0.1;
        t.capacity_share = 1.5;
        assert_eq!(validate_target(&t), Err(ValidationError::InvalidShare));
    }

    #[test]
    fn empty_strategy_is_rejected() {
        let s = DailyStrategy {
            date: NaiveDate::from_ymd_opt(2024, 5, 14).unwrap(),
            targets: vec![],
        };
        assert_eq!(validate_strategy(&s), Err(ValidationError::EmptyStrategy));
    }

    #[test]
    fn snapshot_remaining_capacity_saturates() {
        let snap = InventorySnapshot {
            gold: 100,
            volume_capacity: 500,
            volume_on_hand: ColorVector::new(400, 300, 0, 0),
            potion_capacity: 10,
            potions_on_hand: 25,
        };
        assert_eq!(snap.remaining_volume_capacity(), 0);
        assert_eq!(snap.remaining_potion_capacity(), 0);
    }

    #[test]
    fn serde_roundtrip_snapshot() {
        let snap = InventorySnapshot {
            gold: 120,
            volume_capacity: 10_000,
            volume_on_hand: ColorVector::new(500, 0, 250, 0),
            potion_capacity: 50,
            potions_on_hand: 3,
        };
        let s = serde_json::to_string(&snap).unwrap();
        let back: InventorySnapshot = serde_json::from_str(&s).unwrap();
        assert_eq!(back, snap);
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_nonnegative(
            a in proptest::array::uniform4(0u64..1000),
            b in proptest::array::uniform4(0u64..1000),
        ) {
            let va = ColorVector::new(a[0], a[1], a[2], a[3]);
            let vb = ColorVector::new(b[0], b[1], b[2], b[3]);
            prop_assert!(va.distance(&vb) >= 0.0);
            prop_assert_eq!(va.distance(&vb), vb.distance(&va));
            prop_assert_eq!(va.distance(&va), 0.0);
        }

        #[test]
        fn saturating_sub_never_underflows(
            a in proptest::array::uniform4(0u64..1000),
            b in proptest::array::uniform4(0u64..1000),
        ) {
            let va = ColorVector::new(a[0], a[1], a[2], a[3]);
            let vb = ColorVector::new(b[0], b[1], b[2], b[3]);
            let diff = va.saturating_sub(&vb);
            for ch in Channel::ALL {
                prop_assert!(diff.channel(ch) <= va.channel(ch));
            }
        }

        #[test]
        fn any_split_of_ratio_total_validates(red in 0u64..=RATIO_TOTAL, green_frac in 0.0f64..=1.0) {
            let rest = RATIO_TOTAL - red;
            let green = (rest as f64 * green_frac).floor() as u64;
            let blue = rest - green;
            let v = ColorVector::new(red, green, blue, 0);
            prop_assert_eq!(validate_ratio(&v), Ok(()));
        }
    }
}

//! End-to-end planning scenarios over the public API.

use chrono::NaiveDate;
use shop_core::{
    AllocationDecision, CatalogEntry, ColorVector, DailyStrategy, InventorySnapshot, StrategyTarget,
};
use shop_planner::{match_targets, plan_production, plan_purchases, PlannerConfig, PlanningError};

fn barrel(sku: &str, ratio: ColorVector, volume: u64, price: u64, stock: u64) -> CatalogEntry {
    CatalogEntry {
        sku: sku.to_string(),
        color_ratio: ratio,
        unit_volume: volume,
        unit_price: price,
        available_quantity: stock,
    }
}

fn pure_red_strategy(tolerance: f64) -> DailyStrategy {
    DailyStrategy {
        date: NaiveDate::from_ymd_opt(2024, 5, 14).unwrap(),
        targets: vec![StrategyTarget {
            color_ratio: ColorVector::new(100, 0, 0, 0),
            tolerance,
            capacity_share: 1.0,
        }],
    }
}

fn empty_shop(gold: u64, volume_capacity: u64, potion_capacity: u64) -> InventorySnapshot {
    InventorySnapshot {
        gold,
        volume_capacity,
        volume_on_hand: ColorVector::ZERO,
        potion_capacity,
        potions_on_hand: 0,
    }
}

/// A perfectly sized SKU within budget is bought exactly once.
#[test]
fn exact_sku_fills_exact_demand() {
    let catalog = vec![barrel(
        "LARGE_RED_BARREL",
        ColorVector::new(100, 0, 0, 0),
        500,
        400,
        1,
    )];
    // Baseline 6 minus the matched wholesale unit leaves 5 units = 500 ml.
    let snap = empty_shop(1_000, 2_000, 6);
    let plan = plan_purchases(
        &catalog,
        &pure_red_strategy(0.0),
        &snap,
        &PlannerConfig::default(),
    )
    .unwrap();
    assert_eq!(
        plan,
        vec![AllocationDecision {
            sku: "LARGE_RED_BARREL".into(),
            quantity: 1,
        }]
    );
}

/// Nothing within the match radius: the matcher yields an empty list and
/// demand falls back to the full baseline share.
#[test]
fn unmatched_target_keeps_baseline_demand() {
    let strategy = pure_red_strategy(0.1);
    let catalog = vec![barrel(
        "GREEN_BARREL",
        ColorVector::new(0, 100, 0, 0),
        100,
        60,
        10,
    )];
    let matches = match_targets(&strategy.targets, &catalog, 6, 15.0);
    assert!(matches[0].is_empty());

    // The green stock is not subtracted, so the red demand stands; with no
    // red SKU on offer the band cannot be reached.
    let snap = empty_shop(10_000, 10_000, 10);
    let result = plan_purchases(&catalog, &strategy, &snap, &PlannerConfig::default());
    assert_eq!(result, Err(PlanningError::Infeasible));
}

/// Gold below the lower tolerance bound of the only demanded channel.
#[test]
fn starved_budget_is_infeasible() {
    let catalog = vec![barrel(
        "LARGE_RED_BARREL",
        ColorVector::new(100, 0, 0, 0),
        500,
        400,
        1,
    )];
    let snap = empty_shop(399, 2_000, 6);
    let result = plan_purchases(
        &catalog,
        &pure_red_strategy(0.0),
        &snap,
        &PlannerConfig::default(),
    );
    assert_eq!(result, Err(PlanningError::Infeasible));
}

/// Equidistant SKUs keep catalog order up to the per-target limit.
#[test]
fn tied_skus_keep_catalog_order() {
    let strategy = DailyStrategy {
        date: NaiveDate::from_ymd_opt(2024, 5, 14).unwrap(),
        targets: vec![
            StrategyTarget {
                color_ratio: ColorVector::new(50, 50, 0, 0),
                tolerance: 0.1,
                capacity_share: 0.4,
            };
            6
        ],
    };
    // Six targets split the global cap of six into one slot each.
    let catalog = vec![
        barrel("FIRST_TIE", ColorVector::new(54, 46, 0, 0), 100, 60, 5),
        barrel("SECOND_TIE", ColorVector::new(46, 54, 0, 0), 100, 60, 5),
    ];
    let matches = match_targets(&strategy.targets, &catalog, 6, 15.0);
    for per_target in &matches {
        assert_eq!(per_target.len(), 1);
        assert_eq!(catalog[per_target[0].index].sku, "FIRST_TIE");
    }
}

/// Remaining capacity of zero short-circuits both planners.
#[test]
fn saturated_shop_plans_nothing() {
    let catalog = vec![barrel(
        "LARGE_RED_BARREL",
        ColorVector::new(100, 0, 0, 0),
        500,
        400,
        4,
    )];
    let snap = InventorySnapshot {
        gold: 10_000,
        volume_capacity: 2_000,
        volume_on_hand: ColorVector::new(2_000, 0, 0, 0),
        potion_capacity: 10,
        potions_on_hand: 10,
    };
    let purchases = plan_purchases(
        &catalog,
        &pure_red_strategy(0.1),
        &snap,
        &PlannerConfig::default(),
    )
    .unwrap();
    assert!(purchases.is_empty());

    let recipes = vec![barrel(
        "RED_POTION",
        ColorVector::new(100, 0, 0, 0),
        100,
        50,
        0,
    )];
    let production = plan_production(&recipes, &snap, &PlannerConfig::default()).unwrap();
    assert!(production.is_empty());
}

/// Re-running either planner on unchanged inputs returns the same plan.
#[test]
fn planning_is_idempotent() {
    let catalog = vec![
        barrel("SMALL_RED_BARREL", ColorVector::new(100, 0, 0, 0), 100, 60, 6),
        barrel("LARGE_RED_BARREL", ColorVector::new(100, 0, 0, 0), 500, 250, 2),
    ];
    let strategy = pure_red_strategy(0.2);
    let snap = empty_shop(5_000, 5_000, 14);
    let config = PlannerConfig::default();

    let first = plan_purchases(&catalog, &strategy, &snap, &config).unwrap();
    let second = plan_purchases(&catalog, &strategy, &snap, &config).unwrap();
    assert_eq!(first, second);

    let recipes = vec![
        barrel("RED_POTION", ColorVector::new(100, 0, 0, 0), 100, 50, 0),
        barrel("DEEP_RED_POTION", ColorVector::new(100, 0, 0, 0), 100, 80, 0),
    ];
    let stocked = InventorySnapshot {
        volume_on_hand: ColorVector::new(900, 0, 0, 0),
        ..snap
    };
    let p1 = plan_production(&recipes, &stocked, &config).unwrap();
    let p2 = plan_production(&recipes, &stocked, &config).unwrap();
    assert_eq!(p1, p2);
}

#![deny(warnings)]

//! Headless CLI: load or generate a planning scenario, run both planners,
//! and print the day's decisions as JSON.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shop_core::{
    AllocationDecision, CatalogEntry, ColorVector, DailyStrategy, InventorySnapshot, StrategyTarget,
};
use shop_planner::{plan_production, plan_purchases, PlannerConfig, PlanningError};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// One day's planning inputs, as supplied by the external providers.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Scenario {
    strategy: DailyStrategy,
    barrels: Vec<CatalogEntry>,
    recipes: Vec<CatalogEntry>,
    snapshot: InventorySnapshot,
}

/// What the decision sink would receive.
#[derive(Debug, Serialize)]
struct PlanReport {
    date: NaiveDate,
    purchases: Vec<AllocationDecision>,
    purchase_failure: Option<String>,
    production: Vec<AllocationDecision>,
    production_failure: Option<String>,
}

fn parse_args() -> (Option<String>, Option<u64>) {
    let mut scenario: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => scenario = it.next(),
            "--seed" => seed = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    (scenario, seed)
}

/// Reproducible demo scenario: a wholesale barrel catalog in three sizes per
/// color, a small potion catalog, and a partly stocked shop.
fn generate_scenario(seed: u64) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let colors = [
        ("RED", ColorVector::new(100, 0, 0, 0)),
        ("GREEN", ColorVector::new(0, 100, 0, 0)),
        ("BLUE", ColorVector::new(0, 0, 100, 0)),
        ("DARK", ColorVector::new(0, 0, 0, 100)),
    ];
    let sizes = [("SMALL", 500u64, 100u64), ("MEDIUM", 2_500, 250), ("LARGE", 10_000, 425)];

    let mut barrels = Vec::new();
    for (color, ratio) in colors {
        for (size, volume, base_price) in sizes {
            barrels.push(CatalogEntry {
                sku: format!("{size}_{color}_BARREL"),
                color_ratio: ratio,
                unit_volume: volume,
                unit_price: (base_price as f64 * rng.gen_range(0.8..1.2)) as u64,
                available_quantity: rng.gen_range(0..=12),
            });
        }
    }

    let mut recipes = Vec::new();
    for (color, ratio) in colors {
        recipes.push(CatalogEntry {
            sku: format!("{color}_POTION"),
            color_ratio: ratio,
            unit_volume: 100,
            unit_price: rng.gen_range(30..=80),
            available_quantity: rng.gen_range(0..5),
        });
    }

    let snapshot = InventorySnapshot {
        gold: rng.gen_range(500..5_000),
        volume_capacity: 10_000,
        volume_on_hand: ColorVector::new(
            rng.gen_range(0..1_500),
            rng.gen_range(0..1_500),
            rng.gen_range(0..1_500),
            rng.gen_range(0..1_500),
        ),
        potion_capacity: 50,
        potions_on_hand: rng.gen_range(0..10),
    };

    let first = rng.gen_range(0..colors.len());
    let second = (first + 1 + rng.gen_range(0..colors.len() - 1)) % colors.len();
    let strategy = DailyStrategy {
        date: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(seed % 365))
            .unwrap(),
        targets: vec![
            StrategyTarget {
                color_ratio: colors[first].1,
                tolerance: rng.gen_range(0.1..0.3),
                capacity_share: 0.5,
            },
            StrategyTarget {
                color_ratio: colors[second].1,
                tolerance: rng.gen_range(0.1..0.3),
                capacity_share: 0.35,
            },
        ],
    };

    Scenario {
        strategy,
        barrels,
        recipes,
        snapshot,
    }
}

/// An infeasible or timed-out day is reported, not propagated: the caller
/// (here, the operator) decides whether to relax the strategy.
fn split_failure(
    result: Result<Vec<AllocationDecision>, PlanningError>,
    which: &str,
) -> Result<(Vec<AllocationDecision>, Option<String>)> {
    match result {
        Ok(plan) => Ok((plan, None)),
        Err(e @ (PlanningError::Infeasible | PlanningError::Timeout)) => {
            warn!(plan = which, error = %e, "planner returned no plan");
            Ok((Vec::new(), Some(e.to_string())))
        }
        Err(e @ PlanningError::Invalid(_)) => Err(e.into()),
    }
}

fn run(scenario: &Scenario, config: &PlannerConfig) -> Result<PlanReport> {
    let (purchases, purchase_failure) = split_failure(
        plan_purchases(
            &scenario.barrels,
            &scenario.strategy,
            &scenario.snapshot,
            config,
        ),
        "purchases",
    )?;
    let (production, production_failure) = split_failure(
        plan_production(&scenario.recipes, &scenario.snapshot, config),
        "production",
    )?;
    Ok(PlanReport {
        date: scenario.strategy.date,
        purchases,
        purchase_failure,
        production,
        production_failure,
    })
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let (scenario_path, seed) = parse_args();
    info!(sha = env!("GIT_SHA"), ?scenario_path, ?seed, "starting shop planner");

    let scenario: Scenario = match &scenario_path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => generate_scenario(seed.unwrap_or(42)),
    };

    let report = run(&scenario, &PlannerConfig::default())?;
    info!(
        purchases = report.purchases.len(),
        production = report.production.len(),
        "planning finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

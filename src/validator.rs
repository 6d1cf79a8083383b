//! Five-category validation battery
//!
//! Gates final layouts before they are returned. Each check runs
//! independently and failures are collected into a structured report; bad
//! data never raises. The categories: botanical (catalogue membership),
//! physical (area budget), technical (maintenance load), economic (budget),
//! agricultural (antagonists planted too close).

use serde::{Deserialize, Serialize};

use crate::catalog::Catalogue;
use crate::compatibility::CompatibilityIndex;
use crate::layout::Individual;
use crate::request::Constraints;

/// Minutes of weekly upkeep one planted instance demands.
pub const MINUTES_PER_PLANT: u32 = 15;
/// Distance under which an antagonistic pairing fails the agricultural check.
const DANGER_DISTANCE: f64 = 1.0;
/// Affinity under which a pairing counts as antagonistic.
const DANGER_COMPATIBILITY: f64 = -0.5;

/// Aggregated validation outcome for one layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub errors: Vec<String>,
}

/// Default weekly maintenance availability per experience level.
pub fn default_maintenance_minutes(experience_level: u8) -> u32 {
    experience_level.clamp(1, 3) as u32 * 60
}

/// Run all five checks over a layout.
pub fn validate_layout(
    individual: &Individual,
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
    constraints: &Constraints,
    available_maintenance_minutes: u32,
) -> ValidationReport {
    let mut passed = Vec::new();
    let mut failed = Vec::new();
    let mut errors = Vec::new();

    let mut record = |name: &str, ok: bool, error: Option<String>| {
        if ok {
            passed.push(name.to_string());
        } else {
            failed.push(name.to_string());
            if let Some(message) = error {
                errors.push(message);
            }
        }
    };

    // Botanical: every instance resolves to a catalogue species.
    let missing: Vec<u32> = individual
        .plants
        .iter()
        .map(|p| p.plant_id)
        .filter(|id| !catalogue.contains(*id))
        .collect();
    record(
        "botanical",
        missing.is_empty(),
        (!missing.is_empty()).then(|| format!("unknown plant ids: {:?}", missing)),
    );

    // Physical: planted footprint within the area ceiling and the plot's
    // 85% working-room bound.
    let used = individual.used_area();
    let total = individual.dimensions.total_area;
    let physical_ok =
        used <= constraints.max_area + 1e-9 && (total > 0.0 && used / total <= 0.85 + 1e-9);
    record(
        "physical",
        physical_ok,
        (!physical_ok).then(|| {
            format!(
                "used area {:.2} m2 exceeds limits (max {:.2} m2, plot {:.2} m2)",
                used, constraints.max_area, total
            )
        }),
    );

    // Technical: weekly upkeep fits the user's availability.
    let demanded = individual.total_plants() as u32 * MINUTES_PER_PLANT;
    record(
        "technical",
        demanded <= available_maintenance_minutes,
        (demanded > available_maintenance_minutes).then(|| {
            format!(
                "maintenance demand {} min/week exceeds available {} min/week",
                demanded, available_maintenance_minutes
            )
        }),
    );

    // Economic: only enforced when a budget ceiling is set.
    let economic_ok = match constraints.max_budget {
        Some(budget) => individual.total_cost(catalogue) <= budget + 1e-9,
        None => true,
    };
    record(
        "economic",
        economic_ok,
        (!economic_ok).then(|| {
            format!(
                "implementation cost {:.2} exceeds budget {:.2}",
                individual.total_cost(catalogue),
                constraints.max_budget.unwrap_or(0.0)
            )
        }),
    );

    // Agricultural: antagonists must not share close quarters.
    let mut conflicts = Vec::new();
    for i in 0..individual.plants.len() {
        for j in i + 1..individual.plants.len() {
            let (a, b) = (&individual.plants[i], &individual.plants[j]);
            let (plant_a, plant_b) = match (catalogue.get(a.plant_id), catalogue.get(b.plant_id)) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => continue,
            };
            let distance = a.center_distance(b);
            let compat = compatibility.score(&plant_a.species, &plant_b.species);
            if distance < DANGER_DISTANCE && compat < DANGER_COMPATIBILITY {
                conflicts.push(format!(
                    "{} and {} are {:.2} m apart with compatibility {:.2}",
                    plant_a.species, plant_b.species, distance, compat
                ));
            }
        }
    }
    let agricultural_ok = conflicts.is_empty();
    record(
        "agricultural",
        agricultural_ok,
        (!agricultural_ok).then(|| conflicts.join("; ")),
    );

    ValidationReport {
        is_valid: failed.is_empty(),
        passed,
        failed,
        errors,
    }
}

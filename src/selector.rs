//! Intelligent plant selector
//!
//! Narrows the full catalogue down to the small species pool the genetic
//! algorithm is allowed to place. Candidates are scored against the garden
//! objective, their mutual compatibility, resource thriftiness and tag
//! variety, then picked greedily under a mutual-compatibility gate.

use tracing::debug;

use crate::catalog::{Catalogue, Plant, PlantType};
use crate::compatibility::CompatibilityIndex;
use crate::evaluator::Objective;
use crate::request::Season;

/// Pairings below this affinity count as strongly negative for the
/// greedy acceptance gate.
const STRONG_NEGATIVE: f64 = -0.3;

/// Selector inputs for one request.
#[derive(Debug, Clone)]
pub struct PlantSelectionConfig {
    /// Restrict the candidate pool to these catalogue ids when non-empty.
    pub desired_plant_ids: Vec<u32>,
    /// Pool ceiling (3 or 5).
    pub max_species: usize,
    pub objective: Objective,
    /// Reserved; the season filter is currently a pass-through.
    pub season: Option<Season>,
}

/// Candidate with its composite selection score.
#[derive(Debug, Clone)]
pub struct ScoredPlant {
    pub plant: Plant,
    pub score: f64,
}

/// Pick up to `max_species` plants from the catalogue.
///
/// Never fails: a non-empty catalogue always yields at least one plant.
/// When every desired id is unknown the whole catalogue is reconsidered.
pub fn select_plants(
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
    config: &PlantSelectionConfig,
) -> Vec<Plant> {
    let mut candidates: Vec<&Plant> = if config.desired_plant_ids.is_empty() {
        catalogue.plants().iter().collect()
    } else {
        catalogue
            .plants()
            .iter()
            .filter(|p| config.desired_plant_ids.contains(&p.id))
            .collect()
    };
    if candidates.is_empty() {
        candidates = catalogue.plants().iter().collect();
    }

    let candidates = season_filter(candidates, config.season);

    let mut scored: Vec<ScoredPlant> = candidates
        .iter()
        .map(|&plant| ScoredPlant {
            plant: plant.clone(),
            score: composite_score(plant, &candidates, compatibility, config.objective),
        })
        .collect();

    // Stable sort keeps catalogue order on ties, so fixed seeds stay
    // reproducible across runs.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<Plant> = Vec::with_capacity(config.max_species);

    // Greedy pass: accept a candidate unless it has more than one strongly
    // negative pairing with the members already picked.
    for candidate in &scored {
        if selected.len() >= config.max_species {
            break;
        }
        let hostile = selected
            .iter()
            .filter(|member| {
                compatibility.score(&member.species, &candidate.plant.species) < STRONG_NEGATIVE
            })
            .count();
        if hostile <= 1 {
            selected.push(candidate.plant.clone());
        }
    }

    // Shortfall pass: ignore the gate and fill by pure score order.
    if selected.len() < config.max_species {
        for candidate in &scored {
            if selected.len() >= config.max_species {
                break;
            }
            if !selected.iter().any(|p| p.id == candidate.plant.id) {
                selected.push(candidate.plant.clone());
            }
        }
    }

    debug!(
        pool = selected.len(),
        candidates = scored.len(),
        objective = ?config.objective,
        "species pool selected"
    );
    selected
}

/// Reserved seasonal availability filter; currently a pass-through.
fn season_filter(candidates: Vec<&Plant>, _season: Option<Season>) -> Vec<&Plant> {
    candidates
}

fn composite_score(
    plant: &Plant,
    candidates: &[&Plant],
    compatibility: &CompatibilityIndex,
    objective: Objective,
) -> f64 {
    0.30 * objective_score(plant, objective)
        + 0.40 * compatibility_score(plant, candidates, compatibility)
        + 0.20 * resource_score(plant)
        + 0.10 * diversity_score(plant)
}

fn objective_score(plant: &Plant, objective: Objective) -> f64 {
    match objective {
        Objective::Alimenticio => {
            if plant.has_type(PlantType::Vegetable) {
                1.0
            } else {
                0.3
            }
        }
        Objective::Medicinal => {
            if plant.has_type(PlantType::Medicinal) {
                1.0
            } else if plant.has_type(PlantType::Aromatic) {
                0.6
            } else {
                0.2
            }
        }
        Objective::Sostenible => (1.0 - plant.weekly_watering / 100.0).max(0.0),
        Objective::Ornamental => {
            if plant.has_type(PlantType::Ornamental) {
                1.0
            } else if plant.has_type(PlantType::Aromatic) {
                0.5
            } else {
                0.2
            }
        }
    }
}

/// Mean pairwise affinity with the other candidates, remapped to [0, 1].
fn compatibility_score(
    plant: &Plant,
    candidates: &[&Plant],
    compatibility: &CompatibilityIndex,
) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for other in candidates {
        if other.species == plant.species {
            continue;
        }
        sum += compatibility.score(&plant.species, &other.species);
        count += 1;
    }
    if count == 0 {
        return 1.0;
    }
    (sum / count as f64 + 1.0) / 2.0
}

fn resource_score(plant: &Plant) -> f64 {
    let size_part = (1.0 - plant.size / 2.0).max(0.0);
    let water_part = (1.0 - plant.weekly_watering / 100.0).max(0.0);
    (size_part + water_part) / 2.0
}

fn diversity_score(plant: &Plant) -> f64 {
    (plant.types.len() as f64 / 3.0).min(1.0)
}

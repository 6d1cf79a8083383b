//! Response assembly
//!
//! Turns ranked individuals into the wire-format response: layout views with
//! per-instance placement, rounded metric blocks, derived estimations, a
//! harvest-calendar summary and the labeled pair-compatibility report.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalogue, PlantType};
use crate::compatibility::CompatibilityIndex;
use crate::evaluator::Objective;
use crate::ga::StoppingReason;
use crate::layout::{Individual, PlotDimensions};
use crate::validator::{ValidationReport, MINUTES_PER_PLANT};

/// Monthly yield estimate per m² of vegetable footprint.
const KG_PER_VEGETABLE_M2: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenResponse {
    pub success: bool,
    pub solutions: Vec<SolutionView>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionView {
    pub rank: usize,
    pub layout: LayoutView,
    pub metrics: MetricsView,
    pub estimations: Estimations,
    pub calendar: CalendarSummary,
    pub compatibility: Vec<PairCompatibility>,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutView {
    pub dimensions: PlotDimensions,
    pub instances: Vec<InstanceView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    pub id: u32,
    pub name: String,
    pub scientific_name: String,
    /// Always 1; multiple specimens appear as separate instances.
    pub quantity: u32,
    pub position: Position,
    pub area: f64,
    pub types: Vec<PlantType>,
    pub rotation: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Metric block rounded to 4 decimals for presentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsView {
    pub cee: f64,
    pub psrnt: f64,
    pub eh: f64,
    pub ue: f64,
    pub cs: f64,
    pub bsn: f64,
    pub fitness: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimations {
    pub monthly_production_kg: f64,
    pub weekly_water_liters: f64,
    pub implementation_cost_mxn: f64,
    pub maintenance_minutes_per_week: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<CalendarEntry>,
    /// Days until the earliest harvest, when anything is planted.
    pub first_harvest_days: Option<u32>,
    pub last_harvest_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub species: String,
    pub harvest_days: u32,
    pub estimated_harvest: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLabel {
    Benefica,
    Neutral,
    Perjudicial,
}

impl CompatibilityLabel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            CompatibilityLabel::Benefica
        } else if score < -0.5 {
            CompatibilityLabel::Perjudicial
        } else {
            CompatibilityLabel::Neutral
        }
    }
}

/// One unordered instance pair with its labeled affinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCompatibility {
    pub species1: String,
    pub species2: String,
    pub score: f64,
    pub label: CompatibilityLabel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightsView {
    pub cee: f64,
    pub psrnt: f64,
    pub eh: f64,
    pub ue: f64,
    pub cs: f64,
    pub bsn: f64,
}

impl WeightsView {
    pub fn for_objective(objective: Objective) -> Self {
        let [cee, psrnt, eh, ue, cs, bsn] = objective.weights();
        Self { cee, psrnt, eh, ue, cs, bsn }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPlantView {
    pub id: u32,
    pub species: String,
    pub scientific_name: String,
    pub types: Vec<PlantType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub execution_time_ms: u64,
    pub total_generations: usize,
    pub convergence_generation: Option<usize>,
    pub population_size: usize,
    pub stopping_reason: StoppingReason,
    pub objective: Objective,
    pub applied_weights: WeightsView,
    pub selected_plants: Vec<SelectedPlantView>,
}

/// Round to 4 decimals for presentation.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Build one ranked solution view from an evaluated individual.
pub fn build_solution(
    rank: usize,
    individual: &Individual,
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
    validation: ValidationReport,
    generated_at: DateTime<Utc>,
) -> SolutionView {
    let instances: Vec<InstanceView> = individual
        .plants
        .iter()
        .filter_map(|instance| {
            let plant = catalogue.get(instance.plant_id)?;
            Some(InstanceView {
                id: plant.id,
                name: plant.species.clone(),
                scientific_name: plant.scientific_name.clone(),
                quantity: 1,
                position: Position { x: instance.x, y: instance.y },
                area: instance.area(),
                types: plant.types.iter().copied().collect(),
                rotation: instance.rotation.degrees(),
            })
        })
        .collect();

    let metrics = individual
        .metrics
        .as_ref()
        .map(|m| MetricsView {
            cee: round4(m.cee),
            psrnt: round4(m.psrnt),
            eh: round4(m.eh),
            ue: round4(m.ue),
            cs: round4(m.cs),
            bsn: round4(m.bsn),
            fitness: round4(m.fitness),
        })
        .unwrap_or(MetricsView {
            cee: 0.0,
            psrnt: 0.0,
            eh: 0.0,
            ue: 0.0,
            cs: 0.0,
            bsn: 0.0,
            fitness: 0.0,
        });

    let vegetable_area: f64 = individual
        .plants
        .iter()
        .filter_map(|instance| {
            let plant = catalogue.get(instance.plant_id)?;
            plant.has_type(PlantType::Vegetable).then(|| instance.area())
        })
        .sum();

    let estimations = Estimations {
        monthly_production_kg: vegetable_area * KG_PER_VEGETABLE_M2,
        weekly_water_liters: individual.total_weekly_water(catalogue),
        implementation_cost_mxn: individual.total_cost(catalogue),
        maintenance_minutes_per_week: individual.total_plants() as u32 * MINUTES_PER_PLANT,
    };

    SolutionView {
        rank,
        layout: LayoutView { dimensions: individual.dimensions, instances },
        metrics,
        estimations,
        calendar: build_calendar(individual, catalogue, generated_at),
        compatibility: pair_report(individual, catalogue, compatibility),
        validation,
    }
}

/// Harvest calendar: one entry per distinct species, first occurrence order.
fn build_calendar(
    individual: &Individual,
    catalogue: &Catalogue,
    generated_at: DateTime<Utc>,
) -> CalendarSummary {
    let mut entries: Vec<CalendarEntry> = Vec::new();
    for instance in &individual.plants {
        let plant = match catalogue.get(instance.plant_id) {
            Some(p) => p,
            None => continue,
        };
        if entries.iter().any(|e| e.species == plant.species) {
            continue;
        }
        entries.push(CalendarEntry {
            species: plant.species.clone(),
            harvest_days: plant.harvest_days,
            estimated_harvest: generated_at + Duration::days(plant.harvest_days as i64),
        });
    }

    let first_harvest_days = entries.iter().map(|e| e.harvest_days).min();
    let last_harvest_days = entries.iter().map(|e| e.harvest_days).max();

    CalendarSummary { generated_at, entries, first_harvest_days, last_harvest_days }
}

/// Labeled affinity for every unordered instance pair.
fn pair_report(
    individual: &Individual,
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
) -> Vec<PairCompatibility> {
    let mut report = Vec::new();
    for i in 0..individual.plants.len() {
        for j in i + 1..individual.plants.len() {
            let a = catalogue.get(individual.plants[i].plant_id);
            let b = catalogue.get(individual.plants[j].plant_id);
            let (plant_a, plant_b) = match (a, b) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => continue,
            };
            let score = compatibility.score(&plant_a.species, &plant_b.species);
            report.push(PairCompatibility {
                species1: plant_a.species.clone(),
                species2: plant_b.species.clone(),
                score,
                label: CompatibilityLabel::from_score(score),
            });
        }
    }
    report
}

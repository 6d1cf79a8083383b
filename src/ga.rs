//! Genetic algorithm over variable-length garden layouts
//!
//! The genome is the ordered list of placed instances, not a fixed grid.
//! Spatial feasibility (bounds, overlap, compatibility-aware spacing,
//! resource caps) is enforced inside the initializer and the insert/relocate
//! operators via rejection sampling; crossover may produce infeasible
//! children, which selection pressure and relocation cull over generations.
//!
//! One `GeneticAlgorithm` is built per request and owns the request's
//! random stream, so a fixed seed reproduces every placement and fitness
//! value exactly.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalogue, Plant};
use crate::compatibility::CompatibilityIndex;
use crate::errors::{EngineError, Result};
use crate::evaluator::{FitnessEvaluator, Objective};
use crate::layout::{Individual, PlantInstance, PlotDimensions, Rotation};
use crate::request::{Constraints, Season};
use crate::rng::GardenRng;
use crate::selector::{select_plants, PlantSelectionConfig};
use crate::spacing;

/// Fraction of `max_area` the planted footprint may occupy.
const MAX_UTILIZATION: f64 = 0.85;
/// Best-fitness improvement at or below which a generation counts as stalled.
const STALL_EPSILON: f64 = 0.001;
/// Placement attempts during initialization.
const INIT_PLACEMENT_TRIES: usize = 50;
/// Placement attempts for the insert mutation.
const INSERT_PLACEMENT_TRIES: usize = 30;
/// Placement attempts for the relocate mutation.
const RELOCATE_PLACEMENT_TRIES: usize = 20;

/// Why the evolution loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingReason {
    Timeout,
    Patience,
    Convergence,
    MaxGenerations,
}

/// Tuning knobs for one evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub crossover_probability: f64,
    pub mutation_rate: f64,
    pub insertion_rate: f64,
    pub deletion_rate: f64,
    pub tournament_k: usize,
    /// Top layouts guaranteed to survive a generation. The combined
    /// sort-truncate replacement already preserves at least this many.
    pub elite_count: usize,
    /// Stalled generations tolerated before stopping.
    pub patience: usize,
    /// Population fitness variance below which the run has converged.
    pub convergence_threshold: f64,
    pub timeout_ms: u64,
    pub seed: Option<u64>,
    /// Species pool ceiling (3 or 5).
    pub max_species: usize,
    /// Fan population evaluation out across cores. Evaluation is pure, so
    /// this cannot change results.
    pub parallel_evaluation: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 120,
            crossover_probability: 0.8,
            mutation_rate: 0.15,
            insertion_rate: 0.12,
            deletion_rate: 0.08,
            tournament_k: 3,
            elite_count: 2,
            patience: 15,
            convergence_threshold: 1e-6,
            timeout_ms: 30_000,
            seed: None,
            max_species: 5,
            parallel_evaluation: false,
        }
    }
}

impl GaConfig {
    pub fn apply_overrides(&mut self, overrides: &crate::request::GaOverrides) {
        if let Some(v) = overrides.population_size {
            self.population_size = v;
        }
        if let Some(v) = overrides.max_generations {
            self.max_generations = v;
        }
        if let Some(v) = overrides.crossover_probability {
            self.crossover_probability = v;
        }
        if let Some(v) = overrides.mutation_rate {
            self.mutation_rate = v;
        }
        if let Some(v) = overrides.insertion_rate {
            self.insertion_rate = v;
        }
        if let Some(v) = overrides.deletion_rate {
            self.deletion_rate = v;
        }
        if let Some(v) = overrides.tournament_k {
            self.tournament_k = v;
        }
        if let Some(v) = overrides.elite_count {
            self.elite_count = v;
        }
        if let Some(v) = overrides.patience {
            self.patience = v;
        }
        if let Some(v) = overrides.convergence_threshold {
            self.convergence_threshold = v;
        }
        if let Some(v) = overrides.timeout_ms {
            self.timeout_ms = v;
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EngineError::validation("populationSize must be >= 2"));
        }
        if self.max_generations == 0 {
            return Err(EngineError::validation("maxGenerations must be >= 1"));
        }
        if self.tournament_k == 0 {
            return Err(EngineError::validation("tournamentK must be >= 1"));
        }
        for (name, value) in [
            ("crossoverProbability", self.crossover_probability),
            ("mutationRate", self.mutation_rate),
            ("insertionRate", self.insertion_rate),
            ("deletionRate", self.deletion_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::validation(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Result of one evolution run.
#[derive(Debug, Clone)]
pub struct GaOutcome {
    /// Best individuals, fitness-descending (up to 3).
    pub top: Vec<Individual>,
    pub generations: usize,
    pub convergence_generation: Option<usize>,
    pub stopping_reason: StoppingReason,
    pub best_fitness: f64,
}

/// Per-request evolution engine. Owns the request's random stream and the
/// selected species pool; borrows the shared immutable catalogue and
/// compatibility index.
pub struct GeneticAlgorithm<'a> {
    config: GaConfig,
    catalogue: &'a Catalogue,
    compatibility: &'a CompatibilityIndex,
    constraints: &'a Constraints,
    evaluator: FitnessEvaluator<'a>,
    pool: Vec<Plant>,
    rng: GardenRng,
}

impl<'a> GeneticAlgorithm<'a> {
    /// Build the engine: runs the plant selector to obtain the species pool
    /// and prepares the fitness evaluator.
    pub fn new(
        catalogue: &'a Catalogue,
        compatibility: &'a CompatibilityIndex,
        constraints: &'a Constraints,
        objective: Objective,
        season: Season,
        config: GaConfig,
        rng: GardenRng,
    ) -> Result<Self> {
        config.check()?;

        let pool = select_plants(
            catalogue,
            compatibility,
            &PlantSelectionConfig {
                desired_plant_ids: constraints.desired_plant_ids.clone(),
                max_species: config.max_species,
                objective,
                season: Some(season),
            },
        );

        let evaluator = FitnessEvaluator::new(
            catalogue,
            compatibility,
            objective,
            constraints.max_water_weekly,
            constraints.desired_distribution,
        )?;

        Ok(Self {
            config,
            catalogue,
            compatibility,
            constraints,
            evaluator,
            pool,
            rng,
        })
    }

    /// Species the engine is allowed to place.
    pub fn pool(&self) -> &[Plant] {
        &self.pool
    }

    /// Run the evolution loop and return the top individuals.
    pub fn evolve(&mut self) -> Result<GaOutcome> {
        let start = Instant::now();

        let mut population = self.initialize_population();
        self.evaluate(&mut population)?;
        population.sort_by(fitness_descending);

        let mut best = population.first().map(Individual::fitness).unwrap_or(0.0);
        let mut stall = 0usize;
        let mut generations = 0usize;
        let mut convergence_generation = None;
        let mut stopping_reason = StoppingReason::MaxGenerations;

        for generation in 0..self.config.max_generations {
            generations = generation + 1;

            let parents = self.tournament(&population);
            let mut offspring = self.crossover_all(parents);
            for child in &mut offspring {
                self.mutate(child);
            }
            self.evaluate(&mut offspring)?;

            // Generational replacement with elitism: survivors are the best
            // of parents and offspring together.
            population.append(&mut offspring);
            population.sort_by(fitness_descending);
            population.truncate(self.config.population_size);

            let current_best = population[0].fitness();
            let improvement = current_best - best;
            if improvement > STALL_EPSILON {
                stall = 0;
            } else {
                stall += 1;
            }
            best = current_best;

            let variance = fitness_variance(&population);
            debug!(
                generation,
                best = current_best,
                variance,
                stall,
                "generation complete"
            );

            if start.elapsed().as_millis() as u64 > self.config.timeout_ms {
                stopping_reason = StoppingReason::Timeout;
                break;
            }
            if stall >= self.config.patience {
                stopping_reason = StoppingReason::Patience;
                convergence_generation = Some(generation);
                break;
            }
            if variance < self.config.convergence_threshold {
                stopping_reason = StoppingReason::Convergence;
                convergence_generation = Some(generation);
                break;
            }
            if generation == self.config.max_generations - 1 {
                stopping_reason = StoppingReason::MaxGenerations;
                break;
            }
        }

        population.sort_by(fitness_descending);
        let top: Vec<Individual> = population.iter().take(3).cloned().collect();

        info!(
            generations,
            best_fitness = best,
            reason = ?stopping_reason,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "evolution finished"
        );

        Ok(GaOutcome {
            top,
            generations,
            convergence_generation,
            stopping_reason,
            best_fitness: best,
        })
    }

    fn evaluate(&self, population: &mut [Individual]) -> Result<()> {
        if self.config.parallel_evaluation {
            self.evaluator.evaluate_population_parallel(population)
        } else {
            self.evaluator.evaluate_population(population)
        }
    }

    /// Heuristic initialization: varied plot aspect, a shuffled subset of
    /// the pool, 1-2 specimens per chosen species, rejection-sampled
    /// placement.
    fn initialize_population(&mut self) -> Vec<Individual> {
        (0..self.config.population_size)
            .map(|_| self.random_individual())
            .collect()
    }

    fn random_individual(&mut self) -> Individual {
        let aspect = self.rng.range_f64(0.6, 1.4);
        let width = (self.constraints.max_area * aspect).sqrt();
        let height = self.constraints.max_area / width;
        let mut individual = Individual::new(PlotDimensions::new(width, height));

        let hi = self.config.max_species.min(self.pool.len());
        if hi == 0 {
            return individual;
        }
        let lo = 2.min(hi);
        let num_species = self.rng.range_usize(lo, hi);

        let mut order: Vec<usize> = (0..self.pool.len()).collect();
        self.rng.shuffle(&mut order);

        for &pool_idx in order.iter().take(num_species) {
            let copies = self.rng.range_usize(1, 2);
            for _ in 0..copies {
                let placed = try_place(
                    &mut self.rng,
                    self.catalogue,
                    self.compatibility,
                    self.constraints,
                    &individual,
                    &self.pool[pool_idx],
                    INIT_PLACEMENT_TRIES,
                    true,
                );
                if let Some(instance) = placed {
                    individual.plants.push(instance);
                }
            }
        }
        individual
    }

    /// Tournament selection with replacement; ties go to the earlier
    /// population index.
    fn tournament(&mut self, population: &[Individual]) -> Vec<Individual> {
        let mut selected = Vec::with_capacity(population.len());
        for _ in 0..population.len() {
            let mut best_idx = self.rng.index(population.len());
            for _ in 1..self.config.tournament_k {
                let idx = self.rng.index(population.len());
                let challenger = population[idx].fitness();
                let incumbent = population[best_idx].fitness();
                if challenger > incumbent || (challenger == incumbent && idx < best_idx) {
                    best_idx = idx;
                }
            }
            selected.push(population[best_idx].clone());
        }
        selected
    }

    /// Pairwise uniform crossover over instance lists. Children inherit the
    /// first parent's dimensions and may be spatially infeasible.
    fn crossover_all(&mut self, parents: Vec<Individual>) -> Vec<Individual> {
        let mut offspring = Vec::with_capacity(parents.len());
        let mut iter = parents.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => {
                    if self.rng.chance(self.config.crossover_probability) {
                        let (a, b) = self.uniform_crossover(&first, &second);
                        offspring.push(a);
                        offspring.push(b);
                    } else {
                        offspring.push(first);
                        offspring.push(second);
                    }
                }
                None => offspring.push(first),
            }
        }
        offspring
    }

    fn uniform_crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> (Individual, Individual) {
        let mut child1 = Individual::new(parent1.dimensions);
        let mut child2 = Individual::new(parent1.dimensions);

        let len = parent1.plants.len().max(parent2.plants.len());
        for i in 0..len {
            if self.rng.chance(0.5) {
                if let Some(gene) = parent1.plants.get(i) {
                    child1.plants.push(gene.clone());
                }
                if let Some(gene) = parent2.plants.get(i) {
                    child2.plants.push(gene.clone());
                }
            } else {
                if let Some(gene) = parent2.plants.get(i) {
                    child1.plants.push(gene.clone());
                }
                if let Some(gene) = parent1.plants.get(i) {
                    child2.plants.push(gene.clone());
                }
            }
        }
        (child1, child2)
    }

    /// Apply the four mutation operators in order: swap, insert, delete,
    /// relocate. Each fires independently per offspring.
    fn mutate(&mut self, child: &mut Individual) {
        let mut changed = false;

        // Swap: list-order exchange. Positions travel with the instance, so
        // geometry is untouched; this keeps genome-list diversity for
        // index-aligned crossover.
        if self.rng.chance(self.config.mutation_rate) && child.plants.len() >= 2 {
            let i = self.rng.index(child.plants.len());
            let j = self.rng.index(child.plants.len());
            child.plants.swap(i, j);
            changed = true;
        }

        // Insert: grow the layout while it has headroom.
        if self.rng.chance(self.config.insertion_rate)
            && child.plants.len() < 3 * self.config.max_species
            && !self.pool.is_empty()
        {
            let pool_idx = self.rng.index(self.pool.len());
            let placed = try_place(
                &mut self.rng,
                self.catalogue,
                self.compatibility,
                self.constraints,
                child,
                &self.pool[pool_idx],
                INSERT_PLACEMENT_TRIES,
                false,
            );
            if let Some(instance) = placed {
                child.plants.push(instance);
                changed = true;
            }
        }

        // Delete: shrink, but never below two instances.
        if self.rng.chance(self.config.deletion_rate) && child.plants.len() > 2 {
            let idx = self.rng.index(child.plants.len());
            child.plants.remove(idx);
            changed = true;
        }

        // Relocate: move one instance to a fresh feasible spot, keeping
        // species, footprint and rotation.
        if self.rng.chance(0.5 * self.config.mutation_rate) && !child.plants.is_empty() {
            let idx = self.rng.index(child.plants.len());
            if let Some((x, y)) = self.try_relocate(child, idx) {
                child.plants[idx].x = x;
                child.plants[idx].y = y;
                changed = true;
            }
        }

        if changed {
            child.invalidate_metrics();
        }
    }

    fn try_relocate(&mut self, individual: &Individual, idx: usize) -> Option<(f64, f64)> {
        let instance = &individual.plants[idx];
        let plant = self.catalogue.get(instance.plant_id)?;
        let margin = plant.side();
        let dims = individual.dimensions;
        if dims.width < 2.0 * margin || dims.height < 2.0 * margin {
            return None;
        }

        for _ in 0..RELOCATE_PLACEMENT_TRIES {
            let x = self.rng.range_f64(margin, dims.width - margin);
            let y = self.rng.range_f64(margin, dims.height - margin);
            let candidate = PlantInstance { x, y, ..instance.clone() };
            if placement_feasible(
                self.catalogue,
                self.compatibility,
                individual,
                &candidate,
                plant,
                Some(idx),
            ) {
                return Some((x, y));
            }
        }
        None
    }
}

/// Rejection-sample a position for `plant` inside `individual`'s plot.
///
/// The draw rectangle is inset by a √size margin; each candidate must stay
/// in bounds, avoid overlap, respect the spacing policy against every placed
/// instance, and fit under the area/water caps (plus the budget cap during
/// initialization).
#[allow(clippy::too_many_arguments)]
fn try_place(
    rng: &mut GardenRng,
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
    constraints: &Constraints,
    individual: &Individual,
    plant: &Plant,
    tries: usize,
    check_budget: bool,
) -> Option<PlantInstance> {
    let dims = individual.dimensions;
    let margin = plant.side();
    if dims.width < 2.0 * margin || dims.height < 2.0 * margin {
        return None;
    }

    // Resource caps do not depend on the candidate position.
    if individual.used_area() + plant.size > MAX_UTILIZATION * constraints.max_area {
        return None;
    }
    if individual.total_weekly_water(catalogue) + plant.weekly_watering
        > constraints.max_water_weekly
    {
        return None;
    }
    if check_budget {
        if let Some(budget) = constraints.max_budget {
            if individual.total_cost(catalogue) + plant.cost() > budget {
                return None;
            }
        }
    }

    let rotation = *rng.pick(&Rotation::ALL);
    for _ in 0..tries {
        let x = rng.range_f64(margin, dims.width - margin);
        let y = rng.range_f64(margin, dims.height - margin);
        let candidate = PlantInstance::new(plant, x, y, rotation);
        if placement_feasible(catalogue, compatibility, individual, &candidate, plant, None) {
            return Some(candidate);
        }
    }
    None
}

/// Bounds, overlap and spacing checks for a candidate against every placed
/// instance (optionally skipping one slot for relocation).
fn placement_feasible(
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
    individual: &Individual,
    candidate: &PlantInstance,
    candidate_plant: &Plant,
    skip: Option<usize>,
) -> bool {
    if !candidate.within_plot(individual.dimensions.width, individual.dimensions.height) {
        return false;
    }

    for (idx, placed) in individual.plants.iter().enumerate() {
        if Some(idx) == skip {
            continue;
        }
        if candidate.overlaps(placed) {
            return false;
        }
        let placed_plant = match catalogue.get(placed.plant_id) {
            Some(p) => p,
            None => continue,
        };
        let compat = compatibility.score(&candidate_plant.species, &placed_plant.species);
        let min_distance =
            spacing::min_distance(compat, candidate_plant.size, placed_plant.size);
        if candidate.center_distance(placed) < min_distance {
            return false;
        }
    }
    true
}

fn fitness_descending(a: &Individual, b: &Individual) -> std::cmp::Ordering {
    b.fitness()
        .partial_cmp(&a.fitness())
        .unwrap_or(std::cmp::Ordering::Equal)
}

fn fitness_variance(population: &[Individual]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let n = population.len() as f64;
    let mean = population.iter().map(Individual::fitness).sum::<f64>() / n;
    population
        .iter()
        .map(|ind| {
            let d = ind.fitness() - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

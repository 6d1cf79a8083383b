//! Fitness evaluator - coordinates the six sub-metrics
//!
//! Computes all sub-metrics for a candidate layout and aggregates them to a
//! scalar fitness with objective-dependent weights. Evaluation is pure: the
//! same individual always yields the same metrics, which is what allows the
//! parallel population path to coexist with seeded reproducibility.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalogue;
use crate::compatibility::CompatibilityIndex;
use crate::errors::{EngineError, Result};
use crate::layout::Individual;
use crate::metrics::{
    calculate_bsn, calculate_cee, calculate_cs, calculate_eh, calculate_psrnt, calculate_ue,
    Metrics,
};

/// High-level garden objective selecting the weight row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Alimenticio,
    Medicinal,
    Sostenible,
    Ornamental,
}

impl Objective {
    /// Weight row over (cee, psrnt, eh, ue, cs, bsn). Each row sums to 1.
    pub fn weights(self) -> [f64; 6] {
        match self {
            Objective::Alimenticio => [0.15, 0.40, 0.15, 0.10, 0.10, 0.10],
            Objective::Medicinal => [0.20, 0.35, 0.10, 0.10, 0.10, 0.15],
            Objective::Sostenible => [0.20, 0.15, 0.30, 0.10, 0.10, 0.15],
            Objective::Ornamental => [0.15, 0.30, 0.10, 0.20, 0.10, 0.15],
        }
    }
}

/// Per-request evaluation context. Borrowed shared state only; cheap to
/// pass around and safe to use from rayon workers.
pub struct FitnessEvaluator<'a> {
    catalogue: &'a Catalogue,
    compatibility: &'a CompatibilityIndex,
    objective: Objective,
    max_water_weekly: f64,
    desired_distribution: Option<[f64; 4]>,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        catalogue: &'a Catalogue,
        compatibility: &'a CompatibilityIndex,
        objective: Objective,
        max_water_weekly: f64,
        desired_distribution: Option<[f64; 4]>,
    ) -> Result<Self> {
        let sum: f64 = objective.weights().iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(EngineError::evaluation(format!(
                "weight row for {:?} sums to {}, expected 1",
                objective, sum
            )));
        }
        Ok(Self {
            catalogue,
            compatibility,
            objective,
            max_water_weekly,
            desired_distribution,
        })
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Score one layout across all six metrics.
    pub fn evaluate(&self, individual: &Individual) -> Result<Metrics> {
        let cee = calculate_cee(individual, self.catalogue, self.compatibility);
        let psrnt = calculate_psrnt(
            individual,
            self.catalogue,
            self.desired_distribution.as_ref(),
        );
        let eh = calculate_eh(individual, self.catalogue, self.max_water_weekly);
        let ue = calculate_ue(individual);
        let cs = calculate_cs(individual, self.catalogue);
        let bsn = calculate_bsn(individual, self.catalogue);

        let subs = [cee.score, psrnt.score, eh.score, ue.score, cs.score, bsn.score];
        let weights = self.objective.weights();
        let fitness: f64 = subs.iter().zip(weights).map(|(s, w)| s * w).sum();

        let metrics = Metrics {
            cee: cee.score,
            psrnt: psrnt.score,
            eh: eh.score,
            ue: ue.score,
            cs: cs.score,
            bsn: bsn.score,
            fitness: fitness.clamp(0.0, 1.0),
        };
        metrics.validate()?;
        Ok(metrics)
    }

    /// Score a whole population in place, sequentially.
    pub fn evaluate_population(&self, population: &mut [Individual]) -> Result<()> {
        for individual in population.iter_mut() {
            let metrics = self.evaluate(individual)?;
            individual.metrics = Some(metrics);
        }
        Ok(())
    }

    /// Score a whole population in place across CPU cores.
    ///
    /// Evaluation draws no randomness, so the result is identical to the
    /// sequential path and seeded runs stay reproducible.
    pub fn evaluate_population_parallel(&self, population: &mut [Individual]) -> Result<()> {
        population.par_iter_mut().try_for_each(|individual| {
            let metrics = self.evaluate(individual)?;
            individual.metrics = Some(metrics);
            Ok(())
        })
    }
}

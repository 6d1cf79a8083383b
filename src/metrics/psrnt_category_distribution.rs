//! METRIC: CATEGORY-DISTRIBUTION SATISFACTION (PSRNT)
//!
//! How well the layout's mix of vegetable / medicinal / aromatic /
//! ornamental plantings matches the requested distribution. Without a
//! requested distribution the metric rewards balanced variety through a
//! Shannon-entropy bonus.

use crate::catalog::{Catalogue, PlantType};
use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the PSRNT calculation.
#[derive(Debug, Clone)]
pub struct PsrntResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// Achieved per-category percentages (vegetable, medicinal, aromatic,
    /// ornamental), summing to 100 when any instance is placed.
    pub actual: [f64; 4],
}

/// Calculate PSRNT for a layout.
///
/// Tag incidences are counted per category (an instance tagged both
/// vegetable and medicinal contributes to both buckets) and normalized to
/// percentages. Against a desired distribution the score is
/// `max(0, 1 - √mse/100)` over the four buckets; without one it is the
/// entropy of the achieved distribution relative to the 4-category maximum.
pub fn calculate_psrnt(
    individual: &Individual,
    catalogue: &Catalogue,
    desired: Option<&[f64; 4]>,
) -> PsrntResult {
    let mut counts = [0usize; 4];
    for instance in &individual.plants {
        if let Some(plant) = catalogue.get(instance.plant_id) {
            for tag in &plant.types {
                counts[tag.bucket()] += 1;
            }
        }
    }

    let total: usize = counts.iter().sum();
    let mut actual = [0.0f64; 4];
    if total > 0 {
        for (pct, count) in actual.iter_mut().zip(counts) {
            *pct = count as f64 / total as f64 * 100.0;
        }
    }

    let score = match desired {
        Some(target) => {
            let mse: f64 = actual
                .iter()
                .zip(target)
                .map(|(a, d)| (a - d) * (a - d))
                .sum::<f64>()
                / PlantType::ALL.len() as f64;
            clamp_unit(1.0 - mse.sqrt() / 100.0)
        }
        None => {
            // Shannon-entropy diversity bonus over non-zero buckets
            let entropy: f64 = actual
                .iter()
                .filter(|&&pct| pct > 0.0)
                .map(|&pct| {
                    let p = pct / 100.0;
                    -p * p.log2()
                })
                .sum();
            clamp_unit(entropy / (PlantType::ALL.len() as f64).log2())
        }
    };

    PsrntResult { score, actual }
}

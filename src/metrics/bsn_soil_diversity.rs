//! METRIC: SOIL-TYPE DIVERSITY (BSN)
//!
//! Counts distinct soil-type tags across the layout. Two or three soil
//! types balance nutrient demand best; monoculture soil is mediocre and
//! fragmenting the plot across many soils degrades slowly.

use rustc_hash::FxHashSet;

use crate::catalog::Catalogue;
use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the BSN calculation.
#[derive(Debug, Clone)]
pub struct BsnResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// Number of distinct soil types in the layout.
    pub distinct_soils: usize,
}

/// Calculate BSN for a layout. An empty layout scores 0.
pub fn calculate_bsn(individual: &Individual, catalogue: &Catalogue) -> BsnResult {
    let soils: FxHashSet<&str> = individual
        .plants
        .iter()
        .filter_map(|p| catalogue.get(p.plant_id))
        .map(|plant| plant.soil_type.as_str())
        .collect();

    let k = soils.len();
    let score = match k {
        0 => 0.0,
        1 => 0.6,
        2 | 3 => 1.0,
        _ => (1.0 - (k as f64 - 3.0) * 0.2).max(0.4),
    };

    BsnResult { score: clamp_unit(score), distinct_soils: k }
}

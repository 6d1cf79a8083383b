//! METRIC: SPACE UTILIZATION (UE)
//!
//! Ratio of planted footprint to plot area. 70-85% utilization is ideal;
//! denser plantings are penalized steeply because they leave no working
//! room, sparser ones scale down linearly.

use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the UE calculation.
#[derive(Debug, Clone, Copy)]
pub struct UeResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// used_area / total_area.
    pub utilization: f64,
}

/// Calculate UE for a layout. A degenerate zero-area plot scores 0.
pub fn calculate_ue(individual: &Individual) -> UeResult {
    let total_area = individual.dimensions.total_area;
    if total_area == 0.0 {
        return UeResult { score: 0.0, utilization: 0.0 };
    }

    let u = individual.used_area() / total_area;
    let score = if (0.70..=0.85).contains(&u) {
        1.0
    } else if u < 0.70 {
        u / 0.70
    } else {
        (1.0 - (u - 0.85) * 3.0).max(0.0)
    };

    UeResult { score: clamp_unit(score), utilization: u }
}

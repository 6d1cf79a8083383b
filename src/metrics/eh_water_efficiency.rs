//! METRIC: WATER EFFICIENCY (EH)
//!
//! Piecewise score over the ratio of weekly demand to the weekly ceiling.
//! The sweet spot is 80-95% utilization; overshooting the ceiling is
//! penalized twice as fast as the approach band rewards.

use crate::catalog::Catalogue;
use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the EH calculation.
#[derive(Debug, Clone, Copy)]
pub struct EhResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// Demand / ceiling ratio; 0 when the ceiling is 0.
    pub usage_ratio: f64,
    /// Total weekly demand in liters.
    pub weekly_liters: f64,
}

/// Calculate EH for a layout against a weekly water ceiling.
pub fn calculate_eh(
    individual: &Individual,
    catalogue: &Catalogue,
    max_water_weekly: f64,
) -> EhResult {
    let weekly_liters = individual.total_weekly_water(catalogue);
    if max_water_weekly == 0.0 {
        return EhResult { score: 1.0, usage_ratio: 0.0, weekly_liters };
    }

    let u = weekly_liters / max_water_weekly;
    let score = if u > 1.0 {
        (1.0 - (u - 1.0) * 2.0).max(0.0)
    } else if u >= 0.80 && u <= 0.95 {
        1.0
    } else if u < 0.80 {
        u / 0.80
    } else {
        // 0.95 < u <= 1.00
        1.0 - (u - 0.95) * 2.0
    };

    EhResult { score: clamp_unit(score), usage_ratio: u, weekly_liters }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Plant, PlantType, SunRequirement};
    use crate::layout::{PlantInstance, PlotDimensions, Rotation};
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn thirsty_plant(id: u32, weekly_watering: f64) -> Plant {
        Plant {
            id,
            species: format!("sp{}", id),
            scientific_name: format!("Species {}", id),
            types: smallvec![PlantType::Vegetable],
            sun_requirement: SunRequirement::Medium,
            weekly_watering,
            harvest_days: 60,
            soil_type: "franco".to_string(),
            water_per_kg: 15.0,
            benefits: vec![],
            size: 0.25,
        }
    }

    fn layout_with_demand(demands: &[f64]) -> (Catalogue, Individual) {
        let plants: Vec<Plant> = demands
            .iter()
            .enumerate()
            .map(|(i, &w)| thirsty_plant(i as u32 + 1, w))
            .collect();
        let catalogue = Catalogue::new(plants).unwrap();
        let mut ind = Individual::new(PlotDimensions::new(10.0, 10.0));
        for (i, _) in demands.iter().enumerate() {
            let p = catalogue.get(i as u32 + 1).unwrap();
            ind.plants
                .push(PlantInstance::new(p, i as f64, 0.0, Rotation::R0));
        }
        (catalogue, ind)
    }

    #[test]
    fn sweet_spot_scores_one() {
        let (catalogue, ind) = layout_with_demand(&[40.0, 45.0]);
        let r = calculate_eh(&ind, &catalogue, 100.0); // u = 0.85
        assert_relative_eq!(r.score, 1.0);
        assert_relative_eq!(r.usage_ratio, 0.85);
    }

    #[test]
    fn underuse_scales_linearly() {
        let (catalogue, ind) = layout_with_demand(&[40.0]);
        let r = calculate_eh(&ind, &catalogue, 100.0); // u = 0.4
        assert_relative_eq!(r.score, 0.5);
    }

    #[test]
    fn near_ceiling_band_ramps_down() {
        let (catalogue, ind) = layout_with_demand(&[98.0]);
        let r = calculate_eh(&ind, &catalogue, 100.0); // u = 0.98
        assert_relative_eq!(r.score, 1.0 - 0.03 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn overshoot_is_penalized_hard() {
        let (catalogue, ind) = layout_with_demand(&[120.0]);
        let r = calculate_eh(&ind, &catalogue, 100.0); // u = 1.2
        assert_relative_eq!(r.score, 0.6, epsilon = 1e-12);

        let (catalogue, ind) = layout_with_demand(&[200.0]);
        let r = calculate_eh(&ind, &catalogue, 100.0); // u = 2.0
        assert_relative_eq!(r.score, 0.0);
    }

    #[test]
    fn zero_ceiling_is_neutral() {
        let (catalogue, ind) = layout_with_demand(&[50.0]);
        let r = calculate_eh(&ind, &catalogue, 0.0);
        assert_relative_eq!(r.score, 1.0);
    }

    #[test]
    fn relaxing_an_overshot_ceiling_never_hurts() {
        for demand in [110.0, 150.0, 200.0, 300.0] {
            let (catalogue, ind) = layout_with_demand(&[demand]);
            let tight = calculate_eh(&ind, &catalogue, 100.0);
            let relaxed = calculate_eh(&ind, &catalogue, 200.0);
            assert!(relaxed.score >= tight.score);
        }
    }
}
